//! Value-copy snapshots used to undo in-memory changes when a durable
//! write fails.
//!
//! Every aggregate that's written to an external store keeps the
//! memento of its last committed state next to its live fields. Before a
//! write, fields may already have changed in memory; if the write fails
//! the aggregate is restored from the memento, and if it succeeds the
//! memento is refreshed.

/// An aggregate that can capture and restore its externally visible
/// state.
pub trait Snapshot {
    type Memento: Clone;

    /// Copy the current state.
    fn capture(&self) -> Self::Memento;

    /// Overwrite the current state with a previously captured one.
    fn restore(&mut self, memento: &Self::Memento);
}

/// Pairs an aggregate's live state with the memento of its last
/// committed state.
pub trait Committed: Snapshot {
    fn memento(&self) -> &Self::Memento;

    fn memento_mut(&mut self) -> &mut Self::Memento;

    /// Make the current state the one rollbacks return to.
    fn commit(&mut self) {
        let memento = self.capture();
        *self.memento_mut() = memento;
    }

    /// Return to the last committed state.
    fn rollback(&mut self) {
        let memento = self.memento().clone();
        self.restore(&memento);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        value: u32,
        memento: u32,
    }

    impl Snapshot for Counter {
        type Memento = u32;

        fn capture(&self) -> u32 {
            self.value
        }

        fn restore(&mut self, memento: &u32) {
            self.value = *memento;
        }
    }

    impl Committed for Counter {
        fn memento(&self) -> &u32 {
            &self.memento
        }

        fn memento_mut(&mut self) -> &mut u32 {
            &mut self.memento
        }
    }

    #[test]
    fn test_rollback_returns_to_last_commit() {
        let mut counter = Counter::default();
        counter.value = 5;
        counter.commit();
        counter.value = 9;
        counter.rollback();
        assert_eq!(counter.value, 5);
    }

    #[test]
    fn test_rollback_without_commit_restores_initial_state() {
        let mut counter = Counter::default();
        counter.value = 3;
        counter.rollback();
        assert_eq!(counter.value, 0);
    }
}
