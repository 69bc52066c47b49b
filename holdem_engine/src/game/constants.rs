/// Default number of seats in a room.
pub const MAX_PLAYERS: usize = 7;

/// Longest username accepted from clients. Anything longer is truncated.
pub const MAX_USER_INPUT_LENGTH: usize = 32;

/// Cards dealt to each player at the start of a hand.
pub const HOLE_CARDS: usize = 2;

/// Cards on a complete board.
pub const BOARD_CARDS: usize = 5;

/// Cards the evaluator expects: hole cards plus the full board.
pub const SHOWDOWN_CARDS: usize = HOLE_CARDS + BOARD_CARDS;

/// Cards in a ranked hand.
pub const HAND_SIZE: usize = 5;
