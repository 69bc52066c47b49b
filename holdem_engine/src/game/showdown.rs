//! Showdown: winner selection and the layered side-pot payout.
//!
//! Contributions are cut into layers at each distinct winner stake. A
//! layer is shared by the strongest winners who put in at least that
//! much, so an all-in player can only win chips up to their own stake
//! from each opponent. Chips above the highest winner stake are
//! uncontested and go back to whoever put them in.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::{
    entities::{Card, Chips, Username},
    functional,
    player::Player,
    state_machine::GameError,
};

/// Net result of the hand for one player.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Payout {
    pub user_id: i64,
    pub name: Username,
    pub delta: i64,
    /// Bankroll after the delta is applied.
    pub total_balance: Chips,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Showdown {
    /// Ascending by stake, then seat.
    pub winners: Vec<Username>,
    /// Winners first, then losers.
    pub payouts: Vec<Payout>,
}

impl Showdown {
    /// `(user_id, new_total_balance)` pairs for the balance ledger.
    #[must_use]
    pub fn ledger_batch(&self) -> Vec<(i64, Chips)> {
        self.payouts
            .iter()
            .map(|payout| (payout.user_id, payout.total_balance))
            .collect()
    }
}

/// Cache each valid player's best hand from their hole cards and the
/// board.
pub fn evaluate_hands(players: &mut [Player], board: &[Card]) -> Result<(), GameError> {
    for player in players.iter_mut().filter(|p| p.is_valid()) {
        let mut cards = Vec::with_capacity(player.hole_cards.len() + board.len());
        cards.extend_from_slice(&player.hole_cards);
        cards.extend_from_slice(board);
        player.best_hand = Some(functional::eval(&cards)?);
    }
    Ok(())
}

/// Players without an evaluated hand (an uncontested winner) tie with
/// each other and lose to any evaluated hand.
fn strength(a: &Player, b: &Player) -> Ordering {
    match (&a.best_hand, &b.best_hand) {
        (Some(a), Some(b)) => functional::compare(a, b),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

/// Indices of the players that win at least one pot layer, ascending by
/// stake and then seat.
///
/// Valid players are visited from the largest stake down. Each winner
/// added is at least as strong as the ones before it, so the last one
/// holds the best hand so far. A candidate that beats it evicts the
/// winners that staked the same amount and joins; the larger stakes
/// stay since they still own the layers the candidate can't reach.
/// Equal hands join, weaker hands drop out.
pub fn select_winners(players: &[Player]) -> Result<Vec<usize>, GameError> {
    let mut order: Vec<usize> = (0..players.len())
        .filter(|&idx| players[idx].is_valid())
        .collect();
    match order.len() {
        0 => return Err(GameError::NoPlayersLeft),
        1 => return Ok(order),
        _ => {}
    }
    order.sort_by(|&a, &b| players[b].total_bet.cmp(&players[a].total_bet));

    let mut winners: Vec<usize> = Vec::with_capacity(order.len());
    for idx in order {
        let Some(&strongest) = winners.last() else {
            winners.push(idx);
            continue;
        };
        match strength(&players[idx], &players[strongest]) {
            Ordering::Greater => {
                let stake = players[idx].total_bet;
                winners.retain(|&w| players[w].total_bet != stake);
                winners.push(idx);
            }
            Ordering::Equal => winners.push(idx),
            Ordering::Less => {}
        }
    }
    winners.sort_by_key(|&w| (players[w].total_bet, w));
    Ok(winners)
}

/// Every ready player that isn't a winner, folded and departed players
/// included, in seat order.
#[must_use]
pub fn losers(players: &[Player], winners: &[usize]) -> Vec<usize> {
    (0..players.len())
        .filter(|idx| players[*idx].is_ready && !winners.contains(idx))
        .collect()
}

/// Net chip movement for each stake.
///
/// `winners` indexes into `stakes` in payout order (ascending stake);
/// `cmp` ranks two winners' hands. Integer remainders of a split go one
/// chip at a time to the first takers of the layer. The result always
/// sums to zero.
pub fn distribute<F>(stakes: &[Chips], winners: &[usize], cmp: F) -> Result<Vec<i64>, GameError>
where
    F: Fn(usize, usize) -> Ordering,
{
    let mut levels: Vec<Chips> = winners.iter().map(|&w| stakes[w]).collect();
    levels.sort_unstable();
    levels.dedup();

    let mut received: Vec<Chips> = vec![0; stakes.len()];
    let mut floor = 0;
    for &level in &levels {
        let pot: Chips = stakes
            .iter()
            .map(|&stake| stake.min(level) - stake.min(floor))
            .sum();
        let eligible: Vec<usize> = winners
            .iter()
            .copied()
            .filter(|&w| stakes[w] >= level)
            .collect();
        let Some(best) = eligible
            .iter()
            .copied()
            .reduce(|best, w| if cmp(w, best) == Ordering::Greater { w } else { best })
        else {
            continue;
        };
        let takers: Vec<usize> = eligible
            .into_iter()
            .filter(|&w| cmp(w, best) == Ordering::Equal)
            .collect();
        let heads = takers.len() as Chips;
        let share = pot / heads;
        let remainder = pot % heads;
        for (i, &w) in takers.iter().enumerate() {
            let extra = Chips::from((i as Chips) < remainder);
            received[w] += share + extra;
        }
        floor = level;
    }

    let top = levels.last().copied().unwrap_or(0);
    stakes
        .iter()
        .zip(&received)
        .map(|(&stake, &gain)| {
            let gain = i64::try_from(gain).map_err(|_| GameError::BalanceOverflow)?;
            let paid = i64::try_from(stake.min(top)).map_err(|_| GameError::BalanceOverflow)?;
            Ok(gain - paid)
        })
        .collect()
}

/// Pick winners, compute the payout, and apply it to the players'
/// balances.
pub fn settle(players: &mut [Player]) -> Result<Showdown, GameError> {
    let winners = select_winners(players)?;
    let losers = losers(players, &winners);
    let participants: Vec<usize> = winners.iter().chain(&losers).copied().collect();
    let stakes: Vec<Chips> = participants
        .iter()
        .map(|&idx| players[idx].total_bet)
        .collect();
    let slots: Vec<usize> = (0..winners.len()).collect();
    let deltas = distribute(&stakes, &slots, |a, b| {
        strength(&players[participants[a]], &players[participants[b]])
    })?;

    let mut payouts = Vec::with_capacity(participants.len());
    for (&idx, &delta) in participants.iter().zip(&deltas) {
        let player = &mut players[idx];
        player
            .apply_delta(delta)
            .ok_or(GameError::BalanceOverflow)?;
        payouts.push(Payout {
            user_id: player.id,
            name: player.name.clone(),
            delta,
            total_balance: player.total_balance,
        });
    }
    Ok(Showdown {
        winners: winners
            .iter()
            .map(|&idx| players[idx].name.clone())
            .collect(),
        payouts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::{Rank, Suit};

    fn board() -> Vec<Card> {
        vec![
            Card(2, Suit::Club),
            Card(7, Suit::Diamond),
            Card(9, Suit::Heart),
            Card(11, Suit::Spade),
            Card(13, Suit::Club),
        ]
    }

    fn seated(id: i64, stake: Chips, hole: [Card; 2]) -> Player {
        let mut player = Player::new(id, Username::new(&format!("p{id}")), 10_000, 1_000);
        player.is_ready = true;
        player.total_bet = stake;
        player.hole_cards = hole.to_vec();
        player
    }

    fn by_strength(strengths: &[u8]) -> impl Fn(usize, usize) -> Ordering + '_ {
        move |a, b| strengths[a].cmp(&strengths[b])
    }

    // === Distribution Tests ===

    #[test]
    fn test_single_winner_takes_everything_below_its_stake() {
        let deltas = distribute(&[300, 300, 100], &[0], by_strength(&[1, 0, 0])).unwrap();
        assert_eq!(deltas, vec![400, -300, -100]);
    }

    #[test]
    fn test_short_all_in_winner_is_capped() {
        // Seat 0 is all-in for 100 with the best hand, seat 1 has the
        // second best hand and wins the layer above.
        let deltas = distribute(&[100, 300, 300], &[0, 1], by_strength(&[2, 1, 0])).unwrap();
        assert_eq!(deltas, vec![200, 100, -300]);
    }

    #[test]
    fn test_split_remainder_goes_to_first_taker() {
        let deltas = distribute(&[5, 5, 5], &[0, 1], by_strength(&[1, 1, 0])).unwrap();
        assert_eq!(deltas, vec![3, 2, -5]);
    }

    #[test]
    fn test_tied_winners_with_different_stakes() {
        // Both winners tie. The layer up to 50 is split, the layer from 50
        // to 200 belongs to seat 1 alone.
        let deltas = distribute(&[50, 200, 200], &[0, 1], by_strength(&[1, 1, 0])).unwrap();
        assert_eq!(deltas, vec![25, 175, -200]);
    }

    #[test]
    fn test_uncontested_excess_is_refunded() {
        let deltas = distribute(&[100, 500], &[0], by_strength(&[1, 0])).unwrap();
        assert_eq!(deltas, vec![100, -100]);
    }

    #[test]
    fn test_no_winners_moves_nothing() {
        let deltas = distribute(&[10, 20], &[], by_strength(&[0, 0])).unwrap();
        assert_eq!(deltas, vec![0, 0]);
    }

    // === Winner Selection Tests ===

    #[test]
    fn test_evaluate_hands_only_valid_players() {
        let mut players = vec![
            seated(1, 10, [Card(14, Suit::Spade), Card(14, Suit::Heart)]),
            seated(2, 10, [Card(3, Suit::Diamond), Card(4, Suit::Diamond)]),
        ];
        players[1].is_dead = true;
        evaluate_hands(&mut players, &board()).unwrap();
        assert_eq!(players[0].best_hand.as_ref().unwrap().rank, Rank::OnePair);
        assert!(players[1].best_hand.is_none());
    }

    #[test]
    fn test_select_winners_keeps_side_pot_winner() {
        let mut players = vec![
            seated(1, 300, [Card(14, Suit::Spade), Card(14, Suit::Heart)]),
            seated(2, 100, [Card(13, Suit::Diamond), Card(13, Suit::Heart)]),
            seated(3, 300, [Card(3, Suit::Diamond), Card(4, Suit::Diamond)]),
        ];
        evaluate_hands(&mut players, &board()).unwrap();
        let winners = select_winners(&players).unwrap();
        assert_eq!(winners, vec![1, 0]);
        assert_eq!(losers(&players, &winners), vec![2]);
    }

    #[test]
    fn test_select_winners_same_stake_replaced() {
        let mut players = vec![
            seated(1, 200, [Card(3, Suit::Diamond), Card(4, Suit::Diamond)]),
            seated(2, 200, [Card(14, Suit::Spade), Card(14, Suit::Heart)]),
        ];
        evaluate_hands(&mut players, &board()).unwrap();
        assert_eq!(select_winners(&players).unwrap(), vec![1]);
    }

    #[test]
    fn test_select_winners_single_valid_player() {
        let mut players = vec![
            seated(1, 50, [Card(3, Suit::Diamond), Card(4, Suit::Diamond)]),
            seated(2, 80, [Card(14, Suit::Spade), Card(14, Suit::Heart)]),
        ];
        players[1].is_dead = true;
        assert_eq!(select_winners(&players).unwrap(), vec![0]);
    }

    #[test]
    fn test_select_winners_needs_a_valid_player() {
        let mut players = vec![seated(1, 0, [Card(3, Suit::Diamond), Card(4, Suit::Diamond)])];
        players[0].is_left = true;
        assert_eq!(select_winners(&players), Err(GameError::NoPlayersLeft));
    }

    // === Settlement Tests ===

    #[test]
    fn test_settle_applies_layered_payout() {
        let mut players = vec![
            seated(1, 300, [Card(14, Suit::Spade), Card(14, Suit::Heart)]),
            seated(2, 100, [Card(13, Suit::Diamond), Card(13, Suit::Heart)]),
            seated(3, 300, [Card(3, Suit::Diamond), Card(4, Suit::Diamond)]),
        ];
        evaluate_hands(&mut players, &board()).unwrap();
        let showdown = settle(&mut players).unwrap();

        assert_eq!(showdown.winners, vec![Username::new("p2"), Username::new("p1")]);
        assert_eq!(players[0].game_balance, 1_100);
        assert_eq!(players[1].game_balance, 1_200);
        assert_eq!(players[2].game_balance, 700);
        assert_eq!(players[2].total_balance, 9_700);
        let net: i64 = showdown.payouts.iter().map(|p| p.delta).sum();
        assert_eq!(net, 0);
    }

    #[test]
    fn test_settle_charges_folded_players() {
        let mut players = vec![
            seated(1, 40, [Card(3, Suit::Diamond), Card(4, Suit::Diamond)]),
            seated(2, 25, [Card(14, Suit::Spade), Card(14, Suit::Heart)]),
        ];
        players[1].is_dead = true;
        let showdown = settle(&mut players).unwrap();
        assert_eq!(players[0].game_balance, 1_025);
        assert_eq!(players[1].game_balance, 975);
        assert_eq!(
            showdown.ledger_batch(),
            vec![(1, 10_025), (2, 9_975)]
        );
    }
}
