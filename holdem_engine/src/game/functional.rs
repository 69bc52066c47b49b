//! Hand evaluation.
//!
//! A player's seven showdown cards are split into all 21 five-card
//! candidates. Each candidate is sorted ascending, classified by the
//! category checks below (strongest first), and the strongest candidate
//! wins.

use std::cmp::Ordering;

use super::{
    constants::{HAND_SIZE, SHOWDOWN_CARDS},
    entities::{ACE, BestHand, Card, FIVE, Rank, TEN, TWO, Value},
    state_machine::GameError,
};

type Hand = [Card; HAND_SIZE];

/// Every five-card subset of `cards`, in index order.
#[must_use]
pub fn combinations(cards: &[Card]) -> Vec<Hand> {
    let mut combos = Vec::with_capacity(21);
    let mut picked = Vec::with_capacity(HAND_SIZE);
    collect_combinations(cards, 0, &mut picked, &mut combos);
    combos
}

fn collect_combinations(cards: &[Card], start: usize, picked: &mut Vec<Card>, out: &mut Vec<Hand>) {
    if picked.len() == HAND_SIZE {
        let mut hand = [cards[0]; HAND_SIZE];
        hand.copy_from_slice(picked.as_slice());
        out.push(hand);
        return;
    }
    for i in start..cards.len() {
        picked.push(cards[i]);
        collect_combinations(cards, i + 1, picked, out);
        picked.pop();
    }
}

/// Find the best five-card hand among exactly seven cards.
///
/// The input is sorted before enumeration so equal-strength candidates
/// built from different suits always resolve the same way, whatever
/// order the cards arrive in.
pub fn eval(cards: &[Card]) -> Result<BestHand, GameError> {
    if cards.len() != SHOWDOWN_CARDS {
        return Err(GameError::InvalidCardCount(cards.len()));
    }
    let mut sorted = cards.to_vec();
    sorted.sort_unstable();

    let mut best: Option<BestHand> = None;
    for mut hand in combinations(&sorted) {
        hand.sort();
        let (rank, high_card) = classify(&hand);
        let candidate = BestHand {
            rank,
            high_card,
            cards: hand,
        };
        let replace = match &best {
            Some(current) => compare(&candidate, current) == Ordering::Greater,
            None => true,
        };
        if replace {
            best = Some(candidate);
        }
    }
    best.ok_or(GameError::InvalidCardCount(cards.len()))
}

/// Order two evaluated hands: category, then high card, then the five
/// card values from the top of the sorted hand (index 4) down. The
/// first differing value decides.
#[must_use]
pub fn compare(a: &BestHand, b: &BestHand) -> Ordering {
    a.rank
        .cmp(&b.rank)
        .then(a.high_card.cmp(&b.high_card))
        .then_with(|| {
            a.cards
                .iter()
                .rev()
                .zip(b.cards.iter().rev())
                .map(|(x, y)| x.0.cmp(&y.0))
                .find(|ordering| ordering.is_ne())
                .unwrap_or(Ordering::Equal)
        })
}

/// Classify a hand sorted ascending by value.
#[must_use]
pub fn classify(hand: &Hand) -> (Rank, Value) {
    let checks: [(Rank, fn(&Hand) -> Option<Value>); 9] = [
        (Rank::RoyalStraightFlush, royal_straight_flush),
        (Rank::StraightFlush, straight_flush),
        (Rank::FourOfAKind, four_of_a_kind),
        (Rank::FullHouse, full_house),
        (Rank::Flush, flush),
        (Rank::Straight, straight),
        (Rank::ThreeOfAKind, three_of_a_kind),
        (Rank::TwoPair, two_pair),
        (Rank::OnePair, one_pair),
    ];
    checks
        .into_iter()
        .find_map(|(rank, check)| check(hand).map(|high_card| (rank, high_card)))
        .unwrap_or((Rank::HighCard, hand[4].0))
}

fn same_suit(hand: &Hand) -> bool {
    hand.windows(2).all(|pair| pair[0].1 == pair[1].1)
}

fn consecutive(cards: &[Card]) -> bool {
    cards.windows(2).all(|pair| pair[1].0 == pair[0].0 + 1)
}

fn is_wheel(hand: &Hand) -> bool {
    hand[4].0 == ACE && hand[0].0 == TWO && consecutive(&hand[..4]) && hand[3].0 == FIVE
}

fn royal_straight_flush(hand: &Hand) -> Option<Value> {
    (hand[0].0 == TEN && same_suit(hand) && consecutive(hand)).then_some(ACE)
}

fn straight_flush(hand: &Hand) -> Option<Value> {
    if !same_suit(hand) {
        return None;
    }
    straight(hand)
}

fn four_of_a_kind(hand: &Hand) -> Option<Value> {
    if hand[0].0 == hand[3].0 {
        return Some(hand[3].0);
    }
    (hand[1].0 == hand[4].0).then_some(hand[4].0)
}

fn full_house(hand: &Hand) -> Option<Value> {
    let (a, b, c, d, e) = (hand[0].0, hand[1].0, hand[2].0, hand[3].0, hand[4].0);
    if a == b && b == c && d == e {
        return Some(c);
    }
    (a == b && c == d && d == e).then_some(e)
}

fn flush(hand: &Hand) -> Option<Value> {
    same_suit(hand).then_some(hand[4].0)
}

fn straight(hand: &Hand) -> Option<Value> {
    if is_wheel(hand) {
        return Some(FIVE);
    }
    consecutive(hand).then_some(hand[4].0)
}

fn three_of_a_kind(hand: &Hand) -> Option<Value> {
    hand.windows(3)
        .find(|w| w[0].0 == w[2].0)
        .map(|w| w[2].0)
}

fn two_pair(hand: &Hand) -> Option<Value> {
    let (a, b, c, d, e) = (hand[0].0, hand[1].0, hand[2].0, hand[3].0, hand[4].0);
    if (a == b && c == d) || (a == b && d == e) || (b == c && d == e) {
        // The top pair always ends at index 3 or 4.
        return Some(if d == e { e } else { d });
    }
    None
}

fn one_pair(hand: &Hand) -> Option<Value> {
    hand.windows(2).find(|w| w[0].0 == w[1].0).map(|w| w[1].0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::Suit::{Club, Diamond, Heart, Spade};

    fn sorted(mut cards: Hand) -> Hand {
        cards.sort();
        cards
    }

    // === Combination Tests ===

    #[test]
    fn test_seven_cards_give_21_combinations() {
        let cards: Vec<Card> = (2..=8).map(|v| Card(v, Spade)).collect();
        let combos = combinations(&cards);
        assert_eq!(combos.len(), 21);
        let mut unique = combos.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 21);
    }

    #[test]
    fn test_eval_rejects_wrong_card_count() {
        let cards: Vec<Card> = (2..=7).map(|v| Card(v, Heart)).collect();
        assert_eq!(eval(&cards), Err(GameError::InvalidCardCount(6)));
        let cards: Vec<Card> = (2..=9).map(|v| Card(v, Heart)).collect();
        assert_eq!(eval(&cards), Err(GameError::InvalidCardCount(8)));
    }

    // === Classification Tests ===

    #[test]
    fn test_royal_straight_flush() {
        let hand = sorted([
            Card(10, Spade),
            Card(11, Spade),
            Card(12, Spade),
            Card(13, Spade),
            Card(14, Spade),
        ]);
        assert_eq!(classify(&hand), (Rank::RoyalStraightFlush, ACE));
    }

    #[test]
    fn test_wheel_straight_flush_reports_five() {
        let hand = sorted([
            Card(2, Spade),
            Card(3, Spade),
            Card(4, Spade),
            Card(5, Spade),
            Card(14, Spade),
        ]);
        assert_eq!(classify(&hand), (Rank::StraightFlush, 5));
    }

    #[test]
    fn test_wheel_straight_reports_five() {
        let hand = sorted([
            Card(14, Heart),
            Card(2, Spade),
            Card(3, Club),
            Card(4, Spade),
            Card(5, Diamond),
        ]);
        assert_eq!(classify(&hand), (Rank::Straight, 5));
    }

    #[test]
    fn test_broadway_straight_is_not_royal_without_flush() {
        let hand = sorted([
            Card(10, Heart),
            Card(11, Spade),
            Card(12, Club),
            Card(13, Spade),
            Card(14, Diamond),
        ]);
        assert_eq!(classify(&hand), (Rank::Straight, ACE));
    }

    #[test]
    fn test_four_of_a_kind_high_and_low() {
        let low = sorted([
            Card(3, Heart),
            Card(3, Spade),
            Card(3, Club),
            Card(3, Diamond),
            Card(9, Diamond),
        ]);
        assert_eq!(classify(&low), (Rank::FourOfAKind, 3));
        let high = sorted([
            Card(2, Heart),
            Card(9, Spade),
            Card(9, Club),
            Card(9, Diamond),
            Card(9, Heart),
        ]);
        assert_eq!(classify(&high), (Rank::FourOfAKind, 9));
    }

    #[test]
    fn test_full_house_high_card_is_trips() {
        let trips_low = sorted([
            Card(3, Heart),
            Card(3, Spade),
            Card(3, Club),
            Card(12, Diamond),
            Card(12, Club),
        ]);
        assert_eq!(classify(&trips_low), (Rank::FullHouse, 3));
        let trips_high = sorted([
            Card(2, Heart),
            Card(2, Spade),
            Card(13, Club),
            Card(13, Diamond),
            Card(13, Heart),
        ]);
        assert_eq!(classify(&trips_high), (Rank::FullHouse, 13));
    }

    #[test]
    fn test_two_pair_with_middle_kicker() {
        let hand = sorted([
            Card(5, Heart),
            Card(5, Spade),
            Card(9, Club),
            Card(13, Diamond),
            Card(13, Club),
        ]);
        assert_eq!(classify(&hand), (Rank::TwoPair, 13));
    }

    #[test]
    fn test_high_card() {
        let hand = sorted([
            Card(2, Heart),
            Card(5, Spade),
            Card(9, Club),
            Card(11, Diamond),
            Card(13, Club),
        ]);
        assert_eq!(classify(&hand), (Rank::HighCard, 13));
    }

    // === Best Hand Tests ===

    #[test]
    fn test_one_pair_of_sixes() {
        let cards = [
            Card(12, Spade),
            Card(6, Heart),
            Card(14, Club),
            Card(13, Spade),
            Card(6, Spade),
            Card(3, Club),
            Card(2, Club),
        ];
        let best = eval(&cards).unwrap();
        assert_eq!(best.rank, Rank::OnePair);
        assert_eq!(best.high_card, 6);
        assert_eq!(best.cards.map(|c| c.0), [6, 6, 12, 13, 14]);
    }

    #[test]
    fn test_full_house_kicker_pair_breaks_tie() {
        // 333-QQ must beat 333-22 when both are available.
        let cards = [
            Card(3, Heart),
            Card(3, Spade),
            Card(3, Club),
            Card(2, Diamond),
            Card(2, Club),
            Card(12, Heart),
            Card(12, Spade),
        ];
        let best = eval(&cards).unwrap();
        assert_eq!(best.rank, Rank::FullHouse);
        assert_eq!(best.cards.map(|c| c.0), [3, 3, 3, 12, 12]);
    }

    #[test]
    fn test_flush_picks_highest_five() {
        let cards = [
            Card(2, Heart),
            Card(4, Heart),
            Card(7, Heart),
            Card(9, Heart),
            Card(11, Heart),
            Card(13, Heart),
            Card(14, Spade),
        ];
        let best = eval(&cards).unwrap();
        assert_eq!(best.rank, Rank::Flush);
        assert_eq!(best.cards.map(|c| c.0), [4, 7, 9, 11, 13]);
    }

    #[test]
    fn test_six_high_straight_beats_wheel() {
        let cards = [
            Card(14, Heart),
            Card(2, Spade),
            Card(3, Club),
            Card(4, Spade),
            Card(5, Diamond),
            Card(6, Diamond),
            Card(13, Club),
        ];
        let best = eval(&cards).unwrap();
        assert_eq!((best.rank, best.high_card), (Rank::Straight, 6));
    }

    // === Comparison Tests ===

    fn best(cards: Hand) -> BestHand {
        let cards = sorted(cards);
        let (rank, high_card) = classify(&cards);
        BestHand {
            rank,
            high_card,
            cards,
        }
    }

    #[test]
    fn test_compare_one_pair_kickers() {
        let queen_kicker = best([
            Card(6, Heart),
            Card(6, Spade),
            Card(12, Club),
            Card(13, Diamond),
            Card(14, Club),
        ]);
        let jack_kicker = best([
            Card(6, Diamond),
            Card(6, Club),
            Card(11, Club),
            Card(13, Spade),
            Card(14, Heart),
        ]);
        assert_eq!(compare(&queen_kicker, &jack_kicker), Ordering::Greater);
    }

    #[test]
    fn test_compare_two_pair_walks_sorted_values_from_the_top() {
        // Same pair of kings; the 9 in KK-55-9 outranks the 7 in KK-66-7.
        let sixes = best([
            Card(6, Heart),
            Card(6, Spade),
            Card(7, Club),
            Card(13, Diamond),
            Card(13, Club),
        ]);
        let fives = best([
            Card(5, Heart),
            Card(5, Spade),
            Card(9, Club),
            Card(13, Spade),
            Card(13, Heart),
        ]);
        assert_eq!(sixes.high_card, fives.high_card);
        assert_eq!(compare(&fives, &sixes), Ordering::Greater);
        assert_eq!(compare(&sixes, &fives), Ordering::Less);
    }

    #[test]
    fn test_compare_identical_values_is_equal() {
        let a = best([
            Card(2, Heart),
            Card(5, Spade),
            Card(9, Club),
            Card(11, Diamond),
            Card(13, Club),
        ]);
        let b = best([
            Card(2, Club),
            Card(5, Heart),
            Card(9, Spade),
            Card(11, Club),
            Card(13, Diamond),
        ]);
        assert_eq!(compare(&a, &b), Ordering::Equal);
    }

    #[test]
    fn test_compare_wheels_are_equal() {
        let spades = best([
            Card(14, Spade),
            Card(2, Spade),
            Card(3, Club),
            Card(4, Spade),
            Card(5, Diamond),
        ]);
        let hearts = best([
            Card(14, Heart),
            Card(2, Heart),
            Card(3, Diamond),
            Card(4, Club),
            Card(5, Club),
        ]);
        assert_eq!(compare(&spades, &hearts), Ordering::Equal);
    }
}
