use rand::seq::SliceRandom;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use uuid::Uuid;

use super::constants;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Suit {
    Club,
    Spade,
    Diamond,
    Heart,
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Club => "♣",
            Self::Spade => "♠",
            Self::Diamond => "♦",
            Self::Heart => "♥",
        };
        write!(f, "{repr}")
    }
}

/// Card value, two through ace (2..=14).
pub type Value = u8;

pub const TWO: Value = 2;
pub const FIVE: Value = 5;
pub const TEN: Value = 10;
pub const ACE: Value = 14;

/// Value and suit. Cards order by value first, so sorting a hand puts
/// it in ascending rank order.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Card(pub Value, pub Suit);

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            ACE | 1 => write!(f, "A{}", self.1),
            11 => write!(f, "J{}", self.1),
            12 => write!(f, "Q{}", self.1),
            13 => write!(f, "K{}", self.1),
            v => write!(f, "{v}{}", self.1),
        }
    }
}

/// Hand categories, weakest first so the derived ordering matches
/// hand strength.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Rank {
    HighCard,
    OnePair,
    TwoPair,
    ThreeOfAKind,
    Straight,
    Flush,
    FullHouse,
    FourOfAKind,
    StraightFlush,
    RoyalStraightFlush,
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::HighCard => "High Card",
            Self::OnePair => "One Pair",
            Self::TwoPair => "Two Pair",
            Self::ThreeOfAKind => "Three of a Kind",
            Self::Straight => "Straight",
            Self::Flush => "Flush",
            Self::FullHouse => "Full House",
            Self::FourOfAKind => "Four of a Kind",
            Self::StraightFlush => "Straight Flush",
            Self::RoyalStraightFlush => "Royal Straight Flush",
        })
    }
}

/// The strongest five cards a player can make at showdown.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct BestHand {
    pub rank: Rank,
    /// Value that defines the category, e.g. the trips of a full house
    /// or the top card of a straight (5 for the wheel).
    pub high_card: Value,
    /// Sorted ascending by value.
    pub cards: [Card; constants::HAND_SIZE],
}

impl fmt::Display for BestHand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.rank)?;
        for card in &self.cards {
            write!(f, " {card}")?;
        }
        Ok(())
    }
}

/// A standard deck. It's shuffled once when created and cards are
/// drawn from the back.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    #[must_use]
    pub fn new() -> Self {
        let mut deck = Self::ordered();
        deck.cards.shuffle(&mut rand::rng());
        deck
    }

    /// An unshuffled deck, two through ace for each suit.
    #[must_use]
    pub fn ordered() -> Self {
        let mut cards = Vec::with_capacity(52);
        for value in TWO..=ACE {
            for suit in [Suit::Spade, Suit::Heart, Suit::Diamond, Suit::Club] {
                cards.push(Card(value, suit));
            }
        }
        Self { cards }
    }

    /// Remove and return the last card.
    ///
    /// # Panics
    ///
    /// Panics if the deck is empty. A hand never needs more than
    /// 5 + 2 * `MAX_PLAYERS` cards, so running out means the caller
    /// is broken.
    pub fn draw(&mut self) -> Card {
        match self.cards.pop() {
            Some(card) => card,
            None => panic!("drew from an empty deck"),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

impl Default for Deck {
    fn default() -> Self {
        Self::new()
    }
}

/// Type alias for whole chips. Bets, stacks, and bankrolls are all
/// counted in whole chips.
pub type Chips = u64;

/// Rooms are keyed by a random UUID.
pub type RoomId = Uuid;

#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Username(String);

impl Username {
    pub fn new(s: &str) -> Self {
        let mut username: String = s
            .chars()
            .map(|c| if c.is_ascii_whitespace() { '_' } else { c })
            .collect();
        username.truncate(constants::MAX_USER_INPUT_LENGTH);
        Self(username)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<'de> Deserialize<'de> for Username {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::new(&s))
    }
}

impl From<String> for Username {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

impl From<&str> for Username {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Betting phase of a hand. `Showdown` is only ever reported in bet
/// responses; the game itself goes straight from `River` back to
/// `FreeFlop` once the pot is paid.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Street {
    #[default]
    FreeFlop,
    Flop,
    Turn,
    River,
    Showdown,
}

impl Street {
    /// The street that follows a completed betting round.
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            Self::FreeFlop => Self::Flop,
            Self::Flop => Self::Turn,
            Self::Turn => Self::River,
            Self::River | Self::Showdown => Self::Showdown,
        }
    }

    /// Board cards dealt when the game moves onto this street.
    #[must_use]
    pub fn cards_to_deal(self) -> usize {
        match self {
            Self::Flop => 3,
            Self::Turn | Self::River => 1,
            Self::FreeFlop | Self::Showdown => 0,
        }
    }
}

impl fmt::Display for Street {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::FreeFlop => "FreeFlop",
            Self::Flop => "Flop",
            Self::Turn => "Turn",
            Self::River => "River",
            Self::Showdown => "Showdown",
        };
        write!(f, "{repr}")
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum BetAction {
    AllIn,
    Check,
    Raise,
}

impl fmt::Display for BetAction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::AllIn => "all-ins",
            Self::Check => "checks",
            Self::Raise => "raises",
        };
        write!(f, "{repr}")
    }
}
