//! Cards, decks, hole cards, actions, and table configuration.

use chrono::{DateTime, Utc};
use rand::{seq::SliceRandom, thread_rng};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{collections::VecDeque, fmt, str::FromStr};
use thiserror::Error;

use super::constants::DECK_SIZE;
use super::rules::Game;

/// Type alias for chip amounts. All bets and stacks are whole chips.
pub type Chips = i64;

/// Type alias for seat positions at the table.
pub type Seat = usize;

/// The rank of a card, from two up to ace.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Rank {
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
    Ace,
}

impl Rank {
    /// Index of the rank in ace-high order: two is 0, ace is 12.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Index of the rank in ace-low order: ace is 0, king is 12.
    pub fn ace_low_index(self) -> usize {
        match self {
            Self::Ace => 0,
            r => r.index() + 1,
        }
    }

    pub(crate) fn from_char(c: char) -> Option<Self> {
        let rank = match c {
            '2' => Self::Two,
            '3' => Self::Three,
            '4' => Self::Four,
            '5' => Self::Five,
            '6' => Self::Six,
            '7' => Self::Seven,
            '8' => Self::Eight,
            '9' => Self::Nine,
            'T' => Self::Ten,
            'J' => Self::Jack,
            'Q' => Self::Queen,
            'K' => Self::King,
            'A' => Self::Ace,
            _ => return None,
        };
        Some(rank)
    }

    pub(crate) fn as_char(self) -> char {
        match self {
            Self::Two => '2',
            Self::Three => '3',
            Self::Four => '4',
            Self::Five => '5',
            Self::Six => '6',
            Self::Seven => '7',
            Self::Eight => '8',
            Self::Nine => '9',
            Self::Ten => 'T',
            Self::Jack => 'J',
            Self::Queen => 'Q',
            Self::King => 'K',
            Self::Ace => 'A',
        }
    }

    /// Name of the rank in singular form such as "two".
    pub(crate) fn singular_name(self) -> &'static str {
        match self {
            Self::Two => "two",
            Self::Three => "three",
            Self::Four => "four",
            Self::Five => "five",
            Self::Six => "six",
            Self::Seven => "seven",
            Self::Eight => "eight",
            Self::Nine => "nine",
            Self::Ten => "ten",
            Self::Jack => "jack",
            Self::Queen => "queen",
            Self::King => "king",
            Self::Ace => "ace",
        }
    }

    /// Name of the rank in plural form such as "twos".
    pub(crate) fn plural_name(self) -> &'static str {
        match self {
            Self::Two => "twos",
            Self::Three => "threes",
            Self::Four => "fours",
            Self::Five => "fives",
            Self::Six => "sixes",
            Self::Seven => "sevens",
            Self::Eight => "eights",
            Self::Nine => "nines",
            Self::Ten => "tens",
            Self::Jack => "jacks",
            Self::Queen => "queens",
            Self::King => "kings",
            Self::Ace => "aces",
        }
    }

    /// All ranks in ascending ace-high order.
    pub fn all() -> [Self; 13] {
        [
            Self::Two,
            Self::Three,
            Self::Four,
            Self::Five,
            Self::Six,
            Self::Seven,
            Self::Eight,
            Self::Nine,
            Self::Ten,
            Self::Jack,
            Self::Queen,
            Self::King,
            Self::Ace,
        ]
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// The suit of a card.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Suit {
    Spades,
    Hearts,
    Diamonds,
    Clubs,
}

impl Suit {
    pub(crate) fn from_char(c: char) -> Option<Self> {
        let suit = match c {
            '♠' => Self::Spades,
            '♥' => Self::Hearts,
            '♦' => Self::Diamonds,
            '♣' => Self::Clubs,
            _ => return None,
        };
        Some(suit)
    }

    pub(crate) fn symbol(self) -> char {
        match self {
            Self::Spades => '♠',
            Self::Hearts => '♥',
            Self::Diamonds => '♦',
            Self::Clubs => '♣',
        }
    }

    /// All four suits.
    pub fn all() -> [Self; 4] {
        [Self::Spades, Self::Hearts, Self::Diamonds, Self::Clubs]
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Error returned when a card's two-character form fails to parse.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[error(r#"card serialization should be of the format "4♠""#)]
pub struct ParseCardError;

/// A playing card: a rank and a suit.
///
/// The wire format is the two-character string `<rank><suit>`, e.g. `T♠`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    pub const fn new(rank: Rank, suit: Suit) -> Self {
        Self { rank, suit }
    }

    /// All 52 cards, grouped by suit with ranks descending.
    pub fn all() -> Vec<Self> {
        let mut cards = Vec::with_capacity(DECK_SIZE);
        for suit in Suit::all() {
            for rank in Rank::all().iter().rev() {
                cards.push(Self::new(*rank, suit));
            }
        }
        cards
    }

    /// All 52 cards ordered by descending rank, suits interleaved.
    pub fn all_by_rank() -> Vec<Self> {
        let mut cards = Vec::with_capacity(DECK_SIZE);
        for rank in Rank::all().iter().rev() {
            for suit in [Suit::Spades, Suit::Hearts, Suit::Clubs, Suit::Diamonds] {
                cards.push(Self::new(*rank, suit));
            }
        }
        cards
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank, self.suit)
    }
}

impl FromStr for Card {
    type Err = ParseCardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let rank = chars
            .next()
            .and_then(Rank::from_char)
            .ok_or(ParseCardError)?;
        let suit = chars
            .next()
            .and_then(Suit::from_char)
            .ok_or(ParseCardError)?;
        if chars.next().is_some() {
            return Err(ParseCardError);
        }
        Ok(Self::new(rank, suit))
    }
}

impl Serialize for Card {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Card {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// An ordered draw pile of remaining cards.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Deck {
    cards: VecDeque<Card>,
}

impl Deck {
    /// A full deck in a uniformly random order.
    pub fn shuffled() -> Self {
        let mut cards = Card::all();
        cards.shuffle(&mut thread_rng());
        Self {
            cards: cards.into(),
        }
    }

    /// A deck that deals exactly the given cards in the given order.
    pub fn scripted(cards: Vec<Card>) -> Self {
        Self {
            cards: cards.into(),
        }
    }

    /// Removes and returns the next card.
    ///
    /// Panics when the deck is empty; seat caps guarantee a full deck covers
    /// any hand, so an empty deal is a programmer error.
    pub fn deal(&mut self) -> Card {
        self.cards
            .pop_front()
            .expect("deck: dealt from an empty deck")
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

/// A dealer produces a fresh deck at the start of each hand.
pub trait Dealer: Send + Sync {
    fn new_deck(&self) -> Deck;
}

/// The standard dealer: a uniformly shuffled deck per hand.
pub struct StandardDealer;

impl Dealer for StandardDealer {
    fn new_deck(&self) -> Deck {
        Deck::shuffled()
    }
}

/// Whether a hole card is visible to other players.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Visibility {
    Concealed,
    Exposed,
}

/// A hole card: a card plus its visibility.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct HoleCard {
    pub card: Card,
    pub visibility: Visibility,
}

impl HoleCard {
    pub fn concealed(card: Card) -> Self {
        Self {
            card,
            visibility: Visibility::Concealed,
        }
    }

    pub fn exposed(card: Card) -> Self {
        Self {
            card,
            visibility: Visibility::Exposed,
        }
    }

    pub fn expose(&mut self) {
        self.visibility = Visibility::Exposed;
    }

    pub fn conceal(&mut self) {
        self.visibility = Visibility::Concealed;
    }
}

impl fmt::Display for HoleCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.visibility {
            Visibility::Exposed => write!(f, "{}", self.card),
            Visibility::Concealed => write!(f, "??"),
        }
    }
}

/// Serialized form of a hole card. Redacted views keep the slot but drop
/// the card itself.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct HoleCardSnapshot {
    pub card: Option<Card>,
    pub visibility: Visibility,
}

impl HoleCardSnapshot {
    pub(crate) fn redacted() -> Self {
        Self {
            card: None,
            visibility: Visibility::Concealed,
        }
    }
}

impl From<&HoleCard> for HoleCardSnapshot {
    fn from(hc: &HoleCard) -> Self {
        Self {
            card: Some(hc.card),
            visibility: hc.visibility,
        }
    }
}

/// An action a player can take in a hand.
///
/// `Bet` and `Raise` carry the round total the player is wagering,
/// including chips already committed this round. `Stand` is only used to
/// leave the table outside a hand.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Action {
    Fold,
    Check,
    Call,
    Bet(Chips),
    Raise(Chips),
    #[serde(rename = "stand")]
    Stand,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Fold => "fold".to_string(),
            Self::Check => "check".to_string(),
            Self::Call => "call".to_string(),
            Self::Bet(chips) => format!("bet {chips}"),
            Self::Raise(chips) => format!("raise {chips}"),
            Self::Stand => "stand".to_string(),
        };
        write!(f, "{repr}")
    }
}

/// Audit record of one accepted action, handed back to the player via
/// `Player::save_action`.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRecord {
    pub player_id: i64,
    pub action: Action,
    pub chips: Chips,
    pub action_time: DateTime<Utc>,
    pub timeout: bool,
    pub round_pot: Chips,
    pub pot: Chips,
}

/// The rung of the straddle ladder a seat posted.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum StraddleCategory {
    Straddle1,
    Straddle2,
    Straddle3,
}

impl From<StraddleCategory> for u8 {
    fn from(c: StraddleCategory) -> u8 {
        match c {
            StraddleCategory::Straddle1 => 1,
            StraddleCategory::Straddle2 => 2,
            StraddleCategory::Straddle3 => 3,
        }
    }
}

impl TryFrom<u8> for StraddleCategory {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            1 => Ok(Self::Straddle1),
            2 => Ok(Self::Straddle2),
            3 => Ok(Self::Straddle3),
            v => Err(format!("invalid straddle category {v}")),
        }
    }
}

/// One posted straddle, recorded in the table's straddle log.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct StraddleSeat {
    #[serde(skip)]
    pub user_id: i64,
    pub seat: Seat,
    pub category: StraddleCategory,
    pub voluntary: bool,
}

/// The forced bet amounts for the table.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stakes {
    /// The smaller forced bet amount.
    pub small_bet: Chips,
    /// The bigger forced bet amount.
    pub big_bet: Chips,
    /// The amount required from each player to start the hand.
    pub ante: Chips,
    /// Whether the voluntary straddle ladder is enabled.
    pub straddle: bool,
}

impl fmt::Display for Stakes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.small_bet, self.big_bet)
    }
}

/// The bet and raise limits of a poker game.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Limit {
    /// No limit; players may go all in.
    #[serde(rename = "NL")]
    NoLimit,
    /// The current value of the pot is the limit.
    #[serde(rename = "PL")]
    PotLimit,
    /// Bets and raises are restricted to predefined per-round values.
    #[serde(rename = "FL")]
    FixedLimit,
}

/// Configuration for creating a table.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// The game of the table.
    pub game: Game,
    /// The limit of the table.
    pub limit: Limit,
    /// The stakes of the table.
    pub stakes: Stakes,
    /// The number of seats available, at most `game.max_seats()`.
    pub num_of_seats: usize,
}
