//! Pure hand evaluation.
//!
//! Evaluation takes five to seven cards and produces a [`Hand`]: a ranking,
//! the five cards forming that ranking in tie-break order, and a textual
//! description. Hands compare under their sorting mode: standard high rules,
//! or ace-to-five low where straights and flushes do not count and the
//! lowest hand wins.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

use super::constants::HAND_SIZE;
use super::entities::{Card, Rank};

/// How hands are ordered against each other.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Sorting {
    /// Standard high-poker rules; kickers break ties in descending rank.
    High,
    /// Ace-to-five low; the lowest unpaired hand wins, aces count low,
    /// straights and flushes do not count against the hand.
    Low,
}

/// The ranking of a five-card hand, weakest to strongest.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Ranking {
    HighCard,
    Pair,
    TwoPair,
    ThreeOfAKind,
    Straight,
    Flush,
    FullHouse,
    FourOfAKind,
    StraightFlush,
    RoyalFlush,
}

impl From<Ranking> for u8 {
    fn from(r: Ranking) -> u8 {
        r as u8
    }
}

impl TryFrom<u8> for Ranking {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        let ranking = match v {
            0 => Self::HighCard,
            1 => Self::Pair,
            2 => Self::TwoPair,
            3 => Self::ThreeOfAKind,
            4 => Self::Straight,
            5 => Self::Flush,
            6 => Self::FullHouse,
            7 => Self::FourOfAKind,
            8 => Self::StraightFlush,
            9 => Self::RoyalFlush,
            v => return Err(format!("invalid hand ranking {v}")),
        };
        Ok(ranking)
    }
}

/// A ranked hand. Cards are held in tie-break order: comparing two hands
/// of the same ranking walks the cards left to right.
#[derive(Clone, Debug, PartialEq)]
pub struct Hand {
    sorting: Sorting,
    ranking: Ranking,
    cards: Vec<Card>,
    description: String,
}

impl Hand {
    /// The best high hand formed from any five of the given cards.
    pub fn new(cards: &[Card]) -> Self {
        best_hand(cards, false)
    }

    /// The best ace-to-five low hand formed from any five of the given
    /// cards.
    pub fn ace_to_five_low(cards: &[Card]) -> Self {
        best_hand(cards, true)
    }

    /// The best qualifying eight-or-better low, or `None` when no five of
    /// the given cards make an unpaired eight-high or lower.
    pub fn eight_or_better(cards: &[Card]) -> Option<Self> {
        qualify_eight_or_better(Self::ace_to_five_low(cards))
    }

    pub fn ranking(&self) -> Ranking {
        self.ranking
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn sorting(&self) -> Sorting {
        self.sorting
    }

    /// Total order within the hand's sorting mode: `Greater` means this
    /// hand wins. Equal hands compare as `Equal`.
    pub fn compare_to(&self, other: &Hand) -> Ordering {
        debug_assert_eq!(self.sorting, other.sorting);
        let ord = (u8::from(self.ranking), self.tiebreak())
            .cmp(&(u8::from(other.ranking), other.tiebreak()));
        match self.sorting {
            Sorting::High => ord,
            Sorting::Low => ord.reverse(),
        }
    }

    fn tiebreak(&self) -> Vec<usize> {
        self.cards
            .iter()
            .map(|c| match self.sorting {
                Sorting::High => c.rank.index(),
                Sorting::Low => c.rank.ace_low_index(),
            })
            .collect()
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cards = self
            .cards
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        write!(f, "{} ({cards})", self.description)
    }
}

// The json format is:
// {"ranking":9,"cards":["A♠","K♠","Q♠","J♠","T♠"],"description":"royal flush"}
#[derive(Deserialize, Serialize)]
struct HandJson {
    ranking: Ranking,
    cards: Vec<Card>,
    description: String,
}

impl Serialize for Hand {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        HandJson {
            ranking: self.ranking,
            cards: self.cards.clone(),
            description: self.description.clone(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Hand {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let j = HandJson::deserialize(deserializer)?;
        Ok(Self {
            sorting: Sorting::High,
            ranking: j.ranking,
            cards: j.cards,
            description: j.description,
        })
    }
}

/// The best high hand an Omaha holding makes: exactly two of the four hole
/// cards and exactly three board cards, maximized over all combinations.
pub fn omaha_high(hole_cards: &[Card], board: &[Card]) -> Hand {
    omaha_candidates(hole_cards, board)
        .iter()
        .map(|cards| Hand::new(cards))
        .max_by(|a, b| a.compare_to(b))
        .expect("omaha evaluation requires at least two hole cards")
}

/// The best qualifying Omaha eight-or-better low, if any.
pub fn omaha_eight_or_better(hole_cards: &[Card], board: &[Card]) -> Option<Hand> {
    let best = omaha_candidates(hole_cards, board)
        .iter()
        .map(|cards| Hand::ace_to_five_low(cards))
        .max_by(|a, b| a.compare_to(b))?;
    qualify_eight_or_better(best)
}

// Interim boards shorter than three cards fall back to smaller board
// draws so that leading-hand queries work mid-hand.
fn omaha_candidates(hole_cards: &[Card], board: &[Card]) -> Vec<Vec<Card>> {
    let board_take = board.len().min(3);
    let mut candidates = Vec::new();
    for pair in combinations(hole_cards, 2) {
        if board_take == 0 {
            candidates.push(pair);
            continue;
        }
        for board_cards in combinations(board, board_take) {
            let mut cards = pair.clone();
            cards.extend_from_slice(&board_cards);
            candidates.push(cards);
        }
    }
    candidates
}

fn qualify_eight_or_better(low: Hand) -> Option<Hand> {
    let unpaired = low.ranking == Ranking::HighCard;
    let eight_or_lower = low.cards[0].rank.ace_low_index() <= Rank::Eight.ace_low_index();
    (unpaired && eight_or_lower).then_some(low)
}

fn best_hand(cards: &[Card], low: bool) -> Hand {
    assert!(!cards.is_empty(), "hand evaluation requires cards");
    if cards.len() <= HAND_SIZE {
        return score(cards, low);
    }
    combinations(cards, HAND_SIZE)
        .iter()
        .map(|combo| score(combo, low))
        .max_by(|a, b| a.compare_to(b))
        .expect("at least one five-card combination")
}

fn combinations(cards: &[Card], k: usize) -> Vec<Vec<Card>> {
    fn rec(cards: &[Card], k: usize, start: usize, scratch: &mut Vec<Card>, out: &mut Vec<Vec<Card>>) {
        if scratch.len() == k {
            out.push(scratch.clone());
            return;
        }
        let needed = k - scratch.len();
        for i in start..=(cards.len() - needed) {
            scratch.push(cards[i]);
            rec(cards, k, i + 1, scratch, out);
            scratch.pop();
        }
    }

    if k == 0 || k > cards.len() {
        return Vec::new();
    }
    let mut out = Vec::new();
    rec(cards, k, 0, &mut Vec::with_capacity(k), &mut out);
    out
}

// Scores at most five cards. Straights and flushes require all five;
// smaller slices still rank pairs and high cards, which keeps interim
// leading-hand queries working before the board is complete.
fn score(cards: &[Card], low: bool) -> Hand {
    let idx = |r: Rank| {
        if low {
            r.ace_low_index()
        } else {
            r.index()
        }
    };

    let mut sorted = cards.to_vec();
    sorted.sort_by(|a, b| idx(b.rank).cmp(&idx(a.rank)));

    // Rank groups ordered by count, then rank, descending.
    let mut groups: Vec<Vec<Card>> = Vec::new();
    for card in &sorted {
        match groups.iter_mut().find(|g| g[0].rank == card.rank) {
            Some(group) => group.push(*card),
            None => groups.push(vec![*card]),
        }
    }
    groups.sort_by(|a, b| b.len().cmp(&a.len()).then(idx(b[0].rank).cmp(&idx(a[0].rank))));

    let counts: Vec<usize> = groups.iter().map(|g| g.len()).collect();
    let grouped: Vec<Card> = groups.into_iter().flatten().collect();

    let (ranking, ordered) = if low {
        (ranking_from_counts(&counts), grouped)
    } else {
        score_high(&sorted, &counts, grouped)
    };

    let description = describe(ranking, &ordered);
    Hand {
        sorting: if low { Sorting::Low } else { Sorting::High },
        ranking,
        cards: ordered,
        description,
    }
}

fn score_high(sorted: &[Card], counts: &[usize], grouped: Vec<Card>) -> (Ranking, Vec<Card>) {
    let is_flush = sorted.len() == HAND_SIZE && sorted.iter().all(|c| c.suit == sorted[0].suit);
    let straight = straight_order(sorted);

    if let Some(ordered) = straight {
        if is_flush {
            let ranking = if ordered[0].rank == Rank::Ace {
                Ranking::RoyalFlush
            } else {
                Ranking::StraightFlush
            };
            return (ranking, ordered);
        }
        if counts.iter().all(|&c| c == 1) {
            return (Ranking::Straight, ordered);
        }
    }
    if is_flush && counts.iter().all(|&c| c == 1) {
        return (Ranking::Flush, sorted.to_vec());
    }
    (ranking_from_counts(counts), grouped)
}

// Five distinct consecutive ranks, ace high or the wheel. Returns the
// cards in tie-break order: high to low, with the wheel as 5-4-3-2-A.
fn straight_order(sorted: &[Card]) -> Option<Vec<Card>> {
    if sorted.len() != HAND_SIZE {
        return None;
    }
    let indexes: Vec<usize> = sorted.iter().map(|c| c.rank.index()).collect();
    if indexes.windows(2).all(|w| w[0] == w[1] + 1) {
        return Some(sorted.to_vec());
    }
    let wheel = [Rank::Ace, Rank::Five, Rank::Four, Rank::Three, Rank::Two];
    if indexes == wheel.map(|r| r.index()) {
        let mut ordered = sorted[1..].to_vec();
        ordered.push(sorted[0]);
        return Some(ordered);
    }
    None
}

fn ranking_from_counts(counts: &[usize]) -> Ranking {
    match (counts.first().copied().unwrap_or(0), counts.get(1).copied().unwrap_or(0)) {
        (4, _) => Ranking::FourOfAKind,
        (3, 2) => Ranking::FullHouse,
        (3, _) => Ranking::ThreeOfAKind,
        (2, 2) => Ranking::TwoPair,
        (2, _) => Ranking::Pair,
        _ => Ranking::HighCard,
    }
}

fn describe(ranking: Ranking, cards: &[Card]) -> String {
    match ranking {
        Ranking::HighCard => format!("{} high", cards[0].rank.singular_name()),
        Ranking::Pair => format!("pair of {}", cards[0].rank.plural_name()),
        Ranking::TwoPair => format!(
            "two pair, {} and {}",
            cards[0].rank.plural_name(),
            cards[2].rank.plural_name()
        ),
        Ranking::ThreeOfAKind => format!("three of a kind {}", cards[0].rank.plural_name()),
        Ranking::Straight => format!("straight, {} high", cards[0].rank.singular_name()),
        Ranking::Flush => format!("flush, {} high", cards[0].rank.singular_name()),
        Ranking::FullHouse => format!(
            "full house, {} full of {}",
            cards[0].rank.plural_name(),
            cards[3].rank.plural_name()
        ),
        Ranking::FourOfAKind => format!("four of a kind {}", cards[0].rank.plural_name()),
        Ranking::StraightFlush => {
            format!("straight flush, {} high", cards[0].rank.singular_name())
        }
        Ranking::RoyalFlush => "royal flush".to_string(),
    }
}
