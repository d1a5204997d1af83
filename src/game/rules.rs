//! Variant-specific rules: card schedules, forced bets, and hand builders.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::constants::{MAX_SEATS, NUM_OF_ROUNDS};
use super::entities::{Card, Chips, Deck, HoleCard, Seat, Stakes};
use super::functional::{omaha_eight_or_better, omaha_high, Hand, Sorting};

/// Betting rounds, in order.
pub(crate) const PREFLOP: usize = 0;
pub(crate) const FLOP: usize = 1;
pub(crate) const TURN: usize = 2;
pub(crate) const RIVER: usize = 3;

/// A poker variant and its rules.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Game {
    /// Texas Hold'em: two hole cards, best five of seven.
    Holdem,
    /// Omaha high: four hole cards, exactly two of them plus exactly three
    /// board cards.
    OmahaHi,
    /// Omaha high/low split with an eight-or-better low qualifier.
    OmahaHiLo,
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Holdem => "Hold'em",
            Self::OmahaHi => "Omaha Hi",
            Self::OmahaHiLo => "Omaha Hi/Lo",
        };
        write!(f, "{repr}")
    }
}

impl Game {
    /// Maximum seats the variant supports.
    pub fn max_seats(&self) -> usize {
        MAX_SEATS
    }

    pub(crate) fn num_of_rounds(&self) -> usize {
        NUM_OF_ROUNDS
    }

    /// Hole cards dealt to each player at the given round.
    pub(crate) fn hole_cards(&self, deck: &mut Deck, round: usize) -> Vec<HoleCard> {
        if round != PREFLOP {
            return Vec::new();
        }
        let count = match self {
            Self::Holdem => 2,
            Self::OmahaHi | Self::OmahaHiLo => 4,
        };
        (0..count).map(|_| HoleCard::concealed(deck.deal())).collect()
    }

    /// Community cards flipped at the given round.
    pub(crate) fn board_cards(&self, deck: &mut Deck, round: usize) -> Vec<Card> {
        let count = match round {
            FLOP => 3,
            TURN | RIVER => 1,
            _ => 0,
        };
        (0..count).map(|_| deck.deal()).collect()
    }

    /// The forced bet owed by the seat at the given relative position:
    /// the ante plus the small or big blind preflop, nothing afterwards.
    /// Heads-up, the button posts the small blind.
    pub(crate) fn forced_bet(
        &self,
        num_players: usize,
        stakes: &Stakes,
        round: usize,
        _seat: Seat,
        relative_pos: usize,
    ) -> Chips {
        if round != PREFLOP {
            return 0;
        }
        let (small_pos, big_pos) = blind_positions(num_players);
        let blind = if relative_pos == small_pos {
            stakes.small_bet
        } else if relative_pos == big_pos {
            stakes.big_bet
        } else {
            0
        };
        stakes.ante + blind
    }

    /// The relative position (distance from the button) that acts first in
    /// the given round. Preflop it is the seat after the big blind; heads-up
    /// the button acts first preflop.
    pub(crate) fn round_start_pos(&self, num_players: usize, round: usize) -> usize {
        if round == PREFLOP {
            if num_players == 2 {
                0
            } else {
                // Three-handed the seat after the big blind is the button.
                3 % num_players
            }
        } else {
            1
        }
    }

    /// Per-round bet size in fixed-limit play: the big bet on the early
    /// rounds, twice that on the turn and river.
    pub(crate) fn fixed_limit(&self, stakes: &Stakes, round: usize) -> Chips {
        if round < TURN {
            stakes.big_bet
        } else {
            2 * stakes.big_bet
        }
    }

    /// The base sorting mode of the variant.
    pub fn sorting(&self) -> Sorting {
        Sorting::High
    }

    pub(crate) fn form_high_hand(&self, hole_cards: &[Card], board: &[Card]) -> Hand {
        match self {
            Self::Holdem => {
                let mut cards = board.to_vec();
                cards.extend_from_slice(hole_cards);
                Hand::new(&cards)
            }
            Self::OmahaHi | Self::OmahaHiLo => omaha_high(hole_cards, board),
        }
    }

    pub(crate) fn form_low_hand(&self, hole_cards: &[Card], board: &[Card]) -> Option<Hand> {
        match self {
            Self::Holdem | Self::OmahaHi => None,
            Self::OmahaHiLo => omaha_eight_or_better(hole_cards, board),
        }
    }
}

/// Relative blind positions: heads-up the button is the small blind.
pub(crate) fn blind_positions(num_players: usize) -> (usize, usize) {
    if num_players == 2 {
        (0, 1)
    } else {
        (1, 2)
    }
}
