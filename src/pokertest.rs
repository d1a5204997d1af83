//! Scripted decks and card literals for deterministic tests.
//!
//! Card literals accept both the wire suit glyphs (`"T♠"`) and the ASCII
//! shorthand used in test fixtures (`"Ts"`, `"Td"`, `"Th"`, `"Tc"`).

use crate::game::entities::{Card, Dealer, Deck, Rank, Suit};

/// Parses a single card literal. Panics on malformed input; this is test
/// support, not a wire format.
pub fn card(s: &str) -> Card {
    let mut chars = s.chars();
    let rank = chars
        .next()
        .and_then(Rank::from_char)
        .unwrap_or_else(|| panic!("pokertest: bad card rank in {s:?}"));
    let suit = match chars.next() {
        Some('s') | Some('♠') => Suit::Spades,
        Some('h') | Some('♥') => Suit::Hearts,
        Some('d') | Some('♦') => Suit::Diamonds,
        Some('c') | Some('♣') => Suit::Clubs,
        _ => panic!("pokertest: bad card suit in {s:?}"),
    };
    assert!(chars.next().is_none(), "pokertest: bad card literal {s:?}");
    Card::new(rank, suit)
}

/// Parses a list of card literals.
pub fn cards(literals: &[&str]) -> Vec<Card> {
    literals.iter().map(|s| card(s)).collect()
}

/// A dealer that deals exactly the given cards in the given order each
/// hand.
pub struct ScriptedDealer {
    cards: Vec<Card>,
}

impl ScriptedDealer {
    pub fn new(cards: Vec<Card>) -> Self {
        Self { cards }
    }
}

impl Dealer for ScriptedDealer {
    fn new_deck(&self) -> Deck {
        Deck::scripted(self.cards.clone())
    }
}

/// Shorthand for a boxed scripted dealer over card literals.
pub fn dealer(literals: &[&str]) -> Box<ScriptedDealer> {
    Box::new(ScriptedDealer::new(cards(literals)))
}
