//! Table-wide constants.

/// Number of cards in a deck.
pub const DECK_SIZE: usize = 52;

/// Maximum number of community cards on the board.
pub const BOARD_SIZE: usize = 5;

/// Number of betting rounds in a hand: preflop, flop, turn, river.
pub const NUM_OF_ROUNDS: usize = 4;

/// Maximum seats at any table.
pub const MAX_SEATS: usize = 10;

/// Cards forming a ranked hand.
pub const HAND_SIZE: usize = 5;

/// Maximum rungs in the voluntary straddle ladder.
pub const MAX_STRADDLES: usize = 3;

/// Minimum players seated with the straddle flag for the ladder to run.
pub const MIN_STRADDLE_PLAYERS: usize = 4;
