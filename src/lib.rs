//! # Poker Table
//!
//! A poker table engine that drives betting hands from deal to showdown.
//!
//! The engine tracks every chip contributed to the pot, partitions unequal
//! all-in bets into a main pot and side pots, arbitrates which actions are
//! legal at each turn, and awards each pot to the best eligible hand with
//! correct remainder distribution.
//!
//! ## Architecture
//!
//! The [`Table`] is the root aggregate. Each call to [`Table::next`] advances
//! the state machine by one step:
//!
//! - **Hand setup**: draw a fresh deck, advance the button, reset the pot
//! - **Round setup**: deal board and hole cards, post forced bets and
//!   straddles, seat the action cursor
//! - **Action**: ask the current [`Player`] for an action, validate it
//!   against the betting state, and move the cursor
//! - **Showdown**: form hands for the remaining players and pay out the pot
//!   and all side pots
//!
//! ## Core Modules
//!
//! - [`game`]: cards, hand evaluation, pot ledger, variant rules, and the
//!   table state machine
//! - [`pokertest`]: scripted decks and card literals for deterministic tests
//!
//! ## Example
//!
//! ```
//! use poker_table::{Config, Game, Limit, Stakes, StandardDealer, Table};
//!
//! let opts = Config {
//!     game: Game::Holdem,
//!     limit: Limit::NoLimit,
//!     stakes: Stakes { small_bet: 1, big_bet: 2, ante: 0, straddle: false },
//!     num_of_seats: 6,
//! };
//! let table = Table::new(opts, Box::new(StandardDealer));
//! assert_eq!(table.empty_seats().len(), 6);
//! ```

/// Core game logic: entities, hand evaluation, pot ledger, rules, and the
/// table state machine.
pub mod game;

/// Scripted decks and card literals for deterministic tests.
pub mod pokertest;

pub use game::{
    constants,
    entities::{
        Action, ActionRecord, Card, Chips, Config, Dealer, Deck, HoleCard, Limit, Rank, Seat,
        Stakes, StandardDealer, StraddleCategory, StraddleSeat, Suit, Visibility,
    },
    functional::{omaha_eight_or_better, omaha_high, Hand, Ranking, Sorting},
    player::{register_player, Decision, Player},
    pot::{Hands, Pot, PotResult, Results, Share},
    rules::Game,
    state_machine::{calc_outs, PlayerState, Table, TableError, TableSnapshot},
};
