//! Poker table engine - core entities and game logic.
//!
//! This module provides the foundational table implementation including:
//! - Cards, decks, and dealers
//! - Pure hand evaluation with high, ace-to-five low, and eight-or-better
//!   rankings
//! - The pot contribution ledger with side-pot partitioning and payout
//! - Variant rules for Hold'em and Omaha
//! - The table state machine that drives hands from deal to showdown

// Submodules
pub mod constants;
pub mod entities;
pub mod functional;
pub mod player;
pub mod pot;
pub mod rules;
pub mod state_machine;
