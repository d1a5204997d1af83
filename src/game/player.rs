//! The seat participant contract and the snapshot rehydration registry.

use std::sync::{Arc, RwLock};

use super::entities::{Action, ActionRecord};
use super::state_machine::TableError;

/// A player's answer to an action request.
#[derive(Clone, Copy, Debug)]
pub struct Decision {
    pub action: Action,
    /// Advisory tag for audit: the player implementation timed out and
    /// produced this action on the player's behalf.
    pub timed_out: bool,
    /// The table must not apply this decision and must not advance the
    /// action cursor. Used for out-of-band re-requests.
    pub ignore: bool,
}

impl Decision {
    pub fn apply(action: Action) -> Self {
        Self {
            action,
            timed_out: false,
            ignore: false,
        }
    }

    pub fn ignore() -> Self {
        Self {
            action: Action::Fold,
            timed_out: false,
            ignore: true,
        }
    }
}

/// A player at a table.
///
/// The table holds the only reference chain to seated players; player
/// implementations must not hold owning references back to the table.
pub trait Player: Send + Sync {
    /// The unique identifier of the player.
    fn id(&self) -> i64;

    fn nickname(&self) -> String;

    /// ISO 3166 country code.
    fn country(&self) -> String;

    /// Whether the seat is on autopilot.
    fn hosted(&self) -> bool;

    /// Accumulated play time in seconds.
    fn play_duration(&self) -> i64;

    /// Returns the player's next action. This method may block the table's
    /// `next()` call until input is received; the implementation is
    /// responsible for timing out and tagging the decision accordingly.
    fn next_action(&self) -> Decision;

    /// Observer callback invoked after the table has accepted an action.
    fn save_action(&self, round: usize, record: ActionRecord);

    /// Rebuilds a player from an id. Required for snapshot
    /// deserialization.
    fn resolve_id(&self, id: i64) -> Result<Arc<dyn Player>, TableError>;
}

// Prototype player used to resolve ids during snapshot deserialization.
static REGISTERED_PLAYER: RwLock<Option<Arc<dyn Player>>> = RwLock::new(None);

/// Stores the player prototype used for snapshot deserialization.
/// Deserializing a table without a registered player fails.
pub fn register_player(player: Arc<dyn Player>) {
    *REGISTERED_PLAYER
        .write()
        .expect("player registry poisoned") = Some(player);
}

pub(crate) fn resolve_registered(id: i64) -> Result<Arc<dyn Player>, TableError> {
    let registered = REGISTERED_PLAYER
        .read()
        .expect("player registry poisoned")
        .clone();
    match registered {
        Some(prototype) => prototype.resolve_id(id),
        None => Err(TableError::Deserialization(
            "player state deserialization requires use of register_player".to_string(),
        )),
    }
}
