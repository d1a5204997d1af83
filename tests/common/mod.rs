#![allow(dead_code)]

//! Shared test harness: a scripted player that replays queued actions, and
//! a hosted player that checks or calls whatever the table allows.

use poker_table::{Action, ActionRecord, Decision, Player, Table, TableError};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, Weak};

pub struct TestPlayer {
    id: i64,
    nickname: String,
    hosted: bool,
    actions: Mutex<VecDeque<Action>>,
    saved: Mutex<Vec<(usize, ActionRecord)>>,
    table: Mutex<Weak<Table>>,
}

impl TestPlayer {
    pub fn new(id: i64) -> Arc<Self> {
        Arc::new(Self {
            id,
            nickname: format!("player{id}"),
            hosted: false,
            actions: Mutex::new(VecDeque::new()),
            saved: Mutex::new(Vec::new()),
            table: Mutex::new(Weak::new()),
        })
    }

    /// A player on autopilot: checks when possible, calls otherwise.
    pub fn hosted(id: i64, table: &Arc<Table>) -> Arc<Self> {
        Arc::new(Self {
            id,
            nickname: format!("player{id}"),
            hosted: true,
            actions: Mutex::new(VecDeque::new()),
            saved: Mutex::new(Vec::new()),
            table: Mutex::new(Arc::downgrade(table)),
        })
    }

    pub fn check(&self) {
        self.queue(Action::Check);
    }

    pub fn call(&self) {
        self.queue(Action::Call);
    }

    pub fn fold(&self) {
        self.queue(Action::Fold);
    }

    pub fn bet(&self, chips: i64) {
        self.queue(Action::Bet(chips));
    }

    pub fn raise(&self, chips: i64) {
        self.queue(Action::Raise(chips));
    }

    fn queue(&self, action: Action) {
        self.actions.lock().unwrap().push_back(action);
    }

    pub fn saved_actions(&self) -> Vec<(usize, ActionRecord)> {
        self.saved.lock().unwrap().clone()
    }

    fn hosted_action(&self) -> Action {
        let table = self
            .table
            .lock()
            .unwrap()
            .upgrade()
            .expect("hosted player outlived its table");
        let valid = table.valid_actions();
        if valid.iter().any(|a| matches!(a, Action::Check)) {
            Action::Check
        } else if valid.iter().any(|a| matches!(a, Action::Call)) {
            Action::Call
        } else {
            Action::Fold
        }
    }
}

impl Player for TestPlayer {
    fn id(&self) -> i64 {
        self.id
    }

    fn nickname(&self) -> String {
        self.nickname.clone()
    }

    fn country(&self) -> String {
        String::new()
    }

    fn hosted(&self) -> bool {
        self.hosted
    }

    fn play_duration(&self) -> i64 {
        0
    }

    fn next_action(&self) -> Decision {
        if self.hosted {
            return Decision::apply(self.hosted_action());
        }
        let action = self
            .actions
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("player {} doesn't have enough actions", self.id));
        Decision::apply(action)
    }

    fn save_action(&self, round: usize, record: ActionRecord) {
        self.saved.lock().unwrap().push((round, record));
    }

    fn resolve_id(&self, id: i64) -> Result<Arc<dyn Player>, TableError> {
        Ok(TestPlayer::new(id))
    }
}
