//! The table state machine.
//!
//! A [`Table`] manages the game state and all player interactions at the
//! table: seating, betting round progression, forced bets and straddles,
//! action validation with minimum-raise tracking, all-in and side-pot
//! bookkeeping, and showdown payout.
//!
//! [`Table::next`] is the sole advancement primitive. One logical writer
//! drives it; read-only accessors and views may be called concurrently
//! from other threads and see a consistent snapshot. The lock is never
//! held across a call into [`Player::next_action`].

use chrono::Utc;
use log::{info, warn};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::mem::discriminant;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;

use super::constants::MIN_STRADDLE_PLAYERS;
use super::entities::{
    Action, ActionRecord, Card, Chips, Config, Dealer, Deck, HoleCard, HoleCardSnapshot, Limit,
    Seat, Stakes, StandardDealer, StraddleCategory, StraddleSeat, Visibility,
};
use super::functional::{omaha_high, Hand};
use super::player::{resolve_registered, Player};
use super::pot::{winning_hands, Hands, Pot, Results};
use super::rules::{blind_positions, Game, PREFLOP};

/// Errors raised by table operations.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum TableError {
    /// A player attempted sitting with a chip amount outside the
    /// permitted range.
    #[error("player attempted sitting with invalid buyin")]
    InvalidBuyin,

    /// A player attempted sitting in a seat that does not exist.
    #[error("player attempted sitting in invalid seat")]
    InvalidSeat,

    /// A player attempted sitting in a seat that is already occupied.
    #[error("player attempted sitting in occupied seat")]
    SeatOccupied,

    /// A player attempted sitting at a table they are already seated at.
    #[error("player attempted sitting when already seated")]
    AlreadySeated,

    /// `next()` cannot start a hand with fewer than two chipped players.
    #[error("insufficient players for next hand")]
    InsufficientPlayers,

    /// A bet amount below the minimum or above the maximum for the limit.
    #[error("player attempted invalid bet")]
    InvalidBet,

    /// A raise amount below the minimum or above the maximum for the
    /// limit.
    #[error("player attempted invalid raise")]
    InvalidRaise,

    /// An action that is not currently allowed, such as a check when
    /// facing a raise.
    #[error("player attempted invalid action")]
    InvalidAction,

    /// A malformed snapshot or a missing registered player factory.
    #[error("deserialization failed: {0}")]
    Deserialization(String),
}

/// The state of a player at a table for the current hand.
#[derive(Clone)]
pub struct PlayerState {
    player: Arc<dyn Player>,
    hole_cards: Vec<HoleCard>,
    chips: Chips,
    begin_chips: Chips,
    acted: bool,
    out: bool,
    allin: bool,
    can_raise: bool,
    round_pot: Chips,
    pot: Chips,
    stand: bool,
    straddle: bool,
}

impl PlayerState {
    fn new(player: Arc<dyn Player>, chips: Chips, straddle: bool) -> Self {
        Self {
            player,
            hole_cards: Vec::new(),
            chips,
            begin_chips: chips,
            acted: false,
            out: false,
            allin: false,
            can_raise: false,
            round_pot: 0,
            pot: 0,
            stand: false,
            straddle,
        }
    }

    /// The seated player.
    pub fn player(&self) -> Arc<dyn Player> {
        self.player.clone()
    }

    /// The player's current hole cards.
    pub fn hole_cards(&self) -> Vec<HoleCard> {
        self.hole_cards.clone()
    }

    /// Chips in the player's stack.
    pub fn chips(&self) -> Chips {
        self.chips
    }

    /// The player's stack at hand start.
    pub fn begin_chips(&self) -> Chips {
        self.begin_chips
    }

    /// Whether the player has acted for the current round.
    pub fn acted(&self) -> bool {
        self.acted
    }

    /// Whether the player is out of the current hand.
    pub fn out(&self) -> bool {
        self.out
    }

    /// Whether the player is all in for the current hand.
    pub fn allin(&self) -> bool {
        self.allin
    }

    /// Whether the player can raise in the current round.
    pub fn can_raise(&self) -> bool {
        self.can_raise
    }

    /// Chips wagered this round.
    pub fn round_pot(&self) -> Chips {
        self.round_pot
    }

    /// Chips wagered this hand.
    pub fn pot(&self) -> Chips {
        self.pot
    }

    /// Whether the player is standing up from the table.
    pub fn standing(&self) -> bool {
        self.stand
    }

    /// Whether the player volunteered to straddle the next hand.
    pub fn straddle(&self) -> bool {
        self.straddle
    }

    // Antes are excluded from the preflop round wager.
    fn add_to_pot(&mut self, chips: Chips, deduct: Chips, round: usize) {
        if round == PREFLOP {
            self.round_pot += (chips - deduct).max(0);
        } else {
            self.round_pot += chips;
        }
        self.pot += chips;
    }

    fn cards(&self) -> Vec<Card> {
        self.hole_cards.iter().map(|hc| hc.card).collect()
    }

    fn base_snapshot(&self, hole_cards: Vec<HoleCardSnapshot>) -> PlayerStateSnapshot {
        PlayerStateSnapshot {
            id: self.player.id(),
            nickname: self.player.nickname(),
            country: self.player.country(),
            hosted: self.player.hosted(),
            play_duration: self.player.play_duration(),
            hole_cards,
            chips: self.chips,
            begin_chips: self.begin_chips,
            acted: self.acted,
            out: self.out,
            allin: self.allin,
            round_pot: self.round_pot,
            pot: self.pot,
            can_raise: self.can_raise,
            stand: self.stand,
            straddle: self.straddle,
        }
    }

    fn snapshot(&self) -> PlayerStateSnapshot {
        self.base_snapshot(self.hole_cards.iter().map(HoleCardSnapshot::from).collect())
    }

    // The owning player always sees their own cards.
    fn snapshot_exposed(&self) -> PlayerStateSnapshot {
        self.base_snapshot(
            self.hole_cards
                .iter()
                .map(|hc| HoleCardSnapshot {
                    card: Some(hc.card),
                    visibility: Visibility::Exposed,
                })
                .collect(),
        )
    }

    // Other seats see card backs only; the count is preserved.
    fn snapshot_redacted(&self) -> PlayerStateSnapshot {
        self.base_snapshot(
            self.hole_cards
                .iter()
                .map(|_| HoleCardSnapshot::redacted())
                .collect(),
        )
    }

    fn from_snapshot(snapshot: PlayerStateSnapshot) -> Result<Self, TableError> {
        let player = resolve_registered(snapshot.id)?;
        let hole_cards = snapshot
            .hole_cards
            .into_iter()
            .map(|hc| {
                hc.card
                    .map(|card| HoleCard {
                        card,
                        visibility: hc.visibility,
                    })
                    .ok_or_else(|| {
                        TableError::Deserialization("redacted hole card in snapshot".to_string())
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            player,
            hole_cards,
            chips: snapshot.chips,
            begin_chips: snapshot.begin_chips,
            acted: snapshot.acted,
            out: snapshot.out,
            allin: snapshot.allin,
            can_raise: snapshot.can_raise,
            round_pot: snapshot.round_pot,
            pot: snapshot.pot,
            stand: snapshot.stand,
            straddle: snapshot.straddle,
        })
    }
}

impl fmt::Debug for PlayerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{Player: {}, Chips: {}, Acted: {}, Out: {}, AllIn: {}, RoundPot: {}, Pot: {}, BeginChips: {}}}",
            self.player.id(),
            self.chips,
            self.acted,
            self.out,
            self.allin,
            self.round_pot,
            self.pot,
            self.begin_chips
        )
    }
}

/// Serialized form of a [`PlayerState`]. Rehydration resolves the player
/// through the registered player factory.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStateSnapshot {
    pub id: i64,
    pub nickname: String,
    pub country: String,
    pub hosted: bool,
    pub play_duration: i64,
    pub hole_cards: Vec<HoleCardSnapshot>,
    pub chips: Chips,
    pub begin_chips: Chips,
    pub acted: bool,
    pub out: bool,
    pub allin: bool,
    pub round_pot: Chips,
    pub pot: Chips,
    pub can_raise: bool,
    pub stand: bool,
    pub straddle: bool,
}

impl Serialize for PlayerState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.snapshot().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PlayerState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let snapshot = PlayerStateSnapshot::deserialize(deserializer)?;
        Self::from_snapshot(snapshot).map_err(serde::de::Error::custom)
    }
}

/// Serialized form of a [`Table`]: the persistence snapshot, and the shape
/// of player and spectator views.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSnapshot {
    pub options: Config,
    pub deck: Deck,
    pub button: Seat,
    /// Acting seat, `-1` when no one is to act.
    pub action: i64,
    pub round: usize,
    pub min_raise: Chips,
    pub board: Vec<Card>,
    pub players: BTreeMap<Seat, PlayerStateSnapshot>,
    pub pot: Pot,
    pub side_pots: Vec<Pot>,
    pub started_hand: bool,
    pub small_bet_seat: Seat,
    pub big_bet_seat: Seat,
    pub utg_seat: Seat,
}

#[derive(Debug)]
struct TableInner {
    opts: Config,
    deck: Deck,
    button: Seat,
    small_bet_seat: Seat,
    big_bet_seat: Seat,
    utg_seat: Seat,
    action: Option<Seat>,
    round: usize,
    min_raise: Chips,
    board: Vec<Card>,
    players: BTreeMap<Seat, PlayerState>,
    pot: Pot,
    side_pots: Vec<Pot>,
    started_hand: bool,
    showdown: bool,
    straddle_seats: Vec<StraddleSeat>,
}

/// A poker table and dealer. The table manages the game state and all
/// player interactions at the table.
pub struct Table {
    dealer: Box<dyn Dealer>,
    inner: RwLock<TableInner>,
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table").field("inner", &self.inner).finish()
    }
}

impl Table {
    /// Creates a new table with the options and dealer provided. To start
    /// playing hands, at least two players must be seated and [`Table::next`]
    /// must be called.
    ///
    /// Panics when the number of seats is invalid for the game specified.
    pub fn new(opts: Config, dealer: Box<dyn Dealer>) -> Self {
        assert!(
            opts.num_of_seats <= opts.game.max_seats(),
            "table: {} has a maximum of {} seats but attempted {}",
            opts.game,
            opts.game.max_seats(),
            opts.num_of_seats
        );
        let deck = dealer.new_deck();
        Self {
            dealer,
            inner: RwLock::new(TableInner {
                opts,
                deck,
                button: 0,
                small_bet_seat: 0,
                big_bet_seat: 0,
                utg_seat: 0,
                action: None,
                round: 0,
                min_raise: 0,
                board: Vec::new(),
                players: BTreeMap::new(),
                pot: Pot::new(opts.num_of_seats),
                side_pots: Vec::new(),
                started_hand: false,
                showdown: false,
                straddle_seats: Vec::new(),
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, TableInner> {
        self.inner.read().expect("table lock poisoned")
    }

    fn write(&self) -> RwLockWriteGuard<'_, TableInner> {
        self.inner.write().expect("table lock poisoned")
    }

    /// The seat the action is currently on, if any.
    pub fn action(&self) -> Option<Seat> {
        self.read().action
    }

    /// The current community cards.
    pub fn board(&self) -> Vec<Card> {
        self.read().board.clone()
    }

    /// The seat the button is currently on.
    pub fn button(&self) -> Seat {
        self.read().button
    }

    /// The seat posting the small blind this hand.
    pub fn small_bet_seat(&self) -> Seat {
        self.read().small_bet_seat
    }

    /// The seat posting the big blind this hand.
    pub fn big_bet_seat(&self) -> Seat {
        self.read().big_bet_seat
    }

    /// The first seat to act preflop.
    pub fn utg_seat(&self) -> Seat {
        self.read().utg_seat
    }

    pub fn game(&self) -> Game {
        self.read().opts.game
    }

    pub fn limit(&self) -> Limit {
        self.read().opts.limit
    }

    pub fn stakes(&self) -> Stakes {
        self.read().opts.stakes
    }

    pub fn opts(&self) -> Config {
        self.read().opts
    }

    pub fn small_bet(&self) -> Chips {
        self.read().opts.stakes.small_bet
    }

    pub fn big_bet(&self) -> Chips {
        self.read().opts.stakes.big_bet
    }

    pub fn ante(&self) -> Chips {
        self.read().opts.stakes.ante
    }

    /// Whether the voluntary straddle ladder is enabled for the table.
    pub fn straddle_enabled(&self) -> bool {
        self.read().opts.stakes.straddle
    }

    pub fn num_of_seats(&self) -> usize {
        self.read().opts.num_of_seats
    }

    /// The current round: 0 preflop, 1 flop, 2 turn, 3 river.
    pub fn round(&self) -> usize {
        self.read().round
    }

    pub fn is_pre_flop(&self) -> bool {
        self.round() == 0
    }

    pub fn is_flop(&self) -> bool {
        self.round() == 1
    }

    pub fn is_turn(&self) -> bool {
        self.round() == 2
    }

    pub fn is_river(&self) -> bool {
        self.round() == 3
    }

    /// Whether hands may be compared at this point of the hand.
    pub fn showdown(&self) -> bool {
        self.read().showdown
    }

    pub fn started_hand(&self) -> bool {
        self.read().started_hand
    }

    /// The current pot.
    pub fn pot(&self) -> Pot {
        self.read().pot.clone()
    }

    /// The cached side pots, main pot first.
    pub fn side_pots(&self) -> Vec<Pot> {
        self.read().side_pots.clone()
    }

    /// A mapping of seats to player states. Empty seats are not included.
    pub fn players(&self) -> BTreeMap<Seat, PlayerState> {
        self.read().players.clone()
    }

    pub fn player(&self, seat: Seat) -> Option<PlayerState> {
        self.read().players.get(&seat).cloned()
    }

    /// Whether the seat is out of the hand. Vacant seats are out.
    pub fn is_out(&self, seat: Seat) -> bool {
        self.read().players.get(&seat).map_or(true, |p| p.out)
    }

    /// The player the action is currently on, if any.
    pub fn current_player(&self) -> Option<PlayerState> {
        let inner = self.read();
        inner.action.and_then(|seat| inner.players.get(&seat).cloned())
    }

    /// Each seat's hole cards.
    pub fn hole_cards(&self) -> BTreeMap<Seat, Vec<HoleCard>> {
        self.read()
            .players
            .iter()
            .map(|(&seat, p)| (seat, p.hole_cards.clone()))
            .collect()
    }

    /// The actions the current player may take. `Bet` and `Raise` carry
    /// the minimum legal amount.
    pub fn valid_actions(&self) -> Vec<Action> {
        self.read().valid_actions()
    }

    /// The minimum chips the current player may bet or raise to.
    pub fn min_raise(&self) -> Option<Chips> {
        let inner = self.read();
        inner.action.map(|seat| inner.min_raise_amount(seat))
    }

    /// The maximum chips the current player may bet or raise to.
    pub fn max_raise(&self) -> Option<Chips> {
        let inner = self.read();
        inner.action.map(|seat| inner.max_raise_amount(seat))
    }

    /// The chips the current player owes to call.
    pub fn outstanding(&self) -> Option<Chips> {
        let inner = self.read();
        inner.action.map(|seat| inner.outstanding(seat))
    }

    /// Seats without a player.
    pub fn empty_seats(&self) -> Vec<Seat> {
        let inner = self.read();
        (0..inner.opts.num_of_seats)
            .filter(|seat| !inner.players.contains_key(seat))
            .collect()
    }

    /// The smallest meaningful buy-in. Seating does not enforce it; buy-in
    /// policy belongs to the scheduler seating players.
    pub fn min_buyin(&self) -> Chips {
        let stakes = self.stakes();
        stakes.small_bet + stakes.ante
    }

    pub fn max_buyin(&self) -> Chips {
        self.big_bet() * 1_000_000
    }

    pub fn min_play_chips(&self) -> Chips {
        1
    }

    /// The straddles posted this hand, in ladder order.
    pub fn straddle_seats(&self) -> Vec<StraddleSeat> {
        self.read().straddle_seats.clone()
    }

    /// Whether the straddle ladder runs this hand: straddling enabled and
    /// at least four players not standing.
    pub fn is_straddle_valid(&self) -> bool {
        self.read().is_straddle_valid()
    }

    /// Mutates the stakes mid-tournament; takes effect from the next hand
    /// setup.
    pub fn rise_blinds(&self, small_bet: Chips, big_bet: Chips) {
        let mut inner = self.write();
        inner.opts.stakes.small_bet = small_bet;
        inner.opts.stakes.big_bet = big_bet;
    }

    /// Adds chips to the seat's stack between hands.
    pub fn add_chips(&self, seat: Seat, chips: Chips) {
        if let Some(p) = self.write().players.get_mut(&seat) {
            p.chips += chips;
        }
    }

    /// Zeroes the seat's stack so the player stands up when the hand ends.
    pub fn reset_chips(&self, seat: Seat) {
        if let Some(p) = self.write().players.get_mut(&seat) {
            p.chips = 0;
        }
    }

    /// Sets or clears the seat's voluntary straddle flag for the next
    /// hand.
    pub fn set_straddle(&self, seat: Seat, straddle: bool) {
        if let Some(p) = self.write().players.get_mut(&seat) {
            p.straddle = straddle;
        }
    }

    /// Clears every seat's voluntary straddle flag.
    pub fn reset_player_straddle(&self) {
        for p in self.write().players.values_mut() {
            p.straddle = false;
        }
    }

    /// Marks the seat as standing up; the hand treats the seat as
    /// ineligible for uncontested pots.
    pub fn mark_stand(&self, seat: Seat) {
        if let Some(p) = self.write().players.get_mut(&seat) {
            p.stand = true;
        }
    }

    /// Sits the player at the table with the given amount of chips.
    pub fn sit(
        &self,
        player: Arc<dyn Player>,
        seat: Seat,
        chips: Chips,
        straddle: bool,
    ) -> Result<(), TableError> {
        let mut inner = self.write();
        if seat >= inner.opts.num_of_seats {
            return Err(TableError::InvalidSeat);
        }
        if inner.is_seated(player.id()) {
            return Err(TableError::AlreadySeated);
        }
        if inner.players.contains_key(&seat) {
            return Err(TableError::SeatOccupied);
        }
        inner.players.insert(seat, PlayerState::new(player, chips, straddle));
        Ok(())
    }

    /// Removes the player from the table. If the player isn't seated the
    /// command is ignored.
    pub fn stand(&self, player: &dyn Player) {
        let mut inner = self.write();
        let seat = inner
            .players
            .iter()
            .find(|(_, p)| p.player.id() == player.id())
            .map(|(&seat, _)| seat);
        if let Some(seat) = seat {
            inner.players.remove(&seat);
        }
    }

    /// The iterator function of the table. `next` updates the table's
    /// state, calling the current player's `next_action` on their turn.
    /// New hands start automatically while two or more players have chips;
    /// `Err(InsufficientPlayers)` means the table cannot continue. Results
    /// are returned when a hand completes, by showdown or by every other
    /// player folding.
    pub fn next(&self) -> Result<Option<Results>, TableError> {
        {
            let mut inner = self.write();
            if !inner.started_hand {
                inner.showdown = false;
                inner.reset_pot();
                if !inner.has_next_hand() {
                    return Err(TableError::InsufficientPlayers);
                }
                let deck = self.dealer.new_deck();
                inner.set_up_hand(deck);
                inner.set_up_round();
                inner.started_hand = true;
                return Ok(None);
            }

            if inner.action.is_none() {
                inner.round += 1;
                inner.reset_round_pot();
                if inner.round == inner.opts.game.num_of_rounds() {
                    let results = inner.showdown_payout();
                    inner.started_hand = false;
                    inner.action = None;
                    inner.show_hole_cards();
                    return Ok(Some(results));
                }
                inner.set_up_round();
                return Ok(None);
            }
        }

        // No lock is held across the action callback: it may block
        // indefinitely and views must stay readable meanwhile.
        let (seat, player) = {
            let inner = self.read();
            let Some(seat) = inner.action else {
                return Ok(None);
            };
            (seat, inner.players[&seat].player.clone())
        };
        let decision = player.next_action();
        if decision.ignore {
            info!(
                "ignoring action from player {}: {}",
                player.id(),
                decision.action
            );
            return Ok(None);
        }

        let (record, round) = {
            let mut inner = self.write();
            let record = inner.handle_action(seat, decision.action, decision.timed_out)?;
            (record, inner.round)
        };
        player.save_action(round, record);

        let mut inner = self.write();
        if inner.everyone_folded() {
            let survivor = inner
                .players
                .iter()
                .find(|(_, p)| !p.out && !p.stand)
                .map(|(&seat, _)| seat);
            let results = match survivor {
                Some(winner) => {
                    let results = inner.pot.take(winner);
                    inner.payout_results(&results);
                    results
                }
                None => {
                    // Concurrent stand and fold can leave nobody to pay.
                    warn!("everyone folded with no eligible winner; no chips awarded");
                    Results::new()
                }
            };
            inner.started_hand = false;
            inner.action = None;
            return Ok(Some(results));
        }

        inner.action = inner.next_seat(seat + 1, true);
        Ok(None)
    }

    /// A view of the table containing only information privileged to the
    /// given player: their own cards exposed, everyone else's redacted
    /// unless the hand reached showdown.
    pub fn view(&self, player: &dyn Player) -> TableSnapshot {
        let inner = self.read();
        let viewer = player.id();
        let players = inner
            .players
            .iter()
            .map(|(&seat, p)| {
                let snapshot = if p.player.id() == viewer {
                    p.snapshot_exposed()
                } else if inner.showdown && !p.out {
                    p.snapshot()
                } else {
                    p.snapshot_redacted()
                };
                (seat, snapshot)
            })
            .collect();
        inner.snapshot_with(players, Deck::default())
    }

    /// A spectator view: every seat's cards redacted unless the hand
    /// reached showdown.
    pub fn looker_view(&self) -> TableSnapshot {
        let inner = self.read();
        let players = inner
            .players
            .iter()
            .map(|(&seat, p)| {
                let snapshot = if inner.showdown && !p.out {
                    p.snapshot()
                } else {
                    p.snapshot_redacted()
                };
                (seat, snapshot)
            })
            .collect();
        inner.snapshot_with(players, Deck::default())
    }

    /// The full persistence snapshot, deck included.
    pub fn snapshot(&self) -> TableSnapshot {
        let inner = self.read();
        let players = inner
            .players
            .iter()
            .map(|(&seat, p)| (seat, p.snapshot()))
            .collect();
        inner.snapshot_with(players, inner.deck.clone())
    }

    /// Rebuilds a table from a persistence snapshot. Requires a player
    /// factory registered via [`crate::register_player`].
    pub fn from_snapshot(snapshot: TableSnapshot) -> Result<Self, TableError> {
        let mut players = BTreeMap::new();
        for (seat, player_snapshot) in snapshot.players {
            players.insert(seat, PlayerState::from_snapshot(player_snapshot)?);
        }
        let mut pot = snapshot.pot;
        pot.set_num_of_seats(snapshot.options.num_of_seats);
        let mut side_pots = snapshot.side_pots;
        for side_pot in &mut side_pots {
            side_pot.set_num_of_seats(snapshot.options.num_of_seats);
        }
        let action = usize::try_from(snapshot.action).ok();
        Ok(Self {
            dealer: Box::new(StandardDealer),
            inner: RwLock::new(TableInner {
                opts: snapshot.options,
                deck: snapshot.deck,
                button: snapshot.button,
                small_bet_seat: snapshot.small_bet_seat,
                big_bet_seat: snapshot.big_bet_seat,
                utg_seat: snapshot.utg_seat,
                action,
                round: snapshot.round,
                min_raise: snapshot.min_raise,
                board: snapshot.board,
                players,
                pot,
                side_pots,
                started_hand: snapshot.started_hand,
                showdown: false,
                straddle_seats: Vec::new(),
            }),
        })
    }

    /// The winning high hands among pot contributors still in the hand.
    /// Usable between rounds to drive displays.
    pub fn leading_player(&self) -> Hands {
        let inner = self.read();
        inner.leading_hands(&inner.pot.seats())
    }

    /// The leading hands restricted to the largest side pot that contains
    /// an all-in player, the anchor pot for insurance.
    pub fn max_pot_leading_player(&self) -> Hands {
        let inner = self.read();
        let mut max_pot: Option<&Pot> = None;
        for pot in &inner.side_pots {
            if pot.contributions().len() <= 1 {
                continue;
            }
            let has_allin = pot
                .contributions()
                .keys()
                .any(|seat| inner.players.get(seat).map_or(false, |p| p.allin));
            if has_allin && max_pot.map_or(true, |m| pot.chips() > m.chips()) {
                max_pot = Some(pot);
            }
        }
        match max_pot {
            Some(pot) => inner.leading_hands(&pot.seats()),
            None => Hands::new(),
        }
    }

    /// Post-showdown courtesy rule: walking the live seats from `seat`,
    /// conceals each hand beaten by an earlier shown hand, then re-exposes
    /// any winner, side pots included. Returns the seats left concealed.
    pub fn auto_conceal_hole_cards(&self, seat: Seat, results: &Results) -> Vec<Seat> {
        let mut inner = self.write();
        let num_of_seats = inner.opts.num_of_seats;
        if seat >= num_of_seats {
            return Vec::new();
        }

        let live: Vec<Seat> = (seat..num_of_seats)
            .chain(0..seat)
            .filter(|s| {
                inner
                    .players
                    .get(s)
                    .is_some_and(|p| !p.out && !p.hole_cards.is_empty())
            })
            .collect();
        if live.len() <= 1 {
            return Vec::new();
        }

        let game = inner.opts.game;
        let board = inner.board.clone();
        let hands: Vec<(Seat, Hand)> = live
            .iter()
            .map(|&s| (s, game.form_high_hand(&inner.players[&s].cards(), &board)))
            .collect();

        let mut target = hands[0].1.clone();
        let mut concealed = Vec::new();
        for (s, hand) in &hands {
            if hand.compare_to(&target) == Ordering::Less {
                if let Some(p) = inner.players.get_mut(s) {
                    for hc in &mut p.hole_cards {
                        hc.conceal();
                    }
                }
                concealed.push(*s);
            } else {
                target = hand.clone();
            }
        }

        let mut still_concealed = Vec::new();
        for s in concealed {
            if results.contains_key(&s) {
                if let Some(p) = inner.players.get_mut(&s) {
                    for hc in &mut p.hole_cards {
                        hc.expose();
                    }
                }
            } else {
                still_concealed.push(s);
            }
        }
        still_concealed
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.read();
        let current = inner
            .action
            .and_then(|seat| inner.players.get(&seat))
            .map(|p| p.player.id())
            .unwrap_or(0);
        let board: Vec<String> = inner.board.iter().map(|c| c.to_string()).collect();
        write!(
            f,
            "{{Button: Seat {}, Current Player: {}, Round {}, Board: {:?}, Pot: {}}}",
            inner.button,
            current,
            inner.round,
            board,
            inner.pot.chips()
        )
    }
}

impl Serialize for Table {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.snapshot().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Table {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let snapshot = TableSnapshot::deserialize(deserializer)?;
        Self::from_snapshot(snapshot).map_err(serde::de::Error::custom)
    }
}

impl TableInner {
    fn snapshot_with(
        &self,
        players: BTreeMap<Seat, PlayerStateSnapshot>,
        deck: Deck,
    ) -> TableSnapshot {
        TableSnapshot {
            options: self.opts,
            deck,
            button: self.button,
            action: self.action.map_or(-1, |seat| seat as i64),
            round: self.round,
            min_raise: self.min_raise,
            board: self.board.clone(),
            players,
            pot: self.pot.clone(),
            side_pots: self.side_pots.clone(),
            started_hand: self.started_hand,
            small_bet_seat: self.small_bet_seat,
            big_bet_seat: self.big_bet_seat,
            utg_seat: self.utg_seat,
        }
    }

    fn is_seated(&self, id: i64) -> bool {
        self.players.values().any(|p| p.player.id() == id)
    }

    fn has_next_hand(&self) -> bool {
        self.players.values().filter(|p| p.chips > 0).count() > 1
    }

    fn player_begin_chips(&self) -> BTreeMap<Seat, Chips> {
        self.players
            .iter()
            .map(|(&seat, p)| (seat, p.begin_chips))
            .collect()
    }

    fn reset_pot(&mut self) {
        for p in self.players.values_mut() {
            p.round_pot = 0;
            p.pot = 0;
        }
    }

    fn reset_round_pot(&mut self) {
        for p in self.players.values_mut() {
            p.round_pot = 0;
        }
    }

    fn reset_acted(&mut self) {
        for p in self.players.values_mut() {
            p.acted = false;
        }
    }

    // A fresh raise re-opens raising for everyone but the raiser.
    fn reset_can_raise(&mut self, raiser: Option<Seat>) {
        for (&seat, p) in self.players.iter_mut() {
            p.can_raise = Some(seat) != raiser;
        }
    }

    // The nearest occupied seat at or after `seat`, wrapping around. With
    // `playing`, the seat must also be able to act this round.
    fn next_seat(&self, seat: Seat, playing: bool) -> Option<Seat> {
        let n = self.opts.num_of_seats;
        let mut seat = seat % n;
        for _ in 0..n {
            if let Some(p) = self.players.get(&seat) {
                if !playing || (!p.out && !p.allin && !p.acted) {
                    return Some(seat);
                }
            }
            seat = (seat + 1) % n;
        }
        None
    }

    // Distance of `seat` from the button, counting occupied seats only.
    fn relative_position(&self, seat: Seat) -> usize {
        let mut current = self.button;
        let mut count = 0;
        while current != seat {
            current = self
                .next_seat(current + 1, false)
                .expect("relative position of an occupied seat");
            count += 1;
        }
        count
    }

    fn set_up_hand(&mut self, deck: Deck) {
        self.deck = deck;
        self.round = 0;
        if let Some(button) = self.next_seat(self.button + 1, false) {
            self.button = button;
        }
        self.action = None;
        self.pot = Pot::new(self.opts.num_of_seats);
        self.straddle_seats.clear();
        self.board.clear();
        for p in self.players.values_mut() {
            p.hole_cards.clear();
            p.out = false;
            p.allin = false;
            p.begin_chips = p.chips;
        }
    }

    fn update_pots(&mut self) {
        let begin_chips = self.player_begin_chips();
        self.side_pots = self.pot.side_pots(&begin_chips);
    }

    fn set_up_round(&mut self) {
        self.update_pots();

        let round = self.round;
        let game = self.opts.game;
        let board_cards = game.board_cards(&mut self.deck, round);
        self.board.extend(board_cards);
        self.reset_acted();

        let num_players = self.players.len();
        let start_pos = game.round_start_pos(num_players, round);
        let seats: Vec<Seat> = self.players.keys().copied().collect();
        for seat in seats {
            let dealt = game.hole_cards(&mut self.deck, round);
            self.players
                .get_mut(&seat)
                .expect("seat occupied")
                .hole_cards
                .extend(dealt);

            let pos = self.relative_position(seat);
            let forced = game.forced_bet(num_players, &self.opts.stakes, round, seat, pos);
            self.set_blind_seat(seat, pos);
            if pos == start_pos {
                self.action = self.next_seat(seat, true);
                if round == PREFLOP {
                    if let Some(action) = self.action {
                        self.utg_seat = action;
                    }
                }
            }

            // Stacks shorter than the forced bet stay in the hand all in.
            let forced = forced.min(self.players[&seat].chips);
            self.add_to_pot(seat, forced);
            let ante = self.opts.stakes.ante;
            self.players
                .get_mut(&seat)
                .expect("seat occupied")
                .add_to_pot(forced, ante, round);
        }

        self.min_raise = 0;
        self.reset_can_raise(None);

        if round == PREFLOP && self.is_straddle_valid() {
            self.force_straddle_bet();
        }

        // Betting is skipped when fewer than two players can still act.
        let count = self
            .players
            .values()
            .filter(|p| !p.allin && !p.out)
            .count();
        if count < 2 {
            self.action = None;
        }
    }

    fn set_blind_seat(&mut self, seat: Seat, pos: usize) {
        if self.round != PREFLOP {
            return;
        }
        let (small_pos, big_pos) = blind_positions(self.players.len());
        if pos == small_pos {
            self.small_bet_seat = seat;
        } else if pos == big_pos {
            self.big_bet_seat = seat;
        }
    }

    fn is_straddle_valid(&self) -> bool {
        self.opts.stakes.straddle
            && self.players.values().filter(|p| !p.stand).count() >= MIN_STRADDLE_PLAYERS
    }

    fn force_straddle_bet(&mut self) {
        let mut seat = self.utg_seat;
        let ladder = [
            StraddleCategory::Straddle1,
            StraddleCategory::Straddle2,
            StraddleCategory::Straddle3,
        ];
        for (i, category) in ladder.into_iter().enumerate() {
            if i > 0 {
                seat = match self.next_seat(seat + 1, true) {
                    Some(next) => next,
                    None => return,
                };
            }
            if !self.do_one_straddle_bet(seat, category) {
                return;
            }
        }
    }

    fn do_one_straddle_bet(&mut self, seat: Seat, category: StraddleCategory) -> bool {
        let Some(state) = self.players.get(&seat) else {
            warn!("straddle: no player at seat {seat}");
            return false;
        };
        if !state.straddle {
            return false;
        }

        let big_bet = self.opts.stakes.big_bet;
        let bet = match category {
            StraddleCategory::Straddle1 => 2 * big_bet,
            StraddleCategory::Straddle2 => 4 * big_bet,
            StraddleCategory::Straddle3 => 8 * big_bet,
        };
        self.min_raise = bet / 2;
        let bet = bet.min(state.chips);
        let user_id = state.player.id();

        self.add_to_pot(seat, bet);
        let round = self.round;
        let state = self.players.get_mut(&seat).expect("straddler seated");
        state.add_to_pot(bet, 0, round);
        state.straddle = false;
        self.action = self.next_seat(seat + 1, true);
        self.straddle_seats.push(StraddleSeat {
            user_id,
            seat,
            category,
            voluntary: true,
        });
        true
    }

    // Moves chips from the seat's stack into the pot, clamping to the
    // stack and flagging the all-in.
    fn add_to_pot(&mut self, seat: Seat, chips: Chips) {
        let p = self.players.get_mut(&seat).expect("seat occupied");
        let chips = if chips >= p.chips {
            p.allin = true;
            p.chips
        } else {
            chips
        };
        p.chips -= chips;
        self.pot.contribute(seat, chips);
    }

    fn outstanding(&self, seat: Seat) -> Chips {
        let p = &self.players[&seat];
        if p.allin || p.out {
            return 0;
        }
        self.pot.outstanding(seat)
    }

    fn valid_actions(&self) -> Vec<Action> {
        let Some(seat) = self.action else {
            return Vec::new();
        };
        let Some(p) = self.players.get(&seat) else {
            return Vec::new();
        };
        if p.allin || p.out {
            return Vec::new();
        }
        let outstanding = self.outstanding(seat);
        if outstanding == 0 {
            return vec![
                Action::Fold,
                Action::Check,
                Action::Bet(self.min_raise_amount(seat)),
            ];
        }
        if !p.can_raise || p.chips <= outstanding {
            return vec![Action::Fold, Action::Call];
        }
        vec![
            Action::Fold,
            Action::Call,
            Action::Raise(self.min_raise_amount(seat)),
        ]
    }

    // The smallest round total the seat may bet or raise to. Fixed limit
    // sizing is dictated by the rules, so any positive amount validates.
    fn min_raise_amount(&self, seat: Seat) -> Chips {
        let p = &self.players[&seat];
        let bettable = p.chips + p.round_pot;
        if self.opts.limit == Limit::FixedLimit {
            return 1;
        }

        let outstanding = self.outstanding(seat);
        let min = if self.min_raise == 0 {
            // Only blinds, or checks and calls of them, are in the pot.
            if self.round == PREFLOP {
                2 * self.opts.stakes.big_bet
            } else {
                self.opts.stakes.big_bet
            }
        } else {
            // Call what is owed plus the last full raise.
            outstanding + self.min_raise + p.round_pot
        };
        min.min(bettable)
    }

    // The largest round total the seat may bet or raise to.
    fn max_raise_amount(&self, seat: Seat) -> Chips {
        let p = &self.players[&seat];
        let bettable = p.chips + p.round_pot;
        if bettable <= 0 {
            return 0;
        }
        let outstanding = self.outstanding(seat);
        let max = match self.opts.limit {
            Limit::NoLimit => bettable,
            // One pot: the total after calling, plus the call, plus this
            // round's wager.
            Limit::PotLimit => self.pot.chips() + 2 * outstanding + p.round_pot,
            Limit::FixedLimit => self.opts.game.fixed_limit(&self.opts.stakes, self.round),
        };
        max.min(bettable)
    }

    fn handle_action(
        &mut self,
        seat: Seat,
        action: Action,
        timeout: bool,
    ) -> Result<ActionRecord, TableError> {
        let valid = self.valid_actions();
        if !valid
            .iter()
            .any(|candidate| discriminant(candidate) == discriminant(&action))
        {
            return Err(TableError::InvalidAction);
        }

        if let Action::Bet(chips) | Action::Raise(chips) = action {
            if chips < self.min_raise_amount(seat) || chips > self.max_raise_amount(seat) {
                return Err(match action {
                    Action::Bet(_) => TableError::InvalidBet,
                    _ => TableError::InvalidRaise,
                });
            }
        }

        let round = self.round;
        match action {
            Action::Fold => {
                self.players.get_mut(&seat).expect("seat occupied").out = true;
            }
            Action::Check | Action::Stand => {}
            Action::Call => {
                let outstanding = self.outstanding(seat);
                let p = self.players.get_mut(&seat).expect("seat occupied");
                let pay = outstanding.min(p.chips);
                p.add_to_pot(pay, 0, round);
                self.add_to_pot(seat, outstanding);
            }
            Action::Bet(chips) => {
                let bet_chips = chips - self.players[&seat].round_pot;
                self.players
                    .get_mut(&seat)
                    .expect("seat occupied")
                    .add_to_pot(bet_chips, 0, round);
                self.add_to_pot(seat, bet_chips);
                self.reset_acted();
                if bet_chips >= self.min_raise {
                    self.reset_can_raise(Some(seat));
                    self.min_raise = bet_chips;
                }
            }
            Action::Raise(chips) => {
                let outstanding = self.outstanding(seat);
                let raise_chips = chips - self.players[&seat].round_pot;
                // A short all-in below the last full raise does not
                // re-open raising; everyone still gets to call it.
                if raise_chips - outstanding >= self.min_raise {
                    self.reset_can_raise(Some(seat));
                    self.min_raise = raise_chips - outstanding;
                }
                self.players
                    .get_mut(&seat)
                    .expect("seat occupied")
                    .add_to_pot(raise_chips, 0, round);
                self.add_to_pot(seat, raise_chips);
                self.reset_acted();
            }
        }

        {
            let p = self.players.get_mut(&seat).expect("seat occupied");
            p.can_raise = false;
            p.acted = true;
        }

        let (count_allin, count_rich) = self.count_state();
        if self.is_nobody_can_play() && (count_allin > 1 || (count_allin == 1 && count_rich > 0)) {
            self.showdown = true;
            self.update_pots();
            self.show_hole_cards();
        }

        let p = &self.players[&seat];
        let round_pot = if round == PREFLOP { p.pot } else { p.round_pot };
        let chips = match action {
            Action::Bet(chips) | Action::Raise(chips) => chips,
            _ => 0,
        };
        Ok(ActionRecord {
            player_id: p.player.id(),
            action,
            chips,
            action_time: Utc::now(),
            timeout,
            round_pot,
            pot: p.pot,
        })
    }

    fn count_state(&self) -> (usize, usize) {
        let mut count_allin = 0;
        let mut count_rich = 0;
        for p in self.players.values() {
            if p.allin {
                count_allin += 1;
            }
            if !p.allin && !p.out && p.acted {
                count_rich += 1;
            }
        }
        (count_allin, count_rich)
    }

    fn is_nobody_can_play(&self) -> bool {
        let total = self.players.len();
        let playable = self
            .players
            .values()
            .filter(|p| !p.allin && !p.out)
            .count();
        let settled = self
            .players
            .values()
            .filter(|p| p.acted || p.out || p.allin)
            .count();
        playable < 2 && settled == total
    }

    fn everyone_folded(&self) -> bool {
        self.players
            .values()
            .filter(|p| !p.out && !p.stand)
            .count()
            < 2
    }

    // Exposes the hole cards of everyone still in, but only when at least
    // two players reach showdown.
    fn show_hole_cards(&mut self) {
        let live = self.players.values().filter(|p| !p.out).count();
        if live > 1 {
            for p in self.players.values_mut() {
                if !p.out {
                    for hc in &mut p.hole_cards {
                        hc.expose();
                    }
                }
            }
        }
    }

    fn showdown_payout(&mut self) -> Results {
        let game = self.opts.game;
        let board = self.board.clone();
        let mut high_hands = Hands::new();
        let mut low_hands = Hands::new();
        for (&seat, p) in &self.players {
            if p.out || p.hole_cards.is_empty() {
                continue;
            }
            let holes = p.cards();
            high_hands.insert(seat, game.form_high_hand(&holes, &board));
            if let Some(low) = game.form_low_hand(&holes, &board) {
                low_hands.insert(seat, low);
            }
        }
        let begin_chips = self.player_begin_chips();
        let results = self.pot.payout(
            &begin_chips,
            &high_hands,
            &low_hands,
            game.sorting(),
            self.button,
        );
        self.payout_results(&results);
        results
    }

    fn payout_results(&mut self, results: &Results) {
        for (&seat, seat_results) in results {
            for result in seat_results {
                if let Some(p) = self.players.get_mut(&seat) {
                    p.chips += result.chips;
                }
            }
        }
    }

    fn leading_hands(&self, seats: &[Seat]) -> Hands {
        let game = self.opts.game;
        let mut high_hands = Hands::new();
        for (&seat, p) in &self.players {
            if p.out || p.hole_cards.is_empty() || !seats.contains(&seat) {
                continue;
            }
            high_hands.insert(seat, game.form_high_hand(&p.cards(), &self.board));
        }
        winning_hands(&high_hands)
    }
}

/// Computes insurance outs: the remaining cards whose arrival hands the
/// lead to any trailing player. Hole card counts pick the variant: four
/// cards per player evaluates Omaha-style, otherwise Hold'em.
pub fn calc_outs(
    leading_hole_cards: &[Card],
    backward_hole_cards: &[Vec<Card>],
    board: &[Card],
) -> Vec<Card> {
    let mut excluded: Vec<Card> = Vec::new();
    excluded.extend_from_slice(leading_hole_cards);
    excluded.extend_from_slice(board);
    for backward in backward_hole_cards {
        excluded.extend_from_slice(backward);
    }

    let is_omaha = leading_hole_cards.len() == 4;
    let mut outs: Vec<Card> = Vec::new();
    for card in Card::all_by_rank() {
        if excluded.contains(&card) {
            continue;
        }
        for backward in backward_hole_cards {
            let mut next_board = board.to_vec();
            next_board.push(card);
            let (backward_hand, leading_hand) = if is_omaha {
                (
                    omaha_high(backward, &next_board),
                    omaha_high(leading_hole_cards, &next_board),
                )
            } else {
                let mut backward_cards = next_board.clone();
                backward_cards.extend_from_slice(backward);
                let mut leading_cards = next_board.clone();
                leading_cards.extend_from_slice(leading_hole_cards);
                (Hand::new(&backward_cards), Hand::new(&leading_cards))
            };
            if backward_hand.compare_to(&leading_hand) == Ordering::Greater
                && !outs.contains(&card)
            {
                outs.push(card);
            }
        }
    }
    outs
}
