//! Full-hand scenarios driven through `Table::next`: seating, betting
//! round progression, the no-reopen short all-in rule, straddles, blind
//! raising, and hand termination.

mod common;

use common::TestPlayer;
use poker_table::{
    Action, Config, Game, Limit, Stakes, StandardDealer, Table, TableError, Visibility,
};
use std::sync::Arc;

fn no_limit_holdem(num_of_seats: usize) -> Config {
    Config {
        game: Game::Holdem,
        limit: Limit::NoLimit,
        stakes: Stakes {
            small_bet: 1,
            big_bet: 2,
            ante: 0,
            straddle: false,
        },
        num_of_seats,
    }
}

#[test]
fn seating_errors() {
    let table = Table::new(no_limit_holdem(6), Box::new(StandardDealer));

    let p1 = TestPlayer::new(1);
    let p1_dup = TestPlayer::new(1);
    let p2 = TestPlayer::new(2);

    table.sit(p1, 0, 100, false).unwrap();
    assert_eq!(
        table.sit(p1_dup, 1, 100, false),
        Err(TableError::AlreadySeated)
    );
    assert_eq!(
        table.sit(p2.clone(), 6, 100, false),
        Err(TableError::InvalidSeat)
    );
    assert_eq!(table.sit(p2, 0, 100, false), Err(TableError::SeatOccupied));
}

#[test]
fn short_all_in_does_not_reopen_raising() {
    let table = Table::new(no_limit_holdem(6), Box::new(StandardDealer));

    let p1 = TestPlayer::new(1);
    let p2 = TestPlayer::new(2);
    let p3 = TestPlayer::new(3);
    let p4 = TestPlayer::new(4);

    table.sit(p1.clone(), 0, 50, false).unwrap();
    table.sit(p2.clone(), 1, 100, false).unwrap();
    table.sit(p3.clone(), 2, 52, false).unwrap();
    table.sit(p4.clone(), 3, 60, false).unwrap();

    // Preflop: everyone calls around to the big blind's check.
    p1.call();
    p2.call();
    p3.call();
    p4.check();

    // Flop: check, check, then seat 0 jams for 48. Seat 2's raise to 50
    // and seat 3's raise to 58 are both short all-ins below the 48-chip
    // full-raise increment.
    p3.check();
    p4.check();
    p1.bet(48);
    p2.call();
    p3.raise(50);
    p4.raise(58);

    for _ in 0..12 {
        table.next().unwrap();
    }

    // Action returns to seat 1, who already called the original bet. The
    // short all-ins did not re-open raising for them.
    assert_eq!(table.action(), Some(1));
    let players = table.players();
    assert!(!players[&1].can_raise());
    assert_eq!(table.valid_actions(), vec![Action::Fold, Action::Call]);

    p2.call();
    table.next().unwrap();
    assert!(table.showdown());
    assert_eq!(table.player(1).unwrap().chips(), 40);

    // Everyone is all in or matched; the remaining streets deal out with
    // no further betting and the pot pays at the river.
    let mut results = None;
    for _ in 0..8 {
        if let Some(r) = table.next().unwrap() {
            results = Some(r);
            break;
        }
    }
    let results = results.expect("hand should reach showdown");

    let paid: i64 = results
        .values()
        .flatten()
        .map(|result| result.chips)
        .sum();
    assert_eq!(paid, 222);

    let stacks: i64 = table.players().values().map(|p| p.chips()).sum();
    assert_eq!(stacks, 50 + 100 + 52 + 60);
}

#[test]
fn heads_up_button_posts_small_blind_and_acts_first() {
    let opts = no_limit_holdem(6);
    let dealer = poker_table::pokertest::dealer(&[
        "As", "Ah", // seat 0 hole cards
        "Kd", "Kh", // seat 1 hole cards
        "2c", "7d", "9h", // flop
        "3s", // turn
        "5c", // river
    ]);
    let table = Table::new(opts, dealer);

    let p1 = TestPlayer::new(1);
    let p2 = TestPlayer::new(2);
    table.sit(p1.clone(), 0, 100, false).unwrap();
    table.sit(p2.clone(), 1, 100, false).unwrap();

    table.next().unwrap();

    // The button lands on seat 1, which posts the small blind and acts
    // first preflop; seat 0 posts the big blind.
    assert_eq!(table.button(), 1);
    assert_eq!(table.small_bet_seat(), 1);
    assert_eq!(table.big_bet_seat(), 0);
    assert_eq!(table.action(), Some(1));
    assert_eq!(table.outstanding(), Some(1));

    p2.call();
    p1.check();
    table.next().unwrap();
    table.next().unwrap();

    // Postflop the big blind acts first.
    table.next().unwrap();
    assert_eq!(table.round(), 1);
    assert_eq!(table.action(), Some(0));

    p1.check();
    p2.check();
    p1.check();
    p2.check();
    p1.check();
    p2.check();

    let mut results = None;
    for _ in 0..12 {
        if let Some(r) = table.next().unwrap() {
            results = Some(r);
            break;
        }
    }
    let results = results.expect("hand should reach showdown");

    // Seat 0's aces beat seat 1's kings for the 4-chip pot.
    assert_eq!(results.len(), 1);
    assert_eq!(results[&0][0].chips, 4);
    assert_eq!(table.player(0).unwrap().chips(), 102);
    assert_eq!(table.player(1).unwrap().chips(), 98);

    // Both hands reached showdown, so both are exposed.
    for state in table.players().values() {
        assert!(state
            .hole_cards()
            .iter()
            .all(|hc| hc.visibility == Visibility::Exposed));
    }
}

#[test]
fn all_but_one_fold_ends_the_hand_without_showdown() {
    let table = Table::new(no_limit_holdem(6), Box::new(StandardDealer));

    let p1 = TestPlayer::new(1);
    let p2 = TestPlayer::new(2);
    let p3 = TestPlayer::new(3);
    table.sit(p1, 0, 100, false).unwrap();
    table.sit(p2.clone(), 1, 100, false).unwrap();
    table.sit(p3.clone(), 2, 100, false).unwrap();

    // Button seat 1 acts first three-handed preflop and folds; the small
    // blind folds behind.
    p2.fold();
    p3.fold();

    table.next().unwrap();
    assert_eq!(table.action(), Some(1));
    table.next().unwrap();
    let results = table.next().unwrap().expect("hand ends when all but one fold");

    let result = &results[&0][0];
    assert_eq!(result.chips, 3);
    assert!(result.hand.is_none());

    assert!(!table.started_hand());
    assert_eq!(table.action(), None);
    assert_eq!(table.player(0).unwrap().chips(), 101);
    assert_eq!(table.player(1).unwrap().chips(), 100);
    assert_eq!(table.player(2).unwrap().chips(), 99);

    // No showdown: the survivor's cards stay concealed.
    assert!(table
        .player(0)
        .unwrap()
        .hole_cards()
        .iter()
        .all(|hc| hc.visibility == Visibility::Concealed));
}

#[test]
fn next_requires_two_chipped_players() {
    let table = Table::new(no_limit_holdem(6), Box::new(StandardDealer));
    assert_eq!(table.next(), Err(TableError::InsufficientPlayers));

    table.sit(TestPlayer::new(1), 0, 100, false).unwrap();
    assert_eq!(table.next(), Err(TableError::InsufficientPlayers));

    // A second player with no chips doesn't help.
    table.sit(TestPlayer::new(2), 1, 0, false).unwrap();
    assert_eq!(table.next(), Err(TableError::InsufficientPlayers));
}

#[test]
fn straddle_ladder_posts_up_to_three_voluntary_straddles() {
    let opts = Config {
        game: Game::Holdem,
        limit: Limit::NoLimit,
        stakes: Stakes {
            small_bet: 5,
            big_bet: 10,
            ante: 5,
            straddle: true,
        },
        num_of_seats: 9,
    };
    let table = Table::new(opts, Box::new(StandardDealer));
    for (id, seat) in (1..=6).zip(0..6) {
        table.sit(TestPlayer::new(id), seat, 200, true).unwrap();
    }
    assert!(table.is_straddle_valid());

    table.next().unwrap();

    // Button seat 1, blinds 2 and 3, so the ladder starts under the gun
    // at seat 4: 2x, 4x, then 8x the big blind.
    let straddles = table.straddle_seats();
    assert_eq!(straddles.len(), 3);
    assert_eq!(straddles[0].seat, 4);
    assert_eq!(straddles[1].seat, 5);
    assert_eq!(straddles[2].seat, 0);
    assert!(straddles.iter().all(|s| s.voluntary));

    assert_eq!(table.player(4).unwrap().round_pot(), 20);
    assert_eq!(table.player(5).unwrap().round_pot(), 40);
    assert_eq!(table.player(0).unwrap().round_pot(), 80);

    // Six antes plus blinds plus the three straddles.
    assert_eq!(table.pot().chips(), 30 + 5 + 10 + 20 + 40 + 80);

    // Action passed the straddlers and landed back on the button.
    assert_eq!(table.action(), Some(1));
}

#[test]
fn straddle_ladder_stops_at_the_first_decliner() {
    let opts = Config {
        game: Game::Holdem,
        limit: Limit::NoLimit,
        stakes: Stakes {
            small_bet: 5,
            big_bet: 10,
            ante: 0,
            straddle: true,
        },
        num_of_seats: 9,
    };
    let table = Table::new(opts, Box::new(StandardDealer));
    for (id, seat) in (1..=6).zip(0..6) {
        // Only the player landing under the gun volunteers.
        table.sit(TestPlayer::new(id), seat, 200, seat == 4).unwrap();
    }

    table.next().unwrap();

    let straddles = table.straddle_seats();
    assert_eq!(straddles.len(), 1);
    assert_eq!(straddles[0].seat, 4);
    assert_eq!(table.player(4).unwrap().round_pot(), 20);
    assert_eq!(table.action(), Some(5));
}

#[test]
fn straddling_requires_four_players() {
    let opts = Config {
        game: Game::Holdem,
        limit: Limit::NoLimit,
        stakes: Stakes {
            small_bet: 5,
            big_bet: 10,
            ante: 0,
            straddle: true,
        },
        num_of_seats: 9,
    };
    let table = Table::new(opts, Box::new(StandardDealer));
    for (id, seat) in (1..=3).zip(0..3) {
        table.sit(TestPlayer::new(id), seat, 200, true).unwrap();
    }
    assert!(!table.is_straddle_valid());

    table.next().unwrap();
    assert!(table.straddle_seats().is_empty());
}

#[test]
fn blinds_rise_between_hands() {
    let opts = Config {
        game: Game::Holdem,
        limit: Limit::NoLimit,
        stakes: Stakes {
            small_bet: 5,
            big_bet: 10,
            ante: 0,
            straddle: false,
        },
        num_of_seats: 6,
    };
    let table = Arc::new(Table::new(opts, Box::new(StandardDealer)));

    let p1 = TestPlayer::hosted(1, &table);
    let p2 = TestPlayer::hosted(2, &table);
    table.sit(p1, 0, 5_000, false).unwrap();
    table.sit(p2, 1, 10_000, false).unwrap();

    let mut hands = 0;
    for _ in 0..200 {
        if let Some(_results) = table.next().unwrap() {
            hands += 1;
            let stakes = table.stakes();
            table.rise_blinds(stakes.small_bet * 2, stakes.big_bet * 2);
            let total: i64 = table.players().values().map(|p| p.chips()).sum();
            assert_eq!(total, 15_000);
            if hands == 3 {
                break;
            }
        }
    }
    assert_eq!(hands, 3);
    assert_eq!(table.stakes().small_bet, 40);
    assert_eq!(table.stakes().big_bet, 80);
}

#[test]
fn chips_are_conserved_across_many_hands() {
    let opts = Config {
        game: Game::Holdem,
        limit: Limit::NoLimit,
        stakes: Stakes {
            small_bet: 1,
            big_bet: 2,
            ante: 1,
            straddle: false,
        },
        num_of_seats: 6,
    };
    let table = Arc::new(Table::new(opts, Box::new(StandardDealer)));
    for (id, seat) in (1..=4).zip(0..4) {
        let player = TestPlayer::hosted(id, &table);
        table.sit(player, seat, 500, false).unwrap();
    }

    let mut hands = 0;
    for _ in 0..1_000 {
        let results = table.next().unwrap();
        if table.started_hand() {
            let stacks: i64 = table.players().values().map(|p| p.chips()).sum();
            assert_eq!(stacks + table.pot().chips(), 2_000);
        }
        if results.is_some() {
            hands += 1;
            let stacks: i64 = table.players().values().map(|p| p.chips()).sum();
            assert_eq!(stacks, 2_000);
            if hands == 10 {
                break;
            }
        }
    }
    assert_eq!(hands, 10);
}

#[test]
fn fixed_limit_bounds_bets_to_the_round_size() {
    let opts = Config {
        game: Game::Holdem,
        limit: Limit::FixedLimit,
        stakes: Stakes {
            small_bet: 2,
            big_bet: 4,
            ante: 0,
            straddle: false,
        },
        num_of_seats: 6,
    };
    let table = Table::new(opts, Box::new(StandardDealer));
    let p1 = TestPlayer::new(1);
    let p2 = TestPlayer::new(2);
    let p3 = TestPlayer::new(3);
    let p4 = TestPlayer::new(4);
    table.sit(p1.clone(), 0, 100, false).unwrap();
    table.sit(p2, 1, 100, false).unwrap();
    table.sit(p3, 2, 100, false).unwrap();
    table.sit(p4, 3, 100, false).unwrap();

    table.next().unwrap();
    assert_eq!(table.action(), Some(0));
    assert_eq!(table.min_raise(), Some(1));
    assert_eq!(table.max_raise(), Some(4));

    // Above the fixed size: rejected, state unchanged, re-solicited.
    p1.raise(10);
    assert_eq!(table.next(), Err(TableError::InvalidRaise));
    assert_eq!(table.action(), Some(0));

    p1.raise(4);
    table.next().unwrap();
    assert_eq!(table.action(), Some(1));
    assert_eq!(table.player(0).unwrap().round_pot(), 4);
}

#[test]
fn pot_limit_caps_the_raise_at_the_pot() {
    let opts = Config {
        game: Game::Holdem,
        limit: Limit::PotLimit,
        stakes: Stakes {
            small_bet: 1,
            big_bet: 2,
            ante: 0,
            straddle: false,
        },
        num_of_seats: 6,
    };
    let table = Table::new(opts, Box::new(StandardDealer));
    for (id, seat) in (1..=4).zip(0..4) {
        table.sit(TestPlayer::new(id), seat, 100, false).unwrap();
    }

    table.next().unwrap();
    // Blinds 1 + 2 in the pot; first to act owes 2, so a pot-sized raise
    // is 3 + 2 + 2 = 7.
    assert_eq!(table.outstanding(), Some(2));
    assert_eq!(table.max_raise(), Some(7));
}

#[test]
fn invalid_actions_are_rejected_without_advancing() {
    let table = Table::new(no_limit_holdem(6), Box::new(StandardDealer));
    let p1 = TestPlayer::new(1);
    table.sit(p1.clone(), 0, 100, false).unwrap();
    table.sit(TestPlayer::new(2), 1, 100, false).unwrap();
    table.sit(TestPlayer::new(3), 2, 100, false).unwrap();
    table.sit(TestPlayer::new(4), 3, 100, false).unwrap();

    table.next().unwrap();
    assert_eq!(table.action(), Some(0));

    // Facing the big blind, a check is not available.
    p1.check();
    assert_eq!(table.next(), Err(TableError::InvalidAction));
    assert_eq!(table.action(), Some(0));

    // A bet is not available either while there are chips outstanding.
    p1.bet(10);
    assert_eq!(table.next(), Err(TableError::InvalidAction));

    // A raise below the minimum is rejected as such.
    p1.raise(3);
    assert_eq!(table.next(), Err(TableError::InvalidRaise));

    let pot_before = table.pot().chips();
    p1.call();
    table.next().unwrap();
    assert_eq!(table.pot().chips(), pot_before + 2);
}

#[test]
fn omaha_hi_lo_splits_the_pot_at_showdown() {
    let opts = Config {
        game: Game::OmahaHiLo,
        limit: Limit::PotLimit,
        stakes: Stakes {
            small_bet: 1,
            big_bet: 2,
            ante: 0,
            straddle: false,
        },
        num_of_seats: 6,
    };
    let dealer = poker_table::pokertest::dealer(&[
        "As", "Ad", "Kh", "Qc", // seat 0: top set material, no low
        "2h", "3d", "4s", "5c", // seat 1: wheel material
        "Ah", "7d", "8c", // flop with three low cards
        "Kd", // turn
        "Qd", // river
    ]);
    let table = Table::new(opts, dealer);
    let p1 = TestPlayer::new(1);
    let p2 = TestPlayer::new(2);
    table.sit(p1.clone(), 0, 100, false).unwrap();
    table.sit(p2.clone(), 1, 100, false).unwrap();

    p2.call();
    p1.check();
    for _ in 0..3 {
        p1.check();
        p2.check();
    }

    let mut results = None;
    for _ in 0..15 {
        if let Some(r) = table.next().unwrap() {
            results = Some(r);
            break;
        }
    }
    let results = results.expect("hand should reach showdown");

    // Seat 0's aces take the high half, seat 1's 8-7-3-2-A the low half.
    assert_eq!(results[&0][0].share, poker_table::Share::WonHigh);
    assert_eq!(results[&0][0].chips, 2);
    assert_eq!(results[&1][0].share, poker_table::Share::WonLow);
    assert_eq!(results[&1][0].chips, 2);
}

#[test]
fn leading_player_and_auto_conceal() {
    let dealer = poker_table::pokertest::dealer(&[
        "As", "Ah", "Kd", "Kh", "2c", "7d", "9h", "3s", "5c",
    ]);
    let table = Table::new(no_limit_holdem(6), dealer);
    let p1 = TestPlayer::new(1);
    let p2 = TestPlayer::new(2);
    table.sit(p1.clone(), 0, 100, false).unwrap();
    table.sit(p2.clone(), 1, 100, false).unwrap();

    p2.call();
    p1.check();
    table.next().unwrap();
    table.next().unwrap();
    table.next().unwrap();
    table.next().unwrap();
    assert_eq!(table.round(), 1);

    // On the flop the aces lead; no side pot carries an all-in yet.
    let leading = table.leading_player();
    assert_eq!(leading.keys().copied().collect::<Vec<_>>(), vec![0]);
    assert!(table.max_pot_leading_player().is_empty());

    for _ in 0..3 {
        p1.check();
        p2.check();
    }
    let mut results = None;
    for _ in 0..12 {
        if let Some(r) = table.next().unwrap() {
            results = Some(r);
            break;
        }
    }
    let results = results.expect("hand should reach showdown");

    // Walking from the winner's seat, the beaten kings are concealed and
    // stay concealed because they win nothing.
    let concealed = table.auto_conceal_hole_cards(0, &results);
    assert_eq!(concealed, vec![1]);
    assert!(table
        .player(1)
        .unwrap()
        .hole_cards()
        .iter()
        .all(|hc| hc.visibility == Visibility::Concealed));
    assert!(table
        .player(0)
        .unwrap()
        .hole_cards()
        .iter()
        .all(|hc| hc.visibility == Visibility::Exposed));
}

#[test]
fn omaha_deals_four_hole_cards_per_seat() {
    let opts = Config {
        game: Game::OmahaHi,
        limit: Limit::PotLimit,
        stakes: Stakes {
            small_bet: 1,
            big_bet: 2,
            ante: 0,
            straddle: false,
        },
        num_of_seats: 6,
    };
    let table = Table::new(opts, Box::new(StandardDealer));
    table.sit(TestPlayer::new(1), 0, 100, false).unwrap();
    table.sit(TestPlayer::new(2), 1, 100, false).unwrap();

    table.next().unwrap();
    for state in table.players().values() {
        assert_eq!(state.hole_cards().len(), 4);
    }
}
