//! Hand Evaluation Example
//!
//! Demonstrates how to rank and compare poker hands.

use poker_table::pokertest::cards;
use poker_table::{omaha_eight_or_better, omaha_high, Hand};
use std::cmp::Ordering;

fn main() {
    println!("=== Hand Evaluation Example ===\n");

    // Example 1: best five of seven cards.
    let seven = cards(&["Ah", "Kh", "Qh", "Jh", "Th", "9s", "2c"]);
    let hand = Hand::new(&seven);
    println!("Seven cards: {seven:?}");
    println!("Best hand:   {hand}\n");

    // Example 2: comparing two hands.
    let aces = Hand::new(&cards(&["As", "Ah", "Tc", "9d", "2s"]));
    let kings = Hand::new(&cards(&["Ks", "Kh", "Tc", "9d", "2s"]));
    println!("{aces}  vs  {kings}");
    match aces.compare_to(&kings) {
        Ordering::Greater => println!("-> the aces win\n"),
        Ordering::Less => println!("-> the kings win\n"),
        Ordering::Equal => println!("-> a tie\n"),
    }

    // Example 3: Omaha plays exactly two hole cards.
    let holes = cards(&["Ah", "Kh", "7d", "6c"]);
    let board = cards(&["Qh", "Jh", "Th", "2s", "3c"]);
    let high = omaha_high(&holes, &board);
    println!("Omaha {holes:?} on {board:?}");
    println!("High: {high}");
    match omaha_eight_or_better(&holes, &board) {
        Some(low) => println!("Low:  {low}\n"),
        None => println!("Low:  no qualifying low\n"),
    }

    // Example 4: one of each ranking.
    let examples = [
        ("royal flush", cards(&["As", "Ks", "Qs", "Js", "Ts"])),
        ("straight flush", cards(&["9h", "8h", "7h", "6h", "5h"])),
        ("four of a kind", cards(&["8s", "8h", "8d", "8c", "2s"])),
        ("full house", cards(&["Ts", "Th", "Td", "6c", "6s"])),
        ("flush", cards(&["Kc", "Jc", "8c", "5c", "3c"])),
        ("straight", cards(&["Ts", "9h", "8d", "7c", "6s"])),
        ("three of a kind", cards(&["7s", "7h", "7d", "Qc", "3s"])),
        ("two pair", cards(&["Qs", "Qh", "5d", "5c", "2s"])),
        ("pair", cards(&["9s", "9h", "Kd", "7c", "4s"])),
        ("high card", cards(&["As", "Qh", "Td", "7c", "3s"])),
    ];
    for (name, five) in examples {
        let hand = Hand::new(&five);
        println!("{name:16} -> {:?}: {}", hand.ranking(), hand.description());
    }
}
