//! The pot: a ledger of per-seat contributions for the current hand.
//!
//! Side pots are derived views over the same contribution map; they own no
//! chips of their own until payout time.

use log::warn;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use super::constants::MAX_SEATS;
use super::entities::{Chips, Seat};
use super::functional::{Hand, Sorting};

/// A mapping of seats to their ranked hands.
pub type Hands = BTreeMap<Seat, Hand>;

/// A mapping of each seat to its payout results.
pub type Results = BTreeMap<Seat, Vec<PotResult>>;

/// The rights a winner has to a pot.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Share {
    /// The high hand was won outright.
    WonHigh,
    /// The high hand was split.
    SplitHigh,
    /// The low hand was won outright.
    WonLow,
    /// The low hand was split.
    SplitLow,
}

impl fmt::Display for Share {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::WonHigh => "WonHigh",
            Self::SplitHigh => "SplitHigh",
            Self::WonLow => "WonLow",
            Self::SplitLow => "SplitLow",
        };
        write!(f, "{repr}")
    }
}

/// One player's winning claim on one pot. A claim with no hand means the
/// pot was taken uncontested.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PotResult {
    pub pot_no: usize,
    pub hand: Option<Hand>,
    pub chips: Chips,
    pub share: Share,
}

impl fmt::Display for PotResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.hand {
            Some(hand) => write!(
                f,
                "{} for {} chips with {} in pot {}",
                self.share, self.chips, hand, self.pot_no
            ),
            None => write!(
                f,
                "{} for {} chips uncontested in pot {}",
                self.share, self.chips, self.pot_no
            ),
        }
    }
}

/// The collection of contributions made by players during a hand. After
/// the showdown, the pot's chips are divided among the winners.
#[derive(Clone, Debug, PartialEq)]
pub struct Pot {
    contributions: BTreeMap<Seat, Chips>,
    num_of_seats: usize,
}

impl Pot {
    /// An empty pot for a table with the given seat count.
    pub fn new(num_of_seats: usize) -> Self {
        Self {
            contributions: BTreeMap::new(),
            num_of_seats,
        }
    }

    /// Adds the chip amount from the seat given.
    ///
    /// Panics on a negative amount; the table validates bets before they
    /// reach the ledger.
    pub fn contribute(&mut self, seat: Seat, chips: Chips) {
        assert!(chips >= 0, "pot: contribute negative bet amount");
        if chips > 0 {
            *self.contributions.entry(seat).or_default() += chips;
        }
    }

    /// Total chips in the pot.
    pub fn chips(&self) -> Chips {
        self.contributions
            .values()
            .try_fold(0 as Chips, |acc, &c| acc.checked_add(c))
            .expect("pot: chip total overflow")
    }

    /// The amount required for a seat to call the largest current bet.
    pub fn outstanding(&self, seat: Seat) -> Chips {
        let most = self.contributions.values().copied().max().unwrap_or(0);
        most - self.contribution(seat)
    }

    /// The amount the seat has contributed this hand.
    pub fn contribution(&self, seat: Seat) -> Chips {
        self.contributions.get(&seat).copied().unwrap_or(0)
    }

    /// Contributions by seat. Seats that have put in nothing are absent.
    pub fn contributions(&self) -> &BTreeMap<Seat, Chips> {
        &self.contributions
    }

    pub fn is_empty(&self) -> bool {
        self.contributions.is_empty()
    }

    pub(crate) fn seats(&self) -> Vec<Seat> {
        self.contributions.keys().copied().collect()
    }

    /// Results with the seat taking the entire pot uncontested.
    pub(crate) fn take(&self, seat: Seat) -> Results {
        BTreeMap::from([(
            seat,
            vec![PotResult {
                pot_no: 0,
                hand: None,
                chips: self.chips(),
                share: Share::WonHigh,
            }],
        )])
    }

    /// Partitions the pot into an ordered list of side pots, the main pot
    /// first.
    ///
    /// Distinct contribution levels produce candidate buckets; a bucket
    /// stays separate only when the previous one contains a genuine all-in
    /// (a seat whose running contribution equals its beginning stack).
    /// Buckets created purely by folds are merged into their predecessor.
    pub fn side_pots(&self, begin_chips: &BTreeMap<Seat, Chips>) -> Vec<Pot> {
        let amounts = self.side_pot_amounts();

        let mut buckets = Vec::with_capacity(amounts.len());
        for (i, &amount) in amounts.iter().enumerate() {
            let last = if i == 0 { 0 } else { amounts[i - 1] };
            let mut bucket = Pot::new(self.num_of_seats);
            for (&seat, &chips) in &self.contributions {
                if chips > last {
                    bucket.contribute(seat, chips.min(amount) - last);
                }
            }
            buckets.push(bucket);
        }

        let mut side_pots: Vec<Pot> = Vec::new();
        let mut last_all_in = false;
        for (i, bucket) in buckets.into_iter().enumerate() {
            let has_all_in = bucket.contributions.iter().any(|(seat, &chips)| {
                let committed: Chips = chips
                    + side_pots
                        .iter()
                        .map(|sp| sp.contribution(*seat))
                        .sum::<Chips>();
                committed == begin_chips.get(seat).copied().unwrap_or(0)
            });

            if last_all_in || i == 0 {
                side_pots.push(bucket);
            } else {
                let merged = side_pots.last_mut().expect("first bucket always kept");
                for (seat, chips) in bucket.contributions {
                    merged.contribute(seat, chips);
                }
            }
            last_all_in = has_all_in;
        }
        side_pots
    }

    // Distinct nonzero contribution levels, ascending.
    fn side_pot_amounts(&self) -> Vec<Chips> {
        let mut amounts: Vec<Chips> = self.contributions.values().copied().collect();
        amounts.sort_unstable();
        amounts.dedup();
        amounts
    }

    /// Divides the pot among the winning hands.
    ///
    /// Each side pot is paid in order, restricted to the seats that
    /// contributed to it. When qualifying low hands exist the pot splits in
    /// halves, the extra chip on odd totals going to the high half. Ties
    /// split equally with remainder chips walking the winning seats
    /// strictly after the button.
    pub fn payout(
        &self,
        begin_chips: &BTreeMap<Seat, Chips>,
        high_hands: &Hands,
        low_hands: &Hands,
        sorting: Sorting,
        button: Seat,
    ) -> Results {
        let side_pots = self.side_pots(begin_chips);
        if side_pots.len() > 1 {
            let mut results = Results::new();
            for (pot_no, side_pot) in side_pots.iter().enumerate() {
                combine_results(
                    &mut results,
                    side_pot.payout_single(pot_no, high_hands, low_hands, sorting, button),
                );
            }
            return results;
        }
        self.payout_single(0, high_hands, low_hands, sorting, button)
    }

    fn payout_single(
        &self,
        pot_no: usize,
        high_hands: &Hands,
        low_hands: &Hands,
        sorting: Sorting,
        button: Seat,
    ) -> Results {
        let seats = self.seats();
        let side_high = hands_for_seats(high_hands, &seats);
        let side_low = hands_for_seats(low_hands, &seats);

        if side_high.is_empty() {
            warn!("pot {pot_no} has no eligible claimants; no chips awarded");
            return Results::new();
        }
        if side_high.len() == 1 {
            let (&seat, _) = side_high.iter().next().expect("one claimant");
            let share = match sorting {
                Sorting::High => Share::WonHigh,
                Sorting::Low => Share::WonLow,
            };
            return BTreeMap::from([(
                seat,
                vec![PotResult {
                    pot_no,
                    hand: None,
                    chips: self.chips(),
                    share,
                }],
            )]);
        }

        if side_low.is_empty() {
            let winners = winning_hands(&side_high);
            let share = match sorting {
                Sorting::High => high_pot_share as fn(usize) -> Share,
                Sorting::Low => low_pot_share,
            };
            return self.results_from_winners(pot_no, &winners, self.chips(), button, share);
        }

        let high_winners = winning_hands(&side_high);
        let low_winners = winning_hands(&side_low);
        if low_winners.is_empty() {
            return self.results_from_winners(
                pot_no,
                &high_winners,
                self.chips(),
                button,
                high_pot_share,
            );
        }

        let chips = self.chips();
        let high_amount = chips - chips / 2;
        let mut results =
            self.results_from_winners(pot_no, &high_winners, high_amount, button, high_pot_share);
        combine_results(
            &mut results,
            self.results_from_winners(pot_no, &low_winners, chips / 2, button, low_pot_share),
        );
        results
    }

    // Splits the chips equally among the winners; remainder chips go one
    // per winner starting from the first winning seat strictly after the
    // button.
    fn results_from_winners(
        &self,
        pot_no: usize,
        winners: &Hands,
        chips: Chips,
        button: Seat,
        share: fn(usize) -> Share,
    ) -> Results {
        let n = winners.len() as Chips;
        let mut results: Results = winners
            .iter()
            .map(|(&seat, hand)| {
                (
                    seat,
                    vec![PotResult {
                        pot_no,
                        hand: Some(hand.clone()),
                        chips: chips / n,
                        share: share(winners.len()),
                    }],
                )
            })
            .collect();

        let mut remainder = chips % n;
        let mut seat = (button + 1) % self.num_of_seats;
        while remainder > 0 {
            if let Some(rs) = results.get_mut(&seat) {
                rs[0].chips += 1;
                remainder -= 1;
            }
            seat = (seat + 1) % self.num_of_seats;
        }
        results
    }
}

// The json format is:
// {"contributions":{"0":5,"1":5},"chips":10}
#[derive(Deserialize, Serialize)]
struct PotJson {
    contributions: BTreeMap<Seat, Chips>,
    chips: Chips,
}

impl Serialize for Pot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        PotJson {
            contributions: self.contributions.clone(),
            chips: self.chips(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Pot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let j = PotJson::deserialize(deserializer)?;
        Ok(Self {
            contributions: j.contributions,
            num_of_seats: MAX_SEATS,
        })
    }
}

impl fmt::Display for Pot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "contributions: {:?}", self.contributions)
    }
}

impl Pot {
    pub(crate) fn set_num_of_seats(&mut self, num_of_seats: usize) {
        self.num_of_seats = num_of_seats;
    }
}

/// The highest ranking hands among the given map, all tied seats included.
pub(crate) fn winning_hands(hands: &Hands) -> Hands {
    let Some(best) = hands.values().max_by(|a, b| a.compare_to(b)) else {
        return Hands::new();
    };
    hands
        .iter()
        .filter(|(_, hand)| best.compare_to(hand) == Ordering::Equal)
        .map(|(&seat, hand)| (seat, hand.clone()))
        .collect()
}

/// Restriction of the hands map to the given seats.
pub(crate) fn hands_for_seats(hands: &Hands, seats: &[Seat]) -> Hands {
    hands
        .iter()
        .filter(|(seat, _)| seats.contains(seat))
        .map(|(&seat, hand)| (seat, hand.clone()))
        .collect()
}

fn high_pot_share(winners: usize) -> Share {
    if winners == 1 {
        Share::WonHigh
    } else {
        Share::SplitHigh
    }
}

fn low_pot_share(winners: usize) -> Share {
    if winners == 1 {
        Share::WonLow
    } else {
        Share::SplitLow
    }
}

pub(crate) fn combine_results(base: &mut Results, other: Results) {
    for (seat, results) in other {
        base.entry(seat).or_default().extend(results);
    }
}
