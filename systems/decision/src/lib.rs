#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Health-tiered boss decision policy.
//!
//! A boss picks its next pattern from the weighted table of its current
//! health tier. Exactly one random draw happens per decision, and the pick is
//! a pure function of the tables, the boss health, and that draw, so a seeded
//! policy replays the same fight.

use boss_arena_core::{Health, HealthTier, PatternKind};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Pattern together with its relative selection weight.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct WeightedEntry {
    /// Pattern selected when the draw lands on this entry.
    #[serde(flatten)]
    pub pattern: PatternKind,
    /// Relative likelihood of the entry within its tier.
    pub weight: f64,
}

impl WeightedEntry {
    /// Creates a weighted entry.
    #[must_use]
    pub const fn new(pattern: PatternKind, weight: f64) -> Self {
        Self { pattern, weight }
    }
}

/// Weighted patterns available within one health tier.
///
/// The first entry is the tier's primary pattern.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct TierTable {
    entries: Vec<WeightedEntry>,
}

impl TierTable {
    /// Creates a table from its entries, primary pattern first.
    #[must_use]
    pub fn new(entries: Vec<WeightedEntry>) -> Self {
        Self { entries }
    }

    /// Entries of the table in selection order.
    #[must_use]
    pub fn entries(&self) -> &[WeightedEntry] {
        &self.entries
    }

    fn total_weight(&self) -> f64 {
        self.entries.iter().map(|entry| entry.weight).sum()
    }

    /// Entry index chosen by `roll` in `[0, 1)`.
    fn pick(&self, roll: f64) -> usize {
        let mut remaining = roll.clamp(0.0, 1.0) * self.total_weight();
        for (index, entry) in self.entries.iter().enumerate() {
            if remaining < entry.weight {
                return index;
            }
            remaining -= entry.weight;
        }
        self.entries
            .iter()
            .rposition(|entry| entry.weight > 0.0)
            .unwrap_or(0)
    }

    fn validate(&self, tier: HealthTier) -> Result<(), DecisionError> {
        if self.entries.is_empty() {
            return Err(DecisionError::EmptyTier { tier });
        }
        if let Some(entry) = self
            .entries
            .iter()
            .find(|entry| !entry.weight.is_finite() || entry.weight < 0.0)
        {
            return Err(DecisionError::InvalidWeight {
                tier,
                weight: entry.weight,
            });
        }
        if self.total_weight() <= 0.0 {
            return Err(DecisionError::ZeroTotalWeight { tier });
        }
        Ok(())
    }
}

/// Pattern tables for every health tier.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct DecisionTables {
    /// Patterns used above 75 percent health.
    pub high: TierTable,
    /// Patterns used above 50 and up to 75 percent health.
    pub mid: TierTable,
    /// Patterns used at or below 50 percent health.
    pub low: TierTable,
}

impl Default for DecisionTables {
    fn default() -> Self {
        Self {
            high: TierTable::new(vec![
                WeightedEntry::new(PatternKind::fire_cone(), 0.9),
                WeightedEntry::new(PatternKind::NormalAttack, 0.1),
            ]),
            mid: TierTable::new(vec![
                WeightedEntry::new(PatternKind::FireWall { width: 5 }, 0.8),
                WeightedEntry::new(PatternKind::fire_storm(), 0.16),
                WeightedEntry::new(PatternKind::fire_cone(), 0.04),
            ]),
            low: TierTable::new(vec![
                WeightedEntry::new(PatternKind::FireWall { width: 10 }, 0.7),
                WeightedEntry::new(PatternKind::fire_storm(), 0.21),
                WeightedEntry::new(PatternKind::FireShockWave { radius: 6 }, 0.09),
            ]),
        }
    }
}

impl DecisionTables {
    /// Table consulted in `tier`.
    #[must_use]
    pub fn table(&self, tier: HealthTier) -> &TierTable {
        match tier {
            HealthTier::High => &self.high,
            HealthTier::Mid => &self.mid,
            HealthTier::Low => &self.low,
        }
    }

    /// Rejects tables that could not produce a pattern.
    pub fn validate(&self) -> Result<(), DecisionError> {
        for tier in [HealthTier::High, HealthTier::Mid, HealthTier::Low] {
            self.table(tier).validate(tier)?;
        }
        Ok(())
    }

    /// Chooses a pattern for `health` given a draw `roll` in `[0, 1)`.
    ///
    /// Only the table of the active tier is consulted. Tables are expected to
    /// have passed [`DecisionTables::validate`]; an empty table falls back to
    /// the normal attack.
    #[must_use]
    pub fn select(&self, health: Health, roll: f64) -> Decision {
        let percent = health.percent();
        let tier = HealthTier::from_percent(percent);
        let table = self.table(tier);
        let index = table.pick(roll);
        let pattern = table
            .entries
            .get(index)
            .map_or(PatternKind::NormalAttack, |entry| entry.pattern);

        Decision {
            tier,
            percent,
            roll,
            pattern,
            primary: index == 0,
        }
    }
}

/// Reasons a set of decision tables is rejected.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum DecisionError {
    /// A tier has no patterns.
    #[error("{tier:?} tier has no patterns")]
    EmptyTier {
        /// Tier lacking patterns.
        tier: HealthTier,
    },
    /// A weight is negative or not finite.
    #[error("{tier:?} tier has invalid weight {weight}")]
    InvalidWeight {
        /// Tier containing the weight.
        tier: HealthTier,
        /// Offending weight.
        weight: f64,
    },
    /// Every weight of a tier is zero.
    #[error("{tier:?} tier weights sum to zero")]
    ZeroTotalWeight {
        /// Tier whose weights sum to zero.
        tier: HealthTier,
    },
}

/// Outcome of a single boss decision.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Decision {
    /// Tier that was active.
    pub tier: HealthTier,
    /// Health percentage the tier was derived from.
    pub percent: f64,
    /// Random draw in `[0, 1)` that chose the pattern.
    pub roll: f64,
    /// Chosen pattern.
    pub pattern: PatternKind,
    /// Whether the tier's primary pattern was chosen.
    pub primary: bool,
}

/// Seeded decision policy owned by a boss combat system.
#[derive(Clone, Debug)]
pub struct BossDecision {
    tables: DecisionTables,
    rng: ChaCha8Rng,
}

impl BossDecision {
    /// Creates a policy drawing from a generator seeded with `seed`.
    pub fn new(tables: DecisionTables, seed: u64) -> Result<Self, DecisionError> {
        tables.validate()?;
        Ok(Self {
            tables,
            rng: ChaCha8Rng::seed_from_u64(seed),
        })
    }

    /// Draws once and chooses the next pattern for a boss at `health`.
    pub fn decide(&mut self, health: Health) -> Decision {
        let roll: f64 = self.rng.gen();
        let decision = self.tables.select(health, roll);
        debug!(
            tier = ?decision.tier,
            percent = decision.percent,
            roll = decision.roll,
            pattern = %decision.pattern,
            primary = decision.primary,
            "boss decided"
        );
        decision
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};

    use super::*;

    fn rolls() -> impl Iterator<Item = f64> {
        (0..1_000).map(|step| f64::from(step) / 1_000.0)
    }

    fn reachable(tables: &DecisionTables, health: Health) -> HashSet<PatternKind> {
        rolls()
            .map(|roll| tables.select(health, roll).pattern)
            .collect()
    }

    #[test]
    fn each_tier_reaches_exactly_its_table() {
        let tables = DecisionTables::default();

        assert_eq!(
            reachable(&tables, Health::new(90, 100)),
            HashSet::from([PatternKind::fire_cone(), PatternKind::NormalAttack])
        );
        assert_eq!(
            reachable(&tables, Health::new(60, 100)),
            HashSet::from([
                PatternKind::FireWall { width: 5 },
                PatternKind::fire_storm(),
                PatternKind::fire_cone(),
            ])
        );
        assert_eq!(
            reachable(&tables, Health::new(50, 100)),
            HashSet::from([
                PatternKind::FireWall { width: 10 },
                PatternKind::fire_storm(),
                PatternKind::FireShockWave { radius: 6 },
            ])
        );
    }

    #[test]
    fn seventy_five_percent_is_mid_tier() {
        let tables = DecisionTables::default();
        for roll in rolls() {
            let decision = tables.select(Health::new(75, 100), roll);
            assert_eq!(decision.tier, HealthTier::Mid);
            assert!(!matches!(
                decision.pattern,
                PatternKind::FireShockWave { .. }
                    | PatternKind::NormalAttack
                    | PatternKind::FireWall { width: 10 }
            ));
        }
    }

    #[test]
    fn roll_boundaries_follow_cumulative_weights() {
        let tables = DecisionTables::default();
        let high = Health::full(100);
        assert_eq!(tables.select(high, 0.0).pattern, PatternKind::fire_cone());
        assert!(tables.select(high, 0.0).primary);
        assert_eq!(tables.select(high, 0.89).pattern, PatternKind::fire_cone());
        assert_eq!(tables.select(high, 0.91).pattern, PatternKind::NormalAttack);
        assert!(!tables.select(high, 0.91).primary);

        let mid = Health::new(60, 100);
        assert_eq!(
            tables.select(mid, 0.79).pattern,
            PatternKind::FireWall { width: 5 }
        );
        assert!(tables.select(mid, 0.79).primary);
        assert_eq!(tables.select(mid, 0.85).pattern, PatternKind::fire_storm());
        assert_eq!(tables.select(mid, 0.97).pattern, PatternKind::fire_cone());
        assert!(!tables.select(mid, 0.97).primary);

        let low = Health::new(10, 100);
        assert_eq!(
            tables.select(low, 0.69).pattern,
            PatternKind::FireWall { width: 10 }
        );
        assert_eq!(tables.select(low, 0.8).pattern, PatternKind::fire_storm());
        assert_eq!(
            tables.select(low, 0.95).pattern,
            PatternKind::FireShockWave { radius: 6 }
        );
    }

    #[test]
    fn zero_maximum_health_counts_as_low_tier() {
        let decision = DecisionTables::default().select(Health::new(0, 0), 0.5);
        assert_eq!(decision.tier, HealthTier::Low);
        assert_eq!(decision.percent, 0.0);
    }

    #[test]
    fn same_seed_replays_the_same_decisions() {
        let run = || {
            let mut policy =
                BossDecision::new(DecisionTables::default(), 0x5eed).expect("valid tables");
            (0..64)
                .map(|step| policy.decide(Health::new(100 - step, 100)).pattern)
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    fn shares(health: Health) -> HashMap<&'static str, f64> {
        let mut policy = BossDecision::new(DecisionTables::default(), 7).expect("valid tables");
        let draws = 20_000;
        let mut counts = HashMap::new();
        for _ in 0..draws {
            *counts.entry(policy.decide(health).pattern.name()).or_insert(0) += 1;
        }
        counts
            .into_iter()
            .map(|(name, count)| (name, f64::from(count) / f64::from(draws)))
            .collect()
    }

    fn assert_shares(health: Health, expected: &[(&str, f64)]) {
        let shares = shares(health);
        assert_eq!(shares.len(), expected.len(), "{shares:?}");
        for (name, weight) in expected {
            let share = shares.get(name).copied().unwrap_or(0.0);
            assert!((share - weight).abs() < 0.02, "{name}: {share} vs {weight}");
        }
    }

    #[test]
    fn frequencies_follow_weights() {
        assert_shares(
            Health::new(90, 100),
            &[("fire_cone", 0.9), ("normal_attack", 0.1)],
        );
        assert_shares(
            Health::new(60, 100),
            &[("fire_wall", 0.8), ("fire_storm", 0.16), ("fire_cone", 0.04)],
        );
        assert_shares(
            Health::new(20, 100),
            &[("fire_wall", 0.7), ("fire_storm", 0.21), ("fire_shock_wave", 0.09)],
        );
    }

    #[test]
    fn validation_rejects_unusable_tables() {
        let mut tables = DecisionTables::default();
        tables.mid = TierTable::new(Vec::new());
        assert_eq!(
            tables.validate(),
            Err(DecisionError::EmptyTier {
                tier: HealthTier::Mid
            })
        );

        tables.mid = TierTable::new(vec![WeightedEntry::new(PatternKind::NormalAttack, -1.0)]);
        assert!(matches!(
            tables.validate(),
            Err(DecisionError::InvalidWeight { .. })
        ));

        tables.mid = TierTable::new(vec![WeightedEntry::new(PatternKind::NormalAttack, 0.0)]);
        assert!(BossDecision::new(tables, 1).is_err());
    }
}
