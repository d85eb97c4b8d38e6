//! Configuration surface of the boss combat system.

use boss_arena_core::{Damage, DamageType, ProjectileSpec, Vec2};
use boss_arena_system_decision::{DecisionError, DecisionTables};
use boss_arena_system_patterns::PatternTuning;
use serde::Deserialize;
use thiserror::Error;

/// Aggregated tuning of patterns, decisions, and the boss fireball.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Timing, geometry, and cooldowns of the attack patterns.
    pub patterns: PatternTuning,
    /// Weighted pattern tables per health tier.
    pub decision: DecisionTables,
    /// Flight behaviour of every projectile the boss launches.
    pub projectile: ProjectileTuning,
}

/// Tunable parameters of the boss fireball.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProjectileTuning {
    /// Travel speed in world units per second.
    pub speed: f32,
    /// Maximal distance travelled before the fireball despawns.
    pub range: f32,
    /// Fire damage dealt on impact.
    pub damage: i32,
    /// Edge length of the square collision box.
    pub hitbox: f32,
}

impl Default for ProjectileTuning {
    fn default() -> Self {
        let fireball = ProjectileSpec::fireball();
        Self {
            speed: fireball.speed,
            range: fireball.range,
            damage: fireball.damage.amount,
            hitbox: fireball.hitbox.x,
        }
    }
}

impl CombatConfig {
    /// Checks that the decision tables and the fireball tuning are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.decision.validate()?;
        self.projectile.validate()
    }
}

impl ProjectileTuning {
    /// Checks that speed, range, and hitbox are finite and positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("speed", self.speed),
            ("range", self.range),
            ("hitbox", self.hitbox),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidProjectile { field, value });
            }
        }
        Ok(())
    }

    /// Fireball spec with the tuned parameters applied.
    #[must_use]
    pub fn spec(&self) -> ProjectileSpec {
        ProjectileSpec {
            speed: self.speed,
            range: self.range,
            damage: Damage::new(self.damage, DamageType::Fire),
            hitbox: Vec2::splat(self.hitbox),
            ..ProjectileSpec::fireball()
        }
    }
}

/// Reasons a combat configuration is rejected.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// The decision tables cannot produce a pattern.
    #[error(transparent)]
    Decision(#[from] DecisionError),
    /// A fireball parameter would keep projectiles alive indefinitely.
    #[error("projectile {field} must be finite and positive, got {value}")]
    InvalidProjectile {
        /// Name of the offending parameter.
        field: &'static str,
        /// Rejected value.
        value: f32,
    },
}
