//! Tunable constants shared by every attack pattern.

use std::time::Duration;

use boss_arena_core::{Damage, DamageType, PatternKind};
use serde::Deserialize;

/// Aggregated tuning knobs controlling pattern timing, geometry, and cooldowns.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct PatternTuning {
    /// Cooldown of a single fireball; every other cooldown derives from it.
    pub base_cooldown_ms: u64,
    /// Multiplier applied to the base cooldown for wall, cone, and storm volleys.
    pub volley_cooldown_multiplier: u32,
    /// Cooldown after a shockwave, independent of the base cooldown.
    pub shock_wave_cooldown_ms: u64,
    /// Delay between two consecutive shockwave rings.
    pub shock_wave_ring_delay_ms: u64,
    /// Time a shockwave hazard stays in the level before it is removed.
    pub hazard_lifetime_ms: u64,
    /// Health removed by a shockwave hazard per contact.
    pub hazard_damage: i32,
    /// Degrees the second cone volley is narrowed by on each side.
    pub cone_narrowing_degrees: u32,
    /// Delay between the first and the second cone volley.
    pub cone_follow_up_delay_ms: u64,
    /// Distance from the boss of the points storm projectiles aim at.
    pub storm_radius: f32,
    /// Delay before the normal attack re-samples the hero for its predicted shot.
    pub prediction_delay_ms: u64,
    /// Lead distance of the predicted shot in multiples of the boss-to-hero distance.
    pub prediction_scale: f32,
}

impl Default for PatternTuning {
    fn default() -> Self {
        Self {
            base_cooldown_ms: 500,
            volley_cooldown_multiplier: 2,
            shock_wave_cooldown_ms: 10_000,
            shock_wave_ring_delay_ms: 250,
            hazard_lifetime_ms: 2_000,
            hazard_damage: 1,
            cone_narrowing_degrees: 5,
            cone_follow_up_delay_ms: 125,
            storm_radius: 10.0,
            prediction_delay_ms: 50,
            prediction_scale: 2.0,
        }
    }
}

impl PatternTuning {
    /// Cooldown of a single fireball.
    #[must_use]
    pub fn base_cooldown(&self) -> Duration {
        Duration::from_millis(self.base_cooldown_ms)
    }

    /// Cooldown declared by `kind`.
    #[must_use]
    pub fn cooldown_for(&self, kind: PatternKind) -> Duration {
        match kind {
            PatternKind::FireWall { .. }
            | PatternKind::FireCone { .. }
            | PatternKind::FireStorm { .. } => {
                self.base_cooldown() * self.volley_cooldown_multiplier
            }
            PatternKind::FireShockWave { .. } => Duration::from_millis(self.shock_wave_cooldown_ms),
            PatternKind::NormalAttack => self.base_cooldown(),
        }
    }

    /// Damage dealt by shockwave hazards.
    #[must_use]
    pub const fn hazard_damage(&self) -> Damage {
        Damage::new(self.hazard_damage, DamageType::Fire)
    }
}
