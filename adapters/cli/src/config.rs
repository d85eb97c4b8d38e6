//! Scenario file understood by the command-line simulator.

use std::{fs, path::Path};

use anyhow::Context as _;
use boss_arena_system_boss_combat::CombatConfig;
use serde::Deserialize;

/// Everything a simulated fight needs, as read from a TOML scenario.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct ScenarioConfig {
    /// Tuning handed to the boss combat system.
    pub(crate) combat: CombatConfig,
    /// Arena and actor setup.
    pub(crate) arena: ArenaConfig,
    /// Length and pacing of the run.
    pub(crate) run: RunConfig,
}

/// Arena dimensions and actor setup.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct ArenaConfig {
    /// Columns of the walled arena.
    pub(crate) columns: u32,
    /// Rows of the walled arena.
    pub(crate) rows: u32,
    /// Maximal health of the boss.
    pub(crate) boss_health: i32,
    /// Maximal health of the hero.
    pub(crate) hero_health: i32,
    /// Distance in tiles the hero keeps while circling the boss.
    pub(crate) orbit_radius: f32,
    /// Angular speed of the hero in radians per second.
    pub(crate) orbit_speed: f32,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            columns: 25,
            rows: 25,
            boss_health: 100,
            hero_health: 1_000,
            orbit_radius: 5.0,
            orbit_speed: 0.6,
        }
    }
}

/// Pacing of the simulated fight.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct RunConfig {
    /// Seed of the decision policy and the world.
    pub(crate) seed: u64,
    /// Number of ticks to simulate.
    pub(crate) ticks: u32,
    /// Simulated milliseconds per tick.
    pub(crate) tick_ms: u64,
    /// Damage the hero deals to the boss every second.
    pub(crate) boss_damage_per_second: i32,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            seed: 7,
            ticks: 600,
            tick_ms: 50,
            boss_damage_per_second: 4,
        }
    }
}

impl ScenarioConfig {
    /// Reads a scenario from the TOML file at `path`.
    pub(crate) fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing scenario {}", path.display()))
    }
}
