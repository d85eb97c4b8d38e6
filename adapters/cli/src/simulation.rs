//! Headless fight between a circling hero and a single boss.

use std::{collections::BTreeMap, fmt, time::Duration};

use anyhow::Context as _;
use boss_arena_core::{Command, EntityId, Event, Health, LevelLayout, Timestamp, Vec2};
use boss_arena_system_boss_combat::BossCombat;
use boss_arena_world::{apply, flush_events, World};
use tracing::{debug, info};

use crate::config::ScenarioConfig;

/// Totals gathered over a simulated fight.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Summary {
    /// Simulated time.
    pub(crate) elapsed: Duration,
    /// Patterns started, keyed by pattern name.
    pub(crate) patterns: BTreeMap<&'static str, usize>,
    /// Pattern invocations that were aborted.
    pub(crate) aborted: usize,
    /// Projectiles launched by the boss.
    pub(crate) projectiles: usize,
    /// Fire hazards placed by shockwaves.
    pub(crate) hazards: usize,
    /// Health the hero lost.
    pub(crate) hero_damage: i32,
    /// Whether the boss died before the run ended.
    pub(crate) boss_defeated: bool,
}

impl Summary {
    fn observe(&mut self, hero: EntityId, event: &Event) {
        match event {
            Event::PatternStarted { pattern, .. } => {
                *self.patterns.entry(pattern.name()).or_default() += 1;
            }
            Event::PatternAborted { .. } => self.aborted += 1,
            Event::ProjectileLaunched { .. } => self.projectiles += 1,
            Event::HazardSpawned { .. } => self.hazards += 1,
            Event::EntityDamaged { entity, damage, .. } if *entity == hero => {
                self.hero_damage += damage.amount;
            }
            Event::BossDefeated { .. } => self.boss_defeated = true,
            _ => {}
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "simulated {:.1}s", self.elapsed.as_secs_f32())?;
        for (pattern, count) in &self.patterns {
            writeln!(f, "  {pattern:<16} {count}")?;
        }
        writeln!(f, "aborted patterns: {}", self.aborted)?;
        writeln!(f, "projectiles:      {}", self.projectiles)?;
        writeln!(f, "fire hazards:     {}", self.hazards)?;
        writeln!(f, "hero damage:      {}", self.hero_damage)?;
        write!(
            f,
            "boss:             {}",
            if self.boss_defeated { "defeated" } else { "alive" }
        )
    }
}

/// Runs the fight described by `scenario` to completion.
pub(crate) fn run(scenario: &ScenarioConfig) -> anyhow::Result<Summary> {
    let arena = &scenario.arena;
    let run = &scenario.run;
    let mut world = World::with_seed(run.seed);
    let mut combat = BossCombat::new(scenario.combat.clone(), run.seed)
        .context("building the boss combat system")?;
    let mut events = Vec::new();

    apply(
        &mut world,
        Command::ConfigureLevel {
            layout: LevelLayout::walled_arena(arena.columns, arena.rows),
        },
        &mut events,
    );
    let centre = Vec2::new(arena.columns as f32 / 2.0, arena.rows as f32 / 2.0);
    let boss = spawn(
        &mut world,
        &mut events,
        Command::SpawnBoss {
            position: centre,
            health: Health::full(arena.boss_health),
        },
    )
    .context("spawning the boss")?;
    let hero = spawn(
        &mut world,
        &mut events,
        Command::SpawnHero {
            position: orbit(centre, arena.orbit_radius, 0.0),
            health: Health::full(arena.hero_health),
        },
    )
    .context("spawning the hero")?;
    let _ = combat.register_boss(boss);
    info!(%boss, %hero, ticks = run.ticks, "fight started");

    let mut summary = Summary::default();
    let step = Duration::from_millis(run.tick_ms);
    let mut now = Timestamp::ZERO;
    let mut next_hit = Timestamp::from_millis(1_000);

    for _ in 0..run.ticks {
        now = now.saturating_add(step);
        let angle = arena.orbit_speed * now.as_millis() as f32 / 1_000.0;
        apply(
            &mut world,
            Command::MoveEntity {
                entity: hero,
                position: orbit(centre, arena.orbit_radius, angle),
            },
            &mut events,
        );
        while next_hit <= now && !summary.boss_defeated {
            apply(
                &mut world,
                Command::DamageEntity {
                    entity: boss,
                    amount: run.boss_damage_per_second,
                },
                &mut events,
            );
            next_hit = next_hit.saturating_add(Duration::from_secs(1));
        }
        apply(&mut world, Command::Tick { dt: step }, &mut events);

        let report = combat.tick(&mut world, now);
        if report.patterns_started > 0 {
            debug!(%now, started = report.patterns_started, "tick");
        }
        flush_events(&mut world, &mut events);
        for event in events.drain(..) {
            summary.observe(hero, &event);
        }
    }

    let _ = combat.teardown(&mut world);
    apply(&mut world, Command::TeardownLevel, &mut events);
    summary.elapsed = now.saturating_duration_since(Timestamp::ZERO);
    info!(
        patterns = summary.patterns.values().sum::<usize>(),
        projectiles = summary.projectiles,
        "fight finished"
    );
    Ok(summary)
}

fn spawn(world: &mut World, events: &mut Vec<Event>, command: Command) -> Option<EntityId> {
    let start = events.len();
    apply(world, command, events);
    events[start..].iter().find_map(|event| match event {
        Event::ActorSpawned { entity, .. } => Some(*entity),
        _ => None,
    })
}

fn orbit(centre: Vec2, radius: f32, angle: f32) -> Vec2 {
    centre + Vec2::new(angle.cos(), angle.sin()) * radius
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_fight_ends_with_the_boss_defeated() {
        let summary = run(&ScenarioConfig::default()).expect("default scenario runs");

        assert!(summary.boss_defeated);
        assert!(summary.patterns.values().sum::<usize>() > 3);
        assert!(summary.projectiles > 0);
        assert_eq!(summary.aborted, 0);
    }

    #[test]
    fn same_seed_replays_the_same_fight() {
        let mut scenario = ScenarioConfig::default();
        scenario.run.ticks = 200;

        let first = run(&scenario).expect("scenario runs");
        let second = run(&scenario).expect("scenario runs");

        assert_eq!(first, second);
    }
}
