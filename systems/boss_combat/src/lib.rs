#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Boss combat orchestration.
//!
//! [`BossCombat`] owns the level's scheduler, the seeded decision policy, and
//! the cooldown of every registered boss. Each tick it retires defeated
//! bosses, fires due sub-events, and lets every ready boss commit to a new
//! pattern: the pattern is planned from a single world sample, its immediate
//! directives run on the spot, and the rest are deferred through the
//! scheduler.

mod config;
mod executor;

use std::{collections::BTreeMap, time::Duration};

use boss_arena_core::{
    CombatError, CombatWorld, Cooldown, Coordinate, EntityId, Event, ProjectileSpec, Timestamp,
    Vec2,
};
use boss_arena_system_decision::{BossDecision, Decision};
use boss_arena_system_launch::{launch_projectile, LaunchError, LaunchReceipt, LaunchRequest};
use boss_arena_system_patterns::{plan, PatternInput, Timing};
use boss_arena_system_scheduler::{ActionHandle, Scheduler, TickReport};
use thiserror::Error;
use tracing::{debug, error, info, warn};

pub use config::{CombatConfig, ConfigError, ProjectileTuning};
use executor::DirectiveContext;

/// Combat bookkeeping of a registered boss.
#[derive(Clone, Debug, Default)]
struct BossState {
    cooldown: Cooldown,
    offensive: Vec<ActionHandle>,
}

/// Outcome of a single combat tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CombatTickReport {
    /// Scheduled actions fired and failed during the tick.
    pub actions: TickReport,
    /// Patterns bosses committed to.
    pub patterns_started: usize,
    /// Pattern invocations that were aborted.
    pub patterns_aborted: usize,
    /// Bosses retired because they died or left the world.
    pub bosses_defeated: usize,
}

/// Per-level boss combat system.
#[derive(Debug)]
pub struct BossCombat<W> {
    config: CombatConfig,
    projectile: ProjectileSpec,
    decision: BossDecision,
    scheduler: Scheduler<W>,
    bosses: BTreeMap<EntityId, BossState>,
}

impl<W> BossCombat<W>
where
    W: CombatWorld + 'static,
{
    /// Creates a combat system whose decisions derive from `seed`.
    ///
    /// Fails when the configuration is rejected by [`CombatConfig::validate`].
    pub fn new(config: CombatConfig, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        let decision = BossDecision::new(config.decision.clone(), seed)?;
        Ok(Self {
            projectile: config.projectile.spec(),
            config,
            decision,
            scheduler: Scheduler::new(),
            bosses: BTreeMap::new(),
        })
    }

    /// Configuration the system was created with.
    #[must_use]
    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    /// Scheduler holding the level's pending sub-events.
    #[must_use]
    pub fn scheduler(&self) -> &Scheduler<W> {
        &self.scheduler
    }

    /// Time of the most recent tick.
    #[must_use]
    pub fn now(&self) -> Timestamp {
        self.scheduler.now()
    }

    /// Registered bosses in identifier order.
    pub fn bosses(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.bosses.keys().copied()
    }

    /// Cooldown of `boss`, if it is registered.
    #[must_use]
    pub fn cooldown(&self, boss: EntityId) -> Option<Cooldown> {
        self.bosses.get(&boss).map(|state| state.cooldown)
    }

    /// Number of offensive sub-events of `boss` still waiting to fire.
    #[must_use]
    pub fn pending_offensive(&self, boss: EntityId) -> usize {
        self.bosses.get(&boss).map_or(0, |state| {
            state
                .offensive
                .iter()
                .filter(|handle| self.scheduler.is_pending(**handle))
                .count()
        })
    }

    /// Starts driving `boss`. It may decide on the next tick.
    ///
    /// Returns `false` when the boss was already registered.
    pub fn register_boss(&mut self, boss: EntityId) -> bool {
        if self.bosses.contains_key(&boss) {
            return false;
        }
        let _ = self.bosses.insert(boss, BossState::default());
        debug!(%boss, "boss registered");
        true
    }

    /// Advances combat to `now`.
    ///
    /// Defeated bosses are retired before due sub-events fire, so a dead boss
    /// never launches again. A boss counts as defeated when its health is
    /// depleted or it left the world; a boss that merely lacks health aborts
    /// its turn instead.
    pub fn tick(&mut self, world: &mut W, now: Timestamp) -> CombatTickReport {
        let mut report = CombatTickReport::default();

        let defeated: Vec<EntityId> = self
            .bosses
            .keys()
            .copied()
            .filter(|boss| match world.health_of(*boss) {
                Ok(health) => health.is_depleted(),
                Err(_) => world.position_of(*boss).is_err(),
            })
            .collect();
        for boss in defeated {
            let _ = self.retire_boss(world, boss);
            report.bosses_defeated += 1;
        }

        report.actions = self.scheduler.tick(now, world);
        self.prune_offensive();

        let now = self.scheduler.now();
        let ready: Vec<EntityId> = self
            .bosses
            .iter()
            .filter(|(_, state)| state.cooldown.is_ready(now))
            .map(|(boss, _)| *boss)
            .collect();
        for boss in ready {
            match self.invoke(world, boss) {
                Ok(_) => report.patterns_started += 1,
                Err(_) => report.patterns_aborted += 1,
            }
        }

        report
    }

    /// Lets `boss` decide on and start a pattern immediately, ignoring its cooldown.
    ///
    /// Cooldowns and sub-events are only tracked for registered bosses. On
    /// failure nothing is launched, [`Event::PatternAborted`] is recorded, and
    /// the boss waits the base cooldown before deciding again.
    pub fn invoke(&mut self, world: &mut W, boss: EntityId) -> Result<Decision, CombatError> {
        let now = self.scheduler.now();
        match self.start_pattern(world, boss) {
            Ok((decision, cooldown)) => {
                if let Some(state) = self.bosses.get_mut(&boss) {
                    state.cooldown.arm(now, cooldown);
                }
                Ok(decision)
            }
            Err(error) => {
                if error.is_missing_precondition() {
                    warn!(%boss, %error, "pattern aborted");
                } else {
                    error!(%boss, %error, "pattern aborted");
                }
                world.record(Event::PatternAborted {
                    boss,
                    reason: error.to_string(),
                });
                let base = self.config.patterns.base_cooldown();
                if let Some(state) = self.bosses.get_mut(&boss) {
                    state.cooldown.arm(now, base);
                }
                Err(error)
            }
        }
    }

    fn start_pattern(
        &mut self,
        world: &mut W,
        boss: EntityId,
    ) -> Result<(Decision, Duration), CombatError> {
        let input = PatternInput::sample(&*world, boss)?;
        let health = world.health_of(boss)?;
        let decision = self.decision.decide(health);
        let plan = plan(decision.pattern, &input, &self.config.patterns)?;

        info!(
            %boss,
            pattern = %plan.kind,
            tier = ?decision.tier,
            directives = plan.directives.len(),
            "boss started pattern"
        );
        world.record(Event::PatternStarted {
            boss,
            pattern: plan.kind,
            tier: decision.tier,
            cooldown: plan.cooldown,
        });

        let context = DirectiveContext {
            attacker: boss,
            projectile: self.projectile.clone(),
        };
        let mut offensive = Vec::new();
        for timed in plan.directives {
            match timed.timing {
                Timing::Immediate => {
                    if let Err(error) =
                        executor::execute(world, &mut self.scheduler, &context, &timed.directive)
                    {
                        warn!(%boss, error = %error, "immediate directive failed");
                    }
                }
                Timing::After(delay) => offensive.push(executor::defer(
                    &mut self.scheduler,
                    delay,
                    context.clone(),
                    timed.directive,
                )),
            }
        }
        if let Some(state) = self.bosses.get_mut(&boss) {
            state.offensive.extend(offensive);
        }

        Ok((decision, plan.cooldown))
    }

    /// Stops driving `boss` and cancels its pending offensive sub-events.
    ///
    /// Cleanup actions that release sounds, anchors, and hazards stay
    /// scheduled. Returns the number of cancelled sub-events.
    pub fn retire_boss(&mut self, world: &mut W, boss: EntityId) -> usize {
        let Some(state) = self.bosses.remove(&boss) else {
            return 0;
        };
        let cancelled = state
            .offensive
            .into_iter()
            .filter(|handle| self.scheduler.cancel(*handle))
            .count();

        info!(%boss, cancelled, "boss defeated");
        world.record(Event::BossDefeated { boss, cancelled });
        cancelled
    }

    /// Discards every pending action and removes every transient entity.
    ///
    /// Registered bosses are forgotten. Returns the number of discarded actions.
    pub fn teardown(&mut self, world: &mut W) -> usize {
        let cancelled = self.scheduler.reset();
        self.bosses.clear();
        let removed = world.despawn_transients();

        info!(cancelled, removed, "combat torn down");
        world.record(Event::CombatReset { cancelled });
        cancelled
    }

    /// Launches a teleport ball from `caster` toward `target`.
    ///
    /// The struck entity is teleported to `destination`, or to a random floor
    /// tile when no destination is given.
    pub fn cast_teleport_ball(
        &mut self,
        world: &mut W,
        caster: EntityId,
        target: Vec2,
        destination: Option<Coordinate>,
    ) -> Result<LaunchReceipt, TeleportCastError> {
        let origin = world.position_of(caster)?;
        let receipt = launch_projectile(
            world,
            &mut self.scheduler,
            LaunchRequest {
                origin,
                target,
                anchor: origin,
                attacker: caster,
                spec: ProjectileSpec::teleport_ball(destination),
            },
        )?;
        Ok(receipt)
    }

    fn prune_offensive(&mut self) {
        let scheduler = &self.scheduler;
        for state in self.bosses.values_mut() {
            state.offensive.retain(|handle| scheduler.is_pending(*handle));
        }
    }
}

/// Reasons a teleport ball could not be cast.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum TeleportCastError {
    /// The caster cannot be located.
    #[error(transparent)]
    Caster(#[from] CombatError),
    /// The launch geometry was rejected.
    #[error(transparent)]
    Launch(#[from] LaunchError),
}
