//! Turns planned directives into launches and hazards.

use std::time::Duration;

use anyhow::Context as _;
use boss_arena_core::{CombatWorld, EntityId, HazardSpec, ProjectileSpec, SpriteAnimation};
use boss_arena_system_launch::{launch_projectile, LaunchRequest};
use boss_arena_system_patterns::{Directive, Shot, ShockwaveRing};
use boss_arena_system_scheduler::{ActionHandle, Scheduler};
use tracing::{debug, warn};

/// Values a directive needs besides its own geometry, captured by value.
#[derive(Clone, Debug)]
pub(crate) struct DirectiveContext {
    /// Boss executing the pattern.
    pub(crate) attacker: EntityId,
    /// Projectile launched by shots.
    pub(crate) projectile: ProjectileSpec,
}

/// Performs `directive` now.
pub(crate) fn execute<W>(
    world: &mut W,
    scheduler: &mut Scheduler<W>,
    context: &DirectiveContext,
    directive: &Directive,
) -> anyhow::Result<()>
where
    W: CombatWorld + 'static,
{
    match directive {
        Directive::Shot(shot) => fire(world, scheduler, context, *shot),
        Directive::PredictiveShot(predictive) => {
            let hero = world
                .hero_position()
                .context("re-sampling the hero for a predicted shot")?;
            fire(world, scheduler, context, predictive.resolve(hero))
        }
        Directive::ShockwaveRing(ring) => {
            let _ = spawn_ring(world, scheduler, ring);
            Ok(())
        }
    }
}

/// Defers `directive` by `delay`, returning the handle of the pending action.
pub(crate) fn defer<W>(
    scheduler: &mut Scheduler<W>,
    delay: Duration,
    context: DirectiveContext,
    directive: Directive,
) -> ActionHandle
where
    W: CombatWorld + 'static,
{
    scheduler.schedule(delay, move |world: &mut W, scheduler: &mut Scheduler<W>| {
        execute(world, scheduler, &context, &directive)
    })
}

fn fire<W>(
    world: &mut W,
    scheduler: &mut Scheduler<W>,
    context: &DirectiveContext,
    shot: Shot,
) -> anyhow::Result<()>
where
    W: CombatWorld + 'static,
{
    let request = LaunchRequest {
        origin: shot.origin,
        target: shot.target,
        anchor: shot.anchor,
        attacker: context.attacker,
        spec: context.projectile.clone(),
    };
    let _ = launch_projectile(world, scheduler, request)?;
    Ok(())
}

/// Spawns the hazards of one shockwave ring and schedules their removal.
///
/// A missing fire sprite does not stop the ring; its hazards are spawned as
/// bare entities instead. Returns the hazards that were spawned.
pub(crate) fn spawn_ring<W>(
    world: &mut W,
    scheduler: &mut Scheduler<W>,
    ring: &ShockwaveRing,
) -> Vec<EntityId>
where
    W: CombatWorld + 'static,
{
    let visual = SpriteAnimation::fire();
    let hazard = HazardSpec {
        damage: ring.damage,
        rearm_frames: world.frame_rate() / 2,
    };
    let mut reported_missing_visual = false;
    let mut spawned = Vec::new();

    for coordinate in ring.tiles(&*world) {
        let position = coordinate.to_centered_point();
        let entity = match world.spawn_visual(position, &visual) {
            Ok(entity) => entity,
            Err(error) => {
                if !reported_missing_visual {
                    warn!(%error, ring = ring.ring, "spawning shockwave hazards without visual");
                    reported_missing_visual = true;
                }
                world.spawn_entity(position)
            }
        };
        let _ = world.attach_hazard(entity, hazard);
        let _ = scheduler.schedule(ring.hazard_lifetime, move |world: &mut W, _| {
            let _ = world.remove_entity(entity);
            Ok(())
        });
        spawned.push(entity);
    }

    debug!(ring = ring.ring, hazards = spawned.len(), "shockwave ring spawned");
    spawned
}
