#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Projectile launch primitive shared by every attack pattern.
//!
//! A launch resolves the shooter, hands the projectile to the world, and
//! always schedules a cleanup that releases the launch sounds and removes the
//! temporary anchor. The cleanup fires regardless of what happens to the
//! projectile itself.

use std::time::Duration;

use boss_arena_core::{CombatWorld, EntityId, Projectile, ProjectileSpec, Vec2};
use boss_arena_system_scheduler::{ActionHandle, Scheduler};
use thiserror::Error;
use tracing::debug;

/// Delay between a launch and the release of its sounds and anchor.
pub const LAUNCH_CLEANUP_DELAY: Duration = Duration::from_millis(1_000);

/// Geometry and behaviour of a projectile to launch.
#[derive(Clone, Debug, PartialEq)]
pub struct LaunchRequest {
    /// Starting point of the flight.
    pub origin: Vec2,
    /// Point the projectile flies toward.
    pub target: Vec2,
    /// Attacker position the pattern captured; an origin equal to it launches
    /// from the attacker itself.
    pub anchor: Vec2,
    /// Entity executing the pattern, never struck by its own projectile.
    pub attacker: EntityId,
    /// Flight and impact behaviour.
    pub spec: ProjectileSpec,
}

/// Entities and cleanup produced by a launch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LaunchReceipt {
    /// Projectile that was launched.
    pub projectile: EntityId,
    /// Entity acting as the projectile's origin reference.
    pub shooter: EntityId,
    /// Temporary anchor spawned for an off-attacker origin.
    pub anchor: Option<EntityId>,
    /// Pending cleanup releasing sounds and the anchor.
    pub cleanup: ActionHandle,
}

/// Reasons a launch is rejected before anything is spawned.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum LaunchError {
    /// Origin, target, or anchor contain a NaN or infinite component.
    #[error("launch geometry is not finite (origin {origin}, target {target}, anchor {anchor})")]
    NonFiniteGeometry {
        /// Requested origin.
        origin: Vec2,
        /// Requested target.
        target: Vec2,
        /// Requested anchor.
        anchor: Vec2,
    },
}

/// Launches `request` into `world` and schedules its cleanup.
pub fn launch_projectile<W>(
    world: &mut W,
    scheduler: &mut Scheduler<W>,
    request: LaunchRequest,
) -> Result<LaunchReceipt, LaunchError>
where
    W: CombatWorld + 'static,
{
    let LaunchRequest {
        origin,
        target,
        anchor,
        attacker,
        spec,
    } = request;

    if !(origin.is_finite() && target.is_finite() && anchor.is_finite()) {
        return Err(LaunchError::NonFiniteGeometry {
            origin,
            target,
            anchor,
        });
    }

    let temporary = (origin != anchor).then(|| world.spawn_entity(origin));
    let shooter = temporary.unwrap_or(attacker);

    let projectile = world.launch(Projectile {
        origin,
        target,
        shooter,
        ignore: vec![attacker],
        spec,
    });

    let cleanup = scheduler.schedule(LAUNCH_CLEANUP_DELAY, move |world: &mut W, _| {
        let _ = world.release_sounds(projectile);
        if let Some(anchor) = temporary {
            let _ = world.remove_entity(anchor);
        }
        Ok(())
    });

    debug!(
        %projectile,
        %shooter,
        %attacker,
        anchored = temporary.is_some(),
        "projectile launched"
    );

    Ok(LaunchReceipt {
        projectile,
        shooter,
        anchor: temporary,
        cleanup,
    })
}
