//! Straight-line projectile integration with wall and entity collisions.

use std::time::Duration;

use boss_arena_core::{
    Coordinate, DespawnReason, EntityHitPolicy, EntityId, Event, LevelElement, ProjectileSpec,
    Vec2, WallHitPolicy,
};
use rand::Rng;
use tracing::debug;

use crate::{entities::EntityKind, World};

/// Longest distance a projectile moves before collisions are checked again.
pub(crate) const SUB_STEP: f32 = 0.25;

/// Flight state of a projectile stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct ProjectileState {
    /// Entity acting as the moving origin reference.
    pub(crate) shooter: EntityId,
    /// Entities the projectile never collides with.
    pub(crate) ignore: Vec<EntityId>,
    /// Flight and impact behaviour.
    pub(crate) spec: ProjectileSpec,
    /// Unit flight direction, zero when origin and target coincide.
    pub(crate) direction: Vec2,
    /// Distance covered since launch.
    pub(crate) travelled: f32,
}

impl ProjectileState {
    pub(crate) fn new(
        origin: Vec2,
        target: Vec2,
        shooter: EntityId,
        ignore: Vec<EntityId>,
        spec: ProjectileSpec,
    ) -> Self {
        Self {
            shooter,
            ignore,
            spec,
            direction: (target - origin).normalize_or_zero(),
            travelled: 0.0,
        }
    }

    fn hits(&self, projectile: Vec2, entity: Vec2) -> bool {
        let half = self.spec.hitbox * 0.5;
        let delta = (entity - projectile).abs();
        delta.x <= half.x && delta.y <= half.y
    }
}

enum Impact {
    Continue,
    Despawn,
}

impl World {
    /// Moves every projectile in flight by the distance covered in `dt`.
    pub(crate) fn advance_projectiles(&mut self, dt: Duration) {
        let seconds = dt.as_secs_f32();
        for projectile in self.entities.projectile_ids() {
            self.advance_projectile(projectile, seconds);
        }
    }

    fn advance_projectile(&mut self, projectile: EntityId, seconds: f32) {
        let Some(entity) = self.entities.get(projectile) else {
            return;
        };
        let EntityKind::Projectile(state) = &entity.kind else {
            return;
        };
        let mut state = state.clone();
        let mut position = entity.position;
        let stalled = !state.spec.speed.is_finite() || state.spec.speed <= 0.0;
        let mut budget = if stalled {
            0.0
        } else {
            state.spec.speed * seconds
        };

        let despawn = loop {
            let remaining_range = state.spec.range - state.travelled;
            if stalled || remaining_range.is_nan() || remaining_range <= 0.0 {
                break Some(DespawnReason::RangeExhausted);
            }
            if budget <= 0.0 {
                break None;
            }

            let step = budget.min(SUB_STEP).min(remaining_range);
            position += state.direction * step;
            state.travelled += step;
            budget -= step;

            if state.spec.on_wall_hit == WallHitPolicy::Despawn && !self.is_passable(position) {
                break Some(DespawnReason::HitWall);
            }

            if let Some(victim) = self.victim_at(position, &state) {
                match self.strike(projectile, victim, &mut state) {
                    Impact::Continue => {}
                    Impact::Despawn => break Some(DespawnReason::HitEntity),
                }
            }
        };

        match despawn {
            Some(reason) => {
                let _ = self.entities.remove(projectile);
                debug!(%projectile, ?reason, "projectile despawned");
                self.outbox.push(Event::ProjectileDespawned {
                    projectile,
                    position,
                    reason,
                });
            }
            None => {
                if let Some(entity) = self.entities.get_mut(projectile) {
                    entity.position = position;
                    entity.kind = EntityKind::Projectile(state);
                }
            }
        }
    }

    fn is_passable(&self, point: Vec2) -> bool {
        self.level
            .element(Coordinate::containing(point))
            .is_some_and(LevelElement::is_accessible)
    }

    fn victim_at(&self, position: Vec2, state: &ProjectileState) -> Option<EntityId> {
        self.entities
            .actors()
            .filter(|actor| !state.ignore.contains(&actor.id))
            .filter(|actor| actor.health.is_some_and(|health| !health.is_depleted()))
            .find(|actor| state.hits(position, actor.position))
            .map(|actor| actor.id)
    }

    fn strike(
        &mut self,
        projectile: EntityId,
        victim: EntityId,
        state: &mut ProjectileState,
    ) -> Impact {
        self.damage(victim, state.spec.damage, Some(projectile));

        match state.spec.on_entity_hit {
            EntityHitPolicy::Dispose => Impact::Despawn,
            EntityHitPolicy::Pierce => {
                state.ignore.push(victim);
                Impact::Continue
            }
            EntityHitPolicy::Teleport { destination } => {
                self.teleport(victim, destination);
                Impact::Despawn
            }
        }
    }

    fn teleport(&mut self, victim: EntityId, destination: Option<Coordinate>) {
        let destination = match destination {
            Some(coordinate) => Some(coordinate),
            None => self.random_floor_tile(),
        };
        let Some(destination) = destination else {
            return;
        };
        let Some(entity) = self.entities.get_mut(victim) else {
            return;
        };

        let from = entity.position;
        let to = destination.to_centered_point();
        entity.position = to;
        self.outbox.push(Event::EntityTeleported {
            entity: victim,
            from,
            to,
        });
    }

    fn random_floor_tile(&mut self) -> Option<Coordinate> {
        let floors: Vec<Coordinate> = self
            .level
            .tiles()
            .filter(|tile| tile.element.is_accessible())
            .map(|tile| tile.coordinate)
            .collect();
        if floors.is_empty() {
            return None;
        }
        let index = self.rng.gen_range(0..floors.len());
        floors.get(index).copied()
    }
}
