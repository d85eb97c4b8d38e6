//! Authoritative entity storage for actors and transient combat entities.

use std::collections::BTreeMap;

use boss_arena_core::{ActorRole, EntityId, Health, SpriteAnimation, Vec2};

use crate::{hazards::HazardState, projectiles::ProjectileState};

/// Role an entity plays inside the world.
#[derive(Clone, Debug)]
pub(crate) enum EntityKind {
    /// Hero or boss with health.
    Actor(ActorRole),
    /// Bare collidable entity, used as a moving projectile origin.
    Anchor,
    /// Stationary entity drawn with a sprite.
    Visual(SpriteAnimation),
    /// Projectile in flight.
    Projectile(ProjectileState),
}

/// Snapshot of an entity stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct EntityState {
    /// Identifier allocated by the world for the entity.
    pub(crate) id: EntityId,
    /// Current world position.
    pub(crate) position: Vec2,
    /// Health points, present for actors only.
    pub(crate) health: Option<Health>,
    /// Role of the entity.
    pub(crate) kind: EntityKind,
    /// Damaging behaviour attached to the entity, if any.
    pub(crate) hazard: Option<HazardState>,
}

impl EntityState {
    /// Reports whether the entity is removed on level teardown.
    pub(crate) fn is_transient(&self) -> bool {
        !matches!(self.kind, EntityKind::Actor(_))
    }
}

/// Registry that stores entities and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct EntityRegistry {
    entries: BTreeMap<EntityId, EntityState>,
    next_entity_id: EntityId,
}

impl EntityRegistry {
    /// Creates an empty registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_entity_id: EntityId::new(1),
        }
    }

    /// Stores a new entity and returns its identifier.
    pub(crate) fn insert(
        &mut self,
        position: Vec2,
        health: Option<Health>,
        kind: EntityKind,
    ) -> EntityId {
        let id = self.next_entity_id;
        self.next_entity_id = EntityId::new(id.get().saturating_add(1));
        let _ = self.entries.insert(
            id,
            EntityState {
                id,
                position,
                health,
                kind,
                hazard: None,
            },
        );
        id
    }

    pub(crate) fn get(&self, id: EntityId) -> Option<&EntityState> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: EntityId) -> Option<&mut EntityState> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn remove(&mut self, id: EntityId) -> Option<EntityState> {
        self.entries.remove(&id)
    }

    pub(crate) fn contains(&self, id: EntityId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Iterates over entities in identifier order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &EntityState> {
        self.entries.values()
    }

    /// Identifiers of every projectile in flight, in identifier order.
    pub(crate) fn projectile_ids(&self) -> Vec<EntityId> {
        self.entries
            .values()
            .filter(|entity| matches!(entity.kind, EntityKind::Projectile(_)))
            .map(|entity| entity.id)
            .collect()
    }

    /// Identifiers of every entity carrying a hazard, in identifier order.
    pub(crate) fn hazard_ids(&self) -> Vec<EntityId> {
        self.entries
            .values()
            .filter(|entity| entity.hazard.is_some())
            .map(|entity| entity.id)
            .collect()
    }

    /// Identifiers of every transient entity, in identifier order.
    pub(crate) fn transient_ids(&self) -> Vec<EntityId> {
        self.entries
            .values()
            .filter(|entity| entity.is_transient())
            .map(|entity| entity.id)
            .collect()
    }

    /// Actors with health, in identifier order.
    pub(crate) fn actors(&self) -> impl Iterator<Item = &EntityState> {
        self.entries
            .values()
            .filter(|entity| matches!(entity.kind, EntityKind::Actor(_)) && entity.health.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_allocates_increasing_identifiers_from_one() {
        let mut registry = EntityRegistry::new();
        let first = registry.insert(Vec2::ZERO, None, EntityKind::Anchor);
        let second = registry.insert(
            Vec2::ONE,
            Some(Health::full(10)),
            EntityKind::Actor(ActorRole::Boss),
        );

        assert_eq!(first, EntityId::new(1));
        assert_eq!(second, EntityId::new(2));
        let _ = registry.remove(first);
        let third = registry.insert(Vec2::ZERO, None, EntityKind::Anchor);
        assert_eq!(third, EntityId::new(3));
    }

    #[test]
    fn actors_are_not_transient() {
        let mut registry = EntityRegistry::new();
        let boss = registry.insert(
            Vec2::ZERO,
            Some(Health::full(10)),
            EntityKind::Actor(ActorRole::Boss),
        );
        let anchor = registry.insert(Vec2::ZERO, None, EntityKind::Anchor);

        assert_eq!(registry.transient_ids(), [anchor]);
        assert_eq!(
            registry.actors().map(|entity| entity.id).collect::<Vec<_>>(),
            [boss]
        );
    }
}
