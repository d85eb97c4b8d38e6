//! Stationary hazards that damage actors standing on their tile.

use std::{collections::BTreeMap, time::Duration};

use boss_arena_core::{Coordinate, EntityId, HazardSpec};

use crate::World;

/// Damaging behaviour attached to an entity.
#[derive(Clone, Debug)]
pub(crate) struct HazardState {
    /// Damage and rearm window of the hazard.
    pub(crate) spec: HazardSpec,
    /// World time each actor was last damaged by the hazard.
    last_hits: BTreeMap<EntityId, Duration>,
}

impl HazardState {
    pub(crate) fn new(spec: HazardSpec) -> Self {
        Self {
            spec,
            last_hits: BTreeMap::new(),
        }
    }

    /// Reports whether `actor` may be damaged again at `now`.
    fn is_armed_for(&self, actor: EntityId, now: Duration, window: Duration) -> bool {
        self.last_hits
            .get(&actor)
            .map_or(true, |last| now.saturating_sub(*last) >= window)
    }
}

/// Time that must pass between two hits of the same hazard on the same actor.
pub(crate) fn rearm_window(rearm_frames: u32, frame_rate: u32) -> Duration {
    Duration::from_secs_f64(f64::from(rearm_frames) / f64::from(frame_rate.max(1)))
}

impl World {
    /// Damages every actor standing on a hazard tile whose rearm window elapsed.
    pub(crate) fn burn_hazards(&mut self) {
        let now = self.elapsed;
        for hazard in self.entities.hazard_ids() {
            let Some(entity) = self.entities.get(hazard) else {
                continue;
            };
            let Some(state) = entity.hazard.as_ref() else {
                continue;
            };
            let tile = Coordinate::containing(entity.position);
            let window = rearm_window(state.spec.rearm_frames, self.frame_rate);
            let damage = state.spec.damage;

            let victims: Vec<EntityId> = self
                .entities
                .actors()
                .filter(|actor| actor.health.is_some_and(|health| !health.is_depleted()))
                .filter(|actor| Coordinate::containing(actor.position) == tile)
                .filter(|actor| state.is_armed_for(actor.id, now, window))
                .map(|actor| actor.id)
                .collect();

            for victim in victims {
                self.damage(victim, damage, Some(hazard));
                if let Some(state) = self
                    .entities
                    .get_mut(hazard)
                    .and_then(|entity| entity.hazard.as_mut())
                {
                    let _ = state.last_hits.insert(victim, now);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apply;
    use boss_arena_core::{
        CombatWorld, Command, Damage, DamageType, Event, Health, LevelLayout, Vec2,
    };

    fn hazard_spec() -> HazardSpec {
        HazardSpec {
            damage: Damage::new(1, DamageType::Fire),
            rearm_frames: 15,
        }
    }

    fn tick(world: &mut World, millis: u64) -> Vec<Event> {
        let mut events = Vec::new();
        apply(
            world,
            Command::Tick {
                dt: Duration::from_millis(millis),
            },
            &mut events,
        );
        events
    }

    #[test]
    fn rearm_window_scales_with_frame_rate() {
        assert_eq!(rearm_window(15, 30), Duration::from_millis(500));
        assert_eq!(rearm_window(30, 60), Duration::from_millis(500));
        assert_eq!(rearm_window(3, 0), Duration::from_secs(3));
    }

    #[test]
    fn hazard_damages_actor_once_per_window() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ConfigureLevel {
                layout: LevelLayout::walled_arena(8, 8),
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::SpawnHero {
                position: Vec2::new(3.2, 3.7),
                health: Health::full(10),
            },
            &mut events,
        );
        let hero = world.hero.expect("hero spawned");
        let hazard = world.spawn_entity(Vec2::new(3.5, 3.5));
        assert!(world.attach_hazard(hazard, hazard_spec()));

        let mut hits = 0;
        for _ in 0..20 {
            hits += tick(&mut world, 100)
                .iter()
                .filter(|event| matches!(event, Event::EntityDamaged { source, .. } if *source == Some(hazard)))
                .count();
        }

        assert_eq!(hits, 4);
        assert_eq!(world.health_of(hero), Ok(Health::new(6, 10)));
    }

    #[test]
    fn hazard_ignores_actors_on_other_tiles() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SpawnHero {
                position: Vec2::new(5.5, 5.5),
                health: Health::full(10),
            },
            &mut events,
        );
        let hazard = world.spawn_entity(Vec2::new(3.5, 3.5));
        assert!(world.attach_hazard(hazard, hazard_spec()));
        let _ = tick(&mut world, 1_000);

        assert_eq!(world.hero_position(), Ok(Vec2::new(5.5, 5.5)));
        assert_eq!(
            world.hero.and_then(|hero| world.health_of(hero).ok()),
            Some(Health::full(10))
        );
    }
}
