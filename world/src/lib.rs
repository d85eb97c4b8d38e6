#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative reference world for Boss Arena.
//!
//! The world owns the level, the entity table, the launch-sound ledger, and
//! the asset catalog. Drivers mutate it through [`apply`]; combat systems
//! reach it through its [`CombatWorld`] implementation. Events recorded by
//! either path collect in an outbox that [`apply`] and [`flush_events`] drain.

mod entities;
mod hazards;
mod projectiles;

use std::{
    collections::{BTreeMap, BTreeSet},
    time::Duration,
};

use boss_arena_core::{
    ActorRole, CombatError, CombatWorld, Command, ComponentKind, Coordinate, Damage, DamageType,
    DespawnReason, EntityId, Event, HazardSpec, Health, LevelLayout, Projectile, SpriteAnimation,
    Tile, Vec2, DEFAULT_FRAME_RATE, FIREBALL_SOUND, FIREBALL_SPRITE,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

use entities::{EntityKind, EntityRegistry};
use hazards::HazardState;
use projectiles::ProjectileState;

const DEFAULT_WORLD_SEED: u64 = 0x0b05_5a2e_4a11_f1e5;
const DEFAULT_LEVEL_COLUMNS: u32 = 24;
const DEFAULT_LEVEL_ROWS: u32 = 24;

/// Represents the authoritative Boss Arena world state.
#[derive(Debug)]
pub struct World {
    level: LevelLayout,
    entities: EntityRegistry,
    hero: Option<EntityId>,
    frame_rate: u32,
    assets: BTreeSet<String>,
    sounds: BTreeMap<EntityId, Vec<String>>,
    rng: ChaCha8Rng,
    outbox: Vec<Event>,
    elapsed: Duration,
    tick_index: u64,
}

impl World {
    /// Creates a world with the default arena, frame rate, and asset catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::with_seed(DEFAULT_WORLD_SEED)
    }

    /// Creates a world whose random teleport destinations derive from `seed`.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            level: LevelLayout::walled_arena(DEFAULT_LEVEL_COLUMNS, DEFAULT_LEVEL_ROWS),
            entities: EntityRegistry::new(),
            hero: None,
            frame_rate: DEFAULT_FRAME_RATE,
            assets: [FIREBALL_SPRITE, FIREBALL_SOUND]
                .into_iter()
                .map(str::to_owned)
                .collect(),
            sounds: BTreeMap::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            outbox: Vec::new(),
            elapsed: Duration::ZERO,
            tick_index: 0,
        }
    }

    /// Makes the asset at `path` loadable.
    pub fn register_asset(&mut self, path: impl Into<String>) {
        let _ = self.assets.insert(path.into());
    }

    /// Makes the asset at `path` fail to load, returning whether it was registered.
    pub fn remove_asset(&mut self, path: &str) -> bool {
        self.assets.remove(path)
    }

    fn spawn_actor(&mut self, role: ActorRole, position: Vec2, health: Health) -> EntityId {
        if role == ActorRole::Hero {
            if let Some(previous) = self.hero.take() {
                let _ = self.remove_entity(previous);
            }
        }

        let entity = self
            .entities
            .insert(position, Some(health), EntityKind::Actor(role));
        if role == ActorRole::Hero {
            self.hero = Some(entity);
        }
        self.outbox.push(Event::ActorSpawned {
            entity,
            role,
            position,
        });
        entity
    }

    /// Applies `damage` to `entity`, recording the outcome.
    fn damage(&mut self, entity: EntityId, damage: Damage, source: Option<EntityId>) {
        let Some(state) = self.entities.get_mut(entity) else {
            return;
        };
        let Some(health) = state.health else {
            return;
        };

        let remaining = health.damaged(damage.amount);
        state.health = Some(remaining);
        self.outbox.push(Event::EntityDamaged {
            entity,
            damage,
            remaining,
            source,
        });
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl CombatWorld for World {
    fn hero_position(&self) -> Result<Vec2, CombatError> {
        let hero = self.hero.ok_or(CombatError::MissingHero)?;
        self.position_of(hero)
    }

    fn position_of(&self, entity: EntityId) -> Result<Vec2, CombatError> {
        self.entities
            .get(entity)
            .map(|state| state.position)
            .ok_or(CombatError::MissingComponent {
                entity,
                component: ComponentKind::Position,
            })
    }

    fn health_of(&self, entity: EntityId) -> Result<Health, CombatError> {
        self.entities
            .get(entity)
            .and_then(|state| state.health)
            .ok_or(CombatError::MissingComponent {
                entity,
                component: ComponentKind::Health,
            })
    }

    fn tile_at(&self, point: Vec2) -> Option<Tile> {
        let coordinate = Coordinate::containing(point);
        self.level
            .element(coordinate)
            .map(|element| Tile {
                coordinate,
                element,
            })
    }

    fn tiles_within_radius(&self, origin: Coordinate, radius: u32) -> Vec<Tile> {
        let reach = i32::try_from(radius).unwrap_or(i32::MAX);
        let limit = radius as f32;
        let mut tiles = Vec::new();
        for y in origin.y().saturating_sub(reach)..=origin.y().saturating_add(reach) {
            for x in origin.x().saturating_sub(reach)..=origin.x().saturating_add(reach) {
                let coordinate = Coordinate::new(x, y);
                if coordinate.distance(origin) > limit {
                    continue;
                }
                if let Some(element) = self.level.element(coordinate) {
                    tiles.push(Tile {
                        coordinate,
                        element,
                    });
                }
            }
        }
        tiles
    }

    fn frame_rate(&self) -> u32 {
        self.frame_rate
    }

    fn spawn_entity(&mut self, position: Vec2) -> EntityId {
        self.entities.insert(position, None, EntityKind::Anchor)
    }

    fn spawn_visual(
        &mut self,
        position: Vec2,
        visual: &SpriteAnimation,
    ) -> Result<EntityId, CombatError> {
        if !self.assets.contains(&visual.path) {
            return Err(CombatError::ResourceLoad {
                asset: visual.path.clone(),
            });
        }
        Ok(self
            .entities
            .insert(position, None, EntityKind::Visual(visual.clone())))
    }

    fn remove_entity(&mut self, entity: EntityId) -> bool {
        let Some(state) = self.entities.remove(entity) else {
            return false;
        };
        if self.hero == Some(entity) {
            self.hero = None;
        }

        let event = match state.kind {
            EntityKind::Projectile(_) => Event::ProjectileDespawned {
                projectile: entity,
                position: state.position,
                reason: DespawnReason::Removed,
            },
            _ => Event::EntityRemoved { entity },
        };
        self.outbox.push(event);
        true
    }

    fn launch(&mut self, projectile: Projectile) -> EntityId {
        let Projectile {
            origin,
            target,
            shooter,
            ignore,
            spec,
        } = projectile;

        if !self.assets.contains(&spec.sprite.path) {
            warn!(asset = %spec.sprite.path, "projectile sprite missing, flying without visual");
        }
        let sound = spec.sound.clone();
        let kind = spec.kind;
        let entity = self.entities.insert(
            origin,
            None,
            EntityKind::Projectile(ProjectileState::new(origin, target, shooter, ignore, spec)),
        );

        match sound {
            Some(sound) if self.assets.contains(&sound) => {
                self.sounds.entry(entity).or_default().push(sound);
            }
            Some(sound) => warn!(asset = %sound, "launch sound missing"),
            None => {}
        }

        debug!(projectile = %entity, %shooter, ?kind, "projectile launched");
        self.outbox.push(Event::ProjectileLaunched {
            projectile: entity,
            shooter,
            origin,
            target,
            kind,
        });
        entity
    }

    fn attach_hazard(&mut self, entity: EntityId, hazard: HazardSpec) -> bool {
        let Some(state) = self.entities.get_mut(entity) else {
            return false;
        };
        state.hazard = Some(HazardState::new(hazard));
        let coordinate = Coordinate::containing(state.position);
        self.outbox.push(Event::HazardSpawned {
            hazard: entity,
            coordinate,
        });
        true
    }

    fn release_sounds(&mut self, projectile: EntityId) -> bool {
        if self.sounds.remove(&projectile).is_none() {
            return false;
        }
        self.outbox.push(Event::LaunchSoundsReleased { projectile });
        true
    }

    fn despawn_transients(&mut self) -> usize {
        let transients = self.entities.transient_ids();
        for entity in &transients {
            if let Some(state) = self.entities.remove(*entity) {
                let event = match state.kind {
                    EntityKind::Projectile(_) => Event::ProjectileDespawned {
                        projectile: *entity,
                        position: state.position,
                        reason: DespawnReason::Teardown,
                    },
                    _ => Event::EntityRemoved { entity: *entity },
                };
                self.outbox.push(event);
            }
        }

        let held: Vec<EntityId> = self.sounds.keys().copied().collect();
        for projectile in held {
            let _ = self.release_sounds(projectile);
        }

        let removed = transients.len();
        debug!(removed, "level torn down");
        self.outbox.push(Event::LevelTornDown { removed });
        removed
    }

    fn record(&mut self, event: Event) {
        self.outbox.push(event);
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Events recorded since the previous call are emitted ahead of the events the
/// command produces.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    flush_events(world, out_events);

    match command {
        Command::ConfigureLevel { layout } => {
            let columns = layout.columns();
            let rows = layout.rows();
            world.level = layout;
            world.outbox.push(Event::LevelConfigured { columns, rows });
        }
        Command::SpawnHero { position, health } => {
            let _ = world.spawn_actor(ActorRole::Hero, position, health);
        }
        Command::SpawnBoss { position, health } => {
            let _ = world.spawn_actor(ActorRole::Boss, position, health);
        }
        Command::MoveEntity { entity, position } => {
            if let Some(state) = world.entities.get_mut(entity) {
                state.position = position;
                world.outbox.push(Event::EntityMoved { entity, position });
            }
        }
        Command::DamageEntity { entity, amount } => {
            world.damage(
                entity,
                Damage::new(amount, DamageType::Physical),
                None,
            );
        }
        Command::SetFrameRate { frames_per_second } => {
            world.frame_rate = frames_per_second.max(1);
        }
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            world.elapsed = world.elapsed.saturating_add(dt);
            world.outbox.push(Event::TimeAdvanced { dt });
            world.advance_projectiles(dt);
            world.burn_hazards();
        }
        Command::TeardownLevel => {
            let _ = world.despawn_transients();
        }
    }

    flush_events(world, out_events);
}

/// Drains every event recorded since the last drain into `out_events`.
pub fn flush_events(world: &mut World, out_events: &mut Vec<Event>) {
    out_events.append(&mut world.outbox);
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use super::{EntityKind, World};
    use boss_arena_core::{ActorRole, EntityId, Health, LevelLayout, SpriteAnimation, Vec2};

    /// Provides read-only access to the level geometry.
    #[must_use]
    pub fn level(world: &World) -> &LevelLayout {
        &world.level
    }

    /// Identifier of the hero, if one is present.
    #[must_use]
    pub fn hero(world: &World) -> Option<EntityId> {
        world.hero
    }

    /// Simulated time accumulated by tick commands.
    #[must_use]
    pub fn elapsed(world: &World) -> Duration {
        world.elapsed
    }

    /// Number of tick commands applied so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Reports whether `entity` still exists.
    #[must_use]
    pub fn contains(world: &World, entity: EntityId) -> bool {
        world.entities.contains(entity)
    }

    /// Number of projectiles whose launch sounds have not been released.
    #[must_use]
    pub fn held_sounds(world: &World) -> usize {
        world.sounds.len()
    }

    /// Number of entities removed by a level teardown.
    #[must_use]
    pub fn transient_count(world: &World) -> usize {
        world.entities.iter().filter(|state| state.is_transient()).count()
    }

    /// Captures a read-only view of every entity in identifier order.
    #[must_use]
    pub fn entity_view(world: &World) -> EntityView {
        let snapshots = world
            .entities
            .iter()
            .map(|state| EntitySnapshot {
                id: state.id,
                role: match &state.kind {
                    EntityKind::Actor(role) => EntityRole::Actor(*role),
                    EntityKind::Anchor => EntityRole::Anchor,
                    EntityKind::Visual(_) => EntityRole::Visual,
                    EntityKind::Projectile(projectile) => EntityRole::Projectile {
                        shooter: projectile.shooter,
                    },
                },
                position: state.position,
                health: state.health,
                hazard: state.hazard.is_some(),
                sprite: match &state.kind {
                    EntityKind::Visual(sprite) => Some(sprite.clone()),
                    _ => None,
                },
            })
            .collect();
        EntityView { snapshots }
    }

    /// Read-only snapshot describing every entity in the world.
    #[derive(Clone, Debug)]
    pub struct EntityView {
        snapshots: Vec<EntitySnapshot>,
    }

    impl EntityView {
        /// Iterator over the captured snapshots in identifier order.
        pub fn iter(&self) -> impl Iterator<Item = &EntitySnapshot> {
            self.snapshots.iter()
        }

        /// Number of projectiles in flight.
        #[must_use]
        pub fn projectile_count(&self) -> usize {
            self.iter()
                .filter(|snapshot| matches!(snapshot.role, EntityRole::Projectile { .. }))
                .count()
        }

        /// Number of entities carrying a hazard.
        #[must_use]
        pub fn hazard_count(&self) -> usize {
            self.iter().filter(|snapshot| snapshot.hazard).count()
        }

        /// Consumes the view, yielding the underlying snapshots.
        pub fn into_vec(self) -> Vec<EntitySnapshot> {
            self.snapshots
        }
    }

    /// Role of an entity as seen by queries.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum EntityRole {
        /// Hero or boss.
        Actor(ActorRole),
        /// Bare entity used as a projectile origin.
        Anchor,
        /// Stationary entity drawn with a sprite.
        Visual,
        /// Projectile in flight.
        Projectile {
            /// Entity acting as the projectile's origin reference.
            shooter: EntityId,
        },
    }

    /// Immutable representation of a single entity used for queries.
    #[derive(Clone, Debug, PartialEq)]
    pub struct EntitySnapshot {
        /// Unique identifier assigned to the entity.
        pub id: EntityId,
        /// Role the entity plays.
        pub role: EntityRole,
        /// Current world position.
        pub position: Vec2,
        /// Health points, present for actors only.
        pub health: Option<Health>,
        /// Whether the entity damages actors standing on its tile.
        pub hazard: bool,
        /// Sprite drawn for visual entities.
        pub sprite: Option<SpriteAnimation>,
    }
}
