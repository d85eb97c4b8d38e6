#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Boss Arena engine.
//!
//! This crate defines the message surface that connects the driver, the
//! authoritative world, and the combat systems. Drivers submit [`Command`]
//! values describing world mutations, the world executes them through its
//! `apply` entry point, and every observable outcome is broadcast as an
//! [`Event`]. Combat systems never touch world storage directly: they reach
//! the world exclusively through the narrow [`CombatWorld`] service trait.

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use glam::Vec2;

/// Frame rate assumed by the world until a driver configures another one.
pub const DEFAULT_FRAME_RATE: u32 = 30;

/// Commands that express all permissible driver-level world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Replaces the level geometry with the provided layout.
    ConfigureLevel {
        /// Tile layout the world should adopt.
        layout: LevelLayout,
    },
    /// Places the hero into the level.
    SpawnHero {
        /// World position the hero starts at.
        position: Vec2,
        /// Starting health of the hero.
        health: Health,
    },
    /// Places a boss into the level.
    SpawnBoss {
        /// World position the boss starts at.
        position: Vec2,
        /// Starting health of the boss.
        health: Health,
    },
    /// Teleports an entity to a new position without collision checks.
    MoveEntity {
        /// Entity that should move.
        entity: EntityId,
        /// Destination position in world units.
        position: Vec2,
    },
    /// Deals direct damage to an entity outside of projectile collisions.
    DamageEntity {
        /// Entity receiving the damage.
        entity: EntityId,
        /// Amount of health removed.
        amount: i32,
    },
    /// Changes the frame rate used to size hazard rearm windows.
    SetFrameRate {
        /// Frames simulated per second.
        frames_per_second: u32,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Removes every transient entity ahead of a level transition.
    TeardownLevel,
}

/// Events broadcast by the world and the combat systems.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Confirms that the level geometry was replaced.
    LevelConfigured {
        /// Number of tile columns in the new level.
        columns: u32,
        /// Number of tile rows in the new level.
        rows: u32,
    },
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a hero or boss entered the level.
    ActorSpawned {
        /// Identifier allocated to the actor.
        entity: EntityId,
        /// Role the actor plays in the fight.
        role: ActorRole,
        /// Position the actor spawned at.
        position: Vec2,
    },
    /// Confirms that an entity was moved by a driver command.
    EntityMoved {
        /// Entity that moved.
        entity: EntityId,
        /// Position the entity occupies after the move.
        position: Vec2,
    },
    /// Reports that an entity lost health.
    EntityDamaged {
        /// Entity that took damage.
        entity: EntityId,
        /// Damage that was applied.
        damage: Damage,
        /// Health remaining after the damage was applied.
        remaining: Health,
        /// Projectile or hazard that dealt the damage, if any.
        source: Option<EntityId>,
    },
    /// Reports that a projectile teleported the entity it struck.
    EntityTeleported {
        /// Entity that was teleported.
        entity: EntityId,
        /// Position before the teleport.
        from: Vec2,
        /// Position after the teleport.
        to: Vec2,
    },
    /// Confirms that an entity was removed from the world.
    EntityRemoved {
        /// Entity that was removed.
        entity: EntityId,
    },
    /// Announces that a boss committed to an attack pattern.
    PatternStarted {
        /// Boss executing the pattern.
        boss: EntityId,
        /// Pattern chosen by the decision policy.
        pattern: PatternKind,
        /// Health tier that was active when the pattern was chosen.
        tier: HealthTier,
        /// Cooldown that must elapse before the boss decides again.
        cooldown: Duration,
    },
    /// Reports that a pattern invocation failed before launching anything.
    PatternAborted {
        /// Boss whose turn was skipped.
        boss: EntityId,
        /// Human readable description of the failure.
        reason: String,
    },
    /// Confirms that a projectile left its shooter.
    ProjectileLaunched {
        /// Identifier allocated to the projectile.
        projectile: EntityId,
        /// Entity acting as the moving origin reference.
        shooter: EntityId,
        /// Starting point of the flight.
        origin: Vec2,
        /// Point the projectile flies toward.
        target: Vec2,
        /// Kind of projectile that was launched.
        kind: ProjectileKind,
    },
    /// Reports that a projectile left the world.
    ProjectileDespawned {
        /// Identifier of the projectile.
        projectile: EntityId,
        /// Last position of the projectile.
        position: Vec2,
        /// Why the projectile despawned.
        reason: DespawnReason,
    },
    /// Confirms that the launch sounds of a projectile were released.
    LaunchSoundsReleased {
        /// Projectile whose sounds were released.
        projectile: EntityId,
    },
    /// Confirms that a stationary hazard was placed on a tile.
    HazardSpawned {
        /// Identifier allocated to the hazard.
        hazard: EntityId,
        /// Tile the hazard covers.
        coordinate: Coordinate,
    },
    /// Reports that a boss died and its pending sub-events were cancelled.
    BossDefeated {
        /// Boss that was defeated.
        boss: EntityId,
        /// Number of pending pattern sub-events that were cancelled.
        cancelled: usize,
    },
    /// Confirms that all transient entities were removed from the level.
    LevelTornDown {
        /// Number of transient entities that were removed.
        removed: usize,
    },
    /// Confirms that the combat scheduler discarded its pending actions.
    CombatReset {
        /// Number of pending actions that were discarded unfired.
        cancelled: usize,
    },
}

/// Role an actor plays in the boss fight.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActorRole {
    /// The player controlled hero.
    Hero,
    /// A boss driven by the combat systems.
    Boss,
}

/// Unique identifier assigned to an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates a new entity identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Absolute point on the monotonic simulation clock with millisecond resolution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The instant the simulation clock starts at.
    pub const ZERO: Self = Self(0);

    /// Creates a timestamp from whole milliseconds since the clock started.
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Milliseconds elapsed since the clock started.
    #[must_use]
    pub const fn as_millis(&self) -> u64 {
        self.0
    }

    /// Returns the timestamp `delay` later, saturating at the end of time.
    ///
    /// Sub-millisecond remainders of `delay` are truncated.
    #[must_use]
    pub fn saturating_add(self, delay: Duration) -> Self {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        Self(self.0.saturating_add(millis))
    }

    /// Duration elapsed since `earlier`, or zero when `earlier` lies in the future.
    #[must_use]
    pub const fn saturating_duration_since(self, earlier: Timestamp) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// Integer tile coordinate inside the level grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coordinate {
    x: i32,
    y: i32,
}

impl Coordinate {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Column of the tile.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Row of the tile.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Tile that contains the provided world point. Tiles are one world unit wide.
    #[must_use]
    pub fn containing(point: Vec2) -> Self {
        Self::new(point.x.floor() as i32, point.y.floor() as i32)
    }

    /// World position of the tile's centre.
    #[must_use]
    pub fn to_centered_point(self) -> Vec2 {
        Vec2::new(self.x as f32 + 0.5, self.y as f32 + 0.5)
    }

    /// Euclidean distance between the two tile coordinates.
    #[must_use]
    pub fn distance(self, other: Coordinate) -> f32 {
        let dx = (self.x - other.x) as f32;
        let dy = (self.y - other.y) as f32;
        dx.hypot(dy)
    }
}

/// Terrain occupying a single tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelElement {
    /// Walkable ground.
    Floor,
    /// Impassable terrain that stops projectiles and shockwaves.
    Wall,
}

impl LevelElement {
    /// Reports whether entities and projectiles may occupy the tile.
    #[must_use]
    pub const fn is_accessible(self) -> bool {
        matches!(self, Self::Floor)
    }
}

/// Single tile resolved from the level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Tile {
    /// Grid position of the tile.
    pub coordinate: Coordinate,
    /// Terrain occupying the tile.
    pub element: LevelElement,
}

/// Dense row-major tile layout used to configure a level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelLayout {
    columns: u32,
    rows: u32,
    elements: Vec<LevelElement>,
}

impl LevelLayout {
    /// Creates a rectangular arena of floor tiles enclosed by a one tile wall.
    #[must_use]
    pub fn walled_arena(columns: u32, rows: u32) -> Self {
        let mut elements = Vec::with_capacity((columns as usize) * (rows as usize));
        for row in 0..rows {
            for column in 0..columns {
                let border = row == 0 || column == 0 || row + 1 == rows || column + 1 == columns;
                elements.push(if border {
                    LevelElement::Wall
                } else {
                    LevelElement::Floor
                });
            }
        }
        Self {
            columns,
            rows,
            elements,
        }
    }

    /// Number of tile columns.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of tile rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Terrain at the provided coordinate, or `None` outside the layout.
    #[must_use]
    pub fn element(&self, coordinate: Coordinate) -> Option<LevelElement> {
        let x = u32::try_from(coordinate.x()).ok()?;
        let y = u32::try_from(coordinate.y()).ok()?;
        if x >= self.columns || y >= self.rows {
            return None;
        }
        let index = (y as usize) * (self.columns as usize) + x as usize;
        self.elements.get(index).copied()
    }

    /// Iterates over every tile in row-major order.
    pub fn tiles(&self) -> impl Iterator<Item = Tile> + '_ {
        let columns = self.columns.max(1) as usize;
        self.elements.iter().enumerate().map(move |(index, element)| Tile {
            coordinate: Coordinate::new((index % columns) as i32, (index / columns) as i32),
            element: *element,
        })
    }
}

/// Current and maximal health points of a combatant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Health {
    current: i32,
    maximum: i32,
}

impl Health {
    /// Creates a health pair. `current` is clamped to `0..=maximum`.
    #[must_use]
    pub fn new(current: i32, maximum: i32) -> Self {
        let maximum = maximum.max(0);
        Self {
            current: current.clamp(0, maximum),
            maximum,
        }
    }

    /// Creates a health pair at full health.
    #[must_use]
    pub fn full(maximum: i32) -> Self {
        Self::new(maximum, maximum)
    }

    /// Remaining health points.
    #[must_use]
    pub const fn current(&self) -> i32 {
        self.current
    }

    /// Maximal health points.
    #[must_use]
    pub const fn maximum(&self) -> i32 {
        self.maximum
    }

    /// Remaining health expressed as a percentage of the maximum.
    ///
    /// A combatant without maximal health reports zero percent.
    #[must_use]
    pub fn percent(&self) -> f64 {
        if self.maximum <= 0 {
            return 0.0;
        }
        f64::from(self.current) / f64::from(self.maximum) * 100.0
    }

    /// Reports whether the combatant has no health left.
    #[must_use]
    pub const fn is_depleted(&self) -> bool {
        self.current <= 0
    }

    /// Health after losing `amount` points, never dropping below zero.
    #[must_use]
    pub fn damaged(self, amount: i32) -> Self {
        Self::new(self.current.saturating_sub(amount.max(0)), self.maximum)
    }
}

/// Health-fraction bracket governing which attack patterns a boss may choose.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthTier {
    /// Above 75 percent health.
    High,
    /// Above 50 and up to 75 percent health.
    Mid,
    /// At or below 50 percent health.
    Low,
}

impl HealthTier {
    /// Resolves the tier for a health percentage.
    #[must_use]
    pub fn from_percent(percent: f64) -> Self {
        if percent > 75.0 {
            Self::High
        } else if percent > 50.0 {
            Self::Mid
        } else {
            Self::Low
        }
    }
}

/// Named boss attack routines together with their geometric parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "pattern", rename_all = "snake_case")]
pub enum PatternKind {
    /// A parallel wall of projectiles aimed along the boss-to-hero direction.
    FireWall {
        /// Number of projectiles in the wall.
        width: u32,
    },
    /// Rings of stationary fire hazards expanding from the boss tile.
    FireShockWave {
        /// Number of rings to expand.
        radius: u32,
    },
    /// Two volleys of three projectiles fanned around the hero direction.
    FireCone {
        /// Half-angle of the first volley in degrees.
        degree: u32,
    },
    /// Projectiles released one after another in a full circle.
    FireStorm {
        /// Number of projectiles in the circle.
        count: u32,
        /// Delay between two consecutive projectiles in milliseconds.
        delay_step_ms: u32,
    },
    /// One direct shot followed by a shot leading the hero's movement.
    NormalAttack,
}

impl PatternKind {
    /// Cone with the default 40 degree spread.
    #[must_use]
    pub const fn fire_cone() -> Self {
        Self::FireCone { degree: 40 }
    }

    /// Storm of 16 projectiles released 100 ms apart.
    #[must_use]
    pub const fn fire_storm() -> Self {
        Self::FireStorm {
            count: 16,
            delay_step_ms: 100,
        }
    }

    /// Stable name of the pattern used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::FireWall { .. } => "fire_wall",
            Self::FireShockWave { .. } => "fire_shock_wave",
            Self::FireCone { .. } => "fire_cone",
            Self::FireStorm { .. } => "fire_storm",
            Self::NormalAttack => "normal_attack",
        }
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FireWall { width } => write!(f, "fire_wall({width})"),
            Self::FireShockWave { radius } => write!(f, "fire_shock_wave({radius})"),
            Self::FireCone { degree } => write!(f, "fire_cone({degree})"),
            Self::FireStorm {
                count,
                delay_step_ms,
            } => write!(f, "fire_storm({count}, {delay_step_ms}ms)"),
            Self::NormalAttack => f.write_str("normal_attack"),
        }
    }
}

/// Element of the damage dealt by projectiles and hazards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageType {
    /// Plain physical damage.
    Physical,
    /// Fire damage dealt by fireballs and fire hazards.
    Fire,
    /// Magic damage dealt by teleport balls.
    Magic,
}

/// Amount and element of damage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Damage {
    /// Health points removed per hit.
    pub amount: i32,
    /// Element of the damage.
    pub kind: DamageType,
}

impl Damage {
    /// Creates a damage descriptor.
    #[must_use]
    pub const fn new(amount: i32, kind: DamageType) -> Self {
        Self { amount, kind }
    }
}

/// Behaviour of a projectile entering impassable terrain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WallHitPolicy {
    /// The projectile despawns on impact.
    #[default]
    Despawn,
    /// The projectile keeps flying through the terrain.
    PassThrough,
}

/// Behaviour of a projectile striking a non-ignored entity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum EntityHitPolicy {
    /// The projectile deals its damage and despawns.
    #[default]
    Dispose,
    /// The projectile deals its damage, ignores the victim, and keeps flying.
    Pierce,
    /// The projectile deals its damage, teleports the victim, and despawns.
    Teleport {
        /// Tile to teleport to; a random floor tile when absent.
        destination: Option<Coordinate>,
    },
}

/// Sprite sheet and animation used to draw an entity.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpriteAnimation {
    /// Asset path of the sprite sheet.
    pub path: String,
    /// Animation played from the sheet.
    pub animation: String,
}

impl SpriteAnimation {
    /// Creates a sprite animation descriptor.
    #[must_use]
    pub fn new(path: impl Into<String>, animation: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            animation: animation.into(),
        }
    }

    /// Flickering fire used by fireballs and shockwave hazards.
    #[must_use]
    pub fn fire() -> Self {
        Self::new(FIREBALL_SPRITE, "run_down")
    }
}

/// Asset path of the fireball sprite sheet.
pub const FIREBALL_SPRITE: &str = "skills/fireball";
/// Asset path of the sound played when a fireball launches.
pub const FIREBALL_SOUND: &str = "sounds/fireball.wav";

/// Kinds of projectiles the combat systems can launch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectileKind {
    /// Burning projectile used by every boss pattern.
    Fireball,
    /// Magic projectile that teleports its victim.
    TeleportBall,
}

/// Static description of a projectile's flight and impact behaviour.
#[derive(Clone, Debug, PartialEq)]
pub struct ProjectileSpec {
    /// Kind of projectile.
    pub kind: ProjectileKind,
    /// Sprite drawn while the projectile flies.
    pub sprite: SpriteAnimation,
    /// Sound played at launch, released by the launch cleanup.
    pub sound: Option<String>,
    /// Travel speed in world units per second.
    pub speed: f32,
    /// Damage dealt on impact.
    pub damage: Damage,
    /// Width and height of the collision box centred on the projectile.
    pub hitbox: Vec2,
    /// Maximal distance travelled before the projectile despawns.
    pub range: f32,
    /// Behaviour when entering impassable terrain.
    pub on_wall_hit: WallHitPolicy,
    /// Behaviour when striking an entity.
    pub on_entity_hit: EntityHitPolicy,
}

impl ProjectileSpec {
    /// Standard boss fireball.
    #[must_use]
    pub fn fireball() -> Self {
        Self {
            kind: ProjectileKind::Fireball,
            sprite: SpriteAnimation::new(FIREBALL_SPRITE, "run"),
            sound: Some(FIREBALL_SOUND.to_owned()),
            speed: 5.0,
            damage: Damage::new(1, DamageType::Fire),
            hitbox: Vec2::splat(1.0),
            range: 30.0,
            on_wall_hit: WallHitPolicy::Despawn,
            on_entity_hit: EntityHitPolicy::Dispose,
        }
    }

    /// Magic ball that teleports its victim to `destination`, or to a random
    /// floor tile when no destination is given.
    #[must_use]
    pub fn teleport_ball(destination: Option<Coordinate>) -> Self {
        Self {
            kind: ProjectileKind::TeleportBall,
            sprite: SpriteAnimation::new(FIREBALL_SPRITE, "run"),
            sound: Some(FIREBALL_SOUND.to_owned()),
            speed: 7.0,
            damage: Damage::new(1, DamageType::Magic),
            hitbox: Vec2::splat(1.0),
            range: 7.0,
            on_wall_hit: WallHitPolicy::Despawn,
            on_entity_hit: EntityHitPolicy::Teleport { destination },
        }
    }
}

/// Fully resolved projectile handed to the world for integration.
#[derive(Clone, Debug, PartialEq)]
pub struct Projectile {
    /// Starting point of the flight.
    pub origin: Vec2,
    /// Point the projectile flies toward; flight continues past it until the range runs out.
    pub target: Vec2,
    /// Entity acting as the moving origin reference.
    pub shooter: EntityId,
    /// Entities the projectile never collides with.
    pub ignore: Vec<EntityId>,
    /// Flight and impact behaviour.
    pub spec: ProjectileSpec,
}

/// Stationary damaging behaviour attached to a hazard entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HazardSpec {
    /// Damage dealt to every entity standing on the hazard.
    pub damage: Damage,
    /// Frames that must pass before the hazard can damage again.
    pub rearm_frames: u32,
}

/// Reasons a projectile leaves the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DespawnReason {
    /// The projectile struck an entity.
    HitEntity,
    /// The projectile entered impassable terrain or left the level.
    HitWall,
    /// The projectile travelled its full range.
    RangeExhausted,
    /// The level was torn down.
    Teardown,
    /// A system removed the projectile explicitly.
    Removed,
}

/// Last-fired timestamp and required pause between two boss decisions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Cooldown {
    last_fired: Option<Timestamp>,
    required: Duration,
}

impl Cooldown {
    /// Timestamp of the last committed pattern, if any.
    #[must_use]
    pub const fn last_fired(&self) -> Option<Timestamp> {
        self.last_fired
    }

    /// Pause required after the last committed pattern.
    #[must_use]
    pub const fn required(&self) -> Duration {
        self.required
    }

    /// Earliest timestamp at which the next decision may happen.
    #[must_use]
    pub fn ready_at(&self) -> Timestamp {
        self.last_fired
            .map_or(Timestamp::ZERO, |fired| fired.saturating_add(self.required))
    }

    /// Reports whether a decision is allowed at `now`.
    #[must_use]
    pub fn is_ready(&self, now: Timestamp) -> bool {
        now >= self.ready_at()
    }

    /// Records a committed pattern at `now` that blocks decisions for `required`.
    pub fn arm(&mut self, now: Timestamp, required: Duration) {
        self.last_fired = Some(now);
        self.required = required;
    }
}

/// Components a combat system may require from an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    /// World position.
    Position,
    /// Health points.
    Health,
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Position => f.write_str("position"),
            Self::Health => f.write_str("health"),
        }
    }
}

/// Failures surfaced by world services to the combat systems.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CombatError {
    /// An entity lacks a component the invocation depends on.
    #[error("entity {entity} has no {component} component")]
    MissingComponent {
        /// Entity that was queried.
        entity: EntityId,
        /// Component that was missing.
        component: ComponentKind,
    },
    /// No hero exists to aim at.
    #[error("no hero is present in the level")]
    MissingHero,
    /// A sprite or sound could not be loaded.
    #[error("failed to load asset `{asset}`")]
    ResourceLoad {
        /// Path of the asset that failed to load.
        asset: String,
    },
}

impl CombatError {
    /// Reports whether the failure is a missing precondition that must abort
    /// the whole pattern invocation.
    #[must_use]
    pub const fn is_missing_precondition(&self) -> bool {
        matches!(self, Self::MissingComponent { .. } | Self::MissingHero)
    }
}

/// Black-box world services consumed by the combat systems.
///
/// Implementations own entity storage, level geometry, assets, and audio. The
/// combat systems only ever read positions, health, and tiles, and only ever
/// create or remove the transient entities they are responsible for.
pub trait CombatWorld {
    /// Current position of the hero.
    fn hero_position(&self) -> Result<Vec2, CombatError>;

    /// Current position of `entity`.
    fn position_of(&self, entity: EntityId) -> Result<Vec2, CombatError>;

    /// Current health of `entity`.
    fn health_of(&self, entity: EntityId) -> Result<Health, CombatError>;

    /// Tile containing `point`, or `None` outside the level.
    fn tile_at(&self, point: Vec2) -> Option<Tile>;

    /// Every tile whose centre lies within `radius` tiles of `origin`.
    fn tiles_within_radius(&self, origin: Coordinate, radius: u32) -> Vec<Tile>;

    /// Frames simulated per second.
    fn frame_rate(&self) -> u32;

    /// Spawns a bare collidable entity at `position`.
    fn spawn_entity(&mut self, position: Vec2) -> EntityId;

    /// Spawns an entity drawn with `visual` at `position`.
    fn spawn_visual(
        &mut self,
        position: Vec2,
        visual: &SpriteAnimation,
    ) -> Result<EntityId, CombatError>;

    /// Removes `entity`, returning whether it existed.
    fn remove_entity(&mut self, entity: EntityId) -> bool;

    /// Adds a moving projectile to the world and starts its launch sound.
    fn launch(&mut self, projectile: Projectile) -> EntityId;

    /// Turns `entity` into a stationary hazard, returning whether it existed.
    fn attach_hazard(&mut self, entity: EntityId, hazard: HazardSpec) -> bool;

    /// Releases the launch sounds of `projectile`, returning whether any were held.
    fn release_sounds(&mut self, projectile: EntityId) -> bool;

    /// Removes every projectile, hazard, and anchor, returning how many were removed.
    fn despawn_transients(&mut self) -> usize;

    /// Appends an event to the world's outbox.
    fn record(&mut self, event: Event);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_follow_health_percentage_boundaries() {
        assert_eq!(HealthTier::from_percent(100.0), HealthTier::High);
        assert_eq!(HealthTier::from_percent(75.1), HealthTier::High);
        assert_eq!(HealthTier::from_percent(75.0), HealthTier::Mid);
        assert_eq!(HealthTier::from_percent(50.1), HealthTier::Mid);
        assert_eq!(HealthTier::from_percent(50.0), HealthTier::Low);
        assert_eq!(HealthTier::from_percent(0.0), HealthTier::Low);
    }

    #[test]
    fn health_percent_handles_zero_maximum() {
        assert_eq!(Health::new(5, 0).percent(), 0.0);
        assert!((Health::new(30, 40).percent() - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn health_damage_saturates_at_zero() {
        let health = Health::full(3).damaged(5);
        assert_eq!(health.current(), 0);
        assert!(health.is_depleted());
        assert_eq!(Health::full(3).damaged(-2), Health::full(3));
    }

    #[test]
    fn timestamp_arithmetic_saturates() {
        let start = Timestamp::from_millis(100);
        assert_eq!(
            start.saturating_add(Duration::from_millis(250)),
            Timestamp::from_millis(350)
        );
        assert_eq!(
            Timestamp::from_millis(u64::MAX).saturating_add(Duration::from_secs(1)),
            Timestamp::from_millis(u64::MAX)
        );
        assert_eq!(
            start.saturating_duration_since(Timestamp::from_millis(400)),
            Duration::ZERO
        );
    }

    #[test]
    fn cooldown_blocks_until_required_duration_elapsed() {
        let mut cooldown = Cooldown::default();
        assert!(cooldown.is_ready(Timestamp::ZERO));

        cooldown.arm(Timestamp::from_millis(1_000), Duration::from_millis(500));
        assert!(!cooldown.is_ready(Timestamp::from_millis(1_499)));
        assert!(cooldown.is_ready(Timestamp::from_millis(1_500)));
    }

    #[test]
    fn coordinate_contains_negative_points() {
        assert_eq!(
            Coordinate::containing(Vec2::new(-0.25, 2.9)),
            Coordinate::new(-1, 2)
        );
        assert_eq!(
            Coordinate::new(3, 4).to_centered_point(),
            Vec2::new(3.5, 4.5)
        );
    }

    #[test]
    fn layout_resolves_walls_and_floors() {
        let layout = LevelLayout::walled_arena(3, 3);
        assert_eq!(layout.columns(), 3);
        assert_eq!(layout.rows(), 3);
        assert_eq!(
            layout.element(Coordinate::new(1, 1)),
            Some(LevelElement::Floor)
        );
        assert_eq!(
            layout.element(Coordinate::new(0, 1)),
            Some(LevelElement::Wall)
        );
        assert_eq!(layout.element(Coordinate::new(3, 1)), None);
        assert_eq!(layout.element(Coordinate::new(-1, 0)), None);
    }

    #[test]
    fn walled_arena_has_floor_interior() {
        let layout = LevelLayout::walled_arena(5, 4);
        let floors = layout
            .tiles()
            .filter(|tile| tile.element == LevelElement::Floor)
            .count();
        assert_eq!(floors, 3 * 2);
    }

    #[test]
    fn missing_components_are_preconditions() {
        let error = CombatError::MissingComponent {
            entity: EntityId::new(4),
            component: ComponentKind::Position,
        };
        assert!(error.is_missing_precondition());
        assert_eq!(error.to_string(), "entity #4 has no position component");
        assert!(!CombatError::ResourceLoad {
            asset: FIREBALL_SPRITE.to_owned(),
        }
        .is_missing_precondition());
    }
}
