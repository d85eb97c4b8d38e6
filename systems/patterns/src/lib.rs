#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure attack pattern library.
//!
//! Patterns never spawn anything themselves. Each pattern maps a
//! [`PatternInput`] sampled once at invocation time onto a [`PatternPlan`]: a
//! list of launch directives tagged with when they should run, plus the
//! cooldown the pattern declares. Every directive owns copies of the values it
//! needs, so executing a directive later never observes boss movement that
//! happened after the decision. The only deliberate exception is
//! [`PredictiveShot`], which re-samples the hero when it fires.

mod tuning;

use std::time::Duration;

use boss_arena_core::{
    CombatError, CombatWorld, Coordinate, Damage, EntityId, LevelElement, PatternKind, Tile, Vec2,
};

pub use tuning::PatternTuning;

/// World state a pattern is planned from, sampled once at invocation time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PatternInput {
    /// Entity executing the pattern.
    pub attacker: EntityId,
    /// Position of the attacker at invocation time.
    pub attacker_position: Vec2,
    /// Tile the attacker occupies, if it could be resolved.
    pub attacker_tile: Option<Coordinate>,
    /// Position of the hero at invocation time, if a hero exists.
    pub hero_position: Option<Vec2>,
}

impl PatternInput {
    /// Samples the attacker and hero from the world.
    ///
    /// Fails fast when the attacker has no position; a missing hero only fails
    /// the patterns that aim at it.
    pub fn sample<W: CombatWorld + ?Sized>(
        world: &W,
        attacker: EntityId,
    ) -> Result<Self, CombatError> {
        let attacker_position = world.position_of(attacker)?;
        let attacker_tile = world.tile_at(attacker_position).map(|tile| tile.coordinate);
        let hero_position = world.hero_position().ok();

        Ok(Self {
            attacker,
            attacker_position,
            attacker_tile,
            hero_position,
        })
    }

    fn hero(&self) -> Result<Vec2, CombatError> {
        self.hero_position.ok_or(CombatError::MissingHero)
    }
}

/// When a directive should run relative to the invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Timing {
    /// Runs during the invocation itself.
    Immediate,
    /// Runs from the scheduler once the delay elapsed.
    After(Duration),
}

/// A single straight projectile launch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Shot {
    /// Starting point of the projectile.
    pub origin: Vec2,
    /// Point the projectile flies toward.
    pub target: Vec2,
    /// Attacker position captured at invocation; shots starting here use the
    /// attacker itself as the shooter.
    pub anchor: Vec2,
}

/// A shot that leads the hero's movement, resolved when it fires.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PredictiveShot {
    /// Starting point of the projectile, also used as its anchor.
    pub origin: Vec2,
    /// Hero position sampled at invocation time.
    pub first_sample: Vec2,
    /// Distance the prediction leads the hero by along its movement.
    pub lead_distance: f32,
}

impl PredictiveShot {
    /// Resolves the shot given the hero position sampled when it fires.
    ///
    /// A hero that did not move is aimed at directly.
    #[must_use]
    pub fn resolve(&self, second_sample: Vec2) -> Shot {
        let movement = (second_sample - self.first_sample).normalize_or_zero();
        Shot {
            origin: self.origin,
            target: second_sample + movement * self.lead_distance,
            anchor: self.origin,
        }
    }
}

/// One ring of a shockwave.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShockwaveRing {
    /// Tile the boss occupied at invocation time.
    pub center: Coordinate,
    /// Ring index, starting at one for the tiles adjacent to the centre.
    pub ring: u32,
    /// Damage dealt by each hazard of the ring.
    pub damage: Damage,
    /// Time each hazard stays in the level.
    pub hazard_lifetime: Duration,
}

impl ShockwaveRing {
    /// Selects the tiles this ring covers.
    ///
    /// `outer` holds the tiles within `ring` of the centre and `inner` the
    /// tiles within `ring - 1`. Walls, the centre tile, and tiles already
    /// covered by an inner ring are skipped; each coordinate appears once.
    #[must_use]
    pub fn select(&self, outer: &[Tile], inner: &[Tile]) -> Vec<Coordinate> {
        let mut selected: Vec<Coordinate> = Vec::new();
        for tile in outer {
            if tile.element == LevelElement::Wall
                || tile.coordinate == self.center
                || inner.iter().any(|covered| covered.coordinate == tile.coordinate)
                || selected.contains(&tile.coordinate)
            {
                continue;
            }
            selected.push(tile.coordinate);
        }
        selected
    }

    /// Queries the world for the tiles this ring covers.
    #[must_use]
    pub fn tiles<W: CombatWorld + ?Sized>(&self, world: &W) -> Vec<Coordinate> {
        let outer = world.tiles_within_radius(self.center, self.ring);
        let inner = match self.ring.checked_sub(1) {
            Some(radius) => world.tiles_within_radius(self.center, radius),
            None => Vec::new(),
        };
        self.select(&outer, &inner)
    }
}

/// Work a pattern asks the executor to perform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Directive {
    /// Launch a projectile along fixed geometry.
    Shot(Shot),
    /// Launch a projectile at a prediction of the hero's position.
    PredictiveShot(PredictiveShot),
    /// Place the hazards of one shockwave ring.
    ShockwaveRing(ShockwaveRing),
}

/// Directive tagged with when it should run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimedDirective {
    /// When the directive runs relative to the invocation.
    pub timing: Timing,
    /// Work to perform.
    pub directive: Directive,
}

impl TimedDirective {
    fn immediate(directive: Directive) -> Self {
        Self {
            timing: Timing::Immediate,
            directive,
        }
    }

    fn after(delay: Duration, directive: Directive) -> Self {
        Self {
            timing: Timing::After(delay),
            directive,
        }
    }
}

/// Directives and cooldown produced by a single pattern invocation.
#[derive(Clone, Debug, PartialEq)]
pub struct PatternPlan {
    /// Pattern that produced the plan.
    pub kind: PatternKind,
    /// Minimum time before the boss may decide again.
    pub cooldown: Duration,
    /// Directives in the order they were produced.
    pub directives: Vec<TimedDirective>,
}

impl PatternPlan {
    fn new(kind: PatternKind, tuning: &PatternTuning) -> Self {
        Self {
            kind,
            cooldown: tuning.cooldown_for(kind),
            directives: Vec::new(),
        }
    }

    /// Directives that run during the invocation.
    pub fn immediate(&self) -> impl Iterator<Item = &Directive> {
        self.directives
            .iter()
            .filter(|timed| timed.timing == Timing::Immediate)
            .map(|timed| &timed.directive)
    }

    /// Directives deferred through the scheduler, with their delays.
    pub fn deferred(&self) -> impl Iterator<Item = (Duration, &Directive)> {
        self.directives.iter().filter_map(|timed| match timed.timing {
            Timing::After(delay) => Some((delay, &timed.directive)),
            Timing::Immediate => None,
        })
    }

    /// Reports whether the plan performs no work.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }
}

/// Plans `kind` for the sampled `input`.
pub fn plan(
    kind: PatternKind,
    input: &PatternInput,
    tuning: &PatternTuning,
) -> Result<PatternPlan, CombatError> {
    match kind {
        PatternKind::FireWall { width } => fire_wall(width, input, tuning),
        PatternKind::FireShockWave { radius } => Ok(fire_shock_wave(radius, input, tuning)),
        PatternKind::FireCone { degree } => fire_cone(degree, input, tuning),
        PatternKind::FireStorm {
            count,
            delay_step_ms,
        } => Ok(fire_storm(
            count,
            Duration::from_millis(u64::from(delay_step_ms)),
            input,
            tuning,
        )),
        PatternKind::NormalAttack => normal_attack(input, tuning),
    }
}

/// Launches `width` parallel projectiles at once, one per integer offset
/// starting at `-(width / 2)` along the perpendicular of the boss-to-hero
/// direction. The zero offset flies from the boss straight at the hero.
pub fn fire_wall(
    width: u32,
    input: &PatternInput,
    tuning: &PatternTuning,
) -> Result<PatternPlan, CombatError> {
    let hero = input.hero()?;
    let boss = input.attacker_position;
    let mut plan = PatternPlan::new(PatternKind::FireWall { width }, tuning);

    let right = (hero - boss).perp().normalize_or_zero();
    let first = -i64::from(width / 2);
    for step in 0..i64::from(width) {
        let offset = right * (first + step) as f32;
        plan.directives.push(TimedDirective::immediate(Directive::Shot(Shot {
            origin: boss + offset,
            target: hero + offset,
            anchor: boss,
        })));
    }

    Ok(plan)
}

/// Expands rings of fire hazards around the boss tile.
///
/// Ring `r` (starting at one) is deferred by `(r - 1)` ring delays. Nothing is
/// planned when the boss tile cannot be resolved.
#[must_use]
pub fn fire_shock_wave(radius: u32, input: &PatternInput, tuning: &PatternTuning) -> PatternPlan {
    let mut plan = PatternPlan::new(PatternKind::FireShockWave { radius }, tuning);
    let Some(center) = input.attacker_tile else {
        return plan;
    };

    let ring_delay = Duration::from_millis(tuning.shock_wave_ring_delay_ms);
    let hazard_lifetime = Duration::from_millis(tuning.hazard_lifetime_ms);
    for ring in 1..=radius {
        plan.directives.push(TimedDirective::after(
            ring_delay * (ring - 1),
            Directive::ShockwaveRing(ShockwaveRing {
                center,
                ring,
                damage: tuning.hazard_damage(),
                hazard_lifetime,
            }),
        ));
    }

    plan
}

/// Fans three projectiles at `+degree`, `0`, and `-degree` around the hero
/// direction, then a second, narrower volley after the follow-up delay.
pub fn fire_cone(
    degree: u32,
    input: &PatternInput,
    tuning: &PatternTuning,
) -> Result<PatternPlan, CombatError> {
    let hero = input.hero()?;
    let boss = input.attacker_position;
    let mut plan = PatternPlan::new(PatternKind::FireCone { degree }, tuning);

    let to_hero = hero - boss;
    let direction = to_hero.normalize_or_zero();
    let distance = to_hero.length();
    let shot_at = |angle: f32| {
        Directive::Shot(Shot {
            origin: boss,
            target: boss + rotate_degrees(direction, angle) * distance,
            anchor: boss,
        })
    };

    let spread = degree as f32;
    for angle in [spread, 0.0, -spread] {
        plan.directives.push(TimedDirective::immediate(shot_at(angle)));
    }

    let narrowed = degree.saturating_sub(tuning.cone_narrowing_degrees) as f32;
    let follow_up = Duration::from_millis(tuning.cone_follow_up_delay_ms);
    for angle in [narrowed, 0.0, -narrowed] {
        plan.directives
            .push(TimedDirective::after(follow_up, shot_at(angle)));
    }

    Ok(plan)
}

/// Releases `count` projectiles around a full circle, the `i`-th one
/// `i * delay_step` after the invocation.
#[must_use]
pub fn fire_storm(
    count: u32,
    delay_step: Duration,
    input: &PatternInput,
    tuning: &PatternTuning,
) -> PatternPlan {
    let boss = input.attacker_position;
    let delay_step_ms = u32::try_from(delay_step.as_millis()).unwrap_or(u32::MAX);
    let mut plan = PatternPlan::new(
        PatternKind::FireStorm {
            count,
            delay_step_ms,
        },
        tuning,
    );

    for index in 0..count {
        let angle = (index as f32 * 360.0 / count as f32).to_radians();
        let target = boss + Vec2::new(angle.cos(), angle.sin()) * tuning.storm_radius;
        plan.directives.push(TimedDirective::after(
            delay_step * index,
            Directive::Shot(Shot {
                origin: boss,
                target,
                anchor: boss,
            }),
        ));
    }

    plan
}

/// Fires at the hero, then leads the hero's movement with a second shot.
pub fn normal_attack(
    input: &PatternInput,
    tuning: &PatternTuning,
) -> Result<PatternPlan, CombatError> {
    let hero = input.hero()?;
    let boss = input.attacker_position;
    let mut plan = PatternPlan::new(PatternKind::NormalAttack, tuning);

    plan.directives.push(TimedDirective::immediate(Directive::Shot(Shot {
        origin: boss,
        target: hero,
        anchor: boss,
    })));
    plan.directives.push(TimedDirective::after(
        Duration::from_millis(tuning.prediction_delay_ms),
        Directive::PredictiveShot(PredictiveShot {
            origin: boss,
            first_sample: hero,
            lead_distance: boss.distance(hero) * tuning.prediction_scale,
        }),
    ));

    Ok(plan)
}

/// Rotates `vector` counter-clockwise by `degrees`.
fn rotate_degrees(vector: Vec2, degrees: f32) -> Vec2 {
    let (sin, cos) = degrees.to_radians().sin_cos();
    Vec2::new(vector.x * cos - vector.y * sin, vector.x * sin + vector.y * cos)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-4;

    fn input(boss: Vec2, hero: Vec2) -> PatternInput {
        PatternInput {
            attacker: EntityId::new(1),
            attacker_position: boss,
            attacker_tile: Some(Coordinate::containing(boss)),
            hero_position: Some(hero),
        }
    }

    fn shots(directives: impl Iterator<Item = Directive>) -> Vec<Shot> {
        directives
            .map(|directive| match directive {
                Directive::Shot(shot) => shot,
                other => panic!("expected a shot, found {other:?}"),
            })
            .collect()
    }

    fn assert_close(actual: Vec2, expected: Vec2) {
        assert!(
            actual.distance(expected) < EPSILON,
            "expected {expected:?}, found {actual:?}"
        );
    }

    #[test]
    fn fire_wall_launches_one_shot_per_width() {
        let tuning = PatternTuning::default();
        let pattern_input = input(Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0));

        for width in [4, 5, 10] {
            let plan = fire_wall(width, &pattern_input, &tuning).expect("hero present");
            assert_eq!(plan.directives.len(), width as usize);
            assert_eq!(plan.immediate().count(), width as usize);
            assert_eq!(plan.deferred().count(), 0);
        }
    }

    #[test]
    fn fire_wall_is_parallel_and_centred_on_the_hero() {
        let tuning = PatternTuning::default();
        let boss = Vec2::new(0.0, 0.0);
        let hero = Vec2::new(10.0, 0.0);
        let plan = fire_wall(4, &input(boss, hero), &tuning).expect("hero present");
        let shots = shots(plan.immediate().copied());

        let offsets: Vec<f32> = shots.iter().map(|shot| shot.origin.y).collect();
        assert_eq!(offsets, [-2.0, -1.0, 0.0, 1.0]);

        for shot in &shots {
            assert_close(shot.target - shot.origin, hero - boss);
            assert_eq!(shot.anchor, boss);
        }
        let centre = shots
            .iter()
            .find(|shot| shot.origin == boss)
            .expect("zero offset shot");
        assert_eq!(centre.target, hero);
    }

    #[test]
    fn fire_cone_fans_two_volleys() {
        let tuning = PatternTuning::default();
        let boss = Vec2::new(2.0, 2.0);
        let hero = Vec2::new(12.0, 2.0);
        let plan = fire_cone(40, &input(boss, hero), &tuning).expect("hero present");

        let first = shots(plan.immediate().copied());
        assert_eq!(first.len(), 3);
        let deferred: Vec<(Duration, Directive)> =
            plan.deferred().map(|(delay, directive)| (delay, *directive)).collect();
        assert_eq!(deferred.len(), 3);
        assert!(deferred
            .iter()
            .all(|(delay, _)| *delay == Duration::from_millis(125)));
        let second = shots(deferred.into_iter().map(|(_, directive)| directive));

        let angle_of = |shot: &Shot| {
            let aim = shot.target - shot.origin;
            aim.y.atan2(aim.x).to_degrees()
        };
        let first_angles: Vec<f32> = first.iter().map(angle_of).collect();
        let second_angles: Vec<f32> = second.iter().map(angle_of).collect();

        for (actual, expected) in first_angles.iter().zip([40.0, 0.0, -40.0]) {
            assert!((actual - expected).abs() < 1e-3, "{actual} != {expected}");
        }
        for (actual, expected) in second_angles.iter().zip([35.0, 0.0, -35.0]) {
            assert!((actual - expected).abs() < 1e-3, "{actual} != {expected}");
        }
        for shot in first.iter().chain(second.iter()) {
            assert!((shot.target.distance(boss) - 10.0).abs() < EPSILON);
            assert_eq!(shot.origin, boss);
        }
    }

    #[test]
    fn fire_storm_spaces_shots_evenly_in_time_and_angle() {
        let tuning = PatternTuning::default();
        let boss = Vec2::new(5.0, 5.0);
        let plan = fire_storm(
            16,
            Duration::from_millis(100),
            &input(boss, Vec2::new(6.0, 5.0)),
            &tuning,
        );

        assert_eq!(plan.immediate().count(), 0);
        let deferred: Vec<(Duration, Directive)> =
            plan.deferred().map(|(delay, directive)| (delay, *directive)).collect();
        assert_eq!(deferred.len(), 16);

        for (index, (delay, directive)) in deferred.iter().enumerate() {
            assert_eq!(*delay, Duration::from_millis(100 * index as u64));
            let Directive::Shot(shot) = directive else {
                panic!("storm only launches shots");
            };
            let expected_angle = (index as f32 * 22.5).to_radians();
            let expected = boss + Vec2::new(expected_angle.cos(), expected_angle.sin()) * 10.0;
            assert_close(shot.target, expected);
            assert_eq!(shot.origin, boss);
        }
    }

    #[test]
    fn fire_storm_does_not_need_a_hero() {
        let mut pattern_input = input(Vec2::ZERO, Vec2::ONE);
        pattern_input.hero_position = None;
        let plan = plan(PatternKind::fire_storm(), &pattern_input, &PatternTuning::default())
            .expect("storm ignores the hero");
        assert_eq!(plan.directives.len(), 16);
    }

    #[test]
    fn hero_dependent_patterns_fail_without_a_hero() {
        let mut pattern_input = input(Vec2::ZERO, Vec2::ONE);
        pattern_input.hero_position = None;
        let tuning = PatternTuning::default();

        for kind in [
            PatternKind::FireWall { width: 5 },
            PatternKind::fire_cone(),
            PatternKind::NormalAttack,
        ] {
            assert_eq!(
                plan(kind, &pattern_input, &tuning),
                Err(CombatError::MissingHero),
                "{kind}"
            );
        }
    }

    #[test]
    fn normal_attack_leads_moving_hero() {
        let tuning = PatternTuning::default();
        let boss = Vec2::new(0.0, 0.0);
        let hero = Vec2::new(3.0, 4.0);
        let plan = normal_attack(&input(boss, hero), &tuning).expect("hero present");

        let direct = shots(plan.immediate().copied());
        assert_eq!(direct.len(), 1);
        assert_eq!(direct[0].target, hero);

        let (delay, directive) = plan.deferred().next().expect("predictive shot");
        assert_eq!(delay, Duration::from_millis(50));
        let Directive::PredictiveShot(predictive) = *directive else {
            panic!("expected a predictive shot");
        };
        assert!((predictive.lead_distance - 10.0).abs() < EPSILON);

        let moved = Vec2::new(3.0, 5.0);
        let resolved = predictive.resolve(moved);
        assert_close(resolved.target, Vec2::new(3.0, 15.0));
        assert_eq!(resolved.origin, boss);
        assert_eq!(resolved.anchor, boss);
    }

    #[test]
    fn normal_attack_aims_at_stationary_hero() {
        let predictive = PredictiveShot {
            origin: Vec2::ZERO,
            first_sample: Vec2::new(4.0, 0.0),
            lead_distance: 8.0,
        };
        assert_eq!(predictive.resolve(Vec2::new(4.0, 0.0)).target, Vec2::new(4.0, 0.0));
    }

    #[test]
    fn shock_wave_without_tile_plans_nothing() {
        let mut pattern_input = input(Vec2::ZERO, Vec2::ONE);
        pattern_input.attacker_tile = None;
        let plan = fire_shock_wave(6, &pattern_input, &PatternTuning::default());
        assert!(plan.is_empty());
        assert_eq!(plan.cooldown, Duration::from_secs(10));
    }

    #[test]
    fn shock_wave_rings_are_spaced_by_ring_delay() {
        let plan = fire_shock_wave(
            3,
            &input(Vec2::new(4.5, 4.5), Vec2::ONE),
            &PatternTuning::default(),
        );
        let delays: Vec<Duration> = plan.deferred().map(|(delay, _)| delay).collect();
        assert_eq!(
            delays,
            [
                Duration::ZERO,
                Duration::from_millis(250),
                Duration::from_millis(500)
            ]
        );
    }

    #[test]
    fn ring_selection_skips_walls_centre_inner_and_duplicates() {
        let center = Coordinate::new(2, 2);
        let ring = ShockwaveRing {
            center,
            ring: 2,
            damage: PatternTuning::default().hazard_damage(),
            hazard_lifetime: Duration::from_secs(2),
        };
        let floor = |x, y| Tile {
            coordinate: Coordinate::new(x, y),
            element: LevelElement::Floor,
        };
        let outer = [
            floor(2, 2),
            floor(2, 3),
            floor(2, 4),
            Tile {
                coordinate: Coordinate::new(4, 2),
                element: LevelElement::Wall,
            },
            floor(0, 2),
            floor(0, 2),
        ];
        let inner = [floor(2, 2), floor(2, 3)];

        assert_eq!(
            ring.select(&outer, &inner),
            [Coordinate::new(2, 4), Coordinate::new(0, 2)]
        );
    }
}
