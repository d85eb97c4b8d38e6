use boss_arena_core::{Health, HealthTier, PatternKind};
use boss_arena_system_decision::{BossDecision, DecisionTables};

#[test]
fn tables_deserialize_from_toml_with_defaults_for_missing_tiers() {
    let tables: DecisionTables = toml::from_str(
        r#"
        high = [
            { pattern = "fire_wall", width = 3, weight = 1.0 },
        ]
        low = [
            { pattern = "fire_storm", count = 8, delay_step_ms = 50, weight = 2.0 },
            { pattern = "normal_attack", weight = 1.0 },
        ]
        "#,
    )
    .expect("valid tables");

    assert_eq!(tables.high.entries().len(), 1);
    assert_eq!(
        tables.high.entries()[0].pattern,
        PatternKind::FireWall { width: 3 }
    );
    assert_eq!(tables.mid, DecisionTables::default().mid);
    assert_eq!(
        tables.low.entries()[0].pattern,
        PatternKind::FireStorm {
            count: 8,
            delay_step_ms: 50
        }
    );
    tables.validate().expect("tables are usable");
}

#[test]
fn custom_tables_drive_the_policy() {
    let tables: DecisionTables = toml::from_str(
        r#"
        high = [{ pattern = "normal_attack", weight = 1.0 }]
        "#,
    )
    .expect("valid tables");
    let mut policy = BossDecision::new(tables, 11).expect("valid tables");

    for _ in 0..32 {
        let decision = policy.decide(Health::full(40));
        assert_eq!(decision.tier, HealthTier::High);
        assert_eq!(decision.pattern, PatternKind::NormalAttack);
        assert!(decision.primary);
    }
}
