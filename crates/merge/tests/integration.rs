use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use proptest::prelude::*;
use serde_json::Value;

use cinemerge_merge::audit::{AuditEvent, SkipReason};
use cinemerge_merge::model::{CanonicalRecord, FieldValue, MergedRecord};
use cinemerge_merge::{FieldRule, MergeConfig, MergeEngine, MergePolicy};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn movies_engine() -> MergeEngine {
    let text = std::fs::read_to_string(fixtures_dir().join("movies.merge.toml")).unwrap();
    MergeEngine::new(MergeConfig::from_toml(&text).unwrap()).unwrap()
}

fn load_and_run() -> (Vec<MergedRecord>, Vec<AuditEvent>) {
    let text = std::fs::read_to_string(fixtures_dir().join("movies_canonical.json")).unwrap();
    let value: Value = serde_json::from_str(&text).unwrap();
    let mut events: Vec<AuditEvent> = Vec::new();
    let run = movies_engine().run_json(&value, &mut events).unwrap();
    (run.records, events)
}

fn field<'a>(record: &'a MergedRecord, name: &str) -> &'a FieldValue {
    record.get(name).unwrap_or_else(|| panic!("missing field {name}"))
}

fn decision<'a>(events: &'a [AuditEvent], entity: &str, name: &str) -> &'a AuditEvent {
    events
        .iter()
        .find(|e| matches!(e, AuditEvent::FieldResolved { entity_id, field, .. } if entity_id == entity && field == name))
        .unwrap_or_else(|| panic!("no decision for {entity}.{name}"))
}

// -------------------------------------------------------------------------
// Fixture runs
// -------------------------------------------------------------------------

#[test]
fn fixture_tables_match_builtin_preset() {
    assert_eq!(movies_engine().config(), &MergeConfig::movies());
}

#[test]
fn movies_fixture_groups_and_drops() {
    let (merged, events) = load_and_run();

    let ids: Vec<&str> = merged.iter().map(|m| m.entity_id.as_str()).collect();
    assert_eq!(ids, vec!["4f1c2a9e", "9b7d0c31"]);

    let skipped: Vec<&AuditEvent> = events.iter().filter(|e| e.is_warning()).collect();
    assert_eq!(
        skipped,
        vec![&AuditEvent::RecordSkipped {
            index: 8,
            provider: Some("provider1".into()),
            reason: SkipReason::MissingEntityId,
        }]
    );
}

#[test]
fn inception_prefers_owning_providers() {
    let (merged, events) = load_and_run();
    let inception = &merged[0];

    assert_eq!(
        inception.providers,
        vec![
            "provider1",
            "provider2",
            "provider3_domestic",
            "provider3_financials",
            "provider3_international",
        ]
    );
    assert_eq!(field(inception, "movie_title"), &FieldValue::Text("Inception".into()));
    assert_eq!(field(inception, "release_year"), &FieldValue::Int(2010));
    // provider1 owns the critic score even though provider2 reports higher.
    assert_eq!(field(inception, "critic_score"), &FieldValue::Float(0.87));
    assert_eq!(field(inception, "audience_avg_score"), &FieldValue::Float(9.1));
    // provider2 outranks provider3_domestic for domestic gross.
    assert_eq!(field(inception, "domestic_box_office_gross"), &FieldValue::Int(292_576_195));
    assert_eq!(field(inception, "box_office_gross_usd"), &FieldValue::Int(836_836_967));
    assert_eq!(field(inception, "production_budget_usd"), &FieldValue::Int(160_000_000));
    assert_eq!(field(inception, "marketing_spend_usd"), &FieldValue::Int(100_000_000));
    assert_eq!(field(inception, "total_critic_ratings"), &FieldValue::Int(355));

    match decision(&events, "4f1c2a9e", "critic_score") {
        AuditEvent::FieldResolved { provider, reason, candidates, .. } => {
            assert_eq!(provider.as_deref(), Some("provider1"));
            assert_eq!(reason.to_string(), "provider-priority");
            assert_eq!(candidates.as_ref().map(Vec::len), Some(5));
        }
        other => panic!("unexpected {other:?}"),
    }
    match decision(&events, "4f1c2a9e", "total_critic_ratings") {
        AuditEvent::FieldResolved { reason, candidates, .. } => {
            assert_eq!(reason.to_string(), "policy:max-numeric");
            assert!(candidates.is_none());
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn interstellar_falls_back_when_priority_provider_absent() {
    let (merged, events) = load_and_run();
    let interstellar = &merged[1];

    assert_eq!(interstellar.providers, vec!["box_office_mojo", "provider2", "the_numbers"]);
    assert_eq!(field(interstellar, "box_office_gross_usd"), &FieldValue::Int(701_729_206));
    assert_eq!(field(interstellar, "critic_score"), &FieldValue::Null);

    match decision(&events, "9b7d0c31", "box_office_gross_usd") {
        AuditEvent::FieldResolved { provider, reason, .. } => {
            assert_eq!(provider.as_deref(), Some("box_office_mojo"));
            assert_eq!(reason.to_string(), "policy:max-numeric");
        }
        other => panic!("unexpected {other:?}"),
    }

    let null_decisions = events.iter().filter(|e| {
        matches!(e, AuditEvent::FieldResolved { entity_id, field, .. } if entity_id == "9b7d0c31" && field == "critic_score")
    });
    assert_eq!(null_decisions.count(), 0);
}

#[test]
fn merged_output_uses_configured_entity_key() {
    let (merged, _) = load_and_run();
    let json = serde_json::to_value(&merged[1]).unwrap();
    assert_eq!(json["movie_id"], "9b7d0c31");
    assert!(json.get("entity_id").is_none());
    assert!(json.get("provider").is_none());
    assert!(json["critic_score"].is_null());
}

#[test]
fn undeclared_fields_still_merge() {
    let engine = MergeEngine::new(MergeConfig::movies()).unwrap();
    let records = vec![
        CanonicalRecord::new("m1", "p1").with_field("runtime_minutes", 148_i64),
        CanonicalRecord::new("m1", "p2").with_field("runtime_minutes", 150_i64),
    ];
    let (run, _) = engine.run_collect(&records);
    assert_eq!(run.records[0].get("runtime_minutes"), Some(&FieldValue::Int(148)));
    assert_eq!(
        engine.config().undeclared_fields(run.records[0].fields.keys().map(String::as_str)),
        vec!["runtime_minutes"]
    );
}

// -------------------------------------------------------------------------
// Properties
// -------------------------------------------------------------------------

const PROVIDERS: [&str; 4] = ["p1", "p2", "p3", "p4"];

fn arb_records() -> impl Strategy<Value = Vec<CanonicalRecord>> {
    prop::collection::vec(
        (0usize..5, 0usize..PROVIDERS.len(), prop::option::of(-50i64..50), prop::option::of("[a-c]")),
        0..30,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .map(|(entity, provider, score, label)| {
                let mut r = CanonicalRecord::new(format!("e{entity}"), PROVIDERS[provider]);
                if entity == 4 {
                    r.entity_id = Some(String::new());
                }
                r.with_field("score", score.map(FieldValue::Int).unwrap_or(FieldValue::Null))
                    .with_field("label", label.map(FieldValue::Text).unwrap_or(FieldValue::Null))
            })
            .collect()
    })
}

fn prop_engine() -> MergeEngine {
    let config = MergeConfig::default()
        .with_rule("score", FieldRule::policy(MergePolicy::MaxNumeric).with_priority(["p3"]));
    MergeEngine::new(config).unwrap()
}

proptest! {
    #[test]
    fn runs_are_deterministic(records in arb_records()) {
        let engine = prop_engine();
        let (a, a_events) = engine.run_collect(&records);
        let (b, b_events) = engine.run_collect(&records);
        prop_assert_eq!(
            serde_json::to_string(&a.records).unwrap(),
            serde_json::to_string(&b.records).unwrap()
        );
        prop_assert_eq!(a_events, b_events);
    }

    #[test]
    fn groups_hold_all_and_only_their_records(records in arb_records()) {
        let (run, events) = prop_engine().run_collect(&records);

        let mut expected: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        let mut first_seen: Vec<&str> = Vec::new();
        for r in &records {
            let id = r.entity_id.as_deref().unwrap();
            if id.is_empty() {
                continue;
            }
            if !expected.contains_key(id) {
                first_seen.push(id);
            }
            expected.entry(id).or_default().insert(r.provider.as_deref().unwrap());
        }

        let ids: Vec<&str> = run.records.iter().map(|m| m.entity_id.as_str()).collect();
        prop_assert_eq!(ids, first_seen);

        for merged in &run.records {
            let want: Vec<&str> = expected[merged.entity_id.as_str()].iter().copied().collect();
            prop_assert_eq!(&merged.providers, &want);
        }

        let dropped = records.iter().filter(|r| r.entity_id.as_deref() == Some("")).count();
        prop_assert_eq!(events.iter().filter(|e| e.is_warning()).count(), dropped);
        prop_assert_eq!(run.summary.skipped_records, dropped);
    }

    #[test]
    fn priority_provider_always_wins_when_present(records in arb_records()) {
        let (run, _) = prop_engine().run_collect(&records);
        for merged in &run.records {
            let p3_score = records
                .iter()
                .filter(|r| r.entity_id.as_deref() == Some(merged.entity_id.as_str()))
                .filter(|r| r.provider.as_deref() == Some("p3"))
                .map(|r| r.field("score"))
                .find(|v| !v.is_null());
            if let Some(v) = p3_score {
                prop_assert_eq!(merged.get("score"), Some(v));
            }
        }
    }
}
