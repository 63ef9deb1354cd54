use std::collections::{BTreeMap, BTreeSet};

use crate::audit::{AuditEvent, AuditSink};
use crate::config::MergeConfig;
use crate::model::{Candidate, CanonicalRecord, FieldValue, MergedRecord};
use crate::resolve::resolve_field;

/// Key reserved for provenance in merged output.
pub const PROVIDERS_KEY: &str = "providers";

/// Merge one entity's records into a single record.
///
/// Fields are visited in lexicographic order so output and audit stream are
/// reproducible. Every provider present in the group is listed in
/// `providers`, whether or not it won a field.
pub fn merge_group(
    config: &MergeConfig,
    entity_id: &str,
    records: &[&CanonicalRecord],
    sink: &mut dyn AuditSink,
) -> MergedRecord {
    let names: BTreeSet<&str> = records
        .iter()
        .flat_map(|r| r.fields.keys().map(String::as_str))
        .filter(|name| !is_reserved(config, name))
        .collect();

    let mut fields = BTreeMap::new();
    for name in names {
        let candidates: Vec<Candidate> = records
            .iter()
            .map(|r| Candidate {
                provider: r.provider.clone(),
                value: r.field(name).clone(),
            })
            .collect();

        let resolution = resolve_field(config, name, &candidates);

        if !resolution.value.is_null() {
            let contested = distinct_values(&candidates) > 1;
            sink.record(AuditEvent::FieldResolved {
                entity_id: entity_id.to_string(),
                field: name.to_string(),
                value: resolution.value.clone(),
                provider: resolution.provider,
                reason: resolution.reason,
                candidates: contested.then_some(candidates),
            });
        }

        fields.insert(name.to_string(), resolution.value);
    }

    let providers: BTreeSet<&str> = records
        .iter()
        .filter_map(|r| r.provider.as_deref())
        .filter(|p| !p.is_empty())
        .collect();

    MergedRecord {
        entity_key: config.entity_key.clone(),
        entity_id: entity_id.to_string(),
        providers: providers.into_iter().map(str::to_string).collect(),
        fields,
    }
}

fn is_reserved(config: &MergeConfig, name: &str) -> bool {
    name == config.entity_key || name == config.provider_key || name == PROVIDERS_KEY
}

/// Count of distinct non-null values on offer.
fn distinct_values(candidates: &[Candidate]) -> usize {
    let mut seen: Vec<&FieldValue> = Vec::new();
    for c in candidates {
        if c.value.is_null() || seen.iter().any(|v| v.same_as(&c.value)) {
            continue;
        }
        seen.push(&c.value);
    }
    seen.len()
}
