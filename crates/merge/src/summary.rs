use std::collections::BTreeMap;

use serde::Serialize;

use crate::audit::{AuditEvent, AuditSink};

/// Counts describing one merge run.
///
/// Acts as an [`AuditSink`] so it can be filled while the run streams events
/// elsewhere; the engine sets the record and entity totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeSummary {
    pub input_records: usize,
    pub skipped_records: usize,
    pub entities: usize,
    /// Fields that resolved to a non-null value.
    pub fields_resolved: usize,
    /// Resolved fields where providers offered different values.
    pub contested_fields: usize,
    /// Resolution reason → count.
    pub reasons: BTreeMap<String, usize>,
    /// Winning provider → fields won.
    pub provider_wins: BTreeMap<String, usize>,
}

impl AuditSink for MergeSummary {
    fn record(&mut self, event: AuditEvent) {
        match event {
            AuditEvent::RecordSkipped { .. } => self.skipped_records += 1,
            AuditEvent::FieldResolved {
                provider,
                reason,
                candidates,
                ..
            } => {
                self.fields_resolved += 1;
                if candidates.is_some() {
                    self.contested_fields += 1;
                }
                *self.reasons.entry(reason.to_string()).or_insert(0) += 1;
                if let Some(p) = provider {
                    *self.provider_wins.entry(p).or_insert(0) += 1;
                }
            }
        }
    }
}

/// Compute summary statistics from a recorded audit stream.
pub fn compute_summary(input_records: usize, entities: usize, events: &[AuditEvent]) -> MergeSummary {
    let mut summary = MergeSummary {
        input_records,
        entities,
        ..MergeSummary::default()
    };
    for event in events {
        summary.record(event.clone());
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::SkipReason;
    use crate::config::MergePolicy;
    use crate::model::{Candidate, FieldValue, Reason};

    fn resolved(provider: &str, reason: Reason, contested: bool) -> AuditEvent {
        AuditEvent::FieldResolved {
            entity_id: "m1".into(),
            field: "f".into(),
            value: FieldValue::Int(1),
            provider: Some(provider.into()),
            reason,
            candidates: contested.then(|| vec![Candidate::new(Some(provider), 1_i64)]),
        }
    }

    #[test]
    fn summary_counts() {
        let events = vec![
            AuditEvent::RecordSkipped {
                index: 0,
                provider: None,
                reason: SkipReason::MissingEntityId,
            },
            resolved("p1", Reason::ProviderPriority, true),
            resolved("p2", Reason::Policy(MergePolicy::MaxNumeric), true),
            resolved("p1", Reason::Policy(MergePolicy::FirstNonNull), false),
        ];
        let summary = compute_summary(4, 1, &events);

        assert_eq!(summary.input_records, 4);
        assert_eq!(summary.entities, 1);
        assert_eq!(summary.skipped_records, 1);
        assert_eq!(summary.fields_resolved, 3);
        assert_eq!(summary.contested_fields, 2);
        assert_eq!(summary.reasons["provider-priority"], 1);
        assert_eq!(summary.reasons["policy:max-numeric"], 1);
        assert_eq!(summary.reasons["policy:first-non-null"], 1);
        assert_eq!(summary.provider_wins["p1"], 2);
        assert_eq!(summary.provider_wins["p2"], 1);
    }
}
