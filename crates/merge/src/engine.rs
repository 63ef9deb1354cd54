use serde_json::Value;
use tracing::{debug, info, warn};

use crate::audit::{AuditEvent, AuditSink};
use crate::config::MergeConfig;
use crate::error::MergeError;
use crate::group::group_records;
use crate::merger::merge_group;
use crate::model::{CanonicalRecord, MergedRecord};
use crate::summary::MergeSummary;

/// Result of one merge run: merged records in group-first-seen order plus
/// run counts.
#[derive(Debug, Clone)]
pub struct MergeRun {
    pub records: Vec<MergedRecord>,
    pub summary: MergeSummary,
}

/// Groups canonical records by entity and merges each group under one set of
/// policy tables.
#[derive(Debug, Clone)]
pub struct MergeEngine {
    config: MergeConfig,
}

impl MergeEngine {
    pub fn new(config: MergeConfig) -> Result<Self, MergeError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    /// Run the merge, streaming every audit event to `sink` in order.
    ///
    /// Records without a usable entity id are dropped with a warning event;
    /// nothing else about the records can fail the run.
    pub fn run(&self, records: &[CanonicalRecord], sink: &mut dyn AuditSink) -> MergeRun {
        let mut summary = MergeSummary {
            input_records: records.len(),
            ..MergeSummary::default()
        };

        let merged = {
            let mut tee = (&mut summary, sink);

            let groups = group_records(records, &mut tee);
            debug!(
                records = records.len(),
                entities = groups.len(),
                config = %self.config.name,
                "grouped records by {}",
                self.config.entity_key
            );

            groups
                .iter()
                .map(|g| merge_group(&self.config, g.entity_id, &g.records, &mut tee))
                .collect::<Vec<_>>()
        };
        summary.entities = merged.len();

        if summary.skipped_records > 0 {
            warn!(
                skipped = summary.skipped_records,
                "dropped records without {}", self.config.entity_key
            );
        }
        info!(
            entities = summary.entities,
            fields = summary.fields_resolved,
            contested = summary.contested_fields,
            "merge completed"
        );

        MergeRun {
            records: merged,
            summary,
        }
    }

    /// Run the merge and hand back the audit stream alongside the result.
    pub fn run_collect(&self, records: &[CanonicalRecord]) -> (MergeRun, Vec<AuditEvent>) {
        let mut events: Vec<AuditEvent> = Vec::new();
        let run = self.run(records, &mut events);
        (run, events)
    }

    /// Parse a JSON array of record objects using the configured key names.
    pub fn parse_records(&self, value: &Value) -> Result<Vec<CanonicalRecord>, MergeError> {
        let items = match value {
            Value::Array(items) => items,
            Value::Object(obj) if obj.contains_key("records") => {
                return Err(MergeError::invalid(
                    None,
                    "expected an array of records, found a wrapper object (unwrap \"records\" first)",
                ))
            }
            other => {
                return Err(MergeError::invalid(
                    None,
                    format!("expected an array of records, found {}", type_name(other)),
                ))
            }
        };

        items
            .iter()
            .enumerate()
            .map(|(i, item)| CanonicalRecord::from_json(i, item, &self.config))
            .collect()
    }

    /// Parse then run. Fails only when the input is not an array of
    /// record-shaped objects.
    pub fn run_json(&self, value: &Value, sink: &mut dyn AuditSink) -> Result<MergeRun, MergeError> {
        let records = self.parse_records(value)?;
        Ok(self.run(&records, sink))
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
