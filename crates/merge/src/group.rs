use std::collections::HashMap;

use crate::audit::{AuditEvent, AuditSink, SkipReason};
use crate::model::CanonicalRecord;

/// All records sharing one entity identifier, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct Group<'a> {
    pub entity_id: &'a str,
    pub records: Vec<&'a CanonicalRecord>,
}

/// Partition records by exact entity identifier.
///
/// Groups come back in first-seen order. Records without a usable identifier
/// are reported to `sink` and left out of every group.
pub fn group_records<'a>(records: &'a [CanonicalRecord], sink: &mut dyn AuditSink) -> Vec<Group<'a>> {
    let mut groups: Vec<Group<'a>> = Vec::new();
    let mut index: HashMap<&'a str, usize> = HashMap::new();

    for (i, record) in records.iter().enumerate() {
        let entity_id = match record.entity_id.as_deref() {
            Some("") => {
                skip(sink, i, record, SkipReason::EmptyEntityId);
                continue;
            }
            Some(id) => id,
            None => {
                skip(sink, i, record, SkipReason::MissingEntityId);
                continue;
            }
        };

        let slot = *index.entry(entity_id).or_insert_with(|| {
            groups.push(Group {
                entity_id,
                records: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].records.push(record);
    }

    groups
}

fn skip(sink: &mut dyn AuditSink, index: usize, record: &CanonicalRecord, reason: SkipReason) {
    sink.record(AuditEvent::RecordSkipped {
        index,
        provider: record.provider.clone(),
        reason,
    });
}
