use serde::Serialize;

use crate::model::{Candidate, FieldValue, Reason};

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// One entry in the decision stream emitted during a merge run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuditEvent {
    /// A field resolved to a non-null value.
    FieldResolved {
        entity_id: String,
        field: String,
        value: FieldValue,
        provider: Option<String>,
        reason: Reason,
        /// Present only when providers disagreed on the value.
        #[serde(skip_serializing_if = "Option::is_none")]
        candidates: Option<Vec<Candidate>>,
    },
    /// An input record was dropped before grouping.
    RecordSkipped {
        index: usize,
        provider: Option<String>,
        reason: SkipReason,
    },
}

impl AuditEvent {
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::RecordSkipped { .. })
    }

    /// True for a field decision where providers offered different values.
    pub fn is_contested(&self) -> bool {
        matches!(self, Self::FieldResolved { candidates: Some(_), .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Identifier absent, null or not a string.
    MissingEntityId,
    EmptyEntityId,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingEntityId => write!(f, "missing entity id"),
            Self::EmptyEntityId => write!(f, "empty entity id"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

/// Receives audit events in emission order.
pub trait AuditSink {
    fn record(&mut self, event: AuditEvent);
}

impl AuditSink for Vec<AuditEvent> {
    fn record(&mut self, event: AuditEvent) {
        self.push(event);
    }
}

impl<S: AuditSink + ?Sized> AuditSink for &mut S {
    fn record(&mut self, event: AuditEvent) {
        (**self).record(event);
    }
}

/// Fan out: every event goes to both sinks, left first.
impl<A: AuditSink, B: AuditSink> AuditSink for (A, B) {
    fn record(&mut self, event: AuditEvent) {
        self.0.record(event.clone());
        self.1.record(event);
    }
}

/// Adapts a closure into a sink.
pub struct FnSink<F>(pub F);

impl<F: FnMut(AuditEvent)> AuditSink for FnSink<F> {
    fn record(&mut self, event: AuditEvent) {
        (self.0)(event);
    }
}

/// Renders events through `tracing`: skipped records at WARN, contested
/// fields at INFO, agreed fields at DEBUG.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl AuditSink for TracingSink {
    fn record(&mut self, event: AuditEvent) {
        match event {
            AuditEvent::RecordSkipped { index, provider, reason } => {
                tracing::warn!(
                    index,
                    provider = provider.as_deref().unwrap_or("-"),
                    %reason,
                    "skipping record"
                );
            }
            AuditEvent::FieldResolved {
                entity_id,
                field,
                value,
                provider,
                reason,
                candidates: Some(candidates),
            } => {
                let offered: Vec<String> = candidates
                    .iter()
                    .map(|c| format!("{}={}", c.provider.as_deref().unwrap_or("-"), c.value))
                    .collect();
                tracing::info!(
                    entity = %entity_id,
                    %field,
                    %value,
                    provider = provider.as_deref().unwrap_or("-"),
                    %reason,
                    candidates = %offered.join(", "),
                    "providers disagree"
                );
            }
            AuditEvent::FieldResolved {
                entity_id,
                field,
                value,
                provider,
                reason,
                candidates: None,
            } => {
                tracing::debug!(
                    entity = %entity_id,
                    %field,
                    %value,
                    provider = provider.as_deref().unwrap_or("-"),
                    %reason,
                    "field resolved"
                );
            }
        }
    }
}
