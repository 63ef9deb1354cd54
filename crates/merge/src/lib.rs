//! `cinemerge-merge`: deterministic multi-provider record merge engine.
//!
//! Pure engine crate: receives pre-loaded canonical records, returns one
//! merged record per entity plus the per-field decision stream.
//! No CLI or file IO dependencies.

pub mod audit;
pub mod config;
pub mod engine;
pub mod error;
pub mod group;
pub mod merger;
pub mod model;
pub mod resolve;
pub mod summary;

pub use audit::{AuditEvent, AuditSink, TracingSink};
pub use config::{FieldRule, MergeConfig, MergePolicy};
pub use engine::{MergeEngine, MergeRun};
pub use error::MergeError;
pub use model::{CanonicalRecord, FieldValue, MergedRecord};
pub use summary::MergeSummary;
