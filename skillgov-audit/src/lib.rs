//! Append-only audit trail for SkillGov decisions.
//!
//! One [`AuditRecord`] per decision, flushed synchronously at the decision
//! boundary. Records are newline-delimited JSON with the fixed key set of
//! the integration contract; [`read_records`] loads them back for replay
//! and post-hoc analysis.

pub mod record;
pub mod writer;

pub use record::{AttemptRecord, AuditRecord, prompt_hash};
pub use writer::{AuditSink, JsonlAuditWriter, MemoryAuditWriter, read_records};
