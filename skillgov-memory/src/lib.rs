//! Per-agent memory engines for SkillGov.
//!
//! One [`MemoryEngine`] instance per agent (no sharing), behind the common
//! `record` / `retrieve` / `consolidate` contract. Three variants:
//!
//! - **Window**: ring buffer of the last `W` events, newest-first retrieval
//! - **Importance**: retains everything, ranks by write-time salience
//! - **HumanCentric**: short-term window + salience-gated long-term pool +
//!   periodic consolidated reflections

pub mod engine;
pub mod event;
pub mod human_centric;
pub mod importance;
pub mod window;

pub use engine::{EngineKind, MemoryConfig, MemoryEngine};
pub use event::{MemoryEvent, SalienceWeights};
pub use human_centric::HumanCentricMemory;
pub use importance::ImportanceMemory;
pub use window::WindowMemory;
