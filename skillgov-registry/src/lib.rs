//! Declarative skill catalog for SkillGov.
//!
//! A [`SkillRegistry`] holds the frozen set of [`SkillDefinition`]s loaded at
//! startup: admissible agent types, feasibility preconditions, institutional
//! constraints (once-only, cooldown, quota, exclusivity), and declared
//! effects. Checks return verdict values; nothing in this crate raises on a
//! bad proposal.

pub mod definition;
pub mod registry;

pub use definition::{
    AgentTypePolicy, DeclaredEffect, EffectBound, EffectKind, EffectOp, InstitutionalRule,
    Predicate, PredicateOp, SkillDefinition,
};
pub use registry::{InstitutionalCheck, SkillRegistry};
