//! Ordered validation pipeline for SkillGov proposals.
//!
//! Five validators run in a fixed sequence (admissibility, context
//! feasibility, institutional constraint, effect safety, coherence) and
//! short-circuit on the first rejection. Every rejection carries a
//! pedagogical message that flows back into the retry prompt and the audit
//! trail. The pipeline is pure and side-effect-free.

pub mod pipeline;
pub mod rule_table;
pub mod validator;
pub mod validators;

pub use pipeline::{GovernanceMode, InstitutionalSeverity, PipelineOutcome, ValidationPipeline};
pub use rule_table::{RuleEntry, RuleTable};
pub use validator::{ValidationContext, Validator};
pub use validators::{Admissibility, Coherence, ContextFeasibility, EffectSafety, Institutional};
