//! The SkillGov decision broker.
//!
//! [`SkillBroker::decide`] carries one agent decision through model
//! invocation, structured-output parsing, the validation pipeline, and the
//! pedagogical retry loop, then finalizes as approved, fallback, or
//! exhausted. Each decision emits exactly one audit record. Parse failures
//! and validation rejections spend separate retry budgets.

pub mod broker;
pub mod feedback;

pub use broker::{BrokerConfig, DecisionRequest, SkillBroker};
