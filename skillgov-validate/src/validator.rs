use crate::rule_table::RuleTable;
use skillgov_core::{AgentSnapshot, Rejection, SkillProposal, WorldSnapshot};
use skillgov_registry::{AgentTypePolicy, SkillRegistry};

/// Everything a validator may read when judging one proposal. Borrowed for
/// the duration of one pipeline run; validators never mutate.
pub struct ValidationContext<'a> {
    pub proposal: &'a SkillProposal,
    pub agent: &'a AgentSnapshot,
    pub world: &'a WorldSnapshot,
    pub registry: &'a SkillRegistry,
    pub policy: &'a AgentTypePolicy,
    pub rule_table: &'a RuleTable,
}

/// One stage of the pipeline. `check` returns `None` to accept, or the
/// rejection, with its pedagogical message, to refuse. Validators are
/// pure and side-effect-free.
pub trait Validator: Send + Sync {
    fn name(&self) -> &'static str;
    fn check(&self, cx: &ValidationContext<'_>) -> Option<Rejection>;
}
