use crate::validator::{ValidationContext, Validator};
use skillgov_core::{Rejection, RejectionKind};

/// The proposed id must be registered and permitted for the agent's type.
pub struct Admissibility;

impl Validator for Admissibility {
    fn name(&self) -> &'static str {
        "admissibility"
    }

    fn check(&self, cx: &ValidationContext<'_>) -> Option<Rejection> {
        let skill_id = &cx.proposal.skill_id;
        let Some(def) = cx.registry.lookup(skill_id) else {
            let legal = cx.registry.legal_ids_for(&cx.agent.agent_type);
            return Some(Rejection::new(
                RejectionKind::UnknownSkill,
                format!(
                    "`{skill_id}` is not a skill you can choose; did you mean one of [{}]?",
                    legal.join(", ")
                ),
            ));
        };
        if !def.allowed_agent_types.contains(&cx.agent.agent_type) {
            return Some(Rejection::new(
                RejectionKind::ForbiddenForType,
                format!(
                    "`{skill_id}` is not available to agents of type `{}`",
                    cx.agent.agent_type
                ),
            ));
        }
        None
    }
}
