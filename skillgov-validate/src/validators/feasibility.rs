use crate::validator::{ValidationContext, Validator};
use skillgov_core::{Rejection, RejectionKind};

/// Every precondition of the skill must hold against the current snapshots.
pub struct ContextFeasibility;

impl Validator for ContextFeasibility {
    fn name(&self) -> &'static str {
        "context_feasibility"
    }

    fn check(&self, cx: &ValidationContext<'_>) -> Option<Rejection> {
        let def = cx.registry.lookup(&cx.proposal.skill_id)?;
        let failing = def.failing_precondition(cx.agent, cx.world)?;
        Some(Rejection::new(
            RejectionKind::PreconditionFailed,
            format!(
                "`{}` is not feasible right now: requires {failing}",
                def.display_name
            ),
        ))
    }
}
