use crate::validator::{ValidationContext, Validator};
use skillgov_core::Rejection;
use skillgov_registry::InstitutionalCheck;

/// Delegates to the registry's institutional check (once-only, cooldown,
/// quota, exclusivity).
pub struct Institutional;

impl Validator for Institutional {
    fn name(&self) -> &'static str {
        "institutional"
    }

    fn check(&self, cx: &ValidationContext<'_>) -> Option<Rejection> {
        match cx
            .registry
            .check_institutional(&cx.proposal.skill_id, cx.agent, cx.agent.step)
        {
            InstitutionalCheck::Ok => None,
            InstitutionalCheck::Violation(rejection) => Some(rejection),
        }
    }
}
