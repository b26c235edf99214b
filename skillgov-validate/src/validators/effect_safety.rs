use crate::validator::{ValidationContext, Validator};
use skillgov_core::{Rejection, RejectionKind};
use skillgov_registry::EffectKind;

/// Declared effects must stay inside the agent type's allowed mutation set,
/// and numeric deltas inside their declared bounds.
pub struct EffectSafety;

impl Validator for EffectSafety {
    fn name(&self) -> &'static str {
        "effect_safety"
    }

    fn check(&self, cx: &ValidationContext<'_>) -> Option<Rejection> {
        let def = cx.registry.lookup(&cx.proposal.skill_id)?;
        for effect in &def.declared_effects {
            let Some(bound) = cx.policy.allowed_effects.get(&effect.field) else {
                return Some(Rejection::new(
                    RejectionKind::UnsafeEffect,
                    format!(
                        "`{}` would change `{}`, which agents of type `{}` may not touch",
                        def.display_name, effect.field, cx.policy.agent_type
                    ),
                ));
            };
            if !bound.kinds.contains(&effect.kind.op()) {
                return Some(Rejection::new(
                    RejectionKind::UnsafeEffect,
                    format!(
                        "`{}` applies a disallowed mutation kind to `{}`",
                        def.display_name, effect.field
                    ),
                ));
            }
            if let EffectKind::Delta { amount } = &effect.kind {
                let below = bound.min.is_some_and(|min| *amount < min);
                let above = bound.max.is_some_and(|max| *amount > max);
                if below || above {
                    return Some(Rejection::new(
                        RejectionKind::UnsafeEffect,
                        format!(
                            "`{}` changes `{}` by {amount}, outside the declared bounds",
                            def.display_name, effect.field
                        ),
                    ));
                }
            }
        }
        None
    }
}
