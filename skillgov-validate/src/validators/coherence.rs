use crate::validator::{ValidationContext, Validator};
use skillgov_core::{OrdinalLabel, Rejection, RejectionKind};

/// Theory-grounded check: the appraisal tuple must map to a skill set that
/// contains the proposal, per the configured rule table.
///
/// Missing or invalid labels are replaced by the scale midpoint before the
/// query. An empty admissible set means only the agent type's default skill
/// passes. An empty table imposes no constraint.
pub struct Coherence;

impl Validator for Coherence {
    fn name(&self) -> &'static str {
        "coherence"
    }

    fn check(&self, cx: &ValidationContext<'_>) -> Option<Rejection> {
        if cx.rule_table.is_empty() {
            return None;
        }

        let tuple: Vec<OrdinalLabel> = cx
            .policy
            .cognitive_dimensions
            .iter()
            .map(|dim| {
                cx.proposal
                    .reasoning
                    .get(dim)
                    .copied()
                    .unwrap_or_else(OrdinalLabel::midpoint)
            })
            .collect();

        let allowed = cx.rule_table.admissible(&tuple)?;
        let skill_id = &cx.proposal.skill_id;

        if allowed.is_empty() {
            if skill_id == &cx.policy.default_skill {
                return None;
            }
            return Some(Rejection::new(
                RejectionKind::Incoherent,
                format!(
                    "with appraisal ({}), only `{}` is admissible",
                    render_tuple(&cx.policy.cognitive_dimensions, &tuple),
                    cx.policy.default_skill
                ),
            ));
        }

        if allowed.contains(skill_id) {
            return None;
        }
        let options: Vec<&str> = allowed.iter().map(String::as_str).collect();
        Some(Rejection::new(
            RejectionKind::Incoherent,
            format!(
                "your appraisal ({}) supports [{}], but you chose `{skill_id}`",
                render_tuple(&cx.policy.cognitive_dimensions, &tuple),
                options.join(", ")
            ),
        ))
    }
}

fn render_tuple(dimensions: &[String], tuple: &[OrdinalLabel]) -> String {
    dimensions
        .iter()
        .zip(tuple)
        .map(|(dim, label)| format!("{dim}: {label}"))
        .collect::<Vec<_>>()
        .join(", ")
}
