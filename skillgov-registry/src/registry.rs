use crate::definition::{InstitutionalRule, SkillDefinition};
use skillgov_core::{AgentSnapshot, GovError, Rejection, RejectionKind, Result};
use std::collections::BTreeMap;

/// Outcome of an institutional check. Purely functional: reasons, never
/// errors.
#[derive(Debug, Clone, PartialEq)]
pub enum InstitutionalCheck {
    Ok,
    Violation(Rejection),
}

impl InstitutionalCheck {
    pub fn is_ok(&self) -> bool {
        matches!(self, InstitutionalCheck::Ok)
    }
}

/// Read-only catalog of skill definitions, frozen after load.
///
/// Iteration order is catalog (declaration) order, which doubles as the
/// default presentation order of the prompt menu. Randomized presentation is
/// applied downstream with an explicit, audited seed.
#[derive(Debug, Clone, Default)]
pub struct SkillRegistry {
    order: Vec<String>,
    skills: BTreeMap<String, SkillDefinition>,
}

impl SkillRegistry {
    pub fn new(definitions: Vec<SkillDefinition>) -> Result<Self> {
        let mut order = Vec::with_capacity(definitions.len());
        let mut skills = BTreeMap::new();
        for def in definitions {
            if skills.contains_key(&def.skill_id) {
                return Err(GovError::Registry(format!(
                    "duplicate skill id: {}",
                    def.skill_id
                )));
            }
            order.push(def.skill_id.clone());
            skills.insert(def.skill_id.clone(), def);
        }
        Ok(Self { order, skills })
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn lookup(&self, skill_id: &str) -> Option<&SkillDefinition> {
        self.skills.get(skill_id)
    }

    /// Skills the given agent type may propose, in catalog order.
    pub fn skills_for(&self, agent_type: &str) -> Vec<&SkillDefinition> {
        self.order
            .iter()
            .filter_map(|id| self.skills.get(id))
            .filter(|def| def.allowed_agent_types.contains(agent_type))
            .collect()
    }

    /// Legal skill ids for an agent type, used in "did you mean" feedback.
    pub fn legal_ids_for(&self, agent_type: &str) -> Vec<String> {
        self.skills_for(agent_type)
            .into_iter()
            .map(|def| def.skill_id.clone())
            .collect()
    }

    /// Check every institutional constraint of `skill_id` against the
    /// agent's execution history at `step`.
    pub fn check_institutional(
        &self,
        skill_id: &str,
        agent: &AgentSnapshot,
        step: u64,
    ) -> InstitutionalCheck {
        let Some(def) = self.lookup(skill_id) else {
            return InstitutionalCheck::Violation(Rejection::new(
                RejectionKind::UnknownSkill,
                format!("`{skill_id}` is not a registered skill"),
            ));
        };

        for rule in &def.institutional_constraints {
            match rule {
                InstitutionalRule::OnceOnly => {
                    if agent.executed_once.contains(skill_id) {
                        return InstitutionalCheck::Violation(Rejection::new(
                            RejectionKind::AlreadyExecuted,
                            format!(
                                "`{}` can only be done once, and you have already done it",
                                def.display_name
                            ),
                        ));
                    }
                }
                InstitutionalRule::Cooldown { steps } => {
                    if let Some(last) = agent.last_step.get(skill_id) {
                        let elapsed = step.saturating_sub(*last);
                        if elapsed < *steps {
                            return InstitutionalCheck::Violation(Rejection::new(
                                RejectionKind::Cooldown,
                                format!(
                                    "`{}` needs {} steps between uses; only {} have passed",
                                    def.display_name, steps, elapsed
                                ),
                            ));
                        }
                    }
                }
                InstitutionalRule::AnnualLimit { limit } => {
                    let used = agent.count_in_window.get(skill_id).copied().unwrap_or(0);
                    if used >= *limit {
                        return InstitutionalCheck::Violation(Rejection::new(
                            RejectionKind::QuotaExhausted,
                            format!(
                                "`{}` is limited to {} uses per window and you have used {}",
                                def.display_name, limit, used
                            ),
                        ));
                    }
                }
                InstitutionalRule::ExclusiveWith { skills } => {
                    if let Some(conflict) =
                        skills.iter().find(|s| agent.executed_once.contains(*s))
                    {
                        return InstitutionalCheck::Violation(Rejection::new(
                            RejectionKind::Exclusivity,
                            format!(
                                "`{}` is exclusive with `{conflict}`, which you have already done",
                                def.display_name
                            ),
                        ));
                    }
                }
            }
        }

        InstitutionalCheck::Ok
    }
}
