use crate::validator::{ValidationContext, Validator};
use crate::validators::{
    Admissibility, Coherence, ContextFeasibility, EffectSafety, Institutional,
};
use serde::{Deserialize, Serialize};
use skillgov_core::{Rejection, ValidatorVerdict, VerdictStatus};
use tracing::debug;

/// Which validators a run enables. `Strict` is the full ordered chain;
/// `Disabled` runs none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GovernanceMode {
    #[default]
    Strict,
    Disabled,
}

/// Whether institutional violations reject the proposal or merely leave a
/// warning verdict in the audit. Some experiment configurations treat
/// institutional rules as advisory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstitutionalSeverity {
    #[default]
    Reject,
    Warn,
}

/// Result of one pipeline run: the ordered verdicts of every validator that
/// executed, plus the rejection that stopped the run, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutcome {
    pub verdicts: Vec<ValidatorVerdict>,
    pub rejection: Option<Rejection>,
}

impl PipelineOutcome {
    pub fn is_ok(&self) -> bool {
        self.rejection.is_none()
    }
}

/// The ordered validator chain. Runs sequentially, short-circuits on the
/// first rejection, and is pure: same proposal and snapshots, same verdict.
pub struct ValidationPipeline {
    validators: Vec<Box<dyn Validator>>,
    institutional_severity: InstitutionalSeverity,
}

impl ValidationPipeline {
    /// All five validators in their fixed order.
    pub fn strict() -> Self {
        Self {
            validators: vec![
                Box::new(Admissibility),
                Box::new(ContextFeasibility),
                Box::new(Institutional),
                Box::new(EffectSafety),
                Box::new(Coherence),
            ],
            institutional_severity: InstitutionalSeverity::Reject,
        }
    }

    /// No validators at all; every parsed proposal passes.
    pub fn disabled() -> Self {
        Self {
            validators: Vec::new(),
            institutional_severity: InstitutionalSeverity::Reject,
        }
    }

    pub fn for_mode(mode: GovernanceMode) -> Self {
        match mode {
            GovernanceMode::Strict => Self::strict(),
            GovernanceMode::Disabled => Self::disabled(),
        }
    }

    pub fn with_institutional_severity(mut self, severity: InstitutionalSeverity) -> Self {
        self.institutional_severity = severity;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    pub fn run(&self, cx: &ValidationContext<'_>) -> PipelineOutcome {
        let mut verdicts = Vec::with_capacity(self.validators.len());
        for validator in &self.validators {
            match validator.check(cx) {
                None => verdicts.push(ValidatorVerdict {
                    validator: validator.name().to_string(),
                    status: VerdictStatus::Ok,
                }),
                Some(rejection) => {
                    let warn_only = rejection.kind.is_institutional()
                        && self.institutional_severity == InstitutionalSeverity::Warn;
                    if warn_only {
                        debug!(
                            validator = validator.name(),
                            kind = ?rejection.kind,
                            "institutional violation downgraded to warning"
                        );
                        verdicts.push(ValidatorVerdict {
                            validator: validator.name().to_string(),
                            status: VerdictStatus::Warned { rejection },
                        });
                        continue;
                    }
                    debug!(
                        validator = validator.name(),
                        kind = ?rejection.kind,
                        skill_id = %cx.proposal.skill_id,
                        "proposal rejected"
                    );
                    verdicts.push(ValidatorVerdict {
                        validator: validator.name().to_string(),
                        status: VerdictStatus::Rejected {
                            rejection: rejection.clone(),
                        },
                    });
                    return PipelineOutcome {
                        verdicts,
                        rejection: Some(rejection),
                    };
                }
            }
        }
        PipelineOutcome {
            verdicts,
            rejection: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule_table::{RuleEntry, RuleTable};
    use serde_json::json;
    use skillgov_core::{
        AgentSnapshot, OrdinalLabel, RejectionKind, SkillProposal, WorldSnapshot,
    };
    use skillgov_registry::{
        AgentTypePolicy, DeclaredEffect, EffectBound, EffectKind, EffectOp, InstitutionalRule,
        Predicate, SkillDefinition, SkillRegistry,
    };
    fn registry() -> SkillRegistry {
        SkillRegistry::new(vec![
            SkillDefinition::new("elevate_house", "Elevate house")
                .for_agent_type("household_owner")
                .with_precondition(Predicate::is_false("elevated"))
                .with_constraint(InstitutionalRule::OnceOnly)
                .with_effect(DeclaredEffect::new("elevated", EffectKind::SetTrue)),
            SkillDefinition::new("buy_insurance", "Buy flood insurance")
                .for_agent_type("household_owner")
                .with_effect(DeclaredEffect::new(
                    "savings",
                    EffectKind::Delta { amount: -1200.0 },
                )),
            SkillDefinition::new("do_nothing", "Do nothing").for_agent_type("household_owner"),
        ])
        .unwrap()
    }

    fn policy() -> AgentTypePolicy {
        AgentTypePolicy::new("household_owner", "do_nothing")
            .with_dimension("TP")
            .with_dimension("CP")
            .allow_effect(
                "elevated",
                EffectBound {
                    kinds: [EffectOp::SetTrue].into_iter().collect(),
                    min: None,
                    max: None,
                },
            )
            .allow_effect(
                "savings",
                EffectBound {
                    kinds: [EffectOp::Delta].into_iter().collect(),
                    min: Some(-5000.0),
                    max: Some(0.0),
                },
            )
    }

    fn rule_table() -> RuleTable {
        RuleTable::new(vec![RuleEntry {
            labels: vec![OrdinalLabel::High, OrdinalLabel::High],
            allowed: ["elevate_house".to_string(), "buy_insurance".to_string()]
                .into_iter()
                .collect(),
        }])
    }

    fn proposal(skill_id: &str) -> SkillProposal {
        SkillProposal {
            skill_id: skill_id.to_string(),
            reasoning: [
                ("TP".to_string(), OrdinalLabel::High),
                ("CP".to_string(), OrdinalLabel::High),
            ]
            .into_iter()
            .collect(),
            confidence: 0.8,
            raw_payload: String::new(),
        }
    }

    fn agent() -> AgentSnapshot {
        AgentSnapshot::new("hh_1", "household_owner")
            .with_attribute("elevated", json!(false))
            .with_attribute("income", json!(80000))
            .with_step(3)
    }

    #[test]
    fn test_all_five_pass() {
        let registry = registry();
        let policy = policy();
        let table = rule_table();
        let agent = agent();
        let world = WorldSnapshot::new(3);
        let proposal = proposal("elevate_house");
        let outcome = ValidationPipeline::strict().run(&ValidationContext {
            proposal: &proposal,
            agent: &agent,
            world: &world,
            registry: &registry,
            policy: &policy,
            rule_table: &table,
        });
        assert!(outcome.is_ok());
        assert_eq!(outcome.verdicts.len(), 5);
        assert!(
            outcome
                .verdicts
                .iter()
                .all(|v| v.status == VerdictStatus::Ok)
        );
    }

    #[test]
    fn test_short_circuit_on_unknown_skill() {
        let registry = registry();
        let policy = policy();
        let table = rule_table();
        let agent = agent();
        let world = WorldSnapshot::new(3);
        let proposal = proposal("sell_house");
        let outcome = ValidationPipeline::strict().run(&ValidationContext {
            proposal: &proposal,
            agent: &agent,
            world: &world,
            registry: &registry,
            policy: &policy,
            rule_table: &table,
        });
        assert_eq!(outcome.verdicts.len(), 1);
        let rejection = outcome.rejection.unwrap();
        assert_eq!(rejection.kind, RejectionKind::UnknownSkill);
        assert!(rejection.message.contains("did you mean"));
    }

    #[test]
    fn test_incoherent_choice_rejected() {
        let registry = registry();
        let policy = policy();
        let table = rule_table();
        let agent = agent();
        let world = WorldSnapshot::new(3);
        let proposal = proposal("do_nothing");
        let outcome = ValidationPipeline::strict().run(&ValidationContext {
            proposal: &proposal,
            agent: &agent,
            world: &world,
            registry: &registry,
            policy: &policy,
            rule_table: &table,
        });
        assert_eq!(outcome.verdicts.len(), 5);
        assert_eq!(outcome.rejection.unwrap().kind, RejectionKind::Incoherent);
    }

    #[test]
    fn test_institutional_warn_mode_continues() {
        let registry = registry();
        let policy = policy();
        let table = rule_table();
        let mut agent = agent();
        agent.executed_once.insert("elevate_house".to_string());
        let world = WorldSnapshot::new(3);
        let proposal = proposal("elevate_house");

        let strict = ValidationPipeline::strict().run(&ValidationContext {
            proposal: &proposal,
            agent: &agent,
            world: &world,
            registry: &registry,
            policy: &policy,
            rule_table: &table,
        });
        assert_eq!(
            strict.rejection.as_ref().unwrap().kind,
            RejectionKind::AlreadyExecuted
        );

        let warned = ValidationPipeline::strict()
            .with_institutional_severity(InstitutionalSeverity::Warn)
            .run(&ValidationContext {
                proposal: &proposal,
                agent: &agent,
                world: &world,
                registry: &registry,
                policy: &policy,
                rule_table: &table,
            });
        assert!(warned.is_ok());
        assert!(warned.verdicts.iter().any(|v| matches!(
            v.status,
            VerdictStatus::Warned { .. }
        )));
    }

    #[test]
    fn test_unsafe_delta_bounds() {
        let registry = SkillRegistry::new(vec![
            SkillDefinition::new("buy_insurance", "Buy flood insurance")
                .for_agent_type("household_owner")
                .with_effect(DeclaredEffect::new(
                    "savings",
                    EffectKind::Delta { amount: -9000.0 },
                )),
        ])
        .unwrap();
        let policy = policy();
        let table = RuleTable::default();
        let agent = agent();
        let world = WorldSnapshot::new(3);
        let proposal = proposal("buy_insurance");
        let outcome = ValidationPipeline::strict().run(&ValidationContext {
            proposal: &proposal,
            agent: &agent,
            world: &world,
            registry: &registry,
            policy: &policy,
            rule_table: &table,
        });
        assert_eq!(outcome.rejection.unwrap().kind, RejectionKind::UnsafeEffect);
    }

    #[test]
    fn test_disabled_mode_runs_nothing() {
        let registry = registry();
        let policy = policy();
        let table = rule_table();
        let mut agent = agent();
        // Precondition fails, but no validator is enabled to notice.
        agent.attributes.insert("elevated".to_string(), json!(true));
        let world = WorldSnapshot::new(3);
        let proposal = proposal("elevate_house");
        let outcome =
            ValidationPipeline::for_mode(GovernanceMode::Disabled).run(&ValidationContext {
                proposal: &proposal,
                agent: &agent,
                world: &world,
                registry: &registry,
                policy: &policy,
                rule_table: &table,
            });
        assert!(outcome.is_ok());
        assert!(outcome.verdicts.is_empty());
    }

    #[test]
    fn test_pipeline_is_deterministic() {
        let registry = registry();
        let policy = policy();
        let table = rule_table();
        let agent = agent();
        let world = WorldSnapshot::new(3);
        let proposal = proposal("do_nothing");
        let run = || {
            ValidationPipeline::strict().run(&ValidationContext {
                proposal: &proposal,
                agent: &agent,
                world: &world,
                registry: &registry,
                policy: &policy,
                rule_table: &table,
            })
        };
        assert_eq!(run(), run());
    }
}
