use chrono::Utc;
use serde::{Deserialize, Serialize};
use skillgov_audit::{AttemptRecord, AuditRecord, AuditSink, prompt_hash};
use skillgov_context::{ContextBuilder, MenuEntry, ParseFailure, PromptInputs, parse_proposal};
use skillgov_core::{
    AgentSnapshot, Decision, DecisionOutcome, GovError, ModelAdapter, ModelRequest, ModelResponse,
    Rejection, RejectionKind, Result, SocialSignal, WorldSnapshot,
};
use skillgov_memory::MemoryEngine;
use skillgov_registry::{AgentTypePolicy, SkillRegistry};
use skillgov_validate::{
    GovernanceMode, InstitutionalSeverity, RuleTable, ValidationContext, ValidationPipeline,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::feedback;

/// Retry budgets and governance knobs for one broker instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Extra model calls allowed after a non-conforming output.
    pub max_parse_retries: u32,
    /// Extra model calls allowed after a validation rejection.
    pub max_validation_retries: u32,
    /// Per-attempt timeout; 0 disables it. Timeouts count as parse failures.
    pub model_timeout_ms: u64,
    /// Shuffle the prompt menu per agent per step (mitigates primacy bias).
    pub randomize_menu: bool,
    pub governance_mode: GovernanceMode,
    pub institutional_severity: InstitutionalSeverity,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            max_parse_retries: 2,
            max_validation_retries: 3,
            model_timeout_ms: 30_000,
            randomize_menu: false,
            governance_mode: GovernanceMode::Strict,
            institutional_severity: InstitutionalSeverity::Reject,
        }
    }
}

/// Read-only inputs for one decision. The broker holds no per-agent state;
/// everything it needs arrives here.
pub struct DecisionRequest<'a> {
    pub run_id: &'a str,
    pub agent: &'a AgentSnapshot,
    pub world: &'a WorldSnapshot,
    pub signals: &'a [SocialSignal],
    pub memory: &'a MemoryEngine,
    pub policy: &'a AgentTypePolicy,
    pub rule_table: &'a RuleTable,
    /// Base seed for this decision; menu ordering and per-attempt model
    /// seeds derive from it.
    pub seed: u64,
    /// Upper bound on retrieved memory events.
    pub memory_k: usize,
}

/// Drives one decision from prompt to terminal outcome:
///
/// ```text
/// build prompt -> invoke model -> parse
///   parse ok   -> validate -> approved | feedback+retry | fallback
///   parse fail -> hint+retry | exhausted
/// ```
///
/// Every terminal path emits exactly one audit record before returning, and
/// the model invocation is the only await point. With a deterministic
/// backend and fixed seeds, `decide` is bit-identical across replays.
pub struct SkillBroker {
    registry: Arc<SkillRegistry>,
    model: Arc<dyn ModelAdapter>,
    builder: ContextBuilder,
    pipeline: ValidationPipeline,
    config: BrokerConfig,
}

impl SkillBroker {
    pub fn new(
        registry: Arc<SkillRegistry>,
        model: Arc<dyn ModelAdapter>,
        config: BrokerConfig,
    ) -> Self {
        let pipeline = ValidationPipeline::for_mode(config.governance_mode)
            .with_institutional_severity(config.institutional_severity);
        Self {
            registry,
            model,
            builder: ContextBuilder::default(),
            pipeline,
            config,
        }
    }

    /// Replace the default context builder (e.g. for ablation runs).
    pub fn with_builder(mut self, builder: ContextBuilder) -> Self {
        self.builder = builder;
        self
    }

    /// Replace the validator chain (custom orderings or subsets).
    pub fn with_pipeline(mut self, pipeline: ValidationPipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub async fn decide(
        &self,
        req: &DecisionRequest<'_>,
        audit: &mut dyn AuditSink,
    ) -> Result<Decision> {
        let memory_slice = req.memory.retrieve(&req.agent.agent_id, req.memory_k);
        let skills = self.registry.skills_for(&req.agent.agent_type);
        let menu_seed = self.config.randomize_menu.then_some(req.seed);
        let payload = self.builder.build(
            &PromptInputs {
                agent: req.agent,
                world: req.world,
                signals: req.signals,
                memory: &memory_slice,
                skills: &skills,
                dimensions: &req.policy.cognitive_dimensions,
            },
            menu_seed,
        );

        // When the menu collapses to the default there is nothing for the
        // model to decide: approve the default without any invocation.
        if !self.pipeline.is_empty() && self.only_default_actionable(&payload.menu, req) {
            debug!(
                agent_id = %req.agent.agent_id,
                default = %req.policy.default_skill,
                "menu collapsed to default; skipping model invocation"
            );
            return self.finalize(
                req,
                audit,
                Vec::new(),
                Some(req.policy.default_skill.clone()),
                DecisionOutcome::Approved,
                menu_seed,
            );
        }

        let mut prompt = payload.text.clone();
        let mut attempts: Vec<AttemptRecord> = Vec::new();
        let mut parse_failures = 0u32;
        let mut validation_failures = 0u32;

        loop {
            let attempt_seed = req.seed.wrapping_add(attempts.len() as u64);
            let hash = prompt_hash(&prompt);
            let request = ModelRequest::new(prompt.clone(), payload.schema.clone(), attempt_seed);

            let parse_result = match self.invoke_with_timeout(request).await {
                Ok(resp) => {
                    let parsed = parse_proposal(&resp.text, &req.policy.cognitive_dimensions);
                    (resp.text, parsed)
                }
                Err(err) if err.is_backend_failure() => {
                    warn!(error = %err, "backend failure; counted against the parse budget");
                    (
                        String::new(),
                        Err(ParseFailure {
                            message: format!("the backend failed ({err})"),
                        }),
                    )
                }
                Err(err) => return Err(err),
            };

            match parse_result {
                (raw_output, Err(failure)) => {
                    let hint = feedback::parse_hint(&failure.message);
                    attempts.push(AttemptRecord {
                        prompt_hash: hash,
                        raw_output,
                        parsed_proposal: None,
                        validator_verdicts: Vec::new(),
                        pedagogical_message: Some(hint.clone()),
                    });
                    parse_failures += 1;
                    if parse_failures > self.config.max_parse_retries {
                        return self.finalize(
                            req,
                            audit,
                            attempts,
                            None,
                            DecisionOutcome::Exhausted,
                            menu_seed,
                        );
                    }
                    prompt.push_str("\n\n");
                    prompt.push_str(&hint);
                }
                (raw_output, Ok(proposal)) => {
                    let outcome = self.pipeline.run(&ValidationContext {
                        proposal: &proposal,
                        agent: req.agent,
                        world: req.world,
                        registry: &self.registry,
                        policy: req.policy,
                        rule_table: req.rule_table,
                    });
                    // A finalized decision must reference a registered skill
                    // even when every validator is disabled.
                    let rejection = outcome.rejection.clone().or_else(|| {
                        if self.pipeline.is_empty()
                            && self.registry.lookup(&proposal.skill_id).is_none()
                        {
                            Some(Rejection::new(
                                RejectionKind::UnknownSkill,
                                format!(
                                    "`{}` is not a skill you can choose; legal options are [{}]",
                                    proposal.skill_id,
                                    self.registry
                                        .legal_ids_for(&req.agent.agent_type)
                                        .join(", ")
                                ),
                            ))
                        } else {
                            None
                        }
                    });

                    match rejection {
                        None => {
                            let skill_id = proposal.skill_id.clone();
                            attempts.push(AttemptRecord {
                                prompt_hash: hash,
                                raw_output,
                                parsed_proposal: Some(proposal),
                                validator_verdicts: outcome.verdicts,
                                pedagogical_message: None,
                            });
                            return self.finalize(
                                req,
                                audit,
                                attempts,
                                Some(skill_id),
                                DecisionOutcome::Approved,
                                menu_seed,
                            );
                        }
                        Some(rejection) => {
                            attempts.push(AttemptRecord {
                                prompt_hash: hash,
                                raw_output,
                                parsed_proposal: Some(proposal),
                                validator_verdicts: outcome.verdicts,
                                pedagogical_message: Some(rejection.message.clone()),
                            });
                            validation_failures += 1;
                            if validation_failures > self.config.max_validation_retries {
                                return self.finalize_fallback(req, audit, attempts, menu_seed);
                            }
                            let block =
                                feedback::validation_feedback(&rejection.message, &payload.menu);
                            prompt.push_str("\n\n");
                            prompt.push_str(&block);
                        }
                    }
                }
            }
        }
    }

    async fn invoke_with_timeout(&self, request: ModelRequest) -> Result<ModelResponse> {
        if self.config.model_timeout_ms == 0 {
            return self.model.invoke(request).await;
        }
        let budget = Duration::from_millis(self.config.model_timeout_ms);
        match tokio::time::timeout(budget, self.model.invoke(request)).await {
            Ok(result) => result,
            Err(_) => Err(GovError::BackendTimeout(self.config.model_timeout_ms)),
        }
    }

    /// True when the default skill is the only menu entry that is both
    /// precondition-feasible and institutionally clear. Under warn-only
    /// institutional severity the institutional filter does not apply.
    fn only_default_actionable(&self, menu: &[MenuEntry], req: &DecisionRequest<'_>) -> bool {
        let enforce_institutional =
            self.config.institutional_severity == InstitutionalSeverity::Reject;
        let actionable: Vec<&str> = menu
            .iter()
            .filter(|entry| entry.is_feasible())
            .filter(|entry| {
                !enforce_institutional
                    || self
                        .registry
                        .check_institutional(&entry.skill_id, req.agent, req.agent.step)
                        .is_ok()
            })
            .map(|entry| entry.skill_id.as_str())
            .collect();
        actionable.len() == 1 && actionable[0] == req.policy.default_skill
    }

    /// Validation retries exhausted: fall back to the agent type's default
    /// skill, unless even that fails institutional checks.
    fn finalize_fallback(
        &self,
        req: &DecisionRequest<'_>,
        audit: &mut dyn AuditSink,
        attempts: Vec<AttemptRecord>,
        menu_seed: Option<u64>,
    ) -> Result<Decision> {
        let default = &req.policy.default_skill;
        let default_ok = self.registry.lookup(default).is_some()
            && self
                .registry
                .check_institutional(default, req.agent, req.agent.step)
                .is_ok();
        if default_ok {
            self.finalize(
                req,
                audit,
                attempts,
                Some(default.clone()),
                DecisionOutcome::Fallback,
                menu_seed,
            )
        } else {
            warn!(
                agent_id = %req.agent.agent_id,
                default = %default,
                "default skill infeasible; decision exhausted with no action"
            );
            self.finalize(
                req,
                audit,
                attempts,
                None,
                DecisionOutcome::Exhausted,
                menu_seed,
            )
        }
    }

    fn finalize(
        &self,
        req: &DecisionRequest<'_>,
        audit: &mut dyn AuditSink,
        attempts: Vec<AttemptRecord>,
        final_skill_id: Option<String>,
        outcome: DecisionOutcome,
        menu_seed: Option<u64>,
    ) -> Result<Decision> {
        let retry_count = attempts.len().saturating_sub(1) as u32;
        let record = AuditRecord {
            run_id: req.run_id.to_string(),
            step: req.agent.step,
            agent_id: req.agent.agent_id.clone(),
            agent_type: req.agent.agent_type.clone(),
            attempts,
            final_skill_id: final_skill_id.clone(),
            retry_count,
            outcome,
            timestamp: Utc::now(),
            menu_seed,
        };
        let audit_handle = audit.append(&record)?;
        info!(
            agent_id = %req.agent.agent_id,
            step = req.agent.step,
            outcome = outcome.as_str(),
            skill = final_skill_id.as_deref().unwrap_or("-"),
            retries = retry_count,
            "decision finalized"
        );
        Ok(Decision {
            final_skill_id,
            retry_count,
            outcome,
            audit_handle,
        })
    }
}
