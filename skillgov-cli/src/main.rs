//! Reference runner: loads a TOML experiment configuration, drives the
//! broker over a toy simulator loop, and writes the audit trail.

mod config;
mod sim;

use anyhow::{Context, bail};
use clap::Parser;
use config::RunnerConfig;
use sim::SimAgent;
use skillgov_audit::JsonlAuditWriter;
use skillgov_broker::{DecisionRequest, SkillBroker};
use skillgov_core::{DecisionOutcome, ModelAdapter, WorldSnapshot};
use skillgov_memory::{EngineKind, MemoryEngine, MemoryEvent};
use skillgov_model::{ConstantModel, ReplayModel, ScriptedModel};
use skillgov_validate::GovernanceMode;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "skillgov", about = "Governed agent decisions over a toy simulator loop")]
struct Cli {
    /// Experiment configuration (TOML).
    #[arg(long)]
    config: PathBuf,

    /// Model backend: `constant[:skill_id]`, `scripted:<path>` (one output
    /// per line), or `replay:<audit.jsonl>`.
    #[arg(long, default_value = "constant")]
    model: String,

    /// `strict` enables all validators; `disabled` enables none.
    #[arg(long, default_value = "strict")]
    governance_mode: String,

    /// Override the configured memory engine:
    /// `window` | `importance` | `human_centric`.
    #[arg(long)]
    memory_engine: Option<String>,

    /// Base seed for menu ordering and model invocation.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Directory receiving `audit.jsonl`.
    #[arg(long, default_value = "out")]
    output_dir: PathBuf,

    /// Override the configured number of simulation steps.
    #[arg(long)]
    steps: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let mut config = RunnerConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;

    config.broker.governance_mode = match cli.governance_mode.as_str() {
        "strict" => GovernanceMode::Strict,
        "disabled" => GovernanceMode::Disabled,
        other => bail!("unknown governance mode `{other}`"),
    };
    if let Some(engine) = &cli.memory_engine {
        config.memory.engine = match engine.as_str() {
            "window" => EngineKind::Window,
            "importance" => EngineKind::Importance,
            "human_centric" => EngineKind::HumanCentric,
            other => bail!("unknown memory engine `{other}`"),
        };
    }
    let steps = cli.steps.unwrap_or(config.simulation.steps);

    let registry = Arc::new(config.build_registry()?);
    let model = build_model(&cli.model, &config)?;
    let broker = SkillBroker::new(registry.clone(), model, config.broker.clone());

    let mut policies = BTreeMap::new();
    for type_tag in config.agent_types.keys() {
        let (policy, table) = config
            .policy_for(type_tag)
            .expect("agent type present by construction");
        policies.insert(type_tag.clone(), (policy, table));
    }

    std::fs::create_dir_all(&cli.output_dir)?;
    let audit_path = cli.output_dir.join("audit.jsonl");
    let mut audit = JsonlAuditWriter::create(&audit_path)?;

    let run_id = format!("run-{}", uuid::Uuid::new_v4());
    info!(run_id, steps, agents = config.simulation.agents.len(), "starting run");

    let mut agents: Vec<SimAgent> = config
        .simulation
        .agents
        .iter()
        .map(SimAgent::from_seed)
        .collect();
    let mut memories: BTreeMap<String, MemoryEngine> = agents
        .iter()
        .map(|a| {
            (
                a.agent_id.clone(),
                MemoryEngine::from_config(&config.memory),
            )
        })
        .collect();

    let mut approved_count = 0u64;
    let mut fallback_count = 0u64;
    let mut exhausted_count = 0u64;

    for step in 1..=steps {
        let mut world = WorldSnapshot::new(step);
        world.attributes = config.simulation.world.clone();

        for agent in &mut agents {
            let (policy, rule_table) = &policies[&agent.agent_type];
            let snapshot = agent.snapshot(step);
            let memory = memories
                .get(&agent.agent_id)
                .expect("one engine per agent");

            let decision = broker
                .decide(
                    &DecisionRequest {
                        run_id: &run_id,
                        agent: &snapshot,
                        world: &world,
                        signals: &[],
                        memory,
                        policy,
                        rule_table,
                        seed: decision_seed(cli.seed, &agent.agent_id, step),
                        memory_k: config.simulation.memory_k,
                    },
                    &mut audit,
                )
                .await?;

            match decision.outcome {
                DecisionOutcome::Approved => approved_count += 1,
                DecisionOutcome::Fallback => fallback_count += 1,
                DecisionOutcome::Exhausted => exhausted_count += 1,
            }

            // Execute the skill and remember the outcome. An exhausted
            // decision advances the agent with no action and no memory.
            if let Some(skill_id) = &decision.final_skill_id {
                let def = registry
                    .lookup(skill_id)
                    .expect("finalized skills are registered");
                let mut tags = agent.execute(def, step);
                for (key, value) in &world.attributes {
                    if value.as_bool() == Some(true) {
                        tags.insert(key.clone());
                    }
                }
                let mut event = MemoryEvent::new(step, &agent.agent_id, skill_id);
                event.outcome_tags = tags;
                memories
                    .get_mut(&agent.agent_id)
                    .expect("one engine per agent")
                    .record(event);
            }
        }

        for agent in &agents {
            memories
                .get_mut(&agent.agent_id)
                .expect("one engine per agent")
                .consolidate(&agent.agent_id, step);
        }
    }

    info!(
        approved = approved_count,
        fallback = fallback_count,
        exhausted = exhausted_count,
        audit = %audit_path.display(),
        "run complete"
    );
    println!(
        "run {run_id}: {approved_count} approved, {fallback_count} fallback, \
         {exhausted_count} exhausted -> {}",
        audit_path.display()
    );

    Ok(())
}

fn build_model(spec: &str, config: &RunnerConfig) -> anyhow::Result<Arc<dyn ModelAdapter>> {
    if let Some(path) = spec.strip_prefix("scripted:") {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading script {path}"))?;
        let mut model = ScriptedModel::new("scripted");
        for line in raw.lines().filter(|l| !l.trim().is_empty()) {
            model = model.with_text(line);
        }
        return Ok(Arc::new(model));
    }
    if let Some(path) = spec.strip_prefix("replay:") {
        return Ok(Arc::new(ReplayModel::from_audit_file(path)?));
    }
    if let Some(skill_id) = spec.strip_prefix("constant:") {
        return Ok(Arc::new(ConstantModel::new(skill_id)));
    }
    if spec == "constant" {
        // Bare `constant` proposes the first agent type's default skill.
        let skill_id = config
            .agent_types
            .values()
            .next()
            .map(|t| t.default_skill.clone())
            .context("config declares no agent types")?;
        return Ok(Arc::new(ConstantModel::new(skill_id)));
    }
    bail!("unknown model spec `{spec}`")
}

/// Per-agent-per-step decision seed: two agents at the same step see
/// different menu orders, while a rerun with the same base seed is
/// identical.
fn decision_seed(base: u64, agent_id: &str, step: u64) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in agent_id.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash ^ base ^ step.wrapping_mul(0x9e3779b97f4a7c15)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_seed_varies_by_agent_and_step() {
        let a1 = decision_seed(0, "hh_1", 3);
        let a2 = decision_seed(0, "hh_2", 3);
        let a1_next = decision_seed(0, "hh_1", 4);
        assert_ne!(a1, a2);
        assert_ne!(a1, a1_next);
        assert_eq!(a1, decision_seed(0, "hh_1", 3));
    }
}
