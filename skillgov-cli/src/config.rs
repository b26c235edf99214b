use serde::Deserialize;
use skillgov_broker::BrokerConfig;
use skillgov_core::{GovError, Result};
use skillgov_memory::MemoryConfig;
use skillgov_registry::{AgentTypePolicy, EffectBound, SkillDefinition, SkillRegistry};
use skillgov_validate::{RuleEntry, RuleTable};
use std::collections::BTreeMap;
use std::path::Path;

/// Top-level runner configuration, loaded from one TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct RunnerConfig {
    #[serde(default)]
    pub broker: BrokerConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    /// The full skill catalog.
    pub skills: Vec<SkillDefinition>,
    /// Per-type governance policy keyed by agent-type tag.
    pub agent_types: BTreeMap<String, AgentTypeConfig>,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentTypeConfig {
    pub default_skill: String,
    #[serde(default)]
    pub cognitive_dimensions: Vec<String>,
    #[serde(default)]
    pub allowed_effects: BTreeMap<String, EffectBound>,
    #[serde(default)]
    pub coherence_rules: Vec<RuleEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub steps: u64,
    pub memory_k: usize,
    /// Static world attributes visible to every decision.
    pub world: BTreeMap<String, serde_json::Value>,
    pub agents: Vec<AgentSeed>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            steps: 10,
            memory_k: 5,
            world: BTreeMap::new(),
            agents: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentSeed {
    pub agent_id: String,
    pub agent_type: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl RunnerConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: RunnerConfig = toml::from_str(&raw)
            .map_err(|e| GovError::Config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Cross-reference checks that make a broken experiment fail at load
    /// rather than mid-run.
    pub fn validate(&self) -> Result<()> {
        let known_skill = |id: &str| self.skills.iter().any(|s| s.skill_id == id);

        for (type_tag, type_config) in &self.agent_types {
            if !known_skill(&type_config.default_skill) {
                return Err(GovError::Config(format!(
                    "agent type `{type_tag}` has unknown default skill `{}`",
                    type_config.default_skill
                )));
            }
            for entry in &type_config.coherence_rules {
                if entry.labels.len() != type_config.cognitive_dimensions.len() {
                    return Err(GovError::Config(format!(
                        "agent type `{type_tag}` declares {} dimensions but a coherence rule \
                         carries {} labels",
                        type_config.cognitive_dimensions.len(),
                        entry.labels.len()
                    )));
                }
                if let Some(unknown) = entry.allowed.iter().find(|id| !known_skill(id)) {
                    return Err(GovError::Config(format!(
                        "agent type `{type_tag}` coherence rule allows unknown skill `{unknown}`"
                    )));
                }
            }
        }

        for agent in &self.simulation.agents {
            if !self.agent_types.contains_key(&agent.agent_type) {
                return Err(GovError::Config(format!(
                    "agent `{}` has undeclared type `{}`",
                    agent.agent_id, agent.agent_type
                )));
            }
        }

        Ok(())
    }

    pub fn build_registry(&self) -> Result<SkillRegistry> {
        SkillRegistry::new(self.skills.clone())
    }

    /// Materialize the policy and rule table for one agent type.
    pub fn policy_for(&self, agent_type: &str) -> Option<(AgentTypePolicy, RuleTable)> {
        let type_config = self.agent_types.get(agent_type)?;
        let mut policy = AgentTypePolicy::new(agent_type, &type_config.default_skill);
        policy.cognitive_dimensions = type_config.cognitive_dimensions.clone();
        policy.allowed_effects = type_config.allowed_effects.clone();
        let table = RuleTable::new(type_config.coherence_rules.clone());
        Some((policy, table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEMO: &str = r#"
        [broker]
        max_parse_retries = 1
        max_validation_retries = 2

        [memory]
        engine = "importance"
        window_size = 4
        salience_weights = { flood_occurred = 2.0 }

        [[skills]]
        skill_id = "elevate_house"
        display_name = "Elevate house"
        allowed_agent_types = ["household_owner"]
        preconditions = [{ field = "elevated", op = "is_false" }]
        institutional_constraints = [{ rule = "once_only" }]
        declared_effects = [{ field = "elevated", kind = { kind = "set_true" } }]

        [[skills]]
        skill_id = "do_nothing"
        display_name = "Do nothing"
        allowed_agent_types = ["household_owner"]

        [agent_types.household_owner]
        default_skill = "do_nothing"
        cognitive_dimensions = ["TP", "CP"]
        coherence_rules = [{ labels = ["H", "H"], allowed = ["elevate_house"] }]

        [agent_types.household_owner.allowed_effects.elevated]
        kinds = ["set_true"]

        [simulation]
        steps = 3
        agents = [{ agent_id = "hh_1", agent_type = "household_owner", attributes = { elevated = false } }]
    "#;

    #[test]
    fn test_parse_demo_config() {
        let config: RunnerConfig = toml::from_str(DEMO).unwrap();
        config.validate().unwrap();
        assert_eq!(config.broker.max_validation_retries, 2);
        assert_eq!(config.skills.len(), 2);
        let (policy, table) = config.policy_for("household_owner").unwrap();
        assert_eq!(policy.default_skill, "do_nothing");
        assert!(!table.is_empty());
        assert_eq!(config.simulation.agents[0].agent_id, "hh_1");
    }

    #[test]
    fn test_unknown_default_skill_fails_validation() {
        let broken = DEMO.replace("default_skill = \"do_nothing\"", "default_skill = \"flee\"");
        let config: RunnerConfig = toml::from_str(&broken).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_arity_mismatch_fails_validation() {
        let broken = DEMO.replace(
            "coherence_rules = [{ labels = [\"H\", \"H\"], allowed = [\"elevate_house\"] }]",
            "coherence_rules = [{ labels = [\"H\"], allowed = [\"elevate_house\"] }]",
        );
        let config: RunnerConfig = toml::from_str(&broken).unwrap();
        assert!(config.validate().is_err());
    }
}
