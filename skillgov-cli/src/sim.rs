use crate::config::AgentSeed;
use skillgov_core::AgentSnapshot;
use skillgov_registry::{EffectKind, InstitutionalRule, SkillDefinition};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Mutable agent state owned by the toy simulator. The broker only ever
/// sees read-only snapshots of this.
#[derive(Debug, Clone)]
pub struct SimAgent {
    pub agent_id: String,
    pub agent_type: String,
    pub attributes: BTreeMap<String, serde_json::Value>,
    pub executed_once: BTreeSet<String>,
    pub last_step: BTreeMap<String, u64>,
    pub count_in_window: BTreeMap<String, u32>,
}

impl SimAgent {
    pub fn from_seed(seed: &AgentSeed) -> Self {
        Self {
            agent_id: seed.agent_id.clone(),
            agent_type: seed.agent_type.clone(),
            attributes: seed.attributes.clone(),
            executed_once: BTreeSet::new(),
            last_step: BTreeMap::new(),
            count_in_window: BTreeMap::new(),
        }
    }

    pub fn snapshot(&self, step: u64) -> AgentSnapshot {
        AgentSnapshot {
            agent_id: self.agent_id.clone(),
            agent_type: self.agent_type.clone(),
            attributes: self.attributes.clone(),
            executed_once: self.executed_once.clone(),
            last_step: self.last_step.clone(),
            count_in_window: self.count_in_window.clone(),
            step,
        }
    }

    /// Apply the skill's declared effects and update execution bookkeeping.
    /// Returns the outcome tags for the memory event.
    pub fn execute(&mut self, def: &SkillDefinition, step: u64) -> BTreeSet<String> {
        let mut tags = BTreeSet::new();

        for effect in &def.declared_effects {
            match &effect.kind {
                EffectKind::SetTrue => {
                    self.attributes
                        .insert(effect.field.clone(), serde_json::Value::Bool(true));
                }
                EffectKind::SetFalse => {
                    self.attributes
                        .insert(effect.field.clone(), serde_json::Value::Bool(false));
                }
                EffectKind::Delta { amount } => {
                    let current = self
                        .attributes
                        .get(&effect.field)
                        .and_then(serde_json::Value::as_f64)
                        .unwrap_or(0.0);
                    self.attributes.insert(
                        effect.field.clone(),
                        serde_json::json!(current + amount),
                    );
                }
                EffectKind::Replace { value } => {
                    self.attributes.insert(effect.field.clone(), value.clone());
                }
            }
            tags.insert(format!("changed_{}", effect.field));
        }

        if def.declared_effects.is_empty() {
            tags.insert("no_action".to_string());
        } else {
            tags.insert("action_taken".to_string());
        }

        if def
            .institutional_constraints
            .iter()
            .any(|r| matches!(r, InstitutionalRule::OnceOnly))
        {
            self.executed_once.insert(def.skill_id.clone());
        }
        self.last_step.insert(def.skill_id.clone(), step);
        *self
            .count_in_window
            .entry(def.skill_id.clone())
            .or_insert(0) += 1;

        debug!(
            agent_id = %self.agent_id,
            skill = %def.skill_id,
            step,
            "executed skill effects"
        );
        tags
    }
}
