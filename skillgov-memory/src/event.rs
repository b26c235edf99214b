use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One finalized decision and its outcome, as remembered by an agent.
/// Immutable after write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEvent {
    pub step: u64,
    pub agent_id: String,
    pub skill_id: String,
    /// Domain-defined outcome tags (e.g. `flood_occurred`,
    /// `insurance_paid_out`, `demand_curtailed`).
    #[serde(default)]
    pub outcome_tags: BTreeSet<String>,
    /// Importance score computed at write time.
    pub salience: f64,
    /// Consolidated free-text summary; produced only by the human-centric
    /// engine's reflection pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reflection: Option<String>,
}

impl MemoryEvent {
    pub fn new(step: u64, agent_id: impl Into<String>, skill_id: impl Into<String>) -> Self {
        Self {
            step,
            agent_id: agent_id.into(),
            skill_id: skill_id.into(),
            outcome_tags: BTreeSet::new(),
            salience: 0.0,
            reflection: None,
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.outcome_tags.insert(tag.into());
        self
    }

    pub fn with_salience(mut self, salience: f64) -> Self {
        self.salience = salience;
        self
    }

    pub fn is_reflection(&self) -> bool {
        self.reflection.is_some()
    }

    /// One-line rendering for the prompt's memory section.
    pub fn render(&self) -> String {
        if let Some(text) = &self.reflection {
            return format!("[step {}] reflection: {}", self.step, text);
        }
        if self.outcome_tags.is_empty() {
            format!("[step {}] did `{}`", self.step, self.skill_id)
        } else {
            let tags: Vec<&str> = self.outcome_tags.iter().map(String::as_str).collect();
            format!(
                "[step {}] did `{}` ({})",
                self.step,
                self.skill_id,
                tags.join(", ")
            )
        }
    }
}

/// Weighted sum of domain-declared signal tags, e.g.
/// `flood_occurred -> +2.0`, `adaptation_executed -> +1.5`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SalienceWeights {
    #[serde(default)]
    pub weights: BTreeMap<String, f64>,
}

impl SalienceWeights {
    pub fn new(weights: BTreeMap<String, f64>) -> Self {
        Self { weights }
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn score(&self, tags: &BTreeSet<String>) -> f64 {
        tags.iter()
            .filter_map(|tag| self.weights.get(tag))
            .sum()
    }
}
