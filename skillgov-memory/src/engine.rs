use crate::event::{MemoryEvent, SalienceWeights};
use crate::human_centric::HumanCentricMemory;
use crate::importance::ImportanceMemory;
use crate::window::WindowMemory;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Configuration for one memory engine instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    pub engine: EngineKind,
    pub window_size: usize,
    pub salience_weights: BTreeMap<String, f64>,
    pub reflection_period: u64,
    /// Long-term pool admission threshold (human-centric engine).
    pub salience_threshold: f64,
    /// Long-term events returned per retrieval (human-centric engine).
    pub top_k_salient: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            engine: EngineKind::Window,
            window_size: 5,
            salience_weights: BTreeMap::new(),
            reflection_period: 10,
            salience_threshold: 2.0,
            top_k_salient: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    #[default]
    Window,
    Importance,
    HumanCentric,
}

/// A per-agent record-and-retrieve store behind the common contract.
///
/// The three variants are a discriminated union; each holds only its own
/// state. Retrieval is deterministic: the output is a pure function of the
/// recorded event sequence (ties rank by recency, never randomly).
///
/// Step-N events become visible at step N+1 because the simulator records
/// after the step's decisions finalize; the engine itself never reorders
/// writes.
#[derive(Debug, Clone)]
pub struct MemoryEngine {
    weights: SalienceWeights,
    variant: EngineVariant,
}

#[derive(Debug, Clone)]
enum EngineVariant {
    Window(WindowMemory),
    Importance(ImportanceMemory),
    HumanCentric(HumanCentricMemory),
}

impl MemoryEngine {
    pub fn from_config(config: &MemoryConfig) -> Self {
        let variant = match config.engine {
            EngineKind::Window => EngineVariant::Window(WindowMemory::new(config.window_size)),
            EngineKind::Importance => EngineVariant::Importance(ImportanceMemory::new()),
            EngineKind::HumanCentric => EngineVariant::HumanCentric(HumanCentricMemory::new(
                config.window_size,
                config.salience_threshold,
                config.top_k_salient,
                config.reflection_period,
            )),
        };
        Self {
            weights: SalienceWeights::new(config.salience_weights.clone()),
            variant,
        }
    }

    pub fn window(window_size: usize) -> Self {
        Self::from_config(&MemoryConfig {
            engine: EngineKind::Window,
            window_size,
            ..Default::default()
        })
    }

    /// Append one event. Total: never fails. Salience is computed here, at
    /// write time, from the configured tag weights; an event recorded with
    /// an explicit salience keeps it when no weights are configured.
    pub fn record(&mut self, mut event: MemoryEvent) {
        if !self.weights.is_empty() {
            event.salience = self.weights.score(&event.outcome_tags);
        }
        match &mut self.variant {
            EngineVariant::Window(inner) => inner.record(event),
            EngineVariant::Importance(inner) => inner.record(event),
            EngineVariant::HumanCentric(inner) => inner.record(event),
        }
    }

    /// The ≤ k events most useful for the current decision, in presentation
    /// order. Empty store returns an empty list; never fails.
    pub fn retrieve(&self, agent_id: &str, k: usize) -> Vec<MemoryEvent> {
        match &self.variant {
            EngineVariant::Window(inner) => inner.retrieve(agent_id, k),
            EngineVariant::Importance(inner) => inner.retrieve(agent_id, k),
            EngineVariant::HumanCentric(inner) => inner.retrieve(agent_id, k),
        }
    }

    /// Optional store rewrite (reflections, eviction). No-op for the window
    /// and importance engines.
    pub fn consolidate(&mut self, agent_id: &str, step: u64) {
        if let EngineVariant::HumanCentric(inner) = &mut self.variant {
            inner.consolidate(agent_id, step);
        }
    }
}
