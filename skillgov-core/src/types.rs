use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One level of the closed five-point ordinal scale used by the
/// cognitive-appraisal vocabulary.
///
/// The scale is fixed; which *dimensions* carry a label is declared per
/// experiment in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OrdinalLabel {
    #[serde(rename = "VL")]
    VeryLow,
    #[serde(rename = "L")]
    Low,
    #[serde(rename = "M")]
    Medium,
    #[serde(rename = "H")]
    High,
    #[serde(rename = "VH")]
    VeryHigh,
}

impl OrdinalLabel {
    /// Position on the scale, `0..=4`.
    pub fn rank(self) -> u8 {
        match self {
            OrdinalLabel::VeryLow => 0,
            OrdinalLabel::Low => 1,
            OrdinalLabel::Medium => 2,
            OrdinalLabel::High => 3,
            OrdinalLabel::VeryHigh => 4,
        }
    }

    /// The scale midpoint, substituted for invalid or missing labels.
    pub fn midpoint() -> Self {
        OrdinalLabel::Medium
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrdinalLabel::VeryLow => "VL",
            OrdinalLabel::Low => "L",
            OrdinalLabel::Medium => "M",
            OrdinalLabel::High => "H",
            OrdinalLabel::VeryHigh => "VH",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "VL" => Some(OrdinalLabel::VeryLow),
            "L" => Some(OrdinalLabel::Low),
            "M" => Some(OrdinalLabel::Medium),
            "H" => Some(OrdinalLabel::High),
            "VH" => Some(OrdinalLabel::VeryHigh),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrdinalLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only view of one agent at one step. Owned by the external simulator;
/// the core never mutates it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub agent_id: String,
    pub agent_type: String,
    /// Open-schema domain attributes (income, elevation, tenure, ...).
    #[serde(default)]
    pub attributes: BTreeMap<String, serde_json::Value>,
    /// Skills with a once-only rule that have already been executed.
    #[serde(default)]
    pub executed_once: BTreeSet<String>,
    /// Last step each skill was executed at, for cooldown arithmetic.
    #[serde(default)]
    pub last_step: BTreeMap<String, u64>,
    /// Executions of each skill within the current quota window.
    #[serde(default)]
    pub count_in_window: BTreeMap<String, u32>,
    pub step: u64,
}

impl AgentSnapshot {
    pub fn new(agent_id: impl Into<String>, agent_type: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            agent_type: agent_type.into(),
            ..Default::default()
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub fn with_step(mut self, step: u64) -> Self {
        self.step = step;
        self
    }
}

/// Read-only world state dictionary provided by the simulator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub step: u64,
    #[serde(default)]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl WorldSnapshot {
    pub fn new(step: u64) -> Self {
        Self {
            step,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }
}

/// A message from a peer, delivered by an external message pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialSignal {
    pub from_agent: String,
    pub message: String,
}

/// A structured candidate decision emitted by the model, subject to
/// validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillProposal {
    pub skill_id: String,
    /// Cognitive-appraisal labels keyed by dimension, in the closed
    /// vocabulary declared for the experiment.
    pub reasoning: BTreeMap<String, OrdinalLabel>,
    /// Model self-reported confidence in `[0, 1]`.
    pub confidence: f64,
    /// The original model text, preserved verbatim for the audit.
    pub raw_payload: String,
}

/// Why a proposal (or attempt) was refused. All kinds are values; none of
/// them raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionKind {
    ParseError,
    UnknownSkill,
    ForbiddenForType,
    PreconditionFailed,
    AlreadyExecuted,
    Cooldown,
    QuotaExhausted,
    Exclusivity,
    UnsafeEffect,
    Incoherent,
    DefaultSkillInfeasible,
}

impl RejectionKind {
    /// Kinds produced by institutional-constraint checking. Configuration
    /// may downgrade these to warnings.
    pub fn is_institutional(self) -> bool {
        matches!(
            self,
            RejectionKind::AlreadyExecuted
                | RejectionKind::Cooldown
                | RejectionKind::QuotaExhausted
                | RejectionKind::Exclusivity
        )
    }
}

/// A rejection with its pedagogical message. The message is first-class
/// data: it flows from validator to the retry prompt and into the audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    pub kind: RejectionKind,
    pub message: String,
}

impl Rejection {
    pub fn new(kind: RejectionKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Verdict of a single validator, in pipeline order, preserved for audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorVerdict {
    pub validator: String,
    pub status: VerdictStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum VerdictStatus {
    Ok,
    /// Rejection that was downgraded by configuration; evaluation continued.
    Warned { rejection: Rejection },
    Rejected { rejection: Rejection },
}

/// Terminal outcome of one decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionOutcome {
    Approved,
    Fallback,
    Exhausted,
}

impl DecisionOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            DecisionOutcome::Approved => "approved",
            DecisionOutcome::Fallback => "fallback",
            DecisionOutcome::Exhausted => "exhausted",
        }
    }
}

/// What the simulator receives back from one `decide` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    /// `None` only when the decision exhausted without a feasible default.
    pub final_skill_id: Option<String>,
    pub retry_count: u32,
    pub outcome: DecisionOutcome,
    /// Identifier of the audit record emitted for this decision.
    pub audit_handle: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinal_label_scale() {
        assert!(OrdinalLabel::VeryHigh > OrdinalLabel::High);
        assert_eq!(OrdinalLabel::midpoint().rank(), 2);
        assert_eq!(OrdinalLabel::parse("VH"), Some(OrdinalLabel::VeryHigh));
        assert_eq!(OrdinalLabel::parse("huge"), None);
    }

    #[test]
    fn test_ordinal_label_serde_rename() {
        let json = serde_json::to_string(&OrdinalLabel::VeryLow).unwrap();
        assert_eq!(json, "\"VL\"");
        let back: OrdinalLabel = serde_json::from_str("\"H\"").unwrap();
        assert_eq!(back, OrdinalLabel::High);
    }

    #[test]
    fn test_agent_snapshot_builder() {
        let agent = AgentSnapshot::new("hh_17", "household_owner")
            .with_attribute("elevated", serde_json::json!(false))
            .with_step(4);
        assert_eq!(agent.agent_type, "household_owner");
        assert_eq!(agent.step, 4);
        assert_eq!(agent.attributes["elevated"], serde_json::json!(false));
    }

    #[test]
    fn test_rejection_kind_wire_format() {
        let json = serde_json::to_string(&RejectionKind::AlreadyExecuted).unwrap();
        assert_eq!(json, "\"ALREADY_EXECUTED\"");
    }

    #[test]
    fn test_outcome_wire_format() {
        let json = serde_json::to_string(&DecisionOutcome::Fallback).unwrap();
        assert_eq!(json, "\"fallback\"");
        assert_eq!(DecisionOutcome::Exhausted.as_str(), "exhausted");
    }
}
