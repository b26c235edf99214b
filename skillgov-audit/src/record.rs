use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use skillgov_core::{DecisionOutcome, SkillProposal, ValidatorVerdict};

/// One model invocation within a decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// SHA-256 hex digest of the prompt sent for this attempt.
    pub prompt_hash: String,
    /// The model's raw text, preserved verbatim.
    pub raw_output: String,
    #[serde(rename = "parsed_proposal_or_null")]
    pub parsed_proposal: Option<SkillProposal>,
    /// Verdicts in pipeline order, up to and including the rejecting
    /// validator. Empty when parsing failed or governance is disabled.
    #[serde(default)]
    pub validator_verdicts: Vec<ValidatorVerdict>,
    #[serde(rename = "pedagogical_message_or_null")]
    pub pedagogical_message: Option<String>,
}

/// The reconstructable trace of one decision. Appended whole; never
/// mutated after write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub run_id: String,
    pub step: u64,
    pub agent_id: String,
    pub agent_type: String,
    pub attempts: Vec<AttemptRecord>,
    pub final_skill_id: Option<String>,
    pub retry_count: u32,
    pub outcome: DecisionOutcome,
    pub timestamp: DateTime<Utc>,
    /// Menu-ordering seed for this decision, when randomization was on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menu_seed: Option<u64>,
}

impl AuditRecord {
    /// Stable handle returned to the simulator alongside the decision.
    pub fn handle(&self) -> String {
        format!("{}/{}/{}", self.run_id, self.step, self.agent_id)
    }
}

/// SHA-256 hex digest used for `prompt_hash`.
pub fn prompt_hash(prompt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(prompt.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> AuditRecord {
        AuditRecord {
            run_id: "run-1".to_string(),
            step: 4,
            agent_id: "hh_1".to_string(),
            agent_type: "household_owner".to_string(),
            attempts: vec![AttemptRecord {
                prompt_hash: prompt_hash("prompt"),
                raw_output: "{}".to_string(),
                parsed_proposal: None,
                validator_verdicts: Vec::new(),
                pedagogical_message: Some("respond with a JSON object".to_string()),
            }],
            final_skill_id: Some("do_nothing".to_string()),
            retry_count: 0,
            outcome: DecisionOutcome::Fallback,
            timestamp: Utc::now(),
            menu_seed: Some(99),
        }
    }

    #[test]
    fn test_handle_format() {
        assert_eq!(record().handle(), "run-1/4/hh_1");
    }

    #[test]
    fn test_wire_keys_match_contract() {
        let value = serde_json::to_value(record()).unwrap();
        for key in [
            "run_id",
            "step",
            "agent_id",
            "agent_type",
            "attempts",
            "final_skill_id",
            "retry_count",
            "outcome",
            "timestamp",
        ] {
            assert!(value.get(key).is_some(), "missing top-level key {key}");
        }
        let attempt = &value["attempts"][0];
        for key in [
            "prompt_hash",
            "raw_output",
            "parsed_proposal_or_null",
            "validator_verdicts",
            "pedagogical_message_or_null",
        ] {
            assert!(attempt.get(key).is_some(), "missing attempt key {key}");
        }
    }

    #[test]
    fn test_prompt_hash_is_stable() {
        assert_eq!(prompt_hash("abc"), prompt_hash("abc"));
        assert_ne!(prompt_hash("abc"), prompt_hash("abd"));
        assert_eq!(prompt_hash("abc").len(), 64);
    }

    #[test]
    fn test_record_roundtrip() {
        let original = record();
        let line = serde_json::to_string(&original).unwrap();
        let back: AuditRecord = serde_json::from_str(&line).unwrap();
        assert_eq!(back, original);
    }
}
