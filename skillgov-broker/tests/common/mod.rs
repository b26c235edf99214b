use serde_json::json;
use skillgov_core::{AgentSnapshot, OrdinalLabel, WorldSnapshot};
use skillgov_registry::{
    AgentTypePolicy, DeclaredEffect, EffectBound, EffectKind, EffectOp, InstitutionalRule,
    Predicate, PredicateOp, SkillDefinition, SkillRegistry,
};
use skillgov_validate::{RuleEntry, RuleTable};
use std::collections::BTreeSet;

pub fn registry() -> SkillRegistry {
    SkillRegistry::new(vec![
        SkillDefinition::new("elevate_house", "Elevate house")
            .with_description("Raise the structure above flood level")
            .for_agent_type("household_owner")
            .with_precondition(Predicate::is_false("elevated"))
            .with_constraint(InstitutionalRule::OnceOnly)
            .with_effect(DeclaredEffect::new("elevated", EffectKind::SetTrue)),
        SkillDefinition::new("buy_insurance", "Buy flood insurance")
            .with_description("Annual flood insurance contract")
            .for_agent_type("household_owner")
            .with_precondition(Predicate::new("income", PredicateOp::Ge, json!(20000)))
            .with_effect(DeclaredEffect::new(
                "savings",
                EffectKind::Delta { amount: -1200.0 },
            )),
        SkillDefinition::new("do_nothing", "Do nothing")
            .with_description("Take no action this step")
            .for_agent_type("household_owner"),
    ])
    .unwrap()
}

pub fn policy() -> AgentTypePolicy {
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

pub fn rule_table() -> RuleTable {
    RuleTable::new(vec![RuleEntry {
        labels: vec![OrdinalLabel::High, OrdinalLabel::High],
        allowed: ["elevate_house".to_string(), "buy_insurance".to_string()]
            .into_iter()
            .collect::<BTreeSet<_>>(),
    }])
}

pub fn owner_snapshot(step: u64) -> AgentSnapshot {
    AgentSnapshot::new("hh_1", "household_owner")
        .with_attribute("elevated", json!(false))
        .with_attribute("income", json!(80000))
        .with_step(step)
}

pub fn world(step: u64) -> WorldSnapshot {
    WorldSnapshot::new(step).with_attribute("flood_year", json!(false))
}

pub fn proposal_json(skill_id: &str, tp: &str, cp: &str) -> String {
    format!(
        "{{\"reasoning_labels\": {{\"TP\": \"{tp}\", \"CP\": \"{cp}\"}}, \
         \"skill_id\": \"{skill_id}\", \"confidence\": 0.8}}"
    )
}
