use serde::{Deserialize, Serialize};
use skillgov_core::{AgentSnapshot, WorldSnapshot};
use std::collections::{BTreeMap, BTreeSet};

/// Immutable declaration of one admissible behavior. Loaded from
/// configuration at startup and frozen for the life of the process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillDefinition {
    /// Unique identifier referenced by proposals, audit records, and memory.
    pub skill_id: String,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    /// Agent-type tags permitted to propose this skill.
    pub allowed_agent_types: BTreeSet<String>,
    /// Predicates over agent + world state; all must hold for the skill to
    /// be feasible.
    #[serde(default)]
    pub preconditions: Vec<Predicate>,
    /// Institutional constraints; possibly empty.
    #[serde(default)]
    pub institutional_constraints: Vec<InstitutionalRule>,
    /// The agent-state fields this skill may mutate, with the mutation kind.
    #[serde(default)]
    pub declared_effects: Vec<DeclaredEffect>,
    /// Opaque handle interpreted by the external executor.
    #[serde(default)]
    pub implementation_ref: String,
}

impl SkillDefinition {
    pub fn new(skill_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            skill_id: skill_id.into(),
            display_name: display_name.into(),
            description: String::new(),
            allowed_agent_types: BTreeSet::new(),
            preconditions: Vec::new(),
            institutional_constraints: Vec::new(),
            declared_effects: Vec::new(),
            implementation_ref: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn for_agent_type(mut self, agent_type: impl Into<String>) -> Self {
        self.allowed_agent_types.insert(agent_type.into());
        self
    }

    pub fn with_precondition(mut self, predicate: Predicate) -> Self {
        self.preconditions.push(predicate);
        self
    }

    pub fn with_constraint(mut self, rule: InstitutionalRule) -> Self {
        self.institutional_constraints.push(rule);
        self
    }

    pub fn with_effect(mut self, effect: DeclaredEffect) -> Self {
        self.declared_effects.push(effect);
        self
    }

    /// First precondition that fails against the snapshots, if any.
    /// Used both by the feasibility validator and for `INFEASIBLE` menu
    /// annotations.
    pub fn failing_precondition(
        &self,
        agent: &AgentSnapshot,
        world: &WorldSnapshot,
    ) -> Option<&Predicate> {
        self.preconditions.iter().find(|p| !p.eval(agent, world))
    }
}

/// A comparison over one named field of the agent or world state. The agent
/// dictionary shadows the world dictionary on name collisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    pub field: String,
    pub op: PredicateOp,
    #[serde(default)]
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredicateOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    IsTrue,
    IsFalse,
}

impl Predicate {
    pub fn new(field: impl Into<String>, op: PredicateOp, value: serde_json::Value) -> Self {
        Self {
            field: field.into(),
            op,
            value,
        }
    }

    pub fn is_true(field: impl Into<String>) -> Self {
        Self::new(field, PredicateOp::IsTrue, serde_json::Value::Null)
    }

    pub fn is_false(field: impl Into<String>) -> Self {
        Self::new(field, PredicateOp::IsFalse, serde_json::Value::Null)
    }

    /// Evaluate against the snapshots. A missing field fails every
    /// comparison; predicates never raise.
    pub fn eval(&self, agent: &AgentSnapshot, world: &WorldSnapshot) -> bool {
        let actual = agent
            .attributes
            .get(&self.field)
            .or_else(|| world.attributes.get(&self.field));
        let Some(actual) = actual else {
            return false;
        };
        match self.op {
            PredicateOp::IsTrue => actual.as_bool() == Some(true),
            PredicateOp::IsFalse => actual.as_bool() == Some(false),
            PredicateOp::Eq => actual == &self.value,
            PredicateOp::Ne => actual != &self.value,
            PredicateOp::Lt | PredicateOp::Le | PredicateOp::Gt | PredicateOp::Ge => {
                match (actual.as_f64(), self.value.as_f64()) {
                    (Some(a), Some(b)) => match self.op {
                        PredicateOp::Lt => a < b,
                        PredicateOp::Le => a <= b,
                        PredicateOp::Gt => a > b,
                        PredicateOp::Ge => a >= b,
                        _ => unreachable!(),
                    },
                    _ => false,
                }
            }
        }
    }
}

impl std::fmt::Display for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.op {
            PredicateOp::IsTrue => write!(f, "{} is true", self.field),
            PredicateOp::IsFalse => write!(f, "{} is false", self.field),
            PredicateOp::Eq => write!(f, "{} == {}", self.field, self.value),
            PredicateOp::Ne => write!(f, "{} != {}", self.field, self.value),
            PredicateOp::Lt => write!(f, "{} < {}", self.field, self.value),
            PredicateOp::Le => write!(f, "{} <= {}", self.field, self.value),
            PredicateOp::Gt => write!(f, "{} > {}", self.field, self.value),
            PredicateOp::Ge => write!(f, "{} >= {}", self.field, self.value),
        }
    }
}

/// Institutional constraint attached to a skill definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum InstitutionalRule {
    /// The skill may be executed at most once per agent, ever.
    OnceOnly,
    /// At most `limit` executions within the current quota window.
    AnnualLimit { limit: u32 },
    /// At least `steps` steps must elapse between executions.
    Cooldown { steps: u64 },
    /// May not be executed if any of these skills already ran once-only.
    ExclusiveWith { skills: BTreeSet<String> },
}

/// One agent-state field a skill may mutate, with the mutation kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeclaredEffect {
    pub field: String,
    pub kind: EffectKind,
}

impl DeclaredEffect {
    pub fn new(field: impl Into<String>, kind: EffectKind) -> Self {
        Self {
            field: field.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EffectKind {
    SetTrue,
    SetFalse,
    Delta { amount: f64 },
    Replace { value: serde_json::Value },
}

impl EffectKind {
    /// The payload-free mutation class, used by effect-safety checks.
    pub fn op(&self) -> EffectOp {
        match self {
            EffectKind::SetTrue => EffectOp::SetTrue,
            EffectKind::SetFalse => EffectOp::SetFalse,
            EffectKind::Delta { .. } => EffectOp::Delta,
            EffectKind::Replace { .. } => EffectOp::Replace,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectOp {
    SetTrue,
    SetFalse,
    Delta,
    Replace,
}

/// The mutations an agent type permits on one of its state fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EffectBound {
    pub kinds: BTreeSet<EffectOp>,
    /// Inclusive bounds for `Delta` amounts, when declared.
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Per-agent-type governance policy: which fallback to use, which effects
/// are allowed, and which appraisal dimensions the model must fill.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentTypePolicy {
    pub agent_type: String,
    /// Structurally guaranteed-feasible skill used when validation retries
    /// exhaust.
    pub default_skill: String,
    /// Allowed mutation set keyed by agent-state field.
    #[serde(default)]
    pub allowed_effects: BTreeMap<String, EffectBound>,
    /// Appraisal dimensions, in declared (presentation) order.
    pub cognitive_dimensions: Vec<String>,
}

impl AgentTypePolicy {
    pub fn new(agent_type: impl Into<String>, default_skill: impl Into<String>) -> Self {
        Self {
            agent_type: agent_type.into(),
            default_skill: default_skill.into(),
            allowed_effects: BTreeMap::new(),
            cognitive_dimensions: Vec::new(),
        }
    }

    pub fn with_dimension(mut self, dim: impl Into<String>) -> Self {
        self.cognitive_dimensions.push(dim.into());
        self
    }

    pub fn allow_effect(mut self, field: impl Into<String>, bound: EffectBound) -> Self {
        self.allowed_effects.insert(field.into(), bound);
        self
    }
}
