use crate::schema::output_schema;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use skillgov_core::{AgentSnapshot, SocialSignal, WorldSnapshot};
use skillgov_memory::MemoryEvent;
use skillgov_registry::SkillDefinition;

/// Which prompt sections are rendered. Sections keep their fixed order
/// regardless of toggles, so ablation runs flip one flag at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionToggles {
    pub preamble: bool,
    pub identity: bool,
    pub world: bool,
    pub social: bool,
    pub memory: bool,
    pub menu: bool,
    pub appraisal: bool,
}

impl Default for SectionToggles {
    fn default() -> Self {
        Self {
            preamble: true,
            identity: true,
            world: true,
            social: true,
            memory: true,
            menu: true,
            appraisal: true,
        }
    }
}

/// One skill as shown in the prompt menu.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuEntry {
    pub skill_id: String,
    pub display_name: String,
    pub description: String,
    /// The failing precondition, rendered, when the skill is currently
    /// infeasible.
    pub infeasible: Option<String>,
}

impl MenuEntry {
    pub fn is_feasible(&self) -> bool {
        self.infeasible.is_none()
    }

    fn render(&self) -> String {
        match &self.infeasible {
            Some(reason) => format!(
                "- {} ({}): {} [INFEASIBLE: {}]",
                self.skill_id, self.display_name, self.description, reason
            ),
            None => format!(
                "- {} ({}): {}",
                self.skill_id, self.display_name, self.description
            ),
        }
    }
}

/// Everything one prompt is assembled from. All fields are read-only
/// borrows; the builder never mutates its inputs.
pub struct PromptInputs<'a> {
    pub agent: &'a AgentSnapshot,
    pub world: &'a WorldSnapshot,
    pub signals: &'a [SocialSignal],
    pub memory: &'a [MemoryEvent],
    pub skills: &'a [&'a SkillDefinition],
    pub dimensions: &'a [String],
}

/// The assembled prompt plus the declared output schema and the menu that
/// was rendered into it.
#[derive(Debug, Clone)]
pub struct PromptPayload {
    pub text: String,
    pub schema: serde_json::Value,
    /// Seed used for menu ordering, when randomization was enabled.
    /// Recorded in the audit.
    pub menu_seed: Option<u64>,
    pub menu: Vec<MenuEntry>,
}

/// Assembles the decision prompt. A pure function of its inputs plus the
/// explicit menu seed; two calls with identical inputs produce identical
/// text.
#[derive(Debug, Clone, Default)]
pub struct ContextBuilder {
    toggles: SectionToggles,
}

impl ContextBuilder {
    pub fn new(toggles: SectionToggles) -> Self {
        Self { toggles }
    }

    /// Build the prompt. `menu_seed` is `Some` iff menu randomization is
    /// enabled for this decision; the same seed reproduces the same order.
    pub fn build(&self, inputs: &PromptInputs<'_>, menu_seed: Option<u64>) -> PromptPayload {
        let mut menu: Vec<MenuEntry> = inputs
            .skills
            .iter()
            .map(|def| MenuEntry {
                skill_id: def.skill_id.clone(),
                display_name: def.display_name.clone(),
                description: def.description.clone(),
                infeasible: def
                    .failing_precondition(inputs.agent, inputs.world)
                    .map(|p| p.to_string()),
            })
            .collect();
        if let Some(seed) = menu_seed {
            let mut rng = StdRng::seed_from_u64(seed);
            menu.shuffle(&mut rng);
        }

        let schema = output_schema(inputs.dimensions);
        let mut sections: Vec<String> = Vec::new();

        if self.toggles.preamble {
            sections.push(format!(
                "You are deciding what to do this step. Choose exactly one skill from the \
                 menu and respond with a single JSON object matching this schema:\n{}",
                serde_json::to_string_pretty(&schema).unwrap_or_default()
            ));
        }

        if self.toggles.identity {
            let mut lines = vec![format!(
                "## Who you are\nAgent `{}` of type `{}`.",
                inputs.agent.agent_id, inputs.agent.agent_type
            )];
            for (key, value) in &inputs.agent.attributes {
                lines.push(format!("- {key}: {value}"));
            }
            sections.push(lines.join("\n"));
        }

        if self.toggles.world {
            let mut lines = vec![format!("## The world at step {}", inputs.world.step)];
            for (key, value) in &inputs.world.attributes {
                lines.push(format!("- {key}: {value}"));
            }
            sections.push(lines.join("\n"));
        }

        if self.toggles.social {
            if !inputs.signals.is_empty() {
                let mut lines = vec!["## What others are saying".to_string()];
                for signal in inputs.signals {
                    lines.push(format!("- {}: {}", signal.from_agent, signal.message));
                }
                sections.push(lines.join("\n"));
            }
        }

        if self.toggles.memory {
            let mut lines = vec!["## What you remember".to_string()];
            if inputs.memory.is_empty() {
                lines.push("You have no prior experience.".to_string());
            } else {
                for event in inputs.memory {
                    lines.push(format!("- {}", event.render()));
                }
            }
            sections.push(lines.join("\n"));
        }

        if self.toggles.menu {
            let mut lines = vec!["## Skill menu".to_string()];
            for entry in &menu {
                lines.push(entry.render());
            }
            sections.push(lines.join("\n"));
        }

        if self.toggles.appraisal {
            sections.push(format!(
                "## Appraisal\nRate each of [{}] on the scale VL, L, M, H, VH inside \
                 `reasoning_labels`, then state your `skill_id` and `confidence`.",
                inputs.dimensions.join(", ")
            ));
        }

        PromptPayload {
            text: sections.join("\n\n"),
            schema,
            menu_seed,
            menu,
        }
    }
}

/// Render the currently feasible menu for pedagogical feedback blocks.
pub fn render_feasible_menu(menu: &[MenuEntry]) -> String {
    let mut lines = Vec::new();
    for entry in menu {
        lines.push(entry.render());
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use skillgov_registry::Predicate;

    fn fixtures() -> (AgentSnapshot, WorldSnapshot, Vec<SkillDefinition>, Vec<String>) {
        let agent = AgentSnapshot::new("hh_1", "household_owner")
            .with_attribute("elevated", json!(true))
            .with_step(3);
        let world = WorldSnapshot::new(3).with_attribute("flood_year", json!(false));
        let skills = vec![
            SkillDefinition::new("elevate_house", "Elevate house")
                .with_description("Raise the structure above flood level")
                .with_precondition(Predicate::is_false("elevated")),
            SkillDefinition::new("do_nothing", "Do nothing")
                .with_description("Take no action this step"),
        ];
        let dims = vec!["TP".to_string(), "CP".to_string()];
        (agent, world, skills, dims)
    }

    #[test]
    fn test_infeasible_annotation() {
        let (agent, world, skills, dims) = fixtures();
        let refs: Vec<&SkillDefinition> = skills.iter().collect();
        let payload = ContextBuilder::default().build(
            &PromptInputs {
                agent: &agent,
                world: &world,
                signals: &[],
                memory: &[],
                skills: &refs,
                dimensions: &dims,
            },
            None,
        );
        assert!(payload.text.contains("[INFEASIBLE: elevated is false]"));
        assert!(!payload.menu[0].is_feasible());
        assert!(payload.menu[1].is_feasible());
    }

    #[test]
    fn test_empty_memory_marker() {
        let (agent, world, skills, dims) = fixtures();
        let refs: Vec<&SkillDefinition> = skills.iter().collect();
        let payload = ContextBuilder::default().build(
            &PromptInputs {
                agent: &agent,
                world: &world,
                signals: &[],
                memory: &[],
                skills: &refs,
                dimensions: &dims,
            },
            None,
        );
        assert!(payload.text.contains("no prior experience"));
    }

    #[test]
    fn test_builder_is_deterministic() {
        let (agent, world, skills, dims) = fixtures();
        let refs: Vec<&SkillDefinition> = skills.iter().collect();
        let inputs = PromptInputs {
            agent: &agent,
            world: &world,
            signals: &[],
            memory: &[],
            skills: &refs,
            dimensions: &dims,
        };
        let builder = ContextBuilder::default();
        let a = builder.build(&inputs, Some(42));
        let b = builder.build(&inputs, Some(42));
        assert_eq!(a.text, b.text);
        assert_eq!(a.menu_seed, Some(42));
    }

    #[test]
    fn test_section_toggles_ablate() {
        let (agent, world, skills, dims) = fixtures();
        let refs: Vec<&SkillDefinition> = skills.iter().collect();
        let inputs = PromptInputs {
            agent: &agent,
            world: &world,
            signals: &[],
            memory: &[],
            skills: &refs,
            dimensions: &dims,
        };
        let toggles = SectionToggles {
            world: false,
            ..Default::default()
        };
        let payload = ContextBuilder::new(toggles).build(&inputs, None);
        assert!(!payload.text.contains("## The world"));
        assert!(payload.text.contains("## Skill menu"));
    }

    #[test]
    fn test_social_section_rendered() {
        let (agent, world, skills, dims) = fixtures();
        let refs: Vec<&SkillDefinition> = skills.iter().collect();
        let signals = vec![SocialSignal {
            from_agent: "hh_2".to_string(),
            message: "I bought insurance last year".to_string(),
        }];
        let payload = ContextBuilder::default().build(
            &PromptInputs {
                agent: &agent,
                world: &world,
                signals: &signals,
                memory: &[],
                skills: &refs,
                dimensions: &dims,
            },
            None,
        );
        assert!(payload.text.contains("What others are saying"));
        assert!(payload.text.contains("hh_2"));
    }
}
