//! Prompt assembly for SkillGov decisions.
//!
//! The [`ContextBuilder`] renders seven sections in a fixed order (system
//! preamble, agent identity, world state, social signals, memory slice,
//! skill menu, appraisal schema), each independently toggleable for
//! ablation. It also owns the output-schema contract: [`output_schema`]
//! renders the schema into the prompt and [`parse_proposal`] is the parser
//! predicate the broker applies to model output.

pub mod builder;
pub mod schema;

pub use builder::{
    ContextBuilder, MenuEntry, PromptInputs, PromptPayload, SectionToggles, render_feasible_menu,
};
pub use schema::{ParseFailure, output_schema, parse_proposal};
