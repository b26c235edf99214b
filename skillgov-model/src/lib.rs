//! Network-free [`ModelAdapter`] implementations.
//!
//! Production backends live outside this workspace; what the core needs
//! in-tree is a deterministic [`ScriptedModel`] for tests and demos, and a
//! [`ReplayModel`] that re-drives the broker from a recorded audit trail.
//!
//! [`ModelAdapter`]: skillgov_core::ModelAdapter

pub mod constant;
pub mod replay;
pub mod scripted;

pub use constant::ConstantModel;
pub use replay::ReplayModel;
pub use scripted::{ScriptStep, ScriptedModel};
