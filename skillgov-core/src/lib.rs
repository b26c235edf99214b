//! # skillgov-core
//!
//! Core traits and types for SkillGov governed agent decisions.
//!
//! ## Overview
//!
//! This crate provides the shared vocabulary for the governance middleware:
//!
//! - [`AgentSnapshot`] / [`WorldSnapshot`] - read-only state views per decision
//! - [`SkillProposal`] - a structured candidate decision from the model
//! - [`Rejection`] / [`ValidatorVerdict`] - validation outcomes as values
//! - [`Decision`] - the terminal result returned to the simulator
//! - [`ModelAdapter`] - the seam to the text backend
//! - [`GovError`] / [`Result`] - unified error handling
//!
//! All configuration flows as values; there is no global state. Rejections
//! and pedagogical messages are data, never exceptions.

pub mod error;
pub mod model;
pub mod types;

pub use error::{GovError, Result};
pub use model::{ModelAdapter, ModelRequest, ModelResponse, ModelUsage};
pub use types::{
    AgentSnapshot, Decision, DecisionOutcome, OrdinalLabel, Rejection, RejectionKind,
    SkillProposal, SocialSignal, ValidatorVerdict, VerdictStatus, WorldSnapshot,
};
