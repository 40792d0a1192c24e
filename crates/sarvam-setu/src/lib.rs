//! Conversational eligibility questionnaire for government scheme discovery.
//!
//! The crate owns the per-user questionnaire state machine and the eligibility matcher. Chat
//! transport and the rule store are collaborators reached through the traits exported from
//! [`workflows::questionnaire`].

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
