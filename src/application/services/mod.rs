//! Application services - Orchestration of the agent's components

pub mod actions;
pub mod agent;

pub use actions::Actions;
pub use agent::Agent;
