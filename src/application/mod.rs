//! Application layer - The agent's control core
//!
//! This layer contains:
//! - Queue: Per-target action scheduling
//! - Messaging: Command parsing and routing
//! - Services: Queued actions and agent orchestration
//! - Errors: Error taxonomy
//! - Events: Lifecycle events and the error channel

pub mod context;
pub mod errors;
pub mod events;
pub mod messaging;
pub mod queue;
pub mod services;
