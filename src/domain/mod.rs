//! Domain layer - Core objects and the seams to external collaborators
//!
//! This layer contains:
//! - Entities: Core objects (User, Message, Command)
//! - Traits: Abstractions for collaborators (Transport, Store)

pub mod entities;
pub mod traits;
