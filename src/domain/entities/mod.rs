//! Domain entities - Core objects the agent reasons about

pub mod user;
pub mod message;
pub mod command;

pub use user::User;
pub use message::Message;
pub use command::{Command, CommandEntry, CommandSet};
