//! Message handling - inbound text to command invocations

pub mod parser;
pub mod router;

pub use parser::{CommandParser, ParsedCommand};
pub use router::Router;
