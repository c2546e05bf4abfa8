//! Chat plugin - message formatting, cleanup and tags

mod code;
mod purge;
mod tag;

pub use code::Code;
pub use purge::Purge;
pub use tag::Tag;

use async_trait::async_trait;

use crate::application::errors::BotError;
use crate::plugins::{Plugin, Registrar};

pub struct Chat;

#[async_trait]
impl Plugin for Chat {
    fn description(&self) -> &str {
        "Message formatting, cleanup and tags"
    }

    async fn init(&self, registrar: &mut Registrar<'_>) -> Result<(), BotError> {
        registrar.add_command("tag", Tag).await?;
        registrar.add_command("code", Code).await?;
        registrar.add_command("purge", Purge).await?;
        Ok(())
    }
}
