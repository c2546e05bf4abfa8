//! Status plugin - presence ("game") of the account

use async_trait::async_trait;

use crate::application::context::CommandContext;
use crate::application::errors::BotError;
use crate::domain::entities::{Command, Message};
use crate::plugins::util::{split_word, wrap};
use crate::plugins::{Plugin, Registrar};

pub struct Status;

#[async_trait]
impl Plugin for Status {
    fn description(&self) -> &str {
        "Account presence"
    }

    async fn init(&self, registrar: &mut Registrar<'_>) -> Result<(), BotError> {
        registrar.add_command("game", Game).await
    }
}

/// `game set <name>`, `game clear`, or bare `game` to show the current one
pub struct Game;

#[async_trait]
impl Command for Game {
    fn usage(&self) -> &str {
        "[set|clear] [game]"
    }

    fn description(&self) -> &str {
        "manage the current playing game"
    }

    async fn process(&self, ctx: &CommandContext, message: &Message, suffix: &str) -> Result<(), BotError> {
        let (sub, rest) = split_word(suffix);
        let reply = match sub.to_lowercase().as_str() {
            "set" => {
                // An empty name clears the game.
                let game = Some(rest).filter(|g| !g.is_empty());
                ctx.actions.set_presence(game).await?;
                "Game set".to_string()
            }
            "clear" => {
                ctx.actions.set_presence(None).await?;
                "Game cleared".to_string()
            }
            _ => ctx
                .actions
                .presence()
                .unwrap_or_else(|| "<No game set>".to_string()),
        };

        ctx.actions.send_message(message, wrap(&reply)).await?;
        Ok(())
    }
}
