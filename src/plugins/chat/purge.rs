use async_trait::async_trait;

use crate::application::context::CommandContext;
use crate::application::errors::BotError;
use crate::domain::entities::{Command, Message};
use crate::plugins::util::wrap;

const HISTORY_PAGE: usize = 100;

/// Deletes the author's most recent messages
pub struct Purge;

#[async_trait]
impl Command for Purge {
    fn usage(&self) -> &str {
        "<number>"
    }

    fn description(&self) -> &str {
        "delete your last <number> messages"
    }

    async fn process(&self, ctx: &CommandContext, message: &Message, suffix: &str) -> Result<(), BotError> {
        let number = match leading_number(suffix) {
            Some(n) if n >= 1 => n,
            _ => {
                ctx.actions.send_message(message, wrap("Invalid number")).await?;
                return Ok(());
            }
        };

        // The command message itself goes too.
        let mut remaining = number + 1;
        while remaining > 0 {
            let batch: Vec<Message> = ctx
                .actions
                .fetch_history(message, HISTORY_PAGE)
                .await?
                .into_iter()
                .filter(|m| m.author == message.author)
                .take(remaining)
                .collect();

            if batch.is_empty() {
                break;
            }

            for doomed in &batch {
                ctx.actions.delete_message(doomed).await?;
            }
            remaining -= batch.len();
        }

        tracing::debug!("Purged {} messages", number + 1 - remaining);
        Ok(())
    }
}

/// The run of digits the argument starts with; trailing text is ignored
fn leading_number(suffix: &str) -> Option<usize> {
    let trimmed = suffix.trim_start();
    let digits = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .map_or(trimmed, |end| &trimmed[..end]);
    digits.parse().ok()
}
