use async_trait::async_trait;

use crate::application::context::CommandContext;
use crate::application::errors::BotError;
use crate::domain::entities::{Command, Message};
use crate::plugins::util::{split_word, wrap, wrap_lang};

const ZERO_WIDTH_SPACE: char = '\u{200B}';

/// Rewrites the invoking message as a fenced code block
pub struct Code;

/// Render `suffix` (`<language> text`) as a code block.
///
/// `none` drops the language tag. A leading `-` on the language defuses link
/// previews by putting a zero-width space in front of every `.`.
pub fn render(suffix: &str) -> Option<String> {
    let (language, code) = split_word(suffix);
    if language.is_empty() {
        return None;
    }

    let language = if language == "none" { "" } else { language };
    Some(match language.strip_prefix('-') {
        Some(language) => {
            let defused = code.replace('.', &format!("{}.", ZERO_WIDTH_SPACE));
            wrap_lang(language, &defused)
        }
        None => wrap_lang(language, code),
    })
}

#[async_trait]
impl Command for Code {
    fn usage(&self) -> &str {
        "<language> text"
    }

    fn description(&self) -> &str {
        "convert text into a code block"
    }

    async fn process(&self, ctx: &CommandContext, message: &Message, suffix: &str) -> Result<(), BotError> {
        match render(suffix) {
            Some(block) => {
                ctx.actions.update_message(message, block).await?;
            }
            None => {
                ctx.actions.send_message(message, wrap("no language specified")).await?;
            }
        }
        Ok(())
    }
}
