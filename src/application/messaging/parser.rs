//! Command parser - splits prefixed text into a command name and its suffix

/// A command token and the trimmed text after it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub name: String,
    pub suffix: String,
}

/// Recognizes `<prefix><name> <suffix>` messages
pub struct CommandParser {
    prefix: String,
}

impl CommandParser {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// `None` unless the trimmed text starts with the prefix.
    ///
    /// The name is everything up to the first whitespace right after the
    /// prefix, so `"! code"` yields an empty name.
    pub fn parse(&self, text: &str) -> Option<ParsedCommand> {
        let body = text.trim().strip_prefix(self.prefix.as_str())?;
        let end = body.find(char::is_whitespace).unwrap_or(body.len());

        Some(ParsedCommand {
            name: body[..end].to_string(),
            suffix: body[end..].trim().to_string(),
        })
    }
}
