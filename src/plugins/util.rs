//! Helpers shared by the built-in commands

/// Wrap text in a fenced code block
pub fn wrap(text: &str) -> String {
    wrap_lang("", text)
}

/// Wrap text in a fenced code block tagged with `lang`
pub fn wrap_lang(lang: &str, text: &str) -> String {
    format!("```{}\n{}\n```", lang, text)
}

/// Split off the first whitespace-delimited word; the rest comes back trimmed
pub fn split_word(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    let end = text.find(char::is_whitespace).unwrap_or(text.len());
    (&text[..end], text[end..].trim())
}
