use std::sync::Arc;

use async_trait::async_trait;

use crate::application::context::{CommandContext, PluginContext};
use crate::application::errors::BotError;
use crate::domain::entities::{Command, Message};
use crate::domain::traits::{Document, Query, SortOrder, Store};
use crate::plugins::util::{split_word, wrap};

const COLLECTION: &str = "tag";
/// Server key of tags visible everywhere
const GLOBAL: &str = "";

/// Per-server text snippets with a global fallback
pub struct Tag;

#[async_trait]
impl Command for Tag {
    fn usage(&self) -> &str {
        "[set|global|remove|list] [name]"
    }

    fn description(&self) -> &str {
        "manage or show tags"
    }

    async fn init(&self, ctx: &PluginContext) -> Result<(), BotError> {
        ctx.store()?;
        Ok(())
    }

    async fn process(&self, ctx: &CommandContext, message: &Message, suffix: &str) -> Result<(), BotError> {
        let tags = Tags {
            store: ctx.store()?.clone(),
            server: message.server_key(),
        };

        let (sub, rest) = split_word(suffix);
        let reply = match sub.to_lowercase().as_str() {
            "set" => {
                let (name, content) = split_word(rest);
                tags.set(name, content).await?
            }
            "global" => tags.make_global(rest).await?,
            "remove" => tags.remove(rest).await?,
            "list" => tags.list().await?,
            _ => match tags.content(suffix.trim()).await? {
                Some(content) => {
                    // A failed delete is already on the error channel; still show the tag.
                    let _ = ctx.actions.delete_message(message).await;
                    ctx.actions.send_message(message, content).await?;
                    return Ok(());
                }
                None => no_such_tag(suffix.trim()),
            },
        };

        ctx.actions.send_message(message, wrap(&reply)).await?;
        Ok(())
    }
}

fn no_such_tag(name: &str) -> String {
    format!("No such tag '{}'", name)
}

/// Tag operations scoped to one server
pub struct Tags {
    store: Arc<dyn Store>,
    server: String,
}

impl Tags {
    pub fn new(store: Arc<dyn Store>, server: impl Into<String>) -> Self {
        Self {
            store,
            server: server.into(),
        }
    }

    /// The local tag if present, else the global one, else a fresh local entry
    async fn entry(&self, name: &str) -> Result<Document, BotError> {
        let query = Query::new()
            .eq("tag", name)
            .any_of("server", [self.server.as_str(), GLOBAL])
            .sort_by("server", SortOrder::Descending)
            .limit(1);

        let found = self.store.find(COLLECTION, &query).await?;
        Ok(found.into_iter().next().unwrap_or_else(|| {
            Document::new()
                .with("tag", name)
                .with("server", self.server.as_str())
        }))
    }

    pub async fn set(&self, name: &str, content: &str) -> Result<String, BotError> {
        if name.is_empty() || content.is_empty() {
            return Ok("Invalid tag".to_string());
        }

        let mut entry = self.entry(name).await?;
        entry.set("content", content);
        self.store.save(COLLECTION, &mut entry).await?;
        Ok(format!("Tag '{}' saved", name))
    }

    /// Promote a tag to global, dropping every other server's copy
    pub async fn make_global(&self, name: &str) -> Result<String, BotError> {
        let mut entry = self.entry(name).await?;
        if !has_content(&entry) {
            return Ok(no_such_tag(name));
        }

        let owner = entry.get_str("server").unwrap_or(GLOBAL).to_string();
        let others = Query::new().eq("tag", name).ne("server", owner);
        self.store.remove(COLLECTION, &others).await?;

        entry.set("server", GLOBAL);
        self.store.save(COLLECTION, &mut entry).await?;
        Ok(format!("Global tag '{}' set", name))
    }

    pub async fn remove(&self, name: &str) -> Result<String, BotError> {
        let entry = self.entry(name).await?;
        let id = match entry.id() {
            Some(id) if has_content(&entry) => id,
            _ => return Ok(no_such_tag(name)),
        };

        self.store.remove(COLLECTION, &Query::by_id(id)).await?;
        Ok(format!("Tag '{}' removed", name))
    }

    /// Visible tag names, sorted; global ones marked with ` *`
    pub async fn list(&self) -> Result<String, BotError> {
        let query = Query::new()
            .any_of("server", [self.server.as_str(), GLOBAL])
            .sort_by("tag", SortOrder::Ascending);

        let lines: Vec<String> = self
            .store
            .find(COLLECTION, &query)
            .await?
            .iter()
            .filter_map(|d| {
                let name = d.get_str("tag")?;
                let global = d.get_str("server").unwrap_or(GLOBAL).is_empty();
                Some(if global { format!("{} *", name) } else { name.to_string() })
            })
            .collect();

        if lines.is_empty() {
            return Ok("No tags".to_string());
        }
        Ok(lines.join("\n"))
    }

    pub async fn content(&self, name: &str) -> Result<Option<String>, BotError> {
        let entry = self.entry(name).await?;
        Ok(entry
            .get_str("content")
            .filter(|c| !c.is_empty())
            .map(str::to_string))
    }
}

fn has_content(entry: &Document) -> bool {
    entry.get_str("content").is_some_and(|c| !c.is_empty())
}
