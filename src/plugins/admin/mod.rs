//! Admin plugin - command help and runtime plugin management

use async_trait::async_trait;
use tracing::info;

use crate::application::context::CommandContext;
use crate::application::errors::BotError;
use crate::domain::entities::{Command, CommandSet, Message};
use crate::plugins::util::{split_word, wrap};
use crate::plugins::{BatchReport, Plugin, Registrar};

pub struct Admin;

#[async_trait]
impl Plugin for Admin {
    fn description(&self) -> &str {
        "Help and plugin management"
    }

    async fn init(&self, registrar: &mut Registrar<'_>) -> Result<(), BotError> {
        registrar.add_command("help", Help).await?;
        registrar.add_command("plugin", PluginCommand).await?;
        Ok(())
    }
}

pub struct Help;

/// One line per command, or the detail of a single one
pub fn render_help(commands: &CommandSet, prefix: &str, name: &str) -> String {
    if !name.is_empty() {
        return match commands.find(name) {
            Some(c) => format!("{}{} {}\n  {}", prefix, c.name, c.usage, c.description)
                .trim_end()
                .to_string(),
            None => format!("Unknown command '{}'", name),
        };
    }

    if commands.is_empty() {
        return "No commands loaded".to_string();
    }

    commands
        .iter()
        .map(|c| {
            let head = format!("{}{} {}", prefix, c.name, c.usage);
            if c.description.is_empty() {
                head.trim_end().to_string()
            } else {
                format!("{} - {}", head.trim_end(), c.description)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl Command for Help {
    fn usage(&self) -> &str {
        "[command]"
    }

    fn description(&self) -> &str {
        "list commands"
    }

    async fn process(&self, ctx: &CommandContext, message: &Message, suffix: &str) -> Result<(), BotError> {
        let text = render_help(&ctx.plugins.commands(), ctx.prefix(), suffix.trim());
        ctx.actions.send_message(message, wrap(&text)).await?;
        Ok(())
    }
}

/// `plugin <list|load|unload|reload> [name]`
pub struct PluginCommand;

fn describe(report: &BatchReport) -> String {
    let mut lines = vec![format!("Loaded: {}", report.succeeded.join(", "))];
    for (name, e) in &report.failed {
        lines.push(format!("Failed {}: {}", name, e));
    }
    lines.join("\n")
}

#[async_trait]
impl Command for PluginCommand {
    fn usage(&self) -> &str {
        "<list|load|unload|reload> [name]"
    }

    fn description(&self) -> &str {
        "manage plugins"
    }

    async fn process(&self, ctx: &CommandContext, message: &Message, suffix: &str) -> Result<(), BotError> {
        let (sub, name) = split_word(suffix);
        let manager = &ctx.plugins;

        let reply = match (sub.to_lowercase().as_str(), name) {
            ("list", _) => {
                let lines: Vec<String> = manager
                    .list()
                    .await
                    .into_iter()
                    .map(|p| format!("{}: {}", p.name, p.commands.join(", ")))
                    .collect();
                if lines.is_empty() {
                    "No plugins loaded".to_string()
                } else {
                    lines.join("\n")
                }
            }
            ("load", name) if !name.is_empty() => match manager.load(name).await {
                Ok(()) => format!("Plugin '{}' loaded", name),
                Err(e) => e.to_string(),
            },
            ("unload", name) if !name.is_empty() => match manager.unload(name).await {
                Ok(()) => format!("Plugin '{}' unloaded", name),
                Err(e) => e.to_string(),
            },
            ("reload", _) => {
                info!("Reload requested from chat");
                describe(&manager.reload().await)
            }
            _ => format!("Usage: {}plugin {}", ctx.prefix(), self.usage()),
        };

        ctx.actions.send_message(message, wrap(&reply)).await?;
        Ok(())
    }
}
