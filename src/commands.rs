//! `!wgstats <player> <ship...>` chat command.

use std::sync::Arc;

use crate::channel::{OutgoingMessage, COLOR_OK, COLOR_WARNING};
use crate::client::StatsClient;
use crate::error::{BotError, Result};
use crate::format::{lookup_body, lookup_title};

pub const DEFAULT_PREFIX: &str = "!wgstats";

/// A well-formed stats command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsCommand {
    pub player: String,
    /// Ship name, may contain spaces
    pub ship: String,
}

/// Parse `content` as a command with `prefix`.
///
/// Returns `None` when the message is not addressed to us, and an
/// `InvalidFormat` error when it is but lacks a player or ship.
pub fn parse_command(prefix: &str, content: &str) -> Option<Result<StatsCommand>> {
    let mut tokens = content.split_whitespace();
    if tokens.next() != Some(prefix) {
        return None;
    }

    let player = tokens.next();
    let ship: Vec<&str> = tokens.collect();

    Some(match player {
        Some(player) if !ship.is_empty() => Ok(StatsCommand {
            player: player.to_string(),
            ship: ship.join(" "),
        }),
        _ => Err(BotError::InvalidFormat(format!(
            "Usage: {} <player> <ship name>",
            prefix
        ))),
    })
}

/// Answers stats commands with one reply each
pub struct CommandHandler {
    client: Arc<StatsClient>,
    prefix: String,
}

impl CommandHandler {
    pub fn new(client: Arc<StatsClient>, prefix: impl Into<String>) -> Self {
        Self {
            client,
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Reply to `content`, or `None` if it is not a command for us.
    /// Every failure ends up as exactly one error reply.
    pub async fn handle(&self, content: &str) -> Option<OutgoingMessage> {
        let command = parse_command(&self.prefix, content)?;

        let reply = match command {
            Ok(command) => self.lookup(&command).await,
            Err(e) => Err(e),
        };

        Some(reply.unwrap_or_else(|e| {
            tracing::warn!("Command '{}' failed: {}", content, e);
            OutgoingMessage::error("Error", e.to_string())
        }))
    }

    async fn lookup(&self, command: &StatsCommand) -> Result<OutgoingMessage> {
        let player_id = self.client.resolve_player_id(&command.player).await?;
        let ship = self.client.resolve_ship_id(&command.ship).await?;
        let record = self.client.fetch_stats(Some(player_id), Some(ship.ship_id)).await?;

        tracing::info!("Stats lookup: {} in {}", command.player, ship.name);

        let color = if ship.is_exact() { COLOR_OK } else { COLOR_WARNING };
        Ok(OutgoingMessage::embed(
            lookup_title(&command.player, &ship),
            lookup_body(&ship, &record),
            color,
        ))
    }
}
