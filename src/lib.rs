//! # KissBot WoWS Stats
//!
//! World of Warships match companion bot:
//! - Watches the game's `tempArenaInfo.json` for new matches
//! - Resolves every player through the rate-limited Wargaming API
//! - Posts friendly and enemy team stats to a chat channel, packed under
//!   the platform's message limit
//! - Answers `!wgstats <player> <ship>` lookups
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use kissbot_wows_stats::{AdmissionGate, CommandHandler, Region, StatsClient, WargamingProvider};
//! use std::num::NonZeroU32;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let gate = Arc::new(AdmissionGate::per_second(NonZeroU32::new(10).unwrap()));
//!     let provider = WargamingProvider::new(Region::Eu, "application-id", gate, Duration::from_secs(10))?;
//!     let client = Arc::new(StatsClient::new(Arc::new(provider)));
//!
//!     let commands = CommandHandler::new(client, "!wgstats");
//!     if let Some(reply) = commands.handle("!wgstats SomePlayer Yamato").await {
//!         println!("{}", reply.body());
//!     }
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod client;
pub mod commands;
pub mod config;
pub mod core;
pub mod error;
pub mod format;
pub mod monitor;
pub mod packer;
pub mod pipeline;
pub mod providers;
pub mod ranking;

// Re-export primary types
pub use channel::{ChatChannel, OutgoingMessage};
pub use client::StatsClient;
pub use commands::CommandHandler;
pub use config::Config;
pub use self::core::{Participant, Relation, ShipLookupResult, StatRecord, UnknownRelationPolicy};
pub use error::{BotError, Result};
pub use monitor::{MatchEvent, MatchMonitor};
pub use pipeline::{MatchOutcome, MatchPipeline, MatchReport, PipelineOptions};
pub use providers::{AdmissionGate, Region, WargamingApi, WargamingProvider};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
