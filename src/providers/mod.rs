pub mod limiter;
pub mod wargaming;

use async_trait::async_trait;
use serde::Deserialize;

use crate::core::PvpCounters;
use crate::error::Result;

pub use limiter::AdmissionGate;
pub use wargaming::{Region, WargamingProvider};

/// One row of an `account/list` search
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccountEntry {
    pub nickname: String,
    pub account_id: u64,
}

impl AccountEntry {
    pub fn new(nickname: impl Into<String>, account_id: u64) -> Self {
        Self {
            nickname: nickname.into(),
            account_id,
        }
    }
}

/// One page of the ship encyclopedia, as `(ship_id, name)` pairs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogPage {
    pub ships: Vec<(u64, String)>,
    pub page: u32,
    pub page_total: u32,
}

impl CatalogPage {
    /// True when no page follows this one
    pub fn is_last(&self) -> bool {
        self.page >= self.page_total
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct PveCounters {
    #[serde(default)]
    pub battles: u64,
}

/// Per-ship statistics of one account
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ShipStatsEntry {
    #[serde(default)]
    pub pvp: Option<PvpCounters>,
    #[serde(default)]
    pub pve: Option<PveCounters>,
}

/// Answer of a `ships/stats` request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShipStatsResponse {
    /// The account's profile is private
    pub hidden: bool,
    /// `None` when the account never took this ship out
    pub entry: Option<ShipStatsEntry>,
}

/// Raw access to the Wargaming public API.
///
/// Implementations only speak the wire protocol; name matching, fallbacks
/// and stat classification live in [`crate::client::StatsClient`].
#[async_trait]
pub trait WargamingApi: Send + Sync {
    /// Search accounts by nickname. `exact` asks for exact matching, which
    /// is also what allows several comma-separated names in one request.
    async fn search_accounts(&self, names: &[String], exact: bool) -> Result<Vec<AccountEntry>>;

    /// Fetch one page (1-based) of the ship encyclopedia
    async fn ship_catalog_page(&self, page: u32) -> Result<CatalogPage>;

    /// Encyclopedia name of a ship id, `None` when the id is unknown
    async fn ship_name(&self, ship_id: u64) -> Result<Option<String>>;

    /// Statistics of `player_id` in `ship_id`
    async fn ship_stats(&self, player_id: u64, ship_id: u64) -> Result<ShipStatsResponse>;

    /// Get provider name
    fn name(&self) -> &str;
}
