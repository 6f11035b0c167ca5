//! Player, ship and stat lookups on top of the raw Wargaming API.

use futures::future::join_all;
use std::cmp::Ordering;
use std::sync::Arc;

use crate::core::{
    BulkResolution, LookupFailure, Participant, Relation, ResolvedIdentity, ShipLookupResult,
    ShipStats, StatRecord,
};
use crate::error::{BotError, Result};
use crate::providers::{AccountEntry, ShipStatsResponse, WargamingApi};
use crate::ranking::ClosestMatch;

fn name_not_found(name: &str) -> String {
    format!("{} was not found. Check your spelling and try again.", name)
}

fn ship_id_not_found(ship_id: u64) -> String {
    format!("{} was not found. Check the ID and try again.", ship_id)
}

/// Lookup operations used by the match pipeline and chat commands
pub struct StatsClient {
    api: Arc<dyn WargamingApi>,
}

impl StatsClient {
    pub fn new(api: Arc<dyn WargamingApi>) -> Self {
        Self { api }
    }

    /// Resolve one nickname to an account id.
    ///
    /// An exact (case-sensitive) nickname wins; otherwise the first search
    /// result is used.
    pub async fn resolve_player_id(&self, name: &str) -> Result<u64> {
        if name.is_empty() {
            return Err(BotError::MissingArgument("Player name"));
        }

        let entries = self.api.search_accounts(&[name.to_string()], false).await?;
        let entry = entries
            .iter()
            .find(|entry| entry.nickname == name)
            .or_else(|| entries.first())
            .ok_or_else(|| BotError::NotFound(name_not_found(name)))?;

        tracing::debug!("Player: {} ID: {}", entry.nickname, entry.account_id);
        Ok(entry.account_id)
    }

    /// Resolve every participant's account id with one request.
    ///
    /// When the bulk request is rejected by the API (typically one invalid
    /// name poisons the whole search) each name is resolved on its own
    /// instead. Transport failures are returned as is.
    pub async fn resolve_player_ids_bulk(&self, participants: &[Participant]) -> Result<BulkResolution> {
        if participants.is_empty() {
            return Err(BotError::MissingArgument("Player names"));
        }

        let names: Vec<String> = participants.iter().map(|p| p.name.clone()).collect();

        match self.api.search_accounts(&names, true).await {
            Ok(entries) => Ok(merge_bulk_results(participants, entries)),
            Err(BotError::Api { code, message }) => {
                tracing::warn!(
                    "Bulk player lookup rejected ({} {}), resolving {} players one by one",
                    code,
                    message,
                    participants.len()
                );
                Ok(self.resolve_individually(participants).await)
            }
            Err(e) => Err(e),
        }
    }

    async fn resolve_individually(&self, participants: &[Participant]) -> BulkResolution {
        let lookups = participants.iter().map(|participant| async move {
            let result = self.resolve_player_id(&participant.name).await;
            (participant.clone(), result)
        });
        aggregate_individual(join_all(lookups).await)
    }

    /// Resolve a ship name, falling back to the closest encyclopedia entry
    /// by edit distance when no exact (case-sensitive) match exists.
    pub async fn resolve_ship_id(&self, name: &str) -> Result<ShipLookupResult> {
        if name.is_empty() {
            return Err(BotError::MissingArgument("Ship name"));
        }

        let mut closest = ClosestMatch::new(name);
        let mut page_no = 1;

        loop {
            let page = self.api.ship_catalog_page(page_no).await?;

            for (ship_id, ship_name) in &page.ships {
                if ship_name == name {
                    tracing::debug!("Ship: {} ID: {}", ship_name, ship_id);
                    return Ok(ShipLookupResult::exact(*ship_id, ship_name.as_str()));
                }
                closest.offer(*ship_id, ship_name);
            }

            if page.is_last() || page.ships.is_empty() {
                break;
            }
            page_no += 1;
        }

        match closest.into_best() {
            Some(best) => {
                tracing::debug!(
                    "Ship: {} ID: {} (closest to '{}', distance {})",
                    best.name,
                    best.item,
                    name,
                    best.distance
                );
                Ok(ShipLookupResult::approximate(best.item, best.name))
            }
            None => Err(BotError::NotFound(name_not_found(name))),
        }
    }

    /// Encyclopedia name of a ship id
    pub async fn resolve_ship_name(&self, ship_id: u64) -> Result<String> {
        match self.api.ship_name(ship_id).await? {
            Some(name) => {
                tracing::debug!("Ship: {} ID: {}", name, ship_id);
                Ok(name)
            }
            None => Err(BotError::NotFound(ship_id_not_found(ship_id))),
        }
    }

    /// Fetch and classify a player's statistics in one ship
    pub async fn fetch_stats(&self, player_id: Option<u64>, ship_id: Option<u64>) -> Result<StatRecord> {
        let player_id = player_id.ok_or(BotError::MissingArgument("Player ID"))?;
        let ship_id = ship_id.ok_or(BotError::MissingArgument("Ship ID"))?;

        let response = self.api.ship_stats(player_id, ship_id).await?;
        let record = classify_stats(&response);
        tracing::debug!("Stats for {} in {}: {:?}", player_id, ship_id, record);
        Ok(record)
    }
}

/// Turn a raw stats answer into a record.
///
/// Private profiles win over everything else; a ship with PvE but no PvP
/// battles is a first PvP game.
pub fn classify_stats(response: &ShipStatsResponse) -> StatRecord {
    if response.hidden {
        return StatRecord::Hidden;
    }

    let entry = match &response.entry {
        Some(entry) => entry,
        None => return StatRecord::NeverPlayed,
    };

    match ShipStats::from_counters(&entry.pvp.unwrap_or_default()) {
        Some(stats) => StatRecord::Played(stats),
        None if entry.pve.map_or(false, |pve| pve.battles > 0) => StatRecord::FirstPvp,
        None => StatRecord::NeverPlayed,
    }
}

/// Match requested participants against the accounts a bulk search
/// returned.
///
/// Both sides are sorted by name (case-sensitive) and walked together.
/// Requested names without an account are missing with the
/// participant's relation; returned accounts nobody asked for are missing
/// with an unknown relation and are flagged as not requested.
pub fn merge_bulk_results(requested: &[Participant], returned: Vec<AccountEntry>) -> BulkResolution {
    let mut requested: Vec<&Participant> = requested.iter().collect();
    requested.sort_by(|a, b| a.name.cmp(&b.name));

    let mut returned = returned;
    returned.sort_by(|a, b| a.nickname.cmp(&b.nickname));

    let mut resolution = BulkResolution::default();
    let mut wanted = requested.into_iter().peekable();
    let mut found = returned.into_iter().peekable();

    loop {
        let order = match (wanted.peek(), found.peek()) {
            (Some(participant), Some(entry)) => participant.name.cmp(&entry.nickname),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => break,
        };

        match order {
            Ordering::Equal => {
                if let (Some(participant), Some(entry)) = (wanted.next(), found.next()) {
                    resolution
                        .matching
                        .push(ResolvedIdentity::new(participant.clone(), entry.account_id));
                }
            }
            Ordering::Less => {
                if let Some(participant) = wanted.next() {
                    resolution.missing.push(LookupFailure::new(
                        participant.name.as_str(),
                        name_not_found(&participant.name),
                        participant.relation,
                    ));
                }
            }
            Ordering::Greater => {
                if let Some(entry) = found.next() {
                    resolution.missing.push(LookupFailure::unrequested(
                        entry.nickname.as_str(),
                        format!("{} was returned but never requested.", entry.nickname),
                    ));
                }
            }
        }
    }

    resolution
}

/// Fold individual lookup results into a bulk resolution
pub fn aggregate_individual(results: Vec<(Participant, Result<u64>)>) -> BulkResolution {
    let mut resolution = BulkResolution::default();

    for (participant, result) in results {
        match result {
            Ok(player_id) => resolution
                .matching
                .push(ResolvedIdentity::new(participant, player_id)),
            Err(e) => {
                tracing::warn!("Player lookup failed for {}: {}", participant.name, e);
                resolution.missing.push(LookupFailure::new(
                    participant.name.as_str(),
                    e.to_string(),
                    participant.relation,
                ));
            }
        }
    }

    resolution
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Kd, PvpCounters};
    use crate::providers::{CatalogPage, PveCounters, ShipStatsEntry};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    /// In-memory API: accounts by nickname, a paged catalog and stats
    #[derive(Default)]
    struct FakeApi {
        accounts: HashMap<String, u64>,
        reject_bulk: bool,
        pages: Vec<Vec<(u64, String)>>,
        stats: HashMap<(u64, u64), ShipStatsResponse>,
        catalog_requests: AtomicUsize,
    }

    #[async_trait]
    impl WargamingApi for FakeApi {
        async fn search_accounts(&self, names: &[String], exact: bool) -> Result<Vec<AccountEntry>> {
            if exact && self.reject_bulk && names.len() > 1 {
                return Err(BotError::Api {
                    code: 407,
                    message: "INVALID_SEARCH".into(),
                });
            }
            if names.iter().any(|n| n == "boom") {
                return Err(BotError::Transport("connection reset".into()));
            }
            Ok(names
                .iter()
                .filter_map(|n| self.accounts.get(n).map(|id| AccountEntry::new(n.as_str(), *id)))
                .collect())
        }

        async fn ship_catalog_page(&self, page: u32) -> Result<CatalogPage> {
            self.catalog_requests.fetch_add(1, AtomicOrdering::SeqCst);
            let ships = self.pages.get(page as usize - 1).cloned().unwrap_or_default();
            Ok(CatalogPage {
                ships,
                page,
                page_total: self.pages.len() as u32,
            })
        }

        async fn ship_name(&self, ship_id: u64) -> Result<Option<String>> {
            Ok(self
                .pages
                .iter()
                .flatten()
                .find(|(id, _)| *id == ship_id)
                .map(|(_, name)| name.clone()))
        }

        async fn ship_stats(&self, player_id: u64, ship_id: u64) -> Result<ShipStatsResponse> {
            Ok(self.stats.get(&(player_id, ship_id)).cloned().unwrap_or_default())
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    fn client(api: FakeApi) -> StatsClient {
        StatsClient::new(Arc::new(api))
    }

    fn catalog() -> Vec<Vec<(u64, String)>> {
        vec![
            vec![(1, "Musashi".to_string()), (2, "Yamatoo".to_string())],
            vec![(3, "Iowa".to_string()), (4, "Yamato".to_string())],
            vec![(5, "Montana".to_string())],
        ]
    }

    #[tokio::test]
    async fn test_resolve_player_prefers_exact_nickname() {
        let api = FakeApi {
            accounts: HashMap::from([("Alpha".to_string(), 11)]),
            ..Default::default()
        };
        assert_eq!(client(api).resolve_player_id("Alpha").await.unwrap(), 11);
    }

    #[tokio::test]
    async fn test_resolve_name_not_found() {
        let err = client(FakeApi::default()).resolve_player_id("Ghost").await.unwrap_err();
        assert_eq!(err.to_string(), "Ghost was not found. Check your spelling and try again.");
    }

    #[tokio::test]
    async fn test_resolve_player_empty_name() {
        let err = client(FakeApi::default()).resolve_player_id("").await.unwrap_err();
        assert!(matches!(err, BotError::MissingArgument(_)));
    }

    #[tokio::test]
    async fn test_ship_exact_match_stops_paging() {
        let api = Arc::new(FakeApi {
            pages: catalog(),
            ..Default::default()
        });
        let client = StatsClient::new(api.clone());

        let ship = client.resolve_ship_id("Yamato").await.unwrap();
        assert_eq!(ship, ShipLookupResult::exact(4, "Yamato"));
        assert_eq!(api.catalog_requests.load(AtomicOrdering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_ship_closest_match_across_pages() {
        let api = Arc::new(FakeApi {
            pages: catalog(),
            ..Default::default()
        });
        let client = StatsClient::new(api.clone());

        let ship = client.resolve_ship_id("Montanna").await.unwrap();
        assert_eq!(ship.ship_id, 5);
        assert!(!ship.is_exact());
        assert_eq!(api.catalog_requests.load(AtomicOrdering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_ship_match_is_case_sensitive() {
        let ship = client(FakeApi {
            pages: catalog(),
            ..Default::default()
        })
        .resolve_ship_id("yamato")
        .await
        .unwrap();
        assert_eq!(ship.name, "Yamato");
        assert!(ship.warning.is_some());
    }

    #[tokio::test]
    async fn test_ship_empty_catalog() {
        let err = client(FakeApi::default()).resolve_ship_id("Yamato").await.unwrap_err();
        assert!(matches!(err, BotError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_resolve_ship_name() {
        let client = client(FakeApi {
            pages: catalog(),
            ..Default::default()
        });
        assert_eq!(client.resolve_ship_name(3).await.unwrap(), "Iowa");
        assert_eq!(
            client.resolve_ship_name(99).await.unwrap_err().to_string(),
            "99 was not found. Check the ID and try again."
        );
    }

    #[tokio::test]
    async fn test_fetch_stats_requires_ids() {
        let client = client(FakeApi::default());
        assert!(matches!(
            client.fetch_stats(None, Some(1)).await,
            Err(BotError::MissingArgument("Player ID"))
        ));
        assert!(matches!(
            client.fetch_stats(Some(1), None).await,
            Err(BotError::MissingArgument("Ship ID"))
        ));
    }

    #[tokio::test]
    async fn test_fetch_stats_played() {
        let response = ShipStatsResponse {
            hidden: false,
            entry: Some(ShipStatsEntry {
                pvp: Some(PvpCounters {
                    battles: 3,
                    survived_battles: 3,
                    frags: 4,
                    ..Default::default()
                }),
                pve: None,
            }),
        };
        let client = client(FakeApi {
            stats: HashMap::from([((11, 4), response)]),
            ..Default::default()
        });

        let record = client.fetch_stats(Some(11), Some(4)).await.unwrap();
        assert_eq!(record.stats().unwrap().kd, Kd::Infinite);
        assert_eq!(client.fetch_stats(Some(11), Some(5)).await.unwrap(), StatRecord::NeverPlayed);
    }

    #[test]
    fn test_classify_stats() {
        let hidden = ShipStatsResponse {
            hidden: true,
            entry: None,
        };
        assert_eq!(classify_stats(&hidden), StatRecord::Hidden);

        let pve_only = ShipStatsResponse {
            hidden: false,
            entry: Some(ShipStatsEntry {
                pvp: Some(PvpCounters::default()),
                pve: Some(PveCounters { battles: 5 }),
            }),
        };
        assert_eq!(classify_stats(&pve_only), StatRecord::FirstPvp);

        let nothing = ShipStatsResponse {
            hidden: false,
            entry: Some(ShipStatsEntry::default()),
        };
        assert_eq!(classify_stats(&nothing), StatRecord::NeverPlayed);
    }

    #[test]
    fn test_merge_bulk_results() {
        let requested = vec![
            Participant::new("Charlie", 3, Relation::Enemy),
            Participant::new("Alpha", 1, Relation::Yourself),
            Participant::new("Bravo", 2, Relation::Friendly),
        ];
        let returned = vec![
            AccountEntry::new("Charlie", 33),
            AccountEntry::new("Alpha", 11),
            AccountEntry::new("Zulu", 99),
        ];

        let resolution = merge_bulk_results(&requested, returned);

        let matched: Vec<_> = resolution
            .matching
            .iter()
            .map(|r| (r.participant.name.as_str(), r.player_id))
            .collect();
        assert_eq!(matched, vec![("Alpha", 11), ("Charlie", 33)]);
        assert_eq!(resolution.matching[0].participant.player_id, Some(11));

        assert_eq!(resolution.missing.len(), 2);
        assert_eq!(resolution.missing[0].name.as_deref(), Some("Bravo"));
        assert_eq!(resolution.missing[0].relation, Relation::Friendly);
        assert_eq!(resolution.missing[1].name.as_deref(), Some("Zulu"));
        assert_eq!(resolution.missing[1].relation, Relation::Unknown);
        assert!(resolution.missing[0].requested);
        assert!(!resolution.missing[1].requested);
    }

    #[test]
    fn test_merge_accounts_for_every_requested_name() {
        let requested = vec![
            Participant::new("Delta", 4, Relation::Enemy),
            Participant::new("Echo", 5, Relation::Enemy),
            Participant::new("alpha", 1, Relation::Friendly),
        ];
        let returned = vec![AccountEntry::new("Alpha", 11)];

        let resolution = merge_bulk_results(&requested, returned);
        assert!(resolution.matching.is_empty());
        // "Alpha" was not requested (case differs), the three requested names are missing
        assert_eq!(resolution.missing.len(), 4);
        let requested_missing = resolution.missing.iter().filter(|m| m.requested).count();
        assert_eq!(requested_missing, requested.len());
    }

    #[tokio::test]
    async fn test_bulk_falls_back_on_api_error() {
        let api = FakeApi {
            accounts: HashMap::from([("Alpha".to_string(), 11), ("Bravo".to_string(), 22)]),
            reject_bulk: true,
            ..Default::default()
        };
        let participants = vec![
            Participant::new("Alpha", 1, Relation::Friendly),
            Participant::new("Bravo", 2, Relation::Enemy),
            Participant::new("Ghost", 3, Relation::Enemy),
        ];

        let resolution = client(api).resolve_player_ids_bulk(&participants).await.unwrap();
        assert_eq!(resolution.matching.len(), 2);
        assert_eq!(resolution.missing.len(), 1);
        assert_eq!(
            resolution.missing[0].reason,
            "Ghost was not found. Check your spelling and try again."
        );
    }

    #[tokio::test]
    async fn test_bulk_transport_error_propagates() {
        let participants = vec![Participant::new("boom", 1, Relation::Friendly)];
        let err = client(FakeApi::default())
            .resolve_player_ids_bulk(&participants)
            .await
            .unwrap_err();
        assert!(matches!(err, BotError::Transport(_)));
    }

    #[tokio::test]
    async fn test_bulk_empty_list() {
        let err = client(FakeApi::default()).resolve_player_ids_bulk(&[]).await.unwrap_err();
        assert!(matches!(err, BotError::MissingArgument(_)));
    }
}
