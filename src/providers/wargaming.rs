use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{BotError, Result};
use crate::providers::{
    AccountEntry, AdmissionGate, CatalogPage, ShipStatsEntry, ShipStatsResponse, WargamingApi,
};

const STATS_FIELDS: &str = "pvp.battles,pvp.wins,pvp.damage_dealt,pvp.xp,\
                            pvp.survived_battles,pvp.frags,pvp.planes_killed,pve.battles";

/// Wargaming API realm
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    #[default]
    Na,
    Eu,
    Ru,
    Asia,
}

impl Region {
    pub fn base_url(&self) -> &'static str {
        match self {
            Region::Na => "https://api.worldofwarships.com/wows/",
            Region::Eu => "https://api.worldofwarships.eu/wows/",
            Region::Ru => "https://api.worldofwarships.ru/wows/",
            Region::Asia => "https://api.worldofwarships.asia/wows/",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Region::Na => "na",
            Region::Eu => "eu",
            Region::Ru => "ru",
            Region::Asia => "asia",
        };
        f.write_str(s)
    }
}

impl FromStr for Region {
    type Err = BotError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "na" | "com" => Ok(Region::Na),
            "eu" => Ok(Region::Eu),
            "ru" => Ok(Region::Ru),
            "asia" => Ok(Region::Asia),
            other => Err(BotError::Config(format!("Unknown region '{}'", other))),
        }
    }
}

/// Common wrapper of every Wargaming API answer
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    status: String,
    meta: Option<ApiMeta>,
    data: Option<T>,
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiMeta {
    #[serde(default)]
    page: Option<u32>,
    #[serde(default)]
    page_total: Option<u32>,
    /// Accounts whose profile is private
    #[serde(default)]
    hidden: Option<Vec<u64>>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ShipNameEntry {
    #[serde(default)]
    name: Option<String>,
}

/// Ship entries keyed by numeric id; `BTreeMap` keeps ascending id order
type ShipNameData = BTreeMap<u64, Option<ShipNameEntry>>;
type ShipStatsData = BTreeMap<u64, Option<Vec<ShipStatsEntry>>>;

/// Split an envelope into its metadata and data, or the API error it carries
fn decode_envelope<T: DeserializeOwned>(body: &str) -> Result<(ApiMeta, Option<T>)> {
    let envelope: ApiEnvelope<T> = serde_json::from_str(body)?;

    if envelope.status != "ok" {
        return Err(match envelope.error {
            Some(error) => BotError::Api {
                code: error.code,
                message: error.message,
            },
            None => BotError::Api {
                code: 0,
                message: format!("status '{}' without error details", envelope.status),
            },
        });
    }

    Ok((envelope.meta.unwrap_or_default(), envelope.data))
}

fn catalog_page(meta: ApiMeta, data: Option<ShipNameData>, requested: u32) -> CatalogPage {
    let ships = data
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(id, entry)| entry.and_then(|e| e.name).map(|name| (id, name)))
        .collect();

    CatalogPage {
        ships,
        page: meta.page.unwrap_or(requested),
        page_total: meta.page_total.unwrap_or(requested),
    }
}

fn stats_response(meta: ApiMeta, data: Option<ShipStatsData>, player_id: u64) -> ShipStatsResponse {
    let hidden = meta.hidden.map_or(false, |hidden| !hidden.is_empty());
    let entry = data
        .and_then(|mut data| data.remove(&player_id))
        .flatten()
        .and_then(|entries| entries.into_iter().next());

    ShipStatsResponse { hidden, entry }
}

/// Wargaming API provider over HTTPS.
///
/// Every request waits at the shared [`AdmissionGate`] first.
pub struct WargamingProvider {
    client: Client,
    base_url: String,
    application_id: String,
    gate: Arc<AdmissionGate>,
}

impl WargamingProvider {
    /// Create a provider for `region`
    pub fn new(
        region: Region,
        application_id: impl Into<String>,
        gate: Arc<AdmissionGate>,
        timeout: Duration,
    ) -> Result<Self> {
        Self::with_base_url(region.base_url(), application_id, gate, timeout)
    }

    /// Create a provider talking to a custom endpoint (proxy, mirror)
    pub fn with_base_url(
        base_url: impl Into<String>,
        application_id: impl Into<String>,
        gate: Arc<AdmissionGate>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Ok(Self {
            client,
            base_url,
            application_id: application_id.into(),
            gate,
        })
    }

    fn endpoint_url(&self, endpoint: &str, params: &[(&str, String)]) -> String {
        let mut url = format!(
            "{}{}?application_id={}",
            self.base_url,
            endpoint,
            urlencoding::encode(&self.application_id)
        );
        for (key, value) in params {
            url.push('&');
            url.push_str(key);
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
        url
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<(ApiMeta, Option<T>)> {
        let url = self.endpoint_url(endpoint, params);

        self.gate.acquire().await;
        tracing::debug!("GET {} {:?}", endpoint, params);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| BotError::Transport(format!("{} request failed: {}", endpoint, e)))?;

        if !response.status().is_success() {
            return Err(BotError::Transport(format!(
                "{} answered HTTP {}",
                endpoint,
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| BotError::Transport(format!("{} body unreadable: {}", endpoint, e)))?;

        decode_envelope(&body)
    }
}

#[async_trait]
impl WargamingApi for WargamingProvider {
    async fn search_accounts(&self, names: &[String], exact: bool) -> Result<Vec<AccountEntry>> {
        let mut params = vec![("search", names.join(","))];
        if exact {
            params.push(("type", "exact".to_string()));
        }

        let (_, data) = self.get::<Vec<AccountEntry>>("account/list/", &params).await?;
        Ok(data.unwrap_or_default())
    }

    async fn ship_catalog_page(&self, page: u32) -> Result<CatalogPage> {
        let params = [("fields", "name".to_string()), ("page_no", page.to_string())];
        let (meta, data) = self.get::<ShipNameData>("encyclopedia/ships/", &params).await?;
        Ok(catalog_page(meta, data, page))
    }

    async fn ship_name(&self, ship_id: u64) -> Result<Option<String>> {
        let params = [("ship_id", ship_id.to_string()), ("fields", "name".to_string())];
        let (_, data) = self.get::<ShipNameData>("encyclopedia/ships/", &params).await?;

        Ok(data
            .and_then(|mut data| data.remove(&ship_id))
            .flatten()
            .and_then(|entry| entry.name))
    }

    async fn ship_stats(&self, player_id: u64, ship_id: u64) -> Result<ShipStatsResponse> {
        let params = [
            ("account_id", player_id.to_string()),
            ("ship_id", ship_id.to_string()),
            ("fields", STATS_FIELDS.to_string()),
        ];
        let (meta, data) = self.get::<ShipStatsData>("ships/stats/", &params).await?;
        Ok(stats_response(meta, data, player_id))
    }

    fn name(&self) -> &str {
        "wargaming"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroU32;

    fn provider() -> WargamingProvider {
        let gate = Arc::new(AdmissionGate::per_second(NonZeroU32::new(10).unwrap()));
        WargamingProvider::new(Region::Eu, "app id", gate, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_region_urls() {
        assert_eq!(Region::Na.base_url(), "https://api.worldofwarships.com/wows/");
        assert_eq!(Region::Asia.base_url(), "https://api.worldofwarships.asia/wows/");
        assert_eq!("EU".parse::<Region>().unwrap(), Region::Eu);
        assert!("moon".parse::<Region>().is_err());
    }

    #[test]
    fn test_endpoint_url_encodes_params() {
        let url = provider().endpoint_url(
            "account/list/",
            &[("search", "Alpha,Bravo Two".to_string()), ("type", "exact".to_string())],
        );
        assert_eq!(
            url,
            "https://api.worldofwarships.eu/wows/account/list/?application_id=app%20id\
             &search=Alpha%2CBravo%20Two&type=exact"
        );
    }

    #[test]
    fn test_decode_error_envelope() {
        let body = r#"{"status":"error","error":{"field":"search","message":"INVALID_SEARCH","code":407,"value":"x"}}"#;
        let err = decode_envelope::<Vec<AccountEntry>>(body).unwrap_err();
        match err {
            BotError::Api { code, message } => {
                assert_eq!(code, 407);
                assert_eq!(message, "INVALID_SEARCH");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_decode_envelope_without_optional_parts() {
        let (meta, data) = decode_envelope::<Vec<AccountEntry>>(r#"{"status":"ok"}"#).unwrap();
        assert!(data.is_none());
        assert!(meta.hidden.is_none());

        let (_, data) = decode_envelope::<ShipNameData>(r#"{"status":"ok","data":null}"#).unwrap();
        assert!(data.is_none());
    }

    #[test]
    fn test_decode_accounts() {
        let body = r#"{"status":"ok","meta":{"count":2},"data":[
            {"nickname":"Alpha","account_id":11},
            {"nickname":"Bravo","account_id":22}
        ]}"#;
        let (_, data) = decode_envelope::<Vec<AccountEntry>>(body).unwrap();
        assert_eq!(
            data.unwrap(),
            vec![AccountEntry::new("Alpha", 11), AccountEntry::new("Bravo", 22)]
        );
    }

    #[test]
    fn test_catalog_page_in_id_order() {
        let body = r#"{"status":"ok","meta":{"count":3,"page_total":4,"page":2},"data":{
            "4282300400":{"name":"Yamato"},
            "3751753680":{"name":"Musashi"},
            "900":null
        }}"#;
        let (meta, data) = decode_envelope::<ShipNameData>(body).unwrap();
        let page = catalog_page(meta, data, 2);

        assert_eq!(
            page.ships,
            vec![
                (3751753680, "Musashi".to_string()),
                (4282300400, "Yamato".to_string())
            ]
        );
        assert_eq!((page.page, page.page_total), (2, 4));
        assert!(!page.is_last());
    }

    #[test]
    fn test_stats_response_hidden() {
        let body = r#"{"status":"ok","meta":{"count":1,"hidden":[11]},"data":{"11":null}}"#;
        let (meta, data) = decode_envelope::<ShipStatsData>(body).unwrap();
        let response = stats_response(meta, data, 11);
        assert!(response.hidden);
        assert!(response.entry.is_none());
    }

    #[test]
    fn test_stats_response_entry() {
        let body = r#"{"status":"ok","meta":{"count":1,"hidden":null},"data":{"11":[
            {"pvp":{"battles":10,"wins":6,"damage_dealt":500000,"xp":12000,
                    "survived_battles":4,"frags":8,"planes_killed":3},
             "pve":{"battles":2}}
        ]}}"#;
        let (meta, data) = decode_envelope::<ShipStatsData>(body).unwrap();
        let response = stats_response(meta, data, 11);

        assert!(!response.hidden);
        let entry = response.entry.unwrap();
        assert_eq!(entry.pvp.unwrap().battles, 10);
        assert_eq!(entry.pve.unwrap().battles, 2);
    }

    #[test]
    fn test_stats_response_never_played() {
        let body = r#"{"status":"ok","meta":{"count":1},"data":{"11":null}}"#;
        let (meta, data) = decode_envelope::<ShipStatsData>(body).unwrap();
        assert_eq!(stats_response(meta, data, 11), ShipStatsResponse::default());
    }
}
