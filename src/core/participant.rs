use serde::{Deserialize, Serialize};
use std::fmt;

/// Team affiliation relative to the bot's owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    Yourself,
    Friendly,
    Enemy,
    Unknown,
}

impl Relation {
    /// Map the game client's integer code (0 = self, 1 = friendly, 2 = enemy)
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Relation::Yourself,
            1 => Relation::Friendly,
            2 => Relation::Enemy,
            _ => Relation::Unknown,
        }
    }

    /// Self and friendly share the friendly report
    pub fn is_friendly(&self) -> bool {
        matches!(self, Relation::Yourself | Relation::Friendly)
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Relation::Yourself => "self",
            Relation::Friendly => "friendly",
            Relation::Enemy => "enemy",
            Relation::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Deserialize relation from the integer code of the match file
fn deserialize_relation<'de, D>(deserializer: D) -> Result<Relation, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RelationValue {
        Int(i64),
        Null,
    }

    match RelationValue::deserialize(deserializer)? {
        RelationValue::Int(code) => Ok(Relation::from_code(code)),
        RelationValue::Null => Ok(Relation::Unknown),
    }
}

fn default_relation() -> Relation {
    Relation::Unknown
}

/// One vehicle entry of the match file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    /// In-game nickname
    pub name: String,

    /// Ship id as used by the encyclopedia
    #[serde(rename = "shipId")]
    pub ship_id: u64,

    #[serde(default = "default_relation", deserialize_with = "deserialize_relation")]
    pub relation: Relation,

    /// Attached once name resolution succeeds
    #[serde(skip)]
    pub player_id: Option<u64>,
}

impl Participant {
    pub fn new(name: impl Into<String>, ship_id: u64, relation: Relation) -> Self {
        Self {
            name: name.into(),
            ship_id,
            relation,
            player_id: None,
        }
    }
}

/// Participant whose account id is known
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedIdentity {
    pub participant: Participant,
    pub player_id: u64,
}

impl ResolvedIdentity {
    pub fn new(mut participant: Participant, player_id: u64) -> Self {
        participant.player_id = Some(player_id);
        Self {
            participant,
            player_id,
        }
    }
}

/// Name resolution failed for a participant
#[derive(Debug, Clone, PartialEq)]
pub struct LookupFailure {
    /// Name the failure is about, when known
    pub name: Option<String>,
    pub reason: String,
    pub relation: Relation,
    /// False for accounts the provider returned without being asked for.
    /// Those are not participants of the match.
    pub requested: bool,
}

impl LookupFailure {
    pub fn new(name: impl Into<String>, reason: impl Into<String>, relation: Relation) -> Self {
        Self {
            name: Some(name.into()),
            reason: reason.into(),
            relation,
            requested: true,
        }
    }

    /// Account returned by a bulk search that matches no requested name
    pub fn unrequested(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            requested: false,
            ..Self::new(name, reason, Relation::Unknown)
        }
    }
}

/// Result of a multi-player id lookup
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkResolution {
    pub matching: Vec<ResolvedIdentity>,
    pub missing: Vec<LookupFailure>,
}

/// `tempArenaInfo.json` as written by the game client.
/// Only the vehicle list is read; everything else is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct MatchFile {
    #[serde(default)]
    pub vehicles: Vec<Participant>,
}

impl MatchFile {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
