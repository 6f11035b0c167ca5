use serde::{Deserialize, Serialize};

/// Shown when only an approximate ship name could be found
pub const WARN_NO_EXACT_MATCH_SHIP: &str =
    "An exact ship name match was not found; showing the closest result.";

/// Ship resolved from a (possibly misspelled) name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipLookupResult {
    pub ship_id: u64,
    /// Name as spelled in the encyclopedia
    pub name: String,
    /// Set when `name` is an edit-distance match rather than exact
    #[serde(default)]
    pub warning: Option<String>,
}

impl ShipLookupResult {
    pub fn exact(ship_id: u64, name: impl Into<String>) -> Self {
        Self {
            ship_id,
            name: name.into(),
            warning: None,
        }
    }

    pub fn approximate(ship_id: u64, name: impl Into<String>) -> Self {
        Self {
            ship_id,
            name: name.into(),
            warning: Some(WARN_NO_EXACT_MATCH_SHIP.to_string()),
        }
    }

    pub fn is_exact(&self) -> bool {
        self.warning.is_none()
    }
}
