use serde::{Deserialize, Serialize};
use std::fmt;

/// Kill/death ratio. `Infinite` when the player never lost this ship.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kd {
    Ratio(f64),
    Infinite,
}

impl fmt::Display for Kd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kd::Ratio(kd) => write!(f, "{:.2}", kd),
            Kd::Infinite => f.write_str("inf"),
        }
    }
}

/// Raw PvP counters of one player on one ship
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PvpCounters {
    #[serde(default)]
    pub battles: u64,
    #[serde(default)]
    pub wins: u64,
    #[serde(default)]
    pub damage_dealt: u64,
    #[serde(default)]
    pub xp: u64,
    #[serde(default)]
    pub survived_battles: u64,
    #[serde(default)]
    pub frags: u64,
    #[serde(default)]
    pub planes_killed: u64,
}

/// Derived per-ship statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipStats {
    pub total_battles: u64,
    /// Percentage (0-100)
    pub win_rate: f64,
    pub avg_dmg: f64,
    pub avg_xp: f64,
    /// Percentage (0-100)
    pub survival_rate: f64,
    pub avg_kills: f64,
    pub avg_plane_kills: f64,
    pub kd: Kd,
}

impl ShipStats {
    /// Derive averages from raw counters. Returns `None` when `battles == 0`.
    pub fn from_counters(pvp: &PvpCounters) -> Option<Self> {
        if pvp.battles == 0 {
            return None;
        }

        let battles = pvp.battles as f64;
        // survived can never exceed battles; clamp in case the API disagrees
        let deaths = pvp.battles.saturating_sub(pvp.survived_battles);
        let kd = if deaths == 0 {
            Kd::Infinite
        } else {
            Kd::Ratio(pvp.frags as f64 / deaths as f64)
        };

        Some(Self {
            total_battles: pvp.battles,
            win_rate: (pvp.wins as f64 / battles * 100.0).min(100.0),
            avg_dmg: pvp.damage_dealt as f64 / battles,
            avg_xp: pvp.xp as f64 / battles,
            survival_rate: (pvp.survived_battles as f64 / battles * 100.0).min(100.0),
            avg_kills: pvp.frags as f64 / battles,
            avg_plane_kills: pvp.planes_killed as f64 / battles,
            kd,
        })
    }
}

/// Outcome of a stats lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StatRecord {
    /// Player hides their profile
    Hidden,
    /// No games at all on this ship
    NeverPlayed,
    /// Only PvE games on this ship
    FirstPvp,
    Played(ShipStats),
}

impl StatRecord {
    /// Text shown instead of numbers, `None` for a full record
    pub fn sentinel_text(&self) -> Option<&'static str> {
        match self {
            StatRecord::Hidden => Some("Profile hidden."),
            StatRecord::NeverPlayed => Some("First game, or this player does not own this ship."),
            StatRecord::FirstPvp => {
                Some("First game in PvP, but has played this ship in PvE before.")
            }
            StatRecord::Played(_) => None,
        }
    }

    pub fn stats(&self) -> Option<&ShipStats> {
        match self {
            StatRecord::Played(stats) => Some(stats),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counters(battles: u64, survived: u64, frags: u64) -> PvpCounters {
        PvpCounters {
            battles,
            wins: battles / 2,
            damage_dealt: battles * 50_000,
            xp: battles * 1_200,
            survived_battles: survived,
            frags,
            planes_killed: battles * 3,
        }
    }

    #[test]
    fn test_zero_battles_has_no_stats() {
        assert!(ShipStats::from_counters(&counters(0, 0, 0)).is_none());
    }

    #[test]
    fn test_kd_infinite_when_never_sunk() {
        let stats = ShipStats::from_counters(&counters(10, 10, 7)).unwrap();
        assert_eq!(stats.kd, Kd::Infinite);
        assert_eq!(stats.kd.to_string(), "inf");
        assert_eq!(stats.survival_rate, 100.0);
    }

    #[test]
    fn test_derived_values() {
        let stats = ShipStats::from_counters(&counters(10, 4, 12)).unwrap();
        assert_eq!(stats.total_battles, 10);
        assert_eq!(stats.win_rate, 50.0);
        assert_eq!(stats.avg_dmg, 50_000.0);
        assert_eq!(stats.avg_xp, 1_200.0);
        assert_eq!(stats.survival_rate, 40.0);
        assert_eq!(stats.avg_kills, 1.2);
        assert_eq!(stats.avg_plane_kills, 3.0);
        assert_eq!(stats.kd, Kd::Ratio(2.0));
    }

    #[test]
    fn test_sentinels() {
        assert_eq!(StatRecord::Hidden.sentinel_text(), Some("Profile hidden."));
        assert!(StatRecord::NeverPlayed.sentinel_text().unwrap().starts_with("First game"));
        assert!(StatRecord::FirstPvp.sentinel_text().unwrap().contains("PvE"));

        let played = StatRecord::Played(ShipStats::from_counters(&counters(1, 0, 1)).unwrap());
        assert!(played.sentinel_text().is_none());
        assert!(played.stats().is_some());
    }
}
