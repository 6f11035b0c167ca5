//! Human-readable text for stat records, failures and team reports.

use crate::core::{ShipLookupResult, StatRecord, Team};

pub const MSG_MATCH_DETECTED: &str = "Detected a match! Loading player stats...";

const HEADER_FRIENDLY: &str = "==========\nFriendly Team\n==========\n\n";
const HEADER_ENEMY: &str = "=========\nEnemy Team\n=========\n\n";
const HEADER_UNKNOWN: &str = "==========\nUnknown Team\n==========\n\n";

/// Prefix that keeps a payload off the author line in Discord's compact mode
pub const COMPACT_PREFIX: &str = ".\n";

/// Stat lines of a record, or its sentinel line
fn stat_lines(record: &StatRecord) -> String {
    match record {
        StatRecord::Played(stats) => format!(
            "Battles: {}\n\
             Win Rate: {:.2}%\n\
             Average XP: {:.0}\n\
             Average Damage: {:.0}\n\
             Survival Rate: {:.2}%\n\
             Average Plane Kills: {:.2}\n\
             Average Kills: {:.2}\n\
             KD: {}\n",
            stats.total_battles,
            stats.win_rate,
            stats.avg_xp,
            stats.avg_dmg,
            stats.survival_rate,
            stats.avg_plane_kills,
            stats.avg_kills,
            stats.kd,
        ),
        sentinel => sentinel
            .sentinel_text()
            .map(|text| format!("{}\n", text))
            .unwrap_or_default(),
    }
}

/// `**player**: *ship*` followed by the stats or the sentinel line
pub fn format_stats(player_name: &str, ship_name: &str, record: &StatRecord) -> String {
    format!("**{}**: *{}*\n{}", player_name, ship_name, stat_lines(record))
}

/// Block placed in a team report for one player; blank line separates players
pub fn stat_block(player_name: &str, ship_name: &str, record: &StatRecord) -> String {
    format!("{}\n", format_stats(player_name, ship_name, record))
}

/// Block placed in a team report when a player's lookups failed
pub fn failure_block(player_name: &str, reason: &str) -> String {
    format!("**{}**: *stats unavailable*\n{}\n\n", player_name, reason)
}

/// Block for a participant whose team could not be determined
pub fn unknown_team_block(reason: &str) -> String {
    format!("*Unknown Team*: {}\n", reason)
}

pub fn team_header(team: Team) -> &'static str {
    match team {
        Team::Friendly => HEADER_FRIENDLY,
        Team::Enemy => HEADER_ENEMY,
        Team::Unknown => HEADER_UNKNOWN,
    }
}

/// The single channel warning sent for a match with failed lookups
pub fn match_error_warning(reason: &str) -> String {
    format!(
        "**ERROR**: Error while processing match. Additional errors will not be sent here \
         and will only be logged in the bot console. Some stats may be missing:\n{}\n",
        reason
    )
}

/// Title of a `!wgstats` reply
pub fn lookup_title(player_name: &str, ship: &ShipLookupResult) -> String {
    format!("{}: {}", player_name, ship.name)
}

/// Body of a `!wgstats` reply, approximate-match warning first
pub fn lookup_body(ship: &ShipLookupResult, record: &StatRecord) -> String {
    match &ship.warning {
        Some(warning) => format!("*{}*\n{}", warning, stat_lines(record)),
        None => stat_lines(record),
    }
}
