use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use crate::core::Relation;

/// Identifies one detected match. Monotonic per pipeline.
pub type SessionId = u64;

/// Pipeline state, as seen from the session slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPhase {
    Watching,
    Detected,
    Resolving,
    Packing,
    Dispatched,
}

/// Where participants with an unknown relation are reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownRelationPolicy {
    /// Appended to the enemy report with an "Unknown Team" marker
    #[default]
    Enemy,
    /// Sent as a third report after the enemy team
    Separate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Team {
    Friendly,
    Enemy,
    Unknown,
}

/// One formatted text block of a team report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportBlock {
    /// Player name the block describes; reports are ordered by it
    pub sort_key: String,
    pub text: String,
}

impl ReportBlock {
    pub fn new(sort_key: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            sort_key: sort_key.into(),
            text: text.into(),
        }
    }
}

/// Blocks of one team, in arrival order until finalized
#[derive(Debug, Clone)]
pub struct TeamReport {
    pub team: Team,
    blocks: Vec<ReportBlock>,
}

impl TeamReport {
    pub fn new(team: Team) -> Self {
        Self {
            team,
            blocks: Vec::new(),
        }
    }

    pub fn push(&mut self, block: ReportBlock) {
        self.blocks.push(block);
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Block texts sorted case-insensitively by player name.
    /// The sort is stable so equal names keep arrival order.
    pub fn into_sorted_texts(mut self) -> Vec<String> {
        self.blocks.sort_by_cached_key(|b| b.sort_key.to_lowercase());
        self.blocks.into_iter().map(|b| b.text).collect()
    }
}

/// What one participant's lookup chain produced
#[derive(Debug, Clone)]
pub struct ParticipantOutcome {
    pub relation: Relation,
    pub block: ReportBlock,
    /// Failure reason, `None` on success
    pub failure: Option<String>,
}

impl ParticipantOutcome {
    pub fn success(relation: Relation, block: ReportBlock) -> Self {
        Self {
            relation,
            block,
            failure: None,
        }
    }

    pub fn failure(relation: Relation, block: ReportBlock, reason: impl Into<String>) -> Self {
        Self {
            relation,
            block,
            failure: Some(reason.into()),
        }
    }
}

/// Mutable state of one match, from detection until packing
#[derive(Debug)]
pub struct MatchSession {
    pub id: SessionId,
    pub total_participants: usize,
    pub processed_count: usize,
    pub friendly: TeamReport,
    pub enemy: TeamReport,
    pub unknown: TeamReport,
    pub error_flag_raised: bool,
    pub started_at: DateTime<Utc>,
    pub started: Instant,
    pub phase: MatchPhase,
    unknown_policy: UnknownRelationPolicy,
}

impl MatchSession {
    pub fn new(id: SessionId, total_participants: usize, unknown_policy: UnknownRelationPolicy) -> Self {
        Self {
            id,
            total_participants,
            processed_count: 0,
            friendly: TeamReport::new(Team::Friendly),
            enemy: TeamReport::new(Team::Enemy),
            unknown: TeamReport::new(Team::Unknown),
            error_flag_raised: false,
            started_at: Utc::now(),
            started: Instant::now(),
            phase: MatchPhase::Detected,
            unknown_policy,
        }
    }

    pub fn team_for(&self, relation: Relation) -> Team {
        match relation {
            Relation::Yourself | Relation::Friendly => Team::Friendly,
            Relation::Enemy => Team::Enemy,
            Relation::Unknown => match self.unknown_policy {
                UnknownRelationPolicy::Enemy => Team::Enemy,
                UnknownRelationPolicy::Separate => Team::Unknown,
            },
        }
    }

    pub fn is_complete(&self) -> bool {
        self.processed_count == self.total_participants
    }

    /// Append one outcome. Returns the failure reason if this outcome is the
    /// first failure of the session.
    fn apply(&mut self, outcome: ParticipantOutcome) -> Option<String> {
        let team = self.team_for(outcome.relation);
        match team {
            Team::Friendly => self.friendly.push(outcome.block),
            Team::Enemy => self.enemy.push(outcome.block),
            Team::Unknown => self.unknown.push(outcome.block),
        }
        self.processed_count += 1;

        match outcome.failure {
            Some(reason) if !self.error_flag_raised => {
                self.error_flag_raised = true;
                Some(reason)
            }
            Some(reason) => {
                tracing::warn!("Match {}: additional lookup failure: {}", self.id, reason);
                None
            }
            None => None,
        }
    }

    fn finish(mut self) -> FinishedSession {
        self.phase = MatchPhase::Packing;
        let unknown = if self.unknown.is_empty() {
            None
        } else {
            Some(self.unknown)
        };
        FinishedSession {
            id: self.id,
            total_participants: self.total_participants,
            friendly: self.friendly,
            enemy: self.enemy,
            unknown,
            error_flag_raised: self.error_flag_raised,
            started_at: self.started_at,
            started: self.started,
        }
    }
}

/// Session taken out of the slot once every participant is accounted for
#[derive(Debug)]
pub struct FinishedSession {
    pub id: SessionId,
    pub total_participants: usize,
    pub friendly: TeamReport,
    pub enemy: TeamReport,
    pub unknown: Option<TeamReport>,
    pub error_flag_raised: bool,
    pub started_at: DateTime<Utc>,
    pub started: Instant,
}

/// Result of recording one outcome into the slot
#[derive(Debug)]
pub enum RecordResult {
    /// The outcome belongs to an abandoned session and was dropped
    Stale,
    Accepted {
        /// Set only for the session's first failure
        first_failure: Option<String>,
        /// Set only for the record that completed the session
        finished: Option<FinishedSession>,
    },
}

/// Holds the current match session. Every mutation of the team reports,
/// the processed counter and the error flag happens under this one mutex.
#[derive(Debug, Default)]
pub struct SessionSlot {
    inner: Mutex<Option<MatchSession>>,
}

impl SessionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<MatchSession>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Install a new session, returning the id of the one it replaced
    pub fn install(&self, session: MatchSession) -> Option<SessionId> {
        self.lock().replace(session).map(|old| old.id)
    }

    /// Drop the current session, returning its id
    pub fn abandon(&self) -> Option<SessionId> {
        self.lock().take().map(|old| old.id)
    }

    pub fn current_id(&self) -> Option<SessionId> {
        self.lock().as_ref().map(|s| s.id)
    }

    pub fn phase(&self) -> MatchPhase {
        self.lock().as_ref().map(|s| s.phase).unwrap_or(MatchPhase::Watching)
    }

    pub fn set_phase(&self, id: SessionId, phase: MatchPhase) {
        if let Some(session) = self.lock().as_mut().filter(|s| s.id == id) {
            session.phase = phase;
        }
    }

    /// Record one participant outcome for session `id`.
    ///
    /// The record that brings `processed_count` to `total_participants`
    /// takes the session out of the slot, so completion is observed once.
    pub fn record(&self, id: SessionId, outcome: ParticipantOutcome) -> RecordResult {
        let mut guard = self.lock();

        let session = match guard.as_mut() {
            Some(session) if session.id == id => session,
            _ => return RecordResult::Stale,
        };

        let first_failure = session.apply(outcome);

        let finished = if session.is_complete() {
            guard.take().map(MatchSession::finish)
        } else {
            None
        };

        RecordResult::Accepted {
            first_failure,
            finished,
        }
    }

    /// Complete a session that has nothing to wait for (no participants)
    pub fn finish_if_complete(&self, id: SessionId) -> Option<FinishedSession> {
        let mut guard = self.lock();
        match guard.as_ref() {
            Some(session) if session.id == id && session.is_complete() => {
                guard.take().map(MatchSession::finish)
            }
            _ => None,
        }
    }
}
