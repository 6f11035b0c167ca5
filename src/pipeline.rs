//! Match pipeline: from a detected match file to team reports in the chat
//! channel.
//!
//! Each participant is looked up in its own task. Outcomes are recorded in
//! the [`SessionSlot`]; the task whose outcome completes the session hands
//! the finished session back, and the pipeline packs and sends it.

use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::channel::{ChatChannel, OutgoingMessage};
use crate::client::StatsClient;
use crate::core::{
    FinishedSession, LookupFailure, MatchFile, MatchPhase, MatchSession, Participant,
    ParticipantOutcome, RecordResult, Relation, ReportBlock, SessionId, SessionSlot, TeamReport,
    UnknownRelationPolicy,
};
use crate::error::Result;
use crate::format::{
    failure_block, match_error_warning, stat_block, team_header, unknown_team_block,
    COMPACT_PREFIX, MSG_MATCH_DETECTED,
};
use crate::monitor::MatchEvent;
use crate::packer::{pack_blocks, text_len};

/// Pipeline settings
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub max_message_length: usize,
    /// Prefix every report payload so compact-mode chat clients render it
    /// on its own line
    pub compact_format: bool,
    pub unknown_relation: UnknownRelationPolicy,
    /// Where the match file is copied before it is parsed
    pub working_copy: PathBuf,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            max_message_length: 2000,
            compact_format: false,
            unknown_relation: UnknownRelationPolicy::default(),
            working_copy: PathBuf::from("tempArenaInfo2.json"),
        }
    }
}

impl PipelineOptions {
    /// Largest payload the packer may build
    pub fn payload_ceiling(&self) -> usize {
        if self.compact_format {
            self.max_message_length.saturating_sub(text_len(COMPACT_PREFIX))
        } else {
            self.max_message_length
        }
    }
}

/// What happened to a processed match
#[derive(Debug)]
pub enum MatchOutcome {
    Dispatched(MatchReport),
    /// A newer match (or the end of the match) replaced this session
    /// before every participant was accounted for
    Abandoned(SessionId),
}

/// Summary of a dispatched match
#[derive(Debug, Clone)]
pub struct MatchReport {
    pub session_id: SessionId,
    pub participants: usize,
    /// Team payloads in send order, as sent
    pub payloads: Vec<String>,
    pub failed_sends: usize,
    pub had_errors: bool,
    pub elapsed: Duration,
}

/// Drives one match at a time from detection to dispatch
pub struct MatchPipeline {
    client: Arc<StatsClient>,
    channel: Arc<dyn ChatChannel>,
    options: PipelineOptions,
    slot: Arc<SessionSlot>,
    /// Phase of a finished session while it is packed and sent
    dispatch_phase: Mutex<Option<MatchPhase>>,
    next_id: AtomicU64,
}

impl MatchPipeline {
    pub fn new(client: Arc<StatsClient>, channel: Arc<dyn ChatChannel>, options: PipelineOptions) -> Self {
        Self {
            client,
            channel,
            options,
            slot: Arc::new(SessionSlot::new()),
            dispatch_phase: Mutex::new(None),
            next_id: AtomicU64::new(0),
        }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Phase of the current match, `Watching` when there is none
    pub fn phase(&self) -> MatchPhase {
        match self.slot.phase() {
            MatchPhase::Watching => self.dispatch_phase().unwrap_or(MatchPhase::Watching),
            phase => phase,
        }
    }

    fn dispatch_phase(&self) -> Option<MatchPhase> {
        *self.dispatch_phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_dispatch_phase(&self, phase: Option<MatchPhase>) {
        *self.dispatch_phase.lock().unwrap_or_else(PoisonError::into_inner) = phase;
    }

    /// Drop the current match; late results for it are discarded
    pub fn abandon(&self) -> Option<SessionId> {
        let abandoned = self.slot.abandon();
        if let Some(id) = abandoned {
            tracing::info!("Match {} abandoned", id);
        }
        abandoned
    }

    /// React to a match file event. Returns the handle of the match task
    /// when a new match was started.
    pub fn handle_event(self: &Arc<Self>, event: MatchEvent) -> Option<JoinHandle<Result<MatchOutcome>>> {
        let path = match event {
            MatchEvent::Appeared(path) => path,
            MatchEvent::Changed(path) => {
                self.abandon();
                path
            }
            MatchEvent::Removed(_) => {
                self.abandon();
                return None;
            }
        };

        let pipeline = Arc::clone(self);
        Some(tokio::spawn(async move {
            let outcome = pipeline.process_match(&path).await;
            if let Err(e) = &outcome {
                tracing::error!("Failed to process match file {}: {}", path.display(), e);
            }
            outcome
        }))
    }

    /// Process one match file end to end
    pub async fn process_match(&self, path: &Path) -> Result<MatchOutcome> {
        let participants = self.load_match_file(path).await?;
        let total = participants.len();

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(old) = self
            .slot
            .install(MatchSession::new(id, total, self.options.unknown_relation))
        {
            tracing::info!("Match {} replaced by match {}", old, id);
        }
        tracing::info!("Detected match {} with {} players", id, total);

        send_logged(&self.channel, OutgoingMessage::text(MSG_MATCH_DETECTED)).await;

        let finished = if participants.is_empty() {
            self.slot.finish_if_complete(id)
        } else {
            self.slot.set_phase(id, MatchPhase::Resolving);
            self.resolve_all(id, participants).await
        };

        match finished {
            Some(finished) => Ok(MatchOutcome::Dispatched(self.dispatch(finished).await)),
            None => {
                tracing::info!("Match {} was abandoned before all stats were loaded", id);
                Ok(MatchOutcome::Abandoned(id))
            }
        }
    }

    async fn load_match_file(&self, path: &Path) -> Result<Vec<Participant>> {
        let copy = &self.options.working_copy;
        if let Some(parent) = copy.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        tracing::debug!("Copying {} to {}", path.display(), copy.display());
        tokio::fs::copy(path, copy).await?;

        let json = tokio::fs::read_to_string(copy).await?;
        Ok(MatchFile::from_json(&json)?.vehicles)
    }

    /// Fan out one task per participant and wait for all of them.
    /// Returns the finished session if this match was not abandoned.
    async fn resolve_all(&self, id: SessionId, participants: Vec<Participant>) -> Option<FinishedSession> {
        let mut finished = None;

        let bulk = self.client.resolve_player_ids_bulk(&participants).await;
        let pending: Vec<(Participant, Option<u64>)> = match bulk {
            Ok(bulk) => {
                for failure in bulk.missing {
                    if !failure.requested {
                        tracing::warn!("Ignoring account outside match {}: {}", id, failure.reason);
                        continue;
                    }
                    let outcome = missing_outcome(failure);
                    if let Some(done) = record_outcome(&self.slot, &self.channel, id, outcome).await {
                        finished = Some(done);
                    }
                }
                bulk.matching
                    .into_iter()
                    .map(|resolved| (resolved.participant, Some(resolved.player_id)))
                    .collect()
            }
            Err(e) => {
                tracing::warn!("Bulk player lookup failed, resolving players one by one: {}", e);
                participants.into_iter().map(|p| (p, None)).collect()
            }
        };

        let handles: Vec<JoinHandle<Option<FinishedSession>>> = pending
            .into_iter()
            .map(|(participant, player_id)| {
                let client = Arc::clone(&self.client);
                let channel = Arc::clone(&self.channel);
                let slot = Arc::clone(&self.slot);
                tokio::spawn(async move {
                    let outcome = resolve_participant(&client, participant, player_id).await;
                    record_outcome(&slot, &channel, id, outcome).await
                })
            })
            .collect();

        for joined in join_all(handles).await {
            match joined {
                Ok(Some(done)) => finished = Some(done),
                Ok(None) => {}
                Err(e) => tracing::error!("Participant task of match {} failed: {}", id, e),
            }
        }

        finished
    }

    /// Pack each team report and send the payloads in order: friendly,
    /// enemy, then unknown. A failed send does not stop the others. A match
    /// without players sends nothing.
    async fn dispatch(&self, finished: FinishedSession) -> MatchReport {
        let id = finished.id;
        let ceiling = self.options.payload_ceiling();
        self.set_dispatch_phase(Some(MatchPhase::Packing));

        let mut payloads = Vec::new();
        let teams: Vec<TeamReport> = if finished.total_participants == 0 {
            Vec::new()
        } else {
            [Some(finished.friendly), Some(finished.enemy), finished.unknown]
                .into_iter()
                .flatten()
                .collect()
        };
        for report in teams {
            let mut blocks = vec![team_header(report.team).to_string()];
            blocks.extend(report.into_sorted_texts());

            for payload in pack_blocks(&blocks, ceiling) {
                payloads.push(if self.options.compact_format {
                    format!("{}{}", COMPACT_PREFIX, payload)
                } else {
                    payload
                });
            }
        }

        self.set_dispatch_phase(Some(MatchPhase::Dispatched));
        let mut failed_sends = 0;
        for payload in &payloads {
            if let Err(e) = self.channel.send(OutgoingMessage::text(payload.as_str())).await {
                failed_sends += 1;
                tracing::error!("Failed to send report of match {}: {}", id, e);
            }
        }

        self.set_dispatch_phase(None);

        let elapsed = finished.started.elapsed();
        tracing::info!(
            "It took {:.2} seconds to load all stats for match {} ({} payloads)",
            elapsed.as_secs_f64(),
            id,
            payloads.len()
        );

        MatchReport {
            session_id: id,
            participants: finished.total_participants,
            payloads,
            failed_sends,
            had_errors: finished.error_flag_raised,
            elapsed,
        }
    }
}

async fn send_logged(channel: &Arc<dyn ChatChannel>, message: OutgoingMessage) {
    if let Err(e) = channel.send(message).await {
        tracing::error!("Failed to send message to {}: {}", channel.name(), e);
    }
}

/// Record one outcome; sends the match's single error warning when this is
/// its first failure.
async fn record_outcome(
    slot: &SessionSlot,
    channel: &Arc<dyn ChatChannel>,
    id: SessionId,
    outcome: ParticipantOutcome,
) -> Option<FinishedSession> {
    match slot.record(id, outcome) {
        RecordResult::Stale => {
            tracing::debug!("Discarding late result for abandoned match {}", id);
            None
        }
        RecordResult::Accepted {
            first_failure,
            finished,
        } => {
            if let Some(reason) = first_failure {
                send_logged(channel, OutgoingMessage::text(match_error_warning(&reason))).await;
            }
            finished
        }
    }
}

fn failure_outcome(name: &str, relation: Relation, reason: String) -> ParticipantOutcome {
    let text = if relation == Relation::Unknown {
        unknown_team_block(&reason)
    } else {
        failure_block(name, &reason)
    };
    ParticipantOutcome::failure(relation, ReportBlock::new(name, text), reason)
}

fn missing_outcome(failure: LookupFailure) -> ParticipantOutcome {
    let name = failure.name.unwrap_or_default();
    failure_outcome(&name, failure.relation, failure.reason)
}

async fn resolve_participant(
    client: &StatsClient,
    participant: Participant,
    player_id: Option<u64>,
) -> ParticipantOutcome {
    match participant_block(client, &participant, player_id).await {
        Ok(text) => ParticipantOutcome::success(
            participant.relation,
            ReportBlock::new(participant.name.as_str(), text),
        ),
        Err(e) => {
            tracing::warn!("Lookup failed for {}: {}", participant.name, e);
            failure_outcome(&participant.name, participant.relation, e.to_string())
        }
    }
}

/// Player id (if still unknown), stats, then ship name
async fn participant_block(
    client: &StatsClient,
    participant: &Participant,
    player_id: Option<u64>,
) -> Result<String> {
    let player_id = match player_id {
        Some(id) => id,
        None => client.resolve_player_id(&participant.name).await?,
    };
    let record = client
        .fetch_stats(Some(player_id), Some(participant.ship_id))
        .await?;
    let ship_name = client.resolve_ship_name(participant.ship_id).await?;

    Ok(stat_block(&participant.name, &ship_name, &record))
}
