pub mod participant;
pub mod session;
pub mod ship;
pub mod stats;

pub use participant::{BulkResolution, LookupFailure, MatchFile, Participant, Relation, ResolvedIdentity};
pub use session::{
    FinishedSession, MatchPhase, MatchSession, ParticipantOutcome, RecordResult, ReportBlock,
    SessionId, SessionSlot, Team, TeamReport, UnknownRelationPolicy,
};
pub use ship::ShipLookupResult;
pub use stats::{Kd, PvpCounters, ShipStats, StatRecord};
