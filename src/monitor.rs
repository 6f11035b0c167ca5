//! Watches the replay folder for the game's match file.
//!
//! The game client rewrites `tempArenaInfo.json` several times while a match
//! loads, so raw filesystem notifications are debounced: an event is emitted
//! only after the file has been quiet for the configured period.

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

use crate::error::{BotError, Result};

pub const ARENA_FILE_NAME: &str = "tempArenaInfo.json";

/// Debounced change of the match file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchEvent {
    /// A match file showed up while none was known
    Appeared(PathBuf),
    /// The known match file was rewritten
    Changed(PathBuf),
    /// The match file went away (match over)
    Removed(PathBuf),
}

impl MatchEvent {
    pub fn path(&self) -> &Path {
        match self {
            MatchEvent::Appeared(path) | MatchEvent::Changed(path) | MatchEvent::Removed(path) => path,
        }
    }
}

/// Turns raw notifications about one file into debounced [`MatchEvent`]s
#[derive(Debug)]
pub struct Debouncer {
    path: PathBuf,
    quiet_period: Duration,
    deadline: Option<Instant>,
    present: bool,
}

impl Debouncer {
    pub fn new(path: impl Into<PathBuf>, quiet_period: Duration) -> Self {
        Self {
            path: path.into(),
            quiet_period,
            deadline: None,
            present: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// When the pending write settles, if one is pending
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    fn is_watched(&self, event: &Event) -> bool {
        event
            .paths
            .iter()
            .any(|p| p.file_name() == self.path.file_name())
    }

    /// Feed one raw notification. Removal is reported at once; writes
    /// only push the deadline back.
    pub fn on_notify(&mut self, event: &Event, now: Instant) -> Option<MatchEvent> {
        if !self.is_watched(event) {
            return None;
        }

        match event.kind {
            EventKind::Create(_) | EventKind::Modify(_) => {
                self.on_write(now);
                None
            }
            EventKind::Remove(_) => self.on_remove(),
            _ => None,
        }
    }

    pub fn on_write(&mut self, now: Instant) {
        self.deadline = Some(now + self.quiet_period);
    }

    pub fn on_remove(&mut self) -> Option<MatchEvent> {
        self.deadline = None;
        if self.present {
            self.present = false;
            Some(MatchEvent::Removed(self.path.clone()))
        } else {
            None
        }
    }

    /// The quiet period elapsed; `exists` is whether the file is still there
    pub fn on_quiet(&mut self, exists: bool) -> Option<MatchEvent> {
        self.deadline = None;
        match (exists, self.present) {
            (true, true) => Some(MatchEvent::Changed(self.path.clone())),
            (true, false) => {
                self.present = true;
                Some(MatchEvent::Appeared(self.path.clone()))
            }
            (false, true) => {
                self.present = false;
                Some(MatchEvent::Removed(self.path.clone()))
            }
            (false, false) => None,
        }
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Background watcher of the replay folder
pub struct MatchMonitor {
    _watcher: RecommendedWatcher,
    task: JoinHandle<()>,
}

impl MatchMonitor {
    /// Start watching `folder`. Must be called inside a tokio runtime.
    ///
    /// A match file already present at startup is reported once it has been
    /// quiet for `quiet_period`.
    pub fn spawn(
        folder: impl AsRef<Path>,
        quiet_period: Duration,
    ) -> Result<(Self, mpsc::UnboundedReceiver<MatchEvent>)> {
        let folder = folder.as_ref();
        if !folder.is_dir() {
            return Err(BotError::Config(format!(
                "Replay folder {} does not exist",
                folder.display()
            )));
        }

        let (raw_sender, raw_receiver) = mpsc::unbounded_channel::<notify::Result<Event>>();
        let mut watcher = notify::recommended_watcher(move |result| {
            if raw_sender.send(result).is_err() {
                tracing::debug!("Match file notification receiver dropped");
            }
        })?;
        watcher.watch(folder, RecursiveMode::NonRecursive)?;

        let mut debouncer = Debouncer::new(folder.join(ARENA_FILE_NAME), quiet_period);
        if debouncer.path().exists() {
            debouncer.on_write(Instant::now());
        }

        let (sender, receiver) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(raw_receiver, sender, debouncer));

        tracing::info!("Watching {} for {}", folder.display(), ARENA_FILE_NAME);
        Ok((Self { _watcher: watcher, task }, receiver))
    }
}

impl Drop for MatchMonitor {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(
    mut raw: mpsc::UnboundedReceiver<notify::Result<Event>>,
    events: mpsc::UnboundedSender<MatchEvent>,
    mut debouncer: Debouncer,
) {
    loop {
        let emitted = tokio::select! {
            received = raw.recv() => match received {
                Some(Ok(event)) => debouncer.on_notify(&event, Instant::now()),
                Some(Err(e)) => {
                    tracing::warn!("File watcher error: {}", e);
                    None
                }
                None => break,
            },
            _ = sleep_until_deadline(debouncer.deadline()) => {
                let exists = debouncer.path().exists();
                debouncer.on_quiet(exists)
            }
        };

        if let Some(event) = emitted {
            tracing::debug!("Match file event: {:?}", event);
            if events.send(event).is_err() {
                break;
            }
        }
    }
    tracing::debug!("Match file watcher stopped");
}
