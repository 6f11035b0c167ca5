use std::num::NonZeroU32;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

/// Admission gate for outbound API requests.
///
/// Requests are admitted one at a time, at least `1s / max_per_second`
/// apart. Waiters queue on a fair (FIFO) mutex, so admission order is
/// arrival order no matter which caller asked: match lookups and chat
/// command lookups share one queue and one quota.
#[derive(Debug)]
pub struct AdmissionGate {
    period: Duration,
    next_slot: Mutex<Option<Instant>>,
    waiting: AtomicUsize,
}

impl AdmissionGate {
    pub fn per_second(max_per_second: NonZeroU32) -> Self {
        Self {
            period: Duration::from_secs(1) / max_per_second.get(),
            next_slot: Mutex::new(None),
            waiting: AtomicUsize::new(0),
        }
    }

    /// Minimum spacing between two admitted requests
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Requests currently queued behind the gate
    pub fn waiting(&self) -> usize {
        self.waiting.load(Ordering::Relaxed)
    }

    /// Wait for this caller's turn. The lock is held across the sleep so
    /// later callers stay queued behind it.
    pub async fn acquire(&self) {
        let _queued = Queued::join(&self.waiting);

        let mut next_slot = self.next_slot.lock().await;
        let now = Instant::now();
        let slot = match *next_slot {
            Some(slot) if slot > now => slot,
            _ => now,
        };
        sleep_until(slot).await;
        *next_slot = Some(slot + self.period);
    }
}

/// Counts a caller as waiting until it is admitted or gives up
struct Queued<'a>(&'a AtomicUsize);

impl<'a> Queued<'a> {
    fn join(waiting: &'a AtomicUsize) -> Self {
        let queued = waiting.fetch_add(1, Ordering::Relaxed) + 1;
        if queued > 1 {
            tracing::trace!("{} requests queued at the admission gate", queued);
        }
        Self(waiting)
    }
}

impl Drop for Queued<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}
