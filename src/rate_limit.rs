use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Default quota: 10 events per rolling 10-second window. Both are
/// overridable through `AppConfig`.
pub const DEFAULT_LIMIT: u32 = 10;
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(10);

/// Upper bound on one store round trip. A slow store must never stall the
/// request: on expiry the call is treated as a store failure and the
/// decision fails open.
const STORE_TIMEOUT: Duration = Duration::from_millis(250);

/// StoreError
///
/// Internal failure of the counter store. This type never crosses the HTTP
/// boundary: the limiter converts it into a fail-open admission and reports
/// it through tracing only.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("counter store unavailable: {0}")]
    Unavailable(String),
    #[error("counter store call timed out")]
    Timeout,
}

/// Snapshot of one key's window returned by the store after an admission
/// attempt.
#[derive(Debug, Clone)]
pub struct WindowState {
    /// Admitted events inside the trailing window, not counting this call.
    pub count: u32,
    /// Whether this call's event was recorded (i.e. `count` was below capacity).
    pub recorded: bool,
    /// Timestamp of the oldest event still inside the window, including this
    /// call's event when it was recorded. `None` only for an empty window.
    pub oldest: Option<SystemTime>,
}

/// CounterStore
///
/// The shared, possibly remote, owner of all rate-window state. The limiter
/// holds no mutable state of its own; it only interprets snapshots returned
/// by this collaborator.
///
/// `increment_if_below` must be atomic per key: concurrent calls for the
/// same key may not interleave between the count read and the record, while
/// calls for distinct keys must never block one another. Rejected calls
/// record nothing.
#[async_trait]
pub trait CounterStore: Send + Sync {
    async fn increment_if_below(
        &self,
        key: &str,
        capacity: u32,
        window: Duration,
        now: SystemTime,
    ) -> Result<WindowState, StoreError>;

    /// Reclaims state for keys whose every event has left the window, so
    /// idle keys do not accumulate forever. Stores with a native TTL
    /// primitive can make this a no-op.
    async fn purge_expired(&self, window: Duration, now: SystemTime);
}

/// MemoryCounterStore
///
/// Single-process store keeping an exact sliding log of event timestamps per
/// key. The dashmap entry guard serialises updates for one key while leaving
/// other keys fully independent, which gives exact sliding-window counts
/// even under same-key races.
#[derive(Default)]
pub struct MemoryCounterStore {
    events: DashMap<String, VecDeque<SystemTime>>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn increment_if_below(
        &self,
        key: &str,
        capacity: u32,
        window: Duration,
        now: SystemTime,
    ) -> Result<WindowState, StoreError> {
        // The entry guard is the per-key lock: held for the prune + count +
        // record sequence, making the update atomic with respect to other
        // calls for this key.
        let mut log = self.events.entry(key.to_owned()).or_default();

        // Drop events that have slid out of the trailing window.
        while let Some(first) = log.front() {
            match now.duration_since(*first) {
                Ok(age) if age >= window => {
                    log.pop_front();
                }
                _ => break,
            }
        }

        let count = log.len() as u32;
        let recorded = count < capacity;
        if recorded {
            log.push_back(now);
        }

        Ok(WindowState {
            count,
            recorded,
            oldest: log.front().copied(),
        })
    }

    async fn purge_expired(&self, window: Duration, now: SystemTime) {
        self.events.retain(|_, log| {
            while let Some(first) = log.front() {
                match now.duration_since(*first) {
                    Ok(age) if age >= window => {
                        log.pop_front();
                    }
                    _ => break,
                }
            }
            !log.is_empty()
        });
    }
}

/// RateLimitDecision
///
/// Result of one admission attempt. Produced fresh per call and never
/// persisted; `reset_at` is the instant at which the oldest event in the
/// window expires and a blocked key becomes admissible again.
#[derive(Debug, Clone)]
pub struct RateLimitDecision {
    pub admitted: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

/// RateLimiter
///
/// Sliding-window admission over a shared [`CounterStore`]. Cheap to clone;
/// all clones share the same store.
///
/// Failure policy: the limiter fails **open**. A store error or timeout
/// yields an admitted decision with the full quota reported, and the
/// underlying error goes to the tracing channel. An abuse-control outage
/// must never become a site-wide outage, so [`RateLimiter::admit`] is
/// infallible from the caller's point of view.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    limit: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CounterStore>, limit: u32, window: Duration) -> Self {
        Self {
            store,
            limit,
            window,
        }
    }

    /// Decides whether the current event for `key` is admitted under the
    /// configured quota. One store round trip, bounded by `STORE_TIMEOUT`.
    pub async fn admit(&self, key: &str) -> RateLimitDecision {
        self.admit_at(key, SystemTime::now()).await
    }

    /// Clock-parameterised core of [`RateLimiter::admit`]; tests drive `now`
    /// directly instead of sleeping through real windows.
    pub async fn admit_at(&self, key: &str, now: SystemTime) -> RateLimitDecision {
        let call = self
            .store
            .increment_if_below(key, self.limit, self.window, now);

        let state = match tokio::time::timeout(STORE_TIMEOUT, call).await {
            Ok(Ok(state)) => state,
            Ok(Err(err)) => return self.fail_open(key, err, now),
            Err(_) => return self.fail_open(key, StoreError::Timeout, now),
        };

        let reset_at = state.oldest.unwrap_or(now) + self.window;
        let remaining = if state.recorded {
            self.limit - state.count - 1
        } else {
            0
        };

        RateLimitDecision {
            admitted: state.recorded,
            limit: self.limit,
            remaining,
            reset_at: DateTime::<Utc>::from(reset_at),
        }
    }

    fn fail_open(&self, key: &str, err: StoreError, now: SystemTime) -> RateLimitDecision {
        tracing::warn!(key, error = %err, "counter store failed, admitting without quota check");
        RateLimitDecision {
            admitted: true,
            limit: self.limit,
            remaining: self.limit,
            reset_at: DateTime::<Utc>::from(now),
        }
    }

    /// Spawns the background reclamation task for idle keys. Runs for the
    /// lifetime of the process; one per store is enough.
    pub fn spawn_purge_task(&self) -> tokio::task::JoinHandle<()> {
        let store = Arc::clone(&self.store);
        let window = self.window;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(window);
            loop {
                ticker.tick().await;
                store.purge_expired(window, SystemTime::now()).await;
            }
        })
    }
}
