//! Bounded pool of rendering-capable browser processes
//!
//! Consumed only by the rendered fetch strategy. The pool hands out live
//! sessions through an RAII guard that returns them on drop, sweeps idle
//! processes, and under sustained contention deliberately exceeds its
//! configured ceiling rather than blocking a caller forever.
//!
//! The slot list is the one piece of genuinely shared mutable state in
//! this crate and sits behind a single pool-wide lock; the scan-and-
//! reserve in `acquire` must be mutually exclusive or two callers could
//! reserve the same idle session.

pub mod chromium;
pub mod driver;

pub use chromium::ChromiumDriver;
pub use driver::{BrowserDriver, BrowserSession, LaunchError, RenderRequest, RenderedPage};

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::ScrapeConfig;

/// How long a saturated `acquire` waits before forcing eviction and,
/// failing that, overflowing the ceiling
const FORCED_EVICTION_AFTER: Duration = Duration::from_secs(30);

/// Fallback tick for waiters, in case a release notification is missed
const ACQUIRE_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Idle threshold used by forced eviction, much shorter than the normal
/// sweep threshold
const FORCED_IDLE_THRESHOLD: Duration = Duration::from_secs(10);

struct PoolSlot {
    id: u64,
    /// Some = idle and available; None = checked out or still launching
    session: Option<Box<dyn BrowserSession>>,
    last_released: Instant,
}

struct PoolState {
    slots: Vec<PoolSlot>,
}

/// Bounded browser pool with forced-eviction overflow
pub struct BrowserPool {
    driver: Arc<dyn BrowserDriver>,
    max_instances: usize,
    max_idle: Duration,
    state: Mutex<PoolState>,
    released: Notify,
    next_id: AtomicU64,
    in_use: AtomicUsize,
    overflow_launches: AtomicUsize,
}

impl BrowserPool {
    /// Create a pool over the production Chromium driver
    #[must_use]
    pub fn new(config: &ScrapeConfig) -> Arc<Self> {
        Self::with_driver(
            Arc::new(ChromiumDriver::new(config.clone())),
            config.max_instances(),
            Duration::from_secs(config.max_idle_secs()),
        )
    }

    /// Create a pool over any driver (tests inject stubs here)
    #[must_use]
    pub fn with_driver(
        driver: Arc<dyn BrowserDriver>,
        max_instances: usize,
        max_idle: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            driver,
            max_instances: max_instances.max(1),
            max_idle,
            state: Mutex::new(PoolState { slots: Vec::new() }),
            released: Notify::new(),
            next_id: AtomicU64::new(0),
            in_use: AtomicUsize::new(0),
            overflow_launches: AtomicUsize::new(0),
        })
    }

    /// Acquire a session, waiting when the pool is saturated
    ///
    /// Returns an idle instance when one exists, launches a new one below
    /// the ceiling, and otherwise waits for a release. After
    /// [`FORCED_EVICTION_AFTER`] of waiting it force-evicts idle instances
    /// and, if still saturated, launches one instance past the ceiling so
    /// no caller blocks indefinitely.
    ///
    /// Cancellation-safe: launches run in spawned tasks that park their
    /// session back into the pool even if this future is dropped mid-wait.
    ///
    /// # Errors
    /// Returns [`LaunchError`] when a needed process cannot be started,
    /// the one failure that escapes resource acquisition.
    pub async fn acquire(self: &Arc<Self>) -> Result<PooledBrowserGuard, LaunchError> {
        let wait_start = Instant::now();
        let mut forced = false;

        loop {
            if let Some(guard) = self.try_take_idle().await {
                return Ok(guard);
            }

            let below_ceiling = {
                let mut state = self.state.lock().await;
                (state.slots.len() < self.max_instances).then(|| self.reserve_slot(&mut state))
            };
            if let Some(slot_id) = below_ceiling {
                self.launch_parked(slot_id).await?;
                continue;
            }

            if wait_start.elapsed() >= FORCED_EVICTION_AFTER {
                if !forced {
                    forced = true;
                    warn!(
                        "Pool saturated for {:?}, forcing idle eviction",
                        wait_start.elapsed()
                    );
                    self.cleanup_idle_browsers(true).await;
                    // Eviction may have freed capacity under the ceiling
                    continue;
                }

                // Still saturated after forced eviction: exceed the ceiling
                // rather than block forever
                let slot_id = {
                    let mut state = self.state.lock().await;
                    let id = self.reserve_slot(&mut state);
                    let excess = state.slots.len().saturating_sub(self.max_instances);
                    let total = self.overflow_launches.fetch_add(1, Ordering::Relaxed) + 1;
                    warn!(
                        "Pool ceiling overflow: launching beyond max_instances={} \
                         (excess {excess}, {total} overflow launches total)",
                        self.max_instances
                    );
                    id
                };
                self.launch_parked(slot_id).await?;
                continue;
            }

            tokio::select! {
                () = self.released.notified() => {}
                () = tokio::time::sleep(ACQUIRE_POLL_INTERVAL) => {}
            }
        }
    }

    /// Scan for an idle slot and reserve it, health-checking before
    /// handing it out
    async fn try_take_idle(self: &Arc<Self>) -> Option<PooledBrowserGuard> {
        loop {
            let (id, session) = {
                let mut state = self.state.lock().await;
                let slot = state.slots.iter_mut().find(|s| s.session.is_some())?;
                let session = slot.session.take()?;
                (slot.id, session)
            };

            if session.is_healthy().await {
                self.in_use.fetch_add(1, Ordering::Relaxed);
                debug!("Acquired browser {id} from pool");
                return Some(PooledBrowserGuard {
                    pool: Arc::clone(self),
                    slot_id: id,
                    session: Some(session),
                });
            }

            // Broken session: drop the slot entirely and keep scanning
            warn!("Browser {id} failed health check during acquire, discarding");
            self.remove_slot(id).await;
            if let Err(e) = session.close().await {
                debug!("Failed to close unhealthy browser {id}: {e}");
            }
        }
    }

    fn reserve_slot(&self, state: &mut PoolState) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        state.slots.push(PoolSlot {
            id,
            session: None,
            last_released: Instant::now(),
        });
        id
    }

    /// Launch into a reserved slot and park the session as idle
    ///
    /// Runs the launch in a spawned task so cancellation of the awaiting
    /// acquire cannot strand a half-launched process: the task always
    /// either parks the session (some waiter picks it up) or removes the
    /// reserved slot on failure.
    async fn launch_parked(self: &Arc<Self>, slot_id: u64) -> Result<(), LaunchError> {
        let driver = Arc::clone(&self.driver);
        let pool = Arc::clone(self);

        let handle = tokio::spawn(async move {
            match driver.launch().await {
                Ok(session) => {
                    debug!("Launched browser for slot {slot_id}");
                    pool.park(slot_id, session).await;
                    Ok(())
                }
                Err(e) => {
                    pool.remove_slot(slot_id).await;
                    pool.released.notify_one();
                    Err(e)
                }
            }
        });

        match handle.await {
            Ok(result) => result,
            Err(e) => Err(LaunchError::ProcessFailed(format!(
                "launch task panicked: {e}"
            ))),
        }
    }

    async fn remove_slot(&self, slot_id: u64) {
        let mut state = self.state.lock().await;
        state.slots.retain(|s| s.id != slot_id);
    }

    /// Park a session into its slot as idle and wake a waiter
    async fn park(&self, slot_id: u64, session: Box<dyn BrowserSession>) {
        let mut state = self.state.lock().await;
        if let Some(slot) = state.slots.iter_mut().find(|s| s.id == slot_id) {
            slot.session = Some(session);
            slot.last_released = Instant::now();
            drop(state);
            self.released.notify_one();
        } else {
            // Slot was evicted meanwhile; close rather than re-add
            drop(state);
            if let Err(e) = session.close().await {
                debug!("Failed to close browser for removed slot {slot_id}: {e}");
            }
            self.released.notify_one();
        }
    }

    /// Return a checked-out session to the pool
    async fn release(&self, slot_id: u64, session: Box<dyn BrowserSession>) {
        self.in_use.fetch_sub(1, Ordering::Relaxed);
        debug!("Released browser {slot_id} back to pool");
        self.park(slot_id, session).await;
    }

    /// Close instances idle past the threshold
    ///
    /// `force` uses the much shorter forced-eviction threshold. A close
    /// failure still removes the handle from bookkeeping; a broken handle
    /// is never retained.
    pub async fn cleanup_idle_browsers(&self, force: bool) -> usize {
        let threshold = if force {
            FORCED_IDLE_THRESHOLD
        } else {
            self.max_idle
        };
        let now = Instant::now();

        let expired: Vec<(u64, Box<dyn BrowserSession>)> = {
            let mut state = self.state.lock().await;
            let mut expired = Vec::new();
            state.slots.retain_mut(|slot| {
                let idle_long_enough = slot.session.is_some()
                    && now.duration_since(slot.last_released) > threshold;
                if idle_long_enough
                    && let Some(session) = slot.session.take()
                {
                    expired.push((slot.id, session));
                    return false;
                }
                true
            });
            expired
        };

        let mut closed = 0usize;
        for (id, session) in expired {
            match session.close().await {
                Ok(()) => info!("Closed idle browser {id}"),
                Err(e) => warn!("Error closing idle browser {id} (handle removed): {e}"),
            }
            closed += 1;
        }
        closed
    }

    /// Close every instance; used at shutdown
    pub async fn shutdown(&self) {
        let slots = {
            let mut state = self.state.lock().await;
            std::mem::take(&mut state.slots)
        };

        for slot in slots {
            if let Some(session) = slot.session {
                if let Err(e) = session.close().await {
                    warn!("Error closing browser {} during shutdown: {e}", slot.id);
                }
            }
        }
        info!("Browser pool shut down");
    }

    /// Sessions currently checked out
    #[must_use]
    pub fn in_use_count(&self) -> usize {
        self.in_use.load(Ordering::Relaxed)
    }

    /// Total slots, including checked-out and overflow instances
    pub async fn pool_size(&self) -> usize {
        self.state.lock().await.slots.len()
    }

    /// How many times the ceiling has been deliberately exceeded
    #[must_use]
    pub fn overflow_launches(&self) -> usize {
        self.overflow_launches.load(Ordering::Relaxed)
    }
}

/// RAII guard returning the session to the pool on drop
///
/// Every acquire is matched by exactly one release (or one pool removal
/// for unhealthy sessions); the drop impl guarantees the release happens
/// on every exit path, including panics in the caller.
pub struct PooledBrowserGuard {
    pool: Arc<BrowserPool>,
    slot_id: u64,
    session: Option<Box<dyn BrowserSession>>,
}

impl PooledBrowserGuard {
    /// The live session
    #[must_use]
    pub fn session(&self) -> &dyn BrowserSession {
        self.session
            .as_deref()
            .expect("session present until drop")
    }

    /// Pool-unique id of the underlying slot
    #[must_use]
    pub fn id(&self) -> u64 {
        self.slot_id
    }
}

impl Drop for PooledBrowserGuard {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            let pool = Arc::clone(&self.pool);
            let slot_id = self.slot_id;
            tokio::spawn(async move {
                pool.release(slot_id, session).await;
            });
        }
    }
}
