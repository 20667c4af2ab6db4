//! Keyed, cancellable delayed callbacks for Lastword.
//!
//! Every game session needs exactly one thing from the clock: "run this
//! later, unless something else happens first". A session has at most one
//! pending timer at a time — either the current round's timeout or the
//! grace delay before the next round — so timers are keyed by session and
//! scheduling a new one implicitly cancels the old one.
//!
//! # Tokens and claiming
//!
//! Aborting a Tokio task is best-effort: by the time [`TimerManager::cancel`]
//! runs, the task may already be past its sleep and waiting for the
//! session lock. To make cancellation airtight, every timer is identified
//! by a [`TimerToken`] (key + generation). A fired callback must call
//! [`TimerManager::claim`] with its token, while holding whatever lock
//! serializes the key's state, before doing anything observable. Claiming
//! fails if the timer was cancelled or replaced in the meantime, and the
//! callback then returns without effect.
//!
//! ```ignore
//! let inner = Arc::clone(&self.inner);
//! timers.schedule(chat_id, Duration::from_secs(45), move |token| -> TimerFuture {
//!     Box::pin(async move {
//!         let mut session = inner.lock_session(token.key()).await;
//!         if !inner.timers.claim(&token) {
//!             return; // superseded
//!         }
//!         // ... resolve the round ...
//!     })
//! });
//! ```

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::pin::Pin;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, trace};

/// The future a timer runs once its delay has elapsed.
///
/// Boxed so callbacks can schedule further timers on the same manager
/// without creating a recursive future type.
pub type TimerFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

// ---------------------------------------------------------------------------
// Token
// ---------------------------------------------------------------------------

/// Identifies one scheduled timer.
///
/// Generations are unique per manager, so a token from a cancelled or
/// replaced timer never matches the currently pending one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerToken<K> {
    key: K,
    generation: u64,
}

impl<K> TimerToken<K> {
    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

// ---------------------------------------------------------------------------
// Manager
// ---------------------------------------------------------------------------

struct Slot {
    generation: u64,
    deadline: Instant,
    handle: JoinHandle<()>,
}

struct Slots<K> {
    next_generation: u64,
    pending: HashMap<K, Slot>,
}

/// Owns at most one pending timer per key.
///
/// All methods are synchronous and never block on anything but a short
/// internal lock, so they are safe to call while holding a session lock.
/// Scheduling requires a Tokio runtime.
pub struct TimerManager<K> {
    slots: Mutex<Slots<K>>,
}

impl<K> TimerManager<K>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + 'static,
{
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(Slots {
                next_generation: 0,
                pending: HashMap::new(),
            }),
        }
    }

    /// Runs `callback`'s future after `delay`, replacing any pending timer
    /// for `key`.
    ///
    /// `callback` is invoked immediately with the new timer's token; the
    /// future it returns is what runs when the delay elapses.
    pub fn schedule<F>(&self, key: K, delay: Duration, callback: F) -> TimerToken<K>
    where
        F: FnOnce(TimerToken<K>) -> TimerFuture,
    {
        let mut slots = self.lock();
        slots.next_generation += 1;
        let token = TimerToken {
            key: key.clone(),
            generation: slots.next_generation,
        };

        let fire = callback(token.clone());
        let handle = tokio::spawn(async move {
            time::sleep(delay).await;
            fire.await;
        });

        let slot = Slot {
            generation: token.generation,
            deadline: Instant::now() + delay,
            handle,
        };
        if let Some(old) = slots.pending.insert(key, slot) {
            old.handle.abort();
            debug!(
                key = ?token.key,
                replaced = old.generation,
                generation = token.generation,
                "timer replaced"
            );
        } else {
            trace!(
                key = ?token.key,
                generation = token.generation,
                delay_ms = delay.as_millis() as u64,
                "timer scheduled"
            );
        }

        token
    }

    /// Marks the timer identified by `token` as fired.
    ///
    /// Returns `true` exactly once for the currently pending timer of the
    /// token's key, and `false` if that timer was cancelled, replaced, or
    /// already claimed. The claimed task is not aborted: it is the caller.
    pub fn claim(&self, token: &TimerToken<K>) -> bool {
        let mut slots = self.lock();
        let current = slots.pending.get(&token.key).map(|slot| slot.generation);
        if current == Some(token.generation) {
            slots.pending.remove(&token.key);
            trace!(key = ?token.key, generation = token.generation, "timer claimed");
            true
        } else {
            debug!(
                key = ?token.key,
                generation = token.generation,
                current = ?current,
                "stale timer fired, ignoring"
            );
            false
        }
    }

    /// Cancels the pending timer for `key`, if any.
    ///
    /// Once this returns, the cancelled timer can no longer be claimed.
    /// Returns `true` if a timer was pending.
    pub fn cancel(&self, key: &K) -> bool {
        let removed = self.lock().pending.remove(key);
        match removed {
            Some(slot) => {
                slot.handle.abort();
                debug!(?key, generation = slot.generation, "timer cancelled");
                true
            }
            None => false,
        }
    }

    /// Cancels every pending timer. Returns how many were pending.
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<Slot> = self.lock().pending.drain().map(|(_, slot)| slot).collect();
        for slot in &drained {
            slot.handle.abort();
        }
        if !drained.is_empty() {
            debug!(count = drained.len(), "all timers cancelled");
        }
        drained.len()
    }

    /// Whether a timer is pending for `key`.
    pub fn is_pending(&self, key: &K) -> bool {
        self.lock().pending.contains_key(key)
    }

    /// Time left before `key`'s pending timer fires.
    pub fn remaining(&self, key: &K) -> Option<Duration> {
        self.lock()
            .pending
            .get(key)
            .map(|slot| slot.deadline.saturating_duration_since(Instant::now()))
    }

    /// Number of pending timers across all keys.
    pub fn len(&self) -> usize {
        self.lock().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().pending.is_empty()
    }

    // A panic while holding this lock can only come from HashMap itself;
    // the slot table is still consistent, so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, Slots<K>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<K> Default for TimerManager<K>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Drop for TimerManager<K> {
    fn drop(&mut self) {
        let slots = self.slots.get_mut().unwrap_or_else(PoisonError::into_inner);
        for (_, slot) in slots.pending.drain() {
            slot.handle.abort();
        }
    }
}
