//! Keyed, cancellable tokio tasks.
//!
//! Every recurring or deferred job of a page is registered under a key.
//! Scheduling a key aborts whatever was registered under it before, so a key
//! never has two live timers. A delayed job releases its key the moment its
//! delay ends: cancelling the key afterwards does not abort the job body.

use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::shared::Period;

/// Purpose of a scheduled dashboard task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKey {
    /// Regular REST price poll.
    PricePoll,
    /// REST price poll that runs while the socket is down.
    FallbackPoll,
    ChartRefresh,
    DashboardRefresh,
    CacheSweep,
    /// Retry of a failed chart load. At most one per period.
    ChartRetry(Period),
    /// Chart load triggered by a period switch, possibly deferred.
    PeriodSwitch,
    /// Lifts the realtime pause after a chart render.
    ResumeRealtime,
    ShootingStars,
    /// Long-running WebSocket listener.
    PriceFeed,
}

struct Slot {
    generation: u64,
    handle: JoinHandle<()>,
}

pub struct Scheduler<K> {
    slots: Mutex<HashMap<K, Slot>>,
    generation: AtomicU64,
}

impl<K> Default for Scheduler<K> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            generation: AtomicU64::new(0),
        }
    }
}

impl<K> Scheduler<K>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
{
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<K, Slot>> {
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn install<F>(&self, key: K, make: impl FnOnce(u64) -> F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        // Spawn under the lock so the task cannot release its key before the
        // slot exists.
        let mut slots = self.slots();
        slots.retain(|_, slot| !slot.handle.is_finished());
        let handle = tokio::spawn(make(generation));
        if let Some(old) = slots.insert(key.clone(), Slot { generation, handle }) {
            tracing::debug!(?key, "Replacing scheduled task");
            old.handle.abort();
        }
    }

    /// Forget `key` without aborting, if it still belongs to `generation`.
    fn release(&self, key: &K, generation: u64) {
        let mut slots = self.slots();
        if slots.get(key).is_some_and(|s| s.generation == generation) {
            slots.remove(key);
        }
    }

    /// Run `job` once after `delay`.
    pub fn after<F>(self: &Arc<Self>, key: K, delay: Duration, job: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let weak: Weak<Self> = Arc::downgrade(self);
        let slot_key = key.clone();
        self.install(key, move |generation| async move {
            tokio::time::sleep(delay).await;
            if let Some(this) = weak.upgrade() {
                this.release(&slot_key, generation);
            }
            job.await;
        });
    }

    /// Run `make()` every `period`, the first time after `first_delay`.
    /// A run that overlaps the next tick delays it instead of stacking.
    pub fn every<M, F>(&self, key: K, first_delay: Duration, period: Duration, mut make: M)
    where
        M: FnMut() -> F + Send + 'static,
        F: Future<Output = ()> + Send + 'static,
    {
        self.install(key, move |_| async move {
            let mut ticks = tokio::time::interval_at(Instant::now() + first_delay, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                make().await;
            }
        });
    }

    /// Run a long-lived task under `key` until it ends or is cancelled.
    pub fn spawn<F>(&self, key: K, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.install(key, move |_| task);
    }

    /// Abort the task under `key`. Returns whether one was pending.
    pub fn cancel(&self, key: &K) -> bool {
        match self.slots().remove(key) {
            Some(slot) => {
                let pending = !slot.handle.is_finished();
                slot.handle.abort();
                pending
            }
            None => false,
        }
    }

    pub fn is_scheduled(&self, key: &K) -> bool {
        self.slots()
            .get(key)
            .is_some_and(|slot| !slot.handle.is_finished())
    }

    pub fn cancel_all(&self) {
        let drained: Vec<(K, Slot)> = self.slots().drain().collect();
        if !drained.is_empty() {
            tracing::debug!(count = drained.len(), "Cancelling scheduled tasks");
        }
        for (_, slot) in drained {
            slot.handle.abort();
        }
    }

    /// Keys with a task that has not finished.
    pub fn pending(&self) -> Vec<K> {
        self.slots()
            .iter()
            .filter(|(_, slot)| !slot.handle.is_finished())
            .map(|(k, _)| k.clone())
            .collect()
    }
}

impl<K> Drop for Scheduler<K> {
    fn drop(&mut self) {
        let slots = self.slots.get_mut().unwrap_or_else(|e| e.into_inner());
        for (_, slot) in slots.drain() {
            slot.handle.abort();
        }
    }
}
