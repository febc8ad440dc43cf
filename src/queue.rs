// Copyright 2026, The Synka Authors
// SPDX-License-Identifier: Apache-2.0

//! Deduplicating, rate-limited work queue of object keys.
//!
//! Semantics: a key is delivered to exactly one worker at a time. Re-adding a
//! key that is queued is a no-op; re-adding a key that is being processed
//! marks it dirty, and it is redelivered once after the in-flight attempt
//! calls [`WorkQueue::done`]. Failed keys come back through
//! [`WorkQueue::add_rate_limited`] with exponentially growing delays.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Notify;

/// Per-key retry delay: `base * 2^attempt`, capped at `max`.
#[derive(Debug, Clone, Copy)]
pub struct ExponentialBackoff {
    pub base: Duration,
    pub max: Duration,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(crate::constants::defaults::BACKOFF_BASE_MS),
            max: Duration::from_secs(crate::constants::defaults::BACKOFF_MAX_SECS),
        }
    }
}

impl ExponentialBackoff {
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max)
    }
}

#[derive(Default)]
struct Inner {
    queue: VecDeque<String>,
    /// Keys awaiting (re)delivery, whether queued or pending behind an
    /// in-flight attempt
    dirty: HashSet<String>,
    /// Keys currently held by a worker
    processing: HashSet<String>,
    requeues: HashMap<String, u32>,
    shutting_down: bool,
}

pub struct WorkQueue {
    inner: Mutex<Inner>,
    notify: Notify,
    backoff: ExponentialBackoff,
}

impl WorkQueue {
    pub fn new(backoff: ExponentialBackoff) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(Inner::default()),
            notify: Notify::new(),
            backoff,
        })
    }

    /// Insert a key unless it is already queued or pending redelivery.
    /// No-op once the queue is shutting down.
    pub fn add(&self, key: &str) {
        let mut inner = self.inner.lock().unwrap();
        if inner.shutting_down {
            return;
        }
        if !inner.dirty.insert(key.to_string()) {
            return;
        }
        if inner.processing.contains(key) {
            // Redelivered by done() once the in-flight attempt finishes
            return;
        }
        inner.queue.push_back(key.to_string());
        drop(inner);
        self.notify.notify_one();
    }

    /// Wait for the next key and mark it in-flight. Returns `None` once the
    /// queue is shut down and drained.
    pub async fn get(&self) -> Option<String> {
        loop {
            let notified = self.notify.notified();
            {
                let mut inner = self.inner.lock().unwrap();
                if let Some(key) = inner.queue.pop_front() {
                    inner.dirty.remove(&key);
                    inner.processing.insert(key.clone());
                    if !inner.queue.is_empty() {
                        // Wake the next waiter for the remaining items
                        self.notify.notify_one();
                    }
                    return Some(key);
                }
                if inner.shutting_down {
                    return None;
                }
            }
            notified.await;
        }
    }

    /// Clear the in-flight marker. A key re-added while it was processing
    /// becomes eligible for immediate redelivery.
    pub fn done(&self, key: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.processing.remove(key);
        if inner.dirty.contains(key) && !inner.shutting_down {
            inner.queue.push_back(key.to_string());
            drop(inner);
            self.notify.notify_one();
        }
    }

    /// Reset the requeue counter. Called on success, and when a key is
    /// dropped after exhausting its retries.
    pub fn forget(&self, key: &str) {
        self.inner.lock().unwrap().requeues.remove(key);
    }

    pub fn num_requeues(&self, key: &str) -> u32 {
        self.inner
            .lock()
            .unwrap()
            .requeues
            .get(key)
            .copied()
            .unwrap_or(0)
    }

    /// Reinsert a key after a backoff delay, incrementing its requeue counter
    pub fn add_rate_limited(self: &Arc<Self>, key: &str) {
        let attempt = {
            let mut inner = self.inner.lock().unwrap();
            if inner.shutting_down {
                return;
            }
            let count = inner.requeues.entry(key.to_string()).or_insert(0);
            let attempt = *count;
            *count += 1;
            attempt
        };

        let delay = self.backoff.delay(attempt);
        let queue = Arc::clone(self);
        let key = key.to_string();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            queue.add(&key);
        });
    }

    /// Stop accepting new keys and unblock waiting `get` calls. Keys already
    /// queued are still delivered so workers can drain.
    pub fn shut_down(&self) {
        self.inner.lock().unwrap().shutting_down = true;
        self.notify.notify_waiters();
        // A permit for any waiter that races past notify_waiters
        self.notify.notify_one();
    }

    #[cfg(test)]
    fn queued(&self) -> usize {
        self.inner.lock().unwrap().queue.len()
    }
}
