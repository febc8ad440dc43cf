// Copyright 2026, The Synka Authors
// SPDX-License-Identifier: Apache-2.0

//! One controller per watched resource kind: owns the cache, the queue, the
//! reflector task and the worker pool. Controllers share nothing.

use std::sync::Arc;
use std::time::Duration;

use kube::Client;
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::cache::Store;
use crate::cluster::ClusterRegistry;
use crate::error::{Result, SynkaError};
use crate::queue::{ExponentialBackoff, WorkQueue};
use crate::reflector::run_reflector;
use crate::resource::{ResourceKind, WatchedResource};
use crate::sync::SyncEngine;

/// Per-controller tunables, taken from the configuration file
#[derive(Debug, Clone, Copy)]
pub struct ControllerSettings {
    pub workers: usize,
    pub retry_limit: u32,
    pub cache_sync_timeout: Duration,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        use crate::constants::defaults;
        Self {
            workers: defaults::WORKERS,
            retry_limit: defaults::RETRY_LIMIT,
            cache_sync_timeout: Duration::from_secs(defaults::CACHE_SYNC_TIMEOUT_SECS),
        }
    }
}

pub struct Controller {
    client: Client,
    registry: Arc<ClusterRegistry>,
    kind: ResourceKind,
    settings: ControllerSettings,
}

impl Controller {
    pub fn new(
        client: Client,
        registry: Arc<ClusterRegistry>,
        kind: ResourceKind,
        settings: ControllerSettings,
    ) -> Self {
        Self {
            client,
            registry,
            kind,
            settings,
        }
    }

    /// Run until the shutdown signal fires: resolve the kind, start the
    /// reflector, wait for the initial cache sync, then drain the queue with
    /// the worker pool. A failure here stops this controller only.
    pub async fn run(self, shutdown: watch::Receiver<bool>) -> Result<()> {
        let resource = WatchedResource::discover(&self.client, &self.kind).await?;
        info!("Started controller for {}", self.kind);

        let store = Store::new();
        let queue = WorkQueue::new(ExponentialBackoff::default());
        let (synced_tx, mut synced_rx) = watch::channel(false);

        let reflector = tokio::spawn(run_reflector(
            resource.all_api(self.client.clone()),
            store.clone(),
            Arc::clone(&queue),
            synced_tx,
            shutdown.clone(),
        ));

        // Workers must not observe a partially-populated cache
        match timeout(self.settings.cache_sync_timeout, synced_rx.wait_for(|s| *s)).await {
            Ok(Ok(_)) => debug!("Cache for {} synced, starting workers", self.kind),
            _ => {
                error!("Timed out waiting for {} cache to sync", self.kind);
                reflector.abort();
                return Err(SynkaError::CacheSyncTimeout);
            }
        }

        let engine = Arc::new(SyncEngine::new(
            store,
            Arc::clone(&self.registry),
            resource,
        ));
        let mut workers = Vec::with_capacity(self.settings.workers);
        for _ in 0..self.settings.workers {
            workers.push(tokio::spawn(worker_loop(
                Arc::clone(&queue),
                Arc::clone(&engine),
                self.settings.retry_limit,
            )));
        }

        // Shut the queue down when the stop signal fires so workers drain
        // their in-flight keys and exit
        {
            let queue = Arc::clone(&queue);
            let mut shutdown = shutdown.clone();
            tokio::spawn(async move {
                let _ = shutdown.wait_for(|stop| *stop).await;
                queue.shut_down();
            });
        }

        for worker in workers {
            let _ = worker.await;
        }
        let _ = reflector.await;
        info!("Shut down controller for {}", self.kind);
        Ok(())
    }
}

/// Get a key, sync it, and account for the outcome; exits on queue shutdown
async fn worker_loop(queue: Arc<WorkQueue>, engine: Arc<SyncEngine>, retry_limit: u32) {
    while let Some(key) = queue.get().await {
        let result = engine.sync(&key).await;
        finish_key(&queue, &key, result, retry_limit);
        queue.done(&key);
    }
}

/// Success forgets the key's retry history; failure requeues with backoff
/// until the retry ceiling, then drops the key. Returns whether the key was
/// dropped.
fn finish_key(queue: &Arc<WorkQueue>, key: &str, result: Result<()>, retry_limit: u32) -> bool {
    match result {
        Ok(()) => {
            queue.forget(key);
            false
        }
        Err(e) if queue.num_requeues(key) < retry_limit => {
            warn!("Error syncing resource {}: {}", key, e);
            queue.add_rate_limited(key);
            false
        }
        Err(e) => {
            queue.forget(key);
            error!("Dropping resource {} out of the queue: {}", key, e);
            true
        }
    }
}
