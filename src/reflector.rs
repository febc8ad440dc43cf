// Copyright 2026, The Synka Authors
// SPDX-License-Identifier: Apache-2.0

//! Streams change notifications from the source cluster into the cache and
//! the work queue.

use std::collections::HashSet;
use std::sync::Arc;

use futures::StreamExt;
use kube::api::{Api, DynamicObject};
use kube_runtime::watcher;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::cache::{object_key, Store};
use crate::queue::WorkQueue;

/// List-then-watch loop for one resource kind.
///
/// The watcher performs the initial list, then streams individual changes,
/// and internally falls back to a fresh list when the stream breaks or the
/// resumption marker expires; those retries never surface to the queue.
/// Returns when the shutdown signal fires.
pub async fn run_reflector(
    api: Api<DynamicObject>,
    store: Store,
    queue: Arc<WorkQueue>,
    synced: watch::Sender<bool>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut stream = watcher(api, watcher::Config::default()).boxed();
    // Keys seen during an in-progress (re)list, used to prune stale entries
    let mut relist: Option<HashSet<String>> = None;

    loop {
        tokio::select! {
            _ = shutdown.wait_for(|stop| *stop) => {
                debug!("Tearing down watch stream");
                return;
            }
            event = stream.next() => match event {
                Some(Ok(event)) => apply_event(event, &mut relist, &store, &queue, &synced),
                Some(Err(e)) => warn!("Watch stream error, will re-list and resume: {}", e),
                None => return,
            }
        }
    }
}

/// Fold one change notification into the cache and the queue
fn apply_event(
    event: watcher::Event<DynamicObject>,
    relist: &mut Option<HashSet<String>>,
    store: &Store,
    queue: &WorkQueue,
    synced: &watch::Sender<bool>,
) {
    match event {
        watcher::Event::Init => {
            // A full synchronization begins; the current cache keeps serving
            // readers until it completes
            *relist = Some(HashSet::new());
        }
        watcher::Event::InitApply(obj) => {
            let key = object_key(&obj);
            if let Some(seen) = relist.as_mut() {
                seen.insert(key.clone());
            }
            store.insert(key.clone(), obj);
            queue.add(&key);
        }
        watcher::Event::InitDone => {
            if let Some(seen) = relist.take() {
                // Objects deleted while the stream was down would otherwise
                // linger in the cache forever
                for stale in store.keys() {
                    if !seen.contains(&stale) {
                        store.remove(&stale);
                        queue.add(&stale);
                    }
                }
            }
            let _ = synced.send(true);
        }
        watcher::Event::Apply(obj) => {
            let key = object_key(&obj);
            store.insert(key.clone(), obj);
            queue.add(&key);
        }
        watcher::Event::Delete(obj) => {
            let key = object_key(&obj);
            store.remove(&key);
            queue.add(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::ExponentialBackoff;
    use kube::api::ObjectMeta;

    fn make_obj(namespace: &str, name: &str) -> DynamicObject {
        DynamicObject {
            types: None,
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                ..Default::default()
            },
            data: serde_json::json!({}),
        }
    }

    struct Fixture {
        store: Store,
        queue: Arc<WorkQueue>,
        synced_tx: watch::Sender<bool>,
        synced_rx: watch::Receiver<bool>,
        relist: Option<HashSet<String>>,
    }

    impl Fixture {
        fn new() -> Self {
            let (synced_tx, synced_rx) = watch::channel(false);
            Self {
                store: Store::new(),
                queue: WorkQueue::new(ExponentialBackoff::default()),
                synced_tx,
                synced_rx,
                relist: None,
            }
        }

        fn apply(&mut self, event: watcher::Event<DynamicObject>) {
            apply_event(
                event,
                &mut self.relist,
                &self.store,
                &self.queue,
                &self.synced_tx,
            );
        }
    }

    #[tokio::test]
    async fn initial_list_seeds_cache_and_queue_then_signals() {
        let mut fx = Fixture::new();

        fx.apply(watcher::Event::Init);
        fx.apply(watcher::Event::InitApply(make_obj("default", "web")));
        fx.apply(watcher::Event::InitApply(make_obj("default", "db")));
        assert!(!*fx.synced_rx.borrow());

        fx.apply(watcher::Event::InitDone);
        assert!(*fx.synced_rx.borrow());
        assert_eq!(fx.store.len(), 2);
        assert!(fx.store.get("default/web").is_some());

        let mut keys = vec![
            fx.queue.get().await.unwrap(),
            fx.queue.get().await.unwrap(),
        ];
        keys.sort();
        assert_eq!(keys, vec!["default/db", "default/web"]);
    }

    #[tokio::test]
    async fn apply_upserts_and_enqueues() {
        let mut fx = Fixture::new();

        let mut obj = make_obj("default", "web");
        obj.data = serde_json::json!({"spec": 1});
        fx.apply(watcher::Event::Apply(obj));

        let mut obj = make_obj("default", "web");
        obj.data = serde_json::json!({"spec": 2});
        fx.apply(watcher::Event::Apply(obj));

        assert_eq!(fx.store.len(), 1);
        assert_eq!(fx.store.get("default/web").unwrap().data["spec"], 2);
        // Burst notifications for one key coalesce into one pending pass
        assert_eq!(fx.queue.get().await.unwrap(), "default/web");
        fx.queue.done("default/web");
        fx.queue.shut_down();
        assert_eq!(fx.queue.get().await, None);
    }

    #[tokio::test]
    async fn delete_removes_from_cache_but_still_enqueues() {
        let mut fx = Fixture::new();

        fx.apply(watcher::Event::Apply(make_obj("default", "web")));
        fx.apply(watcher::Event::Delete(make_obj("default", "web")));

        assert!(fx.store.get("default/web").is_none());
        // The worker observes the cache miss and treats it as a deletion
        assert_eq!(fx.queue.get().await.unwrap(), "default/web");
    }

    #[tokio::test]
    async fn relist_prunes_objects_deleted_while_disconnected() {
        let mut fx = Fixture::new();

        fx.apply(watcher::Event::Init);
        fx.apply(watcher::Event::InitApply(make_obj("default", "web")));
        fx.apply(watcher::Event::InitApply(make_obj("default", "db")));
        fx.apply(watcher::Event::InitDone);

        // Stream broke; the re-list no longer contains default/db
        fx.apply(watcher::Event::Init);
        fx.apply(watcher::Event::InitApply(make_obj("default", "web")));
        fx.apply(watcher::Event::InitDone);

        assert!(fx.store.get("default/web").is_some());
        assert!(fx.store.get("default/db").is_none());
        assert!(*fx.synced_rx.borrow());
    }
}
