// Copyright 2026, The Synka Authors
// SPDX-License-Identifier: Apache-2.0

//! Reconciles one object key against every target cluster.

use std::sync::Arc;

use kube::api::{DynamicObject, PostParams};
use kube::{Client, ResourceExt};
use tracing::{debug, info, instrument};

use crate::cache::Store;
use crate::cluster::ClusterRegistry;
use crate::error::Result;
use crate::resource::WatchedResource;
use crate::sync::SyncPolicy;

/// What a single-cluster pass did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Created,
    Updated,
    Skipped,
}

pub struct SyncEngine {
    store: Store,
    registry: Arc<ClusterRegistry>,
    resource: WatchedResource,
}

impl SyncEngine {
    pub fn new(store: Store, registry: Arc<ClusterRegistry>, resource: WatchedResource) -> Self {
        Self {
            store,
            registry,
            resource,
        }
    }

    /// Replicate the object behind `key` to every target cluster, in
    /// configuration order.
    ///
    /// The first failing cluster aborts the remaining ones and fails the
    /// whole key; the retry re-applies every cluster, which is safe because
    /// create-or-update is idempotent.
    #[instrument(skip(self), fields(resource = %self.resource.api_resource.plural))]
    pub async fn sync(&self, key: &str) -> Result<()> {
        let Some(obj) = self.store.get(key) else {
            // Deleted upstream. Replicated copies are intentionally left in
            // place; deletes are not propagated.
            info!("Resource {} does not exist anymore", key);
            return Ok(());
        };

        let policy = SyncPolicy::from_object(&obj);
        if !policy.sync {
            debug!("Resource {} is not annotated for sync, skipping", key);
            return Ok(());
        }

        let clean = sanitize(&obj);
        for cluster in self.registry.clusters() {
            let client = self.registry.client_for(cluster).await?;
            let outcome = apply_to_cluster(client, &self.resource, &clean, &policy).await?;
            debug!(
                "Synced {} to cluster '{}': {:?}",
                key, cluster.name, outcome
            );
        }

        Ok(())
    }
}

/// Strip fields that are only meaningful on the source cluster, so the
/// payload does not conflict with the target's own bookkeeping
pub(crate) fn sanitize(obj: &DynamicObject) -> DynamicObject {
    let mut clean = obj.clone();
    clean.metadata.resource_version = None;
    clean.metadata.uid = None;
    clean
}

/// Get-then-create-or-update for one object on one target cluster
pub(crate) async fn apply_to_cluster(
    client: Client,
    resource: &WatchedResource,
    obj: &DynamicObject,
    policy: &SyncPolicy,
) -> Result<SyncOutcome> {
    let name = obj.name_any();
    let api = resource.scoped_api(client, obj.namespace().as_deref());

    match api.get_opt(&name).await? {
        None => {
            api.create(&PostParams::default(), obj).await?;
            Ok(SyncOutcome::Created)
        }
        Some(_) if policy.skip_existing => Ok(SyncOutcome::Skipped),
        Some(_) => {
            api.replace(&name, &PostParams::default(), obj).await?;
            Ok(SyncOutcome::Updated)
        }
    }
}
