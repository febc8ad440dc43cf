// Copyright 2026, The Synka Authors
// SPDX-License-Identifier: Apache-2.0

/// Kubernetes annotation keys used by Synka
pub mod annotations {
    /// When set to "true", enables replication of this resource to the
    /// configured target clusters
    pub const SYNC: &str = "synka.io/sync";
    /// When set to "true", a copy already present on a target cluster is
    /// left untouched instead of overwritten
    pub const SKIP_EXISTING: &str = "synka.io/skip-existing";
    /// Reserved for per-object cluster targeting. Declared but not consumed
    /// by the sync engine yet.
    pub const CLUSTERS: &str = "synka.io/clusters";
}

/// Resources watched when no --informer flag and no `resources` config entry
/// is given
pub const DEFAULT_WATCHED_RESOURCES: &[&str] = &[
    "deployments.v1.apps",
    "pods.v1.",
    "namespaces.v1.",
    "services.v1.",
    "serviceaccounts.v1.",
];

/// Tunable defaults, overridable via the configuration file
pub mod defaults {
    /// Concurrent workers per controller
    pub const WORKERS: usize = 2;
    /// Failed keys are dropped once their requeue count reaches this value
    pub const RETRY_LIMIT: u32 = 5;
    /// A controller that cannot complete its initial cache sync within this
    /// window stops
    pub const CACHE_SYNC_TIMEOUT_SECS: u64 = 60;
    /// Initial retry delay in milliseconds, doubled per attempt
    pub const BACKOFF_BASE_MS: u64 = 5;
    /// Retry delay ceiling in seconds
    pub const BACKOFF_MAX_SECS: u64 = 1000;
}
