// Copyright 2026, The Synka Authors
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading and validation.

use std::collections::HashSet;
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Deserialize;

use crate::cluster::ClusterSpec;
use crate::constants::defaults;
use crate::error::{Result, SynkaError};

/// Synka configuration, decoded from a YAML file.
///
/// `clusters` is ordered: the sync engine processes target clusters in the
/// order they appear here.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub clusters: Vec<ClusterSpec>,
    /// Resource kinds to watch, as `resource.version.group`. Overridden by
    /// the --informer flag.
    #[serde(default)]
    pub resources: Vec<String>,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_retry_limit")]
    pub retry_limit: u32,
    #[serde(default = "default_cache_sync_timeout_secs")]
    pub cache_sync_timeout_secs: u64,
}

fn default_workers() -> usize {
    defaults::WORKERS
}

fn default_retry_limit() -> u32 {
    defaults::RETRY_LIMIT
}

fn default_cache_sync_timeout_secs() -> u64 {
    defaults::CACHE_SYNC_TIMEOUT_SECS
}

impl Config {
    /// Load and validate configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| SynkaError::Config(format!("failed to read {}: {}", path.display(), e)))?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(raw)
            .map_err(|e| SynkaError::Config(format!("failed to parse configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(SynkaError::Config("workers must be at least 1".into()));
        }

        let mut names = HashSet::new();
        for cluster in &self.clusters {
            if cluster.name.is_empty() {
                return Err(SynkaError::Config("cluster name must not be empty".into()));
            }
            if !names.insert(cluster.name.as_str()) {
                return Err(SynkaError::Config(format!(
                    "duplicate cluster name '{}'",
                    cluster.name
                )));
            }
            if cluster.server.is_empty() {
                return Err(SynkaError::Config(format!(
                    "cluster '{}' has no server address",
                    cluster.name
                )));
            }
            for (field, value) in [
                ("cert", &cluster.cert),
                ("key", &cluster.key),
                ("ca", &cluster.ca),
            ] {
                if let Some(value) = value {
                    BASE64.decode(value).map_err(|e| {
                        SynkaError::Config(format!(
                            "cluster '{}': {} is not valid base64: {}",
                            cluster.name, field, e
                        ))
                    })?;
                }
            }
        }
        Ok(())
    }
}
