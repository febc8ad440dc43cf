// Copyright 2026, The Synka Authors
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SynkaError {
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid resource kind '{0}': expected resource.version.group")]
    InvalidResource(String),

    #[error("Resource '{0}' is not served by the source cluster")]
    UnknownResource(String),

    #[error("Failed to build client for cluster '{cluster}': {reason}")]
    ClusterClient { cluster: String, reason: String },

    #[error("Timed out waiting for cache to sync")]
    CacheSyncTimeout,
}

pub type Result<T> = std::result::Result<T, SynkaError>;
