// Copyright 2026, The Synka Authors
// SPDX-License-Identifier: Apache-2.0

//! Target cluster descriptors and the connection registry.

use std::collections::HashMap;

use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config as KubeConfig};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{Result, SynkaError};

/// Connection parameters for one target cluster, as configured.
///
/// `cert`, `key` and `ca` carry base64-encoded PEM material, the same
/// encoding a kubeconfig file uses. All fields are immutable after startup.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ClusterSpec {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub server: String,
    #[serde(default)]
    pub insecure_skip_tls_verify: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cert: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl ClusterSpec {
    /// Render the descriptor as a single-context kubeconfig document
    fn kubeconfig(&self) -> Result<Kubeconfig> {
        let mut cluster = json!({ "server": self.server });
        if self.insecure_skip_tls_verify {
            cluster["insecure-skip-tls-verify"] = json!(true);
        }
        if let Some(ca) = &self.ca {
            cluster["certificate-authority-data"] = json!(ca);
        }

        let mut user = json!({});
        if let Some(cert) = &self.cert {
            user["client-certificate-data"] = json!(cert);
        }
        if let Some(key) = &self.key {
            user["client-key-data"] = json!(key);
        }
        if let Some(token) = &self.token {
            user["token"] = json!(token);
        }

        let doc = json!({
            "apiVersion": "v1",
            "kind": "Config",
            "clusters": [{ "name": self.name, "cluster": cluster }],
            "users": [{ "name": self.name, "user": user }],
            "contexts": [{
                "name": self.name,
                "context": { "cluster": self.name, "user": self.name },
            }],
            "current-context": self.name,
        });

        serde_json::from_value(doc).map_err(|e| SynkaError::ClusterClient {
            cluster: self.name.clone(),
            reason: format!("invalid kubeconfig: {}", e),
        })
    }

    async fn build_client(&self) -> Result<Client> {
        let kubeconfig = self.kubeconfig()?;
        let config = KubeConfig::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
            .await
            .map_err(|e| SynkaError::ClusterClient {
                cluster: self.name.clone(),
                reason: format!("failed to create config: {}", e),
            })?;
        Client::try_from(config).map_err(|e| SynkaError::ClusterClient {
            cluster: self.name.clone(),
            reason: format!("failed to create client: {}", e),
        })
    }
}

/// Owns the configured cluster descriptors and a lazily-populated map of
/// live connections, one per cluster for the process lifetime.
pub struct ClusterRegistry {
    clusters: Vec<ClusterSpec>,
    connections: Mutex<HashMap<String, Client>>,
}

impl ClusterRegistry {
    pub fn new(clusters: Vec<ClusterSpec>) -> Self {
        Self {
            clusters,
            connections: Mutex::new(HashMap::new()),
        }
    }

    /// Target clusters in configuration order
    pub fn clusters(&self) -> &[ClusterSpec] {
        &self.clusters
    }

    /// Get the cached connection for a cluster, building it on first use.
    ///
    /// The lock is held across construction so concurrent first use from
    /// multiple workers still builds exactly one client.
    pub async fn client_for(&self, cluster: &ClusterSpec) -> Result<Client> {
        let mut connections = self.connections.lock().await;
        if let Some(client) = connections.get(&cluster.name) {
            return Ok(client.clone());
        }

        debug!("Building client for cluster '{}'", cluster.name);
        let client = cluster.build_client().await?;
        connections.insert(cluster.name.clone(), client.clone());
        info!("Connected client for cluster '{}'", cluster.name);
        Ok(client)
    }
}
