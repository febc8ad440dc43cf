// Copyright 2026, The Synka Authors
// SPDX-License-Identifier: Apache-2.0

//! Watched resource kinds: parsing and discovery against the source cluster.

use std::fmt;

use kube::api::{Api, DynamicObject};
use kube::discovery::{ApiResource, Discovery, Scope};
use kube::Client;

use crate::error::{Result, SynkaError};

/// A group/version/resource triple in the `resource.version.group` form used
/// on the command line, e.g. `deployments.v1.apps` or `pods.v1.` for core
/// kinds. The group may itself contain dots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceKind {
    pub resource: String,
    pub version: String,
    pub group: String,
}

impl ResourceKind {
    pub fn parse(arg: &str) -> Result<Self> {
        let mut parts = arg.splitn(3, '.');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(resource), Some(version), group)
                if !resource.is_empty() && !version.is_empty() =>
            {
                Ok(Self {
                    resource: resource.to_string(),
                    version: version.to_string(),
                    group: group.unwrap_or("").to_string(),
                })
            }
            _ => Err(SynkaError::InvalidResource(arg.to_string())),
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.resource, self.version, self.group)
    }
}

/// A [`ResourceKind`] resolved against the source cluster's discovery API:
/// the concrete [`ApiResource`] plus whether the kind is namespaced.
#[derive(Debug, Clone)]
pub struct WatchedResource {
    pub api_resource: ApiResource,
    pub namespaced: bool,
}

impl WatchedResource {
    /// Resolve a kind by scanning the API groups the source cluster serves
    pub async fn discover(client: &Client, kind: &ResourceKind) -> Result<Self> {
        let discovery = Discovery::new(client.clone())
            .run()
            .await
            .map_err(SynkaError::Kube)?;

        for group in discovery.groups() {
            if group.name() != kind.group {
                continue;
            }
            for (api_resource, capabilities) in group.versioned_resources(&kind.version) {
                if api_resource.plural == kind.resource {
                    return Ok(Self {
                        namespaced: matches!(capabilities.scope, Scope::Namespaced),
                        api_resource,
                    });
                }
            }
        }

        Err(SynkaError::UnknownResource(kind.to_string()))
    }

    /// Api spanning all namespaces, for the watch side
    pub fn all_api(&self, client: Client) -> Api<DynamicObject> {
        Api::all_with(client, &self.api_resource)
    }

    /// Api scoped the way a single object is addressed on a target cluster
    pub fn scoped_api(&self, client: Client, namespace: Option<&str>) -> Api<DynamicObject> {
        match namespace {
            Some(ns) if self.namespaced => Api::namespaced_with(client, ns, &self.api_resource),
            _ => Api::all_with(client, &self.api_resource),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_grouped_resource() {
        let kind = ResourceKind::parse("deployments.v1.apps").unwrap();
        assert_eq!(kind.resource, "deployments");
        assert_eq!(kind.version, "v1");
        assert_eq!(kind.group, "apps");
    }

    #[test]
    fn parses_core_group_resource() {
        let kind = ResourceKind::parse("pods.v1.").unwrap();
        assert_eq!(kind.resource, "pods");
        assert_eq!(kind.version, "v1");
        assert_eq!(kind.group, "");
    }

    #[test]
    fn group_may_contain_dots() {
        let kind = ResourceKind::parse("certificates.v1.cert-manager.io").unwrap();
        assert_eq!(kind.resource, "certificates");
        assert_eq!(kind.version, "v1");
        assert_eq!(kind.group, "cert-manager.io");
    }

    #[test]
    fn rejects_missing_version() {
        assert!(ResourceKind::parse("deployments").is_err());
        assert!(ResourceKind::parse("deployments.").is_err());
        assert!(ResourceKind::parse("").is_err());
    }

    #[test]
    fn display_round_trips() {
        let kind = ResourceKind::parse("deployments.v1.apps").unwrap();
        assert_eq!(kind.to_string(), "deployments.v1.apps");
        assert_eq!(ResourceKind::parse(&kind.to_string()).unwrap(), kind);
    }
}
