// Copyright 2026, The Synka Authors
// SPDX-License-Identifier: Apache-2.0

//! Sync policy derived from object annotations.

use std::collections::BTreeMap;

use kube::api::DynamicObject;
use kube::ResourceExt;

use crate::constants::annotations;

/// How one object is replicated. Computed fresh from annotations at sync
/// time, never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncPolicy {
    /// Replicate this object. Absent or any value other than "true" means no.
    pub sync: bool,
    /// Leave a copy already present on a target untouched instead of
    /// overwriting it
    pub skip_existing: bool,
}

impl SyncPolicy {
    pub fn from_annotations(annotations: &BTreeMap<String, String>) -> Self {
        Self {
            sync: flag(annotations, annotations::SYNC),
            skip_existing: flag(annotations, annotations::SKIP_EXISTING),
        }
    }

    pub fn from_object(obj: &DynamicObject) -> Self {
        Self::from_annotations(obj.annotations())
    }
}

fn flag(annotations: &BTreeMap<String, String>, key: &str) -> bool {
    annotations.get(key).is_some_and(|v| v == "true")
}
