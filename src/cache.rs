// Copyright 2026, The Synka Authors
// SPDX-License-Identifier: Apache-2.0

//! In-memory mirror of the watched resource collection.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use kube::api::DynamicObject;
use kube::ResourceExt;

/// Key of an object within its kind: `namespace/name`, or bare `name` for
/// cluster-scoped objects.
pub fn object_key(obj: &DynamicObject) -> String {
    let name = obj.name_any();
    match obj.namespace() {
        Some(namespace) if !namespace.is_empty() => format!("{}/{}", namespace, name),
        _ => name,
    }
}

/// Key-indexed store of the last-observed object states.
///
/// Written only by the watch reflector; read concurrently by the workers.
/// Contents are eventually consistent with the source cluster and valid to
/// read only after the reflector reports its initial sync.
#[derive(Clone, Default)]
pub struct Store {
    objects: Arc<RwLock<HashMap<String, DynamicObject>>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<DynamicObject> {
        self.objects.read().unwrap().get(key).cloned()
    }

    pub fn insert(&self, key: String, obj: DynamicObject) {
        self.objects.write().unwrap().insert(key, obj);
    }

    pub fn remove(&self, key: &str) {
        self.objects.write().unwrap().remove(key);
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.read().unwrap().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.objects.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
