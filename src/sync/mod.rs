// Copyright 2026, The Synka Authors
// SPDX-License-Identifier: Apache-2.0

//! Per-object sync policy and the multi-cluster sync engine.

pub mod engine;
pub mod policy;

pub use engine::SyncEngine;
pub use policy::SyncPolicy;
