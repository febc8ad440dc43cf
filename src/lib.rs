// Copyright 2026, The Synka Authors
// SPDX-License-Identifier: Apache-2.0
pub mod cache;
pub mod cluster;
pub mod config;
pub mod constants;
pub mod controller;
pub mod error;
pub mod queue;
pub mod reflector;
pub mod resource;
pub mod sync;

#[cfg(test)]
mod test_utils;
