// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer (single JSON document on disk).

pub mod json_store;

pub use json_store::{JsonStore, Store, StoreError};

/// Reserved top-level keys in the data file.
pub mod keys {
    /// Object of groups keyed by group id. Never a username.
    pub const GROUPS: &str = "app_groups";
}
