// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_GROUP_SIZE: u32 = 10;
pub const MIN_GROUP_SIZE: u32 = 2;
pub const MAX_GROUP_SIZE: u32 = 50;

/// Friend group, stored under the reserved `app_groups` key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Group {
    /// `group_<admin>_<YYYYmmddHHMMSS>`
    pub id: String,
    pub name: String,
    pub description: String,
    /// Free-form group type, e.g. "Study Buddies"
    #[serde(rename = "type")]
    pub kind: String,
    /// Username of the creator
    pub admin: String,
    /// Member usernames (may dangle)
    pub members: Vec<String>,
    pub max_members: u32,
    pub created: String,
    pub total_points: i64,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Group {
    pub fn is_full(&self) -> bool {
        self.members.len() as u32 >= self.max_members
    }

    pub fn has_member(&self, username: &str) -> bool {
        self.members.iter().any(|m| m == username)
    }
}
