// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use serde::{Deserialize, Serialize};

/// An earned achievement. Names are unique per user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Badge {
    pub name: String,
    pub description: String,
    /// Date awarded (YYYY-MM-DD)
    pub date: String,
    /// Bonus points granted with the badge
    pub points: u32,
}
