//! Pagination parameters shared across list endpoints.

use serde::{Deserialize, Serialize};

/// Pagination parameters.
///
/// - `per_page`: 1–100, default 25
/// - `page`: ≥ 1, default 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    #[serde(default = "default_per_page", rename = "per-page")]
    pub per_page: u32,
    #[serde(default = "default_page")]
    pub page: u32,
}

fn default_per_page() -> u32 {
    25
}

fn default_page() -> u32 {
    1
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            per_page: default_per_page(),
            page: default_page(),
        }
    }
}

impl PageRequest {
    /// Clamp `per_page` to the valid range 1–100 and `page` to ≥ 1.
    ///
    /// Call after deserializing from query params to enforce bounds.
    pub fn clamped(self) -> Self {
        Self {
            per_page: self.per_page.clamp(1, 100),
            page: self.page.max(1),
        }
    }
}
