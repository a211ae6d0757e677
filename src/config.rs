//! Inventory configuration.

use serde::{Deserialize, Serialize};

use crate::storage::BackendConfig;
use crate::Result;

/// Bound applied to every graph walk when no other limit is given.
pub const DEFAULT_MAX_TRAVERSAL_DEPTH: usize = 20;

/// Settings for opening an [`Inventory`](crate::Inventory).
///
/// Every field has a default, so `{}` is a valid JSON configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    pub backend: BackendConfig,
    /// Maximum hops for dependency, location and placement walks.
    pub max_traversal_depth: usize,
    /// Create the unique constraint on `Node.handle_id` when opening.
    pub ensure_constraints: bool,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::Memory,
            max_traversal_depth: DEFAULT_MAX_TRAVERSAL_DEPTH,
            ensure_constraints: true,
        }
    }
}

impl InventoryConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_max_traversal_depth(mut self, depth: usize) -> Self {
        self.max_traversal_depth = depth;
        self
    }
}
