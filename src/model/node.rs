//! Node in the property graph.

use serde::{Deserialize, Serialize};
use super::{MetaType, PropertyMap, Value};
use crate::{Error, Result};

/// Label carried by every inventory node.
pub const NODE_LABEL: &str = "Node";

/// Store-assigned node identifier. Never exposed as an inventory identity;
/// callers address nodes by `handle_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A node as the store returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub labels: Vec<String>,
    pub properties: PropertyMap,
}

impl Node {
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// The caller-assigned inventory identifier, if the node carries one.
    pub fn handle_id(&self) -> Option<&str> {
        self.get("handle_id").and_then(Value::as_str)
    }

    pub fn name(&self) -> Option<&str> {
        self.get("name").and_then(Value::as_str)
    }

    /// The first meta-type label on the node.
    pub fn meta_type(&self) -> Result<MetaType> {
        self.labels
            .iter()
            .find_map(|l| l.parse::<MetaType>().ok())
            .ok_or_else(|| Error::NoMetaLabelFound(self.handle_id().unwrap_or_default().to_owned()))
    }
}
