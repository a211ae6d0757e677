//! Node and relationship repositories.
//!
//! CRUD against the store gateway, addressed by `handle_id` and relationship
//! id. Every operation runs in a transaction supplied by the caller, and all
//! validation happens before the first write.

pub mod nodes;
pub mod relationships;

use serde::Serialize;

use crate::model::{MetaType, Node, NodeId, PropertyMap, RelId, RelKind};
use crate::storage::StorageBackend;
use crate::{Error, Result};

pub use nodes::NodeRepository;
pub use relationships::RelationshipRepository;

/// Raw properties plus classification metadata for one node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeBundle {
    pub data: PropertyMap,
    pub meta_type: MetaType,
    pub labels: Vec<String>,
}

/// A relationship with its endpoints resolved to handle ids.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationshipBundle {
    pub id: RelId,
    #[serde(rename = "type")]
    pub kind: RelKind,
    pub start: String,
    pub end: String,
    pub data: PropertyMap,
}

/// Fetch a node by store id, treating absence as a dangling reference.
pub(crate) async fn node_by_id<B: StorageBackend>(
    backend: &B,
    tx: &B::Tx,
    id: NodeId,
) -> Result<Node> {
    backend
        .get_node(tx, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Node {id}")))
}

/// Order nodes by `handle_id` for deterministic listings.
pub(crate) fn sort_by_handle(nodes: &mut [Node]) {
    nodes.sort_by(|a, b| a.handle_id().cmp(&b.handle_id()));
}

/// Type labels are plain identifiers distinct from `Node` and the meta-types.
pub(crate) fn validate_type_label(label: &str) -> Result<()> {
    let well_formed = !label.is_empty()
        && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !well_formed {
        return Err(Error::InvalidLabel(format!("{label:?} is not a valid type label")));
    }
    if label == crate::model::node::NODE_LABEL || MetaType::is_meta_label(label) {
        return Err(Error::InvalidLabel(format!(
            "{label} is reserved; use change_meta_type for meta-type labels"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_label_validation() {
        assert!(validate_type_label("Optical_Node").is_ok());
        assert!(validate_type_label("").is_err());
        assert!(validate_type_label("Node").is_err());
        assert!(validate_type_label("Physical").is_err());
        assert!(validate_type_label("Bad Label").is_err());
    }
}
