//! # Node Models
//!
//! Typed, read-through views of inventory nodes.
//!
//! A [`NodeModel`] is built from one fetch of a node plus its adjacent
//! relationships, grouped by kind and direction. It is a snapshot: mutation
//! methods write through the store and hand back a freshly loaded model
//! rather than changing the one they were called on.
//!
//! Which operations a model supports follows from its [`NodeType`] and
//! meta-type through [`Capability`]; an operation the node lacks fails with
//! `Error::UnsupportedOperation`.
//!
//! | Module | Operations |
//! |--------|------------|
//! | `placement` | location, placement, Has and Part_of |
//! | `relations` | Owns/Provides/Uses/Responsible_for, service customers |
//! | `dependency` | Depends_on reads, writes and classification |
//! | `equipment` | equipment ports and connections, port units |
//! | `cable` | cable ports, connected equipment, affected services |
//! | `peering` | host services, peering groups |

mod cable;
mod dependency;
mod equipment;
mod peering;
mod placement;
mod relations;
pub mod relationship;
pub mod traversal;
pub mod variant;

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use tracing::warn;

use crate::model::{Direction, MetaType, Node, PropertyMap, RelId, RelKind};
use crate::repository::{node_by_id, NodeRepository, RelationshipRepository};
use crate::storage::StorageBackend;
use crate::{Error, Result};

pub use cable::{ConnectedEquipment, ServiceUsers};
pub use equipment::Connection;
pub use placement::ChildFormData;
pub use relationship::RelationshipModel;
pub use traversal::DependencyClasses;
pub use variant::{Capability, NodeType};

// ============================================================================
// Summaries
// ============================================================================

/// The identifying part of a node, as it appears inside other results.
///
/// Equality and ordering go by `handle_id` alone.
#[derive(Debug, Clone, Serialize)]
pub struct NodeSummary {
    pub handle_id: String,
    pub meta_type: MetaType,
    pub node_type: NodeType,
    pub labels: Vec<String>,
    pub data: PropertyMap,
}

impl NodeSummary {
    pub fn from_node(node: &Node) -> Result<Self> {
        let meta_type = node.meta_type()?;
        Ok(Self {
            handle_id: node.handle_id().unwrap_or_default().to_owned(),
            meta_type,
            node_type: NodeType::resolve(&node.labels, meta_type),
            labels: node.labels.clone(),
            data: node.properties.clone(),
        })
    }

    pub fn name(&self) -> Option<&str> {
        self.data.get("name").and_then(|v| v.as_str())
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }
}

impl PartialEq for NodeSummary {
    fn eq(&self, other: &Self) -> bool {
        self.handle_id == other.handle_id
    }
}

impl Eq for NodeSummary {}

impl PartialOrd for NodeSummary {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NodeSummary {
    fn cmp(&self, other: &Self) -> Ordering {
        self.handle_id.cmp(&other.handle_id)
    }
}

impl fmt::Display for NodeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:?} (handle_id {})",
            self.node_type,
            self.name().unwrap_or_default(),
            self.handle_id
        )
    }
}

/// One adjacent relationship and the node at its other end.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Related {
    pub relationship_id: RelId,
    pub properties: PropertyMap,
    pub node: NodeSummary,
}

/// Adjacent relationships grouped by kind.
pub type Relations = BTreeMap<RelKind, Vec<Related>>;

/// One relationship touched by a `set_*` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetEntry {
    pub relationship_id: RelId,
    pub node: NodeSummary,
    /// False when an existing relationship was reused.
    pub created: bool,
}

/// Result of an idempotent `set_*` call, grouped by relationship kind.
pub type SetResult = BTreeMap<RelKind, Vec<SetEntry>>;

// ============================================================================
// NodeModel
// ============================================================================

/// A typed snapshot of one node and its neighborhood.
pub struct NodeModel<'a, B: StorageBackend> {
    backend: &'a B,
    max_depth: usize,
    node: Node,
    summary: NodeSummary,
    incoming: Relations,
    outgoing: Relations,
}

impl<'a, B: StorageBackend> NodeModel<'a, B> {
    pub(crate) async fn load(
        backend: &'a B,
        tx: &B::Tx,
        handle_id: &str,
        max_depth: usize,
    ) -> Result<Self> {
        let node = NodeRepository::new(backend).get_node(tx, handle_id).await?;
        Self::from_node(backend, tx, node, max_depth).await
    }

    async fn from_node(backend: &'a B, tx: &B::Tx, node: Node, max_depth: usize) -> Result<Self> {
        let summary = NodeSummary::from_node(&node)?;
        let mut incoming = Relations::new();
        let mut outgoing = Relations::new();

        for rel in backend.get_relationships(tx, node.id, Direction::Both, None).await? {
            let kind = match rel.kind() {
                Ok(kind) => kind,
                Err(_) => {
                    warn!(
                        handle_id = %summary.handle_id,
                        rel_type = %rel.rel_type,
                        "skipping relationship of unknown kind"
                    );
                    continue;
                }
            };
            let Some(other_id) = rel.other_node(node.id) else { continue };
            let other = node_by_id(backend, tx, other_id).await?;
            let related = Related {
                relationship_id: rel.id,
                properties: rel.properties.clone(),
                node: NodeSummary::from_node(&other)?,
            };
            if rel.src == node.id {
                outgoing.entry(kind).or_default().push(related.clone());
            }
            if rel.dst == node.id {
                incoming.entry(kind).or_default().push(related);
            }
        }
        for list in incoming.values_mut().chain(outgoing.values_mut()) {
            list.sort_by(|a, b| {
                a.node.cmp(&b.node).then(a.relationship_id.cmp(&b.relationship_id))
            });
        }

        Ok(Self { backend, max_depth, node, summary, incoming, outgoing })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn handle_id(&self) -> &str {
        &self.summary.handle_id
    }

    pub fn meta_type(&self) -> MetaType {
        self.summary.meta_type
    }

    pub fn node_type(&self) -> NodeType {
        self.summary.node_type
    }

    pub fn labels(&self) -> &[String] {
        &self.summary.labels
    }

    pub fn data(&self) -> &PropertyMap {
        &self.summary.data
    }

    pub fn name(&self) -> Option<&str> {
        self.summary.name()
    }

    pub fn summary(&self) -> &NodeSummary {
        &self.summary
    }

    pub fn incoming(&self) -> &Relations {
        &self.incoming
    }

    pub fn outgoing(&self) -> &Relations {
        &self.outgoing
    }

    /// Incoming and outgoing relationships merged by kind.
    pub fn relationships(&self) -> Relations {
        let mut all = self.outgoing.clone();
        for (kind, list) in &self.incoming {
            let merged = all.entry(*kind).or_default();
            for related in list {
                if !merged.iter().any(|r| r.relationship_id == related.relationship_id) {
                    merged.push(related.clone());
                }
            }
        }
        all
    }

    pub fn supports(&self, capability: Capability) -> bool {
        self.summary.node_type.supports(self.summary.meta_type, capability)
    }

    fn require(&self, capability: Capability, operation: &'static str) -> Result<()> {
        if self.supports(capability) {
            Ok(())
        } else {
            Err(Error::UnsupportedOperation {
                operation,
                node_type: self.summary.node_type.to_string(),
            })
        }
    }

    fn nodes(&self) -> NodeRepository<'a, B> {
        NodeRepository::new(self.backend)
    }

    /// Relations of the given kinds on one side, empty kinds omitted.
    fn select(
        &self,
        direction: Direction,
        kinds: &[RelKind],
        filter: impl Fn(&Related) -> bool,
    ) -> Relations {
        let side = match direction {
            Direction::Incoming => &self.incoming,
            _ => &self.outgoing,
        };
        kinds
            .iter()
            .filter_map(|kind| {
                let list: Vec<Related> =
                    side.get(kind)?.iter().filter(|r| filter(*r)).cloned().collect();
                (!list.is_empty()).then_some((*kind, list))
            })
            .collect()
    }

    /// Idempotently relate this node and `other_handle_id`.
    ///
    /// With `outgoing` the edge runs from this node, otherwise towards it.
    async fn ensure_edge(
        &self,
        tx: &mut B::Tx,
        kind: RelKind,
        other_handle_id: &str,
        outgoing: bool,
        key: PropertyMap,
    ) -> Result<SetResult> {
        let other = self.nodes().get_node(tx, other_handle_id).await?;
        let rels = RelationshipRepository::new(self.backend);
        let (relationship_id, created) = if outgoing {
            rels.ensure(tx, &self.node, kind, &other, key).await?
        } else {
            rels.ensure(tx, &other, kind, &self.node, key).await?
        };
        let entry = SetEntry {
            relationship_id,
            node: NodeSummary::from_node(&other)?,
            created,
        };
        Ok(SetResult::from([(kind, vec![entry])]))
    }

    // ========================================================================
    // Lifecycle and labels
    // ========================================================================

    /// Fetch the node again and rebuild the model, possibly as another variant.
    pub async fn reload(&self, tx: &B::Tx) -> Result<Self> {
        Self::load(self.backend, tx, &self.summary.handle_id, self.max_depth).await
    }

    /// Delete the node and every incident relationship.
    pub async fn delete(self, tx: &mut B::Tx) -> Result<()> {
        self.nodes().delete_node(tx, &self.summary.handle_id).await
    }

    /// Merge `updates` into the node's properties (empty values delete).
    pub async fn set_properties(&self, tx: &mut B::Tx, updates: &PropertyMap) -> Result<Self> {
        let node = self.nodes().set_node_properties(tx, &self.summary.handle_id, updates).await?;
        Self::from_node(self.backend, tx, node, self.max_depth).await
    }

    pub async fn add_label(&self, tx: &mut B::Tx, label: &str) -> Result<Self> {
        let node = self.nodes().add_label(tx, &self.summary.handle_id, label).await?;
        Self::from_node(self.backend, tx, node, self.max_depth).await
    }

    pub async fn remove_label(&self, tx: &mut B::Tx, label: &str) -> Result<Self> {
        let node = self.nodes().remove_label(tx, &self.summary.handle_id, label).await?;
        Self::from_node(self.backend, tx, node, self.max_depth).await
    }

    /// Replace type label `old_type` with `new_type`; the returned model is
    /// resolved against the new labels.
    pub async fn switch_type(
        &self,
        tx: &mut B::Tx,
        old_type: &str,
        new_type: &str,
    ) -> Result<Self> {
        let node = self
            .nodes()
            .switch_type(tx, &self.summary.handle_id, old_type, new_type)
            .await?;
        Self::from_node(self.backend, tx, node, self.max_depth).await
    }

    /// Move the node to another meta-type. Existing relationships are kept
    /// as they are, even ones the new meta-type could not create.
    pub async fn change_meta_type(&self, tx: &mut B::Tx, meta_type: MetaType) -> Result<Self> {
        let node = self
            .nodes()
            .change_meta_type(tx, &self.summary.handle_id, meta_type)
            .await?;
        Self::from_node(self.backend, tx, node, self.max_depth).await
    }
}

impl<B: StorageBackend> PartialEq for NodeModel<'_, B> {
    fn eq(&self, other: &Self) -> bool {
        self.summary == other.summary
    }
}

impl<B: StorageBackend> Eq for NodeModel<'_, B> {}

impl<B: StorageBackend> PartialOrd for NodeModel<'_, B> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<B: StorageBackend> Ord for NodeModel<'_, B> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.summary.cmp(&other.summary)
    }
}

impl<B: StorageBackend> fmt::Debug for NodeModel<'_, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeModel")
            .field("handle_id", &self.summary.handle_id)
            .field("node_type", &self.summary.node_type)
            .field("meta_type", &self.summary.meta_type)
            .field("labels", &self.summary.labels)
            .field("incoming", &self.incoming.keys().collect::<Vec<_>>())
            .field("outgoing", &self.outgoing.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<B: StorageBackend> fmt::Display for NodeModel<'_, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}Model(handle_id={}, name={:?})",
            self.summary.node_type,
            self.summary.handle_id,
            self.name().unwrap_or_default()
        )
    }
}
