//! In-memory storage backend.
//!
//! This is the reference implementation of `StorageBackend`.
//! It uses simple HashMaps protected by RwLock.
//!
//! ## Transactions
//!
//! Writes are applied immediately and recorded in the transaction's undo
//! journal. `rollback_tx()` replays the journal backwards, so a failed
//! composite mutation leaves no partial writes. There is no isolation
//! between concurrent transactions.
//!
//! ## Limitations
//!
//! - **No property indexes**: property lookups scan the label index.
//! - **Single-writer only**: per-collection locks mean two concurrent
//!   transactions can interleave.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use parking_lot::RwLock;
use async_trait::async_trait;

use crate::model::*;
use crate::tx::{Transaction, TxMode, TxId};
use crate::{Error, Result};
use super::{ConstraintType, StorageBackend};

// ============================================================================
// MemoryBackend
// ============================================================================

/// In-memory property graph storage.
#[derive(Clone)]
pub struct MemoryBackend {
    inner: Arc<MemoryInner>,
}

struct MemoryInner {
    nodes: RwLock<HashMap<NodeId, Node>>,
    relationships: RwLock<HashMap<RelId, Relationship>>,
    /// node_id → list of relationship IDs
    adjacency: RwLock<HashMap<NodeId, Vec<RelId>>>,
    /// label → node IDs (poor man's label index)
    label_index: RwLock<HashMap<String, Vec<NodeId>>>,
    /// (label, property) pairs whose values must be unique
    unique: RwLock<Vec<(String, String)>>,
    next_node_id: AtomicU64,
    next_rel_id: AtomicU64,
    next_tx_id: AtomicU64,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MemoryInner {
                nodes: RwLock::new(HashMap::new()),
                relationships: RwLock::new(HashMap::new()),
                adjacency: RwLock::new(HashMap::new()),
                label_index: RwLock::new(HashMap::new()),
                unique: RwLock::new(Vec::new()),
                next_node_id: AtomicU64::new(1),
                next_rel_id: AtomicU64::new(1),
                next_tx_id: AtomicU64::new(1),
            }),
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// MemoryTx
// ============================================================================

/// Inverse of one applied write.
#[derive(Debug)]
enum Undo {
    DropNode(NodeId),
    RestoreNode(Node),
    DropRelationship(RelId),
    RestoreRelationship(Relationship),
    NodeProperty(NodeId, String, Option<Value>),
    RelationshipProperty(RelId, String, Option<Value>),
    RemoveLabel(NodeId, String),
    AddLabel(NodeId, String),
}

/// In-memory transaction carrying its undo journal.
pub struct MemoryTx {
    id: TxId,
    mode: TxMode,
    journal: Vec<Undo>,
}

impl MemoryTx {
    fn writable(&mut self) -> Result<&mut Vec<Undo>> {
        match self.mode {
            TxMode::ReadWrite => Ok(&mut self.journal),
            TxMode::ReadOnly => Err(Error::TxError(format!(
                "transaction {} is read-only", self.id.0
            ))),
        }
    }
}

impl Transaction for MemoryTx {
    fn mode(&self) -> TxMode { self.mode }
    fn id(&self) -> TxId { self.id }
}

// ============================================================================
// Raw mutations (shared by the trait impl and rollback)
// ============================================================================

impl MemoryInner {
    fn insert_node(&self, node: Node) {
        let id = node.id;
        {
            let mut idx = self.label_index.write();
            for label in &node.labels {
                idx.entry(label.clone()).or_default().push(id);
            }
        }
        self.nodes.write().insert(id, node);
        self.adjacency.write().entry(id).or_default();
    }

    fn remove_node(&self, id: NodeId) -> Option<Node> {
        let removed = self.nodes.write().remove(&id);
        self.adjacency.write().remove(&id);
        if let Some(node) = &removed {
            let mut idx = self.label_index.write();
            for label in &node.labels {
                if let Some(ids) = idx.get_mut(label) {
                    ids.retain(|nid| *nid != id);
                }
            }
        }
        removed
    }

    fn insert_relationship(&self, rel: Relationship) {
        let (id, src, dst) = (rel.id, rel.src, rel.dst);
        self.relationships.write().insert(id, rel);
        let mut adj = self.adjacency.write();
        adj.entry(src).or_default().push(id);
        if src != dst {
            adj.entry(dst).or_default().push(id);
        }
    }

    fn remove_relationship(&self, id: RelId) -> Option<Relationship> {
        let removed = self.relationships.write().remove(&id);
        if let Some(rel) = &removed {
            let mut adj = self.adjacency.write();
            if let Some(rels) = adj.get_mut(&rel.src) {
                rels.retain(|rid| *rid != id);
            }
            if rel.src != rel.dst {
                if let Some(rels) = adj.get_mut(&rel.dst) {
                    rels.retain(|rid| *rid != id);
                }
            }
        }
        removed
    }

    fn put_node_property(&self, id: NodeId, key: &str, val: Option<Value>) -> Result<Option<Value>> {
        let mut nodes = self.nodes.write();
        let node = nodes.get_mut(&id).ok_or_else(|| Error::NotFound(format!("Node {id}")))?;
        Ok(match val {
            Some(v) => node.properties.insert(key.to_string(), v),
            None => node.properties.remove(key),
        })
    }

    fn put_relationship_property(&self, id: RelId, key: &str, val: Option<Value>) -> Result<Option<Value>> {
        let mut rels = self.relationships.write();
        let rel = rels.get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("Relationship {id}")))?;
        Ok(match val {
            Some(v) => rel.properties.insert(key.to_string(), v),
            None => rel.properties.remove(key),
        })
    }

    /// Returns true if the label was added.
    fn put_label(&self, id: NodeId, label: &str) -> Result<bool> {
        let mut nodes = self.nodes.write();
        let node = nodes.get_mut(&id).ok_or_else(|| Error::NotFound(format!("Node {id}")))?;
        if node.has_label(label) {
            return Ok(false);
        }
        node.labels.push(label.to_string());
        drop(nodes);
        self.label_index.write().entry(label.to_string()).or_default().push(id);
        Ok(true)
    }

    /// Returns true if the label was present.
    fn take_label(&self, id: NodeId, label: &str) -> Result<bool> {
        let mut nodes = self.nodes.write();
        let node = nodes.get_mut(&id).ok_or_else(|| Error::NotFound(format!("Node {id}")))?;
        if !node.has_label(label) {
            return Ok(false);
        }
        node.labels.retain(|l| l != label);
        drop(nodes);
        if let Some(ids) = self.label_index.write().get_mut(label) {
            ids.retain(|nid| *nid != id);
        }
        Ok(true)
    }

    /// Check the unique constraints for a node that would carry `labels` and
    /// `props`. `id` is excluded from the comparison.
    fn check_unique(&self, id: Option<NodeId>, labels: &[String], props: &PropertyMap) -> Result<()> {
        let unique = self.unique.read();
        let idx = self.label_index.read();
        let nodes = self.nodes.read();
        for (label, key) in unique.iter() {
            if !labels.contains(label) {
                continue;
            }
            let Some(value) = props.get(key) else { continue };
            let clash = idx
                .get(label)
                .into_iter()
                .flatten()
                .filter(|nid| Some(**nid) != id)
                .filter_map(|nid| nodes.get(nid))
                .any(|n| n.get(key) == Some(value));
            if clash {
                return Err(Error::ConstraintViolation(format!(
                    "Node({label}) already exists with {key} = {value}"
                )));
            }
        }
        Ok(())
    }

    fn undo(&self, entry: Undo) {
        // Replayed in reverse, each entry sees the state it was recorded against.
        match entry {
            Undo::DropNode(id) => { self.remove_node(id); }
            Undo::RestoreNode(node) => self.insert_node(node),
            Undo::DropRelationship(id) => { self.remove_relationship(id); }
            Undo::RestoreRelationship(rel) => self.insert_relationship(rel),
            Undo::NodeProperty(id, key, old) => { let _ = self.put_node_property(id, &key, old); }
            Undo::RelationshipProperty(id, key, old) => { let _ = self.put_relationship_property(id, &key, old); }
            Undo::RemoveLabel(id, label) => { let _ = self.take_label(id, &label); }
            Undo::AddLabel(id, label) => { let _ = self.put_label(id, &label); }
        }
    }
}

// ============================================================================
// StorageBackend impl
// ============================================================================

#[async_trait]
impl StorageBackend for MemoryBackend {
    type Tx = MemoryTx;

    async fn shutdown(&self) -> Result<()> { Ok(()) }

    async fn begin_tx(&self, mode: TxMode) -> Result<MemoryTx> {
        let id = TxId(self.inner.next_tx_id.fetch_add(1, Ordering::Relaxed));
        Ok(MemoryTx { id, mode, journal: Vec::new() })
    }

    /// Writes are already applied; committing discards the journal.
    async fn commit_tx(&self, _tx: MemoryTx) -> Result<()> { Ok(()) }

    async fn rollback_tx(&self, tx: MemoryTx) -> Result<()> {
        tracing::debug!(tx = tx.id.0, writes = tx.journal.len(), "rolling back");
        for entry in tx.journal.into_iter().rev() {
            self.inner.undo(entry);
        }
        Ok(())
    }

    // ========================================================================
    // Node CRUD
    // ========================================================================

    async fn create_node(
        &self,
        tx: &mut MemoryTx,
        labels: &[&str],
        props: PropertyMap,
    ) -> Result<NodeId> {
        let journal = tx.writable()?;
        let mut owned: Vec<String> = Vec::with_capacity(labels.len());
        for label in labels {
            if !owned.iter().any(|l| l == label) {
                owned.push(label.to_string());
            }
        }
        self.inner.check_unique(None, &owned, &props)?;

        let id = NodeId(self.inner.next_node_id.fetch_add(1, Ordering::Relaxed));
        self.inner.insert_node(Node { id, labels: owned, properties: props });
        journal.push(Undo::DropNode(id));
        Ok(id)
    }

    async fn get_node(&self, _tx: &MemoryTx, id: NodeId) -> Result<Option<Node>> {
        Ok(self.inner.nodes.read().get(&id).cloned())
    }

    async fn delete_node(&self, tx: &mut MemoryTx, id: NodeId) -> Result<bool> {
        let journal = tx.writable()?;
        {
            let adj = self.inner.adjacency.read();
            if let Some(rels) = adj.get(&id) {
                if !rels.is_empty() {
                    return Err(Error::ConstraintViolation(
                        format!("Cannot delete node {id} with {} relationships. Delete relationships first.", rels.len())
                    ));
                }
            }
        }

        let removed = self.inner.remove_node(id);
        let existed = removed.is_some();
        if let Some(node) = removed {
            journal.push(Undo::RestoreNode(node));
        }
        Ok(existed)
    }

    async fn set_node_property(
        &self,
        tx: &mut MemoryTx,
        id: NodeId,
        key: &str,
        val: Value,
    ) -> Result<()> {
        let journal = tx.writable()?;
        let candidate = {
            let nodes = self.inner.nodes.read();
            let node = nodes.get(&id).ok_or_else(|| Error::NotFound(format!("Node {id}")))?;
            let mut props = node.properties.clone();
            props.insert(key.to_string(), val.clone());
            (node.labels.clone(), props)
        };
        self.inner.check_unique(Some(id), &candidate.0, &candidate.1)?;
        let old = self.inner.put_node_property(id, key, Some(val))?;
        journal.push(Undo::NodeProperty(id, key.to_string(), old));
        Ok(())
    }

    async fn remove_node_property(
        &self,
        tx: &mut MemoryTx,
        id: NodeId,
        key: &str,
    ) -> Result<()> {
        let journal = tx.writable()?;
        let old = self.inner.put_node_property(id, key, None)?;
        if old.is_some() {
            journal.push(Undo::NodeProperty(id, key.to_string(), old));
        }
        Ok(())
    }

    async fn add_label(&self, tx: &mut MemoryTx, id: NodeId, label: &str) -> Result<()> {
        let journal = tx.writable()?;
        let candidate = {
            let nodes = self.inner.nodes.read();
            let node = nodes.get(&id).ok_or_else(|| Error::NotFound(format!("Node {id}")))?;
            let mut labels = node.labels.clone();
            labels.push(label.to_string());
            (labels, node.properties.clone())
        };
        self.inner.check_unique(Some(id), &candidate.0, &candidate.1)?;
        if self.inner.put_label(id, label)? {
            journal.push(Undo::RemoveLabel(id, label.to_string()));
        }
        Ok(())
    }

    async fn remove_label(&self, tx: &mut MemoryTx, id: NodeId, label: &str) -> Result<()> {
        let journal = tx.writable()?;
        if self.inner.take_label(id, label)? {
            journal.push(Undo::AddLabel(id, label.to_string()));
        }
        Ok(())
    }

    // ========================================================================
    // Relationship CRUD
    // ========================================================================

    async fn create_relationship(
        &self,
        tx: &mut MemoryTx,
        src: NodeId,
        dst: NodeId,
        rel_type: &str,
        props: PropertyMap,
    ) -> Result<RelId> {
        let journal = tx.writable()?;
        {
            let nodes = self.inner.nodes.read();
            if !nodes.contains_key(&src) {
                return Err(Error::NotFound(format!("Source node {src}")));
            }
            if !nodes.contains_key(&dst) {
                return Err(Error::NotFound(format!("Target node {dst}")));
            }
        }

        let id = RelId(self.inner.next_rel_id.fetch_add(1, Ordering::Relaxed));
        self.inner.insert_relationship(Relationship {
            id,
            src,
            dst,
            rel_type: rel_type.to_string(),
            properties: props,
        });
        journal.push(Undo::DropRelationship(id));
        Ok(id)
    }

    async fn get_relationship(&self, _tx: &MemoryTx, id: RelId) -> Result<Option<Relationship>> {
        Ok(self.inner.relationships.read().get(&id).cloned())
    }

    async fn set_relationship_property(
        &self,
        tx: &mut MemoryTx,
        id: RelId,
        key: &str,
        val: Value,
    ) -> Result<()> {
        let journal = tx.writable()?;
        let old = self.inner.put_relationship_property(id, key, Some(val))?;
        journal.push(Undo::RelationshipProperty(id, key.to_string(), old));
        Ok(())
    }

    async fn remove_relationship_property(
        &self,
        tx: &mut MemoryTx,
        id: RelId,
        key: &str,
    ) -> Result<()> {
        let journal = tx.writable()?;
        let old = self.inner.put_relationship_property(id, key, None)?;
        if old.is_some() {
            journal.push(Undo::RelationshipProperty(id, key.to_string(), old));
        }
        Ok(())
    }

    async fn delete_relationship(&self, tx: &mut MemoryTx, id: RelId) -> Result<bool> {
        let journal = tx.writable()?;
        let removed = self.inner.remove_relationship(id);
        let existed = removed.is_some();
        if let Some(rel) = removed {
            journal.push(Undo::RestoreRelationship(rel));
        }
        Ok(existed)
    }

    // ========================================================================
    // Traversal
    // ========================================================================

    async fn get_relationships(
        &self,
        _tx: &MemoryTx,
        node: NodeId,
        dir: Direction,
        rel_type: Option<&str>,
    ) -> Result<Vec<Relationship>> {
        let adj = self.inner.adjacency.read();
        let rels = self.inner.relationships.read();

        let rel_ids = adj.get(&node).cloned().unwrap_or_default();
        let mut result = Vec::new();

        for rid in rel_ids {
            if let Some(rel) = rels.get(&rid) {
                let matches_dir = match dir {
                    Direction::Outgoing => rel.src == node,
                    Direction::Incoming => rel.dst == node,
                    Direction::Both => true,
                };
                let matches_type = rel_type.is_none_or(|t| rel.rel_type == t);

                if matches_dir && matches_type {
                    result.push(rel.clone());
                }
            }
        }

        Ok(result)
    }

    // ========================================================================
    // Schema introspection
    // ========================================================================

    async fn node_count(&self, _tx: &MemoryTx) -> Result<u64> {
        Ok(self.inner.nodes.read().len() as u64)
    }

    async fn relationship_count(&self, _tx: &MemoryTx) -> Result<u64> {
        Ok(self.inner.relationships.read().len() as u64)
    }

    // ========================================================================
    // Scan
    // ========================================================================

    async fn nodes_by_label(&self, _tx: &MemoryTx, label: &str) -> Result<Vec<Node>> {
        let idx = self.inner.label_index.read();
        let nodes = self.inner.nodes.read();

        let ids = idx.get(label).cloned().unwrap_or_default();
        Ok(ids.iter().filter_map(|id| nodes.get(id).cloned()).collect())
    }

    async fn nodes_by_property(
        &self,
        _tx: &MemoryTx,
        label: &str,
        key: &str,
        value: &Value,
    ) -> Result<Vec<Node>> {
        let idx = self.inner.label_index.read();
        let nodes = self.inner.nodes.read();

        let ids = idx.get(label).cloned().unwrap_or_default();
        Ok(ids.iter()
            .filter_map(|id| nodes.get(id))
            .filter(|n| n.get(key) == Some(value))
            .cloned()
            .collect())
    }

    // ========================================================================
    // Constraints
    // ========================================================================

    async fn create_constraint(
        &self,
        label: &str,
        property: &str,
        constraint_type: ConstraintType,
    ) -> Result<()> {
        match constraint_type {
            ConstraintType::Unique => {
                let mut unique = self.inner.unique.write();
                let entry = (label.to_string(), property.to_string());
                if !unique.contains(&entry) {
                    unique.push(entry);
                }
                Ok(())
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
