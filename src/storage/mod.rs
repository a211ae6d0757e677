//! # Storage Backend Trait
//!
//! The store gateway: the only boundary between the inventory layer and the
//! property graph store. Query execution, transaction lifecycle and the
//! `handle_id` uniqueness constraint live behind this trait.
//!
//! ## Implementations
//!
//! | Backend | Module | Description |
//! |---------|--------|-------------|
//! | `MemoryBackend` | `memory` | In-memory with undo-journal rollback, for testing/embedding |

pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::*;
use crate::tx::{Transaction, TxMode};
use crate::{Error, Result};

pub use memory::MemoryBackend;

// ============================================================================
// Backend Configuration
// ============================================================================

/// Which store to open.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendConfig {
    /// In-memory (no persistence)
    #[default]
    Memory,
}

// ============================================================================
// Constraint types
// ============================================================================

/// Type of constraint to create on a label+property pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintType {
    /// Property value must be unique for nodes with this label.
    Unique,
}

// ============================================================================
// StorageBackend Trait
// ============================================================================

/// The store gateway contract.
///
/// Reads take `&Self::Tx`, writes take `&mut Self::Tx`. A write through a
/// read-only transaction fails with `Error::TxError`; a unique constraint
/// violation fails with `Error::ConstraintViolation`. Missing nodes and
/// relationships surface as `Ok(None)` on reads and `Error::NotFound` on
/// writes; the repositories translate both into inventory errors.
#[async_trait]
pub trait StorageBackend: Send + Sync + 'static {
    type Tx: Transaction;

    async fn shutdown(&self) -> Result<()>;

    // ========================================================================
    // Transactions
    // ========================================================================

    async fn begin_tx(&self, mode: TxMode) -> Result<Self::Tx>;

    async fn commit_tx(&self, tx: Self::Tx) -> Result<()>;

    /// Undo every write made through `tx`.
    async fn rollback_tx(&self, tx: Self::Tx) -> Result<()>;

    // ========================================================================
    // Nodes
    // ========================================================================

    /// Store a node. Repeated labels are collapsed.
    async fn create_node(
        &self,
        tx: &mut Self::Tx,
        labels: &[&str],
        props: PropertyMap,
    ) -> Result<NodeId>;

    async fn get_node(&self, tx: &Self::Tx, id: NodeId) -> Result<Option<Node>>;

    /// Remove a node that has no relationships left. Returns whether it
    /// existed.
    async fn delete_node(&self, tx: &mut Self::Tx, id: NodeId) -> Result<bool>;

    async fn set_node_property(
        &self,
        tx: &mut Self::Tx,
        id: NodeId,
        key: &str,
        val: Value,
    ) -> Result<()>;

    async fn remove_node_property(&self, tx: &mut Self::Tx, id: NodeId, key: &str) -> Result<()>;

    /// Idempotent.
    async fn add_label(&self, tx: &mut Self::Tx, id: NodeId, label: &str) -> Result<()>;

    async fn remove_label(&self, tx: &mut Self::Tx, id: NodeId, label: &str) -> Result<()>;

    /// Remove a node together with every incident relationship, inside `tx`.
    async fn detach_delete_node(&self, tx: &mut Self::Tx, id: NodeId) -> Result<bool> {
        for rel in self.get_relationships(tx, id, Direction::Both, None).await? {
            self.delete_relationship(tx, rel.id).await?;
        }
        self.delete_node(tx, id).await
    }

    // ========================================================================
    // Relationships
    // ========================================================================

    /// Fails with `Error::NotFound` when either endpoint is missing.
    async fn create_relationship(
        &self,
        tx: &mut Self::Tx,
        src: NodeId,
        dst: NodeId,
        rel_type: &str,
        props: PropertyMap,
    ) -> Result<RelId>;

    async fn get_relationship(&self, tx: &Self::Tx, id: RelId) -> Result<Option<Relationship>>;

    async fn delete_relationship(&self, tx: &mut Self::Tx, id: RelId) -> Result<bool>;

    async fn set_relationship_property(
        &self,
        tx: &mut Self::Tx,
        id: RelId,
        key: &str,
        val: Value,
    ) -> Result<()>;

    async fn remove_relationship_property(
        &self,
        tx: &mut Self::Tx,
        id: RelId,
        key: &str,
    ) -> Result<()>;

    /// Relationships touching `node` in direction `dir`, optionally of one
    /// type. A self loop is reported once.
    async fn get_relationships(
        &self,
        tx: &Self::Tx,
        node: NodeId,
        dir: Direction,
        rel_type: Option<&str>,
    ) -> Result<Vec<Relationship>>;

    // ========================================================================
    // Lookups and counts
    // ========================================================================

    async fn node_count(&self, tx: &Self::Tx) -> Result<u64>;

    async fn relationship_count(&self, tx: &Self::Tx) -> Result<u64>;

    async fn nodes_by_label(&self, tx: &Self::Tx, label: &str) -> Result<Vec<Node>>;

    /// Nodes carrying `label` whose `key` equals `value`.
    async fn nodes_by_property(
        &self,
        tx: &Self::Tx,
        label: &str,
        key: &str,
        value: &Value,
    ) -> Result<Vec<Node>>;

    /// Register a constraint on `label.property`. Registering it twice is a
    /// no-op.
    async fn create_constraint(
        &self,
        _label: &str,
        _property: &str,
        _constraint_type: ConstraintType,
    ) -> Result<()> {
        Err(Error::StorageError("constraints not supported".into()))
    }
}
