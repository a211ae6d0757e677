//! # inventory-graph: Network Inventory over a Property Graph
//!
//! A typed domain model for network inventory (sites, racks, routers, ports,
//! cables, services, customers) stored in a labelled property graph.
//!
//! ## Design Principles
//!
//! 1. **Trait-first**: `StorageBackend` is the only contract with the store
//! 2. **Policy as data**: legal relationships live in one static table
//! 3. **Caller-owned transactions**: nothing here opens or commits on its own
//! 4. **Capabilities, not inheritance**: a node's label set decides which
//!    model operations it supports
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use inventory_graph::{Inventory, RelKind, TxMode, PropertyMap};
//!
//! # async fn example() -> inventory_graph::Result<()> {
//! let inventory = Inventory::open_memory().await?;
//!
//! let mut tx = inventory.begin(TxMode::ReadWrite).await?;
//! let nodes = inventory.nodes();
//! nodes.create_node(&mut tx, "1", "Physical", "Router", "Router1", PropertyMap::new()).await?;
//! nodes.create_node(&mut tx, "2", "Physical", "Port", "ge-0/0/0", PropertyMap::new()).await?;
//! inventory
//!     .create_physical_relationship(&mut tx, "1", "2", RelKind::Has, PropertyMap::new())
//!     .await?;
//! inventory.commit(tx).await?;
//!
//! let tx = inventory.begin(TxMode::ReadOnly).await?;
//! let router = inventory.get_node_model(&tx, "1").await?;
//! for port in router.get_ports()?.values().flatten() {
//!     println!("{}", port.node);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Storage Backends
//!
//! | Backend | Config | Description |
//! |---------|--------|-------------|
//! | Memory | `{"kind": "memory"}` | In-memory graph with rollback, for testing/embedding |

// ============================================================================
// Modules
// ============================================================================

pub mod codec;
pub mod config;
pub mod model;
pub mod models;
pub mod policy;
pub mod repository;
pub mod storage;
pub mod tx;

use tracing::info;

// ============================================================================
// Re-exports: Model (the DTOs)
// ============================================================================

pub use model::{
    Direction, MetaType, Node, NodeId, PropertyMap, RelId, RelKind, Relationship, Value,
};

// ============================================================================
// Re-exports: Storage, transactions, configuration
// ============================================================================

pub use config::InventoryConfig;
pub use storage::{BackendConfig, ConstraintType, MemoryBackend, StorageBackend};
pub use tx::{Transaction, TxId, TxMode};

// ============================================================================
// Re-exports: Repositories and models
// ============================================================================

pub use models::{
    Capability, DependencyClasses, NodeModel, NodeSummary, NodeType, Related, Relations,
    RelationshipModel, SetEntry, SetResult,
};
pub use repository::{NodeBundle, NodeRepository, RelationshipBundle, RelationshipRepository};

// ============================================================================
// Top-level Inventory handle
// ============================================================================

/// The primary entry point. An `Inventory` wraps a storage backend and hands
/// out repositories and node models bound to it.
pub struct Inventory<B: StorageBackend> {
    backend: B,
    config: InventoryConfig,
}

impl<B: StorageBackend> Inventory<B> {
    /// Wrap `backend`, creating the `handle_id` uniqueness constraint when
    /// `config.ensure_constraints` is set.
    pub async fn with_backend(backend: B, config: InventoryConfig) -> Result<Self> {
        if config.ensure_constraints {
            backend
                .create_constraint(model::node::NODE_LABEL, "handle_id", ConstraintType::Unique)
                .await?;
        }
        info!(
            max_traversal_depth = config.max_traversal_depth,
            ensure_constraints = config.ensure_constraints,
            "inventory opened"
        );
        Ok(Self { backend, config })
    }

    /// Access the underlying backend (for advanced use).
    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &InventoryConfig {
        &self.config
    }

    pub fn nodes(&self) -> NodeRepository<'_, B> {
        NodeRepository::new(&self.backend)
    }

    pub fn relationships(&self) -> RelationshipRepository<'_, B> {
        RelationshipRepository::new(&self.backend)
    }

    // ========================================================================
    // Transactions
    // ========================================================================

    pub async fn begin(&self, mode: TxMode) -> Result<B::Tx> {
        self.backend.begin_tx(mode).await
    }

    pub async fn commit(&self, tx: B::Tx) -> Result<()> {
        self.backend.commit_tx(tx).await
    }

    pub async fn rollback(&self, tx: B::Tx) -> Result<()> {
        self.backend.rollback_tx(tx).await
    }

    /// Commit on `Ok`, roll back on `Err`. See [`tx::finish`].
    pub async fn finish<T>(&self, tx: B::Tx, outcome: Result<T>) -> Result<T> {
        tx::finish(&self.backend, tx, outcome).await
    }

    // ========================================================================
    // Models
    // ========================================================================

    /// Load the typed model for the node with `handle_id`.
    pub async fn get_node_model(&self, tx: &B::Tx, handle_id: &str) -> Result<NodeModel<'_, B>> {
        NodeModel::load(&self.backend, tx, handle_id, self.config.max_traversal_depth).await
    }

    pub async fn get_node_meta_type(&self, tx: &B::Tx, handle_id: &str) -> Result<MetaType> {
        self.nodes().get_node_meta_type(tx, handle_id).await
    }

    pub async fn get_relationship_model(
        &self,
        tx: &B::Tx,
        id: RelId,
    ) -> Result<RelationshipModel<'_, B>> {
        RelationshipModel::load(&self.backend, tx, id).await
    }

    // ========================================================================
    // Guarded relationship creation
    // ========================================================================

    /// Create a relationship after checking the endpoints' meta-types against
    /// the policy table.
    pub async fn create_relationship(
        &self,
        tx: &mut B::Tx,
        start_handle_id: &str,
        end_handle_id: &str,
        kind: RelKind,
        properties: PropertyMap,
    ) -> Result<RelId> {
        self.relationships()
            .relate(tx, start_handle_id, end_handle_id, kind, properties)
            .await
    }

    /// Create a relationship from a Location node.
    pub async fn create_location_relationship(
        &self,
        tx: &mut B::Tx,
        start_handle_id: &str,
        end_handle_id: &str,
        kind: RelKind,
        properties: PropertyMap,
    ) -> Result<RelId> {
        self.relationships()
            .relate_from(tx, MetaType::Location, start_handle_id, end_handle_id, kind, properties)
            .await
    }

    /// Create a relationship from a Logical node.
    pub async fn create_logical_relationship(
        &self,
        tx: &mut B::Tx,
        start_handle_id: &str,
        end_handle_id: &str,
        kind: RelKind,
        properties: PropertyMap,
    ) -> Result<RelId> {
        self.relationships()
            .relate_from(tx, MetaType::Logical, start_handle_id, end_handle_id, kind, properties)
            .await
    }

    /// Create a relationship from a Relation node.
    pub async fn create_relation_relationship(
        &self,
        tx: &mut B::Tx,
        start_handle_id: &str,
        end_handle_id: &str,
        kind: RelKind,
        properties: PropertyMap,
    ) -> Result<RelId> {
        self.relationships()
            .relate_from(tx, MetaType::Relation, start_handle_id, end_handle_id, kind, properties)
            .await
    }

    /// Create a relationship from a Physical node.
    pub async fn create_physical_relationship(
        &self,
        tx: &mut B::Tx,
        start_handle_id: &str,
        end_handle_id: &str,
        kind: RelKind,
        properties: PropertyMap,
    ) -> Result<RelId> {
        self.relationships()
            .relate_from(tx, MetaType::Physical, start_handle_id, end_handle_id, kind, properties)
            .await
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.backend.shutdown().await
    }
}

/// In-memory inventory for testing and embedding.
impl Inventory<MemoryBackend> {
    pub async fn open_memory() -> Result<Self> {
        Self::open(InventoryConfig::default()).await
    }

    pub async fn open(config: InventoryConfig) -> Result<Self> {
        let backend = match config.backend {
            BackendConfig::Memory => MemoryBackend::new(),
        };
        Self::with_backend(backend, config).await
    }
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Relationship not found: {0}")]
    RelationshipNotFound(RelId),

    #[error("Integrity error: {0}")]
    IntegrityError(String),

    #[error("Meta label naming error: {0} is not a meta-type")]
    MetaLabelNamingError(String),

    #[error("No meta label found on node {0}")]
    NoMetaLabelFound(String),

    #[error("No relationship possible: {start} -[{kind}]-> {end}")]
    NoRelationshipPossible {
        start: MetaType,
        kind: RelKind,
        end: MetaType,
    },

    #[error("Multiple nodes returned: {0}")]
    MultipleNodesReturned(String),

    #[error("Bad properties: {0}")]
    BadProperties(String),

    #[error("Invalid label: {0}")]
    InvalidLabel(String),

    #[error("Unknown relationship kind: {0}")]
    UnknownRelationshipKind(String),

    #[error("{operation} is not supported by {node_type} nodes")]
    UnsupportedOperation {
        operation: &'static str,
        node_type: String,
    },

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Transaction error: {0}")]
    TxError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
