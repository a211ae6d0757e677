//! A relationship with its endpoints resolved to handle ids.

use std::fmt;

use crate::model::{PropertyMap, RelId, RelKind};
use crate::repository::RelationshipRepository;
use crate::storage::StorageBackend;
use crate::Result;

pub struct RelationshipModel<'a, B: StorageBackend> {
    backend: &'a B,
    pub id: RelId,
    pub kind: RelKind,
    /// `handle_id` of the start node.
    pub start: String,
    /// `handle_id` of the end node.
    pub end: String,
    pub data: PropertyMap,
}

impl<'a, B: StorageBackend> RelationshipModel<'a, B> {
    pub(crate) async fn load(backend: &'a B, tx: &B::Tx, id: RelId) -> Result<Self> {
        let bundle = RelationshipRepository::new(backend)
            .get_relationship_bundle(tx, id)
            .await?;
        Ok(Self {
            backend,
            id: bundle.id,
            kind: bundle.kind,
            start: bundle.start,
            end: bundle.end,
            data: bundle.data,
        })
    }

    pub async fn reload(&self, tx: &B::Tx) -> Result<Self> {
        Self::load(self.backend, tx, self.id).await
    }

    /// Merge `updates` into the relationship's properties (empty values
    /// delete) and return the reloaded model.
    pub async fn set_properties(&self, tx: &mut B::Tx, updates: &PropertyMap) -> Result<Self> {
        RelationshipRepository::new(self.backend)
            .set_relationship_properties(tx, self.id, updates)
            .await?;
        self.reload(tx).await
    }

    pub async fn delete(self, tx: &mut B::Tx) -> Result<()> {
        RelationshipRepository::new(self.backend)
            .delete_relationship(tx, self.id)
            .await
    }
}

impl<B: StorageBackend> fmt::Debug for RelationshipModel<'_, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelationshipModel")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("start", &self.start)
            .field("end", &self.end)
            .field("data", &self.data)
            .finish()
    }
}

impl<B: StorageBackend> fmt::Display for RelationshipModel<'_, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})-[{}:{}]->({})", self.start, self.id.0, self.kind, self.end)
    }
}
