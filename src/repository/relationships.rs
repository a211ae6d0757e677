//! Relationship repository.

use tracing::debug;

use crate::codec::{self, PropertyChange};
use crate::model::{Direction, MetaType, Node, PropertyMap, RelId, RelKind, Relationship};
use crate::policy;
use crate::storage::StorageBackend;
use crate::{Error, Result};
use super::{node_by_id, NodeRepository, RelationshipBundle};

/// Relationship CRUD plus the policy-checked creation entry points.
pub struct RelationshipRepository<'a, B: StorageBackend> {
    backend: &'a B,
}

impl<'a, B: StorageBackend> RelationshipRepository<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    fn nodes(&self) -> NodeRepository<'a, B> {
        NodeRepository::new(self.backend)
    }

    /// Low-level creation. Does not consult the policy table; callers check
    /// first.
    pub async fn create_relationship(
        &self,
        tx: &mut B::Tx,
        start_handle_id: &str,
        end_handle_id: &str,
        kind: RelKind,
        properties: PropertyMap,
    ) -> Result<RelId> {
        let properties = codec::normalize(properties)?;
        let start = self.nodes().get_node(tx, start_handle_id).await?;
        let end = self.nodes().get_node(tx, end_handle_id).await?;
        self.insert(tx, &start, kind, &end, properties).await
    }

    async fn insert(
        &self,
        tx: &mut B::Tx,
        start: &Node,
        kind: RelKind,
        end: &Node,
        properties: PropertyMap,
    ) -> Result<RelId> {
        let id = self
            .backend
            .create_relationship(tx, start.id, end.id, kind.as_str(), properties)
            .await?;
        debug!(
            start = start.handle_id(),
            end = end.handle_id(),
            %kind,
            rel = id.0,
            "created relationship"
        );
        Ok(id)
    }

    /// Policy-checked creation for callers that do not know either endpoint's
    /// meta-type in advance.
    pub async fn relate(
        &self,
        tx: &mut B::Tx,
        start_handle_id: &str,
        end_handle_id: &str,
        kind: RelKind,
        properties: PropertyMap,
    ) -> Result<RelId> {
        let properties = codec::normalize(properties)?;
        let start = self.nodes().get_node(tx, start_handle_id).await?;
        let end = self.nodes().get_node(tx, end_handle_id).await?;
        policy::assert_allowed(start.meta_type()?, kind, end.meta_type()?)?;
        self.insert(tx, &start, kind, &end, properties).await
    }

    /// Policy-checked creation with the source side scoped to `scope`.
    ///
    /// A start node outside `scope` is rejected the same way as an illegal
    /// destination.
    pub async fn relate_from(
        &self,
        tx: &mut B::Tx,
        scope: MetaType,
        start_handle_id: &str,
        end_handle_id: &str,
        kind: RelKind,
        properties: PropertyMap,
    ) -> Result<RelId> {
        let properties = codec::normalize(properties)?;
        let start = self.nodes().get_node(tx, start_handle_id).await?;
        let end = self.nodes().get_node(tx, end_handle_id).await?;
        let end_meta = end.meta_type()?;
        policy::assert_allowed(scope, kind, end_meta)?;
        let start_meta = start.meta_type()?;
        if start_meta != scope {
            return Err(Error::NoRelationshipPossible { start: start_meta, kind, end: end_meta });
        }
        self.insert(tx, &start, kind, &end, properties).await
    }

    /// Idempotent, policy-checked creation.
    ///
    /// Reuses an existing `start -[kind]-> end` relationship whose properties
    /// include `key`; otherwise creates one carrying `key`. Returns the
    /// relationship id and whether it was created.
    ///
    /// The check and the create are two separate store calls. Concurrent
    /// callers can both miss and both create; only a store-side uniqueness
    /// constraint on the edge rules that out.
    pub async fn ensure(
        &self,
        tx: &mut B::Tx,
        start: &Node,
        kind: RelKind,
        end: &Node,
        key: PropertyMap,
    ) -> Result<(RelId, bool)> {
        let key = codec::normalize(key)?;
        policy::assert_allowed(start.meta_type()?, kind, end.meta_type()?)?;

        let existing = self
            .backend
            .get_relationships(tx, start.id, Direction::Outgoing, Some(kind.as_str()))
            .await?
            .into_iter()
            .filter(|r| r.dst == end.id && r.matches_properties(&key))
            .map(|r| r.id)
            .min();
        if let Some(id) = existing {
            return Ok((id, false));
        }
        let id = self.insert(tx, start, kind, end, key).await?;
        Ok((id, true))
    }

    pub async fn get_relationship(&self, tx: &B::Tx, id: RelId) -> Result<Relationship> {
        self.backend
            .get_relationship(tx, id)
            .await?
            .ok_or(Error::RelationshipNotFound(id))
    }

    pub async fn get_relationship_bundle(
        &self,
        tx: &B::Tx,
        id: RelId,
    ) -> Result<RelationshipBundle> {
        let rel = self.get_relationship(tx, id).await?;
        let start = node_by_id(self.backend, tx, rel.src).await?;
        let end = node_by_id(self.backend, tx, rel.dst).await?;
        Ok(RelationshipBundle {
            id,
            kind: rel.kind()?,
            start: start.handle_id().unwrap_or_default().to_owned(),
            end: end.handle_id().unwrap_or_default().to_owned(),
            data: rel.properties,
        })
    }

    pub async fn delete_relationship(&self, tx: &mut B::Tx, id: RelId) -> Result<()> {
        if !self.backend.delete_relationship(tx, id).await? {
            return Err(Error::RelationshipNotFound(id));
        }
        debug!(rel = id.0, "deleted relationship");
        Ok(())
    }

    /// Relationships between an unordered pair of nodes, optionally of one
    /// kind. Empty when there are none.
    pub async fn get_relationships(
        &self,
        tx: &B::Tx,
        handle_id: &str,
        other_handle_id: &str,
        kind: Option<RelKind>,
    ) -> Result<Vec<Relationship>> {
        let node = self.nodes().get_node(tx, handle_id).await?;
        let other = self.nodes().get_node(tx, other_handle_id).await?;
        let mut rels: Vec<Relationship> = self
            .backend
            .get_relationships(tx, node.id, Direction::Both, kind.map(RelKind::as_str))
            .await?
            .into_iter()
            .filter(|r| r.other_node(node.id) == Some(other.id))
            .collect();
        rels.sort_by_key(|r| r.id);
        rels.dedup_by_key(|r| r.id);
        Ok(rels)
    }

    /// Merge `updates` into the relationship's properties, with the same
    /// delete-by-empty-value rule as nodes.
    pub async fn set_relationship_properties(
        &self,
        tx: &mut B::Tx,
        id: RelId,
        updates: &PropertyMap,
    ) -> Result<Relationship> {
        let rel = self.get_relationship(tx, id).await?;
        let changes = codec::changes(&rel.properties, updates)?;
        for change in &changes {
            match change {
                PropertyChange::Set(key, value) => {
                    self.backend.set_relationship_property(tx, id, key, value.clone()).await?;
                }
                PropertyChange::Remove(key) => {
                    self.backend.remove_relationship_property(tx, id, key).await?;
                }
            }
        }
        debug!(rel = id.0, changes = changes.len(), "merged relationship properties");
        self.get_relationship(tx, id).await
    }
}
