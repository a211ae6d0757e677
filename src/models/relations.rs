//! Ties to Relation nodes: owners, providers, users, responsible parties.

use crate::model::{Direction, MetaType, PropertyMap, RelKind};
use crate::storage::StorageBackend;
use crate::Result;
use super::{Capability, NodeModel, Relations, SetResult};

impl<'a, B: StorageBackend> NodeModel<'a, B> {
    /// Owns/Provides/Uses/Responsible_for grouped by kind.
    ///
    /// For a Relation node these are the edges it starts; for any other node
    /// the edges Relation nodes point at it.
    pub fn get_relations(&self) -> Relations {
        if self.summary.meta_type == MetaType::Relation {
            self.select(Direction::Outgoing, &RelKind::RELATIONS, |_| true)
        } else {
            self.select(Direction::Incoming, &RelKind::RELATIONS, |r| {
                r.node.meta_type == MetaType::Relation
            })
        }
    }

    pub async fn set_user(&self, tx: &mut B::Tx, user_handle_id: &str) -> Result<SetResult> {
        self.require(Capability::Relatable, "set_user")?;
        self.ensure_edge(tx, RelKind::Uses, user_handle_id, false, PropertyMap::new())
            .await
    }

    pub async fn set_provider(
        &self,
        tx: &mut B::Tx,
        provider_handle_id: &str,
    ) -> Result<SetResult> {
        self.require(Capability::Relatable, "set_provider")?;
        self.ensure_edge(tx, RelKind::Provides, provider_handle_id, false, PropertyMap::new())
            .await
    }

    pub async fn set_owner(&self, tx: &mut B::Tx, owner_handle_id: &str) -> Result<SetResult> {
        self.require(Capability::Relatable, "set_owner")?;
        self.ensure_edge(tx, RelKind::Owns, owner_handle_id, false, PropertyMap::new())
            .await
    }

    pub async fn set_responsible_for(
        &self,
        tx: &mut B::Tx,
        responsible_handle_id: &str,
    ) -> Result<SetResult> {
        self.require(Capability::Relatable, "set_responsible_for")?;
        self.ensure_edge(
            tx,
            RelKind::ResponsibleFor,
            responsible_handle_id,
            false,
            PropertyMap::new(),
        )
        .await
    }

    /// Relation nodes using this service.
    pub fn get_customers(&self) -> Result<Relations> {
        self.require(Capability::Service, "get_customers")?;
        Ok(self.select(Direction::Incoming, &[RelKind::Uses], |r| {
            r.node.meta_type == MetaType::Relation
        }))
    }
}
