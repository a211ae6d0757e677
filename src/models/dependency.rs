//! Depends_on: direct reads, writes and the typed classification walks.

use crate::model::{Direction, MetaType, PropertyMap, RelKind};
use crate::storage::StorageBackend;
use crate::Result;
use super::traversal::{self, DependencyClasses};
use super::{Capability, NodeModel, Relations, SetResult};

impl<'a, B: StorageBackend> NodeModel<'a, B> {
    /// Outgoing `Depends_on`.
    pub fn get_dependencies(&self) -> Result<Relations> {
        self.require(Capability::Dependencies, "get_dependencies")?;
        Ok(self.select(Direction::Outgoing, &[RelKind::DependsOn], |_| true))
    }

    /// Incoming `Depends_on`.
    pub fn get_dependents(&self) -> Result<Relations> {
        self.require(Capability::Dependents, "get_dependents")?;
        Ok(self.select(Direction::Incoming, &[RelKind::DependsOn], |_| true))
    }

    pub async fn set_dependency(
        &self,
        tx: &mut B::Tx,
        dependency_handle_id: &str,
    ) -> Result<SetResult> {
        self.require(Capability::Dependencies, "set_dependency")?;
        self.ensure_edge(tx, RelKind::DependsOn, dependency_handle_id, true, PropertyMap::new())
            .await
    }

    /// Everything this node transitively depends on, bucketed by type.
    pub async fn get_dependencies_as_types(&self, tx: &B::Tx) -> Result<DependencyClasses> {
        self.require(Capability::Dependencies, "get_dependencies_as_types")?;
        let walk = traversal::walk_dependencies(
            self.backend,
            tx,
            std::slice::from_ref(&self.node),
            Direction::Outgoing,
            self.max_depth,
        )
        .await?;
        DependencyClasses::classify(&walk)
    }

    /// Everything that transitively depends on this node, bucketed by type.
    ///
    /// A physical node also answers for what it contains: the walk starts
    /// from the node, its `Has` descendants and the units `Part_of` them.
    pub async fn get_dependent_as_types(&self, tx: &B::Tx) -> Result<DependencyClasses> {
        self.require(Capability::Dependents, "get_dependent_as_types")?;
        let seeds = if self.summary.meta_type == MetaType::Physical {
            traversal::placement_subtree(self.backend, tx, &self.node, self.max_depth).await?
        } else {
            vec![self.node.clone()]
        };
        let walk = traversal::walk_dependencies(
            self.backend,
            tx,
            &seeds,
            Direction::Incoming,
            self.max_depth,
        )
        .await?;
        DependencyClasses::classify(&walk)
    }
}
