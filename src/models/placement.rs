//! Where a node sits: location, placement, Has and Part_of.

use serde::Serialize;

use crate::model::{Direction, PropertyMap, RelKind};
use crate::storage::StorageBackend;
use crate::Result;
use super::traversal::{self, LOCATION_STEPS, PLACEMENT_STEPS};
use super::{Capability, NodeModel, NodeSummary, Relations, SetResult};

/// A child row for pre-filling an edit form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChildFormData {
    pub handle_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub labels: Vec<String>,
}

impl<'a, B: StorageBackend> NodeModel<'a, B> {
    /// Outgoing `Located_in`. Empty for nodes that are not placed anywhere.
    pub fn get_location(&self) -> Relations {
        self.select(Direction::Outgoing, &[RelKind::LocatedIn], |_| true)
    }

    /// Ancestors up to the root location, root first.
    pub async fn get_location_path(&self, tx: &B::Tx) -> Result<Vec<NodeSummary>> {
        let path =
            traversal::upward_path(self.backend, tx, &self.node, LOCATION_STEPS, self.max_depth)
                .await?;
        path.iter().map(NodeSummary::from_node).collect()
    }

    /// Enclosing equipment, outermost first.
    pub async fn get_placement_path(&self, tx: &B::Tx) -> Result<Vec<NodeSummary>> {
        let path =
            traversal::upward_path(self.backend, tx, &self.node, PLACEMENT_STEPS, self.max_depth)
                .await?;
        path.iter().map(NodeSummary::from_node).collect()
    }

    pub async fn set_location(
        &self,
        tx: &mut B::Tx,
        location_handle_id: &str,
    ) -> Result<SetResult> {
        self.require(Capability::Location, "set_location")?;
        self.ensure_edge(tx, RelKind::LocatedIn, location_handle_id, true, PropertyMap::new())
            .await
    }

    pub fn get_has(&self) -> Result<Relations> {
        self.require(Capability::Has, "get_has")?;
        Ok(self.select(Direction::Outgoing, &[RelKind::Has], |_| true))
    }

    pub async fn set_has(&self, tx: &mut B::Tx, child_handle_id: &str) -> Result<SetResult> {
        self.require(Capability::Has, "set_has")?;
        self.ensure_edge(tx, RelKind::Has, child_handle_id, true, PropertyMap::new())
            .await
    }

    /// Incoming `Has`: the node this one belongs to.
    pub fn get_parent(&self) -> Result<Relations> {
        self.require(Capability::Has, "get_parent")?;
        Ok(self.select(Direction::Incoming, &[RelKind::Has], |_| true))
    }

    pub fn get_part_of(&self) -> Result<Relations> {
        self.require(Capability::PartOf, "get_part_of")?;
        Ok(self.select(Direction::Outgoing, &[RelKind::PartOf], |_| true))
    }

    pub async fn set_part_of(&self, tx: &mut B::Tx, parent_handle_id: &str) -> Result<SetResult> {
        self.require(Capability::PartOf, "set_part_of")?;
        self.ensure_edge(tx, RelKind::PartOf, parent_handle_id, true, PropertyMap::new())
            .await
    }

    /// Children over `Has` carrying `type_label`, ordered by name.
    pub fn get_child_form_data(&self, type_label: &str) -> Result<Vec<ChildFormData>> {
        self.require(Capability::Has, "get_child_form_data")?;
        let mut rows: Vec<ChildFormData> = self
            .outgoing
            .get(&RelKind::Has)
            .into_iter()
            .flatten()
            .filter(|r| r.node.has_label(type_label))
            .map(|r| ChildFormData {
                handle_id: r.node.handle_id.clone(),
                name: r.node.name().map(str::to_owned),
                description: r
                    .node
                    .data
                    .get("description")
                    .and_then(|v| v.as_str())
                    .map(str::to_owned),
                labels: r.node.labels.clone(),
            })
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.handle_id.cmp(&b.handle_id)));
        Ok(rows)
    }
}
