//! Node repository.

use tracing::debug;

use crate::codec::{self, PropertyChange};
use crate::model::node::NODE_LABEL;
use crate::model::{MetaType, Node, PropertyMap, Value};
use crate::storage::StorageBackend;
use crate::{Error, Result};
use super::{sort_by_handle, validate_type_label, NodeBundle};

/// Node CRUD and lookups keyed by `handle_id`.
pub struct NodeRepository<'a, B: StorageBackend> {
    backend: &'a B,
}

impl<'a, B: StorageBackend> NodeRepository<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    /// Create a node labelled `Node:<meta>:<type>`.
    ///
    /// The meta-type label, type label and properties are validated before
    /// anything is written. A taken `handle_id` fails with `IntegrityError`.
    pub async fn create_node(
        &self,
        tx: &mut B::Tx,
        handle_id: &str,
        meta_type_label: &str,
        type_label: &str,
        name: &str,
        properties: PropertyMap,
    ) -> Result<Node> {
        let meta_type: MetaType = meta_type_label.parse()?;
        validate_type_label(type_label)?;
        if handle_id.is_empty() {
            return Err(Error::BadProperties("handle_id must not be empty".into()));
        }
        let mut properties = codec::normalize(properties)?;
        properties.insert("handle_id".into(), Value::from(handle_id));
        properties.insert("name".into(), Value::from(name));

        if self.find(tx, handle_id).await?.is_some() {
            return Err(Error::IntegrityError(format!("handle_id {handle_id} already exists")));
        }

        let labels = [NODE_LABEL, meta_type.as_str(), type_label];
        let id = self
            .backend
            .create_node(tx, &labels, properties)
            .await
            .map_err(|e| match e {
                Error::ConstraintViolation(msg) => Error::IntegrityError(msg),
                other => other,
            })?;
        debug!(handle_id, %meta_type, type_label, "created node");
        super::node_by_id(self.backend, tx, id).await
    }

    /// Look a node up by `handle_id`; `None` when absent.
    pub async fn find(&self, tx: &B::Tx, handle_id: &str) -> Result<Option<Node>> {
        let mut found = self
            .backend
            .nodes_by_property(tx, NODE_LABEL, "handle_id", &Value::from(handle_id))
            .await?;
        match found.len() {
            0 => Ok(None),
            1 => Ok(found.pop()),
            n => Err(Error::IntegrityError(format!(
                "{n} nodes share handle_id {handle_id}"
            ))),
        }
    }

    pub async fn get_node(&self, tx: &B::Tx, handle_id: &str) -> Result<Node> {
        self.find(tx, handle_id)
            .await?
            .ok_or_else(|| Error::NodeNotFound(handle_id.to_owned()))
    }

    pub async fn get_node_bundle(&self, tx: &B::Tx, handle_id: &str) -> Result<NodeBundle> {
        let node = self.get_node(tx, handle_id).await?;
        Ok(NodeBundle {
            meta_type: node.meta_type()?,
            labels: node.labels,
            data: node.properties,
        })
    }

    pub async fn get_node_meta_type(&self, tx: &B::Tx, handle_id: &str) -> Result<MetaType> {
        self.get_node(tx, handle_id).await?.meta_type()
    }

    /// Delete a node together with every incident relationship.
    pub async fn delete_node(&self, tx: &mut B::Tx, handle_id: &str) -> Result<()> {
        let node = self.get_node(tx, handle_id).await?;
        self.backend.detach_delete_node(tx, node.id).await?;
        debug!(handle_id, "deleted node");
        Ok(())
    }

    /// Merge `updates` into the node's properties.
    ///
    /// `""`, `[]` and `Value::Null` remove the key; keys not in `updates` are
    /// left untouched. `handle_id` cannot be changed.
    pub async fn set_node_properties(
        &self,
        tx: &mut B::Tx,
        handle_id: &str,
        updates: &PropertyMap,
    ) -> Result<Node> {
        let node = self.get_node(tx, handle_id).await?;
        if let Some(new_handle) = updates.get("handle_id") {
            if new_handle.as_str() != Some(handle_id) {
                return Err(Error::BadProperties("handle_id is immutable".into()));
            }
        }
        let changes = codec::changes(&node.properties, updates)?;
        for change in &changes {
            match change {
                PropertyChange::Set(key, value) => {
                    self.backend.set_node_property(tx, node.id, key, value.clone()).await?;
                }
                PropertyChange::Remove(key) => {
                    self.backend.remove_node_property(tx, node.id, key).await?;
                }
            }
        }
        debug!(handle_id, changes = changes.len(), "merged node properties");
        super::node_by_id(self.backend, tx, node.id).await
    }

    pub async fn add_label(&self, tx: &mut B::Tx, handle_id: &str, label: &str) -> Result<Node> {
        validate_type_label(label)?;
        let node = self.get_node(tx, handle_id).await?;
        self.backend.add_label(tx, node.id, label).await?;
        super::node_by_id(self.backend, tx, node.id).await
    }

    pub async fn remove_label(&self, tx: &mut B::Tx, handle_id: &str, label: &str) -> Result<Node> {
        validate_type_label(label)?;
        let node = self.get_node(tx, handle_id).await?;
        self.backend.remove_label(tx, node.id, label).await?;
        super::node_by_id(self.backend, tx, node.id).await
    }

    /// Replace one type label with another.
    pub async fn switch_type(
        &self,
        tx: &mut B::Tx,
        handle_id: &str,
        old_type: &str,
        new_type: &str,
    ) -> Result<Node> {
        validate_type_label(old_type)?;
        validate_type_label(new_type)?;
        let node = self.get_node(tx, handle_id).await?;
        self.backend.remove_label(tx, node.id, old_type).await?;
        self.backend.add_label(tx, node.id, new_type).await?;
        debug!(handle_id, old_type, new_type, "switched node type");
        super::node_by_id(self.backend, tx, node.id).await
    }

    /// Swap the node's meta-type label. Existing relationships are not
    /// re-checked against the policy table.
    pub async fn change_meta_type(
        &self,
        tx: &mut B::Tx,
        handle_id: &str,
        meta_type: MetaType,
    ) -> Result<Node> {
        let node = self.get_node(tx, handle_id).await?;
        for old in MetaType::ALL.into_iter().filter(|m| *m != meta_type) {
            self.backend.remove_label(tx, node.id, old.as_str()).await?;
        }
        self.backend.add_label(tx, node.id, meta_type.as_str()).await?;
        debug!(handle_id, %meta_type, "changed meta-type");
        super::node_by_id(self.backend, tx, node.id).await
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Nodes with a property equal to `value`; any property when `prop` is None.
    pub async fn get_nodes_by_value(
        &self,
        tx: &B::Tx,
        value: &Value,
        prop: Option<&str>,
    ) -> Result<Vec<Node>> {
        let mut nodes: Vec<Node> = self
            .backend
            .nodes_by_label(tx, NODE_LABEL)
            .await?
            .into_iter()
            .filter(|n| match prop {
                Some(key) => n.get(key) == Some(value),
                None => n.properties.values().any(|v| v == value),
            })
            .collect();
        sort_by_handle(&mut nodes);
        Ok(nodes)
    }

    /// Nodes with a string property (or string list item) containing `needle`,
    /// ignoring case and whitespace runs.
    pub async fn search_nodes_by_value(
        &self,
        tx: &B::Tx,
        needle: &str,
        prop: Option<&str>,
    ) -> Result<Vec<Node>> {
        let needle = codec::lowerstr(needle);
        let contains = |v: &Value| match v {
            Value::String(s) => codec::lowerstr(s).contains(&needle),
            Value::List(items) => items
                .iter()
                .filter_map(Value::as_str)
                .any(|s| codec::lowerstr(s).contains(&needle)),
            _ => false,
        };
        let mut nodes: Vec<Node> = self
            .backend
            .nodes_by_label(tx, NODE_LABEL)
            .await?
            .into_iter()
            .filter(|n| match prop {
                Some(key) => n.get(key).is_some_and(contains),
                None => n.properties.values().any(contains),
            })
            .collect();
        sort_by_handle(&mut nodes);
        Ok(nodes)
    }

    pub async fn get_nodes_by_type(&self, tx: &B::Tx, type_label: &str) -> Result<Vec<Node>> {
        let mut nodes = self.backend.nodes_by_label(tx, type_label).await?;
        nodes.retain(|n| n.has_label(NODE_LABEL));
        sort_by_handle(&mut nodes);
        Ok(nodes)
    }

    pub async fn get_nodes_by_name(&self, tx: &B::Tx, name: &str) -> Result<Vec<Node>> {
        let mut nodes = self
            .backend
            .nodes_by_property(tx, NODE_LABEL, "name", &Value::from(name))
            .await?;
        sort_by_handle(&mut nodes);
        Ok(nodes)
    }

    /// The single node of `type_label` named `name`.
    pub async fn get_unique_node_by_name(
        &self,
        tx: &B::Tx,
        name: &str,
        type_label: &str,
    ) -> Result<Node> {
        let mut nodes = self.get_nodes_by_name(tx, name).await?;
        nodes.retain(|n| n.has_label(type_label));
        match nodes.len() {
            0 => Err(Error::NodeNotFound(format!("{type_label} named {name}"))),
            1 => Ok(nodes.remove(0)),
            n => Err(Error::MultipleNodesReturned(format!(
                "{n} {type_label} nodes named {name}"
            ))),
        }
    }
}
