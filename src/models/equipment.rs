//! Equipment and ports: what is mounted where and how it is cabled.

use serde::Serialize;

use crate::model::{Direction, RelKind};
use crate::storage::StorageBackend;
use crate::Result;
use super::traversal::{self, neighbors};
use super::{Capability, NodeModel, NodeSummary, NodeType, Related, Relations};

/// One cable leaving a port of this equipment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Connection {
    pub port: NodeSummary,
    pub cable: NodeSummary,
    /// The port at the far end of the cable.
    pub end: NodeSummary,
    /// The equipment holding `end`, if any.
    pub equipment: Option<NodeSummary>,
}

impl<'a, B: StorageBackend> NodeModel<'a, B> {
    /// Ports held over `Has`; for a cable, the ports it joins over
    /// `Connected_to`.
    pub fn get_ports(&self) -> Result<Relations> {
        if self.supports(Capability::Cable) {
            let ports = self.cable_ports();
            return Ok(if ports.is_empty() {
                Relations::new()
            } else {
                Relations::from([(RelKind::ConnectedTo, ports)])
            });
        }
        self.require(Capability::Equipment, "get_ports")?;
        Ok(self.select(Direction::Outgoing, &[RelKind::Has], |r| {
            r.node.node_type == NodeType::Port
        }))
    }

    /// The port named `name`, if this equipment has one.
    pub fn get_port(&self, name: &str) -> Result<Option<Related>> {
        let ports = self.get_ports()?;
        Ok(ports
            .into_values()
            .flatten()
            .find(|r| r.node.name() == Some(name)))
    }

    /// Every cable on every port, with what sits at the other end.
    pub async fn get_connections(&self, tx: &B::Tx) -> Result<Vec<Connection>> {
        self.require(Capability::Equipment, "get_connections")?;
        let ports = self.get_ports()?;
        let mut connections = Vec::new();
        for port in ports.values().flatten() {
            let port_node = self.nodes().get_node(tx, &port.node.handle_id).await?;
            let cables =
                neighbors(self.backend, tx, port_node.id, RelKind::ConnectedTo, Direction::Both)
                    .await?;
            for (_, cable) in cables {
                if !cable.has_label(NodeType::Cable.label()) {
                    continue;
                }
                let ends =
                    neighbors(self.backend, tx, cable.id, RelKind::ConnectedTo, Direction::Both)
                        .await?;
                for (_, end) in ends {
                    if end.id == port_node.id || end.has_label(NodeType::Cable.label()) {
                        continue;
                    }
                    let holder =
                        neighbors(self.backend, tx, end.id, RelKind::Has, Direction::Incoming)
                            .await?;
                    let equipment = match holder.first() {
                        Some((_, node)) => Some(NodeSummary::from_node(node)?),
                        None => None,
                    };
                    connections.push(Connection {
                        port: port.node.clone(),
                        cable: NodeSummary::from_node(&cable)?,
                        end: NodeSummary::from_node(&end)?,
                        equipment,
                    });
                }
            }
        }
        Ok(connections)
    }

    /// The cabling chain through each port, in port order.
    pub async fn get_connection_paths(&self, tx: &B::Tx) -> Result<Vec<Vec<NodeSummary>>> {
        self.require(Capability::Equipment, "get_connection_paths")?;
        let ports = self.get_ports()?;
        let mut paths = Vec::new();
        for port in ports.values().flatten() {
            let port_node = self.nodes().get_node(tx, &port.node.handle_id).await?;
            let path = traversal::connection_path(self.backend, tx, &port_node).await?;
            paths.push(path.iter().map(NodeSummary::from_node).collect::<Result<Vec<_>>>()?);
        }
        Ok(paths)
    }

    // ========================================================================
    // Ports
    // ========================================================================

    /// Logical units `Part_of` this port.
    pub fn get_units(&self) -> Result<Relations> {
        self.require(Capability::Port, "get_units")?;
        Ok(self.select(Direction::Incoming, &[RelKind::PartOf], |_| true))
    }

    pub fn get_unit(&self, name: &str) -> Result<Option<Related>> {
        let units = self.get_units()?;
        Ok(units
            .into_values()
            .flatten()
            .find(|r| r.node.name() == Some(name)))
    }

    /// Cables on this port, whichever way the edge was drawn.
    pub fn get_connected_to(&self) -> Result<Relations> {
        self.require(Capability::Port, "get_connected_to")?;
        let mut cables: Vec<Related> = self
            .incoming
            .get(&RelKind::ConnectedTo)
            .into_iter()
            .chain(self.outgoing.get(&RelKind::ConnectedTo))
            .flatten()
            .cloned()
            .collect();
        cables.sort_by(|a, b| a.node.cmp(&b.node).then(a.relationship_id.cmp(&b.relationship_id)));
        cables.dedup_by_key(|r| r.relationship_id);
        Ok(if cables.is_empty() {
            Relations::new()
        } else {
            Relations::from([(RelKind::ConnectedTo, cables)])
        })
    }

    /// The full cabling chain through this port or cable.
    pub async fn get_connection_path(&self, tx: &B::Tx) -> Result<Vec<NodeSummary>> {
        if !self.supports(Capability::Cable) {
            self.require(Capability::Port, "get_connection_path")?;
        }
        let path = traversal::connection_path(self.backend, tx, &self.node).await?;
        path.iter().map(NodeSummary::from_node).collect()
    }
}
