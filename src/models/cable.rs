//! Cables: the ports they join and the services riding on them.

use serde::Serialize;

use crate::model::{Direction, MetaType, Node, PropertyMap, RelKind};
use crate::storage::StorageBackend;
use crate::Result;
use super::traversal::{self, neighbors, Step};
use super::{Capability, NodeModel, NodeSummary, NodeType, Related, SetResult};

const SITE_STEPS: &[Step] = &[Step::new(RelKind::Has, Direction::Incoming)];

/// A port on the cable resolved to its equipment and whereabouts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectedEquipment {
    pub port: NodeSummary,
    pub end: Option<NodeSummary>,
    pub location: Option<NodeSummary>,
    pub site: Option<NodeSummary>,
}

/// A service depending on the cable, and who uses it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceUsers {
    pub service: NodeSummary,
    pub customers: Vec<NodeSummary>,
}

impl<'a, B: StorageBackend> NodeModel<'a, B> {
    /// Ports joined by this cable, either edge direction.
    pub(super) fn cable_ports(&self) -> Vec<Related> {
        let mut ports: Vec<Related> = self
            .outgoing
            .get(&RelKind::ConnectedTo)
            .into_iter()
            .chain(self.incoming.get(&RelKind::ConnectedTo))
            .flatten()
            .filter(|r| r.node.node_type != NodeType::Cable)
            .cloned()
            .collect();
        ports.sort_by(|a, b| a.node.cmp(&b.node).then(a.relationship_id.cmp(&b.relationship_id)));
        ports.dedup_by_key(|r| r.relationship_id);
        ports
    }

    pub async fn set_connected_to(
        &self,
        tx: &mut B::Tx,
        port_handle_id: &str,
    ) -> Result<SetResult> {
        self.require(Capability::Cable, "set_connected_to")?;
        self.ensure_edge(tx, RelKind::ConnectedTo, port_handle_id, true, PropertyMap::new())
            .await
    }

    /// For each port: the equipment holding it, where that equipment is
    /// located and the site containing that location.
    pub async fn get_connected_equipment(&self, tx: &B::Tx) -> Result<Vec<ConnectedEquipment>> {
        self.require(Capability::Cable, "get_connected_equipment")?;
        let mut rows = Vec::new();
        for port in self.cable_ports() {
            let port_node = self.nodes().get_node(tx, &port.node.handle_id).await?;
            let holder =
                neighbors(self.backend, tx, port_node.id, RelKind::Has, Direction::Incoming)
                    .await?
                    .into_iter()
                    .map(|(_, n)| n)
                    .next();
            let location = match &holder {
                Some(equipment) => neighbors(
                    self.backend,
                    tx,
                    equipment.id,
                    RelKind::LocatedIn,
                    Direction::Outgoing,
                )
                .await?
                .into_iter()
                .map(|(_, n)| n)
                .next(),
                None => None,
            };
            let site = match &location {
                Some(location) => self.site_of(tx, location).await?,
                None => None,
            };
            rows.push(ConnectedEquipment {
                port: port.node,
                end: holder.as_ref().map(NodeSummary::from_node).transpose()?,
                location: location.as_ref().map(NodeSummary::from_node).transpose()?,
                site: site.as_ref().map(NodeSummary::from_node).transpose()?,
            });
        }
        Ok(rows)
    }

    async fn site_of(&self, tx: &B::Tx, location: &Node) -> Result<Option<Node>> {
        let site_label = NodeType::Site.label();
        if location.has_label(site_label) {
            return Ok(Some(location.clone()));
        }
        let ancestors =
            traversal::upward_path(self.backend, tx, location, SITE_STEPS, self.max_depth).await?;
        Ok(ancestors.into_iter().rev().find(|n| n.has_label(site_label)))
    }

    /// Services depending, directly or not, on the ports of this cable or
    /// the units on those ports, with the Relation nodes using each one.
    pub async fn get_services(&self, tx: &B::Tx) -> Result<Vec<ServiceUsers>> {
        self.require(Capability::Cable, "get_services")?;
        let mut seeds = Vec::new();
        for port in self.cable_ports() {
            let port_node = self.nodes().get_node(tx, &port.node.handle_id).await?;
            let units =
                neighbors(self.backend, tx, port_node.id, RelKind::PartOf, Direction::Incoming)
                    .await?;
            seeds.extend(units.into_iter().map(|(_, unit)| unit));
            seeds.push(port_node);
        }
        seeds.sort_by_key(|n| n.id);
        seeds.dedup_by_key(|n| n.id);

        let walk = traversal::walk_dependencies(
            self.backend,
            tx,
            &seeds,
            Direction::Incoming,
            self.max_depth,
        )
        .await?;
        let mut services = Vec::new();
        for service in walk.reached.iter().filter(|n| n.has_label(NodeType::Service.label())) {
            let mut customers = Vec::new();
            let users =
                neighbors(self.backend, tx, service.id, RelKind::Uses, Direction::Incoming).await?;
            for (_, user) in users {
                if user.meta_type()? == MetaType::Relation {
                    customers.push(NodeSummary::from_node(&user)?);
                }
            }
            services.push(ServiceUsers {
                service: NodeSummary::from_node(service)?,
                customers,
            });
        }
        services.sort_by(|a, b| a.service.cmp(&b.service));
        Ok(services)
    }
}
