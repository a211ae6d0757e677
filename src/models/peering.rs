//! Host services and peering, keyed by address as well as target.

use crate::model::{Direction, PropertyMap, RelKind, Value};
use crate::storage::StorageBackend;
use crate::Result;
use super::{Capability, NodeModel, NodeType, Relations, SetResult};

impl<'a, B: StorageBackend> NodeModel<'a, B> {
    /// Host services depending on this host, with their address, port and
    /// protocol on the relationship.
    pub fn get_host_services(&self) -> Result<Relations> {
        self.require(Capability::Host, "get_host_services")?;
        Ok(self.select(Direction::Incoming, &[RelKind::DependsOn], |r| {
            r.node.node_type == NodeType::HostService
        }))
    }

    /// Make `service_handle_id` depend on this host at one address, port and
    /// protocol. The same service on another address is a separate edge.
    pub async fn set_host_service(
        &self,
        tx: &mut B::Tx,
        service_handle_id: &str,
        ip_address: &str,
        port: u16,
        protocol: &str,
    ) -> Result<SetResult> {
        self.require(Capability::Host, "set_host_service")?;
        let key = PropertyMap::from([
            ("ip_address".to_owned(), Value::from(ip_address)),
            ("port".to_owned(), Value::from(port)),
            ("protocol".to_owned(), Value::from(protocol)),
        ]);
        self.ensure_edge(tx, RelKind::DependsOn, service_handle_id, false, key)
            .await
    }

    /// Peering groups this partner uses.
    pub fn get_peering_groups(&self) -> Result<Relations> {
        self.require(Capability::PeeringPartner, "get_peering_groups")?;
        Ok(self.select(Direction::Outgoing, &[RelKind::Uses], |r| {
            r.node.node_type == NodeType::PeeringGroup
        }))
    }

    pub async fn set_peering_group(
        &self,
        tx: &mut B::Tx,
        group_handle_id: &str,
        ip_address: &str,
    ) -> Result<SetResult> {
        self.require(Capability::PeeringPartner, "set_peering_group")?;
        let key = PropertyMap::from([("ip_address".to_owned(), Value::from(ip_address))]);
        self.ensure_edge(tx, RelKind::Uses, group_handle_id, true, key).await
    }

    /// Units this peering group depends on.
    pub fn get_group_dependencies(&self) -> Result<Relations> {
        self.require(Capability::PeeringGroup, "get_group_dependencies")?;
        Ok(self.select(Direction::Outgoing, &[RelKind::DependsOn], |_| true))
    }

    pub async fn set_group_dependency(
        &self,
        tx: &mut B::Tx,
        unit_handle_id: &str,
        ip_address: &str,
    ) -> Result<SetResult> {
        self.require(Capability::PeeringGroup, "set_group_dependency")?;
        let key = PropertyMap::from([("ip_address".to_owned(), Value::from(ip_address))]);
        self.ensure_edge(tx, RelKind::DependsOn, unit_handle_id, true, key)
            .await
    }
}
