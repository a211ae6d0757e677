//! Variant dispatch: which model a node is, and what it can do.
//!
//! A node's [`NodeType`] is resolved from its label set: the first label
//! that names a known specific type wins, otherwise the node falls back to
//! the generic variant of its meta-type. Behavior is not inherited from the
//! type; each operation asks for a [`Capability`], and the capability is
//! granted by the meta-type, the specific type, or both.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::model::MetaType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Router,
    Port,
    Unit,
    Cable,
    Odf,
    Rack,
    Site,
    Provider,
    Customer,
    Service,
    Host,
    HostService,
    PeeringPartner,
    PeeringGroup,
    OpticalPath,
    OpticalLink,
    OpticalNode,
    OpticalMultiplexSection,
    // Meta-type fallbacks
    Location,
    Logical,
    Physical,
    Relation,
}

const SPECIFIC: [(&str, NodeType); 18] = [
    ("Router", NodeType::Router),
    ("Port", NodeType::Port),
    ("Unit", NodeType::Unit),
    ("Cable", NodeType::Cable),
    ("ODF", NodeType::Odf),
    ("Rack", NodeType::Rack),
    ("Site", NodeType::Site),
    ("Provider", NodeType::Provider),
    ("Customer", NodeType::Customer),
    ("Service", NodeType::Service),
    ("Host", NodeType::Host),
    ("Host_Service", NodeType::HostService),
    ("Peering_Partner", NodeType::PeeringPartner),
    ("Peering_Group", NodeType::PeeringGroup),
    ("Optical_Path", NodeType::OpticalPath),
    ("Optical_Link", NodeType::OpticalLink),
    ("Optical_Node", NodeType::OpticalNode),
    ("Optical_Multiplex_Section", NodeType::OpticalMultiplexSection),
];

impl NodeType {
    /// The specific type named by `label`, if it is a known one.
    pub fn from_label(label: &str) -> Option<NodeType> {
        SPECIFIC.iter().find(|(l, _)| *l == label).map(|&(_, t)| t)
    }

    pub fn generic(meta_type: MetaType) -> NodeType {
        match meta_type {
            MetaType::Location => NodeType::Location,
            MetaType::Logical => NodeType::Logical,
            MetaType::Physical => NodeType::Physical,
            MetaType::Relation => NodeType::Relation,
        }
    }

    pub fn resolve(labels: &[String], meta_type: MetaType) -> NodeType {
        labels
            .iter()
            .find_map(|l| NodeType::from_label(l))
            .unwrap_or_else(|| NodeType::generic(meta_type))
    }

    pub fn label(self) -> &'static str {
        match self {
            NodeType::Location => "Location",
            NodeType::Logical => "Logical",
            NodeType::Physical => "Physical",
            NodeType::Relation => "Relation",
            specific => SPECIFIC
                .iter()
                .find(|(_, t)| *t == specific)
                .map(|(l, _)| *l)
                .unwrap_or("Node"),
        }
    }

    pub fn is_generic(self) -> bool {
        matches!(
            self,
            NodeType::Location | NodeType::Logical | NodeType::Physical | NodeType::Relation
        )
    }

    /// Whether a node of this type and `meta_type` has `capability`.
    pub fn supports(self, meta_type: MetaType, capability: Capability) -> bool {
        use MetaType::*;
        match capability {
            Capability::Location => meta_type == Physical,
            Capability::Has => matches!(meta_type, Physical | Location),
            Capability::PartOf => meta_type == Logical,
            Capability::Relatable => meta_type != Relation,
            Capability::Dependencies => meta_type == Logical,
            Capability::Dependents => matches!(meta_type, Logical | Physical),
            Capability::Equipment => {
                meta_type == Physical
                    && matches!(
                        self,
                        NodeType::Router | NodeType::Odf | NodeType::OpticalNode | NodeType::Host
                    )
            }
            Capability::Port => self == NodeType::Port,
            Capability::Cable => self == NodeType::Cable,
            Capability::Host => self == NodeType::Host,
            Capability::PeeringPartner => self == NodeType::PeeringPartner,
            Capability::PeeringGroup => self == NodeType::PeeringGroup,
            Capability::Service => self == NodeType::Service,
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for NodeType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// An independently granted group of model operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// `set_location` (Located_in a Location).
    Location,
    /// `get_has`, `set_has`, `get_parent`, `get_child_form_data`.
    Has,
    /// `get_part_of`, `set_part_of`.
    PartOf,
    /// `set_user`, `set_provider`, `set_owner`, `set_responsible_for`.
    Relatable,
    /// `get_dependencies`, `set_dependency`, `get_dependencies_as_types`.
    Dependencies,
    /// `get_dependents`, `get_dependent_as_types`.
    Dependents,
    /// Ports and cabling of routers, ODFs, optical nodes and physical hosts.
    Equipment,
    Port,
    Cable,
    Host,
    PeeringPartner,
    PeeringGroup,
    Service,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(ls: &[&str]) -> Vec<String> {
        ls.iter().map(|l| l.to_string()).collect()
    }

    #[test]
    fn test_first_known_label_wins() {
        let labels = labels(&["Node", "Physical", "Router", "Host"]);
        let t = NodeType::resolve(&labels, MetaType::Physical);
        assert_eq!(t, NodeType::Router);
    }

    #[test]
    fn test_unknown_labels_fall_back_to_meta_type() {
        let t = NodeType::resolve(&labels(&["Node", "Logical", "Test_Node"]), MetaType::Logical);
        assert_eq!(t, NodeType::Logical);
        assert!(t.is_generic());
    }

    #[test]
    fn test_labels_round_trip() {
        for (label, t) in SPECIFIC {
            assert_eq!(t.label(), label);
            assert_eq!(NodeType::from_label(label), Some(t));
        }
    }

    #[test]
    fn test_host_capabilities_depend_on_meta_type() {
        assert!(NodeType::Host.supports(MetaType::Physical, Capability::Equipment));
        assert!(!NodeType::Host.supports(MetaType::Logical, Capability::Equipment));
        assert!(NodeType::Host.supports(MetaType::Logical, Capability::Dependencies));
        assert!(NodeType::Host.supports(MetaType::Logical, Capability::Host));
    }

    #[test]
    fn test_relation_nodes_are_not_relatable() {
        assert!(!NodeType::Customer.supports(MetaType::Relation, Capability::Relatable));
        assert!(NodeType::Service.supports(MetaType::Logical, Capability::Relatable));
    }
}
