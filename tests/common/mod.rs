//! Shared fixture: a small network with two sites, optical gear, cabling,
//! services and customers.

#![allow(dead_code)]

use inventory_graph::storage::memory::MemoryTx;
use inventory_graph::{Inventory, MemoryBackend, PropertyMap, RelKind, TxMode, Value};

pub type TestInventory = Inventory<MemoryBackend>;

const NODES: &[(&str, &str, &str, &str)] = &[
    ("1", "Physical", "Router", "Router1"),
    ("2", "Physical", "Port", "Port1"),
    ("3", "Logical", "Unit", "Unit1"),
    ("4", "Physical", "Port", "Port6"),
    ("5", "Logical", "Unit", "Unit2"),
    ("6", "Relation", "Provider", "Provider1"),
    ("7", "Logical", "Peering_Group", "Peering Group1"),
    ("8", "Relation", "Peering_Partner", "Peering Partner1"),
    ("9", "Logical", "Service", "Service2"),
    ("10", "Logical", "Service", "Service3"),
    ("11", "Location", "Site", "Site1"),
    ("12", "Location", "Rack", "Rack1"),
    ("13", "Physical", "Optical_Node", "Optical Node1"),
    ("14", "Physical", "Port", "Port2"),
    ("15", "Location", "Rack", "Rack2"),
    ("16", "Physical", "Optical_Node", "Optical Node2"),
    ("17", "Physical", "Port", "Port3"),
    ("18", "Location", "Site", "Site2"),
    ("19", "Location", "Rack", "Rack3"),
    ("20", "Logical", "Optical_Path", "Optical Path1"),
    ("21", "Logical", "Optical_Link", "Optical Link1"),
    ("22", "Logical", "Optical_Link", "Optical Link2"),
    ("23", "Physical", "ODF", "ODF1"),
    ("24", "Physical", "Port", "Port4"),
    ("25", "Physical", "ODF", "ODF2"),
    ("26", "Physical", "Port", "Port5"),
    ("27", "Physical", "Port", "Port7"),
    ("28", "Physical", "Cable", "Cable1"),
    ("29", "Physical", "Cable", "Cable2"),
    ("30", "Physical", "Cable", "Cable3"),
    ("31", "Physical", "Cable", "Cable4"),
    ("32", "Physical", "Host", "Host1"),
    ("33", "Logical", "Host", "Host2"),
    ("34", "Relation", "Customer", "Customer1"),
    ("35", "Relation", "Customer", "Customer2"),
    ("36", "Relation", "Customer", "Customer3"),
    ("37", "Relation", "Customer", "Customer4"),
    ("38", "Logical", "Service", "Service4"),
];

const RELATIONSHIPS: &[(&str, RelKind, &str)] = &[
    ("1", RelKind::Has, "2"),
    ("3", RelKind::PartOf, "2"),
    ("1", RelKind::Has, "4"),
    ("5", RelKind::PartOf, "4"),
    ("6", RelKind::Owns, "1"),
    ("6", RelKind::Provides, "7"),
    ("8", RelKind::Uses, "7"),
    ("7", RelKind::DependsOn, "3"),
    ("11", RelKind::Has, "12"),
    ("1", RelKind::LocatedIn, "12"),
    ("6", RelKind::ResponsibleFor, "12"),
    ("13", RelKind::Has, "14"),
    ("11", RelKind::Has, "15"),
    ("13", RelKind::LocatedIn, "15"),
    ("16", RelKind::Has, "17"),
    ("18", RelKind::Has, "19"),
    ("16", RelKind::LocatedIn, "19"),
    ("6", RelKind::Provides, "20"),
    ("9", RelKind::DependsOn, "20"),
    ("10", RelKind::DependsOn, "5"),
    ("23", RelKind::LocatedIn, "15"),
    ("23", RelKind::Has, "24"),
    ("25", RelKind::LocatedIn, "19"),
    ("25", RelKind::Has, "26"),
    ("25", RelKind::Has, "27"),
    ("28", RelKind::ConnectedTo, "24"),
    ("28", RelKind::ConnectedTo, "14"),
    ("29", RelKind::ConnectedTo, "26"),
    ("29", RelKind::ConnectedTo, "17"),
    ("30", RelKind::ConnectedTo, "24"),
    ("30", RelKind::ConnectedTo, "26"),
    ("31", RelKind::ConnectedTo, "4"),
    ("31", RelKind::ConnectedTo, "27"),
    ("21", RelKind::DependsOn, "14"),
    ("22", RelKind::DependsOn, "17"),
    ("21", RelKind::DependsOn, "24"),
    ("22", RelKind::DependsOn, "26"),
    ("20", RelKind::DependsOn, "24"),
    ("20", RelKind::DependsOn, "26"),
    ("20", RelKind::DependsOn, "21"),
    ("20", RelKind::DependsOn, "22"),
    ("6", RelKind::Owns, "32"),
    ("33", RelKind::DependsOn, "32"),
    ("34", RelKind::Uses, "33"),
    ("35", RelKind::Uses, "9"),
    ("35", RelKind::Uses, "10"),
    ("36", RelKind::Uses, "10"),
];

/// An empty in-memory inventory.
pub async fn empty() -> TestInventory {
    Inventory::open_memory().await.unwrap()
}

/// The fixture network, committed.
pub async fn network() -> TestInventory {
    let inventory = empty().await;
    let mut tx = inventory.begin(TxMode::ReadWrite).await.unwrap();
    for &(handle_id, meta, type_label, name) in NODES {
        let mut properties = PropertyMap::new();
        if handle_id == "14" {
            properties.insert("description".into(), Value::from("This is a port"));
        }
        inventory
            .nodes()
            .create_node(&mut tx, handle_id, meta, type_label, name, properties)
            .await
            .unwrap();
    }
    for &(start, kind, end) in RELATIONSHIPS {
        inventory
            .relationships()
            .create_relationship(&mut tx, start, end, kind, PropertyMap::new())
            .await
            .unwrap();
    }
    inventory.commit(tx).await.unwrap();
    inventory
}

pub async fn write_tx(inventory: &TestInventory) -> MemoryTx {
    inventory.begin(TxMode::ReadWrite).await.unwrap()
}

pub async fn read_tx(inventory: &TestInventory) -> MemoryTx {
    inventory.begin(TxMode::ReadOnly).await.unwrap()
}

/// Names of the given summaries, in order.
pub fn names<'a>(summaries: impl IntoIterator<Item = &'a inventory_graph::NodeSummary>) -> Vec<String> {
    summaries
        .into_iter()
        .map(|s| s.name().unwrap_or_default().to_owned())
        .collect()
}
