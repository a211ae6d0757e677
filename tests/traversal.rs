//! Integration tests for connection paths and graph walk bounds.

mod common;

use common::{empty, names, network, read_tx, write_tx};
use inventory_graph::{InventoryConfig, Inventory, PropertyMap, RelKind};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn handle_ids(path: &[inventory_graph::NodeSummary]) -> Vec<&str> {
    path.iter().map(|n| n.handle_id.as_str()).collect()
}

#[tokio::test]
async fn test_connection_path_from_end_port() {
    let inventory = network().await;
    let tx = read_tx(&inventory).await;
    let port2 = inventory.get_node_model(&tx, "14").await.unwrap();

    let path = port2.get_connection_path(&tx).await.unwrap();
    // Port2 - Cable1 - Port4 - Cable3 - Port5 - Cable2 - Port3
    assert_eq!(handle_ids(&path), vec!["14", "28", "24", "30", "26", "29", "17"]);
    assert_eq!(path.len(), 2 * 3 + 1);
}

#[tokio::test]
async fn test_connection_path_from_middle_cable_is_stable() {
    let inventory = network().await;
    let tx = read_tx(&inventory).await;
    let cable3 = inventory.get_node_model(&tx, "30").await.unwrap();

    let first = cable3.get_connection_path(&tx).await.unwrap();
    let second = cable3.get_connection_path(&tx).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(names(&first), vec!["Port3", "Cable2", "Port5", "Cable3", "Port4", "Cable1", "Port2"]);
}

#[tokio::test]
async fn test_connection_path_of_unconnected_port() {
    let inventory = network().await;
    let tx = read_tx(&inventory).await;
    let port1 = inventory.get_node_model(&tx, "2").await.unwrap();
    assert_eq!(handle_ids(&port1.get_connection_path(&tx).await.unwrap()), vec!["2"]);
}

#[tokio::test]
async fn test_connection_path_terminates_on_ring() {
    let inventory = empty().await;
    let mut tx = write_tx(&inventory).await;
    for (handle_id, type_label) in [("p1", "Port"), ("p2", "Port"), ("c1", "Cable"), ("c2", "Cable")] {
        inventory
            .nodes()
            .create_node(&mut tx, handle_id, "Physical", type_label, handle_id, PropertyMap::new())
            .await
            .unwrap();
    }
    for (cable, port) in [("c1", "p1"), ("c1", "p2"), ("c2", "p2"), ("c2", "p1")] {
        inventory
            .create_physical_relationship(&mut tx, cable, port, RelKind::ConnectedTo, PropertyMap::new())
            .await
            .unwrap();
    }

    let p1 = inventory.get_node_model(&tx, "p1").await.unwrap();
    let path = p1.get_connection_path(&tx).await.unwrap();
    assert_eq!(handle_ids(&path), vec!["p1", "c1", "p2", "c2"]);
}

#[tokio::test]
async fn test_equipment_connection_paths() {
    let inventory = network().await;
    let tx = read_tx(&inventory).await;
    let odf2 = inventory.get_node_model(&tx, "25").await.unwrap();

    let paths = odf2.get_connection_paths(&tx).await.unwrap();
    assert_eq!(paths.len(), 2);
    assert_eq!(paths[0].len(), 7);
    // Port7 - Cable4 - Port6
    assert_eq!(handle_ids(&paths[1]), vec!["27", "31", "4"]);
}

#[tokio::test]
async fn test_max_traversal_depth_bounds_paths() {
    let config = InventoryConfig::default().with_max_traversal_depth(1);
    let inventory = Inventory::open(config).await.unwrap();
    let mut tx = write_tx(&inventory).await;
    for (handle_id, type_label) in [("s", "Site"), ("r", "Rack")] {
        inventory
            .nodes()
            .create_node(&mut tx, handle_id, "Location", type_label, handle_id, PropertyMap::new())
            .await
            .unwrap();
    }
    inventory
        .nodes()
        .create_node(&mut tx, "e", "Physical", "Router", "e", PropertyMap::new())
        .await
        .unwrap();
    inventory
        .create_location_relationship(&mut tx, "s", "r", RelKind::Has, PropertyMap::new())
        .await
        .unwrap();
    inventory
        .create_physical_relationship(&mut tx, "e", "r", RelKind::LocatedIn, PropertyMap::new())
        .await
        .unwrap();

    let router = inventory.get_node_model(&tx, "e").await.unwrap();
    assert_eq!(handle_ids(&router.get_location_path(&tx).await.unwrap()), vec!["r"]);
}

async fn chain_path_len(cables: usize) -> usize {
    let inventory = empty().await;
    let mut tx = write_tx(&inventory).await;
    for i in 0..=cables {
        inventory
            .nodes()
            .create_node(&mut tx, &format!("p{i}"), "Physical", "Port", "port", PropertyMap::new())
            .await
            .unwrap();
    }
    for i in 1..=cables {
        let cable = format!("c{i}");
        inventory
            .nodes()
            .create_node(&mut tx, &cable, "Physical", "Cable", "cable", PropertyMap::new())
            .await
            .unwrap();
        for port in [format!("p{}", i - 1), format!("p{i}")] {
            inventory
                .create_physical_relationship(&mut tx, &cable, &port, RelKind::ConnectedTo, PropertyMap::new())
                .await
                .unwrap();
        }
    }
    let start = inventory.get_node_model(&tx, "p0").await.unwrap();
    start.get_connection_path(&tx).await.unwrap().len()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn test_chain_of_n_cables_gives_2n_plus_1_nodes(cables in 0usize..12) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let len = runtime.block_on(chain_path_len(cables));
        prop_assert_eq!(len, 2 * cables + 1);
    }
}
