//! Integration tests for node and relationship CRUD and the guarded
//! relationship entry points.

mod common;

use common::{empty, write_tx};
use inventory_graph::model::property_map::props;
use inventory_graph::{
    policy, Direction, Error, MetaType, PropertyMap, RelKind, StorageBackend, TxMode, Value,
};
use pretty_assertions::assert_eq;

async fn with_test_nodes() -> common::TestInventory {
    let inventory = empty().await;
    let mut tx = write_tx(&inventory).await;
    for (handle_id, name) in [("1", "Test Node 1"), ("2", "Test Node 2")] {
        inventory
            .nodes()
            .create_node(&mut tx, handle_id, "Logical", "Test_Node", name, PropertyMap::new())
            .await
            .unwrap();
    }
    inventory.commit(tx).await.unwrap();
    inventory
}

// ============================================================================
// Nodes
// ============================================================================

#[tokio::test]
async fn test_create_and_get_node() {
    let inventory = with_test_nodes().await;
    let mut tx = write_tx(&inventory).await;
    inventory
        .nodes()
        .create_node(&mut tx, "3", "Logical", "Test_Node", "Test Node 3", PropertyMap::new())
        .await
        .unwrap();

    let node = inventory.nodes().get_node(&tx, "3").await.unwrap();
    assert_eq!(node.handle_id(), Some("3"));
    assert_eq!(node.name(), Some("Test Node 3"));
    assert_eq!(node.labels, vec!["Node", "Logical", "Test_Node"]);
}

#[tokio::test]
async fn test_existing_handle_id_is_an_integrity_error() {
    let inventory = with_test_nodes().await;
    let mut tx = write_tx(&inventory).await;
    let before = inventory.backend().node_count(&tx).await.unwrap();

    let err = inventory
        .nodes()
        .create_node(&mut tx, "1", "Logical", "Test_Node", "Test Node 1", PropertyMap::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::IntegrityError(_)));
    assert_eq!(inventory.backend().node_count(&tx).await.unwrap(), before);
}

#[tokio::test]
async fn test_bad_meta_type_label_writes_nothing() {
    let inventory = empty().await;
    let mut tx = write_tx(&inventory).await;

    let err = inventory
        .nodes()
        .create_node(&mut tx, "1", "Virtual", "Test_Node", "Test", PropertyMap::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::MetaLabelNamingError(ref label) if label == "Virtual"));
    assert_eq!(inventory.backend().node_count(&tx).await.unwrap(), 0);
}

#[tokio::test]
async fn test_get_node_bundle() {
    let inventory = with_test_nodes().await;
    let tx = inventory.begin(TxMode::ReadOnly).await.unwrap();

    let bundle = inventory.nodes().get_node_bundle(&tx, "1").await.unwrap();
    assert_eq!(bundle.data.get("handle_id"), Some(&Value::from("1")));
    assert_eq!(bundle.meta_type, MetaType::Logical);
    assert!(bundle.labels.iter().any(|l| l == "Test_Node"));

    assert_eq!(inventory.get_node_meta_type(&tx, "2").await.unwrap(), MetaType::Logical);
}

#[tokio::test]
async fn test_delete_node_removes_incident_relationships() {
    let inventory = with_test_nodes().await;
    let mut tx = write_tx(&inventory).await;
    inventory
        .nodes()
        .create_node(&mut tx, "3", "Logical", "Test_Node", "Test Node 3", PropertyMap::new())
        .await
        .unwrap();
    for (start, end) in [("1", "2"), ("3", "1"), ("2", "3")] {
        inventory
            .create_relationship(&mut tx, start, end, RelKind::DependsOn, PropertyMap::new())
            .await
            .unwrap();
    }
    let deleted = inventory.nodes().get_node(&tx, "1").await.unwrap().id;

    inventory.nodes().delete_node(&mut tx, "1").await.unwrap();

    let err = inventory.nodes().get_node(&tx, "1").await.unwrap_err();
    assert!(matches!(err, Error::NodeNotFound(ref h) if h == "1"));
    assert_eq!(inventory.backend().relationship_count(&tx).await.unwrap(), 1);

    let kept = inventory
        .relationships()
        .get_relationships(&tx, "2", "3", None)
        .await
        .unwrap();
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].kind().unwrap(), RelKind::DependsOn);

    for handle_id in ["2", "3"] {
        let node = inventory.nodes().get_node(&tx, handle_id).await.unwrap();
        let rels = inventory
            .backend()
            .get_relationships(&tx, node.id, Direction::Both, None)
            .await
            .unwrap();
        assert!(rels.iter().all(|r| r.src != deleted && r.dst != deleted));
    }

    let err = inventory.nodes().delete_node(&mut tx, "1").await.unwrap_err();
    assert!(matches!(err, Error::NodeNotFound(_)));
}

#[tokio::test]
async fn test_set_node_properties_deletes_by_empty_value() {
    let inventory = empty().await;
    let mut tx = write_tx(&inventory).await;
    let initial = props([
        ("string", Value::from("hello world")),
        ("delete_me", Value::from("byebye")),
        ("list", Value::from(vec![Value::from("hello"), Value::from("world")])),
        ("int", Value::from(3)),
    ]);
    inventory
        .nodes()
        .create_node(&mut tx, "1", "Physical", "Port", "Port1", initial)
        .await
        .unwrap();

    let updates = props([
        ("string", Value::from("hola el mundo")),
        ("delete_me", Value::from("")),
        ("list", Value::from(vec![Value::from("hello")])),
        ("int", Value::from(0)),
    ]);
    let node = inventory
        .nodes()
        .set_node_properties(&mut tx, "1", &updates)
        .await
        .unwrap();

    assert_eq!(node.get("string"), Some(&Value::from("hola el mundo")));
    assert_eq!(node.get("delete_me"), None);
    assert_eq!(node.get("list"), Some(&Value::from(vec![Value::from("hello")])));
    assert_eq!(node.get("int"), Some(&Value::Int(0)));
    assert_eq!(node.name(), Some("Port1"));
}

#[tokio::test]
async fn test_handle_id_is_immutable() {
    let inventory = with_test_nodes().await;
    let mut tx = write_tx(&inventory).await;
    let err = inventory
        .nodes()
        .set_node_properties(&mut tx, "1", &props([("handle_id", "99")]))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::BadProperties(_)));
}

#[tokio::test]
async fn test_node_queries() {
    let inventory = with_test_nodes().await;
    let mut tx = write_tx(&inventory).await;
    inventory
        .nodes()
        .create_node(&mut tx, "3", "Physical", "Router", "Core  Router", props([("vendor", "Juniper")]))
        .await
        .unwrap();
    inventory
        .nodes()
        .create_node(&mut tx, "4", "Physical", "Router", "Edge Router", props([("vendor", "juniper")]))
        .await
        .unwrap();

    let exact = inventory
        .nodes()
        .get_nodes_by_value(&tx, &Value::from("Juniper"), Some("vendor"))
        .await
        .unwrap();
    assert_eq!(exact.len(), 1);
    assert_eq!(exact[0].handle_id(), Some("3"));

    let found = inventory
        .nodes()
        .search_nodes_by_value(&tx, "JUNIPER", None)
        .await
        .unwrap();
    assert_eq!(found.iter().filter_map(|n| n.handle_id()).collect::<Vec<_>>(), vec!["3", "4"]);

    let found = inventory
        .nodes()
        .search_nodes_by_value(&tx, "core router", Some("name"))
        .await
        .unwrap();
    assert_eq!(found.len(), 1);

    let routers = inventory.nodes().get_nodes_by_type(&tx, "Router").await.unwrap();
    assert_eq!(routers.len(), 2);
    assert!(inventory.nodes().get_nodes_by_type(&tx, "Cable").await.unwrap().is_empty());

    let named = inventory.nodes().get_nodes_by_name(&tx, "Test Node 2").await.unwrap();
    assert_eq!(named.len(), 1);
}

#[tokio::test]
async fn test_get_unique_node_by_name() {
    let inventory = with_test_nodes().await;
    let mut tx = write_tx(&inventory).await;

    let node = inventory
        .nodes()
        .get_unique_node_by_name(&tx, "Test Node 1", "Test_Node")
        .await
        .unwrap();
    assert_eq!(node.handle_id(), Some("1"));

    let err = inventory
        .nodes()
        .get_unique_node_by_name(&tx, "Nobody", "Test_Node")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NodeNotFound(_)));

    inventory
        .nodes()
        .create_node(&mut tx, "3", "Logical", "Test_Node", "Test Node 1", PropertyMap::new())
        .await
        .unwrap();
    let err = inventory
        .nodes()
        .get_unique_node_by_name(&tx, "Test Node 1", "Test_Node")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MultipleNodesReturned(_)));
}

// ============================================================================
// Relationships
// ============================================================================

#[tokio::test]
async fn test_low_level_create_relationship() {
    let inventory = with_test_nodes().await;
    let mut tx = write_tx(&inventory).await;

    let id = inventory
        .relationships()
        .create_relationship(&mut tx, "1", "2", RelKind::DependsOn, PropertyMap::new())
        .await
        .unwrap();
    let bundle = inventory.relationships().get_relationship_bundle(&tx, id).await.unwrap();
    assert_eq!(bundle.kind, RelKind::DependsOn);
    assert_eq!(bundle.start, "1");
    assert_eq!(bundle.end, "2");

    let err = inventory
        .relationships()
        .create_relationship(&mut tx, "1", "404", RelKind::DependsOn, PropertyMap::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NodeNotFound(ref h) if h == "404"));
}

#[tokio::test]
async fn test_create_location_relationship() {
    let inventory = with_test_nodes().await;
    let mut tx = write_tx(&inventory).await;
    for (handle_id, name) in [("3", "Location Node 1"), ("4", "Location Node 2")] {
        inventory
            .nodes()
            .create_node(&mut tx, handle_id, "Location", "Test_Node", name, PropertyMap::new())
            .await
            .unwrap();
    }
    inventory
        .create_location_relationship(&mut tx, "3", "4", RelKind::Has, PropertyMap::new())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_failing_create_location_relationship() {
    let inventory = with_test_nodes().await;
    let mut tx = write_tx(&inventory).await;
    inventory
        .nodes()
        .create_node(&mut tx, "3", "Location", "Test_Node", "Location Node 1", PropertyMap::new())
        .await
        .unwrap();
    inventory
        .nodes()
        .create_node(&mut tx, "4", "Logical", "Test_Node", "Logical Node 2", PropertyMap::new())
        .await
        .unwrap();

    let err = inventory
        .create_location_relationship(&mut tx, "3", "4", RelKind::Has, PropertyMap::new())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "No relationship possible: Location -[Has]-> Logical");
    assert_eq!(inventory.backend().relationship_count(&tx).await.unwrap(), 0);
}

#[tokio::test]
async fn test_create_logical_relationship() {
    let inventory = empty().await;
    let mut tx = write_tx(&inventory).await;
    for (handle_id, meta) in [("3", "Logical"), ("4", "Physical"), ("5", "Logical")] {
        inventory
            .nodes()
            .create_node(&mut tx, handle_id, meta, "Test_Node", handle_id, PropertyMap::new())
            .await
            .unwrap();
    }
    for (end, kind) in [("4", RelKind::DependsOn), ("5", RelKind::DependsOn), ("4", RelKind::PartOf)] {
        inventory
            .create_logical_relationship(&mut tx, "3", end, kind, PropertyMap::new())
            .await
            .unwrap();
    }
    assert_eq!(inventory.backend().relationship_count(&tx).await.unwrap(), 3);
}

#[tokio::test]
async fn test_failing_create_logical_relationship() {
    let inventory = empty().await;
    let mut tx = write_tx(&inventory).await;
    for (handle_id, meta) in [("3", "Logical"), ("4", "Physical"), ("5", "Logical")] {
        inventory
            .nodes()
            .create_node(&mut tx, handle_id, meta, "Test_Node", handle_id, PropertyMap::new())
            .await
            .unwrap();
    }
    for (end, kind) in [("4", RelKind::Has), ("5", RelKind::PartOf), ("5", RelKind::Has)] {
        let err = inventory
            .create_location_relationship(&mut tx, "3", end, kind, PropertyMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoRelationshipPossible { .. }), "{kind} to {end}");
    }
    // Legal destination, wrong source scope
    let err = inventory
        .create_physical_relationship(&mut tx, "3", "4", RelKind::Has, PropertyMap::new())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::NoRelationshipPossible { start: MetaType::Logical, kind: RelKind::Has, end: MetaType::Physical }
    ));
    assert_eq!(inventory.backend().relationship_count(&tx).await.unwrap(), 0);
}

#[tokio::test]
async fn test_generic_create_relationship_checks_both_ends() {
    let inventory = empty().await;
    let mut tx = write_tx(&inventory).await;
    inventory
        .nodes()
        .create_node(&mut tx, "1", "Relation", "Customer", "Customer1", PropertyMap::new())
        .await
        .unwrap();
    inventory
        .nodes()
        .create_node(&mut tx, "2", "Logical", "Service", "Service1", PropertyMap::new())
        .await
        .unwrap();

    inventory
        .create_relationship(&mut tx, "1", "2", RelKind::Uses, PropertyMap::new())
        .await
        .unwrap();
    let err = inventory
        .create_relationship(&mut tx, "2", "1", RelKind::Uses, PropertyMap::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NoRelationshipPossible { .. }));
    let err = inventory
        .create_relation_relationship(&mut tx, "1", "2", RelKind::ResponsibleFor, PropertyMap::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NoRelationshipPossible { .. }));
}

#[tokio::test]
async fn test_relationship_lookup_and_delete() {
    let inventory = with_test_nodes().await;
    let mut tx = write_tx(&inventory).await;
    let id = inventory
        .create_relationship(&mut tx, "1", "2", RelKind::DependsOn, props([("weight", 2)]))
        .await
        .unwrap();

    let rel = inventory.relationships().get_relationship(&tx, id).await.unwrap();
    assert_eq!(rel.properties.get("weight"), Some(&Value::Int(2)));

    let between = inventory.relationships().get_relationships(&tx, "2", "1", None).await.unwrap();
    assert_eq!(between.len(), 1);
    let none = inventory
        .relationships()
        .get_relationships(&tx, "1", "2", Some(RelKind::Uses))
        .await
        .unwrap();
    assert!(none.is_empty());

    inventory.relationships().delete_relationship(&mut tx, id).await.unwrap();
    let err = inventory.relationships().get_relationship(&tx, id).await.unwrap_err();
    assert!(matches!(err, Error::RelationshipNotFound(missing) if missing == id));
    let err = inventory.relationships().delete_relationship(&mut tx, id).await.unwrap_err();
    assert!(matches!(err, Error::RelationshipNotFound(_)));
}

#[tokio::test]
async fn test_set_relationship_properties() {
    let inventory = with_test_nodes().await;
    let mut tx = write_tx(&inventory).await;
    let id = inventory
        .create_relationship(
            &mut tx,
            "1",
            "2",
            RelKind::DependsOn,
            props([("ip_address", "10.0.0.1"), ("note", "temporary")]),
        )
        .await
        .unwrap();

    let rel = inventory
        .relationships()
        .set_relationship_properties(&mut tx, id, &props([("note", ""), ("vlan", "100")]))
        .await
        .unwrap();
    assert_eq!(rel.properties.get("note"), None);
    assert_eq!(rel.properties.get("vlan"), Some(&Value::from("100")));
    assert_eq!(rel.properties.get("ip_address"), Some(&Value::from("10.0.0.1")));
}

// ============================================================================
// Transactions
// ============================================================================

#[tokio::test]
async fn test_finish_rolls_back_on_error() {
    let inventory = with_test_nodes().await;
    let mut tx = write_tx(&inventory).await;

    let outcome = async {
        inventory
            .nodes()
            .create_node(&mut tx, "3", "Logical", "Test_Node", "Test Node 3", PropertyMap::new())
            .await?;
        inventory
            .create_relationship(&mut tx, "3", "1", RelKind::Has, PropertyMap::new())
            .await
    }
    .await;
    assert!(inventory.finish(tx, outcome).await.is_err());

    let tx = inventory.begin(TxMode::ReadOnly).await.unwrap();
    assert!(inventory.nodes().find(&tx, "3").await.unwrap().is_none());
    assert_eq!(inventory.backend().node_count(&tx).await.unwrap(), 2);
}

#[tokio::test]
async fn test_read_only_transaction_rejects_writes() {
    let inventory = empty().await;
    let mut tx = inventory.begin(TxMode::ReadOnly).await.unwrap();
    let err = inventory
        .nodes()
        .create_node(&mut tx, "1", "Logical", "Test_Node", "Test", PropertyMap::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::TxError(_)));
}

#[tokio::test]
async fn test_policy_decides_every_triple() {
    let inventory = empty().await;
    let mut tx = write_tx(&inventory).await;
    for meta in MetaType::ALL {
        for side in ["start", "end"] {
            inventory
                .nodes()
                .create_node(
                    &mut tx,
                    &format!("{meta}-{side}"),
                    meta.as_str(),
                    "Test_Node",
                    side,
                    PropertyMap::new(),
                )
                .await
                .unwrap();
        }
    }

    let mut created = 0;
    for start in MetaType::ALL {
        for kind in RelKind::ALL {
            for end in MetaType::ALL {
                let nodes_before = inventory.backend().node_count(&tx).await.unwrap();
                let rels_before = inventory.backend().relationship_count(&tx).await.unwrap();
                let result = inventory
                    .create_relationship(
                        &mut tx,
                        &format!("{start}-start"),
                        &format!("{end}-end"),
                        kind,
                        PropertyMap::new(),
                    )
                    .await;

                let legal = policy::ALLOWED.contains(&(start, kind, end));
                assert_eq!(result.is_ok(), legal, "{start} -[{kind}]-> {end}");
                let rels_after = inventory.backend().relationship_count(&tx).await.unwrap();
                match result {
                    Ok(_) => {
                        created += 1;
                        assert_eq!(rels_after, rels_before + 1);
                    }
                    Err(err) => {
                        assert!(
                            matches!(
                                err,
                                Error::NoRelationshipPossible { start: s, kind: k, end: e }
                                    if s == start && k == kind && e == end
                            ),
                            "{start} -[{kind}]-> {end}: {err}"
                        );
                        assert_eq!(rels_after, rels_before);
                    }
                }
                assert_eq!(inventory.backend().node_count(&tx).await.unwrap(), nodes_before);
            }
        }
    }
    assert_eq!(created, policy::ALLOWED.len());
}
