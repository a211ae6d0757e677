//! Graph walks behind the model read operations.
//!
//! Three shapes of walk, all cycle-safe through a visited set:
//!
//! - upward paths (location and placement lineage), one parent per hop
//! - breadth-first dependency reachability along `Depends_on`
//! - connection paths alternating port-like and cable nodes over
//!   `Connected_to`
//!
//! Neighbors are always visited in `handle_id` order so repeated walks over
//! the same graph give the same answer.

use std::collections::{HashSet, VecDeque};

use serde::Serialize;

use crate::model::{Direction, Node, NodeId, RelKind, Relationship};
use crate::repository::node_by_id;
use crate::storage::StorageBackend;
use crate::Result;
use super::{NodeSummary, NodeType};

/// One permitted hop of an upward walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub kind: RelKind,
    pub direction: Direction,
}

impl Step {
    pub const fn new(kind: RelKind, direction: Direction) -> Self {
        Self { kind, direction }
    }
}

/// Location lineage: physical placement first, then the location tree.
pub const LOCATION_STEPS: &[Step] = &[
    Step::new(RelKind::LocatedIn, Direction::Outgoing),
    Step::new(RelKind::PartOf, Direction::Outgoing),
    Step::new(RelKind::Has, Direction::Incoming),
];

/// Placement lineage: the equipment a unit or port sits in.
pub const PLACEMENT_STEPS: &[Step] = &[
    Step::new(RelKind::PartOf, Direction::Outgoing),
    Step::new(RelKind::Has, Direction::Incoming),
];

/// Neighbors of `id` over `kind` edges in `direction`, ordered by the
/// neighbor's `handle_id` and then relationship id.
pub(crate) async fn neighbors<B: StorageBackend>(
    backend: &B,
    tx: &B::Tx,
    id: NodeId,
    kind: RelKind,
    direction: Direction,
) -> Result<Vec<(Relationship, Node)>> {
    let rels = backend
        .get_relationships(tx, id, direction, Some(kind.as_str()))
        .await?;
    let mut out = Vec::with_capacity(rels.len());
    for rel in rels {
        if let Some(other) = rel.other_node(id) {
            let node = node_by_id(backend, tx, other).await?;
            out.push((rel, node));
        }
    }
    out.sort_by(|(ra, a), (rb, b)| a.handle_id().cmp(&b.handle_id()).then(ra.id.cmp(&rb.id)));
    Ok(out)
}

/// Walk upward from `start` one parent at a time.
///
/// Each hop takes the first unvisited neighbor found by trying `steps` in
/// order. The walk stops at a node with no such neighbor or after
/// `max_depth` hops. Returned root-first, without `start`.
pub async fn upward_path<B: StorageBackend>(
    backend: &B,
    tx: &B::Tx,
    start: &Node,
    steps: &[Step],
    max_depth: usize,
) -> Result<Vec<Node>> {
    let mut visited = HashSet::from([start.id]);
    let mut path = Vec::new();
    let mut current = start.id;

    'walk: for _ in 0..max_depth {
        for step in steps {
            let candidates = neighbors(backend, tx, current, step.kind, step.direction).await?;
            let unvisited = candidates.into_iter().find(|(_, n)| !visited.contains(&n.id));
            if let Some((_, parent)) = unvisited {
                visited.insert(parent.id);
                current = parent.id;
                path.push(parent);
                continue 'walk;
            }
        }
        break;
    }

    path.reverse();
    Ok(path)
}

/// Nodes reached by a dependency walk.
#[derive(Debug, Clone, Default)]
pub struct DependencyWalk {
    /// Immediate neighbors of the seeds.
    pub direct: Vec<Node>,
    /// Every node reached at depth one or more, in breadth-first order.
    pub reached: Vec<Node>,
}

/// Breadth-first reachability over `Depends_on` edges in one direction.
///
/// Seeds are never reported. Each node is expanded at most once, and the
/// frontier stops growing after `max_depth` hops.
pub async fn walk_dependencies<B: StorageBackend>(
    backend: &B,
    tx: &B::Tx,
    seeds: &[Node],
    direction: Direction,
    max_depth: usize,
) -> Result<DependencyWalk> {
    let mut visited: HashSet<NodeId> = seeds.iter().map(|n| n.id).collect();
    let mut frontier: VecDeque<(NodeId, usize)> = seeds.iter().map(|n| (n.id, 0)).collect();
    let mut walk = DependencyWalk::default();
    let mut direct_seen = HashSet::new();

    while let Some((id, depth)) = frontier.pop_front() {
        if depth >= max_depth {
            continue;
        }
        for (_, next) in neighbors(backend, tx, id, RelKind::DependsOn, direction).await? {
            if depth == 0 && !seeds.iter().any(|s| s.id == next.id) && direct_seen.insert(next.id) {
                walk.direct.push(next.clone());
            }
            if !visited.insert(next.id) {
                continue;
            }
            frontier.push_back((next.id, depth + 1));
            walk.reached.push(next);
        }
    }
    Ok(walk)
}

/// Reached nodes bucketed by type.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DependencyClasses {
    pub direct: Vec<NodeSummary>,
    pub links: Vec<NodeSummary>,
    pub oms: Vec<NodeSummary>,
    pub paths: Vec<NodeSummary>,
    pub services: Vec<NodeSummary>,
}

impl DependencyClasses {
    /// Bucket a walk. Nodes of other types are walked through, not reported.
    pub fn classify(walk: &DependencyWalk) -> Result<Self> {
        let mut classes = DependencyClasses::default();
        for node in &walk.direct {
            classes.direct.push(NodeSummary::from_node(node)?);
        }
        for node in &walk.reached {
            let summary = NodeSummary::from_node(node)?;
            match summary.node_type {
                NodeType::OpticalLink => classes.links.push(summary),
                NodeType::OpticalMultiplexSection => classes.oms.push(summary),
                NodeType::OpticalPath => classes.paths.push(summary),
                NodeType::Service => classes.services.push(summary),
                _ => {}
            }
        }
        for bucket in [
            &mut classes.direct,
            &mut classes.links,
            &mut classes.oms,
            &mut classes.paths,
            &mut classes.services,
        ] {
            bucket.sort();
        }
        Ok(classes)
    }
}

fn is_cable(node: &Node) -> bool {
    node.has_label(NodeType::Cable.label())
}

/// The cabling chain through `start`.
///
/// Extends the chain at both ends over `Connected_to`, alternating between
/// cables and non-cables, until an end has no unvisited continuation.
/// When several continuations exist the lowest `handle_id` is taken.
pub async fn connection_path<B: StorageBackend>(
    backend: &B,
    tx: &B::Tx,
    start: &Node,
) -> Result<Vec<Node>> {
    let mut visited = HashSet::from([start.id]);
    let mut path = VecDeque::from([start.clone()]);

    for at_back in [true, false] {
        loop {
            let tip = if at_back { path.back() } else { path.front() };
            let Some(tip) = tip else { break };
            let want_cable = !is_cable(tip);
            let next = neighbors(backend, tx, tip.id, RelKind::ConnectedTo, Direction::Both)
                .await?
                .into_iter()
                .map(|(_, n)| n)
                .find(|n| is_cable(n) == want_cable && !visited.contains(&n.id));
            let Some(next) = next else { break };
            visited.insert(next.id);
            if at_back {
                path.push_back(next);
            } else {
                path.push_front(next);
            }
        }
    }
    Ok(path.into())
}

/// `start` followed by everything below it over outgoing `Has`, plus the
/// logical units `Part_of` any of those.
pub async fn placement_subtree<B: StorageBackend>(
    backend: &B,
    tx: &B::Tx,
    start: &Node,
    max_depth: usize,
) -> Result<Vec<Node>> {
    let mut visited = HashSet::from([start.id]);
    let mut nodes = vec![start.clone()];
    let mut frontier = VecDeque::from([(start.id, 0usize)]);

    while let Some((id, depth)) = frontier.pop_front() {
        if depth >= max_depth {
            continue;
        }
        for (_, child) in neighbors(backend, tx, id, RelKind::Has, Direction::Outgoing).await? {
            if visited.insert(child.id) {
                frontier.push_back((child.id, depth + 1));
                nodes.push(child);
            }
        }
    }

    let physical: Vec<NodeId> = nodes.iter().map(|n| n.id).collect();
    for id in physical {
        for (_, unit) in neighbors(backend, tx, id, RelKind::PartOf, Direction::Incoming).await? {
            if visited.insert(unit.id) {
                nodes.push(unit);
            }
        }
    }
    Ok(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::property_map::props;
    use crate::storage::memory::{MemoryBackend, MemoryTx};
    use crate::tx::TxMode;

    async fn node(b: &MemoryBackend, tx: &mut MemoryTx, handle: &str, labels: &[&str]) -> NodeId {
        b.create_node(tx, labels, props([("handle_id", handle), ("name", handle)]))
            .await
            .unwrap()
    }

    async fn rel(b: &MemoryBackend, tx: &mut MemoryTx, s: NodeId, kind: RelKind, d: NodeId) {
        b.create_relationship(tx, s, d, kind.as_str(), Default::default())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_upward_path_stops_on_cycle() {
        let b = MemoryBackend::new();
        let mut tx = b.begin_tx(TxMode::ReadWrite).await.unwrap();
        let a = node(&b, &mut tx, "a", &["Node", "Location", "Site"]).await;
        let c = node(&b, &mut tx, "c", &["Node", "Location", "Rack"]).await;
        rel(&b, &mut tx, a, RelKind::Has, c).await;
        rel(&b, &mut tx, c, RelKind::Has, a).await;

        let start = b.get_node(&tx, c).await.unwrap().unwrap();
        let path = upward_path(&b, &tx, &start, LOCATION_STEPS, 20).await.unwrap();
        let names: Vec<_> = path.iter().filter_map(Node::handle_id).collect();
        assert_eq!(names, vec!["a"]);
    }

    #[tokio::test]
    async fn test_upward_path_respects_max_depth() {
        let b = MemoryBackend::new();
        let mut tx = b.begin_tx(TxMode::ReadWrite).await.unwrap();
        let mut ids = Vec::new();
        for i in 0..5 {
            ids.push(node(&b, &mut tx, &format!("n{i}"), &["Node", "Location", "Site"]).await);
        }
        for pair in ids.windows(2) {
            rel(&b, &mut tx, pair[0], RelKind::Has, pair[1]).await;
        }
        let leaf = b.get_node(&tx, ids[4]).await.unwrap().unwrap();
        let path = upward_path(&b, &tx, &leaf, LOCATION_STEPS, 2).await.unwrap();
        let names: Vec<_> = path.iter().filter_map(Node::handle_id).collect();
        assert_eq!(names, vec!["n2", "n3"]);
    }

    #[tokio::test]
    async fn test_dependency_walk_terminates_on_cycle() {
        let b = MemoryBackend::new();
        let mut tx = b.begin_tx(TxMode::ReadWrite).await.unwrap();
        let x = node(&b, &mut tx, "x", &["Node", "Logical", "Service"]).await;
        let y = node(&b, &mut tx, "y", &["Node", "Logical", "Optical_Path"]).await;
        let z = node(&b, &mut tx, "z", &["Node", "Logical", "Optical_Link"]).await;
        rel(&b, &mut tx, x, RelKind::DependsOn, y).await;
        rel(&b, &mut tx, y, RelKind::DependsOn, z).await;
        rel(&b, &mut tx, z, RelKind::DependsOn, x).await;

        let seed = b.get_node(&tx, x).await.unwrap().unwrap();
        let walk = walk_dependencies(&b, &tx, &[seed], Direction::Outgoing, 20)
            .await
            .unwrap();
        let classes = DependencyClasses::classify(&walk).unwrap();
        assert_eq!(walk.reached.len(), 2);
        assert_eq!(classes.direct.len(), 1);
        assert_eq!(classes.paths.len(), 1);
        assert_eq!(classes.links.len(), 1);
        assert!(classes.services.is_empty());
    }
}
