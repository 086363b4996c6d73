//! Topological queries over a graph
//!
//! Distances and wave grouping used to order validation and execution.
//! A wave is a set of nodes that may be processed in parallel once every
//! earlier wave has completed.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::error::{GraphError, Result};
use crate::graph::Graph;
use crate::types::NodeId;

/// Minimum number of hops from `from`'s output to `to`
///
/// Returns 0 when `from == to` and -1 when `to` is unreachable. Each node is
/// expanded at most once, so the search terminates even on a cyclic graph.
pub fn distance(graph: &Graph, from: &str, to: &str) -> i32 {
    if from == to {
        return 0;
    }
    let mut visited: HashSet<&str> = HashSet::from([from]);
    let mut queue: VecDeque<(&str, i32)> = VecDeque::from([(from, 0)]);

    while let Some((current, hops)) = queue.pop_front() {
        for connection in graph.connections_from(current) {
            let next = connection.target.as_str();
            if next == to {
                return hops + 1;
            }
            if visited.insert(next) {
                queue.push_back((next, hops + 1));
            }
        }
    }
    -1
}

/// Group every node into execution waves
///
/// A node's wave is the length of the longest path reaching it from a node
/// with no incoming connections, so all of its dependencies sit in earlier
/// waves. Nodes inside a wave keep the graph's insertion order.
pub fn execution_waves(graph: &Graph) -> Result<Vec<Vec<NodeId>>> {
    let nodes: Vec<&str> = graph.node_ids().collect();
    layer(graph, &nodes).ok_or(GraphError::CycleDetected)
}

/// Group the nodes downstream of `node` into waves, starting with `node`
///
/// Used to revalidate only what a change can affect. Returns an empty list
/// when `node` is not in the graph.
pub fn downstream_waves(graph: &Graph, node: &str) -> Result<Vec<Vec<NodeId>>> {
    if !graph.contains_node(node) {
        return Ok(Vec::new());
    }
    let reachable = reachable_from(graph, node);
    // keep insertion order so waves are deterministic
    let nodes: Vec<&str> = graph
        .node_ids()
        .filter(|id| reachable.contains(id))
        .collect();
    layer(graph, &nodes).ok_or(GraphError::CycleDetected)
}

/// Every node reachable from `node`, including `node` itself
pub fn reachable_from<'a>(graph: &'a Graph, node: &'a str) -> HashSet<&'a str> {
    let mut reached: HashSet<&str> = HashSet::from([node]);
    let mut queue: VecDeque<&str> = VecDeque::from([node]);
    while let Some(current) = queue.pop_front() {
        for connection in graph.connections_from(current) {
            if reached.insert(connection.target.as_str()) {
                queue.push_back(&connection.target);
            }
        }
    }
    reached
}

/// Kahn layering restricted to `nodes`; `None` when they contain a cycle
fn layer(graph: &Graph, nodes: &[&str]) -> Option<Vec<Vec<NodeId>>> {
    let members: HashSet<&str> = nodes.iter().copied().collect();
    let mut in_degree: HashMap<&str, usize> = nodes.iter().map(|&id| (id, 0)).collect();
    for connection in graph.connections() {
        if members.contains(connection.source.as_str()) {
            if let Some(degree) = in_degree.get_mut(connection.target.as_str()) {
                *degree += 1;
            }
        }
    }

    let mut level: HashMap<&str, usize> = HashMap::new();
    let mut queue: VecDeque<&str> = nodes
        .iter()
        .copied()
        .filter(|id| in_degree.get(id) == Some(&0))
        .collect();
    for id in &queue {
        level.insert(*id, 0);
    }

    let mut visited = 0;
    while let Some(current) = queue.pop_front() {
        visited += 1;
        let next_level = level.get(current).copied().unwrap_or(0) + 1;
        for connection in graph.connections_from(current) {
            let target = connection.target.as_str();
            let Some(degree) = in_degree.get_mut(target) else {
                continue;
            };
            let entry = level.entry(target).or_insert(0);
            *entry = (*entry).max(next_level);
            *degree -= 1;
            if *degree == 0 {
                queue.push_back(target);
            }
        }
    }

    if visited < nodes.len() {
        log::warn!("Cycle detected while ordering {} nodes", nodes.len());
        return None;
    }

    let depth = level.values().copied().max().map_or(0, |max| max + 1);
    let mut waves: Vec<Vec<NodeId>> = vec![Vec::new(); depth];
    for id in nodes {
        if let Some(&l) = level.get(id) {
            waves[l].push(id.to_string());
        }
    }
    Some(waves)
}
