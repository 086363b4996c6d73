//! Graph validation
//!
//! Structural checks over a whole graph, plus the ordering used to
//! revalidate only the part of a graph affected by a change.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::error::Result;
use crate::graph::Graph;
use crate::topology;
use crate::types::{GraphNode, NodeId};

/// Problem found in a graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    /// Cycle detected in the graph
    CycleDetected,
    /// A node has fewer connected inputs than its operator requires
    MissingInputs {
        node_id: NodeId,
        connected: usize,
        required: usize,
    },
    /// A required parameter has no value
    MissingParameter { node_id: NodeId, parameter: String },
    /// A connection references a node that does not exist
    DanglingConnection { connection: String, node_id: NodeId },
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CycleDetected => write!(f, "Cycle detected in graph"),
            Self::MissingInputs {
                node_id,
                connected,
                required,
            } => {
                write!(
                    f,
                    "Node '{}' has {} of {} required inputs connected",
                    node_id, connected, required
                )
            }
            Self::MissingParameter { node_id, parameter } => {
                write!(
                    f,
                    "Required parameter '{}' on node '{}' has no value",
                    parameter, node_id
                )
            }
            Self::DanglingConnection {
                connection,
                node_id,
            } => {
                write!(
                    f,
                    "Connection '{}' references unknown node '{}'",
                    connection, node_id
                )
            }
        }
    }
}

impl std::error::Error for ValidationIssue {}

/// Validate a whole graph
///
/// Returns all issues found (not just the first).
pub fn validate_graph(graph: &Graph) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    validate_connection_references(graph, &mut issues);
    if topology::execution_waves(graph).is_err() {
        issues.push(ValidationIssue::CycleDetected);
    }
    for node in graph.nodes() {
        issues.extend(validate_node(graph, node));
    }

    issues
}

/// Check a single node's inputs and parameters
pub fn validate_node(graph: &Graph, node: &GraphNode) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    let required = node.descriptor().min_inputs;
    let connected = graph.incoming(node.id()).len();
    if connected < required {
        issues.push(ValidationIssue::MissingInputs {
            node_id: node.id().to_string(),
            connected,
            required,
        });
    }

    for parameter in &node.descriptor().parameters {
        let value = node.configuration().get(&parameter.name);
        if parameter.required && value.map_or(true, |v| v.is_null()) {
            issues.push(ValidationIssue::MissingParameter {
                node_id: node.id().to_string(),
                parameter: parameter.name.clone(),
            });
        }
    }

    issues
}

/// Check that every connection endpoint exists
fn validate_connection_references(graph: &Graph, issues: &mut Vec<ValidationIssue>) {
    let node_ids: HashSet<&str> = graph.node_ids().collect();

    for connection in graph.connections() {
        for endpoint in [&connection.source, &connection.target] {
            if !node_ids.contains(endpoint.as_str()) {
                issues.push(ValidationIssue::DanglingConnection {
                    connection: connection.to_string(),
                    node_id: endpoint.clone(),
                });
            }
        }
    }
}

/// Outcome of checking one node while running a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeStatus {
    Valid,
    Error,
    /// Not checked because an upstream node failed
    Invalidated,
}

/// Order in which to revalidate the nodes affected by a change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationPlan {
    /// Node where the change happened
    pub root: NodeId,
    /// Whether the root itself needs checking
    pub include_root: bool,
    /// Downstream nodes grouped into waves, the root excluded
    pub waves: Vec<Vec<NodeId>>,
}

impl ValidationPlan {
    /// Plan revalidation after `root` changed
    ///
    /// For a deletion, build the plan before removing the node and pass
    /// `include_root = false`.
    pub fn for_change(graph: &Graph, root: &str, include_root: bool) -> Result<Self> {
        let mut waves = topology::downstream_waves(graph, root)?;
        if !waves.is_empty() {
            // first wave is the root alone
            waves.remove(0);
        }
        Ok(Self {
            root: root.to_string(),
            include_root,
            waves,
        })
    }

    /// Plans covering the whole graph, one per source node
    pub fn for_graph(graph: &Graph) -> Result<Vec<Self>> {
        graph
            .sources()
            .map(|source| Self::for_change(graph, source.id(), true))
            .collect()
    }

    /// Downstream nodes in processing order
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.waves.iter().flatten().map(String::as_str)
    }

    /// Run the plan, calling `check` for each node still in the graph
    ///
    /// When the root fails, downstream nodes are marked invalidated
    /// without being checked.
    pub fn run<F>(&self, graph: &Graph, mut check: F) -> IndexMap<NodeId, NodeStatus>
    where
        F: FnMut(&GraphNode) -> bool,
    {
        let mut statuses = IndexMap::new();
        let mut root_ok = true;

        if self.include_root {
            if let Some(root) = graph.node(&self.root) {
                root_ok = check(root);
                statuses.insert(self.root.clone(), status_of(root_ok));
            }
        }

        for id in self.nodes() {
            let Some(node) = graph.node(id) else {
                continue;
            };
            let status = if root_ok {
                status_of(check(node))
            } else {
                NodeStatus::Invalidated
            };
            statuses.insert(id.to_string(), status);
        }

        log::debug!(
            "Validated {} nodes downstream of '{}'",
            statuses.len(),
            self.root
        );
        statuses
    }
}

fn status_of(ok: bool) -> NodeStatus {
    if ok {
        NodeStatus::Valid
    } else {
        NodeStatus::Error
    }
}
