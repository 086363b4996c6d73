//! Error types for the graph editor

use thiserror::Error;

use crate::types::NodeId;

/// Result type alias using GraphError
pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors that can occur while editing a graph
#[derive(Debug, Error)]
pub enum GraphError {
    /// A connection was refused by the graph
    #[error("Invalid connection: {0}")]
    InvalidConnection(#[from] ConnectionRejection),

    /// A node was requested for an alias the catalog does not know
    #[error("Unknown operator: {0}")]
    UnknownOperator(String),

    /// A node id does not exist in the graph
    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),

    /// A connection refers to a node that is no longer in the graph
    #[error("Connection '{connection}' refers to missing node '{node}'")]
    DanglingReference { connection: String, node: NodeId },

    /// A parameter value did not satisfy the operator's schema
    #[error("Invalid configuration for '{node}', parameter '{parameter}': {reason}")]
    InvalidConfiguration {
        node: String,
        parameter: String,
        reason: String,
    },

    /// The graph contains a cycle
    #[error("Cycle detected in graph")]
    CycleDetected,

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GraphError {
    /// Create an invalid configuration error
    pub fn invalid_configuration(
        node: impl Into<String>,
        parameter: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidConfiguration {
            node: node.into(),
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error is an expected, locally recoverable interaction failure
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::InvalidConnection(_))
    }
}

/// Reason a connection was not accepted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionRejection {
    /// One of the two endpoints is still free
    #[error("connection is not fully formed")]
    Incomplete,

    /// Source and target are the same node
    #[error("node '{0}' cannot connect to itself")]
    SelfLoop(NodeId),

    /// Target port index is outside the node's input ports
    #[error("port {port} is out of range for '{node}' ({count} inputs)")]
    PortOutOfRange {
        node: NodeId,
        port: usize,
        count: usize,
    },

    /// Target port already has a connection
    #[error("port {port} of '{node}' is already connected")]
    PortOccupied { node: NodeId, port: usize },

    /// Source node produces no output
    #[error("node '{0}' has no output")]
    NoOutput(NodeId),

    /// The source already feeds another port of the same target
    #[error("'{upstream}' is already connected to '{downstream}'")]
    DuplicateSource { upstream: NodeId, downstream: NodeId },

    /// The connection would close a cycle
    #[error("connecting '{upstream}' to '{downstream}' would create a cycle")]
    WouldCreateCycle { upstream: NodeId, downstream: NodeId },

    /// An endpoint names a node that is not in the graph
    #[error("unknown node '{0}'")]
    UnknownNode(NodeId),
}
