//! Change notifications emitted by the graph
//!
//! Listeners (renderers, the validation scheduler, status panels) subscribe
//! to a graph and receive every structural change after it has been applied.

use std::cell::RefCell;

use serde::{Deserialize, Serialize};

use crate::types::{Connection, NodeId, Point};

/// Trait for receiving graph events
///
/// Delivery is synchronous and happens on the thread that mutated the graph.
pub trait EventSink {
    fn send(&self, event: &GraphEvent);
}

/// Events emitted when the graph changes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GraphEvent {
    /// A node was placed
    #[serde(rename_all = "camelCase")]
    NodeAdded { node_id: NodeId, operator: String },

    /// A node was deleted (its connections were removed first)
    #[serde(rename_all = "camelCase")]
    NodeRemoved { node_id: NodeId },

    /// A node was moved
    #[serde(rename_all = "camelCase")]
    NodeMoved { node_id: NodeId, position: Point },

    /// A node's configuration was replaced
    #[serde(rename_all = "camelCase")]
    NodeConfigured { node_id: NodeId },

    /// A connection was committed
    #[serde(rename_all = "camelCase")]
    ConnectionAdded { connection: Connection },

    /// A connection was removed
    #[serde(rename_all = "camelCase")]
    ConnectionRemoved { connection: Connection },
}

impl GraphEvent {
    /// The node this event is about, for connection events the target
    pub fn node_id(&self) -> &str {
        match self {
            Self::NodeAdded { node_id, .. }
            | Self::NodeRemoved { node_id }
            | Self::NodeMoved { node_id, .. }
            | Self::NodeConfigured { node_id } => node_id,
            Self::ConnectionAdded { connection } | Self::ConnectionRemoved { connection } => {
                &connection.target
            }
        }
    }
}

/// A no-op event sink that discards all events
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn send(&self, _event: &GraphEvent) {}
}

/// A vector-based event sink that collects events
///
/// Useful for testing to verify events were emitted correctly.
#[derive(Default)]
pub struct VecEventSink {
    events: RefCell<Vec<GraphEvent>>,
}

impl VecEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all collected events
    pub fn events(&self) -> Vec<GraphEvent> {
        self.events.borrow().clone()
    }

    /// Clear all collected events
    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

impl EventSink for VecEventSink {
    fn send(&self, event: &GraphEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}
