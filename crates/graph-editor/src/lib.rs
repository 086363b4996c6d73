//! Graph Editor - node-graph editing engine for processing graphs
//!
//! This crate holds the model and behaviour behind a visual graph builder,
//! leaving drawing to the host. It provides:
//!
//! - `Graph`: nodes and connections with exclusive input ports
//! - `InteractionController`: pointer/keyboard state machine that edits a graph
//! - Topological distance and wave ordering for validation and execution
//! - `SearchIndex` and `PaletteSession` for the add-node flow
//! - Node and port geometry for rendering and hit-testing
//!
//! # Architecture
//!
//! Operators come from an external `OperatorCatalog`; the editor never owns
//! their definitions. Everything runs on one thread: listeners registered
//! with `Graph::subscribe` are called synchronously after each change.
//!
//! # Example
//!
//! ```
//! use graph_editor::{
//!     Graph, InteractionController, OperatorDescriptor, OperatorRegistry, Point,
//! };
//!
//! let catalog: OperatorRegistry = vec![
//!     OperatorDescriptor::new("Read", "Input-Output", 0, true),
//!     OperatorDescriptor::new("Write", "Input-Output", 1, false),
//! ]
//! .into_iter()
//! .collect();
//!
//! let mut graph = Graph::default_pipeline(&catalog).unwrap();
//! let mut controller = InteractionController::new();
//!
//! // drag from Read's output onto Write's first input
//! controller.pointer_down_at(&mut graph, Point::new(180, 45));
//! controller.pointer_up_at(&mut graph, Point::new(390, 45));
//! assert!(!graph.is_port_free("Write 0", 0));
//! ```

pub mod config;
pub mod descriptor;
pub mod document;
pub mod error;
pub mod events;
pub mod geometry;
pub mod graph;
pub mod ids;
pub mod interaction;
pub mod palette;
pub mod registry;
pub mod resolver;
pub mod search;
pub mod topology;
pub mod types;
pub mod validation;

// Re-export key types
pub use config::{EditorConfig, LayoutConfig, PaletteConfig};
pub use descriptor::{OperatorDescriptor, ParameterKind, ParameterSpec};
pub use document::{GraphDocument, LoadReport};
pub use error::{ConnectionRejection, GraphError, Result};
pub use events::{EventSink, GraphEvent, NullEventSink, VecEventSink};
pub use geometry::{HitTarget, NodeShape};
pub use graph::Graph;
pub use ids::IdAllocator;
pub use interaction::{InteractionController, InteractionState, Key, Outcome};
pub use palette::PaletteSession;
pub use registry::{category_tree, CategoryMenu, OperatorCatalog, OperatorRegistry};
pub use resolver::{ConfigurationResolver, PassthroughResolver, SchemaResolver};
pub use search::SearchIndex;
pub use types::{Connection, GraphNode, NodeId, PendingConnection, Point, PortRef, Rect};
pub use validation::{validate_graph, ValidationIssue, ValidationPlan};
