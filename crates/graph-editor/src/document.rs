//! Saving and loading graphs
//!
//! A `GraphDocument` is the plain structure an external serializer needs:
//! nodes with id, operator, position and configuration, and connections as
//! source id, target id and port index. JSON helpers are provided; other
//! formats can be built on the same structure.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GraphError, Result};
use crate::graph::Graph;
use crate::registry::OperatorCatalog;
use crate::resolver::ConfigurationResolver;
use crate::types::{Configuration, Connection, NodeId, Point};

/// Persisted form of one node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    pub id: NodeId,
    pub operator: String,
    pub position: Point,
    #[serde(default)]
    pub configuration: Configuration,
}

/// Persisted form of one connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRecord {
    pub source: NodeId,
    pub target: NodeId,
    pub port: usize,
}

impl From<&Connection> for ConnectionRecord {
    fn from(c: &Connection) -> Self {
        Self {
            source: c.source.clone(),
            target: c.target.clone(),
            port: c.target_port,
        }
    }
}

impl From<&ConnectionRecord> for Connection {
    fn from(r: &ConnectionRecord) -> Self {
        Connection::new(r.source.clone(), r.target.clone(), r.port)
    }
}

/// A whole graph in persisted form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphDocument {
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub connections: Vec<ConnectionRecord>,
}

impl GraphDocument {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write the document as pretty JSON, creating parent directories
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        log::debug!("Saved graph with {} nodes to {:?}", self.nodes.len(), path);
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let document = Self::from_json(&content)?;
        log::info!("Loaded graph with {} nodes from {:?}", document.nodes.len(), path);
        Ok(document)
    }
}

/// What had to be left out while loading a document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub nodes_loaded: usize,
    pub connections_loaded: usize,
    /// Nodes whose operator is not in the catalog, or whose id repeats
    pub skipped_nodes: Vec<NodeRecord>,
    /// Connections the graph refused
    pub skipped_connections: Vec<ConnectionRecord>,
    /// Nodes whose stored configuration the resolver rejected; they keep
    /// their operator defaults
    pub unresolved_configurations: Vec<NodeId>,
}

impl LoadReport {
    pub fn is_complete(&self) -> bool {
        self.skipped_nodes.is_empty()
            && self.skipped_connections.is_empty()
            && self.unresolved_configurations.is_empty()
    }
}

impl Graph {
    /// Capture the graph in persisted form
    pub fn to_document(&self) -> GraphDocument {
        GraphDocument {
            nodes: self
                .nodes()
                .map(|n| NodeRecord {
                    id: n.id().to_string(),
                    operator: n.operator().to_string(),
                    position: n.position,
                    configuration: n.configuration().clone(),
                })
                .collect(),
            connections: self.connections().iter().map(ConnectionRecord::from).collect(),
        }
    }

    /// Build a new graph from a document
    pub fn from_document(
        document: &GraphDocument,
        catalog: &dyn OperatorCatalog,
        resolver: &dyn ConfigurationResolver,
    ) -> (Graph, LoadReport) {
        let mut graph = Graph::new();
        let report = graph.load_document(document, catalog, resolver);
        (graph, report)
    }

    /// Replace the contents of this graph with `document`
    ///
    /// Nodes with an unknown operator are skipped, along with any connection
    /// that touches them or that the graph refuses. Stored configuration goes
    /// through `resolver` like an interactive edit; a rejected one leaves the
    /// operator defaults in place. A variadic node takes as many ports as its
    /// stored connections need.
    pub fn load_document(
        &mut self,
        document: &GraphDocument,
        catalog: &dyn OperatorCatalog,
        resolver: &dyn ConfigurationResolver,
    ) -> LoadReport {
        self.clear();
        let mut report = LoadReport::default();
        let mut seen: HashSet<&str> = HashSet::new();

        for record in &document.nodes {
            let Some(descriptor) = catalog.descriptor(&record.operator) else {
                log::warn!(
                    "Skipping node '{}': unknown operator '{}'",
                    record.id,
                    record.operator
                );
                report.skipped_nodes.push(record.clone());
                continue;
            };
            if !seen.insert(record.id.as_str()) {
                log::warn!("Skipping node '{}': duplicate id", record.id);
                report.skipped_nodes.push(record.clone());
                continue;
            }
            let configuration = match resolver.resolve(&descriptor, &record.configuration) {
                Ok(configuration) => Some(configuration),
                Err(err) => {
                    log::warn!("Node '{}' keeps default configuration: {}", record.id, err);
                    report.unresolved_configurations.push(record.id.clone());
                    None
                }
            };
            self.insert_node(record.id.clone(), descriptor, record.position);
            if let (Some(configuration), Ok(node)) = (configuration, self.node_mut(&record.id)) {
                node.configuration = configuration;
            }
            report.nodes_loaded += 1;
        }

        let mut records: Vec<&ConnectionRecord> = document.connections.iter().collect();
        records.sort_by_key(|r| r.port);
        for record in records {
            match self.restore_connection(Connection::from(record)) {
                Ok(()) => report.connections_loaded += 1,
                Err(err) => {
                    log::warn!(
                        "Skipping connection {} -> {}[{}]: {}",
                        record.source,
                        record.target,
                        record.port,
                        err
                    );
                    report.skipped_connections.push(record.clone());
                }
            }
        }

        log::info!(
            "Loaded {} nodes and {} connections",
            report.nodes_loaded,
            report.connections_loaded
        );
        report
    }

    /// Starter graph with a `Read` and a `Write` node
    pub fn default_pipeline(catalog: &dyn OperatorCatalog) -> Result<Graph> {
        let mut graph = Graph::new();
        graph.instantiate(catalog, "Read", Some(Point::new(90, 30)))?;
        graph.instantiate(catalog, "Write", Some(Point::new(390, 30)))?;
        Ok(graph)
    }

    /// Load a document file into a new graph
    pub fn open(
        path: impl AsRef<Path>,
        catalog: &dyn OperatorCatalog,
        resolver: &dyn ConfigurationResolver,
    ) -> Result<(Graph, LoadReport)> {
        let document = GraphDocument::load(path)?;
        Ok(Graph::from_document(&document, catalog, resolver))
    }

    /// Write this graph to a document file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.to_document().save(path)
    }
}

/// Reject a document whose connections name nodes it does not contain
pub fn check_references(document: &GraphDocument) -> Result<()> {
    let ids: HashSet<&str> = document.nodes.iter().map(|n| n.id.as_str()).collect();
    for c in &document.connections {
        for endpoint in [&c.source, &c.target] {
            if !ids.contains(endpoint.as_str()) {
                return Err(GraphError::DanglingReference {
                    connection: format!("{} -> {}[{}]", c.source, c.target, c.port),
                    node: endpoint.clone(),
                });
            }
        }
    }
    Ok(())
}
