//! Workflow documents.
//!
//! A workflow is the exchange form of a canvas:
//! - Metadata (name, description, version, timestamps)
//! - The node/edge graph
//!
//! Documents are plain JSON. Importing one re-checks every edge against the
//! compatibility table in use, so a hand-edited file cannot smuggle in a
//! connection the editor would refuse.

use crate::edge::Edge;
use crate::error::{GraphError, WorkflowError};
use crate::graph::{GraphSnapshot, WorkflowGraph};
use crate::node::NodeInstance;
use crate::port::CompatibilityTable;
use agent_factory_core::WorkflowId;
use chrono::{DateTime, Utc};
use rootcause::Report;
use serde::{Deserialize, Serialize};

/// Metadata for a workflow document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowMetadata {
    /// Human-readable name for this workflow.
    pub name: String,
    /// Description of what this workflow does.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Semantic version of this document.
    pub version: String,
    /// Tags for organization/filtering.
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkflowMetadata {
    /// Creates new metadata with default values.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            description: None,
            version: "0.1.0".to_string(),
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }
}

/// A complete workflow document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub id: WorkflowId,
    pub metadata: WorkflowMetadata,
    pub graph: WorkflowGraph,
}

/// Document shape used when importing with a caller-supplied table.
#[derive(Deserialize)]
struct RawWorkflow {
    id: WorkflowId,
    metadata: WorkflowMetadata,
    #[serde(default)]
    graph: GraphSnapshot,
}

/// Result of importing a document: the workflow plus the nodes and edges
/// that were dropped and why.
#[derive(Debug)]
pub struct Imported {
    pub workflow: Workflow,
    pub dropped_nodes: Vec<(NodeInstance, GraphError)>,
    pub dropped_edges: Vec<(Edge, GraphError)>,
}

impl Workflow {
    /// Creates an empty workflow with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_graph(name, WorkflowGraph::new())
    }

    /// Wraps an existing graph in a fresh document.
    #[must_use]
    pub fn from_graph(name: impl Into<String>, graph: WorkflowGraph) -> Self {
        Self {
            id: WorkflowId::new(),
            metadata: WorkflowMetadata::new(name),
            graph,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Marks the workflow as updated (bumps updated_at timestamp).
    pub fn touch(&mut self) {
        self.metadata.updated_at = Utc::now();
    }

    /// Serializes the document as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Export`] if serialization fails.
    pub fn to_json(&self) -> Result<String, Report<WorkflowError>> {
        serde_json::to_string_pretty(self).map_err(|e| {
            tracing::error!(workflow_id = %self.id, error = %e, "workflow export failed");
            WorkflowError::Export {
                workflow_id: self.id,
            }
            .into()
        })
    }

    /// Parses a document using the builtin compatibility table.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Import`] if the input is not a workflow
    /// document.
    pub fn from_json(input: &str) -> Result<Self, Report<WorkflowError>> {
        Ok(Self::import(input, CompatibilityTable::builtin())?.workflow)
    }

    /// Parses a document, checking edges against `compatibility`.
    ///
    /// Node ports are derived from each node's type and data. Nodes with a
    /// repeated or mistyped ID, edges the table does not allow, and edges
    /// referencing missing nodes or ports are dropped and reported rather
    /// than failing the import.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Import`] if the input is not a workflow
    /// document.
    pub fn import(
        input: &str,
        compatibility: CompatibilityTable,
    ) -> Result<Imported, Report<WorkflowError>> {
        let raw: RawWorkflow =
            serde_json::from_str(input).map_err(|e| WorkflowError::Import {
                details: e.to_string(),
            })?;
        let (graph, dropped) =
            WorkflowGraph::from_parts(raw.graph.nodes, raw.graph.edges, compatibility);
        tracing::debug!(
            workflow_id = %raw.id,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            dropped_nodes = dropped.nodes.len(),
            dropped_edges = dropped.edges.len(),
            "workflow imported"
        );
        Ok(Imported {
            workflow: Self {
                id: raw.id,
                metadata: raw.metadata,
                graph,
            },
            dropped_nodes: dropped.nodes,
            dropped_edges: dropped.edges,
        })
    }
}

/// Summary information about a workflow (for listings).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSummary {
    pub id: WorkflowId,
    pub name: String,
    pub description: Option<String>,
    pub node_count: usize,
    pub edge_count: usize,
    /// Validation errors across all nodes.
    pub errors: usize,
    /// Validation warnings across all nodes.
    pub warnings: usize,
    pub updated_at: DateTime<Utc>,
}

impl From<&Workflow> for WorkflowSummary {
    fn from(workflow: &Workflow) -> Self {
        let (errors, warnings) = workflow
            .graph
            .nodes()
            .map(NodeInstance::finding_counts)
            .fold((0, 0), |(e, w), (ne, nw)| (e + ne, w + nw));
        Self {
            id: workflow.id,
            name: workflow.metadata.name.clone(),
            description: workflow.metadata.description.clone(),
            node_count: workflow.graph.node_count(),
            edge_count: workflow.graph.edge_count(),
            errors,
            warnings,
            updated_at: workflow.metadata.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::PortRef;
    use crate::port::{CompatiblePair, PortDataType, PortDirection};
    use crate::registry::NodeType;

    fn sample() -> Workflow {
        let mut graph = WorkflowGraph::new();
        let trigger = graph.place_node(NodeType::Trigger, None);
        let agent = graph.place_node(NodeType::Agent, None);
        graph
            .connect(
                &PortRef::new(trigger, "event", PortDirection::Output),
                &PortRef::new(agent, "context", PortDirection::Input),
            )
            .expect("event feeds object context");
        Workflow::from_graph("Inbox triage", graph)
    }

    #[test]
    fn workflow_creation() {
        let workflow = Workflow::new("Test Workflow");
        assert_eq!(workflow.name(), "Test Workflow");
        assert_eq!(workflow.graph.node_count(), 0);
    }

    #[test]
    fn workflow_metadata_builder() {
        let metadata = WorkflowMetadata::new("My Workflow")
            .with_description("Does something useful")
            .with_version("1.0.0")
            .with_tag("daily")
            .with_tag("email");

        assert_eq!(metadata.name, "My Workflow");
        assert_eq!(metadata.description, Some("Does something useful".to_string()));
        assert_eq!(metadata.version, "1.0.0");
        assert_eq!(metadata.tags, vec!["daily", "email"]);
    }

    #[test]
    fn json_roundtrip_is_lossless() {
        let workflow = sample();
        let json = workflow.to_json().expect("export");
        let parsed = Workflow::from_json(&json).expect("import");

        assert_eq!(parsed.id, workflow.id);
        assert_eq!(parsed.metadata, workflow.metadata);
        let original: Vec<_> = workflow.graph.nodes().cloned().collect();
        let restored: Vec<_> = parsed.graph.nodes().cloned().collect();
        assert_eq!(original, restored);
        assert_eq!(parsed.graph.edge_count(), 1);
    }

    #[test]
    fn import_with_narrow_table_drops_edges() {
        let json = sample().to_json().expect("export");
        // Without the event/object pair only wildcard and identity remain.
        let imported = Workflow::import(&json, CompatibilityTable::strict()).expect("import");
        assert_eq!(imported.workflow.graph.edge_count(), 0);
        assert_eq!(imported.dropped_edges.len(), 1);
    }

    #[test]
    fn import_with_extended_table_accepts_more() {
        let mut graph = WorkflowGraph::new().with_compatibility(CompatibilityTable::with_pairs(vec![
            CompatiblePair::new(PortDataType::Error, PortDataType::Boolean),
        ]));
        let agent = graph.place_node(NodeType::Agent, None);
        let logic = graph.place_node(NodeType::Logic, None);
        graph
            .connect(
                &PortRef::new(agent, "error", PortDirection::Output),
                &PortRef::new(logic, "condition", PortDirection::Input),
            )
            .expect("extended table allows error to boolean");
        let json = Workflow::from_graph("Extended", graph)
            .to_json()
            .expect("export");

        let builtin = Workflow::from_json(&json).expect("import");
        assert_eq!(builtin.graph.edge_count(), 0);
    }

    #[test]
    fn document_without_port_lists_keeps_its_edges() {
        let workflow = sample();
        let mut document = serde_json::to_value(&workflow).expect("export");
        let nodes = document["graph"]["nodes"].as_array_mut().expect("nodes");
        for node in nodes {
            let node = node.as_object_mut().expect("node object");
            node.remove("inputs");
            node.remove("outputs");
        }

        let imported = Workflow::import(&document.to_string(), CompatibilityTable::builtin())
            .expect("import");
        assert!(imported.dropped_nodes.is_empty());
        assert!(imported.dropped_edges.is_empty());
        let graph = &imported.workflow.graph;
        assert_eq!(graph.edge_count(), 1);
        let agent = graph
            .nodes()
            .find(|n| n.node_type == NodeType::Agent)
            .expect("agent");
        assert_eq!(agent.inputs.len(), 2);
        assert!(agent.input_port("context").expect("port").connected);
    }

    #[test]
    fn malformed_input_is_an_import_error() {
        let err = Workflow::from_json("{ not json").unwrap_err();
        assert!(matches!(err.current_context(), WorkflowError::Import { .. }));
    }

    #[test]
    fn summary_counts_findings() {
        let mut workflow = sample();
        workflow.graph.validate();
        let summary = WorkflowSummary::from(&workflow);
        assert_eq!(summary.name, "Inbox triage");
        assert_eq!(summary.node_count, 2);
        assert_eq!(summary.edge_count, 1);
        // The agent's required message input is still open.
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.warnings, 0);
    }
}
