//! Subcommand bodies. Each returns the text to print.

use agent_factory_canvas::{Canvas, CanvasError, FactoryConfig};
use agent_factory_workflow::registry::nodes_by_category;
use agent_factory_workflow::{NodeCategory, Workflow, WorkflowSummary};
use rootcause::Report;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;

/// What `inspect` found in a workflow file.
#[derive(Debug, Serialize)]
pub struct Inspection {
    #[serde(flatten)]
    pub summary: WorkflowSummary,
    /// Nodes refused on import, with the reason.
    pub dropped_nodes: Vec<String>,
    /// Edges refused on import, with the reason.
    pub dropped_edges: Vec<String>,
}

/// Lists every node type under its palette category.
#[must_use]
pub fn palette() -> String {
    let mut out = String::new();
    for category in NodeCategory::ALL {
        let _ = writeln!(out, "{}", category.label());
        for node_type in nodes_by_category(category) {
            let meta = node_type.metadata();
            let _ = writeln!(out, "  {:<12} {}", node_type.as_str(), meta.description);
        }
    }
    out
}

/// Imports `path`, re-validates it and summarizes the result.
///
/// # Errors
///
/// Returns [`CanvasError::Import`] if the file cannot be read or is not a
/// workflow document.
pub fn inspect(path: &Path, config: &FactoryConfig) -> Result<Inspection, Report<CanvasError>> {
    let input = std::fs::read_to_string(path).map_err(|e| CanvasError::Import {
        details: format!("{}: {e}", path.display()),
    })?;
    let imported = Workflow::import(&input, config.ports.compatibility_table()).map_err(|e| {
        CanvasError::Import {
            details: e.current_context().to_string(),
        }
    })?;
    let dropped_nodes = imported
        .dropped_nodes
        .iter()
        .map(|(node, reason)| format!("{}: {reason}", node.id))
        .collect();
    let dropped_edges = imported
        .dropped_edges
        .iter()
        .map(|(edge, reason)| format!("{} -> {}: {reason}", edge.source, edge.target))
        .collect();

    let mut canvas = Canvas::from_workflow(imported.workflow, config);
    let findings = canvas.validate();
    tracing::debug!(path = %path.display(), findings, "workflow validated");

    Ok(Inspection {
        summary: WorkflowSummary::from(&canvas.to_workflow()),
        dropped_nodes,
        dropped_edges,
    })
}

/// Human-readable report.
#[must_use]
pub fn render(inspection: &Inspection) -> String {
    let summary = &inspection.summary;
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", summary.name, summary.id);
    if let Some(description) = &summary.description {
        let _ = writeln!(out, "  {description}");
    }
    let _ = writeln!(
        out,
        "nodes: {}  edges: {}  errors: {}  warnings: {}",
        summary.node_count, summary.edge_count, summary.errors, summary.warnings
    );
    if !inspection.dropped_nodes.is_empty() {
        let _ = writeln!(out, "dropped nodes:");
        for dropped in &inspection.dropped_nodes {
            let _ = writeln!(out, "  {dropped}");
        }
    }
    if !inspection.dropped_edges.is_empty() {
        let _ = writeln!(out, "dropped edges:");
        for dropped in &inspection.dropped_edges {
            let _ = writeln!(out, "  {dropped}");
        }
    }
    out
}

/// Machine-readable report.
///
/// # Errors
///
/// Returns [`CanvasError::Export`] if serialization fails.
pub fn render_json(inspection: &Inspection) -> Result<String, Report<CanvasError>> {
    let json = serde_json::to_string_pretty(inspection).map_err(|e| CanvasError::Export {
        details: e.to_string(),
    })?;
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_factory_workflow::{
        CompatibilityTable, CompatiblePair, NodeType, PortDataType, PortDirection, PortRef,
        WorkflowGraph,
    };
    use std::io::Write;

    fn write_workflow(workflow: &Workflow) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".json")
            .tempfile()
            .expect("temp file");
        file.write_all(workflow.to_json().expect("export").as_bytes())
            .expect("write");
        file
    }

    fn event_to_condition() -> Workflow {
        let pair = CompatiblePair::new(PortDataType::Event, PortDataType::Boolean);
        let mut graph =
            WorkflowGraph::new().with_compatibility(CompatibilityTable::with_pairs([pair]));
        let trigger = graph.place_node(NodeType::Trigger, None);
        let logic = graph.place_node(NodeType::Logic, None);
        graph
            .connect(
                &PortRef::new(trigger, "event", PortDirection::Output),
                &PortRef::new(logic, "condition", PortDirection::Input),
            )
            .expect("allowed by the widened table");
        Workflow::from_graph("Gate", graph)
    }

    #[test]
    fn palette_lists_every_type_by_category() {
        let out = palette();
        for node_type in NodeType::ALL {
            assert!(out.contains(node_type.as_str()), "{node_type} missing");
        }
        let control = out.find("Control Flow").expect("control heading");
        let switch = out.find("switch").expect("switch entry");
        assert!(switch > control);
    }

    #[test]
    fn inspect_revalidates_document() {
        let mut graph = WorkflowGraph::new();
        let trigger = graph.place_node(NodeType::Trigger, None);
        let action = graph.place_node(NodeType::Action, None);
        graph.place_node(NodeType::Agent, None);
        graph
            .connect(
                &PortRef::new(trigger, "event", PortDirection::Output),
                &PortRef::new(action, "input", PortDirection::Input),
            )
            .expect("any accepts events");
        let file = write_workflow(&Workflow::from_graph("Nightly sync", graph));

        let inspection = inspect(file.path(), &FactoryConfig::default()).expect("inspect");
        let summary = &inspection.summary;
        assert_eq!(summary.name, "Nightly sync");
        assert_eq!((summary.node_count, summary.edge_count), (3, 1));
        // The lone agent has no input and no trigger reaches it.
        assert_eq!((summary.errors, summary.warnings), (1, 1));
        assert!(inspection.dropped_edges.is_empty());
        assert!(render(&inspection).contains("errors: 1  warnings: 1"));
    }

    #[test]
    fn edges_outside_configured_table_are_reported() {
        let file = write_workflow(&event_to_condition());

        let inspection = inspect(file.path(), &FactoryConfig::default()).expect("inspect");
        assert_eq!(inspection.summary.edge_count, 0);
        assert_eq!(inspection.dropped_edges.len(), 1);
        assert!(inspection.dropped_edges[0].contains("cannot connect event to boolean"));
        assert!(render(&inspection).contains("dropped edges:"));

        let mut config = FactoryConfig::default();
        config
            .ports
            .compatible_pairs
            .push(CompatiblePair::new(PortDataType::Boolean, PortDataType::Event));
        let inspection = inspect(file.path(), &config).expect("inspect");
        assert_eq!(inspection.summary.edge_count, 1);
        assert!(inspection.dropped_edges.is_empty());
    }

    #[test]
    fn repeated_node_ids_are_reported() {
        let workflow = event_to_condition();
        let mut document = serde_json::to_value(&workflow).expect("export");
        let nodes = document["graph"]["nodes"].as_array_mut().expect("nodes");
        let copy = nodes[0].clone();
        nodes.push(copy);
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(document.to_string().as_bytes()).expect("write");

        let inspection = inspect(file.path(), &FactoryConfig::default()).expect("inspect");
        assert_eq!(inspection.summary.node_count, 2);
        assert_eq!(inspection.dropped_nodes.len(), 1);
        assert!(inspection.dropped_nodes[0].contains("node already exists"));
        assert!(render(&inspection).contains("dropped nodes:"));
    }

    #[test]
    fn json_report_flattens_summary() {
        let file = write_workflow(&event_to_condition());
        let inspection = inspect(file.path(), &FactoryConfig::default()).expect("inspect");
        let value: serde_json::Value =
            serde_json::from_str(&render_json(&inspection).expect("json")).expect("parse");
        assert_eq!(value["name"], "Gate");
        assert_eq!(value["node_count"], 2);
        assert_eq!(value["dropped_edges"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn unreadable_file_is_an_import_error() {
        let err = inspect(
            Path::new("/nonexistent/workflow.json"),
            &FactoryConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err.current_context(), CanvasError::Import { .. }));
    }

    #[test]
    fn malformed_document_is_an_import_error() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(b"{\"nodes\": []}").expect("write");
        let err = inspect(file.path(), &FactoryConfig::default()).unwrap_err();
        assert!(matches!(err.current_context(), CanvasError::Import { .. }));
    }
}
