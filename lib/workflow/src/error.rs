//! Error types for the workflow crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `RegistryError`: lookups against the node type registry
//! - `ConnectionRejection`: why a prospective edge is not allowed
//! - `GraphError`: graph mutations (nodes, ports, edges)
//! - `WorkflowError`: document-level operations (wraps lower errors via context)

use crate::node::NodeId;
use crate::port::{PortDataType, PortDirection};
use crate::registry::NodeType;
use agent_factory_core::{EdgeId, WorkflowId};
use std::fmt;

/// Errors from the node type registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// No node type with this name exists.
    UnknownNodeType { name: String },
    /// No palette category with this id exists.
    UnknownCategory { id: String },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownNodeType { name } => write!(f, "unknown node type '{name}'"),
            Self::UnknownCategory { id } => write!(f, "unknown node category '{id}'"),
        }
    }
}

impl std::error::Error for RegistryError {}

/// Why a prospective connection was refused.
///
/// These are recoverable: the canvas shows them as a rejected drop and leaves
/// the graph untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionRejection {
    /// The port data types are not compatible.
    IncompatiblePorts {
        source_type: PortDataType,
        target_type: PortDataType,
    },
    /// A single-connection port already has an edge.
    CardinalityViolation { node_id: NodeId, port_id: String },
    /// Both ends are inputs or both are outputs.
    SameDirection { direction: PortDirection },
    /// Both ends are on the same node.
    SelfConnection { node_id: NodeId },
    /// The same two ports are already connected.
    DuplicateEdge { edge_id: EdgeId },
}

impl fmt::Display for ConnectionRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IncompatiblePorts {
                source_type,
                target_type,
            } => write!(f, "cannot connect {source_type} to {target_type}"),
            Self::CardinalityViolation { node_id, port_id } => {
                write!(f, "port '{port_id}' on node {node_id} accepts a single connection")
            }
            Self::SameDirection { direction } => {
                write!(f, "cannot connect two {direction} ports")
            }
            Self::SelfConnection { node_id } => {
                write!(f, "cannot connect node {node_id} to itself")
            }
            Self::DuplicateEdge { edge_id } => write!(f, "ports already connected by {edge_id}"),
        }
    }
}

impl std::error::Error for ConnectionRejection {}

/// Errors from graph operations.
///
/// These errors contain only information available at the graph layer.
/// Document-level context should be added by the caller using `.context()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// Node with the given ID was not found in the graph.
    NodeNotFound { node_id: NodeId },
    /// Port not found on node.
    PortNotFound { node_id: NodeId, port_id: String },
    /// Edge with the given ID was not found in the graph.
    EdgeNotFound { edge_id: EdgeId },
    /// A node with this ID is already in the graph.
    NodeExists { node_id: NodeId },
    /// An edge with this ID is already in the graph.
    EdgeExists { edge_id: EdgeId },
    /// The node's ID prefix names a different type than its `type` field.
    TypeMismatch { node_id: NodeId, node_type: NodeType },
    /// The connection was refused.
    Rejected(ConnectionRejection),
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NodeNotFound { node_id } => write!(f, "node not found: {node_id}"),
            Self::PortNotFound { node_id, port_id } => {
                write!(f, "port '{port_id}' not found on node {node_id}")
            }
            Self::EdgeNotFound { edge_id } => write!(f, "edge not found: {edge_id}"),
            Self::NodeExists { node_id } => write!(f, "node already exists: {node_id}"),
            Self::EdgeExists { edge_id } => write!(f, "edge already exists: {edge_id}"),
            Self::TypeMismatch { node_id, node_type } => {
                write!(f, "node {node_id} is declared as type '{node_type}'")
            }
            Self::Rejected(rejection) => write!(f, "connection rejected: {rejection}"),
        }
    }
}

impl std::error::Error for GraphError {}

impl From<ConnectionRejection> for GraphError {
    fn from(rejection: ConnectionRejection) -> Self {
        Self::Rejected(rejection)
    }
}

/// High-level workflow document errors.
///
/// Use these to add document context when wrapping lower-level errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    /// The document could not be serialized.
    Export { workflow_id: WorkflowId },
    /// The input is not a valid workflow document.
    Import { details: String },
}

impl fmt::Display for WorkflowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Export { workflow_id } => write!(f, "failed to export workflow {workflow_id}"),
            Self::Import { details } => write!(f, "failed to import workflow: {details}"),
        }
    }
}

impl std::error::Error for WorkflowError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_error_display() {
        let err = RegistryError::UnknownNodeType {
            name: "robot".to_string(),
        };
        assert_eq!(err.to_string(), "unknown node type 'robot'");
    }

    #[test]
    fn rejection_display_names_types() {
        let err = ConnectionRejection::IncompatiblePorts {
            source_type: PortDataType::String,
            target_type: PortDataType::Number,
        };
        assert_eq!(err.to_string(), "cannot connect string to number");
    }

    #[test]
    fn graph_error_wraps_rejection() {
        let node_id = NodeId::generate(NodeType::Agent);
        let err = GraphError::from(ConnectionRejection::CardinalityViolation {
            node_id,
            port_id: "output".to_string(),
        });
        assert!(err.to_string().contains("single connection"));
    }

    #[test]
    fn graph_error_port_not_found() {
        let node_id = NodeId::generate(NodeType::Trigger);
        let err = GraphError::PortNotFound {
            node_id,
            port_id: "missing".to_string(),
        };
        assert!(err.to_string().contains("port 'missing' not found"));
    }

    #[test]
    fn type_mismatch_names_declared_type() {
        let node_id = NodeId::generate(NodeType::Trigger);
        let err = GraphError::TypeMismatch {
            node_id,
            node_type: NodeType::Agent,
        };
        assert!(err.to_string().ends_with("declared as type 'agent'"));
    }
}
