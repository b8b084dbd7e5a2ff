//! Workflow model for the agent-factory editor.
//!
//! This crate holds everything the canvas edits, independent of rendering:
//!
//! - **Registry**: the closed set of node types and their metadata
//! - **Port System**: typed ports and the compatibility table
//! - **Graph Model**: node instances and edges in a petgraph-backed graph
//! - **Status**: execution status reported back onto nodes
//! - **Documents**: JSON import/export of whole workflows

pub mod definition;
pub mod edge;
pub mod error;
pub mod graph;
pub mod node;
pub mod port;
pub mod registry;
pub mod status;

pub use definition::{Imported, Workflow, WorkflowMetadata, WorkflowSummary};
pub use edge::{Edge, Endpoint, PortRef};
pub use error::{ConnectionRejection, GraphError, RegistryError, WorkflowError};
pub use graph::{Dropped, WorkflowGraph};
pub use node::{NodeId, NodeInstance, Severity, ValidationFinding};
pub use port::{
    CompatibilityTable, CompatiblePair, Port, PortDataType, PortDirection, PortSpec, can_connect,
};
pub use registry::{NodeCategory, NodeDefaults, NodeType, NodeTypeMetadata};
pub use status::{NodeStatus, StatusUpdate};
