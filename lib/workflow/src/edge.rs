//! Edges between node ports.
//!
//! An edge always runs from an output port (`source`) to an input port
//! (`target`). Whether it may exist at all is decided by the graph.

use crate::node::NodeId;
use crate::port::PortDirection;
use agent_factory_core::EdgeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One end of an edge: a port on a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub node_id: NodeId,
    pub port_id: String,
}

impl Endpoint {
    #[must_use]
    pub fn new(node_id: NodeId, port_id: impl Into<String>) -> Self {
        Self {
            node_id,
            port_id: port_id.into(),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.node_id, self.port_id)
    }
}

/// A connection between two ports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub source: Endpoint,
    pub target: Endpoint,
}

impl Edge {
    /// A new edge with a fresh id.
    #[must_use]
    pub fn new(source: Endpoint, target: Endpoint) -> Self {
        Self {
            id: EdgeId::new(),
            source,
            target,
        }
    }

    /// Whether either end sits on `node_id`.
    #[must_use]
    pub fn touches_node(&self, node_id: NodeId) -> bool {
        self.source.node_id == node_id || self.target.node_id == node_id
    }

    /// Whether the given side of the edge is exactly `endpoint`.
    #[must_use]
    pub fn touches_port(&self, direction: PortDirection, node_id: NodeId, port_id: &str) -> bool {
        let end = match direction {
            PortDirection::Output => &self.source,
            PortDirection::Input => &self.target,
        };
        end.node_id == node_id && end.port_id == port_id
    }

    /// Whether this edge joins the same two ports.
    #[must_use]
    pub fn joins(&self, source: &Endpoint, target: &Endpoint) -> bool {
        &self.source == source && &self.target == target
    }
}

/// A prospective connection between two ports, in the order the user made it.
///
/// Users may start a connection drag on either side, so the first end may be
/// an input. [`PortRef::oriented`] turns the pair into `(source, target)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortRef {
    pub endpoint: Endpoint,
    pub direction: PortDirection,
}

impl PortRef {
    #[must_use]
    pub fn new(node_id: NodeId, port_id: impl Into<String>, direction: PortDirection) -> Self {
        Self {
            endpoint: Endpoint::new(node_id, port_id),
            direction,
        }
    }

    /// Orders two ends as `(output, input)`.
    ///
    /// Returns `None` when both ends point the same way.
    #[must_use]
    pub fn oriented(from: &PortRef, to: &PortRef) -> Option<(Endpoint, Endpoint)> {
        match (from.direction, to.direction) {
            (PortDirection::Output, PortDirection::Input) => {
                Some((from.endpoint.clone(), to.endpoint.clone()))
            }
            (PortDirection::Input, PortDirection::Output) => {
                Some((to.endpoint.clone(), from.endpoint.clone()))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::NodeType;

    #[test]
    fn edge_touches_its_nodes() {
        let a = NodeId::generate(NodeType::Trigger);
        let b = NodeId::generate(NodeType::Agent);
        let edge = Edge::new(Endpoint::new(a, "event"), Endpoint::new(b, "input"));
        assert!(edge.touches_node(a));
        assert!(edge.touches_node(b));
        assert!(edge.touches_port(PortDirection::Output, a, "event"));
        assert!(!edge.touches_port(PortDirection::Input, a, "event"));
    }

    #[test]
    fn orientation_puts_output_first() {
        let a = NodeId::generate(NodeType::Agent);
        let b = NodeId::generate(NodeType::Message);
        let input = PortRef::new(b, "input", PortDirection::Input);
        let output = PortRef::new(a, "output", PortDirection::Output);
        let (source, target) = PortRef::oriented(&input, &output).expect("opposite ends");
        assert_eq!(source.node_id, a);
        assert_eq!(target.node_id, b);
        assert!(PortRef::oriented(&input, &input).is_none());
    }

    #[test]
    fn edge_serde_roundtrip() {
        let a = NodeId::generate(NodeType::Action);
        let b = NodeId::generate(NodeType::Logic);
        let edge = Edge::new(Endpoint::new(a, "result"), Endpoint::new(b, "input"));
        let json = serde_json::to_string(&edge).expect("serialize");
        let parsed: Edge = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(edge, parsed);
    }
}
