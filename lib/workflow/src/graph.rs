//! Authoritative workflow graph backed by petgraph.
//!
//! The graph owns every node instance and edge. It is the only place edges are
//! created, so it is where compatibility and cardinality are enforced and where
//! each port's `connected` flag is kept in sync.
//!
//! A `StableDiGraph` is used so that removing a node or an edge never shifts
//! the indices held in the id lookup maps.

use crate::edge::{Edge, Endpoint, PortRef};
use crate::error::{ConnectionRejection, GraphError};
use crate::node::{NodeId, NodeInstance, ValidationFinding};
use crate::port::{CompatibilityTable, PortDirection};
use crate::registry::{self, NodeType};
use crate::status::StatusUpdate;
use agent_factory_core::{EdgeId, Position, Size};
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::{Dfs, Walker};
use rootcause::Report;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::{HashMap, HashSet};

/// The node/edge collection behind a canvas.
#[derive(Debug, Clone)]
pub struct WorkflowGraph {
    graph: StableDiGraph<NodeInstance, Edge>,
    node_index_map: HashMap<NodeId, NodeIndex>,
    edge_index_map: HashMap<EdgeId, EdgeIndex>,
    compatibility: CompatibilityTable,
    min_node_size: Size,
}

impl WorkflowGraph {
    /// Creates an empty graph with the builtin compatibility table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            graph: StableDiGraph::new(),
            node_index_map: HashMap::new(),
            edge_index_map: HashMap::new(),
            compatibility: CompatibilityTable::builtin(),
            min_node_size: Size::MIN_NODE,
        }
    }

    /// Uses `table` to decide port compatibility.
    #[must_use]
    pub fn with_compatibility(mut self, table: CompatibilityTable) -> Self {
        self.compatibility = table;
        self
    }

    /// Sets the per-axis floor applied to node sizes.
    #[must_use]
    pub fn with_min_node_size(mut self, min: Size) -> Self {
        self.min_node_size = min;
        for node in self.graph.node_weights_mut() {
            node.size = node.size.at_least(min);
        }
        self
    }

    #[must_use]
    pub fn compatibility(&self) -> &CompatibilityTable {
        &self.compatibility
    }

    #[must_use]
    pub fn min_node_size(&self) -> Size {
        self.min_node_size
    }

    /// Builds a graph from exported parts.
    ///
    /// Nodes and edges that [`WorkflowGraph::add_node`] or
    /// [`WorkflowGraph::connect`] would refuse are dropped and returned
    /// alongside the reason. Serialized port lists are ignored; every node's
    /// ports are derived again from its type and data.
    #[must_use]
    pub fn from_parts(
        nodes: Vec<NodeInstance>,
        edges: Vec<Edge>,
        compatibility: CompatibilityTable,
    ) -> (Self, Dropped) {
        let mut graph = Self::new().with_compatibility(compatibility);
        let mut dropped = Dropped::default();
        for node in nodes {
            if let Err(reason) = graph.check_node(&node) {
                tracing::warn!(node_id = %node.id, %reason, "dropping invalid node");
                dropped.nodes.push((node, reason));
                continue;
            }
            graph.insert_node(node);
        }
        for edge in edges {
            let from = PortRef {
                endpoint: edge.source.clone(),
                direction: PortDirection::Output,
            };
            let to = PortRef {
                endpoint: edge.target.clone(),
                direction: PortDirection::Input,
            };
            let checked = if graph.edge_index_map.contains_key(&edge.id) {
                Err(GraphError::EdgeExists { edge_id: edge.id })
            } else {
                graph.check_connection(&from, &to)
            };
            match checked {
                Ok(_) => graph.insert_edge(edge),
                Err(reason) => {
                    tracing::warn!(edge_id = %edge.id, %reason, "dropping invalid edge");
                    dropped.edges.push((edge, reason));
                }
            }
        }
        (graph, dropped)
    }

    /// Adds a node to the graph.
    ///
    /// Ports are derived from the registry, the size is clamped to the
    /// minimum and every port starts unconnected.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NodeExists`] if the ID is taken and
    /// [`GraphError::TypeMismatch`] if the ID prefix names another type.
    pub fn add_node(&mut self, node: NodeInstance) -> Result<NodeId, Report<GraphError>> {
        self.check_node(&node)?;
        Ok(self.insert_node(node))
    }

    /// Adds a fresh node of `node_type` with registry defaults.
    pub fn place_node(&mut self, node_type: NodeType, position: Option<Position>) -> NodeId {
        self.insert_node(NodeInstance::new(node_type, position))
    }

    fn check_node(&self, node: &NodeInstance) -> Result<(), GraphError> {
        if node.id.node_type() != node.node_type {
            return Err(GraphError::TypeMismatch {
                node_id: node.id,
                node_type: node.node_type,
            });
        }
        if self.node_index_map.contains_key(&node.id) {
            return Err(GraphError::NodeExists { node_id: node.id });
        }
        Ok(())
    }

    fn insert_node(&mut self, mut node: NodeInstance) -> NodeId {
        let ports = registry::derive_ports(node.node_type, &node.data);
        node.inputs = ports.inputs;
        node.outputs = ports.outputs;
        node.size = node.size.at_least(self.min_node_size);
        let node_id = node.id;
        let index = self.graph.add_node(node);
        self.node_index_map.insert(node_id, index);
        tracing::debug!(%node_id, "node added");
        node_id
    }

    /// Removes a node and every edge attached to it.
    pub fn remove_node(&mut self, node_id: NodeId) -> Option<NodeInstance> {
        let index = *self.node_index_map.get(&node_id)?;
        let attached: Vec<EdgeId> = self
            .graph
            .edges_directed(index, petgraph::Direction::Incoming)
            .chain(self.graph.edges_directed(index, petgraph::Direction::Outgoing))
            .map(|e| e.weight().id)
            .collect();
        for edge_id in attached {
            self.remove_edge_internal(edge_id);
        }
        self.node_index_map.remove(&node_id);
        let node = self.graph.remove_node(index);
        tracing::debug!(%node_id, "node removed");
        node
    }

    #[must_use]
    pub fn get_node(&self, node_id: NodeId) -> Option<&NodeInstance> {
        let index = self.node_index_map.get(&node_id)?;
        self.graph.node_weight(*index)
    }

    fn node_mut(&mut self, node_id: NodeId) -> Result<&mut NodeInstance, GraphError> {
        let index = self
            .node_index_map
            .get(&node_id)
            .ok_or(GraphError::NodeNotFound { node_id })?;
        self.graph
            .node_weight_mut(*index)
            .ok_or(GraphError::NodeNotFound { node_id })
    }

    #[must_use]
    pub fn contains_node(&self, node_id: NodeId) -> bool {
        self.node_index_map.contains_key(&node_id)
    }

    /// All nodes, in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeInstance> {
        self.graph.node_weights()
    }

    /// All edges.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.graph.edge_weights()
    }

    #[must_use]
    pub fn get_edge(&self, edge_id: EdgeId) -> Option<&Edge> {
        let index = self.edge_index_map.get(&edge_id)?;
        self.graph.edge_weight(*index)
    }

    /// Edges attached to one port.
    pub fn edges_at<'a>(
        &'a self,
        node_id: NodeId,
        direction: PortDirection,
        port_id: &'a str,
    ) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges()
            .filter(move |e| e.touches_port(direction, node_id, port_id))
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Commits a new position for a node.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NodeNotFound`] if the node does not exist.
    pub fn move_node(
        &mut self,
        node_id: NodeId,
        position: Position,
    ) -> Result<(), Report<GraphError>> {
        self.node_mut(node_id)?.position = position;
        Ok(())
    }

    /// Commits a new size for a node, clamped to the minimum.
    ///
    /// Returns the size actually stored.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NodeNotFound`] if the node does not exist.
    pub fn resize_node(&mut self, node_id: NodeId, size: Size) -> Result<Size, Report<GraphError>> {
        let min = self.min_node_size;
        let node = self.node_mut(node_id)?;
        node.size = size.at_least(min);
        Ok(node.size)
    }

    /// Records an execution status change.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NodeNotFound`] if the node does not exist.
    pub fn apply_status(&mut self, update: &StatusUpdate) -> Result<(), Report<GraphError>> {
        self.node_mut(update.node_id)?.apply_status(update);
        Ok(())
    }

    /// Replaces the validation findings of a node.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NodeNotFound`] if the node does not exist.
    pub fn set_findings(
        &mut self,
        node_id: NodeId,
        findings: Vec<ValidationFinding>,
    ) -> Result<(), Report<GraphError>> {
        self.node_mut(node_id)?.validation = findings;
        Ok(())
    }

    /// Replaces a node's data and regenerates its ports.
    ///
    /// Edges that referenced a removed port, or a port whose data type
    /// changed, are removed and returned.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NodeNotFound`] if the node does not exist.
    pub fn reconfigure_node(
        &mut self,
        node_id: NodeId,
        data: JsonValue,
    ) -> Result<Vec<Edge>, Report<GraphError>> {
        let invalidated = self.node_mut(node_id)?.reconfigure(data);
        let stale: Vec<EdgeId> = self
            .edges()
            .filter(|e| {
                invalidated
                    .iter()
                    .any(|(direction, port_id)| e.touches_port(*direction, node_id, port_id))
            })
            .map(|e| e.id)
            .collect();
        let removed: Vec<Edge> = stale
            .into_iter()
            .filter_map(|edge_id| self.remove_edge_internal(edge_id))
            .collect();
        tracing::debug!(%node_id, removed_edges = removed.len(), "node reconfigured");
        Ok(removed)
    }

    /// Decides whether `from` and `to` may be connected, without mutating.
    ///
    /// The two ends may be given in either order; on success they are
    /// returned as `(source, target)`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Rejected`] for connections the user is not
    /// allowed to make, and lookup errors for unknown nodes or ports.
    pub fn check_connection(
        &self,
        from: &PortRef,
        to: &PortRef,
    ) -> Result<(Endpoint, Endpoint), GraphError> {
        let (source, target) =
            PortRef::oriented(from, to).ok_or(ConnectionRejection::SameDirection {
                direction: from.direction,
            })?;

        if source.node_id == target.node_id {
            return Err(ConnectionRejection::SelfConnection {
                node_id: source.node_id,
            }
            .into());
        }

        let source_node = self.get_node(source.node_id).ok_or(GraphError::NodeNotFound {
            node_id: source.node_id,
        })?;
        let target_node = self.get_node(target.node_id).ok_or(GraphError::NodeNotFound {
            node_id: target.node_id,
        })?;

        let source_port =
            source_node
                .output_port(&source.port_id)
                .ok_or_else(|| GraphError::PortNotFound {
                    node_id: source.node_id,
                    port_id: source.port_id.clone(),
                })?;
        let target_port =
            target_node
                .input_port(&target.port_id)
                .ok_or_else(|| GraphError::PortNotFound {
                    node_id: target.node_id,
                    port_id: target.port_id.clone(),
                })?;

        if !self
            .compatibility
            .allows(source_port.data_type, target_port.data_type)
        {
            return Err(ConnectionRejection::IncompatiblePorts {
                source_type: source_port.data_type,
                target_type: target_port.data_type,
            }
            .into());
        }

        if let Some(existing) = self.edges().find(|e| e.joins(&source, &target)) {
            return Err(ConnectionRejection::DuplicateEdge {
                edge_id: existing.id,
            }
            .into());
        }

        for (endpoint, port) in [(&source, source_port), (&target, target_port)] {
            if !port.multiple && port.connected {
                return Err(ConnectionRejection::CardinalityViolation {
                    node_id: endpoint.node_id,
                    port_id: endpoint.port_id.clone(),
                }
                .into());
            }
        }

        Ok((source, target))
    }

    /// Creates an edge between two ports given in either order.
    ///
    /// # Errors
    ///
    /// Returns the reason from [`WorkflowGraph::check_connection`]; the graph
    /// is unchanged on error.
    pub fn connect(&mut self, from: &PortRef, to: &PortRef) -> Result<EdgeId, Report<GraphError>> {
        let (source, target) = self.check_connection(from, to)?;
        let edge = Edge::new(source, target);
        let edge_id = edge.id;
        tracing::debug!(%edge_id, source = %edge.source, target = %edge.target, "edge created");
        self.insert_edge(edge);
        Ok(edge_id)
    }

    /// Creates an edge from an output endpoint to an input endpoint.
    ///
    /// # Errors
    ///
    /// See [`WorkflowGraph::connect`].
    pub fn connect_endpoints(
        &mut self,
        source: Endpoint,
        target: Endpoint,
    ) -> Result<EdgeId, Report<GraphError>> {
        self.connect(
            &PortRef {
                endpoint: source,
                direction: PortDirection::Output,
            },
            &PortRef {
                endpoint: target,
                direction: PortDirection::Input,
            },
        )
    }

    /// Removes an edge.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::EdgeNotFound`] if the edge does not exist.
    pub fn disconnect(&mut self, edge_id: EdgeId) -> Result<Edge, Report<GraphError>> {
        let edge = self
            .remove_edge_internal(edge_id)
            .ok_or(GraphError::EdgeNotFound { edge_id })?;
        tracing::debug!(%edge_id, "edge removed");
        Ok(edge)
    }

    /// Recomputes advisory findings on every node.
    ///
    /// - An unconnected required input is an error.
    /// - When the graph has triggers, a node no trigger can reach is a warning.
    ///
    /// Returns the total number of findings.
    pub fn validate(&mut self) -> usize {
        let triggers: Vec<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|&i| self.graph[i].node_type == NodeType::Trigger)
            .collect();
        let reachable: HashSet<NodeIndex> = triggers
            .iter()
            .flat_map(|&start| Dfs::new(&self.graph, start).iter(&self.graph))
            .collect();

        let mut total = 0;
        let indices: Vec<NodeIndex> = self.graph.node_indices().collect();
        for index in indices {
            let node = &mut self.graph[index];
            let mut findings: Vec<ValidationFinding> = node
                .inputs
                .iter()
                .filter(|p| p.required && !p.connected)
                .map(|p| {
                    ValidationFinding::error(format!("{} input is not connected", p.label))
                        .on_field(p.id.clone())
                })
                .collect();
            if !triggers.is_empty() && !reachable.contains(&index) {
                findings.push(ValidationFinding::warning(
                    "node is not reachable from any trigger",
                ));
            }
            total += findings.len();
            node.validation = findings;
        }
        total
    }

    fn insert_edge(&mut self, edge: Edge) {
        let (Some(&source_index), Some(&target_index)) = (
            self.node_index_map.get(&edge.source.node_id),
            self.node_index_map.get(&edge.target.node_id),
        ) else {
            return;
        };
        if self.edge_index_map.contains_key(&edge.id) {
            return;
        }
        self.set_connected(PortDirection::Output, &edge.source, true);
        self.set_connected(PortDirection::Input, &edge.target, true);
        let edge_id = edge.id;
        let index = self.graph.add_edge(source_index, target_index, edge);
        self.edge_index_map.insert(edge_id, index);
    }

    fn remove_edge_internal(&mut self, edge_id: EdgeId) -> Option<Edge> {
        let index = self.edge_index_map.remove(&edge_id)?;
        let edge = self.graph.remove_edge(index)?;
        for (direction, end) in [
            (PortDirection::Output, &edge.source),
            (PortDirection::Input, &edge.target),
        ] {
            let still_connected = self
                .edges_at(end.node_id, direction, &end.port_id)
                .next()
                .is_some();
            self.set_connected(direction, end, still_connected);
        }
        Some(edge)
    }

    fn set_connected(&mut self, direction: PortDirection, end: &Endpoint, connected: bool) {
        if let Ok(node) = self.node_mut(end.node_id)
            && let Some(port) = node.port_mut(direction, &end.port_id)
        {
            port.connected = connected;
        }
    }
}

impl Default for WorkflowGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Parts refused while building a graph from a document.
#[derive(Debug, Default)]
pub struct Dropped {
    pub nodes: Vec<(NodeInstance, GraphError)>,
    pub edges: Vec<(Edge, GraphError)>,
}

impl Dropped {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

/// Wire form of a graph: flat node and edge lists.
#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct GraphSnapshot {
    #[serde(default)]
    pub(crate) nodes: Vec<NodeInstance>,
    #[serde(default)]
    pub(crate) edges: Vec<Edge>,
}

impl Serialize for WorkflowGraph {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        GraphSnapshot {
            nodes: self.nodes().cloned().collect(),
            edges: self.edges().cloned().collect(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for WorkflowGraph {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let snapshot = GraphSnapshot::deserialize(deserializer)?;
        let (graph, _dropped) = Self::from_parts(
            snapshot.nodes,
            snapshot.edges,
            CompatibilityTable::builtin(),
        );
        Ok(graph)
    }
}
