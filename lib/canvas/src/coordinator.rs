//! The canvas coordinator.
//!
//! [`Canvas`] owns the authoritative [`WorkflowGraph`] and is the only place it
//! is mutated. Hosts route raw input to it in screen space; it converts
//! points to canvas space, forwards them to the node containers and port
//! handles, and then applies the [`CanvasEvent`]s those primitives report.
//!
//! Every routing method drains the event queue before returning, so the
//! graph and all views are consistent as soon as the call ends.

use crate::config::{CanvasConfig, FactoryConfig};
use crate::container::{HitTarget, InteractionMode, NodeContainer, NodeView};
use crate::error::CanvasError;
use crate::event::{CanvasEvent, Key, PointerEvent};
use crate::port_handle::{PortHandle, PortView};
use crate::selection::{Selection, SelectionBox};
use crate::viewport::Viewport;
use agent_factory_core::{EdgeId, Point, Position, Rect, Result, Size, WorkflowId};
use agent_factory_workflow::{
    Edge, GraphError, NodeId, NodeInstance, NodeStatus, NodeType, PortDirection, PortRef,
    RegistryError, StatusUpdate, Workflow, WorkflowGraph, WorkflowMetadata,
};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::mpsc;
use tracing::{debug, instrument, warn};

/// Height of the node header; ports are laid out below it.
const HEADER_HEIGHT: f64 = 40.0;
/// Vertical distance between port anchors.
const PORT_SPACING: f64 = 24.0;

/// Identifies one port on the canvas.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PortKey {
    pub node_id: NodeId,
    pub direction: PortDirection,
    pub port_id: String,
}

impl PortKey {
    #[must_use]
    pub fn new(node_id: NodeId, direction: PortDirection, port_id: impl Into<String>) -> Self {
        Self {
            node_id,
            direction,
            port_id: port_id.into(),
        }
    }

    #[must_use]
    pub fn port_ref(&self) -> PortRef {
        PortRef::new(self.node_id, self.port_id.clone(), self.direction)
    }
}

/// Outcome of the last connection drop.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionFeedback {
    Connected { edge_id: EdgeId },
    /// The drop was refused; the graph is unchanged.
    Rejected { reason: GraphError },
}

/// The line drawn from a port to the pointer while connecting.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionPreview {
    pub source: PortKey,
    /// Anchor of the source port, in canvas space.
    pub from: Point,
    /// Pointer, in canvas space.
    pub to: Point,
}

#[derive(Debug, Clone)]
struct NodeDrag {
    node_id: NodeId,
    start: Point,
    current: Point,
    /// Committed positions of every node moving with the drag.
    origins: Vec<(NodeId, Position)>,
}

impl NodeDrag {
    fn delta(&self) -> Point {
        self.current - self.start
    }
}

#[derive(Debug, Clone)]
struct ConnectionDrag {
    source: PortKey,
    pointer: Point,
}

/// Interactive editor state around one workflow graph.
#[derive(Debug)]
pub struct Canvas {
    id: WorkflowId,
    metadata: WorkflowMetadata,
    graph: WorkflowGraph,
    config: CanvasConfig,
    viewport: Viewport,
    selection: Selection,
    containers: HashMap<NodeId, NodeContainer>,
    ports: HashMap<PortKey, PortHandle>,
    events_tx: mpsc::Sender<CanvasEvent>,
    events_rx: mpsc::Receiver<CanvasEvent>,
    node_drag: Option<NodeDrag>,
    connection: Option<ConnectionDrag>,
    selection_box: Option<SelectionBox>,
    hovered_port: Option<(NodeId, String)>,
    context_menu: Option<(NodeId, Point)>,
    feedback: Option<ConnectionFeedback>,
}

impl Canvas {
    /// An empty canvas.
    #[must_use]
    pub fn new(config: &FactoryConfig) -> Self {
        Self::from_workflow(Workflow::new("Untitled workflow"), config)
    }

    /// A canvas editing `graph`.
    ///
    /// The graph is rebuilt under the configured compatibility table and
    /// minimum node size; edges the table refuses are dropped.
    #[must_use]
    pub fn from_graph(graph: WorkflowGraph, config: &FactoryConfig) -> Self {
        Self::from_workflow(Workflow::from_graph("Untitled workflow", graph), config)
    }

    #[must_use]
    pub fn from_workflow(workflow: Workflow, config: &FactoryConfig) -> Self {
        let nodes: Vec<NodeInstance> = workflow.graph.nodes().cloned().collect();
        let edges: Vec<Edge> = workflow.graph.edges().cloned().collect();
        let (graph, dropped) =
            WorkflowGraph::from_parts(nodes, edges, config.ports.compatibility_table());
        if !dropped.is_empty() {
            warn!(
                workflow_id = %workflow.id,
                dropped_nodes = dropped.nodes.len(),
                dropped_edges = dropped.edges.len(),
                "graph parts rejected on rebuild"
            );
        }
        let graph = graph.with_min_node_size(config.canvas.min_node_size());
        let (events_tx, events_rx) = mpsc::channel();

        let mut canvas = Self {
            id: workflow.id,
            metadata: workflow.metadata,
            graph,
            config: config.canvas.clone(),
            viewport: Viewport::new(config.canvas.min_zoom, config.canvas.max_zoom),
            selection: Selection::new(),
            containers: HashMap::new(),
            ports: HashMap::new(),
            events_tx,
            events_rx,
            node_drag: None,
            connection: None,
            selection_box: None,
            hovered_port: None,
            context_menu: None,
            feedback: None,
        };
        let ids: Vec<NodeId> = canvas.graph.nodes().map(|n| n.id).collect();
        for node_id in ids {
            canvas.sync_node(node_id);
        }
        canvas
    }

    /// Loads a workflow document.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Import`] if the input is not a workflow
    /// document.
    pub fn from_workflow_json(
        input: &str,
        config: &FactoryConfig,
    ) -> Result<Self, CanvasError> {
        let imported = Workflow::import(input, config.ports.compatibility_table()).map_err(|e| {
            CanvasError::Import {
                details: e.current_context().to_string(),
            }
        })?;
        Ok(Self::from_workflow(imported.workflow, config))
    }

    /// The canvas as a workflow document.
    #[must_use]
    pub fn to_workflow(&self) -> Workflow {
        let mut workflow = Workflow {
            id: self.id,
            metadata: self.metadata.clone(),
            graph: self.graph.clone(),
        };
        workflow.touch();
        workflow
    }

    /// Serializes the canvas as a workflow document.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Export`] if serialization fails.
    pub fn to_workflow_json(&self) -> Result<String, CanvasError> {
        let json = self
            .to_workflow()
            .to_json()
            .map_err(|e| CanvasError::Export {
                details: e.current_context().to_string(),
            })?;
        Ok(json)
    }

    #[must_use]
    pub fn graph(&self) -> &WorkflowGraph {
        &self.graph
    }

    #[must_use]
    pub fn metadata(&self) -> &WorkflowMetadata {
        &self.metadata
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.metadata.name = name.into();
    }

    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    #[must_use]
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Outcome of the last connection attempt.
    #[must_use]
    pub fn feedback(&self) -> Option<&ConnectionFeedback> {
        self.feedback.as_ref()
    }

    #[must_use]
    pub fn hovered_port(&self) -> Option<(NodeId, &str)> {
        self.hovered_port
            .as_ref()
            .map(|(node_id, port_id)| (*node_id, port_id.as_str()))
    }

    /// The pending context-menu request, if any.
    pub fn take_context_menu(&mut self) -> Option<(NodeId, Point)> {
        self.context_menu.take()
    }

    /// A sender for hosts that produce canvas events themselves.
    #[must_use]
    pub fn event_sender(&self) -> mpsc::Sender<CanvasEvent> {
        self.events_tx.clone()
    }

    // Node lifecycle

    /// Places a node with registry defaults. `position` is in canvas space.
    #[instrument(skip(self))]
    pub fn add_node(&mut self, node_type: NodeType, position: Option<Position>) -> NodeId {
        let node_id = self.graph.place_node(node_type, position);
        self.sync_node(node_id);
        self.refresh_drop_targets();
        node_id
    }

    /// Places a node by type name.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownNodeType`] if no such type exists.
    pub fn add_node_named(
        &mut self,
        name: &str,
        position: Option<Position>,
    ) -> Result<NodeId, RegistryError> {
        let node_type: NodeType = name.parse()?;
        Ok(self.add_node(node_type, position))
    }

    /// Deletes a node and its edges, cancelling any gesture that targets it.
    #[instrument(skip(self, node_id), fields(node_id = %node_id))]
    pub fn remove_node(&mut self, node_id: NodeId) -> Option<NodeInstance> {
        let neighbours = self.neighbours(node_id);
        let node = self.graph.remove_node(node_id)?;

        self.containers.remove(&node_id);
        self.ports.retain(|key, _| key.node_id != node_id);
        self.selection.remove(node_id);
        if self.node_drag.as_ref().is_some_and(|d| d.node_id == node_id) {
            debug!("node drag cancelled, its node was removed");
            self.cancel_node_drag();
        } else if let Some(drag) = &mut self.node_drag {
            drag.origins.retain(|(id, _)| *id != node_id);
        }
        if self
            .connection
            .as_ref()
            .is_some_and(|c| c.source.node_id == node_id)
        {
            debug!("connection drag cancelled, its node was removed");
            self.cancel_connection();
        }
        if self.hovered_port.as_ref().is_some_and(|(id, _)| *id == node_id) {
            self.hovered_port = None;
        }
        if self.context_menu.is_some_and(|(id, _)| id == node_id) {
            self.context_menu = None;
        }

        for neighbour in neighbours {
            self.sync_node(neighbour);
        }
        self.refresh_outlines();
        self.refresh_drop_targets();
        Some(node)
    }

    /// Replaces a node's data, regenerating its ports.
    ///
    /// Returns the edges that were removed because their port disappeared or
    /// changed type.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NodeNotFound`] if the node does not exist.
    #[instrument(skip(self, node_id, data), fields(node_id = %node_id))]
    pub fn reconfigure_node(
        &mut self,
        node_id: NodeId,
        data: JsonValue,
    ) -> Result<Vec<Edge>, GraphError> {
        let removed = self.graph.reconfigure_node(node_id, data)?;
        self.sync_node(node_id);
        for edge in &removed {
            self.sync_node(edge.source.node_id);
            self.sync_node(edge.target.node_id);
        }
        let orphaned = self
            .connection
            .as_ref()
            .is_some_and(|drag| !self.ports.contains_key(&drag.source));
        if orphaned {
            debug!("connection drag cancelled, its port was removed");
            self.cancel_connection();
        }
        self.refresh_drop_targets();
        Ok(removed)
    }

    /// Removes an edge.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::EdgeNotFound`] if the edge does not exist.
    pub fn disconnect(&mut self, edge_id: EdgeId) -> Result<Edge, GraphError> {
        let edge = self.graph.disconnect(edge_id)?;
        self.sync_node(edge.source.node_id);
        self.sync_node(edge.target.node_id);
        self.refresh_drop_targets();
        Ok(edge)
    }

    /// Disables or re-enables interaction with a node.
    pub fn set_node_disabled(&mut self, node_id: NodeId, disabled: bool) {
        let Some(container) = self.containers.get_mut(&node_id) else {
            warn!(%node_id, "cannot disable unknown node");
            return;
        };
        container.set_disabled(disabled);
        for (key, handle) in &mut self.ports {
            if key.node_id == node_id {
                handle.set_disabled(disabled);
            }
        }
        if disabled {
            if self.node_drag.as_ref().is_some_and(|d| d.node_id == node_id) {
                self.cancel_node_drag();
            }
            if self
                .connection
                .as_ref()
                .is_some_and(|c| c.source.node_id == node_id)
            {
                self.cancel_connection();
            }
        }
    }

    /// Records execution status reported by a runner.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NodeNotFound`] if the node does not exist.
    pub fn apply_status(
        &mut self,
        node_id: NodeId,
        status: NodeStatus,
        progress: Option<f64>,
    ) -> Result<(), GraphError> {
        let mut update = StatusUpdate::new(node_id, status);
        if let Some(progress) = progress {
            update = update.with_progress(progress);
        }
        self.graph.apply_status(&update)?;
        self.sync_node(node_id);
        Ok(())
    }

    /// Recomputes validation findings on every node.
    ///
    /// Returns the number of findings.
    pub fn validate(&mut self) -> usize {
        let total = self.graph.validate();
        let ids: Vec<NodeId> = self.graph.nodes().map(|n| n.id).collect();
        for node_id in ids {
            self.sync_node(node_id);
        }
        total
    }

    // Pointer routing. All points arrive in screen space.

    pub fn node_pointer_down(&mut self, node_id: NodeId, target: HitTarget, event: PointerEvent) {
        let event = self.to_canvas(event);
        match self.containers.get_mut(&node_id) {
            Some(container) => container.pointer_down(target, &event, &mut self.events_tx),
            None => warn!(%node_id, "pointer down on unknown node"),
        }
        self.process_events();
    }

    pub fn node_click(&mut self, node_id: NodeId, target: HitTarget, event: PointerEvent) {
        let event = self.to_canvas(event);
        match self.containers.get_mut(&node_id) {
            Some(container) => container.click(target, &event, &mut self.events_tx),
            None => warn!(%node_id, "click on unknown node"),
        }
        self.process_events();
    }

    pub fn node_context_menu(&mut self, node_id: NodeId, event: PointerEvent) {
        let event = self.to_canvas(event);
        match self.containers.get_mut(&node_id) {
            Some(container) => container.context_menu(&event, &mut self.events_tx),
            None => warn!(%node_id, "context menu on unknown node"),
        }
        self.process_events();
    }

    pub fn port_pointer_down(&mut self, port: &PortKey, event: PointerEvent) {
        let event = self.to_canvas(event);
        match self.ports.get_mut(port) {
            Some(handle) => {
                handle.pointer_down(&event, &mut self.events_tx);
            }
            None => warn!(node_id = %port.node_id, port_id = %port.port_id, "pointer down on unknown port"),
        }
        self.process_events();
    }

    pub fn port_pointer_enter(&mut self, port: &PortKey) {
        let connection_active = self.connection.is_some();
        if let Some(handle) = self.ports.get_mut(port) {
            handle.pointer_enter(connection_active, &mut self.events_tx);
        }
        self.process_events();
    }

    pub fn port_pointer_leave(&mut self, port: &PortKey) {
        if let Some(handle) = self.ports.get_mut(port) {
            handle.pointer_leave(&mut self.events_tx);
        }
        self.process_events();
    }

    pub fn port_pointer_up(&mut self, port: &PortKey) {
        if let Some(handle) = self.ports.get_mut(port) {
            handle.pointer_up(&mut self.events_tx);
        }
        self.process_events();
    }

    /// Moves keyboard focus onto `port`, or clears it with `None`.
    pub fn focus_port(&mut self, port: Option<&PortKey>) {
        for (key, handle) in &mut self.ports {
            handle.set_focused(Some(key) == port);
        }
    }

    pub fn port_key_down(&mut self, port: &PortKey, key: Key) {
        if key == Key::Escape {
            self.cancel_connection();
            return;
        }
        if let Some(handle) = self.ports.get_mut(port) {
            handle.key_down(key, &mut self.events_tx);
        }
        self.process_events();
    }

    /// Pointer motion anywhere on the canvas.
    pub fn pointer_move(&mut self, event: PointerEvent) {
        let event = self.to_canvas(event);
        for container in self.containers.values_mut() {
            if container.mode() != InteractionMode::Idle {
                container.pointer_move(&event, &mut self.events_tx);
            }
        }
        if let Some(connection) = &mut self.connection {
            connection.pointer = event.position;
        }
        self.process_events();
    }

    /// Pointer release anywhere on the canvas.
    ///
    /// Ends node gestures. A connection drag still active at this point was
    /// not dropped on a port and is abandoned.
    pub fn pointer_up(&mut self, event: PointerEvent) {
        let event = self.to_canvas(event);
        for container in self.containers.values_mut() {
            if container.mode() != InteractionMode::Idle {
                container.pointer_up(&event, &mut self.events_tx);
            }
        }
        self.process_events();
        if self.connection.is_some() {
            debug!("connection released over empty canvas");
            self.cancel_connection();
        }
    }

    /// Applies every queued event. Returns how many were handled.
    pub fn process_events(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply_event(event);
            handled += 1;
        }
        handled
    }

    fn apply_event(&mut self, event: CanvasEvent) {
        let node_id = event.node_id();
        if !self.graph.contains_node(node_id) {
            warn!(%node_id, ?event, "ignoring event for a node that no longer exists");
            return;
        }
        match event {
            CanvasEvent::Selected { node_id, multi } => {
                self.selection.select(node_id, multi);
                self.refresh_outlines();
            }
            CanvasEvent::ContextMenu { node_id, pointer } => {
                self.context_menu = Some((node_id, pointer));
            }
            CanvasEvent::DragStarted { node_id, pointer } => self.begin_node_drag(node_id, pointer),
            CanvasEvent::DragMoved { node_id, pointer } => {
                if let Some(drag) = &mut self.node_drag
                    && drag.node_id == node_id
                {
                    drag.current = pointer;
                }
            }
            CanvasEvent::DragEnded { node_id, pointer } => self.commit_node_drag(node_id, pointer),
            CanvasEvent::Resized { node_id, size } => self.commit_resize(node_id, size),
            CanvasEvent::PortDragStarted {
                node_id,
                port_id,
                direction,
                pointer,
            } => self.begin_connection(PortKey::new(node_id, direction, port_id), pointer),
            CanvasEvent::PortDropped {
                node_id,
                port_id,
                direction,
            } => self.finish_connection(&PortKey::new(node_id, direction, port_id)),
            CanvasEvent::PortHovered { node_id, port_id } => {
                self.hovered_port = port_id.map(|port_id| (node_id, port_id));
            }
        }
    }

    fn begin_node_drag(&mut self, node_id: NodeId, pointer: Point) {
        if !self.selection.contains(node_id) {
            self.selection.select(node_id, false);
            self.refresh_outlines();
        }
        let origins = self
            .selection
            .iter()
            .filter(|id| self.containers.get(id).is_some_and(|c| !c.is_disabled()))
            .filter_map(|id| self.graph.get_node(id).map(|n| (id, n.position)))
            .collect();
        self.node_drag = Some(NodeDrag {
            node_id,
            start: pointer,
            current: pointer,
            origins,
        });
    }

    fn commit_node_drag(&mut self, node_id: NodeId, pointer: Point) {
        let Some(mut drag) = self.node_drag.take() else {
            return;
        };
        if drag.node_id != node_id {
            warn!(%node_id, dragging = %drag.node_id, "drag end for a different node");
            self.node_drag = Some(drag);
            return;
        }
        drag.current = pointer;
        let delta = drag.delta();
        for (id, origin) in drag.origins {
            let mut position = origin + delta;
            if self.config.snap_to_grid {
                position = position.snapped(self.config.grid_size);
            }
            if self.graph.move_node(id, position).is_ok() {
                self.sync_node(id);
            }
        }
        debug!(%node_id, dx = delta.x, dy = delta.y, "node drag committed");
    }

    fn cancel_node_drag(&mut self) {
        if let Some(drag) = self.node_drag.take()
            && let Some(container) = self.containers.get_mut(&drag.node_id)
        {
            container.cancel_gesture();
        }
    }

    fn commit_resize(&mut self, node_id: NodeId, size: Size) {
        match self.graph.resize_node(node_id, size) {
            Ok(stored) => {
                debug!(%node_id, width = stored.width, height = stored.height, "node resized");
                self.sync_node(node_id);
            }
            Err(e) => warn!(%node_id, error = %e.current_context(), "resize not applied"),
        }
    }

    fn begin_connection(&mut self, source: PortKey, pointer: Point) {
        if let Some(previous) = self.connection.take()
            && previous.source != source
            && let Some(handle) = self.ports.get_mut(&previous.source)
        {
            handle.end_drag();
        }
        self.feedback = None;
        self.connection = Some(ConnectionDrag { source, pointer });
        self.refresh_drop_targets();
    }

    fn finish_connection(&mut self, target: &PortKey) {
        let Some(drag) = self.connection.take() else {
            return;
        };
        self.clear_drop_targets();
        if &drag.source == target {
            return;
        }
        match self
            .graph
            .connect(&drag.source.port_ref(), &target.port_ref())
        {
            Ok(edge_id) => {
                self.sync_node(drag.source.node_id);
                self.sync_node(target.node_id);
                self.feedback = Some(ConnectionFeedback::Connected { edge_id });
            }
            Err(report) => {
                let reason = report.current_context().clone();
                debug!(%reason, "connection rejected");
                self.feedback = Some(ConnectionFeedback::Rejected { reason });
            }
        }
    }

    fn cancel_connection(&mut self) {
        if self.connection.take().is_some() {
            self.clear_drop_targets();
        }
    }

    /// Recomputes which ports would accept the connection being dragged.
    fn refresh_drop_targets(&mut self) {
        let Some(drag) = &self.connection else {
            return;
        };
        let from = drag.source.port_ref();
        for (key, handle) in &mut self.ports {
            let valid =
                key != &drag.source && self.graph.check_connection(&from, &key.port_ref()).is_ok();
            handle.set_valid_drop_target(valid);
        }
    }

    fn clear_drop_targets(&mut self) {
        for handle in self.ports.values_mut() {
            handle.end_drag();
        }
    }

    fn refresh_outlines(&mut self) {
        for (node_id, container) in &mut self.containers {
            container.set_outline(self.selection.outline_for(*node_id));
        }
    }

    fn neighbours(&self, node_id: NodeId) -> Vec<NodeId> {
        self.graph
            .edges()
            .filter(|e| e.touches_node(node_id))
            .flat_map(|e| [e.source.node_id, e.target.node_id])
            .filter(|id| *id != node_id)
            .collect()
    }

    /// Brings the container and port handles of a node in line with the graph.
    fn sync_node(&mut self, node_id: NodeId) {
        let Some(node) = self.graph.get_node(node_id) else {
            return;
        };
        let container = self
            .containers
            .entry(node_id)
            .or_insert_with(|| NodeContainer::new(node, self.graph.min_node_size()));
        container.sync(node);
        container.set_outline(self.selection.outline_for(node_id));
        let disabled = container.is_disabled();

        self.ports.retain(|key, _| {
            key.node_id != node_id
                || match key.direction {
                    PortDirection::Input => node.input_port(&key.port_id).is_some(),
                    PortDirection::Output => node.output_port(&key.port_id).is_some(),
                }
        });
        for (direction, ports) in [
            (PortDirection::Input, &node.inputs),
            (PortDirection::Output, &node.outputs),
        ] {
            for (index, port) in ports.iter().enumerate() {
                let key = PortKey::new(node_id, direction, port.id.clone());
                let handle = self.ports.entry(key).or_insert_with(|| {
                    let mut handle = PortHandle::new(node_id, port);
                    handle.set_disabled(disabled);
                    handle
                });
                handle.sync(port);
                handle.set_anchor(port_anchor(node.position, node.size, direction, index));
            }
        }
    }

    fn live_position(&self, node: &NodeInstance) -> Position {
        match &self.node_drag {
            Some(drag) if drag.origins.iter().any(|(id, _)| *id == node.id) => {
                node.position + drag.delta()
            }
            _ => node.position,
        }
    }

    fn to_canvas(&self, event: PointerEvent) -> PointerEvent {
        event.relocated(self.viewport.screen_to_canvas(event.position))
    }

    // Box selection

    /// Starts a rubber-band selection. Held multi-select modifiers make it
    /// additive.
    pub fn begin_box_selection(&mut self, event: PointerEvent) {
        let start = self.viewport.screen_to_canvas(event.position);
        self.selection_box = Some(SelectionBox::new(start, event.modifiers.multi_select()));
    }

    pub fn update_box_selection(&mut self, event: PointerEvent) {
        let end = self.viewport.screen_to_canvas(event.position);
        if let Some(selection_box) = &mut self.selection_box {
            selection_box.end = end;
        }
    }

    /// Nodes the box would select if released now.
    #[must_use]
    pub fn box_selection_preview(&self) -> Vec<NodeId> {
        self.selection_box
            .map(|b| b.hits(&self.graph))
            .unwrap_or_default()
    }

    /// Finishes the rubber-band selection and returns the nodes it hit.
    pub fn end_box_selection(&mut self) -> Vec<NodeId> {
        let Some(selection_box) = self.selection_box.take() else {
            return Vec::new();
        };
        let hits = selection_box.hits(&self.graph);
        if selection_box.additive {
            self.selection.extend(hits.iter().copied());
        } else {
            self.selection.replace(hits.iter().copied());
        }
        self.refresh_outlines();
        hits
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.refresh_outlines();
    }

    // Viewport

    /// Pans by a screen-space delta.
    pub fn pan_by(&mut self, delta: Point) {
        self.viewport.pan_by(delta);
    }

    /// Zooms by `factor` around a screen point, within the configured limits.
    pub fn zoom_at(&mut self, screen_point: Point, factor: f64) {
        self.viewport.zoom_at(screen_point, factor);
    }

    #[must_use]
    pub fn screen_to_canvas(&self, screen: Point) -> Point {
        self.viewport.screen_to_canvas(screen)
    }

    // Views

    #[must_use]
    pub fn node_view(&self, node_id: NodeId) -> Option<NodeView> {
        let node = self.graph.get_node(node_id)?;
        let container = self.containers.get(&node_id)?;
        Some(container.view(self.live_position(node)))
    }

    /// Views of all nodes, in graph order.
    #[must_use]
    pub fn node_views(&self) -> Vec<NodeView> {
        self.graph
            .nodes()
            .filter_map(|node| self.node_view(node.id))
            .collect()
    }

    #[must_use]
    pub fn port_view(&self, port: &PortKey) -> Option<PortView> {
        self.ports.get(port).map(PortHandle::view)
    }

    /// Views of a node's ports, inputs first.
    #[must_use]
    pub fn port_views(&self, node_id: NodeId) -> Vec<PortView> {
        let Some(node) = self.graph.get_node(node_id) else {
            return Vec::new();
        };
        node.inputs
            .iter()
            .map(|p| PortKey::new(node_id, PortDirection::Input, p.id.clone()))
            .chain(
                node.outputs
                    .iter()
                    .map(|p| PortKey::new(node_id, PortDirection::Output, p.id.clone())),
            )
            .filter_map(|key| self.port_view(&key))
            .collect()
    }

    #[must_use]
    pub fn connection_preview(&self) -> Option<ConnectionPreview> {
        let drag = self.connection.as_ref()?;
        let from = self.ports.get(&drag.source)?.anchor();
        Some(ConnectionPreview {
            source: drag.source.clone(),
            from,
            to: drag.pointer,
        })
    }

    /// The rubber-band rectangle, normalized, in canvas space.
    #[must_use]
    pub fn selection_box(&self) -> Option<Rect> {
        self.selection_box.map(|b| b.rect().normalized())
    }
}

/// Where a port's connection line attaches: left edge for inputs, right edge
/// for outputs, stacked below the header.
fn port_anchor(position: Position, size: Size, direction: PortDirection, index: usize) -> Point {
    let x = match direction {
        PortDirection::Input => position.x,
        PortDirection::Output => position.x + size.width,
    };
    #[allow(clippy::cast_precision_loss)]
    let y = position.y + HEADER_HEIGHT + PORT_SPACING * (index as f64 + 0.5);
    Point::new(x, y)
}
