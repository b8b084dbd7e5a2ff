//! Node container: the interactive frame around one node.
//!
//! The container owns only transient gesture state. It never moves the node
//! itself: drags are reported as pointer locations and the canvas decides the
//! committed position. Resizes are computed here for live feedback and
//! reported once, on release.

use crate::event::{CanvasEvent, EventSink, PointerButton, PointerEvent};
use crate::indicator::{ProgressBar, SelectionOutline, StatusDot, ValidationBadge};
use agent_factory_core::{Point, Position, Size};
use agent_factory_workflow::{NodeId, NodeInstance, NodeStatus, NodeType};

/// Part of the container a pointer event landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    /// Header area used to move the node.
    DragHandle,
    /// Bottom-right corner grip.
    ResizeHandle,
    /// A port indicator; port gestures go to the port handle instead.
    Port,
    /// Anywhere else inside the frame.
    Body,
}

/// Current gesture. A container is never dragging and resizing at once.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum InteractionMode {
    #[default]
    Idle,
    Dragging {
        origin: Point,
    },
    Resizing {
        origin: Point,
        start: Size,
    },
}

/// Size a resize gesture would commit, bounded below by `min` on each axis.
#[must_use]
pub fn resize_candidate(start: Size, origin: Point, pointer: Point, min: Size) -> Size {
    let delta = pointer - origin;
    Size::new(
        (start.width + delta.x).max(min.width),
        (start.height + delta.y).max(min.height),
    )
}

/// Render inputs for one node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeView {
    pub node_id: NodeId,
    pub node_type: NodeType,
    pub label: String,
    pub icon: &'static str,
    pub color: &'static str,
    pub position: Position,
    /// Live size, including an in-progress resize.
    pub size: Size,
    pub status_dot: Option<StatusDot>,
    pub validation: Option<ValidationBadge>,
    pub progress: Option<ProgressBar>,
    pub outline: SelectionOutline,
    pub mode: InteractionMode,
    pub resizable: bool,
    pub disabled: bool,
}

#[derive(Debug, Clone)]
pub struct NodeContainer {
    node_id: NodeId,
    node_type: NodeType,
    label: String,
    size: Size,
    live_size: Size,
    min_size: Size,
    mode: InteractionMode,
    disabled: bool,
    outline: SelectionOutline,
    status: NodeStatus,
    progress: Option<u8>,
    errors: usize,
    warnings: usize,
}

impl NodeContainer {
    #[must_use]
    pub fn new(node: &NodeInstance, min_size: Size) -> Self {
        let mut container = Self {
            node_id: node.id,
            node_type: node.node_type,
            label: String::new(),
            size: node.size,
            live_size: node.size,
            min_size,
            mode: InteractionMode::Idle,
            disabled: false,
            outline: SelectionOutline::None,
            status: NodeStatus::Idle,
            progress: None,
            errors: 0,
            warnings: 0,
        };
        container.sync(node);
        container
    }

    #[must_use]
    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    #[must_use]
    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    #[must_use]
    pub fn live_size(&self) -> Size {
        self.live_size
    }

    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    #[must_use]
    pub fn is_resizable(&self) -> bool {
        self.node_type.metadata().resizable
    }

    /// Refreshes render inputs from the authoritative node.
    ///
    /// The size is only taken over when no gesture is running, so a resize in
    /// progress keeps its live feedback.
    pub fn sync(&mut self, node: &NodeInstance) {
        self.label = node.label().to_string();
        self.status = node.status;
        self.progress = node.progress;
        (self.errors, self.warnings) = node.finding_counts();
        self.size = node.size;
        if self.mode == InteractionMode::Idle {
            self.live_size = node.size;
        }
    }

    /// Disabling mid-gesture cancels the gesture.
    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
        if disabled {
            self.cancel_gesture();
        }
    }

    pub fn set_outline(&mut self, outline: SelectionOutline) {
        self.outline = outline;
    }

    /// A plain click selects the node.
    ///
    /// Clicks on the handles or on a port belong to those gestures and never
    /// select.
    pub fn click(&mut self, target: HitTarget, event: &PointerEvent, sink: &mut impl EventSink) {
        if self.disabled || target != HitTarget::Body {
            return;
        }
        sink.emit(CanvasEvent::Selected {
            node_id: self.node_id,
            multi: event.modifiers.multi_select(),
        });
    }

    pub fn context_menu(&mut self, event: &PointerEvent, sink: &mut impl EventSink) {
        if self.disabled {
            return;
        }
        sink.emit(CanvasEvent::ContextMenu {
            node_id: self.node_id,
            pointer: event.position,
        });
    }

    /// Starts a drag or resize depending on which handle was pressed.
    pub fn pointer_down(
        &mut self,
        target: HitTarget,
        event: &PointerEvent,
        sink: &mut impl EventSink,
    ) {
        if self.disabled
            || event.button != PointerButton::Primary
            || self.mode != InteractionMode::Idle
        {
            return;
        }
        match target {
            HitTarget::DragHandle => {
                self.mode = InteractionMode::Dragging {
                    origin: event.position,
                };
                sink.emit(CanvasEvent::DragStarted {
                    node_id: self.node_id,
                    pointer: event.position,
                });
            }
            HitTarget::ResizeHandle if self.is_resizable() => {
                self.mode = InteractionMode::Resizing {
                    origin: event.position,
                    start: self.live_size,
                };
            }
            _ => {}
        }
    }

    pub fn pointer_move(&mut self, event: &PointerEvent, sink: &mut impl EventSink) {
        match self.mode {
            InteractionMode::Idle => {}
            InteractionMode::Dragging { .. } => sink.emit(CanvasEvent::DragMoved {
                node_id: self.node_id,
                pointer: event.position,
            }),
            InteractionMode::Resizing { origin, start } => {
                self.live_size = resize_candidate(start, origin, event.position, self.min_size);
            }
        }
    }

    /// Ends the current gesture and reports its result.
    pub fn pointer_up(&mut self, event: &PointerEvent, sink: &mut impl EventSink) {
        match std::mem::take(&mut self.mode) {
            InteractionMode::Idle => {}
            InteractionMode::Dragging { .. } => sink.emit(CanvasEvent::DragEnded {
                node_id: self.node_id,
                pointer: event.position,
            }),
            InteractionMode::Resizing { origin, start } => {
                let size = resize_candidate(start, origin, event.position, self.min_size);
                self.live_size = size;
                sink.emit(CanvasEvent::Resized {
                    node_id: self.node_id,
                    size,
                });
            }
        }
    }

    /// Drops the current gesture without reporting anything.
    pub fn cancel_gesture(&mut self) {
        self.mode = InteractionMode::Idle;
        self.live_size = self.size;
    }

    #[must_use]
    pub fn view(&self, position: Position) -> NodeView {
        let meta = self.node_type.metadata();
        NodeView {
            node_id: self.node_id,
            node_type: self.node_type,
            label: self.label.clone(),
            icon: meta.icon,
            color: meta.color,
            position,
            size: self.live_size,
            status_dot: StatusDot::for_status(self.status),
            validation: ValidationBadge::from_counts(self.errors, self.warnings),
            progress: ProgressBar::for_node(self.status, self.progress.map(f64::from)),
            outline: self.outline,
            mode: self.mode,
            resizable: meta.resizable,
            disabled: self.disabled,
        }
    }
}
