//! One interactive connection point.
//!
//! A handle tracks hover, drag and drop-target state for a single port and
//! reports gestures as [`CanvasEvent`]s. It owns no graph state: whether it is
//! a valid drop target is handed in by the canvas, never computed here.

use crate::event::{CanvasEvent, EventSink, Key, PointerButton, PointerEvent};
use agent_factory_core::Point;
use agent_factory_workflow::{NodeId, Port, PortDataType, PortDirection};

/// How the port indicator is drawn right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortAffordance {
    Idle,
    Hovered,
    /// This port is the source of the connection being dragged.
    Dragging,
    /// A connection drag is over this port and the canvas accepts the drop.
    ValidTarget,
    /// A connection drag is over this port and the drop would be rejected.
    InvalidTarget,
    Disabled,
}

/// Render inputs for one port.
#[derive(Debug, Clone, PartialEq)]
pub struct PortView {
    pub node_id: NodeId,
    pub port_id: String,
    pub direction: PortDirection,
    pub label: String,
    pub data_type: PortDataType,
    pub badge: &'static str,
    pub color: &'static str,
    pub affordance: PortAffordance,
    pub connected: bool,
    pub anchor: Point,
    pub focusable: bool,
    pub aria_label: String,
}

#[derive(Debug, Clone)]
pub struct PortHandle {
    node_id: NodeId,
    port: Port,
    anchor: Point,
    hovered: bool,
    dragging: bool,
    drag_over: bool,
    focused: bool,
    disabled: bool,
    valid_drop_target: bool,
}

impl PortHandle {
    #[must_use]
    pub fn new(node_id: NodeId, port: &Port) -> Self {
        Self {
            node_id,
            port: port.clone(),
            anchor: Point::default(),
            hovered: false,
            dragging: false,
            drag_over: false,
            focused: false,
            disabled: false,
            valid_drop_target: false,
        }
    }

    #[must_use]
    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    #[must_use]
    pub fn port_id(&self) -> &str {
        &self.port.id
    }

    #[must_use]
    pub fn direction(&self) -> PortDirection {
        self.port.direction
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    #[must_use]
    pub fn is_drag_over(&self) -> bool {
        self.drag_over
    }

    #[must_use]
    pub fn anchor(&self) -> Point {
        self.anchor
    }

    /// Canvas-space point connection lines attach to.
    pub fn set_anchor(&mut self, anchor: Point) {
        self.anchor = anchor;
    }

    /// Refreshes label, type and `connected` from the authoritative port.
    pub fn sync(&mut self, port: &Port) {
        self.port = port.clone();
    }

    /// Disabling a port abandons any drag it was part of.
    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
        if disabled {
            self.dragging = false;
            self.drag_over = false;
        }
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    pub fn set_valid_drop_target(&mut self, valid: bool) {
        self.valid_drop_target = valid;
    }

    /// Starts a connection drag from this port.
    ///
    /// Returns whether the drag started.
    pub fn pointer_down(&mut self, event: &PointerEvent, sink: &mut impl EventSink) -> bool {
        if self.disabled || event.button != PointerButton::Primary {
            return false;
        }
        self.start_drag(event.position, sink);
        true
    }

    /// Keyboard equivalent of [`PortHandle::pointer_down`], anchored at the port.
    pub fn key_down(&mut self, key: Key, sink: &mut impl EventSink) -> bool {
        if !self.focused || self.disabled || !matches!(key, Key::Enter | Key::Space) {
            return false;
        }
        self.start_drag(self.anchor, sink);
        true
    }

    fn start_drag(&mut self, pointer: Point, sink: &mut impl EventSink) {
        self.dragging = true;
        sink.emit(CanvasEvent::PortDragStarted {
            node_id: self.node_id,
            port_id: self.port.id.clone(),
            direction: self.port.direction,
            pointer,
        });
    }

    /// The pointer entered the indicator.
    ///
    /// While a connection drag is active every port other than its source
    /// becomes a drop candidate.
    pub fn pointer_enter(&mut self, connection_active: bool, sink: &mut impl EventSink) {
        self.hovered = true;
        self.drag_over = connection_active && !self.dragging && !self.disabled;
        sink.emit(CanvasEvent::PortHovered {
            node_id: self.node_id,
            port_id: Some(self.port.id.clone()),
        });
    }

    pub fn pointer_leave(&mut self, sink: &mut impl EventSink) {
        self.hovered = false;
        self.drag_over = false;
        sink.emit(CanvasEvent::PortHovered {
            node_id: self.node_id,
            port_id: None,
        });
    }

    /// A pointer was released over this port.
    pub fn pointer_up(&mut self, sink: &mut impl EventSink) {
        let was_disabled = self.disabled;
        self.end_drag();
        if was_disabled {
            return;
        }
        sink.emit(CanvasEvent::PortDropped {
            node_id: self.node_id,
            port_id: self.port.id.clone(),
            direction: self.port.direction,
        });
    }

    /// Clears drag state once the connection gesture is over.
    pub fn end_drag(&mut self) {
        self.dragging = false;
        self.drag_over = false;
        self.valid_drop_target = false;
    }

    #[must_use]
    pub fn affordance(&self) -> PortAffordance {
        if self.disabled {
            PortAffordance::Disabled
        } else if self.dragging {
            PortAffordance::Dragging
        } else if self.drag_over && self.valid_drop_target {
            PortAffordance::ValidTarget
        } else if self.drag_over {
            PortAffordance::InvalidTarget
        } else if self.hovered {
            PortAffordance::Hovered
        } else {
            PortAffordance::Idle
        }
    }

    #[must_use]
    pub fn view(&self) -> PortView {
        let data_type = self.port.data_type;
        let mut aria_label = format!(
            "{} {} port, type {}",
            self.port.label, self.port.direction, data_type
        );
        if self.port.connected {
            aria_label.push_str(", connected");
        }
        PortView {
            node_id: self.node_id,
            port_id: self.port.id.clone(),
            direction: self.port.direction,
            label: self.port.label.clone(),
            data_type,
            badge: data_type.badge(),
            color: data_type.color(),
            affordance: self.affordance(),
            connected: self.port.connected,
            anchor: self.anchor,
            focusable: !self.disabled,
            aria_label,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_factory_workflow::NodeType;

    fn handle() -> PortHandle {
        let node_id = NodeId::generate(NodeType::Agent);
        let port = Port::new("output", "Output", PortDirection::Output, PortDataType::Message);
        PortHandle::new(node_id, &port)
    }

    #[test]
    fn pointer_down_starts_drag() {
        let mut port = handle();
        let mut events = Vec::new();
        assert!(port.pointer_down(&PointerEvent::at(3.0, 4.0), &mut events));
        assert_eq!(port.affordance(), PortAffordance::Dragging);
        assert!(matches!(
            &events[0],
            CanvasEvent::PortDragStarted { port_id, direction: PortDirection::Output, pointer, .. }
                if port_id == "output" && *pointer == Point::new(3.0, 4.0)
        ));
    }

    #[test]
    fn secondary_button_does_not_start_drag() {
        let mut port = handle();
        let mut events = Vec::new();
        let event = PointerEvent::at(0.0, 0.0).with_button(PointerButton::Secondary);
        assert!(!port.pointer_down(&event, &mut events));
        assert!(events.is_empty());
    }

    #[test]
    fn keyboard_uses_the_same_path() {
        let mut port = handle();
        port.set_anchor(Point::new(10.0, 20.0));
        let mut events = Vec::new();
        assert!(!port.key_down(Key::Enter, &mut events));
        port.set_focused(true);
        assert!(!port.key_down(Key::Escape, &mut events));
        assert!(port.key_down(Key::Space, &mut events));
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            CanvasEvent::PortDragStarted { pointer, .. } if pointer == Point::new(10.0, 20.0)
        ));
    }

    #[test]
    fn drop_target_only_displays_validity() {
        let mut port = handle();
        let mut events = Vec::new();
        port.pointer_enter(true, &mut events);
        assert_eq!(port.affordance(), PortAffordance::InvalidTarget);
        port.set_valid_drop_target(true);
        assert_eq!(port.affordance(), PortAffordance::ValidTarget);
        port.pointer_leave(&mut events);
        assert_eq!(port.affordance(), PortAffordance::Idle);
        assert!(matches!(
            &events[1],
            CanvasEvent::PortHovered { port_id: None, .. }
        ));
    }

    #[test]
    fn hover_without_drag_is_plain_hover() {
        let mut port = handle();
        let mut events = Vec::new();
        port.pointer_enter(false, &mut events);
        assert_eq!(port.affordance(), PortAffordance::Hovered);
        assert!(matches!(
            &events[0],
            CanvasEvent::PortHovered { port_id: Some(id), .. } if id == "output"
        ));
    }

    #[test]
    fn disabled_port_never_drags_or_drops() {
        let mut port = handle();
        port.set_disabled(true);
        port.set_focused(true);
        let mut events = Vec::new();
        assert!(!port.pointer_down(&PointerEvent::at(0.0, 0.0), &mut events));
        assert!(!port.key_down(Key::Enter, &mut events));
        port.pointer_up(&mut events);
        assert!(events.is_empty());
        assert_eq!(port.affordance(), PortAffordance::Disabled);
        assert!(!port.view().focusable);
    }

    #[test]
    fn drop_emits_and_resets() {
        let mut port = handle();
        let mut events = Vec::new();
        port.pointer_enter(true, &mut events);
        port.pointer_up(&mut events);
        assert!(!port.is_drag_over());
        assert!(matches!(events.last(), Some(CanvasEvent::PortDropped { .. })));
    }

    #[test]
    fn view_reflects_port() {
        let mut port = handle();
        let mut synced = Port::new("output", "Reply", PortDirection::Output, PortDataType::Message);
        synced.connected = true;
        port.sync(&synced);
        let view = port.view();
        assert_eq!(view.label, "Reply");
        assert_eq!(view.badge, PortDataType::Message.badge());
        assert!(view.connected);
        assert!(view.aria_label.ends_with("connected"));
    }
}
