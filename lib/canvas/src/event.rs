//! Pointer input and the events primitives report to the canvas.
//!
//! Primitives never call back into the canvas. They push a [`CanvasEvent`]
//! into an [`EventSink`] and the canvas drains the queue afterwards.

use agent_factory_core::{Point, Size};
use agent_factory_workflow::{NodeId, PortDirection};
use std::sync::mpsc;

/// Keyboard modifiers held during a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        ..Modifiers::NONE
    };

    /// Whether the modifiers ask to add to the selection instead of replacing it.
    #[must_use]
    pub const fn multi_select(self) -> bool {
        self.shift || self.ctrl || self.meta
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerButton {
    #[default]
    Primary,
    Secondary,
    Middle,
}

/// A pointer event as delivered by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub position: Point,
    pub button: PointerButton,
    pub modifiers: Modifiers,
}

impl PointerEvent {
    /// A primary-button event with no modifiers.
    #[must_use]
    pub const fn at(x: f64, y: f64) -> Self {
        Self {
            position: Point::new(x, y),
            button: PointerButton::Primary,
            modifiers: Modifiers::NONE,
        }
    }

    #[must_use]
    pub const fn with_button(mut self, button: PointerButton) -> Self {
        self.button = button;
        self
    }

    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Same event moved to `position`.
    #[must_use]
    pub const fn relocated(mut self, position: Point) -> Self {
        self.position = position;
        self
    }
}

/// Keys the canvas reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Space,
    Escape,
    Other,
}

/// Gestures reported by node containers and port handles.
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasEvent {
    Selected {
        node_id: NodeId,
        multi: bool,
    },
    ContextMenu {
        node_id: NodeId,
        pointer: Point,
    },
    DragStarted {
        node_id: NodeId,
        pointer: Point,
    },
    /// Live pointer while a node drag is in progress.
    DragMoved {
        node_id: NodeId,
        pointer: Point,
    },
    DragEnded {
        node_id: NodeId,
        pointer: Point,
    },
    Resized {
        node_id: NodeId,
        size: Size,
    },
    PortDragStarted {
        node_id: NodeId,
        port_id: String,
        direction: PortDirection,
        pointer: Point,
    },
    PortDropped {
        node_id: NodeId,
        port_id: String,
        direction: PortDirection,
    },
    /// `port_id` is `None` when the pointer left the port.
    PortHovered {
        node_id: NodeId,
        port_id: Option<String>,
    },
}

impl CanvasEvent {
    /// The node the event is about.
    #[must_use]
    pub fn node_id(&self) -> NodeId {
        match self {
            Self::Selected { node_id, .. }
            | Self::ContextMenu { node_id, .. }
            | Self::DragStarted { node_id, .. }
            | Self::DragMoved { node_id, .. }
            | Self::DragEnded { node_id, .. }
            | Self::Resized { node_id, .. }
            | Self::PortDragStarted { node_id, .. }
            | Self::PortDropped { node_id, .. }
            | Self::PortHovered { node_id, .. } => *node_id,
        }
    }
}

/// Where primitives put their events.
pub trait EventSink {
    fn emit(&mut self, event: CanvasEvent);
}

impl EventSink for Vec<CanvasEvent> {
    fn emit(&mut self, event: CanvasEvent) {
        self.push(event);
    }
}

impl EventSink for mpsc::Sender<CanvasEvent> {
    fn emit(&mut self, event: CanvasEvent) {
        if let Err(e) = self.send(event) {
            tracing::warn!(node_id = %e.0.node_id(), "canvas event dropped, receiver is gone");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_factory_workflow::NodeType;

    #[test]
    fn multi_select_modifiers() {
        assert!(!Modifiers::NONE.multi_select());
        assert!(Modifiers::SHIFT.multi_select());
        let alt_only = Modifiers {
            alt: true,
            ..Modifiers::NONE
        };
        assert!(!alt_only.multi_select());
    }

    #[test]
    fn sender_sink_delivers_in_order() {
        let (mut tx, rx) = mpsc::channel();
        let node_id = NodeId::generate(NodeType::Agent);
        tx.emit(CanvasEvent::Selected {
            node_id,
            multi: false,
        });
        tx.emit(CanvasEvent::PortHovered {
            node_id,
            port_id: None,
        });
        let received: Vec<_> = rx.try_iter().collect();
        assert_eq!(received.len(), 2);
        assert!(matches!(received[0], CanvasEvent::Selected { .. }));
        assert_eq!(received[1].node_id(), node_id);
    }
}
