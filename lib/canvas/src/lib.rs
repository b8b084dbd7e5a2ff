//! Interaction engine for the agent-factory canvas.
//!
//! The pieces, bottom-up:
//!
//! - **Port handles**: hover, drag and drop-target state of one port
//! - **Node containers**: selection, dragging and resizing of one node
//! - **Indicators**: status dot, validation badge, progress bar, outline
//! - **Canvas**: owns the graph, routes input and applies reported events
//!
//! Primitives report gestures as [`CanvasEvent`]s over a single channel and
//! never touch the graph. The [`Canvas`] is the only writer.

pub mod config;
pub mod container;
pub mod coordinator;
pub mod error;
pub mod event;
pub mod indicator;
pub mod port_handle;
pub mod selection;
pub mod viewport;

pub use config::{CanvasConfig, FactoryConfig, PortsConfig};
pub use container::{HitTarget, InteractionMode, NodeContainer, NodeView};
pub use coordinator::{Canvas, ConnectionFeedback, ConnectionPreview, PortKey};
pub use error::CanvasError;
pub use event::{CanvasEvent, EventSink, Key, Modifiers, PointerButton, PointerEvent};
pub use indicator::{ProgressBar, SelectionOutline, StatusDot, ValidationBadge};
pub use port_handle::{PortAffordance, PortHandle, PortView};
pub use selection::{Selection, SelectionBox};
pub use viewport::Viewport;
