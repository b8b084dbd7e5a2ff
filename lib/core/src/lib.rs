//! Core types shared by the Agent Factory crates.
//!
//! This crate holds the pieces every other layer agrees on: strongly typed
//! identifiers, canvas geometry, and the rootcause-backed `Result` alias.

pub mod error;
pub mod geometry;
pub mod id;

pub use error::Result;
pub use geometry::{Point, Position, Rect, Size, is_node_in_selection};
pub use id::{EdgeId, ParseIdError, WorkflowId};
