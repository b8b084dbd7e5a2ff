//! Error types for the canvas crate.
//!
//! Lower layers report their own errors (`RegistryError`, `GraphError`,
//! `WorkflowError`); the variants here name the canvas-level operation that
//! failed so hosts get a message they can show as is.

use std::fmt;

/// Errors from canvas setup and document exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanvasError {
    /// Configuration could not be loaded.
    Config { details: String },
    /// A workflow document could not be loaded onto the canvas.
    Import { details: String },
    /// The canvas could not be written out as a workflow document.
    Export { details: String },
}

impl fmt::Display for CanvasError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { details } => write!(f, "invalid canvas configuration: {details}"),
            Self::Import { details } => write!(f, "failed to import workflow: {details}"),
            Self::Export { details } => write!(f, "failed to export workflow: {details}"),
        }
    }
}

impl std::error::Error for CanvasError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_details() {
        let err = CanvasError::Config {
            details: "grid_size must be a number".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid canvas configuration: grid_size must be a number"
        );
    }
}
