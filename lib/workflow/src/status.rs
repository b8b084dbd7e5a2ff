//! Execution status as seen by the editor.
//!
//! The editor never decides transitions; it receives them from whatever runs
//! the workflow and renders them. Any status may follow any other.

use crate::node::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Execution status of one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    /// Not run yet, or reset.
    #[default]
    Idle,
    Running,
    Success,
    Error,
    Warning,
}

impl NodeStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Success => "success",
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }

    /// Whether the status dot is drawn at all.
    #[must_use]
    pub const fn is_visible(self) -> bool {
        !matches!(self, Self::Idle)
    }

    /// Whether a progress value means anything in this status.
    #[must_use]
    pub const fn tracks_progress(self) -> bool {
        matches!(self, Self::Running)
    }

    /// Dot color for the status.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Idle => "#6b7280",
            Self::Running => "#3b82f6",
            Self::Success => "#22c55e",
            Self::Error => "#ef4444",
            Self::Warning => "#f59e0b",
        }
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clamps a raw progress value into `0..=100`.
#[must_use]
pub fn clamp_progress(progress: f64) -> u8 {
    if progress.is_nan() {
        return 0;
    }
    // In range after the clamp.
    progress.clamp(0.0, 100.0).round() as u8
}

/// A status change reported by an execution backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub node_id: NodeId,
    pub status: NodeStatus,
    /// Raw progress, only kept while `status` is running.
    #[serde(default)]
    pub progress: Option<f64>,
}

impl StatusUpdate {
    #[must_use]
    pub fn new(node_id: NodeId, status: NodeStatus) -> Self {
        Self {
            node_id,
            status,
            progress: None,
        }
    }

    #[must_use]
    pub fn with_progress(mut self, progress: f64) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Progress to store on the node: dropped outside `running`, clamped inside.
    #[must_use]
    pub fn effective_progress(&self) -> Option<u8> {
        if !self.status.tracks_progress() {
            return None;
        }
        self.progress.map(clamp_progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::NodeType;

    #[test]
    fn idle_is_default_and_hidden() {
        assert_eq!(NodeStatus::default(), NodeStatus::Idle);
        assert!(!NodeStatus::Idle.is_visible());
        assert!(NodeStatus::Warning.is_visible());
    }

    #[test]
    fn progress_is_clamped() {
        assert_eq!(clamp_progress(-5.0), 0);
        assert_eq!(clamp_progress(42.4), 42);
        assert_eq!(clamp_progress(250.0), 100);
        assert_eq!(clamp_progress(f64::NAN), 0);
    }

    #[test]
    fn progress_only_kept_while_running() {
        let id = NodeId::generate(NodeType::Agent);
        let running = StatusUpdate::new(id, NodeStatus::Running).with_progress(140.0);
        assert_eq!(running.effective_progress(), Some(100));
        let done = StatusUpdate::new(id, NodeStatus::Success).with_progress(50.0);
        assert_eq!(done.effective_progress(), None);
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&NodeStatus::Running).expect("serialize");
        assert_eq!(json, "\"running\"");
    }
}
