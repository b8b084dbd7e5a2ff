//! Small status decorations drawn on a node container.

use agent_factory_workflow::status::clamp_progress;
use agent_factory_workflow::{NodeStatus, Severity};

/// Corner dot showing execution status. Absent while idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusDot {
    pub status: NodeStatus,
    pub color: &'static str,
    /// Drawn as a spinner rather than a solid dot.
    pub spinner: bool,
}

impl StatusDot {
    #[must_use]
    pub fn for_status(status: NodeStatus) -> Option<Self> {
        status.is_visible().then(|| Self {
            status,
            color: status.color(),
            spinner: status == NodeStatus::Running,
        })
    }
}

/// Aggregate count of validation findings. Absent when there are none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationBadge {
    pub errors: usize,
    pub warnings: usize,
}

impl ValidationBadge {
    #[must_use]
    pub fn from_counts(errors: usize, warnings: usize) -> Option<Self> {
        (errors + warnings > 0).then_some(Self { errors, warnings })
    }

    /// The badge takes the color of its worst finding.
    #[must_use]
    pub fn severity(&self) -> Severity {
        if self.errors > 0 {
            Severity::Error
        } else {
            Severity::Warning
        }
    }

    #[must_use]
    pub fn label(&self) -> String {
        let plural = |n: usize, word: &str| {
            if n == 1 {
                format!("1 {word}")
            } else {
                format!("{n} {word}s")
            }
        };
        match (self.errors, self.warnings) {
            (0, w) => plural(w, "warning"),
            (e, 0) => plural(e, "error"),
            (e, w) => format!("{}, {}", plural(e, "error"), plural(w, "warning")),
        }
    }
}

/// Execution progress strip along the bottom of a running node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressBar {
    percent: u8,
}

impl ProgressBar {
    /// Only running nodes with a reported progress get a bar.
    #[must_use]
    pub fn for_node(status: NodeStatus, progress: Option<f64>) -> Option<Self> {
        if !status.tracks_progress() {
            return None;
        }
        progress.map(|p| Self {
            percent: clamp_progress(p),
        })
    }

    #[must_use]
    pub fn percent(&self) -> u8 {
        self.percent
    }

    /// Share of the container width to fill, in `0.0..=1.0`.
    #[must_use]
    pub fn fraction(&self) -> f64 {
        f64::from(self.percent) / 100.0
    }
}

/// Selection highlight around a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionOutline {
    #[default]
    None,
    /// Solid highlighted border of the primary selection.
    Primary,
    /// Dashed border of the other members of a multi-selection.
    Secondary,
}

impl SelectionOutline {
    #[must_use]
    pub fn is_dashed(self) -> bool {
        self == Self::Secondary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_dot_follows_run() {
        assert_eq!(StatusDot::for_status(NodeStatus::Idle), None);

        let running = StatusDot::for_status(NodeStatus::Running).expect("visible");
        assert!(running.spinner);

        let done = StatusDot::for_status(NodeStatus::Success).expect("visible");
        assert!(!done.spinner);
        assert_eq!(done.color, NodeStatus::Success.color());
    }

    #[test]
    fn badge_counts_separately() {
        assert_eq!(ValidationBadge::from_counts(0, 0), None);
        let badge = ValidationBadge::from_counts(2, 1).expect("findings");
        assert_eq!(badge.severity(), Severity::Error);
        assert_eq!(badge.label(), "2 errors, 1 warning");
        let warn = ValidationBadge::from_counts(0, 1).expect("findings");
        assert_eq!(warn.severity(), Severity::Warning);
        assert_eq!(warn.label(), "1 warning");
    }

    #[test]
    fn progress_bar_only_while_running() {
        assert_eq!(ProgressBar::for_node(NodeStatus::Success, Some(50.0)), None);
        assert_eq!(ProgressBar::for_node(NodeStatus::Running, None), None);
        let bar = ProgressBar::for_node(NodeStatus::Running, Some(140.0)).expect("bar");
        assert_eq!(bar.percent(), 100);
        let bar = ProgressBar::for_node(NodeStatus::Running, Some(25.0)).expect("bar");
        assert!((bar.fraction() - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn only_secondary_outline_is_dashed() {
        assert!(SelectionOutline::Secondary.is_dashed());
        assert!(!SelectionOutline::Primary.is_dashed());
        assert!(!SelectionOutline::None.is_dashed());
    }
}
