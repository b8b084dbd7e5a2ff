//! Node selection and the rubber-band selection box.

use crate::indicator::SelectionOutline;
use agent_factory_core::{Point, Rect, is_node_in_selection};
use agent_factory_workflow::{NodeId, WorkflowGraph};
use std::collections::BTreeSet;

/// The set of selected nodes plus the one that was selected last.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    nodes: BTreeSet<NodeId>,
    primary: Option<NodeId>,
}

impl Selection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects a node.
    ///
    /// With `multi`, membership of `node_id` is toggled and the rest of the
    /// selection is kept; otherwise the selection becomes just `node_id`.
    pub fn select(&mut self, node_id: NodeId, multi: bool) {
        if !multi {
            self.nodes.clear();
            self.nodes.insert(node_id);
            self.primary = Some(node_id);
        } else if self.nodes.remove(&node_id) {
            if self.primary == Some(node_id) {
                self.primary = self.nodes.iter().next_back().copied();
            }
        } else {
            self.nodes.insert(node_id);
            self.primary = Some(node_id);
        }
    }

    /// Adds nodes without toggling; the primary is kept if there is one.
    pub fn extend(&mut self, nodes: impl IntoIterator<Item = NodeId>) {
        self.nodes.extend(nodes);
        if self.primary.is_none() {
            self.primary = self.nodes.iter().next().copied();
        }
    }

    /// Replaces the selection.
    pub fn replace(&mut self, nodes: impl IntoIterator<Item = NodeId>) {
        self.clear();
        self.extend(nodes);
    }

    /// Drops a node, e.g. after it was deleted.
    pub fn remove(&mut self, node_id: NodeId) {
        if self.nodes.remove(&node_id) && self.primary == Some(node_id) {
            self.primary = self.nodes.iter().next_back().copied();
        }
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.primary = None;
    }

    #[must_use]
    pub fn contains(&self, node_id: NodeId) -> bool {
        self.nodes.contains(&node_id)
    }

    #[must_use]
    pub fn primary(&self) -> Option<NodeId> {
        self.primary
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().copied()
    }

    /// How the container of `node_id` should be outlined.
    #[must_use]
    pub fn outline_for(&self, node_id: NodeId) -> SelectionOutline {
        if self.primary == Some(node_id) {
            SelectionOutline::Primary
        } else if self.nodes.contains(&node_id) {
            SelectionOutline::Secondary
        } else {
            SelectionOutline::None
        }
    }
}

/// A rubber-band box being dragged on the canvas, in canvas space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionBox {
    pub start: Point,
    pub end: Point,
    /// Add to the current selection instead of replacing it.
    pub additive: bool,
}

impl SelectionBox {
    #[must_use]
    pub fn new(start: Point, additive: bool) -> Self {
        Self {
            start,
            end: start,
            additive,
        }
    }

    /// The box as drawn, which may have negative extents.
    #[must_use]
    pub fn rect(&self) -> Rect {
        Rect::from_corners(self.start, self.end)
    }

    /// Nodes whose bounds intersect the box.
    #[must_use]
    pub fn hits(&self, graph: &WorkflowGraph) -> Vec<NodeId> {
        let rect = self.rect();
        graph
            .nodes()
            .filter(|n| is_node_in_selection(rect, n.position, n.size))
            .map(|n| n.id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_factory_core::{Position, Size};
    use agent_factory_workflow::{NodeInstance, NodeType};

    fn ids(n: usize) -> Vec<NodeId> {
        (0..n).map(|_| NodeId::generate(NodeType::Agent)).collect()
    }

    #[test]
    fn plain_select_replaces() {
        let ids = ids(2);
        let mut selection = Selection::new();
        selection.select(ids[0], false);
        selection.select(ids[1], false);
        assert_eq!(selection.len(), 1);
        assert_eq!(selection.primary(), Some(ids[1]));
    }

    #[test]
    fn multi_select_toggles_and_tracks_primary() {
        let ids = ids(3);
        let mut selection = Selection::new();
        selection.select(ids[0], false);
        selection.select(ids[1], true);
        selection.select(ids[2], true);
        assert_eq!(selection.len(), 3);
        assert_eq!(selection.outline_for(ids[2]), SelectionOutline::Primary);
        assert_eq!(selection.outline_for(ids[0]), SelectionOutline::Secondary);

        selection.select(ids[0], true);
        assert!(!selection.contains(ids[0]));
        assert_eq!(selection.outline_for(ids[0]), SelectionOutline::None);

        selection.select(ids[2], true);
        assert_eq!(selection.primary(), Some(ids[1]));
    }

    #[test]
    fn removing_primary_promotes_another() {
        let ids = ids(2);
        let mut selection = Selection::new();
        selection.select(ids[0], false);
        selection.select(ids[1], true);
        selection.remove(ids[1]);
        assert_eq!(selection.primary(), Some(ids[0]));
        selection.remove(ids[0]);
        assert!(selection.is_empty());
        assert_eq!(selection.primary(), None);
    }

    #[test]
    fn reversed_box_hits_node() {
        let mut graph = WorkflowGraph::new().with_min_node_size(Size::new(1.0, 1.0));
        let mut inside = NodeInstance::new(NodeType::Message, Some(Position::new(60.0, 60.0)));
        inside.size = Size::new(20.0, 20.0);
        let inside = graph.add_node(inside).expect("new node");
        let mut outside = NodeInstance::new(NodeType::Message, Some(Position::new(300.0, 300.0)));
        outside.size = Size::new(20.0, 20.0);
        graph.add_node(outside).expect("new node");

        let mut selection_box = SelectionBox::new(Point::new(100.0, 100.0), false);
        selection_box.end = Point::new(50.0, 50.0);
        assert_eq!(selection_box.hits(&graph), vec![inside]);
    }
}
