//! Node instances placed on the canvas.
//!
//! A node has:
//! - An id of the form `<type>_<ulid>`, unique with overwhelming probability
//! - A fixed [`NodeType`]
//! - Canvas geometry (position and size)
//! - A free-form data record specific to its type
//! - Ports derived from its type and data
//! - Execution status and advisory validation findings

use crate::port::{Port, PortDirection};
use crate::registry::{self, NodeType};
use crate::status::{NodeStatus, StatusUpdate};
use agent_factory_core::{ParseIdError, Position, Size};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// Identifier of a node instance.
///
/// The type prefix makes ids readable in exported documents; the ULID part
/// carries the creation timestamp and a random suffix. Nothing prevents two
/// generated ids from colliding, it is only vanishingly unlikely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    node_type: NodeType,
    ulid: Ulid,
}

impl NodeId {
    /// A fresh id for a node of `node_type`.
    #[must_use]
    pub fn generate(node_type: NodeType) -> Self {
        Self {
            node_type,
            ulid: Ulid::new(),
        }
    }

    #[must_use]
    pub const fn from_parts(node_type: NodeType, ulid: Ulid) -> Self {
        Self { node_type, ulid }
    }

    /// The type encoded in the id prefix.
    #[must_use]
    pub const fn node_type(&self) -> NodeType {
        self.node_type
    }

    #[must_use]
    pub const fn as_ulid(&self) -> Ulid {
        self.ulid
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.node_type, self.ulid)
    }
}

impl FromStr for NodeId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_error = |reason: String| ParseIdError {
            id_type: "NodeId",
            reason,
        };
        let (prefix, raw) = s
            .split_once('_')
            .ok_or_else(|| parse_error(format!("missing type prefix in '{s}'")))?;
        let node_type = prefix
            .parse::<NodeType>()
            .map_err(|e| parse_error(e.to_string()))?;
        let ulid = Ulid::from_str(raw).map_err(|e| parse_error(e.to_string()))?;
        Ok(Self { node_type, ulid })
    }
}

impl Serialize for NodeId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// How serious a validation finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

/// An advisory problem attached to a node. Never blocks interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationFinding {
    pub severity: Severity,
    /// The data field or port the finding is about, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
}

impl ValidationFinding {
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            field: None,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            field: None,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn on_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

/// A node placed on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeInstance {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub position: Position,
    pub size: Size,
    /// Type-specific settings edited in the inspector.
    #[serde(default)]
    pub data: JsonValue,
    #[serde(default)]
    pub status: NodeStatus,
    /// Execution progress in percent, only meaningful while running.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validation: Vec<ValidationFinding>,
    #[serde(default)]
    pub inputs: Vec<Port>,
    #[serde(default)]
    pub outputs: Vec<Port>,
}

impl NodeInstance {
    /// Places a node of `node_type` with the registry defaults.
    #[must_use]
    pub fn new(node_type: NodeType, position: Option<Position>) -> Self {
        let defaults = registry::node_defaults(node_type, position);
        Self::with_data(node_type, defaults.position, defaults.size, defaults.data)
    }

    /// Places a node with explicit geometry and data; ports are derived.
    #[must_use]
    pub fn with_data(node_type: NodeType, position: Position, size: Size, data: JsonValue) -> Self {
        let ports = registry::derive_ports(node_type, &data);
        Self {
            id: NodeId::generate(node_type),
            node_type,
            position,
            size,
            data,
            status: NodeStatus::Idle,
            progress: None,
            validation: Vec::new(),
            inputs: ports.inputs,
            outputs: ports.outputs,
        }
    }

    /// Display label: the `name` data field when set, else the type label.
    #[must_use]
    pub fn label(&self) -> &str {
        self.data
            .get("name")
            .and_then(JsonValue::as_str)
            .filter(|name| !name.is_empty())
            .unwrap_or(self.node_type.metadata().label)
    }

    #[must_use]
    pub fn input_port(&self, id: &str) -> Option<&Port> {
        self.inputs.iter().find(|p| p.id == id)
    }

    #[must_use]
    pub fn output_port(&self, id: &str) -> Option<&Port> {
        self.outputs.iter().find(|p| p.id == id)
    }

    /// Looks a port up by id on either side.
    #[must_use]
    pub fn port(&self, id: &str) -> Option<&Port> {
        self.input_port(id).or_else(|| self.output_port(id))
    }

    pub(crate) fn port_mut(&mut self, direction: PortDirection, id: &str) -> Option<&mut Port> {
        let ports = match direction {
            PortDirection::Input => &mut self.inputs,
            PortDirection::Output => &mut self.outputs,
        };
        ports.iter_mut().find(|p| p.id == id)
    }

    /// All ports, inputs first.
    pub fn ports(&self) -> impl Iterator<Item = &Port> {
        self.inputs.iter().chain(&self.outputs)
    }

    /// Replaces the data record and re-derives the port list.
    ///
    /// Returns the ports that disappeared or changed type, so the caller can
    /// drop the edges that referenced them. Surviving ports keep their
    /// `connected` flag.
    pub fn reconfigure(&mut self, data: JsonValue) -> Vec<(PortDirection, String)> {
        let fresh = registry::derive_ports(self.node_type, &data);
        let mut invalidated = Vec::new();
        let merge = |old: &[Port], mut new: Vec<Port>, invalidated: &mut Vec<_>| {
            for port in old {
                match new.iter_mut().find(|p| p.id == port.id) {
                    Some(kept) if kept.data_type == port.data_type => kept.connected = port.connected,
                    _ => invalidated.push((port.direction, port.id.clone())),
                }
            }
            new
        };
        self.inputs = merge(&self.inputs, fresh.inputs, &mut invalidated);
        self.outputs = merge(&self.outputs, fresh.outputs, &mut invalidated);
        self.data = data;
        invalidated
    }

    /// Applies an execution status change.
    pub fn apply_status(&mut self, update: &StatusUpdate) {
        self.status = update.status;
        self.progress = update.effective_progress();
    }

    /// Counts findings as `(errors, warnings)`.
    #[must_use]
    pub fn finding_counts(&self) -> (usize, usize) {
        self.validation
            .iter()
            .fold((0, 0), |(errors, warnings), f| match f.severity {
                Severity::Error => (errors + 1, warnings),
                Severity::Warning => (errors, warnings + 1),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::PortDataType;
    use serde_json::json;

    #[test]
    fn node_id_display_and_parse() {
        let id = NodeId::generate(NodeType::Supervisor);
        let display = id.to_string();
        assert!(display.starts_with("supervisor_"));
        assert_eq!(display.parse::<NodeId>().expect("parse"), id);
    }

    #[test]
    fn node_id_rejects_unknown_prefix() {
        let raw = format!("robot_{}", Ulid::new());
        let err = raw.parse::<NodeId>().unwrap_err();
        assert!(err.reason.contains("unknown node type"));
        assert!("agent".parse::<NodeId>().is_err());
    }

    #[test]
    fn new_node_takes_registry_defaults() {
        let node = NodeInstance::new(NodeType::Message, None);
        assert_eq!(node.size, NodeType::Message.metadata().default_size);
        assert_eq!(node.status, NodeStatus::Idle);
        assert_eq!(node.inputs.len(), 1);
        assert_eq!(node.outputs[0].data_type, PortDataType::Message);
        assert!(node.outputs[0].multiple);
        assert_eq!(node.id.node_type(), NodeType::Message);
    }

    #[test]
    fn label_prefers_name_field() {
        let mut node = NodeInstance::new(NodeType::Agent, None);
        assert_eq!(node.label(), "New Agent");
        node.data["name"] = json!("");
        assert_eq!(node.label(), "Agent");
    }

    #[test]
    fn reconfigure_reports_removed_ports() {
        let mut node = NodeInstance::new(NodeType::Switch, None);
        node.port_mut(PortDirection::Output, "case_1")
            .expect("case_1")
            .connected = true;
        let removed = node.reconfigure(json!({ "cases": ["Only"] }));
        assert_eq!(removed, vec![(PortDirection::Output, "case_2".to_string())]);
        assert!(node.output_port("case_1").expect("kept").connected);
        assert_eq!(node.output_port("case_1").expect("kept").label, "Only");
        assert!(node.output_port("default").is_some());
    }

    #[test]
    fn finding_counts_split_by_severity() {
        let mut node = NodeInstance::new(NodeType::Action, None);
        node.validation = vec![
            ValidationFinding::error("no tool selected").on_field("tool"),
            ValidationFinding::warning("slow"),
            ValidationFinding::error("bad params"),
        ];
        assert_eq!(node.finding_counts(), (2, 1));
    }

    #[test]
    fn node_serde_roundtrip() {
        let node = NodeInstance::new(NodeType::Approval, Some(Position::new(5.0, 6.0)));
        let json = serde_json::to_value(&node).expect("serialize");
        assert_eq!(json["type"], "approval");
        let parsed: NodeInstance = serde_json::from_value(json).expect("deserialize");
        assert_eq!(parsed, node);
    }
}
