//! Node type registry.
//!
//! Every node kind is described once by a static [`NodeTypeMetadata`] entry.
//! The entries are immutable and only reachable through the accessors in this
//! module; the canvas, the graph and import code all read from here instead of
//! keeping their own copies.
//!
//! Behaviour that varies per kind (default instance data, port derivation) is
//! stored as function pointers on the metadata, so adding a kind means adding
//! one entry here and nothing else.

use crate::error::RegistryError;
use crate::node::NodeId;
use crate::port::{Port, PortDataType, PortDirection, PortSpec};
use agent_factory_core::{Position, Size};
use rootcause::Report;
use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};
use std::fmt;
use std::str::FromStr;

/// Where a node kind is listed in the palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeCategory {
    /// Agents, triggers and actions.
    Core,
    /// Routing and orchestration.
    Control,
    /// Messages and human-in-the-loop steps.
    Communication,
}

impl NodeCategory {
    pub const ALL: [NodeCategory; 3] = [Self::Core, Self::Control, Self::Communication];

    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Core => "core",
            Self::Control => "control",
            Self::Communication => "communication",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Core => "Core",
            Self::Control => "Control Flow",
            Self::Communication => "Communication",
        }
    }
}

/// The kind of a node. Fixed for the lifetime of an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Agent,
    Trigger,
    Action,
    Logic,
    Switch,
    Supervisor,
    Message,
    Approval,
}

impl NodeType {
    pub const ALL: [NodeType; 8] = [
        Self::Agent,
        Self::Trigger,
        Self::Action,
        Self::Logic,
        Self::Switch,
        Self::Supervisor,
        Self::Message,
        Self::Approval,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Agent => "agent",
            Self::Trigger => "trigger",
            Self::Action => "action",
            Self::Logic => "logic",
            Self::Switch => "switch",
            Self::Supervisor => "supervisor",
            Self::Message => "message",
            Self::Approval => "approval",
        }
    }

    /// Static metadata for this kind.
    #[must_use]
    pub fn metadata(self) -> &'static NodeTypeMetadata {
        match self {
            Self::Agent => &AGENT,
            Self::Trigger => &TRIGGER,
            Self::Action => &ACTION,
            Self::Logic => &LOGIC,
            Self::Switch => &SWITCH,
            Self::Supervisor => &SUPERVISOR,
            Self::Message => &MESSAGE,
            Self::Approval => &APPROVAL,
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeType {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| RegistryError::UnknownNodeType {
                name: s.to_string(),
            })
    }
}

/// Input and output ports derived for one node instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortSet {
    pub inputs: Vec<Port>,
    pub outputs: Vec<Port>,
}

/// Static description of a node kind.
pub struct NodeTypeMetadata {
    pub node_type: NodeType,
    pub label: &'static str,
    pub description: &'static str,
    /// Icon token understood by the renderer.
    pub icon: &'static str,
    pub color: &'static str,
    pub category: NodeCategory,
    pub default_size: Size,
    pub ports: &'static [PortSpec],
    pub resizable: bool,
    /// Builds the data record of a freshly placed instance.
    pub default_data: fn() -> JsonValue,
    /// Builds the concrete port list from an instance's data.
    pub derive_ports: fn(&'static NodeTypeMetadata, &JsonValue) -> PortSet,
}

impl NodeTypeMetadata {
    /// Default ports filtered by direction.
    pub fn default_ports(
        &self,
        direction: PortDirection,
    ) -> impl Iterator<Item = &'static PortSpec> {
        let ports: &'static [PortSpec] = self.ports;
        ports.iter().filter(move |p| p.direction == direction)
    }
}

impl fmt::Debug for NodeTypeMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeTypeMetadata")
            .field("node_type", &self.node_type)
            .field("label", &self.label)
            .field("category", &self.category)
            .field("default_size", &self.default_size)
            .field("ports", &self.ports)
            .field("resizable", &self.resizable)
            .finish_non_exhaustive()
    }
}

/// The payload used to place a new node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeDefaults {
    pub position: Position,
    pub size: Size,
    pub data: JsonValue,
}

/// Where a node lands when the caller does not say.
pub const DEFAULT_POSITION: Position = Position::new(100.0, 100.0);

/// Fresh default payload for `node_type`.
#[must_use]
pub fn node_defaults(node_type: NodeType, position: Option<Position>) -> NodeDefaults {
    let meta = node_type.metadata();
    let defaults = NodeDefaults {
        position: position.unwrap_or(DEFAULT_POSITION),
        size: meta.default_size,
        data: (meta.default_data)(),
    };
    tracing::debug!(node_type = %node_type, "built node defaults");
    defaults
}

/// Like [`node_defaults`], keyed by the wire name of the type.
///
/// # Errors
///
/// Returns [`RegistryError::UnknownNodeType`] if `name` is not a known type.
pub fn node_defaults_for(
    name: &str,
    position: Option<Position>,
) -> Result<NodeDefaults, Report<RegistryError>> {
    let node_type: NodeType = name.parse()?;
    Ok(node_defaults(node_type, position))
}

/// Node kinds listed under `category`, in palette order.
#[must_use]
pub fn nodes_by_category(category: NodeCategory) -> Vec<NodeType> {
    NodeType::ALL
        .into_iter()
        .filter(|t| t.metadata().category == category)
        .collect()
}

/// Like [`nodes_by_category`], keyed by category id.
///
/// # Errors
///
/// Returns [`RegistryError::UnknownCategory`] for an unknown id.
pub fn nodes_by_category_id(category_id: &str) -> Result<Vec<NodeType>, Report<RegistryError>> {
    let category = NodeCategory::ALL
        .into_iter()
        .find(|c| c.id() == category_id)
        .ok_or_else(|| RegistryError::UnknownCategory {
            id: category_id.to_string(),
        })?;
    Ok(nodes_by_category(category))
}

/// A fresh node id prefixed with the type name.
#[must_use]
pub fn generate_node_id(node_type: NodeType) -> NodeId {
    NodeId::generate(node_type)
}

/// Concrete ports for an instance of `node_type` carrying `data`.
#[must_use]
pub fn derive_ports(node_type: NodeType, data: &JsonValue) -> PortSet {
    let meta = node_type.metadata();
    (meta.derive_ports)(meta, data)
}

/// Iterates every registered kind.
pub fn all() -> impl Iterator<Item = &'static NodeTypeMetadata> {
    NodeType::ALL.into_iter().map(NodeType::metadata)
}

fn fixed_ports(meta: &'static NodeTypeMetadata, _data: &JsonValue) -> PortSet {
    PortSet {
        inputs: meta
            .default_ports(PortDirection::Input)
            .map(PortSpec::instantiate)
            .collect(),
        outputs: meta
            .default_ports(PortDirection::Output)
            .map(PortSpec::instantiate)
            .collect(),
    }
}

/// One output per configured case, then a `default` output.
fn switch_ports(meta: &'static NodeTypeMetadata, data: &JsonValue) -> PortSet {
    let inputs = meta
        .default_ports(PortDirection::Input)
        .map(PortSpec::instantiate)
        .collect();
    let cases = data
        .get("cases")
        .and_then(JsonValue::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let mut outputs: Vec<Port> = cases
        .iter()
        .enumerate()
        .map(|(i, case)| {
            let label = case
                .as_str()
                .map_or_else(|| format!("Case {}", i + 1), str::to_string);
            Port::new(
                format!("case_{}", i + 1),
                label,
                PortDirection::Output,
                PortDataType::Any,
            )
        })
        .collect();
    outputs.push(Port::new(
        "default",
        "Default",
        PortDirection::Output,
        PortDataType::Any,
    ));
    PortSet { inputs, outputs }
}

static AGENT: NodeTypeMetadata = NodeTypeMetadata {
    node_type: NodeType::Agent,
    label: "Agent",
    description: "LLM-backed agent that answers or transforms messages",
    icon: "bot",
    color: "#6366f1",
    category: NodeCategory::Core,
    default_size: Size::new(280.0, 160.0),
    ports: &[
        PortSpec::input("input", "Input", PortDataType::Message),
        PortSpec::input("context", "Context", PortDataType::Object).optional(),
        PortSpec::output("output", "Output", PortDataType::Message),
        PortSpec::output("error", "Error", PortDataType::Error),
    ],
    resizable: true,
    default_data: || {
        json!({
            "name": "New Agent",
            "model": "default",
            "system_prompt": "",
            "temperature": 0.7,
            "tools": [],
        })
    },
    derive_ports: fixed_ports,
};

static TRIGGER: NodeTypeMetadata = NodeTypeMetadata {
    node_type: NodeType::Trigger,
    label: "Trigger",
    description: "Starts the workflow when an event arrives",
    icon: "zap",
    color: "#f59e0b",
    category: NodeCategory::Core,
    default_size: Size::new(220.0, 100.0),
    ports: &[PortSpec::output("event", "Event", PortDataType::Event).multiple()],
    resizable: false,
    default_data: || json!({ "trigger_type": "manual", "schedule": null }),
    derive_ports: fixed_ports,
};

static ACTION: NodeTypeMetadata = NodeTypeMetadata {
    node_type: NodeType::Action,
    label: "Action",
    description: "Calls a tool or an external integration",
    icon: "play",
    color: "#10b981",
    category: NodeCategory::Core,
    default_size: Size::new(240.0, 120.0),
    ports: &[
        PortSpec::input("input", "Input", PortDataType::Any),
        PortSpec::output("result", "Result", PortDataType::Object).multiple(),
        PortSpec::output("error", "Error", PortDataType::Error),
    ],
    resizable: true,
    default_data: || json!({ "tool": "", "parameters": {} }),
    derive_ports: fixed_ports,
};

static LOGIC: NodeTypeMetadata = NodeTypeMetadata {
    node_type: NodeType::Logic,
    label: "Condition",
    description: "Routes on a boolean condition",
    icon: "git-branch",
    color: "#8b5cf6",
    category: NodeCategory::Control,
    default_size: Size::new(220.0, 120.0),
    ports: &[
        PortSpec::input("input", "Input", PortDataType::Any),
        PortSpec::input("condition", "Condition", PortDataType::Boolean).optional(),
        PortSpec::output("true", "True", PortDataType::Any),
        PortSpec::output("false", "False", PortDataType::Any),
    ],
    resizable: false,
    default_data: || json!({ "condition": "" }),
    derive_ports: fixed_ports,
};

static SWITCH: NodeTypeMetadata = NodeTypeMetadata {
    node_type: NodeType::Switch,
    label: "Switch",
    description: "Routes to one of several cases",
    icon: "split",
    color: "#a855f7",
    category: NodeCategory::Control,
    default_size: Size::new(240.0, 140.0),
    ports: &[
        PortSpec::input("input", "Input", PortDataType::Any),
        PortSpec::output("case_1", "Case 1", PortDataType::Any),
        PortSpec::output("case_2", "Case 2", PortDataType::Any),
        PortSpec::output("default", "Default", PortDataType::Any),
    ],
    resizable: true,
    default_data: || json!({ "expression": "", "cases": ["Case 1", "Case 2"] }),
    derive_ports: switch_ports,
};

static SUPERVISOR: NodeTypeMetadata = NodeTypeMetadata {
    node_type: NodeType::Supervisor,
    label: "Supervisor",
    description: "Delegates work to a team of agents",
    icon: "users",
    color: "#ef4444",
    category: NodeCategory::Control,
    default_size: Size::new(300.0, 180.0),
    ports: &[
        PortSpec::input("task", "Task", PortDataType::Message),
        PortSpec::output("delegate", "Delegate", PortDataType::Agent).multiple(),
        PortSpec::output("result", "Result", PortDataType::Message),
        PortSpec::output("error", "Error", PortDataType::Error),
    ],
    resizable: true,
    default_data: || {
        json!({
            "name": "Supervisor",
            "strategy": "round_robin",
            "max_delegations": 5,
        })
    },
    derive_ports: fixed_ports,
};

static MESSAGE: NodeTypeMetadata = NodeTypeMetadata {
    node_type: NodeType::Message,
    label: "Message",
    description: "Composes or forwards a message",
    icon: "message-square",
    color: "#0ea5e9",
    category: NodeCategory::Communication,
    default_size: Size::new(240.0, 120.0),
    ports: &[
        PortSpec::input("input", "Input", PortDataType::String),
        PortSpec::output("output", "Output", PortDataType::Message).multiple(),
    ],
    resizable: true,
    default_data: || json!({ "template": "", "role": "assistant" }),
    derive_ports: fixed_ports,
};

static APPROVAL: NodeTypeMetadata = NodeTypeMetadata {
    node_type: NodeType::Approval,
    label: "Approval",
    description: "Pauses until a person approves or rejects",
    icon: "user-check",
    color: "#14b8a6",
    category: NodeCategory::Communication,
    default_size: Size::new(240.0, 120.0),
    ports: &[
        PortSpec::input("request", "Request", PortDataType::Any),
        PortSpec::output("approved", "Approved", PortDataType::Any),
        PortSpec::output("rejected", "Rejected", PortDataType::Any),
    ],
    resizable: false,
    default_data: || {
        json!({
            "prompt": "Approve this step?",
            "approvers": [],
            "timeout_minutes": 60,
        })
    },
    derive_ports: fixed_ports,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_is_keyed_by_its_own_type() {
        for node_type in NodeType::ALL {
            assert_eq!(node_type.metadata().node_type, node_type);
        }
    }

    #[test]
    fn default_sizes_respect_minimum() {
        for meta in all() {
            assert_eq!(meta.default_size, meta.default_size.at_least(Size::MIN_NODE));
        }
    }

    #[test]
    fn port_ids_unique_per_type() {
        for meta in all() {
            let ports = derive_ports(meta.node_type, &(meta.default_data)());
            let mut ids: Vec<_> = ports
                .inputs
                .iter()
                .chain(&ports.outputs)
                .map(|p| p.id.as_str())
                .collect();
            let total = ids.len();
            ids.sort_unstable();
            ids.dedup();
            assert_eq!(ids.len(), total, "duplicate port id on {}", meta.node_type);
        }
    }

    #[test]
    fn defaults_use_given_position() {
        let defaults = node_defaults(NodeType::Agent, Some(Position::new(10.0, 20.0)));
        assert_eq!(defaults.position, Position::new(10.0, 20.0));
        assert_eq!(defaults.size, Size::new(280.0, 160.0));
        assert_eq!(defaults.data["name"], "New Agent");
    }

    #[test]
    fn defaults_are_fresh_each_call() {
        let mut first = node_defaults(NodeType::Action, None);
        first.data["tool"] = json!("http");
        let second = node_defaults(NodeType::Action, None);
        assert_eq!(second.data["tool"], "");
        assert_eq!(second.position, DEFAULT_POSITION);
    }

    #[test]
    fn unknown_type_is_an_error() {
        let err = node_defaults_for("teleporter", None).unwrap_err();
        assert_eq!(
            err.current_context(),
            &RegistryError::UnknownNodeType {
                name: "teleporter".to_string()
            }
        );
    }

    #[test]
    fn known_type_by_name() {
        let defaults = node_defaults_for("trigger", None).expect("known type");
        assert_eq!(defaults.data["trigger_type"], "manual");
    }

    #[test]
    fn categories_partition_types() {
        let mut listed: Vec<NodeType> = NodeCategory::ALL
            .into_iter()
            .flat_map(nodes_by_category)
            .collect();
        listed.sort();
        let mut all = NodeType::ALL.to_vec();
        all.sort();
        assert_eq!(listed, all);
        assert_eq!(
            nodes_by_category(NodeCategory::Core),
            vec![NodeType::Agent, NodeType::Trigger, NodeType::Action]
        );
    }

    #[test]
    fn unknown_category_is_an_error() {
        assert!(nodes_by_category_id("control").is_ok());
        assert!(nodes_by_category_id("misc").is_err());
    }

    #[test]
    fn generated_ids_are_prefixed_and_distinct() {
        let a = generate_node_id(NodeType::Agent).to_string();
        let b = generate_node_id(NodeType::Agent).to_string();
        assert!(a.starts_with("agent_"));
        assert!(b.starts_with("agent_"));
        assert_ne!(a, b);
    }

    #[test]
    fn switch_ports_follow_case_count() {
        let ports = derive_ports(NodeType::Switch, &json!({ "cases": ["Low", "Mid", "High"] }));
        let ids: Vec<_> = ports.outputs.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["case_1", "case_2", "case_3", "default"]);
        assert_eq!(ports.outputs[1].label, "Mid");
        assert_eq!(ports.inputs.len(), 1);
    }

    #[test]
    fn switch_default_data_matches_default_ports() {
        let meta = NodeType::Switch.metadata();
        let derived = derive_ports(NodeType::Switch, &(meta.default_data)());
        let declared: Vec<_> = meta
            .default_ports(PortDirection::Output)
            .map(|p| p.id)
            .collect();
        let derived: Vec<_> = derived.outputs.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(declared, derived);
    }

    #[test]
    fn switch_without_cases_keeps_default_output() {
        let ports = derive_ports(NodeType::Switch, &json!({}));
        assert_eq!(ports.outputs.len(), 1);
        assert_eq!(ports.outputs[0].id, "default");
    }
}
