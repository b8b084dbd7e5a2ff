//! Port system for workflow nodes.
//!
//! Ports are typed connection points on a node. A connection between two
//! ports is legal only if their data types are compatible (see
//! [`can_connect`]) and neither side exceeds its cardinality. Compatibility is
//! decided here; cardinality is enforced by the graph.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kind of value a port carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortDataType {
    /// Wildcard, connects to everything.
    Any,
    String,
    Number,
    Boolean,
    Object,
    Array,
    /// A handle to an agent (used by supervisors to delegate).
    Agent,
    /// A chat message.
    Message,
    /// An event that starts or advances a workflow.
    Event,
    /// An error raised by a node.
    Error,
}

impl PortDataType {
    /// Every data type, in declaration order.
    pub const ALL: [PortDataType; 10] = [
        Self::Any,
        Self::String,
        Self::Number,
        Self::Boolean,
        Self::Object,
        Self::Array,
        Self::Agent,
        Self::Message,
        Self::Event,
        Self::Error,
    ];

    /// Wire name of the type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
            Self::Agent => "agent",
            Self::Message => "message",
            Self::Event => "event",
            Self::Error => "error",
        }
    }

    /// Short token shown in the port badge.
    #[must_use]
    pub const fn badge(self) -> &'static str {
        match self {
            Self::Any => "*",
            Self::String => "str",
            Self::Number => "num",
            Self::Boolean => "bool",
            Self::Object => "obj",
            Self::Array => "[]",
            Self::Agent => "agt",
            Self::Message => "msg",
            Self::Event => "evt",
            Self::Error => "err",
        }
    }

    /// Accent color for the port indicator.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Any => "#9ca3af",
            Self::String => "#eab308",
            Self::Number => "#22c55e",
            Self::Boolean => "#ef4444",
            Self::Object => "#f97316",
            Self::Array => "#fb923c",
            Self::Agent => "#6366f1",
            Self::Message => "#0ea5e9",
            Self::Event => "#f59e0b",
            Self::Error => "#dc2626",
        }
    }
}

impl fmt::Display for PortDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PortDataType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown port data type '{s}'"))
    }
}

/// Whether a port receives or emits values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortDirection {
    Input,
    Output,
}

impl PortDirection {
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Input => Self::Output,
            Self::Output => Self::Input,
        }
    }
}

impl fmt::Display for PortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => f.write_str("input"),
            Self::Output => f.write_str("output"),
        }
    }
}

/// An unordered pair of data types declared compatible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatiblePair {
    pub a: PortDataType,
    pub b: PortDataType,
}

impl CompatiblePair {
    #[must_use]
    pub const fn new(a: PortDataType, b: PortDataType) -> Self {
        Self { a, b }
    }

    fn matches(&self, x: PortDataType, y: PortDataType) -> bool {
        (self.a == x && self.b == y) || (self.a == y && self.b == x)
    }
}

const BUILTIN_PAIRS: [CompatiblePair; 5] = [
    CompatiblePair::new(PortDataType::Message, PortDataType::String),
    CompatiblePair::new(PortDataType::Message, PortDataType::Object),
    CompatiblePair::new(PortDataType::Event, PortDataType::Object),
    CompatiblePair::new(PortDataType::Error, PortDataType::Message),
    CompatiblePair::new(PortDataType::Agent, PortDataType::Object),
];

/// The set of cross-type pairs allowed to connect.
///
/// Identity and the `any` wildcard are always allowed and never need to be
/// listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompatibilityTable {
    pairs: Vec<CompatiblePair>,
}

impl CompatibilityTable {
    /// The table shipped with the editor.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            pairs: BUILTIN_PAIRS.to_vec(),
        }
    }

    /// A table with no cross-type pairs: only identity and `any` connect.
    #[must_use]
    pub fn strict() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Builtin pairs plus `extra`, skipping duplicates.
    #[must_use]
    pub fn with_pairs(extra: impl IntoIterator<Item = CompatiblePair>) -> Self {
        let mut table = Self::builtin();
        for pair in extra {
            if !table.pairs.iter().any(|p| p.matches(pair.a, pair.b)) {
                table.pairs.push(pair);
            }
        }
        table
    }

    /// Declared cross-type pairs.
    #[must_use]
    pub fn pairs(&self) -> &[CompatiblePair] {
        &self.pairs
    }

    /// Decides whether a `source` port may feed a `target` port.
    ///
    /// Symmetric in its arguments.
    #[must_use]
    pub fn allows(&self, source: PortDataType, target: PortDataType) -> bool {
        if source == PortDataType::Any || target == PortDataType::Any {
            return true;
        }
        if source == target {
            return true;
        }
        self.pairs.iter().any(|p| p.matches(source, target))
    }
}

impl Default for CompatibilityTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Whether a `source` port of one type may connect to a `target` port of
/// another, using the builtin table.
#[must_use]
pub fn can_connect(source: PortDataType, target: PortDataType) -> bool {
    if source == PortDataType::Any || target == PortDataType::Any || source == target {
        return true;
    }
    BUILTIN_PAIRS.iter().any(|p| p.matches(source, target))
}

/// Static description of a port in a node type's default layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortSpec {
    pub id: &'static str,
    pub label: &'static str,
    pub direction: PortDirection,
    pub data_type: PortDataType,
    pub required: bool,
    pub multiple: bool,
}

impl PortSpec {
    /// A required single-connection input.
    #[must_use]
    pub const fn input(id: &'static str, label: &'static str, data_type: PortDataType) -> Self {
        Self {
            id,
            label,
            direction: PortDirection::Input,
            data_type,
            required: true,
            multiple: false,
        }
    }

    /// A single-connection output.
    #[must_use]
    pub const fn output(id: &'static str, label: &'static str, data_type: PortDataType) -> Self {
        Self {
            id,
            label,
            direction: PortDirection::Output,
            data_type,
            required: false,
            multiple: false,
        }
    }

    #[must_use]
    pub const fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Allows any number of edges on this port.
    #[must_use]
    pub const fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }

    /// Materializes an instance port, initially unconnected.
    #[must_use]
    pub fn instantiate(&self) -> Port {
        Port {
            id: self.id.to_string(),
            label: self.label.to_string(),
            direction: self.direction,
            data_type: self.data_type,
            connected: false,
            multiple: self.multiple,
            required: self.required,
        }
    }
}

/// A port on a node instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    /// Unique within the owning node.
    pub id: String,
    pub label: String,
    pub direction: PortDirection,
    pub data_type: PortDataType,
    /// Whether at least one edge touches this port. Maintained by the graph.
    #[serde(default)]
    pub connected: bool,
    /// Whether more than one edge may touch this port.
    #[serde(default)]
    pub multiple: bool,
    /// Whether validation flags this port when left unconnected.
    #[serde(default)]
    pub required: bool,
}

impl Port {
    /// A dynamically derived port (used by variable-arity node types).
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        direction: PortDirection,
        data_type: PortDataType,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            direction,
            data_type,
            connected: false,
            multiple: false,
            required: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compatibility_is_symmetric() {
        for a in PortDataType::ALL {
            for b in PortDataType::ALL {
                assert_eq!(can_connect(a, b), can_connect(b, a), "{a} vs {b}");
            }
        }
    }

    #[test]
    fn any_and_identity_always_connect() {
        for x in PortDataType::ALL {
            assert!(can_connect(x, PortDataType::Any));
            assert!(can_connect(PortDataType::Any, x));
            assert!(can_connect(x, x));
        }
    }

    #[test]
    fn unlisted_pair_is_rejected() {
        assert!(!can_connect(PortDataType::String, PortDataType::Number));
        assert!(!can_connect(PortDataType::Boolean, PortDataType::Agent));
    }

    #[test]
    fn declared_pairs_connect() {
        assert!(can_connect(PortDataType::Message, PortDataType::String));
        assert!(can_connect(PortDataType::String, PortDataType::Message));
        assert!(can_connect(PortDataType::Event, PortDataType::Object));
    }

    #[test]
    fn builtin_table_agrees_with_free_function() {
        let table = CompatibilityTable::builtin();
        for a in PortDataType::ALL {
            for b in PortDataType::ALL {
                assert_eq!(table.allows(a, b), can_connect(a, b));
            }
        }
    }

    #[test]
    fn extended_table_adds_pairs_once() {
        let extra = CompatiblePair::new(PortDataType::Number, PortDataType::String);
        let table = CompatibilityTable::with_pairs([extra, extra]);
        assert!(table.allows(PortDataType::String, PortDataType::Number));
        assert_eq!(table.pairs().len(), BUILTIN_PAIRS.len() + 1);
    }

    #[test]
    fn parses_wire_names() {
        assert_eq!("message".parse::<PortDataType>(), Ok(PortDataType::Message));
        assert!("bytes".parse::<PortDataType>().is_err());
    }

    #[test]
    fn spec_instantiates_unconnected_port() {
        let port = PortSpec::output("out", "Output", PortDataType::Message)
            .multiple()
            .instantiate();
        assert!(port.multiple);
        assert!(!port.connected);
        assert_eq!(port.direction, PortDirection::Output);
    }
}
