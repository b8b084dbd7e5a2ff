//! Prefixed ULID identifiers for graph-level entities.
//!
//! A ULID packs a 48-bit millisecond timestamp and 80 random bits, so ids sort
//! by creation time and collide only with negligible probability. Node ids are
//! defined in the workflow crate because their prefix is the node type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// Error returned when an id string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    /// The id kind that failed to parse.
    pub id_type: &'static str,
    /// What was wrong with the input.
    pub reason: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {}: {}", self.id_type, self.reason)
    }
}

impl std::error::Error for ParseIdError {}

/// Declares a ULID newtype displayed as `<prefix>_<ulid>`.
///
/// Ids serialize in their prefixed form and parse with or without the prefix.
macro_rules! prefixed_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(Ulid);

        impl $name {
            /// Generates a fresh id stamped with the current time.
            #[must_use]
            pub fn new() -> Self {
                Self(Ulid::new())
            }

            /// Wraps an existing ULID.
            #[must_use]
            pub const fn from_ulid(ulid: Ulid) -> Self {
                Self(ulid)
            }

            /// Returns the underlying ULID.
            #[must_use]
            pub const fn as_ulid(&self) -> Ulid {
                self.0
            }

            /// Milliseconds since the Unix epoch at which the id was minted.
            #[must_use]
            pub fn timestamp_ms(&self) -> u64 {
                self.0.timestamp_ms()
            }

            /// The display prefix for this id kind.
            #[must_use]
            pub const fn prefix() -> &'static str {
                $prefix
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}_{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw = s.strip_prefix(concat!($prefix, "_")).unwrap_or(s);
                Ulid::from_str(raw).map(Self).map_err(|e| ParseIdError {
                    id_type: stringify!($name),
                    reason: e.to_string(),
                })
            }
        }

        impl Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

prefixed_id!(
    /// Identifier of a saved workflow document.
    WorkflowId,
    "wf"
);

prefixed_id!(
    /// Identifier of a materialized edge between two ports.
    EdgeId,
    "edge"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_id_uses_prefix() {
        assert!(EdgeId::new().to_string().starts_with("edge_"));
        assert!(WorkflowId::new().to_string().starts_with("wf_"));
    }

    #[test]
    fn parses_prefixed_and_bare_forms() {
        let id = EdgeId::new();
        let prefixed: EdgeId = id.to_string().parse().expect("prefixed");
        let bare: EdgeId = id.as_ulid().to_string().parse().expect("bare");
        assert_eq!(prefixed, id);
        assert_eq!(bare, id);
    }

    #[test]
    fn rejects_garbage() {
        let err = "edge_not-a-ulid".parse::<EdgeId>().unwrap_err();
        assert_eq!(err.id_type, "EdgeId");
    }

    #[test]
    fn serializes_with_prefix() {
        let id = WorkflowId::new();
        let json = serde_json::to_string(&id).expect("serialize");
        assert!(json.starts_with("\"wf_"));
        let parsed: WorkflowId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, id);
    }
}
