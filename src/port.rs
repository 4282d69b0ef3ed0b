//! Port declarations and the connection compatibility rule.
//!
//! A port type is an opaque nominal tag such as `"tensor.embed"`. Two ports are
//! compatible only when their tags are byte-for-byte identical; there is no
//! structural inference and no subtyping.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A named, typed connection point on a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortDecl {
    pub name: String,
    pub port_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<serde_json::Map<String, serde_json::Value>>,
}

impl PortDecl {
    pub fn new(name: impl Into<String>, port_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            port_type: port_type.into(),
            schema: None,
        }
    }
}

/// Which side of a node a port lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortDirection {
    Input,
    Output,
}

impl PortDirection {
    fn prefix(self) -> &'static str {
        match self {
            PortDirection::Input => "in",
            PortDirection::Output => "out",
        }
    }
}

/// A parsed endpoint handle of the form `"in:<port>"` or `"out:<port>"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortHandle {
    pub direction: Option<PortDirection>,
    pub port: String,
}

impl PortHandle {
    pub fn input(port: impl Into<String>) -> Self {
        Self {
            direction: Some(PortDirection::Input),
            port: port.into(),
        }
    }

    pub fn output(port: impl Into<String>) -> Self {
        Self {
            direction: Some(PortDirection::Output),
            port: port.into(),
        }
    }

    /// Parses a handle. A handle without `:` is taken as a bare port name.
    /// Returns `None` when no port name can be extracted.
    pub fn parse(handle: &str) -> Option<Self> {
        let (direction, port) = match handle.split_once(':') {
            Some(("in", port)) => (Some(PortDirection::Input), port),
            Some(("out", port)) => (Some(PortDirection::Output), port),
            Some((_, port)) => (None, port),
            None => (None, handle),
        };
        if port.is_empty() {
            return None;
        }
        Some(Self {
            direction,
            port: port.to_string(),
        })
    }
}

impl fmt::Display for PortHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            Some(direction) => write!(f, "{}:{}", direction.prefix(), self.port),
            None => write!(f, "{}", self.port),
        }
    }
}

/// True iff both ports exist and carry the same port type tag.
pub fn is_compatible(source: Option<&PortDecl>, target: Option<&PortDecl>) -> bool {
    match (source, target) {
        (Some(source), Some(target)) => source.port_type == target.port_type,
        _ => false,
    }
}

/// Finds a port by name in an ordered port list.
pub fn find_port<'a>(ports: &'a [PortDecl], name: &str) -> Option<&'a PortDecl> {
    ports.iter().find(|p| p.name == name)
}
