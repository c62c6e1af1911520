//! Normalized protocol model.
//!
//! Produced by [`crate::parse`] and consumed by templates. Every type
//! serializes with `serde`, so the model is what a template sees.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// A protocol document: a named set of interfaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Protocol {
    pub name: String,
    /// Prefix removed from interface names during analysis.
    pub trim_prefix: String,
    pub interfaces: Vec<Interface>,
}

impl Protocol {
    /// Look up an interface by its (trimmed) name.
    pub fn interface(&self, name: &str) -> Option<&Interface> {
        self.interfaces.iter().find(|iface| iface.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Interface {
    pub name: String,
    pub version: u32,
    pub summary: String,
    pub description: String,
    pub requests: Vec<Message>,
    pub events: Vec<Message>,
    pub enums: Vec<Enum>,
}

impl Interface {
    pub fn request(&self, name: &str) -> Option<&Message> {
        self.requests.iter().find(|msg| msg.name == name)
    }

    pub fn event(&self, name: &str) -> Option<&Message> {
        self.events.iter().find(|msg| msg.name == name)
    }

    pub fn enumeration(&self, name: &str) -> Option<&Enum> {
        self.enums.iter().find(|e| e.name == name)
    }

    /// Requests followed by events.
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.requests.iter().chain(self.events.iter())
    }
}

/// Direction of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    /// Client to server.
    Request,
    /// Server to client.
    Event,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request => f.write_str("request"),
            Self::Event => f.write_str("event"),
        }
    }
}

/// A request or event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub name: String,
    pub kind: Kind,
    /// Index within the owning interface's request or event list.
    pub opcode: u16,
    /// Owning interface name, after prefix trimming.
    pub interface: String,
    pub since: u32,
    pub destructor: bool,
    pub summary: String,
    pub description: String,
    pub args: Vec<Arg>,
}

impl Message {
    /// Number of descriptors a message of this shape carries.
    pub fn fd_count(&self) -> usize {
        self.args
            .iter()
            .filter(|arg| arg.wire_type == WireType::Fd)
            .count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Arg {
    pub name: String,
    #[serde(rename = "type")]
    pub wire_type: WireType,
    /// Interface the object or new id must implement, if constrained.
    pub interface: Option<String>,
    pub allow_null: bool,
    #[serde(rename = "enum")]
    pub enumeration: Option<String>,
    pub summary: String,
}

/// The eight argument encodings of the wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WireType {
    NewId,
    Object,
    Uint,
    String,
    Int,
    Fd,
    Fixed,
    Array,
}

impl WireType {
    pub const ALL: [WireType; 8] = [
        Self::NewId,
        Self::Object,
        Self::Uint,
        Self::String,
        Self::Int,
        Self::Fd,
        Self::Fixed,
        Self::Array,
    ];

    /// Tag as written in protocol documents.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NewId => "new_id",
            Self::Object => "object",
            Self::Uint => "uint",
            Self::String => "string",
            Self::Int => "int",
            Self::Fd => "fd",
            Self::Fixed => "fixed",
            Self::Array => "array",
        }
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a tag is not one of the eight wire types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTag(pub String);

impl FromStr for WireType {
    type Err = UnknownTag;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|ty| ty.as_str() == tag)
            .ok_or_else(|| UnknownTag(tag.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Enum {
    pub name: String,
    pub bitfield: bool,
    pub summary: String,
    pub description: String,
    pub entries: Vec<Entry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub name: String,
    pub value: u32,
    pub summary: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_type_tags_round_trip() {
        for ty in WireType::ALL {
            assert_eq!(ty.as_str().parse::<WireType>().unwrap(), ty);
        }
        assert_eq!(
            "double".parse::<WireType>(),
            Err(UnknownTag("double".to_string()))
        );
    }

    #[test]
    fn serializes_for_templates() {
        let arg = Arg {
            name: "id".into(),
            wire_type: WireType::NewId,
            interface: Some("callback".into()),
            allow_null: false,
            enumeration: None,
            summary: String::new(),
        };
        let value = serde_json::to_value(&arg).unwrap();
        assert_eq!(value["type"], "new_id");
        assert_eq!(value["interface"], "callback");
        assert!(value["enum"].is_null());
        assert_eq!(serde_json::to_value(Kind::Event).unwrap(), "event");
    }
}
