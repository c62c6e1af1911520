use roxmltree::{Document, Node};
use tracing::{debug, trace};

use crate::error::{Result, SchemaError};
use crate::model::{Arg, Entry, Enum, Interface, Kind, Message, Protocol, WireType};

/// Parse a protocol document and run the analysis pass.
///
/// `trim_prefix` is removed from every interface name and from every
/// argument's interface constraint. Opcodes are assigned per list: the
/// n-th `<request>` of an interface gets opcode n no matter how requests
/// and events are interleaved in the document.
pub fn parse(xml: &str, trim_prefix: &str) -> Result<Protocol> {
    let doc = Document::parse(xml)?;
    let root = doc.root_element();
    if root.tag_name().name() != "protocol" {
        return Err(SchemaError::UnexpectedRoot(root.tag_name().name().to_string()));
    }

    let mut protocol = Protocol {
        name: required(&doc, root, "name")?.to_string(),
        trim_prefix: trim_prefix.to_string(),
        interfaces: Vec::new(),
    };

    for node in elements(root) {
        match node.tag_name().name() {
            "interface" => protocol.interfaces.push(parse_interface(&doc, node)?),
            "copyright" | "description" => {}
            other => trace!(element = other, "ignoring element"),
        }
    }

    analyze(&mut protocol);
    debug!(
        protocol = %protocol.name,
        interfaces = protocol.interfaces.len(),
        "parsed protocol"
    );
    Ok(protocol)
}

fn analyze(protocol: &mut Protocol) {
    let prefix = protocol.trim_prefix.clone();
    for iface in &mut protocol.interfaces {
        iface.name = trim(&iface.name, &prefix);

        let lists = [
            (Kind::Request, &mut iface.requests),
            (Kind::Event, &mut iface.events),
        ];
        for (kind, messages) in lists {
            for (index, message) in messages.iter_mut().enumerate() {
                message.kind = kind;
                message.opcode = index as u16;
                message.interface = iface.name.clone();
                for arg in &mut message.args {
                    if let Some(target) = &arg.interface {
                        arg.interface = Some(trim(target, &prefix));
                    }
                }
            }
        }
    }
}

fn trim(name: &str, prefix: &str) -> String {
    name.strip_prefix(prefix).unwrap_or(name).to_string()
}

fn parse_interface(doc: &Document, node: Node) -> Result<Interface> {
    let (summary, description) = description_of(node);
    let mut iface = Interface {
        name: required(doc, node, "name")?.to_string(),
        version: number(doc, node, "version")?,
        summary,
        description,
        requests: Vec::new(),
        events: Vec::new(),
        enums: Vec::new(),
    };

    for child in elements(node) {
        match child.tag_name().name() {
            "request" => iface
                .requests
                .push(parse_message(doc, child, &iface.name, Kind::Request)?),
            "event" => iface
                .events
                .push(parse_message(doc, child, &iface.name, Kind::Event)?),
            "enum" => iface.enums.push(parse_enum(doc, child)?),
            _ => {}
        }
    }
    Ok(iface)
}

fn parse_message(doc: &Document, node: Node, interface: &str, kind: Kind) -> Result<Message> {
    let name = required(doc, node, "name")?.to_string();
    let since = match node.attribute("since") {
        Some(_) => number(doc, node, "since")?,
        None => 1,
    };
    let (summary, description) = description_of(node);

    let mut args = Vec::new();
    for child in elements(node).filter(|n| n.has_tag_name("arg")) {
        let arg_name = required(doc, child, "name")?;
        let tag = required(doc, child, "type")?;
        let wire_type =
            tag.parse::<WireType>()
                .map_err(|_| SchemaError::UnknownWireType {
                    interface: interface.to_string(),
                    message: name.clone(),
                    arg: arg_name.to_string(),
                    tag: tag.to_string(),
                })?;
        args.push(Arg {
            name: arg_name.to_string(),
            wire_type,
            interface: child.attribute("interface").map(str::to_string),
            allow_null: child.attribute("allow-null") == Some("true"),
            enumeration: child.attribute("enum").map(str::to_string),
            summary: child.attribute("summary").unwrap_or_default().to_string(),
        });
    }

    Ok(Message {
        name,
        kind,
        opcode: 0,
        interface: interface.to_string(),
        since,
        destructor: node.attribute("type") == Some("destructor"),
        summary,
        description,
        args,
    })
}

fn parse_enum(doc: &Document, node: Node) -> Result<Enum> {
    let (summary, description) = description_of(node);
    let mut entries = Vec::new();
    for child in elements(node).filter(|n| n.has_tag_name("entry")) {
        entries.push(Entry {
            name: required(doc, child, "name")?.to_string(),
            value: number(doc, child, "value")?,
            summary: child.attribute("summary").unwrap_or_default().to_string(),
        });
    }
    Ok(Enum {
        name: required(doc, node, "name")?.to_string(),
        bitfield: node.attribute("bitfield") == Some("true"),
        summary,
        description,
        entries,
    })
}

fn elements<'a, 'input>(node: Node<'a, 'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(Node::is_element)
}

/// `(summary, text)` of the node's `<description>` child, both trimmed.
fn description_of(node: Node) -> (String, String) {
    let Some(desc) = elements(node).find(|n| n.has_tag_name("description")) else {
        return (String::new(), String::new());
    };
    let summary = desc.attribute("summary").unwrap_or_default().trim().to_string();
    let text: String = desc
        .descendants()
        .filter(Node::is_text)
        .filter_map(|n| n.text())
        .collect();
    (summary, text.trim().to_string())
}

fn line_of(doc: &Document, node: Node) -> u32 {
    doc.text_pos_at(node.range().start).row
}

fn required<'a>(doc: &Document, node: Node<'a, '_>, attribute: &'static str) -> Result<&'a str> {
    node.attribute(attribute)
        .ok_or_else(|| SchemaError::MissingAttribute {
            element: node.tag_name().name().to_string(),
            attribute,
            line: line_of(doc, node),
        })
}

/// Decimal or `0x`-prefixed hexadecimal.
fn number(doc: &Document, node: Node, attribute: &'static str) -> Result<u32> {
    let raw = required(doc, node, attribute)?.trim();
    let parsed = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => raw.parse(),
    };
    parsed.map_err(|_| SchemaError::InvalidNumber {
        attribute,
        value: raw.to_string(),
        line: line_of(doc, node),
    })
}
