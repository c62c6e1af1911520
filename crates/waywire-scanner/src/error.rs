use std::path::PathBuf;

use crate::model::WireType;

/// Errors raised while loading or parsing a protocol document.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// The document could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The document exceeds the configured size limit.
    #[error("{}: document is {size} bytes, limit is {max}", path.display())]
    TooLarge { path: PathBuf, size: u64, max: u64 },

    /// The document is not well-formed XML.
    #[error("malformed document: {0}")]
    Xml(#[from] roxmltree::Error),

    /// The root element is not `<protocol>`.
    #[error("expected <protocol> root element, found <{0}>")]
    UnexpectedRoot(String),

    /// A required attribute is absent.
    #[error("line {line}: <{element}> is missing required attribute `{attribute}`")]
    MissingAttribute {
        element: String,
        attribute: &'static str,
        line: u32,
    },

    /// A numeric attribute could not be parsed.
    #[error("line {line}: invalid number {value:?} for `{attribute}`")]
    InvalidNumber {
        attribute: &'static str,
        value: String,
        line: u32,
    },

    /// An argument names a wire type outside the fixed set.
    #[error("{interface}.{message}: argument `{arg}` has undeclared wire type {tag:?}")]
    UnknownWireType {
        interface: String,
        message: String,
        arg: String,
        tag: String,
    },
}

/// Errors raised while rendering bindings.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// An argument's wire type has no entry in the supplied type table.
    #[error("{interface}.{message}: argument `{arg}` has wire type `{tag}` with no type mapping")]
    UnknownType {
        interface: String,
        message: String,
        arg: String,
        tag: WireType,
    },

    /// The template failed to compile or render.
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),
}

pub type Result<T> = std::result::Result<T, SchemaError>;
