//! Protocol document parser and binding generator.
//!
//! [`parse`] turns an XML protocol description into a [`Protocol`] model
//! with opcodes assigned; [`generate`] renders that model through a
//! template, using the naming helpers in [`naming`] and a [`TypeTable`]
//! that maps wire types to generated types.

pub mod config;
pub mod error;
pub mod generator;
pub mod loader;
pub mod model;
pub mod naming;
pub mod parser;
pub mod types;

pub use config::ScanConfig;
pub use error::{GenerateError, Result, SchemaError};
pub use generator::{generate, generate_named, DEFAULT_TEMPLATE};
pub use loader::{load_protocol, read_document};
pub use model::{Arg, Entry, Enum, Interface, Kind, Message, Protocol, WireType};
pub use parser::parse;
pub use types::{TypeMapping, TypeTable};

/// A subset of the core display protocol, bundled for tests and demos.
pub const CORE_PROTOCOL: &str = include_str!("../protocols/wayland-core.xml");
