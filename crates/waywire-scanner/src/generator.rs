use minijinja::value::Rest;
use minijinja::{context, Environment, ErrorKind};
use tracing::debug;

use crate::error::GenerateError;
use crate::model::Protocol;
use crate::naming;
use crate::types::TypeTable;

/// Template for Rust client bindings shipped with the scanner.
pub const DEFAULT_TEMPLATE: &str = include_str!("../templates/client.rs.j2");

/// Render `template` against `protocol`.
///
/// Every argument's wire type must be mapped in `types`; the check runs
/// before any rendering so a missing mapping never produces partial
/// output. The template sees `protocol` and `trim_prefix` plus the naming
/// and type helpers (`exported`, `unexported`, `ident`, `const_name`,
/// `comment`, `storage_type`, `codec_type`).
pub fn generate(
    protocol: &Protocol,
    template: &str,
    types: &TypeTable,
) -> Result<String, GenerateError> {
    generate_named("template", protocol, template, types)
}

/// Like [`generate`], naming the template in error messages.
pub fn generate_named(
    name: &str,
    protocol: &Protocol,
    template: &str,
    types: &TypeTable,
) -> Result<String, GenerateError> {
    check_types(protocol, types)?;

    let env = environment(types);
    let output = env.render_named_str(
        name,
        template,
        context! {
            protocol => protocol,
            trim_prefix => &protocol.trim_prefix,
        },
    )?;
    debug!(
        protocol = %protocol.name,
        template = name,
        bytes = output.len(),
        "generated bindings"
    );
    Ok(output)
}

fn check_types(protocol: &Protocol, types: &TypeTable) -> Result<(), GenerateError> {
    for iface in &protocol.interfaces {
        for message in iface.messages() {
            if let Some(arg) = message.args.iter().find(|arg| types.get(arg.wire_type).is_none()) {
                return Err(GenerateError::UnknownType {
                    interface: iface.name.clone(),
                    message: message.name.clone(),
                    arg: arg.name.clone(),
                    tag: arg.wire_type,
                });
            }
        }
    }
    Ok(())
}

fn environment(types: &TypeTable) -> Environment<'static> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.set_keep_trailing_newline(true);

    env.add_function("exported", |parts: Rest<String>| naming::exported(&parts[..]));
    env.add_function("unexported", |parts: Rest<String>| {
        naming::unexported(&parts[..])
    });
    env.add_function("const_name", |parts: Rest<String>| {
        naming::const_name(&parts[..])
    });
    env.add_function("ident", |name: String| naming::ident(&name));
    env.add_function("comment", |text: String| naming::comment(&text));

    let table = types.clone();
    env.add_function("storage_type", move |tag: String| {
        mapping(&table, &tag).map(|m| m.storage.clone())
    });
    let table = types.clone();
    env.add_function("codec_type", move |tag: String| {
        mapping(&table, &tag).map(|m| m.codec.clone())
    });
    env
}

fn mapping<'a>(
    table: &'a TypeTable,
    tag: &str,
) -> Result<&'a crate::types::TypeMapping, minijinja::Error> {
    table.lookup(tag).ok_or_else(|| {
        minijinja::Error::new(
            ErrorKind::InvalidOperation,
            format!("no type mapping for wire type `{tag}`"),
        )
    })
}
