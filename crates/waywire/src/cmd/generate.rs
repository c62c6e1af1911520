use std::io::Write;
use std::path::Path;

use tracing::info;
use waywire_scanner::{generate_named, load_protocol, read_document, ScanConfig, TypeTable};

use crate::cmd::GenerateArgs;
use crate::exit::{generate_error, io_error, schema_error, CliResult, SUCCESS};

pub const BUILTIN_RUST: &str = "builtin:rust";

pub fn run(args: GenerateArgs) -> CliResult<i32> {
    let config = ScanConfig::with_trim_prefix(args.trim_prefix);
    let (name, template) = load_template(&args.template, config.max_document_size)?;

    let protocol = load_protocol(&args.protocol, &config)
        .map_err(|err| schema_error("failed to load protocol", err))?;
    let output = generate_named(&name, &protocol, &template, &TypeTable::rust())
        .map_err(|err| generate_error("generation failed", err))?;

    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(output.as_bytes())
        .and_then(|()| stdout.flush())
        .map_err(|err| io_error("failed to write output", err))?;

    info!(
        protocol = %protocol.name,
        interfaces = protocol.interfaces.len(),
        "bindings generated"
    );
    Ok(SUCCESS)
}

fn load_template(arg: &str, max: u64) -> CliResult<(String, String)> {
    if arg == BUILTIN_RUST {
        return Ok((
            "client.rs.j2".to_string(),
            waywire_scanner::DEFAULT_TEMPLATE.to_string(),
        ));
    }
    let path = Path::new(arg);
    let source =
        read_document(path, max).map_err(|err| schema_error("failed to load template", err))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| arg.to_string());
    Ok((name, source))
}
