use waywire_scanner::{load_protocol, Interface, Message, Protocol, ScanConfig};

use crate::cmd::InspectArgs;
use crate::exit::{schema_error, CliResult, SUCCESS};
use crate::output::{print_json, table, OutputFormat};

pub fn run(args: InspectArgs, format: OutputFormat) -> CliResult<i32> {
    let config = ScanConfig::with_trim_prefix(args.trim_prefix);
    let protocol = load_protocol(&args.protocol, &config)
        .map_err(|err| schema_error("failed to load protocol", err))?;

    match format {
        OutputFormat::Json => print_json(&protocol),
        OutputFormat::Table => print_table(&protocol),
        OutputFormat::Pretty => print_pretty(&protocol),
        OutputFormat::Raw => {
            for iface in &protocol.interfaces {
                println!("{}", iface.name);
            }
        }
    }
    Ok(SUCCESS)
}

fn print_table(protocol: &Protocol) {
    let mut out = table(vec!["INTERFACE", "VERSION", "KIND", "OPCODE", "MESSAGE", "ARGS"]);
    for iface in &protocol.interfaces {
        for message in iface.messages() {
            out.add_row(vec![
                iface.name.clone(),
                iface.version.to_string(),
                message.kind.to_string(),
                message.opcode.to_string(),
                message.name.clone(),
                signature(message),
            ]);
        }
    }
    println!("{out}");
}

fn print_pretty(protocol: &Protocol) {
    println!("protocol {}", protocol.name);
    for iface in &protocol.interfaces {
        print_interface(iface);
    }
}

fn print_interface(iface: &Interface) {
    println!("\n  {} v{}", iface.name, iface.version);
    for message in iface.messages() {
        let marker = if message.destructor { " (destructor)" } else { "" };
        println!(
            "    {:<7} {:>2} {}({}){marker}",
            message.kind.to_string(),
            message.opcode,
            message.name,
            signature(message)
        );
    }
    for e in &iface.enums {
        let entries: Vec<_> = e
            .entries
            .iter()
            .map(|entry| format!("{}={}", entry.name, entry.value))
            .collect();
        println!("    enum    {} {{ {} }}", e.name, entries.join(", "));
    }
}

/// `name: type<interface>` pairs, comma separated.
fn signature(message: &Message) -> String {
    message
        .args
        .iter()
        .map(|arg| match &arg.interface {
            Some(target) => format!("{}: {}<{target}>", arg.name, arg.wire_type),
            None => format!("{}: {}", arg.name, arg.wire_type),
        })
        .collect::<Vec<_>>()
        .join(", ")
}
