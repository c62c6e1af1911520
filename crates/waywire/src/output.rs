use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use waywire_conn::Message;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

pub fn table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

pub fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

#[derive(Serialize)]
struct MessageOutput {
    object: u32,
    opcode: u16,
    size: usize,
    fds: usize,
    payload: String,
    timestamp: String,
}

/// Print one received message header.
pub fn print_message(message: &Message, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&MessageOutput {
            object: message.object().get(),
            opcode: message.opcode(),
            size: message.payload().len(),
            fds: message.fds().len(),
            payload: hex(message.payload()),
            timestamp: now_unix_seconds(),
        }),
        OutputFormat::Table => {
            let mut table = table(vec!["OBJECT", "OPCODE", "SIZE", "FDS"]);
            table.add_row(vec![
                message.object().to_string(),
                message.opcode().to_string(),
                message.payload().len().to_string(),
                message.fds().len().to_string(),
            ]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("{message}"),
        OutputFormat::Raw => print_raw(message.payload()),
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn hex(data: &[u8]) -> String {
    data.iter().map(|b| format!("{b:02x}")).collect()
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
