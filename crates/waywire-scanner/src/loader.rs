use std::io::Read;
use std::path::Path;

use tracing::debug;

use crate::config::ScanConfig;
use crate::error::{Result, SchemaError};
use crate::model::Protocol;
use crate::parser::parse;

/// Read a protocol document from disk and parse it.
pub fn load_protocol(path: &Path, config: &ScanConfig) -> Result<Protocol> {
    let xml = read_document(path, config.max_document_size)?;
    parse(&xml, &config.trim_prefix)
}

/// Read a text file, refusing anything larger than `max` bytes.
pub fn read_document(path: &Path, max: u64) -> Result<String> {
    let io_err = |source| SchemaError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = std::fs::File::open(path).map_err(io_err)?;
    let size = file.metadata().map_err(io_err)?.len();
    if size > max {
        return Err(SchemaError::TooLarge {
            path: path.to_path_buf(),
            size,
            max,
        });
    }

    let mut content = String::new();
    file.take(max.saturating_add(1))
        .read_to_string(&mut content)
        .map_err(io_err)?;
    if content.len() as u64 > max {
        return Err(SchemaError::TooLarge {
            path: path.to_path_buf(),
            size: content.len() as u64,
            max,
        });
    }
    debug!(path = %path.display(), bytes = content.len(), "read protocol document");
    Ok(content)
}
