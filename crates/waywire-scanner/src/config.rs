/// Controls how protocol documents are loaded and analyzed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// Removed from interface names and interface references.
    pub trim_prefix: String,
    /// Maximum size in bytes of a protocol document read from disk.
    pub max_document_size: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            trim_prefix: String::new(),
            max_document_size: 4 * 1024 * 1024,
        }
    }
}

impl ScanConfig {
    pub fn with_trim_prefix(prefix: impl Into<String>) -> Self {
        Self {
            trim_prefix: prefix.into(),
            ..Self::default()
        }
    }
}
