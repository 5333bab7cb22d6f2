use std::collections::HashMap;
use std::path::Path;

pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Extension -> mime type lookup, read-only after startup.
#[derive(Debug, Clone, Default)]
pub struct MimeTable {
    types: HashMap<String, String>,
}

impl MimeTable {
    pub fn new(types: &HashMap<String, String>) -> Self {
        Self {
            types: types
                .iter()
                .map(|(ext, mime)| (ext.trim_start_matches('.').to_ascii_lowercase(), mime.clone()))
                .collect(),
        }
    }

    /// Mime type for `path`, by its extension, case-insensitively.
    pub fn lookup(&self, path: &Path) -> &str {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| self.types.get(&ext.to_ascii_lowercase()))
            .map(String::as_str)
            .unwrap_or(DEFAULT_MIME_TYPE)
    }
}
