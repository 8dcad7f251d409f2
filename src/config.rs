/// Largest entry the extractor will inflate (100 MiB).
pub const DEFAULT_MAX_DOCUMENT_SIZE: u64 = 100 * 1024 * 1024;

/// Settings for one pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Extension of document-bearing entries, without the leading dot
    pub document_extension: String,
    /// Entries whose uncompressed size exceeds this are skipped
    pub max_document_size: u64,
}

impl PipelineConfig {
    /// Set the document extension; a leading dot is ignored.
    pub fn with_extension(mut self, extension: &str) -> Self {
        self.document_extension = extension.trim_start_matches('.').to_ascii_lowercase();
        self
    }

    /// Set the largest entry, in bytes, that will be decoded.
    pub fn with_max_document_size(mut self, max: u64) -> Self {
        self.max_document_size = max;
        self
    }

    /// Whether an entry name carries the document extension (case-insensitive).
    pub fn is_document_name(&self, name: &str) -> bool {
        let suffix = self.document_extension.len() + 1;
        if name.len() <= suffix || !name.is_char_boundary(name.len() - suffix) {
            return false;
        }

        let tail = &name[name.len() - suffix..];
        tail.starts_with('.') && tail[1..].eq_ignore_ascii_case(&self.document_extension)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            document_extension: "xml".to_string(),
            max_document_size: DEFAULT_MAX_DOCUMENT_SIZE,
        }
    }
}
