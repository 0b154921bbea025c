//! Session configuration.

/// Compression applied to every field write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressionConfig {
    /// Deflate (gzip) level, 0-9.
    pub deflate_level: i32,
    /// Whether to apply the byte-shuffle filter before deflate.
    pub shuffle: bool,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            deflate_level: 6,
            shuffle: false,
        }
    }
}

/// Configuration for a [`FileSession`](crate::session::FileSession).
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// Compression policy for written fields.
    pub compression: CompressionConfig,
}

impl SessionConfig {
    /// Replace the compression policy.
    pub fn with_compression(mut self, compression: CompressionConfig) -> Self {
        self.compression = compression;
        self
    }
}
