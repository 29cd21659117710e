//! Error types for response cache backends.

/// Errors that can occur while reading from or writing to a response cache.
///
/// Cache errors are always best-effort from the caller's perspective: a failed
/// read is treated as a miss and a failed write is logged and ignored, so
/// these errors never abort a fetch.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// A filesystem operation on the cache storage failed.
    #[error("Cache I/O error at {path}: {details}")]
    Io {
        /// The file or directory involved
        path: String,
        /// What was being attempted
        details: String,
        /// The failing I/O error, when one exists
        #[source]
        source: Option<std::io::Error>,
    },

    /// A cached body or the cache file could not be encoded or decoded.
    #[error("Cache serialization error: {details}")]
    Serialization {
        /// What was being encoded or decoded
        details: String,
        /// The failing codec error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl CacheError {
    /// Create an `Io` error from an I/O error and path.
    pub fn io(
        path: impl Into<String>,
        details: impl Into<String>,
        source: Option<std::io::Error>,
    ) -> Self {
        CacheError::Io {
            path: path.into(),
            details: details.into(),
            source,
        }
    }

    /// Create a `Serialization` error from any serialization error.
    pub fn serialization(
        details: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        CacheError::Serialization {
            details: details.into(),
            source: Box::new(source),
        }
    }
}
