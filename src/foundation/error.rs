/// Convenience result type used across splice.
pub type SpliceResult<T> = Result<T, SpliceError>;

/// Top-level error taxonomy used by compiler and engine APIs.
///
/// Only `Validation`, `Lowering`, `NoContent` and `Engine` abort a whole render.
/// `Resolution` errors are scoped to one block and are normally absorbed by the
/// timeline compiler into its diagnostics.
#[derive(thiserror::Error, Debug)]
pub enum SpliceError {
    /// Malformed or inconsistent timeline document.
    #[error("validation error: {0}")]
    Validation(String),

    /// A block's duration could not be determined.
    #[error("resolution error in block '{block}' (source '{source_ref}'): {reason}")]
    Resolution {
        /// Owning block id.
        block: String,
        /// The `src` of the source that could not be resolved.
        source_ref: String,
        /// Human-readable reason.
        reason: String,
    },

    /// No lowering handler is registered for a kind.
    #[error("lowering error: {0}")]
    Lowering(String),

    /// Every clip was skipped; the graph would have no outputs.
    #[error("no content to render")]
    NoContent,

    /// The external engine exited unsuccessfully.
    #[error("engine error: ffmpeg exited with {status}: {stderr}")]
    Engine {
        /// Exit status as reported by the OS.
        status: String,
        /// Captured tail of the engine's stderr.
        stderr: String,
    },

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SpliceError {
    /// Build a [`SpliceError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`SpliceError::Resolution`] value.
    pub fn resolution(
        block: impl Into<String>,
        source_ref: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Resolution {
            block: block.into(),
            source_ref: source_ref.into(),
            reason: reason.into(),
        }
    }

    /// Build a [`SpliceError::Lowering`] value.
    pub fn lowering(msg: impl Into<String>) -> Self {
        Self::Lowering(msg.into())
    }

    /// Build a [`SpliceError::Engine`] value.
    pub fn engine(status: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::Engine {
            status: status.into(),
            stderr: stderr.into(),
        }
    }

    /// Build a [`SpliceError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Whether this error aborts the whole render rather than a single block.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Resolution { .. })
    }
}

impl From<serde_json::Error> for SpliceError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serde(e.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
