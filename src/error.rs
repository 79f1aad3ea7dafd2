//! Error taxonomy for the translation core.
//!
//! Every variant is terminal for the call that produced it. Malformed
//! server-sent-event lines are not represented here: the parser skips them
//! and logs a warning instead.

use thiserror::Error;

/// A failure that terminates a `translate` call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslateError {
    /// A required setting (model path, address, ...) is empty.
    #[error("{0} is not set in settings.")]
    ConfigurationMissing(String),

    /// The on-device model file could not be resolved or copied.
    #[error("Failed to copy or access the on-device model file: {0}")]
    ResourceUnavailable(String),

    /// The inference engine or one of its sessions could not be built.
    #[error("Failed to initialize on-device model: {0}")]
    BackendInitFailed(String),

    /// Generation failed after the backend was set up.
    #[error("On-device inference failed: {0}")]
    BackendRuntimeFailed(String),

    /// The remote endpoint answered with a non-2xx status.
    #[error("Error: API request failed with code {code}")]
    Api { code: u16 },

    /// Connecting to the endpoint or reading its stream failed.
    #[error("Error: Network request failed. Check IP address and server status. ({0})")]
    Network(String),
}

impl TranslateError {
    /// Returns `true` for failures caused by settings rather than by I/O.
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::ConfigurationMissing(_))
    }
}

pub type Result<T> = std::result::Result<T, TranslateError>;
