//! Capability contract for a local inference engine.
//!
//! The engine itself lives outside this crate. An application links one in
//! by implementing [`EngineLoader`] and handing it to the translator builder.

use std::path::PathBuf;
use std::sync::Arc;

/// Error type returned by engine implementations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Upper bound on generated tokens per session.
pub const MAX_TOKENS: usize = 768;

/// Top-k sampling used for every session.
pub const TOP_K: usize = 40;

/// Top-p sampling used for every session.
pub const TOP_P: f32 = 1.0;

/// Options for building an engine from a local model file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    pub model_path: PathBuf,
    pub max_tokens: usize,
}

impl EngineOptions {
    pub fn for_model(model_path: PathBuf) -> Self {
        Self {
            model_path,
            max_tokens: MAX_TOKENS,
        }
    }
}

/// Sampling options for one session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionOptions {
    pub temperature: f32,
    pub top_k: usize,
    pub top_p: f32,
}

impl SessionOptions {
    pub const fn with_temperature(temperature: f32) -> Self {
        Self {
            temperature,
            top_k: TOP_K,
            top_p: TOP_P,
        }
    }
}

/// Receives `(partial_text, is_final)` pairs, possibly from an engine thread.
pub type ResultListener = Box<dyn FnMut(String, bool) + Send>;

/// Builds engines. Loading is expensive and may block.
pub trait EngineLoader: Send + Sync {
    fn load(&self, options: &EngineOptions) -> Result<Arc<dyn InferenceEngine>, BoxError>;
}

/// A loaded model. Native resources are freed when the last handle drops.
pub trait InferenceEngine: Send + Sync {
    fn create_session(&self, options: &SessionOptions)
    -> Result<Box<dyn InferenceSession>, BoxError>;
}

/// One generation context on top of an engine.
pub trait InferenceSession: Send {
    /// Appends text to the pending query.
    fn add_query_chunk(&mut self, text: &str) -> Result<(), BoxError>;

    /// Starts generation and returns without waiting for it.
    ///
    /// The listener is called for every partial result and exactly once with
    /// `is_final == true`, unless the session is closed first.
    fn generate_response_async(&mut self, listener: ResultListener) -> Result<(), BoxError>;

    /// Stops generation and frees the session. Must tolerate repeated calls.
    fn close(&mut self);
}
