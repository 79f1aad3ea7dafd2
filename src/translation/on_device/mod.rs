//! On-device inference: engine contract, model asset cache, session manager.

pub mod asset;
pub mod engine;
mod session;

pub use asset::{FsAssetSource, ModelAssetSource, ModelCache};
pub use engine::{
    BoxError, EngineLoader, EngineOptions, InferenceEngine, InferenceSession, MAX_TOKENS,
    ResultListener, SessionOptions, TOP_K, TOP_P,
};
pub use session::OnDeviceBackend;
