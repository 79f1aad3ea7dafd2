//! The capability shared by the on-device and remote backends.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::cancel::CancelFlag;
use crate::config::TranslateConfig;
use crate::error::Result;

/// Which backend a call is dispatched to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// Local inference engine (settings value `0`).
    OnDevice,
    /// OpenAI-compatible chat-completion endpoint (settings value `1`).
    #[default]
    Remote,
}

impl BackendKind {
    /// Maps the legacy numeric `translationMethod` setting.
    pub const fn from_method(method: i64) -> Option<Self> {
        match method {
            0 => Some(Self::OnDevice),
            1 => Some(Self::Remote),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OnDevice => "on-device",
            Self::Remote => "remote",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "on-device" | "ondevice" | "local" | "0" => Ok(Self::OnDevice),
            "remote" | "api" | "1" => Ok(Self::Remote),
            other => Err(format!(
                "Unknown translation method: '{other}' (expected 'on-device' or 'remote')"
            )),
        }
    }
}

/// Receives each partial result of one chunk.
pub type PartialFn<'a> = dyn FnMut(String) + Send + 'a;

/// Streams the translation of one chunk.
///
/// Implementations take `&self` so that [`release`](Self::release) can run
/// from a cancelling task while `translate_chunk` is suspended.
#[async_trait]
pub trait Backend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Markers the segmenter may cut at when feeding this backend.
    fn boundaries(&self) -> &'static [char];

    /// Translates `chunk`, passing partial results to `on_partial` in order.
    ///
    /// Returns `Ok(())` both on completion and when `cancel` fires; the
    /// orchestrator tells the two apart by checking the flag.
    async fn translate_chunk(
        &self,
        chunk: &str,
        config: &TranslateConfig,
        cancel: &CancelFlag,
        on_partial: &mut PartialFn<'_>,
    ) -> Result<()>;

    /// Frees resources held between chunks. Idempotent.
    fn release(&self) {}
}
