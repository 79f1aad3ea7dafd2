//! Drives one backend over the chunks of a long input.

use std::path::PathBuf;
use std::sync::Arc;

use reqwest::Client;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::backend::{Backend, BackendKind};
use super::cancel::CancelFlag;
use super::on_device::{EngineLoader, FsAssetSource, ModelAssetSource, ModelCache, OnDeviceBackend};
use super::remote::RemoteBackend;
use super::segment::split;
use super::sink::{Collector, Outcome, TranslationSink};
use crate::config::TranslateConfig;
use crate::error::Result;
use crate::paths;

/// Chunked, cancellable streaming translator.
///
/// One instance runs at most one call at a time; concurrent `translate`
/// calls queue behind each other. [`cancel`](Self::cancel) may be called
/// from any task or thread while a call is running.
///
/// ```no_run
/// # async fn demo() {
/// use std::sync::Arc;
/// use tlstream::config::TranslateConfig;
/// use tlstream::translation::{BackendKind, Collector, Translator};
///
/// let translator = Arc::new(Translator::builder().build());
/// let config = TranslateConfig {
///     address: "192.168.1.10:1234".to_string(),
///     model_name: "gemma-3-12b".to_string(),
///     ..TranslateConfig::default()
/// };
///
/// let mut sink = Collector::default();
/// translator
///     .translate("Hello world.", BackendKind::Remote, &config, &mut sink)
///     .await;
/// println!("{}", sink.text());
/// # }
/// ```
pub struct Translator {
    cancel: CancelFlag,
    call_gate: Mutex<()>,
    on_device: OnDeviceBackend,
    remote: RemoteBackend,
}

impl Translator {
    pub fn builder() -> TranslatorBuilder {
        TranslatorBuilder::default()
    }

    fn backend(&self, kind: BackendKind) -> &dyn Backend {
        match kind {
            BackendKind::OnDevice => &self.on_device,
            BackendKind::Remote => &self.remote,
        }
    }

    /// The on-device session manager, for inspecting what is loaded.
    pub const fn on_device(&self) -> &OnDeviceBackend {
        &self.on_device
    }

    /// Translates `text`, streaming partial results into `sink`.
    ///
    /// `config` is copied at the start of the call. Exactly one of
    /// `on_error` or `on_complete` fires unless the call is cancelled, in
    /// which case neither does. On-device resources are released when the
    /// call ends, whichever way it ends.
    pub async fn translate(
        &self,
        text: &str,
        backend: BackendKind,
        config: &TranslateConfig,
        sink: &mut dyn TranslationSink,
    ) {
        if text.is_empty() {
            sink.on_complete();
            return;
        }

        let _call = self.call_gate.lock().await;
        self.cancel.reset();

        let config = config.clone();
        let backend = self.backend(backend);
        let _release = ReleaseOnDrop(backend);

        info!(
            backend = %backend.kind(),
            chars = text.chars().count(),
            threshold = config.split_threshold,
            "starting translation"
        );

        let mut remaining = text.to_string();
        let mut index = 0usize;

        while !remaining.is_empty() {
            if self.cancel.is_cancelled() {
                debug!(chunk = index, "cancelled before chunk");
                return;
            }

            let (chunk, rest) = split(&remaining, config.split_threshold, backend.boundaries());
            debug!(chunk = index, chars = chunk.chars().count(), "dispatching chunk");

            let mut relay = |partial: String| sink.on_result(&partial);
            let result = backend
                .translate_chunk(&chunk, &config, &self.cancel, &mut relay)
                .await;

            if self.cancel.is_cancelled() {
                debug!(chunk = index, "cancelled during chunk");
                return;
            }
            if let Err(e) = result {
                warn!(chunk = index, error = %e, "translation failed");
                sink.on_error(e);
                return;
            }

            remaining = rest;
            index += 1;
        }

        info!(chunks = index, "translation complete");
        sink.on_complete();
    }

    /// Runs [`translate`](Self::translate) and collects the output.
    ///
    /// Returns `Ok(None)` when the call was cancelled.
    pub async fn translate_to_string(
        &self,
        text: &str,
        backend: BackendKind,
        config: &TranslateConfig,
    ) -> Result<Option<String>> {
        let mut collector = Collector::default();
        self.translate(text, backend, config, &mut collector).await;
        match collector.outcome {
            Outcome::Completed => Ok(Some(collector.text())),
            Outcome::Failed(e) => Err(e),
            Outcome::Pending => Ok(None),
        }
    }

    /// Stops the running call, if any.
    ///
    /// Aborts the in-flight request or inference session and releases the
    /// on-device engine. Idempotent, and a no-op when nothing is running.
    pub fn cancel(&self) {
        self.cancel.cancel();
        self.on_device.release();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Releases backend resources when the call scope ends.
struct ReleaseOnDrop<'a>(&'a dyn Backend);

impl Drop for ReleaseOnDrop<'_> {
    fn drop(&mut self) {
        self.0.release();
    }
}

/// Assembles a [`Translator`].
#[derive(Default)]
pub struct TranslatorBuilder {
    engine_loader: Option<Arc<dyn EngineLoader>>,
    assets: Option<Arc<dyn ModelAssetSource>>,
    models_dir: Option<PathBuf>,
    http_client: Option<Client>,
}

impl TranslatorBuilder {
    /// Links an on-device inference engine. Without one, on-device calls
    /// fail with `BackendInitFailed`.
    #[must_use]
    pub fn engine_loader(mut self, loader: Arc<dyn EngineLoader>) -> Self {
        self.engine_loader = Some(loader);
        self
    }

    /// Overrides how model locators are opened (filesystem by default).
    #[must_use]
    pub fn asset_source(mut self, assets: Arc<dyn ModelAssetSource>) -> Self {
        self.assets = Some(assets);
        self
    }

    /// Overrides the directory model files are cached in.
    #[must_use]
    pub fn models_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.models_dir = Some(dir.into());
        self
    }

    /// Uses a preconfigured HTTP client for the remote backend.
    #[must_use]
    pub fn http_client(mut self, client: Client) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn build(self) -> Translator {
        let models_dir = self.models_dir.unwrap_or_else(|| {
            paths::models_dir()
                .unwrap_or_else(|_| std::env::temp_dir().join("tlstream").join("models"))
        });
        let assets = self
            .assets
            .unwrap_or_else(|| Arc::new(FsAssetSource) as Arc<dyn ModelAssetSource>);
        let remote = self
            .http_client
            .map_or_else(RemoteBackend::new, RemoteBackend::with_client);

        Translator {
            cancel: CancelFlag::new(),
            call_gate: Mutex::new(()),
            on_device: OnDeviceBackend::new(
                self.engine_loader,
                assets,
                ModelCache::new(models_dir),
            ),
            remote,
        }
    }
}
