use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::asset::{ModelAssetSource, ModelCache};
use super::engine::{
    EngineLoader, EngineOptions, InferenceEngine, InferenceSession, ResultListener, SessionOptions,
};
use crate::config::TranslateConfig;
use crate::error::{Result, TranslateError};
use crate::translation::backend::{Backend, BackendKind, PartialFn};
use crate::translation::cancel::CancelFlag;
use crate::translation::prompt::build_on_device_query;
use crate::translation::segment::SENTENCE_BOUNDARIES;

type SharedSession = Arc<Mutex<Box<dyn InferenceSession>>>;

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// An engine together with the locator it was built from.
struct LoadedModel {
    engine: Arc<dyn InferenceEngine>,
    locator: String,
}

#[derive(Default)]
struct State {
    model: Option<LoadedModel>,
    session: Option<SharedSession>,
}

/// Runs chunks through a local inference engine.
///
/// The engine is loaded lazily and kept while the model locator stays the
/// same; [`release`](Backend::release) drops it together with any open
/// session.
pub struct OnDeviceBackend {
    loader: Option<Arc<dyn EngineLoader>>,
    assets: Arc<dyn ModelAssetSource>,
    cache: ModelCache,
    state: Mutex<State>,
}

impl OnDeviceBackend {
    pub fn new(
        loader: Option<Arc<dyn EngineLoader>>,
        assets: Arc<dyn ModelAssetSource>,
        cache: ModelCache,
    ) -> Self {
        Self {
            loader,
            assets,
            cache,
            state: Mutex::new(State::default()),
        }
    }

    /// Locator of the currently loaded engine, if any.
    pub fn loaded_locator(&self) -> Option<String> {
        lock(&self.state).model.as_ref().map(|m| m.locator.clone())
    }

    /// Returns the engine for `locator`, loading it if necessary.
    ///
    /// A different locator than the loaded one releases the old engine
    /// first. Any failure leaves the manager unloaded.
    pub async fn ensure_loaded(&self, locator: Option<&str>) -> Result<Arc<dyn InferenceEngine>> {
        let locator = locator.filter(|l| !l.is_empty()).ok_or_else(|| {
            TranslateError::ConfigurationMissing("On-device model path".to_string())
        })?;

        {
            let state = lock(&self.state);
            if let Some(model) = state.model.as_ref().filter(|m| m.locator == locator) {
                return Ok(Arc::clone(&model.engine));
            }
        }

        self.release();

        let loaded = self.load(locator).await;
        match loaded {
            Ok(engine) => {
                info!(locator, "loaded on-device model");
                lock(&self.state).model = Some(LoadedModel {
                    engine: Arc::clone(&engine),
                    locator: locator.to_string(),
                });
                Ok(engine)
            }
            Err(e) => {
                self.release();
                Err(e)
            }
        }
    }

    async fn load(&self, locator: &str) -> Result<Arc<dyn InferenceEngine>> {
        let loader = self.loader.clone().ok_or_else(|| {
            TranslateError::BackendInitFailed(
                "no on-device inference engine is available".to_string(),
            )
        })?;
        let assets = Arc::clone(&self.assets);
        let cache = self.cache.clone();
        let locator = locator.to_string();

        // Copying a model and building an engine both block for a long time.
        tokio::task::spawn_blocking(move || {
            let model_path = cache.resolve(assets.as_ref(), &locator)?;
            loader
                .load(&EngineOptions::for_model(model_path))
                .map_err(|e| TranslateError::BackendInitFailed(e.to_string()))
        })
        .await
        .map_err(|e| TranslateError::BackendInitFailed(e.to_string()))?
    }

    /// Generates the translation of one chunk with a fresh session.
    ///
    /// Resolves when the engine reports its final result, when `cancel`
    /// fires, or as soon as session setup fails.
    pub async fn translate_one(
        &self,
        engine: &Arc<dyn InferenceEngine>,
        chunk: &str,
        config: &TranslateConfig,
        cancel: &CancelFlag,
        on_partial: &mut PartialFn<'_>,
    ) -> Result<()> {
        let session = engine
            .create_session(&SessionOptions::with_temperature(config.temperature))
            .map_err(|e| TranslateError::BackendInitFailed(e.to_string()))?;
        let session: SharedSession = Arc::new(Mutex::new(session));
        let _guard = SessionGuard::register(self, &session);

        let (tx, mut rx) = mpsc::unbounded_channel::<(String, bool)>();
        {
            let mut session = lock(&session);
            session
                .add_query_chunk(&build_on_device_query(&config.system_prompt, chunk))
                .map_err(|e| TranslateError::BackendRuntimeFailed(e.to_string()))?;

            let listener: ResultListener = Box::new(move |partial, is_final| {
                // The receiver is gone once the call finished or was cancelled.
                let _ = tx.send((partial, is_final));
            });
            session
                .generate_response_async(listener)
                .map_err(|e| TranslateError::BackendRuntimeFailed(e.to_string()))?;
        }

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => return Ok(()),
                event = rx.recv() => {
                    let Some((partial, is_final)) = event else {
                        return Err(TranslateError::BackendRuntimeFailed(
                            "engine stopped without a final result".to_string(),
                        ));
                    };
                    if cancel.is_cancelled() {
                        return Ok(());
                    }
                    if !partial.is_empty() {
                        on_partial(partial);
                    }
                    if is_final {
                        debug!("on-device session finished");
                        return Ok(());
                    }
                }
            }
        }
    }
}

/// Closes a session on every exit path and unregisters it.
struct SessionGuard<'a> {
    backend: &'a OnDeviceBackend,
    session: SharedSession,
}

impl<'a> SessionGuard<'a> {
    fn register(backend: &'a OnDeviceBackend, session: &SharedSession) -> Self {
        lock(&backend.state).session = Some(Arc::clone(session));
        Self {
            backend,
            session: Arc::clone(session),
        }
    }
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        {
            let mut state = lock(&self.backend.state);
            if state
                .session
                .as_ref()
                .is_some_and(|s| Arc::ptr_eq(s, &self.session))
            {
                state.session = None;
            }
        }
        lock(&self.session).close();
    }
}

#[async_trait]
impl Backend for OnDeviceBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::OnDevice
    }

    fn boundaries(&self) -> &'static [char] {
        SENTENCE_BOUNDARIES
    }

    async fn translate_chunk(
        &self,
        chunk: &str,
        config: &TranslateConfig,
        cancel: &CancelFlag,
        on_partial: &mut PartialFn<'_>,
    ) -> Result<()> {
        // A cancelled load keeps running on its blocking thread; the engine
        // it builds is dropped without being registered.
        let engine = tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(()),
            loaded = self.ensure_loaded(config.model_locator.as_deref()) => loaded?,
        };
        if cancel.is_cancelled() {
            return Ok(());
        }
        self.translate_one(&engine, chunk, config, cancel, on_partial)
            .await
    }

    fn release(&self) {
        let (model, session) = {
            let mut state = lock(&self.state);
            (state.model.take(), state.session.take())
        };
        if let Some(session) = session {
            lock(&session).close();
        }
        if let Some(model) = model {
            info!(locator = %model.locator, "released on-device model");
        }
    }
}
