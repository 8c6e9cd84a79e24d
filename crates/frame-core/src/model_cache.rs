//! Single-slot model cache keyed by model file path

use crate::error::{LoadError, GENERIC_LOAD_MESSAGE};
use crate::model::{InferenceModel, ModelLoader};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use tracing::{debug, info, warn};

/// A deserialized model together with the path it was loaded from
pub struct LoadedModel {
    path: String,
    model: Box<dyn InferenceModel>,
}

impl LoadedModel {
    /// The exact path string used as the cache key
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn model_mut(&mut self) -> &mut dyn InferenceModel {
        self.model.as_mut()
    }
}

/// Owns at most one loaded model, reloading only when the path changes
pub struct ModelCache {
    loader: Box<dyn ModelLoader>,
    loaded: Option<LoadedModel>,
}

impl ModelCache {
    pub fn new(loader: Box<dyn ModelLoader>) -> Self {
        Self {
            loader,
            loaded: None,
        }
    }

    /// Make sure the model at `path` is the loaded one
    ///
    /// An empty path fails with [`LoadError::BlankPath`]. The same path as the
    /// loaded model is a cache hit with no I/O. Any other path is deserialized;
    /// on failure the previously loaded model stays in place and
    /// [`LoadError::LoadFailure`] carries the loader's diagnostic.
    pub fn ensure_loaded(&mut self, path: &str) -> Result<(), LoadError> {
        if path.is_empty() {
            return Err(LoadError::BlankPath);
        }

        if self.loaded_path() == Some(path) {
            debug!("Model cache hit for {}", path);
            return Ok(());
        }

        let loader = &self.loader;
        let result = panic::catch_unwind(AssertUnwindSafe(|| loader.load(Path::new(path))));

        match result {
            Ok(Ok(model)) => {
                info!("Model {} loaded and cached", path);
                self.loaded = Some(LoadedModel {
                    path: path.to_string(),
                    model,
                });
                Ok(())
            }
            Ok(Err(e)) => {
                warn!("Failed to load model {}: {}", path, e);
                let message = e.to_string();
                Err(LoadError::LoadFailure(if message.is_empty() {
                    GENERIC_LOAD_MESSAGE.to_string()
                } else {
                    message
                }))
            }
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| GENERIC_LOAD_MESSAGE.to_string());
                warn!("Model loader panicked while loading {}: {}", path, message);
                Err(LoadError::LoadFailure(message))
            }
        }
    }

    /// Path of the currently loaded model, if any
    pub fn loaded_path(&self) -> Option<&str> {
        self.loaded.as_ref().map(LoadedModel::path)
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    pub fn loaded_mut(&mut self) -> Option<&mut LoadedModel> {
        self.loaded.as_mut()
    }

    /// Drop the loaded model
    pub fn clear(&mut self) {
        if let Some(loaded) = self.loaded.take() {
            debug!("Released model {}", loaded.path);
        }
    }
}
