//! Embedding Provider: one backend, chosen once, never fatal.
//!
//! The provider is built at startup and passed by reference into the
//! scorer. Backend construction walks an ordered list of candidate models
//! and keeps the first that loads. When none does, the provider is
//! *disabled* and every `embed` call yields `None` for the rest of the run.
//!
//! Encode failures are contained here: they are logged, counted and turned
//! into `None`, so callers only ever see "vector" or "no signal".

use crate::config::{EmbeddingConfig, ModelSpec};
use crate::embedding::{Embedder, OnnxEmbedder};
use crate::error::Result;
use moka::sync::Cache;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Shared, read-mostly access to an optional embedding backend.
pub struct EmbeddingProvider {
    backend: Option<Mutex<Box<dyn Embedder>>>,
    backend_name: Option<String>,
    cache: Option<Cache<String, Arc<Vec<f32>>>>,
    failures: AtomicUsize,
}

impl std::fmt::Debug for EmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingProvider")
            .field("backend", &self.backend_name)
            .field("failures", &self.failures())
            .finish_non_exhaustive()
    }
}

impl EmbeddingProvider {
    /// Build the provider described by `config`, downloading model files as
    /// needed.
    ///
    /// Never fails: a disabled config, or a candidate list where every model
    /// fails to load, produces a disabled provider.
    pub fn initialize(config: &EmbeddingConfig) -> Self {
        if !config.enabled {
            info!("embedding backend disabled by configuration");
            return Self::disabled();
        }
        let cache_dir = config
            .cache_dir
            .clone()
            .unwrap_or_else(crate::labrank_dirs::models_dir);
        let max_tokens = config.max_tokens;
        Self::initialize_with(&config.models, config.cache_capacity, |spec| {
            let embedder = OnnxEmbedder::load(spec, &cache_dir, max_tokens)?;
            Ok(Box::new(embedder) as Box<dyn Embedder>)
        })
    }

    /// Try `candidates` in order with `loader`, keeping the first backend
    /// that loads.
    pub fn initialize_with<F>(candidates: &[ModelSpec], cache_capacity: u64, mut loader: F) -> Self
    where
        F: FnMut(&ModelSpec) -> Result<Box<dyn Embedder>>,
    {
        for spec in candidates {
            match loader(spec) {
                Ok(embedder) => {
                    info!(model = %spec.repo_id, "embedding backend selected");
                    return Self::with_backend(embedder, cache_capacity);
                }
                Err(e) => {
                    warn!(model = %spec.repo_id, error = %e, "embedding backend unavailable");
                }
            }
        }
        warn!("no embedding backend could be loaded; scoring is lexical only");
        Self::disabled()
    }

    /// Wrap an already-constructed backend.
    pub fn with_backend(embedder: Box<dyn Embedder>, cache_capacity: u64) -> Self {
        let cache = (cache_capacity > 0).then(|| Cache::new(cache_capacity));
        Self {
            backend_name: Some(embedder.name().to_owned()),
            backend: Some(Mutex::new(embedder)),
            cache,
            failures: AtomicUsize::new(0),
        }
    }

    /// A provider with no backend. `embed` always returns `None`.
    pub fn disabled() -> Self {
        Self {
            backend: None,
            backend_name: None,
            cache: None,
            failures: AtomicUsize::new(0),
        }
    }

    /// Returns `true` if a backend is loaded.
    pub fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    /// Name of the loaded backend, if any.
    pub fn backend_name(&self) -> Option<&str> {
        self.backend_name.as_deref()
    }

    /// Number of encode calls that failed so far.
    pub fn failures(&self) -> usize {
        self.failures.load(Ordering::Relaxed)
    }

    /// Embed the lowercased `text`.
    ///
    /// Returns `None` when the provider is disabled or the backend fails to
    /// encode this input.
    pub fn embed(&self, text: &str) -> Option<Arc<Vec<f32>>> {
        let backend = self.backend.as_ref()?;
        let key = text.to_lowercase();

        if let Some(hit) = self.cache.as_ref().and_then(|c| c.get(&key)) {
            return Some(hit);
        }

        let result = match backend.lock() {
            Ok(mut embedder) => embedder.embed(&key),
            Err(poisoned) => poisoned.into_inner().embed(&key),
        };

        match result {
            Ok(vector) => {
                let vector = Arc::new(vector);
                if let Some(cache) = &self.cache {
                    cache.insert(key, Arc::clone(&vector));
                }
                Some(vector)
            }
            Err(e) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                warn!(error = %e, "embedding failed; field contributes no semantic signal");
                debug!(text = %key, "failed embedding input");
                None
            }
        }
    }
}
