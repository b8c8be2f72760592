//! Construct-once model handle
//!
//! The backend is built on first use and never rebuilt. Concurrent first
//! callers race on a `OnceLock`: one construction runs, every caller observes
//! its outcome. A failed construction is cached as "unavailable" so the
//! engine degrades to the fallback policy without retrying per turn.

use std::sync::{Arc, OnceLock};

use crate::config::EngineConfig;
use crate::error::ModelError;
use crate::model::{ConversationalModel, ModelBackend, OllamaClient, QuizGenerator};

type BackendFactory =
    Box<dyn Fn(&EngineConfig) -> Result<Arc<dyn ModelBackend>, ModelError> + Send + Sync>;

/// Lazily constructed model backend, injected into triage and quiz generation
pub struct ModelHandle {
    config: EngineConfig,
    factory: BackendFactory,
    backend: OnceLock<Option<Arc<dyn ModelBackend>>>,
}

impl ModelHandle {
    /// Handle that builds an [`OllamaClient`] from `config` on first use
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_factory(config, |config| {
            let client = OllamaClient::from_config(config)?;
            Ok(Arc::new(client) as Arc<dyn ModelBackend>)
        })
    }

    /// Handle with a custom construction routine
    pub fn with_factory<F>(config: &EngineConfig, factory: F) -> Self
    where
        F: Fn(&EngineConfig) -> Result<Arc<dyn ModelBackend>, ModelError> + Send + Sync + 'static,
    {
        Self {
            config: config.clone(),
            factory: Box::new(factory),
            backend: OnceLock::new(),
        }
    }

    /// Handle that never produces a backend
    pub fn disabled() -> Self {
        let handle = Self::with_factory(&EngineConfig::default(), |_| Err(ModelError::NotConfigured));
        let _ = handle.backend.set(None);
        handle
    }

    /// Handle around an already constructed backend
    pub fn with_backend(backend: Arc<dyn ModelBackend>) -> Self {
        let config = EngineConfig {
            model_enabled: true,
            ..EngineConfig::default()
        };
        let handle = Self::with_factory(&config, |_| Err(ModelError::NotConfigured));
        let _ = handle.backend.set(Some(backend));
        handle
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The backend, constructing it on first call
    pub fn backend(&self) -> Option<&dyn ModelBackend> {
        self.backend.get_or_init(|| self.construct()).as_deref()
    }

    pub fn conversational(&self) -> Option<&dyn ConversationalModel> {
        self.backend().map(|b| b.conversational())
    }

    pub fn quiz_generator(&self) -> Option<&dyn QuizGenerator> {
        self.backend().map(|b| b.quiz_generator())
    }

    fn construct(&self) -> Option<Arc<dyn ModelBackend>> {
        if !self.config.model_enabled {
            tracing::debug!("conversational model disabled, using fallback policy");
            return None;
        }

        match (self.factory)(&self.config) {
            Ok(backend) => {
                tracing::debug!(
                    url = %self.config.model_url,
                    model = %self.config.model_name,
                    "model backend constructed"
                );
                Some(backend)
            }
            Err(e) => {
                tracing::warn!(error = %e, "model backend unavailable, using fallback policy");
                None
            }
        }
    }
}

impl Default for ModelHandle {
    fn default() -> Self {
        Self::disabled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::testing::ScriptedModel;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn enabled() -> EngineConfig {
        EngineConfig {
            model_enabled: true,
            ..EngineConfig::default()
        }
    }

    fn counting_handle(config: &EngineConfig, fail: bool) -> (ModelHandle, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let handle = ModelHandle::with_factory(config, move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
            if fail {
                Err(ModelError::Connection("test".to_string()))
            } else {
                Ok(Arc::new(ScriptedModel::replying(&["hello"])) as Arc<dyn ModelBackend>)
            }
        });
        (handle, count)
    }

    #[test]
    fn test_disabled_handle_has_no_backend() {
        let handle = ModelHandle::disabled();
        assert!(handle.backend().is_none());
        assert!(handle.conversational().is_none());
        assert!(handle.quiz_generator().is_none());
    }

    #[test]
    fn test_disabled_config_never_runs_factory() {
        let (handle, count) = counting_handle(&EngineConfig::default(), false);
        assert!(handle.backend().is_none());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_construct_once_across_threads() {
        let (handle, count) = counting_handle(&enabled(), false);

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| assert!(handle.conversational().is_some()));
            }
        });

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_construction_is_cached() {
        let (handle, count) = counting_handle(&enabled(), true);

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| assert!(handle.backend().is_none()));
            }
        });
        assert!(handle.backend().is_none());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_with_backend_is_ready() {
        let handle = ModelHandle::with_backend(Arc::new(ScriptedModel::replying(&["hi there"])));
        let reply = handle.conversational().unwrap().generate(&[], "hey").unwrap();
        assert_eq!(reply, "hi there");
    }
}
