//! Recognition model lifecycle management
//!
//! The model is large (hundreds of MB to several GB resident), so it is
//! loaded lazily on first use and unloaded again after an idle timeout.
//! `ModelManager` owns the single live handle; transcriptions hold an
//! `Arc<ModelHandle>` across inference so a concurrent sweep can clear the
//! manager's reference without freeing a model that is still in use.
//!
//! Time is injected via the `Clock` trait so sweep behavior is testable
//! without sleeping.

use crate::config::ModelConfig;
use crate::error::ModelError;
use crate::transcribe::{whisper, SpeechModel};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Injectable time source
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall-clock implementation used outside tests
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Trait for loading recognition models by name
pub trait ModelLoader: Send + Sync {
    /// Check whether the model's files are present on disk
    fn is_ready(&self, model: &str) -> bool;

    /// Load the model into memory. May block for seconds to minutes.
    fn load(&self, model: &str) -> Result<Arc<dyn SpeechModel>, ModelError>;
}

/// whisper.cpp loader backed by the configured model directory
pub struct WhisperLoader {
    config: ModelConfig,
}

impl WhisperLoader {
    pub fn new(config: &ModelConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }
}

impl ModelLoader for WhisperLoader {
    fn is_ready(&self, model: &str) -> bool {
        whisper::model_is_ready(model)
    }

    fn load(&self, model: &str) -> Result<Arc<dyn SpeechModel>, ModelError> {
        let mut config = self.config.clone();
        config.name = model.to_string();
        Ok(Arc::new(whisper::WhisperModel::load(&config)?))
    }
}

/// A loaded model with its identifier
pub struct ModelHandle {
    model: Arc<dyn SpeechModel>,
    name: String,
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl ModelHandle {
    pub fn model(&self) -> &dyn SpeechModel {
        self.model.as_ref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

struct Slot {
    /// Configured model identifier; changing it invalidates the handle
    model_name: String,
    handle: Option<Arc<ModelHandle>>,
    last_used_at: Option<Instant>,
}

/// Owns the lazy-loaded model and its idle-unload policy
pub struct ModelManager {
    loader: Arc<dyn ModelLoader>,
    clock: Arc<dyn Clock>,
    idle_timeout: Duration,
    slot: Mutex<Slot>,
    shutting_down: AtomicBool,
}

impl ModelManager {
    pub fn new(
        loader: Arc<dyn ModelLoader>,
        clock: Arc<dyn Clock>,
        model_name: String,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            loader,
            clock,
            idle_timeout,
            slot: Mutex::new(Slot {
                model_name,
                handle: None,
                last_used_at: None,
            }),
            shutting_down: AtomicBool::new(false),
        }
    }

    /// Convenience constructor from configuration
    pub fn from_config(config: &ModelConfig) -> Self {
        Self::new(
            Arc::new(WhisperLoader::new(config)),
            Arc::new(SystemClock),
            config.name.clone(),
            Duration::from_secs(config.idle_timeout_secs),
        )
    }

    /// Get a ready-to-use model handle, loading the model if necessary.
    ///
    /// The slot lock is held across the load, so concurrent callers while
    /// unloaded produce exactly one load; the losers get the freshly loaded
    /// handle. Load failures leave the slot cleared.
    pub fn acquire(&self) -> Result<Arc<ModelHandle>, ModelError> {
        if self.shutting_down.load(Ordering::SeqCst) {
            return Err(ModelError::Cancelled);
        }

        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(handle) = slot.handle.as_ref().map(Arc::clone) {
            slot.last_used_at = Some(self.clock.now());
            return Ok(handle);
        }

        let name = slot.model_name.clone();

        if !self.loader.is_ready(&name) {
            return Err(ModelError::NotFound(name));
        }

        tracing::info!("Model '{}' not loaded, loading now", name);

        let model = self.loader.load(&name).inspect_err(|e| {
            tracing::error!("Failed to load model '{}': {}", name, e);
        })?;

        // A shutdown that began during the load must not install the model
        if self.shutting_down.load(Ordering::SeqCst) {
            tracing::info!("Discarding model '{}' loaded during shutdown", name);
            return Err(ModelError::Cancelled);
        }

        let handle = Arc::new(ModelHandle { model, name });
        slot.handle = Some(Arc::clone(&handle));
        slot.last_used_at = Some(self.clock.now());

        Ok(handle)
    }

    /// Refresh the last-use timestamp; call on every successful use
    pub fn touch(&self) {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        if slot.handle.is_some() {
            slot.last_used_at = Some(self.clock.now());
        }
    }

    /// Unload the model if it has been idle longer than the timeout.
    ///
    /// Uses `try_lock` so a sweep never stalls behind an in-flight load or
    /// acquire. Returns true if the model was unloaded.
    pub fn sweep(&self) -> bool {
        let Ok(mut slot) = self.slot.try_lock() else {
            return false;
        };

        let idle = match (slot.handle.as_ref(), slot.last_used_at) {
            (Some(_), Some(last_used)) => {
                self.clock.now().saturating_duration_since(last_used) > self.idle_timeout
            }
            _ => false,
        };

        if idle {
            let name = slot.model_name.clone();
            tracing::info!(
                "Unloading model '{}' after {}s idle",
                name,
                self.idle_timeout.as_secs()
            );
            slot.handle = None;
            slot.last_used_at = None;
        }

        idle
    }

    /// Unconditionally unload the model (shutdown path)
    pub fn release(&self) {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        if slot.handle.take().is_some() {
            tracing::info!("Model '{}' released", slot.model_name);
        }
        slot.last_used_at = None;
    }

    /// Begin shutdown: future and pending `acquire` calls fail with
    /// `Cancelled`, and the current handle is released.
    pub fn begin_shutdown(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);
        self.release();
    }

    /// Switch to a different model, invalidating any loaded handle
    pub fn reconfigure(&self, model_name: &str) {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        if slot.model_name != model_name {
            tracing::info!(
                "Switching model '{}' -> '{}'",
                slot.model_name,
                model_name
            );
            slot.model_name = model_name.to_string();
            slot.handle = None;
            slot.last_used_at = None;
        }
    }

    /// Whether a model is currently loaded
    pub fn is_loaded(&self) -> bool {
        self.slot
            .lock()
            .map(|s| s.handle.is_some())
            .unwrap_or(false)
    }

    /// The configured model identifier
    pub fn model_name(&self) -> String {
        self.slot
            .lock()
            .map(|s| s.model_name.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TranscribeError;
    use crate::transcribe::TranscriptSegment;
    use std::path::Path;
    use std::sync::atomic::AtomicUsize;

    /// Clock that only moves when told to
    pub(crate) struct FakeClock {
        now: Mutex<Instant>,
    }

    impl FakeClock {
        pub(crate) fn new() -> Self {
            Self {
                now: Mutex::new(Instant::now()),
            }
        }

        pub(crate) fn advance(&self, d: Duration) {
            *self.now.lock().unwrap() += d;
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> Instant {
            *self.now.lock().unwrap()
        }
    }

    struct StubModel;

    impl SpeechModel for StubModel {
        fn transcribe(&self, _audio: &Path) -> Result<Vec<TranscriptSegment>, TranscribeError> {
            Ok(vec![])
        }
    }

    struct CountingLoader {
        loads: AtomicUsize,
        ready: bool,
    }

    impl CountingLoader {
        fn new(ready: bool) -> Self {
            Self {
                loads: AtomicUsize::new(0),
                ready,
            }
        }
    }

    impl ModelLoader for CountingLoader {
        fn is_ready(&self, _model: &str) -> bool {
            self.ready
        }

        fn load(&self, model: &str) -> Result<Arc<dyn SpeechModel>, ModelError> {
            if !self.ready {
                return Err(ModelError::NotFound(model.to_string()));
            }
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(StubModel))
        }
    }

    fn manager_with(
        loader: Arc<CountingLoader>,
        clock: Arc<FakeClock>,
        timeout_secs: u64,
    ) -> ModelManager {
        ModelManager::new(
            loader,
            clock,
            "base.en".to_string(),
            Duration::from_secs(timeout_secs),
        )
    }

    #[test]
    fn test_lazy_load_once() {
        let loader = Arc::new(CountingLoader::new(true));
        let manager = manager_with(Arc::clone(&loader), Arc::new(FakeClock::new()), 300);

        assert!(!manager.is_loaded());
        let _h1 = manager.acquire().unwrap();
        let _h2 = manager.acquire().unwrap();
        assert!(manager.is_loaded());
        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_acquire_single_load() {
        let loader = Arc::new(CountingLoader::new(true));
        let manager = Arc::new(manager_with(Arc::clone(&loader), Arc::new(FakeClock::new()), 300));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let m = Arc::clone(&manager);
                std::thread::spawn(move || m.acquire().map(|_| ()))
            })
            .collect();

        for h in handles {
            h.join().unwrap().unwrap();
        }

        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_not_found_leaves_slot_clear() {
        let loader = Arc::new(CountingLoader::new(false));
        let manager = manager_with(loader, Arc::new(FakeClock::new()), 300);

        let err = manager.acquire().unwrap_err();
        assert!(matches!(err, ModelError::NotFound(_)));
        assert!(!manager.is_loaded());
    }

    #[test]
    fn test_sweep_keeps_fresh_model() {
        let clock = Arc::new(FakeClock::new());
        let loader = Arc::new(CountingLoader::new(true));
        let manager = manager_with(loader, Arc::clone(&clock), 300);

        let _ = manager.acquire().unwrap();
        clock.advance(Duration::from_secs(200));
        assert!(!manager.sweep());
        assert!(manager.is_loaded());
    }

    #[test]
    fn test_sweep_unloads_idle_model() {
        let clock = Arc::new(FakeClock::new());
        let loader = Arc::new(CountingLoader::new(true));
        let manager = manager_with(Arc::clone(&loader), Arc::clone(&clock), 300);

        let _ = manager.acquire().unwrap();
        clock.advance(Duration::from_secs(301));
        assert!(manager.sweep());
        assert!(!manager.is_loaded());

        // Next acquire loads again
        let _ = manager.acquire().unwrap();
        assert_eq!(loader.loads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_touch_defers_sweep() {
        let clock = Arc::new(FakeClock::new());
        let loader = Arc::new(CountingLoader::new(true));
        let manager = manager_with(loader, Arc::clone(&clock), 300);

        let _ = manager.acquire().unwrap();
        clock.advance(Duration::from_secs(250));
        manager.touch();
        clock.advance(Duration::from_secs(250));
        assert!(!manager.sweep());
        assert!(manager.is_loaded());
    }

    #[test]
    fn test_swept_model_survives_in_flight_handle() {
        let clock = Arc::new(FakeClock::new());
        let loader = Arc::new(CountingLoader::new(true));
        let manager = manager_with(loader, Arc::clone(&clock), 300);

        let in_flight = manager.acquire().unwrap();
        clock.advance(Duration::from_secs(301));
        assert!(manager.sweep());

        // Manager dropped its reference, but our clone is still usable
        assert!(in_flight.model().transcribe(Path::new("/dev/null")).is_ok());
    }

    #[test]
    fn test_shutdown_cancels_acquire() {
        let loader = Arc::new(CountingLoader::new(true));
        let manager = manager_with(loader, Arc::new(FakeClock::new()), 300);

        manager.begin_shutdown();
        assert!(matches!(manager.acquire(), Err(ModelError::Cancelled)));
        assert!(!manager.is_loaded());
    }

    #[test]
    fn test_reconfigure_invalidates_handle() {
        let loader = Arc::new(CountingLoader::new(true));
        let manager = manager_with(Arc::clone(&loader), Arc::new(FakeClock::new()), 300);

        let _ = manager.acquire().unwrap();
        manager.reconfigure("small.en");
        assert!(!manager.is_loaded());
        assert_eq!(manager.model_name(), "small.en");

        let _ = manager.acquire().unwrap();
        assert_eq!(loader.loads.load(Ordering::SeqCst), 2);
    }
}
