use std::path::PathBuf;
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::Duration;

use vidscribe_core::shared::constants::{
    EMBEDDING_MODEL_NAME, EMBEDDING_MODEL_URL, SEGMENTATION_MODEL_NAME, SEGMENTATION_MODEL_URL,
    WHISPER_MODEL_NAME, WHISPER_MODEL_URL,
};
use vidscribe_core::shared::model_resolver;

/// Shared model cache that resolves the whisper and pyannote models in the
/// background at startup. Workers grab pre-resolved paths or block until
/// resolution finishes, forwarding download progress while they wait.
pub struct ModelCache {
    whisper: Arc<ModelSlot>,
    segmentation: Arc<ModelSlot>,
    embedding: Arc<ModelSlot>,
}

struct ModelSlot {
    result: Mutex<Option<Result<PathBuf, String>>>,
    ready: Condvar,
    progress: Arc<Mutex<(u64, u64)>>,
}

impl ModelCache {
    /// Creates the cache and begins resolving all models in the background.
    pub fn new() -> Arc<Self> {
        let cache = Arc::new(Self {
            whisper: Arc::new(ModelSlot::new()),
            segmentation: Arc::new(ModelSlot::new()),
            embedding: Arc::new(ModelSlot::new()),
        });

        let whisper = cache.whisper.clone();
        let segmentation = cache.segmentation.clone();
        let embedding = cache.embedding.clone();
        thread::spawn(move || {
            whisper.resolve(WHISPER_MODEL_NAME, WHISPER_MODEL_URL);
            segmentation.resolve(SEGMENTATION_MODEL_NAME, SEGMENTATION_MODEL_URL);
            embedding.resolve(EMBEDDING_MODEL_NAME, EMBEDDING_MODEL_URL);
        });

        cache
    }

    /// Waits for the whisper model path, forwarding
    /// `on_progress(downloaded, total)` while a download is in flight.
    pub fn wait_for_whisper(&self, on_progress: &dyn Fn(u64, u64)) -> Result<PathBuf, String> {
        self.whisper.wait(on_progress)
    }

    pub fn wait_for_segmentation(&self, on_progress: &dyn Fn(u64, u64)) -> Result<PathBuf, String> {
        self.segmentation.wait(on_progress)
    }

    pub fn wait_for_embedding(&self, on_progress: &dyn Fn(u64, u64)) -> Result<PathBuf, String> {
        self.embedding.wait(on_progress)
    }
}

impl ModelSlot {
    fn new() -> Self {
        Self {
            result: Mutex::new(None),
            ready: Condvar::new(),
            progress: Arc::new(Mutex::new((0, 0))),
        }
    }

    fn resolve(&self, name: &str, url: &str) {
        let progress_mutex = self.progress.clone();
        let result = model_resolver::resolve(
            name,
            url,
            None,
            Some(Box::new(move |downloaded, total| {
                *progress_mutex.lock().unwrap() = (downloaded, total);
            })),
        );
        *self.result.lock().unwrap() = Some(result.map_err(|e| e.to_string()));
        self.ready.notify_all();
    }

    fn wait(&self, on_progress: &dyn Fn(u64, u64)) -> Result<PathBuf, String> {
        let mut guard = self.result.lock().unwrap();
        loop {
            if let Some(ref result) = *guard {
                return result.clone();
            }
            // Forward download progress while waiting
            if let Ok(progress) = self.progress.try_lock() {
                let (downloaded, total) = *progress;
                if total > 0 {
                    on_progress(downloaded, total);
                }
            }
            let (new_guard, _) = self
                .ready
                .wait_timeout(guard, Duration::from_millis(100))
                .unwrap();
            guard = new_guard;
        }
    }
}
