//! Result normalization and display-handle lifecycle.
//!
//! The sink is the single point a consumer observes results. It keeps two
//! slots that never merge: the latest batch result and the latest stream
//! frame. Binary payloads are wrapped in a [`DisplayHandle`]; superseding a
//! slot releases the previous handle through the [`HandleRegistry`] exactly
//! once, so display resources never accumulate.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tracing::trace;

use fw_models::{DetectionResult, VideoEntry};

/// Hooks for the consumer's display resource lifecycle (object URLs, GPU
/// textures, ...). The default registry only logs.
pub trait HandleRegistry: Send + Sync {
    fn created(&self, id: u64, len: usize);
    fn released(&self, id: u64);
}

/// Registry that only traces handle churn.
#[derive(Debug, Default)]
pub struct NoopRegistry;

impl HandleRegistry for NoopRegistry {
    fn created(&self, id: u64, len: usize) {
        trace!(id, len, "display handle created");
    }

    fn released(&self, id: u64) {
        trace!(id, "display handle released");
    }
}

/// Registry that counts create/release calls.
#[derive(Debug, Default)]
pub struct CountingRegistry {
    created: AtomicUsize,
    released: AtomicUsize,
}

impl CountingRegistry {
    pub fn created_count(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn released_count(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

impl HandleRegistry for CountingRegistry {
    fn created(&self, _id: u64, _len: usize) {
        self.created.fetch_add(1, Ordering::SeqCst);
    }

    fn released(&self, _id: u64) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// Displayable wrapper around annotated image bytes.
///
/// Clones share the same underlying handle. Release is idempotent: the sink
/// releases a handle when it is superseded, and dropping the last clone
/// releases it if nothing else did.
#[derive(Clone)]
pub struct DisplayHandle {
    inner: Arc<HandleInner>,
}

struct HandleInner {
    id: u64,
    bytes: Vec<u8>,
    released: AtomicBool,
    registry: Arc<dyn HandleRegistry>,
}

impl std::fmt::Debug for DisplayHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisplayHandle")
            .field("id", &self.inner.id)
            .field("len", &self.inner.bytes.len())
            .field("released", &self.is_released())
            .finish()
    }
}

impl DisplayHandle {
    fn new(id: u64, bytes: Vec<u8>, registry: Arc<dyn HandleRegistry>) -> Self {
        registry.created(id, bytes.len());
        Self {
            inner: Arc::new(HandleInner {
                id,
                bytes,
                released: AtomicBool::new(false),
                registry,
            }),
        }
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn bytes(&self) -> &[u8] {
        &self.inner.bytes
    }

    /// Notify the registry that this handle's display resource can go.
    /// Idempotent across clones.
    pub fn release(&self) {
        if !self.inner.released.swap(true, Ordering::SeqCst) {
            self.inner.registry.released(self.inner.id);
        }
    }

    pub fn is_released(&self) -> bool {
        self.inner.released.load(Ordering::SeqCst)
    }
}

impl Drop for HandleInner {
    fn drop(&mut self) {
        if !self.released.swap(true, Ordering::SeqCst) {
            self.registry.released(self.id);
        }
    }
}

/// The latest batch result, in displayable form.
#[derive(Debug, Clone)]
pub enum BatchDisplay {
    /// Annotated image from an image or URL request.
    Image {
        handle: DisplayHandle,
        timestamp: DateTime<Utc>,
    },
    /// Structured per-frame detections from a video request.
    Video {
        entries: Vec<VideoEntry>,
        timestamp: DateTime<Utc>,
    },
}

/// Latest-wins observation point for all detection results.
#[derive(Clone)]
pub struct ResultSink {
    registry: Arc<dyn HandleRegistry>,
    next_id: Arc<AtomicU64>,
    inner: Arc<Mutex<Slots>>,
}

#[derive(Default)]
struct Slots {
    batch: Option<BatchDisplay>,
    stream: Option<DisplayHandle>,
}

impl ResultSink {
    pub fn new(registry: Arc<dyn HandleRegistry>) -> Self {
        Self {
            registry,
            next_id: Arc::new(AtomicU64::new(1)),
            inner: Arc::new(Mutex::new(Slots::default())),
        }
    }

    fn wrap(&self, bytes: Vec<u8>) -> DisplayHandle {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        DisplayHandle::new(id, bytes, self.registry.clone())
    }

    /// Store a batch result, releasing whatever batch handle it supersedes.
    pub fn publish_batch(&self, result: DetectionResult) -> BatchDisplay {
        let display = match result {
            DetectionResult::AnnotatedImage { bytes, timestamp } => BatchDisplay::Image {
                handle: self.wrap(bytes),
                timestamp,
            },
            DetectionResult::VideoAnnotation { entries, timestamp } => {
                BatchDisplay::Video { entries, timestamp }
            }
            DetectionResult::StreamFrame { bytes } => {
                // Stream frames have their own slot regardless of how the
                // result was constructed.
                let handle = self.publish_stream_frame(bytes);
                return BatchDisplay::Image {
                    handle,
                    timestamp: Utc::now(),
                };
            }
        };

        let mut slots = self.lock();
        if let Some(BatchDisplay::Image { handle, .. }) = slots.batch.replace(display.clone()) {
            handle.release();
        }
        display
    }

    /// Store one annotated stream frame, releasing the frame it supersedes.
    pub fn publish_stream_frame(&self, bytes: Vec<u8>) -> DisplayHandle {
        let handle = self.wrap(bytes);
        let mut slots = self.lock();
        if let Some(previous) = slots.stream.replace(handle.clone()) {
            previous.release();
        }
        handle
    }

    /// Snapshot of the latest batch result.
    pub fn latest_batch(&self) -> Option<BatchDisplay> {
        self.lock().batch.clone()
    }

    /// Snapshot of the latest stream frame.
    pub fn latest_stream_frame(&self) -> Option<DisplayHandle> {
        self.lock().stream.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Slots> {
        // Lock is only held for slot swaps; poisoning would mean a panic
        // mid-swap, in which case the slots are still structurally sound.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for ResultSink {
    fn default() -> Self {
        Self::new(Arc::new(NoopRegistry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counting_sink() -> (ResultSink, Arc<CountingRegistry>) {
        let registry = Arc::new(CountingRegistry::default());
        (ResultSink::new(registry.clone()), registry)
    }

    #[test]
    fn test_stream_frame_supersede_releases_exactly_one() {
        let (sink, registry) = counting_sink();

        let first = sink.publish_stream_frame(vec![1]);
        assert_eq!(registry.released_count(), 0);

        // The first handle is still referenced here, but superseding it
        // must still release it.
        let _second = sink.publish_stream_frame(vec![2]);
        assert_eq!(registry.created_count(), 2);
        assert_eq!(registry.released_count(), 1);
        assert!(first.is_released());

        let latest = sink.latest_stream_frame().unwrap();
        assert_eq!(latest.bytes(), &[2]);
    }

    #[test]
    fn test_batch_image_supersede_releases_prior() {
        let (sink, registry) = counting_sink();

        sink.publish_batch(DetectionResult::annotated_image(vec![1, 1]));
        sink.publish_batch(DetectionResult::annotated_image(vec![2, 2]));
        assert_eq!(registry.released_count(), 1);

        let Some(BatchDisplay::Image { handle, .. }) = sink.latest_batch() else {
            panic!("expected image batch result");
        };
        assert_eq!(handle.bytes(), &[2, 2]);
    }

    #[test]
    fn test_batch_and_stream_slots_never_merge() {
        let (sink, registry) = counting_sink();

        sink.publish_batch(DetectionResult::annotated_image(vec![1]));
        sink.publish_stream_frame(vec![2]);

        // Neither publication superseded the other.
        assert_eq!(registry.released_count(), 0);
        assert!(sink.latest_batch().is_some());
        assert!(sink.latest_stream_frame().is_some());
    }

    #[test]
    fn test_video_batch_replaces_image_and_releases_its_handle() {
        let (sink, registry) = counting_sink();

        sink.publish_batch(DetectionResult::annotated_image(vec![1]));
        sink.publish_batch(DetectionResult::video_annotation(vec![]));

        assert_eq!(registry.released_count(), 1);
        assert!(matches!(sink.latest_batch(), Some(BatchDisplay::Video { .. })));
    }

    #[test]
    fn test_release_is_idempotent_across_clones() {
        let (sink, registry) = counting_sink();
        let handle = sink.publish_stream_frame(vec![9]);
        let clone = handle.clone();

        handle.release();
        clone.release();
        drop(handle);
        drop(clone);

        assert_eq!(registry.released_count(), 1);
    }

    #[test]
    fn test_dropping_sink_releases_held_handles() {
        let (sink, registry) = counting_sink();
        sink.publish_stream_frame(vec![1]);
        drop(sink);
        assert_eq!(registry.released_count(), 1);
    }
}
