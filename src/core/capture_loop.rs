// src/core/capture_loop.rs
//! The poll loop: read, classify, compare, persist, sleep, repeat
//!
//! Every tick tries text first and then, when the backend supports it, an
//! image or a copied file. Each kind is handled on its own: a failure while
//! reading or saving one kind is logged, forgets that kind's last value and
//! never stops the other kinds or the loop.

use std::future::Future;

use tracing::{debug, info, warn};

use crate::backends::ClipboardSource;
use crate::config::CaptureConfig;
use crate::core::classifier::{classify, Classification, RawClipboardRead};
use crate::core::equality::is_unchanged;
use crate::core::events::{CaptureEvent, CaptureListener};
use crate::core::payload::{CapturedPayload, ContentKind};
use crate::core::persist::{persist, OutputRecord};
use crate::core::session::SessionState;
use crate::error::{CaptureError, ClipboardError};

/// Counters kept across ticks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub ticks: u64,
    pub saved: u64,
}

pub struct CaptureLoop<C: ClipboardSource> {
    source: C,
    config: CaptureConfig,
    state: SessionState,
    listeners: Vec<Box<dyn CaptureListener>>,
    stats: LoopStats,
}

impl<C: ClipboardSource> CaptureLoop<C> {
    /// The config is expected to have passed [`CaptureConfig::validate`].
    pub fn new(source: C, config: CaptureConfig) -> Self {
        Self {
            source,
            config,
            state: SessionState::new(),
            listeners: Vec::new(),
            stats: LoopStats::default(),
        }
    }

    pub fn add_listener<L: CaptureListener + 'static>(&mut self, listener: L) {
        self.listeners.push(Box::new(listener));
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    pub fn source(&self) -> &C {
        &self.source
    }

    /// Poll until `shutdown` resolves.
    ///
    /// Shutdown is only observed between ticks, so a tick that has started
    /// always finishes its writes.
    pub async fn run_until<F>(&mut self, shutdown: F) -> LoopStats
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        info!(
            "🚀 Watching clipboard → {} (every {}s)",
            self.config.target_dir.display(),
            self.config.interval.as_secs()
        );
        self.emit(&CaptureEvent::Started {
            target_dir: self.config.target_dir.clone(),
            interval: self.config.interval,
            backend: self.source.name(),
        });

        loop {
            self.tick().await;

            tokio::select! {
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(self.config.interval) => {}
            }
        }

        info!(
            "🛑 Stopped after {} ticks, {} files saved",
            self.stats.ticks, self.stats.saved
        );
        self.emit(&CaptureEvent::Stopped {
            ticks: self.stats.ticks,
            saved: self.stats.saved,
        });
        self.stats
    }

    /// One classify → compare → persist cycle for every kind. Returns the
    /// records written during this tick.
    pub async fn tick(&mut self) -> Vec<OutputRecord> {
        self.stats.ticks += 1;
        let mut saved = Vec::new();

        let text = self.source.read_text().await;
        let text = text.map(|t| t.map_or(RawClipboardRead::Empty, RawClipboardRead::Text));
        saved.extend(self.observe(ContentKind::Text, text));

        if !self.source.supports_rich_content() {
            return saved;
        }

        match self.source.read_image().await {
            Ok(Some(image)) => {
                saved.extend(self.observe(ContentKind::Image, Ok(RawClipboardRead::Image(image))));
                return saved;
            }
            Ok(None) => {}
            Err(err) => {
                self.fail(ContentKind::Image, err.into());
            }
        }

        let files = self.source.read_file_list().await;
        let files = files.map(|f| f.map_or(RawClipboardRead::Empty, RawClipboardRead::FileList));
        saved.extend(self.observe(ContentKind::FileRef, files));

        saved
    }

    fn observe(
        &mut self,
        kind: ContentKind,
        read: Result<RawClipboardRead, ClipboardError>,
    ) -> Option<OutputRecord> {
        match read.and_then(classify) {
            Ok(Classification::Payload(payload)) => self.consider(payload),
            Ok(Classification::Unsupported(shape)) => {
                info!("⏭️  Skipping {}: {}", kind, shape);
                self.emit(&CaptureEvent::Unsupported {
                    reason: shape.to_string(),
                });
                None
            }
            Ok(Classification::Nothing) => None,
            Err(err) => {
                self.fail(kind, err.into());
                None
            }
        }
    }

    fn consider(&mut self, payload: CapturedPayload) -> Option<OutputRecord> {
        let kind = payload.kind();

        if is_unchanged(self.state.last(kind), &payload) {
            debug!("{} unchanged", kind);
            self.emit(&CaptureEvent::Unchanged { kind });
            return None;
        }

        match persist(&self.config.target_dir, &self.config.prefix, &payload) {
            Ok(record) => {
                info!(
                    "💾 Saved {} ({}) → {}",
                    kind,
                    payload.summary(),
                    record.path.display()
                );
                self.state.record(payload);
                self.stats.saved += 1;
                self.emit(&CaptureEvent::Saved {
                    record: record.clone(),
                });
                Some(record)
            }
            Err(err) => {
                self.fail(kind, err);
                None
            }
        }
    }

    fn fail(&mut self, kind: ContentKind, err: CaptureError) {
        warn!("⚠️  {} capture failed: {}", kind, err);
        self.state.forget(kind);
        self.emit(&CaptureEvent::Failed {
            kind,
            error: err.to_string(),
        });
    }

    fn emit(&mut self, event: &CaptureEvent) {
        for listener in &mut self.listeners {
            listener.on_event(event);
        }
    }
}

/// Resolves on Ctrl-C or SIGTERM.
///
/// The handlers are installed when this is called, not when the future is
/// first polled, so a signal that arrives during the first tick still counts.
#[cfg(unix)]
pub fn shutdown_signal() -> std::io::Result<impl Future<Output = ()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    Ok(async move {
        tokio::select! {
            _ = interrupt.recv() => info!("Received Ctrl-C"),
            _ = terminate.recv() => info!("Received SIGTERM"),
        }
    })
}

/// Resolves on Ctrl-C.
#[cfg(not(unix))]
pub fn shutdown_signal() -> std::io::Result<impl Future<Output = ()>> {
    Ok(async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("Ctrl-C handler failed: {}", err);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::scripted::{ScriptedClipboard, Step};
    use image::{DynamicImage, Rgb, RgbImage};
    use pretty_assertions::assert_eq;
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn config(dir: &Path) -> CaptureConfig {
        let mut config = CaptureConfig::new(dir);
        config.interval = Duration::from_secs(1);
        config
    }

    /// Output files sorted by name
    fn outputs(dir: &Path) -> Vec<PathBuf> {
        let mut files: Vec<_> = std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect();
        files.sort();
        files
    }

    fn sorted_texts(dir: &Path) -> Vec<String> {
        let mut texts: Vec<_> = outputs(dir)
            .iter()
            .map(|path| std::fs::read_to_string(path).unwrap())
            .collect();
        texts.sort();
        texts
    }

    fn solid(width: u32, height: u32, shade: u8) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([shade, shade, shade])))
    }

    fn recorder() -> (Arc<Mutex<Vec<CaptureEvent>>>, impl CaptureListener) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        (events, move |event: &CaptureEvent| {
            sink.lock().unwrap().push(event.clone())
        })
    }

    #[tokio::test]
    async fn test_repeated_text_is_saved_once() {
        let dir = tempfile::tempdir().unwrap();
        let clipboard = ScriptedClipboard::texts([
            Step::Value("hello"),
            Step::Value("hello"),
            Step::Value("world"),
        ]);
        let mut capture = CaptureLoop::new(clipboard, config(dir.path()));

        assert_eq!(capture.tick().await.len(), 1);
        assert_eq!(capture.tick().await.len(), 0);
        assert_eq!(capture.tick().await.len(), 1);

        assert_eq!(sorted_texts(dir.path()), vec!["hello", "world"]);
        assert_eq!(capture.stats(), LoopStats { ticks: 3, saved: 2 });
    }

    #[tokio::test]
    async fn test_outputs_are_text_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut capture = CaptureLoop::new(
            ScriptedClipboard::texts([Step::Value("a"), Step::Value("b")]),
            config(dir.path()),
        );
        capture.tick().await;
        capture.tick().await;

        for path in outputs(dir.path()) {
            assert_eq!(path.extension().unwrap(), "txt");
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            assert!(name.starts_with("clip_"), "{name}");
        }
        assert_eq!(outputs(dir.path()).len(), 2);
    }

    #[tokio::test]
    async fn test_blank_text_is_ignored_and_keeps_state() {
        let dir = tempfile::tempdir().unwrap();
        let clipboard = ScriptedClipboard::texts([
            Step::Value("hello"),
            Step::Value("   "),
            Step::Empty,
            Step::Value("hello"),
        ]);
        let mut capture = CaptureLoop::new(clipboard, config(dir.path()));
        for _ in 0..4 {
            capture.tick().await;
        }
        assert_eq!(sorted_texts(dir.path()), vec!["hello"]);
    }

    #[tokio::test]
    async fn test_read_failure_forces_recapture() {
        let dir = tempfile::tempdir().unwrap();
        let clipboard = ScriptedClipboard::texts([
            Step::Value("hello"),
            Step::Fail("clipboard busy"),
            Step::Value("hello"),
        ]);
        let mut capture = CaptureLoop::new(clipboard, config(dir.path()));
        let (events, listener) = recorder();
        capture.add_listener(listener);

        capture.tick().await;
        capture.tick().await;
        assert!(capture.state().slot(ContentKind::Text).is_unknown());
        capture.tick().await;

        assert_eq!(sorted_texts(dir.path()), vec!["hello", "hello"]);
        let failures = events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, CaptureEvent::Failed { kind: ContentKind::Text, .. }))
            .count();
        assert_eq!(failures, 1);
    }

    #[tokio::test]
    async fn test_write_failure_forgets_state() {
        let root = tempfile::tempdir().unwrap();
        let target = root.path().join("out");
        std::fs::create_dir(&target).unwrap();

        let clipboard = ScriptedClipboard::texts([Step::Value("same"), Step::Value("same")]);
        let mut capture = CaptureLoop::new(clipboard, config(&target));

        std::fs::remove_dir(&target).unwrap();
        assert!(capture.tick().await.is_empty());
        assert!(capture.state().slot(ContentKind::Text).is_unknown());

        std::fs::create_dir(&target).unwrap();
        assert_eq!(capture.tick().await.len(), 1);
        assert_eq!(sorted_texts(&target), vec!["same"]);
    }

    #[tokio::test]
    async fn test_images_compare_by_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let mut clipboard = ScriptedClipboard::new();
        clipboard.image = [
            Step::Value(solid(4, 4, 10)),
            Step::Value(DynamicImage::ImageRgba8(solid(4, 4, 10).to_rgba8())),
            Step::Value(solid(4, 4, 11)),
            Step::Value(solid(4, 5, 11)),
        ]
        .into();
        let mut capture = CaptureLoop::new(clipboard, config(dir.path()));

        let saved: Vec<usize> = {
            let mut counts = Vec::new();
            for _ in 0..4 {
                counts.push(capture.tick().await.len());
            }
            counts
        };
        assert_eq!(saved, vec![1, 0, 1, 1]);

        let files = outputs(dir.path());
        assert_eq!(files.len(), 3);
        for path in &files {
            assert_eq!(path.extension().unwrap(), "png");
        }
        // an image on the clipboard means no file-list read that tick
        assert_eq!(capture.source().file_reads, 0);
    }

    #[tokio::test]
    async fn test_image_failure_resets_image_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut clipboard = ScriptedClipboard::new();
        clipboard.image = [
            Step::Value(solid(2, 2, 1)),
            Step::Fail("helper crashed"),
            Step::Value(solid(2, 2, 1)),
        ]
        .into();
        let mut capture = CaptureLoop::new(clipboard, config(dir.path()));
        for _ in 0..3 {
            capture.tick().await;
        }
        assert_eq!(outputs(dir.path()).len(), 2);
    }

    #[tokio::test]
    async fn test_file_copies_compare_by_content() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out");
        std::fs::create_dir(&target).unwrap();
        let source = dir.path().join("report.csv");
        std::fs::write(&source, "a,b\n").unwrap();

        let mut clipboard = ScriptedClipboard::new();
        clipboard.files = std::iter::repeat(Step::Value(vec![source.clone()]))
            .take(4)
            .collect();
        let mut capture = CaptureLoop::new(clipboard, config(&target));

        assert_eq!(capture.tick().await.len(), 1);
        assert_eq!(capture.tick().await.len(), 0);

        std::fs::write(&source, "a,b\n1,2\n").unwrap();
        assert_eq!(capture.tick().await.len(), 1);
        assert_eq!(capture.tick().await.len(), 0);

        let files = outputs(&target);
        assert_eq!(files.len(), 2);
        for path in &files {
            assert_eq!(path.extension().unwrap(), "csv");
        }
        let mut contents: Vec<_> = files
            .iter()
            .map(|p| std::fs::read_to_string(p).unwrap())
            .collect();
        contents.sort();
        assert_eq!(contents, vec!["a,b\n", "a,b\n1,2\n"]);
    }

    #[tokio::test]
    async fn test_file_failure_resets_file_state() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out");
        std::fs::create_dir(&target).unwrap();
        let source = dir.path().join("notes.txt");
        std::fs::write(&source, "draft").unwrap();

        let mut clipboard = ScriptedClipboard::new();
        clipboard.files = std::iter::repeat(Step::Value(vec![source.clone()]))
            .take(3)
            .collect();
        let mut capture = CaptureLoop::new(clipboard, config(&target));
        let (events, listener) = recorder();
        capture.add_listener(listener);

        assert_eq!(capture.tick().await.len(), 1);

        std::fs::remove_file(&source).unwrap();
        assert!(capture.tick().await.is_empty());
        assert!(capture.state().slot(ContentKind::FileRef).is_unknown());

        // same content as the first save, captured again after the failure
        std::fs::write(&source, "draft").unwrap();
        assert_eq!(capture.tick().await.len(), 1);

        assert_eq!(outputs(&target).len(), 2);
        let failures = events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, CaptureEvent::Failed { kind: ContentKind::FileRef, .. }))
            .count();
        assert_eq!(failures, 1);
    }

    #[tokio::test]
    async fn test_multiple_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut clipboard = ScriptedClipboard::new();
        clipboard.files = [Step::Value(vec![PathBuf::from("/a"), PathBuf::from("/b")])].into();
        let mut capture = CaptureLoop::new(clipboard, config(dir.path()));
        let (events, listener) = recorder();
        capture.add_listener(listener);

        assert!(capture.tick().await.is_empty());
        assert!(outputs(dir.path()).is_empty());
        assert!(capture.state().slot(ContentKind::FileRef).is_unknown());
        assert!(events
            .lock()
            .unwrap()
            .iter()
            .any(|e| matches!(e, CaptureEvent::Unsupported { .. })));
    }

    #[tokio::test]
    async fn test_one_kind_failing_does_not_block_others() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out");
        std::fs::create_dir(&target).unwrap();
        let source = dir.path().join("pic.gif");
        std::fs::write(&source, b"GIF89a").unwrap();

        let mut clipboard = ScriptedClipboard::new();
        clipboard.text = [Step::Fail("no display")].into();
        clipboard.image = [Step::Fail("helper timed out")].into();
        clipboard.files = [Step::Value(vec![source])].into();
        let mut capture = CaptureLoop::new(clipboard, config(&target));

        let saved = capture.tick().await;
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].kind, ContentKind::FileRef);
        assert_eq!(capture.source().file_reads, 1);
    }

    #[tokio::test]
    async fn test_text_only_backend_skips_rich_reads() {
        let dir = tempfile::tempdir().unwrap();
        let mut clipboard = ScriptedClipboard::texts([Step::Value("x"), Step::Value("y")]);
        clipboard.rich = false;
        let mut capture = CaptureLoop::new(clipboard, config(dir.path()));

        capture.tick().await;
        capture.tick().await;

        assert_eq!(capture.source().image_reads, 0);
        assert_eq!(capture.source().file_reads, 0);
        assert_eq!(sorted_texts(dir.path()), vec!["x", "y"]);
    }

    #[tokio::test]
    async fn test_run_until_stops_between_ticks() {
        let dir = tempfile::tempdir().unwrap();
        let clipboard = ScriptedClipboard::texts([Step::Value("only")]);
        let mut capture = CaptureLoop::new(clipboard, config(dir.path()));
        let (events, listener) = recorder();
        capture.add_listener(listener);

        let stats = capture.run_until(std::future::ready(())).await;

        assert_eq!(stats, LoopStats { ticks: 1, saved: 1 });
        let events = events.lock().unwrap();
        assert!(matches!(events.first(), Some(CaptureEvent::Started { .. })));
        assert!(matches!(
            events.last(),
            Some(CaptureEvent::Stopped { ticks: 1, saved: 1 })
        ));
        assert_eq!(sorted_texts(dir.path()), vec!["only"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_until_keeps_polling() {
        let dir = tempfile::tempdir().unwrap();
        let clipboard = ScriptedClipboard::texts([
            Step::Value("hello"),
            Step::Value("hello"),
            Step::Value("world"),
        ]);
        let mut capture = CaptureLoop::new(clipboard, config(dir.path()));

        let stats = capture
            .run_until(tokio::time::sleep(Duration::from_millis(2500)))
            .await;

        assert_eq!(stats, LoopStats { ticks: 3, saved: 2 });
        assert_eq!(sorted_texts(dir.path()), vec!["hello", "world"]);
    }
}
