// SPDX-License-Identifier: GPL-3.0-only

//! Image-file scanner backend
//!
//! Stands in for a camera by cycling through still images: each image is
//! shown as the live frame for a while and decoded once. Useful without a
//! camera and for demos.

mod file_source;

pub use file_source::{collect_image_paths, is_image_path, load_image_as_frame};

use crate::app::frame_processor::CodeDetector;
use crate::backends::camera::ScannerBackend;
use crate::backends::camera::types::*;
use crate::constants::timing;
use futures::future::BoxFuture;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Granularity of the hold sleep, bounds how long `stop` waits
const STOP_CHECK_INTERVAL: Duration = Duration::from_millis(20);

/// Backend that "captures" still images from a file or directory
pub struct ImageFileBackend {
    source: PathBuf,
    hold: Duration,
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
    latest: Arc<Mutex<Option<CameraFrame>>>,
}

impl ImageFileBackend {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            hold: timing::IMAGE_HOLD,
            running: Arc::new(AtomicBool::new(false)),
            thread: None,
            latest: Arc::new(Mutex::new(None)),
        }
    }

    /// Override how long each image stays up
    pub fn with_hold(mut self, hold: Duration) -> Self {
        self.hold = hold;
        self
    }

    pub fn source(&self) -> &Path {
        &self.source
    }
}

impl ScannerBackend for ImageFileBackend {
    fn name(&self) -> &'static str {
        "image-file"
    }

    fn has_permission(&self) -> bool {
        true
    }

    fn request_permission(&self) -> BoxFuture<'static, bool> {
        Box::pin(async { true })
    }

    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        if collect_image_paths(&self.source).is_empty() {
            return Vec::new();
        }

        let name = self
            .source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.source.display().to_string());

        vec![CameraDevice {
            name,
            path: self.source.display().to_string(),
            position: CameraPosition::External,
            device_info: None,
        }]
    }

    fn start(
        &mut self,
        device: &CameraDevice,
        config: &ScannerConfig,
        sink: DecodeSink,
    ) -> BackendResult<()> {
        if self.is_running() {
            return Err(BackendError::AlreadyStarted);
        }
        self.stop();

        let images = collect_image_paths(Path::new(&device.path));
        if images.is_empty() {
            return Err(BackendError::DeviceNotFound(format!(
                "No images in {}",
                device.path
            )));
        }

        info!(source = %device.path, count = images.len(), "Starting image-file source");

        self.running.store(true, Ordering::SeqCst);
        let running = Arc::clone(&self.running);
        let latest = Arc::clone(&self.latest);
        let detector = CodeDetector::new(config);
        let hold = self.hold;

        let thread = std::thread::Builder::new()
            .name("image-source".to_string())
            .spawn(move || {
                for path in images.iter().cycle() {
                    if !running.load(Ordering::SeqCst) {
                        break;
                    }

                    let shown_at = Instant::now();
                    match load_image_as_frame(path) {
                        Ok(frame) => {
                            if let Ok(mut slot) = latest.lock() {
                                *slot = Some(frame.clone());
                            }
                            let codes = detector.detect_sync(&frame);
                            debug!(path = %path.display(), count = codes.len(), "Decoded image");
                            if !codes.is_empty() {
                                sink(codes);
                            }
                        }
                        Err(e) => warn!(error = %e, "Skipping image"),
                    }

                    while running.load(Ordering::SeqCst) && shown_at.elapsed() < hold {
                        std::thread::sleep(STOP_CHECK_INTERVAL);
                    }
                }
                debug!("Image source thread ended");
            });

        match thread {
            Ok(thread) => {
                self.thread = Some(thread);
                Ok(())
            }
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                Err(BackendError::InitializationFailed(e.to_string()))
            }
        }
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            warn!("Image source thread panicked");
        }
        if let Ok(mut slot) = self.latest.lock() {
            *slot = None;
        }
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn latest_frame(&self) -> Option<CameraFrame> {
        self.latest.lock().ok().and_then(|slot| slot.clone())
    }
}

impl Drop for ImageFileBackend {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_missing_source_has_no_cameras() {
        let backend = ImageFileBackend::new("/nonexistent/images");
        assert!(backend.has_permission());
        assert!(backend.enumerate_cameras().is_empty());
        assert!(backend.select_device(CameraPosition::Back, None).is_none());
    }

    #[test]
    fn test_blank_image_is_previewed_but_not_reported() {
        let dir = std::env::temp_dir().join(format!("code-scanner-backend-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("blank.png");
        image::RgbaImage::from_pixel(16, 16, image::Rgba([255, 255, 255, 255]))
            .save(&path)
            .unwrap();

        let mut backend = ImageFileBackend::new(&path).with_hold(Duration::from_millis(10));
        let device = backend.select_device(CameraPosition::Back, None).unwrap();
        assert_eq!(device.position, CameraPosition::External);

        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);
        let sink: DecodeSink = Arc::new(move |_| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });
        backend.start(&device, &ScannerConfig::default(), sink).unwrap();
        assert!(backend.is_running());

        let deadline = Instant::now() + Duration::from_secs(5);
        while backend.latest_frame().is_none() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(backend.latest_frame().is_some());

        backend.stop();
        assert!(!backend.is_running());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
