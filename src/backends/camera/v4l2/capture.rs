// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 capture and decode threads
//!
//! The capture thread dequeues mmap buffers, converts them to frames and
//! publishes the latest one for the preview. Every `sample_interval` it
//! offers a frame to the decode thread through a channel of capacity 1, so
//! frames are dropped while a decode is in progress.

use super::super::format_converters::{SUPPORTED_FOURCCS, buffer_to_frame};
use super::super::types::*;
use crate::app::frame_processor::CodeDetector;
use crate::constants::{MAX_DEQUEUE_FAILURES, PREFERRED_CAPTURE_SIZE, V4L2_BUFFER_COUNT, timing};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, SyncSender, TrySendError};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, trace, warn};
use v4l::buffer::Type;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;
use v4l::{Format, FourCC};

/// Slot holding the most recent converted frame
pub type LatestFrame = Arc<Mutex<Option<CameraFrame>>>;

/// Running capture and decode threads for one device
pub struct CaptureSession {
    running: Arc<AtomicBool>,
    capture_thread: Option<JoinHandle<()>>,
    decode_thread: Option<JoinHandle<()>>,
    format: CameraFormat,
}

impl CaptureSession {
    /// Open `device_path`, negotiate a format and start both threads
    ///
    /// Blocks until the capture thread has either started streaming or
    /// failed to.
    pub fn spawn(
        device_path: &str,
        config: &ScannerConfig,
        sink: DecodeSink,
        latest: LatestFrame,
    ) -> BackendResult<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let (frame_tx, frame_rx) = mpsc::sync_channel::<CameraFrame>(1);
        let (ready_tx, ready_rx) = mpsc::channel::<BackendResult<CameraFormat>>();

        let detector = CodeDetector::new(config);
        let decode_thread = std::thread::Builder::new()
            .name("code-decode".to_string())
            .spawn(move || {
                while let Ok(frame) = frame_rx.recv() {
                    let started = Instant::now();
                    let codes = detector.detect_sync(&frame);
                    trace!(
                        count = codes.len(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Decoded sampled frame"
                    );
                    if !codes.is_empty() {
                        sink(codes);
                    }
                }
                debug!("Decode thread ended");
            })?;

        let path = device_path.to_string();
        let sample_interval = config.sample_interval;
        let running_clone = Arc::clone(&running);
        let capture_thread = std::thread::Builder::new()
            .name("v4l2-capture".to_string())
            .spawn(move || {
                capture_loop(
                    &path,
                    sample_interval,
                    frame_tx,
                    latest,
                    running_clone,
                    ready_tx,
                );
            })?;

        let mut session = Self {
            running,
            capture_thread: Some(capture_thread),
            decode_thread: Some(decode_thread),
            format: CameraFormat {
                width: 0,
                height: 0,
                pixel_format: String::new(),
            },
        };

        match ready_rx.recv_timeout(timing::CAPTURE_START_TIMEOUT) {
            Ok(Ok(format)) => {
                info!(device = device_path, format = %format, "V4L2 capture started");
                session.format = format;
                Ok(session)
            }
            Ok(Err(e)) => {
                session.stop();
                Err(e)
            }
            Err(_) => {
                session.stop();
                Err(BackendError::InitializationFailed(format!(
                    "{} did not start streaming in time",
                    device_path
                )))
            }
        }
    }

    pub fn format(&self) -> &CameraFormat {
        &self.format
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Signal both threads and wait for them
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);

        // The decode thread exits once the capture thread drops its sender
        for (name, handle) in [
            ("capture", self.capture_thread.take()),
            ("decode", self.decode_thread.take()),
        ] {
            if let Some(handle) = handle
                && handle.join().is_err()
            {
                warn!(thread = name, "Thread panicked");
            }
        }
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Open a device and stream until `running` is cleared
fn capture_loop(
    device_path: &str,
    sample_interval: Duration,
    frame_tx: SyncSender<CameraFrame>,
    latest: LatestFrame,
    running: Arc<AtomicBool>,
    ready_tx: mpsc::Sender<BackendResult<CameraFormat>>,
) {
    static FRAME_COUNTER: AtomicU64 = AtomicU64::new(0);

    let mut dev = match Device::with_path(device_path) {
        Ok(dev) => dev,
        Err(e) => {
            let _ = ready_tx.send(Err(BackendError::DeviceNotFound(format!(
                "{}: {}",
                device_path, e
            ))));
            return;
        }
    };

    let format = match negotiate_format(&mut dev) {
        Ok(format) => format,
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
        }
    };
    let fourcc = format.fourcc.repr;

    let mut stream = match Stream::with_buffers(&mut dev, Type::VideoCapture, V4L2_BUFFER_COUNT) {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready_tx.send(Err(BackendError::InitializationFailed(format!(
                "Failed to create buffer stream: {}",
                e
            ))));
            return;
        }
    };
    stream.set_timeout(timing::DEQUEUE_TIMEOUT);

    let _ = ready_tx.send(Ok(CameraFormat {
        width: format.width,
        height: format.height,
        pixel_format: String::from_utf8_lossy(&fourcc).to_string(),
    }));

    let mut last_sample: Option<Instant> = None;
    let mut failures = 0u32;
    while running.load(Ordering::SeqCst) {
        let (buf, meta) = match stream.next() {
            Ok(next) => next,
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => continue,
            Err(e) => {
                failures += 1;
                if is_device_gone(&e) || failures >= MAX_DEQUEUE_FAILURES {
                    error!(
                        device = device_path,
                        error = %e,
                        failures,
                        "Camera stopped delivering frames"
                    );
                    break;
                }
                if failures == 1 {
                    warn!(error = %e, "Failed to dequeue V4L2 buffer");
                }
                std::thread::sleep(timing::DEQUEUE_RETRY_DELAY);
                continue;
            }
        };
        failures = 0;

        let frame_num = FRAME_COUNTER.fetch_add(1, Ordering::Relaxed);
        let used = (meta.bytesused as usize).min(buf.len());
        let data = if used > 0 { &buf[..used] } else { buf };

        let Some(frame) =
            buffer_to_frame(&fourcc, data, format.width, format.height, format.stride)
        else {
            if frame_num % 30 == 0 {
                warn!(frame = frame_num, size = data.len(), "Dropping corrupt frame");
            }
            continue;
        };

        if let Ok(mut slot) = latest.lock() {
            *slot = Some(frame.clone());
        }

        let due = last_sample.is_none_or(|at| at.elapsed() >= sample_interval);
        if !due {
            continue;
        }
        last_sample = Some(Instant::now());

        match frame_tx.try_send(frame) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                trace!(frame = frame_num, "Decoder busy, frame skipped");
            }
            Err(TrySendError::Disconnected(_)) => {
                error!("Decode thread is gone, stopping capture");
                break;
            }
        }
    }

    running.store(false, Ordering::SeqCst);
    if let Ok(mut slot) = latest.lock() {
        *slot = None;
    }
    info!(device = device_path, "V4L2 capture loop ended");
}

/// Whether a dequeue error means the device node went away (unplugged)
fn is_device_gone(error: &std::io::Error) -> bool {
    matches!(error.raw_os_error(), Some(libc::ENODEV) | Some(libc::ENXIO))
}

/// Try each convertible FourCC at the preferred size
fn negotiate_format(dev: &mut Device) -> BackendResult<Format> {
    let (width, height) = PREFERRED_CAPTURE_SIZE;

    for fourcc in SUPPORTED_FOURCCS {
        let wanted = Format::new(width, height, FourCC::new(fourcc));
        match dev.set_format(&wanted) {
            Ok(format) if format.fourcc.repr == *fourcc => {
                debug!(
                    fourcc = %String::from_utf8_lossy(fourcc),
                    width = format.width,
                    height = format.height,
                    "Negotiated V4L2 format"
                );
                return Ok(format);
            }
            Ok(format) => {
                trace!(
                    wanted = %String::from_utf8_lossy(fourcc),
                    got = %String::from_utf8_lossy(&format.fourcc.repr),
                    "Driver substituted format"
                );
            }
            Err(e) => {
                debug!(fourcc = %String::from_utf8_lossy(fourcc), error = %e, "Format rejected");
            }
        }
    }

    Err(BackendError::FormatNotSupported(
        "Device offers none of MJPG, YUYV, UYVY, RGB3, GREY".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unplugged_device_errors() {
        assert!(is_device_gone(&std::io::Error::from_raw_os_error(libc::ENODEV)));
        assert!(is_device_gone(&std::io::Error::from_raw_os_error(libc::ENXIO)));
        assert!(!is_device_gone(&std::io::Error::from_raw_os_error(libc::EAGAIN)));
        assert!(!is_device_gone(&std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            "dequeue timed out"
        )));
    }
}
