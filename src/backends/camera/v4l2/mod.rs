// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 scanner backend
//!
//! Enumerates `/dev/video*` capture nodes, streams from the selected one
//! with mmap buffers and decodes sampled frames on a worker thread.

mod capture;

use super::permission;
use super::types::*;
use super::v4l2_utils::{infer_position, list_video_nodes, probe_capture_node};
use super::ScannerBackend;
use capture::{CaptureSession, LatestFrame};
use futures::future::BoxFuture;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Scanner backend for Video4Linux2 devices
pub struct V4l2Backend {
    capture: Option<CaptureSession>,
    latest: LatestFrame,
}

impl V4l2Backend {
    pub fn new() -> Self {
        Self {
            capture: None,
            latest: Arc::new(Mutex::new(None)),
        }
    }
}

impl Default for V4l2Backend {
    fn default() -> Self {
        Self::new()
    }
}

impl ScannerBackend for V4l2Backend {
    fn name(&self) -> &'static str {
        "v4l2"
    }

    fn has_permission(&self) -> bool {
        permission::video_nodes_accessible()
    }

    fn request_permission(&self) -> BoxFuture<'static, bool> {
        Box::pin(permission::request_camera_access())
    }

    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        let cameras: Vec<CameraDevice> = list_video_nodes()
            .into_iter()
            .filter_map(|node| {
                let info = probe_capture_node(&node)?;
                let position = infer_position(&info);
                Some(CameraDevice {
                    name: info.card.clone(),
                    path: info.path.clone(),
                    position,
                    device_info: Some(info),
                })
            })
            .collect();

        debug!(count = cameras.len(), "Enumerated V4L2 cameras");
        cameras
    }

    fn start(
        &mut self,
        device: &CameraDevice,
        config: &ScannerConfig,
        sink: DecodeSink,
    ) -> BackendResult<()> {
        if self.capture.as_ref().is_some_and(CaptureSession::is_running) {
            return Err(BackendError::AlreadyStarted);
        }
        // A capture that ended on its own still owns joinable threads
        self.stop();

        let path = device
            .device_info
            .as_ref()
            .map(|info| info.real_path.as_str())
            .unwrap_or(&device.path);

        info!(device = %device.name, path, "Starting V4L2 capture");
        let session = CaptureSession::spawn(path, config, sink, Arc::clone(&self.latest))?;
        self.capture = Some(session);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(mut session) = self.capture.take() {
            info!("Stopping V4L2 capture");
            session.stop();
        }
        if let Ok(mut slot) = self.latest.lock() {
            *slot = None;
        }
    }

    fn is_running(&self) -> bool {
        self.capture.as_ref().is_some_and(CaptureSession::is_running)
    }

    fn current_format(&self) -> Option<CameraFormat> {
        self.capture
            .as_ref()
            .filter(|session| session.is_running())
            .map(|session| session.format().clone())
    }

    fn latest_frame(&self) -> Option<CameraFrame> {
        self.latest.lock().ok().and_then(|slot| slot.clone())
    }
}

impl Drop for V4l2Backend {
    fn drop(&mut self) {
        self.stop();
    }
}
