// SPDX-License-Identifier: MPL-2.0

//! Fake scanner backend for integration tests
//!
//! The fake emits decode events synchronously through the sink it was
//! started with, so tests control exactly when codes "appear".

#![allow(dead_code)]

use code_scanner::app::frame_processor::DecodedCode;
use code_scanner::backends::camera::{
    BackendError, BackendResult, CameraDevice, CameraFrame, CameraPosition, DecodeSink,
    ScannerBackend, ScannerConfig,
};
use futures::future::BoxFuture;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct FakeState {
    permission: bool,
    grant_on_request: bool,
    cameras: Vec<CameraDevice>,
    fail_start: bool,
    sink: Option<DecodeSink>,
    running: bool,
    starts: usize,
    stops: usize,
    permission_requests: usize,
}

/// Backend half, handed to the session runtime
pub struct FakeBackend {
    state: Arc<Mutex<FakeState>>,
}

/// Test half, used to drive the backend and inspect calls
#[derive(Clone)]
pub struct FakeHandle {
    state: Arc<Mutex<FakeState>>,
}

pub fn camera(path: &str, position: CameraPosition) -> CameraDevice {
    CameraDevice {
        name: format!("Fake camera {}", path),
        path: path.to_string(),
        position,
        device_info: None,
    }
}

pub fn fake_backend(permission: bool, cameras: Vec<CameraDevice>) -> (FakeBackend, FakeHandle) {
    let state = Arc::new(Mutex::new(FakeState {
        permission,
        cameras,
        ..FakeState::default()
    }));
    (
        FakeBackend {
            state: Arc::clone(&state),
        },
        FakeHandle { state },
    )
}

impl FakeHandle {
    /// Deliver one decode event, as the decode thread would
    pub fn emit(&self, codes: Vec<DecodedCode>) {
        let sink = self.state.lock().unwrap().sink.clone();
        let sink = sink.expect("capture was not started");
        sink(codes);
    }

    pub fn grant_on_request(&self, grant: bool) {
        self.state.lock().unwrap().grant_on_request = grant;
    }

    pub fn fail_start(&self, fail: bool) {
        self.state.lock().unwrap().fail_start = fail;
    }

    /// Capture ends on its own, as when a device stops delivering frames
    pub fn end_capture(&self) {
        let mut state = self.state.lock().unwrap();
        state.running = false;
        state.sink = None;
    }

    pub fn set_cameras(&self, cameras: Vec<CameraDevice>) {
        self.state.lock().unwrap().cameras = cameras;
    }

    pub fn starts(&self) -> usize {
        self.state.lock().unwrap().starts
    }

    pub fn stops(&self) -> usize {
        self.state.lock().unwrap().stops
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().unwrap().running
    }

    pub fn permission_requests(&self) -> usize {
        self.state.lock().unwrap().permission_requests
    }
}

impl ScannerBackend for FakeBackend {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn has_permission(&self) -> bool {
        self.state.lock().unwrap().permission
    }

    fn request_permission(&self) -> BoxFuture<'static, bool> {
        let mut state = self.state.lock().unwrap();
        state.permission_requests += 1;
        if state.grant_on_request {
            state.permission = true;
        }
        let granted = state.permission;
        Box::pin(async move { granted })
    }

    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        self.state.lock().unwrap().cameras.clone()
    }

    fn start(
        &mut self,
        _device: &CameraDevice,
        _config: &ScannerConfig,
        sink: DecodeSink,
    ) -> BackendResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_start {
            return Err(BackendError::DeviceNotFound("unplugged".to_string()));
        }
        if state.running {
            return Err(BackendError::AlreadyStarted);
        }
        state.starts += 1;
        state.running = true;
        state.sink = Some(sink);
        Ok(())
    }

    fn stop(&mut self) {
        let mut state = self.state.lock().unwrap();
        state.stops += 1;
        state.running = false;
        state.sink = None;
    }

    fn is_running(&self) -> bool {
        self.state.lock().unwrap().running
    }

    fn latest_frame(&self) -> Option<CameraFrame> {
        None
    }
}
