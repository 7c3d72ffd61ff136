// SPDX-License-Identifier: GPL-3.0-only

//! Session runtime
//!
//! Drives a [`ScanSession`] against a [`ScannerBackend`]: executes effects,
//! owns the clear timers and funnels backend events back in as messages.
//! Front ends call [`SessionRuntime::pump`] from their draw loop; it also
//! re-checks the camera list so unplugged and newly attached cameras show up.

use crate::app::state::{Effect, Message, ScanSession};
use crate::app::view::ScreenView;
use crate::backends::camera::{
    CameraDevice, CameraFormat, CameraFrame, DecodeSink, ScannerBackend, ScannerConfig,
};
use crate::config::{ClearPolicy, Config};
use crate::constants::timing;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

pub struct SessionRuntime {
    session: ScanSession,
    backend: Box<dyn ScannerBackend>,
    config: Config,
    scanner_config: ScannerConfig,
    handle: Handle,
    sender: mpsc::UnboundedSender<Message>,
    receiver: mpsc::UnboundedReceiver<Message>,
    /// Pending clear timers; at most one under `ClearPolicy::Latest`
    clear_timers: Vec<JoinHandle<()>>,
    last_device_poll: Option<Instant>,
    /// Camera that failed to capture; not selected again until it disappears
    failed_device: Option<String>,
    stopped: bool,
}

impl SessionRuntime {
    /// Create a runtime; tasks are spawned on `handle`
    pub fn new(backend: Box<dyn ScannerBackend>, config: Config, handle: Handle) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            session: ScanSession::new(&config),
            scanner_config: ScannerConfig::from(&config),
            backend,
            config,
            handle,
            sender,
            receiver,
            clear_timers: Vec::new(),
            last_device_poll: None,
            failed_device: None,
            stopped: false,
        }
    }

    /// Probe permission and device, then activate the session
    pub fn start(&mut self) {
        let has_permission = self.backend.has_permission();
        let device = self.select_device();
        if let Some(wanted) = self.config.device_override.as_deref()
            && device.as_ref().is_none_or(|d| d.path != wanted)
        {
            warn!(device = wanted, "Requested camera not found, selecting by position");
        }
        info!(
            backend = self.backend.name(),
            has_permission,
            device = device.as_ref().map(|d| d.path.as_str()).unwrap_or("none"),
            "Starting scan session"
        );

        let effects = self.session.activate(has_permission, device);
        self.execute(effects);
        self.last_device_poll = Some(Instant::now());
    }

    /// Apply one message and carry out its effects
    pub fn dispatch(&mut self, message: Message) {
        let regained = matches!(message, Message::PermissionChanged(true))
            && !self.session.has_permission();

        let effects = self.session.update(message);
        self.execute(effects);

        // Devices may only become visible once access is granted
        if regained {
            let device = self.select_device();
            if device.as_ref() != self.session.device() {
                let effects = self.session.update(Message::DeviceChanged(device));
                self.execute(effects);
            }
        }
    }

    /// Apply all pending messages without blocking
    ///
    /// Also re-checks the cameras every `timing::DEVICE_POLL_INTERVAL`.
    /// Returns true if the session changed.
    pub fn pump(&mut self) -> bool {
        let mut changed = false;
        while let Ok(message) = self.receiver.try_recv() {
            self.dispatch(message);
            changed = true;
        }
        changed | self.poll_devices()
    }

    /// Wait for the next message and apply it
    pub async fn recv(&mut self) -> bool {
        match self.receiver.recv().await {
            Some(message) => {
                self.dispatch(message);
                true
            }
            None => false,
        }
    }

    pub fn view(&self) -> ScreenView {
        self.session.view()
    }

    pub fn latest_frame(&self) -> Option<CameraFrame> {
        self.backend.latest_frame()
    }

    pub fn session(&self) -> &ScanSession {
        &self.session
    }

    pub fn selected_device(&self) -> Option<&CameraDevice> {
        self.session.device()
    }

    /// Config as updated during the run (e.g. last used camera)
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Format of the running capture, for status display
    pub fn capture_format(&self) -> Option<CameraFormat> {
        self.backend.current_format()
    }

    /// Stop capture and abort pending timers
    pub fn shutdown(&mut self) {
        self.stopped = true;
        for timer in self.clear_timers.drain(..) {
            timer.abort();
        }
        if self.backend.is_running() {
            self.backend.stop();
        }
        info!("Scan session stopped");
    }

    /// Follow cameras appearing, disappearing and captures that ended
    fn poll_devices(&mut self) -> bool {
        if self.stopped || !self.session.has_permission() {
            return false;
        }
        let Some(last) = self.last_device_poll else {
            return false;
        };
        let now = Instant::now();
        if now.duration_since(last) < timing::DEVICE_POLL_INTERVAL {
            return false;
        }
        self.last_device_poll = Some(now);

        let mut changed = false;
        if self.session.can_capture() && !self.backend.is_running() {
            let path = self.session.device().map(|d| d.path.clone());
            warn!(device = path.as_deref().unwrap_or("none"), "Capture ended unexpectedly");
            self.failed_device = path;
            let effects = self.session.update(Message::DeviceChanged(None));
            self.execute(effects);
            changed = true;
        }

        let device = self.select_device();
        if let Some(failed) = self.failed_device.as_deref() {
            if device.as_ref().is_some_and(|d| d.path == failed) {
                return changed;
            }
            debug!(device = failed, "Failed camera is gone");
            self.failed_device = None;
        }

        if device.as_ref() != self.session.device() {
            info!(
                device = device.as_ref().map(|d| d.path.as_str()).unwrap_or("none"),
                "Camera list changed"
            );
            let effects = self.session.update(Message::DeviceChanged(device));
            self.execute(effects);
            changed = true;
        }
        changed
    }

    fn select_device(&self) -> Option<CameraDevice> {
        if let Some(wanted) = self.config.device_override.as_deref()
            && let Some(camera) = self
                .backend
                .enumerate_cameras()
                .into_iter()
                .find(|camera| camera.path == wanted)
        {
            return Some(camera);
        }
        self.backend.select_device(
            self.config.camera_position,
            self.config.last_camera_path.as_deref(),
        )
    }

    fn execute(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::RequestPermission => self.request_permission(),
                Effect::ScheduleClear { generation, delay } => {
                    self.schedule_clear(generation, delay)
                }
                Effect::StartCapture => self.start_capture(),
                Effect::StopCapture => {
                    debug!("Stopping capture");
                    self.backend.stop();
                }
            }
        }
    }

    fn request_permission(&self) {
        info!("Requesting camera permission");
        let request = self.backend.request_permission();
        let sender = self.sender.clone();
        self.handle.spawn(async move {
            let granted = request.await;
            let _ = sender.send(Message::PermissionChanged(granted));
        });
    }

    fn schedule_clear(&mut self, generation: u64, delay: Duration) {
        if self.session.clear_policy() == ClearPolicy::Latest {
            for timer in self.clear_timers.drain(..) {
                timer.abort();
            }
        } else {
            self.clear_timers.retain(|timer| !timer.is_finished());
        }

        debug!(generation, delay_ms = delay.as_millis() as u64, "Scheduling clear");
        let sender = self.sender.clone();
        let timer = self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = sender.send(Message::ClearResult { generation });
        });
        self.clear_timers.push(timer);
    }

    fn start_capture(&mut self) {
        let Some(device) = self.session.device().cloned() else {
            warn!("Capture requested without a device");
            return;
        };

        let sender = self.sender.clone();
        let sink: DecodeSink = Arc::new(move |codes| {
            let _ = sender.send(Message::CodesDecoded(codes));
        });

        match self.backend.start(&device, &self.scanner_config, sink) {
            Ok(()) => {
                info!(device = %device.name, path = %device.path, "Capture started");
                self.config.last_camera_path = Some(device.path);
            }
            Err(e) => {
                error!(error = %e, device = %device.path, "Failed to start capture");
                self.failed_device = Some(device.path);
                let effects = self.session.update(Message::DeviceChanged(None));
                self.execute(effects);
            }
        }
    }
}

impl Drop for SessionRuntime {
    fn drop(&mut self) {
        for timer in self.clear_timers.drain(..) {
            timer.abort();
        }
    }
}
