// SPDX-License-Identifier: GPL-3.0-only

//! Message update handling
//!
//! `update()` dispatches each message to a focused handler. Handlers mutate
//! the session and return the effects the runtime has to carry out.

use crate::app::frame_processor::DecodedCode;
use crate::app::state::{Effect, Message, ScanSession, ScannedCode};
use crate::backends::camera::CameraDevice;
use crate::config::ClearPolicy;
use tracing::{debug, info};

impl ScanSession {
    /// First activation of the screen
    ///
    /// Records the initial permission and device; requests permission if it
    /// is missing. Later calls are ignored.
    pub fn activate(&mut self, has_permission: bool, device: Option<CameraDevice>) -> Vec<Effect> {
        if self.activated {
            debug!("Scan session already active");
            return Vec::new();
        }
        self.activated = true;

        info!(
            has_permission,
            device = device.as_ref().map(|d| d.name.as_str()).unwrap_or("none"),
            "Activating scan session"
        );

        let could_capture = self.can_capture();
        self.device = device;
        let mut effects = self.observe_permission(has_permission);
        effects.extend(self.capture_transition(could_capture));
        effects
    }

    /// Main message handler - routes messages to handler methods.
    pub fn update(&mut self, message: Message) -> Vec<Effect> {
        match message {
            Message::PermissionChanged(granted) => self.handle_permission_changed(granted),
            Message::DeviceChanged(device) => self.handle_device_changed(device),
            Message::CodesDecoded(codes) => self.handle_codes_decoded(codes),
            Message::ClearResult { generation } => self.handle_clear_result(generation),
        }
    }

    fn handle_permission_changed(&mut self, granted: bool) -> Vec<Effect> {
        let could_capture = self.can_capture();
        let mut effects = self.observe_permission(granted);
        effects.extend(self.capture_transition(could_capture));
        effects
    }

    fn handle_device_changed(&mut self, device: Option<CameraDevice>) -> Vec<Effect> {
        if self.device == device {
            return Vec::new();
        }

        info!(
            device = device.as_ref().map(|d| d.name.as_str()).unwrap_or("none"),
            "Camera device changed"
        );

        let could_capture = self.can_capture();
        let mut effects = Vec::new();
        // Switching between two cameras restarts capture on the new one
        if could_capture && device.is_some() {
            effects.push(Effect::StopCapture);
            self.device = device;
            effects.push(Effect::StartCapture);
            return effects;
        }

        self.device = device;
        effects.extend(self.capture_transition(could_capture));
        effects
    }

    /// Accept the first code of a batch and schedule its auto-clear
    fn handle_codes_decoded(&mut self, codes: Vec<DecodedCode>) -> Vec<Effect> {
        let batch_size = codes.len();
        let Some(first) = codes.into_iter().next() else {
            return Vec::new();
        };

        self.generation += 1;
        let scanned = ScannedCode::from_decoded(first, self.generation);
        info!(
            value = %scanned.value,
            symbology = %scanned.symbology,
            generation = self.generation,
            discarded = batch_size - 1,
            "Scanned code"
        );
        self.scanned = Some(scanned);

        vec![Effect::ScheduleClear {
            generation: self.generation,
            delay: self.clear_delay,
        }]
    }

    fn handle_clear_result(&mut self, generation: u64) -> Vec<Effect> {
        let Some(current) = self.scanned.as_ref() else {
            return Vec::new();
        };

        match self.clear_policy {
            ClearPolicy::Latest if current.generation != generation => {
                debug!(
                    stale = generation,
                    current = current.generation,
                    "Ignoring stale clear"
                );
            }
            _ => {
                debug!(generation = current.generation, "Clearing scanned code");
                self.scanned = None;
            }
        }

        Vec::new()
    }

    /// Record observed permission; request it on entering the not-granted state
    fn observe_permission(&mut self, granted: bool) -> Vec<Effect> {
        if granted != self.has_permission {
            info!(granted, "Camera permission changed");
        }
        self.has_permission = granted;

        if granted {
            self.permission_requested = false;
            return Vec::new();
        }

        if self.permission_requested {
            return Vec::new();
        }
        self.permission_requested = true;
        vec![Effect::RequestPermission]
    }

    fn capture_transition(&self, could_capture: bool) -> Vec<Effect> {
        match (could_capture, self.can_capture()) {
            (false, true) => vec![Effect::StartCapture],
            (true, false) => vec![Effect::StopCapture],
            _ => Vec::new(),
        }
    }
}
