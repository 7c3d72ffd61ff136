// SPDX-License-Identifier: MPL-2.0

//! Scan session controller
//!
//! The controller is a plain state machine: it consumes [`Message`]s and
//! returns [`Effect`]s, never touching a camera, a clock or a thread. The
//! [`runtime`] module executes the effects and feeds results back.
//!
//! # Architecture
//!
//! - `state`: `ScanSession`, `Message`, `Effect`, `ScannedCode`
//! - `update`: Message handling
//! - `view`: Render decision (permission / no device / live capture)
//! - `runtime`: tokio driver with the cancellable clear timer
//! - `frame_processor`: Frame preparation and code detectors

pub mod frame_processor;
pub mod runtime;
mod state;
mod update;
pub mod view;

pub use runtime::SessionRuntime;
pub use state::{Effect, Message, ScanSession, ScannedCode};
pub use view::{ResultOverlay, ScreenView, render_decision};

use crate::backends::camera::CameraDevice;
use crate::config::{ClearPolicy, Config};
use std::time::Duration;

impl ScanSession {
    pub fn new(config: &Config) -> Self {
        Self {
            is_active: true,
            scanned: None,
            has_permission: false,
            permission_requested: false,
            activated: false,
            device: None,
            generation: 0,
            clear_delay: config.clear_delay(),
            clear_policy: config.clear_policy,
        }
    }

    /// Current scanned result, if one is showing
    pub fn scanned(&self) -> Option<&ScannedCode> {
        self.scanned.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn has_permission(&self) -> bool {
        self.has_permission
    }

    pub fn device(&self) -> Option<&CameraDevice> {
        self.device.as_ref()
    }

    /// Generation of the last accepted scan (0 before the first)
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn clear_delay(&self) -> Duration {
        self.clear_delay
    }

    pub fn clear_policy(&self) -> ClearPolicy {
        self.clear_policy
    }

    /// Whether the backend should be capturing right now
    pub fn can_capture(&self) -> bool {
        self.is_active && self.has_permission && self.device.is_some()
    }

    /// What the front end should draw
    pub fn view(&self) -> ScreenView {
        render_decision(
            self.has_permission,
            self.device.as_ref(),
            self.scanned.as_ref(),
            self.is_active,
        )
    }
}
