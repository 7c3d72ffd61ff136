// SPDX-License-Identifier: GPL-3.0-only

//! Messages, effects and scan state for the session controller

use crate::app::frame_processor::DecodedCode;
use crate::backends::camera::CameraDevice;
use crate::config::ClearPolicy;
use crate::constants::UNKNOWN_SYMBOLOGY;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::time::Duration;

/// Scan session controller state
///
/// Owns the capture-active flag and the single scanned-result slot, plus the
/// permission and device last observed from the backend.
#[derive(Debug)]
pub struct ScanSession {
    /// Whether the backend should be sampling frames
    pub(crate) is_active: bool,
    /// Most recently accepted scan, until its clear timer fires
    pub(crate) scanned: Option<ScannedCode>,
    pub(crate) has_permission: bool,
    /// Set once a request was issued for the current not-granted stretch
    pub(crate) permission_requested: bool,
    pub(crate) activated: bool,
    pub(crate) device: Option<CameraDevice>,
    /// Generation of the last accepted scan
    pub(crate) generation: u64,
    pub(crate) clear_delay: Duration,
    pub(crate) clear_policy: ClearPolicy,
}

/// Input to [`ScanSession::update`]
#[derive(Debug, Clone)]
pub enum Message {
    /// Observed camera permission changed (or a request completed)
    PermissionChanged(bool),
    /// The selected camera appeared, changed or went away
    DeviceChanged(Option<CameraDevice>),
    /// The scanner decoded zero or more codes in one frame
    CodesDecoded(Vec<DecodedCode>),
    /// A clear timer fired for the result with this generation
    ClearResult { generation: u64 },
}

/// Side effect requested by the session, executed by the runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Ask the backend for camera access
    RequestPermission,
    /// Post [`Message::ClearResult`] for `generation` after `delay`
    ScheduleClear { generation: u64, delay: Duration },
    /// Permission and device are both available: start sampling frames
    StartCapture,
    /// Permission or device went away: stop sampling frames
    StopCapture,
}

/// The transient result shown over the live preview
#[derive(Debug, Clone, Serialize)]
pub struct ScannedCode {
    /// Decoded payload, empty if the decoder reported none
    pub value: String,
    /// Symbology identifier, `unknown` if the decoder reported none
    pub symbology: String,
    pub scanned_at: DateTime<Local>,
    /// Increments with every accepted scan; clear timers carry it
    #[serde(skip)]
    pub generation: u64,
}

impl ScannedCode {
    /// Apply the value/symbology defaulting rule to a decoded code
    pub fn from_decoded(code: DecodedCode, generation: u64) -> Self {
        Self {
            value: code.value.unwrap_or_default(),
            symbology: code
                .symbology
                .map(|s| s.id().to_string())
                .unwrap_or_else(|| UNKNOWN_SYMBOLOGY.to_string()),
            scanned_at: Local::now(),
            generation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::Symbology;

    #[test]
    fn test_from_decoded_keeps_fields() {
        let scanned = ScannedCode::from_decoded(DecodedCode::new("12345", Symbology::Ean13), 7);
        assert_eq!(scanned.value, "12345");
        assert_eq!(scanned.symbology, "ean-13");
        assert_eq!(scanned.generation, 7);
    }

    #[test]
    fn test_from_decoded_defaults() {
        let code = DecodedCode {
            value: None,
            symbology: None,
            bounds: None,
        };
        let scanned = ScannedCode::from_decoded(code, 1);
        assert_eq!(scanned.value, "");
        assert_eq!(scanned.symbology, "unknown");
    }

    #[test]
    fn test_json_skips_generation() {
        let scanned = ScannedCode::from_decoded(DecodedCode::new("abc", Symbology::Qr), 3);
        let json: serde_json::Value = serde_json::to_value(&scanned).unwrap();
        assert_eq!(json["value"], "abc");
        assert_eq!(json["symbology"], "qr");
        assert!(json.get("generation").is_none());
        assert!(json.get("scanned_at").is_some());
    }
}
