// SPDX-License-Identifier: GPL-3.0-only

//! Shared types for scanner backends

use crate::app::frame_processor::DecodedCode;
use crate::config::Config;
use crate::constants::Symbology;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Which way a camera faces
///
/// V4L2 does not report a facing, so it is inferred from the device name and
/// bus. USB webcams are `External` and qualify for any requested position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CameraPosition {
    #[default]
    Back,
    Front,
    External,
}

impl CameraPosition {
    /// Whether a camera at `self` can serve a request for `wanted`
    pub fn satisfies(&self, wanted: CameraPosition) -> bool {
        *self == wanted || *self == CameraPosition::External
    }
}

impl std::fmt::Display for CameraPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraPosition::Back => write!(f, "back"),
            CameraPosition::Front => write!(f, "front"),
            CameraPosition::External => write!(f, "external"),
        }
    }
}

impl FromStr for CameraPosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "back" | "rear" | "world" => Ok(CameraPosition::Back),
            "front" | "user" | "selfie" => Ok(CameraPosition::Front),
            "external" | "usb" => Ok(CameraPosition::External),
            other => Err(format!("Unknown camera position: {}", other)),
        }
    }
}

/// Device information from V4L2 capability
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Name of the device (V4L2 card)
    pub card: String,
    /// Driver name (V4L2 driver)
    pub driver: String,
    /// Bus the device hangs off (e.g. "usb-0000:00:14.0-6")
    pub bus_info: String,
    /// Device path (e.g., /dev/video0)
    pub path: String,
    /// Real device path (resolved symlinks)
    pub real_path: String,
}

/// Represents a camera device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevice {
    pub name: String,
    /// Path used to open the device (`/dev/videoN`, or an image path for file sources)
    pub path: String,
    pub position: CameraPosition,
    pub device_info: Option<DeviceInfo>,
}

/// Camera format specification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraFormat {
    pub width: u32,
    pub height: u32,
    /// FourCC code (e.g., "MJPG", "YUYV")
    pub pixel_format: String,
}

impl std::fmt::Display for CameraFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{} {}", self.width, self.height, self.pixel_format)
    }
}

/// Pixel format of frames handed to the preview and the decoders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 32-bit RGBA, the format every capture path converts to
    RGBA,
    /// 8-bit grayscale (monochrome and IR sensors)
    Gray8,
}

impl PixelFormat {
    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            PixelFormat::RGBA => 4,
            PixelFormat::Gray8 => 1,
        }
    }
}

/// A single captured frame
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    pub data: Arc<[u8]>,
    pub format: PixelFormat,
    /// Bytes per row, may include padding
    pub stride: u32,
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Wrap tightly packed RGBA pixels
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data: Arc::from(data.into_boxed_slice()),
            format: PixelFormat::RGBA,
            stride: width * 4,
            captured_at: Instant::now(),
        }
    }

    /// Wrap tightly packed 8-bit grayscale pixels
    pub fn from_gray(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data: Arc::from(data.into_boxed_slice()),
            format: PixelFormat::Gray8,
            stride: width,
            captured_at: Instant::now(),
        }
    }
}

/// Decoder settings handed to a backend when capture starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannerConfig {
    /// Only codes of these symbologies are reported
    pub recognized: BTreeSet<Symbology>,
    /// Minimum time between two decoded frames
    pub sample_interval: Duration,
    /// Frames are downscaled to this maximum dimension before decoding
    pub max_dimension: u32,
}

impl From<&Config> for ScannerConfig {
    fn from(config: &Config) -> Self {
        Self {
            recognized: config.recognized_symbologies.clone(),
            sample_interval: config.sample_interval(),
            max_dimension: config.max_dimension,
        }
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

/// Callback invoked with the codes decoded from one sampled frame
///
/// Called from the backend's decode thread, never on the UI thread.
pub type DecodeSink = Arc<dyn Fn(Vec<DecodedCode>) + Send + Sync>;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for backend operations
#[derive(Debug, Clone)]
pub enum BackendError {
    /// Failed to initialize backend
    InitializationFailed(String),
    /// Camera device not found
    DeviceNotFound(String),
    /// Format not supported
    FormatNotSupported(String),
    /// Capture is already running
    AlreadyStarted,
    /// General I/O error
    IoError(String),
    /// Other errors
    Other(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            BackendError::DeviceNotFound(msg) => write!(f, "Device not found: {}", msg),
            BackendError::FormatNotSupported(msg) => write!(f, "Format not supported: {}", msg),
            BackendError::AlreadyStarted => write!(f, "Capture already started"),
            BackendError::IoError(msg) => write!(f, "I/O error: {}", msg),
            BackendError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        BackendError::IoError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_external_camera_satisfies_any_position() {
        assert!(CameraPosition::External.satisfies(CameraPosition::Back));
        assert!(CameraPosition::External.satisfies(CameraPosition::Front));
        assert!(CameraPosition::Back.satisfies(CameraPosition::Back));
        assert!(!CameraPosition::Front.satisfies(CameraPosition::Back));
    }

    #[test]
    fn test_camera_position_parse() {
        assert_eq!("back".parse::<CameraPosition>(), Ok(CameraPosition::Back));
        assert_eq!("Front".parse::<CameraPosition>(), Ok(CameraPosition::Front));
        assert!("sideways".parse::<CameraPosition>().is_err());
    }

    #[test]
    fn test_frame_stride() {
        let frame = CameraFrame::from_rgba(3, 2, vec![0; 24]);
        assert_eq!(frame.stride, 12);
        let gray = CameraFrame::from_gray(3, 2, vec![0; 6]);
        assert_eq!(gray.stride, 3);
        assert_eq!(gray.format.bytes_per_pixel(), 1);
    }
}
