// SPDX-License-Identifier: MPL-2.0

//! Backend abstraction layer for frame acquisition and decoding
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                Session Layer                │
//! └────────────────────┬────────────────────────┘
//!                      │ ScannerBackend
//! ┌────────────────────┴────────────────────────┐
//! │              Backend Layer                  │
//! │  ┌─────────────┐    ┌──────────────────┐    │
//! │  │   Camera    │    │   Image files    │    │
//! │  │   (V4L2)    │    │ (virtual camera) │    │
//! │  └─────────────┘    └──────────────────┘    │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`camera`]: Backend trait, V4L2 capture and camera permission
//! - [`virtual_camera`]: Still images standing in for a camera

pub mod camera;
pub mod virtual_camera;

use camera::{ScannerBackend, V4l2Backend};
use std::path::Path;
use tracing::info;
use virtual_camera::ImageFileBackend;

/// Create the backend for a run: image files when `source` is given,
/// otherwise the system's V4L2 cameras
pub fn create_backend(source: Option<&Path>) -> Box<dyn ScannerBackend> {
    match source {
        Some(path) => {
            info!(source = %path.display(), "Using image-file source");
            Box::new(ImageFileBackend::new(path))
        }
        None => Box::new(V4l2Backend::new()),
    }
}
