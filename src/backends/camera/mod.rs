// SPDX-License-Identifier: MPL-2.0

//! Scanner backend abstraction
//!
//! The session controller never touches a camera directly. Everything it
//! needs (permission, device selection, decoded codes) goes through the
//! [`ScannerBackend`] trait.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │   Terminal / watch  │
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │   SessionRuntime    │  ← Effects, clear timer, message pump
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │ ScannerBackend Trait│  ← Common interface
//! └──────────┬──────────┘
//!            │
//!       ┌────┴─────┐
//!       ▼          ▼
//!   ┌──────┐  ┌──────────┐
//!   │ V4L2 │  │Image file│
//!   └──────┘  └──────────┘
//! ```

pub mod format_converters;
pub mod permission;
pub mod types;
pub mod v4l2;
pub mod v4l2_utils;

pub use types::*;
pub use v4l2::V4l2Backend;

use futures::future::BoxFuture;

/// Camera plus decoder, as seen by the scan session
///
/// Implementations own frame acquisition and decoding. Decoded codes are
/// pushed into the [`DecodeSink`] given to [`ScannerBackend::start`], from a
/// thread of the backend's choosing.
pub trait ScannerBackend: Send {
    /// Short identifier for logs
    fn name(&self) -> &'static str;

    // ===== Permission =====

    /// Whether the process may open camera devices right now
    fn has_permission(&self) -> bool;

    /// Ask for camera access
    ///
    /// Resolves to the permission state after the request. The future is
    /// spawned on the session's runtime, so it must not borrow the backend.
    fn request_permission(&self) -> BoxFuture<'static, bool>;

    // ===== Enumeration =====

    /// Enumerate available cameras
    fn enumerate_cameras(&self) -> Vec<CameraDevice>;

    /// Pick the camera to scan with
    ///
    /// `preferred_path` (usually the last used camera) wins when it is one
    /// of the candidates for `position`.
    fn select_device(
        &self,
        position: CameraPosition,
        preferred_path: Option<&str>,
    ) -> Option<CameraDevice> {
        select_device(&self.enumerate_cameras(), position, preferred_path)
    }

    // ===== Capture =====

    /// Start sampling frames from `device` and decoding them
    fn start(
        &mut self,
        device: &CameraDevice,
        config: &ScannerConfig,
        sink: DecodeSink,
    ) -> BackendResult<()>;

    /// Stop capture and join worker threads
    fn stop(&mut self);

    /// Whether capture is running; false once it ended on its own (e.g. unplugged)
    fn is_running(&self) -> bool;

    /// Format the running capture negotiated, if the backend knows it
    fn current_format(&self) -> Option<CameraFormat> {
        None
    }

    // ===== Preview =====

    /// Most recent frame for the live preview
    fn latest_frame(&self) -> Option<CameraFrame>;
}

/// Select a camera for `position` from an enumerated list
///
/// Cameras facing the requested way are preferred over external ones.
pub fn select_device(
    cameras: &[CameraDevice],
    position: CameraPosition,
    preferred_path: Option<&str>,
) -> Option<CameraDevice> {
    let candidates: Vec<&CameraDevice> = cameras
        .iter()
        .filter(|camera| camera.position.satisfies(position))
        .collect();

    if let Some(path) = preferred_path
        && let Some(camera) = candidates.iter().find(|camera| camera.path == path)
    {
        return Some((*camera).clone());
    }

    candidates
        .iter()
        .find(|camera| camera.position == position)
        .or_else(|| candidates.first())
        .map(|camera| (*camera).clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera(path: &str, position: CameraPosition) -> CameraDevice {
        CameraDevice {
            name: path.to_string(),
            path: path.to_string(),
            position,
            device_info: None,
        }
    }

    #[test]
    fn test_select_prefers_exact_position() {
        let cameras = vec![
            camera("/dev/video0", CameraPosition::External),
            camera("/dev/video2", CameraPosition::Back),
        ];
        let selected = select_device(&cameras, CameraPosition::Back, None).unwrap();
        assert_eq!(selected.path, "/dev/video2");
    }

    #[test]
    fn test_select_falls_back_to_external() {
        let cameras = vec![
            camera("/dev/video0", CameraPosition::Front),
            camera("/dev/video2", CameraPosition::External),
        ];
        let selected = select_device(&cameras, CameraPosition::Back, None).unwrap();
        assert_eq!(selected.path, "/dev/video2");
    }

    #[test]
    fn test_select_none_when_only_wrong_facing() {
        let cameras = vec![camera("/dev/video0", CameraPosition::Front)];
        assert!(select_device(&cameras, CameraPosition::Back, None).is_none());
        assert!(select_device(&[], CameraPosition::Back, None).is_none());
    }

    #[test]
    fn test_select_honors_preferred_path() {
        let cameras = vec![
            camera("/dev/video0", CameraPosition::Back),
            camera("/dev/video2", CameraPosition::External),
        ];
        let selected =
            select_device(&cameras, CameraPosition::Back, Some("/dev/video2")).unwrap();
        assert_eq!(selected.path, "/dev/video2");

        // A preferred path that does not qualify is ignored
        let selected =
            select_device(&cameras, CameraPosition::Back, Some("/dev/video9")).unwrap();
        assert_eq!(selected.path, "/dev/video0");
    }
}
