// SPDX-License-Identifier: MPL-2.0

//! Code Scanner - live QR code and barcode scanning from a camera
//!
//! The camera preview is shown with a static instruction; when a code is
//! decoded its value and symbology appear over the preview and disappear
//! again after a short delay.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`app`]: Scan session controller, render decision and runtime
//! - [`backends`]: Scanner backends (V4L2 cameras, still images)
//! - [`config`]: User configuration handling
//! - [`constants`]: Symbologies, timing and capture constants
//! - [`i18n`]: Fluent localization of the on-screen text
//! - [`terminal`]: Terminal front end
//!
//! # Example
//!
//! ```ignore
//! let config = Config::load();
//! let runtime = tokio::runtime::Runtime::new()?;
//! let mut session =
//!     SessionRuntime::new(create_backend(None), config, runtime.handle().clone());
//! session.start();
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod i18n;
pub mod terminal;

// Re-export commonly used types
pub use app::frame_processor::{CodeDetector, DecodedCode};
pub use app::{Effect, Message, ScanSession, ScannedCode, ScreenView, SessionRuntime};
pub use backends::camera::{CameraDevice, CameraPosition, ScannerBackend};
pub use config::{ClearPolicy, Config};
pub use constants::{Symbology, UiLanguage};
