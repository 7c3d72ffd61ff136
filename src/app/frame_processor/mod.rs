// SPDX-License-Identifier: MPL-2.0

//! Frame processor module
//!
//! Turns sampled camera frames into decoded codes: luma preparation, QR
//! detection (rqrr) and barcode detection (rxing).

pub mod prepare;
pub mod tasks;
pub mod types;

pub use tasks::CodeDetector;
pub use types::{DecodedCode, FrameRegion};
