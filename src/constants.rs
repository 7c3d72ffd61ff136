// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Barcode and 2D code symbologies the scanner can be asked to recognize
///
/// Identifiers are the lowercase kebab names used in configuration files,
/// on the command line and in the result overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Symbology {
    #[serde(rename = "qr")]
    Qr,
    #[serde(rename = "ean-13")]
    Ean13,
    #[serde(rename = "ean-8")]
    Ean8,
    #[serde(rename = "upc-a")]
    UpcA,
    #[serde(rename = "upc-e")]
    UpcE,
    #[serde(rename = "code-128")]
    Code128,
    #[serde(rename = "code-39")]
    Code39,
    /// Interleaved 2 of 5
    #[serde(rename = "itf")]
    Itf,
    #[serde(rename = "code-93")]
    Code93,
    #[serde(rename = "codabar")]
    Codabar,
    #[serde(rename = "pdf-417")]
    Pdf417,
    #[serde(rename = "aztec")]
    Aztec,
    #[serde(rename = "data-matrix")]
    DataMatrix,
}

impl Symbology {
    /// Every symbology the decoders know about
    pub const ALL: [Symbology; 13] = [
        Symbology::Qr,
        Symbology::Ean13,
        Symbology::Ean8,
        Symbology::UpcA,
        Symbology::UpcE,
        Symbology::Code128,
        Symbology::Code39,
        Symbology::Itf,
        Symbology::Code93,
        Symbology::Codabar,
        Symbology::Pdf417,
        Symbology::Aztec,
        Symbology::DataMatrix,
    ];

    /// Symbologies recognized when the configuration does not say otherwise
    pub const DEFAULT_RECOGNIZED: [Symbology; 9] = [
        Symbology::Qr,      // QR Code
        Symbology::Ean13,   // retail products, international
        Symbology::Ean8,    // small retail products
        Symbology::UpcA,    // North American retail
        Symbology::UpcE,    // compressed UPC
        Symbology::Code128, // logistics, shipping
        Symbology::Code39,  // industry, automotive
        Symbology::Itf,     // cartons, logistics
        Symbology::Code93,  // Code 39 complement
    ];

    /// Stable identifier (e.g. `ean-13`)
    pub fn id(&self) -> &'static str {
        match self {
            Symbology::Qr => "qr",
            Symbology::Ean13 => "ean-13",
            Symbology::Ean8 => "ean-8",
            Symbology::UpcA => "upc-a",
            Symbology::UpcE => "upc-e",
            Symbology::Code128 => "code-128",
            Symbology::Code39 => "code-39",
            Symbology::Itf => "itf",
            Symbology::Code93 => "code-93",
            Symbology::Codabar => "codabar",
            Symbology::Pdf417 => "pdf-417",
            Symbology::Aztec => "aztec",
            Symbology::DataMatrix => "data-matrix",
        }
    }

    /// Human readable name for listings
    pub fn display_name(&self) -> &'static str {
        match self {
            Symbology::Qr => "QR Code",
            Symbology::Ean13 => "EAN-13",
            Symbology::Ean8 => "EAN-8",
            Symbology::UpcA => "UPC-A",
            Symbology::UpcE => "UPC-E",
            Symbology::Code128 => "Code 128",
            Symbology::Code39 => "Code 39",
            Symbology::Itf => "Interleaved 2 of 5",
            Symbology::Code93 => "Code 93",
            Symbology::Codabar => "Codabar",
            Symbology::Pdf417 => "PDF417",
            Symbology::Aztec => "Aztec",
            Symbology::DataMatrix => "Data Matrix",
        }
    }
}

impl fmt::Display for Symbology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Error returned when parsing an unknown symbology identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSymbology(pub String);

impl fmt::Display for UnknownSymbology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown symbology: {}", self.0)
    }
}

impl std::error::Error for UnknownSymbology {}

impl FromStr for Symbology {
    type Err = UnknownSymbology;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        Symbology::ALL
            .into_iter()
            .find(|symbology| symbology.id() == normalized)
            .ok_or_else(|| UnknownSymbology(s.to_string()))
    }
}

/// Timing constants
pub mod timing {
    use super::Duration;

    /// How long a scanned result stays on screen
    pub const DEFAULT_CLEAR_DELAY_MS: u64 = 3000;

    /// Minimum time between two frames handed to the decoder
    pub const DEFAULT_SAMPLE_INTERVAL_MS: u64 = 200;

    /// Terminal input poll timeout (roughly 60 redraws per second)
    pub const INPUT_POLL: Duration = Duration::from_millis(16);

    /// Headless watch loop tick
    pub const WATCH_TICK: Duration = Duration::from_millis(50);

    /// How long the image-file source shows each still image
    pub const IMAGE_HOLD: Duration = Duration::from_secs(2);

    /// How long `start` waits for the capture thread to negotiate a format
    pub const CAPTURE_START_TIMEOUT: Duration = Duration::from_secs(5);

    /// Buffer dequeue timeout, bounds how long a stop request can take
    pub const DEQUEUE_TIMEOUT: Duration = Duration::from_millis(500);

    /// How often the session re-checks the camera list and a running capture
    pub const DEVICE_POLL_INTERVAL: Duration = Duration::from_secs(1);

    /// Pause after a failed dequeue before retrying
    pub const DEQUEUE_RETRY_DELAY: Duration = Duration::from_millis(10);
}

/// Frames are downscaled to this maximum dimension before decoding
pub const DEFAULT_MAX_DIMENSION: u32 = 1280;

/// Number of mmap buffers requested from V4L2
pub const V4L2_BUFFER_COUNT: u32 = 4;

/// Consecutive dequeue failures after which the device is considered gone
pub const MAX_DEQUEUE_FAILURES: u32 = 25;

/// Preferred capture resolution; decoding does not benefit from more
pub const PREFERRED_CAPTURE_SIZE: (u32, u32) = (1280, 720);

/// Symbology text shown when the decoder does not report one
pub const UNKNOWN_SYMBOLOGY: &str = "unknown";

/// Supported still image extensions for the image-file source
pub mod file_formats {
    pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "bmp", "gif"];

    pub fn is_image_extension(ext: &str) -> bool {
        IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
    }
}

/// Interface language override for on-screen text
///
/// Without one the desktop's preferred languages are used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UiLanguage {
    /// Brazilian Portuguese
    #[serde(rename = "pt-BR")]
    PtBr,
    #[serde(rename = "en")]
    En,
}

impl UiLanguage {
    /// BCP 47 tag matching a directory under `i18n/`
    pub fn tag(&self) -> &'static str {
        match self {
            UiLanguage::PtBr => "pt-BR",
            UiLanguage::En => "en",
        }
    }
}

impl FromStr for UiLanguage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pt-br" | "pt_br" | "pt" => Ok(UiLanguage::PtBr),
            "en" | "en-us" | "en_us" => Ok(UiLanguage::En),
            other => Err(format!("Unsupported language: {}", other)),
        }
    }
}
