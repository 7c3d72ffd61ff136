// SPDX-License-Identifier: GPL-3.0-only

//! Frame processing tasks
//!
//! [`CodeDetector`] runs the individual detectors over a frame and keeps
//! only the symbologies the scanner was configured to recognize.

pub mod barcode_detector;
pub mod qr_detector;

use crate::app::frame_processor::prepare::prepare_luma;
use crate::app::frame_processor::types::DecodedCode;
use crate::backends::camera::types::{CameraFrame, ScannerConfig};
use crate::constants::Symbology;
use std::collections::BTreeSet;
use tracing::debug;

/// Decodes every recognized code in a frame
#[derive(Debug, Clone)]
pub struct CodeDetector {
    recognized: BTreeSet<Symbology>,
    /// Maximum dimension for processing (frames are downscaled to this)
    max_dimension: u32,
}

impl CodeDetector {
    pub fn new(config: &ScannerConfig) -> Self {
        Self {
            recognized: config.recognized.clone(),
            max_dimension: config.max_dimension,
        }
    }

    pub fn recognizes(&self, symbology: Symbology) -> bool {
        self.recognized.contains(&symbology)
    }

    /// Decode a frame on the current thread
    ///
    /// QR results come first, then linear and other 2D codes in rxing's order.
    pub fn detect_sync(&self, frame: &CameraFrame) -> Vec<DecodedCode> {
        let start = std::time::Instant::now();
        let luma = prepare_luma(frame, self.max_dimension);

        let mut codes = Vec::new();
        if self.recognizes(Symbology::Qr) {
            codes.extend(qr_detector::detect_qr(&luma));
        }
        codes.extend(barcode_detector::detect_barcodes(&luma, &self.recognized));

        if !codes.is_empty() {
            debug!(
                count = codes.len(),
                total_ms = start.elapsed().as_millis(),
                "Frame decoded"
            );
        }
        codes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rxing::{BarcodeFormat, MultiFormatWriter, Writer};

    /// Quiet zone added around generated codes, in pixels
    const MARGIN: u32 = 24;

    fn config(recognized: &[Symbology]) -> ScannerConfig {
        ScannerConfig {
            recognized: recognized.iter().copied().collect(),
            ..ScannerConfig::default()
        }
    }

    /// Render a generated code as a gray frame, black on white
    fn code_frame(format: BarcodeFormat, contents: &str, width: i32, height: i32) -> CameraFrame {
        let matrix = MultiFormatWriter
            .encode(contents, &format, width, height)
            .unwrap();
        let frame_width = matrix.getWidth() + 2 * MARGIN;
        let frame_height = matrix.getHeight() + 2 * MARGIN;
        let mut data = vec![255u8; (frame_width * frame_height) as usize];
        for y in 0..matrix.getHeight() {
            for x in 0..matrix.getWidth() {
                if matrix.get(x, y) {
                    data[((y + MARGIN) * frame_width + x + MARGIN) as usize] = 0;
                }
            }
        }
        CameraFrame::from_gray(frame_width, frame_height, data)
    }

    fn first_code(codes: &[DecodedCode]) -> (Option<&str>, Option<Symbology>) {
        let code = codes.first().expect("a decoded code");
        (code.value.as_deref(), code.symbology)
    }

    #[test]
    fn test_recognizes_configured_only() {
        let detector = CodeDetector::new(&config(&[Symbology::Qr, Symbology::Ean13]));
        assert!(detector.recognizes(Symbology::Qr));
        assert!(detector.recognizes(Symbology::Ean13));
        assert!(!detector.recognizes(Symbology::Code39));
    }

    #[test]
    fn test_blank_frame_decodes_nothing() {
        let detector = CodeDetector::new(&ScannerConfig::default());
        let frame = CameraFrame::from_gray(48, 48, vec![255; 48 * 48]);
        assert!(detector.detect_sync(&frame).is_empty());
    }

    #[test]
    fn test_decodes_ean13() {
        let detector = CodeDetector::new(&ScannerConfig::default());
        let frame = code_frame(BarcodeFormat::EAN_13, "5901234123457", 380, 120);
        let codes = detector.detect_sync(&frame);
        assert_eq!(
            first_code(&codes),
            (Some("5901234123457"), Some(Symbology::Ean13))
        );
    }

    #[test]
    fn test_decodes_code128() {
        let detector = CodeDetector::new(&ScannerConfig::default());
        let frame = code_frame(BarcodeFormat::CODE_128, "SCAN-2024", 400, 120);
        let codes = detector.detect_sync(&frame);
        assert_eq!(
            first_code(&codes),
            (Some("SCAN-2024"), Some(Symbology::Code128))
        );
    }

    #[test]
    fn test_decodes_qr_once() {
        let detector = CodeDetector::new(&ScannerConfig::default());
        let frame = code_frame(BarcodeFormat::QR_CODE, "hello qr", 240, 240);
        let codes = detector.detect_sync(&frame);
        assert_eq!(codes.len(), 1);
        assert_eq!(first_code(&codes), (Some("hello qr"), Some(Symbology::Qr)));
        assert!(codes[0].bounds.is_some());
    }

    #[test]
    fn test_unrecognized_symbology_is_dropped() {
        let frame = code_frame(BarcodeFormat::CODE_39, "CODE39", 400, 120);

        let with_code39 = CodeDetector::new(&ScannerConfig::default());
        assert_eq!(
            first_code(&with_code39.detect_sync(&frame)),
            (Some("CODE39"), Some(Symbology::Code39))
        );

        let without: Vec<Symbology> = Symbology::DEFAULT_RECOGNIZED
            .into_iter()
            .filter(|s| *s != Symbology::Code39)
            .collect();
        let detector = CodeDetector::new(&config(&without));
        assert!(detector.detect_sync(&frame).is_empty());
    }
}
