// SPDX-License-Identifier: GPL-3.0-only

//! QR code detection task
//!
//! This module implements QR code detection using the rqrr crate. It
//! searches a prepared luma image for QR grids and decodes each one,
//! returning their positions and decoded content.

use crate::app::frame_processor::prepare::LumaImage;
use crate::app::frame_processor::types::{DecodedCode, FrameRegion};
use crate::constants::Symbology;
use tracing::{debug, trace};

/// Detect and decode QR codes in a luma image
pub fn detect_qr(image: &LumaImage) -> Vec<DecodedCode> {
    let start = std::time::Instant::now();
    let width = image.width as usize;
    let height = image.height as usize;

    let mut prepared =
        rqrr::PreparedImage::prepare_from_greyscale(width, height, |x, y| image.pixel(x, y));
    let grids = prepared.detect_grids();

    trace!(
        count = grids.len(),
        detection_ms = start.elapsed().as_millis(),
        "QR grid detection complete"
    );

    let mut detections = Vec::with_capacity(grids.len());
    for grid in grids {
        let content = match grid.decode() {
            Ok((_meta, content)) => content,
            Err(e) => {
                debug!(error = %e, "Failed to decode QR code");
                continue;
            }
        };

        let corners: Vec<(i32, i32)> = grid.bounds.iter().map(|p| (p.x, p.y)).collect();
        let mut detection = DecodedCode::new(content, Symbology::Qr);
        if let Some(region) = FrameRegion::from_corners(&corners, image.width, image.height) {
            debug!(
                x = region.x,
                y = region.y,
                width = region.width,
                height = region.height,
                "Detected QR code"
            );
            detection = detection.with_bounds(region);
        }
        detections.push(detection);
    }

    detections
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_image_has_no_codes() {
        let image = LumaImage {
            width: 64,
            height: 64,
            data: vec![255; 64 * 64],
        };
        assert!(detect_qr(&image).is_empty());
    }

    #[test]
    fn test_noise_has_no_codes() {
        // Vertical stripes look like nothing rqrr can lock onto
        let data = (0..64 * 64).map(|i| if i % 2 == 0 { 0 } else { 255 }).collect();
        let image = LumaImage {
            width: 64,
            height: 64,
            data,
        };
        assert!(detect_qr(&image).is_empty());
    }
}
