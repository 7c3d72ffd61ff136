// SPDX-License-Identifier: MPL-2.0

//! Core types for frame processing results
//!
//! These types are what a scanner backend reports for each sampled frame and
//! what the session controller consumes.

use crate::constants::Symbology;
use serde::Serialize;

/// A rectangular region within a frame
///
/// Coordinates are normalized (0.0 to 1.0) relative to the frame dimensions.
/// This allows easy transformation to screen coordinates regardless of
/// the actual frame size or display scaling.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameRegion {
    /// Left edge (0.0 = left of frame, 1.0 = right of frame)
    pub x: f32,
    /// Top edge (0.0 = top of frame, 1.0 = bottom of frame)
    pub y: f32,
    /// Width as fraction of frame width
    pub width: f32,
    /// Height as fraction of frame height
    pub height: f32,
}

impl FrameRegion {
    /// Create a frame region from pixel coordinates
    pub fn from_pixels(
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        frame_width: u32,
        frame_height: u32,
    ) -> Self {
        Self {
            x: x as f32 / frame_width as f32,
            y: y as f32 / frame_height as f32,
            width: width as f32 / frame_width as f32,
            height: height as f32 / frame_height as f32,
        }
    }

    /// Bounding box of a set of corner points, clamped to the frame
    pub fn from_corners(points: &[(i32, i32)], frame_width: u32, frame_height: u32) -> Option<Self> {
        let min_x = points.iter().map(|p| p.0).min()?.max(0) as u32;
        let min_y = points.iter().map(|p| p.1).min()?.max(0) as u32;
        let max_x = (points.iter().map(|p| p.0).max()?.max(0) as u32).min(frame_width);
        let max_y = (points.iter().map(|p| p.1).max()?.max(0) as u32).min(frame_height);

        Some(Self::from_pixels(
            min_x,
            min_y,
            max_x.saturating_sub(min_x),
            max_y.saturating_sub(min_y),
            frame_width,
            frame_height,
        ))
    }
}

/// One code decoded from a frame
///
/// Decoders may fail to report the payload or the symbology; the session
/// substitutes defaults when it turns this into a scanned result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedCode {
    pub value: Option<String>,
    pub symbology: Option<Symbology>,
    /// Where the code was found, if the decoder reports it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounds: Option<FrameRegion>,
}

impl DecodedCode {
    pub fn new(value: impl Into<String>, symbology: Symbology) -> Self {
        Self {
            value: Some(value.into()),
            symbology: Some(symbology),
            bounds: None,
        }
    }

    pub fn with_bounds(mut self, bounds: FrameRegion) -> Self {
        self.bounds = Some(bounds);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_region_from_pixels() {
        let region = FrameRegion::from_pixels(100, 50, 200, 100, 1000, 500);
        assert!((region.x - 0.1).abs() < 0.001);
        assert!((region.y - 0.1).abs() < 0.001);
        assert!((region.width - 0.2).abs() < 0.001);
        assert!((region.height - 0.2).abs() < 0.001);
    }

    #[test]
    fn test_frame_region_from_corners_clamps() {
        let region =
            FrameRegion::from_corners(&[(-10, 20), (60, 20), (60, 120), (-10, 120)], 100, 100)
                .unwrap();
        assert_eq!(region.x, 0.0);
        assert!((region.y - 0.2).abs() < 0.001);
        assert!((region.width - 0.6).abs() < 0.001);
        assert!((region.height - 0.8).abs() < 0.001);
        assert!(FrameRegion::from_corners(&[], 100, 100).is_none());
    }

    #[test]
    fn test_decoded_code_json_omits_missing_bounds() {
        let json = serde_json::to_string(&DecodedCode::new("12345", Symbology::Ean13)).unwrap();
        assert_eq!(json, r#"{"value":"12345","symbology":"ean-13"}"#);
    }
}
