// SPDX-License-Identifier: GPL-3.0-only

//! Frame preparation for the decoders
//!
//! Both decoders work on 8-bit luma. Frames are converted once, with stride
//! padding removed and large frames downscaled for faster processing.

use crate::backends::camera::types::{CameraFrame, PixelFormat};

/// Tightly packed 8-bit luma image
#[derive(Debug, Clone)]
pub struct LumaImage {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl LumaImage {
    pub fn pixel(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width as usize + x]
    }
}

/// Convert a frame to luma, downscaling so neither side exceeds `max_dimension`
pub fn prepare_luma(frame: &CameraFrame, max_dimension: u32) -> LumaImage {
    let width = frame.width;
    let height = frame.height;

    if width > max_dimension || height > max_dimension {
        let scale = (width as f32 / max_dimension as f32).max(height as f32 / max_dimension as f32);
        let new_width = ((width as f32 / scale) as u32).max(1);
        let new_height = ((height as f32 / scale) as u32).max(1);
        LumaImage {
            width: new_width,
            height: new_height,
            data: downscale_luma(frame, new_width, new_height),
        }
    } else {
        LumaImage {
            width,
            height,
            data: copy_luma_without_stride(frame),
        }
    }
}

/// BT.601 luma of an RGB triple
fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((r as u32 * 299 + g as u32 * 587 + b as u32 * 114) / 1000) as u8
}

/// Luma of pixel (x, y), or 0 outside the buffer
fn sample_luma(frame: &CameraFrame, x: usize, y: usize) -> u8 {
    let stride = frame.stride as usize;
    match frame.format {
        PixelFormat::RGBA => {
            let offset = y * stride + x * 4;
            match frame.data.get(offset..offset + 3) {
                Some(px) => luma(px[0], px[1], px[2]),
                None => 0,
            }
        }
        PixelFormat::Gray8 => frame.data.get(y * stride + x).copied().unwrap_or(0),
    }
}

/// Copy frame luma without stride padding
fn copy_luma_without_stride(frame: &CameraFrame) -> Vec<u8> {
    let width = frame.width as usize;
    let height = frame.height as usize;

    let mut result = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            result.push(sample_luma(frame, x, y));
        }
    }
    result
}

/// Downscale frame luma using bilinear interpolation
fn downscale_luma(frame: &CameraFrame, dst_width: u32, dst_height: u32) -> Vec<u8> {
    let src_width = frame.width as usize;
    let src_height = frame.height as usize;

    let mut result = Vec::with_capacity((dst_width * dst_height) as usize);

    let x_ratio = src_width as f32 / dst_width as f32;
    let y_ratio = src_height as f32 / dst_height as f32;

    for y in 0..dst_height {
        for x in 0..dst_width {
            let src_x = x as f32 * x_ratio;
            let src_y = y as f32 * y_ratio;

            let x0 = (src_x as usize).min(src_width - 1);
            let y0 = (src_y as usize).min(src_height - 1);
            let x1 = (x0 + 1).min(src_width - 1);
            let y1 = (y0 + 1).min(src_height - 1);

            let x_frac = src_x - x0 as f32;
            let y_frac = src_y - y0 as f32;

            let p00 = sample_luma(frame, x0, y0) as f32;
            let p01 = sample_luma(frame, x1, y0) as f32;
            let p10 = sample_luma(frame, x0, y1) as f32;
            let p11 = sample_luma(frame, x1, y1) as f32;

            let value = p00 * (1.0 - x_frac) * (1.0 - y_frac)
                + p01 * x_frac * (1.0 - y_frac)
                + p10 * (1.0 - x_frac) * y_frac
                + p11 * x_frac * y_frac;

            result.push(value as u8);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Instant;

    #[test]
    fn test_copy_luma_without_stride() {
        // 2x2 RGBA frame with 2 bytes of stride padding per row
        let data: Vec<u8> = vec![
            255, 0, 0, 255, // Red pixel
            0, 255, 0, 255, // Green pixel
            9, 9,           // stride padding
            0, 0, 255, 255, // Blue pixel
            255, 255, 255, 255, // White pixel
            9, 9,           // stride padding
        ];

        let frame = CameraFrame {
            width: 2,
            height: 2,
            data: Arc::from(data.as_slice()),
            format: PixelFormat::RGBA,
            stride: 10,
            captured_at: Instant::now(),
        };

        let result = prepare_luma(&frame, 640);
        assert_eq!((result.width, result.height), (2, 2));
        assert_eq!(result.data, vec![76, 149, 29, 255]);
    }

    #[test]
    fn test_downscale_luma() {
        // 4x2 gray gradient
        let frame = CameraFrame::from_gray(4, 2, vec![0, 85, 170, 255, 0, 85, 170, 255]);

        let result = prepare_luma(&frame, 2);
        assert_eq!((result.width, result.height), (2, 1));
        assert!(result.pixel(0, 0) < 100);
        assert!(result.pixel(1, 0) > 150);
    }

    #[test]
    fn test_truncated_frame_reads_black() {
        let frame = CameraFrame {
            width: 2,
            height: 2,
            data: Arc::from(&[200u8, 200, 200, 255][..]),
            format: PixelFormat::RGBA,
            stride: 8,
            captured_at: Instant::now(),
        };

        let result = prepare_luma(&frame, 640);
        assert_eq!(result.data, vec![200, 0, 0, 0]);
    }
}
