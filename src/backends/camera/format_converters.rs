// SPDX-License-Identifier: GPL-3.0-only
//! Pixel format conversion for V4L2 capture buffers
//!
//! Every capture path hands RGBA (or 8-bit gray) frames to the preview and
//! the decoders, so raw buffers are converted here right after dequeue.

use super::types::CameraFrame;
use tracing::debug;

/// FourCC codes the capture loop knows how to convert
pub const SUPPORTED_FOURCCS: [&[u8; 4]; 5] = [b"MJPG", b"YUYV", b"UYVY", b"RGB3", b"GREY"];

/// Convert one V4L2 buffer to a frame
///
/// `stride` is the driver's bytes-per-line. Returns `None` for unsupported
/// formats or truncated/corrupt buffers.
pub fn buffer_to_frame(
    fourcc: &[u8; 4],
    data: &[u8],
    width: u32,
    height: u32,
    stride: u32,
) -> Option<CameraFrame> {
    match fourcc {
        b"MJPG" => mjpeg_to_rgba(data).map(|(w, h, rgba)| CameraFrame::from_rgba(w, h, rgba)),
        b"YUYV" => {
            let rgba = packed_422_to_rgba(data, width, height, stride, PackedOrder::Yuyv)?;
            Some(CameraFrame::from_rgba(width, height, rgba))
        }
        b"UYVY" => {
            let rgba = packed_422_to_rgba(data, width, height, stride, PackedOrder::Uyvy)?;
            Some(CameraFrame::from_rgba(width, height, rgba))
        }
        b"RGB3" => {
            let rgb = strip_stride(data, width * 3, height, stride)?;
            Some(CameraFrame::from_rgba(width, height, rgb_to_rgba(&rgb)))
        }
        b"GREY" => {
            let gray = strip_stride(data, width, height, stride)?;
            Some(CameraFrame::from_gray(width, height, gray))
        }
        _ => None,
    }
}

/// Byte order of packed YUV 4:2:2 formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackedOrder {
    /// Y0 U Y1 V
    Yuyv,
    /// U Y0 V Y1
    Uyvy,
}

/// Convert packed YUV 4:2:2 to RGBA
///
/// Each 4-byte group encodes 2 pixels. Uses BT.601 coefficients.
pub fn packed_422_to_rgba(
    data: &[u8],
    width: u32,
    height: u32,
    stride: u32,
    order: PackedOrder,
) -> Option<Vec<u8>> {
    let row_bytes = (width * 2) as usize;
    let stride = (stride as usize).max(row_bytes);
    if height == 0 || data.len() < stride * (height as usize - 1) + row_bytes {
        debug!(len = data.len(), width, height, "Packed YUV buffer too short");
        return None;
    }

    let mut rgba = Vec::with_capacity((width * height * 4) as usize);
    for row in 0..height as usize {
        let line = &data[row * stride..row * stride + row_bytes];
        for chunk in line.chunks_exact(4) {
            let (y0, u, y1, v) = match order {
                PackedOrder::Yuyv => (chunk[0], chunk[1], chunk[2], chunk[3]),
                PackedOrder::Uyvy => (chunk[1], chunk[0], chunk[3], chunk[2]),
            };
            for y in [y0, y1] {
                let (r, g, b) = yuv_to_rgb(y, u, v);
                rgba.extend_from_slice(&[r, g, b, 255]);
            }
        }
    }

    Some(rgba)
}

/// Decode an MJPEG buffer into (width, height, RGBA)
pub fn mjpeg_to_rgba(data: &[u8]) -> Option<(u32, u32, Vec<u8>)> {
    match image::load_from_memory_with_format(data, image::ImageFormat::Jpeg) {
        Ok(img) => {
            let rgba = img.to_rgba8();
            Some((rgba.width(), rgba.height(), rgba.into_raw()))
        }
        Err(e) => {
            // Webcams regularly deliver a truncated first frame
            debug!(error = %e, "Dropping undecodable MJPEG frame");
            None
        }
    }
}

/// Convert RGB to RGBA by adding alpha=255
pub fn rgb_to_rgba(rgb: &[u8]) -> Vec<u8> {
    let mut rgba = Vec::with_capacity(rgb.len() / 3 * 4);
    for chunk in rgb.chunks_exact(3) {
        rgba.extend_from_slice(&[chunk[0], chunk[1], chunk[2], 255]);
    }
    rgba
}

/// Copy `height` rows of `row_bytes` out of a padded buffer
fn strip_stride(data: &[u8], row_bytes: u32, height: u32, stride: u32) -> Option<Vec<u8>> {
    let row_bytes = row_bytes as usize;
    let stride = (stride as usize).max(row_bytes);
    if height == 0 || data.len() < stride * (height as usize - 1) + row_bytes {
        return None;
    }

    let mut packed = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        packed.extend_from_slice(&data[row * stride..row * stride + row_bytes]);
    }
    Some(packed)
}

/// Convert YUV (BT.601) to RGB
pub fn yuv_to_rgb(y: u8, u: u8, v: u8) -> (u8, u8, u8) {
    let y = y as f32;
    let u = u as f32 - 128.0;
    let v = v as f32 - 128.0;

    let r = (y + 1.402 * v).clamp(0.0, 255.0) as u8;
    let g = (y - 0.344136 * u - 0.714136 * v).clamp(0.0, 255.0) as u8;
    let b = (y + 1.772 * u).clamp(0.0, 255.0) as u8;

    (r, g, b)
}
