// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 device discovery helpers
//!
//! Raw `VIDIOC_QUERYCAP` is used instead of opening a full `v4l::Device` so
//! enumeration works on nodes we cannot stream from (metadata nodes, nodes
//! another process holds).

use super::types::{CameraPosition, DeviceInfo};
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::{Path, PathBuf};
use tracing::debug;

/// VIDIOC_QUERYCAP ioctl number
const VIDIOC_QUERYCAP: libc::c_ulong = 0x80685600;

/// V4L2 capability flag for single-planar video capture
const V4L2_CAP_VIDEO_CAPTURE: u32 = 0x00000001;

/// The `capabilities` field is valid for the whole device, `device_caps` for this node
const V4L2_CAP_DEVICE_CAPS: u32 = 0x80000000;

/// V4L2 capability structure for VIDIOC_QUERYCAP ioctl
#[repr(C)]
struct V4l2Capability {
    driver: [u8; 16],
    card: [u8; 32],
    bus_info: [u8; 32],
    version: u32,
    capabilities: u32,
    device_caps: u32,
    reserved: [u32; 3],
}

impl V4l2Capability {
    /// Capabilities of this particular node
    fn node_caps(&self) -> u32 {
        if self.capabilities & V4L2_CAP_DEVICE_CAPS != 0 {
            self.device_caps
        } else {
            self.capabilities
        }
    }
}

/// Query V4L2 capabilities for an open file descriptor.
fn query_v4l2_cap(fd: RawFd) -> Option<V4l2Capability> {
    let mut cap: V4l2Capability = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(fd, VIDIOC_QUERYCAP as _, &mut cap as *mut V4l2Capability) };
    if result < 0 { None } else { Some(cap) }
}

/// Decode a NUL-padded ioctl string field
fn c_field(bytes: &[u8]) -> String {
    let len = bytes.iter().position(|&c| c == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..len]).to_string()
}

/// List `/dev/video*` nodes, sorted by index
pub fn list_video_nodes() -> Vec<PathBuf> {
    list_video_nodes_in(Path::new("/dev"))
}

fn list_video_nodes_in(dir: &Path) -> Vec<PathBuf> {
    let mut nodes: Vec<(u32, PathBuf)> = std::fs::read_dir(dir)
        .into_iter()
        .flatten()
        .flatten()
        .filter_map(|entry| {
            let name = entry.file_name();
            let index = name.to_str()?.strip_prefix("video")?.parse::<u32>().ok()?;
            Some((index, entry.path()))
        })
        .collect();

    nodes.sort_by_key(|(index, _)| *index);
    nodes.into_iter().map(|(_, path)| path).collect()
}

/// Whether the current user may open `path` for reading and writing
pub fn is_accessible(path: &Path) -> bool {
    use std::os::unix::ffi::OsStrExt;

    let Ok(c_path) = std::ffi::CString::new(path.as_os_str().as_bytes()) else {
        return false;
    };
    unsafe { libc::access(c_path.as_ptr(), libc::R_OK | libc::W_OK) == 0 }
}

/// Query a node and return its info if it is a video capture node
///
/// Returns `None` for nodes that cannot be opened or only carry metadata.
pub fn probe_capture_node(path: &Path) -> Option<DeviceInfo> {
    let file = std::fs::File::open(path).ok()?;
    let cap = query_v4l2_cap(file.as_raw_fd())?;

    if cap.node_caps() & V4L2_CAP_VIDEO_CAPTURE == 0 {
        debug!(path = %path.display(), "Skipping non-capture V4L2 node");
        return None;
    }

    let path_str = path.to_string_lossy().to_string();
    let real_path = std::fs::canonicalize(path)
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|_| path_str.clone());

    Some(DeviceInfo {
        card: c_field(&cap.card),
        driver: c_field(&cap.driver),
        bus_info: c_field(&cap.bus_info),
        path: path_str,
        real_path,
    })
}

/// Guess which way a camera faces from its card name and bus
///
/// Embedded sensors on phones and tablets often say so in their name;
/// anything on USB is a webcam.
pub fn infer_position(info: &DeviceInfo) -> CameraPosition {
    let card = info.card.to_lowercase();

    if card.contains("back") || card.contains("rear") || card.contains("world") {
        CameraPosition::Back
    } else if card.contains("front") || card.contains("user") || card.contains("selfie") {
        CameraPosition::Front
    } else {
        CameraPosition::External
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(card: &str, bus: &str) -> DeviceInfo {
        DeviceInfo {
            card: card.to_string(),
            bus_info: bus.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_infer_position() {
        assert_eq!(
            infer_position(&info("Integrated Camera", "usb-0000:00:14.0-8")),
            CameraPosition::External
        );
        assert_eq!(
            infer_position(&info("ov8858 back camera", "platform:ipu3")),
            CameraPosition::Back
        );
        assert_eq!(
            infer_position(&info("Front Camera", "platform:qcom-camss")),
            CameraPosition::Front
        );
    }

    #[test]
    fn test_c_field_stops_at_nul() {
        let mut raw = [0u8; 16];
        raw[..6].copy_from_slice(b"uvcvid");
        assert_eq!(c_field(&raw), "uvcvid");
        assert_eq!(c_field(b"full"), "full");
    }

    #[test]
    fn test_list_video_nodes_sorted() {
        let dir = std::env::temp_dir().join(format!("code-scanner-nodes-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        for name in ["video10", "video2", "video0", "vbi0", "video-meta"] {
            std::fs::write(dir.join(name), b"").unwrap();
        }

        let nodes = list_video_nodes_in(&dir);
        let names: Vec<_> = nodes
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["video0", "video2", "video10"]);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
