// SPDX-License-Identifier: GPL-3.0-only

//! Still image loading for the image-file source

use crate::backends::camera::types::{BackendError, BackendResult, CameraFrame};
use crate::constants::file_formats;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Whether a path has one of the supported image extensions
pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(file_formats::is_image_extension)
}

/// Collect the images a source path refers to
///
/// A file yields itself if it is an image; a directory yields its image
/// files (not recursive), sorted by name.
pub fn collect_image_paths(source: &Path) -> Vec<PathBuf> {
    if source.is_file() {
        return if is_image_path(source) {
            vec![source.to_path_buf()]
        } else {
            warn!(path = %source.display(), "Not a supported image file");
            Vec::new()
        };
    }

    let entries = match std::fs::read_dir(source) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(path = %source.display(), error = %e, "Cannot read image source");
            return Vec::new();
        }
    };

    let mut images: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && is_image_path(path))
        .collect();
    images.sort();

    debug!(path = %source.display(), count = images.len(), "Collected images");
    images
}

/// Decode an image file into an RGBA frame
pub fn load_image_as_frame(path: &Path) -> BackendResult<CameraFrame> {
    let img = image::open(path).map_err(|e| {
        BackendError::Other(format!("Failed to load image '{}': {}", path.display(), e))
    })?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    info!(path = %path.display(), width, height, "Image loaded");

    Ok(CameraFrame::from_rgba(width, height, rgba.into_raw()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "code-scanner-{}-{}",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_collect_filters_and_sorts() {
        let dir = temp_dir("collect");
        for name in ["b.png", "a.JPG", "notes.txt"] {
            std::fs::write(dir.join(name), b"x").unwrap();
        }

        let images = collect_image_paths(&dir);
        let names: Vec<_> = images
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.JPG", "b.png"]);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_load_image_as_frame() {
        let dir = temp_dir("load");
        let path = dir.join("white.png");
        image::RgbaImage::from_pixel(8, 4, image::Rgba([255, 255, 255, 255]))
            .save(&path)
            .unwrap();

        let frame = load_image_as_frame(&path).unwrap();
        assert_eq!((frame.width, frame.height), (8, 4));
        assert_eq!(frame.data.len(), 8 * 4 * 4);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_load_garbage_fails() {
        let dir = temp_dir("garbage");
        let path = dir.join("broken.png");
        std::fs::write(&path, b"not a png").unwrap();
        assert!(load_image_as_frame(&path).is_err());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
