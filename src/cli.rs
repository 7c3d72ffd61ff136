// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for scanner operations
//!
//! This module provides command-line functionality for:
//! - Listing available cameras
//! - Decoding codes in image files
//! - Headless scanning with one JSON line per accepted scan
//! - Listing the supported symbologies

use code_scanner::app::SessionRuntime;
use code_scanner::app::frame_processor::{CodeDetector, DecodedCode};
use code_scanner::backends::camera::ScannerConfig;
use code_scanner::backends::create_backend;
use code_scanner::backends::virtual_camera::{collect_image_paths, load_image_as_frame};
use code_scanner::config::Config;
use code_scanner::constants::{Symbology, timing};
use code_scanner::errors::{AppError, AppResult};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

/// List all available cameras
pub fn list_cameras(source: Option<&Path>, config: &Config) -> AppResult<()> {
    let backend = create_backend(source);
    let cameras = backend.enumerate_cameras();

    if !backend.has_permission() {
        println!("Camera access is not granted; some devices may be missing.");
        println!();
    }

    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    let selected = backend.select_device(
        config.camera_position,
        config.last_camera_path.as_deref(),
    );

    println!("Available cameras:");
    println!();
    for (index, camera) in cameras.iter().enumerate() {
        let marker = if selected.as_ref().is_some_and(|s| s.path == camera.path) {
            " (selected)"
        } else {
            ""
        };
        println!("  [{}] {}{}", index, camera.name, marker);
        println!("      Path: {}", camera.path);
        println!("      Position: {}", camera.position);
        if let Some(info) = &camera.device_info {
            println!("      Driver: {} ({})", info.driver, info.bus_info);
        }
        println!();
    }

    Ok(())
}

/// One image's decode results, for `--json`
#[derive(Serialize)]
struct ImageReport<'a> {
    path: String,
    codes: &'a [DecodedCode],
}

/// Decode every code in the given images (or directories of images)
pub fn scan_images(
    inputs: &[PathBuf],
    recognized: BTreeSet<Symbology>,
    max_dimension: u32,
    json: bool,
) -> AppResult<()> {
    let images: Vec<PathBuf> = inputs
        .iter()
        .flat_map(|input| collect_image_paths(input))
        .collect();
    if images.is_empty() {
        return Err(AppError::Other("No image files found".to_string()));
    }

    let detector = CodeDetector::new(&ScannerConfig {
        recognized,
        max_dimension,
        ..ScannerConfig::default()
    });

    let mut total = 0;
    for path in &images {
        let frame = match load_image_as_frame(path) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping unreadable image");
                eprintln!("{}: {}", path.display(), e);
                continue;
            }
        };

        let codes = detector.detect_sync(&frame);
        total += codes.len();

        if json {
            let report = ImageReport {
                path: path.display().to_string(),
                codes: &codes,
            };
            let line = serde_json::to_string(&report)
                .map_err(|e| AppError::Other(format!("Failed to encode JSON: {}", e)))?;
            println!("{}", line);
            continue;
        }

        if codes.is_empty() {
            println!("{}: no codes found", path.display());
        }
        for code in &codes {
            println!(
                "{}: [{}] {}",
                path.display(),
                code.symbology.map(|s| s.id()).unwrap_or("unknown"),
                code.value.as_deref().unwrap_or("")
            );
        }
    }

    info!(images = images.len(), codes = total, "Scan finished");
    Ok(())
}

/// Run a headless session and print each accepted scan as a JSON line
pub fn watch(source: Option<&Path>, config: Config) -> AppResult<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    // Set up Ctrl+C handler
    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_flag_clone = stop_flag.clone();
    ctrlc::set_handler(move || {
        stop_flag_clone.store(true, Ordering::SeqCst);
    })
    .map_err(|e| AppError::Other(format!("Failed to install Ctrl+C handler: {}", e)))?;

    let mut session = SessionRuntime::new(create_backend(source), config, runtime.handle().clone());
    session.start();

    let mut last_view = session.view();
    eprintln!("{}", describe(&last_view));
    let mut last_generation = session.session().generation();

    while !stop_flag.load(Ordering::SeqCst) {
        // A timeout only means nothing arrived during this tick
        let _ = runtime
            .block_on(async { tokio::time::timeout(timing::WATCH_TICK, session.recv()).await });
        session.pump();

        let view = session.view();
        if std::mem::discriminant(&view) != std::mem::discriminant(&last_view) {
            eprintln!("{}", describe(&view));
        }
        last_view = view;

        let generation = session.session().generation();
        if generation == last_generation {
            continue;
        }
        last_generation = generation;

        if let Some(scanned) = session.session().scanned() {
            let line = serde_json::to_string(scanned)
                .map_err(|e| AppError::Other(format!("Failed to encode JSON: {}", e)))?;
            println!("{}", line);
        }
    }

    session.shutdown();
    Ok(())
}

fn describe(view: &code_scanner::ScreenView) -> String {
    use code_scanner::ScreenView;
    match view {
        ScreenView::PermissionRequest { message } | ScreenView::NoDevice { message } => {
            message.to_string()
        }
        ScreenView::LiveCapture {
            device_name,
            instruction,
            ..
        } => format!("{} ({})", instruction, device_name),
    }
}

/// Print the symbologies the decoders support
pub fn list_symbologies(config: &Config) -> AppResult<()> {
    println!("Supported symbologies:");
    println!();
    for symbology in Symbology::ALL {
        let enabled = if config.recognized_symbologies.contains(&symbology) {
            "enabled"
        } else {
            "disabled"
        };
        println!(
            "  {:<12} {:<14} {}",
            symbology.id(),
            symbology.display_name(),
            enabled
        );
    }
    Ok(())
}
