// SPDX-License-Identifier: GPL-3.0-only

use clap::{Args, Parser, Subcommand};
use code_scanner::backends::camera::CameraPosition;
use code_scanner::config::{ClearPolicy, Config};
use code_scanner::constants::{Symbology, UiLanguage};
use code_scanner::i18n;
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "code-scanner")]
#[command(about = "Scan QR codes and barcodes from a camera")]
#[command(version = env!("GIT_VERSION"))]
#[command(subcommand_required = false)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scanner in the terminal (default)
    Terminal {
        /// Scan still images from this file or directory instead of a camera
        #[arg(long)]
        source: Option<PathBuf>,

        #[command(flatten)]
        session: SessionArgs,
    },

    /// Scan without a UI, printing one JSON object per scanned code
    Watch {
        /// Scan still images from this file or directory instead of a camera
        #[arg(long)]
        source: Option<PathBuf>,

        #[command(flatten)]
        session: SessionArgs,
    },

    /// List available cameras
    List {
        /// List the image source instead of the system cameras
        #[arg(long)]
        source: Option<PathBuf>,
    },

    /// Decode codes in image files
    Scan {
        /// Image files or directories
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Symbologies to look for (comma separated, default from config)
        #[arg(short, long, value_delimiter = ',')]
        symbologies: Vec<Symbology>,

        /// Print one JSON object per image
        #[arg(long)]
        json: bool,
    },

    /// List supported symbologies
    Symbologies,
}

/// Per-run overrides of the stored configuration
#[derive(Args, Default)]
struct SessionArgs {
    /// Camera position to scan with (back, front, external)
    #[arg(short, long)]
    position: Option<CameraPosition>,

    /// Camera device path to scan with, whatever its position
    #[arg(short, long)]
    device: Option<String>,

    /// Symbologies to recognize (comma separated)
    #[arg(short, long, value_delimiter = ',')]
    symbologies: Vec<Symbology>,

    /// How long a scanned code stays on screen
    #[arg(long)]
    clear_delay_ms: Option<u64>,

    /// What a pending clear does when a newer code is scanned (latest, unconditional)
    #[arg(long)]
    clear_policy: Option<ClearPolicy>,

    /// On-screen language (pt-BR, en)
    #[arg(short, long)]
    language: Option<UiLanguage>,
}

impl SessionArgs {
    fn apply(self, config: &mut Config) {
        if let Some(position) = self.position {
            config.camera_position = position;
        }
        if let Some(device) = self.device {
            config.device_override = Some(device);
        }
        if !self.symbologies.is_empty() {
            config.recognized_symbologies = self.symbologies.into_iter().collect();
        }
        if let Some(delay) = self.clear_delay_ms {
            config.clear_delay_ms = delay;
        }
        if let Some(policy) = self.clear_policy {
            config.clear_policy = policy;
        }
        if let Some(language) = self.language {
            config.language = Some(language);
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut command = cli.command.unwrap_or(Commands::Terminal {
        source: None,
        session: SessionArgs::default(),
    });

    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=code_scanner=debug, RUST_LOG=info
    init_logging(matches!(command, Commands::Terminal { .. }));

    let mut config = Config::load();
    if let Commands::Terminal { session, .. } | Commands::Watch { session, .. } = &mut command {
        std::mem::take(session).apply(&mut config);
    }

    // The configured language wins over the system's preferred languages
    i18n::init(&i18n::requested_languages(config.language));

    match command {
        Commands::Terminal { source, .. } => code_scanner::terminal::run(source, config),
        Commands::Watch { source, .. } => Ok(cli::watch(source.as_deref(), config)?),
        Commands::List { source } => Ok(cli::list_cameras(source.as_deref(), &config)?),
        Commands::Scan {
            paths,
            symbologies,
            json,
        } => {
            let recognized = if symbologies.is_empty() {
                config.recognized_symbologies.clone()
            } else {
                symbologies.into_iter().collect()
            };
            Ok(cli::scan_images(&paths, recognized, config.max_dimension, json)?)
        }
        Commands::Symbologies => Ok(cli::list_symbologies(&config)?),
    }
}

/// Log to stderr, or to a file in terminal mode where stderr is the screen
fn init_logging(to_file: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    if to_file && let Some(file) = open_log_file() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .with_target(true)
            .with_level(true)
            .init();
        return;
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .init();
}

fn open_log_file() -> Option<std::fs::File> {
    let dir = dirs::cache_dir()?.join("code-scanner");
    std::fs::create_dir_all(&dir).ok()?;
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("code-scanner.log"))
        .ok()
}
