//! Rhombus - A lightweight stacking window manager for X11
//!
//! Wraps every top-level window in a decorated frame and draws a bottom
//! panel with pinned apps, a taskbar and a clock.
//!
//! # Features
//! - Titlebar buttons for close, minimize and maximize
//! - Edge and corner resizing, titlebar dragging with edge snapping
//! - Popup menus with fade animation
//! - Categorized application launcher with search
//! - Pinned apps persisted across sessions
//! - TOML configuration for colors, hotkeys and commands

use anyhow::{Context, Result};
use clap::Parser;
use rhombus_core::config::Config;
use rhombus_core::desktop;
use rhombus_core::launcher::Launcher;
use rhombus_core::pinned::{self, PinnedApps};
use tracing::{error, info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod keymap;
mod render;
mod session;
mod spawn;

use session::Session;

/// Rhombus - A stacking window manager for X11
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Run in debug mode with verbose logging
    #[arg(short, long)]
    debug: bool,

    /// Validate configuration and exit
    #[arg(long)]
    validate: bool,

    /// Print default configuration to stdout
    #[arg(long)]
    print_default_config: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging; RUST_LOG overrides the default level
    let log_level = if args.debug {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Rhombus v{} starting...", env!("CARGO_PKG_VERSION"));

    if args.print_default_config {
        println!("{}", Config::default_config_string());
        return Ok(());
    }

    if args.validate {
        Config::load(args.config.as_deref()).context("Invalid configuration")?;
        info!("Configuration is valid");
        return Ok(());
    }

    let config = match Config::load(args.config.as_deref()) {
        Ok(cfg) => {
            info!("Configuration loaded successfully");
            cfg
        },
        Err(e) => {
            warn!("Failed to load config: {}, using defaults", e);
            Config::default()
        },
    };

    let pinned = load_pinned(&config);
    let launcher = load_launcher(&config);

    let mut session = match Session::connect(config, pinned, launcher) {
        Ok(session) => session,
        Err(e) => {
            error!("Failed to start window manager: {}", e);
            return Err(e).context("Failed to start window manager");
        },
    };
    session.run().context("Window manager event loop failed")?;

    info!("Rhombus shut down cleanly");
    Ok(())
}

/// Pinned apps from the previous session; a missing or broken file starts empty.
fn load_pinned(config: &Config) -> PinnedApps {
    let Some(path) = config.pinned_path() else {
        warn!("No pinned apps file configured");
        return PinnedApps::default();
    };
    match pinned::load(&path) {
        Ok(records) => {
            info!("Loaded {} pinned apps from {:?}", records.len(), path);
            PinnedApps::from_records(records)
        },
        Err(e) => {
            warn!("Failed to load pinned apps from {:?}: {}", path, e);
            PinnedApps::default()
        },
    }
}

fn load_launcher(config: &Config) -> Launcher {
    let entries = desktop::scan(&config.desktop_dirs());
    let categories = desktop::categorize(&entries);
    info!(
        "Found {} applications in {} categories",
        entries.len(),
        categories.len()
    );
    Launcher::new(categories)
}
