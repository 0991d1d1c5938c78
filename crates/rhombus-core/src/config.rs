//! Configuration system
//!
//! TOML configuration with every section optional. Missing keys fall back
//! to the built-in defaults, which reproduce the classic look: a 50 px
//! panel, 30 px titlebars and 5 px frame borders.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::input::HotkeyAction;
use crate::state::Geometry;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Frame, panel and popup dimensions
    pub metrics: Metrics,

    /// Color scheme
    pub colors: ColorConfig,

    /// Popup fade settings
    pub animation: AnimationConfig,

    /// Transient notification settings
    pub toast: ToastConfig,

    /// Global hotkeys
    pub bindings: Vec<BindingConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            metrics: Metrics::default(),
            colors: ColorConfig::default(),
            animation: AnimationConfig::default(),
            toast: ToastConfig::default(),
            bindings: default_bindings(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: Option<&str>) -> Result<Self> {
        let config_path = path.map(PathBuf::from).or_else(Self::find_config_file);

        match config_path {
            Some(path) if path.exists() => {
                info!("Loading configuration from {:?}", path);
                let content = fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config file: {path:?}"))?;

                Self::from_toml(&content)
                    .with_context(|| format!("Failed to parse config file: {path:?}"))
            },
            Some(path) => {
                warn!("Config file not found at {:?}, using defaults", path);
                Ok(Self::default())
            },
            None => {
                info!("No config file found, using defaults");
                Ok(Self::default())
            },
        }
    }

    /// Parse configuration text.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Find the configuration file
    fn find_config_file() -> Option<PathBuf> {
        let candidates = [
            dirs::config_dir().map(|p| p.join("rhombus/config.toml")),
            dirs::home_dir().map(|p| p.join(".config/rhombus/config.toml")),
            Some(PathBuf::from("/etc/rhombus/config.toml")),
        ];

        candidates.into_iter().flatten().find(|p| p.exists())
    }

    /// Generate default configuration as a string
    pub fn default_config_string() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config)
            .unwrap_or_else(|_| String::from("# Error generating config"))
    }

    /// Where the pinned-app list lives.
    pub fn pinned_path(&self) -> Option<PathBuf> {
        self.general.pinned_file.as_ref().map(PathBuf::from).or_else(|| {
            dirs::config_dir().map(|p| p.join("rhombus/pinned.toml"))
        })
    }

    /// Directories scanned for desktop entries, system ones first.
    pub fn desktop_dirs(&self) -> Vec<PathBuf> {
        let mut dirs_list = vec![
            PathBuf::from("/usr/share/applications"),
            PathBuf::from("/usr/local/share/applications"),
        ];
        if let Some(data) = dirs::data_dir() {
            dirs_list.push(data.join("applications"));
        }
        dirs_list.extend(self.general.desktop_dirs.iter().map(PathBuf::from));
        dirs_list
    }
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Command launched by the system menu's Terminal item
    pub terminal: String,
    /// Command launched by the system menu's Shutdown item
    pub shutdown_command: String,
    /// Pinned-app list location; defaults to the user config dir
    pub pinned_file: Option<String>,
    /// Extra desktop-entry directories
    pub desktop_dirs: Vec<String>,
    /// Upper bound on simultaneously managed clients
    pub max_clients: usize,
    /// Sleep between polls when no event is pending
    pub poll_interval_ms: u64,
    /// Core X font used for all text
    pub font: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            terminal: "xterm".to_string(),
            shutdown_command: "shutdown -h now".to_string(),
            pinned_file: None,
            desktop_dirs: Vec::new(),
            max_clients: 100,
            poll_interval_ms: 100,
            font: "fixed".to_string(),
        }
    }
}

/// Pixel dimensions of every decoration and surface.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Metrics {
    pub panel_height: u32,
    pub titlebar_height: u32,
    pub frame_border: u32,
    pub resize_handle: u32,
    pub button_size: u32,
    pub button_spacing: u32,
    /// Distance from the frame's left edge to the first titlebar glyph
    pub button_margin: u32,
    pub menu_width: u32,
    pub menu_item_height: u32,
    pub snap_threshold: u32,
    pub min_width: u32,
    pub min_height: u32,
    pub launcher_width: u32,
    pub launcher_height: u32,
    /// Inner geometry used when the window's own geometry is unavailable
    pub default_x: i32,
    pub default_y: i32,
    pub default_width: u32,
    pub default_height: u32,
}

impl Default for Metrics {
    fn default() -> Self {
        Self {
            panel_height: 50,
            titlebar_height: 30,
            frame_border: 5,
            resize_handle: 8,
            button_size: 12,
            button_spacing: 5,
            button_margin: 15,
            menu_width: 120,
            menu_item_height: 30,
            snap_threshold: 20,
            min_width: 100,
            min_height: 80,
            launcher_width: 350,
            launcher_height: 600,
            default_x: 100,
            default_y: 100,
            default_width: 600,
            default_height: 400,
        }
    }
}

impl Metrics {
    pub const fn default_geometry(&self) -> Geometry {
        Geometry::new(
            self.default_x,
            self.default_y,
            self.default_width,
            self.default_height,
        )
    }
}

/// Color configuration, `#rrggbb` strings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    pub desktop_top: String,
    pub desktop_bottom: String,
    pub panel: String,
    pub panel_button: String,
    pub panel_button_hover: String,
    pub frame: String,
    pub titlebar_active: String,
    pub titlebar_inactive: String,
    pub text: String,
    pub text_inactive: String,
    pub close_button: String,
    pub minimize_button: String,
    pub maximize_button: String,
    pub menu: String,
    pub menu_hover: String,
    pub accent: String,
    pub lock: String,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            desktop_top: "#1a1033".to_string(),
            desktop_bottom: "#3b5998".to_string(),
            panel: "#1e1e2e".to_string(),
            panel_button: "#313244".to_string(),
            panel_button_hover: "#45475a".to_string(),
            frame: "#2d2d2d".to_string(),
            titlebar_active: "#5b3f9e".to_string(),
            titlebar_inactive: "#3a3a4a".to_string(),
            text: "#ffffff".to_string(),
            text_inactive: "#9a9aa8".to_string(),
            close_button: "#ff5f57".to_string(),
            minimize_button: "#ffbd2e".to_string(),
            maximize_button: "#28ca42".to_string(),
            menu: "#2b2b3b".to_string(),
            menu_hover: "#8a2be2".to_string(),
            accent: "#8a2be2".to_string(),
            lock: "#000000".to_string(),
        }
    }
}

/// Popup fade configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Enable popup fades
    pub enabled: bool,
    /// Number of opacity steps per fade
    pub steps: u32,
    /// Delay between fade-in steps
    pub fade_in_delay_ms: u64,
    /// Delay between fade-out steps
    pub fade_out_delay_ms: u64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            steps: 10,
            fade_in_delay_ms: 10,
            fade_out_delay_ms: 8,
        }
    }
}

/// Transient notification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToastConfig {
    pub enabled: bool,
    pub duration_ms: u64,
    pub width: u32,
    pub height: u32,
}

impl Default for ToastConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            duration_ms: 1500,
            width: 200,
            height: 40,
        }
    }
}

/// Key binding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindingConfig {
    /// Key combination (e.g., "Ctrl+Escape")
    pub keys: String,
    /// Action to perform on the focused client
    pub action: HotkeyAction,
}

/// Generate default key bindings
fn default_bindings() -> Vec<BindingConfig> {
    vec![
        BindingConfig {
            keys: "F11".to_string(),
            action: HotkeyAction::ToggleFullscreen,
        },
        BindingConfig {
            keys: "F12".to_string(),
            action: HotkeyAction::Lower,
        },
        BindingConfig {
            keys: "Ctrl+Escape".to_string(),
            action: HotkeyAction::ForceClose,
        },
    ]
}
