use crate::placement::{BUBBLE_THRESHOLD, DEFAULT_OFFSET, PopoverKind, TOOLTIP_THRESHOLD};
use crate::theme::{self, ThemeId};
use anyhow::{Context, Result};
use log::{LevelFilter, debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, RwLock};

pub const CURRENT_VERSION: u32 = 1;
const SETTINGS_FILENAME: &str = "config.yaml";
const APP_NAME: &str = "judgemark";
const CONFIG_ENV_VAR: &str = "JUDGEMARK_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default = "default_theme")]
    pub theme: String,

    /// Viewport-top distance (px) under which tooltips open below their highlight.
    #[serde(default = "default_tooltip_threshold")]
    pub tooltip_threshold: f64,

    /// Same, for thread bubbles.
    #[serde(default = "default_bubble_threshold")]
    pub bubble_threshold: f64,

    #[serde(default = "default_popover_offset")]
    pub popover_offset: f64,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_log_file")]
    pub log_file: String,
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

fn default_theme() -> String {
    ThemeId::Light.name().to_string()
}

fn default_tooltip_threshold() -> f64 {
    TOOLTIP_THRESHOLD
}

fn default_bubble_threshold() -> f64 {
    BUBBLE_THRESHOLD
}

fn default_popover_offset() -> f64 {
    DEFAULT_OFFSET
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "judgemark.log".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            theme: default_theme(),
            tooltip_threshold: default_tooltip_threshold(),
            bubble_threshold: default_bubble_threshold(),
            popover_offset: default_popover_offset(),
            log_level: default_log_level(),
            log_file: default_log_file(),
        }
    }
}

static SETTINGS: LazyLock<RwLock<Settings>> = LazyLock::new(|| RwLock::new(Settings::default()));

fn preferred_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
}

/// Explicit path, then `$JUDGEMARK_CONFIG`, then the platform config dir.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Ok(custom) = std::env::var(CONFIG_ENV_VAR) {
        if !custom.trim().is_empty() {
            return Some(PathBuf::from(custom));
        }
    }
    preferred_config_path()
}

/// Loads settings into the global store. A missing file keeps the defaults;
/// a malformed one is reported and ignored.
pub fn load_settings(explicit: Option<&Path>) {
    let Some(path) = resolve_config_path(explicit) else {
        warn!("Could not determine config directory, using default settings");
        return;
    };
    if !path.exists() {
        debug!("Settings file {path:?} not found, using defaults");
        return;
    }

    match read_settings(&path) {
        Ok(settings) => {
            debug!("Loaded settings from {path:?}");
            apply(settings);
        }
        Err(e) => error!("{e:#}"),
    }
}

pub fn read_settings(path: &Path) -> Result<Settings> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings file {path:?}"))?;
    let mut settings: Settings = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse settings file {path:?}"))?;

    if settings.version < CURRENT_VERSION {
        info!(
            "Migrating settings from v{} to v{}",
            settings.version, CURRENT_VERSION
        );
        settings.version = CURRENT_VERSION;
    }
    Ok(settings)
}

/// Replaces the global settings and the active theme.
pub fn apply(settings: Settings) {
    match ThemeId::from_name(&settings.theme) {
        Some(id) => theme::set_theme(id),
        None => warn!("Unknown theme '{}', keeping current theme", settings.theme),
    }
    let mut global = SETTINGS.write().unwrap_or_else(|poisoned| {
        error!("Settings lock was poisoned, overwriting the stale settings");
        SETTINGS.clear_poison();
        poisoned.into_inner()
    });
    *global = settings;
}

pub fn current() -> Settings {
    SETTINGS
        .read()
        .map(|s| s.clone())
        .unwrap_or_default()
}

pub fn popover_threshold(kind: PopoverKind) -> f64 {
    SETTINGS
        .read()
        .map(|s| match kind {
            PopoverKind::Tooltip => s.tooltip_threshold,
            PopoverKind::ThreadBubble => s.bubble_threshold,
        })
        .unwrap_or_else(|_| kind.default_threshold())
}

pub fn get_popover_offset() -> f64 {
    SETTINGS
        .read()
        .map(|s| s.popover_offset)
        .unwrap_or(DEFAULT_OFFSET)
}

pub fn get_log_level() -> LevelFilter {
    let raw = SETTINGS
        .read()
        .map(|s| s.log_level.clone())
        .unwrap_or_else(|_| default_log_level());
    raw.parse().unwrap_or(LevelFilter::Info)
}

pub fn get_log_file() -> String {
    SETTINGS
        .read()
        .map(|s| s.log_file.clone())
        .unwrap_or_else(|_| default_log_file())
}
