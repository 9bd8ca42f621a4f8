use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::app::domain::style::{RawStyle, Rgb};
use crate::app::infrastructure::error::Result;
use crate::app::services::syntax::presets::StylePreset;
use crate::app::services::syntax::style_table::StyleTable;

/// Scheme name that follows the host's light/dark appearance.
pub const AUTO_SCHEME: &str = "auto";

/// Which tokenizer implementation backs new highlighters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TokenizerBackend {
    /// Built-in keyword-aware tokenizer.
    #[default]
    Keyword,
    /// Sublime syntax definitions through syntect.
    Syntect,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightSettings {
    #[serde(default = "default_highlighting")]
    pub highlighting_enabled: bool,

    /// Preset name, or `"auto"` to pick by the host's appearance.
    #[serde(default = "default_scheme")]
    pub scheme: String,

    /// User-edited per-category styles. When present they replace the
    /// scheme wholesale.
    #[serde(default)]
    pub custom_styles: Option<BTreeMap<String, RawStyle>>,

    /// Background of a bracket pair whose both sides are known.
    #[serde(default = "default_bracket_matched_color")]
    pub bracket_matched_color: String,

    /// Background of a bracket whose partner could not be found.
    #[serde(default = "default_bracket_unmatched_color")]
    pub bracket_unmatched_color: String,

    #[serde(default)]
    pub tokenizer_backend: TokenizerBackend,
}

fn default_highlighting() -> bool {
    true
}

fn default_scheme() -> String {
    AUTO_SCHEME.to_string()
}

fn default_bracket_matched_color() -> String {
    "#ffa500".to_string() // orange
}

fn default_bracket_unmatched_color() -> String {
    "#ff0000".to_string()
}

impl Default for HighlightSettings {
    fn default() -> Self {
        Self {
            highlighting_enabled: default_highlighting(),
            scheme: default_scheme(),
            custom_styles: None,
            bracket_matched_color: default_bracket_matched_color(),
            bracket_unmatched_color: default_bracket_unmatched_color(),
            tokenizer_backend: TokenizerBackend::default(),
        }
    }
}

impl HighlightSettings {
    /// Resolve the preset name for the current appearance.
    pub fn resolved_scheme(&self, is_dark: bool) -> &str {
        resolve_scheme(&self.scheme, is_dark)
    }

    /// Build the style table these settings describe.
    pub fn build_style_table(&self, is_dark: bool) -> Result<StyleTable> {
        let mut table = StyleTable::new();
        match self.custom_styles {
            Some(ref custom) => table.load_from_custom(custom),
            None => table.load_named_style(self.resolved_scheme(is_dark))?,
        }
        Ok(table)
    }

    /// Bracket colors as `(matched, unmatched)`, falling back to the defaults
    /// when a configured value does not parse.
    pub fn bracket_colors(&self) -> (Rgb, Rgb) {
        let matched = Rgb::from_hex(&self.bracket_matched_color)
            .unwrap_or(Rgb::new(0xff, 0xa5, 0x00));
        let unmatched = Rgb::from_hex(&self.bracket_unmatched_color)
            .unwrap_or(Rgb::new(0xff, 0x00, 0x00));
        (matched, unmatched)
    }

    /// Load settings from disk, or create default if not exists
    pub fn load() -> Self {
        let config_path = Self::get_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let default = Self::default();
            // Try to save defaults for next time
            let _ = default.save();
            default
        }
    }

    /// Load settings from an explicit path. Missing or corrupt files give
    /// the defaults.
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(settings) => settings,
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "failed to parse highlight settings, using defaults"
                    );
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// Save settings to disk
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;

        Ok(())
    }

    /// Get config file path (cross-platform)
    pub fn get_config_path() -> PathBuf {
        let mut path = Self::config_dir();
        path.push("highlight.json");
        path
    }

    /// Directory holding user preset files (`*.toml`).
    pub fn styles_dir() -> PathBuf {
        let mut path = Self::config_dir();
        path.push("styles");
        path
    }

    fn config_dir() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("ferrispad");
        path
    }
}

/// `auto` picks monokai on dark hosts and emacs on light ones.
pub fn resolve_scheme(scheme: &str, is_dark: bool) -> &str {
    if scheme == AUTO_SCHEME {
        if is_dark {
            StylePreset::Monokai.name()
        } else {
            StylePreset::Emacs.name()
        }
    } else {
        scheme
    }
}
