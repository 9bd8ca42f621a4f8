use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::app::domain::category::Category;
use crate::app::domain::style::{RawStyle, Style, StyleSpec};
use crate::app::infrastructure::error::Result;

/// Built-in color schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum StylePreset {
    #[default]
    Monokai,
    Emacs,
    Default,
    SolarizedDark,
    SolarizedLight,
}

impl StylePreset {
    /// Name used in settings and by [`StylePreset::from_name`].
    pub fn name(&self) -> &'static str {
        match self {
            Self::Monokai => "monokai",
            Self::Emacs => "emacs",
            Self::Default => "default",
            Self::SolarizedDark => "solarized-dark",
            Self::SolarizedLight => "solarized-light",
        }
    }

    /// Get the display name for this preset
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Monokai => "Monokai",
            Self::Emacs => "Emacs",
            Self::Default => "Default",
            Self::SolarizedDark => "Solarized Dark",
            Self::SolarizedLight => "Solarized Light",
        }
    }

    pub fn is_dark(&self) -> bool {
        matches!(self, Self::Monokai | Self::SolarizedDark)
    }

    /// Get all available presets
    pub fn all() -> &'static [StylePreset] {
        &[
            Self::Monokai,
            Self::Emacs,
            Self::Default,
            Self::SolarizedDark,
            Self::SolarizedLight,
        ]
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::all()
            .iter()
            .copied()
            .find(|p| p.name().eq_ignore_ascii_case(name))
    }

    /// Raw `(category path, style spec)` pairs of the scheme.
    pub fn entries(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::Monokai => MONOKAI,
            Self::Emacs => EMACS,
            Self::Default => DEFAULT,
            Self::SolarizedDark => SOLARIZED_DARK,
            Self::SolarizedLight => SOLARIZED_LIGHT,
        }
    }

    /// Resolved styles. Each entry starts from its nearest listed ancestor,
    /// so `Comment.Preproc = "noitalic"` keeps the comment color.
    pub fn styles(&self) -> Vec<(Category, Style)> {
        let mut entries: Vec<(Category, &str)> = self
            .entries()
            .iter()
            .map(|&(path, spec)| (Category::new(path), spec))
            .collect();
        entries.sort_by_key(|(cat, _)| depth(cat));

        let mut resolved: BTreeMap<Category, Style> = BTreeMap::new();
        for (cat, spec) in entries {
            let base = cat
                .ancestors()
                .skip(1)
                .find_map(|path| resolved.get(path).copied())
                .unwrap_or_default();
            resolved.insert(cat, StyleSpec::apply(base, spec));
        }
        resolved.into_iter().collect()
    }
}

fn depth(cat: &Category) -> usize {
    if cat.is_root() {
        0
    } else {
        cat.as_str().split('.').count()
    }
}

const MONOKAI: &[(&str, &str)] = &[
    ("", "#f8f8f2"),
    ("Error", "#ed007e bg:#1e0010"),
    ("Comment", "#959077"),
    ("Keyword", "#66d9ef"),
    ("Keyword.Namespace", "#ff4689"),
    ("Operator", "#ff4689"),
    ("Operator.Word", "#ff4689"),
    ("Punctuation", "#f8f8f2"),
    ("Name", "#f8f8f2"),
    ("Name.Attribute", "#a6e22e"),
    ("Name.Class", "#a6e22e"),
    ("Name.Constant", "#66d9ef"),
    ("Name.Decorator", "#a6e22e"),
    ("Name.Exception", "#a6e22e"),
    ("Name.Function", "#a6e22e"),
    ("Name.Tag", "#ff4689"),
    ("Number", "#ae81ff"),
    ("Literal", "#ae81ff"),
    ("String", "#e6db74"),
    ("String.Escape", "#ae81ff"),
    ("Generic.Deleted", "#ff4689"),
    ("Generic.Emph", "italic"),
    ("Generic.Heading", "bold"),
    ("Generic.Inserted", "#a6e22e"),
    ("Generic.Strong", "bold"),
    ("Generic.Subheading", "#959077"),
];

const EMACS: &[(&str, &str)] = &[
    ("Text.Whitespace", "#bbbbbb"),
    ("Comment", "italic #008800"),
    ("Comment.Preproc", "noitalic"),
    ("Comment.Special", "noitalic bold"),
    ("Keyword", "bold #aa22ff"),
    ("Keyword.Pseudo", "nobold"),
    ("Keyword.Type", "bold #00bb00"),
    ("Operator", "#666666"),
    ("Operator.Word", "bold #aa22ff"),
    ("Name.Builtin", "#aa22ff"),
    ("Name.Function", "#00a000"),
    ("Name.Class", "#0000ff"),
    ("Name.Namespace", "bold #0000ff"),
    ("Name.Exception", "bold #d2413a"),
    ("Name.Variable", "#b8860b"),
    ("Name.Constant", "#880000"),
    ("Name.Label", "#a0a000"),
    ("Name.Attribute", "#bb4444"),
    ("Name.Tag", "bold #008000"),
    ("Name.Decorator", "#aa22ff"),
    ("String", "#bb4444"),
    ("String.Doc", "italic"),
    ("String.Interpol", "bold #bb6688"),
    ("String.Escape", "bold #bb6622"),
    ("String.Regex", "#bb6688"),
    ("String.Symbol", "#b8860b"),
    ("Number", "#666666"),
    ("Generic.Heading", "bold #000080"),
    ("Generic.Deleted", "#a00000"),
    ("Generic.Inserted", "#00a000"),
    ("Error", "#ff0000"),
];

const DEFAULT: &[(&str, &str)] = &[
    ("Text.Whitespace", "#bbbbbb"),
    ("Comment", "italic #3d7b7b"),
    ("Comment.Preproc", "noitalic #9c6500"),
    ("Keyword", "bold #008000"),
    ("Keyword.Pseudo", "nobold"),
    ("Keyword.Type", "nobold #b00040"),
    ("Operator", "#666666"),
    ("Operator.Word", "bold #aa22ff"),
    ("Name.Builtin", "#008000"),
    ("Name.Function", "#0000ff"),
    ("Name.Class", "bold #0000ff"),
    ("Name.Namespace", "bold #0000ff"),
    ("Name.Exception", "bold #cb3f38"),
    ("Name.Variable", "#19177c"),
    ("Name.Constant", "#880000"),
    ("Name.Attribute", "#687822"),
    ("Name.Tag", "bold #008000"),
    ("Name.Decorator", "#aa22ff"),
    ("String", "#ba2121"),
    ("String.Doc", "italic"),
    ("String.Interpol", "bold #a45a77"),
    ("String.Escape", "bold #aa5d1f"),
    ("String.Regex", "#a45a77"),
    ("Number", "#666666"),
    ("Generic.Heading", "bold #000080"),
    ("Generic.Deleted", "#a00000"),
    ("Generic.Inserted", "#008400"),
    ("Error", "#ff0000"),
];

const SOLARIZED_DARK: &[(&str, &str)] = &[
    ("", "#839496"),
    ("Comment", "italic #586e75"),
    ("Comment.Preproc", "noitalic #859900"),
    ("Keyword", "#859900"),
    ("Keyword.Constant", "#2aa198"),
    ("Keyword.Namespace", "#dc322f"),
    ("Keyword.Type", "#b58900"),
    ("Operator", "#586e75"),
    ("Operator.Word", "#859900"),
    ("Name.Builtin", "#268bd2"),
    ("Name.Class", "#268bd2"),
    ("Name.Decorator", "#268bd2"),
    ("Name.Function", "#268bd2"),
    ("Name.Tag", "#268bd2"),
    ("String", "#2aa198"),
    ("String.Escape", "#dc322f"),
    ("String.Regex", "#dc322f"),
    ("Number", "#2aa198"),
    ("Generic.Deleted", "#dc322f"),
    ("Generic.Inserted", "#859900"),
    ("Generic.Heading", "bold #268bd2"),
    ("Error", "#dc322f"),
];

const SOLARIZED_LIGHT: &[(&str, &str)] = &[
    ("", "#657b83"),
    ("Comment", "italic #93a1a1"),
    ("Comment.Preproc", "noitalic #859900"),
    ("Keyword", "#859900"),
    ("Keyword.Constant", "#2aa198"),
    ("Keyword.Namespace", "#dc322f"),
    ("Keyword.Type", "#b58900"),
    ("Operator", "#93a1a1"),
    ("Operator.Word", "#859900"),
    ("Name.Builtin", "#268bd2"),
    ("Name.Class", "#268bd2"),
    ("Name.Decorator", "#268bd2"),
    ("Name.Function", "#268bd2"),
    ("Name.Tag", "#268bd2"),
    ("String", "#2aa198"),
    ("String.Escape", "#dc322f"),
    ("String.Regex", "#dc322f"),
    ("Number", "#2aa198"),
    ("Generic.Deleted", "#dc322f"),
    ("Generic.Inserted", "#859900"),
    ("Generic.Heading", "bold #268bd2"),
    ("Error", "#dc322f"),
];

/// User color scheme stored as TOML:
///
/// ```toml
/// name = "ocean"
/// inherits = "monokai"
///
/// [styles]
/// Keyword = { color = "#c594c5", bold = true }
/// "String.Double" = { color = "#99c794" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetFile {
    pub name: String,

    /// Built-in preset loaded before `styles` are applied.
    #[serde(default)]
    pub inherits: Option<String>,

    #[serde(default)]
    pub styles: BTreeMap<String, RawStyle>,
}

impl PresetFile {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Load every `*.toml` preset in `dir`, sorted by name. Files that fail
    /// to parse are logged and skipped.
    pub fn discover(dir: &Path) -> Vec<Self> {
        let Ok(read_dir) = fs::read_dir(dir) else {
            return Vec::new();
        };
        let mut presets: Vec<Self> = read_dir
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("toml"))
            .filter_map(|path| match Self::load(&path) {
                Ok(preset) => Some(preset),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping invalid style preset");
                    None
                }
            })
            .collect();
        presets.sort_by(|a, b| a.name.cmp(&b.name));
        presets
    }

    pub fn styles(&self) -> impl Iterator<Item = (Category, Style)> + '_ {
        self.styles
            .iter()
            .map(|(path, raw)| (Category::from_path(path.as_str()), raw.to_style()))
    }
}
