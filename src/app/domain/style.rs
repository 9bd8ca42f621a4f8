use std::fmt;

use serde::{Deserialize, Serialize};

/// 24-bit color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `rrggbb`, `#rrggbb` or the `#rgb` shorthand.
    /// Anything else yields `None` rather than an error.
    pub fn from_hex(s: &str) -> Option<Self> {
        let digits = s.trim().trim_start_matches('#');
        let expanded;
        let digits = if digits.len() == 3 {
            expanded = digits.chars().flat_map(|c| [c, c]).collect::<String>();
            expanded.as_str()
        } else {
            digits
        };
        let mut bytes = [0u8; 3];
        hex::decode_to_slice(digits, &mut bytes).ok()?;
        Some(Self::new(bytes[0], bytes[1], bytes[2]))
    }

    pub fn to_hex(self) -> String {
        format!("#{}", hex::encode([self.r, self.g, self.b]))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Visual attributes for a run of text. Mapping a `Style` onto paint
/// instructions is the host widget's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Style {
    pub foreground: Option<Rgb>,
    pub background: Option<Rgb>,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl Style {
    pub fn with_foreground(mut self, color: Rgb) -> Self {
        self.foreground = Some(color);
        self
    }

    pub fn with_background(mut self, color: Rgb) -> Self {
        self.background = Some(color);
        self
    }

    pub fn is_plain(&self) -> bool {
        *self == Self::default()
    }
}

/// Style attributes as a user or a preset file writes them: hex color
/// strings and flags. Missing fields mean "unset".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RawStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bgcolor: Option<String>,

    #[serde(default)]
    pub bold: bool,

    #[serde(default)]
    pub italic: bool,

    #[serde(default)]
    pub underline: bool,
}

impl RawStyle {
    /// Convert leniently: an unparseable color becomes "no color".
    pub fn to_style(&self) -> Style {
        Style {
            foreground: self.color.as_deref().and_then(Rgb::from_hex),
            background: self.bgcolor.as_deref().and_then(Rgb::from_hex),
            bold: self.bold,
            italic: self.italic,
            underline: self.underline,
        }
    }
}

impl From<&Style> for RawStyle {
    fn from(style: &Style) -> Self {
        Self {
            color: style.foreground.map(Rgb::to_hex),
            bgcolor: style.background.map(Rgb::to_hex),
            bold: style.bold,
            italic: style.italic,
            underline: style.underline,
        }
    }
}

/// Parser for compact style strings such as `"bold italic #f92672 bg:#272822"`.
///
/// Recognized words are `bold`, `italic`, `underline`, their `no`-prefixed
/// negations, a `#rrggbb` foreground and a `bg:#rrggbb` background (an empty
/// `bg:` clears it). `noinherit` discards the inherited base. Unknown words
/// are ignored.
pub struct StyleSpec;

impl StyleSpec {
    pub fn parse(spec: &str) -> Style {
        Self::apply(Style::default(), spec)
    }

    /// Apply `spec` on top of an inherited `base` style.
    pub fn apply(base: Style, spec: &str) -> Style {
        let mut style = if spec.split_whitespace().any(|w| w == "noinherit") {
            Style::default()
        } else {
            base
        };
        for word in spec.split_whitespace() {
            match word {
                "bold" => style.bold = true,
                "nobold" => style.bold = false,
                "italic" => style.italic = true,
                "noitalic" => style.italic = false,
                "underline" => style.underline = true,
                "nounderline" => style.underline = false,
                _ => {
                    if let Some(bg) = word.strip_prefix("bg:") {
                        style.background = Rgb::from_hex(bg);
                    } else if word.starts_with('#') {
                        style.foreground = Rgb::from_hex(word);
                    }
                }
            }
        }
        style
    }
}
