use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

use super::presets::{PresetFile, StylePreset};
use crate::app::domain::category::Category;
use crate::app::domain::style::{RawStyle, Rgb, Style};
use crate::app::infrastructure::error::{HighlightError, Result};

/// Fingerprint of a [`StyleTable`]'s contents. Two tables with equal
/// entries have equal signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StyleSignature([u8; 32]);

impl StyleSignature {
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

/// Maps token categories to styles. Lookups fall back to the nearest
/// ancestor category, then to the unstyled default.
///
/// Every mutation recomputes the signature, which is what invalidates
/// format caches built against the previous contents.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleTable {
    entries: BTreeMap<Category, Style>,
    signature: StyleSignature,
}

impl StyleTable {
    pub fn new() -> Self {
        let entries = BTreeMap::new();
        let signature = compute_signature(&entries);
        Self { entries, signature }
    }

    pub fn from_preset(preset: StylePreset) -> Self {
        let mut table = Self::new();
        table.load_preset(preset);
        table
    }

    pub fn get_style(&self, category: &Category) -> Style {
        category
            .ancestors()
            .find_map(|path| self.entries.get(path).copied())
            .unwrap_or_default()
    }

    /// Merge a built-in preset by name: keys present in the preset
    /// overwrite, all other entries keep their value.
    pub fn load_named_style(&mut self, name: &str) -> Result<()> {
        let preset = StylePreset::from_name(name)
            .ok_or_else(|| HighlightError::UnknownStyle(name.to_string()))?;
        self.load_preset(preset);
        Ok(())
    }

    pub fn load_preset(&mut self, preset: StylePreset) {
        self.entries.extend(preset.styles());
        self.refresh_signature();
    }

    /// Merge a user preset file, applying its `inherits` preset first.
    pub fn load_preset_file(&mut self, preset: &PresetFile) -> Result<()> {
        if let Some(ref base) = preset.inherits {
            let base = StylePreset::from_name(base)
                .ok_or_else(|| HighlightError::UnknownStyle(base.clone()))?;
            self.entries.extend(base.styles());
        }
        self.entries.extend(preset.styles());
        self.refresh_signature();
        Ok(())
    }

    /// Replace all entries with user-specified per-category settings.
    /// Malformed colors become "no color" instead of failing the load.
    pub fn load_from_custom(&mut self, custom: &BTreeMap<String, RawStyle>) {
        self.entries = custom
            .iter()
            .map(|(path, raw)| (Category::from_path(path.as_str()), raw.to_style()))
            .collect();
        self.refresh_signature();
    }

    pub fn set_style(&mut self, category: Category, style: Style) {
        self.entries.insert(category, style);
        self.refresh_signature();
    }

    pub fn remove_style(&mut self, category: &Category) -> Option<Style> {
        let removed = self.entries.remove(category);
        if removed.is_some() {
            self.refresh_signature();
        }
        removed
    }

    /// Export the entries in the form settings persist them.
    pub fn to_custom(&self) -> BTreeMap<String, RawStyle> {
        self.entries
            .iter()
            .map(|(cat, style)| (cat.as_str().to_string(), RawStyle::from(style)))
            .collect()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&Category, &Style)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn signature(&self) -> StyleSignature {
        self.signature
    }

    fn refresh_signature(&mut self) {
        self.signature = compute_signature(&self.entries);
    }
}

impl Default for StyleTable {
    fn default() -> Self {
        Self::new()
    }
}

fn compute_signature(entries: &BTreeMap<Category, Style>) -> StyleSignature {
    let mut hasher = Sha256::new();
    for (category, style) in entries {
        let path = category.as_str().as_bytes();
        hasher.update((path.len() as u64).to_le_bytes());
        hasher.update(path);
        update_color(&mut hasher, style.foreground);
        update_color(&mut hasher, style.background);
        hasher.update([style.bold as u8, style.italic as u8, style.underline as u8]);
    }
    StyleSignature(hasher.finalize().into())
}

fn update_color(hasher: &mut Sha256, color: Option<Rgb>) {
    match color {
        Some(c) => hasher.update([1, c.r, c.g, c.b]),
        None => hasher.update([0]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_then_ancestor_then_default() {
        let mut table = StyleTable::new();
        let string = Style::default().with_foreground(Rgb::new(1, 1, 1));
        let double = Style::default().with_foreground(Rgb::new(2, 2, 2));
        table.set_style(Category::STRING, string);
        table.set_style(Category::STRING_DOUBLE, double);

        assert_eq!(table.get_style(&Category::STRING_DOUBLE), double);
        assert_eq!(table.get_style(&Category::new("String.Double.Triple")), double);
        assert_eq!(table.get_style(&Category::STRING_SINGLE), string);
        assert_eq!(table.get_style(&Category::KEYWORD), Style::default());
    }

    #[test]
    fn test_root_entry_is_last_resort() {
        let mut table = StyleTable::new();
        let root = Style::default().with_foreground(Rgb::new(9, 9, 9));
        table.set_style(Category::ROOT, root);
        assert_eq!(table.get_style(&Category::new("Anything.At.All")), root);
    }

    #[test]
    fn test_load_named_style_merges() {
        let mut table = StyleTable::new();
        let custom = Style::default().with_foreground(Rgb::new(7, 7, 7));
        table.set_style(Category::new("Custom.Only"), custom);
        table.set_style(Category::KEYWORD, custom);

        table.load_named_style("monokai").unwrap();
        assert_eq!(table.get_style(&Category::new("Custom.Only")), custom);
        assert_eq!(
            table.get_style(&Category::KEYWORD).foreground,
            Some(Rgb::new(0x66, 0xd9, 0xef))
        );
    }

    #[test]
    fn test_unknown_named_style_leaves_table_untouched() {
        let mut table = StyleTable::from_preset(StylePreset::Emacs);
        let before = table.clone();
        let err = table.load_named_style("vaporwave").unwrap_err();
        assert!(matches!(err, HighlightError::UnknownStyle(_)));
        assert_eq!(table, before);
    }

    #[test]
    fn test_load_from_custom_replaces_wholesale() {
        let mut table = StyleTable::from_preset(StylePreset::Monokai);
        let mut custom = BTreeMap::new();
        custom.insert(
            "Token.Comment".to_string(),
            RawStyle {
                color: Some("#00ff00".to_string()),
                italic: true,
                ..Default::default()
            },
        );
        custom.insert(
            "Keyword".to_string(),
            RawStyle {
                color: Some("garbage".to_string()),
                bold: true,
                ..Default::default()
            },
        );
        table.load_from_custom(&custom);

        assert_eq!(table.len(), 2);
        let comment = table.get_style(&Category::COMMENT_SINGLE);
        assert_eq!(comment.foreground, Some(Rgb::new(0, 255, 0)));
        assert!(comment.italic);
        let keyword = table.get_style(&Category::KEYWORD);
        assert_eq!(keyword.foreground, None);
        assert!(keyword.bold);
        assert_eq!(table.get_style(&Category::STRING), Style::default());
    }

    #[test]
    fn test_signature_tracks_contents() {
        let a = StyleTable::from_preset(StylePreset::Monokai);
        let mut b = StyleTable::from_preset(StylePreset::Monokai);
        assert_eq!(a.signature(), b.signature());

        let mut style = b.get_style(&Category::KEYWORD);
        style.underline = true;
        b.set_style(Category::KEYWORD, style);
        assert_ne!(a.signature(), b.signature());

        style.underline = false;
        b.set_style(Category::KEYWORD, style);
        assert_eq!(a.signature(), b.signature());
        assert_eq!(a.signature().to_hex().len(), 64);
    }

    #[test]
    fn test_custom_export_roundtrip() {
        let table = StyleTable::from_preset(StylePreset::SolarizedLight);
        let mut restored = StyleTable::new();
        restored.load_from_custom(&table.to_custom());
        assert_eq!(restored.signature(), table.signature());
    }

    #[test]
    fn test_preset_file_inherits() {
        let preset = PresetFile::from_toml_str(
            r##"
            name = "mine"
            inherits = "emacs"
            [styles]
            Keyword = { color = "#010101" }
            "##,
        )
        .unwrap();
        let mut table = StyleTable::new();
        table.load_preset_file(&preset).unwrap();
        assert_eq!(table.get_style(&Category::KEYWORD).foreground, Some(Rgb::new(1, 1, 1)));
        assert!(table.get_style(&Category::COMMENT).italic);

        let broken = PresetFile {
            name: "broken".to_string(),
            inherits: Some("nothing".to_string()),
            styles: BTreeMap::new(),
        };
        assert!(table.load_preset_file(&broken).is_err());
    }
}
