use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::app::domain::category::Category;
use crate::app::domain::document::DocumentId;
use crate::app::domain::settings::{HighlightSettings, resolve_scheme};
use crate::app::domain::style::Style;
use crate::app::infrastructure::error::{HighlightError, Result};
use crate::app::services::syntax::tokenizer::plain_tokenizer;
use crate::app::services::syntax::{
    IncrementalHighlighter, PresetFile, StylePreset, StyleTable, Tokenizer, TokenizerFactory,
};

/// Owns one highlighter per open document and keeps them in sync with the
/// highlight settings.
pub struct HighlightController {
    settings: HighlightSettings,
    is_dark: bool,
    styles_dir: PathBuf,
    factory: TokenizerFactory,
    documents: HashMap<DocumentId, IncrementalHighlighter>,
}

impl HighlightController {
    pub fn new(settings: HighlightSettings, is_dark: bool) -> Self {
        let factory = TokenizerFactory::new(settings.tokenizer_backend);
        Self {
            settings,
            is_dark,
            styles_dir: HighlightSettings::styles_dir(),
            factory,
            documents: HashMap::new(),
        }
    }

    /// Look for user preset files in `dir` instead of the config directory.
    pub fn with_styles_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.styles_dir = dir.into();
        self
    }

    pub fn settings(&self) -> &HighlightSettings {
        &self.settings
    }

    pub fn is_dark(&self) -> bool {
        self.is_dark
    }

    /// Start highlighting a document. An unknown language falls back to the
    /// plain-text highlighter instead of failing.
    pub fn open(&mut self, id: DocumentId, language: &str, text: &str) -> Result<()> {
        let table = self.build_style_table()?;
        let mut highlighter = match self.factory.create(language) {
            Ok(tokenizer) => {
                IncrementalHighlighter::with_tokenizer(tokenizer, table, &self.settings)
            }
            Err(HighlightError::UnsupportedLanguage(lang)) => {
                warn!(%id, language = %lang, "unsupported language, highlighting as plain text");
                self.plain_highlighter(table)
            }
            Err(e) => return Err(e),
        };
        highlighter.set_text(text);
        self.documents.insert(id, highlighter);
        Ok(())
    }

    /// Open a document, picking the language from the file extension.
    pub fn open_path(&mut self, id: DocumentId, path: &str, text: &str) -> Result<()> {
        match self.detect_language(path) {
            Some(language) => self.open(id, &language, text),
            None => {
                let table = self.build_style_table()?;
                let mut highlighter = self.plain_highlighter(table);
                highlighter.set_text(text);
                self.documents.insert(id, highlighter);
                Ok(())
            }
        }
    }

    pub fn close(&mut self, id: DocumentId) -> Option<IncrementalHighlighter> {
        self.documents.remove(&id)
    }

    pub fn get(&self, id: DocumentId) -> Option<&IncrementalHighlighter> {
        self.documents.get(&id)
    }

    pub fn get_mut(&mut self, id: DocumentId) -> Option<&mut IncrementalHighlighter> {
        self.documents.get_mut(&id)
    }

    pub fn document_ids(&self) -> impl Iterator<Item = DocumentId> + '_ {
        self.documents.keys().copied()
    }

    pub fn detect_language(&mut self, path: &str) -> Option<String> {
        self.factory.detect_language(path)
    }

    /// Switch every document to `scheme` (a built-in preset, a user preset
    /// file name, or `auto`). Clears custom styles.
    pub fn apply_scheme(&mut self, scheme: &str, is_dark: bool) -> Result<()> {
        let table = self.named_table(resolve_scheme(scheme, is_dark))?;
        self.settings.scheme = scheme.to_string();
        self.settings.custom_styles = None;
        self.is_dark = is_dark;
        info!(scheme, documents = self.documents.len(), "applying color scheme");
        self.install_table(table);
        Ok(())
    }

    /// Follow a host light/dark switch. Only an `auto` scheme changes.
    pub fn set_dark_mode(&mut self, is_dark: bool) -> Result<()> {
        if self.is_dark == is_dark {
            return Ok(());
        }
        self.is_dark = is_dark;
        let table = self.build_style_table()?;
        self.install_table(table);
        Ok(())
    }

    /// Customize one category on top of the current styles. The result is
    /// kept in the settings as custom styles.
    pub fn set_custom_style(&mut self, category: Category, style: Style) -> Result<()> {
        let mut table = self.build_style_table()?;
        table.set_style(category, style);
        self.settings.custom_styles = Some(table.to_custom());
        self.install_table(table);
        Ok(())
    }

    /// Drop custom styles and go back to the configured scheme.
    pub fn reset_custom_styles(&mut self) -> Result<()> {
        self.settings.custom_styles = None;
        let table = self.build_style_table()?;
        self.install_table(table);
        Ok(())
    }

    pub fn set_highlighting_enabled(&mut self, enabled: bool) {
        self.settings.highlighting_enabled = enabled;
        for highlighter in self.documents.values_mut() {
            highlighter.set_enabled(enabled);
        }
    }

    /// Replace the settings wholesale, e.g. after the preferences dialog.
    /// A tokenizer backend change re-tokenizes every open document; text
    /// and bracket state are kept.
    pub fn apply_settings(&mut self, settings: HighlightSettings) -> Result<()> {
        let table = Self::table_for(&settings, self.is_dark, &self.styles_dir)?;
        let backend_changed = settings.tokenizer_backend != self.factory.backend();
        self.factory.set_backend(settings.tokenizer_backend);
        let tokenizers = if backend_changed {
            info!(backend = ?settings.tokenizer_backend, "switching tokenizer backend");
            self.rebuild_tokenizers()?
        } else {
            Vec::new()
        };

        self.settings = settings;
        for (id, tokenizer) in tokenizers {
            if let Some(highlighter) = self.documents.get_mut(&id) {
                highlighter.set_tokenizer(tokenizer);
            }
        }
        for highlighter in self.documents.values_mut() {
            highlighter.apply_settings(&self.settings);
            highlighter.set_style_table(table.clone());
        }
        Ok(())
    }

    /// Fresh tokenizers from the factory for every open document. Languages
    /// the new backend does not know fall back to plain text.
    fn rebuild_tokenizers(&mut self) -> Result<Vec<(DocumentId, Box<dyn Tokenizer>)>> {
        let mut tokenizers = Vec::with_capacity(self.documents.len());
        for (&id, highlighter) in &self.documents {
            let tokenizer = match self.factory.create(highlighter.language()) {
                Ok(tokenizer) => tokenizer,
                Err(HighlightError::UnsupportedLanguage(lang)) => {
                    warn!(%id, language = %lang, "backend lacks language, using plain text");
                    plain_tokenizer()
                }
                Err(e) => return Err(e),
            };
            tokenizers.push((id, tokenizer));
        }
        Ok(tokenizers)
    }

    /// Built-in preset names followed by user preset files.
    pub fn available_schemes(&self) -> Vec<String> {
        StylePreset::all()
            .iter()
            .map(|p| p.name().to_string())
            .chain(PresetFile::discover(&self.styles_dir).into_iter().map(|p| p.name))
            .collect()
    }

    /// Style table for the current settings and appearance.
    pub fn build_style_table(&self) -> Result<StyleTable> {
        Self::table_for(&self.settings, self.is_dark, &self.styles_dir)
    }

    fn named_table(&self, name: &str) -> Result<StyleTable> {
        named_table(name, &self.styles_dir)
    }

    fn table_for(
        settings: &HighlightSettings,
        is_dark: bool,
        styles_dir: &Path,
    ) -> Result<StyleTable> {
        let name = settings.resolved_scheme(is_dark);
        if settings.custom_styles.is_none() && StylePreset::from_name(name).is_none() {
            return named_table(name, styles_dir);
        }
        settings.build_style_table(is_dark)
    }

    fn install_table(&mut self, table: StyleTable) {
        for highlighter in self.documents.values_mut() {
            highlighter.set_style_table(table.clone());
        }
    }

    fn plain_highlighter(&self, table: StyleTable) -> IncrementalHighlighter {
        let mut highlighter = IncrementalHighlighter::plain(table);
        highlighter.apply_settings(&self.settings);
        highlighter
    }
}

fn named_table(name: &str, styles_dir: &Path) -> Result<StyleTable> {
    let mut table = StyleTable::new();
    if StylePreset::from_name(name).is_some() {
        table.load_named_style(name)?;
        return Ok(table);
    }
    let preset = PresetFile::discover(styles_dir)
        .into_iter()
        .find(|p| p.name.eq_ignore_ascii_case(name))
        .ok_or_else(|| HighlightError::UnknownStyle(name.to_string()))?;
    table.load_preset_file(&preset)?;
    Ok(table)
}
