//! Tokenizer adapters: turn raw text into `(category, substring)` pairs.
//!
//! Every implementation covers its input exactly and in order, so the
//! substrings concatenate back to the original text.

mod keyword;
mod syntect_adapter;

use std::path::Path;
use std::sync::Arc;

use syntect::parsing::SyntaxSet;

pub use keyword::{KeywordTokenizer, LanguageDef, LANGUAGES};
pub use syntect_adapter::SyntectTokenizer;

use crate::app::domain::category::Category;
use crate::app::domain::settings::TokenizerBackend;
use crate::app::infrastructure::error::{HighlightError, Result};

pub trait Tokenizer {
    /// Canonical name of the language this tokenizer handles.
    fn language(&self) -> &str;

    fn tokenize<'t>(&self, text: &'t str) -> Vec<(Category, &'t str)>;
}

/// Keyword tokenizer for `language`, failing fast when it is unknown.
pub fn tokenizer_for(language: &str) -> Result<Box<dyn Tokenizer>> {
    Ok(Box::new(KeywordTokenizer::for_language(language)?))
}

/// Tokenizer that classifies the whole text as plain text.
pub fn plain_tokenizer() -> Box<dyn Tokenizer> {
    Box::new(PlainTokenizer)
}

struct PlainTokenizer;

impl Tokenizer for PlainTokenizer {
    fn language(&self) -> &str {
        "text"
    }

    fn tokenize<'t>(&self, text: &'t str) -> Vec<(Category, &'t str)> {
        if text.is_empty() {
            Vec::new()
        } else {
            vec![(Category::TEXT, text)]
        }
    }
}

/// Creates tokenizers for the configured backend. The syntect syntax set is
/// loaded on first use and shared by every tokenizer created afterwards.
pub struct TokenizerFactory {
    backend: TokenizerBackend,
    syntax_set: Option<Arc<SyntaxSet>>,
}

impl TokenizerFactory {
    pub fn new(backend: TokenizerBackend) -> Self {
        Self {
            backend,
            syntax_set: None,
        }
    }

    pub fn backend(&self) -> TokenizerBackend {
        self.backend
    }

    pub fn set_backend(&mut self, backend: TokenizerBackend) {
        self.backend = backend;
    }

    pub fn create(&mut self, language: &str) -> Result<Box<dyn Tokenizer>> {
        match self.backend {
            TokenizerBackend::Keyword => tokenizer_for(language),
            TokenizerBackend::Syntect => {
                let syntax_set = self.syntax_set();
                Ok(Box::new(SyntectTokenizer::new(syntax_set, language)?))
            }
        }
    }

    /// Detect a language name from a file path's extension.
    pub fn detect_language(&mut self, path: &str) -> Option<String> {
        let ext = Path::new(path).extension()?.to_str()?;
        if let Some(def) = LANGUAGES
            .iter()
            .find(|def| def.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
        {
            return Some(def.name.to_string());
        }
        let syntax_set = self.syntax_set();
        let syntax = syntax_set.find_syntax_by_extension(ext)?;
        if syntax.name == "Plain Text" {
            return None;
        }
        Some(syntax.name.clone())
    }

    fn syntax_set(&mut self) -> Arc<SyntaxSet> {
        self.syntax_set
            .get_or_insert_with(|| Arc::new(SyntaxSet::load_defaults_newlines()))
            .clone()
    }
}

impl Default for TokenizerFactory {
    fn default() -> Self {
        Self::new(TokenizerBackend::default())
    }
}

pub(crate) fn unsupported(language: &str) -> HighlightError {
    HighlightError::UnsupportedLanguage(language.to_string())
}
