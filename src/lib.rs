//! Headless syntax highlighting for a source-code editor.
//!
//! A host text widget keeps one [`IncrementalHighlighter`] per document
//! (usually through [`HighlightController`]), reports edits, cursor moves
//! and key presses to it, and paints the [`StyledSpan`]s returned by
//! `style_block` for each block it needs to repaint.

pub mod app;

pub use app::services::syntax::{
    BracketMatcher, BracketPair, FormatCache, FormatRun, IncrementalHighlighter, InputEvent, Key,
    Repaint, StylePreset, StyleTable, StyledSpan, Tokenizer, tokenizer_for,
};
pub use app::{
    Category, DocumentId, HighlightController, HighlightError, HighlightSettings, RawStyle, Result,
    Rgb, Style, TokenizerBackend,
};
