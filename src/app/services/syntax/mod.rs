//! Syntax highlighting: style tables, tokenizers, format-run caching,
//! bracket matching and the per-document incremental driver.

pub mod brackets;
pub mod format_cache;
mod highlighter;
pub mod lines;
pub mod presets;
pub mod style_table;
pub mod tokenizer;

pub use brackets::{BracketMatcher, BracketPair, Direction, find_match};
pub use format_cache::{FormatCache, FormatRun, find_run};
pub use highlighter::{IncrementalHighlighter, InputEvent, Key, Repaint, StyledSpan};
pub use lines::{Block, BlockIndex, BlockState, TextEdit};
pub use presets::{PresetFile, StylePreset};
pub use style_table::{StyleSignature, StyleTable};
pub use tokenizer::{Tokenizer, TokenizerFactory, tokenizer_for};
