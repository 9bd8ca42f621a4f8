//! Domain layer - core data structures and types.
//!
//! This module contains the fundamental domain models:
//! - Token categories and styles
//! - DocumentId
//! - Highlight settings

pub mod category;
pub mod document;
pub mod settings;
pub mod style;

pub use category::Category;
pub use document::DocumentId;
pub use settings::{HighlightSettings, TokenizerBackend};
pub use style::{RawStyle, Rgb, Style, StyleSpec};
