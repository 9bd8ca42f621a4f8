//! Application layer - organized by Clean Architecture principles.
//!
//! # Structure
//!
//! - `domain/` - Core data structures (Category, Style, DocumentId, Settings)
//! - `controllers/` - Orchestration (HighlightController)
//! - `services/` - Business operations (syntax highlighting)
//! - `infrastructure/` - Error types

pub mod controllers;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-exports for convenient external access
pub use controllers::highlight::HighlightController;
pub use domain::{Category, DocumentId, HighlightSettings, RawStyle, Rgb, Style, TokenizerBackend};
pub use infrastructure::error::{HighlightError, Result};
