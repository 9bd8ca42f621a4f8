//! Services layer - business operations.
//!
//! - Syntax highlighting

pub mod syntax;
