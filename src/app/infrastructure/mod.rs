//! Infrastructure layer - error types.

pub mod error;
