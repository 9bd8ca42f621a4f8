//! Controllers layer - orchestration and coordination.
//!
//! This module contains controllers that coordinate between
//! domain models and services:
//! - Syntax highlighting orchestration across open documents

pub mod highlight;
