//! # Workflows Module
//!
//! The highest-level, user-facing layer: complete relaxation procedures that
//! tie the engine and the core models together.

pub mod relax;
