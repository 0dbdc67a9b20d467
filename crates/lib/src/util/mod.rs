//! Shared utilities.
//!
//! Path helpers used when naming file references and products.

pub mod path;
