//! Shared pipeline types
//!
//! Error type and result alias used by every conversion stage.

pub mod error;

pub use error::{ConversionError, Result};
