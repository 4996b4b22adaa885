// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! CLI module.
//!
//! This module contains the command-line interface logic: argument parsing,
//! console logging, and the `prepare` and `predict` commands.

// Modules
/// CLI arguments.
pub mod args;

/// Console logging macros.
pub mod logging;

/// Single-image classification.
#[cfg(feature = "onnx")]
pub mod predict;

/// Dataset preparation.
#[cfg(feature = "onnx")]
pub mod prepare;
