//! Configuration module
//!
//! Settings file, pacing and env-file handling.

pub mod env;
pub mod settings;
