//! Control-plane API module

pub mod client;
pub mod control_plane;
pub mod error;
pub mod types;
