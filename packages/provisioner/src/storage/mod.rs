//! Storage module
//!
//! Spaces buckets for knowledge base data.

pub mod bucket;
pub mod spaces;
