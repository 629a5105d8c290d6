//! Serverless module
//!
//! doctl invocation and functions project staging.

pub mod doctl;
pub mod staging;
