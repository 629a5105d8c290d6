//! Provisioning steps shared by the templates

pub mod agents;
pub mod database;
pub mod demo_data;
pub mod functions;
pub mod knowledge;
