//! StackPilot Server Library
//!
//! Core modules for the StackPilot provisioning server.

pub mod app;
pub mod dispatch;
pub mod errors;
pub mod forge;
pub mod logs;
pub mod models;
pub mod server;
pub mod settings;
pub mod stream;
pub mod utils;
