// Crash alert dashboard client. The binary in main.rs wires these modules to
// a console renderer; integration tests drive them directly.

pub mod advisory;
pub mod config;
pub mod connection;
pub mod error;
pub mod history;
pub mod location;
pub mod models;
pub mod render;
pub mod state;
pub mod store;
pub mod wire;
