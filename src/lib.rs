// ABOUTME: Library root for rollcall - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod output;
pub mod transcript;
pub mod transport;
pub mod types;
