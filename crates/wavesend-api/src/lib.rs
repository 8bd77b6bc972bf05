//! Wavesend API - REST API server
//!
//! This crate provides the REST API for Wavesend: campaign and contact
//! management, quick send, message inspection, and settings.

pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::AppState;
