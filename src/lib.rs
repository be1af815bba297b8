/// Basic application code
pub mod app;
/// Caller authentication
pub mod auth;
/// REST clients for outside services
pub mod client;
/// Controllers for REST endpoints
pub mod controller;
/// Domain objects
pub mod domain;
/// Error types shared by every layer
pub mod error;
/// Stored records and their invariants
pub mod model;
/// Repositories
pub mod repo;
/// Application settings
pub mod settings;
/// Application telemetry for tracing and logging
pub mod telemetry;
/// Confirmation email templates
pub mod templates;
