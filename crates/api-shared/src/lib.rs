//! # API Shared
//!
//! Shared request/response types for the clinic APIs.
//!
//! Contains:
//! - Wire types (`messages` module) with OpenAPI schemas
//! - Shared services like `HealthService`
//!
//! Used by `api-rest` and by any other front-end that needs the same JSON shapes.

pub mod health;
pub mod messages;

pub use health::HealthService;
pub use messages::*;
