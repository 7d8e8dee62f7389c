//! imgflux API library
//!
//! HTTP handlers, error rendering and application setup for the transformation proxy.

pub mod error;
mod handlers;
pub mod services;
pub mod setup;
pub mod state;

pub use error::{ErrorResponse, HttpAppError};
