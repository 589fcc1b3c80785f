//! Shared vocabulary for the Roster service registry
//!
//! This crate provides:
//! - Service identity types (ServiceKey and its derived map keys)
//! - Instance descriptors
//! - Registration payload shapes

pub mod instance;
pub mod service;

pub use instance::Instance;
pub use service::{RegistrationPayload, ServiceKey, KEY_SEPARATOR};
