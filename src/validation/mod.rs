//! Credential validation
//!
//! Turns the raw provider credential into a validated [`crate::models::AuthResult`]
//! and classifies provider-side failure codes.

pub mod credential;

pub use credential::{CredentialValidator, ValidationError};
