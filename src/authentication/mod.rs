//! Backend collaborator traits and service wiring
//!
//! The session orchestrator depends on the backend only through the traits in
//! [`traits`]; [`dependency_injection`] assembles the services from settings
//! and host-supplied implementations.

pub mod dependency_injection;
pub mod traits;

pub use dependency_injection::{ConfigurationError, ServiceConfigBuilder, ServiceContainer};
pub use traits::{IdentityExchange, ProfileStore};
