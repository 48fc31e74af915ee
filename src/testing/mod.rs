//! Testing utilities for Belay
//!
//! ## Organization
//!
//! - [`fixtures`] - Pre-built test data (credentials, users, settings, payloads)
//! - [`mock`] - Scripted identity provider and in-memory backend collaborators
//!
//! ## Usage
//!
//! ```rust,ignore
//! use belay::testing::mock::{ScriptedProvider, ScriptedResponse};
//! use belay::testing::TestFixtures;
//!
//! let provider = ScriptedProvider::new();
//! provider.push(ScriptedResponse::Succeed(TestFixtures::credential()));
//! ```

pub mod fixtures;
pub mod mock;

pub use fixtures::TestFixtures;

/// Common test constants
pub mod constants {
    pub const TEST_EMAIL: &str = "jane@belay.app";

    pub const TEST_PASSWORD: &str = "correct horse battery staple";

    pub const TEST_USER_ID: &str = "u1";

    pub const TEST_IDENTITY_TOKEN: &str = "tok123";

    pub const TEST_FIRST_NAME: &str = "Jane";
}
