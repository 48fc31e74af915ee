// Cryptographic utilities for generating sign-in nonces and their challenge digests

use rand::rngs::OsRng;
use rand::TryRngCore;
use sha2::{Digest, Sha256};
use std::fmt;
use std::num::NonZeroUsize;

/// Default nonce length in characters
pub const DEFAULT_NONCE_LENGTH: usize = 32;

/// Minimum nonce length accepted by configuration
pub const MIN_NONCE_LENGTH: usize = 32;

/// Alphabet nonces are drawn from: the 66 unreserved URI characters
pub const NONCE_CHARSET: &[u8; 66] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz-._~";

/// Single-use random value bound to one handshake attempt.
///
/// The raw value travels to the backend exchange only. `Debug` never prints it.
#[derive(Clone, PartialEq, Eq)]
pub struct Nonce(String);

impl Nonce {
    /// Raw nonce text, for the backend exchange step
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of characters in the nonce
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Nonce(<redacted, {} chars>)", self.0.len())
    }
}

/// SHA-256 hex digest of a [`Nonce`], sent to the identity provider as the challenge
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonceDigest(String);

impl NonceDigest {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix suitable for log correlation
    #[must_use]
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for NonceDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Generate a cryptographically secure nonce of `length` characters
///
/// Each random byte from the OS source is mapped into [`NONCE_CHARSET`] by
/// modulo reduction. The slight bias toward the first characters is accepted.
///
/// # Panics
///
/// Panics if the operating system's secure random source is unavailable.
/// This is an unrecoverable environment fault.
#[must_use]
pub fn generate_nonce(length: NonZeroUsize) -> Nonce {
    let mut random = vec![0u8; length.get()];
    if let Err(e) = OsRng.try_fill_bytes(&mut random) {
        log::error!("Secure random source unavailable: {e}");
        panic!("unable to generate nonce: secure random source unavailable: {e}");
    }

    let nonce = random
        .iter()
        .map(|byte| char::from(NONCE_CHARSET[usize::from(*byte) % NONCE_CHARSET.len()]))
        .collect();

    Nonce(nonce)
}

/// Hash a nonce with SHA-256 and hex-encode the result
#[must_use]
pub fn digest_nonce(nonce: &Nonce) -> NonceDigest {
    let mut hasher = Sha256::new();
    hasher.update(nonce.0.as_bytes());
    NonceDigest(format!("{:x}", hasher.finalize()))
}

/// Nonce generator bound to a configured length
#[derive(Debug, Clone, Copy)]
pub struct NonceGenerator {
    length: NonZeroUsize,
}

impl NonceGenerator {
    #[must_use]
    pub const fn new(length: NonZeroUsize) -> Self {
        Self { length }
    }

    /// Build a generator from a configured length, falling back to the default for zero
    #[must_use]
    pub fn with_length(length: usize) -> Self {
        NonZeroUsize::new(length).map_or_else(Self::default, Self::new)
    }

    #[must_use]
    pub const fn length(&self) -> usize {
        self.length.get()
    }

    /// Produce a fresh nonce and its challenge digest
    #[must_use]
    pub fn issue(&self) -> (Nonce, NonceDigest) {
        let nonce = generate_nonce(self.length);
        let digest = digest_nonce(&nonce);
        (nonce, digest)
    }
}

impl Default for NonceGenerator {
    fn default() -> Self {
        Self::with_length(DEFAULT_NONCE_LENGTH)
    }
}

#[cfg(test)]
pub(crate) fn nonce_from_str(value: &str) -> Nonce {
    Nonce(value.to_string())
}
