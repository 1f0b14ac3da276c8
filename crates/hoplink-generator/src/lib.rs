//! Short-code generation for the Hoplink URL shortener.
//!
//! Codes are drawn uniformly from a 62-symbol alphanumeric alphabet
//! using the operating system's CSPRNG. Generation is stateless;
//! collisions are expected at low probability and handled by the
//! caller's bounded retry, not here.

use hoplink_core::ShortCode;
use rand::rngs::OsRng;
use rand::Rng;
use thiserror::Error;

/// The 62-symbol alphabet: upper, lower, digits.
pub const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Default length of generated short codes.
pub const DEFAULT_LENGTH: usize = 8;

/// Minimum accepted length of generated short codes.
pub const MIN_LENGTH: usize = 4;

#[derive(Debug, Clone, Error)]
pub enum GeneratorError {
    #[error("short code length must be at least {min}, got {length}")]
    InvalidLength { length: usize, min: usize },
}

/// Generates a random short code of the given length.
///
/// Fails with [`GeneratorError::InvalidLength`] for lengths below
/// [`MIN_LENGTH`]. Pure function of the length: no state is kept between
/// calls.
pub fn generate_code(length: usize) -> Result<String, GeneratorError> {
    if length < MIN_LENGTH {
        return Err(GeneratorError::InvalidLength {
            length,
            min: MIN_LENGTH,
        });
    }

    let mut rng = OsRng;
    let code = (0..length)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    Ok(code)
}

/// Trait for generating short codes.
///
/// Implementations are pure generators that don't interact with storage.
/// Generated codes are not guaranteed unique; the shortening service
/// checks the store and retries a bounded number of times.
pub trait CodeGenerator: Send + Sync + 'static {
    /// Generates a fresh candidate short code.
    fn generate(&self) -> ShortCode;
}

/// A [`CodeGenerator`] producing random alphanumeric codes of a fixed,
/// validated length.
#[derive(Debug, Clone, Copy)]
pub struct RandomGenerator {
    length: usize,
}

impl RandomGenerator {
    /// Creates a generator for codes of the given length.
    pub fn new(length: usize) -> Result<Self, GeneratorError> {
        if length < MIN_LENGTH {
            return Err(GeneratorError::InvalidLength {
                length,
                min: MIN_LENGTH,
            });
        }
        Ok(Self { length })
    }

    /// Returns the configured code length.
    pub fn length(&self) -> usize {
        self.length
    }
}

impl Default for RandomGenerator {
    fn default() -> Self {
        Self {
            length: DEFAULT_LENGTH,
        }
    }
}

impl CodeGenerator for RandomGenerator {
    fn generate(&self) -> ShortCode {
        // `CodeGenerator` is intentionally infallible. The length was
        // validated at construction and the alphabet is a subset of what
        // ShortCode accepts.
        let code = generate_code(self.length).expect("generator length validated at construction");
        ShortCode::new_unchecked(code)
    }
}
