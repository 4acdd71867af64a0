//! Human-readable access codes for collections.
//!
//! Codes are drawn from uppercase ASCII letters and digits with the visually
//! ambiguous `0`, `O`, `1` and `I` removed (lowercase `l` never appears since codes are
//! uppercase). That leaves 32 symbols, so a 6-character code has
//! 32^6 = 1,073,741,824 possible values.

use std::fmt::Display;
use std::future::Future;

use rand::Rng;
use thiserror::Error;
use tracing::warn;

/// The 32 symbols a code may contain.
pub const ALPHABET: &[u8; 32] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Length of every collection code.
pub const CODE_LENGTH: usize = 6;

/// Default number of attempts before `generate_unique` gives up.
pub const DEFAULT_MAX_RETRIES: u32 = 10;

/// Total number of distinct codes of `CODE_LENGTH` characters.
pub const TOTAL_COMBINATIONS: u64 = (ALPHABET.len() as u64).pow(CODE_LENGTH as u32);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodeError {
    #[error("failed to generate a unique code after {attempts} attempts")]
    GenerationExhausted { attempts: u32 },
}

/// Draw `length` characters uniformly from [`ALPHABET`].
///
/// Uses the thread-local CSPRNG, so codes are not predictable from earlier ones.
pub fn generate(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Generate codes until `exists` reports one as free.
///
/// A failed check counts as "exists". Every attempt, collision or failure,
/// consumes one of `max_retries`.
pub async fn generate_unique<F, Fut, E>(
    mut exists: F,
    length: usize,
    max_retries: u32,
) -> Result<String, CodeError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<bool, E>>,
    E: Display,
{
    for attempt in 1..=max_retries {
        let candidate = generate(length);
        match exists(candidate.clone()).await {
            Ok(false) => return Ok(candidate),
            Ok(true) => {
                tracing::debug!(attempt, "Access code collision, retrying");
            }
            Err(e) => {
                warn!(attempt, error = %e, "Access code existence check failed, retrying");
            }
        }
    }

    Err(CodeError::GenerationExhausted {
        attempts: max_retries,
    })
}

/// Trim and uppercase a user-supplied code.
pub fn normalize(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Whether `code` is exactly `CODE_LENGTH` alphabet characters, ignoring case.
pub fn is_valid_format(code: &str) -> bool {
    code.chars().count() == CODE_LENGTH
        && code.chars().all(|c| {
            c.is_ascii() && ALPHABET.contains(&(c.to_ascii_uppercase() as u8))
        })
}
