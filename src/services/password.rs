// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Password hashing with PBKDF2-HMAC-SHA256.
//!
//! Stored format: `pbkdf2-sha256$<iterations>$<salt b64>$<hash b64>`.

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use ring::rand::{SecureRandom, SystemRandom};
use ring::{digest, pbkdf2};
use std::num::NonZeroU32;
use std::sync::OnceLock;

use crate::error::AppError;

const SCHEME: &str = "pbkdf2-sha256";
const ITERATIONS: u32 = 100_000;
const SALT_LEN: usize = 16;
const HASH_LEN: usize = digest::SHA256_OUTPUT_LEN;

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 128;

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Password must be at least 8 characters long")]
    TooShort,
    #[error("Password must be no more than 128 characters long")]
    TooLong,
    #[error("Failed to generate salt")]
    Rng,
}

/// Reject passwords outside the allowed length range.
pub fn validate_password_strength(password: &str) -> Result<(), PasswordError> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LEN {
        return Err(PasswordError::TooShort);
    }
    if len > MAX_PASSWORD_LEN {
        return Err(PasswordError::TooLong);
    }
    Ok(())
}

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let mut salt = [0u8; SALT_LEN];
    SystemRandom::new()
        .fill(&mut salt)
        .map_err(|_| PasswordError::Rng)?;

    Ok(hash_with(password, &salt, ITERATIONS))
}

fn hash_with(password: &str, salt: &[u8], iterations: u32) -> String {
    let mut out = [0u8; HASH_LEN];
    let rounds = NonZeroU32::new(iterations).unwrap_or(NonZeroU32::MIN);
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        rounds,
        salt,
        password.as_bytes(),
        &mut out,
    );

    format!(
        "{}${}${}${}",
        SCHEME,
        iterations,
        STANDARD_NO_PAD.encode(salt),
        STANDARD_NO_PAD.encode(out)
    )
}

/// Check a password against a stored hash.
///
/// Malformed hashes never verify. Comparison is constant-time.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let parts: Vec<&str> = stored.split('$').collect();
    let [scheme, iterations, salt, hash] = parts.as_slice() else {
        return false;
    };
    if *scheme != SCHEME {
        return false;
    }

    let Some(rounds) = iterations.parse::<u32>().ok().and_then(NonZeroU32::new) else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (STANDARD_NO_PAD.decode(salt), STANDARD_NO_PAD.decode(hash))
    else {
        return false;
    };

    pbkdf2::verify(
        pbkdf2::PBKDF2_HMAC_SHA256,
        rounds,
        &salt,
        password.as_bytes(),
        &expected,
    )
    .is_ok()
}

/// Hash used for logins with an unknown email. Same scheme and cost as
/// real hashes.
fn dummy_hash() -> &'static str {
    static DUMMY: OnceLock<String> = OnceLock::new();
    DUMMY.get_or_init(|| hash_with("unused-dummy-password", &[0u8; SALT_LEN], ITERATIONS))
}

async fn run_blocking<T, F>(work: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password task failed: {}", e)))
}

/// [`hash_password`] on the blocking thread pool.
pub async fn hash_password_blocking(password: String) -> Result<String, AppError> {
    Ok(run_blocking(move || hash_password(&password)).await??)
}

/// [`verify_password`] on the blocking thread pool.
pub async fn verify_password_blocking(password: String, stored: String) -> Result<bool, AppError> {
    run_blocking(move || verify_password(&password, &stored)).await
}

/// Check a login attempt on the blocking thread pool.
///
/// Without a stored hash (unknown email) the password is still run through
/// PBKDF2 against a dummy hash and the attempt fails.
pub async fn verify_login(password: String, stored: Option<String>) -> Result<bool, AppError> {
    run_blocking(move || match stored {
        Some(hash) => verify_password(&password, &hash),
        None => {
            let _ = verify_password(&password, dummy_hash());
            false
        }
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(hash.starts_with("pbkdf2-sha256$100000$"));
        assert!(verify_password("correct horse battery", &hash));
        assert!(!verify_password("wrong password", &hash));
    }

    #[test]
    fn test_same_password_gets_different_salts() {
        let a = hash_password("samesame1").unwrap();
        let b = hash_password("samesame1").unwrap();
        assert_ne!(a, b);
        assert!(verify_password("samesame1", &a));
        assert!(verify_password("samesame1", &b));
    }

    #[test]
    fn test_malformed_hash_never_verifies() {
        assert!(!verify_password("anything", ""));
        assert!(!verify_password("anything", "bcrypt$10$abc$def"));
        assert!(!verify_password("anything", "pbkdf2-sha256$0$AAAA$AAAA"));
        assert!(!verify_password("anything", "pbkdf2-sha256$1000$!!!$AAAA"));
    }

    #[test]
    fn test_dummy_hash_costs_the_same() {
        let dummy = dummy_hash();
        assert!(dummy.starts_with(&format!("{}${}$", SCHEME, ITERATIONS)));
        assert_eq!(dummy.split('$').count(), 4);
        // Stable across calls
        assert_eq!(dummy, dummy_hash());
    }

    #[tokio::test]
    async fn test_verify_login() {
        let hash = hash_password_blocking("letmein123".to_string()).await.unwrap();

        assert!(verify_login("letmein123".to_string(), Some(hash.clone()))
            .await
            .unwrap());
        assert!(!verify_login("wrong".to_string(), Some(hash)).await.unwrap());
        // Unknown account: never verifies, even with the dummy password
        assert!(!verify_login("unused-dummy-password".to_string(), None)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_blocking_helpers_match_sync_versions() {
        let hash = hash_password_blocking("samesame1".to_string()).await.unwrap();
        assert!(verify_password("samesame1", &hash));
        assert!(verify_password_blocking("samesame1".to_string(), hash.clone())
            .await
            .unwrap());
        assert!(!verify_password_blocking("other".to_string(), hash)
            .await
            .unwrap());
    }

    #[test]
    fn test_strength_bounds() {
        assert!(matches!(
            validate_password_strength("short"),
            Err(PasswordError::TooShort)
        ));
        assert!(validate_password_strength("longenough").is_ok());
        assert!(matches!(
            validate_password_strength(&"x".repeat(129)),
            Err(PasswordError::TooLong)
        ));
    }
}
