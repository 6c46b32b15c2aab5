// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! Identity primitives: short-lived signed access tokens, rotating
//! refresh tokens (stored hashed, single-use) and password hashing.

use anyhow::{Context, Result, anyhow};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Access tokens live 15 minutes.
const ACCESS_TOKEN_TTL_SECS: i64 = 15 * 60;

/// Refresh tokens live 7 days.
const REFRESH_TOKEN_TTL_DAYS: i64 = 7;

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

lazy_static::lazy_static! {
    static ref KEYS: Keys = {
        let secret = crate::config::access_token_secret();
        Keys {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    };
}

#[derive(Serialize, Deserialize, Debug)]
struct Claims {
    sub: i64,
    iat: i64,
    exp: i64,
}

/// Signs a stateless access token for the given user id.
pub fn sign_access_token(user_id: i64) -> Result<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        iat: now.timestamp(),
        exp: (now + Duration::seconds(ACCESS_TOKEN_TTL_SECS)).timestamp(),
    };
    encode(&Header::default(), &claims, &KEYS.encoding).context("Failed to sign access token")
}

/// Verifies signature and expiry. Any decode failure means the token is
/// invalid; no distinction is surfaced to the caller.
pub fn verify_access_token(token: &str) -> Option<i64> {
    decode::<Claims>(token, &KEYS.decoding, &Validation::default())
        .ok()
        .map(|data| data.claims.sub)
}

/// A freshly minted refresh token. `raw` goes to the client once and is
/// never stored; only `hashed` is persisted.
pub struct IssuedRefreshToken {
    pub raw: String,
    pub hashed: String,
    pub expires_at: DateTime<Utc>,
}

/// 32 random bytes, hex-encoded, hashed with SHA-256 for storage.
pub fn generate_refresh_token() -> IssuedRefreshToken {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    let raw = hex::encode(bytes);
    let hashed = hash_refresh_token(&raw);
    IssuedRefreshToken {
        raw,
        hashed,
        expires_at: Utc::now() + Duration::days(REFRESH_TOKEN_TTL_DAYS),
    }
}

pub fn hash_refresh_token(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow!("Failed to hash password: {e}"))
}

/// Returns false for a wrong password *or* an unparseable stored hash;
/// login treats both as invalid credentials.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_token_round_trip() {
        let token = sign_access_token(42).unwrap();
        assert_eq!(verify_access_token(&token), Some(42));
    }

    #[test]
    fn tampered_access_token_is_rejected() {
        let token = sign_access_token(42).unwrap();
        let mut tampered = token.clone();
        tampered.pop();
        tampered.push('A');
        assert_eq!(verify_access_token(&tampered), None);
        assert_eq!(verify_access_token("not-a-jwt"), None);
        assert_eq!(verify_access_token(""), None);
    }

    #[test]
    fn refresh_token_is_stored_hashed() {
        let issued = generate_refresh_token();
        // 32 bytes -> 64 hex chars of raw token, 64 hex chars of digest.
        assert_eq!(issued.raw.len(), 64);
        assert_eq!(issued.hashed.len(), 64);
        assert_ne!(issued.raw, issued.hashed);
        assert_eq!(hash_refresh_token(&issued.raw), issued.hashed);
        assert!(issued.expires_at > Utc::now() + Duration::days(6));
    }

    #[test]
    fn refresh_tokens_are_unique() {
        let a = generate_refresh_token();
        let b = generate_refresh_token();
        assert_ne!(a.raw, b.raw);
    }

    #[test]
    fn password_hash_and_verify() {
        let hash = hash_password("Test123!").unwrap();
        assert!(verify_password("Test123!", &hash));
        assert!(!verify_password("wrong-password", &hash));
        assert!(!verify_password("Test123!", "not-a-phc-string"));
    }
}
