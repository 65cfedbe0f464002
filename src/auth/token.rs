//! Bearer tokens of the form `rdesk_<lookup>_<secret>`.
//!
//! The lookup part is stored in clear to find the token row; the whole
//! token is only ever stored as an Argon2id hash.

use std::fmt;

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use rand::Rng;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::Token;

const ARGON2_MEMORY_KIB: u32 = 64 * 1024;
const ARGON2_ITERATIONS: u32 = 1;
const ARGON2_PARALLELISM: u32 = 4;
const ARGON2_OUTPUT_LEN: usize = 32;

const PREFIX: &str = "rdesk_";
const LOOKUP_BYTES: usize = 4;
const SECRET_BYTES: usize = 12;

/// A raw bearer token split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerToken {
    lookup: String,
    secret: String,
}

fn random_hex(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    rand::thread_rng().fill(buf.as_mut_slice());
    hex::encode(buf)
}

fn is_hex_of_len(s: &str, bytes: usize) -> bool {
    s.len() == bytes * 2 && s.bytes().all(|b| b.is_ascii_hexdigit())
}

impl BearerToken {
    fn random() -> Self {
        Self {
            lookup: random_hex(LOOKUP_BYTES),
            secret: random_hex(SECRET_BYTES),
        }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let (lookup, secret) = raw
            .strip_prefix(PREFIX)
            .and_then(|rest| rest.split_once('_'))
            .ok_or(Error::InvalidTokenFormat)?;

        if !is_hex_of_len(lookup, LOOKUP_BYTES) || !is_hex_of_len(secret, SECRET_BYTES) {
            return Err(Error::InvalidTokenFormat);
        }

        Ok(Self {
            lookup: lookup.to_string(),
            secret: secret.to_string(),
        })
    }

    #[must_use]
    pub fn lookup(&self) -> &str {
        &self.lookup
    }
}

impl fmt::Display for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{PREFIX}{}_{}", self.lookup, self.secret)
    }
}

/// Mints token records and checks presented tokens against them.
pub struct TokenIssuer {
    argon2: Argon2<'static>,
}

impl TokenIssuer {
    pub fn new() -> Result<Self> {
        let params = Params::new(
            ARGON2_MEMORY_KIB,
            ARGON2_ITERATIONS,
            ARGON2_PARALLELISM,
            Some(ARGON2_OUTPUT_LEN),
        )
        .map_err(|e| Error::Config(format!("invalid token hashing parameters: {e}")))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Mints a token for `user_id` that expires after `ttl`, or never.
    /// Returns the record to store and the raw token, which is never persisted.
    pub fn issue(&self, user_id: i64, ttl: Option<Duration>) -> Result<(Token, String)> {
        let bearer = BearerToken::random();
        let raw = bearer.to_string();

        let salt = SaltString::generate(&mut OsRng);
        let token_hash = self
            .argon2
            .hash_password(raw.as_bytes(), &salt)
            .map_err(|e| Error::Config(format!("failed to hash token: {e}")))?
            .to_string();

        let now = Utc::now();
        let token = Token {
            id: Uuid::new_v4().to_string(),
            token_hash,
            token_lookup: bearer.lookup,
            user_id,
            created_at: now,
            expires_at: ttl.map(|ttl| now + ttl),
            last_used_at: None,
        };
        Ok((token, raw))
    }

    /// True when `bearer` is the token `token` was issued for.
    pub fn verify(&self, bearer: &BearerToken, token: &Token) -> Result<bool> {
        if bearer.lookup != token.token_lookup {
            return Ok(false);
        }
        let parsed = PasswordHash::new(&token.token_hash)
            .map_err(|e| Error::Config(format!("invalid token hash: {e}")))?;

        match self
            .argon2
            .verify_password(bearer.to_string().as_bytes(), &parsed)
        {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(Error::Config(format!("failed to verify token: {e}"))),
        }
    }
}
