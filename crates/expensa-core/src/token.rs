//! Bearer token codec.
//!
//! Token = base64(JSON `{"userId", "username", "timestamp"}`).
//!
//! Tokens are NOT signed: anyone able to produce the JSON can forge one. The only
//! invalidation is age, measured against `timestamp` with no clock-skew tolerance.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use thiserror::Error;

use crate::models::IdentityClaim;

/// Seven days, in milliseconds.
pub const DEFAULT_TOKEN_TTL_MS: u64 = 7 * 24 * 60 * 60 * 1000;

const BEARER_PREFIX: &str = "Bearer ";

/// Standard alphabet that accepts input with or without `=` padding.
const LENIENT_STANDARD: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Why a token did not yield a claim.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenRejection {
    #[error("Token is not valid base64: {0}")]
    Encoding(String),

    #[error("Token payload is not a valid identity claim: {0}")]
    Payload(String),

    #[error("Token expired: issued {age_ms} ms ago (max {ttl_ms} ms)")]
    Expired { age_ms: u64, ttl_ms: u64 },
}

/// Encodes identity claims into opaque tokens and decodes them back.
#[derive(Debug, Clone, Copy)]
pub struct TokenCodec {
    ttl_ms: u64,
}

impl Default for TokenCodec {
    fn default() -> Self {
        Self {
            ttl_ms: DEFAULT_TOKEN_TTL_MS,
        }
    }
}

impl TokenCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl_ms: u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX),
        }
    }

    pub fn ttl_ms(&self) -> u64 {
        self.ttl_ms
    }

    pub fn encode(&self, claim: &IdentityClaim) -> Result<String, serde_json::Error> {
        let json = serde_json::to_vec(claim)?;
        Ok(STANDARD.encode(json))
    }

    /// Build a claim stamped with the current time and encode it.
    pub fn issue(
        &self,
        subject_id: &str,
        display_name: &str,
    ) -> Result<String, serde_json::Error> {
        self.encode(&IdentityClaim::new(subject_id, display_name, now_epoch_ms()))
    }

    pub fn decode(&self, token: &str) -> Result<IdentityClaim, TokenRejection> {
        self.decode_at(token, now_epoch_ms())
    }

    /// Decode `token` as if the current time were `now_ms`.
    pub fn decode_at(&self, token: &str, now_ms: u64) -> Result<IdentityClaim, TokenRejection> {
        let raw = LENIENT_STANDARD
            .decode(token.trim())
            .map_err(|e| TokenRejection::Encoding(e.to_string()))?;

        let claim: IdentityClaim =
            serde_json::from_slice(&raw).map_err(|e| TokenRejection::Payload(e.to_string()))?;

        // Future timestamps have a negative age and are accepted.
        let age_ms = now_ms.saturating_sub(claim.issued_at_epoch_ms);
        if age_ms > self.ttl_ms {
            return Err(TokenRejection::Expired {
                age_ms,
                ttl_ms: self.ttl_ms,
            });
        }

        Ok(claim)
    }

    /// Fail-closed variant of [`decode`](Self::decode).
    pub fn verify(&self, token: &str) -> Option<IdentityClaim> {
        self.decode(token).ok()
    }

    /// Resolve the claim carried by an `Authorization` header value.
    ///
    /// A missing header yields `None`. A leading `Bearer ` is stripped when
    /// present; otherwise the whole value is treated as the token.
    pub fn from_authorization(&self, header: Option<&str>) -> Option<IdentityClaim> {
        self.from_authorization_at(header, now_epoch_ms())
    }

    pub fn from_authorization_at(
        &self,
        header: Option<&str>,
        now_ms: u64,
    ) -> Option<IdentityClaim> {
        let value = header?;
        let token = value.strip_prefix(BEARER_PREFIX).unwrap_or(value);
        self.decode_at(token, now_ms).ok()
    }
}

pub fn now_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or_default()
}
