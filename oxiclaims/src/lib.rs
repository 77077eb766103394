#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![doc = include_str!("../README.md")]

/// Token revocation with grace periods, over pluggable storage.
pub mod blacklist;

/// Claim types, claim sets, and accessor traits for RFC 7519
/// registered claims.
pub mod claims;

/// Deserializable settings for validation and the blacklist.
pub mod config;

/// Error enums
pub mod error;

/// Clock abstraction shared by validation and the blacklist.
pub mod time;

/// Functions and traits supporting claim validation.
pub mod validation;

pub use payload::Payload;

mod payload;

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use crate::{
        Payload,
        blacklist::{
            Blacklist,
            MemoryStorage,
        },
        claims::ClaimSet,
        error::ValidationError,
        time::FixedClock,
        validation::PayloadValidator,
    };

    const NOW: i64 = 1_700_000_000;

    fn decoded_claims(exp: i64) -> ClaimSet {
        serde_json::from_value(json!({
            "sub": 1,
            "iss": "http://example.com",
            "exp": exp,
            "nbf": NOW,
            "iat": NOW,
            "jti": "foo",
        }))
        .unwrap()
    }

    #[test]
    fn validate_then_revoke() {
        let clock = Arc::new(FixedClock::new(NOW));
        let validator = PayloadValidator::builder()
            .with_clock(clock.clone())
            .build();
        let blacklist = Blacklist::new(MemoryStorage::new().with_clock(clock.clone()))
            .with_clock(clock.clone());

        let payload = Payload::new(decoded_claims(NOW + 3600), &validator, false).unwrap();
        assert!(!blacklist.has(&payload).unwrap());
        assert!(blacklist.add(&payload).unwrap());
        assert!(blacklist.has(&payload).unwrap());
    }

    #[test]
    fn expired_tokens_can_still_be_revoked() {
        let clock = Arc::new(FixedClock::new(NOW));
        let validator = PayloadValidator::builder()
            .with_clock(clock.clone())
            .build();
        let blacklist = Blacklist::new(MemoryStorage::new().with_clock(clock.clone()))
            .with_clock(clock.clone());

        clock.advance(7200);
        let err = Payload::new(decoded_claims(NOW + 3600), &validator, false).unwrap_err();
        assert_eq!(err, ValidationError::TokenExpired);

        let payload = Payload::new(decoded_claims(NOW + 3600), &validator, true).unwrap();
        assert!(blacklist.add(&payload).unwrap());
        assert!(blacklist.has(&payload).unwrap());
    }
}
