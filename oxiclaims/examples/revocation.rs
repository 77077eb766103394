#![allow(clippy::unwrap_used)]
use std::sync::Arc;

use oxiclaims::{
    Payload,
    blacklist::{
        Blacklist,
        MemoryStorage,
    },
    claims::{
        ClaimSet,
        Jti,
    },
    time::FixedClock,
    validation::PayloadValidator,
};

const NOW: i64 = 1_700_000_000;

// ANCHOR: usage
fn main() {
    let clock = Arc::new(FixedClock::new(NOW));
    let validator = PayloadValidator::builder()
        .with_clock(clock.clone())
        .build();

    // one store shared by every request handler
    let storage = Arc::new(MemoryStorage::new().with_clock(clock.clone()));
    let mut blacklist = Blacklist::new(storage.clone()).with_clock(clock.clone());
    blacklist.set_grace_period(30);

    let claims: ClaimSet = serde_json::from_value(serde_json::json!({
        "iss": "https://auth.example.org",
        "sub": "alice",
        "iat": NOW,
        "nbf": NOW,
        "exp": NOW + 3600,
        "jti": "fake-jti",
    }))
    .unwrap();
    let payload = Payload::new(claims, &validator, false).unwrap();

    // token refreshed: revoke the old one
    assert!(blacklist.add(&payload).unwrap());

    // requests already in flight still pass during the grace period
    assert!(!blacklist.has(&payload).unwrap());

    clock.advance(30);
    assert!(blacklist.has(&payload).unwrap());
    println!("token {} revoked", payload.jti().unwrap());

    // another handle onto the same store sees the revocation
    let other = Blacklist::new(storage).with_clock(clock);
    assert!(other.has(&payload).unwrap());
}
// ANCHOR_END: usage
