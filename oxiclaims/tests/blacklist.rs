#![allow(clippy::unwrap_used)]
use std::sync::Mutex;

use oxiclaims::{
    Payload,
    blacklist::{
        Blacklist,
        Storage,
    },
    claims::{
        Claim,
        ClaimSet,
    },
    error::BlacklistError,
    time::FixedClock,
    validation::PayloadValidator,
};
use serde_json::{
    Value,
    json,
};
use thiserror::Error;

const NOW: i64 = 1_700_000_000;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("storage unavailable")]
struct Unavailable;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Get(String),
    Add(String, Value, u64),
    Forever(String, Value),
    Destroy(String),
    Flush,
}

/// Storage double that answers every `get` with a canned record and logs
/// each call it receives.
#[derive(Default)]
struct RecordingStorage {
    record: Option<Value>,
    destroyed: bool,
    failing: bool,
    calls: Mutex<Vec<Call>>,
}
impl RecordingStorage {
    fn returning(record: Value) -> Self {
        Self {
            record: Some(record),
            ..Self::default()
        }
    }

    fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    fn log(&self, call: Call) -> Result<(), Unavailable> {
        self.calls.lock().unwrap().push(call);
        if self.failing { Err(Unavailable) } else { Ok(()) }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}
impl Storage for RecordingStorage {
    type Error = Unavailable;

    fn get(&self, key: &str) -> Result<Option<Value>, Unavailable> {
        self.log(Call::Get(key.into()))?;
        Ok(self.record.clone())
    }

    fn add(&self, key: &str, value: Value, ttl: u64) -> Result<(), Unavailable> {
        self.log(Call::Add(key.into(), value, ttl))
    }

    fn forever(&self, key: &str, value: Value) -> Result<(), Unavailable> {
        self.log(Call::Forever(key.into(), value))
    }

    fn destroy(&self, key: &str) -> Result<bool, Unavailable> {
        self.log(Call::Destroy(key.into()))?;
        Ok(self.destroyed)
    }

    fn flush(&self) -> Result<(), Unavailable> {
        self.log(Call::Flush)
    }
}

fn payload(jti: &str, exp: Option<i64>) -> Payload {
    let mut claims = ClaimSet::new()
        .with(Claim::subject(1))
        .with(Claim::issuer("http://example.com"))
        .with(Claim::not_before(NOW))
        .with(Claim::issued_at(NOW))
        .with(Claim::jwt_id(jti));
    let mut required = vec!["sub", "iss", "nbf", "iat", "jti"];
    if let Some(exp) = exp {
        claims = claims.with(Claim::expiration(exp));
        required.push("exp");
    }

    let validator = PayloadValidator::builder()
        .with_required_claims(required)
        .with_clock(FixedClock::new(NOW))
        .build();
    Payload::new(claims, &validator, false).unwrap()
}

fn blacklist_over(storage: RecordingStorage) -> Blacklist<RecordingStorage> {
    Blacklist::new(storage).with_clock(FixedClock::new(NOW))
}

#[test]
fn add_writes_grace_entry_with_refresh_ttl() {
    let mut blacklist = blacklist_over(RecordingStorage::default());
    blacklist.set_grace_period(0).set_refresh_ttl(1_209_660);

    assert!(blacklist.add(&payload("foo", Some(NOW + 3600))).unwrap());
    assert_eq!(
        blacklist.storage().calls(),
        [
            Call::Get("foo".into()),
            Call::Add("foo".into(), json!({"valid_until": NOW}), 1_209_720),
        ]
    );
}

#[test]
fn add_offsets_valid_until_by_grace_period() {
    let mut blacklist = blacklist_over(RecordingStorage::default());
    blacklist.set_grace_period(45).set_ttl_buffer(0);

    assert!(blacklist.add(&payload("foo", Some(NOW + 3600))).unwrap());
    assert_eq!(
        blacklist.storage().calls()[1],
        Call::Add("foo".into(), json!({"valid_until": NOW + 45}), 1_209_600)
    );
}

#[test]
fn add_without_exp_is_forever() {
    let blacklist = blacklist_over(RecordingStorage::default());

    assert!(blacklist.add(&payload("foo", None)).unwrap());
    assert_eq!(
        blacklist.storage().calls(),
        [
            Call::Get("foo".into()),
            Call::Forever("foo".into(), json!("forever")),
        ]
    );
}

#[test]
fn add_is_idempotent_for_active_entries() {
    for record in [
        json!("forever"),
        json!({"valid_until": NOW}),
        json!({"valid_until": NOW - 1}),
    ] {
        let blacklist = blacklist_over(RecordingStorage::returning(record.clone()));
        assert!(blacklist.add(&payload("foo", Some(NOW + 3600))).unwrap());
        assert_eq!(
            blacklist.storage().calls(),
            [Call::Get("foo".into())],
            "{record}"
        );
    }
}

#[test]
fn add_leaves_pending_entries_untouched() {
    let mut blacklist = blacklist_over(RecordingStorage::returning(
        json!({"valid_until": NOW + 60}),
    ));
    blacklist.set_grace_period(10);

    assert!(blacklist.add(&payload("foo", Some(NOW + 3600))).unwrap());
    assert_eq!(blacklist.storage().calls(), [Call::Get("foo".into())]);
}

#[test]
fn add_replaces_unrecognized_records() {
    for record in [json!(null), json!(0), json!("never")] {
        let blacklist = blacklist_over(RecordingStorage::returning(record.clone()));
        assert!(blacklist.add(&payload("foo", None)).unwrap());
        assert_eq!(
            blacklist.storage().calls(),
            [
                Call::Get("foo".into()),
                Call::Forever("foo".into(), json!("forever")),
            ],
            "{record}"
        );
    }
}

#[test]
fn has_is_false_for_blank_records() {
    for record in [json!(null), json!(0), json!(""), json!([])] {
        let blacklist = blacklist_over(RecordingStorage::returning(record.clone()));
        assert!(!blacklist.has(&payload("foobar", None)).unwrap(), "{record}");
    }
    let blacklist = blacklist_over(RecordingStorage::default());
    assert!(!blacklist.has(&payload("foobar", None)).unwrap());
}

#[test]
fn has_is_true_for_forever() {
    let blacklist = blacklist_over(RecordingStorage::returning(json!("forever")));
    assert!(blacklist.has(&payload("foobar", None)).unwrap());
    assert_eq!(blacklist.storage().calls(), [Call::Get("foobar".into())]);
}

#[test]
fn has_respects_grace_window() {
    let blacklist = blacklist_over(RecordingStorage::returning(json!({"valid_until": NOW})));
    assert!(blacklist.has(&payload("foobar", Some(NOW + 3600))).unwrap());

    let blacklist = blacklist_over(RecordingStorage::returning(
        json!({"valid_until": NOW + 86_400}),
    ));
    assert!(!blacklist.has(&payload("foobar", Some(NOW + 3600))).unwrap());
}

#[test]
fn has_is_false_for_unknown_shapes() {
    for record in [json!("never"), json!({"until": NOW}), json!(42), json!(true)] {
        let blacklist = blacklist_over(RecordingStorage::returning(record.clone()));
        assert!(!blacklist.has(&payload("foobar", None)).unwrap(), "{record}");
    }
}

#[test]
fn custom_key_claim() {
    let mut blacklist = blacklist_over(RecordingStorage::returning(json!("forever")));
    blacklist.set_key("sub");
    let payload = payload("foobar", None);

    assert_eq!(blacklist.key_name(), "sub");
    assert_eq!(blacklist.get_key(&payload).unwrap(), &json!(1));
    assert!(blacklist.has(&payload).unwrap());
    assert!(blacklist.add(&payload).unwrap());
    assert_eq!(
        blacklist.storage().calls(),
        [Call::Get("1".into()), Call::Get("1".into())]
    );
}

#[test]
fn remove_returns_destroy_result() {
    let storage = RecordingStorage {
        destroyed: true,
        ..RecordingStorage::default()
    };
    let blacklist = blacklist_over(storage);
    assert!(blacklist.remove(&payload("foobar", None)).unwrap());
    assert_eq!(blacklist.storage().calls(), [Call::Destroy("foobar".into())]);

    let blacklist = blacklist_over(RecordingStorage::default());
    assert!(!blacklist.remove(&payload("foobar", None)).unwrap());
}

#[test]
fn clear_flushes() {
    let blacklist = blacklist_over(RecordingStorage::default());
    assert!(blacklist.clear().unwrap());
    assert_eq!(blacklist.storage().calls(), [Call::Flush]);
}

#[test]
fn default_add_if_absent_reads_then_writes() {
    let blacklist = blacklist_over(RecordingStorage::default());
    assert!(blacklist.add_if_absent(&payload("foo", None)).unwrap());
    assert_eq!(
        blacklist.storage().calls(),
        [
            Call::Get("foo".into()),
            Call::Forever("foo".into(), json!("forever")),
        ]
    );

    for record in [json!({"valid_until": NOW + 60}), json!(0)] {
        let blacklist = blacklist_over(RecordingStorage::returning(record.clone()));
        assert!(
            !blacklist
                .add_if_absent(&payload("foo", Some(NOW + 3600)))
                .unwrap()
        );
        assert_eq!(
            blacklist.storage().calls(),
            [Call::Get("foo".into())],
            "{record}"
        );
    }
}

#[test]
fn storage_errors_propagate() {
    let blacklist = blacklist_over(RecordingStorage::failing());
    let payload = payload("foo", Some(NOW + 3600));

    assert_eq!(
        blacklist.add(&payload).unwrap_err(),
        BlacklistError::Storage(Unavailable)
    );
    assert_eq!(
        blacklist.has(&payload).unwrap_err(),
        BlacklistError::Storage(Unavailable)
    );
    assert_eq!(
        blacklist.remove(&payload).unwrap_err(),
        BlacklistError::Storage(Unavailable)
    );
    assert_eq!(
        blacklist.clear().unwrap_err(),
        BlacklistError::Storage(Unavailable)
    );
    // a failed read never falls through to a write
    assert_eq!(
        blacklist.storage().calls().first(),
        Some(&Call::Get("foo".into()))
    );
    assert!(
        !blacklist
            .storage()
            .calls()
            .iter()
            .any(|call| matches!(call, Call::Add(..)))
    );
}

#[test]
fn missing_key_claim_never_touches_storage() {
    let mut blacklist = blacklist_over(RecordingStorage::default());
    blacklist.set_key("sid");

    assert_eq!(
        blacklist.add(&payload("foo", None)).unwrap_err(),
        BlacklistError::MissingKey("sid".into())
    );
    assert!(blacklist.storage().calls().is_empty());
}
