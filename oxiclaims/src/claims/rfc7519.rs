//! Traits representing full list of JWT Claims registered in RFC 7519
use serde_json::Value;

use crate::claims::{
    ClaimKind,
    ClaimSet,
};

/// `iss` (Issuer) Claim
///
/// Ref: [RFC 7519 4.1.1](<https://datatracker.ietf.org/doc/html/rfc7519#section-4.1.1>)
pub trait Iss {
    /// Return `iss` (Issuer) claim, if present and a string
    fn iss(&self) -> Option<&str>;
}

/// `sub` (Subject) Claim
///
/// Ref: [RFC 7519 4.1.2](<https://datatracker.ietf.org/doc/html/rfc7519#section-4.1.2>)
pub trait Sub {
    /// Return `sub` (Subject) claim. Subjects may be strings or integers.
    fn sub(&self) -> Option<&Value>;
}

/// `aud` (Audience) Claim
///
/// Ref: [RFC 7519 4.1.3](<https://datatracker.ietf.org/doc/html/rfc7519#section-4.1.3>)
pub trait Aud {
    /// Return `aud` (Audience) claim; a single audience yields one item
    fn aud(&self) -> impl Iterator<Item = &str>;
}

/// `exp` (Expiration Time) Claim
///
/// Ref: [RFC 7519 4.1.4](<https://datatracker.ietf.org/doc/html/rfc7519#section-4.1.4>)
pub trait Exp {
    /// Return `exp` (Expiration Time) claim, if present and an integer
    fn exp(&self) -> Option<i64>;
}

/// `nbf` (Not Before) Claim
///
/// Ref: [RFC 7519 4.1.5](<https://datatracker.ietf.org/doc/html/rfc7519#section-4.1.5>)
pub trait Nbf {
    /// Return `nbf` (Not Before) claim, if present and an integer
    fn nbf(&self) -> Option<i64>;
}

/// `iat` (Issued At) Claim
///
/// Ref: [RFC 7519 4.1.6](<https://datatracker.ietf.org/doc/html/rfc7519#section-4.1.6>)
pub trait Iat {
    /// Return `iat` (Issued At) claim, if present and an integer
    fn iat(&self) -> Option<i64>;
}

/// `jti` (JWT ID) Claim
///
/// Ref: [RFC 7519 4.1.7](<https://datatracker.ietf.org/doc/html/rfc7519#section-4.1.7>)
pub trait Jti {
    /// Return `jti` (JWT ID) claim, if present and a string
    fn jti(&self) -> Option<&str>;
}

impl Iss for ClaimSet {
    fn iss(&self) -> Option<&str> {
        self.value(&ClaimKind::Issuer).and_then(Value::as_str)
    }
}

impl Sub for ClaimSet {
    fn sub(&self) -> Option<&Value> {
        self.value(&ClaimKind::Subject)
    }
}

impl Aud for ClaimSet {
    fn aud(&self) -> impl Iterator<Item = &str> {
        let audiences: &[Value] = match self.value(&ClaimKind::Audience) {
            Some(Value::Array(audiences)) => audiences.as_slice(),
            Some(aud @ Value::String(_)) => std::slice::from_ref(aud),
            _ => &[],
        };
        audiences.iter().filter_map(Value::as_str)
    }
}

impl Exp for ClaimSet {
    fn exp(&self) -> Option<i64> {
        self.value(&ClaimKind::Expiration).and_then(Value::as_i64)
    }
}

impl Nbf for ClaimSet {
    fn nbf(&self) -> Option<i64> {
        self.value(&ClaimKind::NotBefore).and_then(Value::as_i64)
    }
}

impl Iat for ClaimSet {
    fn iat(&self) -> Option<i64> {
        self.value(&ClaimKind::IssuedAt).and_then(Value::as_i64)
    }
}

impl Jti for ClaimSet {
    fn jti(&self) -> Option<&str> {
        self.value(&ClaimKind::JwtId).and_then(Value::as_str)
    }
}
