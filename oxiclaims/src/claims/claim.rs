use std::fmt;

use serde_json::Value;

use crate::error::ValidationError;

/// Tag identifying which claim a [`Claim`] carries.
///
/// The registered claims of RFC 7519 get their own variant; anything else is
/// [`ClaimKind::Custom`]. Use [`ClaimKind::from_name`] to map a raw claim name
/// onto its kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ClaimKind {
    /// `sub` (Subject)
    Subject,
    /// `iss` (Issuer)
    Issuer,
    /// `aud` (Audience)
    Audience,
    /// `exp` (Expiration Time)
    Expiration,
    /// `nbf` (Not Before)
    NotBefore,
    /// `iat` (Issued At)
    IssuedAt,
    /// `jti` (JWT ID)
    JwtId,
    /// Any claim not registered in RFC 7519
    Custom(String),
}

impl ClaimKind {
    /// Registered claim kinds, in the order they are conventionally emitted
    pub const REGISTERED: [Self; 7] = [
        Self::Issuer,
        Self::Subject,
        Self::Audience,
        Self::Expiration,
        Self::NotBefore,
        Self::IssuedAt,
        Self::JwtId,
    ];

    /// Resolve a claim name to its kind. Unregistered names become [`ClaimKind::Custom`].
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "sub" => Self::Subject,
            "iss" => Self::Issuer,
            "aud" => Self::Audience,
            "exp" => Self::Expiration,
            "nbf" => Self::NotBefore,
            "iat" => Self::IssuedAt,
            "jti" => Self::JwtId,
            other => Self::Custom(other.to_owned()),
        }
    }

    /// Claim name as it appears in the token
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Subject => "sub",
            Self::Issuer => "iss",
            Self::Audience => "aud",
            Self::Expiration => "exp",
            Self::NotBefore => "nbf",
            Self::IssuedAt => "iat",
            Self::JwtId => "jti",
            Self::Custom(name) => name,
        }
    }

    /// Whether the claim value is a Unix timestamp
    #[must_use]
    pub const fn is_timestamp(&self) -> bool {
        matches!(self, Self::Expiration | Self::NotBefore | Self::IssuedAt)
    }
}

impl From<&str> for ClaimKind {
    fn from(name: &str) -> Self {
        Self::from_name(name)
    }
}

impl From<String> for ClaimKind {
    fn from(name: String) -> Self {
        match Self::from_name(&name) {
            Self::Custom(_) => Self::Custom(name),
            registered => registered,
        }
    }
}

impl fmt::Display for ClaimKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single named claim and its raw JSON value.
#[derive(Debug, Clone, PartialEq)]
pub struct Claim {
    kind: ClaimKind,
    value: Value,
}

impl Claim {
    /// Instantiate a claim of any kind. `kind` may be a [`ClaimKind`] or a raw claim name.
    pub fn new(kind: impl Into<ClaimKind>, value: impl Into<Value>) -> Self {
        let kind = match kind.into() {
            // normalize so that `Custom("exp")` cannot shadow the registered claim
            ClaimKind::Custom(name) => ClaimKind::from(name),
            kind => kind,
        };
        Self {
            kind,
            value: value.into(),
        }
    }

    /// `sub` (Subject) claim
    pub fn subject(value: impl Into<Value>) -> Self {
        Self::new(ClaimKind::Subject, value)
    }

    /// `iss` (Issuer) claim
    pub fn issuer(value: impl Into<String>) -> Self {
        Self::new(ClaimKind::Issuer, value.into())
    }

    /// `aud` (Audience) claim, either a single string or a list of strings
    pub fn audience(value: impl Into<Value>) -> Self {
        Self::new(ClaimKind::Audience, value)
    }

    /// `exp` (Expiration Time) claim
    #[must_use]
    pub fn expiration(timestamp: i64) -> Self {
        Self::new(ClaimKind::Expiration, timestamp)
    }

    /// `nbf` (Not Before) claim
    #[must_use]
    pub fn not_before(timestamp: i64) -> Self {
        Self::new(ClaimKind::NotBefore, timestamp)
    }

    /// `iat` (Issued At) claim
    #[must_use]
    pub fn issued_at(timestamp: i64) -> Self {
        Self::new(ClaimKind::IssuedAt, timestamp)
    }

    /// `jti` (JWT ID) claim
    pub fn jwt_id(value: impl Into<String>) -> Self {
        Self::new(ClaimKind::JwtId, value.into())
    }

    /// Any unregistered claim
    pub fn custom(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(ClaimKind::from(name.into()), value)
    }

    /// Kind of the claim
    #[must_use]
    pub const fn kind(&self) -> &ClaimKind {
        &self.kind
    }

    /// Claim name as it appears in the token
    #[must_use]
    pub fn name(&self) -> &str {
        self.kind.name()
    }

    /// Raw claim value
    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.value
    }

    /// Consume the claim, returning its raw value
    #[must_use]
    pub fn into_value(self) -> Value {
        self.value
    }

    /// Value as a Unix timestamp, if it is an integer that fits an `i64`
    #[must_use]
    pub fn as_timestamp(&self) -> Option<i64> {
        self.value.as_i64()
    }

    /// Check that the value has the type and format fixed for this claim's kind.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::InvalidClaim`] naming this claim when:
    ///   - `sub` is neither a string nor an integer
    ///   - `iss` is not a string
    ///   - `aud` is neither a string nor a list of strings
    ///   - `exp`, `nbf` or `iat` is not an integer timestamp
    ///   - `jti` is not a non-empty string
    pub fn validate(&self) -> Result<(), ValidationError> {
        let valid = match (&self.kind, &self.value) {
            (ClaimKind::Subject, Value::String(_)) => true,
            (ClaimKind::Subject, Value::Number(n)) => n.is_i64() || n.is_u64(),
            (ClaimKind::Issuer, value) => value.is_string(),
            (ClaimKind::Audience, Value::String(_)) => true,
            (ClaimKind::Audience, Value::Array(items)) => items.iter().all(Value::is_string),
            (kind, value) if kind.is_timestamp() => value.as_i64().is_some(),
            (ClaimKind::JwtId, Value::String(jti)) => !jti.is_empty(),
            (ClaimKind::Custom(_), _) => true,
            _ => false,
        };
        if valid {
            Ok(())
        } else {
            Err(ValidationError::InvalidClaim(self.name().to_owned()))
        }
    }

    /// Compare the claim's value against `expected`.
    ///
    /// With `strict`, values must be structurally equal. Otherwise numbers are
    /// compared numerically, numeric strings are compared against numbers, and an
    /// `aud` list matches any value it contains.
    #[must_use]
    pub fn matches(&self, expected: &Value, strict: bool) -> bool {
        let eq: fn(&Value, &Value) -> bool = if strict {
            strictly_equal
        } else {
            loosely_equal
        };
        if eq(&self.value, expected) {
            return true;
        }
        match (&self.kind, &self.value) {
            (ClaimKind::Audience, Value::Array(audiences)) if !expected.is_array() => {
                audiences.iter().any(|aud| eq(aud, expected))
            }
            _ => false,
        }
    }
}

fn strictly_equal(actual: &Value, expected: &Value) -> bool {
    actual == expected
}

#[allow(clippy::float_cmp)]
fn loosely_equal(actual: &Value, expected: &Value) -> bool {
    if actual == expected {
        return true;
    }
    if !(actual.is_number() || expected.is_number()) {
        return false;
    }
    if let (Some(a), Some(b)) = (as_integer(actual), as_integer(expected)) {
        return a == b;
    }
    match (as_float(actual), as_float(expected)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn as_integer(value: &Value) -> Option<i128> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(i128::from)
            .or_else(|| n.as_u64().map(i128::from)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
