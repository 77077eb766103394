use std::fmt;

use serde::{
    Serialize,
    Serializer,
};
use serde_json::{
    Map,
    Value,
};

use crate::{
    claims::{
        Aud,
        Claim,
        ClaimKind,
        ClaimSet,
        Exp,
        Iat,
        Iss,
        Jti,
        Nbf,
        Sub,
    },
    error::ValidationError,
    validation::PayloadValidator,
};

/// The validated, immutable claim set of a single token.
///
/// A [`Payload`] can only be obtained through a [`PayloadValidator`], so holding
/// one means its claims passed validation. It exposes read access only; the
/// write methods exist to fail loudly with [`ValidationError::ImmutablePayload`].
///
/// ```rust
/// use oxiclaims::{
///     Payload,
///     claims::{
///         Claim,
///         ClaimSet,
///     },
///     validation::PayloadValidator,
/// };
///
/// let validator = PayloadValidator::builder()
///     .with_required_claims(["sub", "jti"])
///     .build();
/// let claims = ClaimSet::new()
///     .with(Claim::subject(1))
///     .with(Claim::jwt_id("foo"));
///
/// let payload = Payload::new(claims, &validator, false).unwrap();
/// assert_eq!(payload.to_json(), r#"{"sub":1,"jti":"foo"}"#);
/// assert!(payload.set("sub", 2).is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    claims: ClaimSet,
}

impl Payload {
    /// Validates `claims` with `validator` and wraps them.
    ///
    /// # Errors
    ///
    /// Any [`ValidationError`] raised by [`PayloadValidator::check`].
    pub fn new(
        claims: ClaimSet,
        validator: &PayloadValidator,
        ignore_expired: bool,
    ) -> Result<Self, ValidationError> {
        validator.payload(claims, ignore_expired)
    }

    /// Validates `claims` for the refresh flow and wraps them.
    ///
    /// # Errors
    ///
    /// Any [`ValidationError`] raised by [`PayloadValidator::check_refresh`].
    pub fn for_refresh(
        claims: ClaimSet,
        validator: &PayloadValidator,
        refresh_ttl: u64,
    ) -> Result<Self, ValidationError> {
        validator
            .check_refresh(claims, refresh_ttl)
            .map(Self::from_validated)
    }

    pub(crate) const fn from_validated(claims: ClaimSet) -> Self {
        Self { claims }
    }

    /// Value at `path`.
    ///
    /// A claim name matches first; otherwise the path is split on `.` and
    /// descends into nested objects and array indices (e.g. `"ctx.roles.0"`).
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Value> {
        if let Some(claim) = self.claims.get_by_name(path) {
            return Some(claim.value());
        }
        let mut segments = path.split('.');
        let root = self.claims.get_by_name(segments.next()?)?.value();
        segments.try_fold(root, |value, segment| match value {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
    }

    /// Values at each of `paths`, in order
    pub fn get_many<'a>(
        &'a self,
        paths: impl IntoIterator<Item = &'a str>,
    ) -> Vec<Option<&'a Value>> {
        paths.into_iter().map(|path| self.get(path)).collect()
    }

    /// Whether a claim of the given kind is present
    #[must_use]
    pub fn has(&self, kind: &ClaimKind) -> bool {
        self.claims.has(kind)
    }

    /// Whether a value exists at `path` (see [`Payload::get`])
    #[must_use]
    pub fn has_key(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Underlying [`Claim`] with the given name
    #[must_use]
    pub fn claim(&self, name: &str) -> Option<&Claim> {
        self.claims.get_by_name(name)
    }

    /// Underlying [`Claim`] of the given kind
    #[must_use]
    pub fn get_claim(&self, kind: &ClaimKind) -> Option<&Claim> {
        self.claims.get(kind)
    }

    /// Validated claim set
    #[must_use]
    pub const fn claims(&self) -> &ClaimSet {
        &self.claims
    }

    /// Whether every `expected` claim exists and matches its value.
    ///
    /// Always `false` when `expected` is empty. See [`Claim::matches`] for the
    /// meaning of `strict`.
    #[must_use]
    pub fn matches(&self, expected: &Map<String, Value>, strict: bool) -> bool {
        !expected.is_empty()
            && expected.iter().all(|(name, value)| {
                self.claims
                    .get_by_name(name)
                    .is_some_and(|claim| claim.matches(value, strict))
            })
    }

    /// [`Payload::matches`] with structural comparison
    #[must_use]
    pub fn matches_strict(&self, expected: &Map<String, Value>) -> bool {
        self.matches(expected, true)
    }

    /// Number of claims
    #[must_use]
    pub const fn len(&self) -> usize {
        self.claims.len()
    }

    /// Whether the payload holds no claims
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    /// Ordered mapping of claim name to raw value
    #[must_use]
    pub fn to_plain_map(&self) -> Map<String, Value> {
        self.claims.to_plain_map()
    }

    /// Claims rendered as a JSON object. Forward slashes are not escaped.
    #[must_use]
    pub fn to_json(&self) -> String {
        Value::Object(self.to_plain_map()).to_string()
    }

    /// Payloads are immutable; always fails.
    ///
    /// # Errors
    ///
    /// Always [`ValidationError::ImmutablePayload`].
    pub fn set(&self, path: &str, _value: impl Into<Value>) -> Result<(), ValidationError> {
        tracing::warn!(path, "attempted write to immutable jwt payload");
        Err(ValidationError::ImmutablePayload)
    }

    /// Payloads are immutable; always fails.
    ///
    /// # Errors
    ///
    /// Always [`ValidationError::ImmutablePayload`].
    pub fn unset(&self, path: &str) -> Result<(), ValidationError> {
        tracing::warn!(path, "attempted removal from immutable jwt payload");
        Err(ValidationError::ImmutablePayload)
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json())
    }
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.claims.serialize(serializer)
    }
}

impl Iss for Payload {
    fn iss(&self) -> Option<&str> {
        self.claims.iss()
    }
}

impl Sub for Payload {
    fn sub(&self) -> Option<&Value> {
        self.claims.sub()
    }
}

impl Aud for Payload {
    fn aud(&self) -> impl Iterator<Item = &str> {
        self.claims.aud()
    }
}

impl Exp for Payload {
    fn exp(&self) -> Option<i64> {
        self.claims.exp()
    }
}

impl Nbf for Payload {
    fn nbf(&self) -> Option<i64> {
        self.claims.nbf()
    }
}

impl Iat for Payload {
    fn iat(&self) -> Option<i64> {
        self.claims.iat()
    }
}

impl Jti for Payload {
    fn jti(&self) -> Option<&str> {
        self.claims.jti()
    }
}
