use std::sync::Arc;

use crate::{
    claims::{
        ClaimKind,
        ClaimSet,
    },
    error::ValidationError,
    payload::Payload,
    time::{
        Clock,
        SharedClock,
        system_clock,
    },
    validation::validator::{
        ClaimValidator,
        ExpirationValidator,
        FormatValidator,
        IssuedAtValidator,
        NotBeforeValidator,
        RefreshValidator,
        RequiredClaimsValidator,
    },
};

/// Claims a [`PayloadValidator`] requires unless told otherwise
pub const DEFAULT_REQUIRED_CLAIMS: [ClaimKind; 6] = [
    ClaimKind::Issuer,
    ClaimKind::IssuedAt,
    ClaimKind::Expiration,
    ClaimKind::NotBefore,
    ClaimKind::Subject,
    ClaimKind::JwtId,
];

type BoxedValidator = Box<dyn ClaimValidator<ClaimSet> + Send + Sync>;

/// Builder for a [`PayloadValidator`]
pub struct PayloadValidatorBuilder {
    required_claims: Vec<String>,
    leeway: u64,
    clock: SharedClock,
    validators: Vec<BoxedValidator>,
}

impl PayloadValidatorBuilder {
    pub(crate) fn new() -> Self {
        Self {
            required_claims: DEFAULT_REQUIRED_CLAIMS
                .iter()
                .map(|kind| kind.name().to_owned())
                .collect(),
            leeway: 0,
            clock: system_clock(),
            validators: Vec::new(),
        }
    }

    /// Replaces the set of claims which must be present.
    ///
    /// Claims may be given as [`ClaimKind`]s or raw claim names.
    #[must_use]
    pub fn with_required_claims(
        mut self,
        required_claims: impl IntoIterator<Item = impl Into<ClaimKind>>,
    ) -> Self {
        self.required_claims = required_claims
            .into_iter()
            .map(|kind| kind.into().name().to_owned())
            .collect();
        self
    }

    /// Tolerates `seconds` of clock skew on the `exp`, `nbf` and `iat` checks
    #[must_use]
    pub const fn with_leeway(mut self, seconds: u64) -> Self {
        self.leeway = seconds;
        self
    }

    /// Reads the current time from `clock` instead of the system clock
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Adds a custom validator, run after the built-in checks.
    /// This method may be chained to add multiple custom validators.
    #[must_use]
    pub fn with(
        mut self,
        validator: impl ClaimValidator<ClaimSet> + Send + Sync + 'static,
    ) -> Self {
        self.validators.push(Box::new(validator));
        self
    }

    /// Finalizes the validator construction.
    #[must_use]
    pub fn build(self) -> PayloadValidator {
        PayloadValidator {
            required: RequiredClaimsValidator::new(self.required_claims),
            leeway: self.leeway,
            clock: self.clock,
            validators: self.validators,
        }
    }
}

/// Validates claim sets and is the only way to obtain a [`Payload`].
///
/// Checks run in a fixed order against a single captured "now":
///
/// 1. required claims are present
/// 2. `exp` (leeway added) is not in the past, unless expiry is ignored
/// 3. `nbf` (leeway subtracted) is not in the future
/// 4. every claim has the type and format fixed for its kind
/// 5. `iat` (leeway subtracted) is not in the future
/// 6. custom validators, in the order they were added
pub struct PayloadValidator {
    required: RequiredClaimsValidator,
    leeway: u64,
    clock: SharedClock,
    validators: Vec<BoxedValidator>,
}

impl Default for PayloadValidator {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl PayloadValidator {
    /// Returns a new [`PayloadValidatorBuilder`].
    #[must_use]
    pub fn builder() -> PayloadValidatorBuilder {
        PayloadValidatorBuilder::new()
    }

    /// Validates `claims` at the current time.
    ///
    /// `ignore_expired` skips the `exp` check only; it is meant for inspecting a
    /// token already known to be expired, e.g. to blacklist it.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::MissingClaim`] when a required claim is absent
    /// - [`ValidationError::TokenExpired`] when `exp` has passed and `ignore_expired`
    ///   is `false`
    /// - [`ValidationError::InvalidClaim`] when `nbf` or `iat` lies in the future,
    ///   or a claim has the wrong type or format
    /// - Any other [`ValidationError`] raised by a custom [`ClaimValidator`]
    pub fn check(
        &self,
        claims: ClaimSet,
        ignore_expired: bool,
    ) -> Result<ClaimSet, ValidationError> {
        self.check_at(claims, ignore_expired, self.clock.now())
    }

    /// Validates `claims` as of `now`.
    ///
    /// # Errors
    ///
    /// See [`PayloadValidator::check`].
    pub fn check_at(
        &self,
        claims: ClaimSet,
        ignore_expired: bool,
        now: i64,
    ) -> Result<ClaimSet, ValidationError> {
        self.run_validators(&claims, ignore_expired, now)
            .inspect_err(|err| tracing::debug!(%err, now, "jwt payload rejected"))?;
        Ok(claims)
    }

    /// Validates `claims` for the refresh flow: expiry is not checked, but `iat`
    /// plus `refresh_ttl` seconds (leeway added) must not lie in the past.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::MissingClaim`] when `iat` is absent
    /// - [`ValidationError::RefreshExpired`] when the refresh window has elapsed
    /// - [`ValidationError::InvalidClaim`] when a claim has the wrong type or format
    pub fn check_refresh(
        &self,
        claims: ClaimSet,
        refresh_ttl: u64,
    ) -> Result<ClaimSet, ValidationError> {
        let now = self.clock.now();
        FormatValidator
            .validate(&claims, now)
            .and_then(|()| {
                RefreshValidator::new(seconds(refresh_ttl), seconds(self.leeway))
                    .validate(&claims, now)
            })
            .inspect_err(|err| tracing::debug!(%err, now, "jwt payload rejected for refresh"))?;
        Ok(claims)
    }

    /// Validates `claims` and wraps them in an immutable [`Payload`].
    ///
    /// # Errors
    ///
    /// See [`PayloadValidator::check`].
    pub fn payload(
        &self,
        claims: ClaimSet,
        ignore_expired: bool,
    ) -> Result<Payload, ValidationError> {
        self.check(claims, ignore_expired)
            .map(Payload::from_validated)
    }

    /// Names of the claims which must be present
    #[must_use]
    pub fn required_claims(&self) -> &[String] {
        self.required.required()
    }

    /// Clock skew tolerance, in seconds
    #[must_use]
    pub const fn leeway(&self) -> u64 {
        self.leeway
    }

    /// Current time according to the validator's clock
    #[must_use]
    pub fn now(&self) -> i64 {
        self.clock.now()
    }

    fn run_validators(
        &self,
        claims: &ClaimSet,
        ignore_expired: bool,
        now: i64,
    ) -> Result<(), ValidationError> {
        let leeway = seconds(self.leeway);
        self.required.validate(claims, now)?;
        if !ignore_expired {
            ExpirationValidator::new(leeway).validate(claims, now)?;
        }
        NotBeforeValidator::new(leeway).validate(claims, now)?;
        FormatValidator.validate(claims, now)?;
        IssuedAtValidator::new(leeway).validate(claims, now)?;
        for v in &self.validators {
            v.validate(claims, now)?;
        }
        Ok(())
    }
}

fn seconds(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
