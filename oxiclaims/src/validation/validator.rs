// JUSTIFICATION: using `pub(crate)` makes it immediately obvious that an item
// is not exposed via the public API.
#![allow(clippy::redundant_pub_crate)]
use crate::{
    claims::{
        Claim,
        ClaimSet,
        Exp,
        Iat,
        Nbf,
    },
    error::ValidationError,
};

/// Trait for implementing custom claim validator layers
///
/// Custom validators run after the built-in checks of a [`PayloadValidator`],
/// in the order they were added.
///
/// # Example Implementation
///
/// ```rust
/// use oxiclaims::{
///     claims::{
///         Claim,
///         ClaimSet,
///         Iss,
///     },
///     error::ValidationError,
///     validation::{
///         ClaimValidator,
///         PayloadValidator,
///     },
/// };
///
/// pub struct IssuerValidator {
///     expected: &'static str,
/// }
/// impl<C: Iss> ClaimValidator<C> for IssuerValidator {
///     fn validate(&self, claims: &C, _now: i64) -> Result<(), ValidationError> {
///         if claims.iss() == Some(self.expected) {
///             Ok(())
///         } else {
///             Err(ValidationError::InvalidClaim("iss".into()))
///         }
///     }
/// }
///
/// let validator = PayloadValidator::builder()
///     .with_required_claims(["iss"])
///     .with(IssuerValidator {
///         expected: "https://auth.example.org",
///     })
///     .build();
///
/// let claims = ClaimSet::new().with(Claim::issuer("https://evil.example.org"));
/// let err = validator.check(claims, false).unwrap_err();
/// assert_eq!(err, ValidationError::InvalidClaim("iss".into()));
/// ```
///
/// [`PayloadValidator`]: crate::validation::PayloadValidator
pub trait ClaimValidator<C: ?Sized> {
    /// Given the `claims` of a JWT and the instant of validation, perform some
    /// validation step.
    ///
    /// # Errors
    ///
    /// This method MUST return a [`ValidationError`] if the `claims` do not pass
    /// the validation step performed by this [`ClaimValidator`] implementation
    /// (e.g. [`ValidationError::TokenExpired`] if `exp` is before `now`).
    fn validate(&self, claims: &C, now: i64) -> Result<(), ValidationError>;
}

pub(crate) struct RequiredClaimsValidator {
    required: Vec<String>,
}
impl RequiredClaimsValidator {
    pub(crate) const fn new(required: Vec<String>) -> Self {
        Self { required }
    }

    pub(crate) fn required(&self) -> &[String] {
        &self.required
    }
}
impl ClaimValidator<ClaimSet> for RequiredClaimsValidator {
    fn validate(&self, claims: &ClaimSet, _: i64) -> Result<(), ValidationError> {
        match self.required.iter().find(|name| !claims.has_name(name)) {
            Some(missing) => Err(ValidationError::MissingClaim(missing.clone())),
            None => Ok(()),
        }
    }
}

pub(crate) struct FormatValidator;
impl ClaimValidator<ClaimSet> for FormatValidator {
    fn validate(&self, claims: &ClaimSet, _: i64) -> Result<(), ValidationError> {
        claims.iter().try_for_each(Claim::validate)
    }
}

pub(crate) struct ExpirationValidator {
    leeway: i64,
}
impl ExpirationValidator {
    pub(crate) const fn new(leeway: i64) -> Self {
        Self { leeway }
    }
}
impl<C> ClaimValidator<C> for ExpirationValidator
where
    C: Exp + ?Sized,
{
    fn validate(&self, claims: &C, now: i64) -> Result<(), ValidationError> {
        match claims.exp() {
            Some(exp) if exp.saturating_add(self.leeway) < now => {
                Err(ValidationError::TokenExpired)
            }
            _ => Ok(()),
        }
    }
}

pub(crate) struct NotBeforeValidator {
    leeway: i64,
}
impl NotBeforeValidator {
    pub(crate) const fn new(leeway: i64) -> Self {
        Self { leeway }
    }
}
impl<C> ClaimValidator<C> for NotBeforeValidator
where
    C: Nbf + ?Sized,
{
    fn validate(&self, claims: &C, now: i64) -> Result<(), ValidationError> {
        match claims.nbf() {
            Some(nbf) if nbf.saturating_sub(self.leeway) > now => {
                Err(ValidationError::InvalidClaim("nbf".into()))
            }
            _ => Ok(()),
        }
    }
}

pub(crate) struct IssuedAtValidator {
    leeway: i64,
}
impl IssuedAtValidator {
    pub(crate) const fn new(leeway: i64) -> Self {
        Self { leeway }
    }
}
impl<C> ClaimValidator<C> for IssuedAtValidator
where
    C: Iat + ?Sized,
{
    fn validate(&self, claims: &C, now: i64) -> Result<(), ValidationError> {
        match claims.iat() {
            Some(iat) if iat.saturating_sub(self.leeway) > now => {
                Err(ValidationError::InvalidClaim("iat".into()))
            }
            _ => Ok(()),
        }
    }
}

/// Rejects tokens whose refresh window (`iat` + refresh TTL) has elapsed.
pub(crate) struct RefreshValidator {
    refresh_ttl: i64,
    leeway: i64,
}
impl RefreshValidator {
    pub(crate) const fn new(refresh_ttl: i64, leeway: i64) -> Self {
        Self {
            refresh_ttl,
            leeway,
        }
    }
}
impl<C> ClaimValidator<C> for RefreshValidator
where
    C: Iat + ?Sized,
{
    fn validate(&self, claims: &C, now: i64) -> Result<(), ValidationError> {
        let iat = claims
            .iat()
            .ok_or_else(|| ValidationError::MissingClaim("iat".into()))?;
        if iat
            .saturating_add(self.refresh_ttl)
            .saturating_add(self.leeway)
            < now
        {
            Err(ValidationError::RefreshExpired)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use crate::{
        claims::{
            Claim,
            ClaimSet,
        },
        error::ValidationError,
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

    const NOW: i64 = 1_700_000_000;

    #[test]
    fn required_claims_reports_first_missing() {
        let validator = RequiredClaimsValidator::new(vec!["iss".into(), "jti".into()]);
        let claims = ClaimSet::new().with(Claim::issuer("http://example.com"));
        let err = validator.validate(&claims, NOW).unwrap_err();
        assert_eq!(err, ValidationError::MissingClaim("jti".into()));

        let claims = claims.with(Claim::jwt_id("foo"));
        validator.validate(&claims, NOW).unwrap();
    }

    #[test]
    fn expiration_applies_leeway() {
        let claims = ClaimSet::new().with(Claim::expiration(NOW - 10));
        let err = ExpirationValidator::new(0)
            .validate(&claims, NOW)
            .unwrap_err();
        assert_eq!(err, ValidationError::TokenExpired);
        ExpirationValidator::new(10).validate(&claims, NOW).unwrap();

        // expiring exactly now is still valid
        let claims = ClaimSet::new().with(Claim::expiration(NOW));
        ExpirationValidator::new(0).validate(&claims, NOW).unwrap();
    }

    #[test]
    fn not_before_applies_leeway() {
        let claims = ClaimSet::new().with(Claim::not_before(NOW + 30));
        let err = NotBeforeValidator::new(0)
            .validate(&claims, NOW)
            .unwrap_err();
        assert_eq!(err, ValidationError::InvalidClaim("nbf".into()));
        NotBeforeValidator::new(30).validate(&claims, NOW).unwrap();
    }

    #[test]
    fn issued_at_cannot_be_in_the_future() {
        let claims = ClaimSet::new().with(Claim::issued_at(NOW + 1));
        let err = IssuedAtValidator::new(0)
            .validate(&claims, NOW)
            .unwrap_err();
        assert_eq!(err, ValidationError::InvalidClaim("iat".into()));
        IssuedAtValidator::new(1).validate(&claims, NOW).unwrap();
    }

    #[test]
    fn absent_temporal_claims_pass() {
        let claims = ClaimSet::new();
        ExpirationValidator::new(0).validate(&claims, NOW).unwrap();
        NotBeforeValidator::new(0).validate(&claims, NOW).unwrap();
        IssuedAtValidator::new(0).validate(&claims, NOW).unwrap();
    }

    #[test]
    fn format_validator_names_offending_claim() {
        let claims = ClaimSet::new()
            .with(Claim::subject(1))
            .with(Claim::jwt_id(""));
        let err = FormatValidator.validate(&claims, NOW).unwrap_err();
        assert_eq!(err, ValidationError::InvalidClaim("jti".into()));
    }

    #[test]
    fn refresh_window() {
        let claims = ClaimSet::new().with(Claim::issued_at(NOW - 3600));
        RefreshValidator::new(3600, 0)
            .validate(&claims, NOW)
            .unwrap();
        let err = RefreshValidator::new(3599, 0)
            .validate(&claims, NOW)
            .unwrap_err();
        assert_eq!(err, ValidationError::RefreshExpired);

        let err = RefreshValidator::new(3600, 0)
            .validate(&ClaimSet::new(), NOW)
            .unwrap_err();
        assert_eq!(err, ValidationError::MissingClaim("iat".into()));
    }
}
