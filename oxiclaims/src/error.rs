use thiserror::Error;

/// Errors raised while validating claims or interacting with a [`Payload`]
///
/// [`Payload`]: crate::Payload
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ValidationError {
    /// Error raised when a claim listed as required is absent from the claim set
    #[error("jwt payload does not contain required claim '{0}'")]
    MissingClaim(String),

    /// Error raised when the `exp` (Expiration Time) claim, leeway applied, lies in the past
    #[error("jwt 'exp' claim indicates token is expired")]
    TokenExpired,

    /// Error raised during the refresh flow when `iat` plus the refresh TTL lies in the past
    #[error("jwt 'iat' claim indicates token can no longer be refreshed")]
    RefreshExpired,

    /// Error raised when a present claim fails its type, format, or temporal check
    /// (e.g. `nbf` in the future, an empty `jti`)
    #[error("jwt '{0}' claim is invalid")]
    InvalidClaim(String),

    /// Error raised on any attempt to write to a [`Payload`]
    ///
    /// [`Payload`]: crate::Payload
    #[error("the payload is immutable")]
    ImmutablePayload,

    /// Generic error raised by any custom [`ClaimValidator`]
    ///
    /// [`ClaimValidator`]: crate::validation::ClaimValidator
    #[error("custom claim validation error: {0}")]
    Custom(&'static str),
}

/// Errors raised by the [`Blacklist`]
///
/// [`Blacklist`]: crate::blacklist::Blacklist
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BlacklistError<E>
where
    E: std::error::Error,
{
    /// Error raised when the payload lacks the claim configured as blacklist key
    #[error("jwt payload does not contain blacklist key claim '{0}'")]
    MissingKey(String),

    /// Error raised by the backing [`Storage`], passed through unmodified
    ///
    /// [`Storage`]: crate::blacklist::Storage
    #[error("blacklist storage error")]
    Storage(#[from] E),
}
