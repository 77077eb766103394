//! Provides claim validation and [`Payload`] construction
//!
//! [`Payload`]: crate::Payload
pub(crate) mod validator;

pub use pipeline::{
    DEFAULT_REQUIRED_CLAIMS,
    PayloadValidator,
    PayloadValidatorBuilder,
};
pub use validator::ClaimValidator;

mod pipeline;
