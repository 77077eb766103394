mod claim;
pub use claim::{
    Claim,
    ClaimKind,
};
mod set;
pub use set::ClaimSet;
mod rfc7519;
pub use rfc7519::{
    Aud,
    Exp,
    Iat,
    Iss,
    Jti,
    Nbf,
    Sub,
};
