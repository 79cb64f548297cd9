//! `echoes-auth` — authentication and ownership boundary (fail closed).
//!
//! This crate is intentionally decoupled from HTTP and from any particular
//! identity provider: it parses the `Authorization` header value, asks an
//! [`IdentityResolver`] who the token belongs to, and compares claimed owners
//! against the resolved [`Identity`].

pub mod bearer;
pub mod claims;
pub mod error;
pub mod identity;
pub mod ownership;
pub mod resolver;
pub mod verifier;

pub use bearer::parse_bearer;
pub use claims::{ProviderClaims, TokenValidationError, validate_claims};
pub use error::AuthError;
pub use identity::Identity;
pub use ownership::{OwnershipError, assert_owner};
pub use resolver::{IdentityResolver, JwtResolver, ResolveError};
pub use verifier::TokenVerifier;
