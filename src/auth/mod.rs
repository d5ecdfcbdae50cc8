//! Request authentication.
//!
//! ## Components
//! - `protocol`: check / verify state machine ([`Authenticator`])
//! - `cache`: TTL + LRU cache of resolved credentials
//! - `error`: [`AuthError`] and its HTTP mapping

pub mod cache;
pub mod error;
pub mod protocol;

pub use cache::VerificationCache;
pub use error::{AuthError, AuthErrorCode, ErrorResponse};
pub use protocol::{
    AuthRequest, Authenticator, Identity, SignatureRequirement, check_timestamp, signed_message,
};
