//! Authentication for the MediSecure RAG API
//!
//! Two pieces, both stateless at request time:
//! - [`CredentialStore`]: username -> Argon2 password hash, loaded once at
//!   process start and read-only afterwards.
//! - [`TokenIssuer`]: signed, time-bounded bearer tokens. Self-contained, no
//!   server-side session store; expiry is the only invalidation.

pub mod credentials;
pub mod token;

pub use credentials::CredentialStore;
pub use token::TokenIssuer;

pub use medisecure_core::AuthError;
