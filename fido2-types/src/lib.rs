//! # FIDO2 Types
//!
//! Type definitions for the vault-backed FIDO2 credential provider. This crate holds
//! the platform-facing value objects, the `webauthn` option structures delivered by
//! relying parties, and the wire format of the responses handed back to the platform's
//! credential manager.
//!
//! Everything here is plain data: decoding is pure and side-effect free, and every
//! structure is consumed exactly once by the engine that produced or received it.

mod utils;

pub mod request;
pub mod result;
pub mod webauthn;

mod flags;

// Re-exports
pub use utils::{
    bytes::{Bytes, NotBase64Encoded},
    encoding,
    rand::random_vec,
};

pub use flags::Flags;
