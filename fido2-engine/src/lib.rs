//! # FIDO2 Engine
//!
//! The credential request/response protocol engine that lets a password-manager vault act
//! as a WebAuthn authenticator. The [`CredentialEngine`] parses platform delivered
//! webauthn requests, validates the calling application's right to act for the claimed
//! relying party, selects or creates the vault entry backing the credential, drives the
//! cryptographic service that produces attestation and assertion signatures, and maps
//! every outcome into one of the three canonical results the platform layer understands.
//!
//! Storage, cryptography, user prompting and the app-to-origin association lookup are
//! defined through traits, keeping only the parts that vary between hosts pluggable while
//! the protocol state machine stays fixed. The engine fails closed: any validation result
//! other than `Valid` aborts the operation before cryptographic work or vault mutation,
//! and which check failed is never revealed to the calling application.

mod crypto;
mod engine;
mod error;
mod mapper;
mod origin;
mod prompt;
mod selector;
mod session;
mod store;

#[cfg(test)]
mod tests;

pub use self::{
    crypto::{public_key_der_from_cose_key, CreatedKeyPair, CryptoService, SoftwareCryptoService},
    engine::CredentialEngine,
    error::{AssociationError, CryptoError, Fido2Error, VaultError},
    origin::{AppAssociationSource, OriginValidator, PolicyError, PrivilegedAppPolicy},
    prompt::{UserPrompter, UserSelection, UserVerification},
    selector::{select_candidates, CandidateMatch},
    session::SessionContext,
    store::{Fido2CredentialMetadata, MemoryVault, VaultCredentialSource, VaultStore},
};

#[cfg(any(test, feature = "testable"))]
pub use self::{
    crypto::MockCryptoService, origin::MockAppAssociationSource, prompt::MockUserPrompter,
};
