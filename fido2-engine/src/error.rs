//! The internal failure taxonomy of the engine.
//!
//! Every variant collapses to the public `Error` result at the contract boundary so the
//! calling application cannot fingerprint which check rejected it; the specific variant
//! is only logged for diagnostics.

use fido2_types::result::OriginValidationResult;

/// Why a credential operation failed. Terminal for the request it occurred in; the
/// caller must re-issue a fresh request with a new challenge to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fido2Error {
    /// The caller is not authorized to act for the claimed relying party.
    Validation(OriginValidationResult),

    /// The request JSON was malformed or missing required fields.
    Decode,

    /// No vault entry satisfies the request, or the vault could not be queried.
    Selection,

    /// The vault already holds a credential the relying party asked to exclude.
    Excluded,

    /// Key generation or signing failed.
    Crypto(CryptoError),

    /// The vault rejected the credential write after signing succeeded. The response is
    /// withheld from the caller in this case.
    Commit,

    /// A response or client data structure could not be serialized.
    Internal,
}

impl From<CryptoError> for Fido2Error {
    fn from(err: CryptoError) -> Self {
        Fido2Error::Crypto(err)
    }
}

/// Failures produced by the cryptographic service, or by the checks guarding it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptoError {
    /// None of the algorithms proposed by the relying party is supported.
    UnsupportedAlgorithm,

    /// A new key pair could not be generated or encoded.
    KeyGeneration,

    /// The stored private key could not be loaded or the signature failed.
    Signing,

    /// The operation requires user verification but no verification method is available.
    VerificationUnavailable,
}

/// Failures of the trusted app-to-origin association lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssociationError {
    /// The lookup service could not be reached. The engine treats this as a soft failure
    /// and aborts without leaking which check failed.
    Unreachable,
}

/// Failures reported by the vault storage collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultError {
    /// The targeted entry does not exist for the current user.
    NotFound,

    /// The underlying storage rejected the operation.
    Storage,
}

/// How a single request ended short of success. Cancellation is deliberately not an
/// error: it flows through its own arm so it can never be conflated with a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Interruption {
    /// The user declined to complete the operation.
    Cancelled,

    /// The operation failed; the taxonomy tag says why.
    Failed(Fido2Error),
}

impl From<Fido2Error> for Interruption {
    fn from(err: Fido2Error) -> Self {
        Interruption::Failed(err)
    }
}

impl From<CryptoError> for Interruption {
    fn from(err: CryptoError) -> Self {
        Interruption::Failed(Fido2Error::Crypto(err))
    }
}
