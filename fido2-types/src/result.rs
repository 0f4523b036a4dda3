//! The canonical outcomes the engine reports back to the platform integration layer.
//!
//! These are tagged unions rather than errors on purpose: a cancelled operation is an
//! expected, frequent, non-exceptional outcome and must stay distinguishable from a
//! failure at every call site. The platform layer turns each variant into the matching
//! system response.

use typeshare::typeshare;

/// The outcome of validating a calling application's right to act for a relying party.
///
/// Everything other than [`Valid`][Self::Valid] aborts the operation before any
/// cryptographic work or vault access takes place.
#[typeshare]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginValidationResult {
    /// The caller is authorized to act for the relying party.
    Valid,

    /// The trusted association lookup could not be reached; the operation is aborted
    /// without revealing which check failed.
    ValidatorUnavailable,

    /// The calling package is not registered for the relying party identifier.
    PackageMismatch,

    /// The origin asserted by a privileged caller does not correspond to the relying
    /// party identifier.
    AssertedOriginMismatch,

    /// A privileged caller asserted an origin but presented no signing certificate.
    PrivilegedAppUnsigned,

    /// A privileged caller's signing certificate does not match its pinned digest.
    PrivilegedAppSignatureMismatch,

    /// The calling application is not allowed to assert foreign origins.
    PasskeyNotSupportedForApp,
}

/// The terminal outcome of a credential registration request.
#[typeshare]
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "type", content = "content")]
pub enum RegisterCredentialResult {
    /// Registration succeeded; the payload is the attestation response JSON to hand
    /// back to the caller.
    Success(String),

    /// Registration failed. Which check failed is logged internally but intentionally
    /// not reported to the calling application.
    Error,

    /// The user declined to complete the registration.
    Cancelled,
}

/// The terminal outcome of a credential assertion request.
#[typeshare]
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "type", content = "content")]
pub enum AuthenticateCredentialResult {
    /// Authentication succeeded; the payload is the assertion response JSON to hand
    /// back to the caller.
    Success(String),

    /// Authentication failed. Which check failed is logged internally but intentionally
    /// not reported to the calling application.
    Error,

    /// The user declined to complete the authentication.
    Cancelled,
}
