//! The value objects handed to the engine by the platform integration layer.
//!
//! The platform layer is responsible for extracting these from its native
//! credential-manager payloads; the core never parses the native intent format itself.
//! Each request is immutable once constructed and is consumed to produce exactly one
//! outcome.

use crate::Bytes;

/// The SHA-256 digest of a calling application's code signing certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateFingerprint([u8; 32]);

impl CertificateFingerprint {
    /// Wrap a raw SHA-256 certificate digest.
    pub fn new(digest: [u8; 32]) -> Self {
        Self(digest)
    }

    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for CertificateFingerprint {
    fn from(digest: [u8; 32]) -> Self {
        Self(digest)
    }
}

impl TryFrom<&[u8]> for CertificateFingerprint {
    type Error = InvalidFingerprintLength;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        <[u8; 32]>::try_from(value)
            .map(Self)
            .map_err(|_| InvalidFingerprintLength)
    }
}

/// A certificate digest must be exactly 32 bytes.
#[derive(Debug)]
pub struct InvalidFingerprintLength;

/// The identity of the application calling into the provider, as reported by the
/// platform. The asserted origin, when present, is supplied by the caller itself and is
/// only trustworthy for privileged callers whose signature has been pinned.
#[derive(Debug, Clone)]
pub struct CallingAppInfo {
    /// The calling application's package identifier.
    pub package_name: String,

    /// The ordered signing certificate digests of the calling application.
    pub certificates: Vec<CertificateFingerprint>,

    /// An origin the caller claims to act for, set by browsers and other privileged
    /// callers proxying webauthn requests for foreign origins.
    pub origin: Option<String>,
}

/// A platform delivered request to create a new credential in the vault.
#[derive(Debug)]
pub struct CredentialRequest {
    /// The vault user the credential will be created for.
    pub user_id: String,

    /// The raw creation options JSON as delivered by the relying party.
    pub request_json: String,

    /// The identity of the calling application.
    pub calling_app: CallingAppInfo,
}

/// A platform delivered request to assert possession of an existing credential.
#[derive(Debug)]
pub struct CredentialAssertionRequest {
    /// The vault user whose entries may satisfy this request.
    pub user_id: String,

    /// The specific vault entry the caller wants to assert with, when the user already
    /// picked one through the platform's credential listing.
    pub cipher_id: Option<String>,

    /// The credential the caller wants asserted, when known upfront. Discoverable
    /// credential flows leave this empty.
    pub credential_id: Option<Bytes>,

    /// The raw assertion options JSON as delivered by the relying party.
    pub request_json: String,

    /// A pre-hashed client data channel. When present, the signature is produced over
    /// this hash and no client data JSON is returned to the caller.
    pub client_data_hash: Option<Vec<u8>>,

    /// The identity of the calling application.
    pub calling_app: CallingAppInfo,
}
