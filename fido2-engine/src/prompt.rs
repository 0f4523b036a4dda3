use crate::store::VaultCredentialSource;

/// The user's answer to an ambiguous-candidate selection prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserSelection {
    /// The user picked the entry with this id from the presented candidates.
    Chosen(String),

    /// The user dismissed the prompt without choosing.
    Cancelled,
}

/// The outcome of a user verification prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserVerification {
    /// The user completed biometric, device credential, or vault unlock verification.
    Verified,

    /// The user dismissed the verification prompt.
    Cancelled,

    /// No verification method is available on this device.
    Unavailable,
}

/// Pluggable trait for the engine to hand ambiguous selections and verification prompts
/// to the host's UI layer.
///
/// Both prompts suspend until the user answers or the platform signals abandonment;
/// abandonment is reported as the `Cancelled` variant and terminates the request without
/// any further vault mutation.
#[cfg_attr(any(test, feature = "testable"), mockall::automock)]
#[async_trait::async_trait]
pub trait UserPrompter {
    /// Ask the user to pick one entry among several matching candidates. The engine
    /// never auto-picks among ambiguous candidates.
    async fn request_user_selection(&self, candidates: &[VaultCredentialSource])
        -> UserSelection;

    /// Ask the user to perform an explicit verification action.
    async fn request_user_verification(&self) -> UserVerification;
}
