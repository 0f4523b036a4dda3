use fido2_types::Bytes;

use crate::error::VaultError;

/// The FIDO2 metadata attached to a vault entry once a credential has been registered
/// with it. This is the only part of an entry the engine ever reads or writes; the rest
/// of the cipher stays opaque.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fido2CredentialMetadata {
    /// The credential ID chosen at creation time, compared byte for byte during
    /// selection.
    pub credential_id: Bytes,

    /// The relying party the credential is bound to. Enforced against the request's
    /// relying party id on every assertion, never trusted from caller supplied data.
    pub rp_id: String,

    /// The relying party's display name at registration time.
    pub rp_name: Option<String>,

    /// The user handle supplied by the relying party, returned in assertion responses.
    pub user_handle: Option<Bytes>,

    /// The account username supplied by the relying party.
    pub user_name: Option<String>,

    /// The account display name supplied by the relying party.
    pub user_display_name: Option<String>,

    /// Signature counter. Synced credentials do not count signatures, so this stays 0.
    pub counter: u32,

    /// Whether the credential is discoverable without the caller supplying its id.
    pub discoverable: bool,
}

/// An already-decrypted view of a vault entry, as handed to the engine by the vault
/// collaborator. The engine treats it as a capability: "does this entry hold a FIDO2
/// credential for relying party X" and "attach new credential metadata", nothing more.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultCredentialSource {
    /// The vault's identifier for this entry.
    pub entry_id: String,

    /// The entry's display name, shown by the selection UI.
    pub name: String,

    /// The FIDO2 credential stored on this entry, if any.
    pub fido2: Option<Fido2CredentialMetadata>,
}

impl VaultCredentialSource {
    /// Whether this entry already holds a FIDO2 credential bound to `rp_id`.
    pub fn holds_credential_for(&self, rp_id: &str) -> bool {
        self.fido2
            .as_ref()
            .is_some_and(|metadata| metadata.rp_id == rp_id)
    }
}

/// Storage capabilities the engine needs from the vault.
///
/// Implementations may suspend on I/O; the engine never holds a lock across these calls.
#[async_trait::async_trait]
pub trait VaultStore {
    /// All decrypted entries available to `user_id` that could back a credential.
    async fn lookup_entries_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<VaultCredentialSource>, VaultError>;

    /// Attach newly created credential metadata to the entry. Only called after a
    /// successful attestation response has been built; a failure here withholds the
    /// response from the caller.
    async fn commit_new_credential(
        &mut self,
        entry_id: &str,
        metadata: Fido2CredentialMetadata,
    ) -> Result<(), VaultError>;
}

/// In-memory vault of credential sources.
///
/// Useful for tests.
#[derive(Debug, Default)]
pub struct MemoryVault {
    entries: Vec<VaultCredentialSource>,
    commits: usize,
}

impl MemoryVault {
    /// Create a vault holding the given entries.
    pub fn new(entries: Vec<VaultCredentialSource>) -> Self {
        Self {
            entries,
            commits: 0,
        }
    }

    /// How many credential writes the vault has acknowledged.
    pub fn commit_count(&self) -> usize {
        self.commits
    }

    /// Look up an entry by its id.
    pub fn entry(&self, entry_id: &str) -> Option<&VaultCredentialSource> {
        self.entries.iter().find(|entry| entry.entry_id == entry_id)
    }
}

#[async_trait::async_trait]
impl VaultStore for MemoryVault {
    async fn lookup_entries_for_user(
        &self,
        _user_id: &str,
    ) -> Result<Vec<VaultCredentialSource>, VaultError> {
        Ok(self.entries.clone())
    }

    async fn commit_new_credential(
        &mut self,
        entry_id: &str,
        metadata: Fido2CredentialMetadata,
    ) -> Result<(), VaultError> {
        let entry = self
            .entries
            .iter_mut()
            .find(|entry| entry.entry_id == entry_id)
            .ok_or(VaultError::NotFound)?;
        entry.fido2 = Some(metadata);
        self.commits += 1;
        Ok(())
    }
}
