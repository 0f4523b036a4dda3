//! Narrowing the user's vault entries down to the candidates that can satisfy an
//! assertion request.

use fido2_types::Bytes;

use crate::store::VaultCredentialSource;

/// The candidates remaining after filtering the available vault entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateMatch {
    /// No entry matches; the request cannot be satisfied. Partial matches are never
    /// permitted.
    None,

    /// Exactly one entry matches and the engine may proceed with it automatically.
    One(VaultCredentialSource),

    /// Several entries match and no credential id disambiguates them; an explicit user
    /// choice is required.
    Many(Vec<VaultCredentialSource>),
}

/// Filter `entries` down to those able to satisfy an assertion for `rp_id`.
///
/// An entry is a candidate when its stored relying party id equals the request's. When
/// the caller supplied a credential id, candidates are further narrowed by comparing the
/// stored id byte for byte; prefix or substring matches do not count.
pub fn select_candidates(
    rp_id: &str,
    credential_id: Option<&Bytes>,
    entries: Vec<VaultCredentialSource>,
) -> CandidateMatch {
    let mut matches: Vec<VaultCredentialSource> = entries
        .into_iter()
        .filter(|entry| entry.holds_credential_for(rp_id))
        .collect();

    if let Some(credential_id) = credential_id {
        matches.retain(|entry| {
            entry
                .fido2
                .as_ref()
                .is_some_and(|metadata| metadata.credential_id == *credential_id)
        });
    }

    match matches.len() {
        0 => CandidateMatch::None,
        1 => CandidateMatch::One(matches.swap_remove(0)),
        _ => CandidateMatch::Many(matches),
    }
}
