//! Translation of the engine's terminal outcomes into the canonical results handed to
//! the platform layer.
//!
//! Every terminal outcome maps to exactly one of the three public variants; none is
//! dropped or coalesced. The failure taxonomy is logged here and nowhere surfaced to the
//! caller.

use fido2_types::result::{AuthenticateCredentialResult, RegisterCredentialResult};

use crate::error::Interruption;

pub(crate) fn map_registration(
    outcome: Result<String, Interruption>,
) -> RegisterCredentialResult {
    match outcome {
        Ok(response_json) => RegisterCredentialResult::Success(response_json),
        Err(Interruption::Cancelled) => RegisterCredentialResult::Cancelled,
        Err(Interruption::Failed(err)) => {
            log::warn!("credential registration failed: {err:?}");
            RegisterCredentialResult::Error
        }
    }
}

pub(crate) fn map_assertion(
    outcome: Result<String, Interruption>,
) -> AuthenticateCredentialResult {
    match outcome {
        Ok(response_json) => AuthenticateCredentialResult::Success(response_json),
        Err(Interruption::Cancelled) => AuthenticateCredentialResult::Cancelled,
        Err(Interruption::Failed(err)) => {
            log::warn!("credential assertion failed: {err:?}");
            AuthenticateCredentialResult::Error
        }
    }
}
