//! Validation of a calling application's right to act for a relying party.
//!
//! Two distinct trust paths exist. An ordinary application never asserts an origin: its
//! package identity must be registered for the relying party through the host maintained
//! association lookup. A browser or other privileged caller proxies requests for foreign
//! origins and therefore supplies an asserted origin string; that assertion is spoofable,
//! so it is only honored for callers on a pinned allow-list whose signing certificate
//! matches exactly.

use std::borrow::Cow;

use public_suffix::EffectiveTLDProvider;
use url::Url;

use fido2_types::{
    request::{CallingAppInfo, CertificateFingerprint},
    result::OriginValidationResult,
};

use crate::error::AssociationError;

mod policy;

pub use policy::{PolicyError, PrivilegedAppPolicy};

/// A trusted host-maintained lookup deciding whether an application package is registered
/// to act for a relying party (the equivalent of serving the package in the relying
/// party's digital asset links file).
///
/// The lookup is typically network backed and may be unreachable; that is reported as
/// [`AssociationError::Unreachable`] and the engine aborts the operation rather than
/// deciding either way.
#[cfg_attr(any(test, feature = "testable"), mockall::automock)]
#[async_trait::async_trait]
pub trait AppAssociationSource {
    /// Whether `package_name`, signing with `certificates`, is registered for `rp_id`.
    async fn is_package_associated(
        &self,
        rp_id: &str,
        package_name: &str,
        certificates: &[CertificateFingerprint],
    ) -> Result<bool, AssociationError>;
}

/// Validates the calling application against the relying party id of a decoded request.
///
/// Only [`OriginValidationResult::Valid`] permits the engine to proceed; every other
/// variant short-circuits the operation before any cryptographic work or vault access.
pub struct OriginValidator<A> {
    policy: PrivilegedAppPolicy,
    associations: A,
}

impl<A> OriginValidator<A>
where
    A: AppAssociationSource + Sync,
{
    /// Create a validator with the given privileged-caller policy and association source.
    pub fn new(policy: PrivilegedAppPolicy, associations: A) -> Self {
        Self {
            policy,
            associations,
        }
    }

    /// Decide whether the caller is authorized to claim `rp_id`.
    pub async fn validate(
        &self,
        app: &CallingAppInfo,
        rp_id: &str,
    ) -> OriginValidationResult {
        match app.origin.as_deref() {
            Some(origin) => self.validate_asserted_origin(app, origin, rp_id),
            None => self.validate_package_association(app, rp_id).await,
        }
    }

    fn validate_asserted_origin(
        &self,
        app: &CallingAppInfo,
        origin: &str,
        rp_id: &str,
    ) -> OriginValidationResult {
        let Some(pinned) = self.policy.fingerprint_for(&app.package_name) else {
            log::debug!(
                "package {} is not allowed to assert origins",
                app.package_name
            );
            return OriginValidationResult::PasskeyNotSupportedForApp;
        };

        // An app signed by multiple certificates has no single fingerprint to pin, so it
        // can never match.
        let [certificate] = app.certificates.as_slice() else {
            return if app.certificates.is_empty() {
                OriginValidationResult::PrivilegedAppUnsigned
            } else {
                OriginValidationResult::PrivilegedAppSignatureMismatch
            };
        };
        if certificate != pinned {
            return OriginValidationResult::PrivilegedAppSignatureMismatch;
        }

        if !is_valid_rp_id(rp_id) {
            return OriginValidationResult::AssertedOriginMismatch;
        }

        let Ok(url) = Url::parse(origin) else {
            return OriginValidationResult::AssertedOriginMismatch;
        };
        if !url.scheme().eq_ignore_ascii_case("https") {
            return OriginValidationResult::AssertedOriginMismatch;
        }
        let Some(domain) = url.domain() else {
            return OriginValidationResult::AssertedOriginMismatch;
        };
        if domain != rp_id && !domain.ends_with(&format!(".{rp_id}")) {
            return OriginValidationResult::AssertedOriginMismatch;
        }

        OriginValidationResult::Valid
    }

    async fn validate_package_association(
        &self,
        app: &CallingAppInfo,
        rp_id: &str,
    ) -> OriginValidationResult {
        if !is_valid_rp_id(rp_id) {
            return OriginValidationResult::PackageMismatch;
        }

        match self
            .associations
            .is_package_associated(rp_id, &app.package_name, &app.certificates)
            .await
        {
            Ok(true) => OriginValidationResult::Valid,
            Ok(false) => OriginValidationResult::PackageMismatch,
            Err(AssociationError::Unreachable) => {
                log::debug!("association lookup for {rp_id} unreachable");
                OriginValidationResult::ValidatorUnavailable
            }
        }
    }
}

/// Assert `rp_id` is a registerable domain and not part of the public suffix list, since
/// a public-suffix rp id would let a credential act for unrelated services.
fn is_valid_rp_id(rp_id: &str) -> bool {
    decode_host(rp_id)
        .as_ref()
        .and_then(|host| {
            public_suffix::DEFAULT_PROVIDER
                .effective_tld_plus_one(host)
                .ok()
        })
        .is_some()
}

/// Returns a decoded [String] if the domain name is punycode otherwise
/// the original string reference [str] is returned.
fn decode_host(host: &str) -> Option<Cow<str>> {
    if host.split('.').any(|s| s.starts_with("xn--")) {
        let (decoded, result) = idna::domain_to_unicode(host);
        result.ok().map(|_| Cow::from(decoded))
    } else {
        Some(Cow::from(host))
    }
}
