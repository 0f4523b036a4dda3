//! Types specific to public key credential creation.

use serde::{Deserialize, Serialize};
use typeshare::typeshare;

use crate::{
    utils::serde::{ignore_unknown, ignore_unknown_vec},
    webauthn::{
        AuthenticatorTransport, PublicKeyCredential, PublicKeyCredentialDescriptor,
        PublicKeyCredentialParameters, PublicKeyCredentialRpEntity,
        PublicKeyCredentialUserEntity, UserVerificationRequirement,
    },
    Bytes,
};

/// The response to the successful creation of a [`PublicKeyCredential`].
pub type CreatedPublicKeyCredential = PublicKeyCredential<AuthenticatorAttestationResponse>;

/// The request for creating a [`PublicKeyCredential`], as delivered by the platform
/// credential manager in its raw JSON form.
///
/// <https://w3c.github.io/webauthn/#dictdef-publickeycredentialcreationoptions>
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[typeshare]
pub struct PublicKeyCredentialCreationOptions {
    /// A name and an identifier for the relying party responsible for the request.
    pub rp: PublicKeyCredentialRpEntity,

    /// Names and an identifier for the user account performing the registration. The
    /// user handle can be returned as `userHandle` in future authentication ceremonies.
    pub user: PublicKeyCredentialUserEntity,

    /// A challenge that the authenticator signs, along with other data, when producing
    /// an attestation object for the newly created credential.
    pub challenge: Bytes,

    /// The key types and signature algorithms the relying party supports, ordered from
    /// most preferred to least preferred. Entries of unknown credential type are dropped
    /// during deserialization.
    #[serde(deserialize_with = "ignore_unknown_vec")]
    pub pub_key_cred_params: Vec<PublicKeyCredentialParameters>,

    /// Credentials the relying party already knows about for this user account; a new
    /// credential must not be created on an authenticator that already holds one of these.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_credentials: Option<Vec<PublicKeyCredentialDescriptor>>,

    /// Capabilities and settings the authenticator must or should satisfy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authenticator_selection: Option<AuthenticatorSelectionCriteria>,
}

impl PublicKeyCredentialCreationOptions {
    /// Decode creation options from the request JSON delivered by the platform layer.
    ///
    /// Returns `None` when a required field is missing or of the wrong type, when the
    /// challenge is empty, or when no supported credential parameter survives
    /// deserialization. Unknown fields are ignored for forward compatibility. This never
    /// yields a partially populated structure.
    pub fn from_request_json(raw: &str) -> Option<Self> {
        let options: Self = serde_json::from_str(raw).ok()?;

        if options.rp.id.is_empty() || options.challenge.is_empty() {
            return None;
        }

        if options.pub_key_cred_params.is_empty() {
            return None;
        }

        Some(options)
    }

    /// The effective user verification requirement of this request.
    pub fn user_verification(&self) -> UserVerificationRequirement {
        self.authenticator_selection
            .as_ref()
            .map(|selection| selection.user_verification)
            .unwrap_or_default()
    }
}

/// Relying parties may use this type to specify their requirements regarding
/// authenticator attributes.
///
/// <https://w3c.github.io/webauthn/#dictdef-authenticatorselectioncriteria>
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[typeshare]
pub struct AuthenticatorSelectionCriteria {
    /// The relying party's requirements regarding user verification for the `create()`
    /// operation. An unknown value falls back to the default of
    /// [`UserVerificationRequirement::Preferred`].
    #[serde(default, deserialize_with = "ignore_unknown")]
    pub user_verification: UserVerificationRequirement,

    /// Whether the relying party requires a client-side discoverable credential.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_resident_key: Option<bool>,
}

/// The authenticator's response to a client's request for the creation of a new public
/// key credential.
///
/// <https://w3c.github.io/webauthn/#authenticatorattestationresponse>
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[typeshare]
pub struct AuthenticatorAttestationResponse {
    /// The JSON serialized client data passed to the authenticator in order to generate
    /// this attestation.
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: Bytes,

    /// The authenticator data contained within the attestation object, provided here
    /// directly as one of the easy credential data accessors.
    pub authenticator_data: Bytes,

    /// The DER SubjectPublicKeyInfo of the newly created credential, or `None` if this is
    /// not available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key: Option<Bytes>,

    /// The COSE algorithm identifier of the newly created credential.
    pub public_key_algorithm: i64,

    /// The CBOR encoded attestation object containing the authenticator data and the
    /// attestation statement.
    pub attestation_object: Bytes,

    /// The transports the authenticator is believed to support.
    pub transports: Vec<AuthenticatorTransport>,
}
