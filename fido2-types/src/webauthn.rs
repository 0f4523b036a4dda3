//! The types describing the webauthn operations this provider supports, along with the
//! response wire format the platform credential manager expects back.

use serde::{Deserialize, Serialize};
use typeshare::typeshare;

use crate::{
    utils::serde::ignore_unknown,
    Bytes,
};

mod assertion;
mod attestation;
mod common;

pub use self::{assertion::*, attestation::*, common::*};

/// The response of a successful webauthn operation, handed back to the platform layer as
/// JSON. `R` is either an [`AuthenticatorAttestationResponse`] for credential creation or
/// an [`AuthenticatorAssertionResponse`] for authentication.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyCredential<R> {
    /// The credential ID, as the base64url encoded data of [`Self::raw_id`].
    ///
    /// The credential ID is used to look up credentials for use and is therefore expected
    /// to be globally unique with high probability across all credentials.
    pub id: String,

    /// The raw bytes containing the credential ID, see [`Self::id`] for more information.
    pub raw_id: Bytes,

    /// Always [`PublicKeyCredentialType::PublicKey`]
    #[serde(rename = "type", deserialize_with = "ignore_unknown")]
    pub ty: PublicKeyCredentialType,

    /// The modality of the communication between the client and authenticator. A vault
    /// backed credential always reports [`AuthenticatorAttachment::Platform`].
    pub authenticator_attachment: AuthenticatorAttachment,

    /// The authenticator's response to the request.
    pub response: R,

    /// Map of extension identifier → client extension output entries produced by the
    /// extension's client extension processing.
    #[serde(default)]
    pub client_extension_results: ClientExtensionResults,
}

impl<R: Serialize> PublicKeyCredential<R> {
    /// Serialize this credential into the JSON form expected by the platform layer.
    pub fn to_response_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Client extension output entries.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[typeshare]
pub struct ClientExtensionResults {
    /// The output of the credential properties extension.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cred_props: Option<CredentialPropertiesOutput>,
}

/// Output of the credential properties extension, reporting properties of the newly
/// created credential back to the relying party.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[typeshare]
pub struct CredentialPropertiesOutput {
    /// The resident key credential property, a boolean indicating whether the returned
    /// [`PublicKeyCredential`] is a client-side discoverable credential.
    #[serde(rename = "rk", default, skip_serializing_if = "Option::is_none")]
    pub discoverable: Option<bool>,
}

/// The client data represents the contextual bindings of both the relying party and the
/// client platform. Its serialization is signed over, which lets the relying party verify
/// which origin the response was produced for.
///
/// <https://w3c.github.io/webauthn/#dictdef-collectedclientdata>
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectedClientData {
    /// Either `webauthn.create` or `webauthn.get`, to prevent signatures produced for one
    /// ceremony being replayed in the other.
    #[serde(rename = "type")]
    pub ty: ClientDataType,

    /// The base64url encoding of the challenge provided by the relying party.
    pub challenge: String,

    /// The fully qualified origin of the requester, as provided to the authenticator by
    /// the client.
    pub origin: String,

    /// Whether the request was made from an iframe that is not same-origin with its
    /// ancestors. Requests marshalled through the platform credential manager never are.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cross_origin: Option<bool>,
}

/// Used to limit the values of [`CollectedClientData::ty`] and serializes to static
/// strings.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ClientDataType {
    /// Serializes to the string `"webauthn.create"`
    #[serde(rename = "webauthn.create")]
    Create,

    /// Serializes to the string `"webauthn.get"`
    #[serde(rename = "webauthn.get")]
    Get,
}
