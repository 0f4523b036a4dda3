//! Types specific to authentication, better known as assertions.

use serde::{Deserialize, Serialize};
use typeshare::typeshare;

use crate::{
    utils::serde::{ignore_unknown, ignore_unknown_opt_vec},
    webauthn::{PublicKeyCredential, PublicKeyCredentialDescriptor, UserVerificationRequirement},
    Bytes,
};

/// The response of a successful authentication with a [`PublicKeyCredential`].
pub type AuthenticatedPublicKeyCredential = PublicKeyCredential<AuthenticatorAssertionResponse>;

/// The request for asserting possession of an existing credential, as delivered by the
/// platform credential manager in its raw JSON form.
///
/// <https://w3c.github.io/webauthn/#dictdef-publickeycredentialrequestoptions>
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[typeshare]
pub struct PublicKeyCredentialRequestOptions {
    /// The challenge that the selected authenticator signs, along with other data, when
    /// producing an authentication assertion.
    pub challenge: Bytes,

    /// The relying party identifier claimed by the caller.
    pub rp_id: String,

    /// A list of public key credentials acceptable to the caller, in descending order of
    /// preference. An empty or absent list lets the user pick among all discoverable
    /// credentials bound to the relying party.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "ignore_unknown_opt_vec"
    )]
    pub allow_credentials: Option<Vec<PublicKeyCredentialDescriptor>>,

    /// The relying party's requirements regarding user verification for this operation.
    #[serde(default, deserialize_with = "ignore_unknown")]
    pub user_verification: UserVerificationRequirement,
}

impl PublicKeyCredentialRequestOptions {
    /// Decode assertion options from the request JSON delivered by the platform layer.
    ///
    /// Returns `None` when a required field is missing or of the wrong type, or when the
    /// challenge is empty. Unknown fields are ignored for forward compatibility. This
    /// never yields a partially populated structure.
    pub fn from_request_json(raw: &str) -> Option<Self> {
        let options: Self = serde_json::from_str(raw).ok()?;

        if options.rp_id.is_empty() || options.challenge.is_empty() {
            return None;
        }

        Some(options)
    }
}

/// The authenticator's response to a client's request for generation of a new
/// authentication assertion given the relying party's challenge.
///
/// This response contains a cryptographic signature proving possession of the credential
/// private key.
///
/// <https://w3c.github.io/webauthn/#authenticatorassertionresponse>
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[typeshare]
pub struct AuthenticatorAssertionResponse {
    /// The JSON serialized client data passed to the authenticator in order to generate
    /// this assertion, absent when the platform supplied a pre-hashed client data channel
    /// instead.
    #[serde(rename = "clientDataJSON", skip_serializing_if = "Option::is_none")]
    pub client_data_json: Option<Bytes>,

    /// The authenticator data the signature was produced over.
    pub authenticator_data: Bytes,

    /// The raw signature returned from the authenticator.
    pub signature: Bytes,

    /// The user handle the credential was registered with, if any.
    pub user_handle: Option<Bytes>,
}

#[cfg(test)]
mod tests {
    use super::PublicKeyCredentialRequestOptions;
    use crate::webauthn::UserVerificationRequirement;

    fn options_json() -> serde_json::Value {
        serde_json::json!({
            "challenge": "q5s5yZRyuQzGPLD7yzSHYQ",
            "rpId": "example.com",
            "allowCredentials": [
                { "type": "public-key", "id": "Y3JlZC1pZA" }
            ],
            "userVerification": "required"
        })
    }

    #[test]
    fn decodes_assertion_options() {
        let options =
            PublicKeyCredentialRequestOptions::from_request_json(&options_json().to_string())
                .expect("should decode");
        assert_eq!(options.rp_id, "example.com");
        assert_eq!(
            options.user_verification,
            UserVerificationRequirement::Required
        );
        assert_eq!(options.allow_credentials.unwrap().len(), 1);
    }

    #[test]
    fn missing_rp_id_yields_none() {
        let mut value = options_json();
        value.as_object_mut().unwrap().remove("rpId");
        assert!(
            PublicKeyCredentialRequestOptions::from_request_json(&value.to_string()).is_none()
        );
    }

    #[test]
    fn unknown_user_verification_falls_back_to_preferred() {
        let mut value = options_json();
        value["userVerification"] = serde_json::json!("biometric-only");
        let options =
            PublicKeyCredentialRequestOptions::from_request_json(&value.to_string())
                .expect("should decode");
        assert_eq!(
            options.user_verification,
            UserVerificationRequirement::Preferred
        );
    }

    #[test]
    fn malformed_json_yields_none() {
        assert!(PublicKeyCredentialRequestOptions::from_request_json("not json").is_none());
        assert!(PublicKeyCredentialRequestOptions::from_request_json("{}").is_none());
    }
}
