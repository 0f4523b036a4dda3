//! Common types used in both attestation (registration) and assertion (authentication).

use coset::iana;
use serde::{Deserialize, Serialize};
use typeshare::typeshare;

use crate::{
    utils::serde::{i64_to_iana, ignore_unknown, ignore_unknown_opt_vec},
    Bytes,
};

/// This enumeration defines the valid credential types. It is an extension point; values
/// can be added to it in the future, as more credential types are defined.
///
/// <https://w3c.github.io/webauthn/#enumdef-publickeycredentialtype>
#[derive(Debug, Default, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
#[typeshare(serialized_as = "String")]
pub enum PublicKeyCredentialType {
    /// Currently the only type defined is a `PublicKey` meaning the public counterpart of
    /// an asymmetric key pair.
    PublicKey,
    /// This is the default as it will be ignored if the value is unknown during
    /// deserialization.
    #[default]
    Unknown,
}

/// Identifies a specific public key credential. Used in
/// [`exclude_credentials`][crate::webauthn::PublicKeyCredentialCreationOptions::exclude_credentials]
/// to prevent creating duplicate credentials and in
/// [`allow_credentials`][crate::webauthn::PublicKeyCredentialRequestOptions::allow_credentials]
/// to determine if and how the credential can currently be reached.
///
/// <https://w3c.github.io/webauthn/#dictdef-publickeycredentialdescriptor>
#[derive(Debug, Serialize, Deserialize, Clone)]
#[typeshare]
pub struct PublicKeyCredentialDescriptor {
    /// The type of the public key credential the caller is referring to. Descriptors of
    /// [`PublicKeyCredentialType::Unknown`] type must be ignored.
    #[serde(rename = "type", deserialize_with = "ignore_unknown")]
    pub ty: PublicKeyCredentialType,

    /// The credential ID of the public key credential the caller is referring to.
    pub id: Bytes,

    /// Optional hint as to how the client might communicate with the managing
    /// authenticator of the credential. Unknown values are ignored.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "ignore_unknown_opt_vec"
    )]
    pub transports: Option<Vec<AuthenticatorTransport>>,
}

impl PublicKeyCredentialDescriptor {
    /// Checks whether [`Self::ty`] is not of value [`PublicKeyCredentialType::Unknown`].
    pub fn is_known(&self) -> bool {
        match self.ty {
            PublicKeyCredentialType::PublicKey => true,
            PublicKeyCredentialType::Unknown => false,
        }
    }
}

/// A pair of credential type and cryptographic algorithm a relying party supports.
///
/// <https://w3c.github.io/webauthn/#dictdef-publickeycredentialparameters>
#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct PublicKeyCredentialParameters {
    /// The type of credential to be created.
    #[serde(rename = "type", deserialize_with = "ignore_unknown")]
    pub ty: PublicKeyCredentialType,

    /// The cryptographic signature algorithm with which the newly generated credential
    /// will be used, and thus also the type of asymmetric key pair to be generated.
    #[serde(with = "i64_to_iana")]
    pub alg: iana::Algorithm,
}

/// A relying party may require user verification for some of its operations but not for
/// others, and may use this type to express its needs.
///
/// <https://w3c.github.io/webauthn/#enumdef-userverificationrequirement>
#[derive(Debug, Default, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[typeshare(serialized_as = "String")]
pub enum UserVerificationRequirement {
    /// The relying party requires user verification for the operation and will fail the
    /// overall ceremony if the response does not have the UV flag set.
    Required,

    /// The relying party prefers user verification for the operation if possible, but
    /// will not fail the operation if the response does not have the UV flag set.
    #[default]
    Preferred,

    /// The relying party does not want user verification employed during the operation.
    Discouraged,
}

/// Hints as to how clients might communicate with a particular authenticator in order to
/// obtain an assertion for a specific credential.
///
/// <https://w3c.github.io/webauthn/#enum-transport>
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[typeshare(serialized_as = "String")]
pub enum AuthenticatorTransport {
    /// The authenticator can be contacted over removable USB.
    Usb,

    /// The authenticator can be contacted over Near Field Communication (NFC).
    Nfc,

    /// The authenticator can be contacted over Bluetooth Low Energy (BLE).
    Ble,

    /// The authenticator can be contacted using a combination of (often separate)
    /// data-transport and proximity mechanisms.
    #[serde(alias = "cable")]
    Hybrid,

    /// The authenticator is contacted using a client device-specific transport, i.e. it
    /// is a platform authenticator.
    Internal,
}

/// Describes an authenticator's attachment modality.
///
/// <https://w3c.github.io/webauthn/#enumdef-authenticatorattachment>
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
#[typeshare(serialized_as = "String")]
pub enum AuthenticatorAttachment {
    /// Attached using a client device-specific transport and is usually not removable
    /// from the client device. A vault entry is always of this kind.
    Platform,

    /// Roams between client devices using a cross-platform transport.
    CrossPlatform,
}

/// A name and identifier for the relying party responsible for a request.
///
/// <https://w3c.github.io/webauthn/#dictdef-publickeycredentialrpentity>
#[derive(Debug, Serialize, Deserialize, Clone)]
#[typeshare]
pub struct PublicKeyCredentialRpEntity {
    /// A unique identifier for the relying party entity.
    pub id: String,

    /// A human-palatable identifier for the relying party, intended only for display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Names and an identifier for the user account performing a registration.
///
/// <https://w3c.github.io/webauthn/#dictdef-publickeycredentialuserentity>
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
#[typeshare]
pub struct PublicKeyCredentialUserEntity {
    /// The user handle of the user account. A user handle is an opaque byte sequence
    /// with a maximum size of 64 bytes, and is not meant to be displayed to the user.
    pub id: Bytes,

    /// A human-palatable identifier for the user account, such as a username or email
    /// address, intended only for display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// A human-palatable name for the user account, such as the user's full name,
    /// intended only for display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}
