//! The credential operation state machine.
//!
//! Each public method drives one request from raw JSON to a terminal result: decode,
//! validate the caller, verify the user, perform the cryptographic work, and only then
//! touch the vault. Every exit path flows through the result mapper so the platform layer
//! only ever sees `Success`, `Error` or `Cancelled`.

use ciborium::cbor;
use coset::{
    iana::{self, EnumI64},
    CborSerializable, CoseKey,
};

use fido2_types::{
    encoding,
    request::{CallingAppInfo, CredentialAssertionRequest, CredentialRequest},
    result::{AuthenticateCredentialResult, OriginValidationResult, RegisterCredentialResult},
    webauthn::{
        AuthenticatedPublicKeyCredential, AuthenticatorAssertionResponse,
        AuthenticatorAttachment, AuthenticatorAttestationResponse, AuthenticatorTransport,
        ClientDataType, ClientExtensionResults, CollectedClientData, CreatedPublicKeyCredential,
        CredentialPropertiesOutput, PublicKeyCredentialCreationOptions,
        PublicKeyCredentialParameters, PublicKeyCredentialRequestOptions,
        PublicKeyCredentialType, UserVerificationRequirement,
    },
    Flags,
};

use crate::{
    crypto::{public_key_der_from_cose_key, sha256, CryptoService},
    error::{CryptoError, Fido2Error, Interruption},
    mapper,
    origin::{AppAssociationSource, OriginValidator},
    prompt::{UserPrompter, UserSelection, UserVerification},
    selector::{select_candidates, CandidateMatch},
    session::SessionContext,
    store::{Fido2CredentialMetadata, VaultCredentialSource, VaultStore},
};

/// Vault credentials have no hardware attestation root, so the authenticator identifier
/// stays zeroed as required for the `none` attestation format.
const AAGUID: [u8; 16] = [0; 16];

/// Drives credential creation and assertion against a vault.
///
/// The engine owns no policy of its own beyond the protocol: storage, cryptography,
/// prompting and association lookup are all injected, and the session context carries the
/// user-verified posture shared with the host's unlock flow.
pub struct CredentialEngine<V, C, P, A> {
    vault: V,
    crypto: C,
    prompter: P,
    validator: OriginValidator<A>,
    session: SessionContext,
}

impl<V, C, P, A> CredentialEngine<V, C, P, A>
where
    V: VaultStore + Send + Sync,
    C: CryptoService + Send + Sync,
    P: UserPrompter + Send + Sync,
    A: AppAssociationSource + Send + Sync,
{
    /// Create an engine over the given collaborators.
    pub fn new(
        vault: V,
        crypto: C,
        prompter: P,
        validator: OriginValidator<A>,
        session: SessionContext,
    ) -> Self {
        Self {
            vault,
            crypto,
            prompter,
            validator,
            session,
        }
    }

    /// The session context shared with the host's unlock and verification flow.
    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Read access to the vault collaborator.
    pub fn vault(&self) -> &V {
        &self.vault
    }

    /// Create a new credential backed by the vault entry `entry_id` and return the
    /// attestation response for it.
    pub async fn register(
        &mut self,
        request: &CredentialRequest,
        entry_id: &str,
    ) -> RegisterCredentialResult {
        mapper::map_registration(self.try_register(request, entry_id).await)
    }

    /// Assert possession of an existing vault credential.
    pub async fn authenticate(
        &self,
        request: &CredentialAssertionRequest,
    ) -> AuthenticateCredentialResult {
        mapper::map_assertion(self.try_authenticate(request).await)
    }

    async fn try_register(
        &mut self,
        request: &CredentialRequest,
        entry_id: &str,
    ) -> Result<String, Interruption> {
        let options = PublicKeyCredentialCreationOptions::from_request_json(&request.request_json)
            .ok_or(Fido2Error::Decode)?;

        let validation = self
            .validator
            .validate(&request.calling_app, &options.rp.id)
            .await;
        if validation != OriginValidationResult::Valid {
            return Err(Fido2Error::Validation(validation).into());
        }

        let user_verified = self.ensure_user_verified(options.user_verification()).await?;

        let entries = self
            .vault
            .lookup_entries_for_user(&request.user_id)
            .await
            .map_err(|_| Fido2Error::Selection)?;
        let excluded: Vec<_> = options
            .exclude_credentials
            .iter()
            .flatten()
            .filter(|descriptor| descriptor.is_known())
            .map(|descriptor| &descriptor.id)
            .collect();
        if entries.iter().any(|entry| {
            entry
                .fido2
                .as_ref()
                .is_some_and(|metadata| excluded.contains(&&metadata.credential_id))
        }) {
            return Err(Fido2Error::Excluded.into());
        }

        let algorithm = choose_algorithm(&options.pub_key_cred_params)?;

        let client_data = CollectedClientData {
            ty: ClientDataType::Create,
            challenge: encoding::base64url(&options.challenge),
            origin: client_origin(&request.calling_app),
            cross_origin: Some(false),
        };
        let client_data_json =
            serde_json::to_vec(&client_data).map_err(|_| Fido2Error::Internal)?;

        let created = self
            .crypto
            .create_key_pair(entry_id, algorithm, &options.user.id)
            .await
            .map_err(Fido2Error::Crypto)?;

        let attested = attested_credential_data(&created.credential_id, created.public_key.clone())?;
        let mut flags = Flags::default() | Flags::UP | Flags::AT;
        if user_verified {
            flags |= Flags::UV;
        }
        let auth_data = authenticator_data(&options.rp.id, flags, 0, Some(&attested));
        let attestation_object = attestation_object(&auth_data)?;

        let public_key = public_key_der_from_cose_key(&created.public_key)?;
        let credential = CreatedPublicKeyCredential {
            id: encoding::base64url(&created.credential_id),
            raw_id: created.credential_id.clone(),
            ty: PublicKeyCredentialType::PublicKey,
            authenticator_attachment: AuthenticatorAttachment::Platform,
            response: AuthenticatorAttestationResponse {
                client_data_json: client_data_json.into(),
                authenticator_data: auth_data.into(),
                public_key: Some(public_key),
                public_key_algorithm: algorithm.to_i64(),
                attestation_object: attestation_object.into(),
                transports: vec![
                    AuthenticatorTransport::Internal,
                    AuthenticatorTransport::Hybrid,
                ],
            },
            client_extension_results: ClientExtensionResults {
                cred_props: Some(CredentialPropertiesOutput {
                    discoverable: Some(true),
                }),
            },
        };
        let response_json = credential
            .to_response_json()
            .map_err(|_| Fido2Error::Internal)?;

        let metadata = Fido2CredentialMetadata {
            credential_id: created.credential_id,
            rp_id: options.rp.id.clone(),
            rp_name: options.rp.name.clone(),
            user_handle: Some(options.user.id.clone()),
            user_name: options.user.name.clone(),
            user_display_name: options.user.display_name.clone(),
            counter: 0,
            discoverable: true,
        };
        self.vault
            .commit_new_credential(entry_id, metadata)
            .await
            .map_err(|_| Fido2Error::Commit)?;

        Ok(response_json)
    }

    async fn try_authenticate(
        &self,
        request: &CredentialAssertionRequest,
    ) -> Result<String, Interruption> {
        let options = PublicKeyCredentialRequestOptions::from_request_json(&request.request_json)
            .ok_or(Fido2Error::Decode)?;

        let validation = self
            .validator
            .validate(&request.calling_app, &options.rp_id)
            .await;
        if validation != OriginValidationResult::Valid {
            return Err(Fido2Error::Validation(validation).into());
        }

        let mut entries = self
            .vault
            .lookup_entries_for_user(&request.user_id)
            .await
            .map_err(|_| Fido2Error::Selection)?;
        if let Some(cipher_id) = &request.cipher_id {
            entries.retain(|entry| &entry.entry_id == cipher_id);
        }
        let allowed: Vec<_> = options
            .allow_credentials
            .iter()
            .flatten()
            .filter(|descriptor| descriptor.is_known())
            .map(|descriptor| descriptor.id.clone())
            .collect();
        if !allowed.is_empty() {
            entries.retain(|entry| {
                entry
                    .fido2
                    .as_ref()
                    .is_some_and(|metadata| allowed.contains(&metadata.credential_id))
            });
        }

        let source = match select_candidates(
            &options.rp_id,
            request.credential_id.as_ref(),
            entries,
        ) {
            CandidateMatch::None => return Err(Fido2Error::Selection.into()),
            CandidateMatch::One(source) => source,
            CandidateMatch::Many(candidates) => self.resolve_ambiguity(candidates).await?,
        };
        let metadata = source.fido2.as_ref().ok_or(Fido2Error::Selection)?;

        let user_verified = self.ensure_user_verified(options.user_verification).await?;

        let mut flags = Flags::default() | Flags::UP;
        if user_verified {
            flags |= Flags::UV;
        }
        let auth_data = authenticator_data(&options.rp_id, flags, metadata.counter, None);

        // A pre-hashed channel signs over the platform supplied hash and returns no
        // client data; otherwise the engine builds the client data itself.
        let (client_data_json, client_data_hash) = match &request.client_data_hash {
            Some(hash) => (None, hash.clone()),
            None => {
                let client_data = CollectedClientData {
                    ty: ClientDataType::Get,
                    challenge: encoding::base64url(&options.challenge),
                    origin: client_origin(&request.calling_app),
                    cross_origin: Some(false),
                };
                let json =
                    serde_json::to_vec(&client_data).map_err(|_| Fido2Error::Internal)?;
                let hash = sha256(&json).to_vec();
                (Some(json), hash)
            }
        };

        let mut message = auth_data.clone();
        message.extend_from_slice(&client_data_hash);
        let signature = self
            .crypto
            .sign_assertion(&source.entry_id, &message)
            .await
            .map_err(Fido2Error::Crypto)?;

        let credential = AuthenticatedPublicKeyCredential {
            id: encoding::base64url(&metadata.credential_id),
            raw_id: metadata.credential_id.clone(),
            ty: PublicKeyCredentialType::PublicKey,
            authenticator_attachment: AuthenticatorAttachment::Platform,
            response: AuthenticatorAssertionResponse {
                client_data_json: client_data_json.map(Into::into),
                authenticator_data: auth_data.into(),
                signature: signature.into(),
                user_handle: metadata.user_handle.clone(),
            },
            client_extension_results: ClientExtensionResults::default(),
        };
        credential
            .to_response_json()
            .map_err(|_| Fido2Error::Internal.into())
    }

    async fn resolve_ambiguity(
        &self,
        candidates: Vec<VaultCredentialSource>,
    ) -> Result<VaultCredentialSource, Interruption> {
        match self.prompter.request_user_selection(&candidates).await {
            UserSelection::Chosen(entry_id) => candidates
                .into_iter()
                .find(|candidate| candidate.entry_id == entry_id)
                .ok_or_else(|| Fido2Error::Selection.into()),
            UserSelection::Cancelled => Err(Interruption::Cancelled),
        }
    }

    /// Satisfy the request's user verification requirement, prompting when the session
    /// has not seen an explicit verification event yet.
    ///
    /// Returns whether the UV flag may be set. A dismissed prompt cancels the operation
    /// outright; an unavailable verifier fails a `required` request and degrades a
    /// `preferred` one.
    async fn ensure_user_verified(
        &self,
        requirement: UserVerificationRequirement,
    ) -> Result<bool, Interruption> {
        if self.session.is_user_verified() {
            // The flag still reports truthfully even when the relying party discouraged
            // verification, since the verification event already happened.
            return Ok(true);
        }
        if requirement == UserVerificationRequirement::Discouraged {
            return Ok(false);
        }

        match self.prompter.request_user_verification().await {
            UserVerification::Verified => {
                self.session.set_user_verified(true);
                Ok(true)
            }
            UserVerification::Cancelled => Err(Interruption::Cancelled),
            UserVerification::Unavailable => {
                if requirement == UserVerificationRequirement::Required {
                    Err(CryptoError::VerificationUnavailable.into())
                } else {
                    Ok(false)
                }
            }
        }
    }
}

/// Pick the first relying party proposed algorithm the crypto stack supports. Only ES256
/// is implemented, matching what effectively every relying party offers first.
fn choose_algorithm(
    params: &[PublicKeyCredentialParameters],
) -> Result<iana::Algorithm, CryptoError> {
    params
        .iter()
        .find(|param| {
            param.ty == PublicKeyCredentialType::PublicKey
                && param.alg == iana::Algorithm::ES256
        })
        .map(|param| param.alg)
        .ok_or(CryptoError::UnsupportedAlgorithm)
}

/// The origin string embedded in the client data.
///
/// Privileged callers provide it directly; for ordinary applications it is derived from
/// the signing certificate in the `android:apk-key-hash` form relying parties verify
/// against their asset links.
fn client_origin(app: &CallingAppInfo) -> String {
    if let Some(origin) = &app.origin {
        origin.trim_end_matches('/').to_owned()
    } else if let Some(certificate) = app.certificates.first() {
        format!(
            "android:apk-key-hash:{}",
            encoding::base64url(certificate.as_bytes())
        )
    } else {
        app.package_name.clone()
    }
}

/// Serialize the authenticator data: rpIdHash ‖ flags ‖ signCount ‖ attestedCredentialData.
///
/// <https://w3c.github.io/webauthn/#sctn-authenticator-data>
fn authenticator_data(
    rp_id: &str,
    flags: Flags,
    counter: u32,
    attested_credential_data: Option<&[u8]>,
) -> Vec<u8> {
    let attested = attested_credential_data.unwrap_or_default();
    let mut data = Vec::with_capacity(37 + attested.len());
    data.extend_from_slice(&sha256(rp_id.as_bytes()));
    data.push(flags.bits());
    data.extend_from_slice(&counter.to_be_bytes());
    data.extend_from_slice(attested);
    data
}

/// Serialize the attested credential data: AAGUID ‖ credentialIdLength ‖ credentialId ‖
/// credentialPublicKey.
fn attested_credential_data(
    credential_id: &[u8],
    public_key: CoseKey,
) -> Result<Vec<u8>, Fido2Error> {
    let id_length = u16::try_from(credential_id.len()).map_err(|_| Fido2Error::Internal)?;
    let key = public_key.to_vec().map_err(|_| Fido2Error::Internal)?;

    let mut data = Vec::with_capacity(18 + credential_id.len() + key.len());
    data.extend_from_slice(&AAGUID);
    data.extend_from_slice(&id_length.to_be_bytes());
    data.extend_from_slice(credential_id);
    data.extend(key);
    Ok(data)
}

/// CBOR encode the attestation object in the `none` format, which carries an empty
/// attestation statement.
fn attestation_object(auth_data: &[u8]) -> Result<Vec<u8>, Fido2Error> {
    let object = ciborium::cbor!({
        "fmt" => "none",
        "attStmt" => {},
        "authData" => ciborium::value::Value::Bytes(auth_data.to_vec()),
    })
    .map_err(|_| Fido2Error::Internal)?;

    let mut bytes = Vec::new();
    ciborium::ser::into_writer(&object, &mut bytes).map_err(|_| Fido2Error::Internal)?;
    Ok(bytes)
}
