//! End to end scenarios driving the engine through its public contract with mocked
//! collaborators.

use fido2_types::{
    request::{
        CallingAppInfo, CertificateFingerprint, CredentialAssertionRequest, CredentialRequest,
    },
    result::{AuthenticateCredentialResult, RegisterCredentialResult},
};

use crate::{
    error::{AssociationError, VaultError},
    store::{Fido2CredentialMetadata, VaultCredentialSource, VaultStore},
    CredentialEngine, MemoryVault, MockAppAssociationSource, MockCryptoService,
    MockUserPrompter, OriginValidator, PrivilegedAppPolicy, SessionContext,
    SoftwareCryptoService, UserSelection, UserVerification,
};

const PINNED: &str = "B3:5B:68:D5:CE:84:50:55:7C:6A:55:FD:64:B5:1F:EA:C1:10:CB:36:D6:A3:52:1C:59:48:DB:3A:38:0A:34:A9";

fn creation_request(user_verification: &str) -> CredentialRequest {
    CredentialRequest {
        user_id: "user-1".to_owned(),
        request_json: serde_json::json!({
            "rp": { "id": "example.com", "name": "Example" },
            "user": {
                "id": "dXNlci1oYW5kbGU",
                "name": "user@example.com",
                "displayName": "User Example"
            },
            "challenge": "c29tZS1jaGFsbGVuZ2U",
            "pubKeyCredParams": [ { "type": "public-key", "alg": -7 } ],
            "authenticatorSelection": { "userVerification": user_verification }
        })
        .to_string(),
        calling_app: ordinary_app(),
    }
}

fn assertion_request(allow: Option<&[u8]>) -> CredentialAssertionRequest {
    let mut options = serde_json::json!({
        "challenge": "YW5vdGhlci1jaGFsbGVuZ2U",
        "rpId": "example.com",
        "userVerification": "preferred"
    });
    if let Some(id) = allow {
        options["allowCredentials"] = serde_json::json!([
            { "type": "public-key", "id": fido2_types::encoding::base64url(id) }
        ]);
    }
    CredentialAssertionRequest {
        user_id: "user-1".to_owned(),
        cipher_id: None,
        credential_id: None,
        request_json: options.to_string(),
        client_data_hash: None,
        calling_app: ordinary_app(),
    }
}

fn ordinary_app() -> CallingAppInfo {
    CallingAppInfo {
        package_name: "com.example.app".to_owned(),
        certificates: vec![CertificateFingerprint::new([0x11; 32])],
        origin: None,
    }
}

fn passkey_entry(entry_id: &str, name: &str, credential_id: &[u8]) -> VaultCredentialSource {
    VaultCredentialSource {
        entry_id: entry_id.to_owned(),
        name: name.to_owned(),
        fido2: Some(Fido2CredentialMetadata {
            credential_id: credential_id.into(),
            rp_id: "example.com".to_owned(),
            rp_name: Some("Example".to_owned()),
            user_handle: Some(b"user-handle".as_slice().into()),
            user_name: Some("user@example.com".to_owned()),
            user_display_name: None,
            counter: 0,
            discoverable: true,
        }),
    }
}

fn plain_entry(entry_id: &str) -> VaultCredentialSource {
    VaultCredentialSource {
        entry_id: entry_id.to_owned(),
        name: "Website login".to_owned(),
        fido2: None,
    }
}

fn associated_validator() -> OriginValidator<MockAppAssociationSource> {
    let mut associations = MockAppAssociationSource::new();
    associations
        .expect_is_package_associated()
        .returning(|_, _, _| Ok(true));
    OriginValidator::new(PrivilegedAppPolicy::builtin(), associations)
}

fn verifying_prompter() -> MockUserPrompter {
    let mut prompter = MockUserPrompter::new();
    prompter
        .expect_request_user_verification()
        .returning(|| UserVerification::Verified);
    prompter
}

#[tokio::test]
async fn registration_produces_a_committed_attestation_response() {
    let vault = MemoryVault::new(vec![plain_entry("entry-1")]);
    let mut engine = CredentialEngine::new(
        vault,
        SoftwareCryptoService::new(),
        verifying_prompter(),
        associated_validator(),
        SessionContext::new(),
    );

    let result = engine.register(&creation_request("required"), "entry-1").await;

    let RegisterCredentialResult::Success(json) = result else {
        panic!("expected a successful registration, got {result:?}");
    };
    let value: serde_json::Value =
        serde_json::from_str(&json).expect("response should be valid JSON");
    assert_eq!(value["type"], "public-key");
    assert!(!value["id"].as_str().expect("id").is_empty());
    assert_eq!(value["authenticatorAttachment"], "platform");
    assert_eq!(value["response"]["publicKeyAlgorithm"], -7);
    assert!(value["response"]["attestationObject"].is_string());
    assert_eq!(value["clientExtensionResults"]["credProps"]["rk"], true);

    let client_data = fido2_types::encoding::try_from_base64url(
        value["response"]["clientDataJSON"].as_str().expect("client data"),
    )
    .expect("client data should be base64url");
    let client_data: serde_json::Value =
        serde_json::from_slice(&client_data).expect("client data should be JSON");
    assert_eq!(client_data["type"], "webauthn.create");
    assert_eq!(client_data["challenge"], "c29tZS1jaGFsbGVuZ2U");
    assert!(client_data["origin"]
        .as_str()
        .expect("origin")
        .starts_with("android:apk-key-hash:"));

    assert_eq!(engine.vault().commit_count(), 1);
    let stored = engine
        .vault()
        .entry("entry-1")
        .and_then(|entry| entry.fido2.as_ref())
        .expect("metadata should be attached to the entry");
    assert_eq!(stored.rp_id, "example.com");
    assert!(engine.session().is_user_verified());
}

#[tokio::test]
async fn unauthorized_caller_triggers_no_cryptographic_work() {
    // Strict mocks: any call to the crypto service or prompter fails the test.
    let mut engine = CredentialEngine::new(
        MemoryVault::new(vec![plain_entry("entry-1")]),
        MockCryptoService::new(),
        MockUserPrompter::new(),
        associated_validator(),
        SessionContext::new(),
    );

    let mut request = creation_request("required");
    // An ordinary app asserting an origin is not on the privileged allow-list.
    request.calling_app.origin = Some("https://example.com".to_owned());

    let result = engine.register(&request, "entry-1").await;
    assert_eq!(result, RegisterCredentialResult::Error);
    assert_eq!(engine.vault().commit_count(), 0);
}

#[tokio::test]
async fn unreachable_association_lookup_fails_closed() {
    let mut associations = MockAppAssociationSource::new();
    associations
        .expect_is_package_associated()
        .returning(|_, _, _| Err(AssociationError::Unreachable));
    let mut engine = CredentialEngine::new(
        MemoryVault::new(vec![plain_entry("entry-1")]),
        MockCryptoService::new(),
        MockUserPrompter::new(),
        OriginValidator::new(PrivilegedAppPolicy::builtin(), associations),
        SessionContext::new(),
    );

    let result = engine.register(&creation_request("required"), "entry-1").await;
    assert_eq!(result, RegisterCredentialResult::Error);
}

#[tokio::test]
async fn dismissed_verification_prompt_is_cancellation_not_error() {
    let mut prompter = MockUserPrompter::new();
    prompter
        .expect_request_user_verification()
        .returning(|| UserVerification::Cancelled);
    let mut engine = CredentialEngine::new(
        MemoryVault::new(vec![plain_entry("entry-1")]),
        MockCryptoService::new(),
        prompter,
        associated_validator(),
        SessionContext::new(),
    );

    let result = engine.register(&creation_request("required"), "entry-1").await;
    assert_eq!(result, RegisterCredentialResult::Cancelled);
    assert_eq!(engine.vault().commit_count(), 0);
    assert!(!engine.session().is_user_verified());
}

#[tokio::test]
async fn required_verification_without_a_verifier_is_an_error() {
    let mut prompter = MockUserPrompter::new();
    prompter
        .expect_request_user_verification()
        .returning(|| UserVerification::Unavailable);
    // Strict crypto mock: no key may be generated without verification.
    let mut engine = CredentialEngine::new(
        MemoryVault::new(vec![plain_entry("entry-1")]),
        MockCryptoService::new(),
        prompter,
        associated_validator(),
        SessionContext::new(),
    );

    let result = engine.register(&creation_request("required"), "entry-1").await;
    assert_eq!(result, RegisterCredentialResult::Error);
    assert_eq!(engine.vault().commit_count(), 0);
}

#[tokio::test]
async fn preferred_verification_without_a_verifier_degrades_to_uv_clear() {
    let mut prompter = MockUserPrompter::new();
    prompter
        .expect_request_user_verification()
        .returning(|| UserVerification::Unavailable);
    let mut engine = CredentialEngine::new(
        MemoryVault::new(vec![plain_entry("entry-1")]),
        SoftwareCryptoService::new(),
        prompter,
        associated_validator(),
        SessionContext::new(),
    );

    let result = engine.register(&creation_request("preferred"), "entry-1").await;
    let RegisterCredentialResult::Success(json) = result else {
        panic!("expected a successful registration, got {result:?}");
    };
    let value: serde_json::Value =
        serde_json::from_str(&json).expect("response should be valid JSON");
    let auth_data = fido2_types::encoding::try_from_base64url(
        value["response"]["authenticatorData"]
            .as_str()
            .expect("authenticator data"),
    )
    .expect("authenticator data should be base64url");
    assert_eq!(
        auth_data[32] & fido2_types::Flags::UV.bits(),
        0,
        "UV flag must stay clear when no verifier is available"
    );
    assert!(!engine.session().is_user_verified());
    assert_eq!(engine.vault().commit_count(), 1);
}

#[tokio::test]
async fn excluded_credential_stops_registration() {
    let vault = MemoryVault::new(vec![
        passkey_entry("entry-1", "Example", b"existing-cred"),
        plain_entry("entry-2"),
    ]);
    let mut engine = CredentialEngine::new(
        vault,
        MockCryptoService::new(),
        verifying_prompter(),
        associated_validator(),
        SessionContext::new(),
    );

    let mut request = creation_request("preferred");
    let mut options: serde_json::Value =
        serde_json::from_str(&request.request_json).expect("request should be JSON");
    options["excludeCredentials"] = serde_json::json!([
        {
            "type": "public-key",
            "id": fido2_types::encoding::base64url(b"existing-cred")
        }
    ]);
    request.request_json = options.to_string();

    let result = engine.register(&request, "entry-2").await;
    assert_eq!(result, RegisterCredentialResult::Error);
    assert_eq!(engine.vault().commit_count(), 0);
}

#[tokio::test]
async fn rejected_commit_withholds_the_response() {
    /// A vault that accepts lookups but rejects every write.
    struct RejectingVault;

    #[async_trait::async_trait]
    impl VaultStore for RejectingVault {
        async fn lookup_entries_for_user(
            &self,
            _user_id: &str,
        ) -> Result<Vec<VaultCredentialSource>, VaultError> {
            Ok(vec![plain_entry("entry-1")])
        }

        async fn commit_new_credential(
            &mut self,
            _entry_id: &str,
            _metadata: Fido2CredentialMetadata,
        ) -> Result<(), VaultError> {
            Err(VaultError::Storage)
        }
    }

    let mut engine = CredentialEngine::new(
        RejectingVault,
        SoftwareCryptoService::new(),
        verifying_prompter(),
        associated_validator(),
        SessionContext::new(),
    );

    let result = engine.register(&creation_request("required"), "entry-1").await;
    assert_eq!(result, RegisterCredentialResult::Error);
}

#[tokio::test]
async fn single_matching_credential_asserts_without_a_selection_prompt() {
    let vault = MemoryVault::new(vec![
        passkey_entry("entry-a", "Example", b"cred-a"),
        plain_entry("entry-b"),
    ]);
    let session = SessionContext::new();
    session.set_user_verified(true);

    let mut crypto = MockCryptoService::new();
    crypto
        .expect_sign_assertion()
        .withf(|entry_id, _| entry_id == "entry-a")
        .returning(|_, _| Ok(vec![0x30, 0x44, 0x02, 0x20]));

    // No prompter expectations: neither selection nor verification may be requested.
    let engine = CredentialEngine::new(
        vault,
        crypto,
        MockUserPrompter::new(),
        associated_validator(),
        session,
    );

    let result = engine.authenticate(&assertion_request(None)).await;
    let AuthenticateCredentialResult::Success(json) = result else {
        panic!("expected a successful assertion, got {result:?}");
    };
    let value: serde_json::Value =
        serde_json::from_str(&json).expect("response should be valid JSON");
    assert_eq!(
        value["rawId"],
        fido2_types::encoding::base64url(b"cred-a")
    );
    assert_eq!(value["response"]["userHandle"], "dXNlci1oYW5kbGU");

    let client_data = fido2_types::encoding::try_from_base64url(
        value["response"]["clientDataJSON"].as_str().expect("client data"),
    )
    .expect("client data should be base64url");
    let client_data: serde_json::Value =
        serde_json::from_slice(&client_data).expect("client data should be JSON");
    assert_eq!(client_data["type"], "webauthn.get");
}

#[tokio::test]
async fn ambiguous_candidates_require_an_explicit_user_choice() {
    let vault = MemoryVault::new(vec![
        passkey_entry("entry-a", "Work account", b"cred-a"),
        passkey_entry("entry-b", "Personal account", b"cred-b"),
    ]);
    let session = SessionContext::new();
    session.set_user_verified(true);

    let mut prompter = MockUserPrompter::new();
    prompter
        .expect_request_user_selection()
        .withf(|candidates| candidates.len() == 2)
        .returning(|candidates| UserSelection::Chosen(candidates[1].entry_id.clone()));

    let mut crypto = MockCryptoService::new();
    crypto
        .expect_sign_assertion()
        .withf(|entry_id, _| entry_id == "entry-b")
        .returning(|_, _| Ok(vec![0x30, 0x44]));

    let engine = CredentialEngine::new(vault, crypto, prompter, associated_validator(), session);

    let result = engine.authenticate(&assertion_request(None)).await;
    let AuthenticateCredentialResult::Success(json) = result else {
        panic!("expected a successful assertion, got {result:?}");
    };
    let value: serde_json::Value =
        serde_json::from_str(&json).expect("response should be valid JSON");
    assert_eq!(
        value["rawId"],
        fido2_types::encoding::base64url(b"cred-b")
    );
}

#[tokio::test]
async fn dismissed_selection_prompt_cancels_the_assertion() {
    let vault = MemoryVault::new(vec![
        passkey_entry("entry-a", "Work account", b"cred-a"),
        passkey_entry("entry-b", "Personal account", b"cred-b"),
    ]);
    let mut prompter = MockUserPrompter::new();
    prompter
        .expect_request_user_selection()
        .returning(|_| UserSelection::Cancelled);

    let engine = CredentialEngine::new(
        vault,
        MockCryptoService::new(),
        prompter,
        associated_validator(),
        SessionContext::new(),
    );

    let result = engine.authenticate(&assertion_request(None)).await;
    assert_eq!(result, AuthenticateCredentialResult::Cancelled);
}

#[tokio::test]
async fn allow_list_narrows_the_candidates() {
    let vault = MemoryVault::new(vec![
        passkey_entry("entry-a", "Work account", b"cred-a"),
        passkey_entry("entry-b", "Personal account", b"cred-b"),
    ]);
    let session = SessionContext::new();
    session.set_user_verified(true);

    let mut crypto = MockCryptoService::new();
    crypto
        .expect_sign_assertion()
        .withf(|entry_id, _| entry_id == "entry-a")
        .returning(|_, _| Ok(vec![0x30, 0x44]));

    // The allow list leaves one candidate, so no selection prompt is permitted.
    let engine = CredentialEngine::new(
        vault,
        crypto,
        MockUserPrompter::new(),
        associated_validator(),
        session,
    );

    let result = engine.authenticate(&assertion_request(Some(b"cred-a"))).await;
    assert!(matches!(result, AuthenticateCredentialResult::Success(_)));
}

#[tokio::test]
async fn unknown_credential_collapses_to_a_plain_error() {
    let vault = MemoryVault::new(vec![passkey_entry("entry-a", "Example", b"cred-a")]);
    let session = SessionContext::new();
    session.set_user_verified(true);

    let engine = CredentialEngine::new(
        vault,
        MockCryptoService::new(),
        MockUserPrompter::new(),
        associated_validator(),
        session,
    );

    let result = engine
        .authenticate(&assertion_request(Some(b"cred-unknown")))
        .await;
    // Indistinguishable from any other failure; no enumeration signal.
    assert_eq!(result, AuthenticateCredentialResult::Error);
}

#[tokio::test]
async fn prehashed_client_data_signs_the_supplied_hash() {
    let vault = MemoryVault::new(vec![passkey_entry("entry-a", "Example", b"cred-a")]);
    let session = SessionContext::new();
    session.set_user_verified(true);

    let hash = vec![0xAA; 32];
    let expected = hash.clone();
    let mut crypto = MockCryptoService::new();
    crypto
        .expect_sign_assertion()
        .withf(move |_, message| message.ends_with(&expected))
        .returning(|_, _| Ok(vec![0x30, 0x44]));

    let engine = CredentialEngine::new(
        vault,
        crypto,
        MockUserPrompter::new(),
        associated_validator(),
        session,
    );

    let mut request = assertion_request(None);
    request.client_data_hash = Some(hash);

    let result = engine.authenticate(&request).await;
    let AuthenticateCredentialResult::Success(json) = result else {
        panic!("expected a successful assertion, got {result:?}");
    };
    let value: serde_json::Value =
        serde_json::from_str(&json).expect("response should be valid JSON");
    assert!(
        value["response"].get("clientDataJSON").is_none(),
        "no client data may be returned on the pre-hashed channel"
    );
}

#[tokio::test]
async fn malformed_request_json_is_an_error() {
    let mut engine = CredentialEngine::new(
        MemoryVault::new(vec![plain_entry("entry-1")]),
        MockCryptoService::new(),
        MockUserPrompter::new(),
        // The validator must not be consulted for an undecodable request.
        OriginValidator::new(PrivilegedAppPolicy::builtin(), MockAppAssociationSource::new()),
        SessionContext::new(),
    );

    let mut request = creation_request("required");
    request.request_json = "{ not json".to_owned();
    assert_eq!(
        engine.register(&request, "entry-1").await,
        RegisterCredentialResult::Error
    );

    let mut assertion = assertion_request(None);
    assertion.request_json = "{}".to_owned();
    assert_eq!(
        engine.authenticate(&assertion).await,
        AuthenticateCredentialResult::Error
    );
}

#[tokio::test]
async fn cipher_scoped_assertion_only_considers_that_entry() {
    let vault = MemoryVault::new(vec![
        passkey_entry("entry-a", "Work account", b"cred-a"),
        passkey_entry("entry-b", "Personal account", b"cred-b"),
    ]);
    let session = SessionContext::new();
    session.set_user_verified(true);

    let mut crypto = MockCryptoService::new();
    crypto
        .expect_sign_assertion()
        .withf(|entry_id, _| entry_id == "entry-b")
        .returning(|_, _| Ok(vec![0x30, 0x44]));

    let engine = CredentialEngine::new(
        vault,
        crypto,
        MockUserPrompter::new(),
        associated_validator(),
        session,
    );

    let mut request = assertion_request(None);
    request.cipher_id = Some("entry-b".to_owned());
    let result = engine.authenticate(&request).await;
    assert!(matches!(result, AuthenticateCredentialResult::Success(_)));
}
