use std::collections::HashMap;
use std::sync::Mutex;

use coset::{
    iana::{self, EnumI64},
    CoseKey, CoseKeyBuilder,
};
use p256::{
    ecdsa::{signature::Signer, SigningKey},
    elliptic_curve::{
        generic_array::GenericArray,
        sec1::{FromEncodedPoint, ToEncodedPoint},
    },
    pkcs8::EncodePublicKey,
    EncodedPoint, PublicKey, SecretKey,
};

use fido2_types::{random_vec, Bytes};

use crate::error::CryptoError;

/// The public half of a freshly generated credential key pair.
#[derive(Debug, Clone)]
pub struct CreatedKeyPair {
    /// The credential ID the key pair was bound to.
    pub credential_id: Bytes,

    /// The COSE encoded public key, embedded in the attested credential data.
    pub public_key: CoseKey,
}

/// The cryptographic signing primitives backing the engine.
///
/// Key generation and signing are invoked as a service; the engine itself never touches
/// private key material. Implementations may suspend on hardware or I/O.
#[cfg_attr(any(test, feature = "testable"), mockall::automock)]
#[async_trait::async_trait]
pub trait CryptoService {
    /// Generate a new credential key pair for the vault entry `entry_id`, bound to the
    /// given user handle, and return its public half.
    async fn create_key_pair(
        &self,
        entry_id: &str,
        alg: iana::Algorithm,
        user_handle: &[u8],
    ) -> Result<CreatedKeyPair, CryptoError>;

    /// Load the private key stored for `entry_id` and sign `message` with it.
    async fn sign_assertion(&self, entry_id: &str, message: &[u8])
        -> Result<Vec<u8>, CryptoError>;
}

/// A software ES256 implementation of [`CryptoService`] holding its generated keys in
/// memory, keyed by vault entry.
#[derive(Debug, Default)]
pub struct SoftwareCryptoService {
    // Never held across an await point.
    keys: Mutex<HashMap<String, SecretKey>>,
}

impl SoftwareCryptoService {
    /// Create an empty service.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl CryptoService for SoftwareCryptoService {
    async fn create_key_pair(
        &self,
        entry_id: &str,
        alg: iana::Algorithm,
        _user_handle: &[u8],
    ) -> Result<CreatedKeyPair, CryptoError> {
        if alg != iana::Algorithm::ES256 {
            return Err(CryptoError::UnsupportedAlgorithm);
        }

        let private_key = SecretKey::random(&mut rand::thread_rng());
        let public_key = cose_key_from_public(&private_key.public_key());
        let credential_id: Bytes = random_vec(16).into();

        self.keys
            .lock()
            .map_err(|_| CryptoError::KeyGeneration)?
            .insert(entry_id.to_owned(), private_key);

        Ok(CreatedKeyPair {
            credential_id,
            public_key,
        })
    }

    async fn sign_assertion(
        &self,
        entry_id: &str,
        message: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        let keys = self.keys.lock().map_err(|_| CryptoError::Signing)?;
        let private_key = keys.get(entry_id).ok_or(CryptoError::Signing)?;

        let signature: p256::ecdsa::Signature = SigningKey::from(private_key)
            .try_sign(message)
            .map_err(|_| CryptoError::Signing)?;

        Ok(signature.to_der().as_bytes().to_vec())
    }
}

/// Build a COSE key from an ES256 public key.
fn cose_key_from_public(public_key: &PublicKey) -> CoseKey {
    let point = public_key.to_encoded_point(false);
    // SAFETY: an uncompressed, non-identity point always carries both coordinates.
    CoseKeyBuilder::new_ec2_pub_key(
        iana::EllipticCurve::P_256,
        point.x().unwrap().to_vec(),
        point.y().unwrap().to_vec(),
    )
    .algorithm(iana::Algorithm::ES256)
    .build()
}

/// Convert a COSE key to a X.509 SubjectPublicKeyInfo formatted byte array.
///
/// Used by the engine when filling the easy credential data accessors of the attestation
/// response.
///
/// <https://w3c.github.io/webauthn/#sctn-public-key-easy>
pub fn public_key_der_from_cose_key(key: &CoseKey) -> Result<Bytes, CryptoError> {
    if !matches!(
        key.alg,
        Some(coset::RegisteredLabelWithPrivate::Assigned(
            iana::Algorithm::ES256
        ))
    ) {
        return Err(CryptoError::UnsupportedAlgorithm);
    }
    if !matches!(
        key.kty,
        coset::RegisteredLabel::Assigned(iana::KeyType::EC2)
    ) {
        return Err(CryptoError::KeyGeneration);
    }

    let (mut x, mut y) = (None, None);
    for (label, value) in &key.params {
        if let coset::Label::Int(i) = label {
            match iana::Ec2KeyParameter::from_i64(*i) {
                Some(iana::Ec2KeyParameter::X) => x = value.as_bytes().cloned(),
                Some(iana::Ec2KeyParameter::Y) => y = value.as_bytes().cloned(),
                _ => {}
            }
        }
    }

    let (Some(x), Some(y)) = (x, y) else {
        return Err(CryptoError::KeyGeneration);
    };
    if x.len() != 32 || y.len() != 32 {
        return Err(CryptoError::KeyGeneration);
    }

    let point = EncodedPoint::from_affine_coordinates(
        GenericArray::from_slice(&x),
        GenericArray::from_slice(&y),
        false,
    );
    let public_key: Option<PublicKey> = PublicKey::from_encoded_point(&point).into();
    let der = public_key
        .ok_or(CryptoError::KeyGeneration)?
        .to_public_key_der()
        .map_err(|_| CryptoError::KeyGeneration)?;

    Ok(der.as_bytes().to_vec().into())
}

/// SHA-256 of the input, the digest used for relying party ids and client data.
pub(crate) fn sha256(data: &[u8]) -> [u8; 32] {
    use sha2::{Digest, Sha256};
    Sha256::digest(data).into()
}
