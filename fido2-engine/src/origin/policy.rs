use nom::{
    bytes::complete::{tag, take_while_m_n},
    character::is_hex_digit,
    combinator::map_res,
    multi::separated_list1,
    IResult,
};
use serde::Deserialize;
use std::str::from_utf8;

use fido2_types::request::CertificateFingerprint;

/// The callers permitted to assert foreign origins, each pinned to the SHA-256 digest of
/// its release signing certificate.
///
/// This is a static policy table loaded at process start: validation logic stays free of
/// hard-coded package branching, and deployments can swap the table without touching the
/// engine.
#[derive(Debug, Clone)]
pub struct PrivilegedAppPolicy {
    apps: Vec<PrivilegedApp>,
}

#[derive(Debug, Clone)]
struct PrivilegedApp {
    package_name: String,
    fingerprint: CertificateFingerprint,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPolicy {
    apps: Vec<RawApp>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawApp {
    package_name: String,
    fingerprint: String,
}

/// Policy table parsing error.
#[derive(Debug)]
pub enum PolicyError {
    /// The policy document is not the expected JSON shape.
    Malformed,
    /// A fingerprint could not be parsed.
    ParseFailed(String),
    /// A fingerprint had an invalid length.
    InvalidLength,
}

impl<T> From<nom::Err<nom::error::Error<T>>> for PolicyError {
    fn from(value: nom::Err<nom::error::Error<T>>) -> Self {
        let code_msg = value.map(|err| format!("{:?}", err.code));
        let message = match code_msg {
            nom::Err::Incomplete(_) => "Parsing incomplete".to_owned(),
            nom::Err::Error(msg) => format!("Parsing error: {msg}"),
            nom::Err::Failure(msg) => format!("Parsing failure: {msg}"),
        };

        PolicyError::ParseFailed(message)
    }
}

impl PrivilegedAppPolicy {
    /// The built-in allow-list of browsers trusted to assert foreign origins.
    pub fn builtin() -> Self {
        // SAFETY: the embedded table is covered by tests; failing to parse it is a
        // programmer error.
        Self::from_json(include_str!("privileged_apps.json"))
            .expect("embedded privileged app table unexpectedly failed to parse")
    }

    /// Parse a policy table from its JSON representation.
    pub fn from_json(raw: &str) -> Result<Self, PolicyError> {
        let raw: RawPolicy = serde_json::from_str(raw).map_err(|_| PolicyError::Malformed)?;

        let apps = raw
            .apps
            .into_iter()
            .map(|app| {
                valid_fingerprint(&app.fingerprint).map(|fingerprint| PrivilegedApp {
                    package_name: app.package_name,
                    fingerprint,
                })
            })
            .collect::<Result<_, _>>()?;

        Ok(Self { apps })
    }

    /// The pinned certificate digest for `package_name`, or `None` if the package is not
    /// allowed to assert foreign origins.
    pub fn fingerprint_for(&self, package_name: &str) -> Option<&CertificateFingerprint> {
        self.apps
            .iter()
            .find(|app| app.package_name == package_name)
            .map(|app| &app.fingerprint)
    }
}

impl Default for PrivilegedAppPolicy {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Make sure we have an expected fingerprint. Characters have to be uppercase.
///
/// <https://developer.android.com/training/app-links/verify-android-applinks#fix-errors>
/// * Having a lower case signature in assetlinks.json. The signature should be
///   in upper case.
pub(crate) fn valid_fingerprint(
    fingerprint: &str,
) -> Result<CertificateFingerprint, PolicyError> {
    #[derive(Debug)]
    enum HexError {
        Utf8,
        ParseInt,
    }

    fn parse_fingerprint(input: &[u8]) -> IResult<&[u8], Vec<u8>> {
        separated_list1(
            tag(":"),
            map_res(
                take_while_m_n(2, 2, |c| is_hex_digit(c) && !c.is_ascii_lowercase()),
                |hex| {
                    u8::from_str_radix(from_utf8(hex).map_err(|_| HexError::Utf8)?, 16)
                        .map_err(|_| HexError::ParseInt)
                },
            ),
        )(input)
    }

    let (left, parsed) = parse_fingerprint(fingerprint.as_bytes())?;

    if !left.is_empty() {
        return Err(PolicyError::InvalidLength);
    }

    CertificateFingerprint::try_from(parsed.as_slice()).map_err(|_| PolicyError::InvalidLength)
}
