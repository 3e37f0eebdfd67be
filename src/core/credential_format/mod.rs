use core::fmt;
use std::{borrow::Cow, collections::HashMap, str::FromStr};

use serde::{Deserialize, Serialize};

const FORMAT_JWT: &str = "jwt";
const FORMAT_JWT_VC: &str = "jwt_vc";
const FORMAT_JWT_VP: &str = "jwt_vp";
const FORMAT_LDP: &str = "ldp";
const FORMAT_LDP_VC: &str = "ldp_vc";
const FORMAT_LDP_VP: &str = "ldp_vp";

/// A Json object of claim formats.
///
/// The Presentation Definition MAY include a format property. The value MUST be an object with one or
/// more properties matching the registered [ClaimFormatDesignation] (e.g., jwt, jwt_vc, jwt_vp, etc.).
/// The properties inform the Holder of the Claim format configurations the Verifier can process.
///
/// See [https://identity.foundation/presentation-exchange/spec/v2.0.0/#presentation-definition](https://identity.foundation/presentation-exchange/spec/v2.0.0/#presentation-definition)
pub type ClaimFormatMap = HashMap<ClaimFormatDesignation, ClaimFormatPayload>;

/// The algorithms or proof suites accepted for one claim format.
///
/// JWT formats list `alg` values, linked data proof formats list `proof_type` values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ClaimFormatPayload {
    #[serde(rename = "alg")]
    Alg(Vec<String>),
    #[serde(rename = "proof_type")]
    ProofType(Vec<String>),
    #[serde(untagged)]
    Other(serde_json::Value),
}

/// Registered claim format designations of the presentation exchange registry.
///
/// Unregistered designations are kept verbatim as [ClaimFormatDesignation::Other].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ClaimFormatDesignation {
    /// A JSON Web Token.
    Jwt,
    /// A verifiable credential encoded as a JWT.
    JwtVc,
    /// A verifiable presentation encoded as a JWT.
    JwtVp,
    /// Any linked data proof secured object.
    Ldp,
    /// A verifiable credential secured with a linked data proof.
    LdpVc,
    /// A verifiable presentation secured with a linked data proof.
    LdpVp,
    Other(String),
}

impl ClaimFormatDesignation {
    pub fn from_name(name: Cow<str>) -> Self {
        match name.as_ref() {
            FORMAT_JWT => Self::Jwt,
            FORMAT_JWT_VC => Self::JwtVc,
            FORMAT_JWT_VP => Self::JwtVp,
            FORMAT_LDP => Self::Ldp,
            FORMAT_LDP_VC => Self::LdpVc,
            FORMAT_LDP_VP => Self::LdpVp,
            _ => Self::Other(name.into_owned()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Jwt => FORMAT_JWT,
            Self::JwtVc => FORMAT_JWT_VC,
            Self::JwtVp => FORMAT_JWT_VP,
            Self::Ldp => FORMAT_LDP,
            Self::LdpVc => FORMAT_LDP_VC,
            Self::LdpVp => FORMAT_LDP_VP,
            Self::Other(other) => other,
        }
    }
}

impl From<&str> for ClaimFormatDesignation {
    fn from(s: &str) -> Self {
        Self::from_name(Cow::Borrowed(s))
    }
}

impl From<String> for ClaimFormatDesignation {
    fn from(value: String) -> Self {
        Self::from_name(Cow::Owned(value))
    }
}

impl FromStr for ClaimFormatDesignation {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.into())
    }
}

impl From<ClaimFormatDesignation> for String {
    fn from(format: ClaimFormatDesignation) -> Self {
        format.name().to_owned()
    }
}

impl fmt::Display for ClaimFormatDesignation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.name().fmt(f)
    }
}

impl Serialize for ClaimFormatDesignation {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.name().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ClaimFormatDesignation {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn definition_format_map() {
        let value = json!({
            "jwt_vc": { "alg": ["ES256K", "EdDSA"] },
            "ldp_vp": { "proof_type": ["Ed25519Signature2018"] },
            "mso_mdoc": { "alg": ["ES256"] }
        });

        let formats: ClaimFormatMap = serde_json::from_value(value).unwrap();

        assert_eq!(
            formats[&ClaimFormatDesignation::JwtVc],
            ClaimFormatPayload::Alg(vec!["ES256K".into(), "EdDSA".into()])
        );
        assert_eq!(
            formats[&ClaimFormatDesignation::LdpVp],
            ClaimFormatPayload::ProofType(vec!["Ed25519Signature2018".into()])
        );
        assert!(formats.contains_key(&ClaimFormatDesignation::Other("mso_mdoc".to_string())));
    }

    #[test]
    fn designation_names_round_trip() {
        for name in ["jwt", "jwt_vc", "jwt_vp", "ldp", "ldp_vc", "ldp_vp", "custom"] {
            assert_eq!(ClaimFormatDesignation::from(name).name(), name);
        }
    }
}
