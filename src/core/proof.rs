use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::polymorphic::Polymorphic;

/// Proof members of a credential or a presentation: one proof, a proof set,
/// or a bare proof value string.
pub type ProofSet = Polymorphic<Proof>;

/// A linked data proof or JWS attached to a credential or presentation.
///
/// Only the members the validator reads are typed, everything else is kept in
/// [Proof::additional] so the document survives a round trip unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proof {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    proof_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    created: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    creator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    verification_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    proof_purpose: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    challenge: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    jws: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    proof_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    signature_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    nonce: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cades: Option<String>,
    #[serde(flatten)]
    additional: Map<String, Value>,
}

impl Proof {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_type(mut self, proof_type: String) -> Self {
        self.proof_type = Some(proof_type);
        self
    }

    pub fn proof_type(&self) -> Option<&str> {
        self.proof_type.as_deref()
    }

    pub fn set_creator(mut self, creator: String) -> Self {
        self.creator = Some(creator);
        self
    }

    pub fn set_verification_method(mut self, method: String) -> Self {
        self.verification_method = Some(method);
        self
    }

    pub fn verification_method(&self) -> Option<&str> {
        self.verification_method.as_deref()
    }

    /// The key that produced the proof: `creator` when present, else `verificationMethod`.
    pub fn creator(&self) -> Option<&str> {
        self.creator
            .as_deref()
            .or(self.verification_method.as_deref())
    }

    pub fn proof_purpose(&self) -> Option<&str> {
        self.proof_purpose.as_deref()
    }

    pub fn challenge(&self) -> Option<&str> {
        self.challenge.as_deref()
    }

    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    pub fn created(&self) -> Option<&str> {
        self.created.as_deref()
    }

    pub fn jws(&self) -> Option<&str> {
        self.jws.as_deref()
    }

    pub fn proof_value(&self) -> Option<&str> {
        self.proof_value.as_deref()
    }

    pub fn signature_value(&self) -> Option<&str> {
        self.signature_value.as_deref()
    }

    pub fn nonce(&self) -> Option<&str> {
        self.nonce.as_deref()
    }

    pub fn cades(&self) -> Option<&str> {
        self.cades.as_deref()
    }

    pub fn additional(&self) -> &Map<String, Value> {
        &self.additional
    }
}

/// Creators of every typed proof in `proofs`.
pub fn creators(proofs: Option<&ProofSet>) -> impl Iterator<Item = &str> {
    proofs.into_iter().flatten().filter_map(Proof::creator)
}
