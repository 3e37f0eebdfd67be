use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{
    polymorphic::Polymorphic,
    presentation_submission::PresentationSubmission,
    proof::{self, Proof, ProofSet},
};

/// One entry of a JSON-LD `@context`: a context IRI or an inline context object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContextEntry {
    Uri(String),
    Inline(Map<String, Value>),
}

pub type Context = Polymorphic<ContextEntry>;

/// Returns true if the context lists `uri` literally.
pub fn context_contains(context: Option<&Context>, uri: &str) -> bool {
    context
        .into_iter()
        .flatten()
        .any(|entry| matches!(entry, ContextEntry::Uri(u) if u == uri))
}

/// Explicit pointer to the JSON schema a credential conforms to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialSchema {
    pub id: String,
    #[serde(rename = "type")]
    pub schema_type: String,
}

/// Pointer to the remote record holding the revocation status of a credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialStatus {
    pub id: String,
    #[serde(rename = "type")]
    pub status_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Issuer {
    Uri(String),
    Object {
        id: String,
        #[serde(flatten)]
        additional: Map<String, Value>,
    },
}

impl Issuer {
    pub fn id(&self) -> &str {
        match self {
            Self::Uri(id) | Self::Object { id, .. } => id,
        }
    }
}

/// A W3C verifiable credential.
///
/// Members that the validator does not interpret are preserved in
/// [VerifiableCredential::additional], so JSON paths and JSON schemas evaluated
/// against the credential see the document as issued.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiableCredential {
    #[serde(rename = "@context", skip_serializing_if = "Option::is_none")]
    context: Option<Context>,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    types: Option<Polymorphic<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    issuer: Option<Issuer>,
    #[serde(default)]
    credential_subject: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    credential_schema: Option<CredentialSchema>,
    #[serde(skip_serializing_if = "Option::is_none")]
    credential_status: Option<CredentialStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    proof: Option<ProofSet>,
    #[serde(flatten)]
    additional: Map<String, Value>,
}

impl VerifiableCredential {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_id(mut self, id: String) -> Self {
        self.id = Some(id);
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn set_context(mut self, context: Context) -> Self {
        self.context = Some(context);
        self
    }

    pub fn context(&self) -> Option<&Context> {
        self.context.as_ref()
    }

    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.types.iter().flatten().map(String::as_str)
    }

    pub fn set_issuer(mut self, issuer: Issuer) -> Self {
        self.issuer = Some(issuer);
        self
    }

    pub fn issuer(&self) -> Option<&Issuer> {
        self.issuer.as_ref()
    }

    /// The issuer identifier, falling back to the JWT `iss` claim.
    pub fn issuer_id(&self) -> Option<&str> {
        self.issuer
            .as_ref()
            .map(Issuer::id)
            .or_else(|| self.additional.get("iss").and_then(Value::as_str))
    }

    pub fn set_credential_subject(mut self, subject: Map<String, Value>) -> Self {
        self.credential_subject = subject;
        self
    }

    pub fn credential_subject(&self) -> &Map<String, Value> {
        &self.credential_subject
    }

    pub fn subject_id(&self) -> Option<&str> {
        self.credential_subject.get("id").and_then(Value::as_str)
    }

    pub fn set_credential_schema(mut self, schema: Option<CredentialSchema>) -> Self {
        self.credential_schema = schema;
        self
    }

    pub fn credential_schema(&self) -> Option<&CredentialSchema> {
        self.credential_schema.as_ref()
    }

    pub fn set_credential_status(mut self, status: Option<CredentialStatus>) -> Self {
        self.credential_status = status;
        self
    }

    pub fn credential_status(&self) -> Option<&CredentialStatus> {
        self.credential_status.as_ref()
    }

    pub fn set_proof(mut self, proof: ProofSet) -> Self {
        self.proof = Some(proof);
        self
    }

    pub fn proof(&self) -> Option<&ProofSet> {
        self.proof.as_ref()
    }

    /// Every typed proof, in document order.
    pub fn proofs(&self) -> impl Iterator<Item = &Proof> {
        self.proof.iter().flatten()
    }

    pub fn proof_creators(&self) -> impl Iterator<Item = &str> {
        proof::creators(self.proof.as_ref())
    }

    pub fn additional(&self) -> &Map<String, Value> {
        &self.additional
    }
}

/// A W3C verifiable presentation carrying a DIF presentation submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiablePresentation {
    #[serde(rename = "@context", skip_serializing_if = "Option::is_none")]
    context: Option<Context>,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    types: Option<Polymorphic<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    holder: Option<String>,
    #[serde(
        rename = "presentation_submission",
        skip_serializing_if = "Option::is_none"
    )]
    presentation_submission: Option<PresentationSubmission>,
    #[serde(default)]
    verifiable_credential: Vec<VerifiableCredential>,
    #[serde(skip_serializing_if = "Option::is_none")]
    proof: Option<ProofSet>,
    #[serde(flatten)]
    additional: Map<String, Value>,
}

impl VerifiablePresentation {
    pub fn new(verifiable_credential: Vec<VerifiableCredential>) -> Self {
        Self {
            verifiable_credential,
            ..Default::default()
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn context(&self) -> Option<&Context> {
        self.context.as_ref()
    }

    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.types.iter().flatten().map(String::as_str)
    }

    pub fn set_holder(mut self, holder: String) -> Self {
        self.holder = Some(holder);
        self
    }

    pub fn holder(&self) -> Option<&str> {
        self.holder.as_deref()
    }

    pub fn set_presentation_submission(mut self, submission: PresentationSubmission) -> Self {
        self.presentation_submission = Some(submission);
        self
    }

    pub fn presentation_submission(&self) -> Option<&PresentationSubmission> {
        self.presentation_submission.as_ref()
    }

    pub fn verifiable_credential(&self) -> &[VerifiableCredential] {
        &self.verifiable_credential
    }

    pub fn verifiable_credential_mut(&mut self) -> &mut Vec<VerifiableCredential> {
        &mut self.verifiable_credential
    }

    pub fn set_proof(mut self, proof: ProofSet) -> Self {
        self.proof = Some(proof);
        self
    }

    pub fn proof(&self) -> Option<&ProofSet> {
        self.proof.as_ref()
    }

    /// Every typed proof, in document order.
    pub fn proofs(&self) -> impl Iterator<Item = &Proof> {
        self.proof.iter().flatten()
    }

    pub fn proof_creators(&self) -> impl Iterator<Item = &str> {
        proof::creators(self.proof.as_ref())
    }

    pub fn additional(&self) -> &Map<String, Value> {
        &self.additional
    }
}
