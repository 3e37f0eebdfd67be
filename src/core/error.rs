/// Kinds of failure a presentation validation can end with.
///
/// Callers branch on the variant; the human readable detail for end users is
/// accumulated in [VerificationResult::errors](super::verification_result::VerificationResult::errors).
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// Malformed document, or a member with the wrong JSON shape.
    #[error("invalid format: {0}")]
    InvalidFormat(String),
    /// Definition and submission identifiers, or credential subjects, differ.
    #[error("presentation response does not match")]
    NotMatch,
    /// The submission references an input descriptor the definition lacks.
    #[error("required claim is missing: {0}")]
    MissingClaim(String),
    /// More credentials were presented than the submission consumed.
    #[error("found unrequested claim")]
    UnwantedClaim,
    /// The same credential is mapped by more than one descriptor map entry.
    #[error("required claim is found repeated: {0}")]
    RepeatedClaim(String),
    #[error("required constraint couldn't be satisfied: {0}")]
    MissingConstraint(String),
    #[error("submission requirement couldn't be satisfied: {0}")]
    MissingRequirement(String),
    #[error("required second factor is missing")]
    MissingSecondFactor,
    #[error("credential status not valid")]
    StatusNotValid,
    /// The cryptographic proof of a credential or the presentation was rejected.
    #[error("proof could not be validated: {0:#}")]
    Proof(anyhow::Error),
    /// Network failure, timeout or cancellation while talking to a remote party.
    #[error("transport error: {0:#}")]
    Transport(anyhow::Error),
}

impl ValidationError {
    /// The detail of the failure without the kind prefix, as recorded for end users.
    pub fn detail(&self) -> String {
        match self {
            Self::InvalidFormat(detail)
            | Self::MissingClaim(detail)
            | Self::RepeatedClaim(detail)
            | Self::MissingConstraint(detail)
            | Self::MissingRequirement(detail) => detail.clone(),
            other => other.to_string(),
        }
    }
}
