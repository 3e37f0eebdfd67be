use std::fmt;

use serde::{Deserialize, Serialize};

use crate::utils::push_unique;

/// Named validation stages recorded in [VerificationResult::checks] once passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Check {
    MatchingIds,
    UniqueSubject,
    Submission,
    Constraints,
    SubmissionRequirements,
    PresentationProof,
    CredentialProof,
    CredentialStatus,
    Context,
    CredentialSchema,
    Issuer,
    IdentityVerification,
}

impl Check {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MatchingIds => "matchingIds",
            Self::UniqueSubject => "uniqueSubject",
            Self::Submission => "submission",
            Self::Constraints => "constraints",
            Self::SubmissionRequirements => "submissionRequirements",
            Self::PresentationProof => "presentationProof",
            Self::CredentialProof => "credentialProof",
            Self::CredentialStatus => "credentialStatus",
            Self::Context => "context",
            Self::CredentialSchema => "credentialSchema",
            Self::Issuer => "issuer",
            Self::IdentityVerification => "identityVerification",
        }
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_str().fmt(f)
    }
}

/// Verdict of a presentation validation.
///
/// Each collection keeps the order entries were first recorded in, and never holds
/// the same entry twice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    checks: Vec<String>,
    warnings: Vec<String>,
    errors: Vec<String>,
}

impl VerificationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_check(&mut self, check: Check) {
        push_unique(&mut self.checks, check.as_str());
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        push_unique(&mut self.warnings, warning);
    }

    pub fn add_error(&mut self, error: impl Into<String>) {
        push_unique(&mut self.errors, error);
    }

    pub fn checks(&self) -> &[String] {
        &self.checks
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn has_check(&self, check: Check) -> bool {
        self.checks.iter().any(|c| c == check.as_str())
    }

    /// A result is valid when no error was recorded and at least one stage passed.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty() && !self.checks.is_empty()
    }
}
