use anyhow::Result;
use async_trait::async_trait;

use crate::core::{
    credential::{VerifiableCredential, VerifiablePresentation},
    diagnostic::DiagnosticContext,
};

/// Cryptographic verification of credentials and presentations.
///
/// Signature suites and DID resolution live behind this trait, the validator only
/// interprets the outcome. `requester` identifies the party asking for the
/// verification, e.g. the tenant whose trust configuration applies.
#[async_trait]
pub trait SsiService: Send + Sync {
    /// Verify the proofs of a single credential.
    async fn verify_credential(
        &self,
        ctx: &DiagnosticContext,
        credential: &VerifiableCredential,
        requester: &str,
    ) -> Result<()>;

    /// Verify the proofs of the presentation envelope.
    async fn verify_presentation(
        &self,
        ctx: &DiagnosticContext,
        presentation: &VerifiablePresentation,
        requester: &str,
    ) -> Result<()>;
}
