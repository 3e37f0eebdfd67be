use std::{collections::HashSet, sync::Arc};

use anyhow::{bail, Result};
use serde_json::Value;
use tracing::Instrument;

use crate::{
    config::ValidatorConfig,
    core::{
        credential::{VerifiableCredential, VerifiablePresentation},
        diagnostic::DiagnosticContext,
        error::ValidationError,
        json_path,
        presentation_definition::PresentationDefinition,
        presentation_submission::PresentationSubmission,
        util::AsyncHttpClient,
        verification_result::{Check, VerificationResult},
    },
};

use descriptor::Submitted;
use requirement::{RequirementEvaluator, Satisfied};
use schema::{JsonSchemaLoader, JsonSchemaValidator};
use ssi::SsiService;
use status::StatusChecker;

mod descriptor;
mod requirement;
pub mod schema;
pub mod ssi;
pub mod status;

/// A validation that did not pass.
///
/// `result` holds every check passed and every message recorded up to the failure. It is
/// `None` only when the presentation carries no presentation submission at all.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct ValidationFailure {
    pub error: ValidationError,
    pub result: Option<VerificationResult>,
}

/// Validates verifiable presentations against presentation definitions.
///
/// The validator holds no per-request state and can be shared between concurrent
/// validations.
#[derive(Clone)]
pub struct PresentationValidator {
    ssi: Arc<dyn SsiService>,
    schemas: Arc<dyn JsonSchemaValidator>,
    status: StatusChecker,
    config: ValidatorConfig,
}

impl std::fmt::Debug for PresentationValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresentationValidator")
            .field("status", &self.status)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PresentationValidator {
    /// Build a new validator.
    pub fn builder() -> PresentationValidatorBuilder {
        PresentationValidatorBuilder::default()
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Validate `presentation` against `definition`.
    ///
    /// Stages run in order: identifier match, credential subject uniqueness, every
    /// descriptor map entry, submission requirements, and finally the presentation proof.
    /// The first failing stage ends the validation.
    ///
    /// `requester` is handed to the [SsiService] for every proof verification.
    pub async fn validate(
        &self,
        ctx: &DiagnosticContext,
        definition: &PresentationDefinition,
        presentation: &VerifiablePresentation,
        requester: &str,
    ) -> Result<VerificationResult, ValidationFailure> {
        let span = ctx.span();
        async move {
            let Some(submission) = presentation.presentation_submission() else {
                tracing::warn!("presentation carries no presentation submission");
                return Err(ValidationFailure {
                    error: ValidationError::InvalidFormat(
                        "presentation submission is missing".into(),
                    ),
                    result: None,
                });
            };

            let mut result = VerificationResult::new();
            match self
                .run(ctx, definition, presentation, submission, requester, &mut result)
                .await
            {
                Ok(()) => {
                    tracing::debug!("presentation validated: {:?}", result.checks());
                    Ok(result)
                }
                Err(error) => {
                    tracing::warn!("presentation rejected: {error}");
                    Err(ValidationFailure {
                        error,
                        result: Some(result),
                    })
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        ctx: &DiagnosticContext,
        definition: &PresentationDefinition,
        presentation: &VerifiablePresentation,
        submission: &PresentationSubmission,
        requester: &str,
        result: &mut VerificationResult,
    ) -> Result<(), ValidationError> {
        if submission.definition_id() != definition.id() {
            result.add_error("Id of presentation submission and definition are not matching");
            return Err(ValidationError::NotMatch);
        }
        result.add_check(Check::MatchingIds);

        let mut subjects = presentation
            .verifiable_credential()
            .iter()
            .map(VerifiableCredential::subject_id);
        if let Some(first) = subjects.next() {
            if subjects.any(|subject| subject != first) {
                result.add_error("Credential subject is not the same for all the credentials");
                return Err(ValidationError::NotMatch);
            }
        }
        result.add_check(Check::UniqueSubject);

        self.validate_submission(ctx, definition, presentation, submission, requester, result)
            .await?;
        result.add_check(Check::Submission);

        let evaluator = RequirementEvaluator {
            config: &self.config,
            definition,
            presentation,
            submission,
        };
        for requirement in definition.submission_requirements() {
            match evaluator.evaluate_top_level(ctx, requirement) {
                Ok(Satisfied::SecondFactor) => result.add_check(Check::IdentityVerification),
                Ok(Satisfied::Requirement) => {}
                Err(e) => {
                    result.add_error(e.detail());
                    return Err(e);
                }
            }
        }
        result.add_check(Check::SubmissionRequirements);

        let verified = ctx
            .bounded(
                None,
                self.ssi.verify_presentation(ctx, presentation, requester),
            )
            .await
            .map_err(|e| ValidationError::Transport(e.into()))
            .and_then(|outcome| outcome.map_err(ValidationError::Proof));
        if let Err(e) = verified {
            result.add_error("Verifiable presentation not validated");
            return Err(e);
        }
        result.add_check(Check::PresentationProof);

        Ok(())
    }

    /// Walk the descriptor map, checking every referenced credential against its input
    /// descriptor. Each credential of the presentation must be referenced exactly once.
    async fn validate_submission(
        &self,
        ctx: &DiagnosticContext,
        definition: &PresentationDefinition,
        presentation: &VerifiablePresentation,
        submission: &PresentationSubmission,
        requester: &str,
        result: &mut VerificationResult,
    ) -> Result<(), ValidationError> {
        let envelope = serde_json::to_value(presentation)
            .map_err(|e| ValidationError::InvalidFormat(format!("unreadable presentation: {e}")))?;
        let embedded: &[Value] = envelope
            .get("verifiableCredential")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let mut consumed = HashSet::new();
        let mut answered = HashSet::new();

        for entry in submission.descriptor_map() {
            let Some(descriptor) = definition.input_descriptor(entry.id()) else {
                result.add_error("Received submission outside of definition");
                return Err(ValidationError::MissingClaim(entry.id().clone()));
            };

            if !answered.insert(descriptor.id()) {
                result.add_error("Input descriptor was answered more than once");
                return Err(ValidationError::RepeatedClaim(entry.path().clone()));
            }

            let Some(json) = json_path::select_one(&envelope, entry.path()).filter(|v| v.is_object())
            else {
                result.add_error("Cannot discover the reference of the submission");
                return Err(ValidationError::InvalidFormat(format!(
                    "nothing found at {}",
                    entry.path()
                )));
            };

            let decoded;
            let credential = match embedded.iter().position(|vc| std::ptr::eq(vc, json)) {
                Some(index) => {
                    if !consumed.insert(index) {
                        result.add_error("Credential was submitted more than once");
                        return Err(ValidationError::RepeatedClaim(entry.path().clone()));
                    }
                    &presentation.verifiable_credential()[index]
                }
                None => {
                    decoded = serde_json::from_value::<VerifiableCredential>(json.clone())
                        .map_err(|e| {
                            result.add_error("Cannot discover the reference of the submission");
                            ValidationError::InvalidFormat(e.to_string())
                        })?;
                    &decoded
                }
            };

            tracing::debug!(
                "checking {} against input descriptor {}",
                entry.path(),
                descriptor.id()
            );

            let submitted = Submitted {
                descriptor,
                json,
                credential,
            };
            if let Err(e) = self
                .validate_credential(ctx, &submitted, presentation, requester, result)
                .await
            {
                result.add_error("Submitted credentials don't satisfy descriptor requirements");
                return Err(e);
            }
        }

        if consumed.len() < presentation.verifiable_credential().len() {
            result.add_error("Received more credentials than required");
            return Err(ValidationError::UnwantedClaim);
        }

        Ok(())
    }
}

/// Builder struct for [PresentationValidator].
#[derive(Clone, Default)]
pub struct PresentationValidatorBuilder {
    ssi: Option<Arc<dyn SsiService>>,
    schemas: Option<Arc<dyn JsonSchemaValidator>>,
    http_client: Option<Arc<dyn AsyncHttpClient + Send + Sync>>,
    config: ValidatorConfig,
}

impl PresentationValidatorBuilder {
    /// Build the validator.
    ///
    /// Without an explicit [JsonSchemaValidator], schemas are fetched with the HTTP client.
    pub fn build(self) -> Result<PresentationValidator> {
        let Self {
            ssi,
            schemas,
            http_client,
            config,
        } = self;

        let Some(ssi) = ssi else {
            bail!("ssi service is required, see `with_ssi_service`")
        };

        let Some(http_client) = http_client else {
            bail!("http client is required, see `with_http_client`")
        };

        let schemas = match schemas {
            Some(schemas) => schemas,
            None => Arc::new(JsonSchemaLoader::new(http_client.clone())) as Arc<dyn JsonSchemaValidator>,
        };

        Ok(PresentationValidator {
            ssi,
            schemas,
            status: StatusChecker::new(http_client, &config),
            config,
        })
    }

    /// Set the [SsiService] verifying credential and presentation proofs.
    pub fn with_ssi_service(mut self, ssi: Arc<dyn SsiService>) -> Self {
        self.ssi = Some(ssi);
        self
    }

    /// Set the [JsonSchemaValidator] checking credentials against their schemas.
    pub fn with_schema_validator(mut self, schemas: Arc<dyn JsonSchemaValidator>) -> Self {
        self.schemas = Some(schemas);
        self
    }

    /// Set the HTTP client used for credential status lookups.
    pub fn with_http_client(mut self, client: Arc<dyn AsyncHttpClient + Send + Sync>) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn with_config(mut self, config: ValidatorConfig) -> Self {
        self.config = config;
        self
    }
}
