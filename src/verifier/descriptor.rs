use serde_json::Value;

use super::{
    schema::{self, IMPLICIT_SCHEMA_WARNING},
    PresentationValidator,
};
use crate::core::{
    credential::{VerifiableCredential, VerifiablePresentation},
    diagnostic::DiagnosticContext,
    error::ValidationError,
    filter::FilterError,
    input_descriptor::{Constraints, InputDescriptor, Preference},
    json_path,
    verification_result::{Check, VerificationResult},
};

const FIELD_NOT_VALIDATED: &str = "Field constraint not validated";
const SUBJECT_NOT_ISSUER: &str = "Subject is not issuer of the credential";
const SUBJECT_NOT_HOLDER: &str = "Subject is not holder of the presentation";

/// One credential referenced by a descriptor map entry.
pub(super) struct Submitted<'a> {
    pub descriptor: &'a InputDescriptor,
    pub json: &'a Value,
    pub credential: &'a VerifiableCredential,
}

impl PresentationValidator {
    /// Check one submitted credential against its input descriptor.
    ///
    /// Stages run in order and stop at the first failure, which is recorded in `result`.
    pub(super) async fn validate_credential(
        &self,
        ctx: &DiagnosticContext,
        submitted: &Submitted<'_>,
        presentation: &VerifiablePresentation,
        requester: &str,
        result: &mut VerificationResult,
    ) -> Result<(), ValidationError> {
        let Submitted {
            descriptor,
            json,
            credential,
        } = submitted;
        let credential_id = credential.id().unwrap_or_default();

        let resolution = schema::resolve(
            ctx,
            self.schemas.as_ref(),
            json,
            credential,
            descriptor.schema(),
        )
        .await
        .inspect_err(|e| result.add_error(e.detail()))?;
        if resolution.implicit {
            result.add_warning(IMPLICIT_SCHEMA_WARNING);
        }
        tracing::debug!("credential {credential_id} conforms to {}", resolution.uri);
        result.add_check(Check::CredentialSchema);

        let trusted = credential.issuer_id().is_some_and(|issuer| {
            credential
                .proof_creators()
                .any(|creator| creator.contains(issuer))
        });
        if !trusted {
            let message = "Cannot trust issuer of the credential";
            result.add_error(message);
            return Err(ValidationError::MissingConstraint(message.into()));
        }
        result.add_check(Check::Issuer);

        let verified = ctx
            .bounded(None, self.ssi.verify_credential(ctx, credential, requester))
            .await
            .map_err(|e| ValidationError::Transport(e.into()))
            .and_then(|outcome| outcome.map_err(ValidationError::Proof));
        if let Err(e) = verified {
            tracing::warn!("credential {credential_id} proof rejected: {e}");
            result.add_error(format!(
                "Credential {credential_id} couldn't be cryptographically validated"
            ));
            return Err(e);
        }
        result.add_check(Check::CredentialProof);

        match credential.credential_status() {
            None => result.add_warning("Credential status not available."),
            Some(status) => {
                if let Err(e) = self.status.check(ctx, status, credential_id).await {
                    tracing::warn!("credential {credential_id} status rejected: {e}");
                    result.add_error(format!(
                        "Credential {credential_id} status couldn't be verified"
                    ));
                    return Err(e.into());
                }
            }
        }
        result.add_check(Check::CredentialStatus);

        match descriptor.constraints() {
            None => result.add_warning("No constraints required validation"),
            Some(constraints) => {
                evaluate_constraints(constraints, json, credential, presentation, result)?;
                result.add_check(Check::Constraints);
            }
        }

        Ok(())
    }
}

/// Evaluate the constraints of an input descriptor against one credential.
pub(crate) fn evaluate_constraints(
    constraints: &Constraints,
    json: &Value,
    credential: &VerifiableCredential,
    presentation: &VerifiablePresentation,
    result: &mut VerificationResult,
) -> Result<(), ValidationError> {
    if constraints.limit_disclosure() {
        result.add_warning("Limited disclosure was requested but is not enforced");
    }

    let subject = credential.subject_id();

    if let Some(preference) = constraints.subject_is_issuer() {
        let holds = subject.is_some_and(|subject| {
            credential
                .proof_creators()
                .any(|creator| creator.contains(subject))
        });
        expect(holds, preference, SUBJECT_NOT_ISSUER, result)?;
    }

    if let Some(preference) = constraints.subject_is_holder() {
        let holds = subject.is_some_and(|subject| {
            presentation.holder() == Some(subject)
                || presentation
                    .proof_creators()
                    .any(|creator| creator.contains(subject))
        });
        expect(holds, preference, SUBJECT_NOT_HOLDER, result)?;
    }

    for field in constraints.fields() {
        let found = json_path::extract(json, field.path());

        let Some(value) = found.first() else {
            if field.is_required() {
                tracing::debug!("required field {:?} is missing", field.path().head());
                result.add_error(FIELD_NOT_VALIDATED);
                return Err(ValidationError::MissingConstraint(format!(
                    "no value at {}",
                    field.path().head()
                )));
            }
            continue;
        };

        let Some(filter) = field.filter() else {
            continue;
        };

        match filter.evaluate(value) {
            Ok(()) => {}
            Err(e) if !field.is_required() => {
                tracing::debug!("preferred field {} not satisfied: {e}", field.path().head());
            }
            Err(e) => {
                tracing::debug!("field {} not satisfied: {e}", field.path().head());
                result.add_error(FIELD_NOT_VALIDATED);
                return Err(match e {
                    FilterError::Format(detail) => ValidationError::InvalidFormat(detail),
                    FilterError::Unsatisfied(detail) => ValidationError::MissingConstraint(detail),
                });
            }
        }
    }

    Ok(())
}

fn expect(
    holds: bool,
    preference: Preference,
    message: &str,
    result: &mut VerificationResult,
) -> Result<(), ValidationError> {
    match (holds, preference) {
        (true, _) => Ok(()),
        (false, Preference::Preferred) => {
            result.add_warning(message);
            Ok(())
        }
        (false, Preference::Required) => {
            result.add_error(message);
            Err(ValidationError::MissingConstraint(message.into()))
        }
    }
}
