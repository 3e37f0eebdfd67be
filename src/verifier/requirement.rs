use regex::Regex;

use crate::{
    config::ValidatorConfig,
    core::{
        credential::VerifiablePresentation,
        diagnostic::DiagnosticContext,
        error::ValidationError,
        presentation_definition::{
            PresentationDefinition, RequirementSource, Rule, SubmissionRequirement,
            MAX_REQUIREMENT_DEPTH,
        },
        presentation_submission::PresentationSubmission,
    },
};

/// Evaluates the submission requirements of a definition against one submission.
pub(crate) struct RequirementEvaluator<'a> {
    pub config: &'a ValidatorConfig,
    pub definition: &'a PresentationDefinition,
    pub presentation: &'a VerifiablePresentation,
    pub submission: &'a PresentationSubmission,
}

/// What a satisfied top-level requirement proved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Satisfied {
    Requirement,
    SecondFactor,
}

impl RequirementEvaluator<'_> {
    /// Evaluate a top-level requirement.
    ///
    /// The requirement named after [ValidatorConfig::identity_requirement] is answered by
    /// the second factor check instead of the group rules.
    pub fn evaluate_top_level(
        &self,
        ctx: &DiagnosticContext,
        requirement: &SubmissionRequirement,
    ) -> Result<Satisfied, ValidationError> {
        if requirement.name() == Some(self.config.identity_requirement()) {
            self.second_factor()?;
            return Ok(Satisfied::SecondFactor);
        }

        self.evaluate(ctx, requirement, 1)?;
        Ok(Satisfied::Requirement)
    }

    /// Evaluate `requirement`, recursing into nested requirements, all of which must hold.
    pub fn evaluate(
        &self,
        ctx: &DiagnosticContext,
        requirement: &SubmissionRequirement,
        depth: usize,
    ) -> Result<(), ValidationError> {
        let name = requirement.name().unwrap_or_default();

        if depth > MAX_REQUIREMENT_DEPTH {
            return Err(ValidationError::MissingRequirement(format!(
                "Required requirement {name} wasn't satisfied: nested deeper than {MAX_REQUIREMENT_DEPTH} levels"
            )));
        }

        let group = match requirement.source() {
            RequirementSource::FromNested(nested) => {
                return nested
                    .iter()
                    .try_for_each(|child| self.evaluate(ctx, child, depth + 1));
            }
            RequirementSource::From(group) => group,
        };

        let members: Vec<&str> = self
            .definition
            .input_descriptors_in_group(group)
            .map(|descriptor| descriptor.id())
            .collect();
        let submitted = members
            .iter()
            .filter(|id| self.submission.contains_descriptor(id))
            .count();

        tracing::debug!(
            trace_id = ctx.trace_id(),
            "requirement {name}: {submitted} of {} descriptors in group {group} submitted",
            members.len()
        );

        let unsatisfied = |reason: String| -> Result<(), ValidationError> {
            Err(ValidationError::MissingRequirement(format!(
                "Required requirement {name} wasn't satisfied: {reason}"
            )))
        };

        match requirement.rule() {
            Rule::All if submitted < members.len() => unsatisfied(format!(
                "only {submitted} out of {} satisfy the condition, not all",
                members.len()
            )),
            Rule::All => Ok(()),
            Rule::Pick => {
                if let Some(count) = requirement.count() {
                    if submitted != count {
                        return unsatisfied(format!(
                            "only {submitted} instead of {count} desired satisfy the condition"
                        ));
                    }
                }
                if let Some(min) = requirement.min() {
                    if submitted < min {
                        return unsatisfied(format!(
                            "only {submitted}, less than {min} desired, satisfy the condition"
                        ));
                    }
                }
                if let Some(max) = requirement.max() {
                    if submitted > max {
                        return unsatisfied(format!(
                            "{submitted}, more than of {max} maximum, satisfy the condition"
                        ));
                    }
                }
                Ok(())
            }
        }
    }

    /// Every descriptor of the identity group names, as the pattern of its first field
    /// filter, a key that must have signed the presentation.
    fn second_factor(&self) -> Result<(), ValidationError> {
        let creators: Vec<&str> = self.presentation.proof_creators().collect();

        for descriptor in self
            .definition
            .input_descriptors_in_group(self.config.identity_group())
        {
            let pattern = descriptor
                .constraints()
                .and_then(|constraints| constraints.fields().first())
                .and_then(|field| field.filter())
                .and_then(|filter| filter.pattern());

            let Some(pattern) = pattern else {
                tracing::warn!("identity descriptor {} has no key pattern", descriptor.id());
                return Err(ValidationError::MissingSecondFactor);
            };

            let regex = Regex::new(pattern).map_err(|e| {
                tracing::warn!("invalid key pattern on {}: {e}", descriptor.id());
                ValidationError::MissingSecondFactor
            })?;

            if !creators.iter().any(|creator| regex.is_match(creator)) {
                return Err(ValidationError::MissingSecondFactor);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    fn definition(requirements: serde_json::Value) -> PresentationDefinition {
        serde_json::from_value(json!({
            "id": "32f54163-7166-48f1-93d8-ff217bdb0653",
            "submission_requirements": requirements,
            "input_descriptors": [
                { "id": "banking_input_1", "group": ["A"], "schema": [{ "uri": "https://bank-standards.com/customer.json" }] },
                { "id": "banking_input_2", "group": ["A"], "schema": [{ "uri": "https://bank-schemas.org/2.0.0/accounts.json" }] },
                { "id": "employment_input", "group": ["B"], "schema": [{ "uri": "https://business-standards.org/schemas/employment-history.json" }] },
                {
                    "id": "second_factor",
                    "group": ["identity"],
                    "schema": [{ "uri": "https://www.w3.org/2018/credentials/v1" }],
                    "constraints": {
                        "fields": [{
                            "path": ["$.proof.verificationMethod"],
                            "filter": { "type": "string", "pattern": "did:example:device#key-[0-9]+" }
                        }]
                    }
                }
            ]
        }))
        .unwrap()
    }

    fn submission(ids: &[&str]) -> PresentationSubmission {
        serde_json::from_value(json!({
            "id": "a30e3b91-fb77-4d22-95fa-871689c322e2",
            "definition_id": "32f54163-7166-48f1-93d8-ff217bdb0653",
            "descriptor_map": ids.iter().enumerate().map(|(i, id)| json!({
                "id": id,
                "format": "ldp_vc",
                "path": format!("$.verifiableCredential[{i}]")
            })).collect::<Vec<_>>()
        }))
        .unwrap()
    }

    fn presentation(creator: &str) -> VerifiablePresentation {
        serde_json::from_value(json!({
            "type": "VerifiablePresentation",
            "proof": [
                { "type": "RsaSignature2018", "verificationMethod": "did:example:ebfeb1f712ebc6f1c276e12ec21#keys-1" },
                { "type": "EcdsaSecp256k1Signature2019", "verificationMethod": creator }
            ]
        }))
        .unwrap()
    }

    fn run(
        requirements: serde_json::Value,
        ids: &[&str],
        creator: &str,
    ) -> Vec<Result<Satisfied, ValidationError>> {
        let config = ValidatorConfig::default();
        let definition = definition(requirements);
        let presentation = presentation(creator);
        let submission = submission(ids);
        let evaluator = RequirementEvaluator {
            config: &config,
            definition: &definition,
            presentation: &presentation,
            submission: &submission,
        };
        let ctx = DiagnosticContext::new();
        definition
            .submission_requirements()
            .iter()
            .map(|requirement| evaluator.evaluate_top_level(&ctx, requirement))
            .collect()
    }

    fn message(result: &Result<Satisfied, ValidationError>) -> String {
        match result {
            Err(ValidationError::MissingRequirement(message)) => message.clone(),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn all_rule_needs_every_member() {
        let requirements = json!([{ "name": "Banking", "rule": "all", "from": "A" }]);

        assert!(run(requirements.clone(), &["banking_input_1", "banking_input_2"], "")[0].is_ok());
        assert_eq!(
            message(&run(requirements, &["banking_input_2"], "")[0]),
            "Required requirement Banking wasn't satisfied: only 1 out of 2 satisfy the condition, not all"
        );
    }

    #[test]
    fn pick_bounds() {
        let count = json!([{ "name": "Banking", "rule": "pick", "count": 1, "from": "A" }]);
        assert!(run(count.clone(), &["banking_input_1"], "")[0].is_ok());
        assert_eq!(
            message(&run(count, &["banking_input_1", "banking_input_2"], "")[0]),
            "Required requirement Banking wasn't satisfied: only 2 instead of 1 desired satisfy the condition"
        );

        let min = json!([{ "name": "Banking", "rule": "pick", "min": 2, "from": "A" }]);
        assert_eq!(
            message(&run(min, &["banking_input_1"], "")[0]),
            "Required requirement Banking wasn't satisfied: only 1, less than 2 desired, satisfy the condition"
        );

        let max = json!([{ "name": "Banking", "rule": "pick", "max": 1, "from": "A" }]);
        assert_eq!(
            message(&run(max, &["banking_input_1", "banking_input_2"], "")[0]),
            "Required requirement Banking wasn't satisfied: 2, more than of 1 maximum, satisfy the condition"
        );

        let unbounded = json!([{ "name": "Banking", "rule": "pick", "from": "A" }]);
        assert!(run(unbounded, &[], "")[0].is_ok());
    }

    #[test]
    fn nested_requirements_must_all_hold() {
        let requirements = json!([{
            "name": "Everything",
            "rule": "all",
            "from_nested": [
                { "name": "Banking", "rule": "pick", "min": 1, "from": "A" },
                { "name": "Employment", "rule": "all", "from": "B" }
            ]
        }]);

        assert!(run(requirements.clone(), &["banking_input_1", "employment_input"], "")[0].is_ok());
        assert!(message(&run(requirements, &["banking_input_1"], "")[0])
            .starts_with("Required requirement Employment wasn't satisfied"));
    }

    #[test]
    fn identity_requirement_checks_presentation_signers() {
        let requirements = json!([{ "name": "Identity verification", "rule": "all", "from": "identity" }]);

        let outcome = run(requirements.clone(), &[], "did:example:device#key-7");
        assert!(matches!(outcome[0], Ok(Satisfied::SecondFactor)));

        let outcome = run(requirements, &[], "did:example:laptop#key-7");
        assert!(matches!(outcome[0], Err(ValidationError::MissingSecondFactor)));
    }
}
