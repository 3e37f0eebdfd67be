use super::credential_format::*;
use super::input_descriptor::*;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Deepest nesting of `from_nested` submission requirements accepted.
pub const MAX_REQUIREMENT_DEPTH: usize = 16;

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum DefinitionError {
    #[error("a presentation definition needs at least one input descriptor")]
    NoInputDescriptors,
    #[error("input descriptor id {0} is used more than once")]
    DuplicateInputDescriptor(String),
    #[error("submission requirement references group {0}, which no input descriptor is part of")]
    UnknownGroup(GroupId),
    #[error("from must have a value")]
    MissingSource,
    #[error("from and from_nested are mutually exclusive fields")]
    AmbiguousSource,
    #[error("submission requirements are nested deeper than {} levels", MAX_REQUIREMENT_DEPTH)]
    NestingTooDeep,
}

/// A presentation definition is a JSON object that describes the information a [Verifier](https://identity.foundation/presentation-exchange/spec/v2.0.0/#term:verifier) requires of a [Holder](https://identity.foundation/presentation-exchange/spec/v2.0.0/#term:holder).
///
/// > Presentation Definitions are objects that articulate what proofs a [Verifier](https://identity.foundation/presentation-exchange/spec/v2.0.0/#term:verifier) requires.
/// > These help the [Verifier](https://identity.foundation/presentation-exchange/spec/v2.0.0/#term:verifier) to decide how or whether to interact with a [Holder](https://identity.foundation/presentation-exchange/spec/v2.0.0/#term:holder).
///
/// Deserialization checks the structural rules of the definition: at least one input
/// descriptor, unique descriptor ids, and submission requirements only referencing
/// existing groups. Use [PresentationDefinition::validate] after building one by hand.
///
/// For more information, see: [https://identity.foundation/presentation-exchange/spec/v2.0.0/#presentation-definition](https://identity.foundation/presentation-exchange/spec/v2.0.0/#presentation-definition)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "PresentationDefinitionObject")]
pub struct PresentationDefinition {
    id: String,
    input_descriptors: Vec<InputDescriptor>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    submission_requirements: Vec<SubmissionRequirement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    purpose: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    locale: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<ClaimFormatMap>,
}

#[derive(Deserialize)]
struct PresentationDefinitionObject {
    id: String,
    input_descriptors: Vec<InputDescriptor>,
    #[serde(default)]
    submission_requirements: Vec<SubmissionRequirement>,
    name: Option<String>,
    purpose: Option<String>,
    locale: Option<String>,
    format: Option<ClaimFormatMap>,
}

impl TryFrom<PresentationDefinitionObject> for PresentationDefinition {
    type Error = DefinitionError;

    fn try_from(raw: PresentationDefinitionObject) -> Result<Self, Self::Error> {
        let definition = Self {
            id: raw.id,
            input_descriptors: raw.input_descriptors,
            submission_requirements: raw.submission_requirements,
            name: raw.name,
            purpose: raw.purpose,
            locale: raw.locale,
            format: raw.format,
        };
        definition.validate()?;
        Ok(definition)
    }
}

impl PresentationDefinition {
    /// The Presentation Definition MUST contain an id property. The value of this property MUST be a string.
    /// The string SHOULD provide a unique ID for the desired context.
    ///
    /// The Presentation Definition MUST contain an input_descriptors property. Its value MUST be an array of Input Descriptor Objects,
    /// the composition of which are found [InputDescriptor] type.
    pub fn new(id: String, input_descriptor: InputDescriptor) -> Self {
        Self {
            id,
            input_descriptors: vec![input_descriptor],
            submission_requirements: Vec::new(),
            name: None,
            purpose: None,
            locale: None,
            format: None,
        }
    }

    /// Return the id of the presentation definition.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Add a new input descriptor to the presentation definition.
    pub fn add_input_descriptor(mut self, input_descriptor: InputDescriptor) -> Self {
        self.input_descriptors.push(input_descriptor);
        self
    }

    /// Return the input descriptors of the presentation definition.
    pub fn input_descriptors(&self) -> &[InputDescriptor] {
        &self.input_descriptors
    }

    /// Find the input descriptor with the given id.
    pub fn input_descriptor(&self, id: &str) -> Option<&InputDescriptor> {
        self.input_descriptors.iter().find(|d| d.id() == id)
    }

    /// Return the input descriptors that are part of `group`.
    pub fn input_descriptors_in_group<'a>(
        &'a self,
        group: &'a str,
    ) -> impl Iterator<Item = &'a InputDescriptor> {
        self.input_descriptors.iter().filter(move |d| d.in_group(group))
    }

    /// Add a submission requirement.
    ///
    /// When present, submission requirements decide which input descriptors have to
    /// be satisfied instead of requiring all of them.
    pub fn add_submission_requirement(mut self, requirement: SubmissionRequirement) -> Self {
        self.submission_requirements.push(requirement);
        self
    }

    pub fn submission_requirements(&self) -> &[SubmissionRequirement] {
        &self.submission_requirements
    }

    /// Set the name of the presentation definition.
    ///
    /// If present, its value SHOULD be a human-friendly string intended to
    /// constitute a distinctive designation of the Presentation Definition.
    pub fn set_name(mut self, name: String) -> Self {
        self.name = Some(name);
        self
    }

    pub fn name(&self) -> Option<&String> {
        self.name.as_ref()
    }

    /// Set the purpose of the presentation definition.
    ///
    /// If present, its value MUST be a string that describes the purpose for which
    /// the Presentation Definition's inputs are being used for.
    pub fn set_purpose(mut self, purpose: String) -> Self {
        self.purpose = Some(purpose);
        self
    }

    pub fn purpose(&self) -> Option<&String> {
        self.purpose.as_ref()
    }

    pub fn set_locale(mut self, locale: String) -> Self {
        self.locale = Some(locale);
        self
    }

    pub fn locale(&self) -> Option<&String> {
        self.locale.as_ref()
    }

    /// Set the claim formats the verifier can process.
    pub fn set_format(mut self, format: ClaimFormatMap) -> Self {
        self.format = Some(format);
        self
    }

    pub fn format(&self) -> Option<&ClaimFormatMap> {
        self.format.as_ref()
    }

    /// Check the structural rules of the definition.
    pub fn validate(&self) -> Result<(), DefinitionError> {
        if self.input_descriptors.is_empty() {
            return Err(DefinitionError::NoInputDescriptors);
        }

        let mut ids = HashSet::new();
        for descriptor in &self.input_descriptors {
            if !ids.insert(descriptor.id()) {
                return Err(DefinitionError::DuplicateInputDescriptor(
                    descriptor.id().to_string(),
                ));
            }
        }

        let groups: HashSet<&str> = self
            .input_descriptors
            .iter()
            .flat_map(|d| d.groups().iter().map(String::as_str))
            .collect();

        for requirement in &self.submission_requirements {
            requirement.check_groups(&groups, 1)?;
        }

        Ok(())
    }
}

/// How many members of a group a submission requirement selects.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Rule {
    /// Every member must be submitted.
    All,
    /// A number of members bounded by `count`, `min` and `max`.
    Pick,
}

/// The members a submission requirement applies to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RequirementSource {
    /// The input descriptors of a group.
    From(GroupId),
    /// Nested submission requirements, each of which must hold.
    FromNested(Vec<SubmissionRequirement>),
}

/// Submission Requirements specify which combinations of input descriptors a
/// holder must submit.
///
/// See: [https://identity.foundation/presentation-exchange/spec/v2.0.0/#submission-requirements](https://identity.foundation/presentation-exchange/spec/v2.0.0/#submission-requirements)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "SubmissionRequirementObject",
    into = "SubmissionRequirementObject"
)]
pub struct SubmissionRequirement {
    name: Option<String>,
    purpose: Option<String>,
    rule: Rule,
    source: RequirementSource,
    count: Option<usize>,
    min: Option<usize>,
    max: Option<usize>,
}

/// Wire form of [SubmissionRequirement].
#[derive(Clone, Debug, Serialize, Deserialize)]
struct SubmissionRequirementObject {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    purpose: Option<String>,
    rule: Rule,
    #[serde(skip_serializing_if = "Option::is_none")]
    from: Option<GroupId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    from_nested: Option<Vec<SubmissionRequirement>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    min: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max: Option<usize>,
}

impl TryFrom<SubmissionRequirementObject> for SubmissionRequirement {
    type Error = DefinitionError;

    fn try_from(raw: SubmissionRequirementObject) -> Result<Self, Self::Error> {
        let source = match (raw.from, raw.from_nested) {
            (Some(group), None) => RequirementSource::From(group),
            (None, Some(nested)) => RequirementSource::FromNested(nested),
            (Some(_), Some(_)) => return Err(DefinitionError::AmbiguousSource),
            (None, None) => return Err(DefinitionError::MissingSource),
        };

        Ok(Self {
            name: raw.name,
            purpose: raw.purpose,
            rule: raw.rule,
            source,
            count: raw.count,
            min: raw.min,
            max: raw.max,
        })
    }
}

impl From<SubmissionRequirement> for SubmissionRequirementObject {
    fn from(requirement: SubmissionRequirement) -> Self {
        let (from, from_nested) = match requirement.source {
            RequirementSource::From(group) => (Some(group), None),
            RequirementSource::FromNested(nested) => (None, Some(nested)),
        };

        Self {
            name: requirement.name,
            purpose: requirement.purpose,
            rule: requirement.rule,
            from,
            from_nested,
            count: requirement.count,
            min: requirement.min,
            max: requirement.max,
        }
    }
}

impl SubmissionRequirement {
    /// Select every member of `group`.
    pub fn all(group: GroupId) -> Self {
        Self::with_source(Rule::All, RequirementSource::From(group))
    }

    /// Select a bounded number of members of `group`.
    pub fn pick(group: GroupId) -> Self {
        Self::with_source(Rule::Pick, RequirementSource::From(group))
    }

    /// Combine nested requirements under `rule`.
    pub fn nested(rule: Rule, requirements: Vec<SubmissionRequirement>) -> Self {
        Self::with_source(rule, RequirementSource::FromNested(requirements))
    }

    fn with_source(rule: Rule, source: RequirementSource) -> Self {
        Self {
            name: None,
            purpose: None,
            rule,
            source,
            count: None,
            min: None,
            max: None,
        }
    }

    pub fn set_name(mut self, name: String) -> Self {
        self.name = Some(name);
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_purpose(mut self, purpose: String) -> Self {
        self.purpose = Some(purpose);
        self
    }

    pub fn purpose(&self) -> Option<&str> {
        self.purpose.as_deref()
    }

    pub fn rule(&self) -> Rule {
        self.rule
    }

    pub fn source(&self) -> &RequirementSource {
        &self.source
    }

    /// Exact number of members to select.
    pub fn set_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    pub fn count(&self) -> Option<usize> {
        self.count
    }

    pub fn set_min(mut self, min: usize) -> Self {
        self.min = Some(min);
        self
    }

    pub fn min(&self) -> Option<usize> {
        self.min
    }

    pub fn set_max(mut self, max: usize) -> Self {
        self.max = Some(max);
        self
    }

    pub fn max(&self) -> Option<usize> {
        self.max
    }

    fn check_groups(&self, groups: &HashSet<&str>, depth: usize) -> Result<(), DefinitionError> {
        if depth > MAX_REQUIREMENT_DEPTH {
            return Err(DefinitionError::NestingTooDeep);
        }

        match &self.source {
            RequirementSource::From(group) if !groups.contains(group.as_str()) => {
                Err(DefinitionError::UnknownGroup(group.clone()))
            }
            RequirementSource::From(_) => Ok(()),
            RequirementSource::FromNested(nested) => nested
                .iter()
                .try_for_each(|requirement| requirement.check_groups(groups, depth + 1)),
        }
    }
}
