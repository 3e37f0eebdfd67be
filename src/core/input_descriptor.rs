use serde::{Deserialize, Serialize};

use super::filter::Filter;
use crate::utils::NonEmptyVec;

/// A GroupId represents a unique identifier for a group of Input Descriptors.
///
/// This type is also used by the submission requirements to group input descriptors.
pub type GroupId = String;

/// A JSONPath is a string that represents a path to a specific value within a JSON object.
///
/// For syntax details, see [https://identity.foundation/presentation-exchange/spec/v2.0.0/#jsonpath-syntax-definition](https://identity.foundation/presentation-exchange/spec/v2.0.0/#jsonpath-syntax-definition)
pub type JsonPath = String;

/// How strongly a verifier asks for a feature: `required` or `preferred`.
///
/// Used by the field `predicate` and by the `subject_is_issuer` / `is_holder`
/// constraints.
///
/// See: [https://identity.foundation/presentation-exchange/#predicate-feature](https://identity.foundation/presentation-exchange/#predicate-feature)
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Preference {
    /// The feature **MUST** be satisfied.
    Required,
    /// The feature **SHOULD** be satisfied, failing it is tolerated.
    Preferred,
}

/// A schema the submitted credential is expected to conform to.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Schema {
    pub uri: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
}

impl Schema {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            required: false,
        }
    }

    pub fn required(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            required: true,
        }
    }
}

/// Input Descriptors are objects used to describe the information a
/// [Verifier](https://identity.foundation/presentation-exchange/spec/v2.0.0/#term:verifier) requires of a
/// [Holder](https://identity.foundation/presentation-exchange/spec/v2.0.0/#term:holder).
///
/// All Input Descriptors MUST be satisfied, unless otherwise specified by a
/// [Feature](https://identity.foundation/presentation-exchange/spec/v2.0.0/#term:feature).
///
/// See: [https://identity.foundation/presentation-exchange/spec/v1.0.0/#input-descriptor-object](https://identity.foundation/presentation-exchange/spec/v1.0.0/#input-descriptor-object)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct InputDescriptor {
    id: String,
    schema: NonEmptyVec<Schema>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    purpose: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    group: Vec<GroupId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    constraints: Option<Constraints>,
}

impl InputDescriptor {
    /// Create a new input descriptor requesting a credential of the given schema.
    ///
    /// The Input Descriptor Object MUST contain an id property. The value of the id
    /// property MUST be a string that does not conflict with the id of another
    /// Input Descriptor Object in the same Presentation Definition.
    pub fn new(id: String, schema: Schema) -> Self {
        Self {
            id,
            schema: NonEmptyVec::new(schema),
            name: None,
            purpose: None,
            group: Vec::new(),
            constraints: None,
        }
    }

    /// Return the id of the input descriptor.
    pub fn id(&self) -> &str {
        self.id.as_str()
    }

    /// Add another acceptable schema.
    pub fn add_schema(mut self, schema: Schema) -> Self {
        self.schema.push(schema);
        self
    }

    /// Return the acceptable schemas, in order of preference.
    pub fn schema(&self) -> &NonEmptyVec<Schema> {
        &self.schema
    }

    /// Set the name of the input descriptor.
    pub fn set_name(mut self, name: String) -> Self {
        self.name = Some(name);
        self
    }

    /// Return the name of the input descriptor.
    pub fn name(&self) -> Option<&String> {
        self.name.as_ref()
    }

    /// Set the purpose of the input descriptor.
    ///
    /// If present, the purpose MUST be a string that describes the purpose for which the
    /// [Claim](https://identity.foundation/presentation-exchange/spec/v2.0.0/#term:claim)'s
    /// data is being requested.
    pub fn set_purpose(mut self, purpose: String) -> Self {
        self.purpose = Some(purpose);
        self
    }

    /// Return the purpose of the input descriptor.
    pub fn purpose(&self) -> Option<&String> {
        self.purpose.as_ref()
    }

    /// Set the groups of the input descriptor.
    pub fn set_group(mut self, group: Vec<GroupId>) -> Self {
        self.group = group;
        self
    }

    /// Add the input descriptor to a group.
    pub fn add_to_group(mut self, member: GroupId) -> Self {
        self.group.push(member);
        self
    }

    /// Return the groups of the input descriptor.
    pub fn groups(&self) -> &[GroupId] {
        &self.group
    }

    pub fn in_group(&self, group: &str) -> bool {
        self.group.iter().any(|g| g == group)
    }

    pub fn set_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = Some(constraints);
        self
    }

    /// Return the constraints of the input descriptor, if any.
    pub fn constraints(&self) -> Option<&Constraints> {
        self.constraints.as_ref()
    }
}

/// Constraints are objects used to describe the constraints that a [Holder](https://identity.foundation/presentation-exchange/spec/v2.0.0/#term:holder) must satisfy to fulfill an Input Descriptor.
///
/// For more information, see: [https://identity.foundation/presentation-exchange/spec/v2.0.0/#input-descriptor-object](https://identity.foundation/presentation-exchange/spec/v2.0.0/#input-descriptor-object)
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Constraints {
    #[serde(
        default,
        deserialize_with = "deserialize_limit_disclosure",
        skip_serializing_if = "std::ops::Not::not"
    )]
    limit_disclosure: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    fields: Vec<Field>,
    #[serde(skip_serializing_if = "Option::is_none")]
    subject_is_issuer: Option<Preference>,
    #[serde(
        alias = "is_holder",
        skip_serializing_if = "Option::is_none"
    )]
    subject_is_holder: Option<Preference>,
}

/// `limit_disclosure` is a boolean in early drafts and a [Preference] in later ones.
fn deserialize_limit_disclosure<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum LimitDisclosure {
        Flag(bool),
        Preference(Preference),
    }

    Ok(match LimitDisclosure::deserialize(deserializer)? {
        LimitDisclosure::Flag(flag) => flag,
        LimitDisclosure::Preference(_) => true,
    })
}

impl Constraints {
    /// Returns an empty Constraints object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new field constraint to the constraints list.
    pub fn add_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Returns the fields of the constraints object.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Request that the submitted data is limited to the entries of `fields`.
    ///
    /// For more information: see [https://identity.foundation/presentation-exchange/spec/v2.0.0/#limited-disclosure-submissions](https://identity.foundation/presentation-exchange/spec/v2.0.0/#limited-disclosure-submissions)
    pub fn set_limit_disclosure(mut self, limit_disclosure: bool) -> Self {
        self.limit_disclosure = limit_disclosure;
        self
    }

    pub fn limit_disclosure(&self) -> bool {
        self.limit_disclosure
    }

    /// Request that the credential subject is also its issuer.
    pub fn set_subject_is_issuer(mut self, preference: Preference) -> Self {
        self.subject_is_issuer = Some(preference);
        self
    }

    pub fn subject_is_issuer(&self) -> Option<Preference> {
        self.subject_is_issuer
    }

    /// Request that the credential subject is the holder presenting it.
    pub fn set_subject_is_holder(mut self, preference: Preference) -> Self {
        self.subject_is_holder = Some(preference);
        self
    }

    pub fn subject_is_holder(&self) -> Option<Preference> {
        self.subject_is_holder
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FieldError {
    #[error("field cannot have a predicate preference without a filter")]
    PredicateWithoutFilter,
}

/// Field objects describe one claim a submitted credential must carry, and the
/// filter its value must satisfy.
///
/// For more information, see: [https://identity.foundation/presentation-exchange/spec/v2.0.0/#input-descriptor-object](https://identity.foundation/presentation-exchange/spec/v2.0.0/#input-descriptor-object)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "FieldObject")]
pub struct Field {
    path: NonEmptyVec<JsonPath>,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    purpose: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<Filter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    predicate: Option<Preference>,
}

/// Wire form of [Field], checked on conversion.
#[derive(Deserialize)]
struct FieldObject {
    path: NonEmptyVec<JsonPath>,
    id: Option<String>,
    purpose: Option<String>,
    filter: Option<Filter>,
    predicate: Option<Preference>,
}

impl TryFrom<FieldObject> for Field {
    type Error = FieldError;

    fn try_from(raw: FieldObject) -> Result<Self, Self::Error> {
        let field = Field {
            path: raw.path,
            id: raw.id,
            purpose: raw.purpose,
            filter: raw.filter,
            predicate: None,
        };
        match raw.predicate {
            Some(predicate) => field.set_predicate(predicate),
            None => Ok(field),
        }
    }
}

impl From<NonEmptyVec<JsonPath>> for Field {
    fn from(path: NonEmptyVec<JsonPath>) -> Self {
        Self {
            path,
            id: None,
            purpose: None,
            filter: None,
            predicate: None,
        }
    }
}

impl Field {
    /// Create a new field with the given path.
    ///
    /// Fields must have at least one JSONPath to the claim the constraint applies to,
    /// further paths are fallbacks tried in order.
    pub fn new(path: JsonPath) -> Field {
        Self::from(NonEmptyVec::new(path))
    }

    /// Add a fallback path to the field.
    pub fn add_path(mut self, path: JsonPath) -> Self {
        self.path.push(path);
        self
    }

    /// Return the candidate paths of the field.
    pub fn path(&self) -> &NonEmptyVec<JsonPath> {
        &self.path
    }

    pub fn set_id(mut self, id: String) -> Self {
        self.id = Some(id);
        self
    }

    pub fn id(&self) -> Option<&String> {
        self.id.as_ref()
    }

    pub fn set_purpose(mut self, purpose: String) -> Self {
        self.purpose = Some(purpose);
        self
    }

    pub fn purpose(&self) -> Option<&String> {
        self.purpose.as_ref()
    }

    pub fn set_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn filter(&self) -> Option<&Filter> {
        self.filter.as_ref()
    }

    /// Set the predicate of the field.
    ///
    /// If the predicate property is present, the filter property **MUST** also be present,
    /// so the filter has to be set first.
    pub fn set_predicate(mut self, predicate: Preference) -> Result<Self, FieldError> {
        if self.filter.is_none() {
            return Err(FieldError::PredicateWithoutFilter);
        }
        self.predicate = Some(predicate);
        Ok(self)
    }

    pub fn predicate(&self) -> Option<Preference> {
        self.predicate
    }

    /// A field is required unless its predicate is `preferred`.
    pub fn is_required(&self) -> bool {
        self.predicate != Some(Preference::Preferred)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::core::filter::FilterType;
    use serde_json::json;

    #[test]
    fn descriptor_from_json() {
        let descriptor: InputDescriptor = serde_json::from_value(json!({
            "id": "employment_input",
            "name": "Employment History",
            "group": ["B"],
            "schema": [
                { "uri": "https://business-standards.org/schemas/employment-history.json" }
            ],
            "constraints": {
                "fields": [{
                    "path": ["$.credentialSubject.jobs[*].active"],
                    "filter": { "type": "boolean", "pattern": "true" },
                    "predicate": "preferred"
                }]
            }
        }))
        .unwrap();

        assert!(descriptor.in_group("B"));
        assert!(!descriptor.schema().head().required);
        let field = &descriptor.constraints().unwrap().fields()[0];
        assert_eq!(field.predicate(), Some(Preference::Preferred));
        assert!(!field.is_required());
    }

    #[test]
    fn descriptor_requires_a_schema() {
        let result = serde_json::from_value::<InputDescriptor>(json!({
            "id": "banking_input",
            "schema": []
        }));
        assert!(result.is_err());
    }

    #[test]
    fn predicate_without_filter_is_rejected() {
        let result = serde_json::from_value::<Field>(json!({
            "path": ["$.issuer"],
            "predicate": "required"
        }));
        assert!(result.is_err());

        assert_eq!(
            Field::new("$.issuer".into()).set_predicate(Preference::Required),
            Err(FieldError::PredicateWithoutFilter)
        );
        assert!(Field::new("$.issuer".into())
            .set_filter(Filter::new(FilterType::String))
            .set_predicate(Preference::Required)
            .is_ok());
    }

    #[test]
    fn holder_constraint_accepts_both_spellings() {
        let constraints: Constraints =
            serde_json::from_value(json!({ "is_holder": "required" })).unwrap();
        assert_eq!(constraints.subject_is_holder(), Some(Preference::Required));

        let constraints: Constraints = serde_json::from_value(json!({
            "subject_is_holder": "preferred",
            "subject_is_issuer": "required",
            "limit_disclosure": true
        }))
        .unwrap();
        assert_eq!(constraints.subject_is_holder(), Some(Preference::Preferred));
        assert_eq!(constraints.subject_is_issuer(), Some(Preference::Required));
        assert!(constraints.limit_disclosure());

        let constraints: Constraints =
            serde_json::from_value(json!({ "limit_disclosure": "required" })).unwrap();
        assert!(constraints.limit_disclosure());
    }
}
