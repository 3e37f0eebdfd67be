use super::credential_format::ClaimFormatDesignation;
use super::input_descriptor::JsonPath;

use serde::{Deserialize, Serialize};

/// A DescriptorMapId is a unique identifier for a DescriptorMap.
pub type DescriptorMapId = String;

/// Presentation Submissions are objects embedded within target
/// [Claim](https://identity.foundation/presentation-exchange/spec/v2.0.0/#term:claim) negotiation
/// formats that express how the inputs presented as proofs to a
/// [Verifier](https://identity.foundation/presentation-exchange/spec/v2.0.0/#term:verifier) are
/// provided in accordance with the requirements specified in a
/// [PresentationDefinition](super::presentation_definition::PresentationDefinition).
///
/// Embedded Presentation Submission objects MUST be located within target data format as
/// the value of a `presentation_submission` property.
///
/// For more information, see: [https://identity.foundation/presentation-exchange/spec/v2.0.0/#presentation-submission](https://identity.foundation/presentation-exchange/spec/v2.0.0/#presentation-submission)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PresentationSubmission {
    id: String,
    definition_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    locale: Option<String>,
    descriptor_map: Vec<DescriptorMap>,
}

impl PresentationSubmission {
    /// The presentation submission MUST contain an id property. A fresh UUID is generated.
    ///
    /// The presentation submission object MUST contain a `definition_id` property.
    /// The value of this property MUST be the id value of a valid presentation definition.
    ///
    /// The object MUST include a `descriptor_map` property. The value of this property MUST be an array of
    /// Input [DescriptorMap] Objects.
    pub fn new(definition_id: String, descriptor_map: Vec<DescriptorMap>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            definition_id,
            locale: None,
            descriptor_map,
        }
    }

    /// Return the id of the presentation submission.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Return the definition id of the presentation submission.
    pub fn definition_id(&self) -> &str {
        &self.definition_id
    }

    pub fn set_locale(mut self, locale: String) -> Self {
        self.locale = Some(locale);
        self
    }

    pub fn locale(&self) -> Option<&String> {
        self.locale.as_ref()
    }

    /// Add an entry to the descriptor map.
    pub fn add_descriptor_map(mut self, descriptor_map: DescriptorMap) -> Self {
        self.descriptor_map.push(descriptor_map);
        self
    }

    /// Return the descriptor map of the presentation submission.
    pub fn descriptor_map(&self) -> &[DescriptorMap] {
        &self.descriptor_map
    }

    /// Return a mutable reference to the descriptor map of the presentation submission.
    pub fn descriptor_map_mut(&mut self) -> &mut Vec<DescriptorMap> {
        &mut self.descriptor_map
    }

    /// Returns true if an entry of the descriptor map fulfils the input descriptor `id`.
    pub fn contains_descriptor(&self, id: &str) -> bool {
        self.descriptor_map.iter().any(|entry| entry.id == id)
    }
}

/// Descriptor Maps are objects used to describe the information a
/// [Holder](https://identity.foundation/presentation-exchange/spec/v2.0.0/#term:holder) provides to a
/// [Verifier](https://identity.foundation/presentation-exchange/spec/v2.0.0/#term:verifier).
///
/// For more information, see: [https://identity.foundation/presentation-exchange/spec/v2.0.0/#presentation-submission](https://identity.foundation/presentation-exchange/spec/v2.0.0/#presentation-submission)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DescriptorMap {
    id: DescriptorMapId,
    format: ClaimFormatDesignation,
    path: JsonPath,
}

impl DescriptorMap {
    /// The descriptor map MUST include an `id` property. The value of this property MUST be a string that matches the `id` property of the
    /// input descriptor in the presentation definition that this submission is related to.
    ///
    /// The descriptor map object MUST include a `format` property. The value of this property MUST be a string that matches one of the
    /// [ClaimFormatDesignation]. This denotes the data format of the
    /// [Claim](https://identity.foundation/presentation-exchange/spec/v2.0.0/#term:claim).
    ///
    /// The descriptor map object MUST include a `path` property. The value of this property MUST be a
    /// [JSONPath](https://goessner.net/articles/JsonPath/) string expression. The path property indicates the
    /// [Claim](https://identity.foundation/presentation-exchange/spec/v2.0.0/#term:claim) submitted in relation to the identified
    /// input descriptor, when executed against the top-level of the object the presentation submission is embedded within.
    pub fn new(
        id: impl Into<DescriptorMapId>,
        format: impl Into<ClaimFormatDesignation>,
        path: JsonPath,
    ) -> Self {
        Self {
            id: id.into(),
            format: format.into(),
            path,
        }
    }

    /// Return the id of the descriptor map.
    pub fn id(&self) -> &DescriptorMapId {
        &self.id
    }

    /// Return the format of the descriptor map.
    pub fn format(&self) -> &ClaimFormatDesignation {
        &self.format
    }

    /// Return the path of the descriptor map.
    pub fn path(&self) -> &JsonPath {
        &self.path
    }
}
