use std::time::Duration;

use serde::Deserialize;

/// Default upper bound for a single credential status lookup.
pub const DEFAULT_STATUS_TIMEOUT: Duration = Duration::from_secs(5);

/// Header carrying the request trace id to the credential status endpoint.
pub const DEFAULT_TRACE_HEADER: &str = "X-Span-Id";

/// Name of the submission requirement that triggers the second factor check.
pub const DEFAULT_IDENTITY_REQUIREMENT: &str = "Identity verification";

/// Group tag of the input descriptors describing second factor keys.
pub const DEFAULT_IDENTITY_GROUP: &str = "identity";

/// Tunables of the [PresentationValidator](crate::verifier::PresentationValidator).
///
/// Every key is optional when deserializing, missing keys take the defaults above.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ValidatorConfig {
    status_timeout_ms: u64,
    trace_header: String,
    identity_requirement: String,
    identity_group: String,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            status_timeout_ms: millis(DEFAULT_STATUS_TIMEOUT),
            trace_header: DEFAULT_TRACE_HEADER.to_string(),
            identity_requirement: DEFAULT_IDENTITY_REQUIREMENT.to_string(),
            identity_group: DEFAULT_IDENTITY_GROUP.to_string(),
        }
    }
}

impl ValidatorConfig {
    pub fn set_status_timeout(mut self, timeout: Duration) -> Self {
        self.status_timeout_ms = millis(timeout);
        self
    }

    pub fn status_timeout(&self) -> Duration {
        Duration::from_millis(self.status_timeout_ms)
    }

    pub fn set_trace_header(mut self, header: String) -> Self {
        self.trace_header = header;
        self
    }

    pub fn trace_header(&self) -> &str {
        &self.trace_header
    }

    pub fn set_identity_requirement(mut self, name: String) -> Self {
        self.identity_requirement = name;
        self
    }

    pub fn identity_requirement(&self) -> &str {
        &self.identity_requirement
    }

    pub fn set_identity_group(mut self, group: String) -> Self {
        self.identity_group = group;
        self
    }

    pub fn identity_group(&self) -> &str {
        &self.identity_group
    }
}

fn millis(timeout: Duration) -> u64 {
    u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)
}
