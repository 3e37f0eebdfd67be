pub mod credential;
pub mod credential_format;
pub mod diagnostic;
pub mod error;
pub mod filter;
pub mod input_descriptor;
pub mod json_path;
pub mod polymorphic;
pub mod presentation_definition;
pub mod presentation_submission;
pub mod proof;
pub mod util;
pub mod verification_result;
