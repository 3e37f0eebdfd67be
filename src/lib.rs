//! This library validates verifiable presentations against [DIF Presentation Exchange]
//! presentation definitions.
//!
//! [DIF Presentation Exchange]: <https://identity.foundation/presentation-exchange/spec/v2.0.0/>
//!
//! # Usage
//!
//! A verifier describes the credentials it needs with a [`PresentationDefinition`]. A holder
//! answers with a [`VerifiablePresentation`] whose embedded [`PresentationSubmission`] maps
//! each supplied credential to one of the requested input descriptors. The
//! [`PresentationValidator`] decides whether the answer satisfies the request:
//!
//! ```ignore
//! use presentation_exchange::core::diagnostic::DiagnosticContext;
//! use presentation_exchange::core::util::ReqwestClient;
//! use presentation_exchange::verifier::PresentationValidator;
//!
//! let validator = PresentationValidator::builder()
//!     .with_ssi_service(ssi_service)
//!     .with_http_client(Arc::new(ReqwestClient::new()?))
//!     .build()?;
//!
//! let ctx = DiagnosticContext::new().set_timeout(Duration::from_secs(30));
//! match validator.validate(&ctx, &definition, &presentation, "did:example:verifier").await {
//!     Ok(result) => println!("accepted after {:?}", result.checks()),
//!     Err(failure) => println!("rejected: {failure}, {:?}", failure.result),
//! }
//! ```
//!
//! Cryptographic proof verification is delegated to an [`SsiService`] implementation, JSON
//! schema validation to a [`JsonSchemaValidator`], which defaults to fetching schemas over
//! the [`AsyncHttpClient`] also used for credential status lookups.
//!
//! # Validation stages
//!
//! 1. *Identifiers*: the submission answers this definition.
//! 2. *Subject*: every credential is about the same subject.
//! 3. *Submission*: each descriptor map entry references a credential that conforms to a
//!    requested schema, is signed by its issuer, carries a valid proof, is not revoked, and
//!    satisfies the field constraints of its input descriptor.
//! 4. *Submission requirements*: the group rules of the definition hold.
//! 5. *Presentation proof*: the presentation itself is signed.
//!
//! Each passed stage is recorded in the [`VerificationResult`] together with warnings. The
//! first failing stage ends the validation with a [`ValidationFailure`].
//!
//! [`PresentationDefinition`]: crate::core::presentation_definition::PresentationDefinition
//! [`PresentationSubmission`]: crate::core::presentation_submission::PresentationSubmission
//! [`VerifiablePresentation`]: crate::core::credential::VerifiablePresentation
//! [`VerificationResult`]: crate::core::verification_result::VerificationResult
//! [`AsyncHttpClient`]: crate::core::util::AsyncHttpClient
//! [`PresentationValidator`]: crate::verifier::PresentationValidator
//! [`ValidationFailure`]: crate::verifier::ValidationFailure
//! [`SsiService`]: crate::verifier::ssi::SsiService
//! [`JsonSchemaValidator`]: crate::verifier::schema::JsonSchemaValidator

pub mod config;
pub mod core;
pub mod utils;
pub mod verifier;
