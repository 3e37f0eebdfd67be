use std::{collections::HashMap, sync::Arc};

use anyhow::{bail, Context};
use async_trait::async_trait;
use http::{header::ACCEPT, Request};
use jsonschema::JSONSchema;
use serde_json::Value;
use tokio::sync::RwLock;
use url::Url;

use crate::core::{
    credential::{context_contains, VerifiableCredential},
    diagnostic::DiagnosticContext,
    error::ValidationError,
    input_descriptor::Schema,
    util::AsyncHttpClient,
};

/// Where a JSON schema comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaSource {
    /// A schema document to fetch.
    Uri(Url),
    /// A schema given in place.
    Inline(Value),
}

impl SchemaSource {
    /// Interpret a schema reference: JSON text is an inline schema, anything else a URI.
    pub fn parse(reference: &str) -> Result<Self, SchemaError> {
        let trimmed = reference.trim_start();
        if trimmed.starts_with('{') {
            return serde_json::from_str(trimmed)
                .map(Self::Inline)
                .map_err(|e| SchemaError::Reference(format!("{reference}: {e}")));
        }

        Url::parse(reference)
            .map(Self::Uri)
            .map_err(|e| SchemaError::Reference(format!("{reference}: {e}")))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("invalid schema reference {0}")]
    Reference(String),
    #[error("unable to load schema {uri}: {source:#}")]
    Load { uri: String, source: anyhow::Error },
    #[error("invalid schema: {0}")]
    Compile(String),
    #[error("document is not valid json")]
    InvalidDocument,
    /// The document was checked and violates the schema.
    #[error("{}", .0.join("; "))]
    Invalid(Vec<String>),
}

impl From<SchemaError> for ValidationError {
    fn from(value: SchemaError) -> Self {
        ValidationError::InvalidFormat(value.to_string())
    }
}

/// Validates JSON documents against JSON schemas.
#[async_trait]
pub trait JsonSchemaValidator: Send + Sync {
    async fn validate(&self, schema: &SchemaSource, document: &Value) -> Result<(), SchemaError>;
}

/// [JsonSchemaValidator] fetching remote schemas over HTTP and keeping them compiled.
pub struct JsonSchemaLoader<C> {
    client: C,
    cache: RwLock<HashMap<Url, Arc<JSONSchema>>>,
}

impl<C> JsonSchemaLoader<C>
where
    C: AsyncHttpClient + Send + Sync,
{
    pub fn new(client: C) -> Self {
        Self {
            client,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Validate a JSON document given as text against a schema reference, see [SchemaSource::parse].
    pub async fn validate_strings(&self, schema: &str, document: &str) -> Result<(), SchemaError> {
        let document: Value =
            serde_json::from_str(document).map_err(|_| SchemaError::InvalidDocument)?;
        let source = SchemaSource::parse(schema)?;
        self.validate(&source, &document).await
    }

    async fn compiled(&self, uri: &Url) -> Result<Arc<JSONSchema>, SchemaError> {
        if let Some(schema) = self.cache.read().await.get(uri) {
            return Ok(schema.clone());
        }

        let document = self.fetch(uri).await.map_err(|source| SchemaError::Load {
            uri: uri.to_string(),
            source,
        })?;
        let schema = Arc::new(compile(&document)?);

        tracing::debug!("caching schema {uri}");
        self.cache
            .write()
            .await
            .insert(uri.clone(), schema.clone());
        Ok(schema)
    }

    async fn fetch(&self, uri: &Url) -> anyhow::Result<Value> {
        if !matches!(uri.scheme(), "http" | "https") {
            bail!("unsupported scheme {}", uri.scheme())
        }

        let request = Request::builder()
            .method("GET")
            .uri(uri.as_str())
            .header(ACCEPT, "application/json")
            .body(vec![])
            .context("failed to build schema request")?;

        let response = self
            .client
            .execute(request)
            .await
            .context(format!("failed to make schema request at {uri}"))?;

        let status = response.status();
        if !status.is_success() {
            bail!("schema request was unsuccessful (status: {status})")
        }

        serde_json::from_slice(response.body()).context("schema is not valid json")
    }
}

#[async_trait]
impl<C> JsonSchemaValidator for JsonSchemaLoader<C>
where
    C: AsyncHttpClient + Send + Sync,
{
    async fn validate(&self, schema: &SchemaSource, document: &Value) -> Result<(), SchemaError> {
        match schema {
            SchemaSource::Uri(uri) => check(&*self.compiled(uri).await?, document),
            SchemaSource::Inline(schema) => check(&compile(schema)?, document),
        }
    }
}

fn compile(schema: &Value) -> Result<JSONSchema, SchemaError> {
    JSONSchema::compile(schema).map_err(|e| SchemaError::Compile(e.to_string()))
}

fn check(schema: &JSONSchema, document: &Value) -> Result<(), SchemaError> {
    schema.validate(document).map_err(|errors| {
        SchemaError::Invalid(
            errors
                .map(|e| format!("{}: {e}", e.instance_path))
                .collect(),
        )
    })
}

/// Outcome of matching a credential against the schemas an input descriptor accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaResolution {
    /// The accepted schema.
    pub uri: String,
    /// The credential did not point at the schema, it only validated against it.
    pub implicit: bool,
}

/// Warning recorded when a credential only implicitly conforms to the accepted schema.
pub const IMPLICIT_SCHEMA_WARNING: &str =
    "Credential Schema is matching but wasn't explicitly stated";

/// Find the first of the `requested` schemas the credential satisfies.
///
/// A schema is satisfied when the credential points at it through `credentialSchema`
/// and validates against it, when the credential `@context` lists it, or, for
/// credentials without a schema pointer, when the credential validates against it.
pub async fn resolve(
    ctx: &DiagnosticContext,
    validator: &dyn JsonSchemaValidator,
    credential_json: &Value,
    credential: &VerifiableCredential,
    requested: &[Schema],
) -> Result<SchemaResolution, ValidationError> {
    let pointer = credential.credential_schema().map(|schema| schema.id.as_str());

    for schema in requested {
        if pointer == Some(schema.uri.as_str()) {
            let source = SchemaSource::parse(&schema.uri)?;
            validate_bounded(ctx, validator, &source, credential_json).await?;
            return Ok(SchemaResolution {
                uri: schema.uri.clone(),
                implicit: false,
            });
        }

        if context_contains(credential.context(), &schema.uri) {
            return Ok(SchemaResolution {
                uri: schema.uri.clone(),
                implicit: false,
            });
        }

        if pointer.is_none() {
            let outcome = match SchemaSource::parse(&schema.uri) {
                Ok(source) => validate_bounded(ctx, validator, &source, credential_json).await,
                Err(e) => Err(e.into()),
            };
            match outcome {
                Ok(()) => {
                    return Ok(SchemaResolution {
                        uri: schema.uri.clone(),
                        implicit: true,
                    })
                }
                Err(e) => tracing::debug!("credential does not conform to {}: {e}", schema.uri),
            }
        }

        if schema.required {
            return Err(ValidationError::InvalidFormat(
                "Required schema is missing".into(),
            ));
        }
    }

    Err(ValidationError::InvalidFormat(
        "Credential schema does not match requested schemas".into(),
    ))
}

async fn validate_bounded(
    ctx: &DiagnosticContext,
    validator: &dyn JsonSchemaValidator,
    source: &SchemaSource,
    document: &Value,
) -> Result<(), ValidationError> {
    ctx.bounded(None, validator.validate(source, document))
        .await
        .map_err(|e| ValidationError::Transport(e.into()))?
        .map_err(Into::into)
}
