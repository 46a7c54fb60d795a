//! Contract testing client.
//!
//! Client for the contract broker: deployment safety checks, provider states,
//! and the AI-assisted test generation and review jobs. Generation and review
//! run server-side; the client submits them and polls until the result is
//! ready.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use toolhub_client::{
    segment, CancellationToken, ClientConfig, ClientResult, FieldPolicy, PolicyRegistry,
    PollOutcome, RequestDescriptor, ResourceClient, ResponseEnvelope,
};
use tracing::{debug, instrument};

/// Resource types this client requests.
pub mod resources {
    pub const DEPLOYMENT_CHECK: &str = "deployment_check";
    pub const PROVIDER_STATES: &str = "provider_states";
    pub const GENERATED_TESTS: &str = "generated_tests";
    pub const TEST_REVIEW: &str = "test_review";
}

/// Contract broker API client.
#[derive(Clone)]
pub struct ContractTestingClient {
    core: ResourceClient,
}

impl ContractTestingClient {
    /// Create a new contract testing client.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        Ok(Self {
            core: ResourceClient::new(config, Self::policies())?,
        })
    }

    /// Field policies for every resource type this client returns.
    pub fn policies() -> PolicyRegistry {
        PolicyRegistry::new()
            .with(resources::DEPLOYMENT_CHECK, FieldPolicy::Passthrough)
            .with(resources::PROVIDER_STATES, FieldPolicy::Passthrough)
            .with(resources::GENERATED_TESTS, FieldPolicy::Passthrough)
            .with(resources::TEST_REVIEW, FieldPolicy::Passthrough)
    }

    /// Underlying resource client.
    pub fn core(&self) -> &ResourceClient {
        &self.core
    }

    /// Ask the broker whether a participant version can be deployed.
    #[instrument(skip(self, params, cancel), fields(pacticipant = %params.pacticipant, version = %params.version))]
    pub async fn can_i_deploy(
        &self,
        params: CanIDeployParams,
        cancel: &CancellationToken,
    ) -> ClientResult<ResponseEnvelope<Value>> {
        debug!(
            environment = %params.environment,
            "Checking deployment of {}@{}", params.pacticipant, params.version
        );

        let request = RequestDescriptor::get("/can-i-deploy")
            .with_query("pacticipant", &params.pacticipant)
            .with_query("version", &params.version)
            .with_query("environment", &params.environment);
        self.core
            .fetch_object(resources::DEPLOYMENT_CHECK, &request, cancel)
            .await
    }

    /// List the provider states a provider's pacts expect.
    #[instrument(skip(self, cancel), fields(provider = %provider))]
    pub async fn list_provider_states(
        &self,
        provider: &str,
        cancel: &CancellationToken,
    ) -> ClientResult<ResponseEnvelope<Value>> {
        debug!("Listing provider states for {}", provider);

        let request = RequestDescriptor::get(format!(
            "/pacts/provider/{}/provider-states",
            segment(provider)?
        ));
        self.core
            .fetch_object(resources::PROVIDER_STATES, &request, cancel)
            .await
    }

    /// Generate contract tests and wait for the result.
    #[instrument(skip(self, params, cancel), fields(language = ?params.language))]
    pub async fn generate_tests(
        &self,
        params: GenerateTestsParams,
        cancel: &CancellationToken,
    ) -> ClientResult<PollOutcome> {
        debug!("Submitting test generation job");

        let request = RequestDescriptor::post("/api/ai/generate").with_json(to_body(&params)?);
        self.core
            .run_job(resources::GENERATED_TESTS, &request, cancel)
            .await
    }

    /// Review existing contract tests and wait for the result.
    #[instrument(skip(self, params, cancel))]
    pub async fn review_tests(
        &self,
        params: ReviewTestsParams,
        cancel: &CancellationToken,
    ) -> ClientResult<PollOutcome> {
        debug!("Submitting test review job");

        let request = RequestDescriptor::post("/api/ai/review").with_json(to_body(&params)?);
        self.core.run_job(resources::TEST_REVIEW, &request, cancel).await
    }
}

fn to_body<T: Serialize>(params: &T) -> ClientResult<Value> {
    serde_json::to_value(params).map_err(|e| toolhub_client::ClientError::Shape(e.to_string()))
}

/// Parameters for a deployment check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanIDeployParams {
    /// Participant (consumer or provider) name.
    pub pacticipant: String,

    /// Participant version.
    pub version: String,

    /// Target environment.
    pub environment: String,
}

/// A source file passed as generation or review context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    /// File path, used by the generator for naming.
    pub filename: String,

    /// File contents.
    pub body: String,
}

/// Parameters for test generation. At least one input should be given.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateTestsParams {
    /// Target language, e.g. `typescript` or `java`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// OpenAPI document to generate from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openapi: Option<Value>,

    /// Recorded request/response pair to generate from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_response: Option<Value>,

    /// Client code the tests should exercise.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub code: Vec<SourceFile>,

    /// Free-form guidance for the generator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_instructions: Option<String>,
}

/// Parameters for test review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewTestsParams {
    /// The tests to review.
    pub pact_tests: SourceFile,

    /// Surrounding code for context.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub code: Vec<SourceFile>,

    /// Free-form guidance for the reviewer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_instructions: Option<String>,
}
