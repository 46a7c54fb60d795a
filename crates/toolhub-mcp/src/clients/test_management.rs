//! Test management client.
//!
//! Client for the test management API: test cases, test runs and suite
//! executions. Authenticates with an `apikey` header.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use toolhub_client::{
    segment, CancellationToken, ClientConfig, ClientResult, FieldPolicy, PolicyRegistry,
    PollOutcome, RequestDescriptor, ResourceClient, ResponseEnvelope,
};
use tracing::{debug, instrument};

/// Resource types this client requests.
pub mod resources {
    pub const TEST_CASE: &str = "test_case";
    pub const TEST_RUN: &str = "test_run";
    pub const SUITE_EXECUTION: &str = "suite_execution";
}

/// Test management API client.
#[derive(Clone)]
pub struct TestManagementClient {
    core: ResourceClient,
}

impl TestManagementClient {
    /// Create a new test management client.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        Ok(Self {
            core: ResourceClient::new(config, Self::policies())?,
        })
    }

    /// Field policies for every resource type this client returns.
    pub fn policies() -> PolicyRegistry {
        PolicyRegistry::new()
            .with(
                resources::TEST_CASE,
                FieldPolicy::allow([
                    "id",
                    "key",
                    "name",
                    "summary",
                    "status",
                    "priority",
                    "folder",
                    "labels",
                    "steps",
                    "created_at",
                    "updated_at",
                ]),
            )
            .with(resources::TEST_RUN, FieldPolicy::deny(["created_by_email"]))
            .with(resources::SUITE_EXECUTION, FieldPolicy::Passthrough)
    }

    /// Underlying resource client.
    pub fn core(&self) -> &ResourceClient {
        &self.core
    }

    /// List one page of a project's test cases.
    #[instrument(skip(self, params, cancel), fields(project_key = %params.project_key))]
    pub async fn list_test_cases(
        &self,
        params: ListTestCasesParams,
        cancel: &CancellationToken,
    ) -> ClientResult<ResponseEnvelope<Vec<Value>>> {
        debug!("Listing test cases for {}", params.project_key);

        let request = match params.cursor {
            Some(cursor) => self.core.resume(&cursor)?,
            None => RequestDescriptor::get(format!(
                "/v1/projects/{}/test-cases",
                segment(&params.project_key)?
            ))
            .with_query_opt("per_page", params.per_page),
        };
        self.core
            .fetch_collection(resources::TEST_CASE, &request, false, cancel)
            .await
    }

    /// Get a test case.
    #[instrument(skip(self, cancel), fields(test_case_id = %test_case_id))]
    pub async fn get_test_case(
        &self,
        test_case_id: &str,
        cancel: &CancellationToken,
    ) -> ClientResult<ResponseEnvelope<Value>> {
        debug!("Fetching test case {}", test_case_id);

        let request =
            RequestDescriptor::get(format!("/v1/test-cases/{}", segment(test_case_id)?));
        self.core
            .fetch_object(resources::TEST_CASE, &request, cancel)
            .await
    }

    /// Create a test run.
    #[instrument(skip(self, params, cancel), fields(project_key = %params.project_key, name = %params.name))]
    pub async fn create_test_run(
        &self,
        params: CreateTestRunParams,
        cancel: &CancellationToken,
    ) -> ClientResult<ResponseEnvelope<Value>> {
        debug!(
            cases = params.test_case_ids.len(),
            "Creating test run in {}", params.project_key
        );

        let request = RequestDescriptor::post(format!(
            "/v1/projects/{}/test-runs",
            segment(&params.project_key)?
        ))
        .with_json(json!({
            "name": params.name,
            "test_case_ids": params.test_case_ids,
            "environment": params.environment,
            "description": params.description,
        }));
        self.core.send(resources::TEST_RUN, &request, cancel).await
    }

    /// Execute a test suite and wait for its result.
    #[instrument(skip(self, params, cancel), fields(suite_id = %params.suite_id))]
    pub async fn execute_suite(
        &self,
        params: ExecuteSuiteParams,
        cancel: &CancellationToken,
    ) -> ClientResult<PollOutcome> {
        debug!("Executing suite {}", params.suite_id);

        let mut request = RequestDescriptor::post(format!(
            "/v1/suites/{}/executions",
            segment(&params.suite_id)?
        ));
        if let Some(environment) = params.environment {
            request = request.with_json(json!({ "environment": environment }));
        }
        self.core
            .run_job(resources::SUITE_EXECUTION, &request, cancel)
            .await
    }
}

/// Parameters for listing test cases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListTestCasesParams {
    /// Project key, e.g. `PROJ`.
    pub project_key: String,

    /// Page size.
    #[serde(default)]
    pub per_page: Option<u32>,

    /// Cursor from a previous call.
    #[serde(default)]
    pub cursor: Option<String>,
}

/// Parameters for creating a test run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTestRunParams {
    /// Project key.
    pub project_key: String,

    /// Run name.
    pub name: String,

    /// Test cases included in the run.
    #[serde(default)]
    pub test_case_ids: Vec<String>,

    /// Environment the run targets.
    #[serde(default)]
    pub environment: Option<String>,

    /// Description.
    #[serde(default)]
    pub description: Option<String>,
}

/// Parameters for executing a suite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteSuiteParams {
    /// Suite ID.
    pub suite_id: String,

    /// Environment to execute against.
    #[serde(default)]
    pub environment: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolhub_client::{Auth, PolicyKind};

    #[test]
    fn test_every_resource_has_a_policy() {
        let policies = TestManagementClient::policies();
        for resource in [
            resources::TEST_CASE,
            resources::TEST_RUN,
            resources::SUITE_EXECUTION,
        ] {
            assert!(policies.contains(resource), "missing policy for {}", resource);
        }
        assert_eq!(
            policies.get(resources::TEST_RUN).unwrap().kind(),
            PolicyKind::Deny
        );
    }

    #[test]
    fn test_client_creation() {
        let config = ClientConfig::new(
            "https://api.testmanagement.example.com",
            Auth::Header {
                name: "apikey".to_string(),
                value: "k".to_string(),
            },
        );
        assert!(TestManagementClient::new(config).is_ok());
    }
}
