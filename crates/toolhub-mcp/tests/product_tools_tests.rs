//! End-to-end tests for the product MCP tools.
//!
//! These tests drive the tools through `McpServer` against wiremock stand-ins
//! for the three product APIs and check both the requests the tools send and
//! the envelopes they return.

use serde_json::{json, Value};
use toolhub_client::{Auth, CancellationToken};
use toolhub_mcp::clients::config::TEST_MANAGEMENT_KEY_HEADER;
use toolhub_mcp::{
    McpRequest, McpServer, Product, ProductsConfig, ServiceEndpoint, ToolContext, ToolResult,
};
use wiremock::matchers::{body_json, body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Test fixture providing mock servers for all products.
struct TestFixture {
    /// Mock error tracking API.
    errors_server: MockServer,
    /// Mock contract broker.
    broker_server: MockServer,
    /// Mock test management API.
    tests_server: MockServer,
    /// Test product configuration.
    config: ProductsConfig,
}

impl TestFixture {
    /// Create a new test fixture with mock servers.
    async fn new() -> Self {
        let errors_server = MockServer::start().await;
        let broker_server = MockServer::start().await;
        let tests_server = MockServer::start().await;

        let config = ProductsConfig {
            error_tracking: ServiceEndpoint::new(
                errors_server.uri(),
                Auth::Token("test-token".to_string()),
            ),
            contract_testing: ServiceEndpoint::new(
                broker_server.uri(),
                Auth::Bearer("test-broker-token".to_string()),
            ),
            test_management: ServiceEndpoint::new(
                tests_server.uri(),
                Auth::Header {
                    name: TEST_MANAGEMENT_KEY_HEADER.to_string(),
                    value: "test-api-key".to_string(),
                },
            ),
            default_timeout_secs: 10,
            rate_limit_max_retries: 2,
            poll_interval_ms: 10,
            poll_timeout_secs: 1,
        };

        Self {
            errors_server,
            broker_server,
            tests_server,
            config,
        }
    }

    /// Build a server with every product's tools.
    async fn server(&self) -> McpServer {
        McpServer::from_config(&self.config).await.unwrap()
    }

    /// Call a tool with a fresh context.
    async fn call(&self, server: &McpServer, name: &str, args: Value) -> ToolResult {
        server
            .call_tool(name, args, &ToolContext::new())
            .await
            .unwrap()
    }
}

/// Parse the JSON rendered into a successful tool result.
fn json_of(result: &ToolResult) -> Value {
    assert!(
        !result.is_error,
        "unexpected tool error: {:?}",
        result.first_text()
    );
    serde_json::from_str(result.first_text().unwrap()).unwrap()
}

// =============================================================================
// Server surface
// =============================================================================

#[tokio::test]
async fn test_tools_list_over_json_rpc() {
    let fixture = TestFixture::new().await;
    let server = fixture.server().await;

    let response = server
        .handle_request(McpRequest::new("1", "tools/list"))
        .await;
    let tools = response.result.unwrap()["tools"].as_array().unwrap().clone();

    assert_eq!(tools.len(), 16);
    assert!(tools.iter().all(|t| t.get("inputSchema").is_some()));
    assert_eq!(
        server
            .list_tools_by_product(Product::ContractTesting)
            .await
            .len(),
        4
    );
}

#[tokio::test]
async fn test_unconfigured_product_has_no_tools() {
    let mut fixture = TestFixture::new().await;
    fixture.config.test_management.auth = Auth::None;
    let server = fixture.server().await;

    assert!(server
        .list_tools_by_product(Product::TestManagement)
        .await
        .is_empty());
    assert_eq!(server.list_tools().await.len(), 12);
}

#[tokio::test]
async fn test_unknown_tool_is_invalid_params() {
    let fixture = TestFixture::new().await;
    let server = fixture.server().await;

    let request = McpRequest::new("9", "tools/call")
        .with_params(json!({"name": "errors_delete_everything", "arguments": {}}));
    let response = server.handle_request(request).await;

    assert_eq!(response.error.unwrap().code, -32602);
}

// =============================================================================
// Error tracking
// =============================================================================

/// Organizations are walked across pages and reduced to the allowed fields.
#[tokio::test]
async fn test_list_organizations_walks_pages_and_redacts() {
    let fixture = TestFixture::new().await;
    let uri = fixture.errors_server.uri();

    Mock::given(method("GET"))
        .and(path("/user/organizations"))
        .and(query_param("page", "2"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Total-Count", "3")
                .set_body_json(json!([
                    {"id": "o3", "name": "Three", "slug": "three", "billing_email": "c@example.com"}
                ])),
        )
        .expect(1)
        .mount(&fixture.errors_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/user/organizations"))
        .and(query_param("per_page", "100"))
        .and(header("Authorization", "token test-token"))
        .and(header("X-Version", "2"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(
                    "Link",
                    format!(
                        "<{}/user/organizations?per_page=100&page=2>; rel=\"next\"",
                        uri
                    )
                    .as_str(),
                )
                .insert_header("X-Total-Count", "3")
                .set_body_json(json!([
                    {"id": "o1", "name": "One", "slug": "one", "billing_email": "a@example.com"},
                    {"id": "o2", "name": "Two", "slug": "two", "billing_email": "b@example.com"}
                ])),
        )
        .expect(1)
        .mount(&fixture.errors_server)
        .await;

    let server = fixture.server().await;
    let result = fixture
        .call(&server, "errors_list_organizations", json!({}))
        .await;
    let envelope = json_of(&result);

    let body = envelope["body"].as_array().unwrap();
    let ids: Vec<&str> = body.iter().map(|o| o["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["o1", "o2", "o3"]);
    assert!(body.iter().all(|o| o.get("billing_email").is_none()));
    assert_eq!(envelope["next_cursor"], Value::Null);
    assert_eq!(envelope["total_count"], 3);
    assert_eq!(envelope["redaction"]["policy"], "allow");
}

/// Filters are encoded into the query string and the next page is returned
/// as a cursor.
#[tokio::test]
async fn test_list_errors_encodes_filters_and_returns_cursor() {
    let fixture = TestFixture::new().await;
    let next = format!("{}/projects/p1/errors?offset=30", fixture.errors_server.uri());

    Mock::given(method("GET"))
        .and(path("/projects/p1/errors"))
        .and(query_param("filters[error.status][][type]", "eq"))
        .and(query_param("filters[error.status][][value]", "open"))
        .and(query_param("sort", "last_seen"))
        .and(query_param("direction", "desc"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Link", format!("<{}>; rel=\"next\"", next).as_str())
                .set_body_json(json!([
                    {"id": "e1", "error_class": "TypeError", "status": "open", "assigned_collaborator_email": "x@example.com"}
                ])),
        )
        .expect(1)
        .mount(&fixture.errors_server)
        .await;

    let server = fixture.server().await;
    let result = fixture
        .call(
            &server,
            "errors_list_errors",
            json!({
                "project_id": "p1",
                "filters": {"error.status": [{"type": "eq", "value": "open"}]},
                "sort": "last_seen",
                "direction": "desc"
            }),
        )
        .await;
    let envelope = json_of(&result);

    assert_eq!(envelope["next_cursor"], next.as_str());
    assert_eq!(envelope["body"][0]["error_class"], "TypeError");
    assert!(envelope["body"][0]
        .get("assigned_collaborator_email")
        .is_none());
}

/// Personal data is stripped from events; everything else is kept.
#[tokio::test]
async fn test_list_error_events_denies_personal_fields() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/projects/p1/errors/e1/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": "ev1",
                "received_at": "2024-01-01T00:00:00Z",
                "exceptions": [{"message": "boom"}],
                "user": {"email": "someone@example.com"},
                "request": {"clientIp": "10.0.0.1"},
                "metaData": {"session": "s"}
            }
        ])))
        .expect(1)
        .mount(&fixture.errors_server)
        .await;

    let server = fixture.server().await;
    let result = fixture
        .call(
            &server,
            "errors_list_error_events",
            json!({"project_id": "p1", "error_id": "e1"}),
        )
        .await;
    let envelope = json_of(&result);
    let event = &envelope["body"][0];

    assert_eq!(event["exceptions"][0]["message"], "boom");
    assert!(event.get("user").is_none());
    assert!(event.get("request").is_none());
    assert!(event.get("metaData").is_none());
    assert_eq!(envelope["redaction"]["policy"], "deny");
}

#[tokio::test]
async fn test_update_error_sends_operation() {
    let fixture = TestFixture::new().await;

    Mock::given(method("PATCH"))
        .and(path("/projects/p1/errors/e1"))
        .and(body_json(json!({"operation": "fix"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": "e1", "status": "fixed"})),
        )
        .expect(1)
        .mount(&fixture.errors_server)
        .await;

    let server = fixture.server().await;
    let result = fixture
        .call(
            &server,
            "errors_update_error",
            json!({"project_id": "p1", "error_id": "e1", "operation": "fix"}),
        )
        .await;

    assert_eq!(json_of(&result)["body"]["status"], "fixed");
}

/// Upstream failures become error results with the status and verbatim body.
#[tokio::test]
async fn test_get_error_not_found_is_reported_verbatim() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/projects/p1/errors/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("{\"errors\":[\"Not found\"]}"))
        .expect(1)
        .mount(&fixture.errors_server)
        .await;

    let server = fixture.server().await;
    let result = fixture
        .call(
            &server,
            "errors_get_error",
            json!({"project_id": "p1", "error_id": "missing"}),
        )
        .await;

    assert!(result.is_error);
    let text = result.first_text().unwrap();
    assert!(text.contains("404"));
    assert!(text.contains("{\"errors\":[\"Not found\"]}"));
}

#[tokio::test]
async fn test_get_project_over_json_rpc() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/projects/p1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": "p1", "name": "Web", "api_key": "secret"})),
        )
        .expect(1)
        .mount(&fixture.errors_server)
        .await;

    let server = fixture.server().await;
    let request = McpRequest::new("5", "tools/call").with_params(json!({
        "name": "errors_get_project",
        "arguments": {"project_id": "p1"}
    }));
    let response = server.handle_request(request).await;
    let result = response.result.unwrap();

    assert_eq!(result["isError"], false);
    let text = result["content"][0]["text"].as_str().unwrap();
    assert!(text.contains("\"Web\""));
    assert!(!text.contains("secret"));
}

/// Identifiers stay a single path segment, whatever they contain.
#[tokio::test]
async fn test_get_project_escapes_identifier() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/projects/..%2Fadmin"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such project"))
        .expect(1)
        .mount(&fixture.errors_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/admin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "admin"})))
        .expect(0)
        .mount(&fixture.errors_server)
        .await;

    let server = fixture.server().await;
    let result = fixture
        .call(&server, "errors_get_project", json!({"project_id": "../admin"}))
        .await;
    assert!(result.is_error);
    assert!(result.first_text().unwrap().contains("no such project"));

    let result = fixture
        .call(
            &server,
            "errors_get_error",
            json!({"project_id": "..", "error_id": "e1"}),
        )
        .await;
    assert!(result.is_error);
    assert!(result.first_text().unwrap().contains("invalid path segment"));
}

/// A cursor pointing at another host is refused before the token is sent.
#[tokio::test]
async fn test_list_errors_refuses_foreign_cursor() {
    let fixture = TestFixture::new().await;
    let foreign = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&foreign)
        .await;

    let server = fixture.server().await;
    let result = fixture
        .call(
            &server,
            "errors_list_errors",
            json!({
                "project_id": "p1",
                "cursor": format!("{}/collect?offset=30", foreign.uri())
            }),
        )
        .await;
    assert!(result.is_error);

    let result = fixture
        .call(
            &server,
            "tests_list_test_cases",
            json!({
                "project_key": "PROJ",
                "cursor": format!("{}/v1/projects/PROJ/test-cases?page=2", foreign.uri())
            }),
        )
        .await;
    assert!(result.is_error);

    assert!(foreign.received_requests().await.unwrap().is_empty());
}

/// A cursor returned by a previous call is accepted as-is.
#[tokio::test]
async fn test_list_errors_resumes_from_returned_cursor() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/projects/p1/errors"))
        .and(query_param("offset", "30"))
        .and(header("Authorization", "token test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "e31", "error_class": "RangeError"}
        ])))
        .expect(1)
        .mount(&fixture.errors_server)
        .await;

    let server = fixture.server().await;
    let result = fixture
        .call(
            &server,
            "errors_list_errors",
            json!({
                "project_id": "p1",
                "cursor": format!("{}/projects/p1/errors?offset=30", fixture.errors_server.uri())
            }),
        )
        .await;
    let envelope = json_of(&result);

    assert_eq!(envelope["body"][0]["id"], "e31");
    assert!(envelope["next_cursor"].is_null());
}

// =============================================================================
// Contract testing
// =============================================================================

#[tokio::test]
async fn test_can_i_deploy_passes_query() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/can-i-deploy"))
        .and(query_param("pacticipant", "web"))
        .and(query_param("version", "1.2.3"))
        .and(query_param("environment", "production"))
        .and(header("Authorization", "Bearer test-broker-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "summary": {"deployable": true, "reason": "All required verification results are published and successful"}
        })))
        .expect(1)
        .mount(&fixture.broker_server)
        .await;

    let server = fixture.server().await;
    let result = fixture
        .call(
            &server,
            "contracts_can_i_deploy",
            json!({"pacticipant": "web", "version": "1.2.3", "environment": "production"}),
        )
        .await;

    assert_eq!(json_of(&result)["body"]["summary"]["deployable"], true);
}

/// A generation job is submitted, polled while pending, then fetched once.
#[tokio::test]
async fn test_generate_tests_polls_until_ready() {
    let fixture = TestFixture::new().await;
    let uri = fixture.broker_server.uri();

    Mock::given(method("POST"))
        .and(path("/api/ai/generate"))
        .and(body_partial_json(json!({"language": "typescript"})))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({
            "status_url": format!("{}/api/ai/jobs/j1/status", uri),
            "result_url": format!("{}/api/ai/jobs/j1/result", uri)
        })))
        .expect(1)
        .mount(&fixture.broker_server)
        .await;

    Mock::given(method("HEAD"))
        .and(path("/api/ai/jobs/j1/status"))
        .respond_with(ResponseTemplate::new(202))
        .up_to_n_times(2)
        .mount(&fixture.broker_server)
        .await;

    Mock::given(method("HEAD"))
        .and(path("/api/ai/jobs/j1/status"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&fixture.broker_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/ai/jobs/j1/result"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "files": [{"filename": "api.pact.spec.ts", "body": "describe('api', () => {})"}]
        })))
        .expect(1)
        .mount(&fixture.broker_server)
        .await;

    let server = fixture.server().await;
    let result = fixture
        .call(
            &server,
            "contracts_generate_tests",
            json!({"language": "typescript", "openapi": {"openapi": "3.0.0"}}),
        )
        .await;
    let outcome = json_of(&result);

    assert_eq!(outcome["completed"], true);
    assert_eq!(
        outcome["result"]["body"]["files"][0]["filename"],
        "api.pact.spec.ts"
    );
}

// =============================================================================
// Test management
// =============================================================================

/// A throttled request is replayed and the caller only sees the success.
#[tokio::test]
async fn test_get_test_case_survives_throttling() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/v1/test-cases/TC-1"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("Retry-After", "0")
                .set_body_string("slow down"),
        )
        .up_to_n_times(1)
        .mount(&fixture.tests_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/test-cases/TC-1"))
        .and(header("apikey", "test-api-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "TC-1",
            "name": "Login works",
            "status": "approved",
            "owner_email": "qa@example.com"
        })))
        .expect(1)
        .mount(&fixture.tests_server)
        .await;

    let server = fixture.server().await;
    let result = fixture
        .call(&server, "tests_get_test_case", json!({"test_case_id": "TC-1"}))
        .await;
    let envelope = json_of(&result);

    assert_eq!(envelope["status"], 200);
    assert_eq!(envelope["body"]["name"], "Login works");
    assert!(envelope["body"].get("owner_email").is_none());
}

#[tokio::test]
async fn test_create_test_run_drops_creator_email() {
    let fixture = TestFixture::new().await;

    Mock::given(method("POST"))
        .and(path("/v1/projects/PROJ/test-runs"))
        .and(body_partial_json(json!({"name": "Nightly", "test_case_ids": ["TC-1", "TC-2"]})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "TR-9",
            "name": "Nightly",
            "created_by_email": "qa@example.com"
        })))
        .expect(1)
        .mount(&fixture.tests_server)
        .await;

    let server = fixture.server().await;
    let result = fixture
        .call(
            &server,
            "tests_create_test_run",
            json!({"project_key": "PROJ", "name": "Nightly", "test_case_ids": ["TC-1", "TC-2"]}),
        )
        .await;
    let envelope = json_of(&result);

    assert_eq!(envelope["status"], 201);
    assert_eq!(envelope["body"]["id"], "TR-9");
    assert!(envelope["body"].get("created_by_email").is_none());
}

/// A suite that never finishes times out without fetching a result.
#[tokio::test]
async fn test_execute_suite_times_out() {
    let fixture = TestFixture::new().await;
    let uri = fixture.tests_server.uri();

    Mock::given(method("POST"))
        .and(path("/v1/suites/S-1/executions"))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({
            "statusUrl": format!("{}/v1/executions/x1/status", uri),
            "resultUrl": format!("{}/v1/executions/x1", uri)
        })))
        .expect(1)
        .mount(&fixture.tests_server)
        .await;

    Mock::given(method("HEAD"))
        .and(path("/v1/executions/x1/status"))
        .respond_with(ResponseTemplate::new(202))
        .mount(&fixture.tests_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/executions/x1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"passed": 1})))
        .expect(0)
        .mount(&fixture.tests_server)
        .await;

    let server = fixture.server().await;
    let result = fixture
        .call(&server, "tests_execute_suite", json!({"suite_id": "S-1"}))
        .await;

    assert!(result.is_error);
    assert!(result.first_text().unwrap().contains("did not complete"));
}

/// A cancelled context stops the tool before any request is sent.
#[tokio::test]
async fn test_cancelled_context_sends_nothing() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/v1/projects/PROJ/test-cases"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&fixture.tests_server)
        .await;

    let server = fixture.server().await;
    let cancel = CancellationToken::new();
    cancel.cancel();
    let context = ToolContext::new().with_cancel(cancel);

    let result = server
        .call_tool(
            "tests_list_test_cases",
            json!({"project_key": "PROJ"}),
            &context,
        )
        .await
        .unwrap();

    assert!(result.is_error);
    assert!(result.first_text().unwrap().contains("cancelled"));
}
