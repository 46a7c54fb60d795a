//! Test management MCP tools
//!
//! Tools for test cases, test runs and suite executions.

use super::{parse_args, render};
use crate::clients::test_management::{
    CreateTestRunParams, ExecuteSuiteParams, ListTestCasesParams, TestManagementClient,
};
use crate::server::{McpServerResult, Tool, ToolContext};
use crate::types::{Product, ToolDefinition, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument};

fn definition(name: &str, description: &str, category: &str) -> ToolDefinition {
    ToolDefinition::new(format!("tests_{}", name), description)
        .with_product(Product::TestManagement)
        .with_category(category)
}

/// Tool to list test cases.
pub struct ListTestCasesTool {
    client: Arc<TestManagementClient>,
}

impl ListTestCasesTool {
    pub fn new(client: Arc<TestManagementClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for ListTestCasesTool {
    fn definition(&self) -> ToolDefinition {
        definition(
            "list_test_cases",
            "List a project's test cases, one page at a time",
            "test_cases",
        )
        .with_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "project_key": {"type": "string", "description": "Project key, e.g. PROJ"},
                "per_page": {"type": "integer", "description": "Page size"},
                "cursor": {
                    "type": "string",
                    "description": "next_cursor from a previous call"
                }
            },
            "required": ["project_key"]
        }))
    }

    #[instrument(skip(self, args, context), fields(tool = "list_test_cases"))]
    async fn execute(
        &self,
        args: serde_json::Value,
        context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let params: ListTestCasesParams = parse_args(args)?;

        let result = self.client.list_test_cases(params, &context.cancel).await;
        Ok(render("list test cases", result))
    }
}

/// Tool to get one test case.
pub struct GetTestCaseTool {
    client: Arc<TestManagementClient>,
}

impl GetTestCaseTool {
    pub fn new(client: Arc<TestManagementClient>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct GetTestCaseArgs {
    test_case_id: String,
}

#[async_trait]
impl Tool for GetTestCaseTool {
    fn definition(&self) -> ToolDefinition {
        definition("get_test_case", "Get a test case with its steps", "test_cases").with_schema(
            serde_json::json!({
                "type": "object",
                "properties": {
                    "test_case_id": {"type": "string", "description": "Test case ID"}
                },
                "required": ["test_case_id"]
            }),
        )
    }

    #[instrument(skip(self, args, context), fields(tool = "get_test_case"))]
    async fn execute(
        &self,
        args: serde_json::Value,
        context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let params: GetTestCaseArgs = parse_args(args)?;

        let result = self
            .client
            .get_test_case(&params.test_case_id, &context.cancel)
            .await;
        Ok(render("get test case", result))
    }
}

/// Tool to create a test run.
pub struct CreateTestRunTool {
    client: Arc<TestManagementClient>,
}

impl CreateTestRunTool {
    pub fn new(client: Arc<TestManagementClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for CreateTestRunTool {
    fn definition(&self) -> ToolDefinition {
        definition(
            "create_test_run",
            "Create a test run from a set of test cases",
            "test_runs",
        )
        .with_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "project_key": {"type": "string", "description": "Project key"},
                "name": {"type": "string", "description": "Run name"},
                "test_case_ids": {"type": "array", "items": {"type": "string"}},
                "environment": {"type": "string"},
                "description": {"type": "string"}
            },
            "required": ["project_key", "name"]
        }))
    }

    #[instrument(skip(self, args, context), fields(tool = "create_test_run"))]
    async fn execute(
        &self,
        args: serde_json::Value,
        context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let params: CreateTestRunParams = parse_args(args)?;
        debug!("Creating test run {}", params.name);

        let result = self.client.create_test_run(params, &context.cancel).await;
        Ok(render("create test run", result))
    }
}

/// Tool to execute a test suite and wait for the result.
pub struct ExecuteSuiteTool {
    client: Arc<TestManagementClient>,
}

impl ExecuteSuiteTool {
    pub fn new(client: Arc<TestManagementClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for ExecuteSuiteTool {
    fn definition(&self) -> ToolDefinition {
        definition(
            "execute_suite",
            "Execute a test suite and wait for its results",
            "executions",
        )
        .with_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "suite_id": {"type": "string", "description": "Suite ID"},
                "environment": {"type": "string", "description": "Environment to run against"}
            },
            "required": ["suite_id"]
        }))
    }

    #[instrument(skip(self, args, context), fields(tool = "execute_suite"))]
    async fn execute(
        &self,
        args: serde_json::Value,
        context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let params: ExecuteSuiteParams = parse_args(args)?;

        let result = self.client.execute_suite(params, &context.cancel).await;
        Ok(render("execute suite", result))
    }
}

/// Get all test management tools sharing one client.
pub fn test_management_tools(client: Arc<TestManagementClient>) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(ListTestCasesTool::new(client.clone())),
        Arc::new(GetTestCaseTool::new(client.clone())),
        Arc::new(CreateTestRunTool::new(client.clone())),
        Arc::new(ExecuteSuiteTool::new(client)),
    ]
}
