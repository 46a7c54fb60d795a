//! Contract testing MCP tools
//!
//! Tools for deployment checks, provider states, and AI test generation and
//! review. Generation and review wait for the server-side job to finish.

use super::{parse_args, render};
use crate::clients::contract_testing::{
    CanIDeployParams, ContractTestingClient, GenerateTestsParams, ReviewTestsParams,
};
use crate::server::{McpServerResult, Tool, ToolContext};
use crate::types::{Product, ToolDefinition, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument};

fn definition(name: &str, description: &str, category: &str) -> ToolDefinition {
    ToolDefinition::new(format!("contracts_{}", name), description)
        .with_product(Product::ContractTesting)
        .with_category(category)
}

fn source_file_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "filename": {"type": "string"},
            "body": {"type": "string"}
        },
        "required": ["filename", "body"]
    })
}

/// Tool to check whether a version can be deployed.
pub struct CanIDeployTool {
    client: Arc<ContractTestingClient>,
}

impl CanIDeployTool {
    pub fn new(client: Arc<ContractTestingClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for CanIDeployTool {
    fn definition(&self) -> ToolDefinition {
        definition(
            "can_i_deploy",
            "Check whether a participant version is safe to deploy to an environment",
            "deployment",
        )
        .with_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "pacticipant": {"type": "string", "description": "Consumer or provider name"},
                "version": {"type": "string", "description": "Participant version"},
                "environment": {"type": "string", "description": "Target environment"}
            },
            "required": ["pacticipant", "version", "environment"]
        }))
    }

    #[instrument(skip(self, args, context), fields(tool = "can_i_deploy"))]
    async fn execute(
        &self,
        args: serde_json::Value,
        context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let params: CanIDeployParams = parse_args(args)?;

        let result = self.client.can_i_deploy(params, &context.cancel).await;
        Ok(render("check deployment", result))
    }
}

/// Tool to list a provider's expected states.
pub struct ProviderStatesTool {
    client: Arc<ContractTestingClient>,
}

impl ProviderStatesTool {
    pub fn new(client: Arc<ContractTestingClient>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct ProviderStatesArgs {
    provider: String,
}

#[async_trait]
impl Tool for ProviderStatesTool {
    fn definition(&self) -> ToolDefinition {
        definition(
            "provider_states",
            "List the provider states the consumers of a provider expect",
            "pacts",
        )
        .with_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "provider": {"type": "string", "description": "Provider name"}
            },
            "required": ["provider"]
        }))
    }

    #[instrument(skip(self, args, context), fields(tool = "provider_states"))]
    async fn execute(
        &self,
        args: serde_json::Value,
        context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let params: ProviderStatesArgs = parse_args(args)?;

        let result = self
            .client
            .list_provider_states(&params.provider, &context.cancel)
            .await;
        Ok(render("list provider states", result))
    }
}

/// Tool to generate contract tests.
pub struct GenerateTestsTool {
    client: Arc<ContractTestingClient>,
}

impl GenerateTestsTool {
    pub fn new(client: Arc<ContractTestingClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for GenerateTestsTool {
    fn definition(&self) -> ToolDefinition {
        definition(
            "generate_tests",
            "Generate contract tests from an OpenAPI document, a recorded interaction or client code",
            "ai",
        )
        .with_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "language": {"type": "string", "description": "Target language, e.g. typescript"},
                "openapi": {"type": "object", "description": "OpenAPI document"},
                "request_response": {"type": "object", "description": "Recorded request and response"},
                "code": {"type": "array", "items": source_file_schema()},
                "additional_instructions": {"type": "string"}
            },
            "required": []
        }))
    }

    #[instrument(skip(self, args, context), fields(tool = "generate_tests"))]
    async fn execute(
        &self,
        args: serde_json::Value,
        context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let params: GenerateTestsParams = parse_args(args)?;
        debug!(files = params.code.len(), "Generating contract tests");

        let result = self.client.generate_tests(params, &context.cancel).await;
        Ok(render("generate tests", result))
    }
}

/// Tool to review contract tests.
pub struct ReviewTestsTool {
    client: Arc<ContractTestingClient>,
}

impl ReviewTestsTool {
    pub fn new(client: Arc<ContractTestingClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for ReviewTestsTool {
    fn definition(&self) -> ToolDefinition {
        definition(
            "review_tests",
            "Review existing contract tests and suggest improvements",
            "ai",
        )
        .with_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "pact_tests": source_file_schema(),
                "code": {"type": "array", "items": source_file_schema()},
                "user_instructions": {"type": "string"}
            },
            "required": ["pact_tests"]
        }))
    }

    #[instrument(skip(self, args, context), fields(tool = "review_tests"))]
    async fn execute(
        &self,
        args: serde_json::Value,
        context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let params: ReviewTestsParams = parse_args(args)?;
        debug!("Reviewing {}", params.pact_tests.filename);

        let result = self.client.review_tests(params, &context.cancel).await;
        Ok(render("review tests", result))
    }
}

/// Get all contract testing tools sharing one client.
pub fn contract_testing_tools(client: Arc<ContractTestingClient>) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(CanIDeployTool::new(client.clone())),
        Arc::new(ProviderStatesTool::new(client.clone())),
        Arc::new(GenerateTestsTool::new(client.clone())),
        Arc::new(ReviewTestsTool::new(client)),
    ]
}
