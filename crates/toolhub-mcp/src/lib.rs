//! # Toolhub MCP
//!
//! This crate exposes three SaaS products to AI hosts as MCP (Model Context
//! Protocol) tools: error tracking, contract testing and test management.
//! Every tool is a thin wrapper over a product client, and every product
//! client is a thin wrapper over [`toolhub_client::ResourceClient`], which
//! handles authentication, pagination, rate limiting, field redaction and
//! async job polling.
//!
//! ## MCP Protocol
//!
//! Supported methods:
//! - `initialize`: Initialize the MCP session
//! - `tools/list`: List available tools
//! - `tools/call`: Execute a tool
//!
//! Any other method is answered with JSON-RPC error `-32601`.
//!
//! ## Available Tools
//!
//! ### Error Tracking
//! - `errors_list_organizations`, `errors_list_projects`, `errors_get_project`
//! - `errors_list_errors`, `errors_get_error`, `errors_update_error`
//! - `errors_list_error_events`: events without user, request or metadata
//! - `errors_list_releases`
//!
//! ### Contract Testing
//! - `contracts_can_i_deploy`, `contracts_provider_states`
//! - `contracts_generate_tests`, `contracts_review_tests`: wait for the job
//!
//! ### Test Management
//! - `tests_list_test_cases`, `tests_get_test_case`, `tests_create_test_run`
//! - `tests_execute_suite`: waits for the execution
//!
//! A product's tools are only registered when its endpoint and credentials
//! are configured; see [`ProductsConfig::from_env`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use toolhub_mcp::{McpRequest, McpServer, ProductsConfig};
//!
//! async fn serve(line: &str) -> Result<String, Box<dyn std::error::Error>> {
//!     let config = ProductsConfig::from_env()?;
//!     let server = McpServer::from_config(&config).await?;
//!
//!     let request: McpRequest = serde_json::from_str(line)?;
//!     let response = server.handle_request(request).await;
//!     Ok(serde_json::to_string(&response)?)
//! }
//! ```

pub mod clients;
pub mod server;
pub mod tools;
pub mod types;

// Re-export main types
pub use server::{FunctionTool, McpServer, McpServerError, McpServerResult, Tool, ToolContext};
pub use types::{
    ContentBlock, McpError, McpRequest, McpResponse, Product, RequestId, ServerCapabilities,
    ServerInfo, ToolCall, ToolCapabilities, ToolDefinition, ToolResult,
};

// Re-export tool collections
pub use tools::{all_tools, contract_testing_tools, error_tracking_tools, test_management_tools};

// Re-export product clients
pub use clients::{
    ConfigError, ContractTestingClient, ErrorTrackingClient, ProductsConfig, ServiceEndpoint,
    TestManagementClient,
};
