//! Product MCP tools
//!
//! This module provides one tool per product operation. Each product's tools
//! share a single client, built from [`ProductsConfig`].

pub mod contract_testing;
pub mod error_tracking;
pub mod test_management;

pub use contract_testing::*;
pub use error_tracking::*;
pub use test_management::*;

use crate::clients::{
    ContractTestingClient, ErrorTrackingClient, ProductsConfig, TestManagementClient,
};
use crate::server::{McpServerError, McpServerResult, Tool};
use crate::types::ToolResult;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use toolhub_client::ClientResult;
use tracing::{debug, error};

/// Get the tools of every configured product.
///
/// A product is configured when it has both a base URL and credentials.
/// Products without credentials contribute no tools.
///
/// # Example
///
/// ```rust,no_run
/// use toolhub_mcp::clients::ProductsConfig;
/// use toolhub_mcp::tools::all_tools;
///
/// let config = ProductsConfig::from_env().expect("configuration");
/// let tools = all_tools(&config).expect("clients");
/// println!("Available tools: {}", tools.len());
/// ```
pub fn all_tools(config: &ProductsConfig) -> ClientResult<Vec<Arc<dyn Tool>>> {
    let mut tools = Vec::new();

    match config.client_config(&config.error_tracking) {
        Some(client_config) => {
            let client = Arc::new(ErrorTrackingClient::new(client_config)?);
            tools.extend(error_tracking_tools(client));
        }
        None => debug!("Error tracking not configured, skipping its tools"),
    }

    match config.client_config(&config.contract_testing) {
        Some(client_config) => {
            let client = Arc::new(ContractTestingClient::new(client_config)?);
            tools.extend(contract_testing_tools(client));
        }
        None => debug!("Contract testing not configured, skipping its tools"),
    }

    match config.client_config(&config.test_management) {
        Some(client_config) => {
            let client = Arc::new(TestManagementClient::new(client_config)?);
            tools.extend(test_management_tools(client));
        }
        None => debug!("Test management not configured, skipping its tools"),
    }

    Ok(tools)
}

/// Decode tool arguments into an operation's parameters.
pub(crate) fn parse_args<T: DeserializeOwned>(args: serde_json::Value) -> McpServerResult<T> {
    serde_json::from_value(args).map_err(|e| McpServerError::InvalidParams(e.to_string()))
}

/// Render a client result: the serialized value, or an error result carrying
/// the status and upstream body.
pub(crate) fn render<T: Serialize>(action: &str, result: ClientResult<T>) -> ToolResult {
    match result {
        Ok(value) => match serde_json::to_value(value) {
            Ok(value) => ToolResult::json(value),
            Err(e) => ToolResult::error(format!("Failed to {}: {}", action, e)),
        },
        Err(e) => {
            error!(status = ?e.status(), "Failed to {}: {}", action, e);
            ToolResult::error(format!("Failed to {}: {}", action, e))
        }
    }
}
