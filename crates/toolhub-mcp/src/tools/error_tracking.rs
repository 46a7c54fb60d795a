//! Error tracking MCP tools
//!
//! Tools for browsing organizations, projects, errors, events and releases,
//! and for changing an error's workflow state.

use super::{parse_args, render};
use crate::clients::error_tracking::{
    ErrorTrackingClient, ListErrorsParams, ListEventsParams, ListProjectsParams,
    ListReleasesParams, UpdateErrorParams,
};
use crate::server::{McpServerResult, Tool, ToolContext};
use crate::types::{Product, ToolDefinition, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument};

fn definition(name: &str, description: &str, category: &str) -> ToolDefinition {
    ToolDefinition::new(format!("errors_{}", name), description)
        .with_product(Product::ErrorTracking)
        .with_category(category)
}

fn cursor_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "string",
        "description": "next_cursor from a previous call, to fetch the following page"
    })
}

/// Tool to list organizations.
pub struct ListOrganizationsTool {
    client: Arc<ErrorTrackingClient>,
}

impl ListOrganizationsTool {
    pub fn new(client: Arc<ErrorTrackingClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for ListOrganizationsTool {
    fn definition(&self) -> ToolDefinition {
        definition(
            "list_organizations",
            "List the organizations the configured token can access",
            "organizations",
        )
    }

    #[instrument(skip(self, _args, context), fields(tool = "list_organizations"))]
    async fn execute(
        &self,
        _args: serde_json::Value,
        context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let result = self.client.list_organizations(&context.cancel).await;
        Ok(render("list organizations", result))
    }
}

/// Tool to list projects of an organization.
pub struct ListProjectsTool {
    client: Arc<ErrorTrackingClient>,
}

impl ListProjectsTool {
    pub fn new(client: Arc<ErrorTrackingClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for ListProjectsTool {
    fn definition(&self) -> ToolDefinition {
        definition(
            "list_projects",
            "List the projects of an organization, optionally filtered by name",
            "projects",
        )
        .with_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "organization_id": {
                    "type": "string",
                    "description": "Organization ID"
                },
                "q": {
                    "type": "string",
                    "description": "Search term matched against project names"
                },
                "per_page": {
                    "type": "integer",
                    "description": "Page size",
                    "default": 100
                },
                "cursor": cursor_schema()
            },
            "required": ["organization_id"]
        }))
    }

    #[instrument(skip(self, args, context), fields(tool = "list_projects"))]
    async fn execute(
        &self,
        args: serde_json::Value,
        context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let params: ListProjectsParams = parse_args(args)?;
        debug!("Listing projects for {}", params.organization_id);

        let result = self.client.list_projects(params, &context.cancel).await;
        Ok(render("list projects", result))
    }
}

/// Tool to get one project.
pub struct GetProjectTool {
    client: Arc<ErrorTrackingClient>,
}

impl GetProjectTool {
    pub fn new(client: Arc<ErrorTrackingClient>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct GetProjectArgs {
    project_id: String,
}

#[async_trait]
impl Tool for GetProjectTool {
    fn definition(&self) -> ToolDefinition {
        definition("get_project", "Get the details of a project", "projects").with_schema(
            serde_json::json!({
                "type": "object",
                "properties": {
                    "project_id": {
                        "type": "string",
                        "description": "Project ID"
                    }
                },
                "required": ["project_id"]
            }),
        )
    }

    #[instrument(skip(self, args, context), fields(tool = "get_project"))]
    async fn execute(
        &self,
        args: serde_json::Value,
        context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let params: GetProjectArgs = parse_args(args)?;

        let result = self
            .client
            .get_project(&params.project_id, &context.cancel)
            .await;
        Ok(render("get project", result))
    }
}

/// Tool to list a project's errors.
///
/// Returns one page; pass `next_cursor` back as `cursor` for the next one.
pub struct ListErrorsTool {
    client: Arc<ErrorTrackingClient>,
}

impl ListErrorsTool {
    pub fn new(client: Arc<ErrorTrackingClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for ListErrorsTool {
    fn definition(&self) -> ToolDefinition {
        definition(
            "list_errors",
            "List a project's errors, filtered and sorted, one page at a time",
            "errors",
        )
        .with_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "project_id": {
                    "type": "string",
                    "description": "Project ID"
                },
                "filters": {
                    "type": "object",
                    "description": "Filters keyed by field, e.g. {\"error.status\": [{\"type\": \"eq\", \"value\": \"open\"}]}",
                    "additionalProperties": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "type": {"type": "string", "enum": ["eq", "ne", "empty"]},
                                "value": {}
                            },
                            "required": ["type", "value"]
                        }
                    }
                },
                "sort": {
                    "type": "string",
                    "enum": ["last_seen", "first_seen", "users", "events", "unsorted"]
                },
                "direction": {
                    "type": "string",
                    "enum": ["asc", "desc"]
                },
                "per_page": {
                    "type": "integer",
                    "description": "Page size"
                },
                "cursor": cursor_schema()
            },
            "required": ["project_id"]
        }))
    }

    #[instrument(skip(self, args, context), fields(tool = "list_errors"))]
    async fn execute(
        &self,
        args: serde_json::Value,
        context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let params: ListErrorsParams = parse_args(args)?;
        debug!("Listing errors for {}", params.project_id);

        let result = self.client.list_errors(params, &context.cancel).await;
        Ok(render("list errors", result))
    }
}

/// Tool to get one error.
pub struct GetErrorTool {
    client: Arc<ErrorTrackingClient>,
}

impl GetErrorTool {
    pub fn new(client: Arc<ErrorTrackingClient>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct GetErrorArgs {
    project_id: String,
    error_id: String,
}

#[async_trait]
impl Tool for GetErrorTool {
    fn definition(&self) -> ToolDefinition {
        definition("get_error", "Get the details of an error", "errors").with_schema(
            serde_json::json!({
                "type": "object",
                "properties": {
                    "project_id": {"type": "string", "description": "Project ID"},
                    "error_id": {"type": "string", "description": "Error ID"}
                },
                "required": ["project_id", "error_id"]
            }),
        )
    }

    #[instrument(skip(self, args, context), fields(tool = "get_error"))]
    async fn execute(
        &self,
        args: serde_json::Value,
        context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let params: GetErrorArgs = parse_args(args)?;

        let result = self
            .client
            .get_error(&params.project_id, &params.error_id, &context.cancel)
            .await;
        Ok(render("get error", result))
    }
}

/// Tool to list an error's events.
///
/// User, request and metadata fields are removed from every event.
pub struct ListErrorEventsTool {
    client: Arc<ErrorTrackingClient>,
}

impl ListErrorEventsTool {
    pub fn new(client: Arc<ErrorTrackingClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for ListErrorEventsTool {
    fn definition(&self) -> ToolDefinition {
        definition(
            "list_error_events",
            "List the occurrences of an error, one page at a time",
            "errors",
        )
        .with_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "project_id": {"type": "string", "description": "Project ID"},
                "error_id": {"type": "string", "description": "Error ID"},
                "per_page": {"type": "integer", "description": "Page size"},
                "cursor": cursor_schema()
            },
            "required": ["project_id", "error_id"]
        }))
    }

    #[instrument(skip(self, args, context), fields(tool = "list_error_events"))]
    async fn execute(
        &self,
        args: serde_json::Value,
        context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let params: ListEventsParams = parse_args(args)?;

        let result = self.client.list_error_events(params, &context.cancel).await;
        Ok(render("list error events", result))
    }
}

/// Tool to change an error's workflow state.
pub struct UpdateErrorTool {
    client: Arc<ErrorTrackingClient>,
}

impl UpdateErrorTool {
    pub fn new(client: Arc<ErrorTrackingClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for UpdateErrorTool {
    fn definition(&self) -> ToolDefinition {
        definition(
            "update_error",
            "Open, fix, ignore, snooze, discard or undiscard an error",
            "errors",
        )
        .with_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "project_id": {"type": "string", "description": "Project ID"},
                "error_id": {"type": "string", "description": "Error ID"},
                "operation": {
                    "type": "string",
                    "enum": ["open", "fix", "ignore", "snooze", "discard", "undiscard"]
                }
            },
            "required": ["project_id", "error_id", "operation"]
        }))
    }

    #[instrument(skip(self, args, context), fields(tool = "update_error"))]
    async fn execute(
        &self,
        args: serde_json::Value,
        context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let params: UpdateErrorParams = parse_args(args)?;
        debug!(operation = ?params.operation, "Updating error {}", params.error_id);

        let result = self.client.update_error(params, &context.cancel).await;
        Ok(render("update error", result))
    }
}

/// Tool to list a project's releases.
pub struct ListReleasesTool {
    client: Arc<ErrorTrackingClient>,
}

impl ListReleasesTool {
    pub fn new(client: Arc<ErrorTrackingClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for ListReleasesTool {
    fn definition(&self) -> ToolDefinition {
        definition(
            "list_releases",
            "List a project's releases, optionally for one release stage",
            "releases",
        )
        .with_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "project_id": {"type": "string", "description": "Project ID"},
                "release_stage": {"type": "string", "description": "Release stage, e.g. production"},
                "per_page": {"type": "integer", "description": "Page size"},
                "cursor": cursor_schema()
            },
            "required": ["project_id"]
        }))
    }

    #[instrument(skip(self, args, context), fields(tool = "list_releases"))]
    async fn execute(
        &self,
        args: serde_json::Value,
        context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let params: ListReleasesParams = parse_args(args)?;

        let result = self.client.list_releases(params, &context.cancel).await;
        Ok(render("list releases", result))
    }
}

/// Get all error tracking tools sharing one client.
pub fn error_tracking_tools(client: Arc<ErrorTrackingClient>) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(ListOrganizationsTool::new(client.clone())),
        Arc::new(ListProjectsTool::new(client.clone())),
        Arc::new(GetProjectTool::new(client.clone())),
        Arc::new(ListErrorsTool::new(client.clone())),
        Arc::new(GetErrorTool::new(client.clone())),
        Arc::new(ListErrorEventsTool::new(client.clone())),
        Arc::new(UpdateErrorTool::new(client.clone())),
        Arc::new(ListReleasesTool::new(client)),
    ]
}
