//! Error tracking client.
//!
//! Client for the error tracking data-access API: organizations, projects,
//! errors, events and releases. Collections are paged with `Link` headers and
//! report their size in `X-Total-Count`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use toolhub_client::{
    encode_filters, segment, CancellationToken, ClientConfig, ClientResult, FieldPolicy,
    Filters, PolicyRegistry, RequestDescriptor, ResourceClient, ResponseEnvelope,
};
use tracing::{debug, instrument};

/// API version header value required by the data-access API.
const API_VERSION: &str = "2";

/// Resource types this client requests.
pub mod resources {
    pub const ORGANIZATION: &str = "organization";
    pub const PROJECT: &str = "project";
    pub const ERROR: &str = "error";
    pub const EVENT: &str = "event";
    pub const RELEASE: &str = "release";
}

/// Error tracking API client.
#[derive(Clone)]
pub struct ErrorTrackingClient {
    core: ResourceClient,
}

impl ErrorTrackingClient {
    /// Create a new error tracking client.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let config = config.with_header("X-Version", API_VERSION);
        Ok(Self {
            core: ResourceClient::new(config, Self::policies())?,
        })
    }

    /// Field policies for every resource type this client returns.
    pub fn policies() -> PolicyRegistry {
        PolicyRegistry::new()
            .with(
                resources::ORGANIZATION,
                FieldPolicy::allow(["id", "name", "slug", "created_at", "updated_at"]),
            )
            .with(
                resources::PROJECT,
                FieldPolicy::allow([
                    "id",
                    "slug",
                    "name",
                    "type",
                    "url",
                    "html_url",
                    "release_stages",
                    "language",
                    "created_at",
                    "updated_at",
                    "errors_url",
                    "events_url",
                    "open_error_count",
                    "collaborators_count",
                ]),
            )
            .with(
                resources::ERROR,
                FieldPolicy::allow([
                    "id",
                    "error_class",
                    "message",
                    "context",
                    "severity",
                    "status",
                    "first_seen",
                    "last_seen",
                    "events",
                    "users",
                    "release_stages",
                    "grouping_reason",
                    "url",
                    "project_id",
                ]),
            )
            .with(resources::EVENT, FieldPolicy::deny(["user", "request", "metaData"]))
            .with(resources::RELEASE, FieldPolicy::Passthrough)
    }

    /// Underlying resource client.
    pub fn core(&self) -> &ResourceClient {
        &self.core
    }

    /// List every organization the token can access.
    #[instrument(skip(self, cancel))]
    pub async fn list_organizations(
        &self,
        cancel: &CancellationToken,
    ) -> ClientResult<ResponseEnvelope<Vec<Value>>> {
        debug!("Listing organizations");

        let request = RequestDescriptor::get("/user/organizations").with_query("per_page", 100);
        self.core
            .fetch_collection(resources::ORGANIZATION, &request, true, cancel)
            .await
    }

    /// List projects of an organization.
    ///
    /// Walks every page unless resuming from a cursor, in which case only that
    /// page is returned.
    #[instrument(skip(self, params, cancel), fields(organization_id = %params.organization_id))]
    pub async fn list_projects(
        &self,
        params: ListProjectsParams,
        cancel: &CancellationToken,
    ) -> ClientResult<ResponseEnvelope<Vec<Value>>> {
        debug!("Listing projects for organization {}", params.organization_id);

        let fetch_all = params.cursor.is_none();
        let request = match params.cursor {
            Some(cursor) => self.core.resume(&cursor)?,
            None => RequestDescriptor::get(format!(
                "/organizations/{}/projects",
                segment(&params.organization_id)?
            ))
            .with_query_opt("q", params.q)
            .with_query("per_page", params.per_page.unwrap_or(100)),
        };
        self.core
            .fetch_collection(resources::PROJECT, &request, fetch_all, cancel)
            .await
    }

    /// Get project details.
    #[instrument(skip(self, cancel), fields(project_id = %project_id))]
    pub async fn get_project(
        &self,
        project_id: &str,
        cancel: &CancellationToken,
    ) -> ClientResult<ResponseEnvelope<Value>> {
        debug!("Fetching project {}", project_id);

        let request = RequestDescriptor::get(format!("/projects/{}", segment(project_id)?));
        self.core.fetch_object(resources::PROJECT, &request, cancel).await
    }

    /// List one page of a project's errors.
    #[instrument(skip(self, params, cancel), fields(project_id = %params.project_id))]
    pub async fn list_errors(
        &self,
        params: ListErrorsParams,
        cancel: &CancellationToken,
    ) -> ClientResult<ResponseEnvelope<Vec<Value>>> {
        debug!(
            filters = params.filters.len(),
            "Listing errors for project {}", params.project_id
        );

        let request = match params.cursor {
            Some(cursor) => self.core.resume(&cursor)?,
            None => RequestDescriptor::get(format!(
                "/projects/{}/errors",
                segment(&params.project_id)?
            ))
            .with_queries(encode_filters(&params.filters))
            .with_query_opt("sort", params.sort)
            .with_query_opt("direction", params.direction)
            .with_query_opt("per_page", params.per_page),
        };
        self.core
            .fetch_collection(resources::ERROR, &request, false, cancel)
            .await
    }

    /// Get error details.
    #[instrument(skip(self, cancel), fields(project_id = %project_id, error_id = %error_id))]
    pub async fn get_error(
        &self,
        project_id: &str,
        error_id: &str,
        cancel: &CancellationToken,
    ) -> ClientResult<ResponseEnvelope<Value>> {
        debug!("Fetching error {}", error_id);

        let request = RequestDescriptor::get(format!(
            "/projects/{}/errors/{}",
            segment(project_id)?,
            segment(error_id)?
        ));
        self.core.fetch_object(resources::ERROR, &request, cancel).await
    }

    /// List one page of an error's events.
    #[instrument(skip(self, params, cancel), fields(error_id = %params.error_id))]
    pub async fn list_error_events(
        &self,
        params: ListEventsParams,
        cancel: &CancellationToken,
    ) -> ClientResult<ResponseEnvelope<Vec<Value>>> {
        debug!("Listing events for error {}", params.error_id);

        let request = match params.cursor {
            Some(cursor) => self.core.resume(&cursor)?,
            None => RequestDescriptor::get(format!(
                "/projects/{}/errors/{}/events",
                segment(&params.project_id)?,
                segment(&params.error_id)?
            ))
            .with_query_opt("per_page", params.per_page),
        };
        self.core
            .fetch_collection(resources::EVENT, &request, false, cancel)
            .await
    }

    /// Change an error's workflow state.
    #[instrument(skip(self, params, cancel), fields(error_id = %params.error_id, operation = ?params.operation))]
    pub async fn update_error(
        &self,
        params: UpdateErrorParams,
        cancel: &CancellationToken,
    ) -> ClientResult<ResponseEnvelope<Value>> {
        debug!("Updating error {}", params.error_id);

        let request = RequestDescriptor::patch(format!(
            "/projects/{}/errors/{}",
            segment(&params.project_id)?,
            segment(&params.error_id)?
        ))
        .with_json(json!({ "operation": params.operation }));
        self.core.send(resources::ERROR, &request, cancel).await
    }

    /// List one page of a project's releases.
    #[instrument(skip(self, params, cancel), fields(project_id = %params.project_id))]
    pub async fn list_releases(
        &self,
        params: ListReleasesParams,
        cancel: &CancellationToken,
    ) -> ClientResult<ResponseEnvelope<Vec<Value>>> {
        debug!("Listing releases for project {}", params.project_id);

        let request = match params.cursor {
            Some(cursor) => self.core.resume(&cursor)?,
            None => RequestDescriptor::get(format!(
                "/projects/{}/releases",
                segment(&params.project_id)?
            ))
            .with_query_opt("release_stage", params.release_stage)
            .with_query_opt("per_page", params.per_page),
        };
        self.core
            .fetch_collection(resources::RELEASE, &request, false, cancel)
            .await
    }
}

/// Parameters for listing projects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListProjectsParams {
    /// Organization ID.
    pub organization_id: String,

    /// Search term matched against project names.
    #[serde(default)]
    pub q: Option<String>,

    /// Page size.
    #[serde(default)]
    pub per_page: Option<u32>,

    /// Cursor from a previous call.
    #[serde(default)]
    pub cursor: Option<String>,
}

/// Parameters for listing errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListErrorsParams {
    /// Project ID.
    pub project_id: String,

    /// Structured filters, e.g. `{"error.status": [{"type": "eq", "value": "open"}]}`.
    #[serde(default)]
    pub filters: Filters,

    /// Sort field (`last_seen`, `first_seen`, `users`, `events`, `unsorted`).
    #[serde(default)]
    pub sort: Option<String>,

    /// Sort direction (`asc` or `desc`).
    #[serde(default)]
    pub direction: Option<String>,

    /// Page size.
    #[serde(default)]
    pub per_page: Option<u32>,

    /// Cursor from a previous call.
    #[serde(default)]
    pub cursor: Option<String>,
}

/// Parameters for listing an error's events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListEventsParams {
    /// Project ID.
    pub project_id: String,

    /// Error ID.
    pub error_id: String,

    /// Page size.
    #[serde(default)]
    pub per_page: Option<u32>,

    /// Cursor from a previous call.
    #[serde(default)]
    pub cursor: Option<String>,
}

/// Workflow operation applied to an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorOperation {
    Open,
    Fix,
    Ignore,
    Snooze,
    Discard,
    Undiscard,
}

/// Parameters for updating an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateErrorParams {
    /// Project ID.
    pub project_id: String,

    /// Error ID.
    pub error_id: String,

    /// Operation to apply.
    pub operation: ErrorOperation,
}

/// Parameters for listing releases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListReleasesParams {
    /// Project ID.
    pub project_id: String,

    /// Release stage, e.g. `production`.
    #[serde(default)]
    pub release_stage: Option<String>,

    /// Page size.
    #[serde(default)]
    pub per_page: Option<u32>,

    /// Cursor from a previous call.
    #[serde(default)]
    pub cursor: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolhub_client::Auth;

    #[test]
    fn test_every_resource_has_a_policy() {
        let policies = ErrorTrackingClient::policies();
        for resource in [
            resources::ORGANIZATION,
            resources::PROJECT,
            resources::ERROR,
            resources::EVENT,
            resources::RELEASE,
        ] {
            assert!(policies.contains(resource), "missing policy for {}", resource);
        }
    }

    #[test]
    fn test_client_creation_adds_version_header() {
        let config = ClientConfig::new("https://api.example.com", Auth::Token("t".to_string()));
        let client = ErrorTrackingClient::new(config).unwrap();
        assert!(client
            .core()
            .config()
            .default_headers()
            .contains(&("X-Version".to_string(), "2".to_string())));
    }

    #[test]
    fn test_operation_serialization() {
        assert_eq!(serde_json::to_value(ErrorOperation::Fix).unwrap(), "fix");
        let params: UpdateErrorParams = serde_json::from_value(json!({
            "project_id": "p1",
            "error_id": "e1",
            "operation": "snooze"
        }))
        .unwrap();
        assert_eq!(params.operation, ErrorOperation::Snooze);
    }

    #[test]
    fn test_list_errors_params_defaults() {
        let params: ListErrorsParams =
            serde_json::from_value(json!({"project_id": "p1"})).unwrap();
        assert!(params.filters.is_empty());
        assert!(params.cursor.is_none());
    }
}
