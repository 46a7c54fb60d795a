//! Product clients.
//!
//! One client per integrated product:
//! - Error tracking: organizations, projects, errors, events, releases
//! - Contract testing: deployment checks, provider states, AI test jobs
//! - Test management: test cases, test runs, suite executions
//!
//! Each client wraps a [`toolhub_client::ResourceClient`] and declares the
//! field policy of every resource type it returns. The clients share the
//! endpoint and timing configuration in [`ProductsConfig`].

pub mod config;
pub mod contract_testing;
pub mod error_tracking;
pub mod test_management;

pub use config::{ConfigError, ProductsConfig, ServiceEndpoint};
pub use contract_testing::ContractTestingClient;
pub use error_tracking::ErrorTrackingClient;
pub use test_management::TestManagementClient;
