//! Cloud Resource Manager
//!
//! Project, folder and organization metadata, IAM policies and
//! organization policies.
//!
//! # Architecture
//!
//! - [`name`] - Parses and validates `{type}/{id}` resource names
//! - [`request`] - Executes requests, flattening paginated responses
//! - [`org_policy`] - Builds org policy request bodies
//! - [`ResourceManager`] - The adapter exposing each operation
//!
//! # Example
//!
//! ```ignore
//! use gcrm::gcp::client::GcpClient;
//! use gcrm::resourcemanager::ResourceManager;
//!
//! async fn ancestry() -> anyhow::Result<Vec<serde_json::Value>> {
//!     let client = GcpClient::new("my-project").await?;
//!     ResourceManager::new(client).project_ancestry(None).await
//! }
//! ```

mod manager;
pub mod name;
pub mod org_policy;
pub mod request;

pub use manager::ResourceManager;
pub use name::{ResourceName, ResourceNameError, ResourceType};
pub use request::{execute_once, execute_request, ApiRequest, HttpMethod};
