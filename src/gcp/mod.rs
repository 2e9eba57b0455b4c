//! GCP API interaction module
//!
//! Authentication, HTTP transport and the client that ties them together.
//!
//! # Module Structure
//!
//! - [`auth`] - Application Default Credentials, static tokens, default project discovery
//! - [`client`] - Main GCP client for making API requests
//! - [`http`] - HTTP utilities for REST API calls
//!
//! # Example
//!
//! ```ignore
//! use gcrm::gcp::client::GcpClient;
//!
//! async fn example() -> anyhow::Result<()> {
//!     let client = GcpClient::new("my-project").await?;
//!     let project = client.get(&client.resourcemanager_url("v3", "projects/my-project")).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod http;
