//! Resource Manager adapter
//!
//! Turns typed calls into Resource Manager requests and returns the
//! service's responses unchanged.

use super::name::ResourceName;
use super::org_policy;
use super::request::{execute_once, execute_request, ApiRequest};
use crate::gcp::client::GcpClient;
use anyhow::{anyhow, bail, Context, Result};
use serde_json::{json, Value};
use std::collections::HashSet;

/// API version serving resource metadata and IAM policies
const RESOURCE_API_VERSION: &str = "v3";
/// API version serving organization policies (not available in v3)
const ORG_POLICY_API_VERSION: &str = "v1";

/// Client for project, folder and organization resources
#[derive(Clone)]
pub struct ResourceManager {
    client: GcpClient,
}

impl ResourceManager {
    pub fn new(client: GcpClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &GcpClient {
        &self.client
    }

    /// `projects/{project}` for the client's default project
    pub fn default_project(&self) -> Result<ResourceName> {
        if self.client.project_id.is_empty() {
            bail!("No default project configured. Pass --project or set one with 'gcrm config set-project'");
        }
        Ok(ResourceName::project(self.client.project_id.clone()))
    }

    fn resource_url(&self, name: &ResourceName, action: Option<&str>) -> String {
        let path = match action {
            Some(action) => format!("{}:{}", name.url_path(), action),
            None => name.url_path(),
        };
        self.client.resourcemanager_url(RESOURCE_API_VERSION, &path)
    }

    fn org_policy_url(&self, name: &ResourceName, action: &str) -> String {
        let path = format!("{}:{}", name.url_path(), action);
        self.client.resourcemanager_url(ORG_POLICY_API_VERSION, &path)
    }

    /// First item of a flattened result list
    async fn first_result(&self, request: &ApiRequest) -> Result<Value> {
        execute_request(&self.client, request)
            .await?
            .into_iter()
            .next()
            .context("Resource Manager returned no results")
    }

    /// Fetch a project, folder or organization record
    pub async fn get_resource(&self, name: &str) -> Result<Value> {
        let name = ResourceName::parse(name)?;
        tracing::info!("get_resource: type={}, resource={}", name.kind(), name);

        let request = ApiRequest::get(self.resource_url(&name, None));
        self.first_result(&request).await
    }

    /// Walk `parent` links from `name` (or the default project) up to the root.
    /// Returns the records from child to root.
    pub async fn project_ancestry(&self, name: Option<&str>) -> Result<Vec<Value>> {
        let start = match name {
            Some(name) => ResourceName::parse(name)?,
            None => self.default_project()?,
        };
        tracing::info!("project_ancestry: resource={}", start);

        let mut ancestry = Vec::new();
        let mut seen = HashSet::new();
        let mut current = start;

        loop {
            if !seen.insert(current.clone()) {
                return Err(anyhow!("Ancestry cycle detected at {}", current));
            }

            let record = self.get_resource(&current.to_string()).await?;
            let parent = match record.get("parent") {
                None => None,
                Some(Value::String(parent)) => Some(ResourceName::parse(parent)?),
                Some(other) => bail!("Unexpected parent value on {}: {}", current, other),
            };
            ancestry.push(record);

            match parent {
                Some(parent) => current = parent,
                None => break,
            }
        }

        tracing::debug!("Ancestry of depth {} resolved", ancestry.len());
        Ok(ancestry)
    }

    /// Read the IAM policy attached to a resource
    pub async fn get_iam_policy(&self, name: &str) -> Result<Value> {
        let name = ResourceName::parse(name)?;
        tracing::info!("get_iam_policy: resource={}", name);

        // the `resource` parameter is carried in the path
        let request = ApiRequest::post(self.resource_url(&name, Some("getIamPolicy")), json!({}));
        self.first_result(&request).await
    }

    /// Read the effective-at-resource org policy for one constraint
    pub async fn get_org_policy(&self, name: &str, constraint: &str) -> Result<Value> {
        let name = ResourceName::parse(name)?;
        tracing::info!("get_org_policy: resource={}, constraint={}", name, constraint);

        let request = ApiRequest::post(
            self.org_policy_url(&name, "getOrgPolicy"),
            org_policy::get_body(constraint),
        );
        execute_once(&self.client, &request).await
    }

    /// List the org policies set on a resource (one page, raw response)
    pub async fn list_org_policy(&self, name: &str) -> Result<Value> {
        let name = ResourceName::parse(name)?;
        tracing::info!("list_org_policy: resource={}", name);

        let request = ApiRequest::post(self.org_policy_url(&name, "listOrgPolicies"), json!({}));
        execute_once(&self.client, &request).await
    }

    /// Every org policy set on a resource, across all pages
    pub async fn list_all_org_policies(&self, name: &str) -> Result<Vec<Value>> {
        let name = ResourceName::parse(name)?;
        tracing::info!("list_all_org_policies: resource={}", name);

        let request = ApiRequest::post(self.org_policy_url(&name, "listOrgPolicies"), json!({}));
        let pages = execute_request(&self.client, &request).await?;

        Ok(pages
            .into_iter()
            .filter_map(|mut page| match page.get_mut("policies").map(Value::take) {
                Some(Value::Array(policies)) => Some(policies),
                _ => None,
            })
            .flatten()
            .collect())
    }

    /// Replace an org policy. `etag` must match the stored policy's etag.
    pub async fn set_org_policy(&self, name: &str, policy: &Value, etag: &str) -> Result<Value> {
        let name = ResourceName::parse(name)?;
        let body = org_policy::set_body(policy, etag)?;
        let constraint = policy
            .get("constraint")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("-");
        tracing::info!("set_org_policy: resource={}, constraint={}", name, constraint);

        let request = ApiRequest::post(self.org_policy_url(&name, "setOrgPolicy"), body);
        execute_once(&self.client, &request).await
    }

    /// Clear an org policy so the resource inherits from its parent again
    pub async fn delete_org_policy(&self, name: &str, constraint: &str, etag: &str) -> Result<Value> {
        let name = ResourceName::parse(name)?;
        tracing::info!("delete_org_policy: resource={}, constraint={}", name, constraint);

        let request = ApiRequest::post(
            self.org_policy_url(&name, "clearOrgPolicy"),
            org_policy::clear_body(constraint, etag),
        );
        execute_once(&self.client, &request).await
    }
}
