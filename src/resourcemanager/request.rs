//! Request execution
//!
//! Every adapter operation describes its call as an [`ApiRequest`] and hands
//! it to [`execute_request`] (pages flattened) or [`execute_once`] (raw response).

use crate::gcp::client::GcpClient;
use anyhow::{bail, Result};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// HTTP verb of a Resource Manager call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// A fully-built Resource Manager call
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub url: String,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(url: String) -> Self {
        Self {
            method: HttpMethod::Get,
            url,
            body: None,
        }
    }

    pub fn post(url: String, body: Value) -> Self {
        Self {
            method: HttpMethod::Post,
            url,
            body: Some(body),
        }
    }

    /// Same request, asking for the page after `page_token`
    fn with_page_token(&self, page_token: &str) -> Self {
        let mut next = self.clone();
        match self.method {
            HttpMethod::Get => {
                let separator = if self.url.contains('?') { '&' } else { '?' };
                next.url = format!(
                    "{}{}pageToken={}",
                    self.url,
                    separator,
                    urlencoding::encode(page_token)
                );
            },
            HttpMethod::Post => {
                let mut body = match next.body.take() {
                    Some(Value::Object(map)) => map,
                    _ => Map::new(),
                };
                body.insert("pageToken".to_string(), Value::String(page_token.to_string()));
                next.body = Some(Value::Object(body));
            },
        }
        next
    }
}

/// Send a single request and return the raw response
pub async fn execute_once(client: &GcpClient, request: &ApiRequest) -> Result<Value> {
    match request.method {
        HttpMethod::Get => client.get(&request.url).await,
        HttpMethod::Post => client.post(&request.url, request.body.as_ref()).await,
    }
}

/// Send a request, following `nextPageToken` until the last page.
/// Returns one response per page, in order. A page token seen twice is an error.
pub async fn execute_request(client: &GcpClient, request: &ApiRequest) -> Result<Vec<Value>> {
    let mut pages = Vec::new();
    let mut seen_tokens = HashSet::new();
    let mut current = request.clone();

    loop {
        let response = execute_once(client, &current).await?;

        let next_token = response
            .get("nextPageToken")
            .and_then(|v| v.as_str())
            .filter(|token| !token.is_empty())
            .map(|s| s.to_string());
        pages.push(response);

        let Some(token) = next_token else {
            break;
        };
        if !seen_tokens.insert(token.clone()) {
            bail!(
                "Pagination loop detected: page token '{}' repeated after {} pages",
                token,
                pages.len()
            );
        }
        tracing::debug!("Fetching next page ({} so far)", pages.len());
        current = request.with_page_token(&token);
    }

    Ok(pages)
}
