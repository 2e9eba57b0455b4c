//! Resource names
//!
//! `{type}/{id}` where type is one of the three Resource Manager collections.

use std::fmt;
use std::str::FromStr;

/// Resource Manager collection a resource lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
    Projects,
    Folders,
    Organizations,
}

impl ResourceType {
    pub const ALL: [ResourceType; 3] = [
        ResourceType::Projects,
        ResourceType::Folders,
        ResourceType::Organizations,
    ];

    /// Collection segment used in resource names and URLs
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceType::Projects => "projects",
            ResourceType::Folders => "folders",
            ResourceType::Organizations => "organizations",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = ResourceNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ResourceNameError::UnknownType(s.to_string()))
    }
}

/// Rejected resource name. Raised before any request is sent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResourceNameError {
    #[error("invalid resource name '{0}': expected '{{projects|folders|organizations}}/{{id}}'")]
    MissingSeparator(String),
    #[error("invalid resource type '{0}': expected one of projects, folders, organizations")]
    UnknownType(String),
    #[error("invalid resource name '{0}': resource id is empty")]
    EmptyId(String),
    #[error("invalid resource name '{0}': too many path segments")]
    TooManySegments(String),
}

/// A validated `{type}/{id}` resource name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceName {
    kind: ResourceType,
    id: String,
}

impl ResourceName {
    pub fn new(kind: ResourceType, id: impl Into<String>) -> Self {
        Self { kind, id: id.into() }
    }

    pub fn project(id: impl Into<String>) -> Self {
        Self::new(ResourceType::Projects, id)
    }

    pub fn parse(name: &str) -> Result<Self, ResourceNameError> {
        let Some((kind, id)) = name.split_once('/') else {
            return Err(ResourceNameError::MissingSeparator(name.to_string()));
        };
        let kind = kind.parse::<ResourceType>()?;
        if id.is_empty() {
            return Err(ResourceNameError::EmptyId(name.to_string()));
        }
        if id.contains('/') {
            return Err(ResourceNameError::TooManySegments(name.to_string()));
        }
        Ok(Self::new(kind, id))
    }

    pub fn kind(&self) -> ResourceType {
        self.kind
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Name with the id percent-encoded, for use in request paths
    pub fn url_path(&self) -> String {
        format!("{}/{}", self.kind, urlencoding::encode(&self.id))
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}

impl FromStr for ResourceName {
    type Err = ResourceNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
