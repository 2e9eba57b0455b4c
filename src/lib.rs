//! gcrm - Google Cloud Resource Manager client
//!
//! Look up projects, folders and organizations, walk a project's ancestry,
//! and read or change IAM and organization policies.

pub mod config;
pub mod gcp;
pub mod resourcemanager;
