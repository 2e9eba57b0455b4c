//! Organization policy request bodies

use anyhow::{bail, Result};
use serde_json::{json, Value};

const CONSTRAINT_PREFIX: &str = "constraints/";

/// `compute.vmExternalIpAccess` -> `constraints/compute.vmExternalIpAccess`
pub fn constraint_name(constraint: &str) -> String {
    if constraint.starts_with(CONSTRAINT_PREFIX) {
        constraint.to_string()
    } else {
        format!("{}{}", CONSTRAINT_PREFIX, constraint)
    }
}

/// Body of `:getOrgPolicy`
pub fn get_body(constraint: &str) -> Value {
    json!({ "constraint": constraint_name(constraint) })
}

/// Body of `:setOrgPolicy`: the policy with the caller's etag merged in
pub fn set_body(policy: &Value, etag: &str) -> Result<Value> {
    let Value::Object(fields) = policy else {
        bail!("Org policy must be a JSON object");
    };
    let mut fields = fields.clone();
    fields.insert("etag".to_string(), Value::String(etag.to_string()));
    Ok(json!({ "policy": fields }))
}

/// Body of `:clearOrgPolicy`
pub fn clear_body(constraint: &str, etag: &str) -> Value {
    json!({
        "constraint": constraint_name(constraint),
        "etag": etag,
    })
}
