// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Configuration snapshot parsing.
//!
//! The installation configuration lives as a JSON document under the `config` key of the
//! `acorn-config` `ConfigMap`. Only three keys matter to the DNS controller:
//!
//! ```json
//! {
//!   "acornDNS": "auto",
//!   "clusterDomains": [".example.com"],
//!   "acornDNSEndpoint": "https://oss-acorn.io/v1"
//! }
//! ```
//!
//! All of them are optional. The controller must stay operable with a minimal
//! configuration, so only a payload that is not a JSON object is rejected.

use crate::constants::{
    CONFIG_KEY_CLUSTER_DOMAINS, CONFIG_KEY_DNS_ENDPOINT, CONFIG_KEY_DNS_MODE, CONFIG_MAP_DATA_KEY,
    DEFAULT_DNS_ENDPOINT,
};
use crate::dns_errors::ParseError;
use k8s_openapi::api::core::v1::ConfigMap;
use serde_json::Value;
use std::fmt;
use tracing::{debug, warn};

/// Tri-state DNS feature toggle.
///
/// The same three values double as the persisted state marker of the DNS record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DnsMode {
    /// Always hold a managed domain
    Enabled,
    /// Hold a managed domain only when the cluster has no domain of its own
    #[default]
    Auto,
    /// Never hold a managed domain
    Disabled,
}

impl DnsMode {
    /// Wire value used in the configuration payload and the state annotation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Enabled => "enabled",
            Self::Auto => "auto",
            Self::Disabled => "disabled",
        }
    }

    /// Parse a wire value, ignoring case and surrounding whitespace.
    #[must_use]
    pub fn from_value(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "enabled" => Some(Self::Enabled),
            "auto" => Some(Self::Auto),
            "disabled" => Some(Self::Disabled),
            _ => None,
        }
    }
}

impl fmt::Display for DnsMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Effective DNS configuration, recomputed on every reconciliation trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSnapshot {
    /// Desired DNS mode
    pub mode: DnsMode,
    /// Domains already owned by the cluster, in configuration order
    pub cluster_domains: Vec<String>,
    /// Registrar endpoint
    pub endpoint: String,
}

impl Default for ConfigSnapshot {
    fn default() -> Self {
        Self {
            mode: DnsMode::Auto,
            cluster_domains: Vec::new(),
            endpoint: DEFAULT_DNS_ENDPOINT.to_string(),
        }
    }
}

impl ConfigSnapshot {
    /// Whether the cluster brings its own domain(s).
    #[must_use]
    pub fn has_cluster_domains(&self) -> bool {
        !self.cluster_domains.is_empty()
    }
}

/// Parse a raw configuration payload into a [`ConfigSnapshot`].
///
/// A blank payload yields the default snapshot. An unrecognised `acornDNS` value falls
/// back to `auto`, non-string `clusterDomains` entries are skipped.
///
/// # Errors
///
/// Returns [`ParseError`] if the payload is not valid JSON or not a JSON object.
pub fn parse_config(payload: &str) -> Result<ConfigSnapshot, ParseError> {
    if payload.trim().is_empty() {
        debug!("Empty configuration payload, using defaults");
        return Ok(ConfigSnapshot::default());
    }

    let value: Value = serde_json::from_str(payload).map_err(|e| ParseError::MalformedPayload {
        reason: e.to_string(),
    })?;

    let fields = match value {
        Value::Object(fields) => fields,
        other => {
            return Err(ParseError::NotAnObject {
                found: json_type_name(&other).to_string(),
            })
        }
    };

    let mode = match fields.get(CONFIG_KEY_DNS_MODE) {
        None | Some(Value::Null) => DnsMode::default(),
        Some(Value::String(raw)) => DnsMode::from_value(raw).unwrap_or_else(|| {
            warn!(
                value = %raw,
                "Unrecognized {CONFIG_KEY_DNS_MODE} value, defaulting to auto"
            );
            DnsMode::default()
        }),
        Some(other) => {
            warn!(
                found = json_type_name(other),
                "{CONFIG_KEY_DNS_MODE} must be a string, defaulting to auto"
            );
            DnsMode::default()
        }
    };

    let cluster_domains = match fields.get(CONFIG_KEY_CLUSTER_DOMAINS) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(entries)) => entries
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|domain| !domain.is_empty())
            .map(str::to_string)
            .collect(),
        Some(other) => {
            warn!(
                found = json_type_name(other),
                "{CONFIG_KEY_CLUSTER_DOMAINS} must be a list of strings, ignoring"
            );
            Vec::new()
        }
    };

    let endpoint = fields
        .get(CONFIG_KEY_DNS_ENDPOINT)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|endpoint| !endpoint.is_empty())
        .unwrap_or(DEFAULT_DNS_ENDPOINT)
        .to_string();

    Ok(ConfigSnapshot {
        mode,
        cluster_domains,
        endpoint,
    })
}

/// Extract the configuration snapshot from the installation `ConfigMap`.
///
/// # Errors
///
/// Returns [`ParseError`] if the `config` entry holds a malformed payload.
pub fn snapshot_from_config_map(config_map: &ConfigMap) -> Result<ConfigSnapshot, ParseError> {
    let payload = config_map
        .data
        .as_ref()
        .and_then(|data| data.get(CONFIG_MAP_DATA_KEY))
        .map_or("", String::as_str);

    parse_config(payload)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
