// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Wire types of the registrar HTTP API.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// DNS record types the registrar publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordType {
    A,
    #[serde(rename = "AAAA")]
    Aaaa,
    #[serde(rename = "CNAME")]
    Cname,
    #[serde(rename = "TXT")]
    Txt,
}

/// One record to publish under the reserved domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRequest {
    /// Fully qualified record name (e.g., "app.abc123.oss-acorn.io")
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: RecordType,
    pub values: Vec<String>,
}

/// Lease renewal request. `records` is the full set the holder expects to exist.
///
/// The controller publishes no records of its own, so it renews with an empty set:
/// the call extends the lease and no out-of-sync record is republished.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RenewRequest {
    pub records: Vec<RecordRequest>,
    /// Version of the renewing client
    pub version: String,
}

/// A record identified by name and type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FqdnTypePair {
    pub fqdn: String,
    #[serde(rename = "type")]
    pub record_type: RecordType,
}

/// Lease renewal response.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenewResponse {
    /// Renewed domain
    #[serde(default)]
    pub name: String,
    /// Records the registrar holds differently from the renewal request
    #[serde(default)]
    pub out_of_sync_records: Vec<FqdnTypePair>,
}

/// Body returned by a domain reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainResponse {
    pub name: String,
    pub token: String,
}

/// A newly reserved managed domain and its credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservedDomain {
    pub domain: String,
    pub token: String,
}

/// Body returned by the registrar on non-success responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub status: u16,
    #[serde(default, rename = "msg")]
    pub message: String,
    #[serde(default)]
    pub data: BTreeMap<String, serde_json::Value>,
}

/// Normalize a DNS name for comparison: lowercase, no trailing dot.
#[must_use]
pub fn normalize_fqdn(name: &str) -> String {
    name.trim().trim_end_matches('.').to_ascii_lowercase()
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod types_tests;
