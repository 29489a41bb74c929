// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Persisted DNS record state.
//!
//! One record exists per installation. It is stored as a Kubernetes `Secret`:
//!
//! ```yaml
//! apiVersion: v1
//! kind: Secret
//! metadata:
//!   name: acorn-dns
//!   namespace: acorn-system
//!   annotations:
//!     acorn.io/dns-state: enabled
//! data:
//!   domain: <reserved domain>
//!   token: <registrar token>
//! ```
//!
//! The record is never deleted. Disabling DNS clears `domain` and `token` and keeps the
//! `Secret` so other components can always read the current DNS status from it.

use crate::config::DnsMode;
use crate::dns_errors::StorageError;
use crate::labels::{
    ACORN_DNS_STATE_ANNOTATION, DATA_KEY_DOMAIN, DATA_KEY_TOKEN, K8S_MANAGED_BY, K8S_PART_OF,
    MANAGED_BY_DNS_CONTROLLER, PART_OF_ACORN,
};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use kube::api::{ObjectMeta, PostParams};
use kube::{Api, Client};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Content of the persisted DNS record.
///
/// Invariants:
/// - `domain` and `token` are both empty or both non-empty
/// - `state == Disabled` implies both are empty
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DnsRecord {
    /// Mode that produced the current content
    pub state: DnsMode,
    /// Reserved domain, empty when no managed domain is held
    pub domain: String,
    /// Registrar token, empty when no managed domain is held
    pub token: String,
}

impl DnsRecord {
    /// Record holding a managed domain.
    #[must_use]
    pub fn holding(state: DnsMode, domain: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            state,
            domain: domain.into(),
            token: token.into(),
        }
    }

    /// Record holding no managed domain.
    #[must_use]
    pub fn cleared(state: DnsMode) -> Self {
        Self {
            state,
            domain: String::new(),
            token: String::new(),
        }
    }

    /// Whether a managed domain (and its token) is held.
    #[must_use]
    pub fn holds_domain(&self) -> bool {
        !self.domain.is_empty() && !self.token.is_empty()
    }

    /// Check the record invariants.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvariantViolation`] describing the first broken invariant.
    pub fn validate(&self) -> Result<(), StorageError> {
        if self.domain.is_empty() != self.token.is_empty() {
            return Err(StorageError::InvariantViolation {
                reason: "domain and token must be set together".to_string(),
            });
        }
        if self.state == DnsMode::Disabled && self.holds_domain() {
            return Err(StorageError::InvariantViolation {
                reason: "a disabled record cannot hold a domain".to_string(),
            });
        }
        Ok(())
    }

    /// Names of the fields that differ from `other`.
    ///
    /// The token value itself is never reported, only the fact that it changed.
    #[must_use]
    pub fn differs_from(&self, other: &Self) -> Vec<&'static str> {
        let mut changed = Vec::new();
        if self.state != other.state {
            changed.push("state");
        }
        if self.domain != other.domain {
            changed.push("domain");
        }
        if self.token != other.token {
            changed.push("token");
        }
        changed
    }

    /// Decode a record from its `Secret`.
    ///
    /// A missing or unknown state annotation reads as `auto`. A `Secret` carrying only
    /// one of `domain`/`token` is read as holding no domain, since the held domain cannot
    /// be released without its token. Surrounding whitespace of the values is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ReadFailed`] if `domain` or `token` is not valid UTF-8.
    pub fn from_secret(secret: &Secret) -> Result<Self, StorageError> {
        let state = secret
            .metadata
            .annotations
            .as_ref()
            .and_then(|annotations| annotations.get(ACORN_DNS_STATE_ANNOTATION))
            .and_then(|value| DnsMode::from_value(value))
            .unwrap_or_default();

        let domain = secret_value(secret, DATA_KEY_DOMAIN)?;
        let token = secret_value(secret, DATA_KEY_TOKEN)?;

        if domain.is_empty() != token.is_empty() {
            warn!(
                secret = ?secret.metadata.name,
                has_domain = !domain.is_empty(),
                has_token = !token.is_empty(),
                "DNS secret is partially populated, treating it as holding no domain"
            );
            return Ok(Self::cleared(state));
        }

        Ok(Self {
            state,
            domain,
            token,
        })
    }

    /// Encode the record as the full desired `Secret`.
    #[must_use]
    pub fn to_secret(&self, namespace: &str, name: &str) -> Secret {
        let mut labels = BTreeMap::new();
        labels.insert(K8S_MANAGED_BY.to_string(), MANAGED_BY_DNS_CONTROLLER.to_string());
        labels.insert(K8S_PART_OF.to_string(), PART_OF_ACORN.to_string());

        let mut annotations = BTreeMap::new();
        annotations.insert(
            ACORN_DNS_STATE_ANNOTATION.to_string(),
            self.state.as_str().to_string(),
        );

        let mut data = BTreeMap::new();
        data.insert(
            DATA_KEY_DOMAIN.to_string(),
            ByteString(self.domain.as_bytes().to_vec()),
        );
        data.insert(
            DATA_KEY_TOKEN.to_string(),
            ByteString(self.token.as_bytes().to_vec()),
        );

        Secret {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                labels: Some(labels),
                annotations: Some(annotations),
                ..Default::default()
            },
            data: Some(data),
            ..Default::default()
        }
    }
}

fn secret_value(secret: &Secret, key: &str) -> Result<String, StorageError> {
    let Some(bytes) = secret.data.as_ref().and_then(|data| data.get(key)) else {
        return Ok(String::new());
    };

    let value = std::str::from_utf8(&bytes.0).map_err(|e| StorageError::ReadFailed {
        namespace: secret.metadata.namespace.clone().unwrap_or_default(),
        name: secret.metadata.name.clone().unwrap_or_default(),
        reason: format!("data key '{key}' is not valid UTF-8: {e}"),
    })?;

    Ok(value.trim().to_string())
}

/// Result of persisting a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// No record existed, one was created
    Created,
    /// An existing record was fully replaced
    Replaced,
}

/// A record together with the store version it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    pub record: DnsRecord,
    /// Opaque version token (the `Secret` `resourceVersion`)
    pub version: String,
}

/// Accessor for the single persisted DNS record of an installation.
///
/// Writes are conditional on the version observed by the read the new record was
/// computed from, so a writer working from a stale read fails instead of overwriting.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Read the current record. `Ok(None)` means it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ReadFailed`] if the backing store cannot be read or
    /// holds undecodable data.
    async fn read(&self) -> Result<Option<StoredRecord>, StorageError>;

    /// Replace the record entirely, or create it when `expected_version` is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Conflict`] if the record was created or changed after the
    /// read that produced `expected_version`, and [`StorageError::WriteFailed`] if the
    /// backing store rejects the write.
    async fn write(
        &self,
        record: &DnsRecord,
        expected_version: Option<&str>,
    ) -> Result<WriteOutcome, StorageError>;
}

/// [`RecordStore`] backed by a namespaced Kubernetes `Secret`.
#[derive(Clone)]
pub struct SecretStore {
    api: Api<Secret>,
    namespace: String,
    name: String,
}

impl SecretStore {
    /// Address the DNS `Secret` `namespace/name`.
    #[must_use]
    pub fn new(client: Client, namespace: &str, name: &str) -> Self {
        Self {
            api: Api::namespaced(client, namespace),
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }

    fn read_error(&self, e: &kube::Error) -> StorageError {
        StorageError::ReadFailed {
            namespace: self.namespace.clone(),
            name: self.name.clone(),
            reason: e.to_string(),
        }
    }

    fn write_error(&self, e: &kube::Error) -> StorageError {
        write_error(&self.namespace, &self.name, e)
    }
}

/// Map a create/replace failure; HTTP 409 means the version precondition failed.
pub(crate) fn write_error(namespace: &str, name: &str, e: &kube::Error) -> StorageError {
    match e {
        kube::Error::Api(api_err) if api_err.code == 409 => StorageError::Conflict {
            namespace: namespace.to_string(),
            name: name.to_string(),
            reason: api_err.message.clone(),
        },
        _ => StorageError::WriteFailed {
            namespace: namespace.to_string(),
            name: name.to_string(),
            reason: e.to_string(),
        },
    }
}

#[async_trait]
impl RecordStore for SecretStore {
    async fn read(&self) -> Result<Option<StoredRecord>, StorageError> {
        let Some(secret) = self
            .api
            .get_opt(&self.name)
            .await
            .map_err(|e| self.read_error(&e))?
        else {
            return Ok(None);
        };

        Ok(Some(StoredRecord {
            record: DnsRecord::from_secret(&secret)?,
            version: secret.metadata.resource_version.unwrap_or_default(),
        }))
    }

    async fn write(
        &self,
        record: &DnsRecord,
        expected_version: Option<&str>,
    ) -> Result<WriteOutcome, StorageError> {
        let mut desired = record.to_secret(&self.namespace, &self.name);

        match expected_version {
            Some(version) => {
                debug!(
                    namespace = %self.namespace,
                    name = %self.name,
                    resource_version = %version,
                    "Replacing DNS secret"
                );
                // The API server rejects the replace if the Secret moved past this version
                desired.metadata.resource_version = Some(version.to_string());
                self.api
                    .replace(&self.name, &PostParams::default(), &desired)
                    .await
                    .map_err(|e| self.write_error(&e))?;
                Ok(WriteOutcome::Replaced)
            }
            None => {
                debug!(
                    namespace = %self.namespace,
                    name = %self.name,
                    "Creating DNS secret"
                );
                self.api
                    .create(&PostParams::default(), &desired)
                    .await
                    .map_err(|e| self.write_error(&e))?;
                Ok(WriteOutcome::Created)
            }
        }
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod record_tests;
