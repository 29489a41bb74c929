// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for the acorn-dns controller.
//!
//! This module provides specialized error types for:
//! - Parsing the installation configuration payload
//! - Registrar HTTP API operations (reserve, publish, renew, delete, purge)
//! - Reading and writing the persisted DNS `Secret`
//!
//! Every reconciliation pass reports exactly one [`ReconcileError`] on failure.
//! None of them is fatal: the controller requeues and the next pass converges.

use thiserror::Error;

/// Errors raised while parsing the configuration payload.
///
/// Only a structurally invalid payload fails. Unknown or missing values fall back
/// to their defaults instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The payload is not valid JSON
    #[error("Configuration payload is not valid JSON: {reason}")]
    MalformedPayload {
        /// Decoder message
        reason: String,
    },

    /// The payload is valid JSON but not an object
    #[error("Configuration payload must be a JSON object, found {found}")]
    NotAnObject {
        /// JSON type that was found instead (e.g., "array", "string")
        found: String,
    },
}

/// Errors returned by the external DNS registrar.
///
/// Any of these aborts the current reconciliation before the record is written.
#[derive(Error, Debug, Clone)]
pub enum RegistrarError {
    /// HTTP connection failed (network unreachable, connection refused, timeout)
    #[error("Registrar {operation} request to {endpoint} failed: {reason}")]
    ConnectionFailed {
        /// Registrar operation (e.g., "reserve_domain")
        operation: String,
        /// Registrar endpoint
        endpoint: String,
        /// Reason for the connection failure
        reason: String,
    },

    /// Registrar rejected the token (HTTP 401 or 403)
    ///
    /// For an authenticated call this means the domain no longer belongs to this token.
    #[error("Registrar at {endpoint} rejected the token for domain '{domain}': {message}")]
    Unauthorized {
        /// Registrar endpoint
        endpoint: String,
        /// Domain the call was made for
        domain: String,
        /// Message returned by the registrar
        message: String,
    },

    /// Registrar does not know the domain (HTTP 404)
    #[error("Domain '{domain}' not found on registrar {endpoint} (HTTP 404)")]
    DomainNotFound {
        /// Registrar endpoint
        endpoint: String,
        /// Domain the call was made for
        domain: String,
    },

    /// Any other non-success HTTP response
    #[error("Registrar {operation} at {endpoint} failed with HTTP {status_code}: {message}")]
    RequestFailed {
        /// Registrar operation (e.g., "purge_records")
        operation: String,
        /// Registrar endpoint
        endpoint: String,
        /// HTTP status code
        status_code: u16,
        /// Message returned by the registrar
        message: String,
    },

    /// The response body could not be decoded or is missing required fields
    #[error("Invalid {operation} response from registrar {endpoint}: {reason}")]
    InvalidResponse {
        /// Registrar operation
        operation: String,
        /// Registrar endpoint
        endpoint: String,
        /// Explanation of what is invalid
        reason: String,
    },
}

impl RegistrarError {
    /// Whether the registrar no longer recognises the held domain or its token.
    ///
    /// A lost domain is released locally so that the next reconciliation reserves a new one.
    #[must_use]
    pub fn is_domain_lost(&self) -> bool {
        matches!(
            self,
            Self::Unauthorized { .. } | Self::DomainNotFound { .. }
        )
    }
}

/// Errors raised while reading or writing the persisted DNS record.
#[derive(Error, Debug, Clone)]
pub enum StorageError {
    /// Reading the record failed
    #[error("Failed to read DNS record {namespace}/{name}: {reason}")]
    ReadFailed {
        /// Namespace of the record
        namespace: String,
        /// Name of the record
        name: String,
        /// Reason for the failure
        reason: String,
    },

    /// Creating or replacing the record failed
    #[error("Failed to write DNS record {namespace}/{name}: {reason}")]
    WriteFailed {
        /// Namespace of the record
        namespace: String,
        /// Name of the record
        name: String,
        /// Reason for the failure
        reason: String,
    },

    /// The record changed since it was read; the write was refused
    #[error("DNS record {namespace}/{name} changed since it was read: {reason}")]
    Conflict {
        /// Namespace of the record
        namespace: String,
        /// Name of the record
        name: String,
        /// Reason reported by the store
        reason: String,
    },

    /// Refused to persist a record whose fields break the record invariants
    #[error("Refusing to persist inconsistent DNS record: {reason}")]
    InvariantViolation {
        /// Which invariant is broken
        reason: String,
    },
}

/// Failure of a single reconciliation pass.
#[derive(Error, Debug, Clone)]
pub enum ReconcileError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Registrar(#[from] RegistrarError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ReconcileError {
    /// Short error category used as a metrics label.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Parse(_) => "parse_error",
            Self::Registrar(_) => "registrar_error",
            Self::Storage(_) => "storage_error",
        }
    }
}
