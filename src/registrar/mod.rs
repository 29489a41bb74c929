// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Contract with the external DNS registrar.
//!
//! The registrar hands out managed domains under its own zone and publishes records
//! for them. The controller talks to it through the [`Registrar`] trait so that the
//! reconciliation logic can be exercised against deterministic doubles; the
//! production implementation is the HTTP [`RegistrarClient`].
//!
//! Every operation is a single request/response exchange. Nothing is retried here:
//! a failed call aborts the reconciliation pass and the controller requeues it.
//!
//! # Example
//!
//! ```rust,no_run
//! use acorndns::registrar::{Registrar, RegistrarClient};
//!
//! # async fn example() -> Result<(), acorndns::dns_errors::RegistrarError> {
//! let registrar = RegistrarClient::new();
//! let reserved = registrar.reserve_domain("https://oss-acorn.io/v1").await?;
//! registrar
//!     .purge_records("https://oss-acorn.io/v1", &reserved.domain, &reserved.token)
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod types;

pub use client::RegistrarClient;
pub use types::{
    normalize_fqdn, DomainResponse, ErrorResponse, FqdnTypePair, RecordRequest, RecordType,
    RenewRequest, RenewResponse, ReservedDomain,
};

use crate::dns_errors::RegistrarError;
use async_trait::async_trait;

/// Operations offered by the DNS registrar.
#[async_trait]
pub trait Registrar: Send + Sync {
    /// Reserve a brand-new managed domain and obtain its token.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrarError`] if the request fails or the response is incomplete.
    async fn reserve_domain(&self, endpoint: &str) -> Result<ReservedDomain, RegistrarError>;

    /// Publish records under a reserved domain. Fails as a unit on the first rejected entry.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrarError`] if any record cannot be published.
    async fn create_records(
        &self,
        endpoint: &str,
        domain: &str,
        token: &str,
        records: &[RecordRequest],
    ) -> Result<(), RegistrarError>;

    /// Extend the reservation lease of a domain.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrarError`] if the renewal is rejected.
    async fn renew(
        &self,
        endpoint: &str,
        domain: &str,
        token: &str,
        request: &RenewRequest,
    ) -> Result<RenewResponse, RegistrarError>;

    /// Remove a single record.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrarError`] if the deletion is rejected.
    async fn delete_record(
        &self,
        endpoint: &str,
        domain: &str,
        fqdn: &str,
        token: &str,
    ) -> Result<(), RegistrarError>;

    /// Remove every record under a domain.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrarError`] if the purge is rejected.
    async fn purge_records(
        &self,
        endpoint: &str,
        domain: &str,
        token: &str,
    ) -> Result<(), RegistrarError>;
}
