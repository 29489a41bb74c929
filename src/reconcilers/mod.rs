// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reconciliation of the installation's managed DNS state.
//!
//! # Reconciliation Architecture
//!
//! The controller follows the standard Kubernetes controller pattern:
//!
//! 1. **Watch** - Monitor the installation configuration `ConfigMap`
//! 2. **Decide** - Compare the desired mode with the persisted DNS record
//! 3. **Act** - Reserve or release a managed domain at the registrar
//! 4. **Persist** - Write the next DNS record, only after every registrar call succeeded
//!
//! # Available Reconcilers
//!
//! - [`reconcile_dns`] - Applies a configuration snapshot to the DNS record
//! - [`renew_domain`] - Extends the lease of the held managed domain
//! - [`delete_records`] - Removes individual records of the held domain
//!
//! # Example: Using a Reconciler
//!
//! ```rust,no_run
//! use acorndns::config::parse_config;
//! use acorndns::reconcilers::reconcile_dns;
//! use acorndns::record::SecretStore;
//! use acorndns::registrar::RegistrarClient;
//!
//! async fn apply(client: kube::Client, payload: &str) -> anyhow::Result<()> {
//!     let snapshot = parse_config(payload)?;
//!     let store = SecretStore::new(client, "acorn-system", "acorn-dns");
//!
//!     reconcile_dns(&RegistrarClient::new(), &store, &snapshot).await?;
//!     Ok(())
//! }
//! ```

pub mod dns;
pub mod renewal;
pub mod writer;

#[cfg(test)]
pub(crate) mod test_doubles;

pub use dns::{
    decide, execute, needs_managed_domain, reconcile_dns, Decision, ReconcileOutcome,
    RegistrarAction,
};
pub use renewal::{delete_records, renew_domain, RenewOutcome};
pub use writer::write_record;
