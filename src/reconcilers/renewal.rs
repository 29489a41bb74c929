// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Lease maintenance of the held managed domain.
//!
//! Runs on its own interval, independent of configuration changes. Renewal keeps the
//! reservation alive and republishes records the registrar reports as out of sync.
//! Only records passed by the caller are ever republished; with an empty set renewal
//! extends the lease and nothing else.
//! If the registrar no longer recognises the domain or its token, the record is cleared
//! so that the next reconciliation reserves a fresh domain. The clear is conditional on
//! the version read before renewing, so it never overwrites a record reconciled since.

use super::writer::write_record;
use crate::dns_errors::{ReconcileError, RegistrarError};
use crate::metrics::{record_domain_held, record_renewal};
use crate::record::{DnsRecord, RecordStore};
use crate::registrar::{normalize_fqdn, RecordRequest, Registrar, RenewRequest};
use tracing::{debug, info, warn};

/// Result of a renewal attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenewOutcome {
    /// No managed domain is held, nothing to renew
    NothingHeld,
    /// Lease extended; `resynced` records were republished
    Renewed { resynced: usize },
    /// The registrar no longer recognises the domain; the record was cleared
    DomainLost,
}

impl RenewOutcome {
    /// Short outcome name used as a metrics label.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NothingHeld => "nothing_held",
            Self::Renewed { .. } => "renewed",
            Self::DomainLost => "domain_lost",
        }
    }
}

/// Renew the lease of the held managed domain.
///
/// `records` is the full set of records expected under the domain. Out-of-sync records
/// the registrar reports that are not in `records` are left alone.
///
/// # Errors
///
/// Returns [`ReconcileError::Storage`] if the record cannot be read or cleared, including
/// [`StorageError::Conflict`](crate::dns_errors::StorageError::Conflict) when a
/// reconciliation replaced the record while the renew call was in flight, and
/// [`ReconcileError::Registrar`] for registrar failures other than a lost domain.
pub async fn renew_domain(
    registrar: &dyn Registrar,
    store: &dyn RecordStore,
    endpoint: &str,
    records: &[RecordRequest],
) -> Result<RenewOutcome, ReconcileError> {
    let (current, version) = match store.read().await? {
        Some(stored) if stored.record.holds_domain() => (stored.record, stored.version),
        _ => {
            debug!("No managed domain held, skipping lease renewal");
            record_renewal(RenewOutcome::NothingHeld.as_str());
            return Ok(RenewOutcome::NothingHeld);
        }
    };

    let request = RenewRequest {
        records: records.to_vec(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    let response = match registrar
        .renew(endpoint, &current.domain, &current.token, &request)
        .await
    {
        Ok(response) => response,
        Err(e) if e.is_domain_lost() => {
            warn!(
                domain = %current.domain,
                error = %e,
                "Managed domain no longer recognised by registrar, releasing it"
            );
            write_record(store, &DnsRecord::cleared(current.state), Some(&version)).await?;
            record_domain_held(false);
            record_renewal(RenewOutcome::DomainLost.as_str());
            return Ok(RenewOutcome::DomainLost);
        }
        Err(e) => {
            record_renewal("error");
            return Err(e.into());
        }
    };

    let resync: Vec<RecordRequest> = records
        .iter()
        .filter(|record| {
            let name = normalize_fqdn(&record.name);
            response.out_of_sync_records.iter().any(|pair| {
                pair.record_type == record.record_type && normalize_fqdn(&pair.fqdn) == name
            })
        })
        .cloned()
        .collect();

    if !resync.is_empty() {
        info!(
            domain = %current.domain,
            count = resync.len(),
            "Republishing out-of-sync records"
        );
        if let Err(e) = registrar
            .create_records(endpoint, &current.domain, &current.token, &resync)
            .await
        {
            record_renewal("error");
            return Err(e.into());
        }
    }

    info!(
        domain = %current.domain,
        resynced = resync.len(),
        "Renewed managed domain lease"
    );
    let outcome = RenewOutcome::Renewed {
        resynced: resync.len(),
    };
    record_renewal(outcome.as_str());

    Ok(outcome)
}

/// Delete individual records of the held managed domain.
///
/// Returns how many records were deleted. Does nothing when no domain is held.
///
/// # Errors
///
/// Returns the [`RegistrarError`] of the first rejected deletion.
pub async fn delete_records(
    registrar: &dyn Registrar,
    endpoint: &str,
    record: &DnsRecord,
    fqdns: &[String],
) -> Result<usize, RegistrarError> {
    if !record.holds_domain() {
        debug!(count = fqdns.len(), "No managed domain held, nothing to delete");
        return Ok(0);
    }

    for fqdn in fqdns {
        info!(domain = %record.domain, fqdn = %fqdn, "Deleting record");
        registrar
            .delete_record(endpoint, &record.domain, fqdn, &record.token)
            .await?;
    }

    Ok(fqdns.len())
}

#[cfg(test)]
#[path = "renewal_tests.rs"]
mod renewal_tests;
