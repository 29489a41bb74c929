// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! DNS mode reconciliation.
//!
//! Each pass is recomputed from three inputs only: the desired mode, whether the cluster
//! brings its own domains, and whether a managed domain is currently held. The pass is
//! split in a pure [`decide`] step and the side-effecting [`execute`] step so that the
//! decision table can be tested without any registrar.
//!
//! # Decision table
//!
//! | Desired mode | Cluster domains | Domain held | Registrar call   | Next record             |
//! |--------------|-----------------|-------------|------------------|-------------------------|
//! | enabled      | any             | no          | `ReserveDomain`  | enabled, new domain     |
//! | enabled      | any             | yes         | none             | enabled, same domain    |
//! | auto         | none            | no          | `ReserveDomain`  | auto, new domain        |
//! | auto         | none            | yes         | none             | auto, same domain       |
//! | auto         | some            | no          | none             | auto, empty             |
//! | auto         | some            | yes         | `PurgeRecords`   | auto, empty             |
//! | disabled     | any             | no          | none             | disabled, empty         |
//! | disabled     | any             | yes         | `PurgeRecords`   | disabled, empty         |
//!
//! A held domain is never reserved again, whatever the previous state marker was.

use super::writer::write_record;
use crate::config::{ConfigSnapshot, DnsMode};
use crate::dns_errors::{ReconcileError, RegistrarError};
use crate::metrics::record_domain_held;
use crate::record::{DnsRecord, RecordStore, WriteOutcome};
use crate::registrar::Registrar;
use tracing::{debug, info, warn};

/// Registrar call decided for a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrarAction {
    /// Obtain a new managed domain; its domain and token fill the next record
    ReserveDomain,
    /// Remove every record of the held domain before it is released
    PurgeRecords { domain: String, token: String },
}

/// Outcome of [`decide`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    /// Registrar calls to issue, in order
    pub actions: Vec<RegistrarAction>,
    /// Record to persist once every action succeeded.
    ///
    /// When `actions` contains [`RegistrarAction::ReserveDomain`], `domain` and `token`
    /// are empty here and filled by [`execute`].
    pub next: DnsRecord,
}

impl Decision {
    /// Whether the pass has nothing to do: no registrar call and nothing to persist.
    #[must_use]
    pub fn is_noop(&self, current: Option<&DnsRecord>) -> bool {
        self.actions.is_empty() && current == Some(&self.next)
    }
}

/// Whether the desired configuration calls for a managed domain.
#[must_use]
pub fn needs_managed_domain(snapshot: &ConfigSnapshot) -> bool {
    match snapshot.mode {
        DnsMode::Enabled => true,
        DnsMode::Auto => !snapshot.has_cluster_domains(),
        DnsMode::Disabled => false,
    }
}

/// Compute the registrar calls and the next record for a snapshot.
///
/// Pure: performs no I/O and returns the same decision for the same inputs.
#[must_use]
pub fn decide(snapshot: &ConfigSnapshot, current: Option<&DnsRecord>) -> Decision {
    let held = current.filter(|record| record.holds_domain());
    let state = snapshot.mode;

    if needs_managed_domain(snapshot) {
        return match held {
            Some(record) => Decision {
                actions: Vec::new(),
                next: DnsRecord::holding(state, record.domain.clone(), record.token.clone()),
            },
            None => Decision {
                actions: vec![RegistrarAction::ReserveDomain],
                next: DnsRecord::cleared(state),
            },
        };
    }

    let actions = held
        .map(|record| {
            vec![RegistrarAction::PurgeRecords {
                domain: record.domain.clone(),
                token: record.token.clone(),
            }]
        })
        .unwrap_or_default();

    Decision {
        actions,
        next: DnsRecord::cleared(state),
    }
}

/// Issue the decided registrar calls and return the completed next record.
///
/// Stops at the first failing call. A purge rejected because the registrar no longer
/// knows the domain counts as done. Nothing is persisted here.
///
/// # Errors
///
/// Returns the [`RegistrarError`] of the first failing call.
pub async fn execute(
    decision: &Decision,
    registrar: &dyn Registrar,
    endpoint: &str,
) -> Result<DnsRecord, RegistrarError> {
    let mut next = decision.next.clone();

    for action in &decision.actions {
        match action {
            RegistrarAction::ReserveDomain => {
                info!(endpoint = %endpoint, state = %next.state, "Reserving managed domain");
                let reserved = registrar.reserve_domain(endpoint).await?;
                next.domain = reserved.domain;
                next.token = reserved.token;
            }
            RegistrarAction::PurgeRecords { domain, token } => {
                info!(
                    endpoint = %endpoint,
                    domain = %domain,
                    state = %next.state,
                    "Purging records of released managed domain"
                );
                match registrar.purge_records(endpoint, domain, token).await {
                    Ok(()) => {}
                    // Nothing left to purge under a domain the registrar no longer knows
                    Err(e) if e.is_domain_lost() => {
                        warn!(domain = %domain, error = %e, "Released domain already gone from registrar");
                    }
                    Err(e) => return Err(e),
                }
            }
        }
    }

    Ok(next)
}

/// Result of a successful reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The persisted record already matched; nothing was called or written
    Unchanged(DnsRecord),
    /// The record did not exist and was created
    Created(DnsRecord),
    /// The record existed and was replaced
    Replaced(DnsRecord),
}

impl ReconcileOutcome {
    /// The record persisted after the pass.
    #[must_use]
    pub fn record(&self) -> &DnsRecord {
        match self {
            Self::Unchanged(record) | Self::Created(record) | Self::Replaced(record) => record,
        }
    }

    /// Short outcome name used as a metrics label.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unchanged(_) => "unchanged",
            Self::Created(_) => "created",
            Self::Replaced(_) => "replaced",
        }
    }
}

/// Reconcile the persisted DNS record with a configuration snapshot.
///
/// Reads the current record, decides, issues the registrar calls and only then writes
/// the next record, conditional on the record not having changed since the read. Any
/// failure leaves the persisted record untouched, so the pass can simply be retried.
///
/// # Errors
///
/// Returns [`ReconcileError::Storage`] if the record cannot be read or written and
/// [`ReconcileError::Registrar`] if a registrar call fails.
pub async fn reconcile_dns(
    registrar: &dyn Registrar,
    store: &dyn RecordStore,
    snapshot: &ConfigSnapshot,
) -> Result<ReconcileOutcome, ReconcileError> {
    let stored = store.read().await?;
    let current = stored.as_ref().map(|s| &s.record);
    let version = stored.as_ref().map(|s| s.version.as_str());

    debug!(
        mode = %snapshot.mode,
        cluster_domains = ?snapshot.cluster_domains,
        current_state = ?current.map(|r| r.state),
        holds_domain = current.is_some_and(DnsRecord::holds_domain),
        "Reconciling DNS state"
    );

    let decision = decide(snapshot, current);

    if decision.is_noop(current) {
        debug!(state = %decision.next.state, "DNS state already up to date");
        record_domain_held(decision.next.holds_domain());
        return Ok(ReconcileOutcome::Unchanged(decision.next));
    }

    let next = execute(&decision, registrar, &snapshot.endpoint).await?;

    if let Some(previous) = current {
        info!(
            changed = ?next.differs_from(previous),
            from = %previous.state,
            to = %next.state,
            "DNS state transition"
        );
    }

    let outcome = write_record(store, &next, version).await?;
    record_domain_held(next.holds_domain());

    Ok(match outcome {
        WriteOutcome::Created => ReconcileOutcome::Created(next),
        WriteOutcome::Replaced => ReconcileOutcome::Replaced(next),
    })
}

#[cfg(test)]
#[path = "dns_tests.rs"]
mod dns_tests;
