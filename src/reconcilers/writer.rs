// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Persisting the computed DNS record.

use crate::dns_errors::StorageError;
use crate::record::{DnsRecord, RecordStore, WriteOutcome};
use tracing::info;

/// Persist `record` as the full content of the DNS record.
///
/// `expected_version` is the version of the read `record` was computed from, `None`
/// when no record existed. The store creates the record or replaces it entirely, so no
/// field from an earlier mode survives.
///
/// # Errors
///
/// Returns [`StorageError::InvariantViolation`] for an inconsistent record,
/// [`StorageError::Conflict`] if the record changed since it was read, or the store's
/// error if the write fails.
pub async fn write_record(
    store: &dyn RecordStore,
    record: &DnsRecord,
    expected_version: Option<&str>,
) -> Result<WriteOutcome, StorageError> {
    record.validate()?;

    let outcome = store.write(record, expected_version).await?;

    match outcome {
        WriteOutcome::Created => info!(
            state = %record.state,
            domain = %record.domain,
            "Created DNS record"
        ),
        WriteOutcome::Replaced => info!(
            state = %record.state,
            domain = %record.domain,
            "Replaced DNS record"
        ),
    }

    Ok(outcome)
}
