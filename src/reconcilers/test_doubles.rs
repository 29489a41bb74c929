// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-memory doubles for the registrar and record store.

use crate::dns_errors::{RegistrarError, StorageError};
use crate::record::{DnsRecord, RecordStore, StoredRecord, WriteOutcome};
use crate::registrar::{
    FqdnTypePair, RecordRequest, Registrar, RenewRequest, RenewResponse, ReservedDomain,
};
use async_trait::async_trait;
use std::sync::Mutex;
use tokio::sync::Notify;

pub const ENDPOINT: &str = "https://registrar.test/v1";

/// A call observed by [`FakeRegistrar`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Reserve,
    CreateRecords { domain: String, names: Vec<String> },
    Renew { domain: String, version: String },
    DeleteRecord { domain: String, fqdn: String },
    Purge { domain: String, token: String },
}

/// Registrar double that records every call.
///
/// Reservations hand out `domain-N.test` / `token-N`.
#[derive(Default)]
pub struct FakeRegistrar {
    pub calls: Mutex<Vec<Call>>,
    pub fail_with: Mutex<Option<RegistrarError>>,
    pub out_of_sync: Mutex<Vec<FqdnTypePair>>,
    reserved: Mutex<usize>,
}

impl FakeRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(error: RegistrarError) -> Self {
        let registrar = Self::default();
        *registrar.fail_with.lock().unwrap() = Some(error);
        registrar
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn reserve_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Reserve))
            .count()
    }

    pub fn purge_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Purge { .. }))
            .count()
    }

    fn observe(&self, call: Call) -> Result<(), RegistrarError> {
        self.calls.lock().unwrap().push(call);
        match self.fail_with.lock().unwrap().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Registrar for FakeRegistrar {
    async fn reserve_domain(&self, _endpoint: &str) -> Result<ReservedDomain, RegistrarError> {
        self.observe(Call::Reserve)?;
        let mut reserved = self.reserved.lock().unwrap();
        *reserved += 1;
        Ok(ReservedDomain {
            domain: format!("domain-{reserved}.test"),
            token: format!("token-{reserved}"),
        })
    }

    async fn create_records(
        &self,
        _endpoint: &str,
        domain: &str,
        _token: &str,
        records: &[RecordRequest],
    ) -> Result<(), RegistrarError> {
        self.observe(Call::CreateRecords {
            domain: domain.to_string(),
            names: records.iter().map(|r| r.name.clone()).collect(),
        })
    }

    async fn renew(
        &self,
        _endpoint: &str,
        domain: &str,
        _token: &str,
        request: &RenewRequest,
    ) -> Result<RenewResponse, RegistrarError> {
        self.observe(Call::Renew {
            domain: domain.to_string(),
            version: request.version.clone(),
        })?;
        Ok(RenewResponse {
            name: domain.to_string(),
            out_of_sync_records: self.out_of_sync.lock().unwrap().clone(),
        })
    }

    async fn delete_record(
        &self,
        _endpoint: &str,
        domain: &str,
        fqdn: &str,
        _token: &str,
    ) -> Result<(), RegistrarError> {
        self.observe(Call::DeleteRecord {
            domain: domain.to_string(),
            fqdn: fqdn.to_string(),
        })
    }

    async fn purge_records(
        &self,
        _endpoint: &str,
        domain: &str,
        token: &str,
    ) -> Result<(), RegistrarError> {
        self.observe(Call::Purge {
            domain: domain.to_string(),
            token: token.to_string(),
        })
    }
}

/// Registrar double whose renew call waits for [`GatedRenewRegistrar::open`].
///
/// Lets a test run other passes while a renewal is in flight. Every call is
/// forwarded to the wrapped [`FakeRegistrar`] once it proceeds.
#[derive(Default)]
pub struct GatedRenewRegistrar {
    pub inner: FakeRegistrar,
    renew_error: Option<RegistrarError>,
    gate: Notify,
}

impl GatedRenewRegistrar {
    /// Renew waits for the gate, then fails with `error`.
    pub fn failing_renew(error: RegistrarError) -> Self {
        Self {
            renew_error: Some(error),
            ..Self::default()
        }
    }

    /// Let the pending renew call proceed.
    pub fn open(&self) {
        self.gate.notify_one();
    }
}

#[async_trait]
impl Registrar for GatedRenewRegistrar {
    async fn reserve_domain(&self, endpoint: &str) -> Result<ReservedDomain, RegistrarError> {
        self.inner.reserve_domain(endpoint).await
    }

    async fn create_records(
        &self,
        endpoint: &str,
        domain: &str,
        token: &str,
        records: &[RecordRequest],
    ) -> Result<(), RegistrarError> {
        self.inner.create_records(endpoint, domain, token, records).await
    }

    async fn renew(
        &self,
        endpoint: &str,
        domain: &str,
        token: &str,
        request: &RenewRequest,
    ) -> Result<RenewResponse, RegistrarError> {
        self.gate.notified().await;
        let response = self.inner.renew(endpoint, domain, token, request).await;
        match &self.renew_error {
            Some(error) => Err(error.clone()),
            None => response,
        }
    }

    async fn delete_record(
        &self,
        endpoint: &str,
        domain: &str,
        fqdn: &str,
        token: &str,
    ) -> Result<(), RegistrarError> {
        self.inner.delete_record(endpoint, domain, fqdn, token).await
    }

    async fn purge_records(
        &self,
        endpoint: &str,
        domain: &str,
        token: &str,
    ) -> Result<(), RegistrarError> {
        self.inner.purge_records(endpoint, domain, token).await
    }
}

/// Record store double keeping the record in memory.
///
/// Every write bumps a version counter. A write whose expected version is not the
/// current one is refused with [`StorageError::Conflict`], as the API server does for
/// a stale `resourceVersion`.
#[derive(Default)]
pub struct MemoryStore {
    pub record: Mutex<Option<StoredRecord>>,
    pub writes: Mutex<usize>,
    pub fail_writes: bool,
    revision: Mutex<u64>,
}

impl MemoryStore {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with(record: DnsRecord) -> Self {
        Self {
            record: Mutex::new(Some(StoredRecord {
                record,
                version: "0".to_string(),
            })),
            ..Self::default()
        }
    }

    pub fn rejecting_writes(record: Option<DnsRecord>) -> Self {
        let store = record.map_or_else(Self::empty, Self::with);
        Self {
            fail_writes: true,
            ..store
        }
    }

    pub fn current(&self) -> Option<DnsRecord> {
        self.record.lock().unwrap().as_ref().map(|s| s.record.clone())
    }

    pub fn version(&self) -> Option<String> {
        self.record.lock().unwrap().as_ref().map(|s| s.version.clone())
    }

    pub fn write_count(&self) -> usize {
        *self.writes.lock().unwrap()
    }

    fn error_location() -> (String, String) {
        ("acorn-system".to_string(), "acorn-dns".to_string())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn read(&self) -> Result<Option<StoredRecord>, StorageError> {
        Ok(self.record.lock().unwrap().clone())
    }

    async fn write(
        &self,
        record: &DnsRecord,
        expected_version: Option<&str>,
    ) -> Result<WriteOutcome, StorageError> {
        let (namespace, name) = Self::error_location();
        if self.fail_writes {
            return Err(StorageError::WriteFailed {
                namespace,
                name,
                reason: "write rejected".to_string(),
            });
        }

        let mut stored = self.record.lock().unwrap();
        let current_version = stored.as_ref().map(|s| s.version.as_str());
        if current_version != expected_version {
            return Err(StorageError::Conflict {
                namespace,
                name,
                reason: format!(
                    "expected version {expected_version:?}, found {current_version:?}"
                ),
            });
        }

        let mut revision = self.revision.lock().unwrap();
        *revision += 1;
        *self.writes.lock().unwrap() += 1;
        let previous = stored.replace(StoredRecord {
            record: record.clone(),
            version: revision.to_string(),
        });
        Ok(if previous.is_some() {
            WriteOutcome::Replaced
        } else {
            WriteOutcome::Created
        })
    }
}
