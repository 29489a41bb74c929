// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared context for the DNS controller and the lease renewal loop.
//!
//! Both receive an `Arc<Context>` holding the registrar, the record store and the
//! names of the watched objects. The registrar and the store are trait objects so the
//! same wiring runs against in-memory doubles.
//!
//! Reconciliation and renewal both read the record, call the registrar and write the
//! record back. They take [`Context::lock_record`] for the whole pass so the two never
//! interleave inside one process.

use crate::constants::{
    CONFIG_MAP_NAME, DEFAULT_RENEW_INTERVAL_SECS, DNS_SECRET_NAME, SYSTEM_NAMESPACE,
};
use crate::record::{RecordStore, SecretStore};
use crate::registrar::{Registrar, RegistrarClient};
use kube::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};

/// Names and intervals the controller runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerSettings {
    /// Namespace of the configuration `ConfigMap` and the DNS `Secret`
    pub namespace: String,
    /// Name of the watched configuration `ConfigMap`
    pub config_map_name: String,
    /// Name of the persisted DNS `Secret`
    pub secret_name: String,
    /// Interval between two lease renewals
    pub renew_interval: Duration,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            namespace: SYSTEM_NAMESPACE.to_string(),
            config_map_name: CONFIG_MAP_NAME.to_string(),
            secret_name: DNS_SECRET_NAME.to_string(),
            renew_interval: Duration::from_secs(DEFAULT_RENEW_INTERVAL_SECS),
        }
    }
}

impl ControllerSettings {
    /// Field selector restricting the watch to the configuration `ConfigMap`.
    #[must_use]
    pub fn config_map_selector(&self) -> String {
        format!("metadata.name={}", self.config_map_name)
    }
}

/// Shared context passed to the controller and the renewal loop.
#[derive(Clone)]
pub struct Context {
    /// External DNS registrar
    pub registrar: Arc<dyn Registrar>,

    /// Persisted DNS record
    pub store: Arc<dyn RecordStore>,

    /// Names and intervals
    pub settings: ControllerSettings,

    /// Held for a full read, call and write pass over the record
    record_lock: Arc<Mutex<()>>,
}

impl Context {
    /// Production wiring: HTTP registrar and `Secret`-backed store.
    #[must_use]
    pub fn new(client: Client, settings: ControllerSettings) -> Self {
        let store = SecretStore::new(client, &settings.namespace, &settings.secret_name);
        Self::with_components(Arc::new(RegistrarClient::new()), Arc::new(store), settings)
    }

    /// Wire arbitrary registrar and store implementations.
    #[must_use]
    pub fn with_components(
        registrar: Arc<dyn Registrar>,
        store: Arc<dyn RecordStore>,
        settings: ControllerSettings,
    ) -> Self {
        Self {
            registrar,
            store,
            settings,
            record_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Wait until no other pass is working on the record and claim it.
    pub async fn lock_record(&self) -> MutexGuard<'_, ()> {
        self.record_lock.lock().await
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod context_tests;
