// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

// Common test utilities for integration tests

#![allow(dead_code)]

use acorndns::dns_errors::StorageError;
use acorndns::record::{DnsRecord, RecordStore, StoredRecord, WriteOutcome};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Namespace;
use kube::{
    api::{Api, DeleteParams, PostParams},
    client::Client,
};
use serde_json::json;
use std::sync::Mutex;

/// Get a Kubernetes client or skip the test if not in a cluster
pub async fn get_kube_client_or_skip() -> Option<Client> {
    match Client::try_default().await {
        Ok(client) => Some(client),
        Err(e) => {
            eprintln!("Skipping integration test: not running in Kubernetes cluster: {e}");
            None
        }
    }
}

/// Create a test namespace
pub async fn create_test_namespace(
    client: &Client,
    name: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let namespaces: Api<Namespace> = Api::all(client.clone());

    let ns = serde_json::from_value(json!({
        "apiVersion": "v1",
        "kind": "Namespace",
        "metadata": {
            "name": name,
            "labels": {
                "test": "integration",
                "managed-by": "acorn-dns-test"
            }
        }
    }))?;

    match namespaces.create(&PostParams::default(), &ns).await {
        Ok(_) => {
            println!("Created test namespace: {name}");
            Ok(())
        }
        Err(kube::Error::Api(ae)) if ae.code == 409 => {
            println!("Test namespace already exists: {name}");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}

/// Delete a test namespace, ignoring a namespace that is already gone
pub async fn delete_test_namespace(client: &Client, name: &str) {
    let namespaces: Api<Namespace> = Api::all(client.clone());
    match namespaces.delete(name, &DeleteParams::default()).await {
        Ok(_) => println!("Deleted test namespace: {name}"),
        Err(e) => eprintln!("Failed to delete test namespace {name}: {e}"),
    }
}

/// In-memory record store with versioned, conditional writes
#[derive(Default)]
pub struct MemoryStore {
    record: Mutex<Option<StoredRecord>>,
    revision: Mutex<u64>,
}

impl MemoryStore {
    pub fn current(&self) -> Option<DnsRecord> {
        self.record.lock().unwrap().as_ref().map(|s| s.record.clone())
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
        let mut stored = self.record.lock().unwrap();
        if stored.as_ref().map(|s| s.version.as_str()) != expected_version {
            return Err(StorageError::Conflict {
                namespace: "test".to_string(),
                name: "acorn-dns".to_string(),
                reason: "stale version".to_string(),
            });
        }

        let mut revision = self.revision.lock().unwrap();
        *revision += 1;
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
