// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for lease maintenance.

#[cfg(test)]
mod tests {
    use crate::config::{ConfigSnapshot, DnsMode};
    use crate::dns_errors::{ReconcileError, RegistrarError, StorageError};
    use crate::reconcilers::dns::{reconcile_dns, ReconcileOutcome};
    use crate::reconcilers::renewal::{delete_records, renew_domain, RenewOutcome};
    use crate::reconcilers::test_doubles::{
        Call, FakeRegistrar, GatedRenewRegistrar, MemoryStore, ENDPOINT,
    };
    use crate::record::DnsRecord;
    use crate::registrar::{FqdnTypePair, RecordRequest, RecordType};

    fn held() -> DnsRecord {
        DnsRecord::holding(DnsMode::Enabled, "abc.test", "tok")
    }

    fn record(name: &str, record_type: RecordType) -> RecordRequest {
        RecordRequest {
            name: name.to_string(),
            record_type,
            values: vec!["10.0.0.1".to_string()],
        }
    }

    #[tokio::test]
    async fn test_renew_nothing_held() {
        let registrar = FakeRegistrar::new();
        let store = MemoryStore::with(DnsRecord::cleared(DnsMode::Auto));

        let outcome = renew_domain(&registrar, &store, ENDPOINT, &[]).await.unwrap();

        assert_eq!(outcome, RenewOutcome::NothingHeld);
        assert!(registrar.calls().is_empty());
    }

    #[tokio::test]
    async fn test_renew_without_record() {
        let registrar = FakeRegistrar::new();
        let store = MemoryStore::empty();

        let outcome = renew_domain(&registrar, &store, ENDPOINT, &[]).await.unwrap();

        assert_eq!(outcome, RenewOutcome::NothingHeld);
    }

    #[tokio::test]
    async fn test_renew_sends_crate_version() {
        let registrar = FakeRegistrar::new();
        let store = MemoryStore::with(held());

        let outcome = renew_domain(&registrar, &store, ENDPOINT, &[]).await.unwrap();

        assert_eq!(outcome, RenewOutcome::Renewed { resynced: 0 });
        assert_eq!(
            registrar.calls(),
            vec![Call::Renew {
                domain: "abc.test".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            }]
        );
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_renew_republishes_matching_out_of_sync_records() {
        let registrar = FakeRegistrar::new();
        *registrar.out_of_sync.lock().unwrap() = vec![
            FqdnTypePair {
                fqdn: "App.abc.test.".to_string(),
                record_type: RecordType::A,
            },
            FqdnTypePair {
                fqdn: "db.abc.test".to_string(),
                record_type: RecordType::Aaaa,
            },
            FqdnTypePair {
                fqdn: "unknown.abc.test".to_string(),
                record_type: RecordType::A,
            },
        ];
        let store = MemoryStore::with(held());
        let records = [
            record("app.abc.test", RecordType::A),
            record("db.abc.test", RecordType::A),
            record("web.abc.test", RecordType::A),
        ];

        let outcome = renew_domain(&registrar, &store, ENDPOINT, &records)
            .await
            .unwrap();

        assert_eq!(outcome, RenewOutcome::Renewed { resynced: 1 });
        assert_eq!(
            registrar.calls()[1],
            Call::CreateRecords {
                domain: "abc.test".to_string(),
                names: vec!["app.abc.test".to_string()],
            }
        );
    }

    #[tokio::test]
    async fn test_renew_without_records_only_extends_lease() {
        let registrar = FakeRegistrar::new();
        *registrar.out_of_sync.lock().unwrap() = vec![FqdnTypePair {
            fqdn: "app.abc.test".to_string(),
            record_type: RecordType::A,
        }];
        let store = MemoryStore::with(held());

        let outcome = renew_domain(&registrar, &store, ENDPOINT, &[]).await.unwrap();

        assert_eq!(outcome, RenewOutcome::Renewed { resynced: 0 });
        assert_eq!(registrar.calls().len(), 1);
        assert!(matches!(registrar.calls()[0], Call::Renew { .. }));
    }

    #[tokio::test]
    async fn test_renew_lost_domain_clears_record() {
        let registrar = FakeRegistrar::failing(RegistrarError::DomainNotFound {
            endpoint: ENDPOINT.to_string(),
            domain: "abc.test".to_string(),
        });
        let store = MemoryStore::with(DnsRecord::holding(DnsMode::Auto, "abc.test", "tok"));

        let outcome = renew_domain(&registrar, &store, ENDPOINT, &[]).await.unwrap();

        assert_eq!(outcome, RenewOutcome::DomainLost);
        assert_eq!(store.current(), Some(DnsRecord::cleared(DnsMode::Auto)));
    }

    #[tokio::test]
    async fn test_renew_rejected_token_clears_record() {
        let registrar = FakeRegistrar::failing(RegistrarError::Unauthorized {
            endpoint: ENDPOINT.to_string(),
            domain: "abc.test".to_string(),
            message: "token does not match".to_string(),
        });
        let store = MemoryStore::with(held());

        let outcome = renew_domain(&registrar, &store, ENDPOINT, &[]).await.unwrap();

        assert_eq!(outcome, RenewOutcome::DomainLost);
        assert!(!store.current().unwrap().holds_domain());
    }

    #[tokio::test]
    async fn test_renew_transient_failure_keeps_record() {
        let registrar = FakeRegistrar::failing(RegistrarError::RequestFailed {
            operation: "renew".to_string(),
            endpoint: ENDPOINT.to_string(),
            status_code: 502,
            message: "bad gateway".to_string(),
        });
        let store = MemoryStore::with(held());

        let result = renew_domain(&registrar, &store, ENDPOINT, &[]).await;

        assert!(matches!(result, Err(ReconcileError::Registrar(_))));
        assert_eq!(store.current(), Some(held()));
    }

    #[tokio::test]
    async fn test_lost_domain_does_not_clear_record_reconciled_during_renew() {
        let registrar = GatedRenewRegistrar::failing_renew(RegistrarError::DomainNotFound {
            endpoint: ENDPOINT.to_string(),
            domain: "old.test".to_string(),
        });
        let store = MemoryStore::with(DnsRecord::holding(DnsMode::Enabled, "old.test", "tok-old"));
        let snapshot = |mode| ConfigSnapshot {
            mode,
            cluster_domains: Vec::new(),
            endpoint: ENDPOINT.to_string(),
        };

        // Renewal reads old.test and waits on the registrar while the mode is
        // switched off and on again, which reserves a new domain.
        let (renewed, ()) = tokio::join!(
            renew_domain(&registrar, &store, ENDPOINT, &[]),
            async {
                reconcile_dns(&registrar, &store, &snapshot(DnsMode::Disabled))
                    .await
                    .unwrap();
                reconcile_dns(&registrar, &store, &snapshot(DnsMode::Enabled))
                    .await
                    .unwrap();
                registrar.open();
            }
        );

        assert!(matches!(
            renewed,
            Err(ReconcileError::Storage(StorageError::Conflict { .. }))
        ));
        assert_eq!(
            store.current(),
            Some(DnsRecord::holding(DnsMode::Enabled, "domain-1.test", "token-1"))
        );

        let next = reconcile_dns(&registrar, &store, &snapshot(DnsMode::Enabled))
            .await
            .unwrap();
        assert!(matches!(next, ReconcileOutcome::Unchanged(_)));
        assert_eq!(registrar.inner.reserve_count(), 1);
    }

    #[test]
    fn test_renew_outcome_labels() {
        assert_eq!(RenewOutcome::NothingHeld.as_str(), "nothing_held");
        assert_eq!(RenewOutcome::Renewed { resynced: 3 }.as_str(), "renewed");
        assert_eq!(RenewOutcome::DomainLost.as_str(), "domain_lost");
    }

    #[tokio::test]
    async fn test_delete_records() {
        let registrar = FakeRegistrar::new();
        let fqdns = vec!["a.abc.test".to_string(), "b.abc.test".to_string()];

        let deleted = delete_records(&registrar, ENDPOINT, &held(), &fqdns)
            .await
            .unwrap();

        assert_eq!(deleted, 2);
        assert_eq!(
            registrar.calls(),
            vec![
                Call::DeleteRecord {
                    domain: "abc.test".to_string(),
                    fqdn: "a.abc.test".to_string(),
                },
                Call::DeleteRecord {
                    domain: "abc.test".to_string(),
                    fqdn: "b.abc.test".to_string(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_delete_records_nothing_held() {
        let registrar = FakeRegistrar::new();

        let deleted = delete_records(
            &registrar,
            ENDPOINT,
            &DnsRecord::cleared(DnsMode::Disabled),
            &["a.abc.test".to_string()],
        )
        .await
        .unwrap();

        assert_eq!(deleted, 0);
        assert!(registrar.calls().is_empty());
    }
}
