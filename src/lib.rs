// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # acorndns - Managed DNS domain controller for Acorn
//!
//! An Acorn installation can obtain a managed domain from an external DNS registrar,
//! so that workloads get public names without the cluster owning a domain. This crate
//! keeps that managed domain in line with the installation's configuration.
//!
//! ## Overview
//!
//! The desired behavior is a tri-state mode read from the installation configuration:
//!
//! - **enabled** - Always hold a managed domain
//! - **auto** - Hold one only while the cluster brings no domain of its own
//! - **disabled** - Hold none; release the current one
//!
//! Each reconciliation pass derives the registrar calls (reserve, purge) from the
//! desired mode and the persisted DNS record, issues them, and only then persists the
//! next record.
//!
//! ## Modules
//!
//! - [`config`] - Configuration snapshot parsing
//! - [`record`] - Persisted DNS record and its `Secret` store
//! - [`registrar`] - Registrar contract and HTTP client
//! - [`reconcilers`] - Decision engine, reconciliation and lease renewal
//! - [`context`] - Shared controller context
//! - [`metrics`] - Prometheus metrics
//!
//! ## Example
//!
//! ```rust,no_run
//! use acorndns::config::{parse_config, DnsMode};
//! use acorndns::reconcilers::decide;
//!
//! let snapshot = parse_config(r#"{"acornDNS": "enabled"}"#).unwrap();
//! assert_eq!(snapshot.mode, DnsMode::Enabled);
//!
//! // No record yet: a managed domain must be reserved
//! let decision = decide(&snapshot, None);
//! assert_eq!(decision.actions.len(), 1);
//! ```

pub mod config;
pub mod constants;
pub mod context;
pub mod dns_errors;
pub mod labels;
pub mod metrics;
pub mod reconcilers;
pub mod record;
pub mod registrar;
