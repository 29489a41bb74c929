// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the acorn-dns controller.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// Installation Identity Constants
// ============================================================================

/// Namespace holding the configuration `ConfigMap` and the DNS `Secret`
pub const SYSTEM_NAMESPACE: &str = "acorn-system";

/// Name of the `ConfigMap` carrying the installation configuration
pub const CONFIG_MAP_NAME: &str = "acorn-config";

/// Data key inside the configuration `ConfigMap` holding the JSON payload
pub const CONFIG_MAP_DATA_KEY: &str = "config";

/// Name of the `Secret` persisting the managed domain and its token
pub const DNS_SECRET_NAME: &str = "acorn-dns";

/// Field manager / user agent used by this controller
pub const CONTROLLER_NAME: &str = "acorn-dns-controller";

// ============================================================================
// Configuration Payload Keys
// ============================================================================

/// Key selecting the DNS mode (`enabled`, `auto`, `disabled`)
pub const CONFIG_KEY_DNS_MODE: &str = "acornDNS";

/// Key listing domains already owned by the cluster
pub const CONFIG_KEY_CLUSTER_DOMAINS: &str = "clusterDomains";

/// Key overriding the registrar endpoint
pub const CONFIG_KEY_DNS_ENDPOINT: &str = "acornDNSEndpoint";

/// Registrar endpoint used when the configuration does not name one
pub const DEFAULT_DNS_ENDPOINT: &str = "https://oss-acorn.io/v1";

// ============================================================================
// Controller Timing Constants
// ============================================================================

/// Requeue duration for controller errors (30 seconds)
pub const ERROR_REQUEUE_DURATION_SECS: u64 = 30;

/// Periodic resync after a successful reconciliation (5 minutes)
pub const RESYNC_REQUEUE_DURATION_SECS: u64 = 300;

/// Default interval between domain lease renewals (1 hour)
pub const DEFAULT_RENEW_INTERVAL_SECS: u64 = 3600;

// ============================================================================
// Runtime Constants
// ============================================================================

/// Number of worker threads for Tokio runtime
pub const TOKIO_WORKER_THREADS: usize = 4;

// ============================================================================
// Metrics Server Constants
// ============================================================================

/// Port for Prometheus metrics HTTP server
pub const METRICS_SERVER_PORT: u16 = 8080;

/// Path for Prometheus metrics endpoint
pub const METRICS_SERVER_PATH: &str = "/metrics";

/// Bind address for metrics HTTP server
pub const METRICS_SERVER_BIND_ADDRESS: &str = "0.0.0.0";
