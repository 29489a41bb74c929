// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Label, annotation and data key constants for the DNS `Secret`.

// ============================================================================
// Kubernetes Standard Labels
// https://kubernetes.io/docs/concepts/overview/working-with-objects/common-labels/
// ============================================================================

/// Standard label for the tool being used to manage the operation of an application
pub const K8S_MANAGED_BY: &str = "app.kubernetes.io/managed-by";

/// Standard label for the name of a higher-level application this one is part of
pub const K8S_PART_OF: &str = "app.kubernetes.io/part-of";

/// Value for `app.kubernetes.io/part-of`
pub const PART_OF_ACORN: &str = "acorn";

/// Value for `app.kubernetes.io/managed-by`
pub const MANAGED_BY_DNS_CONTROLLER: &str = "acorn-dns-controller";

// ============================================================================
// Acorn DNS Annotations
// ============================================================================

/// Annotation recording which mode produced the current `Secret` content
pub const ACORN_DNS_STATE_ANNOTATION: &str = "acorn.io/dns-state";

// ============================================================================
// Secret Data Keys
// ============================================================================

/// Secret data key holding the reserved domain
pub const DATA_KEY_DOMAIN: &str = "domain";

/// Secret data key holding the registrar token
pub const DATA_KEY_TOKEN: &str = "token";
