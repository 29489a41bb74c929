// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! HTTP implementation of the [`Registrar`] contract.

use super::types::{
    DomainResponse, ErrorResponse, RecordRequest, RenewRequest, RenewResponse, ReservedDomain,
};
use super::Registrar;
use crate::constants::CONTROLLER_NAME;
use crate::dns_errors::RegistrarError;
use crate::metrics::record_registrar_call;
use async_trait::async_trait;
use reqwest::{Client as HttpClient, Method, StatusCode};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};
use url::Url;

const OP_RESERVE_DOMAIN: &str = "reserve_domain";
const OP_CREATE_RECORDS: &str = "create_records";
const OP_RENEW: &str = "renew";
const OP_DELETE_RECORD: &str = "delete_record";
const OP_PURGE_RECORDS: &str = "purge_records";

/// Registrar client speaking the registrar's JSON-over-HTTP API.
///
/// # Examples
///
/// ```rust,no_run
/// use acorndns::registrar::RegistrarClient;
///
/// let registrar = RegistrarClient::new();
/// ```
#[derive(Debug, Clone)]
pub struct RegistrarClient {
    client: Arc<HttpClient>,
}

impl Default for RegistrarClient {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistrarClient {
    /// Create a client with a default connection pool.
    #[must_use]
    pub fn new() -> Self {
        Self::with_http_client(HttpClient::new())
    }

    /// Create a client on top of a preconfigured `reqwest` client.
    #[must_use]
    pub fn with_http_client(client: HttpClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    /// Issue one request and return the raw response body.
    ///
    /// `token` is sent as a bearer credential when present. It is never logged.
    #[allow(clippy::too_many_arguments)]
    async fn request<T: Serialize + std::fmt::Debug + Sync>(
        &self,
        operation: &str,
        method: Method,
        endpoint: &str,
        path: &[&str],
        domain: &str,
        token: Option<&str>,
        body: Option<&T>,
    ) -> Result<String, RegistrarError> {
        let url = build_url(operation, endpoint, path)?;
        let start = Instant::now();

        info!(
            operation = %operation,
            method = %method,
            url = %url,
            body = ?body,
            "Registrar API request"
        );

        let mut request = self
            .client
            .request(method.clone(), url.clone())
            .header(reqwest::header::USER_AGENT, CONTROLLER_NAME);
        if let Some(token_value) = token {
            request = request.bearer_auth(token_value);
        }
        if let Some(body_data) = body {
            request = request.json(body_data);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                record_registrar_call(operation, "error", start.elapsed());
                error!(operation = %operation, url = %url, error = %e, "Registrar request failed");
                return Err(RegistrarError::ConnectionFailed {
                    operation: operation.to_string(),
                    endpoint: endpoint.to_string(),
                    reason: e.to_string(),
                });
            }
        };

        let status = response.status();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                record_registrar_call(operation, "error", start.elapsed());
                error!(
                    operation = %operation,
                    url = %url,
                    status = %status,
                    error = %e,
                    "Failed to read registrar response body"
                );
                return Err(RegistrarError::InvalidResponse {
                    operation: operation.to_string(),
                    endpoint: endpoint.to_string(),
                    reason: format!("failed to read response body: {e}"),
                });
            }
        };

        if !status.is_success() {
            record_registrar_call(operation, "error", start.elapsed());
            error!(
                operation = %operation,
                method = %method,
                url = %url,
                status = %status,
                error = %text,
                "Registrar API request failed"
            );
            return Err(error_from_response(
                operation, endpoint, domain, status, &text,
            ));
        }

        record_registrar_call(operation, "success", start.elapsed());
        debug!(
            operation = %operation,
            url = %url,
            status = %status,
            response_len = text.len(),
            "Registrar API request successful"
        );

        Ok(text)
    }
}

#[async_trait]
impl Registrar for RegistrarClient {
    async fn reserve_domain(&self, endpoint: &str) -> Result<ReservedDomain, RegistrarError> {
        let body = self
            .request(
                OP_RESERVE_DOMAIN,
                Method::POST,
                endpoint,
                &["domains"],
                "",
                None,
                Some(&serde_json::json!({})),
            )
            .await?;

        let response: DomainResponse =
            serde_json::from_str(&body).map_err(|e| RegistrarError::InvalidResponse {
                operation: OP_RESERVE_DOMAIN.to_string(),
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })?;

        let domain = response.name.trim().trim_end_matches('.').to_string();
        let token = response.token.trim().to_string();
        if domain.is_empty() || token.is_empty() {
            return Err(RegistrarError::InvalidResponse {
                operation: OP_RESERVE_DOMAIN.to_string(),
                endpoint: endpoint.to_string(),
                reason: "reservation returned an empty domain or token".to_string(),
            });
        }

        info!(domain = %domain, "Reserved managed domain");
        Ok(ReservedDomain { domain, token })
    }

    async fn create_records(
        &self,
        endpoint: &str,
        domain: &str,
        token: &str,
        records: &[RecordRequest],
    ) -> Result<(), RegistrarError> {
        for record in records {
            self.request(
                OP_CREATE_RECORDS,
                Method::POST,
                endpoint,
                &["domains", domain, "records"],
                domain,
                Some(token),
                Some(record),
            )
            .await?;
        }
        Ok(())
    }

    async fn renew(
        &self,
        endpoint: &str,
        domain: &str,
        token: &str,
        request: &RenewRequest,
    ) -> Result<RenewResponse, RegistrarError> {
        let body = self
            .request(
                OP_RENEW,
                Method::POST,
                endpoint,
                &["domains", domain, "renew"],
                domain,
                Some(token),
                Some(request),
            )
            .await?;

        if body.trim().is_empty() {
            return Ok(RenewResponse {
                name: domain.to_string(),
                out_of_sync_records: Vec::new(),
            });
        }

        serde_json::from_str(&body).map_err(|e| RegistrarError::InvalidResponse {
            operation: OP_RENEW.to_string(),
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })
    }

    async fn delete_record(
        &self,
        endpoint: &str,
        domain: &str,
        fqdn: &str,
        token: &str,
    ) -> Result<(), RegistrarError> {
        self.request(
            OP_DELETE_RECORD,
            Method::DELETE,
            endpoint,
            &["domains", domain, "records", fqdn],
            domain,
            Some(token),
            None::<&()>,
        )
        .await?;
        Ok(())
    }

    async fn purge_records(
        &self,
        endpoint: &str,
        domain: &str,
        token: &str,
    ) -> Result<(), RegistrarError> {
        self.request(
            OP_PURGE_RECORDS,
            Method::POST,
            endpoint,
            &["domains", domain, "purgerecords"],
            domain,
            Some(token),
            None::<&()>,
        )
        .await?;
        Ok(())
    }
}

/// Build a registrar URL from an endpoint and path segments.
///
/// Segments are percent-encoded. A bare `host:port` endpoint is treated as plain HTTP.
///
/// # Errors
///
/// Returns [`RegistrarError::ConnectionFailed`] if the endpoint is not a usable base URL.
pub(crate) fn build_url(
    operation: &str,
    endpoint: &str,
    segments: &[&str],
) -> Result<Url, RegistrarError> {
    let trimmed = endpoint.trim().trim_end_matches('/');
    let base = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    };

    let invalid = |reason: String| RegistrarError::ConnectionFailed {
        operation: operation.to_string(),
        endpoint: endpoint.to_string(),
        reason,
    };

    let mut url = Url::parse(&base).map_err(|e| invalid(format!("invalid endpoint: {e}")))?;
    url.path_segments_mut()
        .map_err(|()| invalid("endpoint cannot be used as a base URL".to_string()))?
        .pop_if_empty()
        .extend(segments);

    Ok(url)
}

/// Classify a non-success registrar response.
///
/// | HTTP Code | Error (domain-scoped call)                       |
/// |-----------|--------------------------------------------------|
/// | 401, 403  | `Unauthorized`                                   |
/// | 404       | `DomainNotFound` for renew and purge, otherwise `RequestFailed` |
/// | Other     | `RequestFailed`                                  |
///
/// Calls that are not scoped to a domain (reservation) always map to `RequestFailed`.
/// A 404 from a record-level call means the record is missing, not the domain.
pub(crate) fn error_from_response(
    operation: &str,
    endpoint: &str,
    domain: &str,
    status: StatusCode,
    body: &str,
) -> RegistrarError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .map(|e| e.message)
        .filter(|m| !m.is_empty())
        .or_else(|| Some(body.trim().to_string()).filter(|b| !b.is_empty()))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        });

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN if !domain.is_empty() => {
            RegistrarError::Unauthorized {
                endpoint: endpoint.to_string(),
                domain: domain.to_string(),
                message,
            }
        }
        StatusCode::NOT_FOUND if !domain.is_empty() && targets_domain(operation) => {
            RegistrarError::DomainNotFound {
                endpoint: endpoint.to_string(),
                domain: domain.to_string(),
            }
        }
        _ => RegistrarError::RequestFailed {
            operation: operation.to_string(),
            endpoint: endpoint.to_string(),
            status_code: status.as_u16(),
            message,
        },
    }
}

/// Whether `operation` addresses the domain itself rather than one of its records.
fn targets_domain(operation: &str) -> bool {
    matches!(operation, OP_RENEW | OP_PURGE_RECORDS)
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod client_tests;
