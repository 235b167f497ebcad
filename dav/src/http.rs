// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! HTTP client wrapper with authentication, status mapping and `ETag` handling.

use std::time::Duration;

use jiff::Timestamp;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};

use crate::config::DavConfig;
use crate::error::DavError;
use crate::types::ETag;

/// Conditional request header to attach to a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Precondition {
    /// Unconditional.
    None,
    /// `If-Match: <etag>`.
    IfMatch(ETag),
    /// `If-Schedule-Tag-Match: <schedule-tag>` (RFC 6638).
    IfScheduleTagMatch(ETag),
    /// `If-None-Match: *`, the target must not exist yet.
    IfNoneMatchAny,
}

/// HTTP client for `WebDAV` operations.
#[derive(Debug)]
pub struct HttpClient {
    client: Client,
    config: DavConfig,
}

impl HttpClient {
    /// Creates a new HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error if HTTP client creation fails.
    pub fn new(config: DavConfig) -> Result<Self, DavError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(&config.user_agent)
            .build()?;
        Ok(Self { client, config })
    }

    /// Builds a request with authentication headers.
    pub fn build_request(&self, method: Method, url: &str) -> RequestBuilder {
        self.config.auth.apply(self.client.request(method, url))
    }

    /// Builds a request for a `WebDAV` extension method such as PROPFIND.
    ///
    /// # Errors
    ///
    /// Returns an error if the method name is invalid.
    pub fn build_dav_request(&self, method: &str, url: &str) -> Result<RequestBuilder, DavError> {
        let method = Method::from_bytes(method.as_bytes())
            .map_err(|e| DavError::Http(format!("Invalid method: {e}")))?;
        Ok(self.build_request(method, url))
    }

    /// Executes a request and maps error statuses to [`DavError`].
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or returns an error status code.
    pub async fn execute(&self, req: RequestBuilder) -> Result<Response, DavError> {
        let resp = req.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let url = resp.url().to_string();
        let retry_after = parse_retry_after(resp.headers(), Timestamp::now());
        let body = resp
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response".to_string());

        tracing::debug!(%url, status = status.as_u16(), "request failed");
        Err(map_status(status, url, retry_after, &body))
    }

    /// Adds the precondition header to a write request.
    pub fn precondition(req: RequestBuilder, precondition: &Precondition) -> RequestBuilder {
        match precondition {
            Precondition::None => req,
            Precondition::IfMatch(etag) => req.header("If-Match", etag.as_str()),
            Precondition::IfScheduleTagMatch(tag) => {
                req.header("If-Schedule-Tag-Match", tag.as_str())
            }
            Precondition::IfNoneMatchAny => req.header("If-None-Match", "*"),
        }
    }

    /// Extracts a strong `ETag` from response headers.
    ///
    /// Weak tags are dropped since they can't be used in `If-Match`.
    pub fn extract_etag(resp: &Response) -> Option<ETag> {
        header_tag(resp.headers(), "ETag").filter(|tag| !tag.is_weak())
    }

    /// Extracts the `Schedule-Tag` from response headers.
    pub fn extract_schedule_tag(resp: &Response) -> Option<ETag> {
        header_tag(resp.headers(), "Schedule-Tag")
    }
}

fn header_tag(headers: &HeaderMap, name: &str) -> Option<ETag> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| ETag::new(s.to_string()))
}

/// Maps a non-success response to a [`DavError`].
///
/// Bodies are inspected for the RFC 4918 `need-privileges` and RFC 6578
/// `valid-sync-token` precondition elements.
pub(crate) fn map_status(
    status: StatusCode,
    url: String,
    retry_after: Option<Duration>,
    body: &str,
) -> DavError {
    match status {
        StatusCode::UNAUTHORIZED => DavError::Auth(url),
        StatusCode::FORBIDDEN | StatusCode::CONFLICT if body.contains("valid-sync-token") => {
            DavError::TokenInvalid
        }
        StatusCode::FORBIDDEN => DavError::Forbidden {
            url,
            need_privileges: body.contains("need-privileges"),
        },
        StatusCode::NOT_FOUND => DavError::NotFound(url),
        StatusCode::GONE => DavError::Gone(url),
        StatusCode::CONFLICT => DavError::Conflict(url),
        StatusCode::PRECONDITION_FAILED => DavError::PreconditionFailed(url),
        StatusCode::SERVICE_UNAVAILABLE => DavError::ServiceUnavailable { retry_after },
        s if s.is_server_error() => DavError::Server { status: s.as_u16() },
        s => DavError::Status {
            status: s.as_u16(),
            message: body.chars().take(200).collect(),
        },
    }
}

/// Parses `Retry-After` as delta-seconds or an HTTP date relative to `now`.
pub(crate) fn parse_retry_after(headers: &HeaderMap, now: Timestamp) -> Option<Duration> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }

    let at = jiff::fmt::rfc2822::parse(value).ok()?.timestamp();
    let secs = at.as_second().saturating_sub(now.as_second()).max(0);
    Some(Duration::from_secs(secs.unsigned_abs()))
}
