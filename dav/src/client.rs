// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! `WebDAV` client for collection synchronization.

use std::sync::Arc;

use reqwest::Method;

use crate::config::DavConfig;
use crate::error::DavError;
use crate::http::{HttpClient, Precondition};
use crate::request::{
    CalendarQueryRequest, MultiGetKind, MultiGetRequest, Prop, PropFindRequest,
    SyncCollectionRequest,
};
use crate::response::MultiStatusResponse;
use crate::types::{CollectionInfo, FetchedResource, Href, Member, PutResult, SyncCollectionPage};

const XML_CONTENT_TYPE: &str = "application/xml; charset=utf-8";

/// `WebDAV` client covering the requests a collection sync needs.
///
/// # Example
///
/// ```ignore
/// use davsync_dav::{AuthMethod, DavClient, DavConfig, Href};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = DavConfig::new("https://dav.example.com").with_auth(AuthMethod::Basic {
///     username: "user".to_string(),
///     password: "pass".to_string(),
/// });
///
/// let client = DavClient::new(config)?;
/// let info = client.collection_info(&Href::from("/dav/calendars/user/work/")).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct DavClient {
    http: Arc<HttpClient>,
    config: DavConfig,
}

impl DavClient {
    /// Creates a new `WebDAV` client.
    ///
    /// # Errors
    ///
    /// Returns an error if HTTP client initialization fails.
    pub fn new(config: DavConfig) -> Result<Self, DavError> {
        if config.base_url.is_empty() {
            return Err(DavError::Config("base_url must not be empty".to_string()));
        }
        let http = HttpClient::new(config.clone())?;
        Ok(Self {
            http: Arc::new(http),
            config,
        })
    }

    /// Reads collection metadata with a depth-0 PROPFIND.
    ///
    /// # Errors
    ///
    /// Returns an error if the PROPFIND fails.
    pub async fn collection_info(&self, collection: &Href) -> Result<CollectionInfo, DavError> {
        let mut propfind = PropFindRequest::new();
        propfind
            .add_property(Prop::DisplayName)
            .add_property(Prop::GetCTag)
            .add_property(Prop::SyncToken)
            .add_property(Prop::SupportedReportSet);

        let multistatus = self.propfind(collection, &propfind, "0").await?;
        Ok(multistatus.into_collection_info())
    }

    /// Lists every member of a collection with its `ETag`.
    ///
    /// # Errors
    ///
    /// Returns an error if the PROPFIND fails.
    pub async fn list_members(&self, collection: &Href) -> Result<Vec<Member>, DavError> {
        let mut propfind = PropFindRequest::new();
        propfind
            .add_property(Prop::ResourceType)
            .add_property(Prop::GetETag);

        let multistatus = self.propfind(collection, &propfind, "1").await?;
        Ok(multistatus.into_members(collection))
    }

    /// Lists the members matching a calendar query, with their `ETag`s only.
    ///
    /// # Errors
    ///
    /// Returns an error if the REPORT fails.
    pub async fn query_members(
        &self,
        collection: &Href,
        request: &CalendarQueryRequest,
    ) -> Result<Vec<Member>, DavError> {
        let multistatus = self.report(collection, request.build()?, "1").await?;
        Ok(multistatus.into_members(collection))
    }

    /// Requests changes since `sync_token` with an RFC 6578 `sync-collection`
    /// report. `None` asks for an initial listing.
    ///
    /// # Errors
    ///
    /// Returns [`DavError::TokenInvalid`] when the server rejects the token.
    pub async fn sync_collection(
        &self,
        collection: &Href,
        sync_token: Option<&str>,
    ) -> Result<SyncCollectionPage, DavError> {
        let request = SyncCollectionRequest::new(sync_token.map(str::to_string));
        let multistatus = self.report(collection, request.build()?, "0").await?;
        let page = multistatus.into_sync_page(collection);
        tracing::debug!(
            href = %collection,
            changed = page.changed.len(),
            removed = page.removed.len(),
            truncated = page.truncated,
            "sync-collection page"
        );
        Ok(page)
    }

    /// Retrieves several resources with a single multiget report.
    ///
    /// # Errors
    ///
    /// Returns an error if the REPORT fails.
    pub async fn multiget(
        &self,
        collection: &Href,
        kind: MultiGetKind,
        hrefs: &[Href],
    ) -> Result<Vec<FetchedResource>, DavError> {
        if hrefs.is_empty() {
            return Ok(Vec::new());
        }

        let mut multiget = MultiGetRequest::new(kind);
        for href in hrefs {
            multiget.add_href(href.as_str().to_string());
        }

        let multistatus = self.report(collection, multiget.build()?, "1").await?;
        Ok(multistatus.into_resources())
    }

    /// Uploads a resource body.
    ///
    /// # Errors
    ///
    /// Returns an error if the PUT fails, including precondition failures.
    pub async fn put(
        &self,
        href: &Href,
        body: Vec<u8>,
        content_type: &str,
        precondition: &Precondition,
    ) -> Result<PutResult, DavError> {
        let url = self.full_url(href.as_str());
        let req = self
            .http
            .build_request(Method::PUT, &url)
            .header("Content-Type", content_type)
            .body(body);

        let resp = self
            .http
            .execute(HttpClient::precondition(req, precondition))
            .await?;

        Ok(PutResult {
            etag: HttpClient::extract_etag(&resp),
            schedule_tag: HttpClient::extract_schedule_tag(&resp),
        })
    }

    /// Deletes a resource.
    ///
    /// # Errors
    ///
    /// Returns an error if the DELETE fails.
    pub async fn delete(&self, href: &Href, precondition: &Precondition) -> Result<(), DavError> {
        let url = self.full_url(href.as_str());
        let req = self.http.build_request(Method::DELETE, &url);
        self.http
            .execute(HttpClient::precondition(req, precondition))
            .await?;
        Ok(())
    }

    /// Runs a PROPFIND on `href` and parses the multistatus body.
    pub(crate) async fn propfind(
        &self,
        href: &Href,
        propfind: &PropFindRequest,
        depth: &str,
    ) -> Result<MultiStatusResponse, DavError> {
        let url = self.full_url(href.as_str());
        let resp = self
            .http
            .execute(
                self.http
                    .build_dav_request("PROPFIND", &url)?
                    .header("Content-Type", XML_CONTENT_TYPE)
                    .header("Depth", depth)
                    .body(propfind.build()?),
            )
            .await?;

        let xml = resp.text().await?;
        MultiStatusResponse::from_xml(&xml)
    }

    async fn report(
        &self,
        href: &Href,
        body: String,
        depth: &str,
    ) -> Result<MultiStatusResponse, DavError> {
        let url = self.full_url(href.as_str());
        let resp = self
            .http
            .execute(
                self.http
                    .build_dav_request("REPORT", &url)?
                    .header("Content-Type", XML_CONTENT_TYPE)
                    .header("Depth", depth)
                    .body(body),
            )
            .await?;

        let xml = resp.text().await?;
        MultiStatusResponse::from_xml(&xml)
    }

    /// Builds full URL from href.
    ///
    /// Absolute hrefs returned by some servers are used unchanged.
    fn full_url(&self, href: &str) -> String {
        if href.starts_with("http://") || href.starts_with("https://") {
            href.to_string()
        } else {
            format!("{}{}", self.config.base_url.trim_end_matches('/'), href)
        }
    }
}
