// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use reqwest::RequestBuilder;

/// Credentials sent with every request to the server.
#[derive(Clone, Default, serde::Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AuthMethod {
    /// Anonymous access.
    #[default]
    None,
    /// HTTP Basic.
    Basic {
        /// Account name.
        username: String,
        /// Sent in clear over the TLS connection.
        password: String,
    },
    /// OAuth access token.
    Bearer {
        /// The token, without the `Bearer ` prefix.
        token: String,
    },
}

impl AuthMethod {
    pub(crate) fn apply(&self, req: RequestBuilder) -> RequestBuilder {
        match self {
            Self::None => req,
            Self::Basic { username, password } => req.basic_auth(username, Some(password)),
            Self::Bearer { token } => req.bearer_auth(token),
        }
    }
}

// Secrets stay out of logs and `{:?}` output.
impl std::fmt::Debug for AuthMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .finish_non_exhaustive(),
            Self::Bearer { .. } => f.debug_struct("Bearer").finish_non_exhaustive(),
        }
    }
}

/// Connection settings for the server hosting the synchronized collections.
///
/// Collection and principal hrefs are resolved against `base_url`, so one
/// config serves every calendar and address book of an account.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct DavConfig {
    /// Scheme and authority, e.g. `https://dav.example.com`.
    pub base_url: String,
    /// Credentials, anonymous if omitted.
    #[serde(default)]
    pub auth: AuthMethod,
    /// Per-request timeout; a multiget of a full batch must fit in it.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// `User-Agent` header value.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

const fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!("davsync-dav/", env!("CARGO_PKG_VERSION")).to_string()
}

impl DavConfig {
    /// Unauthenticated settings for `base_url` with default timeout.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Replaces the credentials.
    #[must_use]
    pub fn with_auth(mut self, auth: AuthMethod) -> Self {
        self.auth = auth;
        self
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for DavConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            auth: AuthMethod::default(),
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}
