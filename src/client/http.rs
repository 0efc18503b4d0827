//! HTTP implementation of the notification API

use super::{ApiError, CsrfPolicy, ListQuery, NotificationApi};
use crate::config::{CsrfConfig, ServerConfig};
use crate::model::{CountResponse, ListResponse, MarkAllResponse, ToggleResponse};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, COOKIE, REFERER};
use reqwest::{Client, Method, Response, Url};
use serde::de::DeserializeOwned;

/// reqwest client for the site's notification endpoints
pub struct HttpNotificationClient {
    client: Client,
    base: Url,
    server: ServerConfig,
    csrf: CsrfPolicy,
    cookie: Option<String>,
}

impl HttpNotificationClient {
    /// Create a client for the configured site
    pub fn new(server: ServerConfig, csrf: &CsrfConfig) -> Result<Self, ApiError> {
        let base = Url::parse(&server.base_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", server.base_url, e)))?;

        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(server.request_timeout_ms))
            .build()?;

        Ok(Self {
            client,
            csrf: CsrfPolicy::from_config(base.clone(), csrf),
            cookie: csrf.cookie.clone(),
            base,
            server,
        })
    }

    fn resolve(&self, endpoint: &str) -> Result<Url, ApiError> {
        self.base
            .join(endpoint)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", endpoint, e)))
    }

    fn toggle_url(&self, key: &str) -> Result<Url, ApiError> {
        let path = format!(
            "{}/{}/",
            self.server.toggle_url.trim_end_matches('/'),
            urlencoding::encode(key)
        );
        self.resolve(&path)
    }

    /// Send a request and decode the JSON body
    async fn send<T: DeserializeOwned>(&self, method: Method, url: Url) -> Result<T, ApiError> {
        let mut request = self
            .client
            .request(method.clone(), url.clone())
            .header(ACCEPT, "application/json")
            .header("X-Requested-With", "XMLHttpRequest");

        // The session cookie holds the CSRF token too
        match &self.cookie {
            Some(cookie) if self.csrf.is_same_origin(url.as_str()) => {
                request = request.header(COOKIE, cookie.as_str());
            }
            Some(_) => {
                tracing::debug!(url = %url, "Cross-origin request, session cookie withheld");
            }
            None => {}
        }

        if let Some((name, token)) = self.csrf.header_for(&method, url.as_str()) {
            // Django's CSRF check on HTTPS also looks at the referer
            request = request
                .header(name, token)
                .header(REFERER, self.base.as_str());
        }

        tracing::trace!(method = %method, url = %url, "Sending notification request");

        let response = request.send().await.map_err(classify)?;
        decode(response).await
    }
}

fn classify(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::Timeout
    } else if e.is_connect() {
        ApiError::Unavailable
    } else {
        ApiError::Request(e)
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(ApiError::Status {
            status: status.as_u16(),
            message: text,
        });
    }

    let body = response.text().await.map_err(classify)?;
    serde_json::from_str(&body).map_err(|e| ApiError::Parse(e.to_string()))
}

#[async_trait]
impl NotificationApi for HttpNotificationClient {
    async fn unread_count(&self, max: u32) -> Result<CountResponse, ApiError> {
        let mut url = self.resolve(&self.server.count_url)?;
        url.query_pairs_mut().append_pair("max", &max.to_string());
        self.send(Method::GET, url).await
    }

    async fn list(&self, query: ListQuery) -> Result<ListResponse, ApiError> {
        let mut url = self.resolve(&self.server.list_url)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("max", &query.max.to_string())
                .append_pair("offset", &query.offset.to_string());
            if query.mark_as_read {
                pairs.append_pair("mark_as_read", "1");
            }
        }
        self.send(Method::GET, url).await
    }

    async fn toggle(&self, key: &str) -> Result<ToggleResponse, ApiError> {
        let mut url = self.toggle_url(key)?;
        url.query_pairs_mut().append_pair("json", "1");
        self.send(Method::POST, url).await
    }

    async fn mark_all_read(&self) -> Result<MarkAllResponse, ApiError> {
        let mut url = self.resolve(&self.server.mark_all_url)?;
        url.query_pairs_mut().append_pair("json", "1");
        self.send(Method::POST, url).await
    }
}
