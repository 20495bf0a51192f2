//! Authenticated API client.
//!
//! Centralizes bearer attachment and the refresh-and-retry protocol so that
//! feature code never handles token expiry itself. The access token is read
//! from the token store at send time, so a token rotated by a concurrent
//! refresh is picked up by the very next request.

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::errors::{ApiError, ApiResult};
use crate::jwt;
use crate::models::user::RefreshResponse;
use crate::notify::{Notice, NoticeBus};
use crate::store::TokenStore;

const SESSION_EXPIRED_NOTICE: &str = "Session expired. Please login again.";

#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: reqwest::Client,
    base_url: String,
    store: Arc<dyn TokenStore>,
    notices: Option<NoticeBus>,
    /// Funnels concurrent refresh attempts through a single in-flight
    /// exchange; waiters re-check the store and reuse a rotated token.
    refresh_lock: tokio::sync::Mutex<()>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, store: Arc<dyn TokenStore>) -> ApiResult<Self> {
        Self::build(config, store, None)
    }

    pub fn with_notice_bus(
        config: &ClientConfig,
        store: Arc<dyn TokenStore>,
        notices: NoticeBus,
    ) -> ApiResult<Self> {
        Self::build(config, store, Some(notices))
    }

    fn build(
        config: &ClientConfig,
        store: Arc<dyn TokenStore>,
        notices: Option<NoticeBus>,
    ) -> ApiResult<Self> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                http,
                base_url: config.base_url.trim_end_matches('/').to_string(),
                store,
                notices,
                refresh_lock: tokio::sync::Mutex::new(()),
            }),
        })
    }

    pub fn store(&self) -> &dyn TokenStore {
        self.inner.store.as_ref()
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.request(Method::GET, path, None, None).await
    }

    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> ApiResult<T> {
        self.request(Method::GET, path, Some(params), None).await
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> ApiResult<T> {
        let body = encode_body(body)?;
        self.request(Method::POST, path, None, Some(body)).await
    }

    pub async fn put<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> ApiResult<T> {
        let body = encode_body(body)?;
        self.request(Method::PUT, path, None, Some(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.request(Method::DELETE, path, None, None).await
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: Option<&[(&str, String)]>,
        body: Option<Value>,
    ) -> ApiResult<T> {
        let token = self.inner.store.access_token().await?;
        if let Some(current) = token.as_deref() {
            if jwt::is_expired(current) {
                tracing::debug!(path, "access token past expiry, a refresh round is likely");
            }
        }

        let response = self
            .send(method.clone(), path, query, body.as_ref(), token.as_deref())
            .await?;

        // A 401 on a request that carried no credential is a plain
        // authentication failure (e.g. bad login), not an expired token.
        if response.status() != StatusCode::UNAUTHORIZED || token.is_none() {
            return self.finish(response).await;
        }

        // At most one retry per logical request: either reuse a token a
        // concurrent caller already rotated, or perform the exchange here.
        let fresh = self.refresh_access_token(token.as_deref()).await?;

        let retry = self
            .send(method, path, query, body.as_ref(), Some(&fresh))
            .await?;

        if retry.status() == StatusCode::UNAUTHORIZED {
            // The refreshed token was rejected too. Surface the failure
            // without another refresh round.
            let status = retry.status();
            let bytes = retry.bytes().await?;
            let err = ApiError::from_response(status, &bytes);
            self.publish_error(&err);
            return Err(err);
        }

        self.finish(retry).await
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: Option<&[(&str, String)]>,
        body: Option<&Value>,
        token: Option<&str>,
    ) -> ApiResult<reqwest::Response> {
        let mut request = self.inner.http.request(method, self.url(path));
        if let Some(params) = query {
            request = request.query(params);
        }
        if let Some(json) = body {
            request = request.json(json);
        }
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        match request.send().await {
            Ok(response) => Ok(response),
            Err(err) => {
                let err = ApiError::from(err);
                self.publish_error(&err);
                Err(err)
            }
        }
    }

    async fn finish<T: DeserializeOwned>(&self, response: reqwest::Response) -> ApiResult<T> {
        let status = response.status();
        let bytes = response.bytes().await?;

        if status.is_success() {
            let mut deserializer = serde_json::Deserializer::from_slice(&bytes);
            serde_path_to_error::deserialize(&mut deserializer)
                .map_err(|err| ApiError::decode(err.to_string()))
        } else {
            let err = ApiError::from_response(status, &bytes);
            self.publish_error(&err);
            Err(err)
        }
    }

    /// Obtain a usable access token after an authorization failure.
    ///
    /// `stale` is the token the failing request carried. Holding the lock,
    /// the store is re-read first: if the stored token already differs,
    /// another request completed the exchange while we waited and its result
    /// is shared. Any failure on the exchange itself forces a logout.
    async fn refresh_access_token(&self, stale: Option<&str>) -> ApiResult<String> {
        let _guard = self.inner.refresh_lock.lock().await;

        if let Some(current) = self.inner.store.access_token().await? {
            if stale != Some(current.as_str()) {
                tracing::debug!("reusing access token rotated by a concurrent request");
                return Ok(current);
            }
        }

        let refresh = match self.inner.store.refresh_token().await? {
            Some(refresh) => refresh,
            None => {
                tracing::warn!("authorization failed with no refresh token on hand");
                return Err(self.expire_session().await);
            }
        };

        // Dedicated exchange, outside the authenticated request path, so a
        // rejected refresh cannot recurse into another refresh.
        let response = self
            .inner
            .http
            .post(self.url("auth/refresh"))
            .bearer_auth(&refresh)
            .send()
            .await;

        let response = match response {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                tracing::warn!(status = %response.status(), "token refresh rejected");
                return Err(self.expire_session().await);
            }
            Err(err) => {
                tracing::warn!(error = %err, "token refresh failed");
                return Err(self.expire_session().await);
            }
        };

        let body: RefreshResponse = match response.json().await {
            Ok(body) => body,
            Err(err) => {
                tracing::warn!(error = %err, "token refresh returned an unreadable body");
                return Err(self.expire_session().await);
            }
        };

        self.inner.store.store_access_token(&body.access_token).await?;
        tracing::debug!("access token refreshed");

        Ok(body.access_token)
    }

    /// Forced logout: both tokens go together, callers get `SessionExpired`.
    async fn expire_session(&self) -> ApiError {
        if let Err(err) = self.inner.store.clear().await {
            tracing::error!(error = %err, "failed to clear tokens on session expiry");
        }
        self.publish(Notice::warning("session_expired", SESSION_EXPIRED_NOTICE));
        ApiError::SessionExpired
    }

    fn publish_error(&self, err: &ApiError) {
        tracing::warn!(kind = err.kind(), error = %err, "request failed");
        self.publish(Notice::error(err.kind(), err.to_string()));
    }

    fn publish(&self, notice: Notice) {
        if let Some(bus) = &self.inner.notices {
            // nobody listening is fine
            let _ = bus.send(notice);
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.inner.base_url, path.trim_start_matches('/'))
    }
}

fn encode_body<B: Serialize>(body: &B) -> ApiResult<Value> {
    serde_json::to_value(body).map_err(|err| ApiError::internal(format!("failed to encode request body: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryTokenStore;

    #[test]
    fn test_url_joins_without_duplicate_slashes() {
        let config = ClientConfig::new("http://localhost:5000/api/");
        let client = ApiClient::new(&config, Arc::new(MemoryTokenStore::new())).unwrap();

        assert_eq!(client.url("auth/me"), "http://localhost:5000/api/auth/me");
        assert_eq!(client.url("/auth/me"), "http://localhost:5000/api/auth/me");
    }
}
