//! # Store API Client
//!
//! HTTP client for the four store endpoints a probe cycle touches. Each call
//! maps failures onto the [`ProbeStep`] it belongs to, so callers only need `?`.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::messages::{
    decode_object, KeyValue, LoginRequest, LoginResponse, UseDatabaseResponse, VerifiedGetRequest,
    VerifiedGetResponse, VerifiedSetRequest, VerifiedSetResponse,
};
use crate::config::Credentials;
use crate::constants::endpoints;
use crate::error::{ProbeError, ProbeResult, ProbeStep};

/// Decoded response together with the raw body it came from
#[derive(Debug, Clone)]
pub struct StoreReply<T> {
    pub body: T,
    pub raw: String,
}

/// HTTP client bound to one store base address
#[derive(Clone)]
pub struct StoreClient {
    client: Client,
    base_url: Url,
    request_timeout: Option<Duration>,
}

impl std::fmt::Debug for StoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreClient")
            .field("base_url", &self.base_url.as_str())
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl StoreClient {
    /// Create a client for `base_url`, which must end in `/`
    pub fn new(base_url: Url, request_timeout: Option<Duration>) -> Result<Self, reqwest::Error> {
        let mut builder =
            Client::builder().user_agent(format!("verified-probe/{}", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        debug!(
            base_url = %base_url,
            request_timeout = ?request_timeout,
            "Created StoreClient"
        );

        Ok(Self {
            client,
            base_url,
            request_timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `POST /login`
    pub async fn login(&self, credentials: &Credentials) -> ProbeResult<StoreReply<LoginResponse>> {
        let request = self.client.post(self.url(endpoints::LOGIN)).json(&LoginRequest {
            user: &credentials.user,
            password: &credentials.password,
        });
        self.exchange(ProbeStep::Authenticate, request).await
    }

    /// `GET /db/use/{database}`
    pub async fn use_database(
        &self,
        database: &str,
        session_token: &str,
    ) -> ProbeResult<StoreReply<UseDatabaseResponse>> {
        let request = self
            .client
            .get(self.url(&endpoints::use_database(database)))
            .header(AUTHORIZATION, session_token)
            .header(CONTENT_TYPE, "application/json");
        self.exchange(ProbeStep::SelectDatabase, request).await
    }

    /// `POST /db/{database}/verified/set` with a single key/value pair
    pub async fn verified_set(
        &self,
        database: &str,
        database_token: &str,
        kv: KeyValue,
    ) -> ProbeResult<StoreReply<VerifiedSetResponse>> {
        let request = self
            .client
            .post(self.url(&endpoints::verified_set(database)))
            .header(AUTHORIZATION, database_token)
            .json(&VerifiedSetRequest::single(kv));
        self.exchange(ProbeStep::VerifiedWrite, request).await
    }

    /// `POST /db/{database}/verified/get`
    pub async fn verified_get(
        &self,
        database: &str,
        database_token: &str,
        key: &str,
    ) -> ProbeResult<StoreReply<VerifiedGetResponse>> {
        let request = self
            .client
            .post(self.url(&endpoints::verified_get(database)))
            .header(AUTHORIZATION, database_token)
            .json(&VerifiedGetRequest::for_key(key));
        self.exchange(ProbeStep::VerifiedRead, request).await
    }

    // Invalid URLs surface from `send` as builder errors
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request and decode its body regardless of the status code.
    /// The store reports failures in the body shape, which the caller checks.
    async fn exchange<T>(&self, step: ProbeStep, request: RequestBuilder) -> ProbeResult<StoreReply<T>>
    where
        T: DeserializeOwned,
    {
        let response = request
            .send()
            .await
            .map_err(|e| ProbeError::transport(step, e))?;
        let status = response.status();
        let raw = response
            .text()
            .await
            .map_err(|e| ProbeError::transport(step, e))?;

        debug!(
            step = %step,
            status = status.as_u16(),
            body_len = raw.len(),
            "Store responded"
        );

        let body = decode_object(&raw).map_err(|e| ProbeError::decode(step, e))?;

        Ok(StoreReply { body, raw })
    }
}
