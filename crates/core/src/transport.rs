//! Transport seam used by [`crate::client::Client`].
//!
//! The client never talks to a network stack directly. It prepares a
//! [`LookupRequest`], hands it to a [`Transport`] and reads the returned
//! [`Body`] incrementally. [`ReqwestTransport`] is the production binding;
//! [`MockTransport`] and [`BufferedBody`] are scripted stand-ins.

use crate::types::API_KEY_HEADER;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use url::Url;

type BoxError = Box<dyn StdError + Send + Sync>;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid lookup request: {0}")]
    InvalidRequest(String),
    #[error("transport request failed: {0}")]
    Request(#[source] BoxError),
    #[error("response body read failed: {0}")]
    Body(#[source] BoxError),
}

impl TransportError {
    pub fn request<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Request(err.into())
    }

    pub fn body<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Body(err.into())
    }
}

/// Prepared GET request for the lookup endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct LookupRequest {
    pub url: Url,
    pub headers: BTreeMap<String, String>,
}

impl LookupRequest {
    pub fn method(&self) -> &'static str {
        "GET"
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// First decoded value of a query parameter.
    pub fn query(&self, name: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }
}

impl fmt::Debug for LookupRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: BTreeMap<&str, &str> = self
            .headers
            .iter()
            .map(|(key, value)| {
                if key.eq_ignore_ascii_case(API_KEY_HEADER) {
                    (key.as_str(), "<redacted>")
                } else {
                    (key.as_str(), value.as_str())
                }
            })
            .collect();
        f.debug_struct("LookupRequest")
            .field("method", &self.method())
            .field("url", &self.url.as_str())
            .field("headers", &headers)
            .finish()
    }
}

/// Result of one [`Body::read`] call.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ReadOutcome {
    /// `n` bytes were written. `Filled(0)` means the body is exhausted.
    Filled(usize),
    /// `n` bytes were written and no more data follows.
    Finished(usize),
}

/// Response body readable in bounded chunks.
///
/// Implementations release their underlying resource on drop.
#[async_trait]
pub trait Body: Send {
    async fn read(&mut self, buf: &mut [u8]) -> Result<ReadOutcome, TransportError>;
}

#[async_trait]
impl<B> Body for Box<B>
where
    B: Body + ?Sized,
{
    async fn read(&mut self, buf: &mut [u8]) -> Result<ReadOutcome, TransportError> {
        (**self).read(buf).await
    }
}

pub struct TransportResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Box<dyn Body>,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Body + 'static) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: Box::new(body),
        }
    }

    pub fn into_body(self) -> Box<dyn Body> {
        self.body
    }
}

impl fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Anything able to execute a prepared lookup request.
///
/// Timeouts, retries and TLS are the implementation's business.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: LookupRequest) -> Result<TransportResponse, TransportError>;
}

#[async_trait]
impl<T> Transport for Box<T>
where
    T: Transport + ?Sized,
{
    async fn execute(&self, request: LookupRequest) -> Result<TransportResponse, TransportError> {
        (**self).execute(request).await
    }
}

#[async_trait]
impl<T> Transport for Arc<T>
where
    T: Transport + ?Sized,
{
    async fn execute(&self, request: LookupRequest) -> Result<TransportResponse, TransportError> {
        (**self).execute(request).await
    }
}

/// Fully buffered body, serialized once and read until drained.
#[derive(Debug, Clone, Default)]
pub struct BufferedBody {
    data: Vec<u8>,
    pos: usize,
    signal_end: bool,
}

impl BufferedBody {
    /// Body that reports exhaustion with a zero-length read.
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            pos: 0,
            signal_end: false,
        }
    }

    /// Body that flags end-of-data together with its final chunk.
    pub fn with_end_signal(data: impl Into<Vec<u8>>) -> Self {
        Self {
            signal_end: true,
            ..Self::new(data)
        }
    }
}

#[async_trait]
impl Body for BufferedBody {
    async fn read(&mut self, buf: &mut [u8]) -> Result<ReadOutcome, TransportError> {
        let remaining = &self.data[self.pos..];
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.pos += n;
        if self.signal_end && self.pos == self.data.len() {
            Ok(ReadOutcome::Finished(n))
        } else {
            Ok(ReadOutcome::Filled(n))
        }
    }
}

const REJECTED_KEY_PAYLOAD: &str = r#"{"error":"X-API-Key Header doesn't exist"}"#;

/// Scripted transport that answers every request with a fixed payload.
///
/// When constructed with [`MockTransport::require_api_key`], requests whose
/// `X-API-Key` header does not match get a `400` with the service's error
/// object instead. Every request is recorded.
#[derive(Debug, Default)]
pub struct MockTransport {
    status: u16,
    payload: Vec<u8>,
    api_key: Option<String>,
    end_signal: bool,
    requests: Mutex<Vec<LookupRequest>>,
}

impl MockTransport {
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            payload: payload.into(),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn require_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Serve bodies that flag end-of-data on their last chunk.
    pub fn with_end_signal(mut self) -> Self {
        self.end_signal = true;
        self
    }

    pub fn requests(&self) -> Vec<LookupRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn body(&self, data: Vec<u8>) -> BufferedBody {
        if self.end_signal {
            BufferedBody::with_end_signal(data)
        } else {
            BufferedBody::new(data)
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: LookupRequest) -> Result<TransportResponse, TransportError> {
        let authorized = match &self.api_key {
            Some(expected) => request.header(API_KEY_HEADER) == Some(expected.as_str()),
            None => true,
        };
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request);

        if !authorized {
            return Ok(TransportResponse::new(
                400,
                self.body(REJECTED_KEY_PAYLOAD.as_bytes().to_vec()),
            ));
        }
        Ok(TransportResponse::new(
            self.status,
            self.body(self.payload.clone()),
        ))
    }
}

#[cfg(feature = "transport-reqwest")]
pub use self::http::ReqwestTransport;

#[cfg(feature = "transport-reqwest")]
mod http {
    use super::{Body, LookupRequest, ReadOutcome, Transport, TransportError, TransportResponse};
    use async_trait::async_trait;
    use std::time::Duration;

    /// [`Transport`] backed by a shared `reqwest::Client`.
    #[derive(Debug, Clone, Default)]
    pub struct ReqwestTransport {
        client: reqwest::Client,
    }

    impl ReqwestTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
            let client = reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .map_err(TransportError::request)?;
            Ok(Self { client })
        }

        pub fn from_client(client: reqwest::Client) -> Self {
            Self { client }
        }
    }

    #[async_trait]
    impl Transport for ReqwestTransport {
        async fn execute(
            &self,
            request: LookupRequest,
        ) -> Result<TransportResponse, TransportError> {
            let mut builder = self.client.get(request.url);
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            let response = builder.send().await.map_err(TransportError::request)?;

            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|value| (name.as_str().to_string(), value.to_string()))
                })
                .collect();

            Ok(TransportResponse {
                status,
                headers,
                body: Box::new(ReqwestBody {
                    response,
                    pending: Vec::new(),
                    offset: 0,
                }),
            })
        }
    }

    struct ReqwestBody {
        response: reqwest::Response,
        pending: Vec<u8>,
        offset: usize,
    }

    #[async_trait]
    impl Body for ReqwestBody {
        async fn read(&mut self, buf: &mut [u8]) -> Result<ReadOutcome, TransportError> {
            while self.offset >= self.pending.len() {
                match self.response.chunk().await.map_err(TransportError::body)? {
                    Some(chunk) => {
                        self.pending = chunk.to_vec();
                        self.offset = 0;
                    }
                    None => return Ok(ReadOutcome::Filled(0)),
                }
            }
            let available = &self.pending[self.offset..];
            let n = available.len().min(buf.len());
            buf[..n].copy_from_slice(&available[..n]);
            self.offset += n;
            Ok(ReadOutcome::Filled(n))
        }
    }
}
