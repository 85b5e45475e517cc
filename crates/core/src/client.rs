use crate::decode::{decode, DecodeError};
use crate::drain::drain;
use crate::request::build_lookup_request;
use crate::transport::{Transport, TransportError};
use crate::types::{ClientConfig, LexicalEntry, DEFAULT_ENDPOINT};
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Errors raised while constructing a [`Client`].
#[derive(Debug, Error, Clone, Copy, Eq, PartialEq)]
pub enum ClientError {
    #[error("api key is required to create a new igbo client")]
    CredentialMissing,
}

/// Errors raised by [`Client::lookup`].
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("lookup transport failure: {0}")]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl LookupError {
    pub fn is_transport(&self) -> bool {
        matches!(self, LookupError::Transport(_))
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, LookupError::Decode(_))
    }

    /// The captured payload when the response could not be decoded.
    pub fn decode_failure(&self) -> Option<&DecodeError> {
        match self {
            LookupError::Decode(err) => Some(err),
            LookupError::Transport(_) => None,
        }
    }
}

/// Dictionary client bound to one API key and one [`Transport`].
///
/// Construction performs no I/O. Each [`Client::lookup`] issues exactly one
/// request and either returns every decoded entry or an error, never a
/// partial result.
pub struct Client<T>
where
    T: Transport,
{
    api_key: String,
    endpoint: String,
    transport: T,
}

impl<T> Client<T>
where
    T: Transport,
{
    /// Binds `api_key` and `transport`; fails when the key is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use igbo_core::client::{Client, ClientError};
    /// use igbo_core::transport::MockTransport;
    ///
    /// let client = Client::new("my-key", MockTransport::new("[]")).unwrap();
    /// assert_eq!(client.api_key(), "my-key");
    ///
    /// let err = Client::new("", MockTransport::new("[]")).unwrap_err();
    /// assert_eq!(err, ClientError::CredentialMissing);
    /// ```
    pub fn new(api_key: impl Into<String>, transport: T) -> Result<Self, ClientError> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(ClientError::CredentialMissing);
        }
        Ok(Self {
            api_key,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            transport,
        })
    }

    /// Like [`Client::new`], using the endpoint from `config`.
    pub fn from_config(
        config: &ClientConfig,
        api_key: impl Into<String>,
        transport: T,
    ) -> Result<Self, ClientError> {
        Ok(Self::new(api_key, transport)?.with_endpoint(config.endpoint.clone()))
    }

    /// Points the client at a different lookup endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Looks up `keyword` and returns the matching entries in server order.
    ///
    /// Transport and body-read failures surface as
    /// [`LookupError::Transport`]; a payload that is not a list of entries
    /// surfaces as [`LookupError::Decode`]. The response status is not
    /// inspected: an error payload fails to decode instead.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use igbo_core::client::Client;
    /// use igbo_core::transport::MockTransport;
    ///
    /// # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
    /// let payload = r#"[{"word":"mmiri","wordClass":"NNC","definitions":["water"]}]"#;
    /// let client = Client::new("my-key", MockTransport::new(payload))?;
    /// let entries = client.lookup("water").await?;
    /// assert_eq!(entries[0].word, "mmiri");
    /// # Ok(())
    /// # }
    /// ```
    pub async fn lookup(&self, keyword: &str) -> Result<Vec<LexicalEntry>, LookupError> {
        let request = build_lookup_request(&self.endpoint, &self.api_key, keyword)?;
        debug!(endpoint = %self.endpoint, keyword, "dispatching lookup");

        let response = self.transport.execute(request).await?;
        debug!(status = response.status, "lookup response received");

        let bytes = drain(response.into_body()).await?;
        let entries = decode(&bytes).map_err(|err| {
            debug!(bytes_read = err.bytes_read, "lookup payload not recognized");
            err
        })?;
        debug!(bytes = bytes.len(), entries = entries.len(), "lookup decoded");

        Ok(entries)
    }
}

impl<T> fmt::Debug for Client<T>
where
    T: Transport + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("transport", &self.transport)
            .finish()
    }
}
