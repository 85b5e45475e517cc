use crate::types::LexicalEntry;
use thiserror::Error;

/// Payload that arrived intact but did not parse as a list of entries.
///
/// Carries the raw bytes so the caller can log or replay the payload without
/// asking the service again.
#[derive(Debug, Error)]
#[error(
    "failed to recognize {bytes_read} bytes of json: {source} ({})",
    String::from_utf8_lossy(.raw)
)]
pub struct DecodeError {
    pub bytes_read: usize,
    pub raw: Vec<u8>,
    #[source]
    pub source: serde_json::Error,
}

impl DecodeError {
    /// Raw payload as (lossy) UTF-8 text.
    pub fn raw_text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.raw)
    }
}

/// Parses a drained response body into entries, preserving server order.
///
/// An empty (or whitespace-only) body and a JSON `null` both decode to no
/// entries.
///
/// # Examples
///
/// ```
/// use igbo_core::decode::decode;
///
/// let entries = decode(br#"[{"word":"mmiri","definitions":["water"]}]"#).unwrap();
/// assert_eq!(entries[0].word, "mmiri");
/// assert!(decode(b"[").is_err());
/// ```
pub fn decode(bytes: &[u8]) -> Result<Vec<LexicalEntry>, DecodeError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }

    serde_json::from_slice::<Option<Vec<LexicalEntry>>>(bytes)
        .map(Option::unwrap_or_default)
        .map_err(|source| DecodeError {
            bytes_read: bytes.len(),
            raw: bytes.to_vec(),
            source,
        })
}
