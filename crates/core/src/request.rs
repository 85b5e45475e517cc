use crate::transport::{LookupRequest, TransportError};
use crate::types::API_KEY_HEADER;
use std::collections::BTreeMap;
use url::Url;

const KEYWORD_PARAM: &str = "keyword";

/// Builds the authenticated GET request for one keyword lookup.
///
/// The API key only ever travels in the `X-API-Key` header. Any `keyword`
/// parameter already present on `endpoint` is replaced so the request carries
/// exactly one.
///
/// # Examples
///
/// ```
/// use igbo_core::request::build_lookup_request;
///
/// let req = build_lookup_request("https://www.igboapi.com/api/v1/words", "key", "ụlọ").unwrap();
/// assert_eq!(req.query("keyword").as_deref(), Some("ụlọ"));
/// assert_eq!(req.header("X-API-Key"), Some("key"));
/// assert!(!req.url.as_str().contains("key="));
/// ```
pub fn build_lookup_request(
    endpoint: &str,
    api_key: &str,
    keyword: &str,
) -> Result<LookupRequest, TransportError> {
    let mut url = Url::parse(endpoint)
        .map_err(|e| TransportError::InvalidRequest(format!("endpoint `{endpoint}`: {e}")))?;

    let retained: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != KEYWORD_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(retained)
        .append_pair(KEYWORD_PARAM, keyword);

    let mut headers = BTreeMap::new();
    headers.insert(API_KEY_HEADER.to_string(), api_key.to_string());

    Ok(LookupRequest { url, headers })
}
