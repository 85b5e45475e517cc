use serde::{Deserialize, Deserializer, Serialize};

/// Lookup endpoint of the public Igbo API.
pub const DEFAULT_ENDPOINT: &str = "https://www.igboapi.com/api/v1/words";

/// Header carrying the API key on every lookup request.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Three-valued flag where "not reported" is distinct from `false`.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<bool>", into = "Option<bool>")]
pub enum TriState {
    True,
    False,
    #[default]
    Unknown,
}

impl TriState {
    pub fn as_bool(self) -> Option<bool> {
        self.into()
    }

    pub fn is_known(self) -> bool {
        self != TriState::Unknown
    }
}

impl From<Option<bool>> for TriState {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => TriState::True,
            Some(false) => TriState::False,
            None => TriState::Unknown,
        }
    }
}

impl From<TriState> for Option<bool> {
    fn from(value: TriState) -> Self {
        match value {
            TriState::True => Some(true),
            TriState::False => Some(false),
            TriState::Unknown => None,
        }
    }
}

impl From<bool> for TriState {
    fn from(value: bool) -> Self {
        TriState::from(Some(value))
    }
}

/// One dictionary result.
///
/// The service has returned two record shapes over time: translation pairs
/// (`igbo`/`english`/`associatedWords`, ...) and lexemes (`word`/`wordClass`/
/// `definitions`, ...). Both are folded into this single record. Every field is
/// always present: strings and sequences missing from the payload (or sent as
/// `null`) come back empty, and `is_standard_igbo` comes back
/// [`TriState::Unknown`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LexicalEntry {
    #[serde(deserialize_with = "null_as_default")]
    pub igbo: String,
    #[serde(deserialize_with = "null_as_default")]
    pub english: String,
    #[serde(deserialize_with = "null_as_default")]
    pub associated_words: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub pronunciation: String,
    #[serde(deserialize_with = "null_as_default")]
    pub updated_on: String,
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,

    #[serde(deserialize_with = "null_as_default")]
    pub word: String,
    #[serde(deserialize_with = "null_as_default")]
    pub word_class: String,
    #[serde(deserialize_with = "null_as_default")]
    pub definitions: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub variations: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub stems: Vec<String>,
    pub is_standard_igbo: TriState,
    #[serde(deserialize_with = "null_as_default")]
    pub antonyms: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub hypernyms: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub hyponyms: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub synonyms: Vec<String>,
    /// Nsibidi rendering of the headword, when the service has one.
    #[serde(deserialize_with = "null_as_default")]
    pub nsibidi: String,
}

impl LexicalEntry {
    /// Headword of the entry, whichever record shape supplied it.
    pub fn headword(&self) -> &str {
        if self.word.is_empty() {
            &self.igbo
        } else {
            &self.word
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Settings a caller may hand to [`crate::client::Client::from_config`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub endpoint: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }
}
