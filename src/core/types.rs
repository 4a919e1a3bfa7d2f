use crate::core::errors::EsbError;
use bytes::Bytes;
use reqwest::Method;
use std::fmt;
use std::io::Cursor;
use std::str::FromStr;

/// Envelope parameters sent in the query string alongside the body.
///
/// Keeps insertion order, which is the order they go out on the wire.
/// Signing sorts its own copy, so the order here never affects the signature.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BaseParams {
    entries: Vec<(String, String)>,
}

impl BaseParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a parameter, replacing the value in place if the key exists
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sorted by key, byte-wise ascending
    pub fn sorted(&self) -> Vec<(&str, &str)> {
        let mut pairs: Vec<_> = self.iter().collect();
        pairs.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
        pairs
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for BaseParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

/// Wire format of the request body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BodyFormat {
    #[default]
    Xml,
}

impl BodyFormat {
    /// Value sent as the `format` parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Xml => "xml",
        }
    }

    /// Header written ahead of the encoded body
    pub fn header(&self) -> &'static str {
        match self {
            Self::Xml => r#"<?xml version="1.0" encoding="utf-8"?>"#,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Xml => "application/xml; charset=utf-8",
        }
    }
}

impl FromStr for BodyFormat {
    type Err = EsbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "xml" => Ok(Self::Xml),
            other => Err(EsbError::SerializationError(format!(
                "Unsupported body format: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for BodyFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-call options for `ApiClient::request_with`
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub format: String,
    pub sign_method: String,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::POST,
            format: BodyFormat::Xml.as_str().to_string(),
            sign_method: "md5".to_string(),
        }
    }
}

impl RequestOptions {
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    pub fn with_sign_method(mut self, sign_method: impl Into<String>) -> Self {
        self.sign_method = sign_method.into();
        self
    }
}

/// A fully assembled request: signed parameters plus the encoded body.
///
/// Nothing in it changes between retry attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    pub method: Method,
    pub params: BaseParams,
    pub body: String,
    pub format: BodyFormat,
}

/// Raw response returned to the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseBody {
    status: u16,
    body: Bytes,
}

impl ResponseBody {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.body
    }

    /// Body decoded as UTF-8, replacing invalid sequences
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// A reader positioned at offset zero; every call starts from the beginning
    pub fn reader(&self) -> Cursor<&[u8]> {
        Cursor::new(self.body.as_ref())
    }

    pub fn into_bytes(self) -> Bytes {
        self.body
    }
}
