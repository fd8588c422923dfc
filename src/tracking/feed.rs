//! Flight feed client.
//!
//! The feed is queried with an HTTP GET to a URL template whose `%d`
//! placeholder receives the current Unix time in seconds. A successful
//! response is a JSON object keyed by label; each value is an array holding
//! the label at index 0, latitude at 1, longitude at 2 and altitude at 4.

use super::types::MovingObject;
use chrono::{DateTime, Utc};
use geo_types::Coord;
use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Placeholder in the source URL replaced by the current Unix timestamp.
pub const TIMESTAMP_PLACEHOLDER: &str = "%d";

const LABEL_INDEX: usize = 0;
const LATITUDE_INDEX: usize = 1;
const LONGITUDE_INDEX: usize = 2;
const ALTITUDE_INDEX: usize = 4;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that fail a single poll cycle.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("query from {url} returned unexpected status {status}")]
    Status { url: String, status: u16 },

    #[error("malformed feed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON object keyed by label, got {found}")]
    NotAnObject { found: &'static str },

    #[error("entry {key:?}: expected an array, got {found}")]
    NotAnArray { key: String, found: &'static str },

    #[error("entry {key:?}: missing field at index {index}")]
    MissingField { key: String, index: usize },

    #[error("entry {key:?}: expected {expected} at index {index}, got {found}")]
    UnexpectedType {
        key: String,
        index: usize,
        expected: &'static str,
        found: &'static str,
    },
}

/// Something that returns the raw feed body.
pub trait FeedSource: Send {
    fn fetch(&self) -> Result<String, FeedError>;
}

/// Feed source backed by a blocking HTTP client.
pub struct HttpFeedSource {
    template: String,
    client: Client,
}

impl HttpFeedSource {
    pub fn new(template: impl Into<String>) -> Result<Self, FeedError> {
        let client = Client::builder()
            .http1_only()
            .redirect(Policy::none())
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(FeedError::Client)?;

        Ok(Self {
            template: template.into(),
            client,
        })
    }
}

impl FeedSource for HttpFeedSource {
    fn fetch(&self) -> Result<String, FeedError> {
        let url = format_source(&self.template, Utc::now().timestamp());

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|source| FeedError::Request {
                url: url.clone(),
                source,
            })?;

        if response.status() != StatusCode::OK {
            return Err(FeedError::Status {
                url,
                status: response.status().as_u16(),
            });
        }

        response
            .text()
            .map_err(|source| FeedError::Request { url, source })
    }
}

/// Substitutes the timestamp placeholder in a source URL template.
pub fn format_source(template: &str, unix_secs: i64) -> String {
    template.replacen(TIMESTAMP_PLACEHOLDER, &unix_secs.to_string(), 1)
}

/// Parses a feed response body.
///
/// Any entry that does not match the expected layout fails the whole body.
pub fn parse_feed(body: &str, fetched_at: DateTime<Utc>) -> Result<Vec<MovingObject>, FeedError> {
    let value: Value = serde_json::from_str(body)?;
    let entries = match value {
        Value::Object(entries) => entries,
        other => {
            return Err(FeedError::NotAnObject {
                found: kind(&other),
            })
        }
    };

    entries
        .iter()
        .map(|(key, entry)| parse_entry(key, entry, fetched_at))
        .collect()
}

fn parse_entry(key: &str, entry: &Value, fetched_at: DateTime<Utc>) -> Result<MovingObject, FeedError> {
    let Value::Array(fields) = entry else {
        return Err(FeedError::NotAnArray {
            key: key.to_string(),
            found: kind(entry),
        });
    };

    let field = |index: usize| {
        fields.get(index).ok_or_else(|| FeedError::MissingField {
            key: key.to_string(),
            index,
        })
    };
    let number = |index: usize| {
        let value = field(index)?;
        value.as_f64().ok_or_else(|| FeedError::UnexpectedType {
            key: key.to_string(),
            index,
            expected: "number",
            found: kind(value),
        })
    };

    let label_value = field(LABEL_INDEX)?;
    let label = label_value
        .as_str()
        .ok_or_else(|| FeedError::UnexpectedType {
            key: key.to_string(),
            index: LABEL_INDEX,
            expected: "string",
            found: kind(label_value),
        })?
        .to_string();

    let lat = number(LATITUDE_INDEX)?;
    let lng = number(LONGITUDE_INDEX)?;
    let altitude = number(ALTITUDE_INDEX)?;

    Ok(MovingObject {
        label,
        position: Coord { x: lng, y: lat },
        altitude,
        updated_at: fetched_at,
    })
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
