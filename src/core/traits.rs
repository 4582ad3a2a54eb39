//! Core traits and types for DOI publishing
//!
//! This module defines the transport seam between the publishing workflow and
//! the HTTP layer, plus the records exchanged with the deposition API.

use crate::core::error::PublishError;
use crate::core::metadata::RecordMetadata;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

// ============================================================================
// Requests and responses
// ============================================================================

/// HTTP method used against the deposition API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Post,
    Put,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Post => "POST",
            Self::Put => "PUT",
        }
    }
}

/// Request body variants
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// No body; still sent as a JSON call
    Empty,
    /// JSON document
    Json(serde_json::Value),
    /// Single-part multipart upload
    File {
        field: String,
        file_name: String,
        contents: Vec<u8>,
    },
}

/// A single call to the deposition API
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub url: String,
    pub body: RequestBody,
}

/// Raw response: status code and body text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-2xx response into `RemoteServiceError`
    pub fn error_for_status(self) -> Result<Self, PublishError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(PublishError::RemoteServiceError {
                status: self.status,
                body: self.body,
            })
        }
    }

    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, PublishError> {
        serde_json::from_str(&self.body).map_err(|e| PublishError::InvalidResponse(e.to_string()))
    }
}

// ============================================================================
// Transport Trait
// ============================================================================

/// Sends authenticated requests to the deposition API
///
/// Implementations attach the bearer token to every request. JSON and empty
/// bodies are sent with `Content-Type: application/json`; file bodies carry
/// only the multipart content type.
#[async_trait]
pub trait DepositTransport: Send + Sync {
    /// Send one request and return the raw response, whatever its status
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, PublishError>;
}

#[async_trait]
impl<T: DepositTransport + ?Sized> DepositTransport for Arc<T> {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, PublishError> {
        (**self).send(request).await
    }
}

// ============================================================================
// Records
// ============================================================================

/// Handle of a deposition, as assigned by the remote service
///
/// Serializes back to the JSON kind it was read from; equality and hashing
/// only look at the text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "serde_json::Value", into = "serde_json::Value")]
pub struct RecordId {
    text: String,
    numeric: bool,
}

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            text: id.into(),
            numeric: false,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl PartialEq for RecordId {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for RecordId {}

impl Hash for RecordId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.text.hash(state);
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl TryFrom<serde_json::Value> for RecordId {
    type Error = String;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        match value {
            serde_json::Value::Number(n) => Ok(Self {
                text: n.to_string(),
                numeric: true,
            }),
            serde_json::Value::String(s) if !s.is_empty() => Ok(Self::new(s)),
            other => Err(format!("invalid record id: {}", other)),
        }
    }
}

impl From<RecordId> for serde_json::Value {
    fn from(id: RecordId) -> Self {
        if id.numeric {
            if let Ok(n) = id.text.parse::<serde_json::Number>() {
                return serde_json::Value::Number(n);
            }
        }
        serde_json::Value::String(id.text)
    }
}

/// File descriptor reported by the remote service after an upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepositFile {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub filesize: Option<u64>,
    #[serde(default)]
    pub checksum: Option<String>,
}

/// Summary of a published record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishResult {
    pub doi: Option<String>,
    pub doi_url: Option<String>,
    pub record_id: Option<RecordId>,
    pub created: Option<String>,
    pub metadata: Option<RecordMetadata>,
}

impl PublishResult {
    /// Creation time, when the service reported an RFC 3339 timestamp
    pub fn created_at(&self) -> Option<DateTime<FixedOffset>> {
        self.created
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_response_success_range() {
        let ok = ApiResponse {
            status: 201,
            body: "{}".to_string(),
        };
        assert!(ok.is_success());
        assert!(ok.error_for_status().is_ok());

        let redirect = ApiResponse {
            status: 302,
            body: String::new(),
        };
        assert!(!redirect.is_success());
    }

    #[test]
    fn test_error_for_status_keeps_body() {
        let response = ApiResponse {
            status: 500,
            body: "internal".to_string(),
        };
        match response.error_for_status() {
            Err(PublishError::RemoteServiceError { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "internal");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_json_invalid_body() {
        let response = ApiResponse {
            status: 200,
            body: "<html>".to_string(),
        };
        let result: Result<serde_json::Value, _> = response.json();
        assert!(matches!(result, Err(PublishError::InvalidResponse(_))));
    }

    #[test]
    fn test_record_id_from_number_and_string() {
        let numeric: RecordId = serde_json::from_value(json!(1234567)).unwrap();
        assert_eq!(numeric.as_str(), "1234567");
        assert_eq!(serde_json::to_value(&numeric).unwrap(), json!(1234567));

        let text: RecordId = serde_json::from_value(json!("abc-12")).unwrap();
        assert_eq!(text.to_string(), "abc-12");
        assert_eq!(serde_json::to_value(&text).unwrap(), json!("abc-12"));

        assert!(serde_json::from_value::<RecordId>(json!(null)).is_err());
    }

    #[test]
    fn test_record_id_keeps_string_kind() {
        let padded: RecordId = serde_json::from_value(json!("007")).unwrap();
        assert_eq!(padded.as_str(), "007");
        assert_eq!(serde_json::to_value(&padded).unwrap(), json!("007"));

        let built = RecordId::new("42");
        assert_eq!(serde_json::to_value(&built).unwrap(), json!("42"));

        let numeric: RecordId = serde_json::from_value(json!(42)).unwrap();
        assert_eq!(numeric, built);
    }

    #[test]
    fn test_deposit_file_tolerates_missing_fields() {
        let file: DepositFile = serde_json::from_value(json!({
            "filename": "paper.pdf",
            "filesize": 2048,
            "checksum": "d41d8cd98f00b204e9800998ecf8427e",
            "links": {"self": "https://example.org"}
        }))
        .unwrap();
        assert_eq!(file.filename.as_deref(), Some("paper.pdf"));
        assert_eq!(file.filesize, Some(2048));
        assert!(file.id.is_none());
    }

    #[test]
    fn test_created_at_parses_rfc3339() {
        let result = PublishResult {
            doi: None,
            doi_url: None,
            record_id: None,
            created: Some("2016-06-15T16:10:03.319363+00:00".to_string()),
            metadata: None,
        };
        let created = result.created_at().unwrap();
        assert_eq!(created.timestamp(), 1466007003);

        let unparsable = PublishResult {
            created: Some("yesterday".to_string()),
            ..result
        };
        assert!(unparsable.created_at().is_none());
    }
}
