//! Response bodies.

use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use tabula_store::ColumnSummary;

/// Uniform error body: `{"error": "..."}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

/// Simple acknowledgement: `{"message": "..."}`.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Successful login.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Successful schema upload: where the raw file landed and what tables
/// (with inferred column types) were materialized.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub path: String,
    pub tables: BTreeMap<String, Vec<ColumnSummary>>,
}

/// Successful query execution. Tenant SQL errors use [`ErrorBody`] with a
/// 200 status instead — they are outcomes, not faults.
#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<JsonValue>>,
}

/// Generated SQL for a natural-language question.
#[derive(Debug, Serialize)]
pub struct SqlGenerationResponse {
    pub sql: String,
}

/// Transcription of an uploaded audio file.
#[derive(Debug, Serialize)]
pub struct TranscriptResponse {
    pub transcript: String,
    pub path: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_body_shape() {
        let body = serde_json::to_value(ErrorBody::new("boom")).unwrap();
        assert_eq!(body, json!({ "error": "boom" }));
    }

    #[test]
    fn test_query_response_shape() {
        let body = serde_json::to_value(QueryResponse {
            columns: vec!["id".to_string()],
            rows: vec![vec![json!(1)]],
        })
        .unwrap();
        assert_eq!(body, json!({ "columns": ["id"], "rows": [[1]] }));
    }
}
