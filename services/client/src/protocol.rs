//! services/client/src/protocol.rs
//!
//! Defines the JSON bodies exchanged with the backend and their conversion
//! into core domain types.

use knowledge_hub_core::{NewDocument, NewFlashcard, SearchReply};
use serde::{Deserialize, Serialize};
use serde_json::Value;

//=========================================================================================
// Requests
//=========================================================================================

#[derive(Serialize, Debug)]
pub struct ValidateKeyRequest<'a> {
    pub api_key: &'a str,
}

#[derive(Serialize, Debug)]
pub struct SearchRequest<'a> {
    pub query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<&'a str>,
}

//=========================================================================================
// Responses
//=========================================================================================

#[derive(Deserialize, Debug)]
pub struct FlashcardBody {
    pub question: String,
    pub answer: String,
}

/// The body of a successful `/upload`. The backend also sends a `status`
/// field, which is ignored.
#[derive(Deserialize, Debug)]
pub struct UploadResponse {
    pub filename: String,
    pub summary: String,
    #[serde(default)]
    pub chunks: u32,
    /// Empty when the backend could not get clean JSON out of the model.
    #[serde(default)]
    pub flashcards: Vec<FlashcardBody>,
    #[serde(default)]
    pub model_used: Option<String>,
}

impl From<UploadResponse> for NewDocument {
    fn from(body: UploadResponse) -> Self {
        NewDocument {
            filename: body.filename,
            summary: body.summary,
            chunk_count: body.chunks,
            flashcards: body
                .flashcards
                .into_iter()
                .map(|card| NewFlashcard {
                    question: card.question,
                    answer: card.answer,
                })
                .collect(),
            model_used: body.model_used,
        }
    }
}

/// The body of `/search`. Its shape depends on the backend version, so the
/// fields are kept loosely typed and sorted out on conversion.
#[derive(Deserialize, Debug, Default)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Option<Value>,
    #[serde(default)]
    pub answer: Option<Value>,
}

impl From<SearchResponse> for SearchReply {
    fn from(body: SearchResponse) -> Self {
        let mut reply = SearchReply::default();
        match body.results {
            Some(Value::Array(items)) => {
                let passages: Option<Vec<String>> = items
                    .into_iter()
                    .map(|item| match item {
                        Value::String(s) => Some(s),
                        _ => None,
                    })
                    .collect();
                reply.passages = passages;
            }
            Some(Value::String(text)) => reply.text = Some(text),
            _ => {}
        }
        if let Some(Value::String(answer)) = body.answer {
            reply.answer = Some(answer);
        }
        reply
    }
}

/// The error body FastAPI-style backends send with non-2xx responses.
#[derive(Deserialize, Debug)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<Value>,
}

impl ErrorBody {
    /// Extracts a displayable `detail` from a raw error body, if there is one.
    pub fn detail_from(raw: &str) -> Option<String> {
        let body: ErrorBody = serde_json::from_str(raw).ok()?;
        match body.detail? {
            Value::String(detail) => Some(detail),
            Value::Null => None,
            // Validation errors carry a list of objects.
            other => Some(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reply(body: Value) -> SearchReply {
        serde_json::from_value::<SearchResponse>(body).unwrap().into()
    }

    #[test]
    fn search_results_array_becomes_passages() {
        let reply = reply(json!({ "results": ["a", "b"] }));
        assert_eq!(reply.passages, Some(vec!["a".to_string(), "b".to_string()]));
        assert_eq!(reply.into_display_text(), "a\n\nb");
    }

    #[test]
    fn search_results_string_and_answer() {
        assert_eq!(reply(json!({ "results": "text" })).text.as_deref(), Some("text"));
        assert_eq!(reply(json!({ "answer": "ans" })).answer.as_deref(), Some("ans"));
    }

    #[test]
    fn mixed_array_is_not_passages() {
        let reply = reply(json!({ "results": ["a", 1], "answer": "ans" }));
        assert_eq!(reply.passages, None);
        assert_eq!(reply.into_display_text(), "ans");
    }

    #[test]
    fn unknown_shape_is_empty() {
        assert_eq!(reply(json!({ "status": "ok" })), SearchReply::default());
    }

    #[test]
    fn upload_response_without_flashcards() {
        let body: UploadResponse = serde_json::from_value(json!({
            "filename": "notes.pdf",
            "status": "Processed",
            "chunks": 12,
            "summary": "# Notes"
        }))
        .unwrap();
        let document = NewDocument::from(body);
        assert_eq!(document.chunk_count, 12);
        assert!(document.flashcards.is_empty());
        assert_eq!(document.model_used, None);
    }

    #[test]
    fn error_detail_extraction() {
        assert_eq!(
            ErrorBody::detail_from(r#"{"detail":"Invalid API Key"}"#).as_deref(),
            Some("Invalid API Key")
        );
        assert_eq!(ErrorBody::detail_from("Internal Server Error"), None);
        assert_eq!(ErrorBody::detail_from(r#"{"detail":null}"#), None);
        assert!(ErrorBody::detail_from(r#"{"detail":[{"msg":"field required"}]}"#)
            .unwrap()
            .contains("field required"));
    }

    #[test]
    fn search_request_omits_missing_key() {
        let body = serde_json::to_value(SearchRequest {
            query: "what is X",
            api_key: None,
        })
        .unwrap();
        assert_eq!(body, json!({ "query": "what is X" }));
    }
}
