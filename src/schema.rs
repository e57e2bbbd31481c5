//! Document record types and the JSON shapes exchanged over HTTP.
//!
//! Records serialize camelCase (`userId`, `objectKey`, ...) so clients see the
//! same field names regardless of which store produced them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A persisted scan: who owns it, where the image lives, and its text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: Uuid,
    pub user_id: String,
    pub object_key: String,
    pub extracted_text: String,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied by the caller when creating a record.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDocument {
    pub user_id: String,
    pub object_key: String,
    pub extracted_text: String,
}

impl NewDocument {
    /// Materialize into a full record with a fresh id and creation time.
    pub fn into_document(self) -> Document {
        Document {
            id: Uuid::new_v4(),
            user_id: self.user_id,
            object_key: self.object_key,
            extracted_text: self.extracted_text,
            created_at: Utc::now(),
        }
    }
}

/// A record plus a URL the client can fetch the image from.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentView {
    #[serde(flatten)]
    pub document: Document,
    pub file_url: String,
}

/// Body of `POST /document`. Every field is optional here so that missing
/// fields become a 400 from validation rather than a deserialization reject.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDocumentRequest {
    pub user_id: Option<String>,
    pub object_key: Option<String>,
    pub extracted_text: Option<String>,
}

impl CreateDocumentRequest {
    /// All three fields must be present and non-blank.
    pub fn validate(self) -> Result<NewDocument, &'static str> {
        match (
            non_blank(self.user_id),
            non_blank(self.object_key),
            non_blank(self.extracted_text),
        ) {
            (Some(user_id), Some(object_key), Some(extracted_text)) => Ok(NewDocument {
                user_id,
                object_key,
                extracted_text,
            }),
            _ => Err("Missing required fields"),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDocumentRequest {
    pub extracted_text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub file_name: String,
    pub object_key: String,
    pub storage_path: String,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct DocumentEnvelope<T> {
    pub document: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct DocumentList {
    pub documents: Vec<DocumentView>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Result of `POST /ocr`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrResponse {
    pub text: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub no_text: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_requires_all_fields() {
        let full = CreateDocumentRequest {
            user_id: Some("u1".into()),
            object_key: Some("abc.jpg".into()),
            extracted_text: Some("Hello".into()),
        };
        let doc = full.validate().unwrap();
        assert_eq!(doc.user_id, "u1");

        let missing_text = CreateDocumentRequest {
            user_id: Some("u1".into()),
            object_key: Some("abc.jpg".into()),
            extracted_text: None,
        };
        assert!(missing_text.validate().is_err());

        let blank_key = CreateDocumentRequest {
            user_id: Some("u1".into()),
            object_key: Some("   ".into()),
            extracted_text: Some("Hello".into()),
        };
        assert!(blank_key.validate().is_err());
    }

    #[test]
    fn test_view_serializes_camel_case() {
        let doc = NewDocument {
            user_id: "u1".into(),
            object_key: "k.png".into(),
            extracted_text: "text".into(),
        }
        .into_document();
        let view = DocumentView {
            document: doc.clone(),
            file_url: "/uploads/k.png".into(),
        };
        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(value["id"], doc.id.to_string());
        assert_eq!(value["userId"], "u1");
        assert_eq!(value["objectKey"], "k.png");
        assert_eq!(value["extractedText"], "text");
        assert_eq!(value["fileUrl"], "/uploads/k.png");
        assert!(value.get("createdAt").is_some());
    }
}
