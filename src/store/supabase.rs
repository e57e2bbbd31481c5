//! PostgREST-backed document table.
//!
//! Table layout: `id uuid pk default gen_random_uuid()`, `user_id varchar`,
//! `object_key text`, `extracted_text text`, `created_at timestamptz default now()`.

use super::DocumentStore;
use crate::schema::{Document, NewDocument};
use crate::supabase::{ensure_success, SupabaseClient};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

pub struct SupabaseStore {
    client: SupabaseClient,
    table: String,
}

/// Row as PostgREST returns it (snake_case columns).
#[derive(Debug, Deserialize)]
struct DocRow {
    id: Uuid,
    user_id: String,
    object_key: String,
    extracted_text: String,
    created_at: DateTime<Utc>,
}

impl From<DocRow> for Document {
    fn from(row: DocRow) -> Self {
        Document {
            id: row.id,
            user_id: row.user_id,
            object_key: row.object_key,
            extracted_text: row.extracted_text,
            created_at: row.created_at,
        }
    }
}

impl SupabaseStore {
    pub fn new(client: SupabaseClient, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }

    fn table_url(&self) -> String {
        self.client.rest_url(&self.table)
    }

    async fn rows(resp: reqwest::Response, what: &str) -> Result<Vec<DocRow>> {
        let resp = ensure_success(resp, what).await?;
        resp.json()
            .await
            .with_context(|| format!("{}: malformed response", what))
    }
}

#[async_trait::async_trait]
impl DocumentStore for SupabaseStore {
    fn name(&self) -> &str {
        "supabase"
    }

    async fn insert(&self, new: NewDocument) -> Result<Document> {
        let body = json!({
            "user_id": new.user_id,
            "object_key": new.object_key,
            "extracted_text": new.extracted_text,
        });

        let resp = self
            .client
            .post(&self.table_url())
            .header("Content-Type", "application/json")
            .header("Prefer", "return=representation")
            .json(&body)
            .send()
            .await
            .context("Failed to send document insert")?;

        let row = Self::rows(resp, "Document insert")
            .await?
            .into_iter()
            .next()
            .context("Document insert returned no row")?;

        info!("Inserted document {} for {}", row.id, row.user_id);
        Ok(row.into())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Document>> {
        let resp = self
            .client
            .get(&self.table_url())
            .query(&[
                ("select", "*".to_string()),
                ("id", format!("eq.{}", id)),
                ("limit", "1".to_string()),
            ])
            .send()
            .await
            .context("Failed to send document fetch")?;

        Ok(Self::rows(resp, "Document fetch")
            .await?
            .into_iter()
            .next()
            .map(Document::from))
    }

    async fn list_by_owner(&self, user_id: &str) -> Result<Vec<Document>> {
        let resp = self
            .client
            .get(&self.table_url())
            .query(&[
                ("select", "*".to_string()),
                ("user_id", format!("eq.{}", user_id)),
                ("order", "created_at.asc".to_string()),
            ])
            .send()
            .await
            .context("Failed to send document list")?;

        let rows = Self::rows(resp, "Document list").await?;
        debug!("Listed {} documents for {}", rows.len(), user_id);
        Ok(rows.into_iter().map(Document::from).collect())
    }

    async fn update_text(&self, id: Uuid, text: &str) -> Result<Option<Document>> {
        let resp = self
            .client
            .patch(&self.table_url())
            .query(&[("id", format!("eq.{}", id))])
            .header("Content-Type", "application/json")
            .header("Prefer", "return=representation")
            .json(&json!({ "extracted_text": text }))
            .send()
            .await
            .context("Failed to send document update")?;

        Ok(Self::rows(resp, "Document update")
            .await?
            .into_iter()
            .next()
            .map(Document::from))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let resp = self
            .client
            .delete(&self.table_url())
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", "return=representation")
            .send()
            .await
            .context("Failed to send document delete")?;

        let removed = Self::rows(resp, "Document delete").await?;
        Ok(!removed.is_empty())
    }
}
