//! Document record persistence.
//!
//! [`DocumentStore`] is the relational side of a scan: one row per document.
//! There are no transactions across calls; callers that pair a record with a
//! blob handle consistency themselves (see `pipeline`).

pub mod memory;
pub mod supabase;

use crate::schema::{Document, NewDocument};
use uuid::Uuid;

#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    fn name(&self) -> &str;

    async fn insert(&self, new: NewDocument) -> anyhow::Result<Document>;

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Document>>;

    /// All documents owned by `user_id`, oldest first.
    async fn list_by_owner(&self, user_id: &str) -> anyhow::Result<Vec<Document>>;

    /// Overwrite the extracted text; `Ok(None)` if no such document.
    async fn update_text(&self, id: Uuid, text: &str) -> anyhow::Result<Option<Document>>;

    /// Returns whether a row was removed.
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
}
