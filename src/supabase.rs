//! Shared Supabase REST client.
//!
//! Both the object-storage backend and the PostgREST document store talk to
//! the same project with the service-role key; this type owns the HTTP client
//! and the auth headers so each backend only deals with its own endpoints.

use anyhow::{anyhow, Result};
use reqwest::{Client, RequestBuilder, Response};

use crate::config::SupabaseCredentials;

#[derive(Clone)]
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    service_role_key: String,
}

impl SupabaseClient {
    pub fn new(credentials: &SupabaseCredentials) -> Self {
        Self {
            client: Client::new(),
            base_url: credentials.url.trim_end_matches('/').to_string(),
            service_role_key: credentials.service_role_key.clone(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `{base}/rest/v1/{path}`
    pub fn rest_url(&self, path: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, path)
    }

    /// `{base}/storage/v1/{path}`
    pub fn storage_url(&self, path: &str) -> String {
        format!("{}/storage/v1/{}", self.base_url, path)
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        self.authorized(self.client.get(url))
    }

    pub fn post(&self, url: &str) -> RequestBuilder {
        self.authorized(self.client.post(url))
    }

    pub fn patch(&self, url: &str) -> RequestBuilder {
        self.authorized(self.client.patch(url))
    }

    pub fn delete(&self, url: &str) -> RequestBuilder {
        self.authorized(self.client.delete(url))
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.service_role_key)
            .header("Authorization", format!("Bearer {}", self.service_role_key))
    }
}

/// Turn a non-2xx response into an error carrying the status and body.
pub async fn ensure_success(resp: Response, what: &str) -> Result<Response> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();
    Err(anyhow!("{} failed: {} - {}", what, status, text))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let client = SupabaseClient::new(&SupabaseCredentials {
            url: "https://proj.supabase.co/".to_string(),
            service_role_key: "key".to_string(),
        });
        assert_eq!(client.base_url(), "https://proj.supabase.co");
        assert_eq!(client.rest_url("docs"), "https://proj.supabase.co/rest/v1/docs");
        assert_eq!(
            client.storage_url("object/documents/a.png"),
            "https://proj.supabase.co/storage/v1/object/documents/a.png"
        );
    }

    #[tokio::test]
    async fn test_requests_carry_service_role_auth() {
        use axum::response::IntoResponse;

        let stub = testing::stub(|_| axum::http::StatusCode::NO_CONTENT.into_response()).await;
        let resp = stub.client.get(&stub.client.rest_url("docs")).send().await.unwrap();
        ensure_success(resp, "Document fetch").await.unwrap();

        let request = stub.only_request();
        assert_eq!(request.path, "/rest/v1/docs");
        assert_eq!(request.header("apikey"), Some(testing::SERVICE_KEY));
        assert_eq!(request.header("authorization"), Some("Bearer service-key"));
    }

    #[tokio::test]
    async fn test_ensure_success_reports_status_and_body() {
        use axum::response::IntoResponse;

        let stub = testing::stub(|_| {
            (axum::http::StatusCode::CONFLICT, "duplicate key").into_response()
        })
        .await;
        let resp = stub.client.post(&stub.client.rest_url("docs")).send().await.unwrap();
        let err = ensure_success(resp, "Document insert").await.unwrap_err().to_string();
        assert!(err.starts_with("Document insert failed: 409"), "{}", err);
        assert!(err.contains("duplicate key"), "{}", err);
    }
}
