//! Service configuration.
//!
//! Everything is read from the environment (after `.env` is loaded by `main`).
//! Backends are chosen by name; Supabase credentials are only required when a
//! Supabase backend is selected.

use anyhow::{anyhow, bail, Context, Result};
use std::collections::HashMap;
use std::path::PathBuf;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_USER_ID: &str = "temp-user";
pub const DEFAULT_BUCKET: &str = "documents";
pub const DEFAULT_TABLE: &str = "docs";
pub const DEFAULT_SIGNED_URL_TTL_SECS: u64 = 3600;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Local { root: PathBuf },
    Supabase { bucket: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseBackend {
    Memory,
    Supabase { table: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OcrBackend {
    Tesseract { binary: String },
    Sidecar { url: String },
}

/// Credentials for the Supabase project backing storage and/or records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupabaseCredentials {
    pub url: String,
    pub service_role_key: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub storage: StorageBackend,
    pub database: DatabaseBackend,
    pub ocr: OcrBackend,
    pub ocr_lang: String,
    pub default_user_id: String,
    pub signed_url_ttl_secs: u64,
    pub supabase: Option<SupabaseCredentials>,
}

impl AppConfig {
    /// Build the config from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(std::env::vars().collect())
    }

    /// Build the config from an explicit variable map.
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self> {
        let get = |key: &str| vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());

        let storage = match get("STORAGE_BACKEND").unwrap_or("local") {
            "local" => StorageBackend::Local {
                root: PathBuf::from(get("UPLOAD_DIR").unwrap_or("uploads")),
            },
            "supabase" => StorageBackend::Supabase {
                bucket: get("STORAGE_BUCKET").unwrap_or(DEFAULT_BUCKET).to_string(),
            },
            other => bail!("Unknown STORAGE_BACKEND: {} (expected local|supabase)", other),
        };

        let database = match get("DATABASE_BACKEND").unwrap_or("memory") {
            "memory" => DatabaseBackend::Memory,
            "supabase" => DatabaseBackend::Supabase {
                table: get("DOCS_TABLE").unwrap_or(DEFAULT_TABLE).to_string(),
            },
            other => bail!("Unknown DATABASE_BACKEND: {} (expected memory|supabase)", other),
        };

        let ocr = match get("OCR_BACKEND").unwrap_or("tesseract") {
            "tesseract" => OcrBackend::Tesseract {
                binary: get("TESSERACT_BIN").unwrap_or("tesseract").to_string(),
            },
            "sidecar" => OcrBackend::Sidecar {
                url: get("OCR_URL")
                    .ok_or_else(|| anyhow!("OCR_URL must be set when OCR_BACKEND=sidecar"))?
                    .trim_end_matches('/')
                    .to_string(),
            },
            other => bail!("Unknown OCR_BACKEND: {} (expected tesseract|sidecar)", other),
        };

        let needs_supabase = matches!(storage, StorageBackend::Supabase { .. })
            || matches!(database, DatabaseBackend::Supabase { .. });

        let supabase = match (get("SUPABASE_URL"), get("SUPABASE_SERVICE_ROLE_KEY")) {
            (Some(url), Some(key)) => Some(SupabaseCredentials {
                url: url.trim_end_matches('/').to_string(),
                service_role_key: key.to_string(),
            }),
            _ if needs_supabase => {
                bail!("SUPABASE_URL and SUPABASE_SERVICE_ROLE_KEY must be set for Supabase backends")
            }
            _ => None,
        };

        let signed_url_ttl_secs = match get("SIGNED_URL_TTL_SECS") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("Invalid SIGNED_URL_TTL_SECS: {}", raw))?,
            None => DEFAULT_SIGNED_URL_TTL_SECS,
        };

        Ok(Self {
            bind_addr: get("BIND_ADDR").unwrap_or(DEFAULT_BIND_ADDR).to_string(),
            storage,
            database,
            ocr,
            ocr_lang: get("OCR_LANG").unwrap_or("eng").to_string(),
            default_user_id: get("DEFAULT_USER_ID").unwrap_or(DEFAULT_USER_ID).to_string(),
            signed_url_ttl_secs,
            supabase,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_vars(HashMap::new()).unwrap();
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(
            config.storage,
            StorageBackend::Local { root: PathBuf::from("uploads") }
        );
        assert_eq!(config.database, DatabaseBackend::Memory);
        assert_eq!(config.default_user_id, "temp-user");
        assert_eq!(config.signed_url_ttl_secs, 3600);
        assert!(config.supabase.is_none());
    }

    #[test]
    fn test_supabase_requires_credentials() {
        let result = AppConfig::from_vars(vars(&[("STORAGE_BACKEND", "supabase")]));
        assert!(result.is_err());

        let config = AppConfig::from_vars(vars(&[
            ("STORAGE_BACKEND", "supabase"),
            ("DATABASE_BACKEND", "supabase"),
            ("SUPABASE_URL", "https://example.supabase.co/"),
            ("SUPABASE_SERVICE_ROLE_KEY", "secret"),
        ]))
        .unwrap();
        assert_eq!(
            config.storage,
            StorageBackend::Supabase { bucket: "documents".to_string() }
        );
        assert_eq!(
            config.database,
            DatabaseBackend::Supabase { table: "docs".to_string() }
        );
        assert_eq!(config.supabase.unwrap().url, "https://example.supabase.co");
    }

    #[test]
    fn test_unknown_backend_rejected() {
        assert!(AppConfig::from_vars(vars(&[("DATABASE_BACKEND", "mysql")])).is_err());
        assert!(AppConfig::from_vars(vars(&[("OCR_BACKEND", "sidecar")])).is_err());
    }
}
