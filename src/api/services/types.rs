//! Request and response bodies

use serde::{Deserialize, Serialize};

use crate::errors::ShortmintError;
use crate::storage::Mapping;

/// `POST /shorten` body, accepted as a form or JSON
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShortenForm {
    #[serde(default)]
    pub url: String,
    #[serde(default, alias = "customAlias")]
    pub custom_alias: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortenResponse {
    #[serde(rename = "shortCode")]
    pub short_code: String,
    #[serde(rename = "originalURL")]
    pub original_url: String,
}

impl From<Mapping> for ShortenResponse {
    fn from(mapping: Mapping) -> Self {
        Self {
            short_code: mapping.short_code,
            original_url: mapping.original_url,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckQuery {
    pub url: Option<String>,
    #[serde(alias = "customAlias")]
    pub custom_alias: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResponse {
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapping: Option<Mapping>,
}

/// `POST`/`DELETE /delete-url` body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteBody {
    pub url: Option<String>,
    #[serde(rename = "shortCode", alias = "short_code")]
    pub short_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl From<&ShortmintError> for ErrorBody {
    fn from(err: &ShortmintError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.message().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub uptime: u64,
    pub storage: HealthStorageCheck,
    pub response_time_ms: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStorageCheck {
    pub status: String,
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mappings_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
