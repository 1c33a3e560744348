//! Metadata access abstraction
//!
//! The handlers only talk to [`MetadataApi`]. One implementation ships:
//! - Rest: Salesforce REST API (SOQL + Analytics describe endpoints)

mod rest;

pub use rest::RestMetadataClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Kind of remote object being queried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataCategory {
    Report,
}

impl MetadataCategory {
    /// sObject holding the records
    pub fn sobject(&self) -> &'static str {
        match self {
            MetadataCategory::Report => "Report",
        }
    }

    /// `Folder.Type` value for folders of this category
    pub fn folder_type(&self) -> &'static str {
        self.sobject()
    }

    /// Analytics API collection serving `describe`
    pub fn analytics_path(&self) -> &'static str {
        match self {
            MetadataCategory::Report => "reports",
        }
    }

    /// Directory and suffix used in metadata file names
    pub fn file_layout(&self) -> (&'static str, &'static str) {
        match self {
            MetadataCategory::Report => ("reports", "report"),
        }
    }
}

impl std::fmt::Display for MetadataCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.sobject())
    }
}

/// A named entry returned by folder and folder-content listings.
///
/// Only `fullName` and `namespacePrefix` are inspected here; every other
/// attribute is carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataEntry {
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace_prefix: Option<String>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl MetadataEntry {
    pub fn new(full_name: impl Into<String>) -> Self {
        Self { full_name: full_name.into(), namespace_prefix: None, attributes: Map::new() }
    }

    pub fn with_namespace(mut self, prefix: impl Into<String>) -> Self {
        self.namespace_prefix = Some(prefix.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Case-insensitive substring match on the full name or namespace prefix.
    /// `pattern` must already be lower-cased.
    pub fn matches(&self, pattern: &str) -> bool {
        if self.full_name.to_lowercase().contains(pattern) {
            return true;
        }
        match self.namespace_prefix.as_deref() {
            Some(prefix) if !prefix.is_empty() => prefix.to_lowercase().contains(pattern),
            _ => false,
        }
    }
}

/// Metadata access trait - abstraction over the remote API
#[async_trait]
pub trait MetadataApi: Send + Sync {
    /// Full metadata of one record, passed through as returned by the API
    async fn retrieve(&self, category: MetadataCategory, name: &str) -> Result<Value, MetadataError>;

    /// Entries stored in one folder. `None` marks a row the API returned without usable content.
    async fn list_in_folder(
        &self,
        category: MetadataCategory,
        folder: &str,
    ) -> Result<Vec<Option<MetadataEntry>>, MetadataError>;

    /// Folders holding records of this category
    async fn list_folders(&self, category: MetadataCategory) -> Result<Vec<Option<MetadataEntry>>, MetadataError>;
}

/// Metadata errors
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("Invalid connection: {0}")]
    InvalidConnection(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Salesforce API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl MetadataError {
    pub fn not_found(name: impl Into<String>) -> Self {
        MetadataError::NotFound(name.into())
    }

    pub fn invalid_connection(msg: impl Into<String>) -> Self {
        MetadataError::InvalidConnection(msg.into())
    }
}

impl From<reqwest::Error> for MetadataError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            MetadataError::Malformed(e.to_string())
        } else {
            MetadataError::Transport(e.to_string())
        }
    }
}
