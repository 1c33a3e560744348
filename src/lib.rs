//! Salesforce report metadata tools - shared between CLI and MCP server
//!
//! Each tool is defined once, used in both binaries.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;

pub mod config;
pub mod connection;
pub mod mcp;
pub mod metadata;
pub mod observability;
pub mod reports;
pub mod tools;

pub use connection::{Connection, SalesforceConnection};
pub use metadata::{MetadataApi, MetadataCategory, MetadataEntry, MetadataError};

/// Tool execution result
#[derive(Debug, Serialize)]
pub struct ToolResult {
    pub success: bool,
    pub output: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResult {
    pub fn ok(output: impl Into<String>) -> Self {
        Self { success: true, output: output.into(), error: None }
    }

    pub fn err(error: impl Into<String>) -> Self {
        Self { success: false, output: String::new(), error: Some(error.into()) }
    }
}

/// Uniform result of a report operation.
///
/// `data` is set when `success` is true. `error` is set when `success` is
/// false, or alongside `data` as a non-fatal advisory when only part of a
/// multi-folder listing failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self { success: true, data: Some(data), error: None }
    }

    /// Successful result that may carry an advisory about partial failure
    pub fn partial(data: T, advisory: Option<String>) -> Self {
        Self { success: true, data: Some(data), error: advisory }
    }

    pub fn err(error: impl Into<String>) -> Self {
        Self { success: false, data: None, error: Some(error.into()) }
    }
}

impl<T: Serialize> From<Envelope<T>> for ToolResult {
    fn from(envelope: Envelope<T>) -> Self {
        if !envelope.success {
            return ToolResult::err(envelope.error.unwrap_or_else(|| "Unknown error".to_string()));
        }
        match serde_json::to_string_pretty(&envelope) {
            Ok(output) => ToolResult::ok(output),
            Err(e) => ToolResult::err(format!("Failed to serialize result: {e}")),
        }
    }
}

/// Boxed future for dyn compatibility
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Trait for tools - dyn-compatible using BoxFuture
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn schema(&self) -> Value;
    fn execute(&self, args: Value) -> BoxFuture<'_, ToolResult>;
}
