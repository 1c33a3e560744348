//! Connection handle - authenticated session context for one Salesforce org
//!
//! The handle is built by the caller and only read by the report handlers.
//! Its one job is to hand out a metadata client bound to itself.

use reqwest::Client;
use std::time::Duration;

use crate::config::Config;
use crate::metadata::{MetadataApi, MetadataError, RestMetadataClient};

/// Session context the handlers open a metadata client from
pub trait Connection: Send + Sync {
    /// Build a metadata client bound to this connection
    fn metadata(&self) -> Result<Box<dyn MetadataApi + '_>, MetadataError>;
}

/// Connection to a Salesforce org via an OAuth access token
#[derive(Debug, Clone)]
pub struct SalesforceConnection {
    client: Client,
    instance_url: String,
    access_token: String,
    api_version: String,
}

impl SalesforceConnection {
    /// Create with a default HTTP client
    pub fn new(
        instance_url: impl Into<String>,
        access_token: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            instance_url: instance_url.into(),
            access_token: access_token.into(),
            api_version: api_version.into(),
        }
    }

    /// Create from loaded configuration, applying the request timeout
    pub fn from_config(config: &Config) -> Result<Self, MetadataError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| MetadataError::invalid_connection(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            instance_url: config.instance_url.clone(),
            access_token: config.access_token.clone(),
            api_version: config.api_version.clone(),
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn instance_url(&self) -> &str {
        &self.instance_url
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }
}

impl Connection for SalesforceConnection {
    fn metadata(&self) -> Result<Box<dyn MetadataApi + '_>, MetadataError> {
        Ok(Box::new(RestMetadataClient::new(self)?))
    }
}
