//! REST metadata client - Salesforce REST + Analytics APIs
//!
//! Architecture:
//! - Listings: SOQL over the category sObject and `Folder` (GET /query, follows nextRecordsUrl)
//! - Single record: resolve the id by developer name, then GET /analytics/<kind>/<id>/describe

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;

use super::{MetadataApi, MetadataCategory, MetadataEntry, MetadataError};
use crate::connection::SalesforceConnection;

/// Folders the Metadata API names by key that SOQL exposes under a label
const WELL_KNOWN_FOLDERS: &[(&str, &str)] = &[
    ("unfiled$public", "Public Reports"),
    ("Private Reports", "Private Reports"),
];

/// One page of a SOQL query response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryPage {
    #[serde(default)]
    records: Vec<Value>,
    #[serde(default)]
    done: bool,
    next_records_url: Option<String>,
}

/// Error body item Salesforce returns on failed requests
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiErrorItem {
    message: String,
    error_code: Option<String>,
}

/// Where a folder's records live, as SOQL sees them
#[derive(Debug, Clone, PartialEq)]
enum FolderScope {
    /// Well-known folder, matched on `FolderName`
    Label(&'static str),
    /// Any other folder, matched on `OwnerId`
    Owner(String),
}

impl FolderScope {
    fn condition(&self) -> String {
        match self {
            FolderScope::Label(label) => format!("FolderName = '{}'", escape_soql(label)),
            FolderScope::Owner(id) => format!("OwnerId = '{}'", escape_soql(id)),
        }
    }

    fn contains(&self, row: &Value) -> bool {
        match self {
            FolderScope::Label(label) => str_field(row, "FolderName") == Some(*label),
            FolderScope::Owner(id) => str_field(row, "OwnerId") == Some(id.as_str()),
        }
    }
}

/// Metadata client bound to one connection
pub struct RestMetadataClient<'a> {
    conn: &'a SalesforceConnection,
    instance_url: String,
    base_url: String,
}

impl<'a> RestMetadataClient<'a> {
    /// Validate the connection settings and bind to it
    pub fn new(conn: &'a SalesforceConnection) -> Result<Self, MetadataError> {
        let instance_url = conn.instance_url().trim().trim_end_matches('/');
        let parsed = Url::parse(instance_url)
            .map_err(|e| MetadataError::invalid_connection(format!("Bad instance URL '{instance_url}': {e}")))?;
        if parsed.scheme() != "https" && parsed.scheme() != "http" {
            return Err(MetadataError::invalid_connection(format!(
                "Instance URL must be http(s): {instance_url}"
            )));
        }
        if conn.access_token().trim().is_empty() {
            return Err(MetadataError::invalid_connection("No access token configured"));
        }
        let version = conn.api_version().trim().trim_start_matches('v');
        if version.is_empty() {
            return Err(MetadataError::invalid_connection("No API version configured"));
        }

        Ok(Self {
            conn,
            instance_url: instance_url.to_string(),
            base_url: format!("{instance_url}/services/data/v{version}"),
        })
    }

    async fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value, MetadataError> {
        tracing::debug!("GET {}", url);
        let response = self.conn.client()
            .get(url)
            .bearer_auth(self.conn.access_token())
            .header("Accept", "application/json")
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(error_from_response(status.as_u16(), &text));
        }

        response.json::<Value>().await
            .map_err(|e| MetadataError::Malformed(format!("Invalid JSON from {url}: {e}")))
    }

    /// Run a SOQL query and collect every page
    async fn query(&self, soql: &str) -> Result<Vec<Value>, MetadataError> {
        let url = format!("{}/query", self.base_url);
        let mut page = parse_page(self.get_json(&url, &[("q", soql)]).await?)?;
        let mut records = std::mem::take(&mut page.records);

        while !page.done {
            let Some(next) = page.next_records_url.take() else { break };
            let url = format!("{}{}", self.instance_url, next);
            page = parse_page(self.get_json(&url, &[]).await?)?;
            records.append(&mut page.records);
        }

        tracing::debug!("SOQL returned {} rows", records.len());
        Ok(records)
    }

    /// Id of the folder with this developer name
    async fn folder_id(&self, category: MetadataCategory, folder: &str) -> Result<String, MetadataError> {
        let soql = format!(
            "SELECT Id FROM Folder WHERE Type = '{}' AND DeveloperName = '{}' LIMIT 1",
            category.folder_type(),
            escape_soql(folder)
        );
        self.query(&soql).await?
            .first()
            .and_then(|row| str_field(row, "Id"))
            .map(String::from)
            .ok_or_else(|| MetadataError::not_found(format!("{} folder {}", category, folder)))
    }

    /// Resolve a folder name to the SOQL condition selecting its records
    async fn folder_scope(&self, category: MetadataCategory, folder: &str) -> Result<FolderScope, MetadataError> {
        match well_known_label(folder) {
            Some(label) => Ok(FolderScope::Label(label)),
            None => Ok(FolderScope::Owner(self.folder_id(category, folder).await?)),
        }
    }
}

#[async_trait]
impl<'a> MetadataApi for RestMetadataClient<'a> {
    async fn retrieve(&self, category: MetadataCategory, name: &str) -> Result<Value, MetadataError> {
        let (folder, developer_name) = split_full_name(name);
        if developer_name.is_empty() {
            return Err(MetadataError::not_found(format!("{} '{}'", category, name)));
        }

        let scope = match folder {
            Some(folder) => Some(self.folder_scope(category, folder).await?),
            None => None,
        };

        let mut soql = format!(
            "SELECT Id, DeveloperName, FolderName, OwnerId FROM {} WHERE DeveloperName = '{}'",
            category.sobject(),
            escape_soql(developer_name)
        );
        if let Some(scope) = &scope {
            soql.push_str(&format!(" AND {}", scope.condition()));
        }
        let rows = self.query(&soql).await?;
        let id = pick_record_id(&rows, scope.as_ref())
            .ok_or_else(|| MetadataError::not_found(format!("{} {}", category, name)))?;

        let url = format!("{}/analytics/{}/{}/describe", self.base_url, category.analytics_path(), id);
        self.get_json(&url, &[]).await
    }

    async fn list_in_folder(
        &self,
        category: MetadataCategory,
        folder: &str,
    ) -> Result<Vec<Option<MetadataEntry>>, MetadataError> {
        let scope = self.folder_scope(category, folder).await?;
        let soql = format!(
            "SELECT Id, Name, DeveloperName, NamespacePrefix, FolderName, LastModifiedDate \
             FROM {} WHERE {} ORDER BY DeveloperName",
            category.sobject(),
            scope.condition()
        );
        let rows = self.query(&soql).await?;
        Ok(rows.iter().map(|row| record_entry(category, folder, row)).collect())
    }

    async fn list_folders(&self, category: MetadataCategory) -> Result<Vec<Option<MetadataEntry>>, MetadataError> {
        let soql = format!(
            "SELECT Id, Name, DeveloperName, NamespacePrefix, AccessType, LastModifiedDate \
             FROM Folder WHERE Type = '{}' ORDER BY DeveloperName",
            category.folder_type()
        );
        let rows = self.query(&soql).await?;
        Ok(rows.iter().map(|row| folder_entry(category, row)).collect())
    }
}

fn parse_page(value: Value) -> Result<QueryPage, MetadataError> {
    serde_json::from_value(value).map_err(|e| MetadataError::Malformed(format!("Unexpected query response: {e}")))
}

fn error_from_response(status: u16, body: &str) -> MetadataError {
    let message = match serde_json::from_str::<Vec<ApiErrorItem>>(body) {
        Ok(items) if !items.is_empty() => items.iter()
            .map(|item| match &item.error_code {
                Some(code) => format!("{}: {}", code, item.message),
                None => item.message.clone(),
            })
            .collect::<Vec<_>>()
            .join("; "),
        _ if !body.trim().is_empty() => body.trim().to_string(),
        _ => format!("HTTP {status}"),
    };

    match status {
        401 | 403 => MetadataError::Auth(message),
        404 => MetadataError::NotFound(message),
        _ => MetadataError::Api { status, message },
    }
}

/// Escape a value for use inside a single-quoted SOQL literal
fn escape_soql(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Split `folder/DeveloperName` into its parts; the folder is optional
fn split_full_name(name: &str) -> (Option<&str>, &str) {
    let name = name.trim();
    match name.rsplit_once('/') {
        Some((folder, developer_name)) if !folder.is_empty() => (Some(folder), developer_name),
        Some((_, developer_name)) => (None, developer_name),
        None => (None, name),
    }
}

fn well_known_label(folder: &str) -> Option<&'static str> {
    WELL_KNOWN_FOLDERS.iter()
        .find(|(key, _)| *key == folder)
        .map(|(_, label)| *label)
}

/// First row inside the scope; any row when no folder was named
fn pick_record_id(rows: &[Value], scope: Option<&FolderScope>) -> Option<String> {
    rows.iter()
        .find(|row| scope.map_or(true, |scope| scope.contains(row)))
        .and_then(|row| str_field(row, "Id"))
        .map(String::from)
}

fn str_field<'v>(row: &'v Value, key: &str) -> Option<&'v str> {
    row.get(key).and_then(|v| v.as_str())
}

fn record_entry(category: MetadataCategory, folder: &str, row: &Value) -> Option<MetadataEntry> {
    let developer_name = str_field(row, "DeveloperName").filter(|n| !n.is_empty())?;
    let (dir, suffix) = category.file_layout();

    let mut entry = MetadataEntry::new(format!("{folder}/{developer_name}"))
        .with_attribute("type", category.sobject())
        .with_attribute("fileName", format!("{dir}/{folder}/{developer_name}.{suffix}"));
    if let Some(prefix) = str_field(row, "NamespacePrefix") {
        entry = entry.with_namespace(prefix);
    }
    copy_fields(&mut entry, row, &[("Id", "id"), ("Name", "label"), ("LastModifiedDate", "lastModifiedDate")]);
    Some(entry)
}

fn folder_entry(category: MetadataCategory, row: &Value) -> Option<MetadataEntry> {
    let developer_name = str_field(row, "DeveloperName").filter(|n| !n.is_empty())?;

    let mut entry = MetadataEntry::new(developer_name)
        .with_attribute("type", format!("{}Folder", category.sobject()));
    if let Some(prefix) = str_field(row, "NamespacePrefix") {
        entry = entry.with_namespace(prefix);
    }
    copy_fields(&mut entry, row, &[
        ("Id", "id"),
        ("Name", "label"),
        ("AccessType", "accessType"),
        ("LastModifiedDate", "lastModifiedDate"),
    ]);
    Some(entry)
}

fn copy_fields(entry: &mut MetadataEntry, row: &Value, fields: &[(&str, &str)]) {
    for (from, to) in fields {
        if let Some(value) = row.get(*from).filter(|v| !v.is_null()) {
            entry.attributes.insert((*to).to_string(), value.clone());
        }
    }
}
