//! Report operations - read one report, list reports in folders, list report folders
//!
//! Every operation opens a metadata client from the caller's connection and
//! folds any failure into the returned [`Envelope`]; nothing is propagated.

use serde_json::Value;

use crate::connection::Connection;
use crate::metadata::{MetadataCategory, MetadataEntry, MetadataError};
use crate::Envelope;

/// Folders checked, in order, when no folder is given
pub const DEFAULT_REPORT_FOLDERS: [&str; 2] = ["unfiled$public", "Private Reports"];

/// Read full metadata (columns, filters, groupings, chart) for one report
pub async fn read_report(conn: &dyn Connection, report_name: &str) -> Envelope<Value> {
    tracing::debug!("reading report {}", report_name);
    match fetch_report(conn, report_name).await {
        Ok(metadata) => Envelope::ok(metadata),
        Err(e) => {
            tracing::warn!("read report {} failed: {}", report_name, e);
            Envelope::err(e.to_string())
        }
    }
}

async fn fetch_report(conn: &dyn Connection, report_name: &str) -> Result<Value, MetadataError> {
    let api = conn.metadata()?;
    api.retrieve(MetadataCategory::Report, report_name).await
}

/// List reports in one folder, or in [`DEFAULT_REPORT_FOLDERS`] when none is given.
///
/// Folders are queried one after another. A folder that fails does not fail
/// the call: its error is collected into the envelope's advisory and the
/// entries from the other folders are still returned.
pub async fn list_reports(
    conn: &dyn Connection,
    folder: Option<&str>,
    search_pattern: Option<&str>,
) -> Envelope<Vec<MetadataEntry>> {
    let api = match conn.metadata() {
        Ok(api) => api,
        Err(e) => return Envelope::err(e.to_string()),
    };

    let folders: Vec<&str> = match folder.filter(|f| !f.is_empty()) {
        Some(f) => vec![f],
        None => DEFAULT_REPORT_FOLDERS.to_vec(),
    };

    let mut reports = Vec::new();
    let mut failures = Vec::new();
    for name in folders {
        match api.list_in_folder(MetadataCategory::Report, name).await {
            Ok(entries) => reports.extend(entries.into_iter().flatten()),
            Err(e) => {
                tracing::warn!("listing reports in {} failed: {}", name, e);
                failures.push(format!("{name}: {e}"));
            }
        }
    }

    if let Some(pattern) = search_pattern.filter(|p| !p.is_empty()) {
        let pattern = pattern.to_lowercase();
        reports.retain(|report| report.matches(&pattern));
    }

    let advisory = (!failures.is_empty())
        .then(|| format!("Some folders failed: {}", failures.join("; ")));
    Envelope::partial(reports, advisory)
}

/// List all report folders visible to the connected user
pub async fn list_report_folders(conn: &dyn Connection) -> Envelope<Vec<MetadataEntry>> {
    match fetch_folders(conn).await {
        Ok(folders) => Envelope::ok(folders.into_iter().flatten().collect()),
        Err(e) => {
            tracing::warn!("listing report folders failed: {}", e);
            Envelope::err(e.to_string())
        }
    }
}

async fn fetch_folders(conn: &dyn Connection) -> Result<Vec<Option<MetadataEntry>>, MetadataError> {
    let api = conn.metadata()?;
    api.list_folders(MetadataCategory::Report).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::MetadataApi;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    type Listing = Result<Vec<Option<MetadataEntry>>, String>;

    #[derive(Clone, Default)]
    struct FakeApi {
        report: Option<Value>,
        folder_contents: HashMap<String, Listing>,
        folders: Option<Listing>,
        queried: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl MetadataApi for FakeApi {
        async fn retrieve(&self, category: MetadataCategory, name: &str) -> Result<Value, MetadataError> {
            assert_eq!(category, MetadataCategory::Report);
            self.report.clone().ok_or_else(|| MetadataError::not_found(name))
        }

        async fn list_in_folder(&self, _: MetadataCategory, folder: &str) -> Result<Vec<Option<MetadataEntry>>, MetadataError> {
            self.queried.lock().unwrap().push(folder.to_string());
            match self.folder_contents.get(folder) {
                Some(Ok(entries)) => Ok(entries.clone()),
                Some(Err(msg)) => Err(MetadataError::Transport(msg.clone())),
                None => Ok(Vec::new()),
            }
        }

        async fn list_folders(&self, _: MetadataCategory) -> Result<Vec<Option<MetadataEntry>>, MetadataError> {
            match self.folders.clone().unwrap_or_else(|| Ok(Vec::new())) {
                Ok(folders) => Ok(folders),
                Err(msg) => Err(MetadataError::Auth(msg)),
            }
        }
    }

    struct FakeConnection {
        api: FakeApi,
        broken: bool,
    }

    impl FakeConnection {
        fn new(api: FakeApi) -> Self {
            Self { api, broken: false }
        }

        fn broken() -> Self {
            Self { api: FakeApi::default(), broken: true }
        }
    }

    impl Connection for FakeConnection {
        fn metadata(&self) -> Result<Box<dyn MetadataApi + '_>, MetadataError> {
            if self.broken {
                return Err(MetadataError::invalid_connection("session handle closed"));
            }
            Ok(Box::new(self.api.clone()))
        }
    }

    fn entry(name: &str) -> Option<MetadataEntry> {
        Some(MetadataEntry::new(name))
    }

    #[tokio::test]
    async fn test_read_report_passes_metadata_through() {
        let metadata = json!({
            "reportMetadata": {
                "name": "Pipeline",
                "detailColumns": ["OPPORTUNITY_NAME", "AMOUNT"],
                "groupingsDown": [{"name": "STAGE_NAME", "sortOrder": "Asc"}],
                "reportFilters": [{"column": "AMOUNT", "operator": "greaterThan", "value": "1000"}],
                "chart": {"chartType": "Bar"}
            }
        });
        let conn = FakeConnection::new(FakeApi { report: Some(metadata.clone()), ..Default::default() });

        let result = read_report(&conn, "unfiled$public/Pipeline").await;
        assert!(result.success);
        assert!(result.error.is_none());

        let round_trip: Envelope<Value> =
            serde_json::from_str(&serde_json::to_string(&result).unwrap()).unwrap();
        assert_eq!(round_trip.data, Some(metadata));
    }

    #[tokio::test]
    async fn test_read_report_failure_becomes_error() {
        let conn = FakeConnection::new(FakeApi::default());
        let result = read_report(&conn, "Missing").await;
        assert!(!result.success);
        assert!(result.data.is_none());
        assert_eq!(result.error.as_deref(), Some("Not found: Missing"));
    }

    #[tokio::test]
    async fn test_default_folders_queried_in_order() {
        let api = FakeApi::default();
        let queried = api.queried.clone();
        let conn = FakeConnection::new(api);

        let result = list_reports(&conn, None, None).await;
        assert!(result.success);
        assert_eq!(*queried.lock().unwrap(), vec!["unfiled$public", "Private Reports"]);

        queried.lock().unwrap().clear();
        list_reports(&conn, Some(""), None).await;
        assert_eq!(*queried.lock().unwrap(), vec!["unfiled$public", "Private Reports"]);
    }

    #[tokio::test]
    async fn test_given_folder_is_the_only_one_queried() {
        let mut api = FakeApi::default();
        api.folder_contents.insert("Sales".into(), Ok(vec![entry("Sales/Pipeline")]));
        let queried = api.queried.clone();
        let conn = FakeConnection::new(api);

        let result = list_reports(&conn, Some("Sales"), None).await;
        assert_eq!(*queried.lock().unwrap(), vec!["Sales"]);
        assert_eq!(result.data.unwrap(), vec![MetadataEntry::new("Sales/Pipeline")]);
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn test_partial_folder_failure_keeps_other_results() {
        let mut api = FakeApi::default();
        api.folder_contents.insert("unfiled$public".into(), Ok(vec![entry("unfiled$public/Pipeline")]));
        api.folder_contents.insert("Private Reports".into(), Err("connection reset".into()));
        let conn = FakeConnection::new(api);

        let result = list_reports(&conn, None, None).await;
        assert!(result.success);
        assert_eq!(result.data.unwrap(), vec![MetadataEntry::new("unfiled$public/Pipeline")]);
        let advisory = result.error.unwrap();
        assert!(advisory.starts_with("Some folders failed: "));
        assert!(advisory.contains("Private Reports: Request failed: connection reset"));
        assert!(!advisory.contains("unfiled$public"));
    }

    #[tokio::test]
    async fn test_all_folders_failing_still_succeeds() {
        let mut api = FakeApi::default();
        api.folder_contents.insert("unfiled$public".into(), Err("a".into()));
        api.folder_contents.insert("Private Reports".into(), Err("b".into()));
        let conn = FakeConnection::new(api);

        let result = list_reports(&conn, None, None).await;
        assert!(result.success);
        assert_eq!(result.data, Some(Vec::new()));
        assert_eq!(
            result.error.as_deref(),
            Some("Some folders failed: unfiled$public: Request failed: a; Private Reports: Request failed: b")
        );
    }

    #[tokio::test]
    async fn test_null_entries_dropped_and_folders_concatenated() {
        let mut api = FakeApi::default();
        api.folder_contents.insert("unfiled$public".into(), Ok(vec![None, entry("unfiled$public/A")]));
        api.folder_contents.insert("Private Reports".into(), Ok(vec![entry("Private Reports/B"), None]));
        let conn = FakeConnection::new(api);

        let names: Vec<String> = list_reports(&conn, None, None).await
            .data.unwrap()
            .into_iter()
            .map(|e| e.full_name)
            .collect();
        assert_eq!(names, vec!["unfiled$public/A", "Private Reports/B"]);
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() {
        let mut api = FakeApi::default();
        api.folder_contents.insert("Sales".into(), Ok(vec![
            entry("MyReport"),
            entry("Forecast"),
            Some(MetadataEntry::new("Quota").with_namespace("ReportPack")),
        ]));
        let conn = FakeConnection::new(api);

        for pattern in ["myreport", "REPORT"] {
            let names: Vec<String> = list_reports(&conn, Some("Sales"), Some(pattern)).await
                .data.unwrap()
                .into_iter()
                .map(|e| e.full_name)
                .collect();
            if pattern == "myreport" {
                assert_eq!(names, vec!["MyReport"]);
            } else {
                assert_eq!(names, vec!["MyReport", "Quota"]);
            }
        }

        let all = list_reports(&conn, Some("Sales"), Some("")).await;
        assert_eq!(all.data.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_folder_listing_drops_nulls() {
        let api = FakeApi {
            folders: Some(Ok(vec![entry("Sales_Reports"), None, entry("Marketing")])),
            ..Default::default()
        };
        let conn = FakeConnection::new(api);

        let result = list_report_folders(&conn).await;
        assert!(result.success);
        assert_eq!(result.data.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_folder_listing_failure() {
        let api = FakeApi { folders: Some(Err("INVALID_SESSION_ID".into())), ..Default::default() };
        let result = list_report_folders(&FakeConnection::new(api)).await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Authentication failed: INVALID_SESSION_ID"));
    }

    #[tokio::test]
    async fn test_broken_connection_fails_every_operation() {
        let conn = FakeConnection::broken();
        let expected = Some("Invalid connection: session handle closed");

        let read = read_report(&conn, "Pipeline").await;
        assert!(!read.success);
        assert_eq!(read.error.as_deref(), expected);

        let list = list_reports(&conn, None, Some("x")).await;
        assert!(!list.success);
        assert!(list.data.is_none());
        assert_eq!(list.error.as_deref(), expected);

        let folders = list_report_folders(&conn).await;
        assert!(!folders.success);
        assert_eq!(folders.error.as_deref(), expected);
    }
}
