//! Report tools - read report metadata, list reports, list report folders

use crate::connection::Connection;
use crate::reports;
use crate::tools::ToolDescriptor;
use crate::{BoxFuture, Tool, ToolResult};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

// ==================== descriptors ====================

pub const READ_REPORT: ToolDescriptor = ToolDescriptor {
    name: "salesforce_read_report",
    description: "Read detailed metadata for a Salesforce report including columns, filters, groupings, and chart configuration. Use this to inspect existing reports and understand their structure.",
    input_schema: read_report_schema,
};

pub const LIST_REPORTS: ToolDescriptor = ToolDescriptor {
    name: "salesforce_list_reports",
    description: "List reports in Salesforce folders.

IMPORTANT: Reports in Salesforce are organized in folders. This tool will:
- If folder is specified: List reports in that specific folder
- If no folder specified: Check common folders (\"unfiled$public\" and \"Private Reports\")
- Cannot list ALL reports across all folders in one call (Salesforce API limitation)

TIP: Use salesforce_list_report_folders first to discover available folders, then call this tool with specific folder names.",
    input_schema: list_reports_schema,
};

pub const LIST_REPORT_FOLDERS: ToolDescriptor = ToolDescriptor {
    name: "salesforce_list_report_folders",
    description: "List all report folders in Salesforce. Use this to discover available folders before listing reports.

NOTE: You may only see folders that you created and the \"unfiled$public\" folder. Standard folders like \"Activity Reports\" may not appear depending on permissions.",
    input_schema: list_report_folders_schema,
};

fn read_report_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "reportName": {
                "type": "string",
                "description": "Full name of the report (e.g., \"unfiled$public/Report_Name\" or just \"Report_Name\")"
            }
        },
        "required": ["reportName"]
    })
}

fn list_reports_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "folder": {
                "type": "string",
                "description": "Folder name to list reports from (e.g., \"unfiled$public\", \"Private Reports\"). If not specified, will check common folders."
            },
            "searchPattern": {
                "type": "string",
                "description": "Optional search pattern to filter reports by name"
            }
        }
    })
}

fn list_report_folders_schema() -> Value {
    json!({
        "type": "object",
        "properties": {}
    })
}

// ==================== salesforce_read_report ====================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadReportArgs {
    pub report_name: String,
}

pub struct ReadReportTool {
    conn: Arc<dyn Connection>,
}

impl ReadReportTool {
    pub fn new(conn: Arc<dyn Connection>) -> Self {
        Self { conn }
    }
}

impl Tool for ReadReportTool {
    fn name(&self) -> &'static str { READ_REPORT.name }
    fn description(&self) -> &'static str { READ_REPORT.description }
    fn schema(&self) -> Value { READ_REPORT.schema() }
    fn execute(&self, args: Value) -> BoxFuture<'_, ToolResult> {
        Box::pin(async move {
            let args: ReadReportArgs = match serde_json::from_value(args) {
                Ok(a) => a,
                Err(e) => return ToolResult::err(format!("Invalid args: {e}")),
            };
            ToolResult::from(reports::read_report(self.conn.as_ref(), &args.report_name).await)
        })
    }
}

// ==================== salesforce_list_reports ====================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListReportsArgs {
    pub folder: Option<String>,
    pub search_pattern: Option<String>,
}

pub struct ListReportsTool {
    conn: Arc<dyn Connection>,
}

impl ListReportsTool {
    pub fn new(conn: Arc<dyn Connection>) -> Self {
        Self { conn }
    }
}

impl Tool for ListReportsTool {
    fn name(&self) -> &'static str { LIST_REPORTS.name }
    fn description(&self) -> &'static str { LIST_REPORTS.description }
    fn schema(&self) -> Value { LIST_REPORTS.schema() }
    fn execute(&self, args: Value) -> BoxFuture<'_, ToolResult> {
        Box::pin(async move {
            let args: ListReportsArgs = if args.is_null() {
                ListReportsArgs::default()
            } else {
                match serde_json::from_value(args) {
                    Ok(a) => a,
                    Err(e) => return ToolResult::err(format!("Invalid args: {e}")),
                }
            };
            ToolResult::from(reports::list_reports(
                self.conn.as_ref(),
                args.folder.as_deref(),
                args.search_pattern.as_deref(),
            ).await)
        })
    }
}

// ==================== salesforce_list_report_folders ====================

pub struct ListReportFoldersTool {
    conn: Arc<dyn Connection>,
}

impl ListReportFoldersTool {
    pub fn new(conn: Arc<dyn Connection>) -> Self {
        Self { conn }
    }
}

impl Tool for ListReportFoldersTool {
    fn name(&self) -> &'static str { LIST_REPORT_FOLDERS.name }
    fn description(&self) -> &'static str { LIST_REPORT_FOLDERS.description }
    fn schema(&self) -> Value { LIST_REPORT_FOLDERS.schema() }
    fn execute(&self, _args: Value) -> BoxFuture<'_, ToolResult> {
        Box::pin(async move {
            ToolResult::from(reports::list_report_folders(self.conn.as_ref()).await)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn required(schema: &Value) -> Vec<&str> {
        schema.get("required")
            .and_then(|r| r.as_array())
            .map(|r| r.iter().filter_map(|v| v.as_str()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_read_report_requires_name() {
        let schema = READ_REPORT.schema();
        assert_eq!(required(&schema), vec!["reportName"]);
        assert_eq!(schema["properties"]["reportName"]["type"], "string");
    }

    #[test]
    fn test_listing_tools_have_no_required_params() {
        let schema = LIST_REPORTS.schema();
        assert!(required(&schema).is_empty());
        assert!(schema["properties"].get("folder").is_some());
        assert!(schema["properties"].get("searchPattern").is_some());

        let schema = LIST_REPORT_FOLDERS.schema();
        assert!(required(&schema).is_empty());
        assert_eq!(schema["properties"], json!({}));
    }

    #[test]
    fn test_list_reports_args_are_camel_case() {
        let args: ListReportsArgs = serde_json::from_value(json!({"searchPattern": "pipe"})).unwrap();
        assert_eq!(args.search_pattern.as_deref(), Some("pipe"));
        assert!(args.folder.is_none());
    }
}
