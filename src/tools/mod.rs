//! Tool registry

pub mod report;

pub use report::{ListReportFoldersTool, ListReportsTool, ReadReportTool};

use crate::connection::Connection;
use crate::Tool;
use serde_json::Value;
use std::sync::Arc;

/// Static description of a callable tool, as advertised to dispatchers
#[derive(Debug, Clone, Copy)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: fn() -> Value,
}

impl ToolDescriptor {
    pub fn schema(&self) -> Value {
        (self.input_schema)()
    }
}

/// Descriptors of all available tools
pub fn descriptors() -> [ToolDescriptor; 3] {
    [report::READ_REPORT, report::LIST_REPORTS, report::LIST_REPORT_FOLDERS]
}

/// All available tools, bound to one connection
pub fn all_tools(conn: Arc<dyn Connection>) -> Vec<Box<dyn Tool>> {
    vec![
        Box::new(ReadReportTool::new(conn.clone())),
        Box::new(ListReportsTool::new(conn.clone())),
        Box::new(ListReportFoldersTool::new(conn)),
    ]
}

/// Find tool by name
pub fn find_tool(conn: Arc<dyn Connection>, name: &str) -> Option<Box<dyn Tool>> {
    all_tools(conn).into_iter().find(|t| t.name() == name)
}
