//! MCP Server implementation
//!
//! Speaks MCP protocol (JSON-RPC 2.0, one message per line) over stdio.
//! Tools run in-process against the configured Salesforce connection.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::Tool;

const PROTOCOL_VERSION: &str = "2024-11-05";

/// MCP JSON-RPC request
#[derive(Debug, Deserialize)]
struct McpRequest {
    #[allow(dead_code)]
    jsonrpc: String,
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Value,
}

/// MCP JSON-RPC response
#[derive(Debug, Serialize)]
struct McpResponse {
    jsonrpc: String,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<McpError>,
}

#[derive(Debug, Serialize)]
struct McpError {
    code: i32,
    message: String,
}

impl McpResponse {
    fn ok(id: Value, result: Value) -> Self {
        Self { jsonrpc: "2.0".into(), id, result: Some(result), error: None }
    }

    fn err(id: Value, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            id,
            result: None,
            error: Some(McpError { code, message: message.into() })
        }
    }
}

/// MCP Server - handles stdio communication
pub struct McpServer {
    tools: Vec<Box<dyn Tool>>,
}

impl McpServer {
    pub fn new(tools: Vec<Box<dyn Tool>>) -> Self {
        Self { tools }
    }

    /// Run the server on stdin/stdout until stdin closes
    pub async fn run(&self) -> std::io::Result<()> {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.serve(stdin, stdout).await
    }

    /// Serve line-delimited requests from `reader`, writing responses to `writer`
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        tracing::info!("MCP server ready ({} tools)", self.tools.len());
        let mut lines = reader.lines();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            let Some(response) = self.handle_line(&line).await else { continue };
            let mut output = serde_json::to_string(&response)?;
            output.push('\n');
            writer.write_all(output.as_bytes()).await?;
            writer.flush().await?;
        }

        tracing::info!("stdin closed, MCP server stopping");
        Ok(())
    }

    /// Handle one message; notifications get no response
    async fn handle_line(&self, line: &str) -> Option<McpResponse> {
        let req: McpRequest = match serde_json::from_str(line) {
            Ok(r) => r,
            Err(e) => return Some(McpResponse::err(Value::Null, -32700, format!("Parse error: {}", e))),
        };

        if req.id.is_none() && req.method.starts_with("notifications/") {
            tracing::debug!("notification {}", req.method);
            return None;
        }

        let id = req.id.unwrap_or(Value::Null);
        tracing::debug!("request {}", req.method);

        Some(match req.method.as_str() {
            "initialize" => self.handle_initialize(id),
            "ping" => McpResponse::ok(id, json!({})),
            "tools/list" => self.handle_tools_list(id),
            "tools/call" => self.handle_tools_call(id, req.params).await,
            "notifications/initialized" => McpResponse::ok(id, json!({})),
            _ => McpResponse::err(id, -32601, format!("Method not found: {}", req.method)),
        })
    }

    fn handle_initialize(&self, id: Value) -> McpResponse {
        McpResponse::ok(id, json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {}
            },
            "serverInfo": {
                "name": "sfmeta",
                "version": env!("CARGO_PKG_VERSION")
            }
        }))
    }

    fn handle_tools_list(&self, id: Value) -> McpResponse {
        let tools: Vec<Value> = self.tools.iter().map(|t| {
            json!({
                "name": t.name(),
                "description": t.description(),
                "inputSchema": t.schema()
            })
        }).collect();

        McpResponse::ok(id, json!({ "tools": tools }))
    }

    async fn handle_tools_call(&self, id: Value, params: Value) -> McpResponse {
        let name = params.get("name").and_then(|n| n.as_str()).unwrap_or("");
        let args = params.get("arguments").cloned().unwrap_or(json!({}));

        let tool = match self.tools.iter().find(|t| t.name() == name) {
            Some(t) => t,
            None => return McpResponse::err(id, -32602, format!("Unknown tool: {}", name)),
        };

        let result = tool.execute(args).await;
        if !result.success {
            tracing::warn!("tool {} failed: {}", name, result.error.as_deref().unwrap_or(""));
        }

        let content = vec![json!({
            "type": "text",
            "text": if result.success { result.output } else { result.error.unwrap_or_default() }
        })];

        McpResponse::ok(id, json!({
            "content": content,
            "isError": !result.success
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BoxFuture, ToolResult};

    struct EchoTool;

    impl Tool for EchoTool {
        fn name(&self) -> &'static str { "echo" }
        fn description(&self) -> &'static str { "Echo the text argument" }
        fn schema(&self) -> Value {
            json!({"type": "object", "properties": {"text": {"type": "string"}}, "required": ["text"]})
        }
        fn execute(&self, args: Value) -> BoxFuture<'_, ToolResult> {
            Box::pin(async move {
                match args.get("text").and_then(|t| t.as_str()) {
                    Some(text) => ToolResult::ok(text),
                    None => ToolResult::err("missing text"),
                }
            })
        }
    }

    fn server() -> McpServer {
        McpServer::new(vec![Box::new(EchoTool)])
    }

    async fn call(line: &str) -> Value {
        let response = server().handle_line(line).await.expect("response expected");
        serde_json::to_value(response).unwrap()
    }

    #[tokio::test]
    async fn test_initialize() {
        let resp = call(r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#).await;
        assert_eq!(resp["id"], 1);
        assert_eq!(resp["result"]["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(resp["result"]["serverInfo"]["name"], "sfmeta");
    }

    #[tokio::test]
    async fn test_tools_list() {
        let resp = call(r#"{"jsonrpc":"2.0","id":"a","method":"tools/list"}"#).await;
        let tools = resp["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0]["name"], "echo");
        assert_eq!(tools[0]["inputSchema"]["required"][0], "text");
    }

    #[tokio::test]
    async fn test_tools_call_success_and_failure() {
        let ok = call(r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"echo","arguments":{"text":"hi"}}}"#).await;
        assert_eq!(ok["result"]["isError"], false);
        assert_eq!(ok["result"]["content"][0]["text"], "hi");

        let failed = call(r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"echo"}}"#).await;
        assert_eq!(failed["result"]["isError"], true);
        assert_eq!(failed["result"]["content"][0]["text"], "missing text");
    }

    #[tokio::test]
    async fn test_protocol_errors() {
        let unknown_tool = call(r#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{"name":"nope"}}"#).await;
        assert_eq!(unknown_tool["error"]["code"], -32602);

        let unknown_method = call(r#"{"jsonrpc":"2.0","id":5,"method":"resources/list"}"#).await;
        assert_eq!(unknown_method["error"]["code"], -32601);

        let parse_error = call("{not json").await;
        assert_eq!(parse_error["error"]["code"], -32700);
        assert!(parse_error["id"].is_null());
    }

    #[tokio::test]
    async fn test_serve_skips_notifications() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#, "\n",
            "\n",
            r#"{"jsonrpc":"2.0","id":7,"method":"ping"}"#, "\n",
        );
        let mut output = Vec::new();
        server().serve(input.as_bytes(), &mut output).await.unwrap();

        let text = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 1);
        let resp: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(resp["id"], 7);
        assert_eq!(resp["result"], json!({}));
    }
}
