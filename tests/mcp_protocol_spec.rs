//! MCP protocol integration tests.
//!
//! These tests spawn the actual `news-curator mcp` process and communicate via
//! JSON-RPC over stdio, testing the complete MCP protocol flow.
//!
//! The rmcp library uses line-delimited JSON (each message is one line):
//! ```
//! {"jsonrpc":"2.0","id":1,"method":"initialize",...}\n
//! {"jsonrpc":"2.0","id":1,"result":{...}}\n
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, Command, Stdio};

/// JSON-RPC 2.0 request
#[derive(Debug, Serialize)]
struct JsonRpcRequest {
    jsonrpc: &'static str,
    id: u64,
    method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<Value>,
}

/// JSON-RPC 2.0 response
#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[allow(dead_code)]
    jsonrpc: String,
    #[allow(dead_code)]
    id: Option<u64>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct JsonRpcError {
    code: i64,
    message: String,
    data: Option<Value>,
}

/// MCP test client that spawns and communicates with the server
struct McpTestClient {
    child: Child,
    request_id: u64,
    reader: BufReader<std::process::ChildStdout>,
}

impl McpTestClient {
    /// Spawn a new MCP server process with an isolated test database
    fn spawn() -> Self {
        // Create temp directory for test database
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");

        // No API keys: the server starts read-only
        let mut child = Command::new(env!("CARGO_BIN_EXE_news-curator"))
            .arg("mcp")
            .env("NEWS_CURATOR_DB", temp_dir.path().join("news.db"))
            .env_remove("GNEWS_API_KEY")
            .env_remove("ANTHROPIC_API_KEY")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .expect("Failed to spawn news-curator mcp");

        let stdout = child.stdout.take().expect("Failed to get stdout");
        let reader = BufReader::new(stdout);

        // Keep temp_dir alive by leaking it (tests are short-lived anyway)
        std::mem::forget(temp_dir);

        Self {
            child,
            request_id: 0,
            reader,
        }
    }

    /// Send a message as line-delimited JSON
    fn send_message(&mut self, content: &str) {
        let stdin = self.child.stdin.as_mut().expect("Failed to get stdin");
        writeln!(stdin, "{}", content).expect("Failed to write message");
        stdin.flush().expect("Failed to flush stdin");
    }

    /// Read a message as line-delimited JSON
    fn read_message(&mut self) -> String {
        let mut line = String::new();
        self.reader
            .read_line(&mut line)
            .expect("Failed to read line");
        line.trim().to_string()
    }

    /// Send a JSON-RPC request and get the response
    fn request(&mut self, method: &str, params: Option<Value>) -> JsonRpcResponse {
        self.request_id += 1;
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: self.request_id,
            method: method.to_string(),
            params,
        };

        let request_json = serde_json::to_string(&request).expect("Failed to serialize request");
        self.send_message(&request_json);

        let response_json = self.read_message();
        serde_json::from_str(&response_json).expect("Failed to parse response")
    }

    /// Send initialize request and initialized notification (required first messages)
    fn initialize(&mut self) -> JsonRpcResponse {
        let response = self.request(
            "initialize",
            Some(json!({
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "clientInfo": {
                    "name": "test-client",
                    "version": "1.0.0"
                }
            })),
        );

        // Send initialized notification (required by MCP protocol)
        let notification = json!({
            "jsonrpc": "2.0",
            "method": "notifications/initialized"
        });
        self.send_message(&notification.to_string());

        response
    }

    /// List available tools
    fn list_tools(&mut self) -> JsonRpcResponse {
        self.request("tools/list", None)
    }

    /// Call a tool with parameters
    fn call_tool(&mut self, name: &str, arguments: Value) -> JsonRpcResponse {
        self.request(
            "tools/call",
            Some(json!({
                "name": name,
                "arguments": arguments
            })),
        )
    }
}

impl Drop for McpTestClient {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

// ============================================================
// Protocol Tests
// ============================================================

/// Text of the first content block of a tool result.
fn result_text(result: &Value) -> &str {
    result["content"][0]["text"].as_str().unwrap_or("")
}

fn is_error(result: &Value) -> bool {
    result
        .get("isError")
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
}

mod protocol {
    use super::*;

    #[test]
    fn initialize_returns_server_info() {
        let mut client = McpTestClient::spawn();
        let response = client.initialize();

        assert!(response.error.is_none(), "Expected success, got error");
        let result = response.result.expect("Expected result");

        assert_eq!(result["serverInfo"]["name"], "news-curator");
        assert!(result.get("capabilities").is_some());
    }

    #[test]
    fn tools_list_returns_all_tools() {
        let mut client = McpTestClient::spawn();
        client.initialize();

        let response = client.list_tools();
        assert!(response.error.is_none(), "Expected success, got error");

        let result = response.result.expect("Expected result");
        let tools = result["tools"].as_array().expect("Tools should be array");

        let mut tool_names: Vec<&str> = tools
            .iter()
            .filter_map(|t| t.get("name").and_then(|n| n.as_str()))
            .collect();
        tool_names.sort();

        assert_eq!(
            tool_names,
            vec!["curate_news", "news_feedback", "news_history", "news_preferences"]
        );

        for tool in tools {
            let name = tool["name"].as_str().unwrap_or("?");
            assert!(tool.get("description").is_some(), "Tool {} missing description", name);
            assert!(tool.get("inputSchema").is_some(), "Tool {} missing inputSchema", name);
        }
    }
}

// ============================================================
// Tool Call Tests
// ============================================================

mod tool_calls {
    use super::*;

    #[test]
    fn preferences_view_shows_defaults() {
        let mut client = McpTestClient::spawn();
        client.initialize();

        let response = client.call_tool("news_preferences", json!({ "action": "view" }));
        let result = response.result.expect("Expected result");

        assert!(!is_error(&result));
        assert!(result_text(&result).contains("\"articles_per_day\": 2"));
    }

    #[test]
    fn preferences_update_is_visible_in_view() {
        let mut client = McpTestClient::spawn();
        client.initialize();

        client.call_tool(
            "news_preferences",
            json!({ "action": "update", "key": "articles_per_day", "value": "4" }),
        );
        let response = client.call_tool("news_preferences", json!({ "action": "view" }));
        let result = response.result.expect("Expected result");

        assert!(result_text(&result).contains("\"articles_per_day\": 4"));
    }

    #[test]
    fn feedback_on_unknown_article_is_an_error_result() {
        let mut client = McpTestClient::spawn();
        client.initialize();

        let response = client.call_tool(
            "news_feedback",
            json!({ "article_id": "00000000-0000-0000-0000-000000000000", "liked": true }),
        );
        let result = response.result.expect("Expected result");

        assert!(is_error(&result));
        assert!(result_text(&result).contains("Article not found"));
    }

    #[test]
    fn curate_without_api_keys_reports_failure() {
        let mut client = McpTestClient::spawn();
        client.initialize();

        let response = client.call_tool("curate_news", json!({}));
        let result = response.result.expect("Expected result");

        assert!(is_error(&result));
        assert!(result_text(&result).contains("not configured"));
    }

    #[test]
    fn history_defaults_to_seven_days() {
        let mut client = McpTestClient::spawn();
        client.initialize();

        let response = client.call_tool("news_history", json!({}));
        let result = response.result.expect("Expected result");

        assert!(!is_error(&result));
        assert!(result_text(&result).starts_with("Curation History (Last 7 days)"));
    }
}
