//! MCP (Model Context Protocol) server exposing the `search` tool.
//!
//! Hand-rolled JSON-RPC 2.0 over stdio: one request line in, one response
//! line out. stdout is reserved for protocol messages; diagnostics go to the
//! tracing subscriber on stderr.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, error, info};

use crate::error::{Error, RpcErrorCode};
use crate::search::format::render_search_results;
use crate::search::SearchClient;

/// MCP protocol version.
const PROTOCOL_VERSION: &str = "2024-11-05";

/// Server info.
const SERVER_NAME: &str = "barnsworthburning";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Minimum query length; shorter queries never reach the network.
const MIN_QUERY_LEN: usize = 2;

/// JSON-RPC request.
#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    #[allow(dead_code)]
    jsonrpc: String,
    method: String,
    #[serde(default)]
    params: Value,
    id: Option<Value>,
}

/// JSON-RPC response.
#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
    id: Value,
}

/// JSON-RPC error.
#[derive(Debug, Serialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

impl JsonRpcResponse {
    fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    fn error(id: Value, code: RpcErrorCode, message: String) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(JsonRpcError {
                code: code as i32,
                message,
            }),
            id,
        }
    }
}

/// Tool catalog for MCP.
fn get_tools() -> Value {
    json!({
        "tools": [
            {
                "name": "search",
                "description": "Search the barnsworthburning commonplace book. Returns extracts, creators, spaces and related records matching the query.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "minLength": MIN_QUERY_LEN,
                            "description": "Search query (at least 2 characters)"
                        }
                    },
                    "required": ["query"]
                }
            }
        ]
    })
}

/// Handle a `search` tool call.
async fn handle_search(client: &SearchClient, params: &Value, id: Value) -> JsonRpcResponse {
    let query = match params
        .get("arguments")
        .and_then(|a| a.get("query"))
        .and_then(|q| q.as_str())
    {
        Some(q) => q,
        None => {
            return JsonRpcResponse::error(
                id,
                RpcErrorCode::InvalidParams,
                "Missing query parameter".to_string(),
            )
        }
    };

    // The only client-side input guard; no trimming is applied.
    if query.chars().count() < MIN_QUERY_LEN {
        return JsonRpcResponse::error(
            id,
            RpcErrorCode::InvalidParams,
            format!("Query must be at least {MIN_QUERY_LEN} characters"),
        );
    }

    let results = client.search(query).await;
    let text = render_search_results(query, results);

    JsonRpcResponse::success(
        id,
        json!({
            "content": [
                {
                    "type": "text",
                    "text": text
                }
            ]
        }),
    )
}

/// Handle one incoming MCP request.
async fn handle_request(client: &SearchClient, request: &JsonRpcRequest) -> JsonRpcResponse {
    let id = request.id.clone().unwrap_or(Value::Null);

    match request.method.as_str() {
        "initialize" => {
            info!("MCP initialize");
            JsonRpcResponse::success(
                id,
                json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": {
                        "tools": {}
                    },
                    "serverInfo": {
                        "name": SERVER_NAME,
                        "version": SERVER_VERSION
                    }
                }),
            )
        }

        "notifications/initialized" => {
            debug!("MCP initialized notification");
            JsonRpcResponse::success(id, json!({}))
        }

        "ping" => JsonRpcResponse::success(id, json!({})),

        "tools/list" => {
            debug!("MCP tools/list");
            JsonRpcResponse::success(id, get_tools())
        }

        "tools/call" => {
            let tool_name = request
                .params
                .get("name")
                .and_then(|n| n.as_str())
                .unwrap_or("");

            debug!(tool = tool_name, "MCP tools/call");

            match tool_name {
                "search" => handle_search(client, &request.params, id).await,
                _ => JsonRpcResponse::error(
                    id,
                    RpcErrorCode::MethodNotFound,
                    format!("Unknown tool: {tool_name}"),
                ),
            }
        }

        _ => {
            debug!(method = request.method, "Unknown MCP method");
            JsonRpcResponse::error(
                id,
                RpcErrorCode::MethodNotFound,
                format!("Method not found: {}", request.method),
            )
        }
    }
}

/// Run the MCP server (stdio mode) until stdin closes.
pub async fn run(client: &SearchClient) -> Result<(), Error> {
    info!("Starting MCP server");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.is_empty() {
            continue;
        }

        debug!(request = %line, "MCP request");

        let request: JsonRpcRequest = match serde_json::from_str(&line) {
            Ok(req) => req,
            Err(e) => {
                error!(error = %e, "Failed to parse MCP request");
                let response = JsonRpcResponse::error(
                    Value::Null,
                    RpcErrorCode::ParseError,
                    format!("Parse error: {e}"),
                );
                write_response(&mut stdout, &response).await?;
                continue;
            }
        };

        // Notifications get no response.
        if request.id.is_none() && request.method.starts_with("notifications/") {
            debug!(method = request.method, "Skipping notification");
            continue;
        }

        let response = handle_request(client, &request).await;
        write_response(&mut stdout, &response).await?;
    }

    info!("MCP server stopped");
    Ok(())
}

async fn write_response(
    stdout: &mut tokio::io::Stdout,
    response: &JsonRpcResponse,
) -> Result<(), Error> {
    let mut payload = serde_json::to_string(response)?;
    debug!(response = %payload, "MCP response");
    payload.push('\n');
    stdout.write_all(payload.as_bytes()).await?;
    stdout.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Client pointed at a closed port; tests that reach the network would
    /// fail fast rather than silently succeed.
    fn offline_client() -> SearchClient {
        SearchClient::with_base_url("http://127.0.0.1:9/api/search").unwrap()
    }

    fn request(method: &str, params: Value) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
            id: Some(json!(1)),
        }
    }

    #[tokio::test]
    async fn test_initialize() {
        let client = offline_client();
        let response = handle_request(&client, &request("initialize", json!({}))).await;
        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], SERVER_NAME);
    }

    #[tokio::test]
    async fn test_tools_list_declares_search() {
        let client = offline_client();
        let response = handle_request(&client, &request("tools/list", json!({}))).await;
        let tools = &response.result.unwrap()["tools"];
        assert_eq!(tools.as_array().unwrap().len(), 1);
        assert_eq!(tools[0]["name"], "search");
        assert_eq!(tools[0]["inputSchema"]["required"][0], "query");
        assert_eq!(tools[0]["inputSchema"]["properties"]["query"]["minLength"], 2);
    }

    #[tokio::test]
    async fn test_short_query_rejected_before_network() {
        let client = offline_client();
        let params = json!({ "name": "search", "arguments": { "query": "x" } });
        let response = handle_request(&client, &request("tools/call", params)).await;
        // Rejected with invalid-params, not the collapsed failure text a
        // network error would produce.
        let err = response.error.unwrap();
        assert_eq!(err.code, RpcErrorCode::InvalidParams as i32);
    }

    #[tokio::test]
    async fn test_missing_query_rejected() {
        let client = offline_client();
        let params = json!({ "name": "search", "arguments": {} });
        let response = handle_request(&client, &request("tools/call", params)).await;
        assert_eq!(
            response.error.unwrap().code,
            RpcErrorCode::InvalidParams as i32
        );
    }

    #[tokio::test]
    async fn test_failed_search_returns_failure_text() {
        let client = offline_client();
        let params = json!({ "name": "search", "arguments": { "query": "typography" } });
        let response = handle_request(&client, &request("tools/call", params)).await;
        let result = response.result.unwrap();
        assert_eq!(result["content"][0]["type"], "text");
        assert_eq!(
            result["content"][0]["text"],
            "Failed to retrieve search results"
        );
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let client = offline_client();
        let params = json!({ "name": "nope", "arguments": {} });
        let response = handle_request(&client, &request("tools/call", params)).await;
        assert_eq!(
            response.error.unwrap().code,
            RpcErrorCode::MethodNotFound as i32
        );
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let client = offline_client();
        let response = handle_request(&client, &request("resources/list", json!({}))).await;
        assert_eq!(
            response.error.unwrap().code,
            RpcErrorCode::MethodNotFound as i32
        );
    }
}
