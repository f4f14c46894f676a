// MCP protocol engine: answers JSON-RPC requests for one session

use crate::error::DispatchError;
use crate::protocol::*;
use crate::tools::Dispatcher;
use noodleseed_core::{Catalog, ToolResult};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Protocol engine; one instance per session
pub struct McpServer {
    dispatcher: Dispatcher,
    server_info: ServerInfo,
    initialized: AtomicBool,
}

impl McpServer {
    pub fn new(catalog: Arc<Catalog>, server_info: ServerInfo) -> Self {
        Self {
            dispatcher: Dispatcher::new(catalog),
            server_info,
            initialized: AtomicBool::new(false),
        }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        self.dispatcher.catalog()
    }

    /// Whether the client has completed the initialize handshake
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Run a direct command against the catalog
    pub async fn call_tool(&self, tool_id: &str, arguments: Value) -> Result<ToolResult, DispatchError> {
        self.dispatcher.dispatch(tool_id, arguments).await
    }

    /// Handle an incoming JSON-RPC request; notifications yield no response
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        tracing::debug!("Handling MCP method {}", request.method);

        let result = match request.method.as_str() {
            "initialize" => self.handle_initialize(request.params),
            "notifications/initialized" => {
                self.initialized.store(true, Ordering::Release);
                Ok(Value::Null)
            }
            "ping" => Ok(serde_json::json!({})),
            "tools/list" => self.handle_list_tools(),
            "tools/call" => self.handle_call_tool(request.params).await,
            "resources/list" => self.handle_list_resources(),
            "resources/templates/list" => self.handle_list_resource_templates(),
            "resources/read" => self.handle_read_resource(request.params),
            method if method.starts_with("notifications/") => Ok(Value::Null),
            method => Err(JsonRpcError::method_not_found(method)),
        };

        let id = request.id?;
        Some(match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(error) => JsonRpcResponse::error(id, error),
        })
    }

    fn handle_initialize(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let params: InitializeParams = match params {
            Some(p) => parse_params(p)?,
            None => InitializeParams::default(),
        };

        if let Some(client) = &params.client_info {
            tracing::info!("MCP client connected: {} {}", client.name, client.version);
        }

        to_result(InitializeResult {
            protocol_version: params
                .protocol_version
                .unwrap_or_else(|| DEFAULT_PROTOCOL_VERSION.to_string()),
            capabilities: ServerCapabilities::tools_and_resources(),
            server_info: self.server_info.clone(),
        })
    }

    fn handle_list_tools(&self) -> Result<Value, JsonRpcError> {
        to_result(ListToolsResult {
            tools: self.catalog().list().iter().map(ToolSchema::from).collect(),
        })
    }

    async fn handle_call_tool(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let params: CallToolParams = parse_params(
            params.ok_or_else(|| JsonRpcError::invalid_params("Missing params for tools/call"))?,
        )?;

        match self.call_tool(&params.name, params.arguments).await {
            Ok(result) => to_result(CallToolResult::from(result)),
            Err(err) => {
                tracing::warn!("Tool call {} failed: {}", params.name, err);
                let error = match err {
                    DispatchError::Failed { .. } => JsonRpcError::internal_error(err.to_string()),
                    _ => JsonRpcError::invalid_params(err.to_string()),
                };
                Err(error.with_kind(err.kind()))
            }
        }
    }

    fn handle_list_resources(&self) -> Result<Value, JsonRpcError> {
        to_result(ListResourcesResult {
            resources: self.catalog().list().iter().map(ResourceSchema::from).collect(),
        })
    }

    fn handle_list_resource_templates(&self) -> Result<Value, JsonRpcError> {
        to_result(ListResourceTemplatesResult {
            resource_templates: self
                .catalog()
                .list()
                .iter()
                .map(ResourceTemplateSchema::from)
                .collect(),
        })
    }

    fn handle_read_resource(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let params: ReadResourceParams = parse_params(
            params.ok_or_else(|| JsonRpcError::invalid_params("Missing params for resources/read"))?,
        )?;

        let entry = self.catalog().get_by_uri(&params.uri).ok_or_else(|| {
            JsonRpcError::invalid_params(format!("Unknown resource: {}", params.uri))
                .with_kind("UnknownResource")
        })?;

        tracing::info!("Serving widget resource {}", entry.id);

        to_result(ReadResourceResult {
            contents: vec![ResourceContents::from(entry)],
        })
    }
}

fn parse_params<T: DeserializeOwned>(params: Value) -> Result<T, JsonRpcError> {
    serde_json::from_value(params)
        .map_err(|e| JsonRpcError::invalid_params(format!("Invalid params: {}", e)))
}

fn to_result(value: impl serde::Serialize) -> Result<Value, JsonRpcError> {
    serde_json::to_value(value)
        .map_err(|e| JsonRpcError::internal_error(format!("Failed to serialize result: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{noodleseed_catalog, WidgetAssets, GET_STARTED_TOOL_URI};
    use serde_json::json;

    fn server() -> McpServer {
        McpServer::new(
            Arc::new(noodleseed_catalog(&WidgetAssets::default()).unwrap()),
            ServerInfo::new("noodleseed-test", "1.0.0"),
        )
    }

    async fn call(server: &McpServer, method: &str, params: Value) -> JsonRpcResponse {
        server
            .handle_request(JsonRpcRequest::new(1, method, params))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_initialize_reports_server_info() {
        let server = server();
        let resp = call(
            &server,
            "initialize",
            json!({
                "protocolVersion": "2025-03-26",
                "capabilities": {},
                "clientInfo": { "name": "test-client", "version": "0.1" }
            }),
        )
        .await;

        let result = resp.result.unwrap();
        assert_eq!(result["serverInfo"]["name"], "noodleseed-test");
        assert_eq!(result["protocolVersion"], "2025-03-26");
        assert!(result["capabilities"]["tools"].is_object());
        assert!(result["capabilities"]["resources"].is_object());
    }

    #[tokio::test]
    async fn test_initialized_notification_has_no_response() {
        let server = server();
        assert!(!server.is_initialized());

        let resp = server
            .handle_request(JsonRpcRequest::notification("notifications/initialized"))
            .await;

        assert!(resp.is_none());
        assert!(server.is_initialized());
    }

    #[tokio::test]
    async fn test_list_tools() {
        let resp = call(&server(), "tools/list", json!({})).await;
        let tools = resp.result.unwrap()["tools"].as_array().unwrap().clone();

        let names: Vec<_> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["search", "get-started"]);
        assert_eq!(tools[1]["inputSchema"]["properties"]["business_type"]["default"], "general");
    }

    #[tokio::test]
    async fn test_call_tool() {
        let resp = call(
            &server(),
            "tools/call",
            json!({ "name": "get-started", "arguments": { "business_type": "retail" } }),
        )
        .await;

        let result = resp.result.unwrap();
        assert_eq!(result["structuredContent"]["business_type"], "retail");
        assert_eq!(result["_meta"]["openai/outputTemplate"], GET_STARTED_TOOL_URI);
    }

    #[tokio::test]
    async fn test_call_unknown_tool_is_structured_error() {
        let resp = call(&server(), "tools/call", json!({ "name": "nope", "arguments": {} })).await;

        let error = resp.error.unwrap();
        assert_eq!(error.code, -32602);
        assert_eq!(error.data.unwrap()["kind"], "UnknownTool");
    }

    #[tokio::test]
    async fn test_read_resource() {
        let server = server();
        let resp = call(&server, "resources/read", json!({ "uri": GET_STARTED_TOOL_URI })).await;
        let result = resp.result.unwrap();
        let contents = &result["contents"][0];
        assert_eq!(contents["mimeType"], "text/html+skybridge");
        assert!(contents["text"].as_str().unwrap().contains("noodleseed-root"));

        let resp = call(&server, "resources/read", json!({ "uri": "ui://missing" })).await;
        assert_eq!(resp.error.unwrap().data.unwrap()["kind"], "UnknownResource");
    }

    #[tokio::test]
    async fn test_list_resource_templates() {
        let resp = call(&server(), "resources/templates/list", json!({})).await;
        let templates = resp.result.unwrap()["resourceTemplates"].as_array().unwrap().len();
        assert_eq!(templates, 2);
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let resp = call(&server(), "sampling/createMessage", json!({})).await;
        assert_eq!(resp.error.unwrap().code, -32601);
    }
}
