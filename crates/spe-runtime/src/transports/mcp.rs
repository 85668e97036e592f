//! Model Context Protocol (MCP) transport implementation.
//!
//! `McpService` implements `rmcp::ServerHandler` over a shared [`Toolbox`].
//! Every tool answers with a single text content block holding the report
//! string; tool-level failures are part of that text. Protocol errors are
//! reserved for unknown tools and arguments that do not match the schema.

use std::{borrow::Cow, sync::Arc};

use rmcp::{
    ErrorData, RoleServer,
    handler::server::ServerHandler,
    model::{
        CallToolRequestParam, CallToolResult, Content, Extensions, JsonObject, ListToolsResult,
        PaginatedRequestParam, ServerCapabilities, ServerInfo, Tool,
    },
    service::RequestContext,
    transport::{
        common::http_header::HEADER_SESSION_ID,
        streamable_http_server::{
            StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager,
        },
    },
};
use tracing::{debug, warn};

use crate::{ToolDescriptor, Toolbox, ToolboxError};

const SERVER_NAME: &str = "spe-mcp";

const INSTRUCTIONS: &str = "Tools for SharePoint Embedded containers: list, inspect and create \
containers, add metadata columns, list items and upload local files or folders.";

/// MCP server exposing the SharePoint Embedded tools.
///
/// Cloning is cheap; all clones share the same [`Toolbox`].
#[derive(Clone)]
pub struct McpService {
    toolbox: Toolbox,
    info: ServerInfo,
}

impl McpService {
    /// Create a new MCP service with default server info.
    #[must_use]
    pub fn new(toolbox: Toolbox) -> Self {
        Self::with_info(toolbox, default_server_info())
    }

    /// Create a new MCP service with custom server info.
    #[must_use]
    pub fn with_info(toolbox: Toolbox, info: ServerInfo) -> Self {
        Self { toolbox, info }
    }

    #[must_use]
    pub fn toolbox(&self) -> &Toolbox {
        &self.toolbox
    }

    #[must_use]
    pub fn info(&self) -> &ServerInfo {
        &self.info
    }

    /// Creates a streamable HTTP service with default configuration.
    ///
    /// Returns an Axum-compatible service that can be mounted in a router.
    #[must_use]
    pub fn streamable_http_service(&self) -> StreamableHttpService<Self, LocalSessionManager> {
        self.streamable_http_service_with_config(StreamableHttpServerConfig::default())
    }

    /// Creates a streamable HTTP service with custom configuration.
    #[must_use]
    pub fn streamable_http_service_with_config(
        &self,
        config: StreamableHttpServerConfig,
    ) -> StreamableHttpService<Self, LocalSessionManager> {
        let service = self.clone();
        StreamableHttpService::new(move || Ok(service.clone()), Arc::default(), config)
    }
}

impl ServerHandler for McpService {
    fn get_info(&self) -> ServerInfo {
        self.info.clone()
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, ErrorData>> + Send + '_ {
        let tools: Vec<Tool> = self.toolbox.descriptors().iter().map(descriptor_to_mcp).collect();
        async move { Ok(ListToolsResult::with_all_items(tools)) }
    }

    fn call_tool(
        &self,
        request: CallToolRequestParam,
        context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, ErrorData>> + Send + '_ {
        let toolbox = self.toolbox.clone();
        async move {
            debug!(
                tool = %request.name,
                request_id = %context.id,
                session_id = extract_session_id_from_extensions(&context.extensions).as_deref(),
                "Calling tool"
            );

            let arguments = request.arguments.unwrap_or_default();
            match toolbox.call(&request.name, arguments).await {
                Ok(output) => Ok(CallToolResult::success(vec![Content::text(output)])),
                Err(err) => {
                    warn!(tool = %request.name, error = %err, "Tool call rejected");
                    Err(toolbox_error_to_mcp(&err))
                }
            }
        }
    }
}

/// Creates the default server info with tools capability enabled.
fn default_server_info() -> ServerInfo {
    let mut info = ServerInfo {
        capabilities: ServerCapabilities::builder().enable_tools().build(),
        instructions: Some(INSTRUCTIONS.to_string()),
        ..Default::default()
    };
    info.server_info.name = SERVER_NAME.to_string();
    info.server_info.version = env!("CARGO_PKG_VERSION").to_string();
    info
}

fn descriptor_to_mcp(descriptor: &ToolDescriptor) -> Tool {
    Tool {
        name: Cow::Borrowed(descriptor.name),
        title: Some(descriptor.title.to_string()),
        description: Some(Cow::Borrowed(descriptor.description)),
        input_schema: Arc::new(JsonObject::clone(&descriptor.input_schema)),
        output_schema: None,
        annotations: None,
        icons: None,
    }
}

fn toolbox_error_to_mcp(err: &ToolboxError) -> ErrorData {
    let message = err.to_string();
    match err {
        ToolboxError::NotFound(_) => ErrorData::resource_not_found(message, None),
        ToolboxError::InvalidArguments { .. } => ErrorData::invalid_params(message, None),
        _ => ErrorData::internal_error(message, None),
    }
}

/// Extracts the MCP session ID from HTTP request extensions.
///
/// Absent for stdio sessions.
fn extract_session_id_from_extensions(extensions: &Extensions) -> Option<String> {
    let parts = extensions.get::<http::request::Parts>()?;
    parts
        .headers
        .get(HEADER_SESSION_ID)
        .and_then(|value| value.to_str().ok())
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::Result;
    use rmcp::{
        model::CallToolRequestParam, service::ServiceExt, transport::StreamableHttpClientTransport,
    };
    use serde_json::Value;
    use spe_core::{Container, RemoteStore};
    use tokio::sync::oneshot;

    use super::*;
    use crate::{LIST_CONTAINERS, UPLOAD_FOLDER, testing::StubStore};

    fn json_object(value: Value) -> JsonObject {
        match value {
            Value::Object(map) => map,
            _ => JsonObject::default(),
        }
    }

    fn service_with(store: StubStore) -> (McpService, Arc<StubStore>) {
        let store = Arc::new(store);
        let toolbox = Toolbox::new(Arc::clone(&store) as Arc<dyn RemoteStore>);
        (McpService::new(toolbox), store)
    }

    #[test]
    fn test_extract_session_id_from_extensions() {
        let request = http::Request::builder()
            .header(HEADER_SESSION_ID, "session-123")
            .body(())
            .expect("request should build");
        let (parts, _body) = request.into_parts();

        let mut extensions = Extensions::new();
        extensions.insert(parts);

        assert_eq!(
            extract_session_id_from_extensions(&extensions).as_deref(),
            Some("session-123")
        );
    }

    #[test]
    fn test_extract_session_id_without_http_parts() {
        assert!(extract_session_id_from_extensions(&Extensions::new()).is_none());
    }

    #[test]
    fn test_default_server_info_advertises_tools() {
        let (service, _) = service_with(StubStore::default());
        let info = service.get_info();

        assert!(info.capabilities.tools.is_some());
        assert_eq!(info.server_info.name, SERVER_NAME);
        assert!(info.instructions.is_some());
    }

    #[test]
    fn test_descriptor_conversion_keeps_schema() {
        let (service, _) = service_with(StubStore::default());
        let descriptor = &service.toolbox().descriptors()[0];

        let tool = descriptor_to_mcp(descriptor);

        assert_eq!(tool.name, descriptor.name);
        assert_eq!(tool.title.as_deref(), Some(descriptor.title));
        assert_eq!(*tool.input_schema, descriptor.input_schema);
    }

    #[test]
    fn test_toolbox_errors_map_to_mcp_codes() {
        let not_found = toolbox_error_to_mcp(&ToolboxError::NotFound("x".to_string()));
        let invalid = toolbox_error_to_mcp(&ToolboxError::InvalidArguments {
            tool: "x".to_string(),
            message: "missing field".to_string(),
        });

        assert_eq!(not_found.code, ErrorData::resource_not_found("", None).code);
        assert_eq!(invalid.code, ErrorData::invalid_params("", None).code);
        assert!(invalid.message.contains("missing field"));
    }

    #[tokio::test]
    async fn test_mcp_end_to_end_over_http() -> Result<()> {
        let (service, store) = service_with(StubStore {
            containers: vec![Container {
                id: "c-1".to_string(),
                display_name: Some("Legal".to_string()),
                ..Container::default()
            }],
            ..StubStore::default()
        });
        let router = axum::Router::new().nest_service("/mcp", service.streamable_http_service());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await;
        });

        let uri = format!("http://{addr}/mcp");
        let client = ().serve(StreamableHttpClientTransport::from_uri(uri)).await?;

        let tools = client.list_all_tools().await?;
        assert_eq!(tools.len(), 7);
        assert!(tools.iter().any(|tool| tool.name == UPLOAD_FOLDER));

        let result = client
            .call_tool(CallToolRequestParam {
                name: LIST_CONTAINERS.into(),
                arguments: Some(json_object(serde_json::json!({
                    "container_type_id": "type-1"
                }))),
            })
            .await?;
        let text = result
            .content
            .first()
            .and_then(|content| content.as_text())
            .map(|content| content.text.clone())
            .expect("text content missing");
        let containers: Value = serde_json::from_str(&text)?;
        assert_eq!(containers[0]["displayName"], "Legal");
        assert_eq!(store.calls(), ["list_containers type-1"]);

        let unknown = client
            .call_tool(CallToolRequestParam {
                name: "drop_container".into(),
                arguments: None,
            })
            .await;
        assert!(unknown.is_err());

        client.cancel().await?;
        let _ = shutdown_tx.send(());
        let _ = server.await;

        Ok(())
    }
}
