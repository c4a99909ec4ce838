//! MCP Server Implementation
//!
//! Adapts the tool contract layer to the Model Context Protocol.

use std::sync::Arc;

use rmcp::{
    model::{
        CallToolRequestParam, CallToolResult, Content, Implementation, JsonObject,
        ListToolsResult, PaginatedRequestParam, ProtocolVersion, ServerCapabilities, ServerInfo,
        Tool,
    },
    service::RequestContext,
    transport::stdio,
    ErrorData, RoleServer, ServerHandler, ServiceExt,
};
use tracing::info;

use crate::tools::{SalesToolbox, ToolCall, ToolResult};

/// MCP server exposing the sales tools.
#[derive(Clone)]
pub struct SalesMcpServer {
    toolbox: Arc<SalesToolbox>,
}

impl SalesMcpServer {
    pub fn new(toolbox: SalesToolbox) -> Self {
        Self { toolbox: Arc::new(toolbox) }
    }

    /// Tool descriptors advertised in `tools/list`.
    pub fn tools(&self) -> Vec<Tool> {
        self.toolbox
            .contracts()
            .iter()
            .map(|contract| {
                Tool::new(contract.name, contract.description, Arc::new(contract.input_schema()))
            })
            .collect()
    }

    /// Runs one `tools/call` through the contract layer.
    pub fn call(&self, name: &str, arguments: Option<JsonObject>) -> CallToolResult {
        let call =
            ToolCall { tool_name: name.to_string(), arguments: arguments.unwrap_or_default() };
        into_call_result(self.toolbox.dispatch(&call))
    }

    /// Run the server with stdio transport
    pub async fn run_stdio(self) -> anyhow::Result<()> {
        info!(event_name = "system.mcp.starting", transport = "stdio", "starting MCP server");

        let service = self.serve(stdio()).await?;

        // Wait for the peer to disconnect
        let quit_reason = service.waiting().await?;

        info!(event_name = "system.mcp.stopped", ?quit_reason, "MCP server shutdown complete");
        Ok(())
    }
}

fn into_call_result(result: ToolResult) -> CallToolResult {
    let content = vec![Content::text(result.content)];
    if result.is_error {
        CallToolResult::error(content)
    } else {
        CallToolResult::success(content)
    }
}

impl ServerHandler for SalesMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "salesdata-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Implementation::default()
            },
            instructions: Some(
                "Salesdata MCP Server - synthetic product sales for AI agents. \
                 Call get_current_date before resolving relative dates such as 'last month', \
                 then call get_sales_data with region, start_date, end_date and groupby."
                    .to_string(),
            ),
            ..ServerInfo::default()
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult::with_all_items(self.tools()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        Ok(self.call(&request.name, request.arguments))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;
    use rmcp::ServerHandler;
    use salesdata_core::{DatasetConfig, SalesDataset};
    use serde_json::{json, Value};

    use super::SalesMcpServer;
    use crate::tools::{FixedClock, SalesToolbox};

    fn server() -> SalesMcpServer {
        let dataset = SalesDataset::generate(&DatasetConfig {
            products: 2,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).expect("date"),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 31).expect("date"),
            seed: Some(1),
        });
        let now = NaiveDate::from_ymd_opt(2024, 2, 1)
            .and_then(|day| day.and_hms_opt(9, 30, 0))
            .expect("timestamp");
        SalesMcpServer::new(SalesToolbox::new(Arc::new(dataset), Arc::new(FixedClock(now))))
    }

    fn as_json<T: serde::Serialize>(value: &T) -> Value {
        serde_json::to_value(value).expect("serialize")
    }

    #[test]
    fn server_info_advertises_tools() {
        let info = as_json(&server().get_info());
        assert_eq!(info["serverInfo"]["name"], "salesdata-mcp");
        assert!(info["capabilities"]["tools"].is_object());
        assert!(info["instructions"].as_str().unwrap_or_default().contains("get_current_date"));
    }

    #[test]
    fn tools_carry_contract_schemas() {
        let tools = as_json(&server().tools());
        assert_eq!(tools[0]["name"], "get_current_date");
        assert_eq!(tools[1]["name"], "get_sales_data");
        assert_eq!(tools[1]["inputSchema"]["properties"]["groupby"]["type"], "string");
    }

    #[test]
    fn successful_call_maps_to_text_content() {
        let result = as_json(&server().call("get_current_date", None));
        assert_eq!(result["content"][0]["type"], "text");
        assert_eq!(result["content"][0]["text"], "2024-02-01T09:30:00");
        assert_eq!(result["isError"], false);
    }

    #[test]
    fn rejected_call_maps_to_error_result() {
        let arguments = json!({ "groupby": "bogus" }).as_object().cloned();
        let result = as_json(&server().call("get_sales_data", arguments));
        assert_eq!(result["isError"], true);
        assert!(result["content"][0]["text"].as_str().unwrap_or_default().contains("groupby"));
    }

    #[test]
    fn unknown_tool_is_an_error_result() {
        let result = as_json(&server().call("delete_everything", None));
        assert_eq!(result["isError"], true);
        assert_eq!(result["content"][0]["text"], "unknown tool `delete_everything`");
    }
}
