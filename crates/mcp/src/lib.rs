//! Salesdata MCP (Model Context Protocol) Server
//!
//! This crate exposes the synthetic sales dataset to AI agents as two tools:
//! `get_current_date` and `get_sales_data`.
//!
//! ## Architecture
//!
//! - `tools`: the tool contract layer. Validates raw call arguments into a
//!   typed filter, runs the query engine and always answers with a
//!   `{content, is_error}` envelope.
//! - `SalesMcpServer`: adapts the contract layer to the MCP protocol over stdio.
//!
//! ## Example Usage
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use salesdata_core::{DatasetConfig, SharedDataset};
//! use salesdata_mcp::{SalesMcpServer, SalesToolbox, SystemClock};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let dataset = Arc::new(SharedDataset::new(DatasetConfig::default()));
//!     let toolbox = SalesToolbox::new(dataset, Arc::new(SystemClock));
//!     SalesMcpServer::new(toolbox).run_stdio().await
//! }
//! ```

mod server;
pub mod tools;

pub use server::SalesMcpServer;
pub use tools::*;

use salesdata_core::QueryError;
use thiserror::Error;

/// Errors raised while handling a single tool call.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("invalid argument `{field}`: {message}")]
    InvalidArgument { field: String, message: String },

    #[error("unexpected argument `{0}`")]
    UnexpectedArgument(String),

    #[error("unknown tool `{0}`")]
    UnknownTool(String),

    #[error("query failed: {0}")]
    Query(#[from] QueryError),

    #[error("could not serialize result: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ToolError {
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::InvalidArgument { field: field.to_string(), message: message.into() }
    }

    /// True when the call was rejected before reaching the query engine.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            ToolError::InvalidArgument { .. }
                | ToolError::UnexpectedArgument(_)
                | ToolError::UnknownTool(_)
        )
    }

    /// Stable class name for logs.
    pub fn error_class(&self) -> &'static str {
        match self {
            ToolError::InvalidArgument { .. } | ToolError::UnexpectedArgument(_) => "validation",
            ToolError::UnknownTool(_) => "unknown_tool",
            ToolError::Query(_) => "query",
            ToolError::Serialization(_) => "serialization",
        }
    }
}

/// Result type for tool operations
pub type ToolOutcome<T> = Result<T, ToolError>;
