//! Tool contract layer
//!
//! Every call goes `received -> validated -> dispatched -> executed ->
//! serialized -> returned`, or stops at `rejected` when validation fails.
//! Both paths end in a [`ToolResult`] envelope; nothing escapes as a panic or
//! a raw error.

use std::sync::Arc;
use std::time::Instant;

use chrono::{Local, NaiveDate, NaiveDateTime};
use salesdata_core::{
    FilterSpec, GroupBy, QueryError, QueryResult, Region, SalesDataset, SharedDataset,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use crate::{ToolError, ToolOutcome};

// ============================================================================
// Seams
// ============================================================================

/// Source of "now" for `get_current_date`.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Local wall-clock time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Always reports the same instant.
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Anything that can answer a validated sales query.
pub trait SalesSource: Send + Sync {
    fn query(&self, spec: &FilterSpec) -> Result<QueryResult, QueryError>;
}

impl SalesSource for SalesDataset {
    fn query(&self, spec: &FilterSpec) -> Result<QueryResult, QueryError> {
        SalesDataset::query(self, spec)
    }
}

impl SalesSource for SharedDataset {
    fn query(&self, spec: &FilterSpec) -> Result<QueryResult, QueryError> {
        self.get().query(spec)
    }
}

// ============================================================================
// Contracts
// ============================================================================

/// One optional string argument of a tool.
#[derive(Debug)]
pub struct ArgumentSpec {
    pub name: &'static str,
    pub description: &'static str,
    /// Allowed values advertised to the caller; empty means free-form.
    pub allowed: &'static [&'static str],
    pub format: Option<&'static str>,
}

/// Name, description and argument list of a tool.
#[derive(Debug)]
pub struct ToolContract {
    pub name: &'static str,
    pub description: &'static str,
    pub arguments: &'static [ArgumentSpec],
}

impl ToolContract {
    /// JSON Schema for the tool's argument object.
    pub fn input_schema(&self) -> Map<String, Value> {
        let mut properties = Map::new();
        for argument in self.arguments {
            let mut property = Map::new();
            property.insert("type".to_string(), json!("string"));
            property.insert("description".to_string(), json!(argument.description));
            if !argument.allowed.is_empty() {
                property.insert("enum".to_string(), json!(argument.allowed));
            }
            if let Some(format) = argument.format {
                property.insert("format".to_string(), json!(format));
            }
            properties.insert(argument.name.to_string(), Value::Object(property));
        }

        let mut schema = Map::new();
        schema.insert("type".to_string(), json!("object"));
        schema.insert("properties".to_string(), Value::Object(properties));
        schema.insert("additionalProperties".to_string(), json!(false));
        schema
    }

    fn accepts(&self, argument: &str) -> bool {
        self.arguments.iter().any(|spec| spec.name == argument)
    }
}

pub static GET_CURRENT_DATE: ToolContract = ToolContract {
    name: "get_current_date",
    description: "Get the current date and time. Call this before answering questions about \
                  relative dates such as 'last month', 'this year' or 'last week'. Returns an \
                  ISO-8601 timestamp (YYYY-MM-DDTHH:MM:SS).",
    arguments: &[],
};

pub static GET_SALES_DATA: ToolContract = ToolContract {
    name: "get_sales_data",
    description: "Get product sales records with optional filtering by region and date range. \
                  When groupby is provided, returns aggregated totals per group instead of \
                  individual records. Returns a JSON array.",
    arguments: &[
        ArgumentSpec {
            name: "region",
            description: "Region to filter by. If not specified, returns data for all regions.",
            allowed: &["North", "South", "East", "West"],
            format: None,
        },
        ArgumentSpec {
            name: "start_date",
            description: "Start of the date range (inclusive) in YYYY-MM-DD format. If not \
                          specified, returns data from the beginning.",
            allowed: &[],
            format: Some("date"),
        },
        ArgumentSpec {
            name: "end_date",
            description: "End of the date range (inclusive) in YYYY-MM-DD format. If not \
                          specified, returns data up to the latest record.",
            allowed: &[],
            format: Some("date"),
        },
        ArgumentSpec {
            name: "groupby",
            description: "Optional grouping. When provided, returns total_amount and \
                          record_count per group.",
            allowed: &["region", "week", "month", "quarter", "year"],
            format: None,
        },
    ],
};

/// All tools, in listing order.
pub static TOOL_CONTRACTS: [&ToolContract; 2] = [&GET_CURRENT_DATE, &GET_SALES_DATA];

// ============================================================================
// Envelope
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub tool_name: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl ToolCall {
    pub fn new(tool_name: impl Into<String>) -> Self {
        Self { tool_name: tool_name.into(), arguments: Map::new() }
    }

    pub fn arg(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.arguments.insert(name.to_string(), value.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    pub content: String,
    pub is_error: bool,
}

impl ToolResult {
    pub fn success(content: impl Into<String>) -> Self {
        Self { content: content.into(), is_error: false }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { content: message.into(), is_error: true }
    }
}

// ============================================================================
// Dispatch
// ============================================================================

/// Validates tool calls and answers them from a [`SalesSource`].
#[derive(Clone)]
pub struct SalesToolbox {
    source: Arc<dyn SalesSource>,
    clock: Arc<dyn Clock>,
}

impl SalesToolbox {
    pub fn new(source: Arc<dyn SalesSource>, clock: Arc<dyn Clock>) -> Self {
        Self { source, clock }
    }

    pub fn contracts(&self) -> &'static [&'static ToolContract] {
        &TOOL_CONTRACTS
    }

    pub fn dispatch(&self, call: &ToolCall) -> ToolResult {
        let started = Instant::now();
        debug!(
            event_name = "tool.call.received",
            tool_name = %call.tool_name,
            argument_count = call.arguments.len(),
            "tool call received"
        );

        let outcome = match call.tool_name.as_str() {
            name if name == GET_CURRENT_DATE.name => self.current_date(&call.arguments),
            name if name == GET_SALES_DATA.name => self.sales_data(&call.arguments),
            other => Err(ToolError::UnknownTool(other.to_string())),
        };

        match outcome {
            Ok(content) => {
                info!(
                    event_name = "tool.call.returned",
                    tool_name = %call.tool_name,
                    content_bytes = content.len(),
                    elapsed_us = started.elapsed().as_micros() as u64,
                    "tool call returned"
                );
                ToolResult::success(content)
            }
            Err(error) => {
                let event_name =
                    if error.is_rejection() { "tool.call.rejected" } else { "tool.call.failed" };
                warn!(
                    event_name,
                    tool_name = %call.tool_name,
                    error_class = error.error_class(),
                    error = %error,
                    "tool call did not succeed"
                );
                ToolResult::error(error.to_string())
            }
        }
    }

    fn current_date(&self, arguments: &Map<String, Value>) -> ToolOutcome<String> {
        reject_unexpected(&GET_CURRENT_DATE, arguments)?;
        Ok(self.clock.now().format("%Y-%m-%dT%H:%M:%S").to_string())
    }

    fn sales_data(&self, arguments: &Map<String, Value>) -> ToolOutcome<String> {
        let spec = parse_sales_arguments(arguments)?;
        debug!(
            event_name = "tool.call.dispatched",
            tool_name = GET_SALES_DATA.name,
            filter = %spec.summary(),
            "sales query dispatched"
        );

        let result = self.source.query(&spec)?;
        debug!(
            event_name = "tool.call.executed",
            tool_name = GET_SALES_DATA.name,
            row_count = result.len(),
            "sales query executed"
        );

        Ok(serde_json::to_string(&result)?)
    }
}

// ============================================================================
// Validation
// ============================================================================

/// Turns raw `get_sales_data` arguments into a [`FilterSpec`].
pub fn parse_sales_arguments(arguments: &Map<String, Value>) -> ToolOutcome<FilterSpec> {
    reject_unexpected(&GET_SALES_DATA, arguments)?;

    let region = optional_text(arguments, "region")?
        .map(|value| value.parse::<Region>())
        .transpose()
        .map_err(|error| ToolError::invalid("region", error.to_string()))?;
    let start_date = optional_date(arguments, "start_date")?;
    let end_date = optional_date(arguments, "end_date")?;
    let group_by = optional_text(arguments, "groupby")?
        .map(|value| value.parse::<GroupBy>())
        .transpose()
        .map_err(|error| ToolError::invalid("groupby", error.to_string()))?;

    FilterSpec::new(region, start_date, end_date, group_by).map_err(|error| {
        if error.is_caller_error() {
            ToolError::invalid("start_date", error.to_string())
        } else {
            ToolError::Query(error)
        }
    })
}

fn reject_unexpected(contract: &ToolContract, arguments: &Map<String, Value>) -> ToolOutcome<()> {
    match arguments.keys().find(|name| !contract.accepts(name)) {
        Some(name) => Err(ToolError::UnexpectedArgument(name.clone())),
        None => Ok(()),
    }
}

/// `null` and blank strings count as absent.
fn optional_text<'a>(
    arguments: &'a Map<String, Value>,
    field: &str,
) -> ToolOutcome<Option<&'a str>> {
    match arguments.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) if text.trim().is_empty() => Ok(None),
        Some(Value::String(text)) => Ok(Some(text.trim())),
        Some(other) => {
            Err(ToolError::invalid(field, format!("expected a string, got {}", json_type(other))))
        }
    }
}

fn optional_date(arguments: &Map<String, Value>, field: &str) -> ToolOutcome<Option<NaiveDate>> {
    let Some(text) = optional_text(arguments, field)? else {
        return Ok(None);
    };

    let well_formed = text.len() == 10
        && text.char_indices().all(|(index, ch)| match index {
            4 | 7 => ch == '-',
            _ => ch.is_ascii_digit(),
        });
    if !well_formed {
        return Err(ToolError::invalid(field, format!("`{text}` is not a YYYY-MM-DD date")));
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| ToolError::invalid(field, format!("`{text}` is not a valid calendar date")))
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
