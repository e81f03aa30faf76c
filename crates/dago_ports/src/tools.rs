//! Tool execution port.
//!
//! A [`ToolExecutor`] runs one kind of tool (Python, Bash, HTTP, ...); a
//! [`ToolRegistry`] maps tool names to executors.

use crate::error::PortResult;
use crate::llm::ToolDefinition;
use async_trait::async_trait;
use core::fmt;
use core::time::Duration;
use dago_domain::ToolError;
use schemars::{JsonSchema, schema_for};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Kind of tool an executor runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolType {
    /// Python script.
    Python,
    /// Shell command.
    Bash,
    /// HTTP request.
    Http,
    /// Anything else.
    Custom,
}

impl ToolType {
    /// Returns the serialized name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ToolType::Python => "python",
            ToolType::Bash => "bash",
            ToolType::Http => "http",
            ToolType::Custom => "custom",
        }
    }
}

impl fmt::Display for ToolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input and output schema of a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Tool name.
    pub name: String,
    /// What the tool does.
    pub description: String,
    /// JSON Schema of the input parameters.
    pub input_schema: Value,
    /// JSON Schema of the output, if declared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<Value>,
}

impl ToolSchema {
    /// Creates a schema from an explicit input schema.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
            output_schema: None,
        }
    }

    /// Creates a schema whose input schema is derived from `T`.
    ///
    /// # Errors
    ///
    /// Returns an error if the generated schema cannot be serialized.
    pub fn for_input<T: JsonSchema>(
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> serde_json::Result<Self> {
        let input_schema = serde_json::to_value(schema_for!(T))?;
        Ok(Self::new(name, description, input_schema))
    }

    /// Declares the output schema, derived from `T`.
    ///
    /// # Errors
    ///
    /// Returns an error if the generated schema cannot be serialized.
    pub fn with_output<T: JsonSchema>(mut self) -> serde_json::Result<Self> {
        self.output_schema = Some(serde_json::to_value(schema_for!(T))?);
        Ok(self)
    }

    /// Converts to the definition an LLM sees.
    #[must_use]
    pub fn to_definition(&self) -> ToolDefinition {
        ToolDefinition::new(&self.name, &self.description, self.input_schema.clone())
    }
}

/// Outcome of one tool execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the tool succeeded.
    pub success: bool,
    /// Output on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    /// Error message on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Wall time spent executing.
    pub execution_time: Duration,
    /// Free-form auxiliary data.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl ToolResult {
    /// Creates a successful result.
    #[must_use]
    pub fn success(output: impl Into<Value>, execution_time: Duration) -> Self {
        Self {
            success: true,
            output: Some(output.into()),
            error: None,
            execution_time,
            metadata: Map::new(),
        }
    }

    /// Creates a failed result.
    #[must_use]
    pub fn failure(error: impl Into<String>, execution_time: Duration) -> Self {
        Self {
            success: false,
            output: None,
            error: Some(error.into()),
            execution_time,
            metadata: Map::new(),
        }
    }

    /// Adds a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Execution limits for a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Maximum execution time.
    pub timeout: Duration,
    /// Retry attempts after the first failure.
    pub max_retries: u32,
    /// Delay between retries.
    pub retry_delay: Duration,
    /// Whether to run inside a sandbox.
    pub sandbox: bool,
    /// Extra environment variables.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, String>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5 * 60),
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
            sandbox: true,
            environment: BTreeMap::new(),
        }
    }
}

/// Runs one kind of tool.
#[async_trait]
pub trait ToolExecutor: Send + Sync + 'static {
    /// Executes the tool with JSON parameters.
    ///
    /// A tool that ran but reported failure returns `Ok` with
    /// [`ToolResult::failure`]; `Err` means the tool could not be run.
    async fn execute(&self, params: Value) -> Result<ToolResult, ToolError>;

    /// Returns the tool's schema.
    fn schema(&self) -> ToolSchema;

    /// Returns the kind of tool.
    fn tool_type(&self) -> ToolType;

    /// Checks parameters before execution.
    fn validate(&self, params: &Value) -> Result<(), ToolError>;
}

/// Name → executor lookup.
///
/// Registration happens at startup and involves no I/O, so this trait is
/// synchronous.
pub trait ToolRegistry: Send + Sync + 'static {
    /// Registers `executor` under `name`.
    ///
    /// # Errors
    ///
    /// [`PortError::AlreadyExists`](crate::PortError::AlreadyExists) if the
    /// name is taken.
    fn register(&self, name: &str, executor: Arc<dyn ToolExecutor>) -> PortResult<()>;

    /// Returns the executor registered under `name`.
    ///
    /// # Errors
    ///
    /// [`PortError::NotFound`](crate::PortError::NotFound) if absent.
    fn get(&self, name: &str) -> PortResult<Arc<dyn ToolExecutor>>;

    /// Returns the registered names in registration order.
    fn list(&self) -> Vec<String>;

    /// Removes the executor registered under `name`.
    ///
    /// # Errors
    ///
    /// [`PortError::NotFound`](crate::PortError::NotFound) if absent.
    fn unregister(&self, name: &str) -> PortResult<()>;

    /// Returns every executor of the given type.
    fn by_type(&self, tool_type: ToolType) -> Vec<Arc<dyn ToolExecutor>>;
}
