//! Tool registry and executor.
//!
//! The registry is a fixed, ordered set of tools built once at startup. Each
//! tool declares its parameters; [`ToolRegistry::execute`] validates the
//! model-supplied arguments against that declaration before dispatching, so
//! a tool body only ever sees arguments of the declared shape.

mod directory;
mod file_ops;
mod search;
mod terminal;

pub use directory::{ListDirectory, PrintWorkingDirectory, Tree};
pub use file_ops::{DeleteFile, MakeDirectory, ReadFile, WriteFile};
pub use search::GrepSearch;
pub use terminal::ShellTool;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::llm::{ToolFunction, ToolSchema};

/// Tool output beyond this many characters is cut off.
pub(crate) const MAX_OUTPUT_CHARS: usize = 10_000;

/// Cap `output` at [`MAX_OUTPUT_CHARS`], marking the cut.
pub(crate) fn truncate_output(mut output: String) -> String {
    if let Some((cut, _)) = output.char_indices().nth(MAX_OUTPUT_CHARS) {
        output.truncate(cut);
        output.push_str("\n... [output truncated]");
    }
    output
}

/// Error raised by a tool or by dispatch.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("tool `{0}` not found")]
    UnknownTool(String),

    #[error("invalid arguments: {0}")]
    Argument(String),

    #[error("path not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Execution(String),

    #[error("timed out after {}s", .0.as_secs())]
    Timeout(Duration),
}

/// A [`ToolError`] tagged with the tool that produced it.
#[derive(Debug, Error)]
#[error("tool `{tool}` failed: {error}")]
pub struct ToolFailure {
    pub tool: String,
    #[source]
    pub error: ToolError,
}

/// JSON type of a declared parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Integer,
    Boolean,
}

impl ParamKind {
    fn json_type(self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Integer => "integer",
            ParamKind::Boolean => "boolean",
        }
    }

    fn accepts(self, value: &Value) -> bool {
        match self {
            ParamKind::String => value.is_string(),
            ParamKind::Integer => value.is_u64(),
            ParamKind::Boolean => value.is_boolean(),
        }
    }
}

/// Declaration of one tool parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
    pub description: &'static str,
}

impl ParamSpec {
    pub const fn required(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self { name, kind, required: true, description }
    }

    pub const fn optional(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self { name, kind, required: false, description }
    }
}

/// Static description of a registered tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ParamSpec>,
}

impl ToolDescriptor {
    /// JSON-Schema object for the parameters, in declaration order.
    pub fn parameters_schema(&self) -> Value {
        let mut properties = Map::new();
        for param in &self.parameters {
            properties.insert(
                param.name.to_string(),
                json!({
                    "type": param.kind.json_type(),
                    "description": param.description,
                }),
            );
        }
        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name)
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    fn validate(&self, args: &ToolArgs) -> Result<(), ToolError> {
        for param in &self.parameters {
            match args.value(param.name) {
                None if param.required => {
                    return Err(ToolError::Argument(format!(
                        "missing required parameter `{}`",
                        param.name
                    )));
                }
                None => {}
                Some(value) if !param.kind.accepts(value) => {
                    return Err(ToolError::Argument(format!(
                        "parameter `{}` must be of type {}, got {}",
                        param.name,
                        param.kind.json_type(),
                        value
                    )));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

/// Arguments for one tool invocation, keyed by parameter name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolArgs(Map<String, Value>);

impl ToolArgs {
    /// Parse the raw argument text the model produced.
    ///
    /// The text must be a JSON object; an empty string is read as `{}`.
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str::<Map<String, Value>>(raw).map(Self)
    }

    /// Build string arguments from `(name, value)` pairs.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
                .collect(),
        )
    }

    /// Value of a parameter; JSON `null` counts as absent.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.0.get(name).filter(|v| !v.is_null())
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.value(name).and_then(Value::as_str)
    }

    pub fn require_str(&self, name: &str) -> Result<&str, ToolError> {
        self.get_str(name)
            .ok_or_else(|| ToolError::Argument(format!("missing required parameter `{}`", name)))
    }

    pub fn get_u64(&self, name: &str) -> Option<u64> {
        self.value(name).and_then(Value::as_u64)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.value(name).and_then(Value::as_bool)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

/// Host environment handed to every tool call.
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Directory relative paths are resolved against
    pub working_dir: PathBuf,
    /// Default deadline for shell commands
    pub shell_timeout: Duration,
}

impl ToolContext {
    pub fn new(working_dir: impl Into<PathBuf>, shell_timeout: Duration) -> Self {
        Self {
            working_dir: working_dir.into(),
            shell_timeout,
        }
    }

    /// Resolve a user-supplied path against the working directory.
    pub fn resolve(&self, path: &str) -> PathBuf {
        let candidate = Path::new(path);
        if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.working_dir.join(candidate)
        }
    }
}

impl Default for ToolContext {
    fn default() -> Self {
        Self {
            working_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            shell_timeout: Duration::from_secs(60),
        }
    }
}

/// An executable capability the model can request.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Declared parameters, in the order they are presented to the model.
    fn parameters(&self) -> Vec<ParamSpec>;

    /// Run the tool. Arguments have already been validated against
    /// [`Tool::parameters`].
    async fn execute(&self, args: &ToolArgs, ctx: &ToolContext) -> Result<String, ToolError>;
}

struct RegisteredTool {
    descriptor: ToolDescriptor,
    tool: Arc<dyn Tool>,
}

/// Fixed, ordered set of tools available to the agent.
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Registry with every built-in tool.
    pub fn new() -> Self {
        Self::with_tools(vec![
            Arc::new(ShellTool),
            Arc::new(GrepSearch),
            Arc::new(Tree),
            Arc::new(ListDirectory),
            Arc::new(PrintWorkingDirectory),
            Arc::new(MakeDirectory),
            Arc::new(ReadFile),
            Arc::new(WriteFile),
            Arc::new(DeleteFile),
        ])
    }

    /// Registry over an explicit tool list. Later duplicates of a name are ignored.
    pub fn with_tools(tools: Vec<Arc<dyn Tool>>) -> Self {
        let mut registered = Vec::with_capacity(tools.len());
        let mut index = HashMap::new();

        for tool in tools {
            let name = tool.name().to_string();
            if index.contains_key(&name) {
                tracing::warn!(target: "tool", tool = %name, "Duplicate tool name ignored");
                continue;
            }
            index.insert(name.clone(), registered.len());
            registered.push(RegisteredTool {
                descriptor: ToolDescriptor {
                    name,
                    description: tool.description().to_string(),
                    parameters: tool.parameters(),
                },
                tool,
            });
        }

        Self {
            tools: registered,
            index,
        }
    }

    /// Descriptors of every tool, in registration order.
    pub fn describe(&self) -> Vec<ToolDescriptor> {
        self.tools.iter().map(|t| t.descriptor.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Function schemas for the model, in registration order.
    pub fn tool_schemas(&self) -> Vec<ToolSchema> {
        self.tools
            .iter()
            .map(|t| ToolSchema {
                tool_type: "function".to_string(),
                function: ToolFunction {
                    name: t.descriptor.name.clone(),
                    description: t.descriptor.description.clone(),
                    parameters: t.descriptor.parameters_schema(),
                },
            })
            .collect()
    }

    /// Validate `args` against the tool's declaration and run it.
    ///
    /// Errors are tagged with the tool name and returned as-is: nothing is
    /// retried or converted into output text here.
    pub async fn execute(
        &self,
        name: &str,
        args: &ToolArgs,
        ctx: &ToolContext,
    ) -> Result<String, ToolFailure> {
        let fail = |error| ToolFailure {
            tool: name.to_string(),
            error,
        };

        let entry = self
            .index
            .get(name)
            .map(|&i| &self.tools[i])
            .ok_or_else(|| fail(ToolError::UnknownTool(name.to_string())))?;

        entry.descriptor.validate(args).map_err(fail)?;
        entry.tool.execute(args, ctx).await.map_err(fail)
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
