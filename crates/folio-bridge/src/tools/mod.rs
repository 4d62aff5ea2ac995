//! The outward tool surface.
//!
//! Each tool takes JSON arguments and returns text plus optional
//! structured data, so an AI or automation layer can wire them up from
//! the schemas alone. Tools are stateless; everything they touch comes
//! in through [`ToolContext`].

mod edit;
mod glob;
mod grep;
mod read;
mod write;

pub use edit::EditTool;
pub use glob::GlobTool;
pub use grep::GrepTool;
pub use read::ReadTool;
pub use write::WriteTool;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::error::{BridgeError, BridgeResult};
use crate::notify::ChangeNotifier;
use crate::registry::FolderRegistry;
use crate::resolver::PathResolver;
use crate::search::SearchEngine;

/// Schema for a tool parameter.
#[derive(Debug, Clone)]
pub struct ParamSchema {
    pub name: String,
    /// Type hint (string, int, bool).
    pub param_type: String,
    pub required: bool,
    pub description: String,
}

impl ParamSchema {
    /// Create a required parameter.
    pub fn required(
        name: impl Into<String>,
        param_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            param_type: param_type.into(),
            required: true,
            description: description.into(),
        }
    }

    /// Create an optional parameter.
    pub fn optional(
        name: impl Into<String>,
        param_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            param_type: param_type.into(),
            required: false,
            description: description.into(),
        }
    }
}

/// Schema describing a tool's interface.
#[derive(Debug, Clone)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub params: Vec<ParamSchema>,
}

impl ToolSchema {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            params: Vec::new(),
        }
    }

    pub fn param(mut self, param: ParamSchema) -> Self {
        self.params.push(param);
        self
    }
}

/// Result of a tool execution.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Human/model-readable rendering.
    pub text: String,
    /// Structured form of the same result, when one exists.
    pub data: Option<serde_json::Value>,
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Everything a tool execution can reach.
pub struct ToolContext {
    pub resolver: Arc<PathResolver>,
    pub search: Arc<SearchEngine>,
    pub notifier: ChangeNotifier,
}

impl ToolContext {
    pub fn new(registry: Arc<FolderRegistry>, notifier: ChangeNotifier) -> Self {
        Self {
            resolver: Arc::new(PathResolver::new(Arc::clone(&registry))),
            search: Arc::new(SearchEngine::new(registry)),
            notifier,
        }
    }
}

/// A tool invocable with JSON arguments.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The tool's name (used for lookup).
    fn name(&self) -> &str;

    /// Get the tool's schema.
    fn schema(&self) -> ToolSchema;

    /// Execute with the given arguments and context.
    async fn execute(&self, args: serde_json::Value, ctx: &ToolContext) -> BridgeResult<ToolOutput>;
}

/// Deserialize tool arguments into a typed parameter struct.
fn parse_args<T: DeserializeOwned>(args: serde_json::Value) -> BridgeResult<T> {
    serde_json::from_value(args)
        .map_err(|e| BridgeError::InvalidOperation(format!("invalid arguments: {e}")))
}

/// Registry of available tools, looked up by name.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the five standard tools.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(ReadTool));
        registry.register(Arc::new(WriteTool));
        registry.register(Arc::new(EditTool));
        registry.register(Arc::new(GlobTool));
        registry.register(Arc::new(GrepTool));
        registry
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Schemas of all registered tools, sorted by name.
    pub fn schemas(&self) -> Vec<ToolSchema> {
        let mut schemas: Vec<ToolSchema> = self.tools.values().map(|t| t.schema()).collect();
        schemas.sort_by(|a, b| a.name.cmp(&b.name));
        schemas
    }

    /// Look up and execute a tool in one step.
    pub async fn execute(
        &self,
        name: &str,
        args: serde_json::Value,
        ctx: &ToolContext,
    ) -> BridgeResult<ToolOutput> {
        let tool = self
            .get(name)
            .ok_or_else(|| BridgeError::NotFound(format!("tool: {name}")))?;
        tool.execute(args, ctx).await
    }
}
