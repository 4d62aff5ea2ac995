//! Find files by glob pattern.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::{parse_args, ParamSchema, Tool, ToolContext, ToolOutput, ToolSchema};
use crate::error::BridgeResult;

#[derive(Deserialize)]
struct GlobParams {
    pattern: String,
    /// Restrict to one folder by display name.
    folder: Option<String>,
}

/// Glob over tracked folders, delegating to the search engine.
pub struct GlobTool;

#[async_trait]
impl Tool for GlobTool {
    fn name(&self) -> &str {
        "glob"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("glob", "Find files matching a glob pattern")
            .param(ParamSchema::required(
                "pattern",
                "string",
                "Glob pattern, matched against folder-relative paths",
            ))
            .param(ParamSchema::optional(
                "folder",
                "string",
                "Limit the search to one folder by display name",
            ))
    }

    async fn execute(&self, args: serde_json::Value, ctx: &ToolContext) -> BridgeResult<ToolOutput> {
        let params: GlobParams = parse_args(args)?;

        let paths = ctx
            .search
            .glob(&params.pattern, params.folder.as_deref())
            .await?;

        let text = if paths.is_empty() {
            "no matches".to_string()
        } else {
            paths.join("\n")
        };
        Ok(ToolOutput::text(text).with_data(json!(paths)))
    }
}
