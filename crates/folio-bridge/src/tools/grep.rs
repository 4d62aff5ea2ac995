//! Search file contents by regex.

use async_trait::async_trait;
use serde::Deserialize;

use super::{parse_args, ParamSchema, Tool, ToolContext, ToolOutput, ToolSchema};
use crate::error::{BridgeError, BridgeResult};

#[derive(Deserialize)]
struct GrepParams {
    pattern: String,
    folder: Option<String>,
    file_pattern: Option<String>,
    #[serde(default)]
    ignore_case: bool,
}

/// Content search, delegating to the search engine. Text output is one
/// `path:line:column: text` row per match.
pub struct GrepTool;

#[async_trait]
impl Tool for GrepTool {
    fn name(&self) -> &str {
        "grep"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("grep", "Search file contents with a regex")
            .param(ParamSchema::required("pattern", "string", "Regular expression"))
            .param(ParamSchema::optional(
                "folder",
                "string",
                "Limit the search to one folder by display name",
            ))
            .param(ParamSchema::optional(
                "file_pattern",
                "string",
                "Glob limiting which files are searched",
            ))
            .param(ParamSchema::optional(
                "ignore_case",
                "bool",
                "Case-insensitive matching",
            ))
    }

    async fn execute(&self, args: serde_json::Value, ctx: &ToolContext) -> BridgeResult<ToolOutput> {
        let params: GrepParams = parse_args(args)?;

        let matches = ctx
            .search
            .grep(
                &params.pattern,
                params.folder.as_deref(),
                params.file_pattern.as_deref(),
                params.ignore_case,
            )
            .await?;

        let text = if matches.is_empty() {
            "no matches".to_string()
        } else {
            matches
                .iter()
                .map(|m| format!("{}:{}:{}: {}", m.path, m.line_number, m.column, m.line))
                .collect::<Vec<_>>()
                .join("\n")
        };

        let data = serde_json::to_value(&matches)
            .map_err(|e| BridgeError::InvalidOperation(format!("encoding matches: {e}")))?;
        Ok(ToolOutput::text(text).with_data(data))
    }
}
