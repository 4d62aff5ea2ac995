//! Targeted text replacement within a file.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::{parse_args, ParamSchema, Tool, ToolContext, ToolOutput, ToolSchema};
use crate::error::{BridgeError, BridgeResult};
use crate::notify::ChangeKind;

#[derive(Deserialize)]
struct EditParams {
    path: String,
    old_text: String,
    new_text: String,
    #[serde(default)]
    replace_all: bool,
}

/// Replace occurrences of `old_text`. First occurrence only unless
/// `replace_all`; zero occurrences is an error so silent no-ops can't
/// masquerade as edits.
pub struct EditTool;

#[async_trait]
impl Tool for EditTool {
    fn name(&self) -> &str {
        "edit"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("edit", "Replace text within a file")
            .param(ParamSchema::required("path", "string", "Virtual path of the file"))
            .param(ParamSchema::required("old_text", "string", "Text to find"))
            .param(ParamSchema::required("new_text", "string", "Replacement text"))
            .param(ParamSchema::optional(
                "replace_all",
                "bool",
                "Replace every occurrence instead of the first",
            ))
    }

    async fn execute(&self, args: serde_json::Value, ctx: &ToolContext) -> BridgeResult<ToolOutput> {
        let params: EditParams = parse_args(args)?;
        if params.old_text.is_empty() {
            return Err(BridgeError::InvalidOperation(
                "old_text must not be empty".to_string(),
            ));
        }

        let file = ctx.resolver.resolve_file(&params.path).await?;
        let bytes = file.read().await?;
        let text = String::from_utf8(bytes).map_err(|_| {
            BridgeError::InvalidOperation(format!("cannot edit binary file: {}", params.path))
        })?;

        let occurrences = text.matches(&params.old_text).count();
        if occurrences == 0 {
            return Err(BridgeError::WriteFailure(format!(
                "old_text not found in {}",
                params.path
            )));
        }

        let (updated, replaced) = if params.replace_all {
            (text.replace(&params.old_text, &params.new_text), occurrences)
        } else {
            (text.replacen(&params.old_text, &params.new_text, 1), 1)
        };

        file.write(updated.as_bytes()).await?;
        ctx.notifier.emit(ChangeKind::Update, &params.path);

        Ok(ToolOutput::text(format!(
            "replaced {replaced} occurrence(s) in {}",
            params.path
        ))
        .with_data(json!({
            "path": params.path,
            "replacements": replaced,
        })))
    }
}
