//! Read a file as numbered text.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::{parse_args, ParamSchema, Tool, ToolContext, ToolOutput, ToolSchema};
use crate::error::BridgeResult;

#[derive(Deserialize)]
struct ReadParams {
    path: String,
    /// First line to return, 1-based.
    offset: Option<usize>,
    /// Maximum number of lines.
    limit: Option<usize>,
}

/// Line-numbered file reads.
///
/// Output lines are `N<TAB>text` with original file line numbers, so the
/// content is recoverable by stripping everything through the first tab.
/// Non-UTF-8 files come back as a binary descriptor instead of text.
pub struct ReadTool;

#[async_trait]
impl Tool for ReadTool {
    fn name(&self) -> &str {
        "read"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("read", "Read a file from a tracked folder")
            .param(ParamSchema::required("path", "string", "Virtual path of the file"))
            .param(ParamSchema::optional("offset", "int", "First line to read (1-based)"))
            .param(ParamSchema::optional("limit", "int", "Maximum number of lines"))
    }

    async fn execute(&self, args: serde_json::Value, ctx: &ToolContext) -> BridgeResult<ToolOutput> {
        let params: ReadParams = parse_args(args)?;

        let file = ctx.resolver.resolve_file(&params.path).await?;
        let bytes = file.read().await?;
        let size = bytes.len();

        let Ok(text) = String::from_utf8(bytes) else {
            return Ok(ToolOutput::text(format!(
                "binary file: {} ({size} bytes)",
                params.path
            ))
            .with_data(json!({
                "type": "binary",
                "path": params.path,
                "size": size,
            })));
        };

        let total_lines = text.split_inclusive('\n').count();
        let offset = params.offset.unwrap_or(1).max(1);
        let limit = params.limit.unwrap_or(usize::MAX);

        // Lines keep their own terminators (or lack of one, for a final
        // unterminated line), so stripping the numbering recovers the
        // content byte for byte.
        let mut out = String::new();
        for (idx, line) in text
            .split_inclusive('\n')
            .enumerate()
            .skip(offset - 1)
            .take(limit)
        {
            out.push_str(&format!("{}\t{line}", idx + 1));
        }

        Ok(ToolOutput::text(out).with_data(json!({
            "path": params.path,
            "total_lines": total_lines,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::memory::{MemoryCapabilityProvider, MemoryDirectory};
    use crate::capability::DirectoryHandle;
    use crate::error::BridgeError;
    use crate::notify::ChangeNotifier;
    use crate::registry::FolderRegistry;
    use crate::store::SqliteStore;
    use std::sync::Arc;

    async fn context_with(root: Arc<MemoryDirectory>) -> ToolContext {
        let store = Arc::new(SqliteStore::in_memory().expect("store"));
        let registry = Arc::new(FolderRegistry::new(
            store.clone(),
            store,
            Arc::new(MemoryCapabilityProvider::new()),
        ));
        registry
            .adopt("docs", root as Arc<dyn DirectoryHandle>)
            .await
            .expect("adopt");
        ToolContext::new(registry, ChangeNotifier::new())
    }

    #[tokio::test]
    async fn numbers_lines_from_one() {
        let root = MemoryDirectory::new();
        root.seed_file("a.txt", b"alpha\nbeta\ngamma\n");
        let ctx = context_with(root).await;

        let out = ReadTool
            .execute(json!({"path": "/docs/a.txt"}), &ctx)
            .await
            .expect("read");
        assert_eq!(out.text, "1\talpha\n2\tbeta\n3\tgamma\n");
        assert_eq!(out.data.unwrap()["total_lines"], 3);
    }

    #[tokio::test]
    async fn offset_and_limit_window() {
        let root = MemoryDirectory::new();
        root.seed_file("a.txt", b"one\ntwo\nthree\nfour\n");
        let ctx = context_with(root).await;

        let out = ReadTool
            .execute(json!({"path": "/docs/a.txt", "offset": 2, "limit": 2}), &ctx)
            .await
            .expect("read");
        // Line numbers stay absolute.
        assert_eq!(out.text, "2\ttwo\n3\tthree\n");
    }

    #[tokio::test]
    async fn preserves_missing_trailing_newline() {
        let root = MemoryDirectory::new();
        root.seed_file("a.txt", b"no trailing newline");
        let ctx = context_with(root).await;

        let out = ReadTool
            .execute(json!({"path": "/docs/a.txt"}), &ctx)
            .await
            .expect("read");
        assert_eq!(out.text, "1\tno trailing newline");
    }

    #[tokio::test]
    async fn preserves_crlf_terminators() {
        let root = MemoryDirectory::new();
        root.seed_file("a.txt", b"one\r\ntwo\r\n");
        let ctx = context_with(root).await;

        let out = ReadTool
            .execute(json!({"path": "/docs/a.txt"}), &ctx)
            .await
            .expect("read");
        assert_eq!(out.text, "1\tone\r\n2\ttwo\r\n");
    }

    #[tokio::test]
    async fn binary_files_get_a_descriptor() {
        let root = MemoryDirectory::new();
        root.seed_file("blob.bin", &[0xff, 0xfe, 0x00]);
        let ctx = context_with(root).await;

        let out = ReadTool
            .execute(json!({"path": "/docs/blob.bin"}), &ctx)
            .await
            .expect("read");
        let data = out.data.unwrap();
        assert_eq!(data["type"], "binary");
        assert_eq!(data["size"], 3);
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let ctx = context_with(MemoryDirectory::new()).await;
        assert!(matches!(
            ReadTool.execute(json!({"path": "/docs/ghost"}), &ctx).await,
            Err(BridgeError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn malformed_args_rejected() {
        let ctx = context_with(MemoryDirectory::new()).await;
        assert!(matches!(
            ReadTool.execute(json!({"offset": 1}), &ctx).await,
            Err(BridgeError::InvalidOperation(_))
        ));
    }
}
