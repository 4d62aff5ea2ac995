//! Write a file, creating it and its parents as needed.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::{parse_args, ParamSchema, Tool, ToolContext, ToolOutput, ToolSchema};
use crate::error::BridgeResult;
use crate::notify::ChangeKind;

#[derive(Deserialize)]
struct WriteParams {
    path: String,
    content: String,
}

/// Whole-file writes. Emits `Create` for new files, `Update` otherwise.
pub struct WriteTool;

#[async_trait]
impl Tool for WriteTool {
    fn name(&self) -> &str {
        "write"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("write", "Write a file in a tracked folder")
            .param(ParamSchema::required("path", "string", "Virtual path of the file"))
            .param(ParamSchema::required("content", "string", "Full new content"))
    }

    async fn execute(&self, args: serde_json::Value, ctx: &ToolContext) -> BridgeResult<ToolOutput> {
        let params: WriteParams = parse_args(args)?;

        let (file, existed) = ctx.resolver.ensure_file(&params.path).await?;
        file.write(params.content.as_bytes()).await?;

        let kind = if existed {
            ChangeKind::Update
        } else {
            ChangeKind::Create
        };
        ctx.notifier.emit(kind, &params.path);

        let bytes = params.content.len();
        Ok(
            ToolOutput::text(format!("wrote {bytes} bytes to {}", params.path)).with_data(json!({
                "path": params.path,
                "bytes": bytes,
                "created": !existed,
            })),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::memory::{MemoryCapabilityProvider, MemoryDirectory};
    use crate::capability::DirectoryHandle;
    use crate::notify::{ChangeEvent, ChangeNotifier};
    use crate::registry::FolderRegistry;
    use crate::store::SqliteStore;
    use std::sync::{Arc, Mutex};

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
    async fn creates_file_and_parents() {
        let root = MemoryDirectory::new();
        let ctx = context_with(Arc::clone(&root)).await;

        let out = WriteTool
            .execute(
                json!({"path": "/docs/deep/new.txt", "content": "hello"}),
                &ctx,
            )
            .await
            .expect("write");
        assert_eq!(out.data.as_ref().unwrap()["created"], true);
        assert_eq!(out.data.unwrap()["bytes"], 5);

        let deep = root.child_dir("deep").await.expect("dir");
        let file = deep.child_file("new.txt").await.expect("file");
        assert_eq!(file.read().await.expect("read"), b"hello");
    }

    #[tokio::test]
    async fn emits_create_then_update() {
        let root = MemoryDirectory::new();
        let ctx = context_with(root).await;

        let events: Arc<Mutex<Vec<ChangeEvent>>> = Arc::new(Mutex::new(Vec::new()));
        let events2 = Arc::clone(&events);
        let _sub = ctx.notifier.subscribe(move |e| {
            events2.lock().unwrap().push(e.clone());
        });

        WriteTool
            .execute(json!({"path": "/docs/a.txt", "content": "v1"}), &ctx)
            .await
            .expect("write");
        WriteTool
            .execute(json!({"path": "/docs/a.txt", "content": "v2"}), &ctx)
            .await
            .expect("write");

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, ChangeKind::Create);
        assert_eq!(events[1].kind, ChangeKind::Update);
        assert_eq!(events[0].path, "/docs/a.txt");
    }

    #[tokio::test]
    async fn overwrites_whole_content() {
        let root = MemoryDirectory::new();
        root.seed_file("a.txt", b"a much longer original content");
        let ctx = context_with(Arc::clone(&root)).await;

        WriteTool
            .execute(json!({"path": "/docs/a.txt", "content": "short"}), &ctx)
            .await
            .expect("write");

        let file = root.child_file("a.txt").await.expect("file");
        assert_eq!(file.read().await.expect("read"), b"short");
    }
}
