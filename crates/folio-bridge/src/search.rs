//! Search across tracked folders: glob on names, grep on contents.
//!
//! Both walk sequentially, depth-first, one directory at a time. Per-file
//! trouble (unreadable, vanished, non-UTF-8) is logged and skipped; losing
//! access to a subtree mid-walk costs only that subtree.

use std::sync::Arc;

use folio_glob::PathPattern;
use regex::RegexBuilder;
use serde::Serialize;
use tracing::debug;

use crate::capability::{DirectoryHandle, EntryKind};
use crate::error::{BridgeError, BridgeResult};
use crate::registry::{FolderRegistry, TrackedFolder};

/// One grep match occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GrepMatch {
    /// Absolute virtual path of the file.
    pub path: String,
    /// 1-based line number.
    pub line_number: usize,
    /// The full line, without its terminator.
    pub line: String,
    /// 0-based character column of the match start.
    pub column: usize,
}

/// A file found during a walk, with enough context to open it.
struct FoundFile {
    /// Path relative to the folder root, no leading slash.
    rel: String,
    parent: Arc<dyn DirectoryHandle>,
    name: String,
}

/// Search over the registry's tracked folders.
pub struct SearchEngine {
    registry: Arc<FolderRegistry>,
}

impl SearchEngine {
    pub fn new(registry: Arc<FolderRegistry>) -> Self {
        Self { registry }
    }

    /// Find files whose folder-relative path matches a glob pattern.
    ///
    /// Returns absolute virtual paths, sorted ascending. A folder filter
    /// that matches nothing yields an empty result.
    pub async fn glob(
        &self,
        pattern: &str,
        folder_filter: Option<&str>,
    ) -> BridgeResult<Vec<String>> {
        let pattern = PathPattern::parse(pattern)?;
        let folders = self.filtered_folders(folder_filter);

        let mut out = Vec::new();
        for folder in &folders {
            for file in collect_files(folder).await {
                if pattern.matches(&file.rel) {
                    out.push(format!("/{}/{}", folder.display_name, file.rel));
                }
            }
        }
        out.sort();
        Ok(out)
    }

    /// Search file contents with a regex.
    ///
    /// `file_pattern` narrows which files are read (default everything).
    /// Matches come back in walk order, one record per occurrence. Unlike
    /// glob, a folder filter that matches nothing is an error: the caller
    /// named a folder that isn't there.
    pub async fn grep(
        &self,
        pattern: &str,
        folder_filter: Option<&str>,
        file_pattern: Option<&str>,
        ignore_case: bool,
    ) -> BridgeResult<Vec<GrepMatch>> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(ignore_case)
            .build()
            .map_err(|e| BridgeError::Pattern(e.to_string()))?;
        let file_pattern = PathPattern::parse(file_pattern.unwrap_or("**/*"))?;

        let folders = match folder_filter {
            Some(name) => vec![self
                .registry
                .find_by_name(name)
                .ok_or_else(|| BridgeError::NotFound(name.to_string()))?],
            None => self.registry.list(),
        };

        let mut matches = Vec::new();
        for folder in &folders {
            for file in collect_files(folder).await {
                if !file_pattern.matches(&file.rel) {
                    continue;
                }
                let abs = format!("/{}/{}", folder.display_name, file.rel);
                let Some(text) = read_text(&file, &abs).await else {
                    continue;
                };
                for (idx, line) in text.lines().enumerate() {
                    for hit in regex.find_iter(line) {
                        matches.push(GrepMatch {
                            path: abs.clone(),
                            line_number: idx + 1,
                            line: line.to_string(),
                            column: line[..hit.start()].chars().count(),
                        });
                    }
                }
            }
        }
        Ok(matches)
    }

    /// Folders to search: all of them, or the first name match, or none.
    fn filtered_folders(&self, filter: Option<&str>) -> Vec<TrackedFolder> {
        match filter {
            Some(name) => self.registry.find_by_name(name).into_iter().collect(),
            None => self.registry.list(),
        }
    }
}

/// Read a file as UTF-8 text, or skip it with a debug log.
async fn read_text(file: &FoundFile, abs: &str) -> Option<String> {
    let handle = match file.parent.child_file(&file.name).await {
        Ok(handle) => handle,
        Err(e) => {
            debug!(path = %abs, error = %e, "skipping unopenable file");
            return None;
        }
    };
    let bytes = match handle.read().await {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!(path = %abs, error = %e, "skipping unreadable file");
            return None;
        }
    };
    match String::from_utf8(bytes) {
        Ok(text) => Some(text),
        Err(_) => {
            debug!(path = %abs, "skipping non-utf8 file");
            None
        }
    }
}

/// Depth-first enumeration of all files under a folder.
///
/// Directories that fail to list or open are skipped; the rest of the walk
/// continues.
async fn collect_files(folder: &TrackedFolder) -> Vec<FoundFile> {
    let mut found = Vec::new();
    let mut stack: Vec<(Arc<dyn DirectoryHandle>, String)> =
        vec![(Arc::clone(&folder.handle), String::new())];

    while let Some((dir, rel)) = stack.pop() {
        let entries = match dir.list().await {
            Ok(entries) => entries,
            Err(e) => {
                debug!(folder = %folder.display_name, rel = %rel, error = %e, "skipping unlistable directory");
                continue;
            }
        };
        for entry in entries {
            let child_rel = if rel.is_empty() {
                entry.name.clone()
            } else {
                format!("{rel}/{}", entry.name)
            };
            match entry.kind {
                EntryKind::Directory => match dir.child_dir(&entry.name).await {
                    Ok(child) => stack.push((child, child_rel)),
                    Err(e) => {
                        debug!(rel = %child_rel, error = %e, "skipping unopenable directory");
                    }
                },
                EntryKind::File => found.push(FoundFile {
                    rel: child_rel,
                    parent: Arc::clone(&dir),
                    name: entry.name,
                }),
            }
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::memory::{MemoryCapabilityProvider, MemoryDirectory};
    use crate::store::SqliteStore;

    async fn engine_with(folders: &[(&str, Arc<MemoryDirectory>)]) -> SearchEngine {
        let store = Arc::new(SqliteStore::in_memory().expect("store"));
        let registry = Arc::new(FolderRegistry::new(
            store.clone(),
            store,
            Arc::new(MemoryCapabilityProvider::new()),
        ));
        for (name, root) in folders {
            registry
                .adopt(*name, Arc::clone(root) as Arc<dyn DirectoryHandle>)
                .await
                .expect("adopt");
        }
        SearchEngine::new(registry)
    }

    fn web_root() -> Arc<MemoryDirectory> {
        let root = MemoryDirectory::new();
        root.seed_file("app.ts", b"export const app = 1;\n");
        root.seed_file("src/index.ts", b"import { app } from '../app';\n");
        root.seed_file("src/util/date.ts", b"// dates\n");
        root.seed_file("src/style.css", b"body {}\n");
        root.seed_file("README.md", b"# web\n");
        root
    }

    #[tokio::test]
    async fn glob_globstar_spans_directories() {
        let engine = engine_with(&[("web", web_root())]).await;

        let hits = engine.glob("**/*.ts", None).await.expect("glob");
        assert_eq!(
            hits,
            vec![
                "/web/app.ts".to_string(),
                "/web/src/index.ts".to_string(),
                "/web/src/util/date.ts".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn glob_matches_relative_to_folder_root() {
        let engine = engine_with(&[("web", web_root())]).await;

        // `src/*.ts` must not require the folder name in the pattern.
        let hits = engine.glob("src/*.ts", None).await.expect("glob");
        assert_eq!(hits, vec!["/web/src/index.ts".to_string()]);
    }

    #[tokio::test]
    async fn glob_searches_all_folders_without_filter() {
        let other = MemoryDirectory::new();
        other.seed_file("main.ts", b"");
        let engine = engine_with(&[("web", web_root()), ("api", other)]).await;

        let hits = engine.glob("*.ts", None).await.expect("glob");
        assert_eq!(
            hits,
            vec!["/api/main.ts".to_string(), "/web/app.ts".to_string()]
        );

        let hits = engine.glob("*.ts", Some("api")).await.expect("glob");
        assert_eq!(hits, vec!["/api/main.ts".to_string()]);
    }

    #[tokio::test]
    async fn glob_unmatched_filter_is_empty() {
        let engine = engine_with(&[("web", web_root())]).await;
        let hits = engine.glob("**/*.ts", Some("nope")).await.expect("glob");
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn glob_rejects_bad_patterns() {
        let engine = engine_with(&[("web", web_root())]).await;
        assert!(matches!(
            engine.glob("", None).await,
            Err(BridgeError::Pattern(_))
        ));
    }

    #[tokio::test]
    async fn grep_reports_line_and_column() {
        let root = MemoryDirectory::new();
        root.seed_file("notes.txt", b"first line\nthe app is here\napp again: app\n");
        let engine = engine_with(&[("docs", root)]).await;

        let hits = engine.grep("app", None, None, false).await.expect("grep");
        assert_eq!(hits.len(), 3);

        assert_eq!(hits[0].path, "/docs/notes.txt");
        assert_eq!(hits[0].line_number, 2);
        assert_eq!(hits[0].line, "the app is here");
        assert_eq!(hits[0].column, 4);

        // One record per occurrence on the same line.
        assert_eq!(hits[1].line_number, 3);
        assert_eq!(hits[1].column, 0);
        assert_eq!(hits[2].line_number, 3);
        assert_eq!(hits[2].column, 11);
    }

    #[tokio::test]
    async fn grep_case_insensitive() {
        let root = MemoryDirectory::new();
        root.seed_file("todo.txt", b"todoTODO\n");
        let engine = engine_with(&[("docs", root)]).await;

        let hits = engine.grep("todo", None, None, true).await.expect("grep");
        let columns: Vec<usize> = hits.iter().map(|h| h.column).collect();
        assert_eq!(columns, vec![0, 4]);

        let hits = engine.grep("todo", None, None, false).await.expect("grep");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].column, 0);
    }

    #[tokio::test]
    async fn grep_file_pattern_narrows_scope() {
        let engine = engine_with(&[("web", web_root())]).await;

        let hits = engine
            .grep("app", None, Some("**/*.ts"), false)
            .await
            .expect("grep");
        assert!(hits.iter().all(|h| h.path.ends_with(".ts")));
        assert!(!hits.is_empty());

        let hits = engine
            .grep("app", None, Some("**/*.css"), false)
            .await
            .expect("grep");
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn grep_unmatched_folder_is_not_found() {
        let engine = engine_with(&[("web", web_root())]).await;
        assert!(matches!(
            engine.grep("app", Some("nope"), None, false).await,
            Err(BridgeError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn grep_rejects_bad_regex() {
        let engine = engine_with(&[("web", web_root())]).await;
        assert!(matches!(
            engine.grep("[unclosed", None, None, false).await,
            Err(BridgeError::Pattern(_))
        ));
    }

    #[tokio::test]
    async fn grep_skips_binary_files() {
        let root = MemoryDirectory::new();
        root.seed_file("blob.bin", &[0xff, 0xfe, 0x00, 0x61, 0x70, 0x70]);
        root.seed_file("plain.txt", b"app\n");
        let engine = engine_with(&[("docs", root)]).await;

        let hits = engine.grep("app", None, None, false).await.expect("grep");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].path, "/docs/plain.txt");
    }

    #[tokio::test]
    async fn grep_column_counts_chars_not_bytes() {
        let root = MemoryDirectory::new();
        root.seed_file("uni.txt", "héllo app\n".as_bytes());
        let engine = engine_with(&[("docs", root)]).await;

        let hits = engine.grep("app", None, None, false).await.expect("grep");
        assert_eq!(hits[0].column, 6);
    }
}
