//! Glob pattern matching for folio virtual paths.
//!
//! Two layers:
//!
//! - [`match_segment`]: matches a single path component against `*`, `?`,
//!   `[...]` character classes, and `\` escapes. `*` here never crosses a
//!   path separator because it only ever sees one component.
//! - [`PathPattern`]: a parsed, path-aware pattern with globstar support.
//!   `**` matches zero or more whole components, so `**/*.rs` matches
//!   `main.rs` as well as `src/deep/main.rs`.

mod matcher;
mod pattern;

pub use matcher::{contains_wildcards, match_segment};
pub use pattern::{PathPattern, PatternError, Segment};
