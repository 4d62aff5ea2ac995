//! Virtual path helpers.
//!
//! A virtual path is absolute: the first segment is a folder display name,
//! the rest descend into that folder (`/reports/2024/q3.md`). Splitting
//! discards empty segments, so `//reports//q3.md` and `/reports/q3.md`
//! name the same node.

/// Split a virtual path into its segments, discarding empties.
pub fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Join a child name onto a virtual path.
pub fn join(base: &str, name: &str) -> String {
    let trimmed = base.trim_end_matches('/');
    format!("{trimmed}/{name}")
}

/// Build an absolute virtual path from segments.
pub fn from_segments<S: AsRef<str>>(parts: &[S]) -> String {
    let mut out = String::new();
    for part in parts {
        out.push('/');
        out.push_str(part.as_ref());
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}
