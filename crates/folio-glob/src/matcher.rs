//! Single-component glob matching.
//!
//! Supports `*` (any run of characters), `?` (exactly one character),
//! `[abc]`/`[a-z]` character classes, `[!...]`/`[^...]` negation, and `\`
//! escapes. Matching is iterative with single-star backtracking, so runtime
//! is O(pattern × input) even for adversarial patterns.

/// Check whether a string contains glob metacharacters (`*`, `?`, `[`).
///
/// Useful for deciding whether a path component is a literal name or a
/// pattern that needs matching.
///
/// ```
/// use folio_glob::contains_wildcards;
/// assert!(contains_wildcards("*.rs"));
/// assert!(contains_wildcards("file?"));
/// assert!(!contains_wildcards("main.rs"));
/// ```
pub fn contains_wildcards(s: &str) -> bool {
    s.contains('*') || s.contains('?') || s.contains('[')
}

/// Match a single path component against a glob pattern.
///
/// The pattern must match the entire input.
///
/// ```
/// use folio_glob::match_segment;
/// assert!(match_segment("*.rs", "main.rs"));
/// assert!(match_segment("file?", "file1"));
/// assert!(match_segment("[a-c].txt", "b.txt"));
/// assert!(!match_segment("*.rs", "main.go"));
/// ```
pub fn match_segment(pattern: &str, input: &str) -> bool {
    let pat: Vec<char> = pattern.chars().collect();
    let inp: Vec<char> = input.chars().collect();

    let mut pi = 0;
    let mut ii = 0;
    // Position to resume from when a mismatch forces backtracking:
    // (pattern index after the star, input index the star will re-consume).
    let mut retry: Option<(usize, usize)> = None;

    while ii < inp.len() {
        if pi < pat.len() {
            match pat[pi] {
                '*' => {
                    // Consecutive stars collapse to one.
                    while pi < pat.len() && pat[pi] == '*' {
                        pi += 1;
                    }
                    retry = Some((pi, ii));
                    continue;
                }
                '?' => {
                    pi += 1;
                    ii += 1;
                    continue;
                }
                '[' => {
                    if let Some((hit, len)) = match_class(&pat[pi..], inp[ii]) {
                        if hit {
                            pi += len;
                            ii += 1;
                            continue;
                        }
                    } else if inp[ii] == '[' {
                        // Unclosed bracket is a literal `[`.
                        pi += 1;
                        ii += 1;
                        continue;
                    }
                }
                '\\' if pi + 1 < pat.len() => {
                    if pat[pi + 1] == inp[ii] {
                        pi += 2;
                        ii += 1;
                        continue;
                    }
                }
                c => {
                    if c == inp[ii] {
                        pi += 1;
                        ii += 1;
                        continue;
                    }
                }
            }
        }

        // Mismatch: let the most recent star absorb one more input character.
        match retry {
            Some((star_pi, star_ii)) => {
                pi = star_pi;
                ii = star_ii + 1;
                retry = Some((star_pi, star_ii + 1));
            }
            None => return false,
        }
    }

    // Input exhausted; remaining pattern must be all stars.
    while pi < pat.len() && pat[pi] == '*' {
        pi += 1;
    }
    pi == pat.len()
}

/// Match `ch` against a character class starting at `pat[0] == '['`.
///
/// Returns `(matched, consumed)` where `consumed` counts pattern characters
/// including both brackets, or `None` if the class is unclosed.
fn match_class(pat: &[char], ch: char) -> Option<(bool, usize)> {
    debug_assert_eq!(pat.first(), Some(&'['));

    let mut idx = 1;
    let negate = matches!(pat.get(idx), Some('!') | Some('^'));
    if negate {
        idx += 1;
    }

    // A `]` immediately after `[` (or the negation) is a literal member.
    let body_start = idx;
    let mut matched = false;

    while idx < pat.len() {
        if pat[idx] == ']' && idx > body_start {
            return Some((matched != negate, idx + 1));
        }

        // Range like a-z, unless the dash is trailing (then it's literal).
        if idx + 2 < pat.len() && pat[idx + 1] == '-' && pat[idx + 2] != ']' {
            if ch >= pat[idx] && ch <= pat[idx + 2] {
                matched = true;
            }
            idx += 3;
        } else {
            if pat[idx] == ch {
                matched = true;
            }
            idx += 1;
        }
    }

    None
}
