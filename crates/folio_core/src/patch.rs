//! Patch primitives: creating, parsing, and applying text patches.
//!
//! A patch is a unified-diff text block with a header naming the chapter
//! identity it belongs to:
//!
//! ```text
//! Index: n2rViOebV8aCrxEeIR4e7
//! ===================================================================
//! --- n2rViOebV8aCrxEeIR4e7	-
//! +++ n2rViOebV8aCrxEeIR4e7	-
//! @@ -1,1 +1,1 @@
//! -Once upon a time...
//! +Once  a time... there was
//! ```
//!
//! The marker after the tab in the `---`/`+++` lines is a literal `-`;
//! chains identify revisions by position, not by timestamp. Hunks carry
//! enough context to verify the base text they apply to, so a patch
//! applied against a drifted base fails loudly instead of producing
//! silently wrong text.
//!
//! All functions here are pure; nothing touches the store.

use std::fmt;

use similar::{ChangeTag, TextDiff};

use crate::error::{FolioError, Result};

/// Unchanged lines kept around each hunk for context verification.
const CONTEXT_RADIUS: usize = 3;

/// Marker written after the label in `---`/`+++` header lines,
/// in place of a timestamp.
const REVISION_MARKER: &str = "-";

/// Separator line between the `Index:` header and the file labels.
const HEADER_RULE: &str = "===================================================================";

/// Marker emitted after a line that does not end with a newline.
const NO_NEWLINE_MARKER: &str = "\\ No newline at end of file";

/// One line of a hunk body.
///
/// The contained string keeps its trailing newline; a line without one is
/// the last line of a text that does not end in a newline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchLine {
    /// Line present in both texts.
    Context(String),
    /// Line added by the patch.
    Insert(String),
    /// Line removed by the patch.
    Delete(String),
}

impl PatchLine {
    fn content(&self) -> &str {
        match self {
            PatchLine::Context(s) | PatchLine::Insert(s) | PatchLine::Delete(s) => s,
        }
    }

    fn prefix(&self) -> char {
        match self {
            PatchLine::Context(_) => ' ',
            PatchLine::Insert(_) => '+',
            PatchLine::Delete(_) => '-',
        }
    }
}

/// A contiguous block of changes with surrounding context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    /// 1-based first line of the hunk in the old text
    /// (0 when the hunk's old side is empty).
    pub old_start: usize,
    /// Number of old-side lines (context plus deletions).
    pub old_lines: usize,
    /// 1-based first line of the hunk in the new text
    /// (0 when the hunk's new side is empty).
    pub new_start: usize,
    /// Number of new-side lines (context plus insertions).
    pub new_lines: usize,
    /// Hunk body, in order.
    pub lines: Vec<PatchLine>,
}

/// A parsed patch: header labels plus an ordered list of hunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    /// Label of the text the patch applies to (the chapter identity).
    pub from_label: String,
    /// Label of the text the patch produces (the chapter identity).
    pub to_label: String,
    /// Hunks in ascending old-side order.
    pub hunks: Vec<Hunk>,
}

/// Splits text into lines, each keeping its trailing newline.
/// The empty string has no lines.
fn split_keep_newline(text: &str) -> Vec<&str> {
    text.split_inclusive('\n').collect()
}

/// Computes the patch transforming `old` into `new`.
///
/// Line-granularity Myers diff with [`CONTEXT_RADIUS`] lines of context
/// per hunk. Deterministic: identical inputs always yield an identical
/// patch. `identity` becomes both header labels.
pub fn create_patch(identity: &str, old: &str, new: &str) -> Patch {
    let diff = TextDiff::from_lines(old, new);

    let mut hunks = Vec::new();
    for group in diff.grouped_ops(CONTEXT_RADIUS) {
        let (Some(first), Some(last)) = (group.first(), group.last()) else {
            continue;
        };
        let old_range = first.old_range().start..last.old_range().end;
        let new_range = first.new_range().start..last.new_range().end;

        let mut lines = Vec::new();
        for op in &group {
            for change in diff.iter_changes(op) {
                let value = change.value().to_string();
                lines.push(match change.tag() {
                    ChangeTag::Equal => PatchLine::Context(value),
                    ChangeTag::Delete => PatchLine::Delete(value),
                    ChangeTag::Insert => PatchLine::Insert(value),
                });
            }
        }

        hunks.push(Hunk {
            // Unified-diff convention: an empty side names the line
            // before the change, which can be 0.
            old_start: if old_range.is_empty() {
                old_range.start
            } else {
                old_range.start + 1
            },
            old_lines: old_range.len(),
            new_start: if new_range.is_empty() {
                new_range.start
            } else {
                new_range.start + 1
            },
            new_lines: new_range.len(),
            lines,
        });
    }

    Patch {
        from_label: identity.to_string(),
        to_label: identity.to_string(),
        hunks,
    }
}

/// Applies `patch` to `old`, producing the new text.
///
/// Every context and deletion line is verified against `old`; the first
/// line that does not match fails the whole application with
/// [`FolioError::PatchMismatch`]. A patch with no hunks returns `old`
/// unchanged.
pub fn apply_patch(old: &str, patch: &Patch) -> Result<String> {
    let old_lines = split_keep_newline(old);
    let mut out = String::with_capacity(old.len());
    let mut cursor = 0usize;

    for (hunk_no, hunk) in patch.hunks.iter().enumerate() {
        let start = if hunk.old_lines == 0 {
            hunk.old_start
        } else {
            hunk.old_start - 1
        };
        if start < cursor || start > old_lines.len() {
            return Err(FolioError::PatchMismatch {
                hunk: hunk_no,
                expected: format!("hunk at old line {}", hunk.old_start),
                found: None,
            });
        }

        for line in &old_lines[cursor..start] {
            out.push_str(line);
        }
        cursor = start;

        for line in &hunk.lines {
            match line {
                PatchLine::Context(want) | PatchLine::Delete(want) => {
                    let found = old_lines.get(cursor).copied();
                    if found != Some(want.as_str()) {
                        return Err(FolioError::PatchMismatch {
                            hunk: hunk_no,
                            expected: want.clone(),
                            found: found.map(str::to_string),
                        });
                    }
                    if matches!(line, PatchLine::Context(_)) {
                        out.push_str(want);
                    }
                    cursor += 1;
                }
                PatchLine::Insert(text) => out.push_str(text),
            }
        }
    }

    for line in &old_lines[cursor..] {
        out.push_str(line);
    }
    Ok(out)
}

impl fmt::Display for Patch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Index: {}", self.from_label)?;
        writeln!(f, "{}", HEADER_RULE)?;
        writeln!(f, "--- {}\t{}", self.from_label, REVISION_MARKER)?;
        writeln!(f, "+++ {}\t{}", self.to_label, REVISION_MARKER)?;
        for hunk in &self.hunks {
            writeln!(
                f,
                "@@ -{},{} +{},{} @@",
                hunk.old_start, hunk.old_lines, hunk.new_start, hunk.new_lines
            )?;
            for line in &hunk.lines {
                let content = line.content();
                if content.ends_with('\n') {
                    write!(f, "{}{}", line.prefix(), content)?;
                } else {
                    writeln!(f, "{}{}", line.prefix(), content)?;
                    writeln!(f, "{}", NO_NEWLINE_MARKER)?;
                }
            }
        }
        Ok(())
    }
}

impl Patch {
    /// Parses the wire format produced by [`Patch`]'s `Display` impl
    /// (and by the editor stack that wrote existing chains).
    ///
    /// `Index:` and rule lines are accepted and skipped; `---`/`+++`
    /// lines set the labels. Anything else outside a hunk body fails
    /// with [`FolioError::PatchParse`].
    pub fn parse(script: &str) -> Result<Patch> {
        let mut from_label = String::new();
        let mut to_label = String::new();
        let mut hunks: Vec<Hunk> = Vec::new();

        let mut lines = script.lines().enumerate().peekable();
        while let Some((no, line)) = lines.next() {
            if line.starts_with("Index:") || line.starts_with("===") {
                continue;
            }
            if let Some(rest) = line.strip_prefix("--- ") {
                from_label = parse_label(rest);
                continue;
            }
            if let Some(rest) = line.strip_prefix("+++ ") {
                to_label = parse_label(rest);
                continue;
            }
            if line.starts_with("@@") {
                let (old_start, old_count, new_start, new_count) = parse_hunk_header(no, line)?;
                let mut body: Vec<PatchLine> = Vec::new();
                let mut old_seen = 0usize;
                let mut new_seen = 0usize;

                while old_seen < old_count || new_seen < new_count {
                    let Some((body_no, body_line)) = lines.next() else {
                        return Err(FolioError::PatchParse {
                            line: no + 1,
                            reason: "truncated hunk".to_string(),
                        });
                    };
                    if body_line.starts_with('\\') {
                        strip_trailing_newline(&mut body, body_no)?;
                        continue;
                    }
                    match body_line.chars().next() {
                        Some(' ') => {
                            old_seen += 1;
                            new_seen += 1;
                            body.push(PatchLine::Context(format!("{}\n", &body_line[1..])));
                        }
                        // An entirely empty line is a context line whose
                        // content is empty (trailing whitespace stripped
                        // somewhere between writer and reader).
                        None => {
                            old_seen += 1;
                            new_seen += 1;
                            body.push(PatchLine::Context("\n".to_string()));
                        }
                        Some('+') => {
                            new_seen += 1;
                            body.push(PatchLine::Insert(format!("{}\n", &body_line[1..])));
                        }
                        Some('-') => {
                            old_seen += 1;
                            body.push(PatchLine::Delete(format!("{}\n", &body_line[1..])));
                        }
                        Some(other) => {
                            return Err(FolioError::PatchParse {
                                line: body_no + 1,
                                reason: format!("unexpected hunk line prefix {:?}", other),
                            });
                        }
                    }
                }

                // A trailing no-newline marker belongs to this hunk.
                if let Some((marker_no, l)) = lines.peek()
                    && l.starts_with('\\')
                {
                    let marker_no = *marker_no;
                    lines.next();
                    strip_trailing_newline(&mut body, marker_no)?;
                }

                hunks.push(Hunk {
                    old_start,
                    old_lines: old_count,
                    new_start,
                    new_lines: new_count,
                    lines: body,
                });
                continue;
            }
            if line.trim().is_empty() {
                continue;
            }
            return Err(FolioError::PatchParse {
                line: no + 1,
                reason: format!("unexpected line {:?}", line),
            });
        }

        Ok(Patch {
            from_label,
            to_label,
            hunks,
        })
    }
}

/// Extracts the label from a `---`/`+++` header rest, dropping the
/// tab-separated revision marker when present.
fn parse_label(rest: &str) -> String {
    match rest.split_once('\t') {
        Some((label, _marker)) => label.to_string(),
        None => rest.to_string(),
    }
}

/// Removes the newline appended to the most recent body line, as
/// directed by a `\ No newline at end of file` marker.
fn strip_trailing_newline(body: &mut [PatchLine], marker_line: usize) -> Result<()> {
    let Some(last) = body.last_mut() else {
        return Err(FolioError::PatchParse {
            line: marker_line + 1,
            reason: "no-newline marker with no preceding line".to_string(),
        });
    };
    let content = match last {
        PatchLine::Context(s) | PatchLine::Insert(s) | PatchLine::Delete(s) => s,
    };
    if content.ends_with('\n') {
        content.pop();
    }
    Ok(())
}

/// Parses `@@ -a,b +c,d @@`. A missing count defaults to 1.
fn parse_hunk_header(line_no: usize, line: &str) -> Result<(usize, usize, usize, usize)> {
    let malformed = || FolioError::PatchParse {
        line: line_no + 1,
        reason: format!("malformed hunk header {:?}", line),
    };

    let inner = line
        .strip_prefix("@@ -")
        .and_then(|rest| rest.split(" @@").next())
        .ok_or_else(malformed)?;
    let (old_part, new_part) = inner.split_once(" +").ok_or_else(malformed)?;

    let parse_side = |side: &str| -> Result<(usize, usize)> {
        let (start, count) = match side.split_once(',') {
            Some((s, c)) => (
                s.parse().map_err(|_| malformed())?,
                c.parse().map_err(|_| malformed())?,
            ),
            None => (side.parse().map_err(|_| malformed())?, 1),
        };
        Ok((start, count))
    };

    let (old_start, old_count) = parse_side(old_part)?;
    let (new_start, new_count) = parse_side(new_part)?;
    Ok((old_start, old_count, new_start, new_count))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(old: &str, new: &str) {
        let patch = create_patch("c1", old, new);
        let applied = apply_patch(old, &patch).unwrap();
        assert_eq!(applied, new, "round trip failed for {:?} -> {:?}", old, new);

        // The wire format must survive parsing too.
        let reparsed = Patch::parse(&patch.to_string()).unwrap();
        assert_eq!(reparsed, patch);
        assert_eq!(apply_patch(old, &reparsed).unwrap(), new);
    }

    #[test]
    fn test_round_trip_simple() {
        round_trip("Hello", "Hello world");
        round_trip("Hello\n", "Hello world\n");
    }

    #[test]
    fn test_round_trip_empty_sides() {
        round_trip("", "a whole new chapter\n");
        round_trip("everything must go\n", "");
        round_trip("", "");
    }

    #[test]
    fn test_round_trip_no_trailing_newline() {
        round_trip("one\ntwo\nthree", "one\ntwo\nthree\nfour");
        round_trip("one\ntwo\n", "one\ntwo");
        round_trip("ends abruptly", "ends abruptly\n");
    }

    #[test]
    fn test_round_trip_multiple_hunks() {
        let old: String = (0..30).map(|i| format!("line {}\n", i)).collect();
        let new = old
            .replace("line 2\n", "line two\n")
            .replace("line 27\n", "line twenty-seven\nline extra\n");
        round_trip(&old, &new);

        let patch = create_patch("c1", &old, &new);
        assert_eq!(patch.hunks.len(), 2);
    }

    #[test]
    fn test_create_patch_is_deterministic() {
        let old = "a\nb\nc\nd\n";
        let new = "a\nB\nc\nD\n";
        let first = create_patch("c1", old, new);
        let second = create_patch("c1", old, new);
        assert_eq!(first, second);
        assert_eq!(first.to_string(), second.to_string());
    }

    #[test]
    fn test_wire_format() {
        let patch = create_patch("c1", "Hello", "Hello world");
        let script = patch.to_string();
        let expected = "Index: c1\n\
                        ===================================================================\n\
                        --- c1\t-\n\
                        +++ c1\t-\n\
                        @@ -1,1 +1,1 @@\n\
                        -Hello\n\
                        \\ No newline at end of file\n\
                        +Hello world\n\
                        \\ No newline at end of file\n";
        assert_eq!(script, expected);
        assert_eq!(patch.from_label, "c1");
        assert_eq!(patch.to_label, "c1");
    }

    #[test]
    fn test_identical_texts_produce_empty_patch() {
        let patch = create_patch("c1", "same\n", "same\n");
        assert!(patch.hunks.is_empty());
        assert_eq!(apply_patch("same\n", &patch).unwrap(), "same\n");
    }

    #[test]
    fn test_apply_rejects_drifted_base() {
        let patch = create_patch("c1", "old text\n", "new text\n");
        let err = apply_patch("completely different\n", &patch).unwrap_err();
        assert!(matches!(err, FolioError::PatchMismatch { hunk: 0, .. }));
    }

    #[test]
    fn test_apply_rejects_out_of_range_hunk() {
        let mut patch = create_patch("c1", "a\nb\nc\n", "a\nb\nC\n");
        patch.hunks[0].old_start = 40;
        let err = apply_patch("a\nb\nc\n", &patch).unwrap_err();
        assert!(matches!(err, FolioError::PatchMismatch { .. }));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = Patch::parse("this is not a patch").unwrap_err();
        assert!(matches!(err, FolioError::PatchParse { line: 1, .. }));
    }

    #[test]
    fn test_parse_rejects_truncated_hunk() {
        let script = "--- c1\t-\n+++ c1\t-\n@@ -1,2 +1,2 @@\n-only one line\n";
        let err = Patch::parse(script).unwrap_err();
        assert!(matches!(err, FolioError::PatchParse { .. }));
    }

    #[test]
    fn test_parse_accepts_headerless_counts() {
        let script = "--- c1\t-\n+++ c1\t-\n@@ -1 +1 @@\n-a\n+b\n";
        let patch = Patch::parse(script).unwrap();
        assert_eq!(patch.hunks[0].old_lines, 1);
        assert_eq!(patch.hunks[0].new_lines, 1);
        assert_eq!(apply_patch("a\n", &patch).unwrap(), "b\n");
    }

    #[test]
    fn test_context_verification() {
        // Patch expecting "b" as context must not apply where "x" sits.
        let patch = create_patch("c1", "a\nb\nc\n", "a\nb\nsea\n");
        let err = apply_patch("a\nx\nc\n", &patch).unwrap_err();
        match err {
            FolioError::PatchMismatch { expected, found, .. } => {
                assert_eq!(expected, "b\n");
                assert_eq!(found, Some("x\n".to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
