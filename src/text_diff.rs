//! Character-level text diffing for script sources.
//!
//! A diff is only reported when it contains a non-whitespace change. Long runs
//! of unchanged text are collapsed to a head/tail window so the rendered output
//! stays focused on what actually differs.

use similar::{Algorithm, ChangeTag, TextDiff};
use std::fmt;
use std::time::Duration;

/// Equal segments with more lines than this are truncated when rendered.
const EQUAL_SEGMENT_MAX_LINES: usize = 6;
const EQUAL_SEGMENT_HEAD_LINES: usize = 3;
const EQUAL_SEGMENT_TAIL_LINES: usize = 4;
const ELLIPSIS_LINE: &str = "...";

const ANSI_GREEN: &str = "\x1b[32m";
const ANSI_RED: &str = "\x1b[31m";
const ANSI_RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Equal,
    Insert,
    Delete,
}

/// A maximal run of edit-script characters sharing the same tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub kind: SegmentKind,
    pub text: String,
}

/// How insertions and deletions are marked in rendered output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStyle {
    /// `{+inserted+}` and `[-deleted-]`.
    Plain,
    /// Green insertions and red deletions using ANSI escapes.
    Ansi,
}

#[derive(Debug, Clone)]
pub struct DiffOptions {
    pub style: RenderStyle,
    /// Upper bound on the time spent computing a minimal edit script. Past the
    /// deadline the diff is still correct but may not be minimal.
    pub timeout: Duration,
}

impl Default for DiffOptions {
    fn default() -> Self {
        DiffOptions {
            style: RenderStyle::Plain,
            timeout: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDiff(String);

impl RenderedDiff {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RenderedDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct DiffEngine {
    options: DiffOptions,
}

impl DiffEngine {
    pub fn new(options: DiffOptions) -> Self {
        DiffEngine { options }
    }

    /// Diff `old` against `new` and render the result.
    ///
    /// Returns `None` when the texts are equal or when every inserted and
    /// deleted run is whitespace only. Two empty inputs are "no difference";
    /// deciding whether an empty side is an anomaly is up to the caller.
    pub fn compute(&self, old: &str, new: &str) -> Option<RenderedDiff> {
        let segments = self.segments(old, new);
        if !has_difference(&segments) {
            return None;
        }
        Some(RenderedDiff(render(&segments, self.options.style)))
    }

    fn segments(&self, old: &str, new: &str) -> Vec<Segment> {
        let diff = TextDiff::configure()
            .algorithm(Algorithm::Myers)
            .timeout(self.options.timeout)
            .diff_chars(old, new);

        let mut segments: Vec<Segment> = Vec::new();
        for change in diff.iter_all_changes() {
            let kind = match change.tag() {
                ChangeTag::Equal => SegmentKind::Equal,
                ChangeTag::Insert => SegmentKind::Insert,
                ChangeTag::Delete => SegmentKind::Delete,
            };
            match segments.last_mut() {
                Some(last) if last.kind == kind => last.text.push_str(change.value()),
                _ => segments.push(Segment {
                    kind,
                    text: change.value().to_string(),
                }),
            }
        }
        segments
    }
}

fn has_difference(segments: &[Segment]) -> bool {
    segments
        .iter()
        .any(|s| s.kind != SegmentKind::Equal && !s.text.trim().is_empty())
}

fn render(segments: &[Segment], style: RenderStyle) -> String {
    let mut out = String::new();
    for segment in segments {
        match (segment.kind, style) {
            (SegmentKind::Equal, _) => out.push_str(&truncate_equal(&segment.text)),
            (SegmentKind::Insert, RenderStyle::Plain) => {
                out.push_str("{+");
                out.push_str(&segment.text);
                out.push_str("+}");
            }
            (SegmentKind::Delete, RenderStyle::Plain) => {
                out.push_str("[-");
                out.push_str(&segment.text);
                out.push_str("-]");
            }
            (SegmentKind::Insert, RenderStyle::Ansi) => {
                out.push_str(ANSI_GREEN);
                out.push_str(&segment.text);
                out.push_str(ANSI_RESET);
            }
            (SegmentKind::Delete, RenderStyle::Ansi) => {
                out.push_str(ANSI_RED);
                out.push_str(&segment.text);
                out.push_str(ANSI_RESET);
            }
        }
    }
    out
}

/// Collapse an unchanged run longer than six lines to its first three lines,
/// an ellipsis line, and its last four lines.
fn truncate_equal(text: &str) -> String {
    // A trailing newline ends the last line; it does not start another.
    let (body, newline) = match text.strip_suffix('\n') {
        Some(body) => (body, "\n"),
        None => (text, ""),
    };
    let lines: Vec<&str> = body.split('\n').collect();
    if lines.len() <= EQUAL_SEGMENT_MAX_LINES {
        return text.to_string();
    }

    let mut kept = Vec::with_capacity(EQUAL_SEGMENT_HEAD_LINES + 1 + EQUAL_SEGMENT_TAIL_LINES);
    kept.extend_from_slice(&lines[..EQUAL_SEGMENT_HEAD_LINES]);
    kept.push(ELLIPSIS_LINE);
    kept.extend_from_slice(&lines[lines.len() - EQUAL_SEGMENT_TAIL_LINES..]);
    format!("{}{newline}", kept.join("\n"))
}
