//! Inline rich-text tokenizer
//!
//! Turns the markup of one paragraph into a flat list of styled runs.
//! Only bold and italic are modeled; runs never nest.
//!
//! # Pipeline
//!
//! 1. Canonicalize tags: `strong`/`b` become `<b>`/`</b>`, `em`/`i` become
//!    `<i>`/`</i>`; every other tag is unwrapped (its content is kept).
//! 2. Split into segments fully wrapped by one `<b>…</b>` or `<i>…</i>` span,
//!    and plain text between them.
//! 3. Decode entities and drop empty segments.
//!
//! Nested spans keep the outer style only: `<b>x<i>y</i></b>` is a single
//! bold run `"xy"`. A span nested in one of the same style is folded into
//! it, so `<strong>a <b>b</b> c</strong>` is one bold run `"a b c"`.
//! Unterminated spans stay plain and keep their literal markup.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

static TAG_NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<\s*(/?)\s*([A-Za-z][A-Za-z0-9]*)").unwrap());

static SPAN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<b>(.*?)</b>|<i>(.*?)</i>").unwrap());

static STYLE_MARKER_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"</?[bi]>").unwrap());

/// Inline text style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStyle {
    Plain,
    Bold,
    Italic,
}

/// One contiguous span of uniformly styled text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineRun {
    pub style: RunStyle,
    pub text: String,
}

impl InlineRun {
    pub fn new(style: RunStyle, text: impl Into<String>) -> Self {
        Self {
            style,
            text: text.into(),
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(RunStyle::Plain, text)
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self::new(RunStyle::Bold, text)
    }

    pub fn italic(text: impl Into<String>) -> Self {
        Self::new(RunStyle::Italic, text)
    }
}

/// Tokenize a markup fragment into styled runs
///
/// Pure function of its input; never fails.
///
/// # Examples
///
/// ```
/// use vnews::parser::inline::{tokenize, InlineRun};
///
/// let runs = tokenize("<strong>x</strong><em>y</em>");
/// assert_eq!(runs, vec![InlineRun::bold("x"), InlineRun::italic("y")]);
/// ```
pub fn tokenize(markup: &str) -> Vec<InlineRun> {
    let normalized = canonicalize_tags(markup);
    let mut runs = Vec::new();
    let mut cursor = 0;

    for caps in SPAN_REGEX.captures_iter(&normalized) {
        let Some(whole) = caps.get(0) else {
            continue;
        };

        push_run(&mut runs, RunStyle::Plain, &normalized[cursor..whole.start()]);

        if let Some(inner) = caps.get(1) {
            push_run(&mut runs, RunStyle::Bold, &strip_style_markers(inner.as_str()));
        } else if let Some(inner) = caps.get(2) {
            push_run(&mut runs, RunStyle::Italic, &strip_style_markers(inner.as_str()));
        }

        cursor = whole.end();
    }

    push_run(&mut runs, RunStyle::Plain, &normalized[cursor..]);
    runs
}

/// Concatenated text of a run sequence
pub fn runs_text(runs: &[InlineRun]) -> String {
    runs.iter().map(|run| run.text.as_str()).collect()
}

/// Map synonym tags onto `<b>`/`<i>` and unwrap everything else
///
/// Only the outermost open/close pair of each style is kept; inner markers of
/// the same style and closing tags with no open counterpart are dropped.
fn canonicalize_tags(markup: &str) -> String {
    let mut out = String::with_capacity(markup.len());
    let mut bold_depth = 0usize;
    let mut italic_depth = 0usize;
    let mut cursor = 0;

    for tag in TAG_REGEX.find_iter(markup) {
        out.push_str(&markup[cursor..tag.start()]);
        cursor = tag.end();

        let Some(name_caps) = TAG_NAME_REGEX.captures(tag.as_str()) else {
            continue;
        };
        let closing = !name_caps[1].is_empty();
        let name = name_caps[2].to_ascii_lowercase();

        let (depth, open, close) = match name.as_str() {
            "b" | "strong" => (&mut bold_depth, "<b>", "</b>"),
            "i" | "em" => (&mut italic_depth, "<i>", "</i>"),
            _ => continue,
        };

        if !closing {
            if *depth == 0 {
                out.push_str(open);
            }
            *depth += 1;
        } else if *depth > 0 {
            *depth -= 1;
            if *depth == 0 {
                out.push_str(close);
            }
        }
    }

    out.push_str(&markup[cursor..]);
    out
}

fn strip_style_markers(text: &str) -> String {
    STYLE_MARKER_REGEX.replace_all(text, "").into_owned()
}

fn push_run(runs: &mut Vec<InlineRun>, style: RunStyle, raw: &str) {
    if raw.is_empty() {
        return;
    }
    let text = html_escape::decode_html_entities(raw);
    if text.is_empty() {
        return;
    }
    runs.push(InlineRun::new(style, text.into_owned()));
}
