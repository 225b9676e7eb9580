//! Best-effort recovery of a JSON object from free-form model output.
//!
//! Model output is expected to contain one JSON object but often arrives wrapped in
//! commentary or code fences, or with small syntax defects. [`repair_or_fail`] runs a
//! fixed list of [`Repair`] steps and parses the result. If that fails it applies a
//! second list of more aggressive repairs once and parses again.
//!
//! Every step is a pure `&str -> String` function and can be tested on its own.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::error::{ReasoningError, Result};

/// One text transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repair {
    /// Remove Markdown code fences (` ```json ` and ` ``` `).
    StripCodeFences,
    /// Replace typographic quotes with ASCII quotes.
    NormalizeSmartQuotes,
    /// Remove ASCII control characters other than tab, newline and carriage return.
    StripControlChars,
    /// Remove `//` line comments and `/* */` block comments outside string literals.
    StripComments,
    /// Keep only the longest balanced `{...}` block.
    ExtractLargestObject,
    /// Remove commas directly before `}` or `]` outside string literals.
    RemoveTrailingCommas,
    /// Turn `'single quoted'` strings into `"double quoted"` ones.
    SingleToDoubleQuotes,
    /// Turn Python `True`, `False` and `None` into JSON literals.
    PythonLiterals,
}

/// Steps applied before the first parse, in order.
pub const CLEANUP: [Repair; 6] = [
    Repair::StripCodeFences,
    Repair::NormalizeSmartQuotes,
    Repair::StripControlChars,
    Repair::StripComments,
    Repair::ExtractLargestObject,
    Repair::RemoveTrailingCommas,
];

/// Steps applied once more if the first parse fails, in order.
pub const REPAIRS: [Repair; 3] = [
    Repair::SingleToDoubleQuotes,
    Repair::PythonLiterals,
    Repair::RemoveTrailingCommas,
];

impl Repair {
    /// Apply this step.
    #[must_use]
    pub fn apply(self, text: &str) -> String {
        match self {
            Self::StripCodeFences => text.replace("```json", "").replace("```", ""),
            Self::NormalizeSmartQuotes => text
                .replace(['\u{201c}', '\u{201d}'], "\"")
                .replace(['\u{2018}', '\u{2019}'], "'"),
            Self::StripControlChars => text
                .chars()
                .filter(|c| !c.is_ascii_control() || matches!(c, '\t' | '\n' | '\r'))
                .collect(),
            Self::StripComments => strip_comments(text),
            Self::ExtractLargestObject => largest_object(text).to_string(),
            Self::RemoveTrailingCommas => strip_trailing_commas(text),
            Self::SingleToDoubleQuotes => single_quoted().replace_all(text, "\"$1\"").into_owned(),
            Self::PythonLiterals => {
                let text = python_true().replace_all(text, "true");
                let text = python_false().replace_all(&text, "false");
                python_none().replace_all(&text, "null").into_owned()
            }
        }
    }
}

/// Apply every step in `steps`, in order.
#[must_use]
pub fn apply_all(text: &str, steps: &[Repair]) -> String {
    steps
        .iter()
        .fold(text.to_string(), |acc, step| step.apply(&acc))
}

/// Extract a JSON object from `text`, repairing it if needed.
///
/// # Errors
///
/// - `ReasoningError::EmptyResponse` if `text` is blank.
/// - `ReasoningError::Unparseable` if no JSON object survives both passes.
pub fn repair_or_fail(text: &str) -> Result<Value> {
    if text.trim().is_empty() {
        return Err(ReasoningError::EmptyResponse);
    }

    let cleaned = apply_all(text, &CLEANUP);
    let first_error = match parse_object(&cleaned) {
        Ok(value) => return Ok(value),
        Err(err) => err,
    };

    let repaired = apply_all(&cleaned, &REPAIRS);
    match parse_object(&repaired) {
        Ok(value) => {
            tracing::warn!("Parsed model output only after heuristic repairs");
            Ok(value)
        }
        Err(_) => Err(ReasoningError::Unparseable(first_error)),
    }
}

fn parse_object(text: &str) -> std::result::Result<Value, String> {
    match serde_json::from_str::<Value>(text) {
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(other) => Err(format!("expected a JSON object, got {}", kind(&other))),
        Err(err) => Err(err.to_string()),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn single_quoted() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"'([^'"\\]*)'"#).expect("valid regex"))
}

fn python_true() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bTrue\b").expect("valid regex"))
}

fn python_false() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bFalse\b").expect("valid regex"))
}

fn python_none() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bNone\b").expect("valid regex"))
}

/// Remove comments that start outside a double-quoted string.
fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_string = false;
    let mut escaped = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match (c, chars.peek()) {
            ('"', _) => {
                in_string = true;
                out.push(c);
            }
            ('/', Some('/')) => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
            }
            _ => out.push(c),
        }
    }

    out
}

/// Remove a comma that starts outside a double-quoted string when the next
/// non-whitespace character closes an object or array.
fn strip_trailing_commas(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;
    // Byte offset in `out` of the last comma not yet followed by a value.
    let mut open_comma: Option<usize> = None;

    for c in text.chars() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '}' | ']' => {
                if let Some(at) = open_comma.take() {
                    out.remove(at);
                }
            }
            ',' => open_comma = Some(out.len()),
            c if c.is_whitespace() => {}
            '"' => {
                in_string = true;
                open_comma = None;
            }
            _ => open_comma = None,
        }
        out.push(c);
    }

    out
}

/// Longest balanced `{...}` block. Braces inside string literals are ignored.
///
/// Falls back to the span from the first `{` to the last `}`, then to the whole text.
fn largest_object(text: &str) -> &str {
    let mut best: Option<(usize, usize)> = None;
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' if depth > 0 => in_string = true,
            '{' => {
                if depth == 0 {
                    start = i;
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    let end = i + c.len_utf8();
                    if best.map_or(true, |(s, e)| end - start > e - s) {
                        best = Some((start, end));
                    }
                }
            }
            _ => {}
        }
    }

    if let Some((s, e)) = best {
        return &text[s..e];
    }
    match (text.find('{'), text.rfind('}')) {
        (Some(s), Some(e)) if e > s => &text[s..=e],
        _ => text.trim(),
    }
}
