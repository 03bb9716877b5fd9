//! Recovery of a JSON object from free-form model output.
//!
//! Strategies run in a fixed order, least invasive first, and the first one
//! that yields a JSON object wins:
//!
//! 1. [`Stage::Direct`]: the whole text, verbatim.
//! 2. [`Stage::Extracted`]: the span from the first `{` to the last `}`.
//! 3. [`Stage::Sanitized`]: that span (or the whole text when there is no
//!    span) after the [`SANITIZERS`] cascade.
//! 4. [`Stage::QuotesNormalized`]: the whole text with typographic quotes
//!    replaced by ASCII ones.
//!
//! Exhausting every stage yields [`VibeError::FormatRecovery`]. Nothing is
//! ever invented: a result is either a parsed object or an error.
//!
//! Only objects count. Valid JSON whose top level is an array, string,
//! number, boolean or `null` fails every stage and is reported as
//! [`VibeError::FormatRecovery`] too.

use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::errors::{VibeError, VibeResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Direct,
    Extracted,
    Sanitized,
    QuotesNormalized,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Direct => "direct",
            Stage::Extracted => "extracted",
            Stage::Sanitized => "sanitized",
            Stage::QuotesNormalized => "quotes_normalized",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recovered {
    pub value: Map<String, Value>,
    pub stage: Stage,
}

/// Runs the cascade over `text`.
pub fn recover(text: &str) -> VibeResult<Recovered> {
    let attempt = |stage: Stage, candidate: &str| -> Option<Recovered> {
        match parse_object(candidate) {
            Some(value) => {
                debug!(stage = stage.as_str(), "recovered JSON object");
                Some(Recovered { value, stage })
            }
            None => {
                debug!(stage = stage.as_str(), "recovery stage failed");
                None
            }
        }
    };

    if let Some(r) = attempt(Stage::Direct, text) {
        return Ok(r);
    }

    let extracted = extract_object_span(text);
    if let Some(span) = extracted {
        if let Some(r) = attempt(Stage::Extracted, span) {
            return Ok(r);
        }
    }

    let sanitized = sanitize(extracted.unwrap_or(text));
    if let Some(r) = attempt(Stage::Sanitized, &sanitized) {
        return Ok(r);
    }

    let normalized = normalize_quotes(text);
    if let Some(r) = attempt(Stage::QuotesNormalized, &normalized) {
        return Ok(r);
    }

    warn!(bytes = text.len(), "all recovery strategies failed");
    Err(VibeError::format_recovery())
}

/// Recovers and then shapes the object into `T`. A JSON type conflict with
/// `T` is a [`VibeError::ShapeMismatch`]; absent keys are left to `T`'s
/// serde defaults.
pub fn recover_as<T: DeserializeOwned>(text: &str) -> VibeResult<T> {
    let recovered = recover(text)?;
    shape(Value::Object(recovered.value))
}

pub fn shape<T: DeserializeOwned>(value: Value) -> VibeResult<T> {
    serde_json::from_value(value).map_err(|e| VibeError::ShapeMismatch(e.to_string()))
}

fn parse_object(candidate: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Greedy span from the first `{` to the last `}`.
pub fn extract_object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// One character-level repair. Each is a pure function and order matters.
pub type Sanitizer = fn(&str) -> Cow<'_, str>;

pub const SANITIZERS: &[(&str, Sanitizer)] = &[
    ("strip_control_chars", strip_control_chars),
    ("escaped_whitespace_to_space", escaped_whitespace_to_space),
    ("escape_raw_whitespace", escape_raw_whitespace),
    ("escape_backslashes", escape_backslashes),
    ("collapse_escaped_quotes", collapse_escaped_quotes),
    ("drop_non_printable", drop_non_printable),
    ("collapse_escaped_whitespace", collapse_escaped_whitespace),
];

pub fn sanitize(text: &str) -> String {
    SANITIZERS
        .iter()
        .fold(text.to_string(), |acc, (_, f)| f(&acc).into_owned())
}

fn replace<'a>(re: &Regex, text: &'a str, with: &str) -> Cow<'a, str> {
    re.replace_all(text, regex::NoExpand(with))
}

static CONTROL: LazyLock<Regex> = LazyLock::new(|| re(r"[\x{00}-\x{1F}\x{7F}-\x{9F}]"));
static ESCAPED_WS: LazyLock<Regex> = LazyLock::new(|| re(r"\\[rnt]"));
static DOUBLE_ESCAPED_QUOTE: LazyLock<Regex> = LazyLock::new(|| re(r#"\\\\""#));
static NON_PRINTABLE: LazyLock<Regex> = LazyLock::new(|| re(r"[^\x20-\x7E]"));
static DOUBLE_ESCAPED_WS: LazyLock<Regex> = LazyLock::new(|| re(r"\\\\([nrt])"));

#[allow(clippy::expect_used)]
fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static pattern")
}

/// C0 and C1 control code points, including raw newlines and tabs.
pub fn strip_control_chars(text: &str) -> Cow<'_, str> {
    replace(&CONTROL, text, "")
}

/// Two-character `\n`, `\r`, `\t` sequences become a space.
pub fn escaped_whitespace_to_space(text: &str) -> Cow<'_, str> {
    replace(&ESCAPED_WS, text, " ")
}

/// Raw newline, carriage return and tab become their JSON escapes.
pub fn escape_raw_whitespace(text: &str) -> Cow<'_, str> {
    if !text.contains(['\n', '\r', '\t']) {
        return Cow::Borrowed(text);
    }
    Cow::Owned(text.replace('\n', "\\n").replace('\r', "\\r").replace('\t', "\\t"))
}

pub fn escape_backslashes(text: &str) -> Cow<'_, str> {
    if !text.contains('\\') {
        return Cow::Borrowed(text);
    }
    Cow::Owned(text.replace('\\', "\\\\"))
}

/// `\\"` back to `\"`.
pub fn collapse_escaped_quotes(text: &str) -> Cow<'_, str> {
    replace(&DOUBLE_ESCAPED_QUOTE, text, "\\\"")
}

/// Anything outside printable ASCII.
pub fn drop_non_printable(text: &str) -> Cow<'_, str> {
    replace(&NON_PRINTABLE, text, "")
}

/// `\\n`, `\\r`, `\\t` back to `\n`, `\r`, `\t`.
pub fn collapse_escaped_whitespace(text: &str) -> Cow<'_, str> {
    DOUBLE_ESCAPED_WS.replace_all(text, r"\$1")
}

/// Typographic single and double quotes to ASCII.
pub fn normalize_quotes(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{201C}' | '\u{201D}' => '"',
            other => other,
        })
        .collect()
}
