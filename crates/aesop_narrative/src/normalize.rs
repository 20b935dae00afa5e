//! Normalization of model output into structured JSON.
//!
//! Model responses are supposed to contain a JSON array of turn objects but
//! often arrive wrapped in code fences, commentary, or structural noise. The
//! normalizer applies extraction strategies in a fixed order and returns the
//! first value that parses; it never substitutes empty data, and on
//! exhaustion the error retains the original text for diagnostics.

use aesop_error::{AesopResult, NormalizeError, NormalizeErrorKind};
use serde_json::Value;

/// Extract a JSON value from raw model output.
///
/// Strategies, applied in order until one parses:
/// 1. Strip a leading/trailing code fence (with optional language tag).
/// 2. Parse the remaining text directly.
/// 3. Locate a balanced `[` ... `]` span containing objects and parse it.
/// 4. Collect balanced `{` ... `}` spans, join them with commas, wrap in
///    brackets, and parse.
///
/// Each strategy validates its own parse; a span that matches bracket syntax
/// but is not valid JSON falls through to the next strategy.
///
/// # Errors
///
/// Returns `NormalizeErrorKind::EmptyOutput` for blank input and
/// `NormalizeErrorKind::Exhausted` when no strategy produces valid JSON.
///
/// # Examples
///
/// ```
/// use aesop_narrative::normalize;
///
/// let response = "Here is the revised story:\n\
///     ```json\n\
///     [{\"turn\": 1, \"result\": \"A cafe opens\"}]\n\
///     ```\n";
///
/// let value = normalize(response).unwrap();
/// assert!(value.is_array());
/// ```
#[tracing::instrument(skip(raw), fields(raw_len = raw.len()))]
pub fn normalize(raw: &str) -> AesopResult<Value> {
    if raw.trim().is_empty() {
        return Err(NormalizeError::new(NormalizeErrorKind::EmptyOutput).into());
    }

    let cleaned = strip_fences(raw);

    // Strategy 2: direct strict parse
    if let Ok(value) = serde_json::from_str::<Value>(&cleaned) {
        tracing::debug!("Model output parsed directly");
        return Ok(value);
    }

    // Strategy 3: bracketed array spanning objects
    if let Some(value) = extract_object_array(&cleaned) {
        tracing::debug!("Extracted bracketed array from model output");
        return Ok(value);
    }

    // Strategy 4: join individual balanced objects into an array
    if let Some(value) = join_objects(&cleaned) {
        tracing::debug!("Joined individual objects into an array");
        return Ok(value);
    }

    tracing::error!(
        raw_len = raw.len(),
        "No parseable JSON found in model output"
    );

    Err(NormalizeError::new(NormalizeErrorKind::Exhausted {
        original: raw.to_string(),
    })
    .into())
}

/// Strip a single leading/trailing code fence if the text starts with one.
///
/// The opening fence may carry a language tag (```json); the closing fence
/// must sit on the final line. Anything else is returned trimmed.
fn strip_fences(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with("```") {
        let lines: Vec<&str> = trimmed.lines().collect();
        if lines.len() >= 3
            && lines[0].starts_with("```")
            && lines[lines.len() - 1].contains("```")
        {
            return lines[1..lines.len() - 1].join("\n").trim().to_string();
        }
    }
    trimmed.to_string()
}

/// Find the byte range of the first balanced `open` ... `close` span,
/// starting the scan at the first `open`. String literals and escapes are
/// respected so delimiters inside values do not terminate the span.
fn balanced_range(text: &str, open: char, close: char) -> Option<(usize, usize)> {
    let start = text.find(open)?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in text[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match ch {
            '\\' => escape_next = true,
            '"' => in_string = !in_string,
            c if c == open && !in_string => depth += 1,
            c if c == close && !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some((start, start + i + ch.len_utf8()));
                }
            }
            _ => {}
        }
    }

    None
}

/// Try every balanced bracket span for an array whose elements are objects.
fn extract_object_array(text: &str) -> Option<Value> {
    let mut cursor = 0;
    while let Some((start, end)) = balanced_range(&text[cursor..], '[', ']') {
        let candidate = &text[cursor + start..cursor + end];
        if let Ok(value) = serde_json::from_str::<Value>(candidate) {
            let is_object_array = value
                .as_array()
                .is_some_and(|a| !a.is_empty() && a.iter().all(Value::is_object));
            if is_object_array {
                return Some(value);
            }
        }
        cursor += start + 1;
    }
    None
}

/// Collect every top-level balanced object span, join with commas, and parse
/// the result as an array.
fn join_objects(text: &str) -> Option<Value> {
    let mut objects: Vec<&str> = Vec::new();
    let mut cursor = 0;

    while let Some((start, end)) = balanced_range(&text[cursor..], '{', '}') {
        objects.push(&text[cursor + start..cursor + end]);
        cursor += end;
    }

    if objects.is_empty() {
        return None;
    }

    let joined = format!("[{}]", objects.join(","));
    serde_json::from_str(&joined).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use aesop_error::AesopErrorKind;

    #[test]
    fn test_direct_parse_round_trips() {
        let array = serde_json::json!([
            {"turn": 1, "result": "A bakery opens", "news": "Prices rise", "stocks": []}
        ]);
        let serialized = serde_json::to_string(&array).unwrap();
        assert_eq!(normalize(&serialized).unwrap(), array);
    }

    #[test]
    fn test_fenced_array_matches_unfenced() {
        let body = r#"[{"turn": 1, "result": "A cafe opens"}]"#;
        let fenced = format!("```json\n{body}\n```");
        assert_eq!(normalize(&fenced).unwrap(), normalize(body).unwrap());
    }

    #[test]
    fn test_fence_without_language_tag() {
        let fenced = "```\n[{\"turn\": 1}]\n```";
        let value = normalize(fenced).unwrap();
        assert_eq!(value[0]["turn"], 1);
    }

    #[test]
    fn test_array_embedded_in_prose() {
        let response = r#"
Sure! Here is the revised story:

[{"turn": 1, "result": "A cafe opens"}, {"turn": 2, "result": "Rain falls"}]

Let me know if you want more changes.
"#;
        let value = normalize(response).unwrap();
        let array = value.as_array().unwrap();
        assert_eq!(array.len(), 2);
        assert_eq!(array[1]["turn"], 2);
    }

    #[test]
    fn test_scalar_array_in_prose_is_skipped() {
        // the [3] span parses but is not an object array; the real one follows
        let response = r#"Scores were [3] overall. Data: [{"turn": 1, "result": "ok"}]"#;
        let value = normalize(response).unwrap();
        assert_eq!(value[0]["turn"], 1);
    }

    #[test]
    fn test_objects_joined_into_array() {
        let response = r#"
Turn one: {"turn": 1, "result": "A bakery opens"}
Turn two: {"turn": 2, "result": "A dragon visits"}
"#;
        let value = normalize(response).unwrap();
        let array = value.as_array().unwrap();
        assert_eq!(array.len(), 2);
        assert_eq!(array[0]["turn"], 1);
        assert_eq!(array[1]["result"], "A dragon visits");
    }

    #[test]
    fn test_brackets_inside_strings_do_not_split() {
        let response = r#"prefix [{"turn": 1, "result": "use [brackets] and {braces} freely"}] suffix"#;
        let value = normalize(response).unwrap();
        assert_eq!(
            value[0]["result"],
            "use [brackets] and {braces} freely"
        );
    }

    #[test]
    fn test_escaped_quotes_inside_strings() {
        let response = r#"{"turn": 1, "result": "She said \"hello\" twice"}"#;
        let value = normalize(response).unwrap();
        assert_eq!(value["result"], "She said \"hello\" twice");
    }

    #[test]
    fn test_object_passes_through_for_shape_repair() {
        // not an array; the pipeline decides whether to unwrap it
        let response = r#"{"story": [{"turn": 1, "result": "ok"}]}"#;
        let value = normalize(response).unwrap();
        assert!(value.is_object());
    }

    #[test]
    fn test_exhausted_keeps_original_text() {
        let result = normalize("this is just plain text with no json");
        let error = result.unwrap_err();
        match error.kind() {
            AesopErrorKind::Normalize(inner) => match &inner.kind {
                NormalizeErrorKind::Exhausted { original } => {
                    assert!(original.contains("plain text"));
                }
                other => panic!("unexpected kind: {other:?}"),
            },
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn test_empty_input_is_its_own_error() {
        let error = normalize("   \n  ").unwrap_err();
        assert!(matches!(
            error.kind(),
            AesopErrorKind::Normalize(inner)
                if matches!(inner.kind, NormalizeErrorKind::EmptyOutput)
        ));
    }

    #[test]
    fn test_truncated_json_falls_through_to_object_join() {
        // outer array never closes; the complete inner object is recovered
        let response = r#"[{"turn": 1, "result": "A cafe opens"}, {"turn": 2, "result":"#;
        let value = normalize(response).unwrap();
        let array = value.as_array().unwrap();
        assert_eq!(array.len(), 1);
        assert_eq!(array[0]["turn"], 1);
    }
}
