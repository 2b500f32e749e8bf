//! JSON decoding for upstream responses with path-aware error messages.

use anyhow::Result;

/// Decode `body` as `T`. On failure the error names the JSON path, the type
/// mismatch and a short excerpt around the failing column.
pub fn parse_json_with_context<T: serde::de::DeserializeOwned>(body: &str) -> Result<T> {
    let de = &mut serde_json::Deserializer::from_str(body);
    serde_path_to_error::deserialize(de).map_err(|err| {
        let inner = err.inner();
        let (line, column) = (inner.line(), inner.column());
        let path = err.path().to_string();

        let message = inner.to_string();
        let location = format!(" at line {line} column {column}");
        let message = message.strip_suffix(&location).unwrap_or(&message);

        let mut out = String::new();
        if !path.is_empty() && path != "." {
            out.push_str(&format!("at path '{path}': "));
        }
        out.push_str(&format!(
            "{} (line {line} col {column})\n{}",
            describe_mismatch(message),
            excerpt(body, line, column, 24)
        ));
        anyhow::anyhow!(out)
    })
}

/// Rewrites serde's "invalid type: X, expected Y" as "expected Y, got X".
fn describe_mismatch(message: &str) -> String {
    let Some(rest) = message.strip_prefix("invalid type: ") else {
        return message.to_string();
    };
    match rest.split_once(", expected ") {
        Some((actual, expected)) => format!("expected {}, got {actual}", expected.trim()),
        None => message.to_string(),
    }
}

fn excerpt(body: &str, line: usize, column: usize, width: usize) -> String {
    let target = body.lines().nth(line.saturating_sub(1)).unwrap_or("");
    if target.is_empty() {
        return "(empty line)".to_string();
    }

    let at = column.saturating_sub(1).min(target.len());
    let start = floor_char_boundary(target, at.saturating_sub(width / 2));
    let end = floor_char_boundary(target, (at + width / 2).min(target.len()));
    let caret = " ".repeat(at - start) + "^";

    format!("...{}...\n   {caret}", &target[start..end])
}

fn floor_char_boundary(s: &str, mut idx: usize) -> usize {
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}
