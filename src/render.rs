use crate::{analyzer::AnalysisResult, config::RenderFormat, error::AnalysisFailure};
use serde_json::Value;

/// The only thing a user ever sees when a submission fails.
pub const FAILURE_MESSAGE: &str = "Error: Failed to analyze the image.";

/// Shown in place of a field the service left out or sent as null.
pub const MISSING_VALUE: &str = "(missing)";

/// Formats a settled submission into display content. Pure: the caller decides
/// where the content goes.
pub fn render(outcome: Result<&AnalysisResult, &AnalysisFailure>, format: RenderFormat) -> String {
    match (outcome, format) {
        (Ok(result), RenderFormat::Text) => result
            .labeled_fields()
            .iter()
            .map(|(label, value)| format!("{label}: {}", field_text(*value)))
            .collect::<Vec<_>>()
            .join("\n"),
        (Ok(result), RenderFormat::Html) => result
            .labeled_fields()
            .iter()
            .map(|(label, value)| {
                format!("<p>{}: {}</p>", escape_html(label), escape_html(&field_text(*value)))
            })
            .collect::<Vec<_>>()
            .join("\n"),
        (Ok(result), RenderFormat::Json) => {
            serde_json::to_string_pretty(result).unwrap_or_else(|_| "{}".to_string())
        }
        (Err(_), RenderFormat::Text) => FAILURE_MESSAGE.to_string(),
        (Err(_), RenderFormat::Html) => format!("<p>{FAILURE_MESSAGE}</p>"),
        (Err(_), RenderFormat::Json) => {
            serde_json::json!({ "error": FAILURE_MESSAGE }).to_string()
        }
    }
}

pub fn field_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => MISSING_VALUE.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

