use serde_json::{Value, json};
use skillgov_core::{OrdinalLabel, SkillProposal};
use std::collections::BTreeMap;

/// A non-conforming model output. Carries the hint appended to the retry
/// prompt; it is recoverable data, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    pub message: String,
}

impl ParseFailure {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// JSON schema of the structured object the model must emit:
/// `{ reasoning_labels: {dim -> label}, skill_id: string, confidence: [0,1] }`.
pub fn output_schema(dimensions: &[String]) -> Value {
    let scale = json!(["VL", "L", "M", "H", "VH"]);
    let mut label_props = serde_json::Map::new();
    for dim in dimensions {
        label_props.insert(dim.clone(), json!({ "type": "string", "enum": scale }));
    }
    json!({
        "type": "object",
        "properties": {
            "reasoning_labels": {
                "type": "object",
                "properties": Value::Object(label_props),
                "required": dimensions,
            },
            "skill_id": { "type": "string" },
            "confidence": { "type": "number", "minimum": 0.0, "maximum": 1.0 },
        },
        "required": ["reasoning_labels", "skill_id", "confidence"],
    })
}

/// The parser predicate the broker runs on every model output.
///
/// Accepts the first JSON object embedded in the text (models often wrap it
/// in prose or code fences). Labels outside the closed vocabulary are
/// dropped here; the coherence validator substitutes the scale midpoint for
/// missing dimensions.
pub fn parse_proposal(
    text: &str,
    dimensions: &[String],
) -> Result<SkillProposal, ParseFailure> {
    let body = extract_json_object(text).ok_or_else(|| {
        ParseFailure::new("output must contain a single JSON object")
    })?;
    let value: Value = serde_json::from_str(body)
        .map_err(|e| ParseFailure::new(format!("output is not valid JSON: {e}")))?;

    let skill_id = value
        .get("skill_id")
        .and_then(Value::as_str)
        .ok_or_else(|| ParseFailure::new("missing required string field `skill_id`"))?
        .trim()
        .to_string();
    if skill_id.is_empty() {
        return Err(ParseFailure::new("`skill_id` must not be empty"));
    }

    let confidence = value
        .get("confidence")
        .and_then(Value::as_f64)
        .ok_or_else(|| ParseFailure::new("missing required numeric field `confidence`"))?;
    if !(0.0..=1.0).contains(&confidence) {
        return Err(ParseFailure::new("`confidence` must lie in [0, 1]"));
    }

    let mut reasoning = BTreeMap::new();
    if let Some(labels) = value.get("reasoning_labels").and_then(Value::as_object) {
        for dim in dimensions {
            if let Some(label) = labels.get(dim).and_then(Value::as_str) {
                if let Some(parsed) = OrdinalLabel::parse(label) {
                    reasoning.insert(dim.clone(), parsed);
                }
            }
        }
    }

    Ok(SkillProposal {
        skill_id,
        reasoning,
        confidence,
        raw_payload: text.to_string(),
    })
}

/// Slice from the first `{` to its matching closing brace.
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in text[start..].char_indices() {
        if in_string {
            match c {
                '\\' if !escaped => escaped = true,
                '"' if !escaped => in_string = false,
                _ => escaped = false,
            }
            if c != '\\' {
                escaped = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + i + 1]);
                }
            }
            _ => {}
        }
    }
    None
}
