//! Recovery of JSON values from free-form model output

use serde_json::Value;
use thiserror::Error;

use super::repair::REPAIR_LADDER;

/// Why model output could not be turned into JSON
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RepairError {
    #[error("no JSON object found in model output")]
    NoCandidateFound,

    #[error("JSON still invalid after {stages_tried} repair stages: {last_error}")]
    Unrecoverable {
        stages_tried: usize,
        last_error: String,
        /// Text as left by the last stage
        candidate: String,
    },
}

/// A parsed value and the repair stage that made it parse
#[derive(Debug, Clone, PartialEq)]
pub struct Recovered {
    pub value: Value,
    /// `None` when the candidate parsed as-is
    pub stage: Option<&'static str>,
}

/// Return the first top-level `{...}` span of `raw`
///
/// The scan tracks string literals and brace depth, so trailing prose after
/// the object is never swallowed. When the object is cut off, everything from
/// its opening brace to the end of the text is returned for repair.
pub fn extract_json(raw: &str) -> Result<&str, RepairError> {
    extract_balanced(raw, '{', '}').ok_or(RepairError::NoCandidateFound)
}

/// Same scan as [`extract_json`] for the first top-level `[...]` span
pub fn extract_json_array(raw: &str) -> Option<&str> {
    extract_balanced(raw, '[', ']')
}

fn extract_balanced(raw: &str, open: char, close: char) -> Option<&str> {
    let start = raw.find(open)?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in raw[start..].char_indices() {
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

        if c == '"' {
            in_string = true;
        } else if c == open {
            depth += 1;
        } else if c == close {
            depth -= 1;
            if depth == 0 {
                let end = start + offset + c.len_utf8();
                return Some(&raw[start..end]);
            }
        }
    }

    Some(raw[start..].trim_end())
}

/// Parse `candidate`, climbing the repair ladder until it parses
pub fn repair_and_parse(candidate: &str) -> Result<Recovered, RepairError> {
    let mut last_error = match serde_json::from_str::<Value>(candidate) {
        Ok(value) => return Ok(Recovered { value, stage: None }),
        Err(e) => e.to_string(),
    };

    let mut current = candidate.to_string();
    for stage in REPAIR_LADDER {
        current = (stage.apply)(&current);
        match serde_json::from_str::<Value>(&current) {
            Ok(value) => {
                tracing::debug!(stage = stage.name, "Model output repaired");
                return Ok(Recovered {
                    value,
                    stage: Some(stage.name),
                });
            }
            Err(e) => {
                tracing::debug!(stage = stage.name, error = %e, "Repair stage did not help");
                last_error = e.to_string();
            }
        }
    }

    Err(RepairError::Unrecoverable {
        stages_tried: REPAIR_LADDER.len(),
        last_error,
        candidate: current,
    })
}

/// Extract and parse the recipe object in one go
pub fn recover_json(raw: &str) -> Result<Recovered, RepairError> {
    let candidate = extract_json(raw)?;
    repair_and_parse(candidate)
}

/// Pull a list of strings out of a `[...]` answer; non-strings are skipped
pub fn recover_string_list(raw: &str) -> Option<Vec<String>> {
    let candidate = extract_json_array(raw)?;
    let recovered = repair_and_parse(candidate).ok()?;
    let items = recovered.value.as_array()?;
    Some(
        items
            .iter()
            .filter_map(Value::as_str)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_ignores_surrounding_prose() {
        let raw = "Sure! {\"name\": \"Egg Rice\", \"tags\": [\"a\"]} Hope you enjoy {it}.";
        assert_eq!(
            extract_json(raw).unwrap(),
            "{\"name\": \"Egg Rice\", \"tags\": [\"a\"]}"
        );
    }

    #[test]
    fn test_extract_json_respects_braces_in_strings() {
        let raw = r#"```json
{"name": "Curly } Fries", "n": {"x": 1}}
```"#;
        assert_eq!(
            extract_json(raw).unwrap(),
            r#"{"name": "Curly } Fries", "n": {"x": 1}}"#
        );
    }

    #[test]
    fn test_extract_json_returns_truncated_tail() {
        let raw = "Here you go: {name: \"Egg Rice\", tags: [simple]\n";
        assert_eq!(extract_json(raw).unwrap(), "{name: \"Egg Rice\", tags: [simple]");
    }

    #[test]
    fn test_extract_json_without_object() {
        assert_eq!(
            extract_json("I cannot help with that."),
            Err(RepairError::NoCandidateFound)
        );
    }

    #[test]
    fn test_valid_json_needs_no_stage() {
        let recovered = recover_json(r#"{"name": "Toast"}"#).unwrap();
        assert_eq!(recovered.stage, None);
        assert_eq!(recovered.value["name"], "Toast");
    }

    #[test]
    fn test_multiline_json_fixed_by_whitespace_stage() {
        let recovered = recover_json("{\"step\": \"line one\nline two\"}").unwrap();
        assert_eq!(recovered.stage, Some("whitespace"));
        assert_eq!(recovered.value["step"], "line one line two");
    }

    #[test]
    fn test_sample_model_reply_is_recovered() {
        let raw = r#"Here you go: {name: "Egg Rice", ingredients: [{name: egg, quantity: "2", isAvailable: true}], instructions: ["cook"], cookingTime: 10, difficulty: easy, servings: 1, tags: [simple]"#;
        let recovered = recover_json(raw).unwrap();
        assert_eq!(recovered.stage, Some("aggressive"));
        assert_eq!(recovered.value["name"], "Egg Rice");
        assert!(recovered.value.is_object());
        assert_eq!(recovered.value["servings"], 1);
    }

    #[test]
    fn test_unrecoverable_output() {
        let err = recover_json("{ ::: 12 34 ??? }").unwrap_err();
        match err {
            RepairError::Unrecoverable { stages_tried, .. } => {
                assert_eq!(stages_tried, REPAIR_LADDER.len())
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_recover_string_list() {
        let raw = "Seasonal picks: [\"cabbage\", \"radish\", 3, \" \"] enjoy";
        assert_eq!(
            recover_string_list(raw),
            Some(vec!["cabbage".to_string(), "radish".to_string()])
        );
        assert_eq!(recover_string_list("nothing here"), None);
    }
}
