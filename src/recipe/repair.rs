//! Text repairs for almost-JSON model output
//!
//! Every stage is a pure `&str -> String` rewrite. The stages are chained in
//! [`REPAIR_LADDER`] order, each one running on the previous stage's output,
//! so a stage only has to add its own fix. Rewrites that target syntax only
//! touch text outside string literals.

use regex::{Captures, Regex};
use std::sync::OnceLock;

/// A named repair step
#[derive(Debug, Clone, Copy)]
pub struct RepairStage {
    pub name: &'static str,
    pub apply: fn(&str) -> String,
}

/// Stages in order of increasing aggressiveness
pub const REPAIR_LADDER: &[RepairStage] = &[
    RepairStage {
        name: "whitespace",
        apply: collapse_whitespace,
    },
    RepairStage {
        name: "minimal",
        apply: minimal_fix,
    },
    RepairStage {
        name: "common-issues",
        apply: escape_embedded_quotes,
    },
    RepairStage {
        name: "structural",
        apply: structural_repair,
    },
    RepairStage {
        name: "aggressive",
        apply: aggressive_repair,
    },
];

/// Stage 1: newlines, tabs and runs of spaces become a single space
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Stage 2: quote ASCII bare keys, drop trailing commas, close a cut-off string
pub fn minimal_fix(text: &str) -> String {
    let keyed = rewrite_code(text, quote_ascii_keys);
    let trimmed = rewrite_code(&keyed, strip_trailing_commas);
    close_open_string(&trimmed)
}

/// Stage 3: escape quotes that sit inside a string value instead of ending it
///
/// A quote inside a string counts as the closing quote only when the next
/// non-blank character could legally follow a string (`,` `:` `}` `]` or the
/// end of input). Valid JSON is left untouched.
pub fn escape_embedded_quotes(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 8);
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if !in_string {
            if c == '"' {
                in_string = true;
            }
            out.push(c);
            continue;
        }

        if escaped {
            escaped = false;
            out.push(c);
            continue;
        }

        match c {
            '\\' => {
                escaped = true;
                out.push(c);
            }
            '"' => {
                let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
                if matches!(next, None | Some(',' | ':' | '}' | ']')) {
                    in_string = false;
                    out.push('"');
                } else {
                    out.push_str("\\\"");
                }
            }
            _ => out.push(c),
        }
    }

    out
}

/// Stage 4: close unbalanced brackets, fill empty values, drop dangling commas
///
/// Text after the first complete top-level value is dropped.
pub fn structural_repair(text: &str) -> String {
    let closed = close_brackets(&close_open_string(text));
    let filled = rewrite_code(&closed, fill_empty_values);
    rewrite_code(&filled, strip_trailing_commas)
}

/// Stage 5: quote every remaining bare key and word-like value
pub fn aggressive_repair(text: &str) -> String {
    let deduped = collapse_doubled_quotes(text);
    let keyed = rewrite_code(&deduped, quote_any_keys);
    let valued = rewrite_code(&keyed, quote_bare_values);
    let trimmed = rewrite_code(&valued, strip_trailing_commas);
    close_open_string(&trimmed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'a> {
    Code(&'a str),
    /// Includes its quotes; the closing one is missing when input was cut off
    Str(&'a str),
}

fn segments(text: &str) -> Vec<Segment<'_>> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if !in_string {
            if c == '"' {
                if start < i {
                    parts.push(Segment::Code(&text[start..i]));
                }
                start = i;
                in_string = true;
            }
        } else if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '"' {
            parts.push(Segment::Str(&text[start..=i]));
            start = i + 1;
            in_string = false;
        }
    }

    if start < text.len() {
        let rest = &text[start..];
        parts.push(if in_string {
            Segment::Str(rest)
        } else {
            Segment::Code(rest)
        });
    }

    parts
}

/// Apply `f` to every stretch of text outside string literals
fn rewrite_code(text: &str, f: impl Fn(&str) -> String) -> String {
    let mut out = String::with_capacity(text.len());
    for segment in segments(text) {
        match segment {
            Segment::Code(code) => out.push_str(&f(code)),
            Segment::Str(literal) => out.push_str(literal),
        }
    }
    out
}

fn close_open_string(text: &str) -> String {
    let unterminated = matches!(
        segments(text).last(),
        Some(Segment::Str(literal)) if !is_closed(literal)
    );
    if !unterminated {
        return text.to_string();
    }

    let mut out = text.to_string();
    // A dangling escape would swallow the new quote
    let backslashes = out.len() - out.trim_end_matches('\\').len();
    if backslashes % 2 == 1 {
        out.pop();
    }
    out.push('"');
    out
}

fn is_closed(literal: &str) -> bool {
    if literal.len() < 2 || !literal.ends_with('"') {
        return false;
    }
    let body = &literal[..literal.len() - 1];
    let backslashes = body.len() - body.trim_end_matches('\\').len();
    backslashes % 2 == 0
}

fn close_brackets(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut expected: Vec<char> = Vec::new();

    for segment in segments(text) {
        let code = match segment {
            Segment::Str(literal) => {
                out.push_str(literal);
                continue;
            }
            Segment::Code(code) => code,
        };

        for c in code.chars() {
            match c {
                '{' => {
                    expected.push('}');
                    out.push(c);
                }
                '[' => {
                    expected.push(']');
                    out.push(c);
                }
                '}' | ']' => {
                    // Stray closers with no opener are dropped
                    if let Some(pos) = expected.iter().rposition(|&e| e == c) {
                        while expected.len() > pos + 1 {
                            if let Some(closer) = expected.pop() {
                                out.push(closer);
                            }
                        }
                        expected.pop();
                        out.push(c);
                        // Whatever follows the first complete value is not part of it
                        if expected.is_empty() {
                            return out;
                        }
                    }
                }
                _ => out.push(c),
            }
        }
    }

    let trimmed_len = out.trim_end().len();
    out.truncate(trimmed_len);
    while let Some(closer) = expected.pop() {
        out.push(closer);
    }
    out
}

fn cached(cell: &'static OnceLock<Option<Regex>>, pattern: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::error!(pattern = %pattern, error = %e, "Invalid repair pattern");
            None
        }
    })
    .as_ref()
}

fn replace(cell: &'static OnceLock<Option<Regex>>, pattern: &str, text: &str, rep: &str) -> String {
    match cached(cell, pattern) {
        Some(re) => re.replace_all(text, rep).into_owned(),
        None => text.to_string(),
    }
}

fn quote_ascii_keys(code: &str) -> String {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    replace(&RE, r"([{,]\s*)([A-Za-z_][A-Za-z0-9_]*)\s*:", code, r#"${1}"${2}":"#)
}

fn quote_any_keys(code: &str) -> String {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    replace(&RE, r"([{,]\s*)([\p{L}_][\p{L}\p{N}_]*)\s*:", code, r#"${1}"${2}":"#)
}

fn strip_trailing_commas(code: &str) -> String {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    replace(&RE, r",(\s*[}\]])", code, "${1}")
}

fn fill_empty_values(code: &str) -> String {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    replace(&RE, r":\s*([,}])", code, r#": ""${1}"#)
}

fn collapse_doubled_quotes(text: &str) -> String {
    static LEADING: OnceLock<Option<Regex>> = OnceLock::new();
    static TRAILING: OnceLock<Option<Regex>> = OnceLock::new();
    let text = replace(&LEADING, r#""{2,}([\p{L}\p{N}])"#, text, r#""${1}"#);
    replace(&TRAILING, r#"([\p{L}\p{N}])"{2,}"#, &text, r#"${1}""#)
}

fn quote_bare_values(code: &str) -> String {
    static OBJECT_VALUE: OnceLock<Option<Regex>> = OnceLock::new();
    static ARRAY_ITEM: OnceLock<Option<Regex>> = OnceLock::new();

    let mut current = code.to_string();
    let patterns = [
        cached(
            &OBJECT_VALUE,
            r"(:\s*)(\p{L}(?:[\p{L}\p{N} ]*[\p{L}\p{N}])?)(\s*[,}\]])",
        ),
        cached(
            &ARRAY_ITEM,
            r"([\[,]\s*)(\p{L}(?:[\p{L}\p{N} ]*[\p{L}\p{N}])?)(\s*[,\]])",
        ),
    ];

    // Neighbouring matches share a delimiter, so repeat until nothing changes
    for _ in 0..32 {
        let mut next = current.clone();
        for re in patterns.iter().flatten() {
            next = re
                .replace_all(&next, |caps: &Captures| {
                    let word = &caps[2];
                    if matches!(word, "true" | "false" | "null") {
                        caps[0].to_string()
                    } else {
                        format!("{}\"{}\"{}", &caps[1], word, &caps[3])
                    }
                })
                .into_owned();
        }
        if next == current {
            break;
        }
        current = next;
    }

    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn parses(text: &str) -> bool {
        serde_json::from_str::<Value>(text).is_ok()
    }

    #[test]
    fn test_ladder_order() {
        let names: Vec<_> = REPAIR_LADDER.iter().map(|s| s.name).collect();
        assert_eq!(
            names,
            ["whitespace", "minimal", "common-issues", "structural", "aggressive"]
        );
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(
            collapse_whitespace("{\n\t\"a\":   1,\r\n  \"b\": 2\n}"),
            "{ \"a\": 1, \"b\": 2 }"
        );
    }

    #[test]
    fn test_minimal_fix_quotes_keys_and_drops_commas() {
        let fixed = minimal_fix(r#"{name: "Egg Rice", servings: 2, tags: ["a",],}"#);
        assert_eq!(fixed, r#"{"name": "Egg Rice", "servings": 2, "tags": ["a"]}"#);
        assert!(parses(&fixed));
    }

    #[test]
    fn test_minimal_fix_leaves_string_contents_alone() {
        let text = r#"{"step": "Mix, stir: then serve", "x": 1,}"#;
        assert_eq!(minimal_fix(text), r#"{"step": "Mix, stir: then serve", "x": 1}"#);
    }

    #[test]
    fn test_minimal_fix_closes_truncated_string() {
        assert_eq!(minimal_fix(r#"{"name": "Egg Ri"#), r#"{"name": "Egg Ri""#);
    }

    #[test]
    fn test_escape_embedded_quotes() {
        let fixed = escape_embedded_quotes(r#"{"tip": "Call it "crispy" rice", "n": 1}"#);
        assert_eq!(fixed, r#"{"tip": "Call it \"crispy\" rice", "n": 1}"#);
        assert!(parses(&fixed));
    }

    #[test]
    fn test_escape_embedded_quotes_keeps_valid_json() {
        let valid = r#"{"a": "say \"hi\"", "b": ["x", "y"], "c": {"d": ""}}"#;
        assert_eq!(escape_embedded_quotes(valid), valid);
    }

    #[test]
    fn test_structural_repair_closes_in_nesting_order() {
        let fixed = structural_repair(r#"{"a": [1, 2, {"b": 3"#);
        assert_eq!(fixed, r#"{"a": [1, 2, {"b": 3}]}"#);
        assert!(parses(&fixed));
    }

    #[test]
    fn test_structural_repair_fills_empty_values() {
        let fixed = structural_repair(r#"{"a": , "b": }"#);
        assert_eq!(fixed, r#"{"a": "", "b": ""}"#);
        assert!(parses(&fixed));
    }

    #[test]
    fn test_structural_repair_handles_dangling_key_and_comma() {
        assert!(parses(&structural_repair(r#"{"a": 1, "b":"#)));
        assert!(parses(&structural_repair(r#"{"a": [1, 2,"#)));
    }

    #[test]
    fn test_structural_repair_drops_stray_closers() {
        let fixed = structural_repair(r#"{"a": 1}}"#);
        assert_eq!(fixed, r#"{"a": 1}"#);
    }

    #[test]
    fn test_structural_repair_does_not_close_twice() {
        let fixed = structural_repair(r#"{"tip": "Say \"hi"}, then go"}"#);
        assert_eq!(fixed, r#"{"tip": "Say \"hi"}"#);

        let fixed = structural_repair(r#"["a", "b"] and then "c"]"#);
        assert_eq!(fixed, r#"["a", "b"]"#);
    }

    #[test]
    fn test_ladder_recovers_misplaced_quote_before_closer() {
        let mut current = r#"{"tip": "Say "hi"}, then go"}"#.to_string();
        for stage in REPAIR_LADDER {
            current = (stage.apply)(&current);
        }
        assert!(!current.contains("}}"), "closed twice: {}", current);
        let value: Value = serde_json::from_str(&current).unwrap();
        assert_eq!(value["tip"], "Say \"hi");
    }

    #[test]
    fn test_aggressive_repair_quotes_words() {
        let fixed = aggressive_repair(r#"{"difficulty": easy, "ok": true, "tags": [quick meal, simple], "none": null}"#);
        assert_eq!(
            fixed,
            r#"{"difficulty": "easy", "ok": true, "tags": ["quick meal", "simple"], "none": null}"#
        );
        assert!(parses(&fixed));
    }

    #[test]
    fn test_aggressive_repair_handles_hangul() {
        let fixed = aggressive_repair(r#"{이름: 김치찌개, "tags": [한식]}"#);
        assert_eq!(fixed, r#"{"이름": "김치찌개", "tags": ["한식"]}"#);
        assert!(parses(&fixed));
    }

    #[test]
    fn test_aggressive_repair_dedupes_doubled_quotes() {
        let fixed = aggressive_repair(r#"{"name": ""Egg Rice"", "note": ""}"#);
        assert_eq!(fixed, r#"{"name": "Egg Rice", "note": ""}"#);
    }

    #[test]
    fn test_ladder_recovers_truncated_bare_output() {
        let raw = r#"{name: "Egg Rice", ingredients: [{name: egg, quantity: "2", isAvailable: true}], instructions: ["cook"], cookingTime: 10, difficulty: easy, servings: 1, tags: [simple]"#;
        let mut current = raw.to_string();
        for stage in REPAIR_LADDER {
            current = (stage.apply)(&current);
        }
        let value: Value = serde_json::from_str(&current).unwrap();
        assert_eq!(value["name"], "Egg Rice");
        assert_eq!(value["ingredients"][0]["name"], "egg");
        assert_eq!(value["tags"][0], "simple");
    }
}
