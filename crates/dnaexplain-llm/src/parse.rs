//! Decoding raw backend output into a JSON value.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

static FENCED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"```(?:json)?\s*([\s\S]*?)```").unwrap());

/// Body of the first fenced block, or the whole text when unfenced.
pub fn strip_fence(raw: &str) -> &str {
    FENCED
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(raw)
        .trim()
}

pub fn decode(raw: &str) -> Result<Value, serde_json::Error> {
    serde_json::from_str(strip_fence(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unfenced_json() {
        assert_eq!(decode(" {\"a\": 1}\n").unwrap()["a"], 1);
    }

    #[test]
    fn test_json_fence_stripped() {
        let raw = "Here you go:\n```json\n{\"a\": [1, 2]}\n```\nThanks";
        assert_eq!(strip_fence(raw), "{\"a\": [1, 2]}");
        assert_eq!(decode(raw).unwrap()["a"][1], 2);
    }

    #[test]
    fn test_bare_fence_stripped() {
        assert_eq!(decode("```\n{\"b\": true}\n```").unwrap()["b"], true);
    }

    #[test]
    fn test_prose_is_an_error() {
        assert!(decode("I cannot produce JSON today.").is_err());
    }
}
