use crate::domain::classification::ClassificationResult;
use once_cell::sync::Lazy;
use regex::Regex;

static THINK_TAG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<think>[\s\S]*?</think>|<think\s*/>").unwrap());

static REASONING_TAG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<reasoning>[\s\S]*?</reasoning>").unwrap());

static MULTIPLE_NEWLINES_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

// `.` stops at the newline, so the capture runs to end of line.
static SEVERITY_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)severity:(.*)").unwrap());

static CONFIDENCE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)confidence:[ \t*]*(\d+(?:\.\d+)?)%").unwrap());

/// Strips reasoning blocks some models emit before the answer.
pub fn clean_llm_response(response: &str) -> String {
    let cleaned = THINK_TAG_PATTERN.replace_all(response, "");
    let cleaned = REASONING_TAG_PATTERN.replace_all(&cleaned, "");
    let cleaned = cleaned.trim();

    MULTIPLE_NEWLINES_PATTERN
        .replace_all(cleaned, "\n\n")
        .to_string()
}

/// First `Severity:` value in the text, trimmed of whitespace and markdown emphasis.
pub fn extract_severity(text: &str) -> Option<String> {
    SEVERITY_PATTERN
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|value| {
            value
                .as_str()
                .trim_matches(|c: char| c.is_whitespace() || c == '*')
                .to_string()
        })
        .filter(|value| !value.is_empty())
}

/// First `Confidence: <number>%` value in the text, without the percent sign.
pub fn extract_confidence(text: &str) -> Option<String> {
    CONFIDENCE_PATTERN
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|value| value.as_str().to_string())
}

/// Never fails: fields that cannot be found are left empty.
pub fn interpret(text: &str) -> ClassificationResult {
    ClassificationResult {
        severity: extract_severity(text),
        confidence: extract_confidence(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_think_tags() {
        let input = "<think>Severity: Low maybe?</think>Severity: High";
        assert_eq!(clean_llm_response(input), "Severity: High");
    }

    #[test]
    fn test_clean_self_closing_think() {
        let input = "<think />Severity: High";
        assert_eq!(clean_llm_response(input), "Severity: High");
    }

    #[test]
    fn test_clean_reasoning_and_newlines() {
        let input = "<reasoning>hmm</reasoning>\n\nSeverity: High\n\n\n\nConfidence: 80%";
        assert_eq!(
            clean_llm_response(input),
            "Severity: High\n\nConfidence: 80%"
        );
    }

    #[test]
    fn test_interpret_both_fields() {
        let result = interpret("Severity: High\nConfidence: 87%");
        assert_eq!(result.severity.as_deref(), Some("High"));
        assert_eq!(result.confidence.as_deref(), Some("87"));
    }

    #[test]
    fn test_interpret_severity_only() {
        let result = interpret("Severity: Low");
        assert_eq!(result.severity.as_deref(), Some("Low"));
        assert_eq!(result.confidence, None);
    }

    #[test]
    fn test_interpret_unrelated_text() {
        let result = interpret("I cannot classify this.");
        assert!(result.is_empty());
    }

    #[test]
    fn test_label_is_case_insensitive() {
        assert_eq!(extract_severity("severity: medium").as_deref(), Some("medium"));
        assert_eq!(extract_confidence("CONFIDENCE: 40%").as_deref(), Some("40"));
    }

    #[test]
    fn test_confidence_without_severity() {
        let result = interpret("Unsure.\nConfidence: 12.5%");
        assert_eq!(result.severity, None);
        assert_eq!(result.confidence.as_deref(), Some("12.5"));
    }

    #[test]
    fn test_confidence_requires_percent_sign() {
        assert_eq!(extract_confidence("Confidence: 90"), None);
        assert_eq!(extract_confidence("Confidence: high%"), None);
    }

    #[test]
    fn test_order_does_not_matter() {
        let result = interpret("Confidence: 70%\nSeverity: Medium");
        assert_eq!(result.severity.as_deref(), Some("Medium"));
        assert_eq!(result.confidence.as_deref(), Some("70"));
    }

    #[test]
    fn test_severity_value_is_trimmed() {
        let result = interpret("Here you go:\r\nSeverity:   Critical  \r\nConfidence: 95%\r\n");
        assert_eq!(result.severity.as_deref(), Some("Critical"));
        assert_eq!(result.confidence.as_deref(), Some("95"));
    }

    #[test]
    fn test_markdown_emphasis_is_stripped() {
        let result = interpret("**Severity:** High\n**Confidence:** 88%");
        assert_eq!(result.severity.as_deref(), Some("High"));
        assert_eq!(result.confidence.as_deref(), Some("88"));
    }

    #[test]
    fn test_blank_severity_is_absent() {
        assert_eq!(extract_severity("Severity:   \nConfidence: 10%"), None);
    }

    #[test]
    fn test_free_text_severity_is_kept() {
        assert_eq!(
            extract_severity("Severity: Medium-High (data loss possible)").as_deref(),
            Some("Medium-High (data loss possible)")
        );
    }
}
