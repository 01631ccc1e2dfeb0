//! Disallowed-intent rules: requests for medical advice the service never gives.

use std::sync::LazyLock;

use regex::Regex;

pub struct IntentRule {
    pub label: &'static str,
    pub pattern: Regex,
}

fn rule(label: &'static str, pattern: &str) -> IntentRule {
    IntentRule {
        label,
        pattern: Regex::new(pattern).unwrap(),
    }
}

pub static INTENT_RULES: LazyLock<Vec<IntentRule>> = LazyLock::new(|| {
    vec![
        rule(
            "medication advice",
            r"(?i)\bshould\s+i\s+(?:take|stop|start|change|increase|decrease)\s*(?:my\s+)?(?:medications?|medicines?|drugs?|doses?|dosage)\b|\bwhat\s+(?:medications?|medicines?|drugs?|dose|dosage)\s+should\s+i\b",
        ),
        rule(
            "treatment recommendation",
            r"(?i)\bwhat\s+(?:treatments?|therapy|therapies)\s+should\s+i\b",
        ),
        rule(
            "diagnosis request",
            r"(?i)\bdo\s+i\s+have\s+(?:a\s+|the\s+)?(?:cancer|disease|condition|disorder)\b|\bdiagnose\s+me\b|\bcan\s+you\s+diagnose\b",
        ),
        rule(
            "prognosis request",
            r"(?i)\bam\s+i\s+going\s+to\s+(?:get|develop|die|have)\b|\bwill\s+i\s+(?:get|develop|die)\b",
        ),
        rule(
            "supplement advice",
            r"(?i)\bwhat\s+(?:supplements?|vitamins?)\s+should\b|\bshould\s+i\s+take\s+(?:folate|folic\s+acid|methylfolate|b12|vitamins?|supplements?)\b",
        ),
        rule("prescription request", r"(?i)\bprescribe\b|\bprescription\s+for\s+me\b"),
        rule(
            "treatment request",
            r"(?i)\bcure\s+(?:my|this|it)\b|\btreat\s+my\b",
        ),
    ]
});

/// Every matching label, in rule order, each at most once.
pub fn detect_intents(text: &str) -> Vec<&'static str> {
    let mut labels: Vec<&'static str> = Vec::new();
    for rule in INTENT_RULES.iter() {
        if rule.pattern.is_match(text) && !labels.contains(&rule.label) {
            labels.push(rule.label);
        }
    }
    labels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_medication_question() {
        let intents = detect_intents("what medication should I take for this mutation");
        assert!(intents.contains(&"medication advice"));
    }

    #[test]
    fn test_multiple_intents() {
        let intents = detect_intents("Do I have cancer? Please prescribe something.");
        assert_eq!(intents, vec!["diagnosis request", "prescription request"]);
    }

    #[test]
    fn test_report_language_is_not_an_intent() {
        let text = "Patient was diagnosed with breast cancer at 42. BRCA2 pathogenic variant, heterozygous.";
        assert!(detect_intents(text).is_empty());
    }

    #[test]
    fn test_supplement_question() {
        assert_eq!(detect_intents("MTHFR C677T: should I take methylfolate?"), vec!["supplement advice"]);
    }
}
