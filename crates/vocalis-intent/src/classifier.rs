//! Intent classifier — transforms raw user text into structured intents.
//!
//! The classifier walks an ordered list of [`IntentRule`]s, trying each
//! rule's patterns against the lower-cased, trimmed input.  The first
//! pattern that matches wins, which makes registration order the tie-break
//! policy: a rule registered earlier shadows any later rule whose pattern
//! would also match.  Pattern hits carry a fixed confidence of
//! [`PATTERN_CONFIDENCE`]; unmatched input falls back to a low-confidence
//! `general_query` intent that callers can hand to a generic completion
//! path.  `classify` is total — it never fails.

use std::collections::HashMap;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{IntentError, Result};

/// Confidence assigned to any pattern hit.  Deliberately fixed rather than
/// scored: rule order, not match quality, decides precedence.
pub const PATTERN_CONFIDENCE: f64 = 0.9;

/// Confidence assigned to the fallback intent.
pub const FALLBACK_CONFIDENCE: f64 = 0.3;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A structured representation of a classified user intent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentResult {
    /// The high-level intent tag (e.g. "open_application").
    pub intent: String,

    /// Confidence score between 0.0 and 1.0.
    pub confidence: f64,

    /// Named entities extracted from the text (e.g. `{"app_name": "chrome"}`).
    pub entities: HashMap<String, Value>,

    /// The action tag a dispatcher should route on (e.g. "open_app").
    pub action: String,

    /// Parameters for the action, ready to pass to an executor.
    pub parameters: HashMap<String, Value>,
}

/// How a rule turns a regex match into entities.
///
/// A closed enum rather than per-rule callbacks so that adding a new
/// extraction strategy is a compile-time-checked change.
#[derive(Debug, Clone)]
pub enum EntityExtractor {
    /// Store capture group 1, cleaned as an application name (trailing
    /// punctuation and filler words stripped), under `key`.
    AppName { key: &'static str },
    /// Store capture group 1, trimmed, under `key`.
    Capture { key: &'static str },
    /// The rule carries no entities.
    None,
}

impl EntityExtractor {
    fn extract(&self, caps: &regex::Captures<'_>) -> HashMap<String, Value> {
        let mut entities = HashMap::new();
        match self {
            Self::AppName { key } => {
                if let Some(m) = caps.get(1) {
                    entities.insert((*key).to_string(), Value::String(clean_app_name(m.as_str())));
                }
            }
            Self::Capture { key } => {
                if let Some(m) = caps.get(1) {
                    entities.insert((*key).to_string(), Value::String(m.as_str().trim().to_string()));
                }
            }
            Self::None => {}
        }
        entities
    }
}

/// One classification rule: an intent/action pair with its match patterns.
#[derive(Debug, Clone)]
pub struct IntentRule {
    /// The intent tag returned on a match.
    pub intent: String,
    /// The action tag returned on a match.
    pub action: String,
    /// Patterns tried in order; the first hit wins.
    patterns: Vec<Regex>,
    /// How entities are pulled out of the match.
    extractor: EntityExtractor,
    /// Whether the extracted entities are also returned as parameters.
    parameters_from_entities: bool,
}

impl IntentRule {
    /// Build a rule, compiling its patterns.
    ///
    /// Returns [`IntentError::InvalidPattern`] if any pattern fails to
    /// compile; rules are configuration and should fail loudly at startup.
    pub fn new(
        intent: impl Into<String>,
        action: impl Into<String>,
        patterns: &[&str],
        extractor: EntityExtractor,
    ) -> Result<Self> {
        let compiled = patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| IntentError::InvalidPattern {
                    pattern: (*p).to_string(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            intent: intent.into(),
            action: action.into(),
            patterns: compiled,
            extractor,
            parameters_from_entities: false,
        })
    }

    /// Also surface the extracted entities as action parameters.
    pub fn with_parameter_extraction(mut self) -> Self {
        self.parameters_from_entities = true;
        self
    }
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

/// The intent classifier.
///
/// Rules are injected at construction as explicit configuration — there is
/// no global registry.  Matching is first-hit in rule order, then pattern
/// order within a rule.
pub struct IntentClassifier {
    rules: Vec<IntentRule>,
}

impl IntentClassifier {
    /// Create a classifier from an ordered rule list.
    pub fn new(rules: Vec<IntentRule>) -> Self {
        Self { rules }
    }

    /// Create a classifier with the built-in rule set.
    pub fn with_default_rules() -> Self {
        Self::new(default_rules())
    }

    /// Classify text into an intent.  Total: always returns a result, with
    /// low confidence when nothing matched.
    pub fn classify(&self, text: &str) -> IntentResult {
        let lowered = text.trim().to_lowercase();

        for rule in &self.rules {
            for pattern in &rule.patterns {
                if let Some(caps) = pattern.captures(&lowered) {
                    let entities = rule.extractor.extract(&caps);
                    let parameters = if rule.parameters_from_entities {
                        entities.clone()
                    } else {
                        HashMap::new()
                    };

                    debug!(
                        intent = %rule.intent,
                        action = %rule.action,
                        pattern = %pattern.as_str(),
                        "intent matched"
                    );

                    return IntentResult {
                        intent: rule.intent.clone(),
                        confidence: PATTERN_CONFIDENCE,
                        entities,
                        action: rule.action.clone(),
                        parameters,
                    };
                }
            }
        }

        self.fallback(text)
    }

    /// Return the number of configured rules.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Build the fallback result for unmatched input: a `general_query`
    /// intent whose `prompt` parameter lets the caller delegate to a
    /// generic text-completion path.
    fn fallback(&self, text: &str) -> IntentResult {
        debug!(text = text, "no rule matched, falling back to general_query");
        IntentResult {
            intent: "general_query".into(),
            confidence: FALLBACK_CONFIDENCE,
            entities: HashMap::from([("text".to_string(), Value::String(text.to_string()))]),
            action: "ai_process".into(),
            parameters: HashMap::from([("prompt".to_string(), Value::String(text.to_string()))]),
        }
    }
}

// ---------------------------------------------------------------------------
// Default rules
// ---------------------------------------------------------------------------

/// The built-in rule set: application launch, web search, and system info.
///
/// Order matters — `open_application` shadows the more general search
/// patterns for inputs like "run firefox".
pub fn default_rules() -> Vec<IntentRule> {
    vec![
        IntentRule::new(
            "open_application",
            "open_app",
            &[r"open (.+)", r"launch (.+)", r"start (.+)", r"run (.+)"],
            EntityExtractor::AppName { key: "app_name" },
        )
        .expect("built-in pattern")
        .with_parameter_extraction(),
        IntentRule::new(
            "search_web",
            "web_search",
            &[
                r"search for (.+)",
                r"find (.+)",
                r"look up (.+)",
                r"google (.+)",
            ],
            EntityExtractor::Capture { key: "query" },
        )
        .expect("built-in pattern"),
        IntentRule::new(
            "system_info",
            "get_system_info",
            &[
                r"system info",
                r"what's running",
                r"show processes",
                r"computer info",
            ],
            EntityExtractor::None,
        )
        .expect("built-in pattern"),
    ]
}

/// Strip trailing punctuation and filler words from a captured app name.
fn clean_app_name(raw: &str) -> String {
    let name = raw.trim().trim_end_matches(['.', ',', '!', '?']);
    name.replace(" the ", " ").replace(" my ", " ").trim().to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_application_extracts_app_name() {
        let classifier = IntentClassifier::with_default_rules();
        let result = classifier.classify("open chrome");
        assert_eq!(result.intent, "open_application");
        assert_eq!(result.action, "open_app");
        assert_eq!(result.confidence, PATTERN_CONFIDENCE);
        assert_eq!(result.entities["app_name"], "chrome");
        assert_eq!(result.parameters["app_name"], "chrome");
    }

    #[test]
    fn app_name_trailing_punctuation_stripped() {
        let classifier = IntentClassifier::with_default_rules();
        let result = classifier.classify("launch Spotify!");
        assert_eq!(result.entities["app_name"], "spotify");
    }

    #[test]
    fn search_rule_extracts_query_without_parameters() {
        let classifier = IntentClassifier::with_default_rules();
        let result = classifier.classify("search for rust workflow engines");
        assert_eq!(result.intent, "search_web");
        assert_eq!(result.entities["query"], "rust workflow engines");
        assert!(result.parameters.is_empty());
    }

    #[test]
    fn system_info_has_no_entities() {
        let classifier = IntentClassifier::with_default_rules();
        let result = classifier.classify("show processes");
        assert_eq!(result.intent, "system_info");
        assert!(result.entities.is_empty());
    }

    #[test]
    fn unmatched_input_falls_back_to_general_query() {
        let classifier = IntentClassifier::with_default_rules();
        let result = classifier.classify("what is the meaning of life");
        assert_eq!(result.intent, "general_query");
        assert_eq!(result.action, "ai_process");
        assert_eq!(result.confidence, FALLBACK_CONFIDENCE);
        assert_eq!(result.parameters["prompt"], "what is the meaning of life");
    }

    #[test]
    fn fallback_preserves_original_casing_in_prompt() {
        let classifier = IntentClassifier::with_default_rules();
        let result = classifier.classify("Summarize THIS Document");
        assert_eq!(result.parameters["prompt"], "Summarize THIS Document");
    }

    #[test]
    fn rule_order_decides_precedence() {
        // Both rules match "find chrome"; the earlier one must win.
        let rules = vec![
            IntentRule::new(
                "first_rule",
                "first_action",
                &[r"find (.+)"],
                EntityExtractor::Capture { key: "target" },
            )
            .unwrap(),
            IntentRule::new(
                "second_rule",
                "second_action",
                &[r"find (.+)"],
                EntityExtractor::Capture { key: "target" },
            )
            .unwrap(),
        ];
        let classifier = IntentClassifier::new(rules);
        let result = classifier.classify("find chrome");
        assert_eq!(result.intent, "first_rule");
    }

    #[test]
    fn pattern_order_within_rule_decides() {
        // "open editor" matches both patterns of the single rule; pattern
        // order decides which capture shape applies.  Both produce the same
        // intent, so assert on the extracted entity instead.
        let rule = IntentRule::new(
            "open_application",
            "open_app",
            &[r"open (\S+) editor", r"open (.+)"],
            EntityExtractor::Capture { key: "app_name" },
        )
        .unwrap();
        let classifier = IntentClassifier::new(vec![rule]);
        let result = classifier.classify("open vim editor");
        assert_eq!(result.entities["app_name"], "vim");
    }

    #[test]
    fn invalid_pattern_is_rejected_at_construction() {
        let result = IntentRule::new("broken", "noop", &["[invalid("], EntityExtractor::None);
        assert!(matches!(result, Err(IntentError::InvalidPattern { .. })));
    }

    #[test]
    fn classify_is_case_insensitive() {
        let classifier = IntentClassifier::with_default_rules();
        let result = classifier.classify("  OPEN Chrome  ");
        assert_eq!(result.intent, "open_application");
        assert_eq!(result.entities["app_name"], "chrome");
    }
}
