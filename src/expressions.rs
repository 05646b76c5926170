//! The expression adapter behind `{{ … }}` default values.
//!
//! The evaluator itself is an external collaborator; only the
//! `eval(source) -> value` contract matters here. When no evaluator is
//! registered, templated defaults are stored as their literal string.
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::Arc;

/// Evaluates an expression source into a value.
pub type ExpressionEvaluator = Arc<dyn Fn(&str) -> Result<Value, String> + Send + Sync>;

static EVALUATOR: Lazy<RwLock<Option<ExpressionEvaluator>>> = Lazy::new(|| RwLock::new(None));

/// Install the process-wide expression evaluator used for templated
/// defaults. Meant to be called once at startup.
pub fn register_expression_evaluator(
    evaluator: impl Fn(&str) -> Result<Value, String> + Send + Sync + 'static,
) {
    *EVALUATOR.write() = Some(Arc::new(evaluator));
}

/// Remove the registered evaluator; templated defaults fall back to their
/// literal form.
pub fn reset_expression_evaluator() {
    *EVALUATOR.write() = None;
}

/// The expression inside `{{ … }}`, if `text` is shaped like a template.
pub(crate) fn template_source(text: &str) -> Option<&str> {
    let trimmed = text.strip_prefix("{{")?.strip_suffix("}}")?;
    Some(trimmed.trim())
}

/// Evaluate `source` through the registered evaluator, when there is one.
pub(crate) fn evaluate(source: &str) -> Option<Result<Value, String>> {
    let evaluator = EVALUATOR.read().as_ref().map(Arc::clone)?;
    Some(evaluator(source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn template_shapes() {
        assert_eq!(template_source("{{ now() }}"), Some("now()"));
        assert_eq!(template_source("{{x}}"), Some("x"));
        assert_eq!(template_source("now()"), None);
        assert_eq!(template_source("{{x"), None);
    }

    #[test]
    fn evaluator_roundtrip() {
        register_expression_evaluator(|source| {
            if source == "answer" {
                Ok(json!(42))
            } else {
                Err(format!("unknown expression: {}", source))
            }
        });
        assert_eq!(evaluate("answer").unwrap().unwrap(), json!(42));
        assert!(evaluate("other").unwrap().is_err());
        reset_expression_evaluator();
        assert!(evaluate("answer").is_none());
    }
}
