//! String replacement pass over a resolved tree.
//!
//! Every string leaf is rewritten by applying each rule in order. Literal
//! rules replace the first occurrence; pattern rules replace the first match,
//! or every match when marked global.

use crate::error::{ConfigError, ConfigResult};
use regex_lite::Regex;
use serde_json::Value;

/// What a rule searches for.
#[derive(Debug, Clone)]
pub enum Pattern {
    /// Plain substring, first occurrence only.
    Literal(String),
    /// Regular expression.
    Regex { regex: Regex, global: bool },
}

/// A single find/replace rule.
#[derive(Debug, Clone)]
pub struct ReplacementRule {
    pub from: Pattern,
    pub to: String,
}

impl ReplacementRule {
    /// Replace the first occurrence of `from` with `to`.
    pub fn literal(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: Pattern::Literal(from.into()),
            to: to.into(),
        }
    }

    /// Replace regex matches of `pattern` with `to` (`$1`-style captures allowed).
    pub fn pattern(pattern: &str, to: impl Into<String>, global: bool) -> ConfigResult<Self> {
        let regex = Regex::new(pattern).map_err(|e| ConfigError::InvalidReplacementSpec {
            reason: format!("invalid pattern {:?}: {}", pattern, e),
        })?;
        Ok(Self {
            from: Pattern::Regex { regex, global },
            to: to.into(),
        })
    }

    /// Parse a rule from JSON.
    ///
    /// Accepts `{"from": "bar", "to": "baz"}` for literal rules and
    /// `{"from": {"pattern": "b.r", "global": true}, "to": "baz"}` for
    /// pattern rules (`global` defaults to false).
    pub fn from_value(value: &Value) -> ConfigResult<Self> {
        let invalid = |reason: &str| ConfigError::InvalidReplacementSpec {
            reason: format!("{} in rule {}", reason, value),
        };

        let rule = value
            .as_object()
            .ok_or_else(|| invalid("expected an object"))?;
        let from = rule.get("from").ok_or_else(|| invalid("missing `from`"))?;
        let to = rule
            .get("to")
            .ok_or_else(|| invalid("missing `to`"))?
            .as_str()
            .ok_or_else(|| invalid("`to` must be a string"))?;

        match from {
            Value::String(literal) => Ok(Self::literal(literal.as_str(), to)),
            Value::Object(spec) => {
                let pattern = spec
                    .get("pattern")
                    .and_then(Value::as_str)
                    .ok_or_else(|| invalid("`from.pattern` must be a string"))?;
                let global = spec.get("global").and_then(Value::as_bool).unwrap_or(false);
                Self::pattern(pattern, to, global)
            }
            _ => Err(invalid("`from` must be a string or a pattern object")),
        }
    }

    /// Apply this rule to one string.
    pub fn apply(&self, input: &str) -> String {
        match &self.from {
            Pattern::Literal(from) => input.replacen(from.as_str(), &self.to, 1),
            Pattern::Regex {
                regex,
                global: true,
            } => regex.replace_all(input, self.to.as_str()).into_owned(),
            Pattern::Regex {
                regex,
                global: false,
            } => regex.replace(input, self.to.as_str()).into_owned(),
        }
    }
}

/// Replacement rules as supplied to the loader.
#[derive(Debug, Clone)]
pub enum Replacements {
    /// Already-typed rules.
    Rules(Vec<ReplacementRule>),
    /// A JSON rule list, validated when the loader runs.
    Spec(Value),
}

impl Default for Replacements {
    fn default() -> Self {
        Replacements::Rules(Vec::new())
    }
}

impl Replacements {
    /// Produce the typed rule list, validating a JSON spec.
    pub fn resolve(&self) -> ConfigResult<Vec<ReplacementRule>> {
        match self {
            Replacements::Rules(rules) => Ok(rules.clone()),
            Replacements::Spec(spec) => parse_rules(spec),
        }
    }
}

/// Parse an ordered JSON list of rules.
pub fn parse_rules(spec: &Value) -> ConfigResult<Vec<ReplacementRule>> {
    let items = spec
        .as_array()
        .ok_or_else(|| ConfigError::InvalidReplacementSpec {
            reason: format!("expected a list of rules but got {}", spec),
        })?;
    items.iter().map(ReplacementRule::from_value).collect()
}

/// Apply `rules` to every string leaf of `tree`.
pub fn apply_replacements(tree: Value, rules: &[ReplacementRule]) -> Value {
    match tree {
        Value::String(s) => Value::String(rules.iter().fold(s, |acc, rule| rule.apply(&acc))),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| apply_replacements(item, rules))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (key, apply_replacements(value, rules)))
                .collect(),
        ),
        other => other,
    }
}
