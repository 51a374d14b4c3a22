//! Field Rule Registry
//!
//! Per-resource map from field name to the comparison operators a client may
//! use on it. Built once when a resource's filterable endpoint is declared
//! and read-only afterwards; concurrent lookups need no locking.

use crate::ast::ComparisonOperator;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Rule for a single filterable field
///
/// `operators: None` means every comparison operator is accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterRule {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operators: Option<BTreeSet<ComparisonOperator>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FilterRule {
    /// Rule accepting any operator
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the rule to the given operators
    pub fn allow(mut self, operators: impl IntoIterator<Item = ComparisonOperator>) -> Self {
        self.operators = Some(operators.into_iter().collect());
        self
    }

    /// Restrict the rule to operators named in a delimiter-separated string
    /// (`"=, !="`, `"= != like"`, `"in|!in"`)
    pub fn allow_spec(mut self, spec: &str) -> Result<Self> {
        let operators = parse_operator_set(spec)?;
        if operators.is_empty() {
            return Err(Error::InvalidFilter(format!(
                "Empty operator specification: '{}'",
                spec
            )));
        }
        self.operators = Some(operators);
        Ok(self)
    }

    /// Attach a human-readable description
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Whether this rule accepts the given operator
    pub fn accepts(&self, operator: ComparisonOperator) -> bool {
        match &self.operators {
            Some(operators) => operators.contains(&operator),
            None => true,
        }
    }
}

/// Parse a delimiter-separated operator list, split on commas, pipes and
/// whitespace
pub fn parse_operator_set(spec: &str) -> Result<BTreeSet<ComparisonOperator>> {
    spec.split(|c: char| c == ',' || c == '|' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(|part| part.parse())
        .collect()
}

/// Case-insensitive registry of filterable fields for one resource
#[derive(Debug, Clone, Default)]
pub struct FilterRules {
    // Keyed by lowercased field name; the value keeps the name as registered.
    entries: BTreeMap<String, (String, FilterRule)>,
}

impl FilterRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or overwrite the rule for a field
    pub fn set(&mut self, field: impl Into<String>, rule: FilterRule) -> &mut Self {
        let field = field.into();
        self.entries
            .insert(field.to_ascii_lowercase(), (field, rule));
        self
    }

    /// Case-insensitive lookup
    pub fn get(&self, field: &str) -> Option<&FilterRule> {
        self.entries
            .get(&field.to_ascii_lowercase())
            .map(|(_, rule)| rule)
    }

    /// Iterate over `(field name as registered, rule)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterRule)> {
        self.entries
            .values()
            .map(|(name, rule)| (name.as_str(), rule))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Export the full rule set keyed by field name
    pub fn to_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .iter()
            .map(|(name, rule)| {
                (
                    name.to_string(),
                    serde_json::to_value(rule).unwrap_or(serde_json::Value::Null),
                )
            })
            .collect();
        serde_json::Value::Object(map)
    }
}

impl Extend<(String, FilterRule)> for FilterRules {
    fn extend<T: IntoIterator<Item = (String, FilterRule)>>(&mut self, iter: T) {
        for (field, rule) in iter {
            self.set(field, rule);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_operator_spec_delimiters() {
        let ops = parse_operator_set("=, !=").unwrap();
        assert_eq!(
            ops,
            BTreeSet::from([ComparisonOperator::Eq, ComparisonOperator::Ne])
        );

        let ops = parse_operator_set("= != like").unwrap();
        assert!(ops.contains(&ComparisonOperator::Like));

        let ops = parse_operator_set("in|!in").unwrap();
        assert_eq!(
            ops,
            BTreeSet::from([ComparisonOperator::In, ComparisonOperator::NotIn])
        );
    }

    #[test]
    fn test_operator_spec_rejects_unknown() {
        assert!(parse_operator_set("=, between").is_err());
    }

    #[test]
    fn test_case_insensitive_lookup() {
        let mut rules = FilterRules::new();
        rules.set("givenName", FilterRule::new().allow_spec("=, !=").unwrap());

        assert!(rules.get("GIVENNAME").is_some());
        assert!(rules.get("givenname").is_some());
        assert!(rules.get("familyName").is_none());
    }

    #[test]
    fn test_overwrite_keeps_latest() {
        let mut rules = FilterRules::new();
        rules.set("rate", FilterRule::new().allow([ComparisonOperator::Eq]));
        rules.set("Rate", FilterRule::new());

        assert_eq!(rules.len(), 1);
        assert!(rules.get("rate").unwrap().accepts(ComparisonOperator::Gt));
    }

    #[test]
    fn test_no_operators_means_any() {
        let rule = FilterRule::new();
        assert!(rule.accepts(ComparisonOperator::ILike));
        assert!(rule.accepts(ComparisonOperator::Le));
    }

    #[test]
    fn test_to_json() {
        let mut rules = FilterRules::new();
        rules.set(
            "givenName",
            FilterRule::new()
                .allow_spec("=, !=")
                .unwrap()
                .describe("exact match only"),
        );
        rules.set("rate", FilterRule::new());

        assert_eq!(
            rules.to_json(),
            json!({
                "givenName": {
                    "operators": ["=", "!="],
                    "description": "exact match only",
                },
                "rate": {},
            })
        );
    }

    #[test]
    fn test_iteration() {
        let mut rules = FilterRules::new();
        rules.set("b", FilterRule::new());
        rules.set("A", FilterRule::new());

        let names: Vec<&str> = rules.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["A", "b"]);
    }
}
