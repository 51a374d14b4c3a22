//! Semantic normalizer - binds AST identifiers to schema fields
//!
//! Walks a parsed filter expression, resolves each comparison's left-hand
//! identifier against the resource's data type (canonicalizing dotted-path
//! casing), and enforces the per-field operator whitelist from the
//! [`FilterRules`] registry. The result is a new tree; parser output is
//! never mutated in place, so callers may keep the original AST around.

use crate::ast::{ComparisonOperator, Expression, QualifiedIdentifier};
use crate::error::{Error, Result};
use crate::parser::parse;
use crate::rules::FilterRules;
use crate::schema::DataType;
use tracing::debug;

/// Input to normalization: a raw filter string or an already-parsed AST
pub enum FilterSource {
    Text(String),
    Ast(Expression),
}

impl From<&str> for FilterSource {
    fn from(value: &str) -> Self {
        FilterSource::Text(value.to_string())
    }
}

impl From<String> for FilterSource {
    fn from(value: String) -> Self {
        FilterSource::Text(value)
    }
}

impl From<Expression> for FilterSource {
    fn from(value: Expression) -> Self {
        FilterSource::Ast(value)
    }
}

/// Normalize a filter against a rule registry and an optional data type.
///
/// Convenience wrapper around [`Normalizer`].
pub fn normalize_filter(
    input: impl Into<FilterSource>,
    rules: &FilterRules,
    data_type: Option<&DataType>,
) -> Result<Expression> {
    Normalizer::new(rules, data_type).normalize(input)
}

/// Schema-aware filter normalizer
pub struct Normalizer<'a> {
    rules: &'a FilterRules,
    data_type: Option<&'a DataType>,
}

impl<'a> Normalizer<'a> {
    pub fn new(rules: &'a FilterRules, data_type: Option<&'a DataType>) -> Self {
        Self { rules, data_type }
    }

    /// Normalize a filter string or AST into a bound expression tree
    pub fn normalize(&self, input: impl Into<FilterSource>) -> Result<Expression> {
        let ast = match input.into() {
            FilterSource::Text(text) => parse(&text)?,
            FilterSource::Ast(ast) => ast,
        };
        debug!(filter = %ast, data_type = self.data_type.map(|dt| dt.name()), "normalizing filter");
        self.normalize_expr(&ast)
    }

    fn normalize_expr(&self, expr: &Expression) -> Result<Expression> {
        match expr {
            Expression::Literal(literal) => Ok(Expression::Literal(literal.clone())),

            Expression::Identifier(id) => Ok(Expression::Identifier(self.bind_identifier(id)?)),

            Expression::Comparison { left, op, right } => {
                let left = self.normalize_expr(left)?;
                let Some(id) = comparison_identifier(&left) else {
                    return Err(Error::InvalidFilter(
                        "Left side of a comparison must be a data field".into(),
                    ));
                };
                self.check_rule(id, *op)?;
                let right = self.normalize_expr(right)?;
                Ok(Expression::Comparison {
                    left: Box::new(left),
                    op: *op,
                    right: Box::new(right),
                })
            }

            Expression::Logical { op, items } => Ok(Expression::Logical {
                op: *op,
                items: items
                    .iter()
                    .map(|item| self.normalize_expr(item))
                    .collect::<Result<Vec<_>>>()?,
            }),

            Expression::Arithmetic { items } => Ok(Expression::Arithmetic {
                items: items
                    .iter()
                    .map(|item| {
                        Ok(crate::ast::ArithmeticItem {
                            operator: item.operator,
                            expression: self.normalize_expr(&item.expression)?,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?,
            }),

            Expression::Array { items } => Ok(Expression::Array {
                items: items
                    .iter()
                    .map(|item| self.normalize_expr(item))
                    .collect::<Result<Vec<_>>>()?,
            }),

            // Grouping survives normalization for re-compilation and printing.
            Expression::Parenthesized { expression } => Ok(Expression::Parenthesized {
                expression: Box::new(self.normalize_expr(expression)?),
            }),

            // Negation is a compiler concern; recurse without special-casing.
            Expression::Negative { expression } => Ok(Expression::Negative {
                expression: Box::new(self.normalize_expr(expression)?),
            }),
        }
    }

    /// Resolve an identifier's dotted path against the data type, if one was
    /// supplied. Unresolved paths only pass through unbound when the type
    /// declares `additional_fields`.
    fn bind_identifier(&self, id: &QualifiedIdentifier) -> Result<QualifiedIdentifier> {
        let Some(data_type) = self.data_type else {
            return Ok(id.clone());
        };
        let binding = data_type.resolve_path(&id.value)?;
        Ok(QualifiedIdentifier {
            value: id.value.clone(),
            sign: id.sign,
            binding,
        })
    }

    /// Enforce the registry whitelist for a comparison's left-hand field
    fn check_rule(&self, id: &QualifiedIdentifier, op: ComparisonOperator) -> Result<()> {
        let field = id.path().to_string();
        let Some(rule) = self.rules.get(&field) else {
            return Err(Error::UnacceptedFilterField { field });
        };
        if !rule.accepts(op) {
            return Err(Error::UnacceptedFilterOperation {
                field,
                operator: op.as_str().to_string(),
            });
        }
        Ok(())
    }
}

/// Find the identifier of a comparison's left-hand side, seeing through
/// explicit grouping the same way the compilers do
fn comparison_identifier(expr: &Expression) -> Option<&QualifiedIdentifier> {
    match expr {
        Expression::Identifier(id) => Some(id),
        Expression::Parenthesized { expression } => comparison_identifier(expression),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::FilterRule;
    use crate::schema::Field;
    use std::sync::Arc;

    fn hotel_type() -> DataType {
        let address = Arc::new(DataType::new("address").with_field(Field::new("city")));
        DataType::new("hotel")
            .with_field(Field::new("givenName"))
            .with_field(Field::new("countryCode"))
            .with_field(Field::new("rate"))
            .with_field(Field::complex("address", address))
    }

    fn open_rules() -> FilterRules {
        let mut rules = FilterRules::new();
        rules.set("givenName", FilterRule::new());
        rules.set("countryCode", FilterRule::new());
        rules.set("rate", FilterRule::new());
        rules.set("address.city", FilterRule::new());
        rules
    }

    #[test]
    fn test_accepts_string_or_ast() {
        let rules = open_rules();
        let dt = hotel_type();
        let normalizer = Normalizer::new(&rules, Some(&dt));

        let from_text = normalizer.normalize("rate > 5").unwrap();
        let from_ast = normalizer.normalize(parse("rate > 5").unwrap()).unwrap();
        assert_eq!(from_text, from_ast);
    }

    #[test]
    fn test_binds_left_identifier() {
        let rules = open_rules();
        let dt = hotel_type();
        let expr = normalize_filter("rate > 5", &rules, Some(&dt)).unwrap();

        let Expression::Comparison { left, .. } = expr else {
            panic!("expected comparison");
        };
        let Expression::Identifier(id) = *left else {
            panic!("expected identifier");
        };
        let binding = id.binding.expect("identifier should be bound");
        assert_eq!(binding.path, "rate");
        assert_eq!(binding.field, "rate");
    }

    #[test]
    fn test_canonicalizes_dotted_path_case() {
        let rules = open_rules();
        let dt = hotel_type();
        let expr = normalize_filter("AdDRess.CIty = \"x\"", &rules, Some(&dt)).unwrap();

        let Expression::Comparison { left, .. } = expr else {
            panic!("expected comparison");
        };
        let Expression::Identifier(id) = *left else {
            panic!("expected identifier");
        };
        assert_eq!(id.path(), "address.city");
    }

    #[test]
    fn test_operator_whitelist() {
        let mut rules = FilterRules::new();
        rules.set("givenName", FilterRule::new().allow_spec("=, !=").unwrap());
        let dt = hotel_type();

        let err = normalize_filter("givenName > 5", &rules, Some(&dt)).unwrap_err();
        assert_eq!(
            err,
            Error::UnacceptedFilterOperation {
                field: "givenName".into(),
                operator: ">".into(),
            }
        );

        assert!(normalize_filter("givenName != \"x\"", &rules, Some(&dt)).is_ok());
    }

    #[test]
    fn test_unregistered_field_rejected() {
        let mut rules = FilterRules::new();
        rules.set("givenName", FilterRule::new());

        let err = normalize_filter("rate = 1", &rules, None).unwrap_err();
        assert_eq!(
            err,
            Error::UnacceptedFilterField {
                field: "rate".into()
            }
        );
    }

    #[test]
    fn test_unknown_field_rejected_by_schema() {
        let rules = open_rules();
        let dt = hotel_type();

        let err = normalize_filter("unknownField = 1", &rules, Some(&dt)).unwrap_err();
        assert_eq!(
            err,
            Error::UnknownField {
                path: "unknownField".into()
            }
        );
    }

    #[test]
    fn test_additional_fields_pass_unbound() {
        let mut rules = FilterRules::new();
        rules.set("extra", FilterRule::new());
        let dt = DataType::new("doc").with_additional_fields();

        let expr = normalize_filter("extra = 1", &rules, Some(&dt)).unwrap();
        let Expression::Comparison { left, .. } = expr else {
            panic!("expected comparison");
        };
        let Expression::Identifier(id) = *left else {
            panic!("expected identifier");
        };
        assert!(id.binding.is_none());
    }

    #[test]
    fn test_left_side_must_be_field() {
        let rules = open_rules();
        let err = normalize_filter("5 = 5", &rules, None).unwrap_err();
        assert!(matches!(err, Error::InvalidFilter(_)));
    }

    #[test]
    fn test_grouped_left_identifier_accepted() {
        let rules = open_rules();
        let dt = hotel_type();

        // Grouping around the field does not hide it from the rule check.
        let expr = normalize_filter("(rate) > 5", &rules, Some(&dt)).unwrap();
        let Expression::Comparison { left, .. } = expr else {
            panic!("expected comparison");
        };
        let Expression::Parenthesized { expression } = *left else {
            panic!("expected grouped left side");
        };
        let Expression::Identifier(id) = *expression else {
            panic!("expected identifier");
        };
        assert!(id.binding.is_some());

        // The whitelist still applies through the grouping.
        let mut strict = FilterRules::new();
        strict.set("rate", FilterRule::new().allow_spec("=").unwrap());
        let err = normalize_filter("(rate) > 5", &strict, Some(&dt)).unwrap_err();
        assert!(matches!(err, Error::UnacceptedFilterOperation { .. }));
    }

    #[test]
    fn test_recurses_into_groups_and_negation() {
        let mut rules = FilterRules::new();
        rules.set("rate", FilterRule::new().allow_spec("=").unwrap());
        let dt = hotel_type();

        // The whitelist is enforced inside parens and under not.
        let err = normalize_filter("not (rate > 1)", &rules, Some(&dt)).unwrap_err();
        assert!(matches!(err, Error::UnacceptedFilterOperation { .. }));
    }

    #[test]
    fn test_input_tree_not_mutated() {
        let rules = open_rules();
        let dt = hotel_type();
        let original = parse("rate > 5").unwrap();
        let snapshot = original.clone();

        let normalized = Normalizer::new(&rules, Some(&dt))
            .normalize(original.clone())
            .unwrap();
        assert_eq!(original, snapshot);
        assert_ne!(normalized, original); // binding was attached on the copy
    }
}
