use crate::core::models::filter::{FilterOperator, FilterSpec, FilterToken};

/// Suffix marking a negated field in a filter spec.
pub const NEGATION_SUFFIX: &str = "__not";

/// Build the backend filter spec from user tokens.
///
/// `=` maps to the field name, `!=` to `{field}__not`. Tokens that resolve
/// to the same key overwrite each other in order: the last one wins.
/// Tokens are assumed well-formed; parsing rejects invalid ones.
pub fn build_filter_spec(tokens: &[FilterToken]) -> FilterSpec {
    let mut spec = FilterSpec::new();
    for token in tokens {
        let field = match token.operator {
            FilterOperator::Equals => token.property.key().to_string(),
            FilterOperator::NotEquals => format!("{}{NEGATION_SUFFIX}", token.property.key()),
        };
        spec.insert(field, token.value.clone());
    }
    spec
}
