use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::core::errors::HsmError;

/// Key properties a filter token can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterProperty {
    Label,
    KeyClass,
    KeyType,
    KeyId,
    Token,
    Private,
    Sensitive,
    Extractable,
    Local,
    Modifiable,
    Destroyable,
}

impl FilterProperty {
    pub const ALL: [FilterProperty; 11] = [
        FilterProperty::Label,
        FilterProperty::KeyClass,
        FilterProperty::KeyType,
        FilterProperty::KeyId,
        FilterProperty::Token,
        FilterProperty::Private,
        FilterProperty::Sensitive,
        FilterProperty::Extractable,
        FilterProperty::Local,
        FilterProperty::Modifiable,
        FilterProperty::Destroyable,
    ];

    /// Field name as it appears in key records and filter specs.
    pub fn key(&self) -> &'static str {
        match self {
            FilterProperty::Label => "label",
            FilterProperty::KeyClass => "key_class",
            FilterProperty::KeyType => "key_type",
            FilterProperty::KeyId => "key_id",
            FilterProperty::Token => "token",
            FilterProperty::Private => "private",
            FilterProperty::Sensitive => "sensitive",
            FilterProperty::Extractable => "extractable",
            FilterProperty::Local => "local",
            FilterProperty::Modifiable => "modifiable",
            FilterProperty::Destroyable => "destroyable",
        }
    }

    pub fn is_boolean(&self) -> bool {
        !matches!(
            self,
            FilterProperty::Label
                | FilterProperty::KeyClass
                | FilterProperty::KeyType
                | FilterProperty::KeyId
        )
    }

    /// Boolean attributes only support equality.
    pub fn supports(&self, operator: FilterOperator) -> bool {
        match operator {
            FilterOperator::Equals => true,
            FilterOperator::NotEquals => !self.is_boolean(),
        }
    }
}

impl fmt::Display for FilterProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for FilterProperty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilterProperty::ALL
            .into_iter()
            .find(|p| p.key() == s)
            .ok_or_else(|| format!("unknown property '{s}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOperator {
    Equals,
    NotEquals,
}

impl FilterOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            FilterOperator::Equals => "=",
            FilterOperator::NotEquals => "!=",
        }
    }
}

/// One `(property, operator, value)` condition. Tokens combine with AND.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilterToken {
    pub property: FilterProperty,
    pub operator: FilterOperator,
    pub value: String,
}

impl FilterToken {
    pub fn new(
        property: FilterProperty,
        operator: FilterOperator,
        value: impl Into<String>,
    ) -> Self {
        Self {
            property,
            operator,
            value: value.into(),
        }
    }
}

impl fmt::Display for FilterToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.property, self.operator.symbol(), self.value)
    }
}

impl FromStr for FilterToken {
    type Err = HsmError;

    /// Parse `PROPERTY=VALUE` or `PROPERTY!=VALUE`, rejecting combinations
    /// the key listing does not offer.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: String| HsmError::InvalidFilter {
            token: s.to_string(),
            reason,
        };

        // The operator is the first `=`, optionally preceded by `!`. Values
        // are taken verbatim and may contain either.
        let Some((name, value)) = s.split_once('=') else {
            return Err(invalid("missing operator".into()));
        };
        let (name, operator) = match name.strip_suffix('!') {
            Some(name) => (name, FilterOperator::NotEquals),
            None => (name, FilterOperator::Equals),
        };

        let property: FilterProperty = name.trim().parse().map_err(invalid)?;

        if !property.supports(operator) {
            return Err(invalid(format!(
                "'{}' is not supported for {property}",
                operator.symbol()
            )));
        }
        if value.is_empty() {
            return Err(invalid("empty value".into()));
        }
        if property.is_boolean() && value != "true" && value != "false" {
            return Err(invalid(format!("{property} must be true or false")));
        }

        Ok(FilterToken::new(property, operator, value))
    }
}

/// Backend-facing filter: field name (suffixed `__not` for negation) to value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct FilterSpec(BTreeMap<String, String>);

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `field` to `value`, replacing any earlier value.
    pub fn insert(&mut self, field: String, value: String) {
        self.0.insert(field, value);
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
