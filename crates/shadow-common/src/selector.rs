//! Label and field selectors
//!
//! Conjunctive label predicates evaluated either in process (memory store)
//! or rendered to the canonical selector string for a remote store.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Selection operator for one requirement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    /// Label equals the single value
    Equals,
    /// Label differs from the single value
    NotEquals,
    /// Label is one of the values
    In,
    /// Label is none of the values
    NotIn,
    /// Label key is present
    Exists,
    /// Label key is absent
    DoesNotExist,
}

/// One clause of a conjunctive selector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    /// Label key
    pub key: String,
    /// Operator applied to the key
    pub operator: Operator,
    /// Operand values; empty for Exists/DoesNotExist
    pub values: Vec<String>,
}

impl Requirement {
    /// Equality requirement
    pub fn equals(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            operator: Operator::Equals,
            values: vec![value.into()],
        }
    }

    fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        let value = labels.get(&self.key);
        match self.operator {
            Operator::Equals => value.map(String::as_str) == self.values.first().map(String::as_str),
            Operator::NotEquals => value.map(String::as_str) != self.values.first().map(String::as_str),
            Operator::In => value.map_or(false, |v| self.values.iter().any(|w| w == v)),
            Operator::NotIn => value.map_or(true, |v| !self.values.iter().any(|w| w == v)),
            Operator::Exists => value.is_some(),
            Operator::DoesNotExist => value.is_none(),
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operator {
            Operator::Equals => write!(f, "{}={}", self.key, self.values.first().map(String::as_str).unwrap_or("")),
            Operator::NotEquals => write!(f, "{}!={}", self.key, self.values.first().map(String::as_str).unwrap_or("")),
            Operator::In => write!(f, "{} in ({})", self.key, self.values.join(",")),
            Operator::NotIn => write!(f, "{} notin ({})", self.key, self.values.join(",")),
            Operator::Exists => write!(f, "{}", self.key),
            Operator::DoesNotExist => write!(f, "!{}", self.key),
        }
    }
}

/// Conjunction of [`Requirement`]s; the empty selector matches everything
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selector {
    /// ANDed clauses
    pub requirements: Vec<Requirement>,
}

impl Selector {
    /// Selector matching every label set
    pub fn everything() -> Self {
        Self::default()
    }

    /// Append a clause, consuming and returning self for chaining
    pub fn add(mut self, requirement: Requirement) -> Self {
        self.requirements.push(requirement);
        self
    }

    /// True when every clause matches the label set
    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.requirements.iter().all(|r| r.matches(labels))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.requirements.iter().map(ToString::to_string).collect();
        write!(f, "{}", rendered.join(","))
    }
}

/// One field-selector clause; only equality operators are defined for fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRequirement {
    /// Field path, e.g. `metadata.name`
    pub field: String,
    /// Equals or NotEquals
    pub operator: Operator,
    /// Operand
    pub value: String,
}

/// Conjunction of field requirements
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSelector {
    /// ANDed clauses
    pub requirements: Vec<FieldRequirement>,
}

impl FieldSelector {
    /// Select objects whose field equals the value
    pub fn name_equals(name: impl Into<String>) -> Self {
        Self {
            requirements: vec![FieldRequirement {
                field: "metadata.name".to_string(),
                operator: Operator::Equals,
                value: name.into(),
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn conjunction_semantics() {
        let sel = Selector::everything()
            .add(Requirement::equals("app", "web"))
            .add(Requirement {
                key: "tier".to_string(),
                operator: Operator::In,
                values: vec!["frontend".to_string(), "edge".to_string()],
            });

        assert!(sel.matches(&labels(&[("app", "web"), ("tier", "edge")])));
        assert!(!sel.matches(&labels(&[("app", "web"), ("tier", "db")])));
        assert!(!sel.matches(&labels(&[("tier", "edge")])));
    }

    #[test]
    fn empty_value_equality_requires_empty_label() {
        let sel = Selector::everything().add(Requirement::equals("ns", ""));
        assert!(sel.matches(&labels(&[("ns", "")])));
        assert!(!sel.matches(&labels(&[("ns", "default")])));
        // absent key is not the same as empty value
        assert!(!sel.matches(&labels(&[])));
    }

    #[test]
    fn canonical_rendering() {
        let sel = Selector::everything()
            .add(Requirement::equals("a", "1"))
            .add(Requirement {
                key: "b".to_string(),
                operator: Operator::NotIn,
                values: vec!["x".to_string(), "y".to_string()],
            })
            .add(Requirement {
                key: "c".to_string(),
                operator: Operator::Exists,
                values: vec![],
            });
        assert_eq!(sel.to_string(), "a=1,b notin (x,y),c");
    }
}
