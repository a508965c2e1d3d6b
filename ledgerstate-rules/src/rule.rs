//! Parsed visibility rules.

use crate::error::RuleSyntaxError;
use crate::parser::Parser;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Node of a parsed rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleExpr {
    /// A quoted partition name.
    Partition(String),
    /// True iff at least one item is true.
    AnyOf(Vec<RuleExpr>),
    /// True iff every item is true.
    AllOf(Vec<RuleExpr>),
    And(Box<RuleExpr>, Box<RuleExpr>),
    Or(Box<RuleExpr>, Box<RuleExpr>),
}

impl RuleExpr {
    /// Evaluates the expression using `is_member` to test literals.
    pub fn evaluate_with<F>(&self, is_member: &F) -> bool
    where
        F: Fn(&str) -> bool,
    {
        match self {
            RuleExpr::Partition(name) => is_member(name),
            RuleExpr::AnyOf(items) => items.iter().any(|item| item.evaluate_with(is_member)),
            RuleExpr::AllOf(items) => items.iter().all(|item| item.evaluate_with(is_member)),
            RuleExpr::And(left, right) => {
                left.evaluate_with(is_member) && right.evaluate_with(is_member)
            }
            RuleExpr::Or(left, right) => {
                left.evaluate_with(is_member) || right.evaluate_with(is_member)
            }
        }
    }

    fn collect_literals<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            RuleExpr::Partition(name) => out.push(name),
            RuleExpr::AnyOf(items) | RuleExpr::AllOf(items) => {
                for item in items {
                    item.collect_literals(out);
                }
            }
            RuleExpr::And(left, right) | RuleExpr::Or(left, right) => {
                left.collect_literals(out);
                right.collect_literals(out);
            }
        }
    }
}

/// An immutable, parsed visibility rule.
///
/// Equality compares the parsed tree, so rules that differ only in
/// whitespace are equal.
#[derive(Debug, Clone)]
pub struct VisibilityRule {
    source: String,
    root: RuleExpr,
}

impl VisibilityRule {
    /// Parses rule text. The whole input must match the grammar.
    pub fn parse(source: &str) -> Result<Self, RuleSyntaxError> {
        let root = Parser::parse(source)?;
        Ok(Self {
            source: source.to_string(),
            root,
        })
    }

    /// Returns the rule text as it was declared.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the parsed expression tree.
    #[must_use]
    pub fn root(&self) -> &RuleExpr {
        &self.root
    }

    /// Evaluates the rule against a set of candidate partitions.
    #[must_use]
    pub fn evaluate<S: AsRef<str>>(&self, candidates: &[S]) -> bool {
        self.root
            .evaluate_with(&|name: &str| candidates.iter().any(|c| c.as_ref() == name))
    }

    /// Evaluates the rule with `partition` as the sole candidate.
    #[must_use]
    pub fn matches(&self, partition: &str) -> bool {
        self.root.evaluate_with(&|name: &str| name == partition)
    }

    /// Every quoted literal, depth-first and left-to-right, duplicates kept.
    #[must_use]
    pub fn literals(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.root.collect_literals(&mut out);
        out
    }

    /// Distinct literals in order of first appearance.
    #[must_use]
    pub fn partitions(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for name in self.literals() {
            if !out.contains(&name) {
                out.push(name);
            }
        }
        out
    }
}

impl PartialEq for VisibilityRule {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root
    }
}

impl Eq for VisibilityRule {}

impl fmt::Display for VisibilityRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl FromStr for VisibilityRule {
    type Err = RuleSyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for VisibilityRule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

impl<'de> Deserialize<'de> for VisibilityRule {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        Self::parse(&source).map_err(serde::de::Error::custom)
    }
}
