//! Visibility rules for partitioned records.
//!
//! A visibility rule is a small boolean expression over partition names:
//!
//! ```text
//! Expr := Item (("AND" | "OR") Item)*
//! Item := QuotedString | "anyOf(" List ")" | "allOf(" List ")"
//! List := Item ("," Item)*
//! ```
//!
//! Partition names are double-quoted literals. `AND` binds tighter than `OR`,
//! and operators of equal precedence associate to the left. Keywords are
//! case-sensitive and whitespace between tokens is ignored.
//!
//! A rule is parsed once and then evaluated against candidate partition sets:
//! a literal is true iff it is a member of the set.
//!
//! ```
//! use ledgerstate_rules::VisibilityRule;
//!
//! let rule = VisibilityRule::parse(r#""buyer" OR allOf("seller", "auditor")"#).unwrap();
//! assert!(rule.matches("buyer"));
//! assert!(!rule.matches("seller"));
//! assert!(rule.evaluate(&["seller", "auditor"]));
//! assert_eq!(rule.partitions(), ["buyer", "seller", "auditor"]);
//! ```

mod error;
mod lexer;
mod parser;
mod rule;

pub use error::RuleSyntaxError;
pub use rule::{RuleExpr, VisibilityRule};
