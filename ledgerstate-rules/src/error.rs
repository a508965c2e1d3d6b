//! Error type for rule parsing.

use thiserror::Error;

/// A visibility rule did not match the rule grammar.
///
/// Parsing accepts only complete matches, so trailing input is an error too.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid visibility rule `{input}` at offset {offset}: {message}")]
pub struct RuleSyntaxError {
    /// The rule text as given.
    pub input: String,
    /// Byte offset of the offending token.
    pub offset: usize,
    /// What the parser expected or found.
    pub message: String,
}

impl RuleSyntaxError {
    pub(crate) fn new(input: &str, offset: usize, message: impl Into<String>) -> Self {
        Self {
            input: input.to_string(),
            offset,
            message: message.into(),
        }
    }
}
