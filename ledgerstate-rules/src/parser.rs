//! Recursive-descent parser producing a [`RuleExpr`] tree.

use crate::error::RuleSyntaxError;
use crate::lexer::{tokenize, Spanned, Token};
use crate::rule::RuleExpr;

pub(crate) struct Parser<'a> {
    input: &'a str,
    tokens: Vec<Spanned>,
    pos: usize,
}

impl<'a> Parser<'a> {
    pub(crate) fn parse(input: &'a str) -> Result<RuleExpr, RuleSyntaxError> {
        let tokens = tokenize(input)?;
        let mut parser = Parser {
            input,
            tokens,
            pos: 0,
        };
        let expr = parser.parse_or()?;
        if parser.current() != &Token::Eof {
            return Err(parser.unexpected("'AND', 'OR' or end of input"));
        }
        Ok(expr)
    }

    fn current(&self) -> &Token {
        &self.tokens[self.pos].token
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
    }

    fn expect(&mut self, expected: Token) -> Result<(), RuleSyntaxError> {
        if self.current() == &expected {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(&expected.describe()))
        }
    }

    fn unexpected(&self, expected: &str) -> RuleSyntaxError {
        let found = &self.tokens[self.pos];
        RuleSyntaxError::new(
            self.input,
            found.offset,
            format!("expected {expected}, found {}", found.token.describe()),
        )
    }

    // AND binds tighter than OR.
    fn parse_or(&mut self) -> Result<RuleExpr, RuleSyntaxError> {
        let mut left = self.parse_and()?;
        while self.current() == &Token::Or {
            self.advance();
            let right = self.parse_and()?;
            left = RuleExpr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<RuleExpr, RuleSyntaxError> {
        let mut left = self.parse_item()?;
        while self.current() == &Token::And {
            self.advance();
            let right = self.parse_item()?;
            left = RuleExpr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_item(&mut self) -> Result<RuleExpr, RuleSyntaxError> {
        match self.current().clone() {
            Token::Quoted(name) => {
                self.advance();
                Ok(RuleExpr::Partition(name))
            }
            Token::AnyOf => {
                self.advance();
                self.parse_list().map(RuleExpr::AnyOf)
            }
            Token::AllOf => {
                self.advance();
                self.parse_list().map(RuleExpr::AllOf)
            }
            _ => Err(self.unexpected("a quoted partition name, 'anyOf' or 'allOf'")),
        }
    }

    fn parse_list(&mut self) -> Result<Vec<RuleExpr>, RuleSyntaxError> {
        self.expect(Token::LParen)?;
        let mut items = vec![self.parse_item()?];
        while self.current() == &Token::Comma {
            self.advance();
            items.push(self.parse_item()?);
        }
        self.expect(Token::RParen)?;
        Ok(items)
    }
}
