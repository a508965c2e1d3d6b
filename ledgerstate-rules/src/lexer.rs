//! Tokenizer for rule text.

use crate::error::RuleSyntaxError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    Quoted(String),
    AnyOf,
    AllOf,
    And,
    Or,
    LParen,
    RParen,
    Comma,
    Eof,
}

impl Token {
    pub(crate) fn describe(&self) -> String {
        match self {
            Token::Quoted(name) => format!("partition {name:?}"),
            Token::AnyOf => "'anyOf'".into(),
            Token::AllOf => "'allOf'".into(),
            Token::And => "'AND'".into(),
            Token::Or => "'OR'".into(),
            Token::LParen => "'('".into(),
            Token::RParen => "')'".into(),
            Token::Comma => "','".into(),
            Token::Eof => "end of input".into(),
        }
    }
}

/// A token together with the byte offset it starts at.
#[derive(Debug, Clone)]
pub(crate) struct Spanned {
    pub token: Token,
    pub offset: usize,
}

pub(crate) fn tokenize(input: &str) -> Result<Vec<Spanned>, RuleSyntaxError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(offset, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let single = match c {
            '(' => Some(Token::LParen),
            ')' => Some(Token::RParen),
            ',' => Some(Token::Comma),
            _ => None,
        };
        if let Some(token) = single {
            chars.next();
            tokens.push(Spanned { token, offset });
            continue;
        }

        if c == '"' {
            chars.next();
            let mut name = String::new();
            let mut closed = false;
            for (_, c) in chars.by_ref() {
                if c == '"' {
                    closed = true;
                    break;
                }
                name.push(c);
            }
            if !closed {
                return Err(RuleSyntaxError::new(input, offset, "unterminated quoted partition name"));
            }
            if name.is_empty() {
                return Err(RuleSyntaxError::new(input, offset, "empty partition name"));
            }
            tokens.push(Spanned {
                token: Token::Quoted(name),
                offset,
            });
            continue;
        }

        if c.is_ascii_alphabetic() {
            let mut word = String::new();
            while let Some(&(_, c)) = chars.peek() {
                if !c.is_ascii_alphanumeric() {
                    break;
                }
                word.push(c);
                chars.next();
            }
            let token = match word.as_str() {
                "AND" => Token::And,
                "OR" => Token::Or,
                "anyOf" => Token::AnyOf,
                "allOf" => Token::AllOf,
                _ => {
                    return Err(RuleSyntaxError::new(
                        input,
                        offset,
                        format!("unknown keyword {word:?}"),
                    ));
                }
            };
            tokens.push(Spanned { token, offset });
            continue;
        }

        return Err(RuleSyntaxError::new(
            input,
            offset,
            format!("unexpected character {c:?}"),
        ));
    }

    tokens.push(Spanned {
        token: Token::Eof,
        offset: input.len(),
    });
    Ok(tokens)
}
