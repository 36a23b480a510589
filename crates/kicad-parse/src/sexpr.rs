//! S-expression tree built from the token stream.
//!
//! Every `Node::List` corresponds to exactly one matched paren pair. When a
//! file holds several sibling top-level forms they are collected under one
//! synthetic root list so callers always receive a single node.

use std::fmt;

use crate::error::ParseError;
use crate::tokenizer::{Token, Tokenizer};

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Atom(String),
    Number(f64),
    Str(String),
    List(Vec<Node>),
}

impl Node {
    /// The leading atom of a list (its tag), if any.
    pub fn tag(&self) -> Option<&str> {
        match self {
            Node::List(items) => match items.first() {
                Some(Node::Atom(s)) => Some(s.as_str()),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn items(&self) -> &[Node] {
        match self {
            Node::List(items) => items,
            _ => &[],
        }
    }

    pub fn as_atom(&self) -> Option<&str> {
        match self {
            Node::Atom(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Node::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            Node::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Node::List(_))
    }

    /// Count of list nodes in this subtree, self included.
    pub fn list_count(&self) -> usize {
        match self {
            Node::List(items) => 1 + items.iter().map(Node::list_count).sum::<usize>(),
            _ => 0,
        }
    }
}

/// Renders the node back to s-expression text, used in error messages.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Atom(s) => write!(f, "{s}"),
            Node::Number(n) => write!(f, "{n}"),
            Node::Str(s) => write!(f, "\"{s}\""),
            Node::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
        }
    }
}

struct TreeBuilder<'a> {
    tokens: Tokenizer<'a>,
}

impl<'a> TreeBuilder<'a> {
    fn parse_list(&mut self) -> Result<Node, ParseError> {
        let mut items = Vec::new();
        loop {
            match self.tokens.next() {
                Some(Ok(Token::Close)) => return Ok(Node::List(items)),
                Some(Ok(Token::Open)) => items.push(self.parse_list()?),
                Some(Ok(Token::Atom(s))) => items.push(Node::Atom(s)),
                Some(Ok(Token::Number(n))) => items.push(Node::Number(n)),
                Some(Ok(Token::Str(s))) => items.push(Node::Str(s)),
                Some(Err(e)) => return Err(e),
                None => {
                    return Err(ParseError::UnexpectedEof {
                        expected: "')'".to_string(),
                    })
                }
            }
        }
    }
}

/// Parse source text into a single node. Multiple sibling top-level forms
/// become children of a synthetic root list.
pub fn parse(text: &str) -> Result<Node, ParseError> {
    let mut builder = TreeBuilder {
        tokens: Tokenizer::new(text),
    };
    let mut forms = Vec::new();
    loop {
        match builder.tokens.next() {
            Some(Ok(Token::Open)) => forms.push(builder.parse_list()?),
            Some(Ok(tok)) => {
                return Err(ParseError::UnexpectedToken {
                    expected: "'('".to_string(),
                    found: format!("{tok:?}"),
                })
            }
            Some(Err(e)) => return Err(e),
            None => break,
        }
    }
    match forms.len() {
        0 => Err(ParseError::UnexpectedEof {
            expected: "'('".to_string(),
        }),
        1 => Ok(forms.pop().unwrap()),
        _ => Ok(Node::List(forms)),
    }
}
