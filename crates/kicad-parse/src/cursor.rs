//! Forward-only cursor over one list node's children.
//!
//! `maybe_*` calls consume one element and advance on a match and leave the
//! cursor untouched otherwise, so a failed match can always be retried with
//! a different pattern at the same position. Speculation is expressed with
//! an explicit `save`/`restore` pair rather than index arithmetic.

use crate::error::ParseError;
use crate::sexpr::Node;

#[derive(Clone)]
pub struct Cursor<'a> {
    items: &'a [Node],
    index: usize,
}

/// Saved cursor position, restored with [`Cursor::restore`].
#[derive(Clone, Copy, Debug)]
pub struct Checkpoint(usize);

impl<'a> Cursor<'a> {
    pub fn new(node: &'a Node) -> Self {
        Self {
            items: node.items(),
            index: 0,
        }
    }

    pub fn from_items(items: &'a [Node]) -> Self {
        Self { items, index: 0 }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_done(&self) -> bool {
        self.index >= self.items.len()
    }

    pub fn peek(&self) -> Option<&'a Node> {
        self.items.get(self.index)
    }

    pub fn save(&self) -> Checkpoint {
        Checkpoint(self.index)
    }

    pub fn restore(&mut self, cp: Checkpoint) {
        self.index = cp.0;
    }

    fn advance(&mut self) {
        self.index += 1;
    }

    /// Remaining unconsumed elements.
    pub fn rest(&self) -> &'a [Node] {
        &self.items[self.index.min(self.items.len())..]
    }

    pub fn maybe_atom(&mut self, want: Option<&str>) -> Option<&'a str> {
        match self.peek()?.as_atom() {
            Some(s) if want.is_none() || want == Some(s) => {
                self.advance();
                Some(s)
            }
            _ => None,
        }
    }

    pub fn maybe_number(&mut self) -> Option<f64> {
        let n = self.peek()?.as_number()?;
        self.advance();
        Some(n)
    }

    pub fn maybe_string(&mut self) -> Option<&'a str> {
        let s = self.peek()?.as_string()?;
        self.advance();
        Some(s)
    }

    pub fn maybe_list(&mut self) -> Option<Cursor<'a>> {
        match self.peek()? {
            node @ Node::List(_) => {
                self.advance();
                Some(Cursor::new(node))
            }
            _ => None,
        }
    }

    /// Accept the next element only if it is a list tagged `name`. The
    /// returned sub-cursor is positioned after the tag. On mismatch the
    /// outer cursor does not move.
    pub fn maybe_expr(&mut self, name: &str) -> Option<Cursor<'a>> {
        let cp = self.save();
        let mut sub = self.maybe_list()?;
        if sub.maybe_atom(Some(name)).is_some() {
            Some(sub)
        } else {
            self.restore(cp);
            None
        }
    }

    fn describe_next(&self) -> String {
        match self.peek() {
            Some(node) => node.to_string(),
            None => "end of list".to_string(),
        }
    }

    fn err(&self, context: &str, expected: &str) -> ParseError {
        ParseError::Expected {
            context: context.to_string(),
            expected: expected.to_string(),
            found: self.describe_next(),
        }
    }

    pub fn expect_atom(&mut self, context: &str, want: Option<&str>) -> Result<&'a str, ParseError> {
        self.maybe_atom(want).ok_or_else(|| {
            let expected = match want {
                Some(w) => format!("atom {w}"),
                None => "atom".to_string(),
            };
            self.err(context, &expected)
        })
    }

    pub fn expect_number(&mut self, context: &str) -> Result<f64, ParseError> {
        self.maybe_number()
            .ok_or_else(|| self.err(context, "number"))
    }

    pub fn expect_string(&mut self, context: &str) -> Result<&'a str, ParseError> {
        self.maybe_string()
            .ok_or_else(|| self.err(context, "string"))
    }

    pub fn expect_list(&mut self, context: &str) -> Result<Cursor<'a>, ParseError> {
        self.maybe_list().ok_or_else(|| self.err(context, "list"))
    }

    pub fn expect_expr(&mut self, context: &str, name: &str) -> Result<Cursor<'a>, ParseError> {
        self.maybe_expr(name)
            .ok_or_else(|| self.err(context, &format!("({name} ...)")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sexpr::parse;

    #[test]
    fn test_leaf_acceptance() {
        let node = parse("(pad \"1\" smd 2.5)").unwrap();
        let mut c = Cursor::new(&node);
        assert_eq!(c.maybe_atom(Some("pad")), Some("pad"));
        assert_eq!(c.maybe_string(), Some("1"));
        assert_eq!(c.maybe_atom(None), Some("smd"));
        assert_eq!(c.maybe_number(), Some(2.5));
        assert!(c.is_done());
    }

    #[test]
    fn test_failed_maybe_does_not_advance() {
        let node = parse("(x 1 2)").unwrap();
        let mut c = Cursor::new(&node);
        let before = c.index();
        assert!(c.maybe_number().is_none());
        assert!(c.maybe_string().is_none());
        assert!(c.maybe_list().is_none());
        assert_eq!(c.index(), before);
        assert_eq!(c.maybe_atom(Some("x")), Some("x"));
    }

    #[test]
    fn test_maybe_expr_rolls_back_on_wrong_tag() {
        let node = parse("(root (at 1 2) (size 3 4))").unwrap();
        let mut c = Cursor::new(&node);
        c.maybe_atom(Some("root"));
        let before = c.index();
        assert!(c.maybe_expr("size").is_none());
        assert_eq!(c.index(), before);
        // A retry with the right name must see the same element.
        let mut at = c.maybe_expr("at").unwrap();
        assert_eq!(at.maybe_number(), Some(1.0));
        let mut size = c.maybe_expr("size").unwrap();
        assert_eq!(size.maybe_number(), Some(3.0));
    }

    #[test]
    fn test_expect_failures_are_fatal() {
        let node = parse("(root alpha)").unwrap();
        let mut c = Cursor::new(&node);
        c.maybe_atom(Some("root"));
        let err = c.expect_number("root").unwrap_err();
        assert!(err.to_string().contains("alpha"));
    }

    #[test]
    fn test_save_restore() {
        let node = parse("(a 1 2 3)").unwrap();
        let mut c = Cursor::new(&node);
        c.maybe_atom(Some("a"));
        let cp = c.save();
        assert_eq!(c.maybe_number(), Some(1.0));
        assert_eq!(c.maybe_number(), Some(2.0));
        c.restore(cp);
        assert_eq!(c.maybe_number(), Some(1.0));
    }
}
