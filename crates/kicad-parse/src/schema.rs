//! Declarative schema binding for tagged s-expression forms.
//!
//! An [`ExprParser`] wraps one list node and hands out its elements to a
//! sequence of descriptor calls in a single pass. Positional descriptors are
//! strictly ordered; named descriptors (`pair`, `flag`, `object`,
//! `collection`, `dict`) locate their form by tag among the elements not yet
//! consumed, so named sub-forms may appear in any order and interleaved with
//! forms belonging to other descriptors. Consumption is tracked per element,
//! never partially: a descriptor that finds no match leaves every element
//! available for the next one.

use std::collections::HashMap;

use crate::error::ParseError;
use crate::sexpr::Node;

/// Conversion from a single leaf element.
pub trait FromValue: Sized {
    fn from_node(node: &Node) -> Option<Self>;
    fn kind() -> &'static str;
}

impl FromValue for String {
    fn from_node(node: &Node) -> Option<Self> {
        match node {
            Node::Atom(s) | Node::Str(s) => Some(s.clone()),
            Node::Number(n) => Some(n.to_string()),
            Node::List(_) => None,
        }
    }
    fn kind() -> &'static str {
        "string"
    }
}

impl FromValue for f64 {
    fn from_node(node: &Node) -> Option<Self> {
        match node {
            Node::Number(n) => Some(*n),
            Node::Atom(s) | Node::Str(s) => s.parse().ok(),
            Node::List(_) => None,
        }
    }
    fn kind() -> &'static str {
        "number"
    }
}

macro_rules! int_from_value {
    ($($t:ty),*) => {$(
        impl FromValue for $t {
            fn from_node(node: &Node) -> Option<Self> {
                f64::from_node(node).map(|n| n as $t)
            }
            fn kind() -> &'static str {
                "integer"
            }
        }
    )*};
}
int_from_value!(i32, i64, u32, u64, usize);

impl FromValue for bool {
    fn from_node(node: &Node) -> Option<Self> {
        match node.as_atom() {
            Some("yes") | Some("true") => Some(true),
            Some("no") | Some("false") => Some(false),
            _ => None,
        }
    }
    fn kind() -> &'static str {
        "yes/no"
    }
}

/// Types built from one tagged sub-form.
pub trait FromSExpr: Sized {
    fn from_expr(parser: ExprParser<'_>) -> Result<Self, ParseError>;
}

pub struct ExprParser<'a> {
    context: String,
    items: &'a [Node],
    taken: Vec<bool>,
    pos: usize,
}

impl<'a> ExprParser<'a> {
    pub fn new(node: &'a Node) -> Result<Self, ParseError> {
        match node {
            Node::List(items) => Ok(Self {
                context: node.tag().unwrap_or("?").to_string(),
                items,
                taken: vec![false; items.len()],
                pos: 0,
            }),
            other => Err(ParseError::Expected {
                context: "document".to_string(),
                expected: "list".to_string(),
                found: other.to_string(),
            }),
        }
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    fn take(&mut self, index: usize) -> &'a Node {
        self.taken[index] = true;
        let items = self.items;
        &items[index]
    }

    fn next_positional_index(&self) -> Option<usize> {
        (self.pos..self.items.len()).find(|&i| !self.taken[i])
    }

    /// Scan unconsumed elements for a list tagged with any of `tags`.
    fn find_tagged(&self, tags: &[&str]) -> Option<usize> {
        (0..self.items.len()).find(|&i| {
            !self.taken[i]
                && self.items[i]
                    .tag()
                    .is_some_and(|t| tags.contains(&t))
        })
    }

    /// Consume the leading tag atom identifying this form.
    pub fn start(&mut self, tag: &str) -> Result<(), ParseError> {
        self.start_any(&[tag]).map(|_| ())
    }

    /// Like [`start`](Self::start) for forms with historical tag aliases
    /// (`footprint` vs `module`). Returns the tag actually present.
    pub fn start_any(&mut self, tags: &[&str]) -> Result<&'a str, ParseError> {
        match self.items.first().and_then(Node::as_atom) {
            Some(t) if tags.contains(&t) => {
                self.taken[0] = true;
                self.pos = 1;
                Ok(t)
            }
            _ => Err(ParseError::Expected {
                context: self.context.clone(),
                expected: format!("tag {}", tags.join("|")),
                found: self
                    .items
                    .first()
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "empty list".to_string()),
            }),
        }
    }

    /// Required bare value at the current position.
    pub fn positional<T: FromValue>(&mut self, what: &str) -> Result<T, ParseError> {
        self.maybe_positional().ok_or_else(|| ParseError::Expected {
            context: self.context.clone(),
            expected: format!("{what} ({})", T::kind()),
            found: match self.next_positional_index() {
                Some(i) => self.items[i].to_string(),
                None => "end of list".to_string(),
            },
        })
    }

    /// Optional bare value at the current position; no consumption when the
    /// next element is missing, a list, or of the wrong kind.
    pub fn maybe_positional<T: FromValue>(&mut self) -> Option<T> {
        let index = self.next_positional_index()?;
        if self.items[index].is_list() {
            return None;
        }
        let value = T::from_node(&self.items[index])?;
        self.take(index);
        self.pos = index + 1;
        Some(value)
    }

    /// Named `(name value)` pair, located anywhere among unconsumed elements.
    pub fn pair<T: FromValue>(&mut self, name: &str) -> Result<Option<T>, ParseError> {
        let Some(index) = self.find_tagged(&[name]) else {
            return Ok(None);
        };
        let node = self.take(index);
        let value = node.items().get(1).and_then(T::from_node);
        match value {
            Some(v) => Ok(Some(v)),
            None => Err(ParseError::Expected {
                context: self.context.clone(),
                expected: format!("({name} <{}>)", T::kind()),
                found: node.to_string(),
            }),
        }
    }

    pub fn expect_pair<T: FromValue>(&mut self, name: &str) -> Result<T, ParseError> {
        self.pair(name)?.ok_or_else(|| ParseError::MissingForm {
            context: self.context.clone(),
            tag: name.to_string(),
        })
    }

    pub fn pair_or<T: FromValue>(&mut self, name: &str, default: T) -> Result<T, ParseError> {
        Ok(self.pair(name)?.unwrap_or(default))
    }

    /// Presence-of-atom flag among unconsumed elements.
    pub fn flag(&mut self, name: &str) -> bool {
        let found = (0..self.items.len())
            .find(|&i| !self.taken[i] && self.items[i].as_atom() == Some(name));
        match found {
            Some(i) => {
                self.take(i);
                true
            }
            None => false,
        }
    }

    /// Optional nested object from a tagged sub-form.
    pub fn object<T: FromSExpr>(&mut self, name: &str) -> Result<Option<T>, ParseError> {
        self.object_with(name, T::from_expr)
    }

    pub fn expect_object<T: FromSExpr>(&mut self, name: &str) -> Result<T, ParseError> {
        self.object(name)?.ok_or_else(|| ParseError::MissingForm {
            context: self.context.clone(),
            tag: name.to_string(),
        })
    }

    /// Nested object built by an explicit constructor, for types whose tag
    /// varies by position (`start`, `end`, `mid`, ...).
    pub fn object_with<T>(
        &mut self,
        name: &str,
        build: impl FnOnce(ExprParser<'a>) -> Result<T, ParseError>,
    ) -> Result<Option<T>, ParseError> {
        let Some(index) = self.find_tagged(&[name]) else {
            return Ok(None);
        };
        let node = self.take(index);
        build(ExprParser::new(node)?).map(Some)
    }

    /// Homogeneous values inside one tagged list: `(layers F.Cu B.Cu)`.
    pub fn list_of<T: FromValue>(&mut self, name: &str) -> Result<Vec<T>, ParseError> {
        let Some(index) = self.find_tagged(&[name]) else {
            return Ok(Vec::new());
        };
        let node = self.take(index);
        let mut out = Vec::new();
        for child in &node.items()[1..] {
            match T::from_node(child) {
                Some(v) => out.push(v),
                None => {
                    return Err(ParseError::Expected {
                        context: format!("{}.{name}", self.context),
                        expected: T::kind().to_string(),
                        found: child.to_string(),
                    })
                }
            }
        }
        Ok(out)
    }

    /// Every sub-form tagged `tag`, in source order.
    pub fn collection<T: FromSExpr>(&mut self, tag: &str) -> Result<Vec<T>, ParseError> {
        self.collection_map(&[tag], |_, p| T::from_expr(p))
    }

    /// Polymorphic collection: every sub-form tagged with any of `tags`,
    /// preserving the order encountered in the source across variants.
    pub fn collection_map<T>(
        &mut self,
        tags: &[&str],
        mut build: impl FnMut(&str, ExprParser<'a>) -> Result<T, ParseError>,
    ) -> Result<Vec<T>, ParseError> {
        let mut out = Vec::new();
        while let Some(index) = self.find_tagged(tags) {
            let node = self.take(index);
            let Some(tag) = node.tag() else { continue };
            out.push(build(tag, ExprParser::new(node)?)?);
        }
        Ok(out)
    }

    /// Like [`collection`](Self::collection) but keyed by a field of the
    /// parsed element. A duplicate key overwrites the earlier entry.
    pub fn dict<T: FromSExpr>(
        &mut self,
        tag: &str,
        key: impl Fn(&T) -> String,
    ) -> Result<HashMap<String, T>, ParseError> {
        let mut out = HashMap::new();
        for item in self.collection::<T>(tag)? {
            out.insert(key(&item), item);
        }
        Ok(out)
    }

    /// Silently discard known-but-unmodeled sub-forms.
    pub fn ignore(&mut self, tags: &[&str]) {
        while self.find_tagged(tags).map(|i| self.take(i)).is_some() {}
    }

    /// Raw access to the unconsumed elements, for manual parsers that drop
    /// down to the [`Cursor`](crate::cursor::Cursor) level.
    pub fn remaining(&self) -> impl Iterator<Item = &'a Node> + '_ {
        let items = self.items;
        self.taken
            .iter()
            .enumerate()
            .filter(|(_, taken)| !**taken)
            .map(move |(i, _)| &items[i])
    }

    pub fn remaining_count(&self) -> usize {
        self.taken.iter().filter(|t| !**t).count()
    }

    /// Warn about anything no descriptor recognized. Unknown forms degrade
    /// to a warning so newer files still parse everything this schema knows.
    pub fn finish(self) {
        for node in self.remaining() {
            log::warn!(
                "ignoring unrecognized form in ({} ...): {}",
                self.context,
                node
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sexpr::parse;

    #[test]
    fn test_positional_then_pairs() {
        let node = parse("(pad \"1\" smd rect (size 1 2) (at 0.5 0.5))").unwrap();
        let mut p = ExprParser::new(&node).unwrap();
        p.start("pad").unwrap();
        let number: String = p.positional("pad number").unwrap();
        let kind: String = p.positional("pad type").unwrap();
        assert_eq!(number, "1");
        assert_eq!(kind, "smd");
    }

    #[test]
    fn test_named_fields_are_order_independent() {
        let permutations = [
            "(gr_line (start 0 0) (end 1 1) (width 0.1) (layer F.Cu))",
            "(gr_line (layer F.Cu) (width 0.1) (end 1 1) (start 0 0))",
            "(gr_line (width 0.1) (start 0 0) (layer F.Cu) (end 1 1))",
        ];
        for src in permutations {
            let node = parse(src).unwrap();
            let mut p = ExprParser::new(&node).unwrap();
            p.start("gr_line").unwrap();
            assert_eq!(p.pair::<f64>("width").unwrap(), Some(0.1));
            assert_eq!(p.pair::<String>("layer").unwrap(), Some("F.Cu".into()));
            assert_eq!(p.remaining_count(), 2);
        }
    }

    #[test]
    fn test_positional_is_strictly_ordered() {
        let node = parse("(at 1 2 90)").unwrap();
        let mut p = ExprParser::new(&node).unwrap();
        p.start("at").unwrap();
        assert_eq!(p.positional::<f64>("x").unwrap(), 1.0);
        assert_eq!(p.positional::<f64>("y").unwrap(), 2.0);
        assert_eq!(p.maybe_positional::<f64>(), Some(90.0));
        assert_eq!(p.maybe_positional::<f64>(), None);
    }

    #[test]
    fn test_flag() {
        let node = parse("(footprint \"X\" locked (layer F.Cu))").unwrap();
        let mut p = ExprParser::new(&node).unwrap();
        p.start("footprint").unwrap();
        let _: String = p.positional("library link").unwrap();
        assert!(p.flag("locked"));
        assert!(!p.flag("placed"));
    }

    #[test]
    fn test_flag_does_not_block_positional() {
        // The optional rotation is absent; the locked flag after it must
        // not be mistaken for a positional value.
        let node = parse("(at 1 2)").unwrap();
        let mut p = ExprParser::new(&node).unwrap();
        p.start("at").unwrap();
        assert_eq!(p.positional::<f64>("x").unwrap(), 1.0);
        assert_eq!(p.positional::<f64>("y").unwrap(), 2.0);
        assert_eq!(p.maybe_positional::<f64>(), None);
    }

    struct Named(String);

    impl FromSExpr for Named {
        fn from_expr(mut p: ExprParser<'_>) -> Result<Self, ParseError> {
            p.start("net")?;
            let _number: u32 = p.positional("number")?;
            let name: String = p.positional("name")?;
            Ok(Named(name))
        }
    }

    #[test]
    fn test_collection_preserves_source_order() {
        let node =
            parse("(root (net 0 \"a\") (other x) (net 1 \"b\") (net 2 \"c\"))").unwrap();
        let mut p = ExprParser::new(&node).unwrap();
        p.start("root").unwrap();
        let nets: Vec<Named> = p.collection("net").unwrap();
        let names: Vec<&str> = nets.iter().map(|n| n.0.as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);
        // The interleaved unknown form stays for someone else.
        assert_eq!(p.remaining_count(), 1);
    }

    #[test]
    fn test_collection_map_preserves_order_across_tags() {
        let node = parse("(fp (a 1) (b 2) (a 3))").unwrap();
        let mut p = ExprParser::new(&node).unwrap();
        p.start("fp").unwrap();
        let tags: Vec<String> = p
            .collection_map(&["a", "b"], |tag, _| Ok(tag.to_string()))
            .unwrap();
        assert_eq!(tags, ["a", "b", "a"]);
    }

    #[test]
    fn test_dict_last_wins() {
        let node = parse("(root (net 5 \"first\") (net 5 \"second\"))").unwrap();
        let mut p = ExprParser::new(&node).unwrap();
        p.start("root").unwrap();
        let map = p.dict::<Named>("net", |_| "5".to_string()).unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map["5"].0, "second");
    }

    #[test]
    fn test_missing_required_pair_is_fatal() {
        let node = parse("(kicad_pcb (generator pcbnew))").unwrap();
        let mut p = ExprParser::new(&node).unwrap();
        p.start("kicad_pcb").unwrap();
        assert!(matches!(
            p.expect_pair::<u64>("version"),
            Err(ParseError::MissingForm { .. })
        ));
    }

    #[test]
    fn test_wrong_start_tag_is_fatal() {
        let node = parse("(kicad_sch (version 1))").unwrap();
        let mut p = ExprParser::new(&node).unwrap();
        assert!(p.start("kicad_pcb").is_err());
    }
}
