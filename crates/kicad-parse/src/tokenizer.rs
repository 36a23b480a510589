//! Lexer for the KiCad s-expression syntax.
//!
//! Grammar:
//!   sexpr  = '(' token* ')'
//!   string = '"' ([^"\\] | '\\' any)* '"'
//!   number = [+-]? [0-9]+ ('.' [0-9]*)?
//!   atom   = [^ \t\n\r()"]+
//!
//! Tokens are produced lazily; a bare word that looks numeric but does not
//! fully match the number grammar falls back to an atom.

use crate::error::ParseError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Open,
    Close,
    Atom(String),
    Number(f64),
    Str(String),
}

pub struct Tokenizer<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            pos: 0,
        }
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.input.len() {
            match self.input[self.pos] {
                b' ' | b'\t' | b'\n' | b'\r' => self.pos += 1,
                _ => break,
            }
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// A quoted string. Escapes are kept verbatim (backslash plus the
    /// escaped byte) so the token round-trips to source text.
    fn lex_string(&mut self) -> Result<Token, ParseError> {
        let start = self.pos;
        self.pos += 1;
        let content = self.pos;
        while self.pos < self.input.len() {
            match self.input[self.pos] {
                b'"' => {
                    // Decode the whole span at once; per-byte casts would
                    // mangle multi-byte UTF-8.
                    let value =
                        String::from_utf8_lossy(&self.input[content..self.pos]).into_owned();
                    self.pos += 1;
                    return Ok(Token::Str(value));
                }
                b'\\' => {
                    self.pos += 1;
                    if self.pos < self.input.len() {
                        self.pos += 1;
                    }
                }
                _ => self.pos += 1,
            }
        }
        Err(ParseError::UnterminatedString(start))
    }

    fn lex_word(&mut self) -> Token {
        let start = self.pos;
        while self.pos < self.input.len() {
            match self.input[self.pos] {
                b' ' | b'\t' | b'\n' | b'\r' | b'(' | b')' | b'"' => break,
                _ => self.pos += 1,
            }
        }
        let word = String::from_utf8_lossy(&self.input[start..self.pos]).into_owned();
        match classify_number(&word) {
            Some(n) => Token::Number(n),
            None => Token::Atom(word),
        }
    }
}

/// Full-match check against the numeric grammar. `parse::<f64>` alone is too
/// permissive (it accepts exponents, `inf`, `nan`), so the shape is checked
/// first.
fn classify_number(word: &str) -> Option<f64> {
    let mut chars = word.chars().peekable();
    if matches!(chars.peek(), Some('+') | Some('-')) {
        chars.next();
    }
    let mut digits = 0;
    while matches!(chars.peek(), Some(c) if c.is_ascii_digit()) {
        chars.next();
        digits += 1;
    }
    if digits == 0 {
        return None;
    }
    if chars.peek() == Some(&'.') {
        chars.next();
        while matches!(chars.peek(), Some(c) if c.is_ascii_digit()) {
            chars.next();
        }
    }
    if chars.next().is_some() {
        return None;
    }
    word.parse().ok()
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Result<Token, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.skip_whitespace();
        match self.peek()? {
            b'(' => {
                self.pos += 1;
                Some(Ok(Token::Open))
            }
            b')' => {
                self.pos += 1;
                Some(Ok(Token::Close))
            }
            b'"' => Some(self.lex_string()),
            _ => Some(Ok(self.lex_word())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        Tokenizer::new(input).map(|t| t.unwrap()).collect()
    }

    #[test]
    fn test_parens_and_atoms() {
        assert_eq!(
            tokens("(layer F.Cu)"),
            vec![
                Token::Open,
                Token::Atom("layer".into()),
                Token::Atom("F.Cu".into()),
                Token::Close,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            tokens("10 -4.5 +2. 007"),
            vec![
                Token::Number(10.0),
                Token::Number(-4.5),
                Token::Number(2.0),
                Token::Number(7.0),
            ]
        );
    }

    #[test]
    fn test_numeric_lookalikes_are_atoms() {
        assert_eq!(
            tokens("1.2.3 1e5 - .5 20mm"),
            vec![
                Token::Atom("1.2.3".into()),
                Token::Atom("1e5".into()),
                Token::Atom("-".into()),
                Token::Atom(".5".into()),
                Token::Atom("20mm".into()),
            ]
        );
    }

    #[test]
    fn test_string_keeps_escapes_verbatim() {
        assert_eq!(
            tokens(r#"("a \"b\" c")"#),
            vec![
                Token::Open,
                Token::Str(r#"a \"b\" c"#.into()),
                Token::Close,
            ]
        );
    }

    #[test]
    fn test_string_preserves_multibyte_utf8() {
        assert_eq!(
            tokens("(\"100µF Ω é\")"),
            vec![
                Token::Open,
                Token::Str("100µF Ω é".into()),
                Token::Close,
            ]
        );
    }

    #[test]
    fn test_unterminated_string() {
        let mut t = Tokenizer::new("(net \"GND");
        assert_eq!(t.next().unwrap().unwrap(), Token::Open);
        assert_eq!(t.next().unwrap().unwrap(), Token::Atom("net".into()));
        assert!(matches!(
            t.next().unwrap(),
            Err(ParseError::UnterminatedString(_))
        ));
    }

    #[test]
    fn test_whitespace_only() {
        assert!(tokens(" \t\r\n ").is_empty());
    }
}
