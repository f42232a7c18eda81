//! Minimal s-expression reader and printer.
//!
//! Archive contents and package headers are written as s-expressions. This
//! module supports the subset those files use: unsigned integers, symbols,
//! strings, proper and dotted lists, vectors, `'quote` and `;` comments.
//! Symbols use backslash escapes, so `\2048` and `my\ pkg` are symbols.
//!
//! ```
//! use pkgarchive::sexp::{parse, Sexp};
//!
//! let form = parse("(foo . [(1 2) nil \"Foo\" single])").unwrap();
//! let (car, cdr) = form.as_pair().unwrap();
//! assert_eq!(car.as_symbol(), Some("foo"));
//! assert_eq!(cdr.as_vector().map(|v| v.len()), Some(4));
//! ```

use std::fmt;

use thiserror::Error;

/// Result type for s-expression parsing.
pub type SexpResult<T> = Result<T, SexpError>;

/// Errors produced by the reader.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SexpError {
    /// Input ended inside a form.
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// A character that cannot start or continue a form.
    #[error("unexpected '{found}' at offset {offset}")]
    Unexpected { found: char, offset: usize },

    /// A dotted pair with a malformed tail.
    #[error("malformed dotted list at offset {0}")]
    BadDot(usize),

    /// Extra input after a complete form.
    #[error("trailing input at offset {0}")]
    Trailing(usize),

    /// No form in the input.
    #[error("empty input")]
    Empty,
}

/// An s-expression value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sexp {
    /// Non-negative integer.
    Integer(u64),
    /// Bare symbol, including `nil` and `t`.
    Symbol(String),
    /// String literal.
    Str(String),
    /// Proper list `(a b c)`. `()` and `nil` both denote the empty list.
    List(Vec<Sexp>),
    /// Dotted list `(a b . c)`.
    Dotted(Vec<Sexp>, Box<Sexp>),
    /// Vector `[a b c]`.
    Vector(Vec<Sexp>),
}

impl Sexp {
    /// The `nil` symbol.
    pub fn nil() -> Self {
        Sexp::Symbol("nil".to_string())
    }

    /// Build a symbol.
    pub fn symbol(name: impl Into<String>) -> Self {
        Sexp::Symbol(name.into())
    }

    /// Build a string literal.
    pub fn string(value: impl Into<String>) -> Self {
        Sexp::Str(value.into())
    }

    /// Build a cons pair `(car . cdr)`.
    pub fn pair(car: Sexp, cdr: Sexp) -> Self {
        Sexp::Dotted(vec![car], Box::new(cdr))
    }

    /// Check whether this is `nil` or `()`.
    pub fn is_nil(&self) -> bool {
        match self {
            Sexp::Symbol(s) => s == "nil",
            Sexp::List(items) => items.is_empty(),
            _ => false,
        }
    }

    /// Items of a proper list; `nil` yields an empty slice.
    pub fn as_list(&self) -> Option<&[Sexp]> {
        match self {
            Sexp::List(items) => Some(items),
            Sexp::Symbol(s) if s == "nil" => Some(&[]),
            _ => None,
        }
    }

    /// Items of a vector.
    pub fn as_vector(&self) -> Option<&[Sexp]> {
        match self {
            Sexp::Vector(items) => Some(items),
            _ => None,
        }
    }

    /// Split a single cons `(car . cdr)`.
    pub fn as_pair(&self) -> Option<(&Sexp, &Sexp)> {
        match self {
            Sexp::Dotted(head, tail) if head.len() == 1 => Some((&head[0], tail)),
            _ => None,
        }
    }

    /// Symbol name.
    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Sexp::Symbol(s) => Some(s),
            _ => None,
        }
    }

    /// String literal contents.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Sexp::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Integer value.
    pub fn as_integer(&self) -> Option<u64> {
        match self {
            Sexp::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Strip a leading `quote`, as in `'((a "1"))`.
    pub fn unquote(&self) -> &Sexp {
        match self {
            Sexp::List(items) if items.len() == 2 && items[0].as_symbol() == Some("quote") => {
                &items[1]
            }
            other => other,
        }
    }
}

fn write_seq(f: &mut fmt::Formatter<'_>, items: &[Sexp]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

/// Whether `token` would read back as a number rather than a symbol.
fn looks_numeric(token: &str) -> bool {
    let digits = token.strip_prefix(|c: char| c == '+' || c == '-').unwrap_or(token);
    digits.bytes().any(|b| b.is_ascii_digit())
        && digits.bytes().all(|b| b.is_ascii_digit() || b == b'.')
        && digits.bytes().filter(|&b| b == b'.').count() <= 1
}

fn write_symbol(f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
    if looks_numeric(name) || name == "." {
        f.write_str("\\")?;
    }
    for (i, c) in name.chars().enumerate() {
        let escape = is_delimiter(c)
            || matches!(c, '\\' | ',' | '`')
            || (i == 0 && matches!(c, '#' | '?'));
        if escape {
            f.write_str("\\")?;
        }
        write!(f, "{}", c)?;
    }
    Ok(())
}

fn write_string(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    f.write_str("\"")?;
    for c in value.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            c => write!(f, "{}", c)?,
        }
    }
    f.write_str("\"")
}

impl fmt::Display for Sexp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sexp::Integer(n) => write!(f, "{}", n),
            Sexp::Symbol(s) => write_symbol(f, s),
            Sexp::Str(s) => write_string(f, s),
            Sexp::List(items) if items.is_empty() => f.write_str("nil"),
            Sexp::List(items) => {
                f.write_str("(")?;
                write_seq(f, items)?;
                f.write_str(")")
            }
            Sexp::Dotted(head, tail) => {
                f.write_str("(")?;
                write_seq(f, head)?;
                write!(f, " . {})", tail)
            }
            Sexp::Vector(items) => {
                f.write_str("[")?;
                write_seq(f, items)?;
                f.write_str("]")
            }
        }
    }
}

/// Parse exactly one form from `input`.
pub fn parse(input: &str) -> SexpResult<Sexp> {
    let mut reader = Reader::new(input);
    let form = reader.read()?.ok_or(SexpError::Empty)?;
    reader.skip_blank();
    if reader.pos < reader.chars.len() {
        return Err(SexpError::Trailing(reader.offset()));
    }
    Ok(form)
}

/// Parse every top-level form in `input`.
pub fn parse_all(input: &str) -> SexpResult<Vec<Sexp>> {
    let mut reader = Reader::new(input);
    let mut forms = Vec::new();
    while let Some(form) = reader.read()? {
        forms.push(form);
    }
    Ok(forms)
}

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, '(' | ')' | '[' | ']' | '"' | '\'' | ';')
}

struct Reader {
    chars: Vec<(usize, char)>,
    pos: usize,
    len: usize,
}

impl Reader {
    fn new(input: &str) -> Self {
        Self {
            chars: input.char_indices().collect(),
            pos: 0,
            len: input.len(),
        }
    }

    fn offset(&self) -> usize {
        self.chars.get(self.pos).map_or(self.len, |(o, _)| *o)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|(_, c)| *c)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn skip_blank(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.pos += 1;
            } else if c == ';' {
                while let Some(c) = self.bump() {
                    if c == '\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    /// Read the next form, or `None` at end of input.
    fn read(&mut self) -> SexpResult<Option<Sexp>> {
        self.skip_blank();
        let Some(c) = self.peek() else {
            return Ok(None);
        };
        let offset = self.offset();
        let form = match c {
            '(' => {
                self.pos += 1;
                self.read_list()?
            }
            '[' => {
                self.pos += 1;
                Sexp::Vector(self.read_until(']')?)
            }
            '"' => {
                self.pos += 1;
                self.read_string()?
            }
            '\'' => {
                self.pos += 1;
                let quoted = self.read()?.ok_or(SexpError::UnexpectedEof)?;
                Sexp::List(vec![Sexp::symbol("quote"), quoted])
            }
            ')' | ']' => return Err(SexpError::Unexpected { found: c, offset }),
            _ => self.read_atom()?,
        };
        Ok(Some(form))
    }

    fn read_until(&mut self, close: char) -> SexpResult<Vec<Sexp>> {
        let mut items = Vec::new();
        loop {
            self.skip_blank();
            match self.peek() {
                None => return Err(SexpError::UnexpectedEof),
                Some(c) if c == close => {
                    self.pos += 1;
                    return Ok(items);
                }
                Some(_) => items.push(self.read()?.ok_or(SexpError::UnexpectedEof)?),
            }
        }
    }

    fn read_list(&mut self) -> SexpResult<Sexp> {
        let mut items = Vec::new();
        loop {
            self.skip_blank();
            let offset = self.offset();
            match self.peek() {
                None => return Err(SexpError::UnexpectedEof),
                Some(')') => {
                    self.pos += 1;
                    return Ok(Sexp::List(items));
                }
                Some('.') if self.is_lone_dot() => {
                    self.pos += 1;
                    if items.is_empty() {
                        return Err(SexpError::BadDot(offset));
                    }
                    let tail = self.read()?.ok_or(SexpError::UnexpectedEof)?;
                    self.skip_blank();
                    if self.bump() != Some(')') {
                        return Err(SexpError::BadDot(offset));
                    }
                    return Ok(match tail {
                        Sexp::List(rest) => {
                            items.extend(rest);
                            Sexp::List(items)
                        }
                        Sexp::Symbol(ref s) if s == "nil" => Sexp::List(items),
                        tail => Sexp::Dotted(items, Box::new(tail)),
                    });
                }
                Some(_) => items.push(self.read()?.ok_or(SexpError::UnexpectedEof)?),
            }
        }
    }

    fn is_lone_dot(&self) -> bool {
        self.chars
            .get(self.pos + 1)
            .map_or(true, |(_, c)| is_delimiter(*c))
    }

    fn read_string(&mut self) -> SexpResult<Sexp> {
        let mut value = String::new();
        loop {
            match self.bump() {
                None => return Err(SexpError::UnexpectedEof),
                Some('"') => return Ok(Sexp::Str(value)),
                Some('\\') => match self.bump() {
                    None => return Err(SexpError::UnexpectedEof),
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('\n') => {}
                    Some(c) => value.push(c),
                },
                Some(c) => value.push(c),
            }
        }
    }

    /// Read a symbol or integer. `\x` makes `x` part of the symbol, and
    /// any escape forces a symbol.
    fn read_atom(&mut self) -> SexpResult<Sexp> {
        let mut token = String::new();
        let mut escaped = false;
        while let Some(c) = self.peek() {
            if c == '\\' {
                self.pos += 1;
                token.push(self.bump().ok_or(SexpError::UnexpectedEof)?);
                escaped = true;
                continue;
            }
            if is_delimiter(c) {
                break;
            }
            token.push(c);
            self.pos += 1;
        }
        if escaped {
            return Ok(Sexp::Symbol(token));
        }
        Ok(match token.parse::<u64>() {
            Ok(n) if token.bytes().all(|b| b.is_ascii_digit()) => Sexp::Integer(n),
            _ => Sexp::Symbol(token),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_atoms() {
        assert_eq!(parse("42").unwrap(), Sexp::Integer(42));
        assert_eq!(parse("foo-bar").unwrap(), Sexp::symbol("foo-bar"));
        assert_eq!(parse("\"hi\"").unwrap(), Sexp::string("hi"));
        assert_eq!(parse("+1").unwrap(), Sexp::symbol("+1"));
    }

    #[test]
    fn test_parse_list_and_vector() {
        let form = parse("(1 (2 3) [a \"b\"])").unwrap();
        assert_eq!(
            form,
            Sexp::List(vec![
                Sexp::Integer(1),
                Sexp::List(vec![Sexp::Integer(2), Sexp::Integer(3)]),
                Sexp::Vector(vec![Sexp::symbol("a"), Sexp::string("b")]),
            ])
        );
    }

    #[test]
    fn test_parse_dotted_pair() {
        let form = parse("(foo . [1])").unwrap();
        let (car, cdr) = form.as_pair().unwrap();
        assert_eq!(car.as_symbol(), Some("foo"));
        assert_eq!(cdr.as_vector().unwrap(), &[Sexp::Integer(1)]);
    }

    #[test]
    fn test_dotted_list_tail_flattens() {
        assert_eq!(
            parse("(a . (b c))").unwrap(),
            Sexp::List(vec![Sexp::symbol("a"), Sexp::symbol("b"), Sexp::symbol("c")])
        );
        assert_eq!(parse("(a . nil)").unwrap(), Sexp::List(vec![Sexp::symbol("a")]));
    }

    #[test]
    fn test_dot_inside_symbol_is_not_a_pair() {
        assert_eq!(
            parse("(a .b)").unwrap(),
            Sexp::List(vec![Sexp::symbol("a"), Sexp::symbol(".b")])
        );
    }

    #[test]
    fn test_bad_dots() {
        assert!(matches!(parse("( . a)"), Err(SexpError::BadDot(_))));
        assert!(matches!(parse("(a . b c)"), Err(SexpError::BadDot(_))));
    }

    #[test]
    fn test_quote() {
        let form = parse("'((a \"1\"))").unwrap();
        assert_eq!(
            form.unquote(),
            &Sexp::List(vec![Sexp::List(vec![Sexp::symbol("a"), Sexp::string("1")])])
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        let forms = parse_all(";; header\n(a) ; trailing\n;; end\n(b)").unwrap();
        assert_eq!(forms.len(), 2);
    }

    #[test]
    fn test_string_escapes() {
        let form = parse(r#""a \"quoted\" \\ path\nnext""#).unwrap();
        assert_eq!(form.as_str(), Some("a \"quoted\" \\ path\nnext"));
    }

    #[test]
    fn test_nil_is_empty_list() {
        assert_eq!(parse("nil").unwrap().as_list(), Some(&[][..]));
        assert_eq!(parse("()").unwrap().as_list(), Some(&[][..]));
        assert!(parse("()").unwrap().is_nil());
    }

    #[test]
    fn test_errors() {
        assert_eq!(parse("(a b"), Err(SexpError::UnexpectedEof));
        assert_eq!(parse("\"open"), Err(SexpError::UnexpectedEof));
        assert!(matches!(parse(")"), Err(SexpError::Unexpected { found: ')', .. })));
        assert!(matches!(parse("(a) (b)"), Err(SexpError::Trailing(_))));
        assert_eq!(parse("   ; only a comment"), Err(SexpError::Empty));
    }

    #[test]
    fn test_display() {
        let form = Sexp::pair(
            Sexp::symbol("foo"),
            Sexp::Vector(vec![
                Sexp::List(vec![Sexp::Integer(1), Sexp::Integer(2)]),
                Sexp::List(vec![]),
                Sexp::string("say \"hi\""),
                Sexp::symbol("single"),
            ]),
        );
        assert_eq!(
            form.to_string(),
            r#"(foo . [(1 2) nil "say \"hi\"" single])"#
        );
    }

    #[test]
    fn test_symbol_escapes() {
        assert_eq!(parse(r"\2048").unwrap(), Sexp::symbol("2048"));
        assert_eq!(parse(r"my\ pkg").unwrap(), Sexp::symbol("my pkg"));
        assert_eq!(parse(r"a\(b\)").unwrap(), Sexp::symbol("a(b)"));
        assert_eq!(parse(r"\\x").unwrap(), Sexp::symbol("\\x"));
        assert_eq!(parse("foo\\"), Err(SexpError::UnexpectedEof));
    }

    #[test]
    fn test_display_escapes_symbols() {
        assert_eq!(Sexp::symbol("2048").to_string(), r"\2048");
        assert_eq!(Sexp::symbol("-1.5").to_string(), r"\-1.5");
        assert_eq!(Sexp::symbol("my pkg").to_string(), r"my\ pkg");
        assert_eq!(Sexp::symbol("it's;\"x\"").to_string(), r#"it\'s\;\"x\""#);
        assert_eq!(Sexp::symbol(".").to_string(), r"\.");
        assert_eq!(Sexp::symbol("#a?b").to_string(), r"\#a?b");
        assert_eq!(Sexp::symbol("2048-mode").to_string(), "2048-mode");
        assert_eq!(Sexp::symbol("+").to_string(), "+");
    }

    #[test]
    fn test_escaped_symbols_read_back() {
        for name in ["2048", "1.0", "my pkg", "(x)", "[y]", "a;b", "q'r", "s\"t", "back\\slash", ".", "#h"] {
            let form = Sexp::pair(Sexp::symbol(name), Sexp::Vector(vec![Sexp::Integer(1)]));
            let read = parse(&form.to_string()).unwrap();
            assert_eq!(read, form, "symbol {:?} printed as {}", name, form);
        }
    }

    #[test]
    fn test_display_then_parse() {
        let text = r#"(1 (foo . [(1 2) ((bar (0 3))) "a \\ b" tar]))"#;
        let form = parse(text).unwrap();
        assert_eq!(form.to_string(), text);
    }
}
