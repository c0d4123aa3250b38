use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SExpError {
    #[error("Unexpected end of input")]
    UnexpectedEof,
    #[error("Unexpected token at position {0}: {1}")]
    UnexpectedToken(usize, String),
    #[error("Unexpected content after the root node at position {0}")]
    TrailingInput(usize),
    #[error("Expected node \"{expected}\", found \"{found}\"")]
    UnexpectedNode { expected: String, found: String },
    #[error("Node \"{parent}\" has no child \"{child}\"")]
    MissingChild { parent: String, child: String },
    #[error("Node \"{node}\" has no value at index {index}")]
    MissingValue { node: String, index: usize },
    #[error("Invalid value \"{value}\" in node \"{node}\": {reason}")]
    InvalidValue {
        node: String,
        value: String,
        reason: String,
    },
}

/// A node of the structured tree used at the persistence boundary.
///
/// Lists conventionally start with a token naming the node, followed by its
/// values and child nodes: `(netsignal <uuid> (name "VCC") (auto false))`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SExp {
    /// Unquoted atom (keywords, identifiers, numbers, booleans).
    Token(String),
    /// Quoted free text.
    String(String),
    List(Vec<SExp>),
}

impl SExp {
    /// Create an empty node `(name)`.
    pub fn list(name: &str) -> Self {
        SExp::List(vec![SExp::Token(name.to_string())])
    }

    pub fn token(value: impl ToString) -> Self {
        SExp::Token(value.to_string())
    }

    pub fn string(value: impl Into<String>) -> Self {
        SExp::String(value.into())
    }

    pub fn with_token(mut self, value: impl ToString) -> Self {
        self.append(SExp::token(value));
        self
    }

    pub fn with_string(mut self, value: impl Into<String>) -> Self {
        self.append(SExp::string(value));
        self
    }

    pub fn with_child(mut self, child: SExp) -> Self {
        self.append(child);
        self
    }

    /// Append an item to a list node. Appending to an atom is a no-op.
    pub fn append(&mut self, child: SExp) {
        if let SExp::List(items) = self {
            items.push(child);
        }
    }

    /// Append `(name value)` with an unquoted value.
    pub fn append_token_child(&mut self, name: &str, value: impl ToString) {
        self.append(SExp::list(name).with_token(value));
    }

    /// Append `(name "value")` with a quoted value.
    pub fn append_string_child(&mut self, name: &str, value: impl Into<String>) {
        self.append(SExp::list(name).with_string(value));
    }

    pub fn is_list(&self) -> bool {
        matches!(self, SExp::List(_))
    }

    pub fn as_atom(&self) -> Option<&str> {
        match self {
            SExp::Token(s) | SExp::String(s) => Some(s),
            SExp::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[SExp]> {
        match self {
            SExp::List(items) => Some(items),
            _ => None,
        }
    }

    /// Name of a list node, i.e. its leading token. Empty for atoms.
    pub fn name(&self) -> &str {
        match self {
            SExp::List(items) => match items.first() {
                Some(SExp::Token(name)) => name,
                _ => "",
            },
            _ => "",
        }
    }

    /// All items after the node name.
    pub fn args(&self) -> &[SExp] {
        match self {
            SExp::List(items) if !items.is_empty() => &items[1..],
            _ => &[],
        }
    }

    /// First child node with the given name.
    pub fn child(&self, name: &str) -> Option<&SExp> {
        self.args().iter().find(|item| item.is_list() && item.name() == name)
    }

    /// All child nodes with the given name, in document order.
    pub fn children<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a SExp> + 'a {
        self.args()
            .iter()
            .filter(move |item| item.is_list() && item.name() == name)
    }

    pub fn require_child(&self, name: &str) -> Result<&SExp, SExpError> {
        self.child(name).ok_or_else(|| SExpError::MissingChild {
            parent: self.name().to_string(),
            child: name.to_string(),
        })
    }

    pub fn expect_name(&self, expected: &str) -> Result<(), SExpError> {
        if self.name() == expected {
            Ok(())
        } else {
            Err(SExpError::UnexpectedNode {
                expected: expected.to_string(),
                found: self.name().to_string(),
            })
        }
    }

    /// Atom value at `index` (counted after the node name).
    pub fn value(&self, index: usize) -> Result<&str, SExpError> {
        self.args()
            .get(index)
            .and_then(SExp::as_atom)
            .ok_or_else(|| SExpError::MissingValue {
                node: self.name().to_string(),
                index,
            })
    }

    pub fn parse_value<T>(&self, index: usize) -> Result<T, SExpError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let raw = self.value(index)?;
        raw.parse::<T>().map_err(|e| SExpError::InvalidValue {
            node: self.name().to_string(),
            value: raw.to_string(),
            reason: e.to_string(),
        })
    }

    /// Shortcut for `(name value)` children: the first value of child `name`.
    pub fn child_value(&self, name: &str) -> Result<&str, SExpError> {
        self.require_child(name)?.value(0)
    }

    pub fn parse_child_value<T>(&self, name: &str) -> Result<T, SExpError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        self.require_child(name)?.parse_value(0)
    }

    pub fn parse(text: &str) -> Result<SExp, SExpError> {
        let mut parser = SExpParser::new(text);
        let root = parser.parse()?;
        parser.skip_whitespace();
        if !parser.is_eof() {
            return Err(SExpError::TrailingInput(parser.pos));
        }
        Ok(root)
    }

    /// Pretty printed text followed by a final newline, as written to files.
    pub fn to_file_string(&self) -> String {
        format!("{self}\n")
    }

    fn needs_expansion(&self) -> bool {
        self.args()
            .iter()
            .any(|item| matches!(item, SExp::List(children) if children.iter().any(SExp::is_list)))
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    f.write_str("\"")?;
    for ch in text.chars() {
        match ch {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            '\r' => f.write_str("\\r")?,
            _ => write!(f, "{ch}")?,
        }
    }
    f.write_str("\"")
}

fn write_node(f: &mut fmt::Formatter<'_>, node: &SExp, indent: usize) -> fmt::Result {
    match node {
        SExp::Token(token) => f.write_str(token),
        SExp::String(text) => write_quoted(f, text),
        SExp::List(items) if !node.needs_expansion() => {
            f.write_str("(")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(" ")?;
                }
                write_node(f, item, indent + 1)?;
            }
            f.write_str(")")
        }
        SExp::List(items) => {
            // Leading atoms stay on the opening line, everything from the
            // first child list onwards gets its own line.
            f.write_str("(")?;
            let mut broken = false;
            for (i, item) in items.iter().enumerate() {
                if !broken && !item.is_list() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                } else {
                    broken = true;
                    writeln!(f)?;
                    write!(f, "{}", " ".repeat(indent + 1))?;
                }
                write_node(f, item, indent + 1)?;
            }
            writeln!(f)?;
            write!(f, "{})", " ".repeat(indent))
        }
    }
}

impl fmt::Display for SExp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_node(f, self, 0)
    }
}

/// Deepest list nesting the parser accepts.
pub const MAX_NESTING: usize = 256;

pub struct SExpParser {
    input: Vec<char>,
    pos: usize,
    depth: usize,
}

impl SExpParser {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            pos: 0,
            depth: 0,
        }
    }

    pub fn parse(&mut self) -> Result<SExp, SExpError> {
        self.skip_whitespace();
        if self.is_eof() {
            return Err(SExpError::UnexpectedEof);
        }
        self.parse_sexp()
    }

    fn parse_sexp(&mut self) -> Result<SExp, SExpError> {
        self.skip_whitespace();

        if self.is_eof() {
            return Err(SExpError::UnexpectedEof);
        }

        match self.peek() {
            '(' => self.parse_list(),
            ')' => Err(SExpError::UnexpectedToken(self.pos, ")".to_string())),
            '"' => self.parse_string(),
            _ => self.parse_token(),
        }
    }

    fn parse_list(&mut self) -> Result<SExp, SExpError> {
        if self.depth >= MAX_NESTING {
            return Err(SExpError::UnexpectedToken(
                self.pos,
                format!("list nested deeper than {MAX_NESTING} levels"),
            ));
        }
        self.expect_char('(')?;
        self.depth += 1;
        let result = self.parse_list_items();
        self.depth -= 1;
        result
    }

    fn parse_list_items(&mut self) -> Result<SExp, SExpError> {
        let mut items = Vec::new();

        loop {
            self.skip_whitespace();

            if self.is_eof() {
                return Err(SExpError::UnexpectedEof);
            }

            if self.peek() == ')' {
                self.advance();
                break;
            }

            items.push(self.parse_sexp()?);
        }

        Ok(SExp::List(items))
    }

    fn parse_string(&mut self) -> Result<SExp, SExpError> {
        self.expect_char('"')?;
        let mut s = String::new();
        let mut escaped = false;

        while !self.is_eof() {
            let ch = self.peek();
            self.advance();

            if escaped {
                match ch {
                    'n' => s.push('\n'),
                    't' => s.push('\t'),
                    'r' => s.push('\r'),
                    _ => s.push(ch),
                }
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                return Ok(SExp::String(s));
            } else {
                s.push(ch);
            }
        }

        Err(SExpError::UnexpectedEof)
    }

    fn parse_token(&mut self) -> Result<SExp, SExpError> {
        let start = self.pos;
        let mut s = String::new();

        while !self.is_eof() {
            let ch = self.peek();
            if ch.is_whitespace() || ch == '(' || ch == ')' || ch == '"' {
                break;
            }
            s.push(ch);
            self.advance();
        }

        if s.is_empty() {
            Err(SExpError::UnexpectedToken(start, "empty token".to_string()))
        } else {
            Ok(SExp::Token(s))
        }
    }

    fn skip_whitespace(&mut self) {
        while !self.is_eof() && self.peek().is_whitespace() {
            self.advance();
        }
    }

    fn peek(&self) -> char {
        self.input.get(self.pos).copied().unwrap_or('\0')
    }

    fn advance(&mut self) {
        if self.pos < self.input.len() {
            self.pos += 1;
        }
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn expect_char(&mut self, expected: char) -> Result<(), SExpError> {
        if self.is_eof() {
            return Err(SExpError::UnexpectedEof);
        }

        let ch = self.peek();
        if ch == expected {
            self.advance();
            Ok(())
        } else {
            Err(SExpError::UnexpectedToken(
                self.pos,
                format!("expected '{}', found '{}'", expected, ch),
            ))
        }
    }
}
