//! Declarative path/filter predicates over JSON event payloads.
//!
//! A [`Predicate`] selects events by checking whether at least one node in
//! the payload is reachable through a path expression such as:
//!
//! ```text
//! $.data[?(@.destinationTable == "TransactionKeyValue"
//!          && @.key == "uppercase_text" && @.value == "false")]
//! ```
//!
//! Supported syntax:
//!
//! - `$` — the payload root (mandatory first token).
//! - `.name` — descend into an object field.
//! - `[*]` — any element of an array.
//! - `[?(@.field == <literal> && ...)]` — an array element whose fields
//!   satisfy every clause. Literals are double-quoted strings, integers,
//!   floats, `true`, `false`, or `null`.
//!
//! Matching is structural: the predicate holds iff the node set reached
//! after applying every segment is non-empty. Malformed expressions are
//! rejected by [`Predicate::compile`] so that registration, not matching,
//! is the failure point.

use serde_json::Value;

/// Error produced while compiling a predicate expression.
#[derive(Debug, thiserror::Error)]
pub enum PredicateError {
    /// The expression did not start with the `$` root token.
    #[error("predicate must start with `$`")]
    MissingRoot,

    /// The expression ended in the middle of a segment.
    #[error("unexpected end of predicate")]
    UnexpectedEnd,

    /// An unexpected character was found.
    #[error("unexpected character `{found}` at position {pos}")]
    UnexpectedChar { pos: usize, found: char },

    /// A field name was empty (`.` or `@.` followed by a non-identifier).
    #[error("expected a field name at position {0}")]
    ExpectedField(usize),

    /// A numeric literal could not be parsed.
    #[error("invalid number literal `{0}`")]
    InvalidNumber(String),

    /// A `[?( )]` filter contained no clauses.
    #[error("empty filter at position {0}")]
    EmptyFilter(usize),
}

/// One `@.field == value` comparison inside a filter segment.
#[derive(Debug, Clone, PartialEq)]
struct Clause {
    field: String,
    value: Value,
}

impl Clause {
    /// True when `node` is an object whose `field` equals the literal.
    fn holds(&self, node: &Value) -> bool {
        node.get(&self.field) == Some(&self.value)
    }
}

/// One step of a compiled predicate path.
#[derive(Debug, Clone, PartialEq)]
enum Segment {
    /// `.name` — object field descent.
    Field(String),
    /// `[*]` — every element of an array.
    AnyElement,
    /// `[?(...)]` — array elements satisfying all clauses.
    Filter(Vec<Clause>),
}

/// A compiled path/filter predicate.
///
/// Compile once with [`Predicate::compile`], match many times with
/// [`Predicate::matches`]. The original source text is retained for
/// logging and for forwarding to the external subscription service.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    source: String,
    segments: Vec<Segment>,
}

impl Predicate {
    /// Compile a predicate expression.
    ///
    /// All syntax errors surface here; `matches` never fails.
    pub fn compile(source: &str) -> Result<Self, PredicateError> {
        let segments = Parser::new(source).parse()?;
        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// The original expression text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluate the predicate against a JSON payload.
    ///
    /// Returns `true` iff at least one node survives every segment.
    pub fn matches(&self, payload: &Value) -> bool {
        let mut nodes: Vec<&Value> = vec![payload];

        for segment in &self.segments {
            let mut next = Vec::new();
            for node in nodes {
                match segment {
                    Segment::Field(name) => {
                        if let Some(child) = node.get(name) {
                            next.push(child);
                        }
                    }
                    Segment::AnyElement => {
                        if let Some(items) = node.as_array() {
                            next.extend(items.iter());
                        }
                    }
                    Segment::Filter(clauses) => {
                        if let Some(items) = node.as_array() {
                            next.extend(
                                items
                                    .iter()
                                    .filter(|item| clauses.iter().all(|c| c.holds(item))),
                            );
                        }
                    }
                }
            }
            if next.is_empty() {
                return false;
            }
            nodes = next;
        }

        !nodes.is_empty()
    }
}

impl std::fmt::Display for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Hand-rolled recursive-descent parser over the predicate grammar.
struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    fn parse(mut self) -> Result<Vec<Segment>, PredicateError> {
        self.skip_whitespace();
        if self.next_char()? != '$' {
            return Err(PredicateError::MissingRoot);
        }

        let mut segments = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => break,
                Some('.') => {
                    self.pos += 1;
                    self.skip_whitespace();
                    segments.push(Segment::Field(self.parse_ident()?));
                }
                Some('[') => {
                    self.pos += 1;
                    segments.push(self.parse_bracket()?);
                }
                Some(found) => {
                    return Err(PredicateError::UnexpectedChar {
                        pos: self.pos,
                        found,
                    })
                }
            }
        }
        Ok(segments)
    }

    /// Parse the inside of a `[...]` segment; the opening `[` is consumed.
    fn parse_bracket(&mut self) -> Result<Segment, PredicateError> {
        self.skip_whitespace();
        match self.next_char()? {
            '*' => {
                self.skip_whitespace();
                self.expect(']')?;
                Ok(Segment::AnyElement)
            }
            '?' => {
                self.expect('(')?;
                let start = self.pos;
                self.skip_whitespace();
                if self.peek() == Some(')') {
                    return Err(PredicateError::EmptyFilter(start));
                }
                let mut clauses = vec![self.parse_clause()?];
                loop {
                    self.skip_whitespace();
                    match self.peek() {
                        Some(')') => {
                            self.pos += 1;
                            break;
                        }
                        Some('&') => {
                            self.expect('&')?;
                            self.expect('&')?;
                            clauses.push(self.parse_clause()?);
                        }
                        Some(found) => {
                            return Err(PredicateError::UnexpectedChar {
                                pos: self.pos,
                                found,
                            })
                        }
                        None => return Err(PredicateError::UnexpectedEnd),
                    }
                }
                self.skip_whitespace();
                self.expect(']')?;
                Ok(Segment::Filter(clauses))
            }
            found => Err(PredicateError::UnexpectedChar {
                pos: self.pos - 1,
                found,
            }),
        }
    }

    /// Parse one `@.field == literal` clause.
    fn parse_clause(&mut self) -> Result<Clause, PredicateError> {
        self.skip_whitespace();
        self.expect('@')?;
        self.expect('.')?;
        self.skip_whitespace();
        let field = self.parse_ident()?;
        self.skip_whitespace();
        self.expect('=')?;
        self.expect('=')?;
        self.skip_whitespace();
        let value = self.parse_literal()?;
        Ok(Clause { field, value })
    }

    fn parse_ident(&mut self) -> Result<String, PredicateError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                self.pos += 1;
            } else {
                break;
            }
        }
        if self.pos == start {
            return Err(PredicateError::ExpectedField(start));
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn parse_literal(&mut self) -> Result<Value, PredicateError> {
        match self.peek() {
            Some('"') => {
                self.pos += 1;
                let mut s = String::new();
                loop {
                    match self.next_char()? {
                        '"' => break,
                        '\\' => s.push(self.next_char()?),
                        c => s.push(c),
                    }
                }
                Ok(Value::String(s))
            }
            Some(c) if c.is_ascii_digit() || c == '-' => {
                let start = self.pos;
                while let Some(c) = self.peek() {
                    if c.is_ascii_digit() || c == '-' || c == '.' || c == 'e' || c == 'E' || c == '+'
                    {
                        self.pos += 1;
                    } else {
                        break;
                    }
                }
                let text: String = self.chars[start..self.pos].iter().collect();
                text.parse::<serde_json::Number>()
                    .map(Value::Number)
                    .map_err(|_| PredicateError::InvalidNumber(text))
            }
            Some(c) if c.is_alphabetic() => {
                let word = self.parse_ident()?;
                match word.as_str() {
                    "true" => Ok(Value::Bool(true)),
                    "false" => Ok(Value::Bool(false)),
                    "null" => Ok(Value::Null),
                    _ => Err(PredicateError::UnexpectedChar {
                        pos: self.pos - word.len(),
                        found: c,
                    }),
                }
            }
            Some(found) => Err(PredicateError::UnexpectedChar {
                pos: self.pos,
                found,
            }),
            None => Err(PredicateError::UnexpectedEnd),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn next_char(&mut self) -> Result<char, PredicateError> {
        let c = self.peek().ok_or(PredicateError::UnexpectedEnd)?;
        self.pos += 1;
        Ok(c)
    }

    fn expect(&mut self, expected: char) -> Result<(), PredicateError> {
        let found = self.next_char()?;
        if found != expected {
            return Err(PredicateError::UnexpectedChar {
                pos: self.pos - 1,
                found,
            });
        }
        Ok(())
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
