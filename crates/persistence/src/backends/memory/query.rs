//! A subset of the Lucene query-string syntax.
//!
//! Supported:
//!
//! - bare terms, matched against every field: `blue`
//! - field terms: `plateTitle:blue`, `person.id:3`
//! - phrases: `"blue plate"`, `plateTitle:"blue plate"`
//! - wildcards: `bl*e`, `b?ue`; `*` alone matches everything
//! - `AND` / `&&`, `OR` / `||`, `NOT` / `!`, and the `+` / `-` prefixes
//! - grouping with parentheses, including `field:(a b)`
//! - backslash escapes
//!
//! Adjacent clauses are combined with OR. Matching is case-insensitive and
//! works on words, so `blue` matches a title of `"Blue Plate"`.

use regex::Regex;
use serde_json::Value;

use crate::error::SearchError;

/// How a clause takes part in its group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occur {
    /// At least one `Should` clause must match when there are no `Must`
    /// clauses.
    Should,
    /// The clause must match.
    Must,
    /// The clause must not match.
    MustNot,
}

/// A term value.
#[derive(Debug, Clone)]
pub enum Pattern {
    /// Exact, lowercased word.
    Exact(String),
    /// Anchored wildcard pattern.
    Wildcard(Regex),
}

impl Pattern {
    fn new(text: &str) -> Result<Self, SearchError> {
        let text = text.to_lowercase();
        if !text.contains(['*', '?']) {
            return Ok(Pattern::Exact(text));
        }
        let mut expr = String::from("^");
        for c in text.chars() {
            match c {
                '*' => expr.push_str(".*"),
                '?' => expr.push('.'),
                c => expr.push_str(&regex::escape(&c.to_string())),
            }
        }
        expr.push('$');
        Regex::new(&expr)
            .map(Pattern::Wildcard)
            .map_err(|e| SearchError::QueryParseError {
                message: e.to_string(),
            })
    }

    fn matches(&self, word: &str) -> bool {
        match self {
            Pattern::Exact(text) => text == word,
            Pattern::Wildcard(regex) => regex.is_match(word),
        }
    }
}

/// A parsed query.
#[derive(Debug, Clone)]
pub enum Query {
    /// Matches every document.
    MatchAll,
    /// A single word or wildcard.
    Term {
        /// Field path, or every field when `None`.
        field: Option<String>,
        /// Value to match.
        pattern: Pattern,
    },
    /// Consecutive words.
    Phrase {
        /// Field path, or every field when `None`.
        field: Option<String>,
        /// Lowercased words.
        words: Vec<String>,
    },
    /// Clauses combined by their [`Occur`].
    Group(Vec<(Occur, Query)>),
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(String),
    Phrase(String),
    Field(String),
    LParen,
    RParen,
    And,
    Or,
    Not,
    Plus,
    Minus,
}

fn parse_error(message: impl Into<String>) -> SearchError {
    SearchError::QueryParseError {
        message: message.into(),
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, SearchError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '!' => {
                chars.next();
                tokens.push(Token::Not);
            }
            '"' => {
                chars.next();
                let mut phrase = String::new();
                let mut closed = false;
                while let Some(c) = chars.next() {
                    match c {
                        '\\' => {
                            if let Some(escaped) = chars.next() {
                                phrase.push(escaped);
                            }
                        }
                        '"' => {
                            closed = true;
                            break;
                        }
                        c => phrase.push(c),
                    }
                }
                if !closed {
                    return Err(parse_error("unterminated phrase"));
                }
                tokens.push(Token::Phrase(phrase));
            }
            _ => {
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_whitespace() || matches!(c, '(' | ')' | '"') {
                        break;
                    }
                    chars.next();
                    match c {
                        '\\' => {
                            if let Some(escaped) = chars.next() {
                                word.push(escaped);
                            }
                        }
                        ':' => {
                            if word.is_empty() {
                                return Err(parse_error("missing field name before ':'"));
                            }
                            tokens.push(Token::Field(std::mem::take(&mut word)));
                        }
                        c => word.push(c),
                    }
                }
                match word.as_str() {
                    "" => {}
                    "AND" | "&&" => tokens.push(Token::And),
                    "OR" | "||" => tokens.push(Token::Or),
                    "NOT" => tokens.push(Token::Not),
                    _ => tokens.push(Token::Word(word)),
                }
            }
        }
    }

    Ok(tokens)
}

/// Deepest parenthesis nesting accepted by [`parse`].
pub const MAX_NESTING: usize = 32;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Conjunction {
    And,
    Or,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    /// Parses a parenthesized group; the opening `(` is already consumed.
    fn parse_nested(&mut self, field: Option<&str>) -> Result<Query, SearchError> {
        if self.depth >= MAX_NESTING {
            return Err(parse_error(format!(
                "parentheses nested deeper than {}",
                MAX_NESTING
            )));
        }
        self.depth += 1;
        let group = self.parse_group(field, true);
        self.depth -= 1;
        group
    }

    fn parse_group(&mut self, field: Option<&str>, nested: bool) -> Result<Query, SearchError> {
        let mut clauses: Vec<(Occur, Query)> = Vec::new();
        let mut pending: Option<Conjunction> = None;

        loop {
            match self.peek() {
                None if nested => return Err(parse_error("missing ')'")),
                None => break,
                Some(Token::RParen) if nested => {
                    self.next();
                    break;
                }
                Some(Token::RParen) => return Err(parse_error("unexpected ')'")),
                Some(Token::And) | Some(Token::Or) => {
                    let conjunction = if self.next() == Some(Token::And) {
                        Conjunction::And
                    } else {
                        Conjunction::Or
                    };
                    if clauses.is_empty() || pending.is_some() {
                        return Err(parse_error("operator without left operand"));
                    }
                    pending = Some(conjunction);
                }
                Some(_) => {
                    let (modifier, query) = self.parse_clause(field)?;
                    let mut occur = modifier.unwrap_or(Occur::Should);
                    if pending == Some(Conjunction::And) {
                        if let Some(last) = clauses.last_mut() {
                            if last.0 == Occur::Should {
                                last.0 = Occur::Must;
                            }
                        }
                        if occur == Occur::Should {
                            occur = Occur::Must;
                        }
                    }
                    clauses.push((occur, query));
                    pending = None;
                }
            }
        }

        if pending.is_some() {
            return Err(parse_error("operator without right operand"));
        }
        Ok(Query::Group(clauses))
    }

    fn parse_clause(&mut self, field: Option<&str>) -> Result<(Option<Occur>, Query), SearchError> {
        let modifier = match self.peek() {
            Some(Token::Not) | Some(Token::Minus) => {
                self.next();
                Some(Occur::MustNot)
            }
            Some(Token::Plus) => {
                self.next();
                Some(Occur::Must)
            }
            _ => None,
        };

        let query = match self.next() {
            Some(Token::Field(name)) => match self.next() {
                Some(Token::Word(word)) => term(Some(&name), &word)?,
                Some(Token::Phrase(text)) => phrase(Some(&name), &text),
                Some(Token::LParen) => self.parse_nested(Some(&name))?,
                _ => return Err(parse_error(format!("missing value for field '{}'", name))),
            },
            Some(Token::Word(word)) => term(field, &word)?,
            Some(Token::Phrase(text)) => phrase(field, &text),
            Some(Token::LParen) => self.parse_nested(field)?,
            Some(token) => return Err(parse_error(format!("unexpected {:?}", token))),
            None => return Err(parse_error("unexpected end of query")),
        };

        Ok((modifier, query))
    }
}

fn term(field: Option<&str>, word: &str) -> Result<Query, SearchError> {
    if field.is_none() && word == "*" {
        return Ok(Query::MatchAll);
    }
    Ok(Query::Term {
        field: field.map(str::to_string),
        pattern: Pattern::new(word)?,
    })
}

fn phrase(field: Option<&str>, text: &str) -> Query {
    Query::Phrase {
        field: field.map(str::to_string),
        words: words(text),
    }
}

/// Splits text into lowercase words.
pub(crate) fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Parses a query string.
pub fn parse(input: &str) -> Result<Query, SearchError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(parse_error("empty query"));
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    parser.parse_group(None, false)
}

/// A document flattened to `(path, value)` pairs, e.g. `("person.id", "3")`.
pub struct FlatDocument {
    fields: Vec<(String, String)>,
}

impl FlatDocument {
    /// Flattens a JSON document.
    pub fn new(document: &Value) -> Self {
        let mut fields = Vec::new();
        flatten("", document, &mut fields);
        Self { fields }
    }

    fn values<'a>(&'a self, field: Option<&'a str>) -> impl Iterator<Item = &'a str> + 'a {
        self.fields
            .iter()
            .filter(move |(path, _)| field.is_none_or(|f| path == f))
            .map(|(_, value)| value.as_str())
    }
}

fn flatten(prefix: &str, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (key, value) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten(&path, value, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                flatten(prefix, item, out);
            }
        }
        Value::String(s) => out.push((prefix.to_string(), s.clone())),
        Value::Number(n) => out.push((prefix.to_string(), n.to_string())),
        Value::Bool(b) => out.push((prefix.to_string(), b.to_string())),
        Value::Null => {}
    }
}

impl Query {
    /// Returns true if the document matches.
    pub fn matches(&self, document: &FlatDocument) -> bool {
        match self {
            Query::MatchAll => true,
            Query::Term { field, pattern } => document.values(field.as_deref()).any(|value| {
                let lower = value.to_lowercase();
                pattern.matches(&lower) || words(value).iter().any(|w| pattern.matches(w))
            }),
            Query::Phrase { field, words: phrase } => {
                if phrase.is_empty() {
                    return false;
                }
                document.values(field.as_deref()).any(|value| {
                    words(value)
                        .windows(phrase.len())
                        .any(|window| window == phrase.as_slice())
                })
            }
            Query::Group(clauses) => {
                let mut has_must = false;
                let mut any_should = false;
                let mut has_should = false;
                for (occur, clause) in clauses {
                    match occur {
                        Occur::Must => {
                            has_must = true;
                            if !clause.matches(document) {
                                return false;
                            }
                        }
                        Occur::MustNot => {
                            if clause.matches(document) {
                                return false;
                            }
                        }
                        Occur::Should => {
                            has_should = true;
                            any_should = any_should || clause.matches(document);
                        }
                    }
                }
                has_must || !has_should || any_should
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn matches(query: &str, document: &Value) -> bool {
        parse(query).unwrap().matches(&FlatDocument::new(document))
    }

    fn plate() -> Value {
        json!({
            "id": 4,
            "plateTitle": "Blue Willow Plate",
            "person": {"id": 3},
            "notes": [{"id": 1}, {"id": 2}]
        })
    }

    #[test]
    fn test_bare_terms_match_any_field() {
        assert!(matches("willow", &plate()));
        assert!(matches("BLUE", &plate()));
        assert!(!matches("green", &plate()));
        assert!(matches("green willow", &plate()));
    }

    #[test]
    fn test_field_terms() {
        assert!(matches("plateTitle:willow", &plate()));
        assert!(!matches("plateTitle:3", &plate()));
        assert!(matches("person.id:3", &plate()));
        assert!(matches("notes.id:2", &plate()));
        assert!(!matches("notes.id:5", &plate()));
    }

    #[test]
    fn test_wildcards() {
        assert!(matches("*", &plate()));
        assert!(matches("wil*", &plate()));
        assert!(matches("pl?te", &plate()));
        assert!(matches("plateTitle:*", &plate()));
        assert!(!matches("missing:*", &plate()));
    }

    #[test]
    fn test_phrases() {
        assert!(matches("\"willow plate\"", &plate()));
        assert!(!matches("\"plate willow\"", &plate()));
        assert!(matches("plateTitle:\"blue willow\"", &plate()));
    }

    #[test]
    fn test_boolean_operators() {
        assert!(matches("blue AND willow", &plate()));
        assert!(!matches("blue AND green", &plate()));
        assert!(matches("green OR willow", &plate()));
        assert!(matches("blue && plateTitle:plate", &plate()));
        assert!(!matches("blue -willow", &plate()));
        assert!(!matches("blue NOT willow", &plate()));
        assert!(matches("-green", &plate()));
        assert!(matches("+blue green", &plate()));
        assert!(!matches("+green blue", &plate()));
    }

    #[test]
    fn test_grouping() {
        assert!(matches("(green OR blue) AND willow", &plate()));
        assert!(!matches("(green OR red) AND willow", &plate()));
        assert!(matches("plateTitle:(green willow)", &plate()));
    }

    #[test]
    fn test_and_marks_both_neighbours_required() {
        // Parsed as `green +red +willow`.
        assert!(!matches("green OR red AND willow", &plate()));
        assert!(!matches("willow OR red AND blue", &plate()));
        assert!(matches("red OR blue AND willow", &plate()));
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse("").is_err());
        assert!(parse("(blue").is_err());
        assert!(parse("blue)").is_err());
        assert!(parse("AND blue").is_err());
        assert!(parse("blue AND").is_err());
        assert!(parse("\"open").is_err());
        assert!(parse("title:").is_err());
    }

    #[test]
    fn test_nesting_limit() {
        let nested = |depth: usize| format!("{}a{}", "(".repeat(depth), ")".repeat(depth));

        assert!(parse(&nested(MAX_NESTING)).is_ok());
        assert!(matches!(
            parse(&nested(MAX_NESTING + 1)),
            Err(SearchError::QueryParseError { .. })
        ));
        assert!(parse(&nested(10_000)).is_err());
        assert!(parse(&format!("plateTitle:{}", nested(10_000))).is_err());
    }

    #[test]
    fn test_escapes() {
        let doc = json!({"email": "a:b@example.com"});
        assert!(matches(r"email:a\:b@example.com", &doc));
    }
}
