//! Compiled XML element paths.
//!
//! XML locators use the ElementTree path subset:
//!
//! - `tag`, `*`, `.` and `..` steps separated by `/`
//! - `//tag` for any descendant
//! - predicates `[@attr]`, `[@attr='v']`, `[@attr!='v']`, `[tag]`,
//!   `[tag='v']`, `[tag!='v']`, `[.='v']`, `[.!='v']`, `[n]`, `[last()]`
//!   and `[last()-n]`
//!
//! Anything outside that grammar is rejected when the path is compiled, so a
//! locator can never silently select nothing because of a typo.

use std::fmt;

use thiserror::Error;

/// A locator path that is not a valid element path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid element path '{path}': {reason}")]
pub struct ElementPathError {
    path: String,
    reason: String,
}

impl ElementPathError {
    fn new(path: &str, reason: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Which element names a step accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameTest {
    Any,
    Name(String),
}

impl NameTest {
    pub fn matches(&self, name: &str) -> bool {
        match self {
            NameTest::Any => true,
            NameTest::Name(expected) => expected == name,
        }
    }
}

/// Position among the siblings that share the element's name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// Zero-based index from the first sibling.
    First(usize),
    /// One-based offset from the last sibling; `[last()]` is `FromLast(1)`.
    FromLast(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    HasAttribute(String),
    Attribute {
        name: String,
        value: String,
        negated: bool,
    },
    HasChild(String),
    /// Compares the full text of the element itself (`child: None`) or of
    /// any child with the given name.
    Text {
        child: Option<String>,
        value: String,
        negated: bool,
    },
    Position(Position),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathStep {
    Child(NameTest),
    /// Every descendant, excluding the context element itself.
    Descendant(NameTest),
    SelfNode,
    Parent,
    Filter(Predicate),
}

/// A parsed element path, evaluated step by step against a context element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementPath {
    source: String,
    steps: Vec<PathStep>,
}

impl ElementPath {
    pub fn parse(path: &str) -> Result<Self, ElementPathError> {
        let mut source = path.to_string();
        if source.ends_with('/') {
            source.push('*');
        }
        if source.starts_with('/') {
            return Err(ElementPathError::new(path, "cannot use an absolute path"));
        }
        let tokens = tokenize(&source).map_err(|reason| ElementPathError::new(path, reason))?;
        if tokens.is_empty() {
            return Err(ElementPathError::new(path, "empty path"));
        }
        let steps = parse_steps(tokens).map_err(|reason| ElementPathError::new(path, reason))?;
        Ok(Self { source, steps })
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl fmt::Display for ElementPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// The search path used for an XML locator: the locator anywhere below the
/// record element.
pub fn xml_search_path(path: &str) -> String {
    format!(".//{path}")
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Name(String),
    Quoted(String),
    Slash,
    DoubleSlash,
    Dot,
    DotDot,
    Star,
    At,
    Equals,
    NotEquals,
    Call,
    Colon,
    OpenBracket,
    CloseBracket,
}

fn tokenize(path: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut rest = path;
    while let Some(c) = rest.chars().next() {
        let (token, len) = match c {
            '\'' | '"' => {
                let Some(end) = rest[1..].find(c) else {
                    return Err("unterminated string literal".to_string());
                };
                (Token::Quoted(rest[1..=end].to_string()), end + 2)
            }
            '/' if rest.starts_with("//") => (Token::DoubleSlash, 2),
            '/' => (Token::Slash, 1),
            '.' if rest.starts_with("..") => (Token::DotDot, 2),
            '.' => (Token::Dot, 1),
            '(' if rest.starts_with("()") => (Token::Call, 2),
            '!' if rest.starts_with("!=") => (Token::NotEquals, 2),
            '*' => (Token::Star, 1),
            '@' => (Token::At, 1),
            '=' => (Token::Equals, 1),
            ':' => (Token::Colon, 1),
            '[' => (Token::OpenBracket, 1),
            ']' => (Token::CloseBracket, 1),
            c if c.is_whitespace() => return Err("unexpected whitespace".to_string()),
            c if is_name_char(c) => {
                let len = rest.find(|c: char| !is_name_char(c)).unwrap_or(rest.len());
                let name = &rest[..len];
                if name.contains(':') {
                    return Err(format!("namespace prefix in '{name}' is not supported"));
                }
                (Token::Name(name.to_string()), len)
            }
            c => return Err(format!("unexpected character '{c}'")),
        };
        tokens.push(token);
        rest = &rest[len..];
    }
    Ok(tokens)
}

fn is_name_char(c: char) -> bool {
    !matches!(c, '/' | '[' | ']' | '(' | ')' | '@' | '!' | '=') && !c.is_whitespace()
}

fn parse_steps(tokens: Vec<Token>) -> Result<Vec<PathStep>, String> {
    let mut tokens = tokens.into_iter().peekable();
    let mut steps = Vec::new();
    while let Some(token) = tokens.next() {
        let step = match token {
            Token::Name(name) => PathStep::Child(NameTest::Name(name)),
            Token::Star => PathStep::Child(NameTest::Any),
            Token::Dot => PathStep::SelfNode,
            Token::DotDot => PathStep::Parent,
            Token::DoubleSlash => match tokens.next() {
                Some(Token::Name(name)) => PathStep::Descendant(NameTest::Name(name)),
                Some(Token::Star) => PathStep::Descendant(NameTest::Any),
                Some(_) => return Err("invalid descendant".to_string()),
                None => return Err("path ends after '//'".to_string()),
            },
            Token::OpenBracket => {
                let mut predicate = Vec::new();
                loop {
                    match tokens.next() {
                        Some(Token::CloseBracket) => break,
                        Some(token) => predicate.push(token),
                        None => return Err("unclosed predicate".to_string()),
                    }
                }
                PathStep::Filter(parse_predicate(&predicate)?)
            }
            Token::Colon => return Err("namespace prefixes are not supported".to_string()),
            _ => return Err("invalid path".to_string()),
        };
        steps.push(step);
        // Steps are separated by '/', except that predicates and '//' follow
        // directly.
        match tokens.peek() {
            Some(Token::Slash) => {
                tokens.next();
                if tokens.peek().is_none() {
                    return Err("invalid path".to_string());
                }
            }
            Some(Token::OpenBracket | Token::DoubleSlash) | None => {}
            Some(_) => return Err("invalid path".to_string()),
        }
    }
    Ok(steps)
}

fn parse_predicate(tokens: &[Token]) -> Result<Predicate, String> {
    let negated = tokens.iter().any(|t| *t == Token::NotEquals);
    let predicate = match tokens {
        [Token::At, Token::Name(name)] => Predicate::HasAttribute(name.clone()),
        [
            Token::At,
            Token::Name(name),
            Token::Equals | Token::NotEquals,
            Token::Quoted(value),
        ] => Predicate::Attribute {
            name: name.clone(),
            value: value.clone(),
            negated,
        },
        [Token::Dot, Token::Equals | Token::NotEquals, Token::Quoted(value)] => Predicate::Text {
            child: None,
            value: value.clone(),
            negated,
        },
        [Token::Name(name)] if is_integer(name) => {
            let position: i64 = name
                .parse()
                .map_err(|_| format!("position '{name}' is out of range"))?;
            let index = usize::try_from(position - 1)
                .map_err(|_| "position must be 1 or greater".to_string())?;
            Predicate::Position(Position::First(index))
        }
        [Token::Name(name)] => Predicate::HasChild(name.clone()),
        [
            Token::Name(name),
            Token::Equals | Token::NotEquals,
            Token::Quoted(value),
        ] if !is_integer(name) => Predicate::Text {
            child: Some(name.clone()),
            value: value.clone(),
            negated,
        },
        [Token::Name(function), Token::Call] => {
            check_last(function)?;
            Predicate::Position(Position::FromLast(1))
        }
        [Token::Name(function), Token::Call, Token::Name(offset)] => {
            check_last(function)?;
            // The tokenizer keeps the sign with the number: `last()-1`.
            let offset: i64 = offset
                .parse()
                .map_err(|_| format!("unsupported expression '{offset}'"))?;
            if offset >= 0 {
                return Err("offset from last() must be negative".to_string());
            }
            let from_last = usize::try_from(1 - offset)
                .map_err(|_| "offset from last() is out of range".to_string())?;
            Predicate::Position(Position::FromLast(from_last))
        }
        _ => return Err("invalid predicate".to_string()),
    };
    Ok(predicate)
}

fn check_last(function: &str) -> Result<(), String> {
    if function == "last" {
        Ok(())
    } else {
        Err(format!("unsupported function '{function}()'"))
    }
}

fn is_integer(value: &str) -> bool {
    let digits = value.strip_prefix('-').unwrap_or(value);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}
