//! Placeholder interior parser.
//!
//! Turns the text between `{{` and `}}` into a head reference plus an
//! ordered filter pipeline. All offsets stay absolute (relative to the
//! whole template) so errors point at the right place.

use crate::error::{Error, Position, Result};
use crate::scanner::{snippet, RawPlaceholder};
use regex::Regex;
use std::sync::LazyLock;

static HEAD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?i:(var|env))\.(.+)$").expect("valid head pattern"));

/// What a placeholder refers to before any filters run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Head {
    Variable(String),
    Environment(String),
}

/// One pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCall {
    pub name: String,
    pub args: Vec<String>,
    /// Byte offset of the filter name in the template.
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPlaceholder {
    pub head: Head,
    /// Byte offset of the head token in the template.
    pub head_offset: usize,
    pub pipeline: Vec<FilterCall>,
}

fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

/// Owned read position over one placeholder interior.
struct Cursor<'a> {
    source: &'a str,
    pos: usize,
    end: usize,
}

impl<'a> Cursor<'a> {
    fn rest(&self) -> &'a str {
        &self.source[self.pos..self.end]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.end
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(is_space) {
            self.bump();
        }
    }

    fn take_until(&mut self, stop: impl Fn(char) -> bool) -> &'a str {
        let rest = self.rest();
        let len = rest.find(stop).unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    fn position_of(&self, offset: usize) -> Position {
        Position::locate(self.source, offset)
    }

    fn position(&self) -> Position {
        self.position_of(self.pos)
    }

    fn head(&mut self) -> Result<(Head, usize)> {
        let offset = self.pos;
        let token = self.take_until(|c| c == '|' || is_space(c));
        let caps = HEAD_RE.captures(token).ok_or_else(|| Error::InvalidHead {
            position: self.position_of(offset),
            head: token.to_string(),
        })?;
        let name = caps[2].to_string();
        let head = if caps[1].eq_ignore_ascii_case("var") {
            Head::Variable(name)
        } else {
            Head::Environment(name)
        };
        Ok((head, offset))
    }

    fn filter(&mut self) -> Result<FilterCall> {
        self.skip_whitespace();
        let offset = self.pos;
        let name = self.take_until(|c| c == ':' || c == '|' || is_space(c));
        if name.is_empty() {
            return Err(Error::MissingFilterName { position: self.position() });
        }
        let mut args = Vec::new();
        loop {
            self.skip_whitespace();
            if self.peek() != Some(':') {
                break;
            }
            self.bump();
            args.push(self.argument(name)?);
        }
        Ok(FilterCall { name: name.to_string(), args, offset })
    }

    fn argument(&mut self, filter: &str) -> Result<String> {
        let start = self.pos;
        let value = if self.peek() == Some('"') {
            self.bump();
            self.quoted(filter, start)?
        } else {
            self.take_until(|c| c == ':' || c == '|' || c == '}' || is_space(c)).to_string()
        };
        if value.is_empty() {
            return Err(Error::EmptyFilterArgument {
                position: self.position_of(start),
                filter: filter.to_string(),
            });
        }
        Ok(value)
    }

    /// Only `\"` and `\\` are escapes; any other backslash stays as written.
    fn quoted(&mut self, filter: &str, start: usize) -> Result<String> {
        let mut value = String::new();
        loop {
            match self.bump() {
                Some('"') => return Ok(value),
                Some('\\') => match self.peek() {
                    Some(c @ ('"' | '\\')) => {
                        self.bump();
                        value.push(c);
                    }
                    _ => value.push('\\'),
                },
                Some(c) => value.push(c),
                None => {
                    return Err(Error::UnterminatedArgument {
                        position: self.position_of(start),
                        filter: filter.to_string(),
                        snippet: snippet(&self.source[start..self.end]),
                    })
                }
            }
        }
    }
}

/// Parses one placeholder found in `source`.
pub fn parse_placeholder(source: &str, placeholder: &RawPlaceholder<'_>) -> Result<ParsedPlaceholder> {
    let mut cursor = Cursor {
        source,
        pos: placeholder.interior_start,
        end: placeholder.interior_start + placeholder.interior.len(),
    };

    cursor.skip_whitespace();
    let (head, head_offset) = cursor.head()?;

    let mut pipeline = Vec::new();
    loop {
        cursor.skip_whitespace();
        if cursor.at_end() {
            break;
        }
        if cursor.peek() != Some('|') {
            let position = cursor.position();
            let token = cursor.take_until(is_space);
            return Err(Error::UnexpectedToken { position, token: token.to_string() });
        }
        cursor.bump();
        pipeline.push(cursor.filter()?);
    }

    Ok(ParsedPlaceholder { head, head_offset, pipeline })
}
