use std::{iter::Peekable, str::Chars};

use crate::DataPathCompileError::{self, EmptyPath, ParseError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathAst {
    pub edges: Vec<EdgeAst>,
    pub slice: Option<SliceAst>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeAst {
    Field(String),
    Index(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceAst {
    /// `[]`: the whole value, no narrowing.
    Whole,
    /// `[start:end]`
    Range(i64, i64),
}

enum Segment {
    Edge(EdgeAst),
    Slice(SliceAst),
}

pub fn parse_signing_path(source: &str) -> Result<PathAst, DataPathCompileError> {
    Parser::new(source).parse()
}

struct Parser<'s> {
    chars: Peekable<Chars<'s>>,
}

impl<'s> Parser<'s> {
    fn new(source: &'s str) -> Self {
        Parser {
            chars: source.chars().peekable(),
        }
    }

    fn parse(mut self) -> Result<PathAst, DataPathCompileError> {
        if self.chars.peek().is_none() {
            return Err(EmptyPath);
        }

        let mut edges = Vec::new();
        let mut slice = None;
        loop {
            match self.segment()? {
                Segment::Edge(edge) => edges.push(edge),
                Segment::Slice(s) => slice = Some(s),
            }
            if self.chars.peek().is_none() {
                break;
            }
            if slice.is_some() {
                return Err(ParseError(
                    "slice selector must be the last segment".to_string(),
                ));
            }
            self.char('.')?;
        }

        if edges.is_empty() {
            return Err(EmptyPath);
        }
        Ok(PathAst { edges, slice })
    }

    fn segment(&mut self) -> Result<Segment, DataPathCompileError> {
        match self.chars.peek() {
            Some(&'[') => self.bracket(),
            Some(&c) if c.is_ascii_alphabetic() || c == '_' => {
                self.name().map(|name| Segment::Edge(EdgeAst::Field(name)))
            }
            _ => Err(self.expected("a field name or `[`")),
        }
    }

    fn bracket(&mut self) -> Result<Segment, DataPathCompileError> {
        self.char('[')?;
        if self.chars.peek() == Some(&']') {
            self.chars.next();
            return Ok(Segment::Slice(SliceAst::Whole));
        }

        let start = self.int()?;
        if self.chars.peek() == Some(&':') {
            self.chars.next();
            let end = self.int()?;
            self.char(']')?;
            Ok(Segment::Slice(SliceAst::Range(start, end)))
        } else {
            self.char(']')?;
            Ok(Segment::Edge(EdgeAst::Index(start)))
        }
    }

    fn name(&mut self) -> Result<String, DataPathCompileError> {
        let mut name = String::new();
        match self.chars.peek() {
            Some(&c) if c.is_ascii_alphabetic() || c == '_' => {
                name.push(c);
                self.chars.next();
            }
            _ => return Err(self.expected("a field name")),
        }

        while let Some(c) = self
            .chars
            .peek()
            .filter(|&&c| c.is_ascii_alphanumeric() || c == '_')
        {
            name.push(*c);
            self.chars.next();
        }

        Ok(name)
    }

    fn int(&mut self) -> Result<i64, DataPathCompileError> {
        let mut digits = String::new();
        if self.chars.peek() == Some(&'-') {
            digits.push('-');
            self.chars.next();
        }

        while let Some(&c) = self.chars.peek().filter(|&&c| c.is_ascii_digit()) {
            digits.push(c);
            self.chars.next();
        }

        if digits.is_empty() || digits == "-" {
            return Err(self.expected("an integer"));
        }

        digits
            .parse()
            .map_err(|_| ParseError(format!("integer out of range: {}", digits)))
    }

    fn char(&mut self, c: char) -> Result<(), DataPathCompileError> {
        if self.chars.peek() == Some(&c) {
            self.chars.next();
            Ok(())
        } else {
            Err(self.expected(format!("`{}`", c)))
        }
    }

    fn expected(&mut self, expected: impl Into<String>) -> DataPathCompileError {
        match self.chars.peek() {
            Some(c) => ParseError(format!("expected {}, found `{}`", expected.into(), c)),
            None => ParseError(format!(
                "expected {}, reached end of string",
                expected.into()
            )),
        }
    }
}
