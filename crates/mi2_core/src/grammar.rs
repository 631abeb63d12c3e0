//! Value grammar used inside MI2 records.
//!
//! Every function takes the unconsumed input and returns the decoded fragment
//! together with the remaining input. Nothing here allocates beyond the decoded
//! values and nothing panics on malformed input.

use std::fmt::{self, Write as _};

use indexmap::IndexMap;
use serde::Serialize;
use thiserror::Error;

/// Ordered `key=value` mapping. Keys keep their parse order; a repeated key
/// overwrites the earlier value in place.
pub type Record = IndexMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    String(String),
    Record(Record),
    List(Vec<Value>),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unterminated quoted string")]
    UnterminatedString,

    #[error("expected {expected}, found {}", describe(.found))]
    Expected {
        expected: &'static str,
        found: Option<char>,
    },

    #[error("unterminated {0}")]
    Unclosed(&'static str),

    #[error("octal escape \\{0:o} does not fit in a byte")]
    OctalOutOfRange(u32),

    #[error("unexpected trailing input {0:?}")]
    TrailingInput(String),
}

fn describe(found: &Option<char>) -> String {
    match found {
        Some(c) => format!("{c:?}"),
        None => "end of input".to_string(),
    }
}

fn expected(expected: &'static str, input: &str) -> ParseError {
    ParseError::Expected {
        expected,
        found: input.chars().next(),
    }
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Looks up `key` when this value is a record.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_record().and_then(|record| record.get(key))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

/// Writes the value back in wire form.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "\"{}\"", escape(s)),
            Value::Record(record) => {
                f.write_char('{')?;
                write_entries(f, record, false)?;
                f.write_char('}')
            }
            Value::List(items) => {
                f.write_char('[')?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_char(',')?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_char(']')
            }
        }
    }
}

/// Writes `key=value` pairs separated by commas. With `leading_comma` every pair,
/// including the first, is preceded by a comma, which is the shape used after an
/// event or reply name.
pub(crate) fn write_entries(
    out: &mut impl fmt::Write,
    record: &Record,
    leading_comma: bool,
) -> fmt::Result {
    for (i, (key, value)) in record.iter().enumerate() {
        if leading_comma || i > 0 {
            out.write_char(',')?;
        }
        write!(out, "{key}={value}")?;
    }
    Ok(())
}

/// C-style escaping, the inverse of [`parse_quoted_string`].
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\u{7}' => out.push_str("\\a"),
            '\u{8}' => out.push_str("\\b"),
            '\u{b}' => out.push_str("\\v"),
            '\u{c}' => out.push_str("\\f"),
            c if (c as u32) < 0x20 || c == '\u{7f}' => {
                let _ = write!(out, "\\{:03o}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

/// Escapes `input` and wraps it in double quotes.
pub fn quote(input: &str) -> String {
    format!("\"{}\"", escape(input))
}

/// Decodes a double-quoted string. Octal escapes produce raw bytes, so gdb's
/// byte-wise escaping of multi-byte characters decodes to the original text.
pub fn parse_quoted_string(input: &str) -> Result<(String, &str), ParseError> {
    let body = input
        .strip_prefix('"')
        .ok_or_else(|| expected("'\"'", input))?;

    let mut bytes = Vec::with_capacity(body.len());
    let mut chars = body.char_indices();

    while let Some((idx, ch)) = chars.next() {
        match ch {
            '"' => {
                let text = String::from_utf8(bytes)
                    .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned());
                return Ok((text, &body[idx + 1..]));
            }
            '\\' => {
                let Some((_, escaped)) = chars.next() else {
                    break;
                };
                match escaped {
                    'n' => bytes.push(b'\n'),
                    't' => bytes.push(b'\t'),
                    'r' => bytes.push(b'\r'),
                    'a' => bytes.push(0x07),
                    'b' => bytes.push(0x08),
                    'v' => bytes.push(0x0b),
                    'f' => bytes.push(0x0c),
                    '0'..='7' => {
                        let mut code = escaped as u32 - '0' as u32;
                        for _ in 0..2 {
                            let mut lookahead = chars.clone();
                            match lookahead.next() {
                                Some((_, digit @ '0'..='7')) => {
                                    code = code * 8 + (digit as u32 - '0' as u32);
                                    chars = lookahead;
                                }
                                _ => break,
                            }
                        }
                        let byte =
                            u8::try_from(code).map_err(|_| ParseError::OctalOutOfRange(code))?;
                        bytes.push(byte);
                    }
                    other => push_char(&mut bytes, other),
                }
            }
            other => push_char(&mut bytes, other),
        }
    }

    Err(ParseError::UnterminatedString)
}

fn push_char(bytes: &mut Vec<u8>, ch: char) {
    let mut buf = [0u8; 4];
    bytes.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
}

/// Consumes up to the first comma, `=`, or whitespace. May return an empty word.
pub fn parse_word(input: &str) -> (&str, &str) {
    let end = input
        .find(|c: char| c == ',' || c == '=' || c.is_whitespace())
        .unwrap_or(input.len());
    input.split_at(end)
}

/// Parses a quoted string, a record, or a list depending on the next character.
pub fn parse_value(input: &str) -> Result<(Value, &str), ParseError> {
    match input.chars().next() {
        Some('"') => {
            let (s, rest) = parse_quoted_string(input)?;
            Ok((Value::String(s), rest))
        }
        Some('{') => parse_record(input),
        Some('[') => parse_list(input),
        _ => Err(expected("a value", input)),
    }
}

/// Parses `{key=value,...}`, or a bare `key=value,...` sequence when the input
/// does not open with `{`. A bare sequence ends at `}` (left unconsumed) or at
/// end of input.
pub fn parse_record(input: &str) -> Result<(Value, &str), ParseError> {
    let (record, rest) = parse_record_entries(input)?;
    Ok((Value::Record(record), rest))
}

fn parse_record_entries(input: &str) -> Result<(Record, &str), ParseError> {
    let (braced, mut rest) = match input.strip_prefix('{') {
        Some(inner) => (true, inner),
        None => (false, input),
    };
    let mut record = Record::new();

    loop {
        rest = rest.strip_prefix(',').unwrap_or(rest);
        match rest.chars().next() {
            None if braced => return Err(ParseError::Unclosed("record")),
            None => break,
            Some('}') => {
                if braced {
                    rest = &rest[1..];
                }
                break;
            }
            Some(_) => {}
        }

        let (key, after_key) = parse_word(rest);
        let after_eq = after_key.strip_prefix('=').unwrap_or(after_key);
        let (value, after_value) = parse_value(after_eq)?;
        record.insert(key.to_string(), value);
        rest = after_value;
    }

    Ok((record, rest))
}

/// Parses `[value,...]`. gdb also emits result lists (`[frame={...},frame={...}]`);
/// each `name=value` element becomes a one-entry record.
pub fn parse_list(input: &str) -> Result<(Value, &str), ParseError> {
    let mut rest = input
        .strip_prefix('[')
        .ok_or_else(|| expected("'['", input))?;
    let mut items = Vec::new();

    loop {
        rest = rest.strip_prefix(',').unwrap_or(rest);
        match rest.chars().next() {
            None => return Err(ParseError::Unclosed("list")),
            Some(']') => {
                rest = &rest[1..];
                break;
            }
            Some('"' | '{' | '[') => {
                let (value, after) = parse_value(rest)?;
                items.push(value);
                rest = after;
            }
            Some(_) => {
                let (name, after_name) = parse_word(rest);
                if name.is_empty() {
                    return Err(expected("a value", rest));
                }
                let after_eq = after_name
                    .strip_prefix('=')
                    .ok_or_else(|| expected("'='", after_name))?;
                let (value, after) = parse_value(after_eq)?;
                let mut entry = Record::new();
                entry.insert(name.to_string(), value);
                items.push(Value::Record(entry));
                rest = after;
            }
        }
    }

    Ok((Value::List(items), rest))
}

/// Parses the parameter tail of an event or reply (`,key=value,...`) and
/// rejects anything left over.
pub fn parse_params(input: &str) -> Result<Record, ParseError> {
    let (record, rest) = parse_record_entries(input)?;
    if !rest.is_empty() {
        return Err(ParseError::TrailingInput(rest.to_string()));
    }
    Ok(record)
}
