use serde::Serialize;

use crate::grammar::{self, ParseError, Record, Value};
use crate::{Mi2Error, Result};

const UNKNOWN_ERROR: &str = "An unknown error occurred";

/// A result record (`^done`, `^error,msg="..."`). Only produced when a caller asks
/// for a reply explicitly; the generic line dispatcher yields [`super::EventMessage`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplyMessage {
    name: String,
    params: Record,
}

impl ReplyMessage {
    pub(crate) fn from_parts(name: String, params: Record) -> Self {
        Self { name, params }
    }

    pub fn new(name: impl Into<String>) -> Self {
        Self::from_parts(name.into(), Record::new())
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Parses `[^]status[,key=value]*`; the `^` is optional.
    pub fn parse(line: &str) -> std::result::Result<Self, ParseError> {
        let body = line.strip_prefix('^').unwrap_or(line);
        let (name, rest) = grammar::parse_word(body);
        let params = grammar::parse_params(rest)?;
        Ok(Self::from_parts(name.to_string(), params))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &Record {
        &self.params
    }

    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.param(key).and_then(Value::as_str)
    }

    pub fn is_error(&self) -> bool {
        self.name == "error"
    }

    /// Turns an `^error` reply into [`Mi2Error::Reply`] carrying its `msg`.
    pub fn check_error(&self) -> Result<()> {
        if !self.is_error() {
            return Ok(());
        }
        let message = self.param_str("msg").unwrap_or(UNKNOWN_ERROR);
        Err(Mi2Error::reply(message))
    }

    pub fn serialize(&self) -> Option<Vec<u8>> {
        let mut line = format!("^{}", self.name);
        grammar::write_entries(&mut line, &self.params, true).ok()?;
        line.push('\n');
        Some(line.into_bytes())
    }
}
