use serde::Serialize;

use crate::grammar::{self, Record, Value};

/// A breakpoint location, either built locally for `-break-insert` or decoded
/// from a `bkpt={...}` record sent by gdb.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Breakpoint {
    pub id: Option<u32>,
    pub linespec: Option<String>,
    pub filename: Option<String>,
    pub function: Option<String>,
    pub line_offset: Option<u32>,
    pub address: Option<String>,
}

impl Breakpoint {
    pub fn at_function(function: impl Into<String>) -> Self {
        Self {
            function: Some(function.into()),
            ..Self::default()
        }
    }

    pub fn at_line(filename: impl Into<String>, line: u32) -> Self {
        Self {
            filename: Some(filename.into()),
            line_offset: Some(line),
            ..Self::default()
        }
    }

    pub fn at_address(address: impl Into<String>) -> Self {
        Self {
            address: Some(address.into()),
            ..Self::default()
        }
    }

    pub fn with_linespec(mut self, linespec: impl Into<String>) -> Self {
        self.linespec = Some(linespec.into());
        self
    }

    pub fn with_function(mut self, function: impl Into<String>) -> Self {
        self.function = Some(function.into());
        self
    }

    /// Builds the `-break-insert` command for this location.
    pub fn to_command(&self) -> String {
        let mut command = String::from("-break-insert");

        if let Some(linespec) = &self.linespec {
            command.push(' ');
            command.push_str(&argument(linespec));
        }
        if let Some(filename) = &self.filename {
            command.push_str(" --source ");
            command.push_str(&argument(filename));
        }
        if let Some(function) = &self.function {
            command.push_str(" --function ");
            command.push_str(&argument(function));
        }
        if let Some(line) = self.line_offset.filter(|line| *line > 0) {
            command.push_str(&format!(" --line {line}"));
        }
        if let Some(address) = &self.address {
            command.push(' ');
            command.push_str(&argument(address));
        }

        command
    }

    /// Decodes gdb's breakpoint tuple (`number`, `file`, `func`, `line`, `addr`,
    /// `original-location`). Unknown fields are ignored.
    pub fn from_record(record: &Record) -> Self {
        let text = |key: &str| record.get(key).and_then(Value::as_str).map(str::to_string);
        let number = |key: &str| {
            record
                .get(key)
                .and_then(Value::as_str)
                .and_then(|v| v.parse::<u32>().ok())
        };

        Self {
            id: number("number"),
            linespec: text("original-location"),
            filename: text("file"),
            function: text("func"),
            line_offset: number("line"),
            address: text("addr"),
        }
    }
}

/// MI arguments containing blanks or quotes must be sent as C strings.
fn argument(raw: &str) -> String {
    if raw.is_empty() || raw.contains(|c: char| c.is_whitespace() || c == '"') {
        grammar::quote(raw)
    } else {
        raw.to_string()
    }
}
