use serde::Serialize;

use super::ReplyMessage;
use crate::grammar::{self, ParseError, Record, Value};

/// Which out-of-band record an event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// `*` exec-async: target state changes such as `*stopped` and `*running`.
    Exec,
    /// `=` notify-async: `=breakpoint-created`, `=thread-group-added` and friends.
    Notify,
    /// `^` result record: `^done`, `^error`, `^running`.
    Result,
}

impl EventKind {
    pub fn from_prefix(prefix: char) -> Option<Self> {
        match prefix {
            '*' => Some(EventKind::Exec),
            '=' => Some(EventKind::Notify),
            '^' => Some(EventKind::Result),
            _ => None,
        }
    }

    pub fn prefix(self) -> char {
        match self {
            EventKind::Exec => '*',
            EventKind::Notify => '=',
            EventKind::Result => '^',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventMessage {
    kind: EventKind,
    name: String,
    params: Record,
}

impl EventMessage {
    pub fn new(kind: EventKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            params: Record::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Parses `<prefix><name>[,key=value]*`. Anything after the last parameter is
    /// rejected.
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let mut chars = line.chars();
        let kind = chars
            .next()
            .and_then(EventKind::from_prefix)
            .ok_or(ParseError::Expected {
                expected: "one of '*', '=', '^'",
                found: line.chars().next(),
            })?;

        let (name, rest) = grammar::parse_word(chars.as_str());
        let params = grammar::parse_params(rest)?;

        Ok(Self {
            kind,
            name: name.to_string(),
            params,
        })
    }

    pub fn kind(&self) -> EventKind {
        self.kind
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

    /// Views a `^` result record as a reply. Other kinds return `None`.
    pub fn as_reply(&self) -> Option<ReplyMessage> {
        (self.kind == EventKind::Result)
            .then(|| ReplyMessage::from_parts(self.name.clone(), self.params.clone()))
    }

    pub fn serialize(&self) -> Option<Vec<u8>> {
        let mut line = String::with_capacity(self.name.len() + 2);
        line.push(self.kind.prefix());
        line.push_str(&self.name);
        grammar::write_entries(&mut line, &self.params, true).ok()?;
        line.push('\n');
        Some(line.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_stopped_event_with_nested_frame() {
        let event = EventMessage::parse(
            r#"*stopped,reason="breakpoint-hit",bkptno="1",frame={func="main",args=[]},thread-id="1""#,
        )
        .unwrap();

        assert_eq!(event.kind(), EventKind::Exec);
        assert_eq!(event.name(), "stopped");
        assert_eq!(event.param_str("reason"), Some("breakpoint-hit"));
        assert_eq!(event.param_str("thread-id"), Some("1"));

        let frame = event.param("frame").unwrap();
        assert_eq!(frame.get("func"), Some(&Value::from("main")));
        assert_eq!(frame.get("args"), Some(&Value::List(Vec::new())));
    }

    #[test]
    fn event_without_params() {
        let event = EventMessage::parse("^running").unwrap();
        assert_eq!(event.kind(), EventKind::Result);
        assert_eq!(event.name(), "running");
        assert!(event.params().is_empty());
    }

    #[test]
    fn rejects_wrong_prefix_and_trailing_garbage() {
        assert!(EventMessage::parse("~\"x\"").is_err());
        assert_eq!(
            EventMessage::parse(r#"=done,a="1"}"#),
            Err(ParseError::TrailingInput("}".to_string()))
        );
    }

    #[test]
    fn serialize_reproduces_wire_form() {
        let line = r#"=breakpoint-deleted,id="3",extra={a=["x"]}"#;
        let event = EventMessage::parse(line).unwrap();
        assert_eq!(event.serialize(), Some(format!("{line}\n").into_bytes()));
    }

    #[test]
    fn builder_and_reply_view() {
        let event = EventMessage::new(EventKind::Result, "error")
            .with_param("msg", "No symbol \"foo\" in current context.");
        let reply = event.as_reply().unwrap();
        assert_eq!(reply.name(), "error");
        assert!(reply.is_error());

        let exec = EventMessage::new(EventKind::Exec, "running");
        assert_eq!(exec.as_reply(), None);
    }
}
