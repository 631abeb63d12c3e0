pub const DEFAULT_PROMPT: &str = "(gdb)";
pub const DEFAULT_EVENT_CAPACITY: usize = 256;
pub const DEFAULT_MAX_LINE_LENGTH: usize = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mi2Config {
    /// Sentinel line the peer prints between commands. Matched after trimming
    /// trailing whitespace, so gdb's `(gdb) ` is covered by the default.
    pub prompt: String,
    pub event_capacity: usize,
    pub max_line_length: usize,
}

impl Default for Mi2Config {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }
}

impl Mi2Config {
    pub fn new(prompt: impl Into<String>, event_capacity: usize) -> Self {
        Self {
            prompt: prompt.into(),
            event_capacity,
            ..Self::default()
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let prompt = lookup("MI2_PROMPT").unwrap_or(defaults.prompt);

        let event_capacity = lookup("MI2_EVENT_CAPACITY")
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(defaults.event_capacity);

        let max_line_length = lookup("MI2_MAX_LINE_LENGTH")
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(defaults.max_line_length);

        Self {
            prompt,
            event_capacity,
            max_line_length,
        }
    }

    pub fn with_max_line_length(mut self, max_line_length: usize) -> Self {
        self.max_line_length = max_line_length;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Mi2Config::default();
        assert_eq!(config.prompt, "(gdb)");
        assert_eq!(config.event_capacity, 256);
        assert_eq!(config.max_line_length, 1024 * 1024);
    }

    #[test]
    fn test_new_config() {
        let config = Mi2Config::new("(lldb)", 8);
        assert_eq!(config.prompt, "(lldb)");
        assert_eq!(config.event_capacity, 8);
        assert_eq!(config.max_line_length, DEFAULT_MAX_LINE_LENGTH);
    }

    #[test]
    fn test_from_lookup_defaults() {
        let config = Mi2Config::from_lookup(lookup_from(&[]));
        assert_eq!(config, Mi2Config::default());
    }

    #[test]
    fn test_from_lookup_custom() {
        let config = Mi2Config::from_lookup(lookup_from(&[
            ("MI2_PROMPT", "(rr)"),
            ("MI2_EVENT_CAPACITY", "32"),
            ("MI2_MAX_LINE_LENGTH", "4096"),
        ]));
        assert_eq!(config.prompt, "(rr)");
        assert_eq!(config.event_capacity, 32);
        assert_eq!(config.max_line_length, 4096);
    }

    #[test]
    fn test_from_lookup_ignores_invalid_numbers() {
        let config = Mi2Config::from_lookup(lookup_from(&[
            ("MI2_EVENT_CAPACITY", "0"),
            ("MI2_MAX_LINE_LENGTH", "lots"),
        ]));
        assert_eq!(config.event_capacity, DEFAULT_EVENT_CAPACITY);
        assert_eq!(config.max_line_length, DEFAULT_MAX_LINE_LENGTH);
    }
}
