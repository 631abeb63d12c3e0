use std::fmt;

use serde::Serialize;

/// The `reason` carried by a `*stopped` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StopReason {
    Unknown,
    BreakpointHit,
    ExitedNormally,
    Exited,
    ExitedSignalled,
    EndSteppingRange,
    FunctionFinished,
    SignalReceived,
    LocationReached,
}

impl StopReason {
    const ALL: [StopReason; 9] = [
        StopReason::Unknown,
        StopReason::BreakpointHit,
        StopReason::ExitedNormally,
        StopReason::Exited,
        StopReason::ExitedSignalled,
        StopReason::EndSteppingRange,
        StopReason::FunctionFinished,
        StopReason::SignalReceived,
        StopReason::LocationReached,
    ];

    /// Missing or unrecognised reasons map to [`StopReason::Unknown`].
    pub fn parse(reason: Option<&str>) -> Self {
        reason
            .and_then(|reason| Self::ALL.into_iter().find(|r| r.as_str() == reason))
            .unwrap_or(StopReason::Unknown)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StopReason::Unknown => "unknown",
            StopReason::BreakpointHit => "breakpoint-hit",
            StopReason::ExitedNormally => "exited-normally",
            StopReason::Exited => "exited",
            StopReason::ExitedSignalled => "exited-signalled",
            StopReason::EndSteppingRange => "end-stepping-range",
            StopReason::FunctionFinished => "function-finished",
            StopReason::SignalReceived => "signal-received",
            StopReason::LocationReached => "location-reached",
        }
    }

    /// True when the inferior is gone rather than paused.
    pub fn is_exit(self) -> bool {
        matches!(
            self,
            StopReason::ExitedNormally | StopReason::Exited | StopReason::ExitedSignalled
        )
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_reasons() {
        assert_eq!(StopReason::parse(Some("breakpoint-hit")), StopReason::BreakpointHit);
        assert_eq!(StopReason::parse(Some("exited-normally")), StopReason::ExitedNormally);
        assert_eq!(StopReason::parse(Some("end-stepping-range")), StopReason::EndSteppingRange);
    }

    #[test]
    fn unknown_and_missing_reasons() {
        assert_eq!(StopReason::parse(Some("watchpoint-scope")), StopReason::Unknown);
        assert_eq!(StopReason::parse(None), StopReason::Unknown);
    }

    #[test]
    fn names_round_trip() {
        for reason in StopReason::ALL {
            assert_eq!(StopReason::parse(Some(reason.as_str())), reason);
        }
        assert!(StopReason::ExitedSignalled.is_exit());
        assert!(!StopReason::SignalReceived.is_exit());
    }

    #[test]
    fn serializes_as_wire_name() {
        let json = serde_json::to_string(&StopReason::BreakpointHit).unwrap();
        assert_eq!(json, "\"breakpoint-hit\"");
    }
}
