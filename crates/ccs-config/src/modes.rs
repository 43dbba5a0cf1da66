use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Output format of the service log stream.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One JSON object per event, fields flattened.
    #[default]
    Json,
    /// Terse single-line text for terminals.
    Compact,
}

/// How the listener schedules accepted connections.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum DispatchMode {
    /// Handle each connection to completion on the accept thread before
    /// accepting the next one. Requests are totally ordered.
    #[default]
    Serial,
    /// Hand each accepted connection to its own thread.
    Concurrent,
}

/// Errors encountered while parsing a [`LogFormat`] or [`DispatchMode`].
pub type ModeParseError = strum::ParseError;

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("json", LogFormat::Json)]
    #[case("COMPACT", LogFormat::Compact)]
    fn parses_log_formats(#[case] input: &str, #[case] expected: LogFormat) {
        assert_eq!(input.parse::<LogFormat>().expect("log format"), expected);
    }

    #[rstest]
    #[case("serial", DispatchMode::Serial)]
    #[case("Concurrent", DispatchMode::Concurrent)]
    fn parses_dispatch_modes(#[case] input: &str, #[case] expected: DispatchMode) {
        assert_eq!(input.parse::<DispatchMode>().expect("dispatch mode"), expected);
    }

    #[test]
    fn rejects_unknown_dispatch_mode() {
        assert!("pipelined".parse::<DispatchMode>().is_err());
    }
}
