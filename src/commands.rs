//! Conversation commands that drive stats collection.

use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

/// A slash command typed into a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsCommand {
    /// `/statsstart`: begin collecting on this connection.
    Start,
    /// `/statsstop`: stop and discard pending work.
    Stop,
    /// `/stats`: write the report into the conversation.
    Report,
}

impl StatsCommand {
    pub const ALL: [StatsCommand; 3] = [Self::Start, Self::Stop, Self::Report];

    pub fn name(self) -> &'static str {
        match self {
            Self::Start => "statsstart",
            Self::Stop => "statsstop",
            Self::Report => "stats",
        }
    }

    pub fn help(self) -> &'static str {
        match self {
            Self::Start => "statsstart: Start collecting client VERSION statistics.",
            Self::Stop => "statsstop: Stop collecting client VERSION statistics.",
            Self::Report => "stats: Show the client VERSION statistics collected so far.",
        }
    }
}

impl fmt::Display for StatsCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.name())
    }
}

impl FromStr for StatsCommand {
    type Err = ParseError;

    /// Accepts `/name` with optional trailing arguments, which are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let word = s.split_whitespace().next().ok_or(ParseError::Empty)?;
        let name = word.strip_prefix('/').unwrap_or(word);
        Self::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| ParseError::UnknownCommand(word.to_owned()))
    }
}
