// libmfc1k/src/command/protocol.rs

//! Command keywords.

use derive_more::Display;

/// A command line received from the host.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum Command {
    /// `*IDN?`
    #[display(fmt = "*IDN?")]
    Identify,
    /// `READ`: dump the next card presented
    #[display(fmt = "READ")]
    Read,
    /// `WRITE`: the next line carries the payload
    #[display(fmt = "WRITE")]
    Write,
    /// Anything else, echoed back
    #[display(fmt = "{}", _0)]
    Unknown(String),
}

impl Command {
    /// Parse one trimmed input line. Keywords are matched case-insensitively.
    /// Returns `None` for blank lines.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let command = if line.eq_ignore_ascii_case("*IDN?") {
            Self::Identify
        } else if line.eq_ignore_ascii_case("READ") {
            Self::Read
        } else if line.eq_ignore_ascii_case("WRITE") {
            Self::Write
        } else {
            Self::Unknown(line.to_string())
        };
        Some(command)
    }

    /// Whether the command consumes a second line as its argument.
    pub fn takes_payload(&self) -> bool {
        matches!(self, Self::Write)
    }
}
