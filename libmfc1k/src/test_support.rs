// libmfc1k/src/test_support.rs

//! Shared fixtures: a command loop over a `MockReader`, driven by a manual
//! clock and an in-memory script.
#![allow(dead_code)]

use std::io::Cursor;

use crate::cancellation::CancellationToken;
use crate::clock::ManualClock;
use crate::command::{CommandLoop, LineReader};
use crate::config::AppConfig;
use crate::reader::MockReader;
use crate::Result;

/// Command loop over a MockReader, driven by a ManualClock so card waits
/// finish instantly.
#[doc(hidden)]
pub fn mock_command_loop(
    reader: MockReader,
    config: AppConfig,
) -> CommandLoop<MockReader, ManualClock> {
    CommandLoop::new(reader, ManualClock::new(), config, CancellationToken::new())
}

/// Feed `input` to the loop and return everything it printed.
#[doc(hidden)]
pub fn run_script(app: &mut CommandLoop<MockReader, ManualClock>, input: &str) -> Result<String> {
    let mut lines = LineReader::new(Cursor::new(input.to_string()));
    let mut out = Vec::new();
    app.run(&mut lines, &mut out)?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}
