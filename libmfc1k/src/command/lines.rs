// libmfc1k/src/command/lines.rs

//! Host input sources.

use std::io::BufRead;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use crate::cancellation::CancellationToken;
use crate::Result;

/// Source of host command lines.
pub trait LineSource {
    /// Next line without its terminator. `Ok(None)` at end of input,
    /// `Err(Interrupted)` once `token` is canceled.
    fn next_line(&mut self, token: &CancellationToken) -> Result<Option<String>>;
}

/// Blocking lines from any `BufRead`. Cancellation is only seen between
/// lines, so this suits scripted input and tests.
pub struct LineReader<R> {
    inner: R,
}

impl<R: BufRead> LineReader<R> {
    /// Wrap `inner`.
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Give back the wrapped reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: BufRead> LineSource for LineReader<R> {
    fn next_line(&mut self, token: &CancellationToken) -> Result<Option<String>> {
        token.check()?;
        read_lossy_line(&mut self.inner).map_err(Into::into)
    }
}

/// Lines delivered over a channel, usually by a stdin reader thread.
/// Waits in slices of `tick` so a cancellation is noticed promptly.
pub struct ChannelLines {
    rx: Receiver<String>,
    tick: Duration,
}

impl ChannelLines {
    /// Lines arriving on `rx`, checking for cancellation every `tick`.
    pub fn new(rx: Receiver<String>, tick: Duration) -> Self {
        Self { rx, tick }
    }

    /// Spawn a thread forwarding the lines of `input`. The thread ends at
    /// end of input, on a read error, or when the receiver is dropped.
    /// Bytes that are not UTF-8 are replaced, never fatal.
    pub fn spawn<R>(mut input: R, tick: Duration) -> Self
    where
        R: BufRead + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            loop {
                match read_lossy_line(&mut input) {
                    Ok(Some(line)) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(err) => {
                        log::warn!("input thread stopped: {}", err);
                        break;
                    }
                }
            }
        });
        Self::new(rx, tick)
    }
}

impl LineSource for ChannelLines {
    fn next_line(&mut self, token: &CancellationToken) -> Result<Option<String>> {
        loop {
            token.check()?;
            match self.rx.recv_timeout(self.tick) {
                Ok(line) => return Ok(Some(strip_newline(line))),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return Ok(None),
            }
        }
    }
}

/// One raw line, decoded lossily. `Ok(None)` at end of input.
fn read_lossy_line<R: BufRead + ?Sized>(input: &mut R) -> std::io::Result<Option<String>> {
    let mut raw = Vec::new();
    if input.read_until(b'\n', &mut raw)? == 0 {
        return Ok(None);
    }
    let line = String::from_utf8_lossy(&raw).into_owned();
    if line.contains(char::REPLACEMENT_CHARACTER) {
        log::warn!("input line is not valid UTF-8: {:02x?}", raw);
    }
    Ok(Some(strip_newline(line)))
}

fn strip_newline(mut line: String) -> String {
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    line
}
