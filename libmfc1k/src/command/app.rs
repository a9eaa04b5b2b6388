// libmfc1k/src/command/app.rs

//! The command loop and the watch loop.

use std::io::Write;

use crate::cancellation::CancellationToken;
use crate::card::operations::{self, SectorProgress, WriteReport};
use crate::card::Card;
use crate::clock::Clock;
use crate::command::lines::LineSource;
use crate::command::protocol::Command;
use crate::config::AppConfig;
use crate::constants::DONE_MARKER;
use crate::payload::reassemble;
use crate::reader::CardReader;
use crate::session::SessionTracker;
use crate::{Error, Result};

/// Drives the reader from host commands.
///
/// The loop owns the reader exclusively: one command at a time acquires a
/// card and runs its whole block sequence before the next line is read.
pub struct CommandLoop<R, C> {
    reader: R,
    clock: C,
    tracker: SessionTracker,
    config: AppConfig,
    token: CancellationToken,
}

impl<R: CardReader, C: Clock> CommandLoop<R, C> {
    /// Loop over `reader`, stopping once `token` is canceled.
    pub fn new(reader: R, clock: C, config: AppConfig, token: CancellationToken) -> Self {
        let tracker = SessionTracker::new(config.forget_time);
        Self {
            reader,
            clock,
            tracker,
            config,
            token,
        }
    }

    /// The owned reader
    pub fn reader(&self) -> &R {
        &self.reader
    }
    /// The owned reader, mutably
    pub fn reader_mut(&mut self) -> &mut R {
        &mut self.reader
    }
    /// Card presence state
    pub fn tracker(&self) -> &SessionTracker {
        &self.tracker
    }
    /// Settings in use
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
    /// Token checked at every suspension point
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Give the reader back.
    pub fn into_reader(self) -> R {
        self.reader
    }

    /// Serve commands until end of input or cancellation.
    ///
    /// Cancellation is an orderly exit: the reader is halted, the closing
    /// banner printed and `Ok(())` returned.
    pub fn run<L, W>(&mut self, lines: &mut L, out: &mut W) -> Result<()>
    where
        L: LineSource + ?Sized,
        W: Write + ?Sized,
    {
        writeln!(out, "Application started")?;
        out.flush()?;
        log::info!("{} ready", self.config.identity());

        let outcome = loop {
            let line = match lines.next_line(&self.token) {
                Ok(Some(line)) => line,
                Ok(None) => {
                    log::debug!("end of input");
                    break Ok(());
                }
                Err(Error::Interrupted) => break Ok(()),
                Err(err) => break Err(err),
            };
            let Some(command) = Command::parse(&line) else {
                continue;
            };
            match self.handle(&command, lines, out) {
                Ok(()) => {}
                Err(Error::Interrupted) => break Ok(()),
                Err(err) => break Err(err),
            }
        };

        self.shutdown(out)?;
        outcome
    }

    /// Execute one command and terminate its response with `Done`.
    ///
    /// Card-level failures are reported as protocol lines. Only output
    /// errors and cancellation come back as `Err`.
    pub fn handle<L, W>(&mut self, command: &Command, lines: &mut L, out: &mut W) -> Result<()>
    where
        L: LineSource + ?Sized,
        W: Write + ?Sized,
    {
        log::debug!("command {}", command);
        writeln!(out, "Command = {}", command)?;

        let result = match command {
            Command::Identify => writeln!(out, "{}", self.config.identity()).map_err(Error::from),
            Command::Read => self.read_command(out),
            Command::Write => self.write_command(lines, out),
            Command::Unknown(text) => {
                writeln!(out, "Unknown command: {}", text).map_err(Error::from)
            }
        };

        if let Err(err) = self.reader.halt() {
            log::warn!("halt after {} failed: {}", command, err);
        }
        writeln!(out, "{}", DONE_MARKER)?;
        out.flush()?;
        result
    }

    /// Poll until a card answers or the forget window elapses.
    ///
    /// Reader errors during polling are treated as "no card yet". Returns
    /// `Err(Interrupted)` as soon as the token is canceled.
    pub fn wait_for_card(&mut self) -> Result<Option<Card>> {
        let start = self.clock.now();
        loop {
            self.token.check()?;
            let now = self.clock.now();
            match self.tracker.poll(&mut self.reader, now) {
                Ok(Some(detection)) => {
                    self.tracker.touch(detection.uid, now);
                    return Ok(Some(Card::from(detection)));
                }
                Ok(None) => {}
                Err(err) => log::debug!("poll failed: {}", err),
            }

            self.clock.sleep(self.config.poll_interval);
            if self.clock.now().saturating_duration_since(start) > self.config.forget_time {
                log::info!("no card within {:?}", self.config.forget_time);
                return Ok(None);
            }
        }
    }

    /// Continuously poll and dump every newly presented card once.
    /// Returns when the token is canceled.
    pub fn watch<W: Write + ?Sized>(&mut self, out: &mut W) -> Result<()> {
        writeln!(out, "Application started")?;
        out.flush()?;

        loop {
            if self.token.is_canceled() {
                break;
            }
            let now = self.clock.now();
            match self.tracker.poll(&mut self.reader, now) {
                Ok(Some(detection)) => {
                    self.tracker.touch(detection.uid, now);
                    if detection.is_new {
                        let card = Card::from(detection);
                        self.announce(&card, out)?;
                        self.print_dump(&card, out)?;
                        if let Err(err) = self.reader.halt() {
                            log::warn!("halt failed: {}", err);
                        }
                        writeln!(out, "{}", DONE_MARKER)?;
                        out.flush()?;
                    }
                }
                Ok(None) => {}
                Err(err) => log::debug!("poll failed: {}", err),
            }
            self.clock.sleep(self.config.poll_interval);
        }

        self.shutdown(out)
    }

    fn read_command<W: Write + ?Sized>(&mut self, out: &mut W) -> Result<()> {
        let Some(card) = self.wait_for_card()? else {
            writeln!(out, "Tag = -1")?;
            return Ok(());
        };
        self.announce(&card, out)?;
        self.print_dump(&card, out)
    }

    fn write_command<L, W>(&mut self, lines: &mut L, out: &mut W) -> Result<()>
    where
        L: LineSource + ?Sized,
        W: Write + ?Sized,
    {
        let payload = lines.next_line(&self.token)?.unwrap_or_default();
        let payload = payload.trim();

        let blocks = match self.config.segmenter().segment(payload) {
            Ok(blocks) => blocks,
            Err(Error::PayloadTooLarge { blocks, max }) => {
                log::warn!("payload needs {} blocks, card holds {}", blocks, max);
                writeln!(out, "Too many data, aborting!")?;
                return Ok(());
            }
            Err(err @ Error::FieldTooLong { .. }) => {
                writeln!(out, "{}, aborting!", err)?;
                return Ok(());
            }
            Err(err) => return Err(err),
        };

        writeln!(out, "Data = {}, size = {}", payload, blocks.len())?;
        for (index, block) in blocks.iter().enumerate() {
            writeln!(
                out,
                " Word[{}] = {}",
                index,
                reassemble(std::slice::from_ref(block), self.config.segment_policy)
            )?;
        }

        let Some(card) = self.wait_for_card()? else {
            writeln!(out, "Tag = -1")?;
            return Ok(());
        };
        self.announce(&card, out)?;

        let mut io_error = None;
        let outcome = operations::write_card_with_progress(
            &mut self.reader,
            card.uid(),
            &blocks,
            &self.config.keys,
            |progress: &SectorProgress| {
                if io_error.is_none() {
                    if let Err(err) = write_progress(&mut *out, progress) {
                        io_error = Some(err);
                    }
                }
            },
        );
        if let Some(err) = io_error {
            return Err(err.into());
        }

        match outcome {
            Ok(report) => {
                write_summary(out, &report)?;
                if self.config.dump_after_write {
                    self.print_dump(&card, out)?;
                }
            }
            Err(Error::MadWriteFailed { .. }) => writeln!(out, "Writing MAD sector failed!")?,
            Err(err) => writeln!(out, "Write failed: {}", err)?,
        }
        Ok(())
    }

    fn announce<W: Write + ?Sized>(&self, card: &Card, out: &mut W) -> Result<()> {
        writeln!(out, "Tag = {}", card.tag_type())?;
        writeln!(
            out,
            "Card {}  UID = {}",
            card.uid().card_number(),
            card.uid()
        )?;
        Ok(())
    }

    fn print_dump<W: Write + ?Sized>(&mut self, card: &Card, out: &mut W) -> Result<()> {
        let entries = match card.dump(&mut self.reader, &self.config.keys) {
            Ok(entries) => entries,
            Err(err) => {
                writeln!(out, "Dump failed: {}", err)?;
                return Ok(());
            }
        };
        for entry in &entries {
            writeln!(out, "{}", operations::format_dump_line(entry))?;
        }
        writeln!(
            out,
            "Payload = {}",
            operations::payload_from_dump(&entries, self.config.segment_policy)
        )?;
        Ok(())
    }

    fn shutdown<W: Write + ?Sized>(&mut self, out: &mut W) -> Result<()> {
        if let Err(err) = self.reader.halt() {
            log::warn!("halt on shutdown failed: {}", err);
        }
        writeln!(out, "Application ended.")?;
        out.flush()?;
        Ok(())
    }
}

fn write_progress<W: Write + ?Sized>(out: &mut W, progress: &SectorProgress) -> std::io::Result<()> {
    if progress.failed == 0 {
        writeln!(out, "Sector {:02}: ok", progress.sector)
    } else {
        writeln!(
            out,
            "Sector {:02}: {} of {} blocks failed",
            progress.sector, progress.failed, progress.attempted
        )
    }
}

fn write_summary<W: Write + ?Sized>(out: &mut W, report: &WriteReport) -> Result<()> {
    if report.is_complete() {
        writeln!(out, "Card written.")?;
    } else {
        writeln!(
            out,
            "Card written with {} failed block(s) in sector(s) {:?}.",
            report.failures.len(),
            report.failed_sectors()
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::command::lines::LineReader;
    use crate::reader::{MockCard, MockReader, ReaderCall};
    use crate::types::{BlockAddress, BlockData, Key, KeyKind, RequestMode, TagResponse, Uid};
    use std::io::Cursor;
    use std::ops::Range;
    use std::time::Duration;

    fn uid() -> Uid {
        Uid::try_from(&[0x12u8, 0x34, 0x56, 0x78][..]).unwrap()
    }

    fn app(reader: MockReader) -> CommandLoop<MockReader, ManualClock> {
        CommandLoop::new(
            reader,
            ManualClock::new(),
            AppConfig::default(),
            CancellationToken::new(),
        )
    }

    fn run(app: &mut CommandLoop<MockReader, ManualClock>, input: &str) -> String {
        let mut lines = LineReader::new(Cursor::new(input.to_string()));
        let mut out = Vec::new();
        app.run(&mut lines, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    /// Moves a card in and out of the field by request number (1-based) and
    /// cancels the token once `cancel_at` requests were sent.
    struct ScriptedField {
        inner: MockReader,
        card: MockCard,
        absent: Range<usize>,
        cancel_at: usize,
        token: CancellationToken,
        requests: usize,
    }

    impl ScriptedField {
        fn new(absent: Range<usize>, cancel_at: usize, token: CancellationToken) -> Self {
            Self {
                inner: MockReader::new(),
                card: MockCard::new(uid()),
                absent,
                cancel_at,
                token,
                requests: 0,
            }
        }
    }

    impl CardReader for ScriptedField {
        fn init(&mut self) -> Result<()> {
            self.inner.init()
        }

        fn request_tag(&mut self) -> Result<TagResponse> {
            self.requests += 1;
            if self.absent.contains(&self.requests) {
                self.inner.remove_card();
            } else if self.inner.card.is_none() {
                self.inner.insert_card(self.card.clone());
            }
            if self.requests >= self.cancel_at {
                self.token.cancel();
            }
            self.inner.request_tag()
        }

        fn select_tag(&mut self) -> Result<Uid> {
            self.inner.select_tag()
        }

        fn authenticate_and_read(
            &mut self,
            uid: &Uid,
            address: BlockAddress,
            kind: KeyKind,
            key: &Key,
        ) -> Result<BlockData> {
            self.inner.authenticate_and_read(uid, address, kind, key)
        }

        fn authenticate_and_write(
            &mut self,
            uid: &Uid,
            address: BlockAddress,
            kind: KeyKind,
            key: &Key,
            data: &BlockData,
        ) -> Result<()> {
            self.inner.authenticate_and_write(uid, address, kind, key, data)
        }

        fn halt(&mut self) -> Result<()> {
            self.inner.halt()
        }
    }

    fn scripted_app(
        absent: Range<usize>,
        cancel_at: usize,
    ) -> CommandLoop<ScriptedField, ManualClock> {
        let token = CancellationToken::new();
        let field = ScriptedField::new(absent, cancel_at, token.clone());
        CommandLoop::new(field, ManualClock::new(), AppConfig::default(), token)
    }

    #[test]
    fn identify_then_done() {
        let mut app = app(MockReader::new());
        let out = run(&mut app, "*IDN?\n");
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Application started",
                "Command = *IDN?",
                "RFID_PRI Pico, Version 1.0.0",
                "Done",
                "Application ended."
            ]
        );
    }

    #[test]
    fn read_without_card_times_out() {
        let mut app = app(MockReader::new());
        let out = run(&mut app, "READ\n");
        assert!(out.contains("Tag = -1\nDone\n"));
        let requests = app
            .reader()
            .calls
            .iter()
            .filter(|c| **c == ReaderCall::Request)
            .count();
        // polls at 0, 50, ..., 5000 ms
        assert_eq!(requests, 101);
    }

    #[test]
    fn read_dumps_card() {
        let mut app = app(MockReader::with_card(MockCard::new(uid())));
        let out = run(&mut app, "READ\n");
        assert!(out.contains("Tag = MIFARE Classic 1K\n"));
        assert!(out.contains("Card 0X78563412  UID = 12 34 56 78\n"));
        assert!(out.contains("S00 B0 [12 34 56 78"));
        assert!(out.contains("S15 B3 ["));
        assert!(out.contains("Payload = \nDone\n"));
    }

    #[test]
    fn write_then_read_back() {
        let mut app = app(MockReader::with_card(MockCard::new(uid())));
        let out = run(&mut app, "WRITE\nHELLO#WORLD\nREAD\n");
        assert!(out.contains("Data = HELLO#WORLD, size = 2\n"));
        assert!(out.contains(" Word[1] = WORLD\n"));
        assert!(out.contains("Sector 00: ok\n"));
        assert!(out.contains("Sector 15: ok\n"));
        assert!(out.contains("Card written.\nDone\n"));
        assert!(out.contains("Payload = HELLO#WORLD\nDone\n"));
        assert_eq!(out.matches("Done\n").count(), 2);
    }

    #[test]
    fn oversized_write_never_polls() {
        let mut app = app(MockReader::with_card(MockCard::new(uid())));
        let payload = vec!["x"; 17].join("#");
        let out = run(&mut app, &format!("WRITE\n{}\n", payload));
        assert!(out.contains("Too many data, aborting!\nDone\n"));
        assert!(!app.reader().calls.contains(&ReaderCall::Request));
        assert_eq!(app.reader().write_count(), 0);
    }

    #[test]
    fn mad_failure_is_reported() {
        let mut reader = MockReader::with_card(MockCard::new(uid()));
        reader.fail_write_at(BlockAddress::trailer(0).unwrap());
        let mut app = app(reader);
        let out = run(&mut app, "WRITE\nA\n");
        assert!(out.contains("Writing MAD sector failed!\nDone\n"));
        assert!(!out.contains("Card written."));
        assert_eq!(app.reader().write_count(), 1);
    }

    #[test]
    fn partial_write_is_reported_per_sector() {
        let mut reader = MockReader::with_card(MockCard::new(uid()));
        reader.fail_write_at(BlockAddress::new(4, 1).unwrap());
        let mut app = app(reader);
        let out = run(&mut app, "WRITE\nA#B\n");
        assert!(out.contains("Sector 04: 1 of 4 blocks failed\n"));
        assert!(out.contains("Card written with 1 failed block(s) in sector(s) [4].\n"));
    }

    #[test]
    fn unknown_command_still_ends_with_done() {
        let mut app = app(MockReader::new());
        let out = run(&mut app, "\nFORMAT\n");
        assert!(out.contains("Unknown command: FORMAT\nDone\n"));
        assert!(out.ends_with("Application ended.\n"));
    }

    #[test]
    fn canceled_token_stops_before_next_command() {
        let mut app = app(MockReader::new());
        app.token().cancel();
        let out = run(&mut app, "*IDN?\n");
        assert_eq!(out, "Application started\nApplication ended.\n");
        assert_eq!(app.reader().calls, vec![ReaderCall::Halt]);
    }

    #[test]
    fn wait_for_card_touches_tracker() {
        let mut app = app(MockReader::with_card(MockCard::new(uid())));
        app.reader_mut().set_absent_polls(3);
        let card = app.wait_for_card().unwrap().unwrap();
        assert_eq!(card.uid(), &uid());
        assert_eq!(app.tracker().last_uid(), Some(&uid()));
    }

    #[test]
    fn custom_forget_time_shortens_wait() {
        let config = AppConfig::default().with_forget_time(Duration::from_millis(100));
        let mut app = CommandLoop::new(
            MockReader::new(),
            ManualClock::new(),
            config,
            CancellationToken::new(),
        );
        assert!(app.wait_for_card().unwrap().is_none());
        let requests = app
            .reader()
            .calls
            .iter()
            .filter(|c| **c == ReaderCall::Request)
            .count();
        assert_eq!(requests, 3);
    }

    #[test]
    fn invalid_utf8_line_does_not_end_the_loop() {
        let mut app = app(MockReader::new());
        let mut lines = LineReader::new(Cursor::new(b"\xff\n*IDN?\n".to_vec()));
        let mut out = Vec::new();
        app.run(&mut lines, &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("RFID_PRI Pico, Version 1.0.0\nDone\n"));
        assert!(out.ends_with("Application ended.\n"));
    }

    #[test]
    fn card_left_in_field_answers_repeated_reads() {
        let mut app = app(MockReader::with_card(MockCard::new(uid())));
        let out = run(&mut app, "READ\nREAD\n");
        assert_eq!(out.matches("Tag = MIFARE Classic 1K\n").count(), 2);
        assert!(!out.contains("Tag = -1"));
        // one poll per READ
        assert_eq!(app.reader().request_count(), 2);
    }

    #[test]
    fn idle_request_loses_halted_card() {
        let reader = MockReader::with_card(MockCard::new(uid())).with_request_mode(RequestMode::Idle);
        let mut app = app(reader);
        let out = run(&mut app, "READ\nREAD\n");
        assert_eq!(out.matches("Tag = MIFARE Classic 1K\n").count(), 1);
        assert!(out.contains("Tag = -1\nDone\n"));
    }

    #[test]
    fn watch_dumps_each_presentation_once() {
        // present for polls 1-9, gone for 10-11, back from 12, cancel at 40
        let mut app = scripted_app(10..12, 40);
        let mut out = Vec::new();
        app.watch(&mut out).unwrap();
        let out = String::from_utf8(out).unwrap();

        assert!(out.starts_with("Application started\n"));
        assert_eq!(out.matches("Tag = MIFARE Classic 1K\n").count(), 2);
        assert_eq!(out.matches("S00 B0 [").count(), 2);
        assert_eq!(out.matches("Done\n").count(), 2);
        assert!(out.ends_with("Done\nApplication ended.\n"));
        assert_eq!(app.reader().requests, 40);
    }

    #[test]
    fn interrupt_while_waiting_for_card_still_ends_with_done() {
        let mut app = scripted_app(1..usize::MAX, 3);
        let out = run_scripted(&mut app, "READ\n*IDN?\n");
        assert_eq!(
            out,
            "Application started\nCommand = READ\nDone\nApplication ended.\n"
        );
        assert_eq!(app.reader().requests, 3);
    }

    fn run_scripted(app: &mut CommandLoop<ScriptedField, ManualClock>, input: &str) -> String {
        let mut lines = LineReader::new(Cursor::new(input.to_string()));
        let mut out = Vec::new();
        app.run(&mut lines, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }
}
