#[path = "../common/mod.rs"]
mod common;

use common::fixtures::{addr, fresh_reader};
use libmfc1k::config::AppConfig;
use libmfc1k::payload::SegmentPolicy;
use libmfc1k::reader::{MockReader, ReaderCall};
use libmfc1k::test_support::{mock_command_loop, run_script};

fn responses(out: &str) -> Vec<&str> {
    out.split_inclusive("Done\n").collect()
}

#[test]
fn every_command_is_terminated_by_done() -> anyhow::Result<()> {
    let mut app = mock_command_loop(fresh_reader(), AppConfig::default());
    let out = run_script(&mut app, "*IDN?\nREAD\nWRITE\nHI#THERE\nBOGUS\n")?;

    let parts = responses(&out);
    // four responses plus the closing banner
    assert_eq!(parts.len(), 5);
    assert!(parts[0].starts_with("Application started\nCommand = *IDN?\n"));
    assert!(parts[1].contains("UID = 04 a2 2b 19\n"));
    assert!(parts[2].contains("Card written.\n"));
    assert!(parts[3].contains("Unknown command: BOGUS\n"));
    assert_eq!(parts[4], "Application ended.\n");
    Ok(())
}

#[test]
fn read_prints_little_endian_card_number() -> anyhow::Result<()> {
    let mut app = mock_command_loop(fresh_reader(), AppConfig::default());
    let out = run_script(&mut app, "READ\n")?;
    assert!(out.contains("Card 0X192BA204  UID = 04 a2 2b 19\n"));
    assert_eq!(out.matches("\nS").count(), 64);
    Ok(())
}

#[test]
fn write_without_card_reports_no_tag() -> anyhow::Result<()> {
    let mut app = mock_command_loop(MockReader::new(), AppConfig::default());
    let out = run_script(&mut app, "WRITE\nABC\n")?;
    assert!(out.contains("Data = ABC, size = 1\n"));
    assert!(out.contains("Tag = -1\nDone\n"));
    assert_eq!(app.reader().write_count(), 0);
    Ok(())
}

#[test]
fn write_reads_payload_line_before_polling() -> anyhow::Result<()> {
    let mut app = mock_command_loop(fresh_reader(), AppConfig::default());
    run_script(&mut app, "WRITE\nREAD\n")?;
    // "READ" was consumed as the payload
    assert_eq!(
        app.reader().stored(addr(1, 0)).unwrap(),
        common::fixtures::text_block("READ")
    );
    Ok(())
}

#[test]
fn stride_config_with_dump_after_write() -> anyhow::Result<()> {
    let config = AppConfig::default()
        .with_segment_policy(SegmentPolicy::FixedStride)
        .with_dump_after_write(true);
    let mut app = mock_command_loop(fresh_reader(), config);
    let out = run_script(&mut app, "WRITE\nthe quick brown fox jumps\n")?;
    assert!(out.contains("Card written.\n"));
    assert!(out.contains("Payload = the quick brown fox jumps\nDone\n"));
    Ok(())
}

#[test]
fn reader_is_halted_after_each_command() -> anyhow::Result<()> {
    let mut app = mock_command_loop(fresh_reader(), AppConfig::default());
    run_script(&mut app, "*IDN?\n*IDN?\n")?;
    let halts = app
        .reader()
        .calls
        .iter()
        .filter(|c| **c == ReaderCall::Halt)
        .count();
    // one per command and one on shutdown
    assert_eq!(halts, 3);
    assert_eq!(app.tracker().last_uid(), None);
    Ok(())
}
