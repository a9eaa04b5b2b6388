#[path = "../common/mod.rs"]
mod common;

use std::time::Duration;

use common::fixtures::{double_size_uid, fresh_reader, sample_uid};
use libmfc1k::clock::{Clock, ManualClock};
use libmfc1k::reader::MockCard;
use libmfc1k::session::{SessionState, SessionTracker};
use libmfc1k::utils::default_forget_time;

#[test]
fn same_card_polled_every_50ms_stays_known() -> anyhow::Result<()> {
    let clock = ManualClock::new();
    let mut reader = fresh_reader();
    let mut tracker = SessionTracker::new(default_forget_time());

    let first = tracker.poll(&mut reader, clock.now())?.unwrap();
    assert!(first.is_new);
    tracker.touch(first.uid, clock.now());

    for _ in 0..200 {
        clock.sleep(Duration::from_millis(50));
        let again = tracker.poll(&mut reader, clock.now())?.unwrap();
        assert!(!again.is_new);
        tracker.touch(again.uid, clock.now());
    }
    assert_eq!(tracker.state(), SessionState::Tracking(sample_uid()));
    Ok(())
}

#[test]
fn untouched_card_is_forgotten_after_the_window() -> anyhow::Result<()> {
    let clock = ManualClock::new();
    let mut reader = fresh_reader();
    let mut tracker = SessionTracker::new(default_forget_time());

    let first = tracker.poll(&mut reader, clock.now())?.unwrap();
    tracker.touch(first.uid, clock.now());

    clock.advance(Duration::from_millis(5001));
    let later = tracker.poll(&mut reader, clock.now())?.unwrap();
    assert!(later.is_new);
    Ok(())
}

#[test]
fn card_swap_is_a_new_card() -> anyhow::Result<()> {
    let clock = ManualClock::new();
    let mut reader = fresh_reader();
    let mut tracker = SessionTracker::new(default_forget_time());

    let first = tracker.poll(&mut reader, clock.now())?.unwrap();
    tracker.touch(first.uid, clock.now());

    reader.insert_card(MockCard::new(double_size_uid()));
    clock.advance(Duration::from_millis(50));
    let second = tracker.poll(&mut reader, clock.now())?.unwrap();
    assert!(second.is_new);
    assert_eq!(second.uid, double_size_uid());
    Ok(())
}

#[test]
fn removing_the_card_resets_to_idle() -> anyhow::Result<()> {
    let clock = ManualClock::new();
    let mut reader = fresh_reader();
    let mut tracker = SessionTracker::new(default_forget_time());

    let first = tracker.poll(&mut reader, clock.now())?.unwrap();
    tracker.touch(first.uid, clock.now());

    reader.remove_card();
    assert!(tracker.poll(&mut reader, clock.now())?.is_none());
    assert_eq!(tracker.state(), SessionState::Idle);
    Ok(())
}
