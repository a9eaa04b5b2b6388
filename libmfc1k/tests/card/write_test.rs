#[path = "../common/mod.rs"]
mod common;

use common::fixtures::{addr, fresh_reader, sample_uid, write_addresses};
use libmfc1k::Error;
use libmfc1k::card::SectorKeys;
use libmfc1k::card::operations::{dump_card, payload_from_dump, write_card, write_payload};
use libmfc1k::payload::{SegmentPolicy, Segmenter};
use libmfc1k::reader::MockReader;
use libmfc1k::types::{BlockData, Key};

#[test]
fn reserved_blocks_only_ever_get_zeros() -> anyhow::Result<()> {
    let mut reader = fresh_reader();
    let blocks = vec![BlockData::from_bytes([0xAB; 16]); 16];
    write_card(&mut reader, &sample_uid(), &blocks, &SectorKeys::default())?;

    for (address, data) in reader.writes() {
        if address.sector() == 0 && !address.is_trailer() {
            assert!(data.is_zeroed(), "{} got {}", address, data.to_hex());
        }
    }
    Ok(())
}

#[test]
fn write_order_is_mad_reserved_then_ascending_sectors() -> anyhow::Result<()> {
    let mut reader = fresh_reader();
    write_card(&mut reader, &sample_uid(), &[], &SectorKeys::default())?;

    let order = write_addresses(&reader);
    assert_eq!(order.len(), 63);
    assert_eq!(&order[..3], &[addr(0, 3), addr(0, 1), addr(0, 2)]);
    for sector in 1..16u8 {
        let start = 3 + (sector as usize - 1) * 4;
        assert_eq!(
            &order[start..start + 4],
            &[addr(sector, 3), addr(sector, 0), addr(sector, 1), addr(sector, 2)]
        );
    }
    Ok(())
}

#[test]
fn stride_payload_of_200_chars_is_written() -> anyhow::Result<()> {
    let mut reader = fresh_reader();
    let text: String = ('a'..='z').cycle().take(200).collect();
    let segmenter = Segmenter::new(SegmentPolicy::FixedStride);
    let report = write_payload(
        &mut reader,
        &sample_uid(),
        &text,
        &segmenter,
        &SectorKeys::default(),
        |_| {},
    )?;
    assert!(report.is_complete());

    let last = reader.stored(addr(5, 0)).unwrap();
    assert_eq!(&last.as_bytes()[..8], &text.as_bytes()[192..]);
    assert_eq!(&last.as_bytes()[8..], b"        ");

    let dump = dump_card(&mut reader, &sample_uid(), &SectorKeys::default())?;
    assert_eq!(payload_from_dump(&dump, SegmentPolicy::FixedStride), text);
    Ok(())
}

#[test]
fn stride_payload_of_260_chars_makes_no_reader_calls() {
    let mut reader = fresh_reader();
    let text = "q".repeat(260);
    let segmenter = Segmenter::new(SegmentPolicy::FixedStride);
    let err = write_payload(
        &mut reader,
        &sample_uid(),
        &text,
        &segmenter,
        &SectorKeys::default(),
        |_| {},
    )
    .unwrap_err();
    assert!(matches!(err, Error::PayloadTooLarge { blocks: 17, max: 16 }));
    assert!(reader.calls.is_empty());
}

#[test]
fn overlong_field_is_rejected_before_io() {
    let mut reader = fresh_reader();
    let err = write_payload(
        &mut reader,
        &sample_uid(),
        "short#this field is far too long",
        &Segmenter::default(),
        &SectorKeys::default(),
        |_| {},
    )
    .unwrap_err();
    assert!(matches!(err, Error::FieldTooLong { index: 1, .. }));
    assert!(reader.calls.is_empty());
}

#[test]
fn mad_failure_stops_everything() {
    let mut reader = fresh_reader();
    reader.fail_write_at(addr(0, 3));
    let err = write_card(&mut reader, &sample_uid(), &[], &SectorKeys::default()).unwrap_err();
    assert!(matches!(err, Error::MadWriteFailed { .. }));
    assert_eq!(write_addresses(&reader), vec![addr(0, 3)]);
    // old MAD stays in place
    assert_eq!(&reader.stored(addr(0, 3)).unwrap().as_bytes()[..6], Key::DEFAULT.as_bytes());
}

#[test]
fn data_failures_are_collected_and_writing_continues() -> anyhow::Result<()> {
    let mut reader = fresh_reader();
    for a in [addr(1, 0), addr(7, 3), addr(15, 2)] {
        reader.fail_write_at(a);
    }
    let report = write_card(&mut reader, &sample_uid(), &[], &SectorKeys::default())?;
    assert_eq!(report.attempted, 63);
    assert_eq!(report.written, 60);
    assert_eq!(report.failed_sectors(), vec![1, 7, 15]);
    Ok(())
}

#[test]
fn wrong_card_fails_at_the_mad() {
    let mut reader = MockReader::with_card(libmfc1k::reader::MockCard::new(
        common::fixtures::double_size_uid(),
    ));
    let err = write_card(&mut reader, &sample_uid(), &[], &SectorKeys::default()).unwrap_err();
    match err {
        Error::MadWriteFailed { source } => assert!(matches!(*source, Error::NoTagDetected)),
        other => panic!("unexpected {:?}", other),
    }
}
