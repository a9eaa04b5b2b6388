#[path = "../common/mod.rs"]
mod common;

use libmfc1k::card::{BlockRole, LayoutPlan, SectorKeys};
use libmfc1k::payload::{SegmentPolicy, segment};

#[test]
fn sectors_ascend_with_trailer_first() {
    let blocks = segment("A#B#C#D", SegmentPolicy::default()).unwrap();
    let plan = LayoutPlan::build(&blocks, &SectorKeys::default()).unwrap();

    let data_writes: Vec<_> = plan
        .writes()
        .iter()
        .filter(|w| w.address.sector() > 0)
        .collect();
    assert_eq!(data_writes.len(), 15 * 4);
    for (i, chunk) in data_writes.chunks(4).enumerate() {
        let sector = i as u8 + 1;
        assert!(chunk.iter().all(|w| w.address.sector() == sector));
        assert_eq!(chunk[0].role, BlockRole::SectorTrailer);
        let blocks: Vec<u8> = chunk.iter().map(|w| w.address.block()).collect();
        assert_eq!(blocks, vec![3, 0, 1, 2]);
    }
}

#[test]
fn payload_blocks_land_in_order() {
    let blocks = segment("ONE#TWO#THREE#FOUR", SegmentPolicy::default()).unwrap();
    let plan = LayoutPlan::build(&blocks, &SectorKeys::default()).unwrap();
    assert_eq!(plan.payload_address(3), Some(common::fixtures::addr(2, 0)));
    let fourth = plan
        .writes()
        .iter()
        .find(|w| w.address == common::fixtures::addr(2, 0))
        .unwrap();
    assert_eq!(fourth.data, common::fixtures::text_block("FOUR"));
}

#[test]
fn no_write_touches_the_manufacturer_block() {
    let plan = LayoutPlan::build(&[], &SectorKeys::default()).unwrap();
    assert!(plan.writes().iter().all(|w| w.address.absolute() != 0));
    assert!(plan.len() <= 64);
}
