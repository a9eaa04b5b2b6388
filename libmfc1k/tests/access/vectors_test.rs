use libmfc1k::access::{AccessCondition, AccessProfile, SectorTrailer, build_access_bits, build_trailer};
use libmfc1k::types::Key;

#[test]
fn transport_configuration_matches_datasheet() -> anyhow::Result<()> {
    let bits = build_access_bits(AccessProfile::TRANSPORT);
    assert_eq!(bits.to_vec(), hex::decode("ff078069")?);
    Ok(())
}

#[test]
fn known_vectors_encode_and_decode() -> anyhow::Result<()> {
    // (c1, c2, c3) -> bytes 6..9
    let vectors = [
        ((0x0u8, 0x0u8, 0x8u8), "ff0780"),
        ((0x7, 0x8, 0x8), "787788"),
        ((0x0, 0x8, 0x8), "7f0788"),
        ((0x0, 0x0, 0x0), "ff0f00"),
    ];
    for ((c1, c2, c3), expected) in vectors {
        let profile = AccessProfile::new(c1, c2, c3);
        let encoded = profile.encode();
        assert_eq!(hex::encode(encoded), expected, "profile {:?}", profile);
        assert_eq!(AccessProfile::decode(encoded)?, profile);
    }
    Ok(())
}

#[test]
fn trailer_block_is_key_a_access_gpb_key_b() -> anyhow::Result<()> {
    let trailer = build_trailer(
        &Key::FIRST_SECTOR,
        build_access_bits(AccessProfile::TRANSPORT),
        0x69,
        &Key::DEFAULT,
    );
    assert_eq!(trailer.to_vec(), hex::decode("a0a1a2a3a4a5ff078069ffffffffffff")?);

    let parsed = SectorTrailer::parse(&libmfc1k::BlockData::from_bytes(trailer))?;
    assert_eq!(parsed.key_b, Key::DEFAULT);
    assert_eq!(parsed.access, AccessProfile::TRANSPORT);
    Ok(())
}

#[test]
fn trailer_condition_is_keyb_writable() {
    // transport trailer: C1=0 C2=0 C3=1, key A writes keys, access bits readable
    let trailer_condition = AccessProfile::TRANSPORT.condition(3);
    assert_eq!(
        trailer_condition,
        AccessCondition {
            c1: false,
            c2: false,
            c3: true
        }
    );
}
