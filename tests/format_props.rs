use bale::reader::{BaleReader, DataRegion, Input, MemberVisitor};
use bale::record::{MemberFooter, MemberHeader, HEADER_LEN};
use bale::writer::BaleWriter;
use proptest::prelude::*;
use std::io::{Cursor, Read};

/// Gathers every member's name and body off the scan.
struct Collect(Vec<(String, Vec<u8>)>);

impl MemberVisitor for Collect {
    fn data(
        &mut self,
        header: &MemberHeader,
        _raw: &[u8; HEADER_LEN],
        region: &mut DataRegion<'_>,
    ) -> bale::Result<()> {
        let mut body = Vec::new();
        region.read_to_end(&mut body).unwrap();
        self.0.push((header.name.clone(), body));
        Ok(())
    }

    fn footer(&mut self, _header: &MemberHeader, _footer: &MemberFooter) -> bale::Result<()> {
        Ok(())
    }
}

fn build(members: &[(String, Vec<u8>)]) -> Vec<u8> {
    let mut writer = BaleWriter::new(Vec::new()).unwrap();
    for (name, data) in members {
        let header = MemberHeader {
            name: name.clone(),
            mtime: 1_700_000_000,
            uid: 1000,
            gid: 100,
            mode: 0o100644,
            size: data.len() as u64,
        };
        writer.append(&header, &mut Cursor::new(data)).unwrap();
    }
    writer.finish().unwrap()
}

fn open(bytes: Vec<u8>) -> BaleReader {
    BaleReader::new(Input::Stream(Box::new(Cursor::new(bytes)))).unwrap()
}

fn members_strategy() -> impl Strategy<Value = Vec<(String, Vec<u8>)>> {
    proptest::collection::vec(
        ("[a-z][a-z0-9_]{0,14}", proptest::collection::vec(any::<u8>(), 0..300)),
        1..5,
    )
}

proptest! {
    #[test]
    fn scan_returns_exactly_what_was_built(members in members_strategy()) {
        let bytes = build(&members);

        let mut collect = Collect(Vec::new());
        let count = open(bytes).scan_members(&mut collect).unwrap();
        assert_eq!(count, members.len() as u64);
        assert_eq!(collect.0, members);
    }

    #[test]
    fn every_fresh_archive_verifies(members in members_strategy()) {
        let bytes = build(&members);
        let count = open(bytes).verify::<fn(&MemberHeader)>(None).unwrap();
        assert_eq!(count, members.len() as u64);
    }

    #[test]
    fn archive_length_follows_the_padding_rule(
        data in proptest::collection::vec(any::<u8>(), 0..300),
    ) {
        let bytes = build(&[("pad".to_string(), data.clone())]);
        // tag + header + data + optional pad byte + footer
        assert_eq!(bytes.len(), 8 + 60 + data.len() + data.len() % 2 + 66);
    }

    #[test]
    fn any_single_data_flip_is_detected(
        data in proptest::collection::vec(any::<u8>(), 1..200),
        flip in 0usize..200,
        mask in 1u8..,
    ) {
        let mut bytes = build(&[("m".to_string(), data.clone())]);
        let off = 8 + 60 + flip % data.len();
        bytes[off] ^= mask;
        assert!(open(bytes).verify::<fn(&MemberHeader)>(None).is_err());
    }

    #[test]
    fn header_codec_roundtrips_inside_field_ranges(
        name in "[a-zA-Z0-9._/-]{0,16}",
        mtime in 0i64..=999_999_999_999,
        uid in 0u32..=999_999,
        gid in 0u32..=999_999,
        mode in 0u32..=0o7777_7777,
        size in 0u64..=9_999_999_999,
    ) {
        let header = MemberHeader { name, mtime, uid, gid, mode, size };
        let decoded = MemberHeader::decode(&header.encode()).unwrap();
        assert_eq!(decoded, header);
    }
}
