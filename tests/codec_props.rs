use invsnap::codec::{decode_inventory, encode_inventory, CodecError, RawItemCodec, FORMAT_VERSION};
use proptest::prelude::*;

fn payload_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..48)
}

fn inventory_strategy() -> impl Strategy<Value = Vec<Option<Vec<u8>>>> {
    (0usize..=255).prop_flat_map(|size| {
        prop::collection::vec(prop::option::weighted(0.2, payload_strategy()), size)
    })
}

proptest! {
    #[test]
    fn prop_roundtrip(slots in inventory_strategy()) {
        let bytes = encode_inventory(&RawItemCodec, &slots).unwrap();
        let decoded = decode_inventory(&RawItemCodec, &bytes).unwrap();
        prop_assert_eq!(decoded, slots);
    }

    #[test]
    fn prop_header_counts(slots in inventory_strategy()) {
        let bytes = encode_inventory(&RawItemCodec, &slots).unwrap();
        let occupied = slots.iter().filter(|slot| slot.is_some()).count();

        prop_assert_eq!(bytes[0], FORMAT_VERSION);
        prop_assert_eq!(usize::from(bytes[1]), slots.len());
        prop_assert_eq!(usize::from(bytes[2]), occupied);
        let trailer = u16::from_be_bytes([bytes[bytes.len() - 2], bytes[bytes.len() - 1]]);
        prop_assert_eq!(usize::from(trailer), occupied);
    }

    #[test]
    fn prop_foreign_version_rejected(slots in inventory_strategy(), version in any::<u8>()) {
        prop_assume!(version != FORMAT_VERSION);
        let mut bytes = encode_inventory(&RawItemCodec, &slots).unwrap();
        bytes[0] = version;

        let result = decode_inventory(&RawItemCodec, &bytes);
        prop_assert!(matches!(result, Err(CodecError::UnsupportedVersion(v)) if v == version));
    }

    #[test]
    fn prop_truncation_detected(slots in inventory_strategy(), cut in any::<prop::sample::Index>()) {
        let bytes = encode_inventory(&RawItemCodec, &slots).unwrap();
        let len = cut.index(bytes.len());

        let result = decode_inventory(&RawItemCodec, &bytes[..len]);
        prop_assert!(matches!(result, Err(CodecError::CorruptInventoryData(_))));
    }
}
