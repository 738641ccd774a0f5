use proptest::prelude::*;

use mtw_types::{
    build_backend_swap_id, build_local_tx_id, is_backend_swap_id, is_id_suitable_for_fetching_timestamp,
    is_local_id, parse_tx_id, Amount, Timestamp, UnusualTxType,
};

proptest! {
    /// A local id keeps the hash fragment of the chain id it stands in for.
    #[test]
    fn local_id_preserves_hash(hash in "[0-9a-f]{8,64}", sub_id in proptest::option::of(0u32..16)) {
        let id = build_local_tx_id(&hash, sub_id);
        let parsed = parse_tx_id(&id);
        prop_assert_eq!(parsed.hash, hash);
        prop_assert_eq!(parsed.tx_type, Some(UnusualTxType::Local));
        prop_assert!(is_local_id(&id));
        prop_assert!(!is_id_suitable_for_fetching_timestamp(&id));
    }

    /// Backend swap ids are never chain-suitable and never local.
    #[test]
    fn backend_swap_id_is_not_chain_suitable(backend_id in "[A-Za-z0-9]{4,32}") {
        let id = build_backend_swap_id(&backend_id);
        prop_assert!(is_backend_swap_id(&id));
        prop_assert!(!is_local_id(&id));
        prop_assert!(!is_id_suitable_for_fetching_timestamp(&id));
    }

    /// Plain chain ids (no type suffix) are always chain-suitable.
    #[test]
    fn plain_ids_are_chain_suitable(hash in "[0-9a-f]{8,64}", lt in 0u64..u64::MAX) {
        let id = format!("{hash}:{lt}");
        prop_assert!(is_id_suitable_for_fetching_timestamp(&id));
    }

    /// Timestamp ordering follows the raw milliseconds.
    #[test]
    fn timestamp_ordering(a in i64::MIN..i64::MAX, b in i64::MIN..i64::MAX) {
        prop_assert_eq!(Timestamp::new(a) <= Timestamp::new(b), a <= b);
    }

    /// Amount checked_add agrees with i128 arithmetic away from overflow.
    #[test]
    fn amount_checked_add(a in -1_000_000_000_000i128..1_000_000_000_000, b in -1_000_000_000_000i128..1_000_000_000_000) {
        prop_assert_eq!(Amount::new(a).checked_add(Amount::new(b)), Some(Amount::new(a + b)));
    }
}
