use proptest::prelude::*;
use visioncache::cache::{cache_key, content_hash};

proptest! {
    #[test]
    fn prop_digest_is_lowercase_hex_of_fixed_width(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
        let h = content_hash(&bytes);
        prop_assert_eq!(h.len(), 64);
        prop_assert!(h.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
        prop_assert_eq!(h, content_hash(&bytes.clone()));
    }

    #[test]
    fn prop_key_separates_models(bytes in proptest::collection::vec(any::<u8>(), 0..64), a in "[a-z0-9]{1,12}", b in "[a-z0-9]{1,12}") {
        let h = content_hash(&bytes);
        let ka = cache_key(&h, &a);
        prop_assert!(ka.starts_with(&h));
        prop_assert_eq!(ka == cache_key(&h, &b), a == b);
    }
}
