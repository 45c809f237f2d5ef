//! Property-based tests for position key generation.

use proptest::prelude::*;
use taskboard_kanban::{generate_between, KeyError, PositionKey};

// Longest random key; longer keys only stretch the shared prefix
const MAX_KEY_LEN: usize = 8;
const MAX_REPEATED_INSERTS: usize = 300;

fn key_strategy() -> impl Strategy<Value = PositionKey> {
    proptest::string::string_regex(&format!("[0-9a-z]{{0,{}}}[1-9a-z]", MAX_KEY_LEN - 1))
        .expect("valid key regex")
        .prop_map(|s| PositionKey::parse(s).expect("strategy yields valid keys"))
}

/// A generated key must itself survive parsing
fn assert_valid(key: &PositionKey) {
    assert_eq!(PositionKey::parse(key.as_str()).as_ref(), Ok(key));
}

proptest! {
    #[test]
    fn generated_key_sorts_strictly_between(a in key_strategy(), b in key_strategy()) {
        prop_assume!(a != b);
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };

        let key = generate_between(Some(&lo), Some(&hi)).unwrap();

        prop_assert!(lo < key, "{} !< {}", lo, key);
        prop_assert!(key < hi, "{} !< {}", key, hi);
        assert_valid(&key);
    }

    #[test]
    fn out_of_order_pairs_are_rejected(a in key_strategy(), b in key_strategy()) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };

        let result = generate_between(Some(&hi), Some(&lo));

        prop_assert!(
            matches!(result, Err(KeyError::OutOfOrder { .. })),
            "expected out-of-order error, got {:?}",
            result
        );
    }

    #[test]
    fn head_and_tail_keys_sort_outside_boundary(k in key_strategy()) {
        let head = generate_between(None, Some(&k)).unwrap();
        let tail = generate_between(Some(&k), None).unwrap();

        prop_assert!(head < k);
        prop_assert!(k < tail);
        assert_valid(&head);
        assert_valid(&tail);
    }

    #[test]
    fn repeated_head_and_tail_inserts_are_monotonic(
        start in key_strategy(),
        n in 1usize..MAX_REPEATED_INSERTS,
    ) {
        let mut head = start.clone();
        let mut tail = start;
        for _ in 0..n {
            let next_head = generate_between(None, Some(&head)).unwrap();
            let next_tail = generate_between(Some(&tail), None).unwrap();
            prop_assert!(next_head < head);
            prop_assert!(tail < next_tail);
            head = next_head;
            tail = next_tail;
        }
    }

    #[test]
    fn repeated_inserts_into_one_gap_stay_inside(
        a in key_strategy(),
        b in key_strategy(),
        n in 1usize..MAX_REPEATED_INSERTS,
        toward_lower in any::<bool>(),
    ) {
        prop_assume!(a != b);
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };

        // Keep splitting the gap next to one boundary; every key is new and in range
        let mut edge = if toward_lower { hi.clone() } else { lo.clone() };
        for _ in 0..n {
            let key = if toward_lower {
                generate_between(Some(&lo), Some(&edge)).unwrap()
            } else {
                generate_between(Some(&edge), Some(&hi)).unwrap()
            };
            prop_assert!(lo < key && key < hi);
            prop_assert_ne!(&key, &edge);
            edge = key;
        }
    }
}
