//! Property-based test generators using proptest.

use proptest::prelude::*;

/// A grouping value, or a missing cell.
///
/// Words come from a small alphabet so that groups collide often. Numeric
/// lookalikes (`"02134"` next to `"2134"` and `"2134.0"`), non-finite
/// spellings, padded text and the literal text `null` must each stay in a
/// group of their own.
pub fn arb_group_key() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        4 => "[a-c]{1,2}".prop_map(Some),
        2 => prop::sample::select(vec![
            "2134", "02134", "2134.0", "1", "1.0", "01", "-0", "0",
        ])
        .prop_map(|k| Some(k.to_string())),
        1 => prop::sample::select(vec!["NaN", "nan", "inf", "-inf", "infinity"])
            .prop_map(|k| Some(k.to_string())),
        1 => prop::sample::select(vec![" a", "a ", "a b", "", "null", "NULL"])
            .prop_map(|k| Some(k.to_string())),
        1 => Just(None),
    ]
}

/// Grouping column contents for a table of 0..40 rows.
///
/// # Example
///
/// ```
/// use proptest::prelude::*;
/// use testsupport::proptest_generators::arb_group_keys;
///
/// proptest! {
///     #[test]
///     fn keys_are_short(keys in arb_group_keys()) {
///         prop_assert!(keys.iter().flatten().all(|k| k.len() <= 8));
///     }
/// }
/// ```
pub fn arb_group_keys() -> impl Strategy<Value = Vec<Option<String>>> {
    prop::collection::vec(arb_group_key(), 0..40)
}

/// Payloads for the response queue, including empty strings and JSON text.
pub fn arb_payloads() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(
        prop_oneof![
            Just(String::new()),
            "[a-z ]{0,12}",
            "[0-9]{1,4}".prop_map(|n| format!(r#"{{"id":{n}}}"#)),
        ],
        0..20,
    )
}

/// Brute-force group sizes: for each row, how many rows share its key.
pub fn expected_group_sizes(keys: &[Option<String>]) -> Vec<usize> {
    keys.iter()
        .map(|key| keys.iter().filter(|other| *other == key).count())
        .collect()
}
