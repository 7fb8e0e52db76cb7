//! Property-based tests for the patchers.
//!
//! These use proptest to check that the invariants of the text patchers hold
//! for arbitrary entries, not just the hand-picked cases of the unit tests.

#[cfg(test)]
mod proptest_tests {
    use crate::patch::{document, markers, registry, PathAddress};
    use proptest::prelude::*;
    use serde_json::{json, Value as JsonValue};

    fn entry() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9/._-]{0,11}"
    }

    fn group() -> impl Strategy<Value = String> {
        "[A-Z][a-z]{1,6}(\\\\[A-Z][a-z]{1,6}){0,2}"
    }

    fn base_content() -> impl Strategy<Value = String> {
        prop::collection::vec("[a-z/#*.]{1,10}", 0..4).prop_map(|lines| {
            if lines.is_empty() {
                String::new()
            } else {
                format!("{}\n", lines.join("\n"))
            }
        })
    }

    // ============================================================================
    // marker groups
    // ============================================================================

    proptest! {
        /// Property: adding the same lines twice changes nothing the second time
        #[test]
        fn add_lines_is_idempotent(
            base in base_content(),
            entries in prop::collection::vec(entry(), 1..6),
            name in group(),
        ) {
            let (once, _) = markers::add_lines(&base, &entries, &name).unwrap();
            let (twice, stats) = markers::add_lines(&once, &entries, &name).unwrap();
            prop_assert_eq!(&once, &twice);
            prop_assert_eq!(stats.added, 0);
            prop_assert_eq!(stats.skipped, entries.len());
        }

        /// Property: removing one unit's group leaves another unit's group intact
        #[test]
        fn groups_are_isolated(
            base in base_content(),
            first in prop::collection::vec(entry(), 1..4),
            second in prop::collection::vec(entry(), 1..4),
        ) {
            let (with_first, _) = markers::add_lines(&base, &first, "Acme\\First").unwrap();
            let (with_both, _) = markers::add_lines(&with_first, &second, "Acme\\Second").unwrap();
            let removed = markers::remove_group(&with_both, "Acme\\Second").unwrap();
            prop_assert_eq!(removed, with_first);
        }

        /// Property: env entries added twice with no-overwrite are stable
        #[test]
        fn add_keyed_lines_is_idempotent(
            entries in prop::collection::vec(("[a-z][a-z0-9_]{0,8}", "[ -~]{0,12}"), 1..5),
        ) {
            let (once, _) = markers::add_keyed_lines("", &entries, "Acme\\Cache", false).unwrap();
            let (twice, stats) = markers::add_keyed_lines(&once, &entries, "Acme\\Cache", false).unwrap();
            prop_assert_eq!(&once, &twice);
            prop_assert_eq!(stats.added, 0);
        }
    }

    // ============================================================================
    // registry
    // ============================================================================

    proptest! {
        /// Property: registry entries stay sorted whatever the insertion order
        #[test]
        fn registry_entries_stay_sorted(names in prop::collection::vec(group(), 1..8)) {
            let mut content = "<?php\n\nreturn [\n];\n".to_string();
            for name in &names {
                content = registry::add_entry(&content, name).unwrap();
            }

            let entries: Vec<&str> = content
                .lines()
                .filter(|line| line.contains("::class"))
                .map(str::trim)
                .collect();
            let mut sorted = entries.clone();
            sorted.sort();
            prop_assert_eq!(&entries, &sorted);

            let again = registry::add_entry(&content, &names[0]).unwrap();
            prop_assert_eq!(again, content);
        }
    }

    // ============================================================================
    // documents
    // ============================================================================

    fn json_value() -> impl Strategy<Value = JsonValue> {
        let leaf = prop_oneof![
            Just(JsonValue::Null),
            any::<i64>().prop_map(JsonValue::from),
            "[a-z]{0,4}".prop_map(JsonValue::from),
        ];
        leaf.prop_recursive(3, 16, 3, |inner| {
            prop::collection::btree_map("[a-c]", inner, 0..3)
                .prop_map(|map| JsonValue::Object(map.into_iter().collect()))
        })
    }

    fn json_document() -> impl Strategy<Value = JsonValue> {
        prop::collection::btree_map("[a-c]", json_value(), 0..4)
            .prop_map(|map| JsonValue::Object(map.into_iter().collect()))
    }

    /// `original` with the missing parents of `path` added as empty maps, or
    /// `None` if a set without overwrite cannot reach a fresh final key.
    fn with_empty_parents(original: &JsonValue, path: &PathAddress) -> Option<JsonValue> {
        let (last, parents) = path.segments().split_last()?;
        let mut expected = original.clone();
        let mut current = &mut expected;
        for segment in parents {
            if current.is_null() {
                *current = json!({});
            }
            current = current
                .as_object_mut()?
                .entry(segment.clone())
                .or_insert(JsonValue::Null);
        }
        if current.is_null() {
            *current = json!({});
        }
        if current.as_object()?.contains_key(last) {
            return None;
        }
        Some(expected)
    }

    proptest! {
        /// Property: removing a freshly set key restores the document, apart
        /// from the intermediate maps the set created
        #[test]
        fn remove_undoes_set(
            original in json_document(),
            segments in prop::collection::vec("[a-c]", 1..4),
        ) {
            let path = PathAddress::parse(&segments.join(".")).unwrap();
            let expected = with_empty_parents(&original, &path);
            prop_assume!(expected.is_some());

            let mut patched = original.clone();
            document::set(&mut patched, &path, json!("copycat"), false).unwrap();
            prop_assert_ne!(&patched, &original);
            document::remove(&mut patched, &path).unwrap();
            prop_assert_eq!(Some(patched), expected);
        }
    }

    // ============================================================================
    // document paths
    // ============================================================================

    proptest! {
        /// Property: a parsed path renders back to its input
        #[test]
        fn path_address_round_trips(segments in prop::collection::vec("[a-z0-9_-]{1,8}", 1..5)) {
            let raw = segments.join(".");
            let path = PathAddress::parse(&raw).unwrap();
            prop_assert_eq!(path.segments(), segments.as_slice());
            prop_assert_eq!(path.to_string(), raw);
        }

        /// Property: a path with an empty segment is always rejected
        #[test]
        fn path_address_rejects_empty_segments(
            head in "[a-z]{1,5}",
            tail in "[a-z]{1,5}",
        ) {
            let doubled = format!("{}..{}", head, tail);
            let leading = format!(".{}", head);
            let trailing = format!("{}.", tail);
            prop_assert!(PathAddress::parse(&doubled).is_err());
            prop_assert!(PathAddress::parse(&leading).is_err());
            prop_assert!(PathAddress::parse(&trailing).is_err());
        }
    }
}
