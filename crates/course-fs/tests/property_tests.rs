use course_fs::{canonical_json, hash_dict, hash_text};
use proptest::prelude::*;
use serde_json::{Map, Value, json};

fn arb_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        "\\PC{0,12}".prop_map(Value::String),
    ]
}

fn arb_value() -> impl Strategy<Value = Value> {
    arb_leaf().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::vec(("[a-z_]{1,8}", inner), 0..5).prop_map(|entries| {
                let mut map = Map::new();
                for (k, v) in entries {
                    map.insert(k, v);
                }
                Value::Object(map)
            }),
        ]
    })
}

/// Rebuild every object with its keys inserted in reverse order.
fn reverse_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.reverse();
            let mut out = Map::new();
            for (k, v) in entries {
                out.insert(k.clone(), reverse_keys(v));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(reverse_keys).collect()),
        other => other.clone(),
    }
}

proptest! {
    #[test]
    fn hash_is_independent_of_key_insertion_order(value in arb_value()) {
        prop_assert_eq!(hash_dict(&value), hash_dict(&reverse_keys(&value)));
    }

    #[test]
    fn canonical_form_is_stable_under_reparse(value in arb_value()) {
        let once = canonical_json(&value);
        let reparsed: Value = serde_json::from_str(&once).unwrap();
        prop_assert_eq!(canonical_json(&reparsed), once);
    }

    #[test]
    fn hash_is_deterministic(text in "\\PC*") {
        prop_assert_eq!(hash_text(&text), hash_text(&text));
    }

    #[test]
    fn swapping_distinct_list_elements_changes_hash(a in "[a-z]{1,6}", b in "[A-Z]{1,6}") {
        let forward = json!({"answers": [a.clone(), b.clone()]});
        let backward = json!({"answers": [b, a]});
        prop_assert_ne!(hash_dict(&forward), hash_dict(&backward));
    }

    #[test]
    fn changing_one_field_changes_hash(title in "[a-z]{1,10}", suffix in "[a-z]{1,4}") {
        let before = json!({"title": title.clone(), "published": true});
        let after = json!({"title": format!("{title}{suffix}"), "published": true});
        prop_assert_ne!(hash_dict(&before), hash_dict(&after));
    }
}
