use serde_json::Value;
use std::collections::BTreeMap;

/// Serialize `value` to the canonical-JSON form used throughout the
/// interchange format (§6.2) and the journal's content hash (§6.3/§4.9):
/// object keys sorted, no insignificant whitespace, `null` for absent
/// numeric values, and `serde_json`'s shortest round-trippable float
/// formatting (its default `f64` `Display` impl already satisfies this).
///
/// Two implementations handed the same logical payload must produce byte-
/// identical output here for their content hashes to agree.
pub fn canonical_json(value: &Value) -> String {
    serde_json::to_string(&sort_keys(value)).expect("canonical JSON values are always serializable")
}

fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<String, Value> =
                map.iter().map(|(k, v)| (k.clone(), sort_keys(v))).collect();
            let mut out = serde_json::Map::new();
            for (k, v) in sorted {
                out.insert(k, v);
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sorts_object_keys_recursively() {
        let a = json!({"b": 1, "a": {"d": 2, "c": 3}});
        let b = json!({"a": {"c": 3, "d": 2}, "b": 1});
        assert_eq!(canonical_json(&a), canonical_json(&b));
    }

    #[test]
    fn distinct_payloads_differ() {
        let a = json!({"x": 1});
        let b = json!({"x": 2});
        assert_ne!(canonical_json(&a), canonical_json(&b));
    }
}
