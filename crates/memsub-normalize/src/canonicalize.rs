//! Write-time canonicalization: applies per-shape normalization rules to
//! produce the stored form of a v1 value payload.

use std::collections::BTreeSet;

use memsub_types::ValueShape;
use serde_json::{Map, Value};

fn normalized_key(key: &str) -> String {
    key.chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .collect::<String>()
        .to_lowercase()
}

fn dedup_case_insensitive_sorted(items: &[Value]) -> Vec<Value> {
    let mut seen = BTreeSet::new();
    let mut kept: Vec<String> = Vec::new();
    for item in items {
        if let Some(s) = item.as_str() {
            let key = s.to_lowercase();
            if seen.insert(key) {
                kept.push(s.to_string());
            }
        }
    }
    kept.sort();
    kept.into_iter().map(Value::String).collect()
}

fn dedup_exact_sorted(items: &[Value]) -> Vec<Value> {
    let mut seen = BTreeSet::new();
    for item in items {
        if let Some(s) = item.as_str() {
            seen.insert(s.to_string());
        }
    }
    seen.into_iter().map(Value::String).collect()
}

/// Identity of a schedule-window dict: the sorted tuple of its key-value pairs.
fn window_identity(obj: &Map<String, Value>) -> String {
    let mut pairs: Vec<String> = obj.iter().map(|(k, v)| format!("{k}={v}")).collect();
    pairs.sort();
    pairs.join("&")
}

fn dedup_windows(items: &[Value]) -> Vec<Value> {
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    for item in items {
        if let Some(obj) = item.as_object() {
            let id = window_identity(obj);
            if seen.insert(id) {
                out.push(item.clone());
            }
        }
    }
    out
}

fn lowercase_flag_map(map: &Map<String, Value>, lowercase_all_string_values: bool) -> Map<String, Value> {
    let mut out = Map::new();
    for (k, v) in map {
        let lower_key = k.to_lowercase();
        let new_v = match v {
            Value::String(s) if lowercase_all_string_values || lower_key.contains("tag") => {
                Value::String(s.to_lowercase())
            }
            other => other.clone(),
        };
        out.insert(lower_key, new_v);
    }
    out
}

/// Produces the canonical stored form for a payload of the given shape.
pub fn canonicalize(shape: ValueShape, value: &Value) -> Value {
    match shape {
        ValueShape::LikesDislikes => {
            let mut out = Map::new();
            if let Some(obj) = value.as_object() {
                for key in ["likes", "dislikes"] {
                    if let Some(Value::Array(items)) = obj.get(key) {
                        out.insert(key.to_string(), Value::Array(dedup_case_insensitive_sorted(items)));
                    }
                }
                for (k, v) in obj {
                    if k != "likes" && k != "dislikes" {
                        out.insert(k.clone(), v.clone());
                    }
                }
            }
            Value::Object(out)
        }
        ValueShape::RulesList => {
            let items = value.as_array().cloned().unwrap_or_default();
            Value::Array(dedup_exact_sorted(&items))
        }
        ValueShape::ScheduleWindows => {
            if let Some(obj) = value.as_object() {
                let mut out = Map::new();
                for key in ["windows", "time_slots"] {
                    if let Some(Value::Array(items)) = obj.get(key) {
                        out.insert(key.to_string(), Value::Array(dedup_windows(items)));
                    }
                }
                for (k, v) in obj {
                    if k != "windows" && k != "time_slots" {
                        out.insert(k.clone(), v.clone());
                    }
                }
                Value::Object(out)
            } else {
                let items = value.as_array().cloned().unwrap_or_default();
                Value::Array(dedup_windows(&items))
            }
        }
        ValueShape::BooleanFlags => {
            let obj = value.as_object().cloned().unwrap_or_default();
            Value::Object(lowercase_flag_map(&obj, false))
        }
        ValueShape::AttentionSettings => {
            let obj = value.as_object().cloned().unwrap_or_default();
            Value::Object(lowercase_flag_map(&obj, true))
        }
        ValueShape::KvMap => {
            let obj = value.as_object().cloned().unwrap_or_default();
            Value::Object(lowercase_flag_map(&obj, false))
        }
    }
}

pub fn normalized_key_for(key: &str) -> String {
    normalized_key(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn likes_dislikes_dedupes_case_insensitively_and_sorts() {
        let v = json!({"likes": ["coffee", "Tea", "coffee"], "dislikes": ["milk"]});
        let out = canonicalize(ValueShape::LikesDislikes, &v);
        assert_eq!(out, json!({"likes": ["Tea", "coffee"], "dislikes": ["milk"]}));
    }

    #[test]
    fn rules_list_dedupes_exact_and_sorts() {
        let v = json!(["b", "a", "a"]);
        let out = canonicalize(ValueShape::RulesList, &v);
        assert_eq!(out, json!(["a", "b"]));
    }

    #[test]
    fn kv_map_lowercases_keys_and_tag_values() {
        let v = json!({"Timezone": "UTC", "Primary_Tag": "Work"});
        let out = canonicalize(ValueShape::KvMap, &v);
        assert_eq!(out, json!({"timezone": "UTC", "primary_tag": "work"}));
    }
}
