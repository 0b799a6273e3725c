//! Deterministic per-scope merge of multi-version v1 memories into a single
//! summary. Pure: identical inputs always produce byte-identical output.

use std::collections::BTreeMap;

use memsub_types::memory_v1::Scope;
use memsub_types::MemoryV1;
use serde_json::{Map, Value};

use crate::canonicalize::normalized_key_for;
use crate::fuzzy::similarity_ratio;

const MAX_CANDIDATES: usize = 50;
const SUMMARY_TEXT_MAX_BYTES: usize = 240;
const FUZZY_DEDUP_THRESHOLD: f64 = 0.85;

#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutput {
    pub summary_text: String,
    pub summary_struct: Value,
    pub confidence: f64,
}

fn select_and_order(memories: &[MemoryV1]) -> Vec<&MemoryV1> {
    let mut selected: Vec<&MemoryV1> = memories.iter().collect();
    selected.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    selected.truncate(MAX_CANDIDATES);
    selected.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    selected
}

fn fuzzy_merge_list(values: impl Iterator<Item = String>) -> Vec<String> {
    let mut kept: Vec<String> = Vec::new();
    for v in values {
        let trimmed = v.trim();
        let is_dup = kept.iter().any(|k| similarity_ratio(&k.to_lowercase(), &trimmed.to_lowercase()) >= FUZZY_DEDUP_THRESHOLD);
        if !is_dup {
            kept.push(trimmed.to_string());
        }
    }
    kept
}

fn string_array(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|a| a.iter().filter_map(|v| v.as_str().map(String::from)).collect())
        .unwrap_or_default()
}

fn merge_preferences(memories: &[&MemoryV1]) -> Value {
    let likes = fuzzy_merge_list(memories.iter().flat_map(|m| string_array(&m.value_json, "likes")));
    let dislikes = fuzzy_merge_list(memories.iter().flat_map(|m| string_array(&m.value_json, "dislikes")));

    // normalized-key kv merge over any other top-level fields, latest wins.
    let mut by_normalized: BTreeMap<String, (String, Value)> = BTreeMap::new();
    for m in memories {
        if let Some(obj) = m.value_json.as_object() {
            for (k, v) in obj {
                if k == "likes" || k == "dislikes" {
                    continue;
                }
                by_normalized.insert(normalized_key_for(k), (k.clone(), v.clone()));
            }
        }
    }

    let mut out = Map::new();
    if !likes.is_empty() {
        out.insert("likes".into(), Value::Array(likes.into_iter().map(Value::String).collect()));
    }
    if !dislikes.is_empty() {
        out.insert("dislikes".into(), Value::Array(dislikes.into_iter().map(Value::String).collect()));
    }
    for (_, (k, v)) in by_normalized {
        out.insert(k, v);
    }
    Value::Object(out)
}

fn merge_constraints(memories: &[&MemoryV1]) -> Value {
    let mut rules: std::collections::BTreeSet<String> = std::collections::BTreeSet::new();
    let mut kv: BTreeMap<String, Value> = BTreeMap::new();
    for m in memories {
        match &m.value_json {
            Value::Array(items) => {
                for item in items {
                    if let Some(s) = item.as_str() {
                        rules.insert(s.to_string());
                    }
                }
            }
            Value::Object(obj) => {
                for (k, v) in obj {
                    kv.insert(k.clone(), v.clone());
                }
            }
            _ => {}
        }
    }
    let mut out = Map::new();
    if !rules.is_empty() {
        out.insert("rules".into(), Value::Array(rules.into_iter().map(Value::String).collect()));
    }
    for (k, v) in kv {
        out.insert(k, v);
    }
    Value::Object(out)
}

fn merge_latest_wins(memories: &[&MemoryV1]) -> Value {
    let mut out = Map::new();
    for m in memories {
        if let Some(obj) = m.value_json.as_object() {
            for (k, v) in obj {
                out.insert(k.clone(), v.clone());
            }
        }
    }
    Value::Object(out)
}

fn window_identity(obj: &Map<String, Value>) -> String {
    let mut pairs: Vec<String> = obj.iter().map(|(k, v)| format!("{k}={v}")).collect();
    pairs.sort();
    pairs.join("&")
}

fn merge_schedule(memories: &[&MemoryV1]) -> Value {
    let mut seen = std::collections::BTreeSet::new();
    let mut windows = Vec::new();
    for m in memories {
        let candidates: Vec<Value> = match &m.value_json {
            Value::Array(items) => items.clone(),
            Value::Object(obj) => ["windows", "time_slots"]
                .iter()
                .filter_map(|k| obj.get(*k).and_then(Value::as_array).cloned())
                .flatten()
                .collect(),
            _ => Vec::new(),
        };
        for w in candidates {
            if let Some(obj) = w.as_object() {
                if seen.insert(window_identity(obj)) {
                    windows.push(w);
                }
            }
        }
    }
    let mut out = Map::new();
    out.insert("windows".into(), Value::Array(windows));
    Value::Object(out)
}

fn summary_text_for(summary_struct: &Value) -> String {
    let json = serde_json::to_string(summary_struct).unwrap_or_default();
    if json.len() <= SUMMARY_TEXT_MAX_BYTES {
        return json;
    }
    let mut truncated: String = json.chars().collect::<Vec<_>>()[..SUMMARY_TEXT_MAX_BYTES.saturating_sub(1)]
        .iter()
        .collect();
    truncated.push('…');
    truncated
}

/// Merges the (already fetched, not-necessarily ordered) set of matching v1
/// memories for one `(user, scope, domain)` key into a single summary.
pub fn merge(scope: Scope, memories: &[MemoryV1]) -> MergeOutput {
    let selected = select_and_order(memories);
    if selected.is_empty() {
        return MergeOutput {
            summary_text: "No memories found.".to_string(),
            summary_struct: Value::Object(Map::new()),
            confidence: 0.0,
        };
    }

    let summary_struct = match scope {
        Scope::Preferences => merge_preferences(&selected),
        Scope::Constraints => merge_constraints(&selected),
        Scope::Communication | Scope::Attention | Scope::Accessibility => merge_latest_wins(&selected),
        Scope::Schedule => merge_schedule(&selected),
    };

    let confidence = (0.5 + 0.1 * selected.len() as f64).min(0.9);
    let summary_text = summary_text_for(&summary_struct);
    MergeOutput { summary_text, summary_struct, confidence }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memsub_types::memory_v1::MemorySource;
    use memsub_types::ValueShape;
    use serde_json::json;
    use uuid::Uuid;

    fn mk(value: Value, shape: ValueShape, created_at: chrono::DateTime<chrono::Utc>) -> MemoryV1 {
        MemoryV1::new("u1", Scope::Preferences, None, value, shape, MemorySource::ExplicitUserInput, 30, Uuid::new_v4(), created_at)
    }

    #[test]
    fn empty_input_reports_no_memories_found() {
        let out = merge(Scope::Preferences, &[]);
        assert_eq!(out.summary_text, "No memories found.");
        assert_eq!(out.confidence, 0.0);
    }

    #[test]
    fn preferences_merge_is_deterministic_across_repeated_calls() {
        let now = chrono::Utc::now();
        let mems = vec![
            mk(json!({"likes": ["Tea", "coffee"], "dislikes": ["milk"]}), ValueShape::LikesDislikes, now),
        ];
        let first = merge(Scope::Preferences, &mems);
        let second = merge(Scope::Preferences, &mems);
        assert_eq!(first, second);
        assert_eq!(first.confidence, 0.6);
    }

    #[test]
    fn preferences_merge_fuzzy_dedupes_near_duplicates() {
        let now = chrono::Utc::now();
        let mems = vec![mk(json!({"likes": ["coffee", "coffe"]}), ValueShape::LikesDislikes, now)];
        let out = merge(Scope::Preferences, &mems);
        let likes = out.summary_struct.get("likes").unwrap().as_array().unwrap();
        assert_eq!(likes.len(), 1);
    }
}
