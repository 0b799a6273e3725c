//! Builds the dotted-path evaluation context a [`crate::model::Rule`]
//! matches against, from a candidate memory and the request's purpose.

use std::collections::BTreeMap;

use memsub_types::audit_event::AccessPurpose;
use memsub_types::memory_v2::MemoryObject;

const SENSITIVE_CATEGORIES: &[&str] = &["trauma", "shame", "moral_injury"];

fn tag<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(String::from))
        .unwrap_or_default()
}

pub fn build(memory: &MemoryObject, purpose: Option<AccessPurpose>) -> BTreeMap<String, String> {
    let mut ctx = BTreeMap::new();
    ctx.insert("memory.type".to_string(), tag(&memory.r#type));
    ctx.insert("memory.truth_mode".to_string(), tag(&memory.truth_mode));
    ctx.insert("memory.sensitivity.level".to_string(), tag(&memory.sensitivity.level));
    ctx.insert("memory.ownership.dispute_state".to_string(), tag(&memory.ownership.dispute_state));
    let has_sensitive = memory.sensitivity.categories.iter().any(|c| SENSITIVE_CATEGORIES.iter().any(|s| c.eq_ignore_ascii_case(s)));
    ctx.insert("memory.sensitivity.has_sensitive_category".to_string(), has_sensitive.to_string());
    if let Some(p) = purpose {
        ctx.insert("request.purpose".to_string(), tag(&p));
    }
    ctx
}
