//! The declarative rule document: `{policy_version, defaults, rules}`.
//! Replaces exception-based denial with a sum-typed decision built from
//! rule-by-rule evaluation.

use std::collections::BTreeMap;

use memsub_types::MemoryState;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WhenValue {
    Scalar(String),
    List(Vec<String>),
}

impl WhenValue {
    pub fn matches(&self, actual: &str) -> bool {
        match self {
            WhenValue::Scalar(expected) => expected == actual,
            WhenValue::List(options) => options.iter().any(|o| o == actual),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThenActions {
    pub set_state: Option<MemoryState>,
    pub allow_read: Option<bool>,
    pub include_in_prompt: Option<bool>,
    pub derive_impacts: Option<bool>,
    pub derive_seeds: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub when: BTreeMap<String, WhenValue>,
    pub then: ThenActions,
}

impl Rule {
    /// A rule matches when every condition in `when` matches the context.
    /// A condition whose key is absent from the context never matches.
    pub fn matches(&self, context: &BTreeMap<String, String>) -> bool {
        self.when.iter().all(|(path, expected)| context.get(path).map(|actual| expected.matches(actual)).unwrap_or(false))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Defaults {
    pub write_allow: bool,
    pub read_allow: bool,
    pub include_in_prompt_allow: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        // write = allow, read = deny, include_in_prompt = deny (§4.2).
        Self { write_allow: true, read_allow: false, include_in_prompt_allow: false }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyDocument {
    pub policy_version: String,
    #[serde(default)]
    pub defaults: Defaults,
    pub rules: Vec<Rule>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyTrace {
    pub policy_version: String,
    pub matched_rules: Vec<String>,
    pub final_decision: String,
    pub denied_reasons: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestDecision {
    pub allowed: bool,
    pub state: MemoryState,
    pub derive_impacts: bool,
    pub derive_seeds: bool,
    pub trace: PolicyTrace,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryDecision {
    pub allowed: bool,
    pub include_in_prompt: bool,
    pub trace: PolicyTrace,
}
