//! Deterministic, fail-closed evaluation of ingest, query, and
//! tool-execution decisions against a versioned rule document.

use memsub_types::audit_event::AccessPurpose;
use memsub_types::memory_v2::{MemoryObject, MemoryState};

use crate::context;
use crate::model::{IngestDecision, PolicyDocument, PolicyTrace, QueryDecision};

pub struct PolicyEngine {
    document: PolicyDocument,
}

impl PolicyEngine {
    pub fn new(document: PolicyDocument) -> Self {
        Self { document }
    }

    pub fn policy_version(&self) -> &str {
        &self.document.policy_version
    }

    pub fn document(&self) -> &PolicyDocument {
        &self.document
    }

    /// Ingest evaluation: start from `defaults.write_allow`; matching rules
    /// may override `state`, `derive_impacts`, `derive_seeds`.
    pub fn evaluate_ingest(&self, draft: &MemoryObject) -> IngestDecision {
        let ctx = context::build(draft, None);
        let mut state = MemoryState::Active;
        let mut derive_impacts = false;
        let mut derive_seeds = false;
        let mut matched_rules = Vec::new();

        for rule in &self.document.rules {
            if rule.matches(&ctx) {
                matched_rules.push(rule.id.clone());
                if let Some(s) = rule.then.set_state {
                    state = s;
                }
                if let Some(d) = rule.then.derive_impacts {
                    derive_impacts = d;
                }
                if let Some(d) = rule.then.derive_seeds {
                    derive_seeds = d;
                }
            }
        }

        let allowed = self.document.defaults.write_allow;
        IngestDecision {
            allowed,
            state,
            derive_impacts,
            derive_seeds,
            trace: PolicyTrace {
                policy_version: self.document.policy_version.clone(),
                matched_rules,
                final_decision: if allowed { "allow".to_string() } else { "deny".to_string() },
                denied_reasons: Vec::new(),
            },
        }
    }

    /// Query evaluation: accumulate every matching rule's opinion;
    /// most-restrictive-wins — a final "allow" requires every rule that
    /// expressed an opinion to say "allow". A key with no opinions falls
    /// back to its default.
    pub fn evaluate_query(&self, memory: &MemoryObject, purpose: AccessPurpose) -> QueryDecision {
        let ctx = context::build(memory, Some(purpose));
        let mut read_opinions = Vec::new();
        let mut prompt_opinions = Vec::new();
        let mut matched_rules = Vec::new();
        let mut denied_reasons = Vec::new();

        for rule in &self.document.rules {
            if rule.matches(&ctx) {
                matched_rules.push(rule.id.clone());
                if let Some(v) = rule.then.allow_read {
                    read_opinions.push(v);
                    if !v {
                        denied_reasons.push(rule.id.clone());
                    }
                }
                if let Some(v) = rule.then.include_in_prompt {
                    prompt_opinions.push(v);
                }
            }
        }

        let allowed = if read_opinions.is_empty() {
            self.document.defaults.read_allow
        } else {
            read_opinions.iter().all(|v| *v)
        };
        let include_in_prompt = if prompt_opinions.is_empty() {
            self.document.defaults.include_in_prompt_allow
        } else {
            prompt_opinions.iter().all(|v| *v)
        };

        QueryDecision {
            allowed,
            include_in_prompt,
            trace: PolicyTrace {
                policy_version: self.document.policy_version.clone(),
                matched_rules,
                final_decision: if allowed { "allow".to_string() } else { "deny".to_string() },
                denied_reasons,
            },
        }
    }

    /// Independent of declared rules: for `task_execution`, nonfactual truth
    /// modes are always denied (Invariant 3 / property S5).
    pub fn evaluate_tool_execution(&self, memory: &MemoryObject, purpose: AccessPurpose) -> bool {
        if matches!(purpose, AccessPurpose::TaskExecution) && memory.truth_mode.is_nonfactual() {
            return false;
        }
        true
    }
}
