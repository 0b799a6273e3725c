//! Builds a compact textual context from impacts and seeds, never quoting
//! sealed narrative (§4.5).

use memsub_types::audit_event::{AccessPurpose, Caller};
use memsub_types::constraint::{Constraint, ConstraintKind};
use memsub_types::memory_v2::ScopeV2;
use memsub_types::{AccessLogV2, TenantId};

use crate::engine::Engine;
use crate::error::EngineError;

const RECONSTRUCT_LIMIT: usize = 100;
const MAX_CUES: usize = 10;

const KIND_ORDER: &[(ConstraintKind, &str)] = &[
    (ConstraintKind::Avoid, "Avoid"),
    (ConstraintKind::Prefer, "Prefer"),
    (ConstraintKind::Require, "Require"),
    (ConstraintKind::Tone, "Tone"),
    (ConstraintKind::Style, "Style"),
    (ConstraintKind::Boundary, "Boundary"),
    (ConstraintKind::Safety, "Safety"),
];

#[derive(Debug, Clone)]
pub struct ReconstructResult {
    pub reconstructed_context: String,
    pub confidence: f64,
    pub sources: serde_json::Value,
}

fn constraints_from(impacts: &[serde_json::Value]) -> Vec<Constraint> {
    impacts
        .iter()
        .filter_map(|v| v.get("constraints"))
        .filter_map(|v| serde_json::from_value::<Vec<Constraint>>(v.clone()).ok())
        .flatten()
        .collect()
}

fn line_for_kind(kind: ConstraintKind, label: &str, constraints: &[Constraint]) -> Option<String> {
    let values: Vec<String> = constraints
        .iter()
        .filter(|c| c.kind == kind)
        .map(|c| c.param_str("value").map(String::from).unwrap_or_else(|| c.topic.clone()))
        .collect();
    if values.is_empty() {
        None
    } else {
        Some(format!("{label}: {}", values.join(", ")))
    }
}

fn cues_line(seeds: &[serde_json::Value]) -> Option<String> {
    let cues: Vec<String> = seeds
        .iter()
        .filter_map(|v| v.get("cues"))
        .filter_map(|v| v.as_array())
        .flatten()
        .filter_map(|c| c.as_str().map(String::from))
        .take(MAX_CUES)
        .collect();
    if cues.is_empty() {
        None
    } else {
        Some(format!("Cues: {}", cues.join(", ")))
    }
}

impl Engine {
    pub fn reconstruct_v2(
        &self,
        caller: Caller,
        tenant_id: TenantId,
        scope: ScopeV2,
        purpose: AccessPurpose,
        query_text: Option<&str>,
        include_events: bool,
    ) -> Result<(ReconstructResult, AccessLogV2), EngineError> {
        let (retrieved, access_log) = self.retrieve_v2(caller, tenant_id, scope, purpose, query_text, RECONSTRUCT_LIMIT)?;

        let constraints = constraints_from(&retrieved.impacts);
        let mut lines: Vec<String> = KIND_ORDER.iter().filter_map(|(kind, label)| line_for_kind(*kind, label, &constraints)).collect();

        if let Some(cues) = cues_line(&retrieved.seeds) {
            lines.push(cues);
        }

        if include_events {
            lines.push(format!("Referenced events: {} (content not included)", retrieved.events.len()));
        } else {
            lines.push("Events: excluded (sealed memories not reconstructed)".to_string());
        }

        let has_impacts = !retrieved.impacts.is_empty();
        let has_seeds = !retrieved.seeds.is_empty();
        let mut confidence: f64 = 0.0;
        if has_impacts {
            confidence += 0.4;
        }
        if has_seeds {
            confidence += 0.2;
        }
        if include_events {
            confidence += 0.1;
        }
        if has_impacts {
            confidence = confidence.max(0.5);
        }
        confidence = confidence.min(1.0);

        let sources = serde_json::json!({
            "impacts": retrieved.impacts,
            "seeds": retrieved.seeds,
            "events": retrieved.events.iter().map(|id| id.as_str()).collect::<Vec<_>>(),
        });

        Ok((
            ReconstructResult { reconstructed_context: lines.join("\n"), confidence, sources },
            access_log,
        ))
    }
}
