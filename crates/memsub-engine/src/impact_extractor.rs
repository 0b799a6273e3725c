//! Deterministic event → impact derivation (§4.4). Pure aside from minted
//! ids and the injected clock: replaying the same event yields the same
//! constraint set.

use chrono::{DateTime, Utc};
use memsub_types::constraint::{Constraint, ConstraintKind, ConstraintTarget, MergeSlot, MergeStrategy};
use memsub_types::id::ConstraintId;
use memsub_types::link::{DerivedObjectLink, LinkRelationship};
use memsub_types::memory_v2::{
    ContentBody, ContentFormat, ImpactPayload, MemoryObject, MemoryState, MemoryType,
    ProvenanceSource, ReconsolidationPolicy, TransformStep, TruthMode, TypedPayloads,
};
use memsub_types::id::MemoryId;
use regex::Regex;

const TRANSFORM_ID: &str = "tx_impact_extract_v2.1.0";

fn merge_slot(slot: &str) -> MergeSlot {
    MergeSlot { slot: slot.to_string(), strategy: MergeStrategy::LatestWins, tie_breakers: Vec::new() }
}

fn constraint(
    kind: ConstraintKind,
    topic: &str,
    target: ConstraintTarget,
    params: serde_json::Value,
    source_ref: MemoryId,
    now: DateTime<Utc>,
) -> Constraint {
    let params = params.as_object().cloned().unwrap_or_default().into_iter().collect();
    Constraint {
        constraint_id: ConstraintId::new(),
        kind,
        topic: topic.to_string(),
        target,
        rule: TRANSFORM_ID.to_string(),
        params,
        weight: 1.0,
        priority: 0,
        confidence: 0.7,
        created_at: now,
        expires_at: None,
        source_refs: vec![source_ref],
        merge: merge_slot(topic),
    }
}

fn sensitivity_constraints(event: &MemoryObject, now: DateTime<Utc>) -> Vec<Constraint> {
    let mut out = Vec::new();
    let id = || event.id.clone();
    if event.sensitivity.has_category("trauma") {
        out.push(constraint(
            ConstraintKind::Safety,
            "trauma",
            ConstraintTarget::Response,
            serde_json::json!({"mode": "supportive_reframe_only", "consent_required": true}),
            id(),
            now,
        ));
    }
    if event.sensitivity.has_category("shame") || event.sensitivity.has_category("moral_injury") {
        out.push(constraint(
            ConstraintKind::Avoid,
            "judgment_language",
            ConstraintTarget::Response,
            serde_json::json!({}),
            id(),
            now,
        ));
        out.push(constraint(
            ConstraintKind::Tone,
            "non_judgmental",
            ConstraintTarget::Response,
            serde_json::json!({}),
            id(),
            now,
        ));
    }
    out
}

fn detect_tone(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    const GENTLE: &[&str] = &["gentle", "soft", "kind", "caring"];
    const DIRECT: &[&str] = &["direct", "straightforward", "clear"];
    const SUPPORTIVE: &[&str] = &["supportive", "helpful", "encouraging"];
    const FIRM: &[&str] = &["firm", "strict", "serious"];
    if GENTLE.iter().any(|w| lower.contains(w)) {
        Some("reassuring")
    } else if DIRECT.iter().any(|w| lower.contains(w)) {
        Some("matter_of_fact")
    } else if SUPPORTIVE.iter().any(|w| lower.contains(w)) {
        Some("supportive")
    } else if FIRM.iter().any(|w| lower.contains(w)) {
        Some("firm")
    } else {
        None
    }
}

fn detect_style(text: &str) -> Option<&'static str> {
    let bullets = Regex::new(r"(?m)^\s*[-*•]\s").unwrap();
    let numbered = Regex::new(r"(?m)^\s*\d+\.\s").unwrap();
    if bullets.is_match(text) {
        Some("bullets")
    } else if numbered.is_match(text) {
        Some("numbered_steps")
    } else if text.contains("paragraph") || text.matches("\n\n").count() > 3 {
        Some("short_paragraphs")
    } else {
        None
    }
}

fn content_constraints(event: &MemoryObject, now: DateTime<Utc>) -> Vec<Constraint> {
    let mut out = Vec::new();
    let Some(text) = event.content.text.as_deref() else { return out };
    if let Some(tone) = detect_tone(text) {
        out.push(constraint(
            ConstraintKind::Tone,
            "tone_preference",
            ConstraintTarget::Response,
            serde_json::json!({"value": tone}),
            event.id.clone(),
            now,
        ));
    }
    if let Some(style) = detect_style(text) {
        out.push(constraint(
            ConstraintKind::Style,
            "style_preference",
            ConstraintTarget::Response,
            serde_json::json!({"value": style}),
            event.id.clone(),
            now,
        ));
    }
    out
}

/// Produces the derived impact memory and its link for `event`, or `None` if
/// no constraint was derivable. Caller is responsible for checking
/// `event.state != sealed` and policy's `derive_impacts` flag beforehand.
pub fn extract_impact(event: &MemoryObject, policy_version: &str, now: DateTime<Utc>) -> Option<(MemoryObject, DerivedObjectLink)> {
    if event.state == MemoryState::Sealed {
        return None;
    }

    let mut constraints = sensitivity_constraints(event, now);
    constraints.extend(content_constraints(event, now));
    if constraints.is_empty() {
        return None;
    }

    let impact = MemoryObject {
        id: MemoryId::new(),
        tenant_id: event.tenant_id.clone(),
        scope: event.scope.clone(),
        r#type: MemoryType::Impact,
        truth_mode: TruthMode::Procedural,
        state: MemoryState::Active,
        sensitivity: event.sensitivity.clone(),
        ownership: event.ownership.clone(),
        temporal: event.temporal.clone(),
        content: ContentBody { format: ContentFormat::Json, language: None, text: None, json: Some(serde_json::json!({"derived_from_event": event.id.as_str()})) },
        affect: event.affect.clone(),
        strength: event.strength.clone(),
        provenance: memsub_types::memory_v2::Provenance {
            source: ProvenanceSource::System,
            surface: None,
            transform_chain: vec![TransformStep { transform_id: TRANSFORM_ID.to_string(), applied_at: now }],
            policy_version: policy_version.to_string(),
            confidence: 0.7,
            derived_from: vec![event.id.clone()],
        },
        reconsolidation_policy: ReconsolidationPolicy::AppendOnly,
        payloads: TypedPayloads { impact_payload: Some(ImpactPayload { constraints }), ..Default::default() },
        created_at: now,
        updated_at: now,
    };

    let link = DerivedObjectLink::new(event.id.clone(), impact.id.clone(), LinkRelationship::DerivedImpact, TRANSFORM_ID, 0.4, now);
    Some((impact, link))
}

#[cfg(test)]
mod tests {
    use super::*;
    use memsub_types::memory_v2::{
        Affect, DecayModel, DisputeState, OwnerType, Ownership, Sensitivity, SensitivityHandling,
        SensitivityLevel, Strength, Temporal, TemporalPrecision, Visibility,
    };
    use memsub_types::{ScopeType, ScopeV2, TenantId};

    fn base_event(text: &str, categories: Vec<&str>) -> MemoryObject {
        let now = Utc::now();
        MemoryObject {
            id: MemoryId::new(),
            tenant_id: TenantId::new(),
            scope: ScopeV2 { scope_type: ScopeType::User, scope_id: "u1".to_string(), flags: vec![] },
            r#type: MemoryType::Event,
            truth_mode: TruthMode::FactualClaim,
            state: MemoryState::Active,
            sensitivity: Sensitivity {
                level: SensitivityLevel::Medium,
                categories: categories.into_iter().map(String::from).collect(),
                handling: SensitivityHandling::Normal,
            },
            ownership: Ownership {
                owner_type: OwnerType::User,
                owners: vec![],
                claimant: None,
                subjects: vec![],
                dispute_state: DisputeState::Undisputed,
                visibility: Visibility::Private,
            },
            temporal: Temporal { occurred_at_observed: now, occurred_at_claimed: None, precision: TemporalPrecision::Exact, confidence: 1.0, range: None, ordering_uncertainty: false },
            content: ContentBody { format: ContentFormat::Text, language: None, text: Some(text.to_string()), json: None },
            affect: Affect { valence: 0.0, arousal: 0.0, labels: vec![], confidence: 0.5, history: vec![] },
            strength: Strength { initial: 1.0, current: 1.0, decay_model: DecayModel::None, half_life_days: None, last_reinforced_at: None },
            provenance: memsub_types::memory_v2::Provenance { source: ProvenanceSource::User, surface: None, transform_chain: vec![], policy_version: "pol_test".to_string(), confidence: 1.0, derived_from: vec![] },
            reconsolidation_policy: ReconsolidationPolicy::NeverEditSource,
            payloads: TypedPayloads::default(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn trauma_category_yields_a_safety_constraint() {
        let event = base_event("a gentle retelling", vec!["trauma"]);
        let (impact, link) = extract_impact(&event, "pol_test", Utc::now()).unwrap();
        let payload = impact.payloads.impact_payload.unwrap();
        assert!(payload.constraints.iter().any(|c| c.kind == ConstraintKind::Safety));
        assert_eq!(link.relationship, LinkRelationship::DerivedImpact);
        assert_eq!(link.strength_transfer, 0.4);
    }

    #[test]
    fn no_sensitivity_and_plain_text_yields_no_impact() {
        let event = base_event("ordinary note", vec![]);
        assert!(extract_impact(&event, "pol_test", Utc::now()).is_none());
    }

    #[test]
    fn bullet_markers_are_detected_as_style() {
        let event = base_event("- first\n- second", vec![]);
        let (impact, _) = extract_impact(&event, "pol_test", Utc::now()).unwrap();
        let payload = impact.payloads.impact_payload.unwrap();
        let style = payload.constraints.iter().find(|c| c.kind == ConstraintKind::Style).unwrap();
        assert_eq!(style.param_str("value"), Some("bullets"));
    }

    #[test]
    fn extraction_is_deterministic_modulo_ids_and_timestamps() {
        let event = base_event("gentle and caring, use bullets:\n- one\n- two", vec!["shame"]);
        let (a, _) = extract_impact(&event, "pol_test", Utc::now()).unwrap();
        let (b, _) = extract_impact(&event, "pol_test", Utc::now()).unwrap();
        let kinds_a: Vec<_> = a.payloads.impact_payload.unwrap().constraints.iter().map(|c| c.kind).collect();
        let kinds_b: Vec<_> = b.payloads.impact_payload.unwrap().constraints.iter().map(|c| c.kind).collect();
        assert_eq!(kinds_a, kinds_b);
    }
}
