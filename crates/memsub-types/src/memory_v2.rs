//! The v2 `MemoryObject`: typed event/impact/seed memories with a state
//! machine, structured classification fields, and type-specific payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constraint::Constraint;
use crate::id::{MemoryId, TenantId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeType {
    User,
    Org,
    App,
    Session,
    Project,
    Case,
    Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeV2 {
    pub scope_type: ScopeType,
    pub scope_id: String,
    #[serde(default)]
    pub flags: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryType {
    Event,
    Impact,
    Seed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TruthMode {
    FactualClaim,
    SubjectiveExperience,
    Counterfactual,
    Imagined,
    SociallySourced,
    Procedural,
    Somatic,
    IdentityRoleBound,
}

impl TruthMode {
    /// Invariant 3 / property S5: these truth modes are never eligible
    /// evidence for `task_execution`, independent of any declared policy rule.
    pub fn is_nonfactual(self) -> bool {
        matches!(self, TruthMode::Counterfactual | TruthMode::Imagined | TruthMode::SociallySourced)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryState {
    Active,
    Restricted,
    Sealed,
    Dormant,
    Revoked,
    Tombstoned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensitivityLevel {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensitivityHandling {
    Normal,
    NoPrompt,
    NoSearch,
    SealedDefault,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sensitivity {
    pub level: SensitivityLevel,
    #[serde(default)]
    pub categories: Vec<String>,
    pub handling: SensitivityHandling,
}

impl Sensitivity {
    pub fn has_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c.eq_ignore_ascii_case(category))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerType {
    User,
    Org,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisputeState {
    Undisputed,
    Unverified,
    Disputed,
    Contested,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Private,
    Shared,
    Tenant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ownership {
    pub owner_type: OwnerType,
    #[serde(default)]
    pub owners: Vec<String>,
    pub claimant: Option<String>,
    #[serde(default)]
    pub subjects: Vec<String>,
    pub dispute_state: DisputeState,
    pub visibility: Visibility,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemporalPrecision {
    Exact,
    Day,
    Week,
    Month,
    Approximate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemporalRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Temporal {
    pub occurred_at_observed: DateTime<Utc>,
    pub occurred_at_claimed: Option<DateTime<Utc>>,
    pub precision: TemporalPrecision,
    pub confidence: f64,
    pub range: Option<TemporalRange>,
    #[serde(default)]
    pub ordering_uncertainty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentBody {
    pub format: ContentFormat,
    pub language: Option<String>,
    pub text: Option<String>,
    pub json: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AffectHistoryEntry {
    pub recorded_at: DateTime<Utc>,
    pub valence: f64,
    pub arousal: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Affect {
    pub valence: f64,
    pub arousal: f64,
    #[serde(default)]
    pub labels: Vec<String>,
    pub confidence: f64,
    #[serde(default)]
    pub history: Vec<AffectHistoryEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecayModel {
    None,
    Exponential,
    Stepwise,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Strength {
    pub initial: f64,
    pub current: f64,
    pub decay_model: DecayModel,
    pub half_life_days: Option<f64>,
    pub last_reinforced_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformStep {
    pub transform_id: String,
    pub applied_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvenanceSource {
    User,
    System,
    ImportedApp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provenance {
    pub source: ProvenanceSource,
    pub surface: Option<String>,
    #[serde(default)]
    pub transform_chain: Vec<TransformStep>,
    pub policy_version: String,
    pub confidence: f64,
    #[serde(default)]
    pub derived_from: Vec<MemoryId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconsolidationPolicy {
    NeverEditSource,
    AppendOnly,
    AllowRelabelAffectOnly,
    AllowUpdateClaimConfidence,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactPayload {
    pub constraints: Vec<Constraint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedActivation {
    pub min_confidence: f64,
    pub cooldown_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedPayload {
    pub cues: Vec<String>,
    pub activation: SeedActivation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProceduralPayload {
    pub steps: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SomaticPayload {
    pub sensations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TypedPayloads {
    pub impact_payload: Option<ImpactPayload>,
    pub seed_payload: Option<SeedPayload>,
    pub procedural_payload: Option<ProceduralPayload>,
    pub somatic_payload: Option<SomaticPayload>,
}

/// The v2 memory object. `type`, `truth_mode`, and the original `content` of
/// an `event` are never mutated after creation (Invariant 1); only `state`,
/// `strength.current`, `ownership.dispute_state`, and `affect.history` may
/// change, subject to `reconsolidation_policy`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryObject {
    pub id: MemoryId,
    pub tenant_id: TenantId,
    pub scope: ScopeV2,
    pub r#type: MemoryType,
    pub truth_mode: TruthMode,
    pub state: MemoryState,
    pub sensitivity: Sensitivity,
    pub ownership: Ownership,
    pub temporal: Temporal,
    pub content: ContentBody,
    pub affect: Affect,
    pub strength: Strength,
    pub provenance: Provenance,
    pub reconsolidation_policy: ReconsolidationPolicy,
    #[serde(default)]
    pub payloads: TypedPayloads,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MemoryObject {
    pub fn is_sealed(&self) -> bool {
        self.state == MemoryState::Sealed
    }
}
