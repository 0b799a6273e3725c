//! Canonical entities, JSON codecs, ID minting, and wire-shaped request/
//! response/error types for the memory substrate. No I/O, no policy logic —
//! just the data model every other crate builds on.

pub mod api;
pub mod app;
pub mod audit_event;
pub mod constraint;
pub mod errors;
pub mod grant;
pub mod id;
pub mod link;
pub mod memory_v1;
pub mod memory_v2;
pub mod shape;
pub mod tpa;

pub use api::*;
pub use app::App;
pub use audit_event::{AccessLogV2, AuditEvent, AuditEventType};
pub use constraint::{Constraint, ConstraintKind, ConstraintTarget, MergeSlot, MergeStrategy};
pub use errors::{ApiError, ApiErrorBody, ApiErrorCode};
pub use grant::ReadGrant;
pub use id::{ArtifactId, ConstraintId, LinkId, LogId, MemoryId, TenantId};
pub use link::{DerivedObjectLink, LinkRelationship};
pub use memory_v1::{MemorySource, MemoryV1, Scope};
pub use memory_v2::{MemoryObject, MemoryState, MemoryType, ScopeType, ScopeV2, TruthMode};
pub use shape::{detect_shape, ShapeError, ValueShape};
pub use tpa::{PatternType, ThoughtPatternArtifact};
