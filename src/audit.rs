//! Append-only audit trail for recommendation decisions.

use crate::explain::Role;
use crate::state::{RecommendationDecision, format_timestamp};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: String,
    pub entity: String,
    pub entity_id: String,
    pub action: RecommendationDecision,
    pub role: Role,
    pub explanation: String,
    pub timestamp: String,
}

/// Build the audit record for a recommendation status change. The entry id
/// is freshly generated; the caller appends it via the store.
pub fn recommendation_audit(
    recommendation_id: &str,
    action: RecommendationDecision,
    role: Role,
    explanation: String,
) -> AuditEntry {
    AuditEntry {
        id: Uuid::new_v4().to_string(),
        entity: "recommendation".to_string(),
        entity_id: recommendation_id.to_string(),
        action,
        role,
        explanation,
        timestamp: format_timestamp(SystemTime::now()),
    }
}
