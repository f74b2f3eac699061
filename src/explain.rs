//! Role-tiered explanations for recommendations.
//!
//! Each recommendation can be explained at three levels of detail; the
//! caller's role selects which level is returned.

use crate::state::{Prediction, Recommendation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Ops,
    Planner,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExplanationLevel {
    Short,
    Detailed,
    Technical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub level: ExplanationLevel,
    pub text: String,
}

fn level_from_role(role: Option<Role>) -> ExplanationLevel {
    match role {
        Some(Role::Admin) => ExplanationLevel::Technical,
        Some(Role::Planner) => ExplanationLevel::Detailed,
        _ => ExplanationLevel::Short,
    }
}

/// Explain a recommendation at the level matching the caller's role. The
/// matching prediction, when available, enriches the detailed/technical text.
pub fn explain_recommendation(
    rec: &Recommendation,
    prediction: Option<&Prediction>,
    role: Option<Role>,
) -> Vec<Explanation> {
    let short = Explanation {
        level: ExplanationLevel::Short,
        text: format!(
            "Traffic congestion is expected to rise at {}, so a proactive signal adjustment \
             is recommended.",
            rec.junction_name
        ),
    };

    let congestion = prediction
        .map(|p| p.predicted_congestion.to_string())
        .unwrap_or_else(|| "increased".to_string());
    let horizon = prediction.map(|p| p.horizon_minutes).unwrap_or(30);
    let detailed = Explanation {
        level: ExplanationLevel::Detailed,
        text: format!(
            "Forecast models indicate {congestion} congestion within {horizon} minutes. The \
             projected queue length exceeds safe thresholds, so extending and coordinating \
             green phases can reduce spillback."
        ),
    };

    let projected_queue = prediction
        .map(|p| p.projected_queue_length.to_string())
        .unwrap_or_else(|| "N/A".to_string());
    let technical = Explanation {
        level: ExplanationLevel::Technical,
        text: format!(
            "The optimizer detected predicted congestion >= HEAVY with projected queue \
             {projected_queue}. Rule R-EXT-GREEN was triggered to minimize queue propagation \
             and reduce travel delay."
        ),
    };

    let level = level_from_role(role);
    [short, detailed, technical]
        .into_iter()
        .filter(|e| e.level == level)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{ExpectedImpact, RecommendationStatus};

    fn recommendation() -> Recommendation {
        Recommendation {
            id: "r1".to_string(),
            junction_id: "j2".to_string(),
            junction_name: "Silk Board Junction".to_string(),
            action: "Extend northbound green phase by 20 seconds".to_string(),
            reasoning: "test".to_string(),
            expected_impact: ExpectedImpact {
                travel_time_reduction: 18,
                fuel_savings: 12,
                emission_reduction: 15,
            },
            status: RecommendationStatus::Pending,
        }
    }

    #[test]
    fn role_selects_explanation_level() {
        let rec = recommendation();
        let ops = explain_recommendation(&rec, None, Some(Role::Ops));
        let planner = explain_recommendation(&rec, None, Some(Role::Planner));
        let admin = explain_recommendation(&rec, None, Some(Role::Admin));

        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].level, ExplanationLevel::Short);
        assert_eq!(planner[0].level, ExplanationLevel::Detailed);
        assert_eq!(admin[0].level, ExplanationLevel::Technical);
    }

    #[test]
    fn missing_role_falls_back_to_short() {
        let rec = recommendation();
        let explanations = explain_recommendation(&rec, None, None);
        assert_eq!(explanations[0].level, ExplanationLevel::Short);
        assert!(explanations[0].text.contains("Silk Board Junction"));
    }

    #[test]
    fn missing_prediction_uses_placeholder_figures() {
        let rec = recommendation();
        let technical = explain_recommendation(&rec, None, Some(Role::Admin));
        assert!(technical[0].text.contains("N/A"));
    }
}
