use crate::explain::Explanation;
use crate::state::Recommendation;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// A recommendation with its role-appropriate explanation attached.
#[derive(Debug, Serialize)]
pub struct ExplainedRecommendation {
    #[serde(flatten)]
    pub recommendation: Recommendation,
    pub explanation: Vec<Explanation>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explain::ExplanationLevel;
    use crate::state::{ExpectedImpact, RecommendationStatus};

    #[test]
    fn explained_recommendation_flattens_the_record() {
        let response = ExplainedRecommendation {
            recommendation: Recommendation {
                id: "r1".to_string(),
                junction_id: "j2".to_string(),
                junction_name: "Silk Board Junction".to_string(),
                action: "noop".to_string(),
                reasoning: "test".to_string(),
                expected_impact: ExpectedImpact {
                    travel_time_reduction: 1,
                    fuel_savings: 2,
                    emission_reduction: 3,
                },
                status: RecommendationStatus::Pending,
            },
            explanation: vec![Explanation {
                level: ExplanationLevel::Short,
                text: "short text".to_string(),
            }],
        };

        let value = serde_json::to_value(&response).expect("serialize");
        assert_eq!(value["id"], "r1");
        assert_eq!(value["junctionId"], "j2");
        assert_eq!(value["status"], "pending");
        assert_eq!(value["explanation"][0]["level"], "short");
    }

    #[test]
    fn error_response_carries_the_message() {
        let value =
            serde_json::to_value(ErrorResponse::new("Recommendation not found")).expect("serialize");
        assert_eq!(value["error"], "Recommendation not found");
    }
}
