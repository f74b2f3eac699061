//! Recommendation generation from congestion forecasts.
//!
//! Pure merge step: severe/heavy forecasts are ranked by projected queue,
//! the top candidates without a pending recommendation get a new one, and
//! the result is prepended to the existing set under the retention cap.

use crate::state::{
    CappedList, CongestionLevel, ExpectedImpact, MAX_RECOMMENDATIONS, Prediction, Recommendation,
    RecommendationStatus,
};
use uuid::Uuid;

/// How many of the hottest forecasts are considered per cycle.
const MAX_CANDIDATES: usize = 5;

fn has_pending_for_junction(existing: &[Recommendation], junction_id: &str) -> bool {
    existing
        .iter()
        .any(|r| r.junction_id == junction_id && r.status == RecommendationStatus::Pending)
}

fn synthesize(prediction: &Prediction) -> Recommendation {
    let severe = prediction.predicted_congestion == CongestionLevel::Severe;
    let action = if severe {
        "Coordinate corridor and extend critical approach by 25s"
    } else {
        "Extend dominant approach by 15s and balance offsets"
    };
    let reasoning = format!(
        "Forecast shows {} congestion in {} minutes at {} with projected queue {}m. \
         Applying pre-emptive timing changes to prevent spillback.",
        prediction.predicted_congestion,
        prediction.horizon_minutes,
        prediction.junction_name,
        prediction.projected_queue_length,
    );
    let expected_impact = if severe {
        ExpectedImpact {
            travel_time_reduction: 22,
            fuel_savings: 16,
            emission_reduction: 18,
        }
    } else {
        ExpectedImpact {
            travel_time_reduction: 15,
            fuel_savings: 10,
            emission_reduction: 12,
        }
    };

    Recommendation {
        id: Uuid::new_v4().to_string(),
        junction_id: prediction.junction_id.clone(),
        junction_name: prediction.junction_name.clone(),
        action: action.to_string(),
        reasoning,
        expected_impact,
        status: RecommendationStatus::Pending,
    }
}

/// Merge new recommendations in front of the existing set. At most one
/// pending recommendation per junction; output never exceeds the cap, with
/// the oldest existing entries falling off the back.
pub fn recommend(
    predictions: &[Prediction],
    existing: &[Recommendation],
) -> CappedList<Recommendation, MAX_RECOMMENDATIONS> {
    let mut hot: Vec<&Prediction> = predictions
        .iter()
        .filter(|p| p.predicted_congestion >= CongestionLevel::Heavy)
        .collect();
    // Stable sort keeps forecast order for equal queues.
    hot.sort_by(|a, b| b.projected_queue_length.cmp(&a.projected_queue_length));
    hot.truncate(MAX_CANDIDATES);

    let mut merged: Vec<Recommendation> = hot
        .into_iter()
        .filter(|p| !has_pending_for_junction(existing, &p.junction_id))
        .map(synthesize)
        .collect();
    merged.extend_from_slice(existing);

    CappedList::from_vec(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prediction(junction_id: &str, level: CongestionLevel, queue: u32) -> Prediction {
        Prediction {
            junction_id: junction_id.to_string(),
            junction_name: format!("Junction {junction_id}"),
            horizon_minutes: 30,
            predicted_congestion: level,
            projected_vehicle_count: 400,
            projected_queue_length: queue,
            confidence: 0.78,
            reason: "test".to_string(),
        }
    }

    fn pending(junction_id: &str) -> Recommendation {
        Recommendation {
            id: format!("rec-{junction_id}"),
            junction_id: junction_id.to_string(),
            junction_name: format!("Junction {junction_id}"),
            action: "noop".to_string(),
            reasoning: "test".to_string(),
            expected_impact: ExpectedImpact {
                travel_time_reduction: 1,
                fuel_savings: 1,
                emission_reduction: 1,
            },
            status: RecommendationStatus::Pending,
        }
    }

    #[test]
    fn skips_junctions_with_a_pending_recommendation() {
        let predictions = vec![prediction("j1", CongestionLevel::Severe, 450)];
        let existing = vec![pending("j1")];

        let merged = recommend(&predictions, &existing);

        let pending_for_j1 = merged
            .iter()
            .filter(|r| r.junction_id == "j1" && r.status == RecommendationStatus::Pending)
            .count();
        assert_eq!(pending_for_j1, 1);
    }

    #[test]
    fn ignores_low_and_moderate_forecasts() {
        let predictions = vec![
            prediction("j1", CongestionLevel::Low, 40),
            prediction("j2", CongestionLevel::Moderate, 150),
        ];
        let merged = recommend(&predictions, &[]);
        assert!(merged.is_empty());
    }

    #[test]
    fn ranks_by_projected_queue_and_takes_top_five() {
        let predictions: Vec<Prediction> = (1..=8)
            .map(|i| prediction(&format!("j{i}"), CongestionLevel::Severe, 400 + i * 10))
            .collect();

        let merged = recommend(&predictions, &[]);

        assert_eq!(merged.len(), 5);
        // Hottest junction first.
        assert_eq!(merged.as_slice()[0].junction_id, "j8");
        assert_eq!(merged.as_slice()[4].junction_id, "j4");
    }

    #[test]
    fn severity_selects_action_and_impact() {
        let predictions = vec![
            prediction("j1", CongestionLevel::Severe, 450),
            prediction("j2", CongestionLevel::Heavy, 250),
        ];
        let merged = recommend(&predictions, &[]);

        let severe = &merged.as_slice()[0];
        let heavy = &merged.as_slice()[1];
        assert!(severe.action.contains("Coordinate corridor"));
        assert_eq!(severe.expected_impact.travel_time_reduction, 22);
        assert!(heavy.action.contains("Extend dominant approach"));
        assert_eq!(heavy.expected_impact.travel_time_reduction, 15);
        assert!(severe.reasoning.contains("severe congestion in 30 minutes"));
    }

    #[test]
    fn output_never_exceeds_cap() {
        let predictions: Vec<Prediction> = (1..=6)
            .map(|i| prediction(&format!("p{i}"), CongestionLevel::Severe, 500))
            .collect();
        let existing: Vec<Recommendation> = (1..=9)
            .map(|i| {
                let mut rec = pending(&format!("e{i}"));
                rec.status = RecommendationStatus::Accepted;
                rec
            })
            .collect();

        let merged = recommend(&predictions, &existing);

        assert_eq!(merged.len(), MAX_RECOMMENDATIONS);
        // New entries come first; the oldest existing ones fell off.
        assert_eq!(merged.as_slice()[0].status, RecommendationStatus::Pending);
    }
}
