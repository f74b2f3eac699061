//! Traffic network data model: junctions, alerts, recommendations,
//! forecasts, emergency corridors and the aggregate [`TrafficState`].

use serde::de::{Deserializer, SeqAccess, Visitor};
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::SystemTime;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub const MAX_ALERTS: usize = 10;
pub const MAX_RECOMMENDATIONS: usize = 10;
pub const MAX_EMERGENCIES: usize = 5;

/// Queue length (in metres) above which each congestion tier applies.
const SEVERE_QUEUE: u32 = 380;
const HEAVY_QUEUE: u32 = 200;
const MODERATE_QUEUE: u32 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CongestionLevel {
    Low,
    Moderate,
    Heavy,
    Severe,
}

impl CongestionLevel {
    /// The four-tier congestion function of queue length. Every code path
    /// that touches a queue length must re-derive the level through here.
    pub fn from_queue(queue_length: u32) -> Self {
        if queue_length > SEVERE_QUEUE {
            CongestionLevel::Severe
        } else if queue_length > HEAVY_QUEUE {
            CongestionLevel::Heavy
        } else if queue_length > MODERATE_QUEUE {
            CongestionLevel::Moderate
        } else {
            CongestionLevel::Low
        }
    }
}

impl fmt::Display for CongestionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CongestionLevel::Low => write!(f, "low"),
            CongestionLevel::Moderate => write!(f, "moderate"),
            CongestionLevel::Heavy => write!(f, "heavy"),
            CongestionLevel::Severe => write!(f, "severe"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Junction {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub congestion_level: CongestionLevel,
    pub vehicle_count: u32,
    pub queue_length: u32,
    /// Average wait at the stop line, in seconds.
    pub avg_wait_time: u32,
    pub corridor_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertType {
    Emergency,
    Congestion,
    Incident,
    Prediction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: AlertType,
    pub title: String,
    pub description: String,
    pub severity: AlertSeverity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub junction_id: Option<String>,
    pub timestamp: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpectedImpact {
    pub travel_time_reduction: u32,
    pub fuel_savings: u32,
    pub emission_reduction: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationStatus {
    Pending,
    Accepted,
    Rejected,
}

/// The closed set of decisions an operator can apply to a pending
/// recommendation. Keeping this separate from [`RecommendationStatus`]
/// makes "set back to pending" unrepresentable at the API boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationDecision {
    Accepted,
    Rejected,
}

impl From<RecommendationDecision> for RecommendationStatus {
    fn from(decision: RecommendationDecision) -> Self {
        match decision {
            RecommendationDecision::Accepted => RecommendationStatus::Accepted,
            RecommendationDecision::Rejected => RecommendationStatus::Rejected,
        }
    }
}

impl fmt::Display for RecommendationDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecommendationDecision::Accepted => write!(f, "accepted"),
            RecommendationDecision::Rejected => write!(f, "rejected"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub id: String,
    pub junction_id: String,
    pub junction_name: String,
    pub action: String,
    pub reasoning: String,
    pub expected_impact: ExpectedImpact,
    pub status: RecommendationStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub junction_id: String,
    pub junction_name: String,
    pub horizon_minutes: u32,
    pub predicted_congestion: CongestionLevel,
    pub projected_vehicle_count: u32,
    pub projected_queue_length: u32,
    /// Confidence score in [0, 1], rounded to two decimals.
    pub confidence: f64,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmergencyType {
    Ambulance,
    Fire,
    Police,
}

impl fmt::Display for EmergencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmergencyType::Ambulance => write!(f, "ambulance"),
            EmergencyType::Fire => write!(f, "fire"),
            EmergencyType::Police => write!(f, "police"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmergencyStatus {
    Active,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: EmergencyType,
    pub origin: String,
    pub destination: String,
    pub status: EmergencyStatus,
    /// Junction ids in traversal order.
    pub route: Vec<String>,
    pub started_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorridorAction {
    pub junction_id: String,
    pub action: String,
    pub duration_sec: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyPlan {
    pub event: EmergencyEvent,
    pub corridor: Vec<CorridorAction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub avg_travel_time: u32,
    pub fuel_consumption: f64,
    pub co2_emissions: f64,
    pub emergency_response_time: f64,
    pub active_vehicles: u32,
    pub optimized_junctions: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CongestionData {
    pub hour: u32,
    pub value: u32,
}

/// Fixed-capacity, newest-first list. `push_front` inserts at the head and
/// evicts from the tail, so the list can never exceed `CAP` entries.
/// Serializes as a plain JSON array; deserialization truncates to `CAP`.
#[derive(Debug, Clone, PartialEq)]
pub struct CappedList<T, const CAP: usize> {
    items: Vec<T>,
}

impl<T, const CAP: usize> CappedList<T, CAP> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn from_vec(mut items: Vec<T>) -> Self {
        items.truncate(CAP);
        Self { items }
    }

    pub fn push_front(&mut self, item: T) {
        self.items.insert(0, item);
        self.items.truncate(CAP);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }
}

impl<T, const CAP: usize> Default for CappedList<T, CAP> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Serialize, const CAP: usize> Serialize for CappedList<T, CAP> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.items.len()))?;
        for item in &self.items {
            seq.serialize_element(item)?;
        }
        seq.end()
    }
}

impl<'de, T: Deserialize<'de>, const CAP: usize> Deserialize<'de> for CappedList<T, CAP> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ListVisitor<T, const CAP: usize>(std::marker::PhantomData<T>);

        impl<'de, T: Deserialize<'de>, const CAP: usize> Visitor<'de> for ListVisitor<T, CAP> {
            type Value = CappedList<T, CAP>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                write!(formatter, "a sequence of at most {CAP} elements")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut items = Vec::new();
                while let Some(item) = seq.next_element()? {
                    if items.len() < CAP {
                        items.push(item);
                    }
                }
                Ok(CappedList { items })
            }
        }

        deserializer.deserialize_seq(ListVisitor(std::marker::PhantomData))
    }
}

/// The aggregate root. Exactly one live instance per process, owned by the
/// engine behind a lock; everything here is plain data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficState {
    pub junctions: Vec<Junction>,
    pub alerts: CappedList<Alert, MAX_ALERTS>,
    pub recommendations: CappedList<Recommendation, MAX_RECOMMENDATIONS>,
    pub metrics: Metrics,
    pub hourly_data: Vec<CongestionData>,
    #[serde(default)]
    pub predictions: Vec<Prediction>,
    #[serde(default)]
    pub emergencies: CappedList<EmergencyPlan, MAX_EMERGENCIES>,
}

/// Format a timestamp as RFC 3339, falling back to the epoch string if the
/// formatter refuses (it cannot for in-range `SystemTime`s).
pub fn format_timestamp(timestamp: SystemTime) -> String {
    OffsetDateTime::from(timestamp)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

fn junction(
    id: &str,
    name: &str,
    lat: f64,
    lng: f64,
    vehicle_count: u32,
    queue_length: u32,
    avg_wait_time: u32,
    corridor_id: &str,
) -> Junction {
    Junction {
        id: id.to_string(),
        name: name.to_string(),
        lat,
        lng,
        congestion_level: CongestionLevel::from_queue(queue_length),
        vehicle_count,
        queue_length,
        avg_wait_time,
        corridor_id: corridor_id.to_string(),
    }
}

fn seed_junctions() -> Vec<Junction> {
    vec![
        junction("j1", "MG Road - Brigade Road", 12.9748, 77.6067, 342, 180, 124, "c1"),
        junction("j2", "Silk Board Junction", 12.9177, 77.6238, 567, 420, 245, "c2"),
        junction("j3", "Hebbal Flyover", 13.0358, 77.5970, 234, 95, 67, "c3"),
        junction("j4", "KR Puram Junction", 13.0082, 77.6969, 423, 210, 156, "c2"),
        junction("j5", "Marathahalli Bridge", 12.9591, 77.7011, 498, 380, 198, "c2"),
        junction("j6", "Indiranagar 100ft Road", 12.9784, 77.6408, 189, 78, 54, "c1"),
        junction("j7", "Koramangala Sony Signal", 12.9352, 77.6245, 145, 42, 28, "c4"),
        junction("j8", "Electronic City Toll", 12.8458, 77.6603, 387, 195, 134, "c5"),
        junction("j9", "Whitefield Main Road", 12.9698, 77.75, 267, 110, 76, "c6"),
        junction("j10", "Yeshwanthpur Circle", 13.0287, 77.5416, 123, 35, 22, "c3"),
        junction("j11", "Jayanagar 4th Block", 12.9308, 77.5838, 198, 88, 58, "c4"),
        junction("j12", "Majestic Bus Stand", 12.9766, 77.5713, 612, 450, 267, "c7"),
    ]
}

/// Synthetic 24-hour congestion curve: twin rush-hour peaks, floor 5, cap 95.
fn seed_hourly_data() -> Vec<CongestionData> {
    (0..24u32)
        .map(|hour| {
            let phase = ((hour + 6) as f64 / 24.0) * std::f64::consts::PI * 2.0;
            let skew = if hour > 12 { 0.9 } else { 1.1 };
            let raw = (10.0 + 90.0 * (phase.sin() * skew).abs()).round();
            CongestionData {
                hour,
                value: raw.clamp(5.0, 95.0) as u32,
            }
        })
        .collect()
}

fn seed_recommendations() -> CappedList<Recommendation, MAX_RECOMMENDATIONS> {
    CappedList::from_vec(vec![
        Recommendation {
            id: "r1".to_string(),
            junction_id: "j2".to_string(),
            junction_name: "Silk Board Junction".to_string(),
            action: "Extend northbound green phase by 20 seconds".to_string(),
            reasoning: "Prediction models indicate 45% increase in northbound traffic due to \
                        IT park shift end. This adjustment will reduce queue buildup and \
                        prevent spillback to Marathahalli."
                .to_string(),
            expected_impact: ExpectedImpact {
                travel_time_reduction: 18,
                fuel_savings: 12,
                emission_reduction: 15,
            },
            status: RecommendationStatus::Pending,
        },
        Recommendation {
            id: "r2".to_string(),
            junction_id: "j5".to_string(),
            junction_name: "Marathahalli Bridge".to_string(),
            action: "Activate bypass corridor via 100ft Road".to_string(),
            reasoning: "Current incident has reduced capacity by 40%. Redirecting traffic \
                        through alternate corridor will maintain flow while incident is \
                        cleared."
                .to_string(),
            expected_impact: ExpectedImpact {
                travel_time_reduction: 25,
                fuel_savings: 18,
                emission_reduction: 22,
            },
            status: RecommendationStatus::Pending,
        },
        Recommendation {
            id: "r3".to_string(),
            junction_id: "j12".to_string(),
            junction_name: "Majestic Bus Stand".to_string(),
            action: "Coordinate signals across 3 adjacent junctions".to_string(),
            reasoning: "Creating green wave pattern will clear accumulated traffic within 15 \
                        minutes. Requires synchronized timing with Gandhi Nagar and Minerva \
                        Circle."
                .to_string(),
            expected_impact: ExpectedImpact {
                travel_time_reduction: 32,
                fuel_savings: 24,
                emission_reduction: 28,
            },
            status: RecommendationStatus::Pending,
        },
    ])
}

fn seed_alerts(now: &str) -> CappedList<Alert, MAX_ALERTS> {
    CappedList::from_vec(vec![
        Alert {
            id: "a1".to_string(),
            kind: AlertType::Emergency,
            title: "Emergency Vehicle - Ambulance".to_string(),
            description: "Green corridor active: Victoria Hospital → Silk Board".to_string(),
            severity: AlertSeverity::Critical,
            junction_id: Some("j2".to_string()),
            timestamp: now.to_string(),
        },
        Alert {
            id: "a2".to_string(),
            kind: AlertType::Prediction,
            title: "Congestion Predicted".to_string(),
            description: "Heavy traffic expected at Hebbal Flyover in 20 mins due to office \
                          hours"
                .to_string(),
            severity: AlertSeverity::Warning,
            junction_id: Some("j3".to_string()),
            timestamp: now.to_string(),
        },
        Alert {
            id: "a3".to_string(),
            kind: AlertType::Incident,
            title: "Road Incident Reported".to_string(),
            description: "Minor accident near Marathahalli Bridge - 2 lanes blocked".to_string(),
            severity: AlertSeverity::Warning,
            junction_id: Some("j5".to_string()),
            timestamp: now.to_string(),
        },
    ])
}

/// Built-in fallback snapshot used when no persisted state exists.
pub fn seed_state() -> TrafficState {
    let now = format_timestamp(SystemTime::now());
    TrafficState {
        junctions: seed_junctions(),
        alerts: seed_alerts(&now),
        recommendations: seed_recommendations(),
        metrics: Metrics {
            avg_travel_time: 42,
            fuel_consumption: 15.2,
            co2_emissions: 38.5,
            emergency_response_time: 8.3,
            active_vehicles: 45672,
            optimized_junctions: 47,
        },
        hourly_data: seed_hourly_data(),
        predictions: Vec::new(),
        emergencies: CappedList::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn congestion_tiers_follow_queue_thresholds() {
        assert_eq!(CongestionLevel::from_queue(0), CongestionLevel::Low);
        assert_eq!(CongestionLevel::from_queue(90), CongestionLevel::Low);
        assert_eq!(CongestionLevel::from_queue(91), CongestionLevel::Moderate);
        assert_eq!(CongestionLevel::from_queue(200), CongestionLevel::Moderate);
        assert_eq!(CongestionLevel::from_queue(201), CongestionLevel::Heavy);
        assert_eq!(CongestionLevel::from_queue(380), CongestionLevel::Heavy);
        assert_eq!(CongestionLevel::from_queue(381), CongestionLevel::Severe);
    }

    #[test]
    fn capped_list_evicts_oldest_on_overflow() {
        let mut list: CappedList<u32, 3> = CappedList::new();
        for value in 0..5 {
            list.push_front(value);
        }
        assert_eq!(list.len(), 3);
        assert_eq!(list.as_slice(), &[4, 3, 2]);
    }

    #[test]
    fn capped_list_from_vec_truncates() {
        let list: CappedList<u32, 2> = CappedList::from_vec(vec![1, 2, 3, 4]);
        assert_eq!(list.as_slice(), &[1, 2]);
    }

    #[test]
    fn capped_list_deserialization_respects_cap() {
        let list: CappedList<u32, 2> = serde_json::from_str("[1, 2, 3]").expect("deserialize");
        assert_eq!(list.as_slice(), &[1, 2]);
    }

    #[test]
    fn seed_state_satisfies_congestion_invariant() {
        let state = seed_state();
        for j in &state.junctions {
            assert_eq!(j.congestion_level, CongestionLevel::from_queue(j.queue_length));
        }
        assert_eq!(state.junctions.len(), 12);
        assert_eq!(state.hourly_data.len(), 24);
    }

    #[test]
    fn seed_hourly_values_stay_in_bounds() {
        for point in seed_hourly_data() {
            assert!((5..=95).contains(&point.value), "hour {}", point.hour);
        }
    }

    #[test]
    fn alert_serializes_with_original_field_names() {
        let alert = Alert {
            id: "a1".to_string(),
            kind: AlertType::Congestion,
            title: "t".to_string(),
            description: "d".to_string(),
            severity: AlertSeverity::Critical,
            junction_id: Some("j1".to_string()),
            timestamp: "2026-01-11T12:30:00Z".to_string(),
        };
        let value = serde_json::to_value(&alert).expect("serialize alert");
        assert_eq!(value["type"], "congestion");
        assert_eq!(value["junctionId"], "j1");
    }

    #[test]
    fn state_round_trips_through_json() {
        let state = seed_state();
        let raw = serde_json::to_string(&state).expect("serialize state");
        let loaded: TrafficState = serde_json::from_str(&raw).expect("deserialize state");
        assert_eq!(loaded, state);
    }
}
