//! Emergency corridor planning over the static road graph.
//!
//! The graph is a hand-authored adjacency table between the known junction
//! ids; it is configuration, not derived from live junction data. Routing is
//! breadth-first search by hop count, so the first shortest path discovered
//! (in adjacency declaration order) wins.

use crate::state::{
    CongestionLevel, CorridorAction, EmergencyEvent, EmergencyPlan, EmergencyStatus,
    EmergencyType, Junction, format_timestamp,
};
use std::collections::{HashMap, VecDeque};
use std::time::SystemTime;
use uuid::Uuid;

/// Preemption hold times by current congestion at the junction.
const SEVERE_HOLD_SECS: u32 = 90;
const HEAVY_HOLD_SECS: u32 = 60;
const DEFAULT_HOLD_SECS: u32 = 45;

const HOLD_ACTION: &str = "Hold green for departure";
const PREEMPT_ACTION: &str = "Preempt to green on approach";

/// Corridor adjacency, symmetric by construction: every edge is listed from
/// both endpoints. Declaration order is the BFS tie-break.
const CORRIDOR_GRAPH: &[(&str, &[&str])] = &[
    ("j1", &["j2", "j6"]),
    ("j2", &["j1", "j4", "j5"]),
    ("j3", &["j4", "j10", "j12"]),
    ("j4", &["j2", "j3", "j5", "j12"]),
    ("j5", &["j2", "j4", "j8", "j9"]),
    ("j6", &["j1", "j7"]),
    ("j7", &["j6", "j11"]),
    ("j8", &["j5"]),
    ("j9", &["j5"]),
    ("j10", &["j3"]),
    ("j11", &["j7"]),
    ("j12", &["j3", "j4"]),
];

fn neighbors(junction_id: &str) -> &'static [&'static str] {
    CORRIDOR_GRAPH
        .iter()
        .find(|(id, _)| *id == junction_id)
        .map(|(_, adjacent)| *adjacent)
        .unwrap_or(&[])
}

fn reconstruct_path(came_from: &HashMap<&str, Option<&str>>, end: &str) -> Vec<String> {
    let mut path = Vec::new();
    let mut current = Some(end);
    while let Some(node) = current {
        path.push(node.to_string());
        current = came_from.get(node).copied().flatten();
    }
    path.reverse();
    path
}

/// Shortest hop path from `start` to `goal`, empty when unreachable. Unknown
/// ids simply have no neighbors, so they fall out as "no path".
fn shortest_path(start: &str, goal: &str) -> Vec<String> {
    if !CORRIDOR_GRAPH.iter().any(|(id, _)| *id == start) {
        return Vec::new();
    }

    let mut queue: VecDeque<&str> = VecDeque::from([start]);
    let mut came_from: HashMap<&str, Option<&str>> = HashMap::from([(start, None)]);

    while let Some(node) = queue.pop_front() {
        if node == goal {
            return reconstruct_path(&came_from, goal);
        }
        for &neighbor in neighbors(node) {
            if !came_from.contains_key(neighbor) {
                came_from.insert(neighbor, Some(node));
                queue.push_back(neighbor);
            }
        }
    }

    Vec::new()
}

fn hold_duration(junctions: &[Junction], junction_id: &str) -> u32 {
    match junctions
        .iter()
        .find(|j| j.id == junction_id)
        .map(|j| j.congestion_level)
    {
        Some(CongestionLevel::Severe) => SEVERE_HOLD_SECS,
        Some(CongestionLevel::Heavy) => HEAVY_HOLD_SECS,
        _ => DEFAULT_HOLD_SECS,
    }
}

/// Plan a signal-preemption corridor for an emergency traversal. `None`
/// means no path exists; unreachable pairs are expected input, not a fault.
pub fn plan_emergency_corridor(
    kind: EmergencyType,
    origin: &str,
    destination: &str,
    junctions: &[Junction],
) -> Option<EmergencyPlan> {
    let route = shortest_path(origin, destination);
    if route.is_empty() {
        return None;
    }

    let corridor: Vec<CorridorAction> = route
        .iter()
        .enumerate()
        .map(|(idx, junction_id)| CorridorAction {
            junction_id: junction_id.clone(),
            action: if idx == 0 { HOLD_ACTION } else { PREEMPT_ACTION }.to_string(),
            duration_sec: hold_duration(junctions, junction_id),
        })
        .collect();

    let event = EmergencyEvent {
        id: Uuid::new_v4().to_string(),
        kind,
        origin: origin.to_string(),
        destination: destination.to_string(),
        status: EmergencyStatus::Active,
        route,
        started_at: format_timestamp(SystemTime::now()),
        completed_at: None,
    };

    Some(EmergencyPlan { event, corridor })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::seed_state;

    #[test]
    fn graph_is_symmetric() {
        for (id, adjacent) in CORRIDOR_GRAPH {
            for neighbor in *adjacent {
                assert!(
                    neighbors(neighbor).contains(id),
                    "edge {id} -> {neighbor} has no reverse"
                );
            }
        }
    }

    #[test]
    fn origin_equals_destination_is_a_single_hop_route() {
        let junctions = seed_state().junctions;
        let plan = plan_emergency_corridor(EmergencyType::Ambulance, "j1", "j1", &junctions)
            .expect("degenerate route should plan");

        assert_eq!(plan.event.route, vec!["j1"]);
        assert_eq!(plan.corridor.len(), 1);
        assert_eq!(plan.corridor[0].action, HOLD_ACTION);
    }

    #[test]
    fn routes_by_shortest_hop_count() {
        let junctions = seed_state().junctions;
        let plan = plan_emergency_corridor(EmergencyType::Fire, "j1", "j9", &junctions)
            .expect("j9 reachable from j1");

        assert_eq!(plan.event.route, vec!["j1", "j2", "j5", "j9"]);
        let actions: Vec<&str> = plan.corridor.iter().map(|a| a.action.as_str()).collect();
        assert_eq!(
            actions,
            vec![HOLD_ACTION, PREEMPT_ACTION, PREEMPT_ACTION, PREEMPT_ACTION]
        );
    }

    #[test]
    fn hold_durations_follow_current_congestion() {
        let junctions = seed_state().junctions;
        let plan = plan_emergency_corridor(EmergencyType::Police, "j1", "j5", &junctions)
            .expect("j5 reachable from j1");

        // Seed queues: j1 180 -> moderate 45s, j2 420 -> severe 90s, j5 380 -> heavy 60s.
        let durations: Vec<u32> = plan.corridor.iter().map(|a| a.duration_sec).collect();
        assert_eq!(durations, vec![45, 90, 60]);
    }

    #[test]
    fn unknown_junction_defaults_to_lowest_hold_tier() {
        // Route over the graph with no live junction data at all.
        let plan = plan_emergency_corridor(EmergencyType::Ambulance, "j1", "j2", &[])
            .expect("j2 adjacent to j1");
        assert!(plan.corridor.iter().all(|a| a.duration_sec == DEFAULT_HOLD_SECS));
    }

    #[test]
    fn unreachable_or_unknown_pairs_yield_none() {
        let junctions = seed_state().junctions;
        assert!(plan_emergency_corridor(EmergencyType::Fire, "j1", "jX", &junctions).is_none());
        assert!(plan_emergency_corridor(EmergencyType::Fire, "jX", "j1", &junctions).is_none());
    }

    #[test]
    fn event_starts_active_with_endpoints_recorded() {
        let junctions = seed_state().junctions;
        let plan = plan_emergency_corridor(EmergencyType::Ambulance, "j3", "j12", &junctions)
            .expect("j12 adjacent to j3");

        assert_eq!(plan.event.status, EmergencyStatus::Active);
        assert_eq!(plan.event.origin, "j3");
        assert_eq!(plan.event.destination, "j12");
        assert!(plan.event.completed_at.is_none());
    }
}
