//! State engine: owns the live [`TrafficState`] and drives the periodic
//! update cycle.
//!
//! Every mutation (cycle run, status update, emergency trigger) happens
//! under the write lock, so mutations appear atomic to readers. Persistence
//! runs on a cloned snapshot after the lock is dropped; the in-memory state
//! is the source of truth and a failed save never rolls it back.

use crate::corridor::plan_emergency_corridor;
use crate::error::AppError;
use crate::forecast::forecast;
use crate::persistence::Store;
use crate::recommend::recommend;
use crate::state::{
    Alert, AlertSeverity, AlertType, CongestionLevel, EmergencyPlan, EmergencyType, Junction,
    Metrics, Recommendation, RecommendationDecision, RecommendationStatus, TrafficState,
    format_timestamp,
};
use rand::Rng;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant, SystemTime};
use tracing::warn;
use uuid::Uuid;

/// Tuning knobs for the probabilistic parts of the cycle. Both probabilities
/// are in [0, 1].
#[derive(Debug, Clone)]
pub struct SimulationParams {
    pub forecast_horizon_minutes: u32,
    pub alert_probability: f64,
    pub auto_accept_probability: f64,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            forecast_horizon_minutes: 30,
            alert_probability: 0.4,
            auto_accept_probability: 0.05,
        }
    }
}

pub struct Engine {
    state: RwLock<TrafficState>,
    store: Store,
    params: SimulationParams,
}

/// Bounded random walk: move `value` by up to `delta` in either direction,
/// clamped to [min, max].
fn jitter<R: Rng>(rng: &mut R, value: f64, delta: f64, min: f64, max: f64) -> f64 {
    (value + rng.gen_range(-1.0..=1.0) * delta).clamp(min, max)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn update_junctions<R: Rng>(junctions: &mut [Junction], rng: &mut R) {
    for j in junctions {
        j.vehicle_count = jitter(rng, j.vehicle_count as f64, 40.0, 60.0, 900.0).round() as u32;
        j.queue_length = jitter(rng, j.queue_length as f64, 30.0, 10.0, 500.0).round() as u32;
        j.avg_wait_time = jitter(rng, j.avg_wait_time as f64, 20.0, 15.0, 320.0).round() as u32;
        j.congestion_level = CongestionLevel::from_queue(j.queue_length);
    }
}

fn updated_metrics<R: Rng>(junctions: &[Junction], current: &Metrics, rng: &mut R) -> Metrics {
    if junctions.is_empty() {
        return current.clone();
    }
    let junction_count = junctions.len() as f64;

    let total_wait: u32 = junctions.iter().map(|j| j.avg_wait_time).sum();
    let avg_travel_time = (total_wait as f64 / junction_count / 60.0).clamp(15.0, 90.0);

    let total_vehicles: u32 = junctions.iter().map(|j| j.vehicle_count).sum();
    let active_vehicles = (total_vehicles as f64 * 2.8).clamp(12_000.0, 90_000.0);

    // The floor must not exceed the cap; small networks walk within
    // [count, count] rather than panicking in clamp.
    let floor = junction_count.min(10.0);
    let optimized_junctions = jitter(
        rng,
        current.optimized_junctions as f64,
        2.0,
        floor,
        junction_count,
    );

    Metrics {
        avg_travel_time: avg_travel_time.round() as u32,
        fuel_consumption: round1(jitter(rng, current.fuel_consumption, 1.5, 10.0, 22.0)),
        co2_emissions: round1(jitter(rng, current.co2_emissions, 3.0, 20.0, 55.0)),
        emergency_response_time: round1(jitter(
            rng,
            current.emergency_response_time,
            0.6,
            5.0,
            15.0,
        )),
        active_vehicles: active_vehicles.round() as u32,
        optimized_junctions: optimized_junctions.round() as u32,
    }
}

impl Engine {
    pub fn new(initial: TrafficState, store: Store, params: SimulationParams) -> Self {
        Self {
            state: RwLock::new(initial),
            store,
            params,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Consistent read-only copy of the current state.
    pub fn snapshot(&self) -> Result<TrafficState, AppError> {
        let guard = self.state.read().map_err(|_| AppError::StateLock)?;
        Ok(guard.clone())
    }

    /// One full simulation cycle: jitter junction metrics, recompute the
    /// aggregates, refresh forecasts and recommendations, probabilistically
    /// inject an alert and auto-accept pending recommendations, persist.
    pub fn run_cycle<R: Rng>(&self, rng: &mut R) -> Result<(), AppError> {
        let snapshot = {
            let mut guard = self.state.write().map_err(|_| AppError::StateLock)?;
            update_junctions(&mut guard.junctions, rng);
            guard.metrics = updated_metrics(&guard.junctions, &guard.metrics, rng);

            let predictions =
                forecast(&guard.junctions, self.params.forecast_horizon_minutes, rng);
            guard.recommendations = recommend(&predictions, guard.recommendations.as_slice());
            guard.predictions = predictions;

            self.maybe_add_alert(&mut guard, rng);
            self.maybe_auto_accept(&mut guard, rng);
            guard.clone()
        };
        self.store.save_state(&snapshot);
        Ok(())
    }

    /// Apply an operator decision to a recommendation. Returns the updated
    /// record, or `None` (with no mutation) when the id is unknown.
    pub fn update_recommendation_status(
        &self,
        id: &str,
        decision: RecommendationDecision,
    ) -> Result<Option<Recommendation>, AppError> {
        let outcome = {
            let mut guard = self.state.write().map_err(|_| AppError::StateLock)?;
            let updated = guard
                .recommendations
                .iter_mut()
                .find(|rec| rec.id == id)
                .map(|rec| {
                    rec.status = decision.into();
                    rec.clone()
                });
            updated.map(|rec| (rec, guard.clone()))
        };

        match outcome {
            Some((rec, snapshot)) => {
                self.store.save_state(&snapshot);
                Ok(Some(rec))
            }
            None => Ok(None),
        }
    }

    /// Plan and activate an emergency corridor. On success the plan is
    /// retained, a critical alert is raised and the optimized-junction
    /// metric is bumped; on "no path" nothing is mutated.
    pub fn trigger_emergency(
        &self,
        kind: EmergencyType,
        origin: &str,
        destination: &str,
    ) -> Result<Option<EmergencyPlan>, AppError> {
        let outcome = {
            let mut guard = self.state.write().map_err(|_| AppError::StateLock)?;
            match plan_emergency_corridor(kind, origin, destination, &guard.junctions) {
                None => None,
                Some(plan) => {
                    guard.emergencies.push_front(plan.clone());
                    guard.alerts.push_front(Alert {
                        id: Uuid::new_v4().to_string(),
                        kind: AlertType::Emergency,
                        title: "Emergency Green Corridor Activated".to_string(),
                        description: format!("{kind} route from {origin} to {destination}"),
                        severity: AlertSeverity::Critical,
                        junction_id: Some(origin.to_string()),
                        timestamp: format_timestamp(SystemTime::now()),
                    });
                    let cap = guard.junctions.len() as u32;
                    guard.metrics.optimized_junctions =
                        (guard.metrics.optimized_junctions + 2).min(cap);
                    Some((plan, guard.clone()))
                }
            }
        };

        match outcome {
            Some((plan, snapshot)) => {
                self.store.save_state(&snapshot);
                Ok(Some(plan))
            }
            None => Ok(None),
        }
    }

    fn maybe_add_alert<R: Rng>(&self, state: &mut TrafficState, rng: &mut R) {
        if state.junctions.is_empty() || rng.r#gen::<f64>() >= self.params.alert_probability {
            return;
        }

        let pick = &state.junctions[rng.gen_range(0..state.junctions.len())];
        let (junction_id, junction_name) = (pick.id.clone(), pick.name.clone());
        let kind = match rng.gen_range(0..3) {
            0 => AlertType::Prediction,
            1 => AlertType::Incident,
            _ => AlertType::Congestion,
        };

        let (title, description) = match kind {
            AlertType::Prediction => (
                "Upcoming congestion detected",
                format!("Model expects {junction_name} to cross heavy threshold in 20 mins"),
            ),
            AlertType::Incident => (
                "Minor incident reported",
                format!("Temporary capacity drop at {junction_name}. Field team notified."),
            ),
            _ => (
                "Severe congestion alert",
                format!("{junction_name} approaching gridlock, coordinating corridor clearance."),
            ),
        };
        let severity = if kind == AlertType::Congestion {
            AlertSeverity::Critical
        } else {
            AlertSeverity::Warning
        };

        state.alerts.push_front(Alert {
            id: Uuid::new_v4().to_string(),
            kind,
            title: title.to_string(),
            description,
            severity,
            junction_id: Some(junction_id),
            timestamp: format_timestamp(SystemTime::now()),
        });
    }

    /// Simulates occasional field acceptance of pending recommendations at
    /// junctions that are currently severe.
    fn maybe_auto_accept<R: Rng>(&self, state: &mut TrafficState, rng: &mut R) {
        let severe: HashSet<String> = state
            .junctions
            .iter()
            .filter(|j| j.congestion_level == CongestionLevel::Severe)
            .map(|j| j.id.clone())
            .collect();

        for rec in state.recommendations.iter_mut() {
            if rec.status == RecommendationStatus::Pending
                && severe.contains(&rec.junction_id)
                && rng.r#gen::<f64>() < self.params.auto_accept_probability
            {
                rec.status = RecommendationStatus::Accepted;
            }
        }
    }
}

/// Drive `run_cycle` at a fixed interval until the stop flag is raised.
pub fn spawn_cycle_thread<R>(
    engine: Arc<Engine>,
    mut rng: R,
    interval: Duration,
    stop: Arc<AtomicBool>,
) -> std::thread::JoinHandle<()>
where
    R: Rng + Send + 'static,
{
    std::thread::spawn(move || {
        while !stop.load(Ordering::Relaxed) {
            let cycle_start = Instant::now();
            if let Err(e) = engine.run_cycle(&mut rng) {
                warn!("Error running simulation cycle: {}", e);
            }
            sleep_with_stop(interval, &stop, cycle_start);
        }
    })
}

fn sleep_with_stop(duration: Duration, stop: &AtomicBool, start: Instant) {
    let elapsed = start.elapsed();
    if elapsed >= duration {
        return;
    }
    let remaining = duration - elapsed;
    let step = Duration::from_millis(100);
    let mut slept = Duration::ZERO;

    while slept < remaining {
        if stop.load(Ordering::Relaxed) {
            break;
        }
        std::thread::sleep(step);
        slept += step;
    }
}
