//! Simulated GPS jitter for live vehicle tracking. There's no real sensor feed; each
//! active vehicle takes a bounded random walk sideways from its synthetic position.

use std::collections::BTreeMap;

use rand::Rng;

use crate::entities::Vehicle;

/// Hard bound for the lateral offset, km either side of the alignment.
pub const MAX_OFFSET_KM: f64 = 2.0;

/// Step size per tick. Illustrative; the clamp above is the contract.
const MAX_STEP_KM: f64 = 0.3;

/// Supplies the per-tick walk steps. Injectable so tests are deterministic.
pub trait DriftSource {
    fn step_km(&mut self) -> f64;
}

pub struct RandomWalk<R: Rng> {
    rng: R,
}

impl<R: Rng> RandomWalk<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> DriftSource for RandomWalk<R> {
    fn step_km(&mut self) -> f64 {
        self.rng.gen_range(-MAX_STEP_KM..=MAX_STEP_KM)
    }
}

/// Per-vehicle offsets. Owned by the map subsystem; the project object is never touched.
#[derive(Default)]
pub struct DriftState {
    offsets: BTreeMap<String, f64>,
}

impl DriftState {
    pub fn offset_km(&self, vehicle_id: &str) -> f64 {
        self.offsets.get(vehicle_id).copied().unwrap_or(0.0)
    }

    /// One walk step for every active vehicle.
    pub fn tick(&mut self, vehicles: &[Vehicle], source: &mut dyn DriftSource) {
        for vehicle in vehicles {
            if !vehicle.status.eq_ignore_ascii_case("active") {
                continue;
            }
            let offset = self.offsets.entry(vehicle.id.clone()).or_insert(0.0);
            *offset = (*offset + source.step_km()).clamp(-MAX_OFFSET_KM, MAX_OFFSET_KM);
        }
    }

    pub fn reset(&mut self) {
        self.offsets.clear();
    }
}
