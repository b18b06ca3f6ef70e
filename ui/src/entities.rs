//! The boundary with the CRUD side of the application. It owns the project object; we
//! read a snapshot of it each render pass and never write back.

use serde::Deserialize;

use model::format_chainage;

use crate::drift::DriftState;

/// Read-only snapshot of the external project object.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Project {
    pub vehicles: Vec<Vehicle>,
    pub rfis: Vec<Rfi>,
    pub schedule: Vec<ScheduleTask>,
    pub structures: Vec<Structure>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Vehicle {
    pub id: String,
    pub plate_number: String,
    #[serde(rename = "type")]
    pub vehicle_type: String,
    pub status: String,
    pub driver: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Rfi {
    pub id: String,
    pub rfi_number: String,
    /// Chainage string, e.g. "12+500"
    pub location: String,
    pub status: String,
    pub description: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScheduleTask {
    pub id: String,
    pub name: String,
    pub status: String,
    /// 0 to 100
    pub progress: f64,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Structure {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub structure_type: String,
    /// Chainage string
    pub location: String,
    pub status: String,
    pub components: Vec<StructureComponent>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StructureComponent {
    pub name: String,
    pub total_quantity: f64,
    pub completed_quantity: f64,
}

impl Structure {
    /// Overall completion across components, 0 to 100.
    pub fn completion_pct(&self) -> f64 {
        let total: f64 = self.components.iter().map(|c| c.total_quantity).sum();
        if total == 0.0 {
            return 0.0;
        }
        let done: f64 = self.components.iter().map(|c| c.completed_quantity).sum();
        done / total * 100.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
    Vehicle,
    Rfi,
    WorkSite,
    Structure,
}

/// What the map needs to know to draw anything, regardless of which CRUD shape it came
/// from.
#[derive(Clone, Debug)]
pub struct TrackedEntity {
    pub kind: EntityKind,
    pub id: String,
    pub chainage: String,
    pub label: String,
    pub color: &'static str,
}

const VEHICLE_COLOR: &str = "#f59e0b";
const RFI_COLOR: &str = "#dc2626";
const WORK_SITE_COLOR: &str = "#3b82f6";
const STRUCTURE_DONE_COLOR: &str = "#16a34a";
const STRUCTURE_ACTIVE_COLOR: &str = "#f59e0b";
const STRUCTURE_OTHER_COLOR: &str = "#6b7280";

/// Flattens the project snapshot into drawable rows. Vehicles and work sites get
/// synthetic chainage placement; RFIs and structures sit at their recorded location.
pub fn tracked_entities(project: &Project, drift: &DriftState) -> Vec<TrackedEntity> {
    let mut out = Vec::new();

    let active_vehicles = project
        .vehicles
        .iter()
        .filter(|v| v.status.eq_ignore_ascii_case("active"));
    for (idx, vehicle) in active_vehicles.enumerate() {
        let km = idx as f64 * 2.5 + 1.0 + drift.offset_km(&vehicle.id);
        out.push(TrackedEntity {
            kind: EntityKind::Vehicle,
            id: vehicle.id.clone(),
            // Decimal form, since drift can push this below zero; the projector clamps
            chainage: format!("{:.3}", km),
            label: format!(
                "{} ({}), driver {}",
                vehicle.plate_number, vehicle.vehicle_type, vehicle.driver
            ),
            color: VEHICLE_COLOR,
        });
    }

    for rfi in project
        .rfis
        .iter()
        .filter(|r| r.status.eq_ignore_ascii_case("open"))
    {
        out.push(TrackedEntity {
            kind: EntityKind::Rfi,
            id: rfi.id.clone(),
            chainage: rfi.location.clone(),
            label: format!("{}: {}", rfi.rfi_number, rfi.description),
            color: RFI_COLOR,
        });
    }

    let on_track = project
        .schedule
        .iter()
        .filter(|t| t.status.eq_ignore_ascii_case("on track"));
    for (idx, task) in on_track.enumerate() {
        let km = 2.0 + idx as f64 * 3.0;
        out.push(TrackedEntity {
            kind: EntityKind::WorkSite,
            id: task.id.clone(),
            chainage: format_chainage(km),
            label: format!("{} ({:.0}%)", task.name, task.progress),
            color: WORK_SITE_COLOR,
        });
    }

    for structure in &project.structures {
        let color = if structure.status.eq_ignore_ascii_case("completed") {
            STRUCTURE_DONE_COLOR
        } else if structure.status.eq_ignore_ascii_case("in progress") {
            STRUCTURE_ACTIVE_COLOR
        } else {
            STRUCTURE_OTHER_COLOR
        };
        out.push(TrackedEntity {
            kind: EntityKind::Structure,
            id: structure.id.clone(),
            chainage: structure.location.clone(),
            label: format!(
                "{} ({}, {:.0}% complete)",
                structure.name,
                structure.structure_type,
                structure.completion_pct()
            ),
            color,
        });
    }

    out
}
