//! Ephemeral view state: which surface is live, where the camera sits, which overlays
//! are toggled, and what's selected. All of it resets when the view unmounts; nothing
//! here is persisted.

use std::collections::BTreeMap;

use model::LayerID;

use crate::entities::{Rfi, ScheduleTask, Structure, Vehicle};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewMode {
    Schematic,
    Map,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BaseLayer {
    Street,
    Satellite,
}

pub const MIN_ZOOM: f64 = 0.5;
pub const MAX_ZOOM: f64 = 5.0;

/// Pan/zoom transform for the schematic canvas. Single writer, mutated synchronously on
/// pointer events.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

impl Camera {
    pub fn new() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
        }
    }

    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.x += dx;
        self.y += dy;
    }

    pub fn zoom_by(&mut self, factor: f64) {
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

/// Which overlays are drawn. Imported layers toggle individually; entities toggle as
/// categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum OverlayKey {
    Layer(LayerID),
    Vehicles,
    Rfis,
    WorkSites,
    Structures,
    HeatMap,
}

/// At most one thing selected; clicking another replaces it, and only an explicit clear
/// empties it.
#[derive(Clone, Debug)]
pub enum SelectedEntity {
    Vehicle(Vehicle),
    Rfi(Rfi),
    WorkSite(ScheduleTask),
    Structure(Structure),
}

pub struct ViewState {
    pub mode: ViewMode,
    pub base_layer: BaseLayer,
    pub camera: Camera,
    visibility: BTreeMap<OverlayKey, bool>,
    pub selected: Option<SelectedEntity>,
    pub live_tracking: bool,
}

impl ViewState {
    pub fn new() -> Self {
        Self {
            mode: ViewMode::Schematic,
            base_layer: BaseLayer::Street,
            camera: Camera::new(),
            visibility: BTreeMap::new(),
            selected: None,
            live_tracking: true,
        }
    }

    /// Everything defaults to visible until toggled off.
    pub fn is_visible(&self, key: OverlayKey) -> bool {
        self.visibility.get(&key).copied().unwrap_or(true)
    }

    pub fn set_visible(&mut self, key: OverlayKey, visible: bool) {
        self.visibility.insert(key, visible);
    }

    pub fn toggle(&mut self, key: OverlayKey) {
        let now = self.is_visible(key);
        self.visibility.insert(key, !now);
    }

    pub fn select(&mut self, entity: SelectedEntity) {
        self.selected = Some(entity);
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new()
    }
}
