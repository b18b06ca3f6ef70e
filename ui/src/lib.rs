#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod drift;
mod entities;
mod overlay;
mod surface;
mod view;

use anyhow::Result;
use structopt::StructOpt;

use model::{format_chainage, GeoPoint, ImportReport, LayerRegistry};

pub use crate::drift::{DriftSource, DriftState, RandomWalk};
pub use crate::entities::{
    tracked_entities, EntityKind, Project, Rfi, ScheduleTask, Structure, TrackedEntity, Vehicle,
};
pub use crate::overlay::{
    build_heat_bands, build_scene, HeatBand, Marker, OverlayScene, RiskLevel, RoutePolyline,
    RouteStyle, HEAT_BUCKETS,
};
pub use crate::surface::{LogSurface, MapSurface};
pub use crate::view::{
    BaseLayer, Camera, OverlayKey, SelectedEntity, ViewMode, ViewState, MAX_ZOOM, MIN_ZOOM,
};

/// Where the map centers before anything is imported.
const DEFAULT_MAP_CENTER: GeoPoint = GeoPoint {
    lat: -1.3,
    lon: 36.85,
};

#[derive(StructOpt)]
struct Args {
    /// Route geometry files (.kml) to import
    #[structopt(long)]
    kml: Vec<String>,
    /// The road the imported files belong to
    #[structopt(long, default_value = "Main Road")]
    road: String,
    /// A JSON snapshot of the project object (vehicles, RFIs, schedule, structures)
    #[structopt(long)]
    project: Option<String>,
    /// How many GPS drift ticks to simulate
    #[structopt(long, default_value = "5")]
    ticks: usize,
    /// Write the imported layers as GeoJSON to this path
    #[structopt(long)]
    export_geojson: Option<String>,
}

/// Owns everything the map subsystem needs per session: the layer registry, the latest
/// project snapshot, view state, drift offsets, and (while in map mode) the live
/// surface.
pub struct App {
    pub registry: LayerRegistry,
    pub project: Project,
    pub view: ViewState,
    pub drift: DriftState,
    surface: Option<Box<dyn MapSurface>>,
    make_surface: Box<dyn Fn() -> Box<dyn MapSurface>>,
}

impl App {
    pub fn new(project: Project, make_surface: Box<dyn Fn() -> Box<dyn MapSurface>>) -> Self {
        Self {
            registry: LayerRegistry::new(),
            project,
            view: ViewState::new(),
            drift: DriftState::default(),
            surface: None,
            make_surface,
        }
    }

    /// Imports a batch of files, marks the new layers visible, and lands the user in
    /// the schematic view of the freshly imported road.
    pub fn import_files(&mut self, road: &str, files: &[(String, String)]) -> Result<ImportReport> {
        let report = self.registry.import_files(road, files)?;
        for id in &report.added {
            self.view.set_visible(OverlayKey::Layer(*id), true);
        }
        if !report.added.is_empty() {
            self.set_view_mode(ViewMode::Schematic);
        }
        self.refresh();
        Ok(report)
    }

    pub fn scene(&self) -> OverlayScene {
        build_scene(&self.registry, &self.project, &self.drift, &self.view)
    }

    /// Pushes the current scene to the live surface, if any.
    pub fn refresh(&mut self) {
        if let Some(surface) = &mut self.surface {
            let scene = build_scene(&self.registry, &self.project, &self.drift, &self.view);
            surface.update_overlays(&scene);
        }
    }

    /// Switching away from the map fully tears the surface down before anything else
    /// happens; switching back builds a fresh one centered on the reference layer.
    pub fn set_view_mode(&mut self, mode: ViewMode) {
        if self.view.mode == mode {
            return;
        }
        if let Some(mut surface) = self.surface.take() {
            surface.detach();
        }
        self.view.mode = mode;
        if mode == ViewMode::Map {
            let center = self
                .registry
                .reference_layer()
                .map(|l| l.bounds.center())
                .unwrap_or(DEFAULT_MAP_CENTER);
            let mut surface = (self.make_surface)();
            surface.attach(center, self.view.base_layer);
            self.surface = Some(surface);
            self.refresh();
        }
    }

    pub fn set_base_layer(&mut self, base_layer: BaseLayer) {
        self.view.base_layer = base_layer;
        if let Some(surface) = &mut self.surface {
            surface.set_base_layer(base_layer);
        }
    }

    /// The collaborator's single mutation hook: we get a fresh snapshot and reproject.
    pub fn on_project_update(&mut self, project: Project) {
        self.project = project;
        self.refresh();
    }

    /// One step of the live-tracking loop. Does nothing when tracking is off, so a
    /// stopped loop can't update a torn-down view.
    pub fn tick_drift(&mut self, source: &mut dyn DriftSource) {
        if !self.view.live_tracking {
            return;
        }
        self.drift.tick(&self.project.vehicles, source);
        self.refresh();
    }

    pub fn set_live_tracking(&mut self, on: bool) {
        self.view.live_tracking = on;
    }

    /// Destructive: requires the caller to have confirmed with the user. Returns
    /// whether anything happened.
    pub fn clear_all_layers(&mut self, confirmed: bool) -> bool {
        if !confirmed || self.registry.is_empty() {
            return false;
        }
        self.registry.clear_all();
        self.drift.reset();
        self.refresh();
        true
    }
}

fn run(args: Args) -> Result<()> {
    let project: Project = match &args.project {
        Some(path) => serde_json::from_str(&fs_err::read_to_string(path)?)?,
        None => Project::default(),
    };
    let mut app = App::new(
        project,
        Box::new(|| Box::new(LogSurface::default()) as Box<dyn MapSurface>),
    );

    if !args.kml.is_empty() {
        let mut files = Vec::new();
        for path in &args.kml {
            files.push((path.clone(), fs_err::read_to_string(path)?));
        }
        let report = app.import_files(&args.road, &files)?;
        for (file, err) in &report.errors {
            error!("{} failed to import: {}", file, err);
        }
        if report.added.is_empty() && !report.errors.is_empty() {
            bail!("none of the selected files contained route geometry");
        }
        info!("{} layer(s) registered", app.registry.len());
    }

    match app.registry.reference_layer() {
        Some(layer) => info!(
            "reference alignment: {} on {}, ending at {}",
            layer.name,
            layer.road_name,
            format_chainage(layer.total_length_km)
        ),
        None => info!("no reference alignment; using the fallback curve"),
    }
    info!("project length: {} km", app.registry.project_length_km());

    let scene = app.scene();
    info!(
        "schematic scene: {} route layer(s), {} marker(s), {} heat band(s)",
        scene.polylines.len(),
        scene.markers.len(),
        scene.heat_bands.len()
    );

    let mut walk = RandomWalk::new(rand::thread_rng());
    for _ in 0..args.ticks {
        app.tick_drift(&mut walk);
    }
    for vehicle in &app.project.vehicles {
        if vehicle.status.eq_ignore_ascii_case("active") {
            info!(
                "{} drifted {:+.2} km",
                vehicle.plate_number,
                app.drift.offset_km(&vehicle.id)
            );
        }
    }

    // Exercise the full surface lifecycle once
    app.set_view_mode(ViewMode::Map);
    app.set_base_layer(BaseLayer::Satellite);
    app.set_view_mode(ViewMode::Schematic);

    if let Some(path) = &args.export_geojson {
        fs_err::write(path, model::export::registry_to_geojson_string(&app.registry))?;
        info!("wrote {}", path);
    }
    Ok(())
}

pub fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::from_args();
    if let Err(err) = run(args) {
        error!("{:?}", err);
        std::process::exit(1);
    }
}
