//! Map Layer Controller
//! Zoom-driven switching between the municipality and region layers, on-demand
//! background geometry loading, styling, selection and search.

use crate::config::MapConfig;
use crate::data::names::normalize_feature_name;
use crate::data::EntityValue;
use crate::map::geometry::{GeometryError, GeometrySource, Layer, LayerGeometry, MapFeature};
use crate::map::palette::Palette;
use crate::map::style::{style_for, FeatureStyle, ValueIndex};
use crate::stats::Statistics;
use serde::Serialize;
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// What the map currently shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LayerState {
    /// The active layer's geometry has not arrived (loading or failed).
    Unloaded,
    ShowingEntities,
    ShowingRegions,
}

/// Load progress of one layer's geometry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "kebab-case")]
pub enum LoadStatus {
    NotRequested,
    InFlight,
    Loaded,
    Failed(String),
}

/// Result of a successful text search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub name: String,
    /// `[lat, lon]` the view was panned to.
    pub center: [f64; 2],
}

#[derive(Default)]
enum SlotStatus {
    #[default]
    NotRequested,
    InFlight { started: Instant, warned: bool },
    Loaded,
    Failed(String),
}

#[derive(Default)]
struct LayerSlot {
    status: SlotStatus,
    geometry: Option<Arc<LayerGeometry>>,
    generation: u64,
}

/// Background fetch outcome, tagged with the request that produced it.
struct FetchResult {
    layer: Layer,
    generation: u64,
    result: Result<LayerGeometry, GeometryError>,
}

pub struct LayerController {
    source: Arc<dyn GeometrySource>,
    threshold: f64,
    default_zoom: f64,
    default_center: [f64; 2],
    stall_after: Duration,

    zoom: f64,
    center: [f64; 2],
    active: Layer,
    entities: LayerSlot,
    regions: LayerSlot,
    selection: Option<String>,

    fetch_tx: Sender<FetchResult>,
    fetch_rx: Receiver<FetchResult>,
}

impl LayerController {
    /// Create the controller at `initial_zoom` (or the configured default) and start
    /// loading the layer that zoom selects.
    pub fn mount(
        source: Arc<dyn GeometrySource>,
        config: &MapConfig,
        initial_zoom: Option<f64>,
    ) -> Self {
        let zoom = initial_zoom.unwrap_or(config.default_zoom);
        let (fetch_tx, fetch_rx) = channel();
        let mut controller = Self {
            source,
            threshold: config.entity_zoom_threshold,
            default_zoom: config.default_zoom,
            default_center: config.default_center,
            stall_after: Duration::from_secs(config.stall_warning_secs),
            zoom,
            center: config.default_center,
            active: Layer::for_zoom(zoom, config.entity_zoom_threshold),
            entities: LayerSlot::default(),
            regions: LayerSlot::default(),
            selection: None,
            fetch_tx,
            fetch_rx,
        };
        controller.request(controller.active);
        controller
    }

    fn slot(&self, layer: Layer) -> &LayerSlot {
        match layer {
            Layer::Entities => &self.entities,
            Layer::Regions => &self.regions,
        }
    }

    fn slot_mut(&mut self, layer: Layer) -> &mut LayerSlot {
        match layer {
            Layer::Entities => &mut self.entities,
            Layer::Regions => &mut self.regions,
        }
    }

    /// Spawn a fetch for `layer` unless one was already requested.
    fn request(&mut self, layer: Layer) {
        let slot = self.slot_mut(layer);
        if !matches!(slot.status, SlotStatus::NotRequested) {
            return;
        }
        slot.generation += 1;
        slot.status = SlotStatus::InFlight {
            started: Instant::now(),
            warned: false,
        };
        let generation = slot.generation;

        info!(?layer, generation, "fetching layer geometry");
        let source = Arc::clone(&self.source);
        let tx = self.fetch_tx.clone();
        thread::spawn(move || {
            let result = source
                .fetch(layer)
                .and_then(|text| LayerGeometry::from_geojson_str(layer, &text));
            let _ = tx.send(FetchResult {
                layer,
                generation,
                result,
            });
        });
    }

    fn apply(&mut self, fetched: FetchResult) {
        let FetchResult {
            layer,
            generation,
            result,
        } = fetched;
        let slot = self.slot_mut(layer);
        if generation != slot.generation {
            debug!(?layer, generation, current = slot.generation, "discarding stale geometry");
            return;
        }
        match result {
            Ok(geometry) => {
                info!(?layer, features = geometry.features.len(), "layer geometry loaded");
                slot.geometry = Some(Arc::new(geometry));
                slot.status = SlotStatus::Loaded;
            }
            Err(e) => {
                error!(?layer, error = %e, "layer geometry failed to load");
                slot.status = SlotStatus::Failed(e.to_string());
            }
        }
    }

    /// Apply finished fetches and flag stalled ones. Call once per frame/event.
    pub fn poll(&mut self) {
        while let Ok(fetched) = self.fetch_rx.try_recv() {
            self.apply(fetched);
        }
        self.flag_stalls();
    }

    /// Block until no fetch is in flight or `timeout` passes. Returns `true` when idle.
    pub fn wait_for_pending(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.poll();
            if !self.any_in_flight() {
                return true;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            match self.fetch_rx.recv_timeout(remaining) {
                Ok(fetched) => self.apply(fetched),
                Err(RecvTimeoutError::Timeout) => {
                    self.flag_stalls();
                    return false;
                }
                Err(RecvTimeoutError::Disconnected) => return false,
            }
        }
    }

    fn any_in_flight(&self) -> bool {
        [&self.entities, &self.regions]
            .iter()
            .any(|slot| matches!(slot.status, SlotStatus::InFlight { .. }))
    }

    fn flag_stalls(&mut self) {
        let stall_after = self.stall_after;
        for layer in [Layer::Entities, Layer::Regions] {
            if let SlotStatus::InFlight { started, warned } = &mut self.slot_mut(layer).status {
                if !*warned && started.elapsed() >= stall_after {
                    *warned = true;
                    warn!(
                        ?layer,
                        elapsed_secs = started.elapsed().as_secs(),
                        "geometry fetch is stalled"
                    );
                }
            }
        }
    }

    /// Update the zoom level and switch layers when it crosses the threshold.
    pub fn set_zoom(&mut self, zoom: f64) -> Layer {
        self.poll();
        self.zoom = zoom;
        let layer = Layer::for_zoom(zoom, self.threshold);
        if layer != self.active {
            debug!(from = ?self.active, to = ?layer, zoom, "switching layer");
            self.active = layer;
        }
        self.request(layer);
        layer
    }

    /// Return to the default centre and zoom.
    pub fn reset_view(&mut self) -> Layer {
        self.center = self.default_center;
        self.set_zoom(self.default_zoom)
    }

    /// Start a new fetch for a layer whose last fetch failed. A layer still in flight,
    /// stalled or not, keeps its single outstanding request.
    pub fn retry(&mut self, layer: Layer) -> bool {
        self.poll();
        if !matches!(self.slot(layer).status, SlotStatus::Failed(_)) {
            return false;
        }
        info!(?layer, "retrying geometry fetch");
        self.slot_mut(layer).status = SlotStatus::NotRequested;
        self.request(layer);
        true
    }

    pub fn state(&self) -> LayerState {
        match (self.active, self.slot(self.active).geometry.is_some()) {
            (_, false) => LayerState::Unloaded,
            (Layer::Entities, true) => LayerState::ShowingEntities,
            (Layer::Regions, true) => LayerState::ShowingRegions,
        }
    }

    pub fn active_layer(&self) -> Layer {
        self.active
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// `[lat, lon]`
    pub fn center(&self) -> [f64; 2] {
        self.center
    }

    pub fn load_status(&self, layer: Layer) -> LoadStatus {
        match &self.slot(layer).status {
            SlotStatus::NotRequested => LoadStatus::NotRequested,
            SlotStatus::InFlight { .. } => LoadStatus::InFlight,
            SlotStatus::Loaded => LoadStatus::Loaded,
            SlotStatus::Failed(message) => LoadStatus::Failed(message.clone()),
        }
    }

    /// In flight for longer than the configured stall window.
    pub fn is_stalled(&self, layer: Layer) -> bool {
        match self.slot(layer).status {
            SlotStatus::InFlight { started, .. } => started.elapsed() >= self.stall_after,
            _ => false,
        }
    }

    pub fn geometry(&self, layer: Layer) -> Option<Arc<LayerGeometry>> {
        self.slot(layer).geometry.clone()
    }

    /// Style every feature of the active layer; empty until its geometry has loaded.
    pub fn styles(
        &self,
        data: &[EntityValue],
        stats: &Statistics,
        palette: Palette,
    ) -> Vec<(MapFeature, FeatureStyle)> {
        let Some(geometry) = self.geometry(self.active) else {
            return Vec::new();
        };
        let index = ValueIndex::new(data);
        geometry
            .features
            .iter()
            .map(|feature| {
                let style = style_for(
                    &feature.name,
                    self.active,
                    &index,
                    stats,
                    self.selection.as_deref(),
                    palette,
                );
                (feature.clone(), style)
            })
            .collect()
    }

    /// Select the clicked feature and return its row of the current slice, if any.
    pub fn click(&mut self, feature_name: &str, data: &[EntityValue]) -> Option<EntityValue> {
        self.selection = Some(feature_name.to_string());
        ValueIndex::new(data).entry(feature_name).cloned()
    }

    /// Select and pan to the first feature of the active layer whose normalized name
    /// contains the normalized query.
    pub fn search(&mut self, query: &str) -> Option<SearchHit> {
        let wanted = normalize_feature_name(query);
        if wanted.is_empty() {
            return None;
        }
        let geometry = self.geometry(self.active)?;
        let Some(feature) = geometry
            .features
            .iter()
            .find(|f| normalize_feature_name(&f.name).contains(&wanted))
        else {
            info!(query, "no feature matches search");
            return None;
        };

        self.selection = Some(feature.name.clone());
        if let Some((lon, lat)) = feature.center() {
            self.center = [lat, lon];
        }
        Some(SearchHit {
            name: feature.name.clone(),
            center: self.center,
        })
    }

    pub fn selection(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::geometry::tests::{MUNICIPALITIES, REGIONS};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    const WAIT: Duration = Duration::from_secs(5);

    #[derive(Default)]
    struct FakeSource {
        entity_fetches: AtomicUsize,
        region_fetches: AtomicUsize,
        fail_entities: AtomicBool,
        delay: Mutex<Option<Duration>>,
    }

    impl FakeSource {
        fn fetches(&self, layer: Layer) -> usize {
            match layer {
                Layer::Entities => self.entity_fetches.load(Ordering::SeqCst),
                Layer::Regions => self.region_fetches.load(Ordering::SeqCst),
            }
        }
    }

    impl GeometrySource for FakeSource {
        fn fetch(&self, layer: Layer) -> Result<String, GeometryError> {
            if let Some(delay) = *self.delay.lock().unwrap() {
                thread::sleep(delay);
            }
            match layer {
                Layer::Entities => {
                    self.entity_fetches.fetch_add(1, Ordering::SeqCst);
                    if self.fail_entities.load(Ordering::SeqCst) {
                        return Err(GeometryError::NotFeatureCollection);
                    }
                    Ok(MUNICIPALITIES.to_string())
                }
                Layer::Regions => {
                    self.region_fetches.fetch_add(1, Ordering::SeqCst);
                    Ok(REGIONS.to_string())
                }
            }
        }
    }

    fn mount(source: &Arc<FakeSource>, zoom: f64) -> LayerController {
        let source: Arc<dyn GeometrySource> = source.clone();
        LayerController::mount(source, &MapConfig::default(), Some(zoom))
    }

    #[test]
    fn test_zoom_sequence_switches_layers_and_fetches_once() {
        let source = Arc::new(FakeSource::default());
        let mut controller = mount(&source, 8.0);
        assert_eq!(controller.active_layer(), Layer::Regions);

        let mut layers = vec![controller.active_layer()];
        for zoom in [9.0, 12.0, 7.0] {
            layers.push(controller.set_zoom(zoom));
            assert!(controller.wait_for_pending(WAIT));
        }
        assert_eq!(
            layers,
            [Layer::Regions, Layer::Entities, Layer::Entities, Layer::Regions]
        );
        assert_eq!(source.fetches(Layer::Regions), 1);
        assert_eq!(source.fetches(Layer::Entities), 1);
        assert_eq!(controller.state(), LayerState::ShowingRegions);
        assert!(controller.geometry(Layer::Entities).is_some());
    }

    #[test]
    fn test_initial_state_follows_initial_zoom() {
        let source = Arc::new(FakeSource::default());
        let mut controller = mount(&source, 10.0);
        assert_eq!(controller.state(), LayerState::Unloaded);
        assert!(controller.wait_for_pending(WAIT));
        assert_eq!(controller.state(), LayerState::ShowingEntities);
        assert_eq!(controller.load_status(Layer::Regions), LoadStatus::NotRequested);
    }

    #[test]
    fn test_failure_leaves_layer_unloaded_until_retry() {
        let source = Arc::new(FakeSource::default());
        source.fail_entities.store(true, Ordering::SeqCst);
        let mut controller = mount(&source, 9.0);
        assert!(controller.wait_for_pending(WAIT));
        assert_eq!(controller.state(), LayerState::Unloaded);
        assert!(matches!(controller.load_status(Layer::Entities), LoadStatus::Failed(_)));

        // Zooming around does not refetch a failed layer.
        controller.set_zoom(7.0);
        controller.set_zoom(11.0);
        assert!(controller.wait_for_pending(WAIT));
        assert_eq!(source.fetches(Layer::Entities), 1);

        source.fail_entities.store(false, Ordering::SeqCst);
        assert!(controller.retry(Layer::Entities));
        assert!(controller.wait_for_pending(WAIT));
        assert_eq!(controller.state(), LayerState::ShowingEntities);
        assert!(!controller.retry(Layer::Entities));
    }

    #[test]
    fn test_stale_results_are_discarded() {
        let source = Arc::new(FakeSource::default());
        let mut controller = mount(&source, 8.0);
        assert!(controller.wait_for_pending(WAIT));
        let loaded = controller.geometry(Layer::Regions).unwrap();

        controller.apply(FetchResult {
            layer: Layer::Regions,
            generation: 0,
            result: Err(GeometryError::NotFeatureCollection),
        });
        assert_eq!(controller.load_status(Layer::Regions), LoadStatus::Loaded);
        assert!(Arc::ptr_eq(&controller.geometry(Layer::Regions).unwrap(), &loaded));
    }

    #[test]
    fn test_slow_fetch_is_flagged_as_stalled() {
        let source = Arc::new(FakeSource::default());
        *source.delay.lock().unwrap() = Some(Duration::from_millis(300));
        let config = MapConfig {
            stall_warning_secs: 0,
            ..MapConfig::default()
        };
        let dyn_source: Arc<dyn GeometrySource> = source.clone();
        let mut controller = LayerController::mount(dyn_source, &config, None);

        controller.poll();
        assert_eq!(controller.load_status(Layer::Regions), LoadStatus::InFlight);
        assert!(controller.is_stalled(Layer::Regions));

        assert!(controller.wait_for_pending(WAIT));
        assert!(!controller.is_stalled(Layer::Regions));
        assert_eq!(controller.state(), LayerState::ShowingRegions);
    }

    #[test]
    fn test_retry_of_stalled_layer_keeps_single_fetch() {
        let source = Arc::new(FakeSource::default());
        *source.delay.lock().unwrap() = Some(Duration::from_millis(300));
        let config = MapConfig {
            stall_warning_secs: 0,
            ..MapConfig::default()
        };
        let dyn_source: Arc<dyn GeometrySource> = source.clone();
        let mut controller = LayerController::mount(dyn_source, &config, None);

        thread::sleep(Duration::from_millis(50));
        assert!(controller.is_stalled(Layer::Regions));
        assert!(!controller.retry(Layer::Regions));
        assert_eq!(controller.load_status(Layer::Regions), LoadStatus::InFlight);

        assert!(controller.wait_for_pending(WAIT));
        // Give a second fetch, had one been spawned, time to finish.
        thread::sleep(Duration::from_millis(500));
        assert_eq!(source.fetches(Layer::Regions), 1);
        assert_eq!(controller.state(), LayerState::ShowingRegions);
    }

    #[test]
    fn test_styles_click_and_search() {
        let source = Arc::new(FakeSource::default());
        let mut controller = mount(&source, 9.0);
        assert!(controller.styles(&[], &Statistics::default(), Palette::Blues).is_empty());
        assert!(controller.wait_for_pending(WAIT));

        let data = vec![
            EntityValue {
                entity_name: "Ljubljana".into(),
                value: Some(100.0),
            },
            EntityValue {
                entity_name: "Maribor".into(),
                value: Some(50.0),
            },
        ];
        let stats = crate::stats::StatsCalculator::compute_statistics(&[50.0, 100.0]);

        let clicked = controller.click("Maribor", &data).unwrap();
        assert_eq!(clicked.value, Some(50.0));
        assert_eq!(controller.selection(), Some("Maribor"));

        let styles = controller.styles(&data, &stats, Palette::Blues);
        assert_eq!(styles.len(), 3);
        let maribor = styles.iter().find(|(f, _)| f.name == "Maribor").unwrap();
        assert_eq!(maribor.1.weight, 2.0);

        let hit = controller.search("ajdovscina").unwrap();
        assert_eq!(hit.name, "Ajdovščina");
        assert!((hit.center[0] - 45.925).abs() < 1e-9);
        assert!((hit.center[1] - 13.925).abs() < 1e-9);
        assert_eq!(controller.selection(), Some("Ajdovščina"));
        assert!(controller.search("Koper").is_none());
        assert!(controller.search("  ").is_none());

        controller.reset_view();
        assert_eq!(controller.zoom(), 8.0);
        assert_eq!(controller.center(), MapConfig::default().default_center);
        assert_eq!(controller.active_layer(), Layer::Regions);
    }
}
