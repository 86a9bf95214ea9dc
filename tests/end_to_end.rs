use obcine_map::config::{AppConfig, DataConfig, MapConfig};
use obcine_map::data::{Aggregator, DatasetKind};
use obcine_map::map::{
    GeometryLocation, GeometrySource, Layer, LayerController, LayerState, Legend, MapRenderer,
    StaticGeometrySource,
};
use obcine_map::service::{AtlasService, QueryError};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const MUNICIPALITIES_CSV: &str = "obcina,leto,Gross income - TOTAL\n\
                                  Ljubljana,2020,1500\n\
                                  Ajdovščina,2020,z\n\
                                  Ljubljana,2021,1550\n\
                                  Ajdovščina,2021,1200\n";

const REGIONS_CSV: &str = "regija,leto,Gross income - TOTAL\n\
                           Osrednjeslovenska,2021,1450\n";

const MUNICIPALITIES_GEOJSON: &str = r#"{"type":"FeatureCollection","features":[
    {"type":"Feature","properties":{"OB_UIME":"Ljubljana"},
     "geometry":{"type":"Polygon","coordinates":[[[14.4,46.0],[14.6,46.0],[14.6,46.1],[14.4,46.1],[14.4,46.0]]]}},
    {"type":"Feature","properties":{"OB_UIME":"Ajdovščina"},
     "geometry":{"type":"Polygon","coordinates":[[[13.8,45.8],[14.0,45.8],[14.0,46.0],[13.8,46.0],[13.8,45.8]]]}}
]}"#;

fn write(dir: &Path, name: &str, content: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path.to_string_lossy().into_owned()
}

fn fixture() -> (TempDir, AppConfig) {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig {
        data: DataConfig {
            municipalities_csv: write(dir.path(), "obcine.csv", MUNICIPALITIES_CSV).into(),
            regions_csv: write(dir.path(), "regije.csv", REGIONS_CSV).into(),
        },
        map: MapConfig {
            entities_geometry: write(dir.path(), "obcine.json", MUNICIPALITIES_GEOJSON),
            regions_geometry: dir.path().join("missing.json").to_string_lossy().into_owned(),
            ..MapConfig::default()
        },
        ..AppConfig::default()
    };
    (dir, config)
}

#[test]
fn suppressed_value_is_null_and_excluded_from_statistics() {
    let (_dir, config) = fixture();
    let aggregator =
        Aggregator::initialize(&config.data.municipalities_csv, DatasetKind::Municipalities)
            .unwrap();

    let slice = aggregator.get_entity_data("Gross income - TOTAL", 2020);
    assert_eq!(slice.data.len(), 2);
    assert_eq!(slice.data[1].entity_name, "Ajdovščina");
    assert_eq!(slice.data[1].value, None);
    assert_eq!(slice.stats.min, Some(1500.0));
    assert_eq!(slice.stats.max, Some(1500.0));
    assert_eq!(slice.stats.avg, Some(1500.0));
    assert_eq!(slice.stats.median, Some(1500.0));

    let both = aggregator.get_entity_data("Gross income - TOTAL", 2021);
    assert_eq!(both.stats.median, Some(1375.0));
}

#[test]
fn history_through_the_query_service() {
    let (_dir, config) = fixture();
    let service = AtlasService::initialize(&config.data).unwrap();

    // Diacritics are folded for map matching only, not for dataset lookups.
    assert!(matches!(
        service.history(DatasetKind::Municipalities, "ajdovscina", "grossIncome"),
        Err(QueryError::EntityNotFound { .. })
    ));

    let history = service
        .history(DatasetKind::Municipalities, "AJDOVŠČINA", "grossIncome")
        .unwrap();
    assert_eq!(history.entity_name, "Ajdovščina");
    assert_eq!(history.total_records, 2);
    assert_eq!(history.data[0].value, None);
    assert_eq!(history.data[1].value, Some(1200.0));
}

#[test]
fn map_layer_loads_from_disk_and_renders() {
    let (_dir, config) = fixture();
    let service = AtlasService::initialize(&config.data).unwrap();
    let source: Arc<dyn GeometrySource> = Arc::new(StaticGeometrySource::new(
        GeometryLocation::parse(&config.map.entities_geometry),
        GeometryLocation::parse(&config.map.regions_geometry),
    ));

    let mut controller = LayerController::mount(source, &config.map, Some(10.0));
    assert!(controller.wait_for_pending(Duration::from_secs(5)));
    assert_eq!(controller.state(), LayerState::ShowingEntities);

    let slice = service
        .data(Layer::Entities.dataset(), "Gross income - TOTAL", 2021)
        .unwrap();
    let styles = controller.styles(&slice.data, &slice.stats, config.render.palette);
    assert_eq!(styles.len(), 2);

    let legend = Legend::new(&slice.stats, config.render.palette);
    let png = MapRenderer::render_png(&styles, legend.as_ref(), 300, 200).unwrap();
    assert!(png.starts_with(b"\x89PNG"));

    // The region document does not exist: zooming out leaves the map unloaded.
    controller.set_zoom(7.0);
    assert!(controller.wait_for_pending(Duration::from_secs(5)));
    assert_eq!(controller.state(), LayerState::Unloaded);
}
