//! Polygon boundary documents for the two map layers and where to get them.

use crate::data::DatasetKind;
use geojson::GeoJson;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum GeometryError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Request for {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Invalid GeoJSON: {0}")]
    Parse(#[from] geojson::Error),
    #[error("Expected a FeatureCollection")]
    NotFeatureCollection,
}

/// The two polygon granularities shown on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    Entities,
    Regions,
}

impl Layer {
    /// Feature properties holding the display name, in order of preference.
    pub fn name_properties(self) -> &'static [&'static str] {
        match self {
            Layer::Entities => &["OB_UIME"],
            Layer::Regions => &["SR_UIME", "NAME_1"],
        }
    }

    /// Dataset whose values color this layer.
    pub fn dataset(self) -> DatasetKind {
        match self {
            Layer::Entities => DatasetKind::Municipalities,
            Layer::Regions => DatasetKind::Regions,
        }
    }

    /// Layer to show at `zoom`: entities at or above `threshold`, regions below.
    pub fn for_zoom(zoom: f64, threshold: f64) -> Layer {
        if zoom >= threshold {
            Layer::Entities
        } else {
            Layer::Regions
        }
    }
}

/// Rings are lists of `[lon, lat]`; the first ring of a polygon is its exterior.
pub type Polygon = Vec<Vec<[f64; 2]>>;

#[derive(Debug, Clone, PartialEq)]
pub struct MapFeature {
    pub name: String,
    pub polygons: Vec<Polygon>,
}

impl MapFeature {
    /// `(min_lon, min_lat, max_lon, max_lat)` over exterior rings.
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        bounds_of(self.polygons.iter())
    }

    /// Centre of the bounding box, as `(lon, lat)`.
    pub fn center(&self) -> Option<(f64, f64)> {
        self.bounds()
            .map(|(x0, y0, x1, y1)| ((x0 + x1) / 2.0, (y0 + y1) / 2.0))
    }
}

fn bounds_of<'a>(polygons: impl Iterator<Item = &'a Polygon>) -> Option<(f64, f64, f64, f64)> {
    let mut bounds: Option<(f64, f64, f64, f64)> = None;
    for [lon, lat] in polygons.filter_map(|p| p.first()).flatten() {
        let b = bounds.get_or_insert((*lon, *lat, *lon, *lat));
        b.0 = b.0.min(*lon);
        b.1 = b.1.min(*lat);
        b.2 = b.2.max(*lon);
        b.3 = b.3.max(*lat);
    }
    bounds
}

/// Parsed features of one layer.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerGeometry {
    pub layer: Layer,
    pub features: Vec<MapFeature>,
}

impl LayerGeometry {
    pub fn from_geojson_str(layer: Layer, text: &str) -> Result<Self, GeometryError> {
        let GeoJson::FeatureCollection(collection) = text.parse::<GeoJson>()? else {
            return Err(GeometryError::NotFeatureCollection);
        };

        let features: Vec<MapFeature> = collection
            .features
            .into_iter()
            .map(|feature| {
                let name = layer
                    .name_properties()
                    .iter()
                    .find_map(|key| feature.property(key).and_then(|v| v.as_str()))
                    .unwrap_or_default()
                    .to_string();

                let polygons = match feature.geometry.map(|g| g.value) {
                    Some(geojson::Value::Polygon(rings)) => vec![to_rings(rings)],
                    Some(geojson::Value::MultiPolygon(polys)) => {
                        polys.into_iter().map(to_rings).collect()
                    }
                    _ => Vec::new(),
                };

                MapFeature { name, polygons }
            })
            .collect();

        debug!(?layer, features = features.len(), "parsed layer geometry");
        Ok(Self { layer, features })
    }

    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        bounds_of(self.features.iter().flat_map(|f| f.polygons.iter()))
    }
}

fn to_rings(rings: Vec<Vec<Vec<f64>>>) -> Polygon {
    rings
        .into_iter()
        .map(|ring| {
            ring.into_iter()
                .filter(|pos| pos.len() >= 2)
                .map(|pos| [pos[0], pos[1]])
                .collect()
        })
        .collect()
}

/// Fetches the raw GeoJSON text of a layer.
pub trait GeometrySource: Send + Sync {
    fn fetch(&self, layer: Layer) -> Result<String, GeometryError>;
}

/// A polygon document on disk or behind an `http(s)://` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeometryLocation {
    File(PathBuf),
    Url(String),
}

impl GeometryLocation {
    pub fn parse(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            GeometryLocation::Url(location.to_string())
        } else {
            GeometryLocation::File(PathBuf::from(location))
        }
    }
}

/// The two static boundary documents, one per layer.
pub struct StaticGeometrySource {
    entities: GeometryLocation,
    regions: GeometryLocation,
    client: reqwest::blocking::Client,
}

impl StaticGeometrySource {
    pub fn new(entities: GeometryLocation, regions: GeometryLocation) -> Self {
        Self {
            entities,
            regions,
            client: reqwest::blocking::Client::new(),
        }
    }
}

impl GeometrySource for StaticGeometrySource {
    fn fetch(&self, layer: Layer) -> Result<String, GeometryError> {
        let location = match layer {
            Layer::Entities => &self.entities,
            Layer::Regions => &self.regions,
        };
        match location {
            GeometryLocation::File(path) => {
                std::fs::read_to_string(path).map_err(|source| GeometryError::Io {
                    path: path.clone(),
                    source,
                })
            }
            GeometryLocation::Url(url) => self
                .client
                .get(url)
                .send()
                .and_then(|resp| resp.error_for_status())
                .and_then(|resp| resp.text())
                .map_err(|source| GeometryError::Http {
                    url: url.clone(),
                    source,
                }),
        }
    }
}
