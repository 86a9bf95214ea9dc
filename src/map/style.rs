//! Per-polygon choropleth styling.

use crate::data::names::normalize_feature_name;
use crate::data::EntityValue;
use crate::map::geometry::Layer;
use crate::map::palette::{color_for_value, Color, Palette};
use crate::stats::Statistics;
use serde::Serialize;
use std::collections::HashMap;

const ENTITY_FALLBACK: Color = Color::from_rgb(0xf7, 0xf7, 0xf7);
const REGION_FALLBACK: Color = Color::from_rgb(0xec, 0xec, 0xec);
const SELECTED_STROKE: Color = Color::from_rgb(0x25, 0x24, 0x23);
const DEFAULT_STROKE: Color = Color::from_rgb(0x99, 0x99, 0x99);

/// Domain used when the slice has no valid values.
const FALLBACK_DOMAIN: (f64, f64) = (0.0, 100.0);

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureStyle {
    pub fill: Color,
    pub fill_opacity: f64,
    pub stroke: Color,
    pub weight: f64,
    pub opacity: f64,
}

/// Dataset rows keyed by normalized entity name. The first row wins on collisions.
#[derive(Debug, Clone, Default)]
pub struct ValueIndex {
    by_name: HashMap<String, EntityValue>,
}

impl ValueIndex {
    pub fn new(data: &[EntityValue]) -> Self {
        let mut by_name = HashMap::with_capacity(data.len());
        for item in data {
            by_name
                .entry(normalize_feature_name(&item.entity_name))
                .or_insert_with(|| item.clone());
        }
        Self { by_name }
    }

    /// Row whose normalized name equals the normalized `feature_name`.
    pub fn entry(&self, feature_name: &str) -> Option<&EntityValue> {
        self.by_name.get(&normalize_feature_name(feature_name))
    }

    pub fn value(&self, feature_name: &str) -> Option<f64> {
        self.entry(feature_name).and_then(|item| item.value)
    }
}

/// Style of the feature named `feature_name` on `layer`.
pub fn style_for(
    feature_name: &str,
    layer: Layer,
    values: &ValueIndex,
    stats: &Statistics,
    selection: Option<&str>,
    palette: Palette,
) -> FeatureStyle {
    let fill = match values.value(feature_name) {
        Some(value) => {
            let min = stats.min.unwrap_or(FALLBACK_DOMAIN.0);
            let max = stats.max.unwrap_or(FALLBACK_DOMAIN.1);
            color_for_value(value, min, max, palette)
        }
        None => match layer {
            Layer::Entities => ENTITY_FALLBACK,
            Layer::Regions => REGION_FALLBACK,
        },
    };

    let selected = selection
        .is_some_and(|s| normalize_feature_name(s) == normalize_feature_name(feature_name));

    FeatureStyle {
        fill,
        fill_opacity: match layer {
            Layer::Entities => 0.7,
            Layer::Regions => 0.6,
        },
        stroke: if selected { SELECTED_STROKE } else { DEFAULT_STROKE },
        weight: if selected { 2.0 } else { 1.0 },
        opacity: 1.0,
    }
}
