//! Map module - color scales, layer geometry, styling and the layer controller

mod controller;
mod geometry;
mod palette;
mod renderer;
mod style;
pub mod tooltip;

pub use controller::{LayerController, LayerState, LoadStatus, SearchHit};
pub use geometry::{
    GeometryError, GeometryLocation, GeometrySource, Layer, LayerGeometry, MapFeature,
    StaticGeometrySource,
};
pub use palette::{color_for_value, Color, Legend, Palette, BLUES};
pub use renderer::{MapRenderer, RenderError};
pub use style::{style_for, FeatureStyle, ValueIndex};
