//! Static Map Renderer
//! Draws styled features and a legend strip into a PNG.
//!
//! Layout:
//! 1. Map area: features projected linearly from lon/lat, aspect preserved
//! 2. Legend strip along the bottom: palette swatches from low to high

use crate::map::geometry::MapFeature;
use crate::map::palette::{Color, Legend};
use crate::map::style::FeatureStyle;
use image::{ImageFormat, RgbImage};
use plotters::prelude::{
    BitMapBackend, Color as _, IntoDrawingArea, PathElement, Polygon, RGBColor, Rectangle, WHITE,
};
use std::io::Cursor;
use thiserror::Error;
use tracing::debug;

const MARGIN: i32 = 10;
const LEGEND_H: i32 = 24;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Image size {0}x{1} is too small")]
    TooSmall(u32, u32),
    #[error("Nothing to draw: no feature has coordinates")]
    Empty,
    #[error("Drawing failed: {0}")]
    Draw(String),
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

fn rgb(color: Color) -> RGBColor {
    RGBColor(color.r, color.g, color.b)
}

/// Linear lon/lat -> pixel mapping that fits the bounds into the map area.
struct Projection {
    min_lon: f64,
    max_lat: f64,
    scale: f64,
    offset: (f64, f64),
}

impl Projection {
    fn fit(bounds: (f64, f64, f64, f64), width: i32, height: i32) -> Self {
        let (min_lon, min_lat, max_lon, max_lat) = bounds;
        let span_x = (max_lon - min_lon).max(f64::EPSILON);
        let span_y = (max_lat - min_lat).max(f64::EPSILON);
        let scale = (width as f64 / span_x).min(height as f64 / span_y);
        let offset = (
            MARGIN as f64 + (width as f64 - span_x * scale) / 2.0,
            MARGIN as f64 + (height as f64 - span_y * scale) / 2.0,
        );
        Self {
            min_lon,
            max_lat,
            scale,
            offset,
        }
    }

    fn project(&self, [lon, lat]: [f64; 2]) -> (i32, i32) {
        (
            (self.offset.0 + (lon - self.min_lon) * self.scale).round() as i32,
            (self.offset.1 + (self.max_lat - lat) * self.scale).round() as i32,
        )
    }
}

pub struct MapRenderer;

impl MapRenderer {
    /// Render `features` with their styles and an optional legend to PNG bytes.
    pub fn render_png(
        features: &[(MapFeature, FeatureStyle)],
        legend: Option<&Legend>,
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, RenderError> {
        let map_w = width as i32 - 2 * MARGIN;
        let map_h = height as i32 - 3 * MARGIN - LEGEND_H;
        if map_w <= 0 || map_h <= 0 {
            return Err(RenderError::TooSmall(width, height));
        }

        let bounds = Self::bounds(features).ok_or(RenderError::Empty)?;
        let projection = Projection::fit(bounds, map_w, map_h);

        let mut buffer = vec![0u8; width as usize * height as usize * 3];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            let draw_err = |e: &dyn std::fmt::Display| RenderError::Draw(e.to_string());
            root.fill(&WHITE).map_err(|e| draw_err(&e))?;

            for (feature, style) in features {
                for polygon in &feature.polygons {
                    let Some(exterior) = polygon.first() else {
                        continue;
                    };
                    let points: Vec<(i32, i32)> =
                        exterior.iter().map(|&p| projection.project(p)).collect();
                    root.draw(&Polygon::new(
                        points.clone(),
                        rgb(style.fill).mix(style.fill_opacity).filled(),
                    ))
                    .map_err(|e| draw_err(&e))?;
                    root.draw(&PathElement::new(
                        points,
                        rgb(style.stroke)
                            .mix(style.opacity)
                            .stroke_width(style.weight.round() as u32),
                    ))
                    .map_err(|e| draw_err(&e))?;
                }
            }

            if let Some(legend) = legend {
                let top = height as i32 - MARGIN - LEGEND_H;
                let n = legend.swatches.len().max(1) as i32;
                let swatch_w = (width as i32 - 2 * MARGIN) / n;
                for (i, color) in legend.swatches.iter().enumerate() {
                    let x = MARGIN + i as i32 * swatch_w;
                    root.draw(&Rectangle::new(
                        [(x, top), (x + swatch_w, top + LEGEND_H)],
                        rgb(*color).filled(),
                    ))
                    .map_err(|e| draw_err(&e))?;
                }
            }

            root.present().map_err(|e| draw_err(&e))?;
        }

        let image = RgbImage::from_raw(width, height, buffer)
            .ok_or(RenderError::TooSmall(width, height))?;
        let mut png = Vec::new();
        image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
        debug!(features = features.len(), bytes = png.len(), "rendered map snapshot");
        Ok(png)
    }

    fn bounds(features: &[(MapFeature, FeatureStyle)]) -> Option<(f64, f64, f64, f64)> {
        features
            .iter()
            .filter_map(|(feature, _)| feature.bounds())
            .reduce(|a, b| (a.0.min(b.0), a.1.min(b.1), a.2.max(b.2), a.3.max(b.3)))
    }
}
