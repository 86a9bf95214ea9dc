//! Obcine Map - Slovenian municipal & regional statistics
//!
//! CSV aggregation with per-year statistics and fuzzy name lookup, plus the
//! zoom-driven choropleth layer controller that colors municipalities and regions.

pub mod config;
pub mod data;
pub mod map;
pub mod service;
pub mod stats;
