//! Data Aggregator Module
//! Read-only lookups over one loaded dataset: available years, per-year slices with
//! statistics, entity name resolution and per-entity history.

use crate::data::loader::{DataLoader, LoaderError};
use crate::data::names::fold_whitespace_case;
use crate::data::parameters::{Parameter, ParameterGroup};
use crate::data::record::{Cell, DatasetKind, RawRow};
use crate::stats::{Statistics, StatsCalculator};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{debug, info};

/// Source field -> ascending, duplicate-free years with at least one valid value.
pub type AvailableYears = BTreeMap<String, Vec<i32>>;

/// One entity's value in a (parameter, year) slice.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityValue {
    pub entity_name: String,
    pub value: Option<f64>,
}

/// A (parameter, year) slice in row order plus statistics over its valid values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityData {
    pub data: Vec<EntityValue>,
    pub stats: Statistics,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct YearValue {
    pub year: i32,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParametersAndYears {
    pub parameter_groups: &'static [ParameterGroup],
    pub available_years: AvailableYears,
}

/// Immutable snapshot of one CSV dataset.
#[derive(Debug, Clone)]
pub struct Aggregator {
    kind: DatasetKind,
    rows: Vec<RawRow>,
    available_years: AvailableYears,
    entities: Vec<String>,
}

impl Aggregator {
    /// Load `path` and derive the indexes. Fails if the file cannot be served at all.
    pub fn initialize(path: &Path, kind: DatasetKind) -> Result<Self, LoaderError> {
        let rows = DataLoader::load_csv(path, kind)?;
        let aggregator = Self::from_rows(kind, rows);
        info!(
            dataset = ?kind,
            records = aggregator.rows.len(),
            entities = aggregator.entities.len(),
            "data initialized"
        );
        Ok(aggregator)
    }

    pub fn from_rows(kind: DatasetKind, rows: Vec<RawRow>) -> Self {
        let available_years = Self::index_available_years(kind, &rows);
        let entities = Self::index_entities(&rows);
        Self {
            kind,
            rows,
            available_years,
            entities,
        }
    }

    fn index_available_years(kind: DatasetKind, rows: &[RawRow]) -> AvailableYears {
        kind.parameters()
            .map(|param| {
                let years: BTreeSet<i32> = rows
                    .iter()
                    .filter(|row| row.value(param.id).is_some())
                    .map(|row| row.year)
                    .collect();
                (param.source_field.to_string(), years.into_iter().collect())
            })
            .collect()
    }

    fn index_entities(rows: &[RawRow]) -> Vec<String> {
        rows.iter()
            .map(|row| row.entity.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn kind(&self) -> DatasetKind {
        self.kind
    }

    pub fn rows(&self) -> &[RawRow] {
        &self.rows
    }

    pub fn list_parameters_and_years(&self) -> ParametersAndYears {
        ParametersAndYears {
            parameter_groups: self.kind.parameter_groups(),
            available_years: self.available_years.clone(),
        }
    }

    pub fn available_years_for(&self, field: &str) -> &[i32] {
        self.available_years
            .get(field)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Cell of `field` in `row`: a configured parameter or an unconfigured column.
    fn cell<'a>(&self, row: &'a RawRow, field: &str) -> Option<&'a Cell> {
        match self.kind.parameter_by_field(field) {
            Some(param) => Some(row.indicator(param.id)),
            None => row.extra(field),
        }
    }

    /// Values of `field` for every row of `year`, in file order, plus their statistics.
    pub fn get_entity_data(&self, field: &str, year: i32) -> EntityData {
        let data: Vec<EntityValue> = self
            .rows
            .iter()
            .filter(|row| row.year == year)
            .map(|row| EntityValue {
                entity_name: row.entity.clone(),
                value: self.cell(row, field).and_then(Cell::as_value),
            })
            .collect();

        let stats = StatsCalculator::compute_statistics_present(data.iter().map(|d| d.value));
        EntityData { data, stats }
    }

    /// Unique entity names, sorted.
    pub fn get_all_entity_names(&self) -> &[String] {
        &self.entities
    }

    /// Case- and whitespace-insensitive name lookup with a word-subset fallback.
    ///
    /// Candidates are walked in sorted order and the first partial match wins.
    pub fn find_entity_by_name(&self, query: &str) -> Option<&str> {
        let wanted = fold_whitespace_case(query);
        if wanted.is_empty() {
            return None;
        }

        if let Some(exact) = self
            .entities
            .iter()
            .find(|name| fold_whitespace_case(name) == wanted)
        {
            return Some(exact);
        }

        let candidates = self.partial_matches(&wanted);
        if candidates.len() > 1 {
            debug!(query, candidates = ?candidates, "ambiguous entity name, taking first");
        }
        candidates.first().copied()
    }

    /// Every entity the word-subset rule accepts for `query`, in sorted order.
    pub fn find_entity_candidates(&self, query: &str) -> Vec<&str> {
        let wanted = fold_whitespace_case(query);
        if wanted.is_empty() {
            return Vec::new();
        }
        self.partial_matches(&wanted)
    }

    /// Word-subset matches. Region names additionally match by whole-string containment
    /// in either direction, so "Pomurska regija 2020" still finds "Pomurska".
    fn partial_matches(&self, wanted: &str) -> Vec<&str> {
        let query_words: Vec<&str> = wanted.split(' ').collect();
        let contains_whole = self.kind == DatasetKind::Regions;
        self.entities
            .iter()
            .filter(|name| {
                let folded = fold_whitespace_case(name);
                if contains_whole && (folded.contains(wanted) || wanted.contains(&folded)) {
                    return true;
                }
                let name_words: Vec<&str> = folded.split(' ').collect();
                query_words
                    .iter()
                    .all(|q| name_words.iter().any(|w| w.contains(q) || q.contains(w)))
            })
            .map(String::as_str)
            .collect()
    }

    /// Match a parameter by id key, then by source field, then by containment.
    pub fn resolve_parameter(&self, query: &str) -> Option<&'static Parameter> {
        let wanted = query.trim().to_lowercase();
        if wanted.is_empty() {
            return None;
        }
        let params: Vec<&'static Parameter> = self.kind.parameters().collect();

        params
            .iter()
            .find(|p| p.id.key().to_lowercase() == wanted)
            .or_else(|| {
                params
                    .iter()
                    .find(|p| p.source_field.to_lowercase() == wanted)
            })
            .or_else(|| {
                params.iter().find(|p| {
                    let field = p.source_field.to_lowercase();
                    field.contains(&wanted) || wanted.contains(&field)
                })
            })
            .copied()
    }

    /// One point per available year of the parameter; years without a row are `None`.
    pub fn get_parameter_history(&self, entity: &str, field: &str) -> Vec<YearValue> {
        let Some(param) = self.resolve_parameter(field) else {
            return Vec::new();
        };

        self.available_years_for(param.source_field)
            .iter()
            .map(|&year| YearValue {
                year,
                value: self
                    .rows
                    .iter()
                    .find(|row| row.year == year && row.entity == entity)
                    .and_then(|row| row.value(param.id)),
            })
            .collect()
    }

    /// History of every configured parameter for one entity, keyed by source field.
    pub fn get_all_parameters_history(&self, entity: &str) -> BTreeMap<String, Vec<YearValue>> {
        self.kind
            .parameters()
            .map(|param| {
                (
                    param.source_field.to_string(),
                    self.get_parameter_history(entity, param.source_field),
                )
            })
            .collect()
    }
}

/// The available year nearest to `target`; ties go to the earlier year.
pub fn closest_year(years: &[i32], target: i32) -> Option<i32> {
    years.iter().copied().reduce(|best, year| {
        if year.abs_diff(target) < best.abs_diff(target) {
            year
        } else {
            best
        }
    })
}
