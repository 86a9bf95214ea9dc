//! CSV Data Loader Module
//! Reads a municipality or region CSV into typed row records using Polars.

use crate::data::record::{Cell, DatasetKind, ParameterId, RawRow, YEAR_COLUMN};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Cannot read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("Missing required column `{0}`")]
    MissingColumn(&'static str),
    #[error("Malformed row {row}: {reason}")]
    MalformedRow { row: usize, reason: String },
}

/// Where a CSV column ends up in a [`RawRow`].
#[derive(Debug, Clone, PartialEq)]
enum ColumnRole {
    Entity,
    Year,
    Indicator(ParameterId),
    Extra(String),
}

/// Handles CSV file loading with Polars.
pub struct DataLoader;

impl DataLoader {
    /// Load every record of `path`. Any failure here is fatal for the dataset.
    pub fn load_csv(path: &Path, kind: DatasetKind) -> Result<Vec<RawRow>, LoaderError> {
        std::fs::metadata(path).map_err(|source| LoaderError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;

        // Zero-row inference keeps every column as a string; numeric detection is per cell.
        let df = LazyCsvReader::new(path)
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .finish()?
            .collect()?;

        let rows = Self::rows_from_dataframe(&df, kind)?;
        info!(
            path = %path.display(),
            rows = rows.len(),
            dataset = ?kind,
            "loaded CSV"
        );
        Ok(rows)
    }

    /// Convert an all-string DataFrame into row records.
    pub fn rows_from_dataframe(
        df: &DataFrame,
        kind: DatasetKind,
    ) -> Result<Vec<RawRow>, LoaderError> {
        let roles = Self::column_roles(df, kind)?;
        let columns: Vec<&StringChunked> = df
            .get_columns()
            .iter()
            .map(|col| col.as_materialized_series().str())
            .collect::<PolarsResult<_>>()?;

        let mut rows = Vec::with_capacity(df.height());
        for i in 0..df.height() {
            // Header is line 1, so data rows start at line 2.
            let line = i + 2;
            let mut entity: Option<String> = None;
            let mut year: Option<i32> = None;
            let mut indicators: Vec<(ParameterId, Cell)> = Vec::new();
            let mut extras: Vec<(String, Cell)> = Vec::new();
            let mut has_data = false;

            for (role, column) in roles.iter().zip(columns.iter()) {
                let raw = column.get(i);
                has_data |= raw.is_some_and(|s| !s.trim().is_empty());
                match role {
                    ColumnRole::Entity => {
                        entity = raw.map(str::trim).filter(|s| !s.is_empty()).map(String::from);
                    }
                    ColumnRole::Year => year = raw.and_then(parse_year),
                    ColumnRole::Indicator(id) => indicators.push((*id, Cell::parse(raw))),
                    ColumnRole::Extra(name) => extras.push((name.clone(), Cell::parse(raw))),
                }
            }

            if !has_data {
                debug!(row = line, "skipping blank line");
                continue;
            }

            let entity = entity.ok_or_else(|| LoaderError::MalformedRow {
                row: line,
                reason: format!("empty `{}` cell", kind.entity_column()),
            })?;
            let year = year.ok_or_else(|| LoaderError::MalformedRow {
                row: line,
                reason: format!("`{}` is not a year", YEAR_COLUMN),
            })?;

            let mut row = RawRow::new(entity, year);
            for (id, cell) in indicators {
                row.set_indicator(id, cell);
            }
            for (name, cell) in extras {
                row.set_extra(name, cell);
            }
            rows.push(row);
        }

        Ok(rows)
    }

    fn column_roles(df: &DataFrame, kind: DatasetKind) -> Result<Vec<ColumnRole>, LoaderError> {
        let roles: Vec<ColumnRole> = df
            .get_column_names()
            .iter()
            .map(|name| {
                let name = name.trim();
                if name == kind.entity_column() {
                    ColumnRole::Entity
                } else if name == YEAR_COLUMN {
                    ColumnRole::Year
                } else if let Some(param) = kind.parameter_by_field(name) {
                    ColumnRole::Indicator(param.id)
                } else {
                    ColumnRole::Extra(name.to_string())
                }
            })
            .collect();

        if !roles.contains(&ColumnRole::Entity) {
            return Err(LoaderError::MissingColumn(kind.entity_column()));
        }
        if !roles.contains(&ColumnRole::Year) {
            return Err(LoaderError::MissingColumn(YEAR_COLUMN));
        }

        let extra: Vec<&str> = roles
            .iter()
            .filter_map(|role| match role {
                ColumnRole::Extra(name) => Some(name.as_str()),
                _ => None,
            })
            .collect();
        if !extra.is_empty() {
            debug!(columns = ?extra, "columns outside the parameter configuration");
        }

        Ok(roles)
    }
}

/// Years come through as `2021` or occasionally `2021.0`.
fn parse_year(raw: &str) -> Option<i32> {
    let trimmed = raw.trim();
    if let Ok(year) = trimmed.parse::<i32>() {
        return Some(year);
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|y| y.fract() == 0.0 && (i32::MIN as f64..=i32::MAX as f64).contains(y))
        .map(|y| y as i32)
}
