//! Query Service
//! The three queries the web front end consumes, over both datasets.

use crate::config::DataConfig;
use crate::data::{
    Aggregator, DatasetKind, EntityData, EntityValue, LoaderError, ParametersAndYears, YearValue,
};
use crate::stats::{rank, RankingMode};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug, PartialEq)]
pub enum QueryError {
    #[error("Invalid input: {0}")]
    InvalidInput(&'static str),
    #[error("Entity not found: {requested}")]
    EntityNotFound { requested: String },
}

pub type ParametersResponse = ParametersAndYears;
pub type DataResponse = EntityData;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    /// Canonical name the request resolved to.
    pub entity_name: String,
    pub requested_entity: String,
    pub parameter: String,
    pub data: Vec<YearValue>,
    pub total_records: usize,
}

/// Both datasets, loaded once and read-only afterwards.
#[derive(Debug, Clone)]
pub struct AtlasService {
    municipalities: Aggregator,
    regions: Aggregator,
}

impl AtlasService {
    pub fn initialize(config: &DataConfig) -> Result<Self, LoaderError> {
        let municipalities =
            Aggregator::initialize(&config.municipalities_csv, DatasetKind::Municipalities)?;
        let regions = Aggregator::initialize(&config.regions_csv, DatasetKind::Regions)?;
        info!("query service ready");
        Ok(Self::new(municipalities, regions))
    }

    pub fn new(municipalities: Aggregator, regions: Aggregator) -> Self {
        Self {
            municipalities,
            regions,
        }
    }

    pub fn dataset(&self, kind: DatasetKind) -> &Aggregator {
        match kind {
            DatasetKind::Municipalities => &self.municipalities,
            DatasetKind::Regions => &self.regions,
        }
    }

    pub fn parameters(&self, kind: DatasetKind) -> ParametersResponse {
        self.dataset(kind).list_parameters_and_years()
    }

    pub fn entities(&self, kind: DatasetKind) -> &[String] {
        self.dataset(kind).get_all_entity_names()
    }

    pub fn data(
        &self,
        kind: DatasetKind,
        parameter: &str,
        year: i32,
    ) -> Result<DataResponse, QueryError> {
        if parameter.trim().is_empty() {
            return Err(QueryError::InvalidInput("parameter must not be empty"));
        }
        Ok(self.dataset(kind).get_entity_data(parameter.trim(), year))
    }

    /// `count` entities of a slice picked by `mode`.
    pub fn ranking(
        &self,
        kind: DatasetKind,
        parameter: &str,
        year: i32,
        mode: RankingMode,
        count: usize,
    ) -> Result<Vec<EntityValue>, QueryError> {
        let slice = self.data(kind, parameter, year)?;
        Ok(rank(&slice.data, mode, count, slice.stats.median))
    }

    /// Every available year of `parameter` for the entity `requested` resolves to.
    pub fn history(
        &self,
        kind: DatasetKind,
        requested: &str,
        parameter: &str,
    ) -> Result<HistoryResponse, QueryError> {
        if requested.trim().is_empty() {
            return Err(QueryError::InvalidInput("entity must not be empty"));
        }
        if parameter.trim().is_empty() {
            return Err(QueryError::InvalidInput("parameter must not be empty"));
        }

        let dataset = self.dataset(kind);
        let entity = dataset
            .find_entity_by_name(requested)
            .ok_or_else(|| QueryError::EntityNotFound {
                requested: requested.to_string(),
            })?;
        debug!(requested, entity, "resolved entity");

        let data = dataset.get_parameter_history(entity, parameter);
        Ok(HistoryResponse {
            entity_name: entity.to_string(),
            requested_entity: requested.to_string(),
            parameter: parameter.to_string(),
            total_records: data.len(),
            data,
        })
    }
}
