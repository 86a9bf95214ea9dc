//! Data module - CSV loading, parameter configuration and aggregation

mod aggregator;
mod loader;
pub mod names;
mod parameters;
mod record;

pub use aggregator::{
    closest_year, Aggregator, AvailableYears, EntityData, EntityValue, ParametersAndYears,
    YearValue,
};
pub use loader::{DataLoader, LoaderError};
pub use parameters::{Parameter, ParameterGroup, Unit, MUNICIPALITY_GROUPS, REGION_GROUPS};
pub use record::{Cell, DatasetKind, ParameterId, RawRow, SUPPRESSED, YEAR_COLUMN};
