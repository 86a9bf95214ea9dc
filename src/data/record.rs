//! Row records parsed from the statistics CSV files.
//!
//! Known indicator columns live in a fixed array indexed by [`ParameterId`]; anything the
//! parameter configuration does not know about is kept in a side-table so schema drift
//! is visible instead of silently merged.

use serde::Serialize;
use std::collections::BTreeMap;

/// CSV marker for a statistically suppressed value.
pub const SUPPRESSED: &str = "z";

/// Year column shared by both datasets.
pub const YEAR_COLUMN: &str = "leto";

/// The fifteen indicators published for municipalities and regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ParameterId {
    GrossIncome,
    IncomeFromWork,
    ParentalFamilySocialBenefits,
    Pensions,
    PropertyCapitalOtherIncome,
    EducationTotal,
    Tertiary,
    UpperSecondary,
    BasicOrLess,
    LabourMigrationIndex,
    LabourMigrationIndexMen,
    LabourMigrationIndexWomen,
    PersonsInEmploymentLocalRes,
    PersonsInEmploymentLocalResMen,
    PersonsInEmploymentLocalResWomen,
}

impl ParameterId {
    pub const COUNT: usize = 15;

    pub const ALL: [ParameterId; Self::COUNT] = [
        ParameterId::GrossIncome,
        ParameterId::IncomeFromWork,
        ParameterId::ParentalFamilySocialBenefits,
        ParameterId::Pensions,
        ParameterId::PropertyCapitalOtherIncome,
        ParameterId::EducationTotal,
        ParameterId::Tertiary,
        ParameterId::UpperSecondary,
        ParameterId::BasicOrLess,
        ParameterId::LabourMigrationIndex,
        ParameterId::LabourMigrationIndexMen,
        ParameterId::LabourMigrationIndexWomen,
        ParameterId::PersonsInEmploymentLocalRes,
        ParameterId::PersonsInEmploymentLocalResMen,
        ParameterId::PersonsInEmploymentLocalResWomen,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Stable camelCase key, identical to the serialized form.
    pub fn key(self) -> &'static str {
        match self {
            ParameterId::GrossIncome => "grossIncome",
            ParameterId::IncomeFromWork => "incomeFromWork",
            ParameterId::ParentalFamilySocialBenefits => "parentalFamilySocialBenefits",
            ParameterId::Pensions => "pensions",
            ParameterId::PropertyCapitalOtherIncome => "propertyCapitalOtherIncome",
            ParameterId::EducationTotal => "educationTotal",
            ParameterId::Tertiary => "tertiary",
            ParameterId::UpperSecondary => "upperSecondary",
            ParameterId::BasicOrLess => "basicOrLess",
            ParameterId::LabourMigrationIndex => "labourMigrationIndex",
            ParameterId::LabourMigrationIndexMen => "labourMigrationIndexMen",
            ParameterId::LabourMigrationIndexWomen => "labourMigrationIndexWomen",
            ParameterId::PersonsInEmploymentLocalRes => "personsInEmploymentLocalRes",
            ParameterId::PersonsInEmploymentLocalResMen => "personsInEmploymentLocalResMen",
            ParameterId::PersonsInEmploymentLocalResWomen => "personsInEmploymentLocalResWomen",
        }
    }
}

/// Which of the two parallel CSV datasets a table holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    Municipalities,
    Regions,
}

impl DatasetKind {
    /// Header of the entity-name column.
    pub fn entity_column(self) -> &'static str {
        match self {
            DatasetKind::Municipalities => "obcina",
            DatasetKind::Regions => "regija",
        }
    }
}

/// A single CSV cell after numeric detection.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Number(f64),
    Text(String),
}

impl Cell {
    /// Classify a raw cell: a fully numeric literal becomes a number, anything else text.
    pub fn parse(raw: Option<&str>) -> Cell {
        let Some(raw) = raw else {
            return Cell::Empty;
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Cell::Empty;
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => Cell::Number(n),
            _ => Cell::Text(raw.to_string()),
        }
    }

    /// Numeric value, or `None` for empty, suppressed or non-numeric cells.
    pub fn as_value(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Empty | Cell::Text(_) => None,
        }
    }

    pub fn is_suppressed(&self) -> bool {
        matches!(self, Cell::Text(t) if t.trim() == SUPPRESSED)
    }
}

/// One (entity, year) record.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub entity: String,
    pub year: i32,
    indicators: [Cell; ParameterId::COUNT],
    extra: BTreeMap<String, Cell>,
}

impl RawRow {
    pub fn new(entity: impl Into<String>, year: i32) -> Self {
        Self {
            entity: entity.into(),
            year,
            indicators: std::array::from_fn(|_| Cell::Empty),
            extra: BTreeMap::new(),
        }
    }

    pub fn indicator(&self, id: ParameterId) -> &Cell {
        &self.indicators[id.index()]
    }

    pub fn set_indicator(&mut self, id: ParameterId, cell: Cell) {
        self.indicators[id.index()] = cell;
    }

    pub fn extra(&self, column: &str) -> Option<&Cell> {
        self.extra.get(column)
    }

    pub fn set_extra(&mut self, column: impl Into<String>, cell: Cell) {
        self.extra.insert(column.into(), cell);
    }

    /// Names of columns the parameter configuration does not cover.
    pub fn extra_columns(&self) -> impl Iterator<Item = &str> {
        self.extra.keys().map(String::as_str)
    }

    pub fn value(&self, id: ParameterId) -> Option<f64> {
        self.indicator(id).as_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_parse() {
        assert_eq!(Cell::parse(None), Cell::Empty);
        assert_eq!(Cell::parse(Some("  ")), Cell::Empty);
        assert_eq!(Cell::parse(Some("1523.4")), Cell::Number(1523.4));
        assert_eq!(Cell::parse(Some(" 12 ")), Cell::Number(12.0));
        assert_eq!(Cell::parse(Some("z")), Cell::Text("z".to_string()));
        assert_eq!(Cell::parse(Some("12a")), Cell::Text("12a".to_string()));
        assert!(matches!(Cell::parse(Some("inf")), Cell::Text(_)));
    }

    #[test]
    fn test_suppressed_cells_have_no_value() {
        let cell = Cell::parse(Some("z"));
        assert!(cell.is_suppressed());
        assert_eq!(cell.as_value(), None);
        assert_eq!(Cell::Text("n/a".into()).as_value(), None);
    }

    #[test]
    fn test_row_indicators_and_extras() {
        let mut row = RawRow::new("Ajdovščina", 2020);
        row.set_indicator(ParameterId::Pensions, Cell::Number(410.0));
        row.set_extra("Population", Cell::Number(19000.0));

        assert_eq!(row.value(ParameterId::Pensions), Some(410.0));
        assert_eq!(row.value(ParameterId::GrossIncome), None);
        assert_eq!(row.extra("Population"), Some(&Cell::Number(19000.0)));
        assert_eq!(row.extra_columns().collect::<Vec<_>>(), vec!["Population"]);
    }

    #[test]
    fn test_parameter_ids_are_dense() {
        for (i, id) in ParameterId::ALL.iter().enumerate() {
            assert_eq!(id.index(), i);
        }
        assert_eq!(
            serde_json::to_string(&ParameterId::LabourMigrationIndexMen).unwrap(),
            format!("\"{}\"", ParameterId::LabourMigrationIndexMen.key())
        );
    }
}
