//! Static parameter grouping shown in the parameter picker.

use crate::data::record::{DatasetKind, ParameterId};
use serde::Serialize;

/// Display unit attached to a parameter's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Euro,
    People,
    None,
}

/// A named statistical measure and the CSV column it is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub id: ParameterId,
    pub display_name: &'static str,
    pub source_field: &'static str,
    pub unit: Unit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParameterGroup {
    pub id: &'static str,
    pub name: &'static str,
    pub parameters: &'static [Parameter],
}

const fn param(
    id: ParameterId,
    display_name: &'static str,
    source_field: &'static str,
    unit: Unit,
) -> Parameter {
    Parameter {
        id,
        display_name,
        source_field,
        unit,
    }
}

const INCOME: &[Parameter] = &[
    param(ParameterId::GrossIncome, "Bruto dohodek - SKUPAJ", "Gross income - TOTAL", Unit::Euro),
    param(ParameterId::IncomeFromWork, "Dohodek iz dela", "Income from work", Unit::Euro),
    param(
        ParameterId::ParentalFamilySocialBenefits,
        "Starševski, družinski in socialni prejemki",
        "Parental, family and social benefits",
        Unit::Euro,
    ),
    param(ParameterId::Pensions, "Pokojnine", "Pensions", Unit::Euro),
    param(
        ParameterId::PropertyCapitalOtherIncome,
        "Dohodek iz premoženja, kapitala in drugi",
        "Property, capital and other income",
        Unit::Euro,
    ),
];

const EDUCATION: &[Parameter] = &[
    param(ParameterId::EducationTotal, "Izobrazba - SKUPAJ", "Education - TOTAL", Unit::People),
    param(ParameterId::Tertiary, "Terciarna izobrazba", "Tertiary", Unit::People),
    param(ParameterId::UpperSecondary, "Srednješolska izobrazba", "Upper secondary", Unit::People),
    param(ParameterId::BasicOrLess, "Osnovnošolska ali manj", "Basic or less", Unit::People),
];

const MIGRATION: &[Parameter] = &[
    param(
        ParameterId::LabourMigrationIndex,
        "Indeks delovne migracije",
        "Labour migration index",
        Unit::None,
    ),
    param(
        ParameterId::LabourMigrationIndexMen,
        "Indeks delovne migracije - moški",
        "Labour migration index - men",
        Unit::None,
    ),
    param(
        ParameterId::LabourMigrationIndexWomen,
        "Indeks delovne migracije - ženske",
        "Labour migration index - women",
        Unit::None,
    ),
];

const EMPLOYMENT_MUNICIPALITIES: &[Parameter] = &[
    param(
        ParameterId::PersonsInEmploymentLocalRes,
        "Delovno aktivni v občini prebivališča",
        "Persons in employment [excluding farmers] whose workplace is in the municipality of their residence",
        Unit::People,
    ),
    param(
        ParameterId::PersonsInEmploymentLocalResMen,
        "Delovno aktivni v občini prebivališča - moški",
        "Persons in employment [excluding farmers] whose workplace is in the municipality of their residence - men",
        Unit::People,
    ),
    param(
        ParameterId::PersonsInEmploymentLocalResWomen,
        "Delovno aktivni v občini prebivališča - ženske",
        "Persons in employment [excluding farmers] whose workplace is in the municipality of their residence - women",
        Unit::People,
    ),
];

const EMPLOYMENT_REGIONS: &[Parameter] = &[
    param(
        ParameterId::PersonsInEmploymentLocalRes,
        "Delovno aktivni v regiji prebivališča",
        "Persons in employment [excluding farmers] whose workplace is in the statistical region of their residence",
        Unit::People,
    ),
    param(
        ParameterId::PersonsInEmploymentLocalResMen,
        "Delovno aktivni v regiji prebivališča - moški",
        "Persons in employment [excluding farmers] whose workplace is in the statistical region of their residence - men",
        Unit::People,
    ),
    param(
        ParameterId::PersonsInEmploymentLocalResWomen,
        "Delovno aktivni v regiji prebivališča - ženske",
        "Persons in employment [excluding farmers] whose workplace is in the statistical region of their residence - women",
        Unit::People,
    ),
];

pub static MUNICIPALITY_GROUPS: &[ParameterGroup] = &[
    ParameterGroup {
        id: "income",
        name: "Prihodki",
        parameters: INCOME,
    },
    ParameterGroup {
        id: "education",
        name: "Izobrazba",
        parameters: EDUCATION,
    },
    ParameterGroup {
        id: "migration",
        name: "Migracije",
        parameters: MIGRATION,
    },
    ParameterGroup {
        id: "employment",
        name: "Zaposlitev",
        parameters: EMPLOYMENT_MUNICIPALITIES,
    },
];

pub static REGION_GROUPS: &[ParameterGroup] = &[
    ParameterGroup {
        id: "income",
        name: "Prihodki",
        parameters: INCOME,
    },
    ParameterGroup {
        id: "education",
        name: "Izobrazba",
        parameters: EDUCATION,
    },
    ParameterGroup {
        id: "migration",
        name: "Migracije",
        parameters: MIGRATION,
    },
    ParameterGroup {
        id: "employment",
        name: "Zaposlitev",
        parameters: EMPLOYMENT_REGIONS,
    },
];

impl DatasetKind {
    pub fn parameter_groups(self) -> &'static [ParameterGroup] {
        match self {
            DatasetKind::Municipalities => MUNICIPALITY_GROUPS,
            DatasetKind::Regions => REGION_GROUPS,
        }
    }

    /// Every configured parameter, in group order.
    pub fn parameters(self) -> impl Iterator<Item = &'static Parameter> {
        self.parameter_groups()
            .iter()
            .flat_map(|group| group.parameters.iter())
    }

    /// Exact source-field lookup.
    pub fn parameter_by_field(self, field: &str) -> Option<&'static Parameter> {
        self.parameters().find(|p| p.source_field == field)
    }

    pub fn parameter(self, id: ParameterId) -> Option<&'static Parameter> {
        self.parameters().find(|p| p.id == id)
    }
}
