//! Top / bottom / around-median rankings of a (parameter, year) slice.

use crate::data::EntityValue;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RankingMode {
    #[default]
    Top,
    Bottom,
    AroundMedian,
}

/// Pick `count` entities from `data` according to `mode`. Missing values never rank.
///
/// `AroundMedian` walks the values in descending order and centres the window on the
/// first value not above `median`; without a median it yields nothing.
pub fn rank(
    data: &[EntityValue],
    mode: RankingMode,
    count: usize,
    median: Option<f64>,
) -> Vec<EntityValue> {
    let mut valid: Vec<&EntityValue> = data.iter().filter(|item| item.value.is_some()).collect();
    // Stable sort keeps insertion order among equal values.
    valid.sort_by(|a, b| {
        b.value
            .unwrap_or_default()
            .total_cmp(&a.value.unwrap_or_default())
    });

    let picked: Vec<&EntityValue> = match mode {
        RankingMode::Top => valid.into_iter().take(count).collect(),
        RankingMode::Bottom => valid.into_iter().rev().take(count).collect(),
        RankingMode::AroundMedian => {
            let Some(median) = median else {
                return Vec::new();
            };
            let pivot = valid
                .iter()
                .position(|item| item.value.is_some_and(|v| v <= median))
                .unwrap_or(0);
            let start = pivot.saturating_sub(count / 2);
            valid.into_iter().skip(start).take(count).collect()
        }
    };

    picked.into_iter().cloned().collect()
}
