//! Slovenian number formatting for tooltips and legend labels.

use crate::data::Unit;
use crate::map::palette::Legend;

/// Shown in place of a missing value.
pub const NO_DATA: &str = "Ni podatka";

/// Format with `.` thousands grouping, `,` decimals and at most two fraction digits.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    let negative = value < 0.0 && (int_part != "0" || !frac_part.is_empty());
    let sign = if negative { "-" } else { "" };
    if frac_part.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped},{frac_part}")
    }
}

/// Value with its unit suffix, or [`NO_DATA`].
pub fn format_value(value: Option<f64>, unit: Unit) -> String {
    match (value, unit) {
        (None, _) => NO_DATA.to_string(),
        (Some(v), Unit::Euro) => format!("{} €", format_number(v)),
        (Some(v), _) => format_number(v),
    }
}

/// Tooltip body for one map feature: `name` on the first line, then the value line.
pub fn tooltip_text(name: &str, parameter: &str, value: Option<f64>, unit: Unit) -> String {
    match value {
        Some(_) => format!("{name}\n{parameter}: {}", format_value(value, unit)),
        None => format!("{name}\n{NO_DATA}"),
    }
}

/// Legend labels for min, midpoint and max. Monetary labels are rounded to whole euros.
pub fn legend_labels(legend: &Legend, unit: Unit) -> [String; 3] {
    let label = |v: f64| match unit {
        Unit::Euro => format!("{}€", format_number(v.round())),
        _ => format_number(v),
    };
    [label(legend.min), label(legend.mid), label(legend.max)]
}
