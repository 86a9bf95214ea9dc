//! Stats module - summary statistics and rankings

mod calculator;
mod ranking;

pub use calculator::{Statistics, StatsCalculator};
pub use ranking::{rank, RankingMode};
