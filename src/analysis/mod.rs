//! Pure transformations from API records to display-ready values

pub mod chart_series;

pub use chart_series::{percent_change, round_to, to_chart_series};
