use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

use crate::constants::{RSI_OVERBOUGHT, RSI_OVERSOLD};

/// One display-ready point of the price/indicator chart
///
/// Prices are rounded to 2 decimals and RSI to 1. Missing indicators stay
/// `None`; they are never filled with zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub date: NaiveDate,
    pub close: f64,
    pub sma20: Option<f64>,
    pub sma50: Option<f64>,
    pub rsi: Option<f64>,
    pub volume: f64,
}

/// Chart points in ascending date order
///
/// Always derived from a list of indicator records and rebuilt whenever that
/// list changes; it is never cached on its own.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct ChartSeries {
    pub points: Vec<ChartPoint>,
}

impl ChartSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn latest(&self) -> Option<&ChartPoint> {
        self.points.last()
    }
}

/// Where an RSI reading falls relative to the 30/70 bands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RsiZone {
    Oversold,
    Neutral,
    Overbought,
}

impl RsiZone {
    pub fn classify(rsi: f64) -> Self {
        if rsi <= RSI_OVERSOLD {
            RsiZone::Oversold
        } else if rsi >= RSI_OVERBOUGHT {
            RsiZone::Overbought
        } else {
            RsiZone::Neutral
        }
    }
}

impl fmt::Display for RsiZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RsiZone::Oversold => write!(f, "oversold"),
            RsiZone::Neutral => write!(f, "neutral"),
            RsiZone::Overbought => write!(f, "overbought"),
        }
    }
}
