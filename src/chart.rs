// src/chart.rs
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

pub const BASE_PRICE: f64 = 1.0543;
const DAILY_STEP: f64 = 0.01;
const WICK: f64 = 0.01;
const MIN_VOLUME: u64 = 500_000;
const VOLUME_SPREAD: u64 = 1_000_000;

pub const PAIRS: [&str; 4] = ["EUR/USD", "GBP/USD", "USD/JPY", "AUD/USD"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Timeframe {
    OneHour,
    FourHours,
    #[default]
    OneDay,
    OneWeek,
    OneMonth,
}

impl Timeframe {
    /// How many days of history the chart covers for this timeframe.
    pub fn days(&self) -> u32 {
        match self {
            Timeframe::OneHour => 1,
            Timeframe::FourHours => 7,
            Timeframe::OneDay => 30,
            Timeframe::OneWeek => 90,
            Timeframe::OneMonth => 365,
        }
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "1H" => Ok(Timeframe::OneHour),
            "4H" => Ok(Timeframe::FourHours),
            "1D" => Ok(Timeframe::OneDay),
            "1W" => Ok(Timeframe::OneWeek),
            "1M" => Ok(Timeframe::OneMonth),
            _ => Err(format!(
                "Invalid timeframe: {}. Must be one of 1H, 4H, 1D, 1W, 1M",
                s
            )),
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Timeframe::OneHour => "1H",
            Timeframe::FourHours => "4H",
            Timeframe::OneDay => "1D",
            Timeframe::OneWeek => "1W",
            Timeframe::OneMonth => "1M",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartPoint {
    pub date: String,
    pub time: String,
    pub price: f64,
    pub volume: u64,
    pub high: f64,
    pub low: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSummary {
    pub current_price: f64,
    pub previous_price: f64,
    pub price_change: f64,
    pub percent_change: f64,
}

fn round5(value: f64) -> f64 {
    (value * 100_000.0).round() / 100_000.0
}

/// Walks `days + 1` daily samples forward from `BASE_PRICE`, oldest first,
/// with the last sample dated `now`.
pub fn generate<R: Rng + ?Sized>(days: u32, now: DateTime<Utc>, rng: &mut R) -> Vec<ChartPoint> {
    let mut price = BASE_PRICE;
    (0..=days)
        .rev()
        .map(|days_back| {
            let at = now - Duration::days(i64::from(days_back));
            price += rng.random_range(-DAILY_STEP..DAILY_STEP);
            ChartPoint {
                date: at.format("%Y-%m-%d").to_string(),
                time: at.format("%H:%M").to_string(),
                price: round5(price),
                volume: MIN_VOLUME + rng.random_range(0..VOLUME_SPREAD),
                high: round5(price + rng.random_range(0.0..WICK)),
                low: round5(price - rng.random_range(0.0..WICK)),
            }
        })
        .collect()
}

pub fn summarize(points: &[ChartPoint]) -> ChartSummary {
    let current_price = points.last().map(|p| p.price).unwrap_or(0.0);
    let previous_price = points
        .len()
        .checked_sub(2)
        .and_then(|i| points.get(i))
        .map(|p| p.price)
        .unwrap_or(0.0);
    let price_change = current_price - previous_price;
    let percent_change = if previous_price == 0.0 {
        0.0
    } else {
        price_change / previous_price * 100.0
    };
    ChartSummary {
        current_price,
        previous_price,
        price_change,
        percent_change,
    }
}
