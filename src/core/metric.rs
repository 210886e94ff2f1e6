use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::date::subtract_days;

/// Region a metric belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionRef {
    pub id: i64,
    pub code: String,
    pub name: String,
}

/// Full metric record for one region and one day, as served by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDetail {
    pub id: String,
    pub date: NaiveDate,
    pub region: RegionRef,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub predicted_value: Option<f64>,
    #[serde(default)]
    pub lower_value: Option<f64>,
    #[serde(default)]
    pub upper_value: Option<f64>,
    #[serde(default)]
    pub anomaly_degree: Option<f64>,
}

/// The numeric fields of a metric converted to display percentages
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricFigures {
    pub value: f64,
    pub predicted_value: f64,
    pub lower_value: f64,
    pub upper_value: f64,
    pub anomaly_degree: f64,
}

impl MetricDetail {
    /// Display figures for this metric, with missing fields reported as zero
    pub fn figures(&self) -> MetricFigures {
        let pct = |v: Option<f64>| v.map(round_percent).unwrap_or(0.0);
        MetricFigures {
            value: pct(self.value),
            predicted_value: pct(self.predicted_value),
            lower_value: pct(self.lower_value),
            upper_value: pct(self.upper_value),
            anomaly_degree: pct(self.anomaly_degree),
        }
    }
}

/// Convert a unit-interval value to a percentage rounded to one decimal
pub fn round_percent(value: f64) -> f64 {
    (value * 1000.0).round() / 10.0
}

/// One point of a trend series after dating
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Associate each trend value with its date, counting back from the last
/// date of the series, and scale values to percentages
pub fn trend_with_dates(values: &[f64], last_date: NaiveDate) -> Vec<TrendPoint> {
    let len = values.len();
    values
        .iter()
        .enumerate()
        .map(|(index, value)| {
            let days_until_end = (len - 1 - index) as u32;
            TrendPoint {
                date: subtract_days(last_date, days_until_end),
                value: value * 100.0,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_round_percent() {
        assert_eq!(round_percent(0.1234), 12.3);
        assert_eq!(round_percent(0.98765), 98.8);
        assert_eq!(round_percent(-0.0567), -5.7);
        assert_eq!(round_percent(0.0), 0.0);
    }

    #[test]
    fn test_figures_defaults_missing_fields_to_zero() {
        let metric = MetricDetail {
            id: "m-1".into(),
            date: date("2025-01-31"),
            region: RegionRef { id: 7, code: "28079".into(), name: "Madrid".into() },
            value: Some(0.456),
            predicted_value: Some(0.4),
            lower_value: None,
            upper_value: None,
            anomaly_degree: Some(0.056),
        };
        let figures = metric.figures();
        assert_eq!(figures.value, 45.6);
        assert_eq!(figures.predicted_value, 40.0);
        assert_eq!(figures.lower_value, 0.0);
        assert_eq!(figures.upper_value, 0.0);
        assert_eq!(figures.anomaly_degree, 5.6);
    }

    #[test]
    fn test_metric_detail_deserializes_with_nulls() {
        let json = r#"{
            "id": "m-2",
            "date": "2025-01-30",
            "region": { "id": 1, "code": "08019", "name": "Barcelona" },
            "value": 0.5,
            "predicted_value": null,
            "anomaly_degree": -0.125
        }"#;
        let metric: MetricDetail = serde_json::from_str(json).unwrap();
        assert_eq!(metric.value, Some(0.5));
        assert_eq!(metric.predicted_value, None);
        assert_eq!(metric.lower_value, None);
        assert_eq!(metric.figures().anomaly_degree, -12.5);
    }

    #[test]
    fn test_trend_with_dates_counts_back_from_last() {
        let points = trend_with_dates(&[0.25, 0.5, 1.0], date("2025-03-10"));
        assert_eq!(points.len(), 3);
        assert_eq!(points[0], TrendPoint { date: date("2025-03-08"), value: 25.0 });
        assert_eq!(points[1], TrendPoint { date: date("2025-03-09"), value: 50.0 });
        assert_eq!(points[2], TrendPoint { date: date("2025-03-10"), value: 100.0 });
    }

    #[test]
    fn test_trend_with_dates_empty() {
        assert!(trend_with_dates(&[], date("2025-03-10")).is_empty());
    }
}
