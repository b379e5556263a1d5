//! Z-score outlier detection over periods and individual orders.

use chrono::NaiveDate;
use serde::Serialize;

use salesdash_stats::math::z_scores;

use crate::error::{AnalyticsError, AnalyticsResult};
use crate::time_series::TimeBucket;
use crate::types::{Metric, TransactionTable};

/// What an anomaly flag refers to.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", content = "id")]
pub enum AnomalySubject {
    Period(NaiveDate),
    Order(String),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnomalyFlag {
    pub subject: AnomalySubject,
    pub value: f64,
    /// `(value - mean) / std`, 0 when the standard deviation is 0.
    pub z_score: f64,
    pub is_anomalous: bool,
}

/// Score every bucket's `metric` against the whole sequence.
///
/// A bucket is anomalous when `|z| > threshold`. A sequence whose values are
/// all identical flags nothing.
pub fn detect(
    series: &[TimeBucket],
    metric: Metric,
    threshold: f64,
) -> AnalyticsResult<Vec<AnomalyFlag>> {
    validate_threshold(threshold)?;
    let values: Vec<f64> = series.iter().map(|b| b.value(metric)).collect();
    let flags = flag(&values, threshold, |i| AnomalySubject::Period(series[i].period_start));
    log_summary("period", &flags);
    Ok(flags)
}

/// Score every order line's sales amount against the whole table.
pub fn detect_records(
    table: &TransactionTable,
    threshold: f64,
) -> AnalyticsResult<Vec<AnomalyFlag>> {
    validate_threshold(threshold)?;
    let rows = table.rows();
    let values: Vec<f64> = rows.iter().map(|r| r.sales_amount).collect();
    let flags = flag(&values, threshold, |i| AnomalySubject::Order(rows[i].order_id.clone()));
    log_summary("record", &flags);
    Ok(flags)
}

pub fn validate_threshold(threshold: f64) -> AnalyticsResult<()> {
    if !threshold.is_finite() || threshold <= 0.0 {
        return Err(AnalyticsError::invalid_param(
            "threshold",
            format!("must be a positive number, got {}", threshold),
        ));
    }
    Ok(())
}

fn flag<F>(values: &[f64], threshold: f64, subject: F) -> Vec<AnomalyFlag>
where
    F: Fn(usize) -> AnomalySubject,
{
    z_scores(values)
        .into_iter()
        .enumerate()
        .map(|(i, z)| AnomalyFlag {
            subject: subject(i),
            value: values[i],
            z_score: z,
            is_anomalous: z.abs() > threshold,
        })
        .collect()
}

fn log_summary(kind: &str, flags: &[AnomalyFlag]) {
    let anomalous = flags.iter().filter(|f| f.is_anomalous).count();
    if anomalous > 0 {
        log::info!("anomalies kind={} flagged={} of {}", kind, anomalous, flags.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{date, table, tx};
    use crate::time_series::buckets;
    use crate::types::Granularity;

    fn daily(values: &[f64]) -> Vec<TimeBucket> {
        let rows = values
            .iter()
            .enumerate()
            .map(|(i, v)| tx(&format!("O-{i}"), date(2024, 1, 1 + i as u32), "Lamp", *v))
            .collect();
        buckets(&table(rows), Granularity::Day)
    }

    #[test]
    fn identical_values_flag_nothing() {
        let flags = detect(&daily(&[50.0; 10]), Metric::Sales, 2.0).unwrap();
        assert_eq!(flags.len(), 10);
        assert!(flags.iter().all(|f| !f.is_anomalous && f.z_score == 0.0));
    }

    #[test]
    fn spike_is_flagged() {
        let mut values = vec![100.0; 11];
        values[5] = 1000.0;
        let flags = detect(&daily(&values), Metric::Sales, 2.0).unwrap();
        let flagged: Vec<usize> = flags
            .iter()
            .enumerate()
            .filter(|(_, f)| f.is_anomalous)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(flagged, vec![5]);
        assert_eq!(flags[5].subject, AnomalySubject::Period(date(2024, 1, 6)));
        assert!(flags[5].z_score > 3.0);
    }

    #[test]
    fn threshold_is_strict() {
        // Two-point series: both scores are exactly +/-1.
        let flags = detect(&daily(&[10.0, 20.0]), Metric::Sales, 1.0).unwrap();
        assert!(flags.iter().all(|f| !f.is_anomalous));
        assert!((flags[1].z_score - 1.0).abs() < 1e-12);
    }

    #[test]
    fn invalid_threshold_is_rejected() {
        let series = daily(&[1.0, 2.0]);
        assert!(detect(&series, Metric::Sales, 0.0).is_err());
        assert!(detect(&series, Metric::Sales, f64::NAN).is_err());
    }

    #[test]
    fn empty_series_is_empty() {
        assert!(detect(&[], Metric::Sales, 2.0).unwrap().is_empty());
    }

    #[test]
    fn record_level_flags_name_the_order() {
        let d = date(2024, 1, 1);
        let mut rows: Vec<_> = (0..10).map(|i| tx(&format!("O-{i}"), d, "Lamp", 100.0)).collect();
        rows.push(tx("BIG", d, "Lamp", 5000.0));
        let flags = detect_records(&table(rows), 2.0).unwrap();
        let flagged: Vec<&AnomalySubject> = flags
            .iter()
            .filter(|f| f.is_anomalous)
            .map(|f| &f.subject)
            .collect();
        assert_eq!(flagged, vec![&AnomalySubject::Order("BIG".into())]);
    }
}
