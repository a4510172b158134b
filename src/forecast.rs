// Utilization forecast.
//
// Activities contribute their technical and functional resource/time pairs
// and ME records their three resource/hour slots; the flattened samples are
// collapsed to one point per (month, resource), months are mapped to the
// indices 0..N-1 in chronological order, and an ordinary least-squares line
// is fitted per resource. The fit projects six months past the history and
// converts hours to a utilization percentage against the fixed monthly
// capacity. Predictions are left unclamped.
use crate::normalize::columns as col;
use crate::table::DataTable;
use crate::types::{Month, Series, SeriesChart, UtilizationSample};
use crate::util::parse_f64_safe;
use std::collections::BTreeMap;

/// Assumed full-time capacity per resource per month, in hours. Fixed by
/// product convention, not derived from working days.
pub const MONTHLY_CAPACITY_HOURS: f64 = 176.0;

/// How far past the last historical month the forecast projects.
pub const FORECAST_MONTHS: usize = 6;

/// Minimum historical points a resource needs before a line is fitted;
/// resources below this are skipped without comment.
const MIN_POINTS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Ordinary least squares over `(x, y)` points. `None` for fewer than two
/// points or a degenerate x spread.
pub fn linear_fit(points: &[(f64, f64)]) -> Option<LinearFit> {
    if points.len() < MIN_POINTS {
        return None;
    }
    let n = points.len() as f64;
    let sum_x: f64 = points.iter().map(|(x, _)| x).sum();
    let sum_y: f64 = points.iter().map(|(_, y)| y).sum();
    let sum_xx: f64 = points.iter().map(|(x, _)| x * x).sum();
    let sum_xy: f64 = points.iter().map(|(x, y)| x * y).sum();
    let denom = n * sum_xx - sum_x * sum_x;
    if denom.abs() < f64::EPSILON {
        return None;
    }
    let slope = (n * sum_xy - sum_x * sum_y) / denom;
    let intercept = (sum_y - slope * sum_x) / n;
    Some(LinearFit { slope, intercept })
}

/// Flatten both tables into the unified long-form (month, resource, hours)
/// shape. Tables missing the relevant columns simply contribute nothing.
pub fn utilization_samples(activities: &DataTable, me_hours: &DataTable) -> Vec<UtilizationSample> {
    let mut samples = Vec::new();

    if activities.has_column(col::MONTH) {
        for row in 0..activities.row_count() {
            let Some(month) = activities
                .cell(row, col::MONTH)
                .and_then(Month::parse_label)
            else {
                continue;
            };
            for (resource_col, time_col) in [
                (col::TECHNICAL_RESOURCE, col::TECHNICAL_TIME),
                (col::FUNCTIONAL_RESOURCE, col::FUNCTIONAL_TIME),
            ] {
                push_sample(&mut samples, activities, row, month, resource_col, time_col);
            }
        }
    }

    if me_hours.has_column(col::MONTH) {
        for row in 0..me_hours.row_count() {
            let Some(month) = me_hours.cell(row, col::MONTH).and_then(Month::parse_label) else {
                continue;
            };
            for (resource_col, hours_col) in col::RESOURCE_SLOTS {
                push_sample(&mut samples, me_hours, row, month, resource_col, hours_col);
            }
        }
    }

    samples
}

fn push_sample(
    samples: &mut Vec<UtilizationSample>,
    table: &DataTable,
    row: usize,
    month: Month,
    resource_col: &str,
    hours_col: &str,
) {
    if !table.has_column(resource_col) || !table.has_column(hours_col) {
        return;
    }
    let resource = table.cell(row, resource_col).unwrap_or("").trim();
    if resource.is_empty() {
        return;
    }
    let hours = parse_f64_safe(table.cell(row, hours_col)).unwrap_or(0.0);
    samples.push(UtilizationSample {
        month,
        resource: resource.to_string(),
        hours,
    });
}

/// Fit and project the per-resource utilization forecast.
///
/// Returns `None` when there is no usable history at all; a resource with a
/// single historical point gets no line and raises no error.
pub fn utilization_forecast(samples: &[UtilizationSample]) -> Option<SeriesChart> {
    // Collapse duplicate (month, resource) rows into one point before
    // fitting.
    let mut collapsed: BTreeMap<(Month, String), f64> = BTreeMap::new();
    for sample in samples {
        *collapsed
            .entry((sample.month, sample.resource.clone()))
            .or_insert(0.0) += sample.hours;
    }

    let months: Vec<Month> = {
        let set: std::collections::BTreeSet<Month> =
            collapsed.keys().map(|(m, _)| *m).collect();
        set.into_iter().collect()
    };
    if months.is_empty() {
        return None;
    }
    let month_index: BTreeMap<Month, usize> =
        months.iter().enumerate().map(|(i, m)| (*m, i)).collect();

    let mut points: BTreeMap<String, Vec<(f64, f64)>> = BTreeMap::new();
    for ((month, resource), hours) in &collapsed {
        points
            .entry(resource.clone())
            .or_default()
            .push((month_index[month] as f64, *hours));
    }

    let history_len = months.len();
    let series: Vec<Series> = points
        .into_iter()
        .filter_map(|(resource, pts)| {
            let fit = linear_fit(&pts)?;
            let values = (0..FORECAST_MONTHS)
                .map(|ahead| {
                    let index = (history_len + ahead) as f64;
                    fit.predict(index) / MONTHLY_CAPACITY_HOURS * 100.0
                })
                .collect();
            Some(Series {
                name: resource,
                values,
            })
        })
        .collect();

    // Future labels advance one calendar month at a time from the last
    // historical month.
    let last = *months.last()?;
    let mut future = Vec::with_capacity(FORECAST_MONTHS);
    let mut cursor = last;
    for _ in 0..FORECAST_MONTHS {
        cursor = cursor.succ();
        future.push(cursor.label());
    }

    Some(SeriesChart {
        title: "Utilization Forecast (% of capacity)".to_string(),
        x_labels: future,
        series,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{normalize, ACTIVITIES_SCHEMA, ME_HOURS_SCHEMA};

    fn sample(year: i32, month: u32, resource: &str, hours: f64) -> UtilizationSample {
        UtilizationSample {
            month: Month { year, month },
            resource: resource.to_string(),
            hours,
        }
    }

    #[test]
    fn two_point_fit_matches_the_hand_computed_line() {
        let fit = linear_fit(&[(0.0, 10.0), (1.0, 20.0)]).unwrap();
        assert!((fit.slope - 10.0).abs() < 1e-9);
        assert!((fit.intercept - 10.0).abs() < 1e-9);
        assert!((fit.predict(2.0) - 30.0).abs() < 1e-9);
    }

    #[test]
    fn single_point_yields_no_fit() {
        assert!(linear_fit(&[(0.0, 10.0)]).is_none());
        assert!(linear_fit(&[]).is_none());
    }

    #[test]
    fn forecast_converts_predicted_hours_to_utilization_percent() {
        let samples = vec![
            sample(2025, 1, "Alice", 10.0),
            sample(2025, 2, "Alice", 20.0),
        ];
        let chart = utilization_forecast(&samples).unwrap();
        assert_eq!(chart.series.len(), 1);
        let alice = &chart.series[0];
        // First projected index is 2 -> 30 hours -> 30 / 176 * 100.
        let expected = 30.0 / MONTHLY_CAPACITY_HOURS * 100.0;
        assert!((alice.values[0] - expected).abs() < 1e-9);
        assert!((alice.values[0] - 17.0454).abs() < 1e-3);
        assert_eq!(alice.values.len(), FORECAST_MONTHS);
    }

    #[test]
    fn resources_with_one_point_are_silently_skipped() {
        let samples = vec![
            sample(2025, 1, "Alice", 10.0),
            sample(2025, 2, "Alice", 20.0),
            sample(2025, 2, "Bob", 40.0),
        ];
        let chart = utilization_forecast(&samples).unwrap();
        let names: Vec<&str> = chart.series.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Alice"]);
    }

    #[test]
    fn duplicate_month_resource_rows_collapse_before_fitting() {
        let samples = vec![
            sample(2025, 1, "Alice", 4.0),
            sample(2025, 1, "Alice", 6.0),
            sample(2025, 2, "Alice", 20.0),
        ];
        let chart = utilization_forecast(&samples).unwrap();
        // Collapsed history is (0, 10), (1, 20): same line as the two-point
        // fixture above.
        let expected = 30.0 / MONTHLY_CAPACITY_HOURS * 100.0;
        assert!((chart.series[0].values[0] - expected).abs() < 1e-9);
    }

    #[test]
    fn future_labels_continue_from_the_true_last_month() {
        let samples = vec![
            sample(2024, 11, "Alice", 10.0),
            sample(2024, 12, "Alice", 20.0),
            sample(2025, 1, "Alice", 30.0),
        ];
        let chart = utilization_forecast(&samples).unwrap();
        // Chronological ordering puts January 2025 last even though its
        // label sorts before the 2024 ones.
        assert_eq!(chart.x_labels[0], "February 2025");
        assert_eq!(chart.x_labels[5], "July 2025");
    }

    #[test]
    fn no_samples_means_no_chart() {
        assert!(utilization_forecast(&[]).is_none());
    }

    #[test]
    fn samples_flatten_both_role_pairs_and_all_slots() {
        let mut acts = DataTable::with_columns([
            col::ACTIVITY_NAME,
            col::SCHEDULED_DATE,
            col::TECHNICAL_RESOURCE,
            col::TECHNICAL_TIME,
            col::FUNCTIONAL_RESOURCE,
            col::FUNCTIONAL_TIME,
        ]);
        acts.push_row(vec![
            "a".into(),
            "2025-03-05".into(),
            "Alice".into(),
            "10".into(),
            "Bob".into(),
            "5".into(),
        ]);
        let acts = normalize(&acts, &ACTIVITIES_SCHEMA);

        let mut me = DataTable::with_columns([col::ME_MONTH, "Resource 1", "Resource 1 Hours"]);
        me.push_row(vec!["2025-03-01".into(), "Carol".into(), "8".into()]);
        let me = normalize(&me, &ME_HOURS_SCHEMA);

        let samples = utilization_samples(&acts, &me);
        let mut names: Vec<&str> = samples.iter().map(|s| s.resource.as_str()).collect();
        names.sort();
        assert_eq!(names, ["Alice", "Bob", "Carol"]);
        assert!(samples.iter().all(|s| s.month == Month { year: 2025, month: 3 }));
    }
}
