// Aggregation modes over normalized tables.
//
// Every function here takes tables that already went through the schema
// normalizer and returns `Option<chart data>`: `None` means a column the
// mode needs is missing, and the caller renders nothing for it. No mode
// ever fails; unparseable cells count as zero or are skipped.
use crate::normalize::columns as col;
use crate::table::DataTable;
use crate::types::{BarChart, CountChart, Month, Series, SeriesChart, Status, SummaryStats};
use crate::util::parse_f64_safe;
use std::collections::{BTreeMap, BTreeSet, HashSet};

fn row_month(table: &DataTable, row: usize) -> Option<Month> {
    Month::parse_label(table.cell(row, col::MONTH)?)
}

/// Distinct months present in a table's Month column, chronologically
/// sorted. Rows whose label does not parse are excluded, not an error.
pub fn months_of(table: &DataTable) -> Vec<Month> {
    let mut months = BTreeSet::new();
    for row in 0..table.row_count() {
        if let Some(m) = row_month(table, row) {
            months.insert(m);
        }
    }
    months.into_iter().collect()
}

/// Count activities per status value. Unknown statuses are still counted;
/// known ones come first on the axis, in lifecycle order.
pub fn status_distribution(activities: &DataTable) -> Option<CountChart> {
    let statuses = activities.column_values(col::STATUS)?;
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for status in statuses {
        let status = status.trim();
        if status.is_empty() {
            continue;
        }
        *counts.entry(status.to_string()).or_insert(0) += 1;
    }
    let mut bars: Vec<(String, u64)> = counts.into_iter().collect();
    bars.sort_by(|a, b| {
        Status::axis_rank(&a.0)
            .cmp(&Status::axis_rank(&b.0))
            .then_with(|| a.0.cmp(&b.0))
    });
    Some(CountChart {
        title: "Activity Status Distribution".to_string(),
        bars,
    })
}

/// Month × status count matrix: one series per status over the month axis.
pub fn status_by_month(activities: &DataTable) -> Option<SeriesChart> {
    if !activities.has_column(col::STATUS) || !activities.has_column(col::MONTH) {
        return None;
    }
    let months = months_of(activities);
    let mut counts: BTreeMap<String, BTreeMap<Month, u64>> = BTreeMap::new();
    for row in 0..activities.row_count() {
        let Some(month) = row_month(activities, row) else {
            continue;
        };
        let status = activities.cell(row, col::STATUS).unwrap_or("").trim();
        if status.is_empty() {
            continue;
        }
        *counts
            .entry(status.to_string())
            .or_default()
            .entry(month)
            .or_insert(0) += 1;
    }
    let mut names: Vec<String> = counts.keys().cloned().collect();
    names.sort_by(|a, b| {
        Status::axis_rank(a)
            .cmp(&Status::axis_rank(b))
            .then_with(|| a.cmp(b))
    });
    let series = names
        .into_iter()
        .map(|name| {
            let by_month = &counts[&name];
            let values = months
                .iter()
                .map(|m| *by_month.get(m).unwrap_or(&0) as f64)
                .collect();
            Series { name, values }
        })
        .collect();
    Some(SeriesChart {
        title: "Activities per Month by Status".to_string(),
        x_labels: months.iter().map(|m| m.label()).collect(),
        series,
    })
}

/// Technical and functional hours per resource for one selected month.
///
/// The two groupings are reported as two parallel series over a shared
/// resource axis and are deliberately not merged: a resource appearing in
/// both roles shows up in both series (source behavior, kept as-is).
pub fn resource_hours_for_month(activities: &DataTable, month: Month) -> Option<SeriesChart> {
    let required = [
        col::MONTH,
        col::TECHNICAL_RESOURCE,
        col::TECHNICAL_TIME,
        col::FUNCTIONAL_RESOURCE,
        col::FUNCTIONAL_TIME,
    ];
    if required.iter().any(|c| !activities.has_column(c)) {
        return None;
    }

    let mut technical: BTreeMap<String, f64> = BTreeMap::new();
    let mut functional: BTreeMap<String, f64> = BTreeMap::new();
    for row in 0..activities.row_count() {
        if row_month(activities, row) != Some(month) {
            continue;
        }
        for (resource_col, time_col, sink) in [
            (col::TECHNICAL_RESOURCE, col::TECHNICAL_TIME, &mut technical),
            (col::FUNCTIONAL_RESOURCE, col::FUNCTIONAL_TIME, &mut functional),
        ] {
            let name = activities.cell(row, resource_col).unwrap_or("").trim();
            if name.is_empty() {
                continue;
            }
            let hours = parse_f64_safe(activities.cell(row, time_col)).unwrap_or(0.0);
            *sink.entry(name.to_string()).or_insert(0.0) += hours;
        }
    }

    let axis: BTreeSet<String> = technical.keys().chain(functional.keys()).cloned().collect();
    let x_labels: Vec<String> = axis.into_iter().collect();
    let series = vec![
        Series {
            name: "Technical Time".to_string(),
            values: x_labels
                .iter()
                .map(|r| *technical.get(r).unwrap_or(&0.0))
                .collect(),
        },
        Series {
            name: "Functional Time".to_string(),
            values: x_labels
                .iter()
                .map(|r| *functional.get(r).unwrap_or(&0.0))
                .collect(),
        },
    ];
    Some(SeriesChart {
        title: format!("Resource Hours — {}", month.label()),
        x_labels,
        series,
    })
}

/// Per-month activity hours (technical + functional per row) next to
/// per-month ME totals, over the union of months, missing months as zero.
pub fn combined_hours_by_month(activities: &DataTable, me_hours: &DataTable) -> Option<SeriesChart> {
    let activity_cols = [col::MONTH, col::TECHNICAL_TIME, col::FUNCTIONAL_TIME];
    if activity_cols.iter().any(|c| !activities.has_column(c)) {
        return None;
    }
    if !me_hours.has_column(col::MONTH) || !me_hours.has_column(col::TOTAL_ME_HOURS) {
        return None;
    }

    let mut activity_totals: BTreeMap<Month, f64> = BTreeMap::new();
    for row in 0..activities.row_count() {
        let Some(month) = row_month(activities, row) else {
            continue;
        };
        let total = parse_f64_safe(activities.cell(row, col::TECHNICAL_TIME)).unwrap_or(0.0)
            + parse_f64_safe(activities.cell(row, col::FUNCTIONAL_TIME)).unwrap_or(0.0);
        *activity_totals.entry(month).or_insert(0.0) += total;
    }

    let mut me_totals: BTreeMap<Month, f64> = BTreeMap::new();
    for row in 0..me_hours.row_count() {
        let Some(month) = row_month(me_hours, row) else {
            continue;
        };
        let total = parse_f64_safe(me_hours.cell(row, col::TOTAL_ME_HOURS)).unwrap_or(0.0);
        *me_totals.entry(month).or_insert(0.0) += total;
    }

    let months: BTreeSet<Month> = activity_totals.keys().chain(me_totals.keys()).copied().collect();
    let months: Vec<Month> = months.into_iter().collect();
    let series = vec![
        Series {
            name: "Activity Hours".to_string(),
            values: months
                .iter()
                .map(|m| *activity_totals.get(m).unwrap_or(&0.0))
                .collect(),
        },
        Series {
            name: "ME Hours".to_string(),
            values: months
                .iter()
                .map(|m| *me_totals.get(m).unwrap_or(&0.0))
                .collect(),
        },
    ];
    Some(SeriesChart {
        title: "Combined Hours by Month".to_string(),
        x_labels: months.iter().map(|m| m.label()).collect(),
        series,
    })
}

/// ME hours per resource for one selected month, accumulated across the
/// three resource/hour slots (the same name in several slots adds up).
pub fn me_hours_by_resource(me_hours: &DataTable, month: Month) -> Option<BarChart> {
    if !me_hours.has_column(col::MONTH) {
        return None;
    }
    let slots: Vec<(&str, &str)> = col::RESOURCE_SLOTS
        .iter()
        .filter(|(resource, hours)| me_hours.has_column(resource) && me_hours.has_column(hours))
        .copied()
        .collect();
    if slots.is_empty() {
        return None;
    }

    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    for row in 0..me_hours.row_count() {
        if row_month(me_hours, row) != Some(month) {
            continue;
        }
        for (resource_col, hours_col) in &slots {
            let name = me_hours.cell(row, resource_col).unwrap_or("").trim();
            if name.is_empty() {
                continue;
            }
            let hours = parse_f64_safe(me_hours.cell(row, hours_col)).unwrap_or(0.0);
            *totals.entry(name.to_string()).or_insert(0.0) += hours;
        }
    }
    Some(BarChart {
        title: format!("ME Hours by Resource — {}", month.label()),
        bars: totals.into_iter().collect(),
    })
}

/// Headline numbers for the summary export.
pub fn summary(
    activities: &DataTable,
    automations: &DataTable,
    servers: &DataTable,
    me_hours: &DataTable,
) -> SummaryStats {
    let total_me_hours = me_hours
        .column_values(col::TOTAL_ME_HOURS)
        .map(|values| {
            values
                .iter()
                .map(|v| parse_f64_safe(Some(v)).unwrap_or(0.0))
                .sum()
        })
        .unwrap_or(0.0);

    let mut resources: HashSet<String> = HashSet::new();
    for column in [col::TECHNICAL_RESOURCE, col::FUNCTIONAL_RESOURCE] {
        if let Some(values) = activities.column_values(column) {
            resources.extend(
                values
                    .iter()
                    .map(|v| v.trim())
                    .filter(|v| !v.is_empty())
                    .map(str::to_string),
            );
        }
    }
    for (resource_col, _) in col::RESOURCE_SLOTS {
        if let Some(values) = me_hours.column_values(resource_col) {
            resources.extend(
                values
                    .iter()
                    .map(|v| v.trim())
                    .filter(|v| !v.is_empty())
                    .map(str::to_string),
            );
        }
    }

    SummaryStats {
        total_activities: activities.row_count(),
        total_automations: automations.row_count(),
        total_servers: servers.row_count(),
        total_me_hours,
        resources_tracked: resources.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{normalize, ACTIVITIES_SCHEMA, ME_HOURS_SCHEMA};

    fn activities(rows: &[(&str, &str, &str, &str, &str, &str)]) -> DataTable {
        // (date, status, tech resource, tech time, func resource, func time)
        let mut t = DataTable::with_columns([
            col::ACTIVITY_NAME,
            col::SCHEDULED_DATE,
            col::STATUS,
            col::TECHNICAL_RESOURCE,
            col::TECHNICAL_TIME,
            col::FUNCTIONAL_RESOURCE,
            col::FUNCTIONAL_TIME,
        ]);
        for (i, (date, status, tr, tt, fr, ft)) in rows.iter().enumerate() {
            t.push_row(vec![
                format!("activity {}", i),
                date.to_string(),
                status.to_string(),
                tr.to_string(),
                tt.to_string(),
                fr.to_string(),
                ft.to_string(),
            ]);
        }
        normalize(&t, &ACTIVITIES_SCHEMA)
    }

    fn me_table(rows: &[(&str, &str, &str, &str, &str)]) -> DataTable {
        // (date, resource 1, hours 1, resource 2, hours 2)
        let mut t = DataTable::with_columns([
            col::ME_MONTH,
            "Resource 1",
            "Resource 1 Hours",
            "Resource 2",
            "Resource 2 Hours",
        ]);
        for (date, r1, h1, r2, h2) in rows {
            t.push_row(vec![
                date.to_string(),
                r1.to_string(),
                h1.to_string(),
                r2.to_string(),
                h2.to_string(),
            ]);
        }
        normalize(&t, &ME_HOURS_SCHEMA)
    }

    #[test]
    fn status_counts_are_independent_of_row_order() {
        let forward = activities(&[
            ("2025-01-10", "Planned", "", "0", "", "0"),
            ("2025-01-11", "Completed", "", "0", "", "0"),
            ("2025-01-12", "Planned", "", "0", "", "0"),
            ("2025-01-13", "Completed", "", "0", "", "0"),
            ("2025-01-14", "Planned", "", "0", "", "0"),
        ]);
        let reversed = activities(&[
            ("2025-01-14", "Planned", "", "0", "", "0"),
            ("2025-01-13", "Completed", "", "0", "", "0"),
            ("2025-01-12", "Planned", "", "0", "", "0"),
            ("2025-01-11", "Completed", "", "0", "", "0"),
            ("2025-01-10", "Planned", "", "0", "", "0"),
        ]);
        let expected = vec![
            ("Planned".to_string(), 3),
            ("Completed".to_string(), 2),
        ];
        assert_eq!(status_distribution(&forward).unwrap().bars, expected);
        assert_eq!(status_distribution(&reversed).unwrap().bars, expected);
    }

    #[test]
    fn missing_status_column_renders_nothing() {
        let t = DataTable::with_columns([col::ACTIVITY_NAME]);
        assert!(status_distribution(&t).is_none());
        assert!(status_by_month(&t).is_none());
    }

    #[test]
    fn month_axis_is_chronological_across_year_boundaries() {
        let t = activities(&[
            ("2025-04-01", "Planned", "", "0", "", "0"),
            ("2024-12-15", "Completed", "", "0", "", "0"),
            ("2025-01-20", "Planned", "", "0", "", "0"),
        ]);
        let chart = status_by_month(&t).unwrap();
        // Lexicographic label order would put "April 2025" first.
        assert_eq!(
            chart.x_labels,
            ["December 2024", "January 2025", "April 2025"]
        );
    }

    #[test]
    fn technical_and_functional_series_stay_parallel_not_merged() {
        let t = activities(&[
            ("2025-03-05", "Planned", "Alice", "10", "Alice", "4"),
            ("2025-03-07", "Planned", "Bob", "6", "Carol", "2"),
            ("2025-04-01", "Planned", "Alice", "99", "", "0"),
        ]);
        let month = Month { year: 2025, month: 3 };
        let chart = resource_hours_for_month(&t, month).unwrap();
        assert_eq!(chart.x_labels, ["Alice", "Bob", "Carol"]);
        let technical = &chart.series[0];
        let functional = &chart.series[1];
        // Alice appears in both series with separate totals; the April row
        // is filtered out by the month selection.
        assert_eq!(technical.values, [10.0, 6.0, 0.0]);
        assert_eq!(functional.values, [4.0, 0.0, 2.0]);
    }

    #[test]
    fn combined_hours_zero_fill_the_month_union() {
        let acts = activities(&[
            ("2025-01-10", "Planned", "Alice", "10", "Bob", "5"),
        ]);
        let me = me_table(&[("2025-02-03", "Alice", "20", "", "0")]);
        let chart = combined_hours_by_month(&acts, &me).unwrap();
        assert_eq!(chart.x_labels, ["January 2025", "February 2025"]);
        assert_eq!(chart.series[0].name, "Activity Hours");
        assert_eq!(chart.series[0].values, [15.0, 0.0]);
        assert_eq!(chart.series[1].values, [0.0, 20.0]);
    }

    #[test]
    fn me_resource_hours_accumulate_across_slots() {
        let me = me_table(&[
            ("2025-02-03", "Alice", "8", "Alice", "4"),
            ("2025-02-17", "Bob", "6", "", "0"),
            ("2025-03-01", "Alice", "99", "", "0"),
        ]);
        let month = Month { year: 2025, month: 2 };
        let chart = me_hours_by_resource(&me, month).unwrap();
        assert_eq!(
            chart.bars,
            vec![("Alice".to_string(), 12.0), ("Bob".to_string(), 6.0)]
        );
    }

    #[test]
    fn rows_without_a_parseable_date_drop_out_of_month_views_only() {
        let t = activities(&[
            ("2025-01-10", "Planned", "Alice", "3", "", "0"),
            ("whenever", "Planned", "Bob", "7", "", "0"),
        ]);
        assert_eq!(t.row_count(), 2);
        assert_eq!(months_of(&t), vec![Month { year: 2025, month: 1 }]);
        let chart = status_by_month(&t).unwrap();
        assert_eq!(chart.series[0].values, [1.0]);
    }

    #[test]
    fn summary_counts_distinct_resources_and_total_me_hours() {
        let acts = activities(&[
            ("2025-01-10", "Planned", "Alice", "3", "Bob", "1"),
        ]);
        let me = me_table(&[("2025-02-03", "Alice", "8", "Carol", "4")]);
        let open = DataTable::new();
        let stats = summary(&acts, &open, &open, &me);
        assert_eq!(stats.total_activities, 1);
        assert_eq!(stats.total_me_hours, 12.0);
        assert_eq!(stats.resources_tracked, 3);
    }
}
