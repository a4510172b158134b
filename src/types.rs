use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::fmt;
use tabled::Tabled;

/// A calendar month. Ordering is chronological on `(year, month)`, which is
/// what every month axis in the dashboard sorts by; the formatted label
/// ("January 2026") is display-only and never used for ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month {
    pub year: i32,
    pub month: u32,
}

impl Month {
    pub fn from_date(date: NaiveDate) -> Month {
        Month {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Parse a label previously produced by `Display`, e.g. "March 2025".
    /// Returns `None` for anything else; callers treat that as a cell to
    /// exclude from month-based views.
    pub fn parse_label(s: &str) -> Option<Month> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }
        // chrono needs a day to parse a full date, so prepend one.
        NaiveDate::parse_from_str(&format!("1 {}", s), "%d %B %Y")
            .ok()
            .map(Month::from_date)
    }

    /// The next calendar month, rolling the year over after December.
    pub fn succ(self) -> Month {
        if self.month == 12 {
            Month {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Month {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn label(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Month is only ever built from a valid NaiveDate, so the
        // first-of-month reconstruction cannot fail.
        match NaiveDate::from_ymd_opt(self.year, self.month, 1) {
            Some(d) => write!(f, "{}", d.format("%B %Y")),
            None => Ok(()),
        }
    }
}

/// Activity status values known to the tracker. Distribution charts count
/// raw cell values (unknown statuses still show up); the enum only fixes
/// the axis order for the known ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Planned,
    Inprogress,
    Completed,
}

impl Status {
    pub fn parse(s: &str) -> Option<Status> {
        match s.trim() {
            "Planned" => Some(Status::Planned),
            "Inprogress" => Some(Status::Inprogress),
            "Completed" => Some(Status::Completed),
            _ => None,
        }
    }

    /// Axis position: known statuses in lifecycle order, unknowns after.
    pub fn axis_rank(raw: &str) -> u8 {
        match Status::parse(raw) {
            Some(Status::Planned) => 0,
            Some(Status::Inprogress) => 1,
            Some(Status::Completed) => 2,
            None => 3,
        }
    }
}

/// One flattened (month, resource, hours) row. Activities contribute their
/// technical and functional resource/time pairs, ME records their three
/// resource/hour slots; the forecast engine works on the concatenation.
#[derive(Debug, Clone, PartialEq)]
pub struct UtilizationSample {
    pub month: Month,
    pub resource: String,
    pub hours: f64,
}

/// Bar chart of integer counts (status distribution).
#[derive(Debug, Clone, PartialEq)]
pub struct CountChart {
    pub title: String,
    pub bars: Vec<(String, u64)>,
}

/// Bar chart of fractional values (hours per resource).
#[derive(Debug, Clone, PartialEq)]
pub struct BarChart {
    pub title: String,
    pub bars: Vec<(String, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub values: Vec<f64>,
}

/// One or more named series over a shared categorical x axis. Used for the
/// month/status matrix, the per-month resource breakdowns, the combined
/// hours comparison and the utilization forecast polylines.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesChart {
    pub title: String,
    pub x_labels: Vec<String>,
    pub series: Vec<Series>,
}

/// Everything the presentation layer knows how to draw.
#[derive(Debug, Clone, PartialEq)]
pub enum Chart {
    Counts(CountChart),
    Bars(BarChart),
    Series(SeriesChart),
}

/// Headline numbers for the JSON export and the console summary panel.
#[derive(Debug, Serialize, Tabled, Clone)]
pub struct SummaryStats {
    #[tabled(rename = "Activities")]
    pub total_activities: usize,
    #[tabled(rename = "Automations")]
    pub total_automations: usize,
    #[tabled(rename = "Servers")]
    pub total_servers: usize,
    #[tabled(rename = "TotalMEHours")]
    pub total_me_hours: f64,
    #[tabled(rename = "ResourcesTracked")]
    pub resources_tracked: usize,
}
