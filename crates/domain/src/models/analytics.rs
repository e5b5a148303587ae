//! Analytics view models.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::dashboard::{LabelCount, RateSummary};
use super::data_request::{PriorityBreakdown, RequestStatusBreakdown};
use super::stats::percent_of_max;
use super::user::RoleBreakdown;

/// Rows in each top-ministries ranking.
pub const TOP_MINISTRIES_LIMIT: i64 = 10;

/// Months covered by the request trend.
pub const TREND_MONTHS: u32 = 12;

/// Requests submitted in one calendar month (`YYYY-MM`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyCount {
    pub month: String,
    pub count: i64,
}

/// One row of a top-ministries ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinistryRanking {
    pub ministry_id: i64,
    pub name: String,
    pub abbreviation: String,
    pub count: i64,
    /// Bar width relative to the first (largest) row.
    pub percent_of_max: f64,
}

impl MinistryRanking {
    /// Builds a ranking from `(id, name, abbreviation, count)` rows already
    /// ordered by count descending.
    pub fn rank(rows: Vec<(i64, String, String, i64)>) -> Vec<Self> {
        let max = rows.first().map(|row| row.3).unwrap_or(0);
        rows.into_iter()
            .map(|(ministry_id, name, abbreviation, count)| Self {
                ministry_id,
                name,
                abbreviation,
                count,
                percent_of_max: percent_of_max(count, max),
            })
            .collect()
    }
}

/// Analytics view for admins.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalyticsReport {
    pub total_users: i64,
    pub new_users_last_30_days: i64,
    pub requests_by_month: Vec<MonthlyCount>,
    pub requests_by_status: RequestStatusBreakdown,
    pub requests_by_priority: PriorityBreakdown,
    pub requests_by_type: Vec<LabelCount>,
    pub users_by_role: RoleBreakdown,
    pub top_requesting_ministries: Vec<MinistryRanking>,
    pub top_target_ministries: Vec<MinistryRanking>,
    pub rates: RateSummary,
}

/// First day of the oldest month in the trend ending at `today`'s month.
pub fn trend_start(today: NaiveDate) -> NaiveDate {
    let months_back = TREND_MONTHS as i32 - 1;
    let index = today.year() * 12 + today.month0() as i32 - months_back;
    NaiveDate::from_ymd_opt(index.div_euclid(12), index.rem_euclid(12) as u32 + 1, 1)
        .unwrap_or(today)
}

/// Fills the twelve months ending at `today` from sparse `(YYYY-MM, count)`
/// rows; months without requests get zero.
pub fn monthly_series(today: NaiveDate, rows: Vec<(String, i64)>) -> Vec<MonthlyCount> {
    let counts: HashMap<String, i64> = rows.into_iter().collect();
    let start = trend_start(today);
    let start_index = start.year() * 12 + start.month0() as i32;

    (0..TREND_MONTHS as i32)
        .map(|offset| {
            let index = start_index + offset;
            let month = format!("{:04}-{:02}", index.div_euclid(12), index.rem_euclid(12) + 1);
            let count = counts.get(&month).copied().unwrap_or(0);
            MonthlyCount { month, count }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_relative_to_first_row() {
        let ranking = MinistryRanking::rank(vec![
            (1, "Finance".to_string(), "MOF".to_string(), 8),
            (2, "Health".to_string(), "MOH".to_string(), 4),
            (3, "Education".to_string(), "MOE".to_string(), 1),
        ]);
        assert_eq!(ranking[0].percent_of_max, 100.0);
        assert_eq!(ranking[1].percent_of_max, 50.0);
        assert_eq!(ranking[2].percent_of_max, 12.5);
    }

    #[test]
    fn test_rank_empty() {
        assert!(MinistryRanking::rank(Vec::new()).is_empty());
    }

    #[test]
    fn test_trend_start_crosses_year() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(trend_start(today), NaiveDate::from_ymd_opt(2023, 4, 1).unwrap());

        let december = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        assert_eq!(trend_start(december), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }

    #[test]
    fn test_monthly_series_fills_gaps() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let series = monthly_series(
            today,
            vec![("2023-05".to_string(), 2), ("2024-03".to_string(), 7)],
        );
        assert_eq!(series.len(), 12);
        assert_eq!(series[0].month, "2023-04");
        assert_eq!(series[0].count, 0);
        assert_eq!(series[1], MonthlyCount { month: "2023-05".to_string(), count: 2 });
        assert_eq!(series[11], MonthlyCount { month: "2024-03".to_string(), count: 7 });
    }
}
