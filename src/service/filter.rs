use chrono::{Duration, NaiveDate};
use serde::Deserialize;
use utoipa::ToSchema;

use super::enrich::EnrichedRow;
use crate::model::attendance::AttendanceStatus;
use crate::utils::time::DateBounds;

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Deserialize, ToSchema)]
pub enum DatePreset {
    #[default]
    #[serde(rename = "today")]
    Today,
    #[serde(rename = "7d")]
    SevenDays,
    #[serde(rename = "30d")]
    ThirtyDays,
    #[serde(rename = "custom")]
    Custom,
}

/// Only a custom range can leave a side open.
pub fn resolve_date_range(
    preset: DatePreset,
    today: NaiveDate,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> DateBounds {
    let back = |days: i64| DateBounds {
        from: Some(today - Duration::days(days)),
        to: Some(today),
    };

    match preset {
        DatePreset::Today => back(0),
        DatePreset::SevenDays => back(6),
        DatePreset::ThirtyDays => back(29),
        DatePreset::Custom => DateBounds { from, to },
    }
}

/// Attendance screen filters. `None` on branch or status means all.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct AttendanceFilters {
    pub q: Option<String>,
    pub branch: Option<String>,
    pub status: Option<AttendanceStatus>,
    pub preset: DatePreset,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

fn matches_query(row: &EnrichedRow, needle: &str) -> bool {
    let day = &row.day;
    [
        day.employee_name.as_str(),
        day.emp_no.as_str(),
        day.branch_name.as_str(),
        day.branch_code.as_str(),
        row.shift_label().unwrap_or_default(),
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(needle))
}

pub fn apply_filters(rows: Vec<EnrichedRow>, filters: &AttendanceFilters, today: NaiveDate) -> Vec<EnrichedRow> {
    let needle = filters
        .q
        .as_deref()
        .map(|q| q.trim().to_lowercase())
        .filter(|q| !q.is_empty());
    let bounds = resolve_date_range(filters.preset, today, filters.from, filters.to);

    rows.into_iter()
        .filter(|row| needle.as_deref().is_none_or(|q| matches_query(row, q)))
        .filter(|row| {
            filters
                .branch
                .as_deref()
                .is_none_or(|code| row.day.branch_code == code)
        })
        .filter(|row| filters.status.is_none_or(|s| row.resolved_status == s))
        .filter(|row| bounds.contains(row.day.date))
        .collect()
}
