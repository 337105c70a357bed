pub mod approvals;
pub mod attendance;
pub mod kiosk;
pub mod payroll;

use chrono::NaiveDate;

use crate::error::{AppError, AppResult};
use crate::utils::time::parse_date;

/// 1-based page and page size, clamped to at most 100 rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    pub page: u64,
    pub per_page: u64,
}

impl Paging {
    pub fn new(page: Option<u64>, per_page: Option<u64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.unwrap_or(10).clamp(1, 100),
        }
    }

    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.per_page)
    }

    pub fn slice<T>(&self, rows: Vec<T>) -> Vec<T> {
        rows.into_iter()
            .skip(usize::try_from(self.offset()).unwrap_or(usize::MAX))
            .take(self.per_page as usize)
            .collect()
    }
}

/// `None` for a blank value; a malformed date is a 400.
pub fn optional_date(raw: Option<&str>, field: &str) -> AppResult<Option<NaiveDate>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => parse_date(s).map(Some).ok_or_else(|| {
            AppError::validation("INVALID_DATE", format!("{field} must be YYYY-MM-DD, got `{s}`"))
        }),
    }
}

/// Treats blank and `ALL` as "no filter".
pub fn unless_all(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("ALL"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paging_defaults_and_clamps() {
        assert_eq!(Paging::new(None, None), Paging { page: 1, per_page: 10 });
        assert_eq!(Paging::new(Some(0), Some(1000)), Paging { page: 1, per_page: 100 });
        assert_eq!(Paging::new(Some(3), Some(5)).offset(), 10);
        assert_eq!(Paging::new(Some(2), Some(2)).slice(vec![1, 2, 3, 4, 5]), vec![3, 4]);
    }

    #[test]
    fn huge_page_number_saturates() {
        let paging = Paging::new(Some(u64::MAX), Some(100));
        assert_eq!(paging.offset(), u64::MAX);
        assert!(paging.slice(vec![1, 2, 3]).is_empty());
    }

    #[test]
    fn dates_and_all_markers() {
        assert_eq!(optional_date(Some(" "), "from").unwrap(), None);
        assert_eq!(
            optional_date(Some("2026-02-05"), "from").unwrap(),
            NaiveDate::from_ymd_opt(2026, 2, 5)
        );
        assert_eq!(optional_date(Some("05/02/2026"), "from").unwrap_err().code(), "INVALID_DATE");

        assert_eq!(unless_all(Some("all")), None);
        assert_eq!(unless_all(Some("CBG_002")), Some("CBG_002"));
    }
}
