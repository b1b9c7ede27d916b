use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Inclusive calendar-date range used by the query surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn open(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        DateRange { start, end }
    }

    pub fn is_unbounded(self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbounded_only_without_either_side() {
        let may = NaiveDate::from_ymd_opt(2024, 5, 1);
        assert!(DateRange::open(None, None).is_unbounded());
        assert!(!DateRange::open(may, None).is_unbounded());
        assert!(!DateRange::open(None, may).is_unbounded());
    }
}
