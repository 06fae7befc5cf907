use chrono::{Duration, NaiveDate};

/// Every calendar day from `start` to `end`, both inclusive.
pub fn get_days_between(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    if start > end {
        return Vec::new();
    }
    let mut days = Vec::new();
    let mut current = start;
    while current <= end {
        days.push(current);
        if let Some(next) = current.succ_opt() {
            current = next;
        } else {
            break;
        }
    }
    days
}

/// Number of calendar days in `[start, end]`, 0 when the range is inverted.
pub fn inclusive_day_count(start: NaiveDate, end: NaiveDate) -> i64 {
    if start > end {
        0
    } else {
        (end - start).num_days() + 1
    }
}

/// `start + offset` days, `None` on calendar overflow.
pub fn nth_day(start: NaiveDate, offset: i64) -> Option<NaiveDate> {
    start.checked_add_signed(Duration::days(offset))
}
