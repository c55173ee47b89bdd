pub fn julian(year: i64, month: i64, day: i64) -> i64 {
    day - 32075
        + 1461 * (year + 4800 + (month - 14) / 12) / 4
        + 367 * (month - 2 - (month - 14) / 12 * 12) / 12
        - 3 * ((year + 4900 + (month - 14) / 12) / 100) / 4
}

pub fn gregorian(jd: i64) -> (i64, i64, i64) {
    let l = jd + 68569;
    let n = 4 * l / 146097;
    let l = l - (146097 * n + 3) / 4;
    let i = 4000 * (l + 1) / 1461001;
    let l = l - 1461 * i / 4 + 31;
    let j = 80 * l / 2447;
    let k = l - 2447 * j / 80;
    let l = j / 11;
    let j = j + 2 - 12 * l;
    let i = 100 * (n - 49) + i + l;

    (i, j, k)
}

/// Whole days between two proleptic Gregorian dates (end minus start).
pub fn days_between(
    start_year: i64,
    start_month: i64,
    start_day: i64,
    end_year: i64,
    end_month: i64,
    end_day: i64,
) -> i64 {
    julian(end_year, end_month, end_day) - julian(start_year, start_month, start_day)
}

/// Check whether (year, month, day) form a real calendar date. Incident
/// records carry month or day 0 when the exact date is unknown; those must
/// not reach the Julian conversion.
pub fn is_valid_date(year: i64, month: i64, day: i64) -> bool {
    if !(1..=12).contains(&month) {
        return false;
    }
    day >= 1 && day <= days_in_month(year as i32, month as u8) as i64
}

/// Calculate the number of days in a given month
pub fn days_in_month(year: i32, month: u8) -> u8 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => panic!("Invalid month: {}", month),
    }
}

/// Check if a year is a leap year
pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}
