use chrono::NaiveDate;

/// `MM:SS`, minutes zero-padded to two digits and allowed to run past 59
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Heading for a day section, e.g. `Sat, March 9, 2024`
pub fn format_day_heading(date: NaiveDate) -> String {
    date.format("%a, %B %-d, %Y").to_string()
}

/// Compact human total for summaries: `1h 05m`, `25m`, `40s`
pub fn format_total(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    match (hours, minutes) {
        (0, 0) => format!("{}s", seconds),
        (0, m) => format!("{}m", m),
        (h, m) => format!("{}h {:02}m", h, m),
    }
}
