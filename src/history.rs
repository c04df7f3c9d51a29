use chrono::{NaiveDate, TimeZone};
use std::collections::HashMap;

use crate::session::StoredSession;

/// Sessions that started on one calendar day
#[derive(Debug, Clone, PartialEq)]
pub struct DayGroup {
    pub date: NaiveDate,
    pub sessions: Vec<StoredSession>,
}

impl DayGroup {
    pub fn total_seconds(&self) -> u64 {
        self.sessions
            .iter()
            .map(|s| s.duration_seconds as u64)
            .sum()
    }
}

/// Partition `sessions` by the calendar date of `started_at` as seen in `tz`.
///
/// Groups appear in the order their first session appears in the input, and
/// each group keeps its sessions in input order. Pass the journal reversed
/// to get newest-first sections.
pub fn group_by_calendar_day<Tz: TimeZone>(
    sessions: &[StoredSession],
    tz: &Tz,
) -> Vec<DayGroup> {
    let mut groups: Vec<DayGroup> = Vec::new();
    let mut index: HashMap<NaiveDate, usize> = HashMap::new();

    for session in sessions {
        let date = session.started_at.with_timezone(tz).date_naive();
        let slot = *index.entry(date).or_insert_with(|| {
            groups.push(DayGroup {
                date,
                sessions: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].sessions.push(session.clone());
    }

    groups
}
