//! Schedule Computer - spreads a campaign's messages over its window
//!
//! Pure function over its inputs; the clock is whatever `start` the
//! caller passes in, so campaign activation is fully deterministic.

use chrono::{DateTime, Duration, Utc};
use wavesend_common::types::ContactId;

/// One computed send slot, consumed at activation to create a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleEntry {
    pub contact_id: ContactId,
    pub scheduled_at: DateTime<Utc>,
}

/// Compute send slots for the given contacts.
///
/// `per_day = ceil(n / spread_days)` contacts are assigned to each day.
/// Each day starts at `start` advanced by that many calendar days (same
/// time of day), and slots within a day step by exactly
/// `interval_seconds`. The last day absorbs any remainder. Empty input
/// yields an empty schedule; callers reject empty activation.
pub fn compute_schedule(
    contact_ids: &[ContactId],
    start: DateTime<Utc>,
    spread_days: i32,
    interval_seconds: i32,
) -> Vec<ScheduleEntry> {
    let spread_days = spread_days.max(1);
    let interval_seconds = interval_seconds.max(1) as i64;

    let total = contact_ids.len();
    if total == 0 {
        return Vec::new();
    }

    let per_day = (total as i64 + spread_days as i64 - 1) / spread_days as i64;

    let mut entries = Vec::with_capacity(total);
    let mut clock = start;
    let mut day_index: i64 = 0;
    let mut sent_today: i64 = 0;

    for contact_id in contact_ids {
        if sent_today >= per_day && day_index < spread_days as i64 - 1 {
            day_index += 1;
            clock = start + Duration::days(day_index);
            sent_today = 0;
        }

        entries.push(ScheduleEntry {
            contact_id: *contact_id,
            scheduled_at: clock,
        });

        clock += Duration::seconds(interval_seconds);
        sent_today += 1;
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    fn contacts(n: usize) -> Vec<ContactId> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    fn start() -> DateTime<Utc> {
        "2026-03-01T09:00:00Z".parse().unwrap()
    }

    #[test]
    fn test_empty_input_yields_empty_schedule() {
        assert!(compute_schedule(&[], start(), 3, 60).is_empty());
    }

    #[test]
    fn test_every_contact_gets_exactly_one_slot() {
        let ids = contacts(17);
        let entries = compute_schedule(&ids, start(), 5, 30);
        assert_eq!(entries.len(), 17);
        let scheduled: Vec<ContactId> = entries.iter().map(|e| e.contact_id).collect();
        assert_eq!(scheduled, ids);
    }

    #[test]
    fn test_five_contacts_over_two_days() {
        let ids = contacts(5);
        let entries = compute_schedule(&ids, start(), 2, 60);

        // per_day = ceil(5/2) = 3: three slots on day 0, two on day 1
        let t = start();
        assert_eq!(entries[0].scheduled_at, t);
        assert_eq!(entries[1].scheduled_at, t + Duration::seconds(60));
        assert_eq!(entries[2].scheduled_at, t + Duration::seconds(120));
        assert_eq!(entries[3].scheduled_at, t + Duration::days(1));
        assert_eq!(
            entries[4].scheduled_at,
            t + Duration::days(1) + Duration::seconds(60)
        );
    }

    #[test]
    fn test_single_day_slots_step_by_interval() {
        let ids = contacts(4);
        let entries = compute_schedule(&ids, start(), 1, 300);
        for (i, pair) in entries.windows(2).enumerate() {
            assert_eq!(
                pair[1].scheduled_at - pair[0].scheduled_at,
                Duration::seconds(300),
                "gap after slot {i}"
            );
        }
    }

    #[test]
    fn test_last_day_absorbs_remainder() {
        // 10 contacts over 3 days: per_day = 4, so days hold 4 / 4 / 2
        let ids = contacts(10);
        let entries = compute_schedule(&ids, start(), 3, 60);
        let t = start();

        let day_of = |e: &ScheduleEntry| (e.scheduled_at - t).num_days();
        let counts: Vec<usize> = (0..3)
            .map(|d| entries.iter().filter(|e| day_of(e) == d).count())
            .collect();
        assert_eq!(counts, vec![4, 4, 2]);
    }

    #[test]
    fn test_fewer_contacts_than_days_stay_on_first_day() {
        // per_day = 1, one contact per calendar day
        let ids = contacts(2);
        let entries = compute_schedule(&ids, start(), 7, 60);
        assert_eq!(entries[0].scheduled_at, start());
        assert_eq!(entries[1].scheduled_at, start() + Duration::days(1));
    }
}
