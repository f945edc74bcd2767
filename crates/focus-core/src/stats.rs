//! Focus metrics over the local collections

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use serde::Serialize;

use crate::models::{Interrupt, Session};

/// Dashboard counters. Day and week boundaries follow the time zone of the
/// `now` passed to [`FocusMetrics::compute`]; weeks start on Monday.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FocusMetrics {
    /// Sessions ended in the last 7 days, today included
    pub recent_attempts: usize,
    /// Of those, sessions that ended done or partial
    pub recent_focus: usize,
    /// Minutes of done or partial sessions ended this week
    pub week_focus_minutes: i64,
    pub today_interrupts: usize,
    pub week_interrupts: usize,
}

impl FocusMetrics {
    pub fn compute<Tz: TimeZone>(
        sessions: &[Session],
        interrupts: &[Interrupt],
        now: &DateTime<Tz>,
    ) -> Self {
        let zone = now.timezone();
        let local = |instant: &DateTime<chrono::Utc>| instant.with_timezone(&zone).naive_local();
        let today = now.date_naive();
        let recent_start = midnight(today - Days::new(6));
        let (week_start, week_end) = week_range(today);
        let in_week = |at: NaiveDateTime| at >= week_start && at < week_end;

        let recent: Vec<&Session> = sessions
            .iter()
            .filter(|session| {
                local(&session.ended_at) >= recent_start && session.ended_at <= *now
            })
            .collect();

        Self {
            recent_attempts: recent.len(),
            recent_focus: recent
                .iter()
                .filter(|session| session.status.counts_as_focus())
                .count(),
            week_focus_minutes: sessions
                .iter()
                .filter(|session| session.status.counts_as_focus())
                .filter(|session| in_week(local(&session.ended_at)))
                .map(Session::elapsed_minutes)
                .sum(),
            today_interrupts: interrupts
                .iter()
                .filter(|interrupt| local(&interrupt.at).date() == today)
                .count(),
            week_interrupts: interrupts
                .iter()
                .filter(|interrupt| in_week(local(&interrupt.at)))
                .count(),
        }
    }
}

fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// Monday 00:00 of the week containing `today`, and the next Monday.
fn week_range(today: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    let monday = today - Days::new(u64::from(today.weekday().num_days_from_monday()));
    (midnight(monday), midnight(monday + Days::new(7)))
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, FixedOffset, Utc};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::{InterruptOutcome, SessionStatus};

    fn session(ended_at: DateTime<Utc>, minutes: i64, status: SessionStatus) -> Session {
        Session::new(
            "t1",
            "Read",
            20,
            ended_at - Duration::minutes(minutes),
            ended_at,
            status,
            None,
        )
    }

    fn interrupt(at: DateTime<Utc>) -> Interrupt {
        Interrupt::new(at, None, false, InterruptOutcome::ReturnToToday)
    }

    #[test]
    fn empty_collections_have_zero_metrics() {
        let metrics = FocusMetrics::compute(&[], &[], &Utc::now());
        assert_eq!(metrics, FocusMetrics::default());
    }

    #[test]
    fn week_starts_on_monday() {
        // Wednesday 2025-03-05 12:00 UTC
        let now = Utc.with_ymd_and_hms(2025, 3, 5, 12, 0, 0).unwrap();
        let sessions = vec![
            session(Utc.with_ymd_and_hms(2025, 3, 3, 0, 30, 0).unwrap(), 25, SessionStatus::Done),
            session(Utc.with_ymd_and_hms(2025, 3, 4, 9, 0, 0).unwrap(), 10, SessionStatus::Partial),
            session(Utc.with_ymd_and_hms(2025, 3, 4, 10, 0, 0).unwrap(), 40, SessionStatus::Aborted),
            // Sunday of the previous week
            session(Utc.with_ymd_and_hms(2025, 3, 2, 23, 0, 0).unwrap(), 50, SessionStatus::Done),
        ];

        let metrics = FocusMetrics::compute(&sessions, &[], &now);

        assert_eq!(metrics.week_focus_minutes, 35);
        assert_eq!(metrics.recent_attempts, 4);
        assert_eq!(metrics.recent_focus, 3);
    }

    #[test]
    fn recent_window_covers_seven_days_up_to_now() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 8, 0, 0).unwrap();
        let sessions = vec![
            session(Utc.with_ymd_and_hms(2025, 3, 4, 0, 0, 0).unwrap(), 5, SessionStatus::Done),
            session(Utc.with_ymd_and_hms(2025, 3, 3, 23, 59, 0).unwrap(), 5, SessionStatus::Done),
            session(now + Duration::hours(1), 5, SessionStatus::Done),
        ];

        let metrics = FocusMetrics::compute(&sessions, &[], &now);
        assert_eq!(metrics.recent_attempts, 1);
    }

    #[test]
    fn interrupt_days_follow_local_time_zone() {
        let zone = FixedOffset::east_opt(8 * 3600).unwrap();
        // Tuesday 2025-03-04 01:00 at UTC+8
        let now = zone.with_ymd_and_hms(2025, 3, 4, 1, 0, 0).unwrap();
        let interrupts = vec![
            // 2025-03-04 00:30 at UTC+8
            interrupt(Utc.with_ymd_and_hms(2025, 3, 3, 16, 30, 0).unwrap()),
            // 2025-03-03 23:30 at UTC+8, Monday
            interrupt(Utc.with_ymd_and_hms(2025, 3, 3, 15, 30, 0).unwrap()),
            // 2025-03-02 at UTC+8, previous week
            interrupt(Utc.with_ymd_and_hms(2025, 3, 2, 10, 0, 0).unwrap()),
        ];

        let metrics = FocusMetrics::compute(&[], &interrupts, &now);

        assert_eq!(metrics.today_interrupts, 1);
        assert_eq!(metrics.week_interrupts, 2);
    }
}
