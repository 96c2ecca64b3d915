//! Day-bucketed reporting over the attendance log.
//!
//! Read-only and repeatable: open sessions are measured against the "now"
//! instant supplied by the caller, so two calls may legitimately differ.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;

use crate::model::attendance::AttendanceRecord;
use crate::timeclock::clock::BusinessClock;
use crate::timeclock::engine;
use crate::timeclock::error::TimeclockError;
use crate::timeclock::store::AttendanceStore;

/// Minutes attributed to one employee on one local calendar date.
#[derive(Debug, Serialize, ToSchema)]
pub struct DaySummary {
    pub employee_id: u64,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub total_minutes: i64,
    #[schema(example = "04:30")]
    pub total_hhmm: String,
}

/// One attendance row plus the minutes it contributes to the queried day.
#[derive(Debug, Serialize, ToSchema)]
pub struct DayRecord {
    pub attendance: AttendanceRecord,
    pub computed_work_minutes: i64,
    #[schema(example = "04:30")]
    pub computed_work_hhmm: String,
}

/// Everything the day drill-down view needs in one response.
#[derive(Debug, Serialize, ToSchema)]
pub struct DayReport {
    #[schema(example = "01/01/2024")]
    pub date: String,
    pub daily_total_minutes: i64,
    #[schema(example = "08:45")]
    pub daily_total_hhmm: String,
    pub items: Vec<DayRecord>,
}

/// Completed sessions interleaved with the idle gaps between them. Display
/// only; gaps are never deducted from pay.
#[derive(Debug, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionEntry {
    Session {
        attendance_id: u64,
        clock_in_local: String,
        clock_out_local: String,
        minutes: i64,
        hhmm: String,
    },
    Break {
        from_local: String,
        to_local: String,
        minutes: i64,
        hhmm: String,
    },
}

/// Flat row for the range report listing.
#[derive(Debug, Serialize, ToSchema)]
pub struct RangeRow {
    pub attendance: AttendanceRecord,
    pub computed_work_minutes: i64,
    #[schema(example = "08:00")]
    pub computed_work_hhmm: String,
}

#[derive(Clone)]
pub struct ReportBuilder<S> {
    store: S,
    clock: BusinessClock,
}

/// Provisional interval of a record: open sessions run until `now`.
/// `None` when the stored instants are inconsistent.
fn effective_interval(
    record: &AttendanceRecord,
    now: DateTime<Utc>,
) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let end = record.clock_out.unwrap_or(now);
    if end < record.clock_in {
        warn!(
            record_id = record.id,
            employee_id = record.employee_id,
            "clock_out precedes clock_in; record excluded from totals"
        );
        return None;
    }
    Some((record.clock_in, end))
}

/// Net minutes of a record over its effective interval. Closed records use
/// the stored break; open ones get the provisional auto-break.
fn record_net_minutes(record: &AttendanceRecord, start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    let gross = engine::gross_minutes(start, end);
    let break_minutes = if record.is_open() {
        engine::auto_break_minutes(gross)
    } else {
        record.break_minutes as i64
    };
    engine::net_minutes(gross, break_minutes)
}

impl<S: AttendanceStore> ReportBuilder<S> {
    pub fn new(store: S, clock: BusinessClock) -> Self {
        Self { store, clock }
    }

    pub fn clock(&self) -> &BusinessClock {
        &self.clock
    }

    /// Every record whose interval intersects the local day, open or closed.
    pub async fn records_overlapping_local_day(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, TimeclockError> {
        self.store
            .find_overlapping(
                self.clock.start_of_local_day(date),
                self.clock.end_of_local_day(date),
            )
            .await
    }

    /// Minutes a single record contributes to `date`: the day's chunk of the
    /// midnight split, scaled from gross to net so the break deduction is
    /// spread over the whole session.
    fn minutes_on_day(&self, record: &AttendanceRecord, date: NaiveDate, now: DateTime<Utc>) -> i64 {
        let Some((start, end)) = effective_interval(record, now) else {
            return 0;
        };
        let gross = engine::gross_minutes(start, end);
        if gross == 0 {
            return 0;
        }
        let net = record_net_minutes(record, start, end);
        engine::split_at_local_midnight(start, end, self.clock.zone())
            .into_iter()
            .filter(|chunk| chunk.local_date == date)
            .map(|chunk| (chunk.minutes * net + gross / 2) / gross)
            .sum()
    }

    /// Per-employee minute total for one local day. Matches what a reader
    /// would compute by hand from the raw clock events.
    pub async fn daily_total(
        &self,
        employee_id: u64,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<DaySummary, TimeclockError> {
        let total: i64 = self
            .records_overlapping_local_day(date)
            .await?
            .iter()
            .filter(|r| r.employee_id == employee_id)
            .map(|r| self.minutes_on_day(r, date, now))
            .sum();

        Ok(DaySummary {
            employee_id,
            date,
            total_minutes: total,
            total_hhmm: engine::to_hhmm(total),
        })
    }

    /// All employees' records touching one local day, each annotated with
    /// the minutes it contributes to that day, plus the day total.
    pub async fn day_report(
        &self,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<DayReport, TimeclockError> {
        let records = self.records_overlapping_local_day(date).await?;

        let mut daily_total = 0;
        let items = records
            .into_iter()
            .map(|record| {
                let minutes = self.minutes_on_day(&record, date, now);
                daily_total += minutes;
                DayRecord {
                    attendance: record,
                    computed_work_minutes: minutes,
                    computed_work_hhmm: engine::to_hhmm(minutes),
                }
            })
            .collect();

        Ok(DayReport {
            date: date.format("%d/%m/%Y").to_string(),
            daily_total_minutes: daily_total,
            daily_total_hhmm: engine::to_hhmm(daily_total),
            items,
        })
    }

    /// One employee's completed sessions on a day, chronological, with a
    /// synthetic break entry for each gap between consecutive sessions.
    pub async fn detailed_sessions(
        &self,
        employee_id: u64,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Vec<SessionEntry>, TimeclockError> {
        let mut sessions: Vec<AttendanceRecord> = self
            .records_overlapping_local_day(date)
            .await?
            .into_iter()
            .filter(|r| r.employee_id == employee_id && !r.is_open())
            .collect();
        sessions.sort_by_key(|r| r.clock_in);

        let mut entries = Vec::with_capacity(sessions.len() * 2);
        let mut previous_out: Option<DateTime<Utc>> = None;

        for record in sessions {
            let Some((start, end)) = effective_interval(&record, now) else {
                continue;
            };
            if let Some(prev) = previous_out {
                let gap = engine::gross_minutes(prev, record.clock_in);
                if gap > 0 {
                    entries.push(SessionEntry::Break {
                        from_local: self.clock.format_local(prev),
                        to_local: self.clock.format_local(record.clock_in),
                        minutes: gap,
                        hhmm: engine::to_hhmm(gap),
                    });
                }
            }
            let minutes = record_net_minutes(&record, start, end);
            entries.push(SessionEntry::Session {
                attendance_id: record.id,
                clock_in_local: record.clock_in_local.clone(),
                clock_out_local: record.clock_out_local.clone().unwrap_or_default(),
                minutes,
                hhmm: engine::to_hhmm(minutes),
            });
            previous_out = end.into();
        }

        Ok(entries)
    }

    /// Flat listing for the reports screen, filtered by employee and
    /// clock-in window, newest first.
    pub async fn range_report(
        &self,
        employee_id: Option<u64>,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<Vec<RangeRow>, TimeclockError> {
        let records = self.store.find_range(employee_id, from, to).await?;
        Ok(records
            .into_iter()
            .map(|record| {
                let minutes = effective_interval(&record, now)
                    .map(|(start, end)| record_net_minutes(&record, start, end))
                    .unwrap_or(0);
                RangeRow {
                    attendance: record,
                    computed_work_minutes: minutes,
                    computed_work_hhmm: engine::to_hhmm(minutes),
                }
            })
            .collect())
    }

    /// Administrative removal of one record.
    pub async fn delete_record(&self, id: u64) -> Result<bool, TimeclockError> {
        self.store.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use chrono_tz::Europe::London;

    use super::*;
    use crate::timeclock::session::SessionManager;
    use crate::timeclock::store::memory::MemoryAttendanceStore;

    fn fixtures() -> (
        SessionManager<MemoryAttendanceStore>,
        ReportBuilder<MemoryAttendanceStore>,
    ) {
        let store = MemoryAttendanceStore::default();
        let clock = BusinessClock::new(London);
        (
            SessionManager::new(store.clone(), clock),
            ReportBuilder::new(store, clock),
        )
    }

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn two_short_sessions_sum_on_one_day() {
        let (mgr, reports) = fixtures();
        let now = utc(2024, 1, 1, 23, 0);

        mgr.clock_in(1, utc(2024, 1, 1, 9, 0)).await.unwrap();
        mgr.clock_out(1, utc(2024, 1, 1, 12, 0)).await.unwrap();
        mgr.clock_in(1, utc(2024, 1, 1, 13, 0)).await.unwrap();
        mgr.clock_out(1, utc(2024, 1, 1, 14, 30)).await.unwrap();

        let summary = reports.daily_total(1, date(2024, 1, 1), now).await.unwrap();
        assert_eq!(summary.total_minutes, 270);
        assert_eq!(summary.total_hhmm, "04:30");
    }

    #[tokio::test]
    async fn overnight_session_splits_between_days() {
        let (mgr, reports) = fixtures();
        let now = utc(2024, 1, 2, 12, 0);

        // 22:00 -> 02:00 local (winter, so UTC == local).
        mgr.clock_in(1, utc(2024, 1, 1, 22, 0)).await.unwrap();
        mgr.clock_out(1, utc(2024, 1, 2, 2, 0)).await.unwrap();

        let first = reports.daily_total(1, date(2024, 1, 1), now).await.unwrap();
        let second = reports.daily_total(1, date(2024, 1, 2), now).await.unwrap();
        assert_eq!(first.total_minutes, 120);
        assert_eq!(second.total_minutes, 120);
    }

    #[tokio::test]
    async fn open_session_counts_up_to_now() {
        let (mgr, reports) = fixtures();
        mgr.clock_in(1, utc(2024, 1, 1, 9, 0)).await.unwrap();

        let now = utc(2024, 1, 1, 11, 0);
        let summary = reports.daily_total(1, date(2024, 1, 1), now).await.unwrap();
        assert_eq!(summary.total_minutes, 120);

        // A later "now" sees a larger, equally valid total.
        let later = utc(2024, 1, 1, 12, 0);
        let summary = reports.daily_total(1, date(2024, 1, 1), later).await.unwrap();
        assert_eq!(summary.total_minutes, 180);
    }

    #[tokio::test]
    async fn day_report_covers_all_employees() {
        let (mgr, reports) = fixtures();
        let now = utc(2024, 1, 1, 23, 0);

        mgr.clock_in(1, utc(2024, 1, 1, 9, 0)).await.unwrap();
        mgr.clock_out(1, utc(2024, 1, 1, 12, 0)).await.unwrap();
        mgr.clock_in(2, utc(2024, 1, 1, 10, 0)).await.unwrap();
        mgr.clock_out(2, utc(2024, 1, 1, 11, 0)).await.unwrap();

        let report = reports.day_report(date(2024, 1, 1), now).await.unwrap();
        assert_eq!(report.date, "01/01/2024");
        assert_eq!(report.items.len(), 2);
        assert_eq!(report.daily_total_minutes, 240);
        assert_eq!(report.daily_total_hhmm, "04:00");
    }

    #[tokio::test]
    async fn detailed_sessions_interleave_breaks() {
        let (mgr, reports) = fixtures();
        let now = utc(2024, 1, 1, 23, 0);

        mgr.clock_in(1, utc(2024, 1, 1, 9, 0)).await.unwrap();
        mgr.clock_out(1, utc(2024, 1, 1, 12, 0)).await.unwrap();
        mgr.clock_in(1, utc(2024, 1, 1, 12, 45)).await.unwrap();
        mgr.clock_out(1, utc(2024, 1, 1, 17, 0)).await.unwrap();

        let entries = reports
            .detailed_sessions(1, date(2024, 1, 1), now)
            .await
            .unwrap();
        assert_eq!(entries.len(), 3);
        assert!(matches!(entries[0], SessionEntry::Session { minutes: 180, .. }));
        assert!(matches!(entries[1], SessionEntry::Break { minutes: 45, .. }));
        assert!(matches!(entries[2], SessionEntry::Session { minutes: 255, .. }));
    }

    #[tokio::test]
    async fn range_report_filters_by_employee_and_window() {
        let (mgr, reports) = fixtures();
        let now = utc(2024, 1, 3, 12, 0);

        mgr.clock_in(1, utc(2024, 1, 1, 9, 0)).await.unwrap();
        mgr.clock_out(1, utc(2024, 1, 1, 17, 0)).await.unwrap();
        mgr.clock_in(2, utc(2024, 1, 2, 9, 0)).await.unwrap();
        mgr.clock_out(2, utc(2024, 1, 2, 17, 0)).await.unwrap();

        let rows = reports
            .range_report(Some(1), None, None, now)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        // 8h gross crosses the six-hour threshold: 30 min auto break.
        assert_eq!(rows[0].computed_work_minutes, 450);
        assert_eq!(rows[0].computed_work_hhmm, "07:30");

        let rows = reports
            .range_report(None, Some(utc(2024, 1, 2, 0, 0)), None, now)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].attendance.employee_id, 2);
    }

    #[tokio::test]
    async fn inconsistent_record_is_skipped_not_fatal() {
        let (mgr, reports) = fixtures();
        let store_now = utc(2024, 1, 1, 8, 0);

        // Open session whose clock-in is after the aggregation "now":
        // effective end < start, so it must be excluded, not crash or go
        // negative.
        mgr.clock_in(1, utc(2024, 1, 1, 9, 0)).await.unwrap();
        mgr.clock_in(2, utc(2024, 1, 1, 6, 0)).await.unwrap();
        mgr.clock_out(2, utc(2024, 1, 1, 7, 0)).await.unwrap();

        let report = reports.day_report(date(2024, 1, 1), store_now).await.unwrap();
        assert_eq!(report.daily_total_minutes, 60);
    }
}
