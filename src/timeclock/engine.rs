//! Pure interval arithmetic for attendance sessions.
//!
//! Everything here works on absolute UTC instants. Local wall-clock time is
//! only involved where calendar-day boundaries matter (midnight splitting),
//! and then via instant bounds from [`crate::timeclock::clock`].

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::timeclock::clock::start_of_local_day;

/// One unpaid 30-minute break is deducted when a shift's gross duration
/// reaches six hours. This is the single global break policy; idle gaps
/// between sessions are reported for drill-down but never deducted.
pub const AUTO_BREAK_THRESHOLD_MINUTES: i64 = 360;
pub const AUTO_BREAK_MINUTES: i64 = 30;

/// Minutes attributed to one local calendar day by [`split_at_local_midnight`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayChunk {
    pub local_date: NaiveDate,
    pub minutes: i64,
}

/// Elapsed minutes between two instants, rounded to the nearest minute,
/// never negative.
pub fn gross_minutes(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    let secs = (end - start).num_seconds().max(0);
    (secs + 30) / 60
}

pub fn auto_break_minutes(gross: i64) -> i64 {
    if gross >= AUTO_BREAK_THRESHOLD_MINUTES {
        AUTO_BREAK_MINUTES
    } else {
        0
    }
}

pub fn net_minutes(gross: i64, break_minutes: i64) -> i64 {
    (gross - break_minutes).max(0)
}

/// Split `[start, end)` into per-local-day chunks by clipping at each local
/// midnight in `zone`. Chunks are emitted in order; zero-length chunks are
/// omitted. Returns nothing when `end <= start`.
pub fn split_at_local_midnight(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    zone: Tz,
) -> Vec<DayChunk> {
    let mut chunks = Vec::new();
    let mut cursor = start;

    while cursor < end {
        let local_date = cursor.with_timezone(&zone).date_naive();
        let next_midnight = start_of_local_day(zone, local_date + Duration::days(1));
        if next_midnight <= cursor {
            // Cannot happen for a well-formed zone; bail rather than spin.
            break;
        }
        let chunk_end = next_midnight.min(end);
        let minutes = gross_minutes(cursor, chunk_end);
        if minutes > 0 {
            chunks.push(DayChunk { local_date, minutes });
        }
        cursor = chunk_end;
    }

    chunks
}

/// Zero-padded `HH:MM`; negative input clamps to `00:00`. Hours can exceed
/// two digits for multi-day totals.
pub fn to_hhmm(minutes: i64) -> String {
    let m = minutes.max(0);
    format!("{:02}:{:02}", m / 60, m % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::Europe::London;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    /// Test-only inverse of `to_hhmm`.
    fn parse_hhmm(s: &str) -> Option<i64> {
        let (h, m) = s.split_once(':')?;
        Some(h.parse::<i64>().ok()? * 60 + m.parse::<i64>().ok()?)
    }

    #[test]
    fn gross_is_clamped_and_rounded() {
        let start = utc(2024, 1, 1, 9, 0);
        assert_eq!(gross_minutes(start, start), 0);
        assert_eq!(gross_minutes(start, start - Duration::minutes(5)), 0);
        assert_eq!(gross_minutes(start, start + Duration::seconds(89)), 1);
        assert_eq!(gross_minutes(start, start + Duration::seconds(90)), 2);
    }

    #[test]
    fn auto_break_boundary_at_six_hours() {
        assert_eq!(auto_break_minutes(359), 0);
        assert_eq!(auto_break_minutes(360), 30);
        assert_eq!(auto_break_minutes(0), 0);
    }

    #[test]
    fn net_never_goes_negative() {
        assert_eq!(net_minutes(20, 30), 0);
        assert_eq!(net_minutes(400, 30), 370);
        for gross in [0, 1, 359, 360, 361, 720] {
            assert!(net_minutes(gross, auto_break_minutes(gross)) >= 0);
        }
    }

    #[test]
    fn hhmm_formats_and_round_trips() {
        assert_eq!(to_hhmm(555), "09:15");
        assert_eq!(to_hhmm(0), "00:00");
        assert_eq!(to_hhmm(-10), "00:00");
        assert_eq!(parse_hhmm("09:15"), Some(555));
        for minutes in [0, 1, 59, 60, 90, 555, 1440] {
            assert_eq!(parse_hhmm(&to_hhmm(minutes)), Some(minutes));
        }
    }

    #[test]
    fn split_within_one_day_is_a_single_chunk() {
        let chunks =
            split_at_local_midnight(utc(2024, 1, 1, 9, 0), utc(2024, 1, 1, 17, 0), London);
        assert_eq!(
            chunks,
            vec![DayChunk {
                local_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                minutes: 480,
            }]
        );
    }

    #[test]
    fn split_across_midnight_allocates_both_days() {
        // 22:00 -> 02:00 local, winter so local == UTC.
        let chunks =
            split_at_local_midnight(utc(2024, 1, 1, 22, 0), utc(2024, 1, 2, 2, 0), London);
        assert_eq!(
            chunks,
            vec![
                DayChunk {
                    local_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                    minutes: 120,
                },
                DayChunk {
                    local_date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                    minutes: 120,
                },
            ]
        );
    }

    #[test]
    fn split_across_midnight_in_summer_uses_local_boundary() {
        // 23:30 UTC is 00:30 BST: the whole interval is on 2 July locally.
        let chunks =
            split_at_local_midnight(utc(2024, 7, 1, 23, 30), utc(2024, 7, 2, 1, 30), London);
        assert_eq!(
            chunks,
            vec![DayChunk {
                local_date: NaiveDate::from_ymd_opt(2024, 7, 2).unwrap(),
                minutes: 120,
            }]
        );
    }

    #[test]
    fn split_of_empty_interval_is_empty() {
        let at = utc(2024, 1, 1, 9, 0);
        assert!(split_at_local_midnight(at, at, London).is_empty());
        assert!(split_at_local_midnight(at, at - Duration::hours(1), London).is_empty());
    }

    #[test]
    fn split_spanning_two_midnights_touches_three_days() {
        let chunks =
            split_at_local_midnight(utc(2024, 1, 1, 23, 0), utc(2024, 1, 3, 1, 0), London);
        let dates: Vec<_> = chunks.iter().map(|c| c.local_date).collect();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
            ]
        );
        assert_eq!(chunks.iter().map(|c| c.minutes).sum::<i64>(), 26 * 60);
        assert_eq!(chunks[1].minutes, 1440);
    }
}
