use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

/// Display format for local timestamps. Display strings are write-only:
/// they are never parsed back into instants.
pub const LOCAL_FORMAT: &str = "%d/%m/%Y %H:%M";

/// Single source of "now" and of UTC <-> business-zone conversion.
///
/// All interval arithmetic happens on UTC instants; the zone only matters
/// for calendar-day boundaries and display strings.
#[derive(Debug, Clone, Copy)]
pub struct BusinessClock {
    zone: Tz,
}

impl BusinessClock {
    pub fn new(zone: Tz) -> Self {
        Self { zone }
    }

    pub fn zone(&self) -> Tz {
        self.zone
    }

    /// Current instant. Handlers call this once at the edge and pass the
    /// instant down; the core never reads ambient time.
    pub fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    pub fn to_local(&self, instant: DateTime<Utc>) -> DateTime<Tz> {
        instant.with_timezone(&self.zone)
    }

    /// Calendar date of `instant` in the business zone.
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        self.to_local(instant).date_naive()
    }

    /// UTC instant of local midnight starting `date`.
    pub fn start_of_local_day(&self, date: NaiveDate) -> DateTime<Utc> {
        start_of_local_day(self.zone, date)
    }

    /// UTC instant of the exclusive end of the local day (= start of the
    /// next local day).
    pub fn end_of_local_day(&self, date: NaiveDate) -> DateTime<Utc> {
        start_of_local_day(self.zone, date + Duration::days(1))
    }

    /// `dd/MM/yyyy HH:mm` in the business zone, display only.
    pub fn format_local(&self, instant: DateTime<Utc>) -> String {
        self.to_local(instant).format(LOCAL_FORMAT).to_string()
    }
}

/// Resolve local midnight of `date` in `zone` to a UTC instant.
///
/// On a spring-forward day the wall-clock midnight may not exist; in that
/// case the first existing wall-clock time after it is used. An ambiguous
/// midnight (fall-back) resolves to the earlier instant so a day is never
/// shortened at its start.
pub fn start_of_local_day(zone: Tz, date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_hms_opt(0, 0, 0).expect("00:00:00 is valid");
    match zone.from_local_datetime(&midnight) {
        chrono::LocalResult::Single(dt) => dt.with_timezone(&Utc),
        chrono::LocalResult::Ambiguous(earlier, _) => earlier.with_timezone(&Utc),
        chrono::LocalResult::None => {
            // Skipped by a DST gap; probe forward in 15-minute steps.
            let mut probe = midnight;
            for _ in 0..16 {
                probe += Duration::minutes(15);
                if let Some(dt) = zone.from_local_datetime(&probe).earliest() {
                    return dt.with_timezone(&Utc);
                }
            }
            // No zone has a gap this wide; treat the naive time as UTC.
            Utc.from_utc_datetime(&midnight)
        }
    }
}
