use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One shift session. `clock_in`/`clock_out` are the canonical UTC instants
/// all arithmetic runs on; the `_local` fields are formatted display copies
/// in the business zone and are never parsed back.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 17,
        "employee_id": 3,
        "clock_in": "2024-01-01T22:00:00Z",
        "clock_out": "2024-01-02T02:00:00Z",
        "clock_in_local": "01/01/2024 22:00",
        "clock_out_local": "02/01/2024 02:00",
        "break_minutes": 0,
        "total_work_hhmm": "04:00"
    })
)]
pub struct AttendanceRecord {
    pub id: u64,

    pub employee_id: u64,

    #[schema(value_type = String, format = "date-time")]
    pub clock_in: DateTime<Utc>,

    /// `None` while the session is open.
    #[schema(value_type = Option<String>, format = "date-time", nullable = true)]
    pub clock_out: Option<DateTime<Utc>>,

    #[schema(example = "01/01/2024 22:00")]
    pub clock_in_local: String,

    #[schema(example = "02/01/2024 02:00", nullable = true)]
    pub clock_out_local: Option<String>,

    /// Set exactly once at clock-out.
    pub break_minutes: u32,

    /// Net worked time as `HH:MM`, set at clock-out.
    #[schema(example = "08:00", nullable = true)]
    pub total_work_hhmm: Option<String>,
}

impl AttendanceRecord {
    pub fn is_open(&self) -> bool {
        self.clock_out.is_none()
    }
}
