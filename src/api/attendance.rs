use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

use crate::timeclock::error::TimeclockError;
use crate::timeclock::{SqlReportBuilder, SqlSessionManager};

#[derive(Deserialize, ToSchema)]
pub struct ClockReq {
    #[schema(example = 3)]
    pub employee_id: u64,

    #[schema(example = "4321")]
    pub pin: String,

    /// Administrative backdating; defaults to now.
    #[schema(value_type = Option<String>, format = "date-time", nullable = true)]
    pub at: Option<DateTime<Utc>>,
}

#[derive(Deserialize, IntoParams)]
pub struct RecordsQuery {
    /// Local calendar date, `YYYY-MM-DD`; defaults to today.
    pub date: Option<NaiveDate>,
}

#[derive(sqlx::FromRow)]
struct PinRow {
    pin: Option<String>,
    status: String,
}

/// Identity gate for the kiosk endpoints: the employee must exist, be
/// active, and present the right PIN.
async fn verify_pin(
    pool: &MySqlPool,
    employee_id: u64,
    pin: &str,
) -> Result<(), TimeclockError> {
    let row = sqlx::query_as::<_, PinRow>("SELECT pin, status FROM employees WHERE id = ?")
        .bind(employee_id)
        .fetch_optional(pool)
        .await?
        .ok_or(TimeclockError::IdentityNotFound(employee_id))?;

    if row.status != "active" {
        return Err(TimeclockError::IdentityNotFound(employee_id));
    }

    let hash = row.pin.ok_or(TimeclockError::InvalidCredential)?;
    if !crate::auth::password::verify_secret(pin, &hash) {
        return Err(TimeclockError::InvalidCredential);
    }
    Ok(())
}

/// Clock-in endpoint
#[utoipa::path(
    post,
    path = "/attendance/clock-in",
    request_body = ClockReq,
    responses(
        (status = 200, description = "Clock-in recorded", body = Object, example = json!({
            "message": "Clock-in recorded"
        })),
        (status = 400, description = "Already clocked in (open session exists)"),
        (status = 401, description = "Invalid PIN"),
        (status = 404, description = "Invalid employee"),
        (status = 409, description = "Concurrent clock-in rejected"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn clock_in(
    pool: web::Data<MySqlPool>,
    sessions: web::Data<SqlSessionManager>,
    body: web::Json<ClockReq>,
) -> Result<impl Responder, TimeclockError> {
    verify_pin(pool.get_ref(), body.employee_id, &body.pin).await?;

    let at = body.at.unwrap_or_else(|| sessions.clock().now());
    let record = sessions.clock_in(body.employee_id, at).await?;

    tracing::info!(employee_id = body.employee_id, record_id = record.id, "clock-in recorded");
    Ok(HttpResponse::Ok().json(json!({
        "message": "Clock-in recorded",
        "attendance": record
    })))
}

/// Clock-out endpoint
#[utoipa::path(
    post,
    path = "/attendance/clock-out",
    request_body = ClockReq,
    responses(
        (status = 200, description = "Clock-out recorded", body = Object, example = json!({
            "message": "Clock-out recorded"
        })),
        (status = 400, description = "No clock-in found or already clocked out"),
        (status = 401, description = "Invalid PIN"),
        (status = 404, description = "Invalid employee"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn clock_out(
    pool: web::Data<MySqlPool>,
    sessions: web::Data<SqlSessionManager>,
    body: web::Json<ClockReq>,
) -> Result<impl Responder, TimeclockError> {
    verify_pin(pool.get_ref(), body.employee_id, &body.pin).await?;

    let at = body.at.unwrap_or_else(|| sessions.clock().now());
    let record = sessions.clock_out(body.employee_id, at).await?;

    tracing::info!(
        employee_id = body.employee_id,
        record_id = record.id,
        total = record.total_work_hhmm.as_deref().unwrap_or("00:00"),
        "clock-out recorded"
    );
    Ok(HttpResponse::Ok().json(json!({
        "message": "Clock-out recorded",
        "attendance": record
    })))
}

/// Clocked-in/out status for every employee with attendance history.
/// Derived from the latest record per employee; a session spanning midnight
/// stays "Clocked In".
#[utoipa::path(
    get,
    path = "/api/v1/attendance/status",
    responses(
        (status = 200, description = "Status per employee"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn status(
    sessions: web::Data<SqlSessionManager>,
) -> Result<impl Responder, TimeclockError> {
    let statuses = sessions.status_all().await?;
    Ok(HttpResponse::Ok().json(statuses))
}

/// Status of one employee. OPEN means an unterminated session exists,
/// whenever it started.
#[utoipa::path(
    get,
    path = "/api/v1/attendance/status/{employee_id}",
    params(("employee_id", Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Current status"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn status_one(
    sessions: web::Data<SqlSessionManager>,
    path: web::Path<u64>,
) -> Result<impl Responder, TimeclockError> {
    let employee_id = path.into_inner();
    let status = sessions.status(employee_id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "employee_id": employee_id,
        "status": status
    })))
}

/// Records touching one local day, with per-row minutes and the day total.
#[utoipa::path(
    get,
    path = "/api/v1/attendance/records",
    params(RecordsQuery),
    responses(
        (status = 200, description = "Day drill-down", body = crate::timeclock::report::DayReport),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn records_by_date(
    reports: web::Data<SqlReportBuilder>,
    query: web::Query<RecordsQuery>,
) -> Result<impl Responder, TimeclockError> {
    let now = reports.clock().now();
    let date = query.date.unwrap_or_else(|| reports.clock().local_date(now));
    let report = reports.day_report(date, now).await?;
    Ok(HttpResponse::Ok().json(report))
}
